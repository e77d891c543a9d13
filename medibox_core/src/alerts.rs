//! Low-stock evaluation.

use crate::{Compartment, CompartmentId};

/// Every compartment at or below its low-stock threshold, in enumeration order.
pub fn low_stock(compartments: &[Compartment]) -> Vec<&Compartment> {
    compartments.iter().filter(|c| c.is_low_stock()).collect()
}

/// Display view of a low-stock compartment
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LowStockAlert {
    pub compartment_id: CompartmentId,
    pub name: String,
    pub remaining: u32,
    pub threshold: u32,
}

/// Low-stock compartments as display alerts.
pub fn alerts(compartments: &[Compartment]) -> Vec<LowStockAlert> {
    low_stock(compartments)
        .into_iter()
        .map(|c| LowStockAlert {
            compartment_id: c.id,
            name: c.display_name(),
            remaining: c.remaining_quantity,
            threshold: c.low_stock_threshold,
        })
        .collect()
}
