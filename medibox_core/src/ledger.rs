//! Inventory ledger for per-compartment remaining quantities.
//!
//! These are the only two operations on the dose-taking path that change
//! `remaining_quantity`. Neither can fail and neither can go below zero.

use crate::Compartment;

/// Target quantity for the administrative bulk reset.
pub const DEFAULT_RESET_QUANTITY: u32 = 30;

/// Take one dose out of a compartment.
///
/// Clamps at zero. Returns the quantity after the operation.
pub fn decrement(compartment: &mut Compartment) -> u32 {
    if compartment.remaining_quantity > 0 {
        compartment.remaining_quantity -= 1;
        tracing::debug!(
            "Compartment {} decremented to {}",
            compartment.id,
            compartment.remaining_quantity
        );
    } else {
        tracing::warn!(
            "Compartment {} is already empty, quantity stays at 0",
            compartment.id
        );
    }
    compartment.remaining_quantity
}

/// Set every compartment's remaining quantity to `value`.
///
/// Thresholds and schedules are left alone.
pub fn reset_all(compartments: &mut [Compartment], value: u32) {
    for compartment in compartments.iter_mut() {
        compartment.remaining_quantity = value;
    }
    tracing::info!(
        "Reset {} compartments to quantity {}",
        compartments.len(),
        value
    );
}
