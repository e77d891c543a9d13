//! Core domain types for the MediBox system.
//!
//! This module defines the fundamental types used throughout the system:
//! - Compartments and their medication metadata
//! - Schedules (stored daily times-of-day)
//! - Scheduled doses derived for the current day

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Quantity a freshly provisioned compartment starts with.
pub const DEFAULT_QUANTITY: u32 = 30;

/// Low-stock threshold a freshly provisioned compartment starts with.
pub const DEFAULT_LOW_STOCK_THRESHOLD: u32 = 5;

// ============================================================================
// Identity
// ============================================================================

/// Stable slot id of a physical compartment
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct CompartmentId(pub u32);

impl fmt::Display for CompartmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// ============================================================================
// Compartment Types
// ============================================================================

/// How a medication should be taken relative to meals or sleep
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Instruction {
    #[default]
    None,
    BeforeMeal,
    AfterMeal,
    WithFood,
    BeforeSleep,
}

impl Instruction {
    pub fn label(&self) -> &'static str {
        match self {
            Instruction::None => "none",
            Instruction::BeforeMeal => "before meal",
            Instruction::AfterMeal => "after meal",
            Instruction::WithFood => "with food",
            Instruction::BeforeSleep => "before sleep",
        }
    }
}

impl FromStr for Instruction {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "none" => Ok(Instruction::None),
            "before-meal" => Ok(Instruction::BeforeMeal),
            "after-meal" => Ok(Instruction::AfterMeal),
            "with-food" => Ok(Instruction::WithFood),
            "before-sleep" => Ok(Instruction::BeforeSleep),
            other => Err(crate::Error::Other(format!("Unknown instruction: {}", other))),
        }
    }
}

/// One configured daily administration time
///
/// `time` is kept as stored. Only its hour and minute are meaningful;
/// see [`crate::schedule::parse_hour_minute`] for accepted encodings.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Schedule {
    pub id: Uuid,
    pub time: String,
}

impl Schedule {
    /// Create a schedule from a stored time-of-day value.
    pub fn new(time: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            time: time.into(),
        }
    }

    /// Create a well-formed `HH:MM` schedule. `None` if the hour or minute
    /// is out of range.
    pub fn at(hour: u32, minute: u32) -> Option<Self> {
        if hour > 23 || minute > 59 {
            return None;
        }
        Some(Self::new(format!("{:02}:{:02}", hour, minute)))
    }
}

/// A physical dose-holding slot
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Compartment {
    pub id: CompartmentId,
    #[serde(default)]
    pub medication_name: Option<String>,
    #[serde(default)]
    pub dosage: Option<String>,
    #[serde(default)]
    pub instruction: Instruction,
    pub remaining_quantity: u32,
    pub low_stock_threshold: u32,
    #[serde(default)]
    pub schedules: Vec<Schedule>,
}

impl Compartment {
    /// Provision an empty, unconfigured compartment.
    pub fn new(id: u32) -> Self {
        Self {
            id: CompartmentId(id),
            medication_name: None,
            dosage: None,
            instruction: Instruction::None,
            remaining_quantity: DEFAULT_QUANTITY,
            low_stock_threshold: DEFAULT_LOW_STOCK_THRESHOLD,
            schedules: Vec::new(),
        }
    }

    /// Builder-style helper to attach schedules.
    pub fn with_schedules(mut self, schedules: Vec<Schedule>) -> Self {
        self.schedules = schedules;
        self
    }

    /// Remaining quantity at or below the threshold (inclusive).
    pub fn is_low_stock(&self) -> bool {
        self.remaining_quantity <= self.low_stock_threshold
    }

    /// Medication name, or a slot label for unconfigured compartments.
    pub fn display_name(&self) -> String {
        match &self.medication_name {
            Some(name) if !name.trim().is_empty() => name.clone(),
            _ => format!("Compartment {}", self.id.0),
        }
    }
}

/// Look up a compartment by slot id.
pub fn find_compartment(compartments: &[Compartment], id: CompartmentId) -> Option<&Compartment> {
    compartments.iter().find(|c| c.id == id)
}

/// Mutable lookup of a compartment by slot id.
pub fn find_compartment_mut(
    compartments: &mut [Compartment],
    id: CompartmentId,
) -> Option<&mut Compartment> {
    compartments.iter_mut().find(|c| c.id == id)
}

// ============================================================================
// Derived Types
// ============================================================================

/// A dose projected onto today, derived from one schedule
///
/// Never persisted. Links back to its source by id rather than by reference.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScheduledDose {
    pub time: DateTime<FixedOffset>,
    pub compartment_id: CompartmentId,
    pub schedule_id: Uuid,
}
