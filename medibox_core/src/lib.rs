#![forbid(unsafe_code)]

//! Core domain model and business logic for MediBox.
//!
//! This crate provides:
//! - Domain types (compartments, schedules, scheduled doses)
//! - Today's dose timeline
//! - Session progression and inventory ledger
//! - Low-stock alerts
//! - Persistence (box file) and feedback collaborators

pub mod types;
pub mod error;
pub mod config;
pub mod logging;
pub mod schedule;
pub mod timeline;
pub mod ledger;
pub mod alerts;
pub mod feedback;
pub mod progression;
pub mod store;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use config::Config;
pub use timeline::{annotate, build_today, DoseStatus, DoseView};
pub use ledger::{decrement, reset_all, DEFAULT_RESET_QUANTITY};
pub use alerts::{low_stock, LowStockAlert};
pub use feedback::{FeedbackEvent, FeedbackSink};
pub use progression::{AdministeredDose, DayState, ProgressionTracker, Session, SharedSession};
pub use store::MediBox;
