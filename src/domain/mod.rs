//! Core domain types and logic.

pub mod cadence;
pub mod comparison;
pub mod config_validation;
pub mod error;
pub mod fees;
pub mod price;
pub mod simulation;
pub mod summary;
