//! Common configuration and shared types for the PCTD workspace.
//!
//! This crate provides the detector configuration (with its builder), the
//! risk tier policy, the register hint set, and the design source scanner
//! that harvests hints from Verilog text.

mod config;
pub mod design;
mod hints;
mod risk;

pub use crate::config::*;
pub use crate::design::{DesignError, DesignSummary, scan_design, scan_design_file};
pub use crate::hints::HintSet;
pub use crate::risk::*;
