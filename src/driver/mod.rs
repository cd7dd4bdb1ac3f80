//! Analysis driver: runs the external analyzer on one artifact at a time.
//!
//! This module builds the analyzer's environment, runs it as a child
//! process and pulls the structured result out of its output.

pub mod extract;
pub mod invoke;

pub use invoke::{AnalysisDriver, DriverConfig};
