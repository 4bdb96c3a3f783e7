//! Reviewer recommendation and assignment-workload engine for conference
//! program committees.

pub mod assignment;
pub mod config;
pub mod conflict;
pub mod error;
pub mod output;
pub mod recommend;
pub mod store;
pub mod track;
pub mod types;
pub mod workload;

pub use error::{OracleError, Result};
