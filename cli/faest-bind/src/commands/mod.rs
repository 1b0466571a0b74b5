//! CLI command implementations.

pub mod clean;
pub mod declarations;
pub mod doctor;
pub mod platform;
pub mod resolve;
