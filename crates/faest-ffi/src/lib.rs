//! The FFI-facing half of the FAEST binding pipeline.
//!
//! Owns the fixed C interface of `libfaest` and turns a located library into
//! a [`BuildDescriptor`] for the compilation step.
//!
//! ## Modules
//!
//! - [`csig`] — C declaration parser and renderer
//! - [`params`] — the twelve FAEST parameter sets and their sizes
//! - [`declaration`] — the constant and function table exposed to bindings
//! - [`contract`] — checks installed headers against the table
//! - [`descriptor`] — build descriptor emission and rendering

pub mod contract;
pub mod csig;
pub mod declaration;
pub mod descriptor;
pub mod error;
pub mod params;

pub use contract::check_headers;
pub use csig::{CParam, CSignature, CType};
pub use declaration::{Constant, DeclarationTable, EntryPoint, SizeKind};
pub use descriptor::{emit, BuildDescriptor, RuntimeSearch};
pub use error::{FfiError, Result};
pub use params::{KeySizes, ParameterSet};
