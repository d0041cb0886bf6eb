#![deny(clippy::all)]
#![allow(clippy::module_name_repetitions)]

//! Reactive variable store for interactive documents.
//!
//! Widgets in a document bind to named variables. Literal variables are
//! written by user interaction; derived variables are recomputed from
//! formulas by an evaluation pass. Every change flows through the pure
//! [`variables::reduce`] function, owned and published by a
//! [`store::Store`].

pub mod config;
pub mod evaluation;
pub mod format;
pub mod range;
pub mod store;
pub mod variables;

#[must_use]
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// One-line build summary for diagnostics.
#[must_use]
pub fn doctor_stub() -> String {
    format!("inkvar-core v{} on {}", version(), std::env::consts::OS)
}
