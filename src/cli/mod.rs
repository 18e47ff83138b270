//! Command Line Interface (CLI) layer for the sen2cor wrapper.
//!
//! This module defines argument parsing (`args`), error types (`errors`),
//! and the dispatch logic (`runner`) for the single-product, batch and
//! metadata-only flows. It wires user-provided options to the library
//! functionality exposed via `sen2cor_wrapper::api`.
pub mod args;
pub mod errors;
pub mod runner;

pub use args::CliArgs;
pub use runner::run;
