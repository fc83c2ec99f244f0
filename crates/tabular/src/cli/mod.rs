//! Subcommands of the `tabular` binary.

pub mod diff;
pub mod error;
pub mod infer;
pub mod output;
pub mod pack;
pub mod validate;
