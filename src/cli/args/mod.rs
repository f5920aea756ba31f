//! Shared CLI argument types

mod common;
mod invocation;

pub use common::OutputFormat;
pub use invocation::Invocation;
