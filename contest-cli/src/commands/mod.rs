//! CLI command implementations.

pub mod check;
pub mod configure;
pub mod register;
pub mod run;
pub mod status;
