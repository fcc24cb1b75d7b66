// Shared modules
pub(crate) mod cli;
mod run;

// Entry points
pub mod main;
