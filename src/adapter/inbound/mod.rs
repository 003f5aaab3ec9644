//! Driving adapters.

pub mod cli;
