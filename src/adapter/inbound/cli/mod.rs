//! CLI module graph.

pub mod blacklist;
pub mod check;
pub mod command;
pub mod dispatch;
pub mod output;
pub mod run;
