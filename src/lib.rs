pub mod cli;
pub mod config;
pub mod greenfield;
pub mod helpers;
