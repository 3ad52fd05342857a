//! Aliman focus client CLI library.
//!
//! This crate provides the terminal front end: argument parsing,
//! configuration, rendering and the interactive focus loop.

mod cli;
pub mod commands;
mod config;
pub mod focus_loop;
pub mod terminal;

pub use cli::{ChatAction, Cli, Commands, Credentials, PlansAction};
pub use config::Config;
