//! # infobot-cli
//!
//! Argument parsing, configuration loading and component wiring for the `infobot` binary.

pub mod app;
pub mod cli;
pub mod config;

pub use app::{open_store, App};
pub use cli::{Cli, Commands, TimeRange, UploadInput};
pub use config::{AppConfig, SavableDetectorKind, StoreType};
