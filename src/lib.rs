// ftb-debug - diagnostic collection tool for the FTB App
//
// This is the library crate containing the diagnostic pipeline. The binary
// crate (main.rs) provides the CLI entry point.

pub mod logging;
pub mod models;
pub mod platform;
pub mod services;

// Re-export commonly used types for convenience
pub use models::{Manifest, NetworkCheck};
pub use platform::HostEnv;
pub use services::{run_diagnostics, RunOptions, Uploader};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
