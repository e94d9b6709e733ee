//! Multi UI Core - Shared library behind the `multi-ui` CLI
//!
//! This library holds everything the CLI binary does apart from argument
//! parsing: preference persistence, registry fetching, the TSX to JSX
//! conversion pipeline, and the setup/add flows themselves.
//!
//! # Architecture
//!
//! The library is organized into layers:
//!
//! - **Layer 1: Core Operations** - Preference store, registry fetcher, source transform, file materialization
//! - **Layer 2: Workflow Orchestration** - `run_setup`/`run_add` with injectable prompts and installer
//! - **Layer 3: CLI/TUI Interface** - Optional cliclack-based prompts (feature-gated)
//!
//! # Feature Flags
//!
//! - `tui` (default): Enables the cliclack-based TUI prompts module
//!
//! # Example Usage (without TUI)
//!
//! ```ignore
//! use multi_ui_core::{ops, registry::ComponentFetcher};
//!
//! let fetcher = ComponentFetcher::from_env("my-tool/1.0")?;
//! let outcome = ops::run_add(&std::env::current_dir()?, &fetcher, "Button_1").await?;
//! println!("wrote {}", outcome.file_path.display());
//! ```

pub mod config;
pub mod install;
pub mod materialize;
pub mod ops;
pub mod registry;
pub mod transform;

#[cfg(feature = "tui")]
pub mod tui;

// Re-export main types for convenience
pub use config::{Language, Preference, PreferenceStore};
pub use ops::{run_add, run_setup, AddOutcome, SetupOutcome};
pub use registry::ComponentFetcher;

#[cfg(feature = "tui")]
pub use tui::{add_flow, setup_flow};
