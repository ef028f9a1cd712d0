//! Switch the interpreter a session resolves to.
//!
//! The crate locates an alternate interpreter (for example `python3.12`) on the
//! search path and computes a new environment in which that interpreter wins
//! executable lookup. It can also provision an isolated environment for it, or
//! register it system-wide with the host's alternatives registry.
//!
//! All switching operations are pure with respect to the process: they take an
//! [`Environment`] value and return a new one. The [`App`] command layer turns
//! the difference into shell `export` lines, which is the only point where a
//! host shell is affected.

mod app;
pub mod cli;
pub mod command;
pub mod config;
pub mod env;
pub mod error;
pub mod external;
pub mod observability;
pub mod script;
pub mod search_path;
pub mod status;
pub mod switcher;
pub mod system;
pub mod venv;
pub mod version;

pub use app::{App, Confirm, Prompt, exit_code_for};
pub use config::{Config, Target};
pub use env::Environment;
pub use error::SwitchError;
pub use search_path::SearchPath;
pub use switcher::{Activation, activate, link, restore};
