//! Command line front end for guarded namespace deletion
//!
//! Wires the portal providers into a `DeletionGuard` and drives one deletion
//! attempt from the terminal, re-submitting with overrides when the operator
//! accepts a warning.

pub mod config;
pub mod logging;
pub mod session;
pub mod shutdown;
pub mod terminal;

pub use config::{Cli, Command, Configuration, DeleteArgs};
pub use logging::{LoggingConfig, LoggingGuard, init_logging};
pub use session::{DeleteSession, Prompt, SessionOutcome, exit_status};
pub use terminal::{DialogSignal, TerminalNotifier, TerminalPresentation, TerminalPrompt};
