//! Utility functions and helpers.

pub mod logging;
pub mod redact;
pub mod settings;

pub use redact::{Redactor, SECRET_NAMES};
pub use settings::{Secrets, Settings};
