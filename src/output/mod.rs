//! Output formatters for duplicate scan results.
//!
//! - [`text`]: human-readable report with optional color
//! - [`json`]: machine-readable document for scripting
//!
//! # Example
//!
//! ```no_run
//! use dupehunter::duplicates::DuplicateFinder;
//! use dupehunter::output::TextOutput;
//! use std::path::Path;
//!
//! let report = DuplicateFinder::with_defaults().find_duplicates(Path::new(".")).unwrap();
//! TextOutput::from_report(&report, false)
//!     .write_to(&mut std::io::stdout())
//!     .unwrap();
//! ```

pub mod json;
pub mod text;

pub use json::{JsonOutput, JsonOutputError};
pub use text::TextOutput;
