//! # draftfix: ABAP draft-filter remediation
//!
//! > **Every `SELECT *` on billing tables must skip drafts.**
//!
//! SAP Note 2768887 added draft billing documents to `VBRK` and `VBRP`.
//! draftfix scans ABAP source for `SELECT *` / `SELECT SINGLE *` reads of
//! those tables and proposes the same statement with
//! `<TABLE>-DRAFT = SPACE` added.
//!
//! ## Quick Example
//!
//! ```
//! use draftfix::prelude::*;
//!
//! let unit = CodeUnit::new("ZBILL", "ZBILL_F01", "FORM", "SELECT * FROM VBRK INTO TABLE LT_VBRK.");
//! let results = Remediator::default().process_batch(&[unit]);
//!
//! assert_eq!(
//!     results[0].selects()[0].suggested_statement.as_deref(),
//!     Some("SELECT * FROM VBRK WHERE VBRK-DRAFT = SPACE INTO TABLE LT_VBRK."),
//! );
//! ```
//!
//! ## Pipeline
//!
//! | Stage     | Module      | Function                                  |
//! |-----------|-------------|-------------------------------------------|
//! | Locate    | `locator`   | Find `SELECT *` statements and their spans |
//! | Inject    | `injector`  | Add the `DRAFT` condition when missing     |
//! | Edit      | `editor`    | Splice rewrites into the original text     |
//! | Assemble  | `processor` | Build per-unit results for the output mode |

pub mod config;
pub mod editor;
pub mod error;
pub mod injector;
pub mod locator;
pub mod model;
pub mod processor;
pub mod server;

pub mod prelude {
    pub use crate::config::{OutputMode, RemediatorConfig};
    pub use crate::editor::{Edit, apply_edits};
    pub use crate::error::*;
    pub use crate::injector::{ensure_draft_filter, is_governed, normalize_whitespace};
    pub use crate::locator::{CharCursor, LocatedStatement, find_selects};
    pub use crate::model::*;
    pub use crate::processor::{Remediator, UnitAnalysis};
}

/// Remediate a batch with the given output mode and default settings.
///
/// # Example
///
/// ```
/// use draftfix::{remediate, config::OutputMode, model::CodeUnit};
///
/// let unit = CodeUnit::new("Z", "Z", "PROG", "SELECT SINGLE * FROM vbrp INTO ls_vbrp.");
/// let out = remediate(&[unit], OutputMode::Rewrite);
/// assert_eq!(
///     out[0].remediated_code(),
///     Some("SELECT SINGLE * FROM vbrp WHERE VBRP-DRAFT = SPACE INTO ls_vbrp."),
/// );
/// ```
pub fn remediate(units: &[model::CodeUnit], mode: config::OutputMode) -> Vec<model::UnitResult> {
    let config = config::RemediatorConfig::builder().mode(mode).build();
    processor::Remediator::new(config).process_batch(units)
}
