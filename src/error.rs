//! Error types for StickFix
//!
//! Store and transport failures are converted into result sums at their
//! source; only the two fatal conditions below escape the core.

use crate::database::SchemaError;
use thiserror::Error;

/// Fatal errors surfaced to the binary
#[derive(Error, Debug)]
pub enum StickfixError {
    /// The database cannot be opened or its schema created
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    /// A persisted state tag does not name any known state
    #[error("cannot resolve user state name: {name}")]
    StateResolution {
        /// The unrecognized tag name
        name: String,
    },
}
