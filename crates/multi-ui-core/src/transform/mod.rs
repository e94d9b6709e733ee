//! TSX to JSX source transformation
//!
//! Components in the registry are written in the typed dialect. When the
//! stored preference asks for JavaScript, the fetched source goes through a
//! fixed two-stage pipeline:
//!
//! 1. JSX lowering - element/fragment syntax becomes `React.createElement`
//!    calls (`jsx` module)
//! 2. Type stripping - interfaces, annotations, casts and generic argument
//!    lists are deleted from the token stream (`strip` over `lexer`)
//!
//! The pipeline is a deterministic pure function of the input. Source that
//! does not parse under the expected grammar fails the whole operation; no
//! partial output is ever produced.

mod jsx;
mod lexer;
mod strip;

use thiserror::Error;

/// Transformation failure, positioned in the (virtual) input file
#[derive(Debug, Error)]
pub enum TransformError {
    #[error("{file}:{line}:{column}: {message}")]
    Parse {
        file: String,
        line: usize,
        column: usize,
        message: String,
    },
}

impl TransformError {
    /// Build a parse error pointing at a byte offset of the source
    fn at(file: &str, source: &str, offset: usize, message: impl Into<String>) -> Self {
        let mut line = 1;
        let mut column = 1;
        for (i, b) in source.bytes().enumerate() {
            if i >= offset {
                break;
            }
            if b == b'\n' {
                line += 1;
                column = 1;
            } else {
                column += 1;
            }
        }
        TransformError::Parse {
            file: file.to_string(),
            line,
            column,
            message: message.into(),
        }
    }
}

/// Convert typed component source to the untyped dialect.
///
/// `virtual_filename` only labels error messages; nothing is read from disk.
pub fn to_javascript(source: &str, virtual_filename: &str) -> Result<String, TransformError> {
    let lowered = jsx::lower(source, virtual_filename)?;
    strip::strip(&lowered, virtual_filename)
}
