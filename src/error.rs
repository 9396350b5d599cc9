//! Error taxonomy for the decode → select → emit pipeline.
//!
//! Every variant is terminal for the run. Unresolved type references are *not*
//! errors: they denote primitives or externally defined types and are recorded
//! on the closure instead.

use thiserror::Error;

/// Message markers for discriminant failures raised inside serde dispatch.
/// Decode classification matches on them to pull `UnknownDiscriminant` back
/// out of the flattened serde error text.
pub(crate) const UNKNOWN_TYPE_KIND: &str = "unhandled type kind";
pub(crate) const UNKNOWN_VALUE_KIND: &str = "unhandled value kind";

#[derive(Debug, Error)]
pub enum Error {
    /// The document is not parseable JSON at all.
    #[error("malformed input: {0}")]
    MalformedInput(#[source] serde_json::Error),

    /// A tagged node carries a `kind` outside the recognized set. Never
    /// defaulted; the diagnostic names the offending tag and its JSON path.
    #[error("unknown discriminant at {path}: {message}")]
    UnknownDiscriminant { path: String, message: String },

    /// The document is JSON but does not match the schema structurally.
    #[error("schema decode failed at {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// Target rendering cannot represent a construct.
    #[error("cannot render {type_name}: {message}")]
    Emit { type_name: String, message: String },
}

impl Error {
    pub(crate) fn classify_decode(path: String, source: serde_json::Error) -> Self {
        let message = source.to_string();
        if message.contains(UNKNOWN_TYPE_KIND) || message.contains(UNKNOWN_VALUE_KIND) {
            Self::UnknownDiscriminant { path, message }
        } else {
            Self::Decode { path, source }
        }
    }
}
