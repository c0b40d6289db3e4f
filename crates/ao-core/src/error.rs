use std::fmt;

use thiserror::Error;

use crate::envelope::ValidationReport;

pub type AoResult<T> = Result<T, AoError>;

/// Which legal-identifier set a token was matched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentKind {
    Environment,
    Application,
    File,
    /// Bare token checked against both environments and applications.
    Identifier,
}

impl fmt::Display for IdentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            IdentKind::Environment => "environment",
            IdentKind::Application => "application",
            IdentKind::File => "file",
            IdentKind::Identifier => "identifier",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Error)]
pub enum AoError {
    #[error("{token}: not a unique {kind} identifier, matching {}", candidates.join(", "))]
    AmbiguousIdentifier {
        kind: IdentKind,
        token: String,
        candidates: Vec<String>,
    },
    #[error("{}", no_match_message(*kind, token))]
    NoMatch { kind: IdentKind, token: String },
    #[error("no such {0}")]
    NotFound(String),
    #[error("invalid configuration: {0}")]
    Validation(ValidationReport),
    #[error("{0}")]
    Transport(String),
    #[error("internal error: {0}")]
    Inconsistency(String),
    #[error("operation cancelled by user")]
    Cancelled,
    #[error("decode {what}: {source}")]
    Decode {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("cluster config error: {0}")]
    Config(String),
    #[error("usage: {0}")]
    Usage(String),
    #[error("prompt error: {0}")]
    Prompt(String),
    #[error("http client error: {0}")]
    Http(#[from] reqwest::Error),
}

fn no_match_message(kind: IdentKind, token: &str) -> String {
    match kind {
        IdentKind::Identifier => format!("no match found for {token}"),
        kind => format!("no matching {kind} found for {token}"),
    }
}

impl AoError {
    pub(crate) fn decode(what: &'static str, source: serde_json::Error) -> Self {
        AoError::Decode { what, source }
    }

    /// True for the user-initiated abort, which callers report as a notice rather than a failure.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, AoError::Cancelled)
    }
}
