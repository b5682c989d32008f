//! Host error taxonomy (§7 ambient addition).
//!
//! `HostError` covers failures a *host* needs to report with structure
//! (I/O, ambiguous resolution, cycles, miscompiled modules) — it is
//! deliberately disjoint from program [`Option`]-failure (`None`), which is
//! a first-class outcome of `eval`, not an exceptional one. A missing
//! record key is a `None`; a module file that can't be opened is a
//! `HostError::Io`. `thiserror` is used for the enum, as elsewhere in the
//! example pack's host-level error types.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum HostError {
    #[error("io error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("ambiguous module resolution for `{name}`: {candidates:?}")]
    Ambiguous { name: String, candidates: Vec<PathBuf> },

    #[error("import cycle detected: {chain:?}")]
    Cycle { chain: Vec<String> },

    #[error("compile failure in module `{module}`: {reason}")]
    CompileFailure { module: String, reason: String },

    #[error("arity mismatch: expected {expected:?}, computed {actual:?}")]
    ArityMismatch { expected: String, actual: String },

    #[error("bootstrap fixed point not reached: g0 compiled against itself twice and disagreed")]
    BootstrapFixedPoint,

    #[error("malformed compiler module `{module}`: {reason}")]
    MalformedCompilerModule { module: String, reason: String },

    #[error("no module named `{0}` found on the search path")]
    NotFound(String),
}

pub type HostResult<T> = Result<T, HostError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages_are_non_empty() {
        let e = HostError::BootstrapFixedPoint;
        assert!(!e.to_string().is_empty());
    }
}
