use std::path::PathBuf;
use thiserror::Error;

/// Terminal error conditions for a rotation run.
///
/// Per-request failures are never errors at this level: they are classified
/// into an outcome kind on the record itself and the run continues. Only an
/// empty pool aborts a run, and an export failure never invalidates the
/// already-collected ledger.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("no egress endpoints discovered")]
    PoolUnavailable,

    #[error("invalid target url {url:?}")]
    InvalidTarget {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("failed to write {}", path.display())]
    ExportFailure {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },
}
