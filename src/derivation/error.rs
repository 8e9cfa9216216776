use anyhow::Error;

/// Failure modes shared by the parent-chain fetcher interfaces.
#[derive(Debug)]
pub enum FetchError {
    NotFound,
    Other(Error),
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound => write!(f, "not found"),
            Self::Other(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for FetchError {}

/// Tells the derivation pipeline how to handle a failure.
#[derive(Debug)]
pub enum DerivationError {
    /// Upstream data disappeared (parent reorg or pruned blob), the pipeline
    /// must rewind.
    Reset(Error),
    /// Transient failure, retry later.
    Temporary(Error),
    /// Malformed protocol data, derivation cannot continue.
    Critical(Error),
}

impl std::fmt::Display for DerivationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Reset(err) => write!(f, "reset: {err}"),
            Self::Temporary(err) => write!(f, "temporary: {err}"),
            Self::Critical(err) => write!(f, "critical: {err}"),
        }
    }
}

impl std::error::Error for DerivationError {}
