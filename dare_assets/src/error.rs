use crate::ids::AssetId;
use thiserror::Error;

/// Recoverable Registry failures. State-machine precondition violations are
/// deliberately not a variant here: spec treats them as programmer errors,
/// not runtime-recoverable, so the Registry panics on them directly instead
/// of handing back an `Err` a caller could swallow.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("no metadata for asset {0:?}")]
    NotFound(AssetId),
    #[error("path already interned under a different kind: {path}")]
    KindConflict { path: String },
}

#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("read exceeded size cap of {cap} bytes")]
    ReadFailure { cap: usize },
    #[error("unsupported asset extension: {0}")]
    UnsupportedAssetType(String),
    #[error("i/o error reading asset bytes: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to decode asset bytes: {0}")]
    DecodeFailure(String),
    #[error(transparent)]
    Gpu(#[from] dagal::DagalError),
}
