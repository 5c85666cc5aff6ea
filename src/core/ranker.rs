use crate::core::extract::{ExtractError, RankedItem};
use crate::models::{AlumniCandidate, StudentProfile};
use async_trait::async_trait;
use thiserror::Error;

/// Why the external ranker produced no usable ranking
///
/// Every variant is recovered by the heuristic fallback.
#[derive(Debug, Error)]
pub enum RankerError {
    #[error("ranker not configured")]
    NotConfigured,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("could not build ranker request: {0}")]
    Request(#[from] serde_json::Error),

    #[error("invalid ranker output: {0}")]
    Output(#[from] ExtractError),
}

/// Re-ranks candidates with broader judgement than the local heuristic
#[async_trait]
pub trait ExternalRanker: Send + Sync {
    /// Whether the ranker has everything it needs to be called
    fn is_configured(&self) -> bool;

    /// Rank `candidates` for `student`, best first; at least one entry on success
    async fn rank(
        &self,
        student: &StudentProfile,
        candidates: &[AlumniCandidate],
    ) -> Result<Vec<RankedItem>, RankerError>;
}
