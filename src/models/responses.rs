use serde::{Deserialize, Serialize};
use crate::models::domain::RankedMatch;

/// Response for the recommendations endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationsResponse {
    pub matches: Vec<RankedMatch>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

/// Block recording response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockAlumniResponse {
    pub success: bool,
}

/// Blocked alumni listing for one student
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockedAlumniResponse {
    #[serde(rename = "studentId")]
    pub student_id: String,
    #[serde(rename = "blockedAlumni")]
    pub blocked_alumni: Vec<String>,
    pub count: usize,
}

/// Whether the external ranker is set up
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankerConfigResponse {
    #[serde(rename = "hasKey")]
    pub has_key: bool,
    pub model: String,
}
