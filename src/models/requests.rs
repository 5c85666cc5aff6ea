use serde::{Deserialize, Serialize};
use validator::Validate;

/// Query string for the recommendations endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationsQuery {
    #[serde(alias = "student_id", rename = "studentId", default)]
    pub student_id: Option<String>,
}

impl RecommendationsQuery {
    /// The trimmed student id, if one was supplied
    pub fn student_id(&self) -> Option<&str> {
        self.student_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }
}

/// Request to hide an alumnus from a student's recommendations
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct BlockAlumniRequest {
    #[validate(length(min = 1))]
    #[serde(alias = "student_id", rename = "studentId")]
    pub student_id: String,
    #[validate(length(min = 1))]
    #[serde(alias = "alumni_id", rename = "alumniId")]
    pub alumni_id: String,
}
