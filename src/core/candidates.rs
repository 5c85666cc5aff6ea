use crate::error::RecommendError;
use crate::models::{AlumniCandidate, RecommendationLimits, StudentProfile, UserRecord};
use async_trait::async_trait;
use std::collections::HashSet;

/// Read access to the user directory
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Resolve a user by primary key, then by the `id` field; `None` if neither matches
    async fn get_user(&self, id: &str) -> Result<Option<UserRecord>, RecommendError>;

    /// Alumni whose skills contain any of `tags`, at most `limit` records
    async fn query_alumni_by_skills(
        &self,
        tags: &[String],
        limit: usize,
    ) -> Result<Vec<UserRecord>, RecommendError>;

    /// Every alumni record in the directory
    async fn list_alumni(&self) -> Result<Vec<UserRecord>, RecommendError>;
}

/// Append-only store of dismissed recommendations
#[async_trait]
pub trait BlockStore: Send + Sync {
    async fn get_blocks(&self, student_id: &str) -> Result<HashSet<String>, RecommendError>;

    async fn add_block(&self, student_id: &str, alumni_id: &str) -> Result<(), RecommendError>;

    /// Cheap connectivity probe used by the health endpoint
    async fn ping(&self) -> bool {
        true
    }
}

/// Student plus the alumni eligible to be recommended to them
#[derive(Debug, Clone)]
pub struct CandidateSet {
    pub student: StudentProfile,
    pub candidates: Vec<AlumniCandidate>,
    /// Blocked alumni ids, kept so ranked output can be re-checked
    pub blocked: HashSet<String>,
}

/// Load the student and their non-blocked alumni candidates
///
/// The targeted query uses the first `interest_tags` interests (lower-cased)
/// and is capped at `interest_query_limit`. When it returns nothing, or the
/// student has no interests, every alumni record is considered instead.
pub async fn load_candidates(
    directory: &dyn UserDirectory,
    blocks: &dyn BlockStore,
    student_id: &str,
    limits: &RecommendationLimits,
) -> Result<CandidateSet, RecommendError> {
    let record = directory
        .get_user(student_id)
        .await?
        .ok_or_else(|| RecommendError::NotFound(format!("Student {} not found", student_id)))?;

    let student = record.to_student(student_id);

    let interest_tags: Vec<String> = student
        .interests
        .iter()
        .map(|i| i.trim().to_lowercase())
        .filter(|i| !i.is_empty())
        .take(limits.interest_tags)
        .collect();

    // Block set and alumni records are independent reads
    let (blocked, alumni) = tokio::try_join!(
        blocks.get_blocks(student_id),
        fetch_alumni(directory, &interest_tags, limits.interest_query_limit),
    )?;

    let mut seen = HashSet::new();
    let candidates: Vec<AlumniCandidate> = alumni
        .iter()
        .filter_map(UserRecord::to_candidate)
        .filter(|c| c.id != student.id && !blocked.contains(&c.id))
        .filter(|c| seen.insert(c.id.clone()))
        .collect();

    tracing::debug!(
        "Loaded {} candidates for {} ({} blocked, {} interest tags)",
        candidates.len(),
        student_id,
        blocked.len(),
        interest_tags.len()
    );

    Ok(CandidateSet {
        student,
        candidates,
        blocked,
    })
}

async fn fetch_alumni(
    directory: &dyn UserDirectory,
    interest_tags: &[String],
    limit: usize,
) -> Result<Vec<UserRecord>, RecommendError> {
    if !interest_tags.is_empty() {
        let targeted = directory.query_alumni_by_skills(interest_tags, limit).await?;
        if !targeted.is_empty() {
            return Ok(targeted);
        }
        tracing::debug!("No alumni share the student's interests, falling back to all alumni");
    }

    directory.list_alumni().await
}
