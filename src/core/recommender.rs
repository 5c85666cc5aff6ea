use crate::core::{
    candidates::{load_candidates, BlockStore, CandidateSet, UserDirectory},
    extract::RankedItem,
    ranker::ExternalRanker,
    scoring::{heuristic_score, shared_skills},
};
use crate::error::RecommendError;
use crate::models::{AlumniCandidate, RankedMatch, RankingSource, RecommendationLimits, StudentProfile};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Result of one recommendation run
#[derive(Debug, Clone)]
pub struct Recommendation {
    pub matches: Vec<RankedMatch>,
    pub source: RankingSource,
    pub total_candidates: usize,
}

/// Ranking orchestrator
///
/// # Flow
/// 1. Load the student and their non-blocked candidates
/// 2. Ask the external ranker, if one is configured
/// 3. Fall back to the skill-overlap heuristic when it is absent or fails
///
/// The recommender holds no per-student state; two calls with unchanged
/// inputs produce the same heuristic ranking.
#[derive(Clone)]
pub struct Recommender {
    directory: Arc<dyn UserDirectory>,
    blocks: Arc<dyn BlockStore>,
    ranker: Option<Arc<dyn ExternalRanker>>,
    limits: RecommendationLimits,
}

impl Recommender {
    pub fn new(
        directory: Arc<dyn UserDirectory>,
        blocks: Arc<dyn BlockStore>,
        ranker: Option<Arc<dyn ExternalRanker>>,
        limits: RecommendationLimits,
    ) -> Self {
        Self {
            directory,
            blocks,
            ranker,
            limits: limits.clamped(),
        }
    }

    /// Produce up to `max_matches` recommendations for a student, best first
    pub async fn recommend(&self, student_id: &str) -> Result<Recommendation, RecommendError> {
        let student_id = student_id.trim();
        if student_id.is_empty() {
            return Err(RecommendError::Validation("studentId is required".to_string()));
        }

        let set = load_candidates(
            self.directory.as_ref(),
            self.blocks.as_ref(),
            student_id,
            &self.limits,
        )
        .await?;

        let total_candidates = set.candidates.len();
        if total_candidates == 0 {
            tracing::info!("No eligible alumni for student {}", student_id);
            return Ok(Recommendation {
                matches: Vec::new(),
                source: RankingSource::Empty,
                total_candidates,
            });
        }

        if let Some(matches) = self.try_external(&set).await {
            return Ok(Recommendation {
                matches,
                source: RankingSource::External,
                total_candidates,
            });
        }

        Ok(Recommendation {
            matches: heuristic_ranking(&set.student, &set.candidates, self.limits.max_matches),
            source: RankingSource::Heuristic,
            total_candidates,
        })
    }

    /// External ranking, or `None` when the heuristic should be used
    async fn try_external(&self, set: &CandidateSet) -> Option<Vec<RankedMatch>> {
        let ranker = self.ranker.as_ref().filter(|r| r.is_configured())?;

        let pool = &set.candidates[..set.candidates.len().min(self.limits.ranker_candidates)];

        match ranker.rank(&set.student, pool).await {
            Ok(items) => {
                let matches = merge_ranking(
                    &set.student,
                    &set.candidates,
                    &set.blocked,
                    items,
                    self.limits.max_matches,
                );
                if matches.is_empty() {
                    tracing::warn!(
                        "External ranking for {} kept no entries, using heuristic",
                        set.student.id
                    );
                    return None;
                }
                Some(matches)
            }
            Err(e) => {
                tracing::warn!(
                    "External ranking failed for {}, using heuristic: {}",
                    set.student.id,
                    e
                );
                None
            }
        }
    }
}

/// Score every candidate with the heuristic and keep the best `limit`
pub fn heuristic_ranking(
    student: &StudentProfile,
    candidates: &[AlumniCandidate],
    limit: usize,
) -> Vec<RankedMatch> {
    let mut matches: Vec<RankedMatch> = candidates
        .iter()
        .map(|candidate| RankedMatch {
            match_score: heuristic_score(student, candidate),
            reasons: Vec::new(),
            shared_skills: shared_skills(student, candidate),
            industry_match: false,
            alumni: candidate.clone(),
        })
        .collect();

    sort_and_truncate(&mut matches, limit);
    matches
}

/// Join validated ranker entries back to the candidate set
///
/// Unknown ids resolve to a stub built from the fields the model echoed.
/// Repeated ids keep their first entry and blocked ids are dropped.
pub fn merge_ranking(
    student: &StudentProfile,
    candidates: &[AlumniCandidate],
    blocked: &HashSet<String>,
    items: Vec<RankedItem>,
    limit: usize,
) -> Vec<RankedMatch> {
    let by_id: HashMap<&str, &AlumniCandidate> =
        candidates.iter().map(|c| (c.id.as_str(), c)).collect();
    let mut seen = HashSet::new();

    let mut matches: Vec<RankedMatch> = items
        .into_iter()
        .filter(|item| !blocked.contains(&item.id) && seen.insert(item.id.clone()))
        .map(|item| {
            let alumni = match by_id.get(item.id.as_str()) {
                Some(candidate) => (*candidate).clone(),
                None => {
                    tracing::debug!("Ranker returned unknown candidate id {}", item.id);
                    stub_candidate(&item)
                }
            };

            RankedMatch {
                shared_skills: shared_skills(student, &alumni),
                match_score: item.score,
                reasons: item.reasons,
                industry_match: false,
                alumni,
            }
        })
        .collect();

    sort_and_truncate(&mut matches, limit);
    matches
}

fn stub_candidate(item: &RankedItem) -> AlumniCandidate {
    AlumniCandidate {
        id: item.id.clone(),
        name: item.name.clone().unwrap_or_default(),
        position: item.position.clone().unwrap_or_default(),
        company: item.company.clone().unwrap_or_default(),
        skills: item.skills.clone(),
        interests: Vec::new(),
        bio: String::new(),
    }
}

/// Descending by score; ties keep their incoming order
fn sort_and_truncate(matches: &mut Vec<RankedMatch>, limit: usize) {
    matches.sort_by(|a, b| b.match_score.cmp(&a.match_score));
    matches.truncate(limit);
}
