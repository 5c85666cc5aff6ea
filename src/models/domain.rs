use serde::{Deserialize, Deserializer, Serialize};

/// Skills kept per candidate projection
pub const MAX_CANDIDATE_SKILLS: usize = 20;
/// Interests kept per candidate projection
pub const MAX_CANDIDATE_INTERESTS: usize = 10;
/// Bio length (in characters) kept per candidate projection
pub const MAX_BIO_CHARS: usize = 200;
/// Hard cap on matches returned for one request
pub const MAX_MATCHES: usize = 10;

/// User document as stored in the `users` collection
///
/// Students and alumni share the collection and are told apart by `role`.
/// Unset attributes come back from Appwrite as `null`, so every plain field
/// is read through [`null_default`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserRecord {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "null_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_default")]
    pub email: String,
    #[serde(default, deserialize_with = "null_default")]
    pub role: String,
    #[serde(default, deserialize_with = "null_default")]
    pub position: String,
    #[serde(default, deserialize_with = "null_default")]
    pub company: String,
    #[serde(default, deserialize_with = "null_default")]
    pub skills: Vec<String>,
    #[serde(default, deserialize_with = "null_default")]
    pub interests: Vec<String>,
    #[serde(default, deserialize_with = "goals_text")]
    pub goals: String,
    #[serde(default, deserialize_with = "null_default")]
    pub industry: String,
    #[serde(default, deserialize_with = "null_default")]
    pub bio: String,
    #[serde(default)]
    pub major: Option<String>,
    #[serde(rename = "graduationYear", default)]
    pub graduation_year: Option<i32>,
    #[serde(default)]
    pub location: Option<String>,
}

impl UserRecord {
    /// The record's identifier, ignoring blank values
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref().map(str::trim).filter(|id| !id.is_empty())
    }

    pub fn is_alumni(&self) -> bool {
        self.role.eq_ignore_ascii_case("alumni")
    }

    /// Project this record into the student view used for ranking
    pub fn to_student(&self, fallback_id: &str) -> StudentProfile {
        StudentProfile {
            id: self.id().unwrap_or(fallback_id).to_string(),
            name: self.name.clone(),
            position: self.position.clone(),
            skills: self.skills.clone(),
            interests: self.interests.clone(),
            goals: self.goals.clone(),
            industry: self.industry.clone(),
        }
    }

    /// Project this record into a bounded candidate; records without an id are unusable
    pub fn to_candidate(&self) -> Option<AlumniCandidate> {
        let id = self.id()?;

        Some(AlumniCandidate {
            id: id.to_string(),
            name: self.name.clone(),
            position: self.position.clone(),
            company: self.company.clone(),
            skills: self.skills.iter().take(MAX_CANDIDATE_SKILLS).cloned().collect(),
            interests: self.interests.iter().take(MAX_CANDIDATE_INTERESTS).cloned().collect(),
            bio: truncate_chars(&self.bio, MAX_BIO_CHARS),
        })
    }
}

/// Student view used as the ranking query
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StudentProfile {
    pub id: String,
    pub name: String,
    pub position: String,
    pub skills: Vec<String>,
    pub interests: Vec<String>,
    pub goals: String,
    pub industry: String,
}

/// Alumni record projected for ranking
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlumniCandidate {
    pub id: String,
    pub name: String,
    pub position: String,
    pub company: String,
    pub skills: Vec<String>,
    pub interests: Vec<String>,
    pub bio: String,
}

/// A student's dismissal of one recommended alumnus
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockRecord {
    #[serde(rename = "studentId")]
    pub student_id: String,
    #[serde(rename = "alumniId")]
    pub alumni_id: String,
    #[serde(rename = "blockedAt")]
    pub blocked_at: chrono::DateTime<chrono::Utc>,
}

/// Ranked recommendation returned to the dashboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedMatch {
    pub alumni: AlumniCandidate,
    #[serde(rename = "matchScore")]
    pub match_score: u8,
    pub reasons: Vec<String>,
    #[serde(rename = "sharedSkills")]
    pub shared_skills: Vec<String>,
    /// Not computed yet; always `false`
    #[serde(rename = "industryMatch")]
    pub industry_match: bool,
}

/// Which path produced a ranking
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankingSource {
    External,
    Heuristic,
    Empty,
}

/// Bounds applied while selecting and ranking candidates
#[derive(Debug, Clone, Copy)]
pub struct RecommendationLimits {
    /// Matches returned per request, never above [`MAX_MATCHES`]
    pub max_matches: usize,
    /// Leading student interests used for the targeted alumni query
    pub interest_tags: usize,
    /// Cap on the targeted alumni query
    pub interest_query_limit: usize,
    /// Candidates sent to the external ranker
    pub ranker_candidates: usize,
}

impl Default for RecommendationLimits {
    fn default() -> Self {
        Self {
            max_matches: MAX_MATCHES,
            interest_tags: 10,
            interest_query_limit: 200,
            ranker_candidates: 20,
        }
    }
}

impl RecommendationLimits {
    /// Limits with `max_matches` brought within [`MAX_MATCHES`]
    pub fn clamped(self) -> Self {
        Self {
            max_matches: self.max_matches.min(MAX_MATCHES),
            ..self
        }
    }
}

/// Truncate to at most `max` characters without splitting a code point
pub fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

fn null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Goals are free text, but older profiles stored them as a list
fn goals_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Goals {
        Text(String),
        List(Vec<String>),
    }

    Ok(match Option::<Goals>::deserialize(deserializer)? {
        Some(Goals::Text(text)) => text,
        Some(Goals::List(items)) => items.join("; "),
        None => String::new(),
    })
}
