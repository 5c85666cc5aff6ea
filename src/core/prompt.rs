use crate::models::domain::{truncate_chars, MAX_BIO_CHARS, MAX_CANDIDATE_INTERESTS, MAX_CANDIDATE_SKILLS};
use crate::models::{AlumniCandidate, StudentProfile};
use serde::Serialize;

/// Skills and interests of the student sent to the ranker
const MAX_STUDENT_TAGS: usize = 20;

#[derive(Debug, Serialize)]
struct StudentSummary<'a> {
    id: &'a str,
    name: &'a str,
    position: &'a str,
    skills: &'a [String],
    interests: &'a [String],
    goals: &'a str,
    industry: &'a str,
}

#[derive(Debug, Serialize)]
struct CandidateSummary<'a> {
    id: &'a str,
    name: &'a str,
    position: &'a str,
    company: &'a str,
    skills: &'a [String],
    interests: &'a [String],
    bio: String,
}

/// Build the re-ranking prompt for a student and up to `max_candidates` candidates
pub fn ranking_prompt(
    student: &StudentProfile,
    candidates: &[AlumniCandidate],
    max_candidates: usize,
) -> Result<String, serde_json::Error> {
    let student_json = serde_json::to_string(&StudentSummary {
        id: &student.id,
        name: &student.name,
        position: &student.position,
        skills: head(&student.skills, MAX_STUDENT_TAGS),
        interests: head(&student.interests, MAX_STUDENT_TAGS),
        goals: &student.goals,
        industry: &student.industry,
    })?;

    let summaries: Vec<CandidateSummary> = candidates
        .iter()
        .take(max_candidates)
        .map(|c| CandidateSummary {
            id: &c.id,
            name: &c.name,
            position: &c.position,
            company: &c.company,
            skills: head(&c.skills, MAX_CANDIDATE_SKILLS),
            interests: head(&c.interests, MAX_CANDIDATE_INTERESTS),
            bio: truncate_chars(&c.bio, MAX_BIO_CHARS),
        })
        .collect();
    let candidates_json = serde_json::to_string(&summaries)?;

    Ok(format!(
        r#"You are an assistant whose job is to re-rank alumni candidates for a student.

INPUTS:
STUDENT_JSON={student_json}
CANDIDATES_JSON={candidates_json}

TASK:
- Re-rank the provided candidates (exactly the candidates in CANDIDATES_JSON) by best overall fit for this student considering skills, interests, goals, position and industry.
- Return a JSON array (only valid JSON, no extra text) of up to 10 objects in descending order of fit. Each object must have the fields:
  - id: the candidate id (must match an id in CANDIDATES_JSON)
  - score: integer 0-100 (higher is better)
  - reasons: array of up to 4 short phrases (each <= 10 words) explaining why this candidate is a good match.

RESPONSE FORMAT EXAMPLE:
[ {{"id":"alumni123","score":95,"reasons":["3 shared skills: react, node","Same industry: fintech","Mentoring experience"]}} ]

Return ONLY the JSON array. Do not include any commentary, headings, or explanation."#
    ))
}

#[inline]
fn head(values: &[String], max: usize) -> &[String] {
    &values[..values.len().min(max)]
}
