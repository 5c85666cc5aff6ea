use crate::models::{AlumniCandidate, StudentProfile};
use std::collections::HashSet;

/// Score every candidate starts from
pub const BASE_SCORE: u8 = 50;
/// Points added per shared skill
pub const SHARED_SKILL_POINTS: u32 = 5;
/// Upper bound of any score
pub const MAX_SCORE: u8 = 100;

/// Heuristic match score (50-100) based on skill overlap
///
/// score = min(100, 50 + 5 * shared)
///
/// `shared` counts candidate skills that also appear in the student's skill
/// list, compared case-insensitively.
pub fn heuristic_score(student: &StudentProfile, candidate: &AlumniCandidate) -> u8 {
    let student_skills = lowercase_set(&student.skills);

    let shared = candidate
        .skills
        .iter()
        .filter(|skill| student_skills.contains(&skill.to_lowercase()))
        .count() as u32;

    let score = BASE_SCORE as u32 + shared.saturating_mul(SHARED_SKILL_POINTS);
    score.min(MAX_SCORE as u32) as u8
}

/// Candidate skills (original casing) the student also lists
pub fn shared_skills(student: &StudentProfile, candidate: &AlumniCandidate) -> Vec<String> {
    let student_skills = lowercase_set(&student.skills);

    candidate
        .skills
        .iter()
        .filter(|skill| student_skills.contains(&skill.to_lowercase()))
        .cloned()
        .collect()
}

#[inline]
fn lowercase_set(values: &[String]) -> HashSet<String> {
    values.iter().map(|v| v.to_lowercase()).collect()
}
