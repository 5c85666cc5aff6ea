//! Alumni Match - recommendation service for the campus networking app
//!
//! Ranks alumni for a student. Candidates come from the user directory,
//! minus the alumni the student has blocked; an external language-model
//! ranker orders them when configured, and a skill-overlap heuristic
//! takes over whenever it is absent or fails.

pub mod config;
pub mod core;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use core::{heuristic_score, BlockStore, ExternalRanker, Recommendation, Recommender, UserDirectory};
pub use error::RecommendError;
pub use models::{AlumniCandidate, RankedMatch, RecommendationLimits, StudentProfile, UserRecord};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_exports() {
        let student = StudentProfile {
            skills: vec!["Rust".to_string()],
            ..Default::default()
        };
        let alumnus = AlumniCandidate {
            skills: vec!["rust".to_string()],
            ..Default::default()
        };
        assert_eq!(heuristic_score(&student, &alumnus), 55);
    }
}
