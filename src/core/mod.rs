// Core ranking exports
pub mod candidates;
pub mod extract;
pub mod prompt;
pub mod ranker;
pub mod recommender;
pub mod scoring;

pub use candidates::{load_candidates, BlockStore, CandidateSet, UserDirectory};
pub use extract::{extract_json, parse_ranking, ExtractError, RankedItem};
pub use prompt::ranking_prompt;
pub use ranker::{ExternalRanker, RankerError};
pub use recommender::{heuristic_ranking, merge_ranking, Recommendation, Recommender};
pub use scoring::{heuristic_score, shared_skills};
