// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    AlumniCandidate, BlockRecord, RankedMatch, RankingSource, RecommendationLimits, StudentProfile,
    UserRecord,
};
pub use requests::{BlockAlumniRequest, RecommendationsQuery};
pub use responses::{
    BlockAlumniResponse, BlockedAlumniResponse, ErrorResponse, HealthResponse,
    RankerConfigResponse, RecommendationsResponse,
};
