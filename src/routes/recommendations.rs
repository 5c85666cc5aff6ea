use actix_web::{web, HttpResponse, Responder, ResponseError};
use validator::Validate;
use crate::core::{BlockStore, Recommender};
use crate::error::RecommendError;
use crate::models::{
    BlockAlumniRequest, BlockAlumniResponse, BlockRecord, BlockedAlumniResponse, ErrorResponse,
    HealthResponse, RankedMatch, RankerConfigResponse, RecommendationsQuery,
    RecommendationsResponse,
};
use crate::services::{AppwriteClient, CacheKey, CacheManager};
use std::sync::Arc;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub recommender: Recommender,
    pub blocks: Arc<dyn BlockStore>,
    /// Response cache owned by the HTTP layer; the recommender never sees it
    pub cache: Option<Arc<CacheManager>>,
    /// Document store receiving a best-effort copy of every block
    pub block_mirror: Option<Arc<AppwriteClient>>,
    pub ranker_config: RankerConfigResponse,
}

/// Configure all recommendation-related routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/recommendations", web::get().to(get_recommendations))
        .route("/recommendations/blocks", web::post().to(block_alumni))
        .route("/recommendations/blocks", web::get().to(list_blocked_alumni))
        .route("/config/ranker", web::get().to(ranker_config));
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let status = if state.blocks.ping().await { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Recommendations endpoint
///
/// GET /api/v1/recommendations?studentId={studentId}
///
/// Returns `{"matches": [...]}` with at most ten entries, best first.
async fn get_recommendations(
    state: web::Data<AppState>,
    query: web::Query<RecommendationsQuery>,
) -> impl Responder {
    let Some(student_id) = query.student_id() else {
        return missing_student_id();
    };

    let cache_key = CacheKey::recommendations(student_id);

    if let Some(matches) = cached_matches(&state, student_id, &cache_key).await {
        tracing::debug!("Serving {} cached recommendations for {}", matches.len(), student_id);
        return HttpResponse::Ok().json(RecommendationsResponse { matches });
    }

    match state.recommender.recommend(student_id).await {
        Ok(recommendation) => {
            tracing::info!(
                "Returning {} recommendations for {} ({:?}, from {} candidates)",
                recommendation.matches.len(),
                student_id,
                recommendation.source,
                recommendation.total_candidates
            );

            if let Some(cache) = &state.cache {
                if let Err(e) = cache.set(&cache_key, &recommendation.matches).await {
                    tracing::warn!("Failed to cache recommendations for {}: {}", student_id, e);
                }
            }

            HttpResponse::Ok().json(RecommendationsResponse {
                matches: recommendation.matches,
            })
        }
        Err(e) => error_response(&e, "Failed to compute recommendations"),
    }
}

/// Cached matches with the student's current blocks applied
///
/// Blocks may be written by other processes, so the block set is always
/// re-read. Any cache or block-store failure falls through to a fresh run.
async fn cached_matches(
    state: &AppState,
    student_id: &str,
    cache_key: &str,
) -> Option<Vec<RankedMatch>> {
    let cache = state.cache.as_ref()?;
    let matches: Vec<RankedMatch> = cache.get(cache_key).await.ok()?;

    match state.blocks.get_blocks(student_id).await {
        Ok(blocked) => Some(
            matches
                .into_iter()
                .filter(|m| !blocked.contains(&m.alumni.id))
                .collect(),
        ),
        Err(e) => {
            tracing::warn!("Failed to re-check blocks for cached {}: {}", student_id, e);
            None
        }
    }
}

/// Block endpoint
///
/// POST /api/v1/recommendations/blocks
///
/// Request body:
/// ```json
/// {
///   "studentId": "string",
///   "alumniId": "string"
/// }
/// ```
async fn block_alumni(
    state: web::Data<AppState>,
    req: web::Json<BlockAlumniRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return HttpResponse::BadRequest().json(ErrorResponse {
            error: "Validation failed".to_string(),
            message: errors.to_string(),
            status_code: 400,
        });
    }

    let student_id = req.student_id.trim();
    let alumni_id = req.alumni_id.trim();

    if student_id.is_empty() || alumni_id.is_empty() {
        let err = RecommendError::Validation("studentId and alumniId must not be blank".to_string());
        return error_response(&err, "Failed to record block");
    }

    if let Err(e) = state.blocks.add_block(student_id, alumni_id).await {
        return error_response(&e, "Failed to record block");
    }

    // Mirror into the document store (best-effort)
    if let Some(mirror) = &state.block_mirror {
        let block = BlockRecord {
            student_id: student_id.to_string(),
            alumni_id: alumni_id.to_string(),
            blocked_at: chrono::Utc::now(),
        };
        if let Err(e) = mirror.record_block(&block).await {
            tracing::warn!("Block recorded but document store mirror failed: {}", e);
        }
    }

    if let Some(cache) = &state.cache {
        if let Err(e) = cache.delete(&CacheKey::recommendations(student_id)).await {
            tracing::warn!("Failed to invalidate cache: {}", e);
        }
    }

    tracing::info!("Student {} blocked alumni {}", student_id, alumni_id);

    HttpResponse::Ok().json(BlockAlumniResponse { success: true })
}

/// Blocked alumni for a student
///
/// GET /api/v1/recommendations/blocks?studentId={studentId}
async fn list_blocked_alumni(
    state: web::Data<AppState>,
    query: web::Query<RecommendationsQuery>,
) -> impl Responder {
    let Some(student_id) = query.student_id() else {
        return missing_student_id();
    };

    match state.blocks.get_blocks(student_id).await {
        Ok(blocked) => {
            let mut blocked_alumni: Vec<String> = blocked.into_iter().collect();
            blocked_alumni.sort();

            HttpResponse::Ok().json(BlockedAlumniResponse {
                student_id: student_id.to_string(),
                count: blocked_alumni.len(),
                blocked_alumni,
            })
        }
        Err(e) => error_response(&e, "Failed to fetch blocked alumni"),
    }
}

/// External ranker configuration, without exposing the key
///
/// GET /api/v1/config/ranker
async fn ranker_config(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(&state.ranker_config)
}

fn missing_student_id() -> HttpResponse {
    HttpResponse::BadRequest().json(ErrorResponse {
        error: "Missing studentId parameter".to_string(),
        message: "studentId query parameter is required".to_string(),
        status_code: 400,
    })
}

/// Map a recommendation error, naming the failed operation on server errors
fn error_response(err: &RecommendError, context: &str) -> HttpResponse {
    let status = err.status();

    let (error, message) = match err {
        RecommendError::NotFound(msg) => ("Student not found".to_string(), msg.clone()),
        _ if err.is_client_error() => return err.error_response(),
        _ => {
            tracing::error!("{}: {}", context, err);
            (context.to_string(), "An internal error occurred".to_string())
        }
    };

    HttpResponse::build(status).json(ErrorResponse {
        error,
        message,
        status_code: status.as_u16(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::UserDirectory;
    use crate::models::{RecommendationLimits, UserRecord};
    use crate::services::{AppwriteError, InMemoryBlockStore, InMemoryDirectory};
    use actix_web::{http::StatusCode, test, App};

    fn user(id: &str, role: &str, skills: &[&str], interests: &[&str]) -> UserRecord {
        UserRecord {
            id: Some(id.to_string()),
            name: id.to_uppercase(),
            role: role.to_string(),
            skills: skills.iter().map(|s| s.to_string()).collect(),
            interests: interests.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    fn state(cache: Option<Arc<CacheManager>>) -> AppState {
        let directory = Arc::new(InMemoryDirectory::new(vec![
            user("stu1", "student", &["python", "sql"], &[]),
            user("A", "alumni", &["python", "react"], &[]),
            user("B", "alumni", &["python", "sql", "ml"], &[]),
        ]));
        let blocks: Arc<dyn BlockStore> = Arc::new(InMemoryBlockStore::new());

        AppState {
            recommender: Recommender::new(directory, blocks.clone(), None, RecommendationLimits::default()),
            blocks,
            cache,
            block_mirror: None,
            ranker_config: RankerConfigResponse {
                has_key: false,
                model: "gemini-2.5-flash".to_string(),
            },
        }
    }

    fn ids(body: &RecommendationsResponse) -> Vec<&str> {
        body.matches.iter().map(|m| m.alumni.id.as_str()).collect()
    }

    #[actix_web::test]
    async fn test_missing_student_id_is_bad_request() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state(None)))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::get().uri("/recommendations").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_unknown_student_is_not_found() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state(None)))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/recommendations?studentId=ghost")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let body: ErrorResponse = test::read_body_json(resp).await;
        assert_eq!(body.error, "Student not found");
    }

    #[actix_web::test]
    async fn test_block_invalidates_cached_recommendations() {
        let cache = Arc::new(CacheManager::in_memory(100, 300));
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state(Some(cache))))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/recommendations?studentId=stu1")
            .to_request();
        let body: RecommendationsResponse = test::call_and_read_body_json(&app, req).await;
        assert_eq!(ids(&body), vec!["B", "A"]);

        let req = test::TestRequest::post()
            .uri("/recommendations/blocks")
            .set_json(serde_json::json!({"studentId": "stu1", "alumniId": "B"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let req = test::TestRequest::get()
            .uri("/recommendations?studentId=stu1")
            .to_request();
        let body: RecommendationsResponse = test::call_and_read_body_json(&app, req).await;
        assert_eq!(ids(&body), vec!["A"]);

        let req = test::TestRequest::get()
            .uri("/recommendations/blocks?studentId=stu1")
            .to_request();
        let body: BlockedAlumniResponse = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body.blocked_alumni, vec!["B"]);
    }

    #[actix_web::test]
    async fn test_cached_matches_respect_external_blocks() {
        let cache = Arc::new(CacheManager::in_memory(100, 300));
        let state = state(Some(cache));
        let blocks = state.blocks.clone();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/recommendations?studentId=stu1")
            .to_request();
        let _: RecommendationsResponse = test::call_and_read_body_json(&app, req).await;

        // Written around the HTTP layer, so the cache is not invalidated
        blocks.add_block("stu1", "A").await.unwrap();

        let req = test::TestRequest::get()
            .uri("/recommendations?studentId=stu1")
            .to_request();
        let body: RecommendationsResponse = test::call_and_read_body_json(&app, req).await;
        assert_eq!(ids(&body), vec!["B"]);
    }

    #[actix_web::test]
    async fn test_invalid_block_request() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state(None)))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/recommendations/blocks")
            .set_json(serde_json::json!({"studentId": "stu1", "alumniId": ""}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_ranker_config_and_health() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state(None)))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::get().uri("/config/ranker").to_request();
        let body: RankerConfigResponse = test::call_and_read_body_json(&app, req).await;
        assert!(!body.has_key);
        assert_eq!(body.model, "gemini-2.5-flash");

        let req = test::TestRequest::get().uri("/health").to_request();
        let body: HealthResponse = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body.status, "healthy");
    }

    /// Directory whose backend is unreachable
    struct UnreachableDirectory;

    #[async_trait::async_trait]
    impl UserDirectory for UnreachableDirectory {
        async fn get_user(&self, _id: &str) -> Result<Option<UserRecord>, RecommendError> {
            Err(AppwriteError::ApiError("Failed to fetch user: 503 Service Unavailable".into()).into())
        }

        async fn query_alumni_by_skills(
            &self,
            _tags: &[String],
            _limit: usize,
        ) -> Result<Vec<UserRecord>, RecommendError> {
            Ok(Vec::new())
        }

        async fn list_alumni(&self) -> Result<Vec<UserRecord>, RecommendError> {
            Ok(Vec::new())
        }
    }

    #[actix_web::test]
    async fn test_user_store_failure_is_internal_error() {
        let blocks: Arc<dyn BlockStore> = Arc::new(InMemoryBlockStore::new());
        let state = AppState {
            recommender: Recommender::new(
                Arc::new(UnreachableDirectory),
                blocks.clone(),
                None,
                RecommendationLimits::default(),
            ),
            blocks,
            cache: None,
            block_mirror: None,
            ranker_config: RankerConfigResponse {
                has_key: false,
                model: "gemini-2.5-flash".to_string(),
            },
        };
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/recommendations?studentId=stu1")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body: ErrorResponse = test::read_body_json(resp).await;
        assert_eq!(body.error, "Failed to compute recommendations");
        assert_eq!(body.message, "An internal error occurred");
        assert_eq!(body.status_code, 500);
    }
}
