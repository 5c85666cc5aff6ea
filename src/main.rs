use actix_cors::Cors;
use actix_web::{error, http::StatusCode, middleware, web, App, HttpResponse, HttpServer};
use alumni_match::config::Settings;
use alumni_match::core::{BlockStore, ExternalRanker, Recommender};
use alumni_match::models::{RankerConfigResponse, RecommendationLimits};
use alumni_match::routes::{self, recommendations::AppState};
use alumni_match::services::{
    AppwriteClient, AppwriteCollections, CacheManager, GeminiClient, GeminiOptions, PostgresClient,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// JSON error response for JSON payload errors
#[derive(Debug, serde::Serialize)]
pub struct JsonError {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

impl std::fmt::Display for JsonError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

impl std::error::Error for JsonError {}

impl error::ResponseError for JsonError {
    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::BAD_REQUEST))
            .json(self)
    }
}

/// Handle JSON payload errors
pub fn handle_json_payload_error(err: error::JsonPayloadError, req: &actix_web::HttpRequest) -> actix_web::Error {
    tracing::info!("JSON payload error on {}: {}", req.path(), err);
    JsonError {
        error: "invalid_json".to_string(),
        message: format!("Invalid JSON: {}", err),
        status_code: 400,
    }
    .into()
}

/// Handle query payload errors
pub fn handle_query_payload_error(err: error::QueryPayloadError, _req: &actix_web::HttpRequest) -> actix_web::Error {
    JsonError {
        error: "invalid_query".to_string(),
        message: format!("Invalid query: {}", err),
        status_code: 400,
    }
    .into()
}

fn startup_error(context: &str, err: impl std::fmt::Display) -> std::io::Error {
    error!("{}: {}", context, err);
    std::io::Error::new(std::io::ErrorKind::Other, format!("{}: {}", context, err))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    // Load configuration
    let settings = Settings::load().map_err(|e| startup_error("Failed to load configuration", e))?;

    // Initialize logging (LOG_LEVEL and LOG_FORMAT win over the config file)
    let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| settings.logging.level.clone());
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| settings.logging.format.clone());

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&log_level).unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_level(true);

    match log_format.as_str() {
        "pretty" => subscriber.pretty().init(),
        "json" => subscriber.json().init(),
        _ => subscriber.init(),
    }

    info!("Starting alumni recommendation service...");

    info!("Configuration loaded successfully");

    // Initialize Appwrite client
    let appwrite_collections = AppwriteCollections {
        users: settings.collection.users.clone(),
        recommendation_blocks: settings.collection.recommendation_blocks.clone(),
    };

    let appwrite = Arc::new(
        AppwriteClient::new(
            settings.appwrite.endpoint.clone(),
            settings.appwrite.api_key.clone(),
            settings.appwrite.project_id.clone(),
            settings.appwrite.database_id.clone(),
            appwrite_collections,
            Duration::from_secs(settings.appwrite.timeout_secs.unwrap_or(15)),
        )
        .map_err(|e| startup_error("Failed to build Appwrite client", e))?,
    );

    info!("Appwrite client initialized");

    // Initialize PostgreSQL client
    let db_max_conn = settings.database.max_connections.unwrap_or(10);

    let postgres = PostgresClient::from_settings(
        &settings.database.url,
        Some(db_max_conn),
        settings.database.min_connections,
        settings.database.acquire_timeout_secs,
        settings.database.idle_timeout_secs,
    )
    .await
    .map_err(|e| startup_error("Failed to connect to PostgreSQL", e))?;

    let blocks: Arc<dyn BlockStore> = Arc::new(postgres);

    info!("PostgreSQL client initialized (max: {} connections)", db_max_conn);

    // Initialize cache manager (optional - recommendations work without it)
    let cache = if settings.cache.enabled {
        let cache_ttl = settings.cache.ttl_secs.unwrap_or(300);
        let l1_cache_size = settings.cache.l1_cache_size.unwrap_or(1000);

        match CacheManager::new(settings.cache.redis_url.as_deref(), l1_cache_size, cache_ttl).await {
            Ok(c) => {
                info!(
                    "Cache manager initialized (L1: {} entries, TTL: {}s, shared: {})",
                    l1_cache_size,
                    cache_ttl,
                    c.has_shared_tier()
                );
                Some(Arc::new(c))
            }
            Err(e) => {
                warn!("Failed to connect to Redis ({}), using in-process cache only", e);
                Some(Arc::new(CacheManager::in_memory(l1_cache_size, cache_ttl)))
            }
        }
    } else {
        info!("Response cache disabled");
        None
    };

    // Initialize external ranker
    let limits = RecommendationLimits::from(&settings.recommendations);

    let gemini = GeminiClient::new(GeminiOptions {
        endpoint: settings.ranker.endpoint.clone(),
        api_key: settings.ranker.api_key.clone(),
        model: settings.ranker.model.clone(),
        timeout: Duration::from_secs(settings.ranker.timeout_secs),
        temperature: settings.ranker.temperature,
        max_output_tokens: settings.ranker.max_output_tokens,
        max_candidates: limits.ranker_candidates,
        max_matches: limits.max_matches,
    })
    .map_err(|e| startup_error("Failed to build ranker client", e))?;

    let ranker_config = RankerConfigResponse {
        has_key: gemini.has_key(),
        model: gemini.model_name().to_string(),
    };

    let ranker: Option<Arc<dyn ExternalRanker>> = if gemini.is_configured() {
        info!("External ranker enabled (model: {})", gemini.model_name());
        Some(Arc::new(gemini))
    } else {
        info!("External ranker not configured, using heuristic ranking");
        None
    };

    let recommender = Recommender::new(appwrite.clone(), blocks.clone(), ranker, limits);

    // Build application state
    let app_state = AppState {
        recommender,
        blocks,
        cache,
        block_mirror: settings.collection.mirror_blocks.then(|| appwrite.clone()),
        ranker_config,
    };

    // Configure HTTP server
    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::JsonConfig::default().error_handler(handle_json_payload_error))
            .app_data(web::QueryConfig::default().error_handler(handle_query_payload_error))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
