use std::{net::SocketAddr, sync::Arc};

use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderValue, Method};
use axum::{
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use sqlx::PgPool;
use tokio::net::TcpListener;
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use blinkwise_backend::config::Config;
use blinkwise_backend::db::postgres_download_repository::PostgresDownloadRepository;
use blinkwise_backend::db::postgres_plan_repository::PostgresPlanRepository;
use blinkwise_backend::db::postgres_subscription_repository::PostgresSubscriptionRepository;
use blinkwise_backend::db::postgres_usage_stats_repository::PostgresUsageStatsRepository;
use blinkwise_backend::db::postgres_user_repository::PostgresUserRepository;
use blinkwise_backend::db::postgres_webhook_event_repository::PostgresWebhookEventRepository;
use blinkwise_backend::responses::JsonResponse;
use blinkwise_backend::routes::billing::{create_checkout_session, create_portal_session};
use blinkwise_backend::routes::downloads::{download_stats, track_download};
use blinkwise_backend::routes::plans::list_subscription_plans;
use blinkwise_backend::routes::stripe::stripe_webhook;
use blinkwise_backend::routes::subscription::{
    cancel_subscription, get_subscription, reactivate_subscription,
};
use blinkwise_backend::routes::usage::usage_stats;
use blinkwise_backend::services::stripe::LiveStripeService;
use blinkwise_backend::state::AppState;
use blinkwise_backend::utils::jwt::JwtKeys;

#[tokio::main]
async fn main() {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber).unwrap();

    let config = Arc::new(Config::from_env());

    let rate_limit_ms: u64 = std::env::var("RATE_LIMITER_MILLISECONDS")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        // Default: 200ms/token (~5 req/sec)
        .unwrap_or(200);
    let rate_limit_burst: u32 = std::env::var("RATE_LIMITER_BURST")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        // Allow short bursts during dashboard polling
        .unwrap_or(20);
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_millisecond(rate_limit_ms)
            .burst_size(rate_limit_burst)
            .use_headers()
            .error_handler(|_err| {
                JsonResponse::too_many_requests(
                    "Too many requests. Please wait a moment and try again.",
                )
                .into_response()
            })
            .finish()
            .unwrap(),
    );

    let pg_pool = establish_connection(&config.database_url).await;

    let state = AppState {
        db: Arc::new(PostgresUserRepository {
            pool: pg_pool.clone(),
        }),
        plan_repo: Arc::new(PostgresPlanRepository {
            pool: pg_pool.clone(),
        }),
        subscription_repo: Arc::new(PostgresSubscriptionRepository {
            pool: pg_pool.clone(),
        }),
        webhook_event_repo: Arc::new(PostgresWebhookEventRepository {
            pool: pg_pool.clone(),
        }),
        download_repo: Arc::new(PostgresDownloadRepository {
            pool: pg_pool.clone(),
        }),
        usage_repo: Arc::new(PostgresUsageStatsRepository { pool: pg_pool }),
        stripe: Arc::new(LiveStripeService::from_settings(&config.stripe)),
        config: config.clone(),
        jwt_keys: Arc::new(JwtKeys::from_env().expect("JWT_SECRET must be configured")),
    };

    let cors = CorsLayer::new()
        .allow_origin(config.frontend_origin.parse::<HeaderValue>().unwrap())
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
        .allow_credentials(true);

    let app = Router::new()
        .route("/", get(root))
        .route("/api/subscription-plans", get(list_subscription_plans))
        .route("/api/billing/checkout", post(create_checkout_session))
        .route("/api/billing/portal", post(create_portal_session))
        .route("/api/subscription", get(get_subscription))
        .route("/api/subscription/cancel", post(cancel_subscription))
        .route(
            "/api/subscription/reactivate",
            post(reactivate_subscription),
        )
        .route("/api/webhooks/stripe", post(stripe_webhook))
        .route("/api/downloads", post(track_download))
        .route("/api/downloads/stats", get(download_stats))
        .route("/api/usage-stats", get(usage_stats))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(GovernorLayer {
            config: governor_conf,
        })
        .layer(cors);

    let make_service = app.into_make_service_with_connect_info::<SocketAddr>();

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse::<u16>().ok())
        .unwrap_or(3000);
    let addr = SocketAddr::from(([127, 0, 0, 1], port));

    let listener = TcpListener::bind(addr).await.unwrap();
    info!("Listening on http://{}", addr);
    axum::serve(listener, make_service).await.unwrap();
}

/// A simple root route.
async fn root() -> Response {
    JsonResponse::success("Blinkwise API").into_response()
}

/// Establish a connection to the database and verify it.
async fn establish_connection(database_url: &str) -> PgPool {
    let pool = PgPool::connect(database_url)
        .await
        .expect("Failed to connect to the database");

    sqlx::query("SELECT 1")
        .execute(&pool)
        .await
        .expect("Failed to verify database connection");

    info!("Successfully connected to the database");
    pool
}
