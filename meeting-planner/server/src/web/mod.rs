use axum::Router;
use axum::http::Method;
use migration::MigratorTrait;
use sea_orm::Database;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::Config;
use crate::meeting::api::{MeetingApiDoc, MeetingState, create_meeting_router};
use crate::meeting::store::SeaOrmMeetingStore;

#[tracing::instrument(skip(config))]
pub async fn start_web_server(config: Config) -> anyhow::Result<()> {
    let server_address = format!("{}:{}", &config.bind_address, &config.port);
    let listener = tokio::net::TcpListener::bind(&server_address).await?;
    tracing::info!("Web server running on http://{}", server_address);

    let db = Database::connect(&config.db_url).await?;
    migration::Migrator::up(&db, None).await?;
    tracing::info!("Database migrations applied successfully");

    let meeting_state = MeetingState::new(Arc::new(SeaOrmMeetingStore::new(db)));
    let app = create_app(meeting_state);

    axum::serve(listener, app).await?;
    Ok(())
}

/// Assembles every route behind the tracing and CORS layers.
pub fn create_app(meeting_state: MeetingState) -> Router {
    Router::new()
        .route("/health", axum::routing::get(health_check_handler))
        .merge(create_meeting_router(meeting_state))
        .merge(
            SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", MeetingApiDoc::openapi()),
        )
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE]),
                ),
        )
}

#[tracing::instrument]
pub async fn health_check_handler() -> &'static str {
    "OK"
}
