pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod filters;
pub mod format;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod state;
pub mod utils;
pub mod validations;

use axum::{
    response::Redirect,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_cookies::CookieManagerLayer;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

pub use config::AppConfig;
pub use state::AppState;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Public routes
        .route("/", get(|| async { Redirect::to("/dashboard") }))
        .route("/login", get(handlers::auth::login_page).post(handlers::auth::login))
        .route("/logout", post(handlers::auth::logout))

        // Session routes
        .route("/dashboard", get(handlers::dashboard::dashboard))
        .route("/expenses", get(handlers::expenses::expenses_list))

        // Validation board
        .route("/validations", get(handlers::validations::board))
        .route("/validations/export.csv", get(handlers::validations::export_csv))
        .route("/validations/:id/approve", post(handlers::validations::approve))
        .route("/validations/:id/reject", post(handlers::validations::reject))

        // Static files
        .nest_service("/static", ServeDir::new("static"))

        // Middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CookieManagerLayer::new())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
