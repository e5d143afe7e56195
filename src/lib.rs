//! Lexora Library Circulation Server
//!
//! REST JSON API for a library's catalog, member roster and circulation desk: issuing, returning
//! and renewing books, and collecting overdue fines.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub mod api;
pub mod clock;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

use clock::Clock;
use repository::Store;
use services::{ReservationDirectory, Services};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<Services>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        store: Arc<dyn Store>,
        clock: Arc<dyn Clock>,
        reservations: Arc<dyn ReservationDirectory>,
    ) -> Self {
        let services = Services::new(store, clock, reservations, config.circulation.clone());
        Self {
            config: Arc::new(config),
            services: Arc::new(services),
        }
    }
}

/// Create the application router with all routes
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_v1 = Router::new()
        // Health check
        .route("/health", get(api::health::health_check))
        .route("/ready", get(api::health::readiness_check))
        // Books
        .route(
            "/books",
            get(api::books::list_books).post(api::books::create_book),
        )
        .route("/books/categories", get(api::books::list_categories))
        .route(
            "/books/:id",
            get(api::books::get_book)
                .put(api::books::update_book)
                .delete(api::books::delete_book),
        )
        // Members
        .route(
            "/members",
            get(api::members::list_members).post(api::members::create_member),
        )
        .route(
            "/members/:id",
            get(api::members::get_member)
                .put(api::members::update_member)
                .delete(api::members::delete_member),
        )
        .route("/members/:id/suspend", post(api::members::suspend_member))
        .route("/members/:id/activate", post(api::members::activate_member))
        .route("/members/:id/loans", get(api::members::member_loans))
        .route("/members/:id/stats", get(api::members::member_stats))
        // Borrowings
        .route("/borrowings", get(api::borrowings::list_borrowings))
        .route("/borrowings/issue", post(api::borrowings::issue_book))
        .route("/borrowings/overdue", get(api::borrowings::list_overdue))
        .route("/borrowings/open", get(api::borrowings::find_open_loan))
        .route("/borrowings/:id", get(api::borrowings::get_borrowing))
        .route("/borrowings/:id/return", post(api::borrowings::return_book))
        .route("/borrowings/:id/renew", post(api::borrowings::renew_book))
        .route("/borrowings/:id/pay-fine", post(api::borrowings::pay_fine))
        // Reports
        .route("/reports/stats", get(api::reports::get_stats))
        .route("/reports/popular-books", get(api::reports::popular_books))
        .route("/reports/member-activity", get(api::reports::member_activity))
        .route("/reports/overdue", get(api::reports::overdue_report))
        .route("/reports/fines", get(api::reports::fines_report))
        .route("/reports/inventory", get(api::reports::inventory_report))
        .route("/reports/member-fines/:member_id", get(api::reports::member_fines))
        .with_state(state);

    let openapi = api::openapi::create_openapi_router();

    Router::new()
        .nest("/api/v1", api_v1)
        .merge(openapi)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
