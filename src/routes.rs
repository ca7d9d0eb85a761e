use axum::{
    Router,
    http::Method,
    routing::{get, patch, post},
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::handler::{self, AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handler::healthcheck))
        .route("/books", get(handler::get_books).post(handler::create_book))
        .route(
            "/books/:id",
            get(handler::get_book)
                .delete(handler::delete_book)
                .patch(handler::update_book),
        )
        .route("/reviews/:id", get(handler::get_reviews))
        .route("/wishlist/:email", get(handler::get_wishlist))
        .route("/reading/:email", get(handler::get_reading))
        .route("/finished/:email", get(handler::get_finished))
        .route("/add-book", post(handler::add_book))
        .route("/review", post(handler::create_review))
        .route("/wishlist", patch(handler::upsert_wishlist))
        .route("/reading", patch(handler::upsert_reading))
        .route("/finished", patch(handler::upsert_finished))
}

/// The full application: routes plus CORS and request tracing, bound to `state`.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers(Any);

    routes()
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
