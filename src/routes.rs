// src/routes.rs

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{get, post, put},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{auth, interaction, pets},
    state::AppState,
    utils::jwt::auth_middleware,
};

/// Assembles the main application router.
///
/// * Nests the auth and pet sub-routers under /api.
/// * Layers session-cookie auth over the protected subsets.
/// * Applies global middleware (Trace, CORS, body limit).
pub fn create_router(state: AppState) -> Router {
    let origin = state
        .config
        .allowed_origin
        .parse::<HeaderValue>()
        .expect("ALLOWED_ORIGIN must be a valid header value");

    // Credentials must be allowed or the session cookie never round-trips
    // from the browser client.
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            header::ACCEPT,
        ])
        .allow_credentials(true);

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/reset-password", post(auth::reset_password))
        // Protected auth routes
        .merge(
            Router::new()
                .route("/me", get(auth::me))
                .layer(middleware::from_fn_with_state(
                    state.clone(),
                    auth_middleware,
                )),
        );

    let pet_routes = Router::new()
        .route("/", get(pets::list_pets))
        .route("/{id}", get(pets::get_pet))
        // Protected pet routes
        .merge(
            Router::new()
                .route("/", post(pets::create_pet))
                .route("/{id}", put(pets::update_pet).delete(pets::delete_pet))
                .route("/{id}/favorite", post(interaction::toggle_favorite))
                .route("/{id}/adopt", post(interaction::adopt_pet))
                .route("/user/favorites", get(interaction::list_favorites))
                .route(
                    "/user/adoption-requests",
                    get(interaction::list_adoption_requests),
                )
                .layer(middleware::from_fn_with_state(
                    state.clone(),
                    auth_middleware,
                )),
        );

    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api/pets", pet_routes)
        // Global Middleware (applied from outside in). The body limit sits
        // above the photo cap so the multipart-layer size check is what
        // rejects oversize uploads, with the contract's 400.
        .layer(DefaultBodyLimit::max(pets::MAX_PHOTO_BYTES + 1024 * 1024))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
