//! API router.
//!
//! Returns a composable `Router` that can be mounted on any axum server.
//! Routes are nested under `/api/`.

use std::sync::Arc;

use axum::http::{header, HeaderValue};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::set_header::SetResponseHeaderLayer;

use crate::api::endpoints;
use crate::api::middleware;
use crate::api::types::ApiContext;
use crate::core_state::CoreState;

/// Build the API router with every endpoint under `/api/`.
pub fn api_router(core: Arc<CoreState>) -> Router {
    let ctx = ApiContext::new(core);

    // NOTE: Path params use `:param` syntax (matchit 0.7 / axum 0.7).
    let api = Router::new()
        .route("/health", get(endpoints::health::check))
        .route("/substances", get(endpoints::substances::list))
        .route(
            "/screening/classify",
            post(endpoints::screening::classify_screen),
        )
        .route("/screening/resolve", post(endpoints::screening::resolve))
        .route("/duty", get(endpoints::duty::on_duty))
        .route("/clients", post(endpoints::clients::create))
        .route(
            "/clients/:id/medications",
            get(endpoints::clients::medications).post(endpoints::clients::add_medication),
        )
        .route("/technicians", post(endpoints::technicians::create))
        .route("/technicians/:id", get(endpoints::technicians::detail))
        .route(
            "/schedule-overrides",
            get(endpoints::technicians::list_overrides)
                .post(endpoints::technicians::create_override),
        )
        .route("/drug-tests", post(endpoints::drug_tests::create))
        .route(
            "/drug-tests/unassigned",
            get(endpoints::drug_tests::unassigned),
        )
        .route("/drug-tests/:id", get(endpoints::drug_tests::detail))
        .route("/drug-tests/:id/collect", post(endpoints::drug_tests::collect))
        .route(
            "/drug-tests/:id/technician",
            post(endpoints::drug_tests::assign_technician),
        )
        .route("/drug-tests/:id/screen", post(endpoints::drug_tests::screen))
        .route(
            "/drug-tests/:id/decision",
            post(endpoints::drug_tests::decision),
        )
        .route(
            "/drug-tests/:id/confirmations",
            post(endpoints::drug_tests::confirmations),
        )
        .route(
            "/drug-tests/:id/finalize",
            post(endpoints::drug_tests::finalize),
        )
        .route(
            "/alerts/notifications",
            get(endpoints::alerts::notifications),
        )
        .route(
            "/alerts/notifications/:id/resolve",
            post(endpoints::alerts::resolve),
        )
        .with_state(ctx)
        // Layers run outermost last
        .layer(axum::middleware::from_fn(middleware::audit::log_access))
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .layer(CorsLayer::permissive());

    Router::new().nest("/api", api)
}
