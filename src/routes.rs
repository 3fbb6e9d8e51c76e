use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    extract::MatchedPath,
    http::{HeaderName, Request, header},
    middleware,
    routing::{delete, get, post, put},
};
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::{controllers, middlewares::jwt_auth_middleware, state::AppState};

const REQUEST_ID_HEADER: &str = "x-request-id";

pub fn init_router(app_state: AppState) -> Router {
    let state = Arc::new(app_state);

    let public_route = Router::new()
        .route("/", get(controllers::home::index))
        .route("/auth", post(controllers::auth::store))
        .route("/readers", post(controllers::readers::store))
        .route("/manga", get(controllers::manga::index))
        .route("/manga/{id}", get(controllers::manga::show))
        .route("/manga/{id}/chapters", get(controllers::chapters::index))
        .route("/manga/{id}/comments", get(controllers::comments::index))
        .route("/genres", get(controllers::genres::index))
        .route("/reports/top-rated", get(controllers::reports::top_rated))
        .route("/reports/genres", get(controllers::reports::genres))
        .route(
            "/reports/genres/{name}/engaged-readers",
            get(controllers::reports::engaged_readers),
        )
        .route("/reports/well-rated", get(controllers::reports::well_rated))
        .route("/reports/active-readers", get(controllers::reports::active))
        .route("/reports/statistics", get(controllers::reports::statistics));

    let authenticated_route = Router::new()
        .route("/me", get(controllers::me::index))
        .route("/me/password", put(controllers::me::update_password))
        .route("/me/reading", get(controllers::me::reading))
        .route("/manga", post(controllers::manga::store))
        .route(
            "/manga/{id}",
            put(controllers::manga::update).delete(controllers::manga::destroy),
        )
        .route("/manga/{id}/chapters", post(controllers::chapters::store))
        .route("/manga/{id}/comments", post(controllers::comments::store))
        .route(
            "/manga/{id}/rating",
            put(controllers::ratings::update).delete(controllers::ratings::destroy),
        )
        .route(
            "/manga/{id}/favourite",
            put(controllers::favourites::store).delete(controllers::favourites::destroy),
        )
        .route(
            "/manga/{id}/genres/{genre_id}",
            put(controllers::genres::tag).delete(controllers::genres::untag),
        )
        .route("/chapters/{id}", delete(controllers::chapters::destroy))
        .route("/chapters/{id}/read", post(controllers::chapters::read))
        .route("/chapters/{id}/pages", put(controllers::chapters::pages))
        .route(
            "/chapters/{id}/complete",
            post(controllers::chapters::complete),
        )
        .route(
            "/comments/{id}",
            put(controllers::comments::update).delete(controllers::comments::destroy),
        )
        .route("/comments/{id}/like", post(controllers::comments::like))
        .route("/comments/{id}/replies", post(controllers::comments::reply))
        .route("/genres", post(controllers::genres::store))
        .route(
            "/genres/{id}",
            put(controllers::genres::update).delete(controllers::genres::destroy),
        )
        .route("/administrators", post(controllers::administrators::store))
        .route("/users/{id}", delete(controllers::users::destroy))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_middleware,
        ));

    let x_request_id_header = HeaderName::from_static(REQUEST_ID_HEADER);
    let request_id_middleware = ServiceBuilder::new()
        .layer(SetRequestIdLayer::new(
            x_request_id_header.clone(),
            MakeRequestUuid,
        ))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or_default();
                let user_agent = request
                    .headers()
                    .get(header::USER_AGENT)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or_default();

                let matched_path = request
                    .extensions()
                    .get::<MatchedPath>()
                    .map(MatchedPath::as_str);

                tracing::info_span!(
                    "http_request",
                    request_id,
                    method = ?request.method(),
                    uri = ?request.uri(),
                    path = matched_path,
                    version = ?request.version(),
                    user_agent,
                )
            }),
        )
        .layer(PropagateRequestIdLayer::new(x_request_id_header));

    public_route
        .merge(authenticated_route)
        .layer(CompressionLayer::new())
        .layer(request_id_middleware)
        .with_state(state)
}
