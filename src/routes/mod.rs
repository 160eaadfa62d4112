use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::handlers::rides;
use crate::middleware::auth::{auth_middleware, require_captain, require_rider};
use crate::middleware::role_rate_limit::create_actor_governor;
use crate::realtime::registry::ActorKind;
use crate::realtime::socket::ws_handler;
use crate::AppState;

pub fn create_router(state: AppState) -> Router {
    let rider_governor = create_actor_governor(ActorKind::Rider);
    let captain_governor = create_actor_governor(ActorKind::Captain);

    // Rider routes (requires auth + rider role)
    let rider_routes = Router::new()
        .route("/create", post(rides::create_ride))
        .route("/get-fare", get(rides::get_fares))
        .layer(rider_governor)
        .layer(middleware::from_fn(require_rider))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    // Captain routes (requires auth + captain role)
    let captain_routes = Router::new()
        .route("/confirm", post(rides::confirm_ride))
        .route("/start-ride", get(rides::start_ride))
        .route("/end-ride", post(rides::end_ride))
        .layer(captain_governor)
        .layer(middleware::from_fn(require_captain))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .nest("/api/rides", rider_routes.merge(captain_routes))
        .route("/ws", get(ws_handler))
        .with_state(state)
}
