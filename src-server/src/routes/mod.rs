//! Routing tree

mod account;
mod login;

use axum::{
    middleware,
    routing::{any, get, post},
    Router,
};

use crate::middleware::require_session;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let authenticated = Router::new()
        .route("/balance", get(account::balance))
        .route("/deposit", post(account::deposit))
        .route("/withdraw", post(account::withdraw))
        .route("/transactions", get(account::transactions))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_session,
        ));

    Router::new()
        .route("/login", any(login::login))
        .merge(authenticated)
        .with_state(state)
}
