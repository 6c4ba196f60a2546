use axum::Router;

use crate::state::SharedState;

pub mod docs;
pub mod health;
pub mod host;
pub mod play;
pub mod public;
pub mod sse;
pub mod ws;

/// Compose all route trees, wiring in shared state and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    let api_router = health::router()
        .merge(sse::router())
        .merge(ws::router())
        .merge(public::router())
        .merge(play::router())
        .merge(host::router(state.clone()));

    let docs_router = docs::router(state.clone());

    api_router.merge(docs_router).with_state(state)
}
