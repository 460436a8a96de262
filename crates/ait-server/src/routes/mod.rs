pub mod origins;
pub mod settings;

use crate::state::AppState;
use axum::Router;

pub fn configure(state: AppState) -> Router {
    Router::new()
        .merge(origins::routes(state.clone()))
        .merge(settings::routes(state))
}
