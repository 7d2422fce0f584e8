pub mod error;
pub mod hal;
pub mod handlers;
pub mod memory;
pub mod model;
pub mod repo;
pub mod services;


use crate::state::AppState;
use axum::Router;

pub use repo::UserRepository;

pub fn router() -> Router<AppState> {
    handlers::user_routes()
}
