//! HTTP server: `/download`, `/status` and the static web frontend.

mod cors;
mod handlers;
mod map_server;
mod routes;
mod static_folder;

pub use handlers::AppState;
pub use map_server::MapServer;
pub use static_folder::{ALLOWED_EXTENSIONS, StaticFile, StaticFolder};
