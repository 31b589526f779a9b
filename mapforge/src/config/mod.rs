//! MapForge server configuration.
//!
//! - [`Config`](crate::config::Config): top-level YAML file
//! - [`ServerConfig`](crate::config::ServerConfig): listening address
//! - [`CorsConfig`](crate::config::CorsConfig): allowed origins
//! - [`OverpassConfig`](crate::config::OverpassConfig): feature API endpoint and limits
//! - [`RenderConfig`](crate::config::RenderConfig): figure size and styling of image exports
//! - [`BasemapConfig`](crate::config::BasemapConfig): tile providers drawn under image exports
//!
//! Every section is optional. Command line arguments override the file.

mod basemap;
mod cors;
mod main;
mod overpass;
mod render;
mod server;

pub use basemap::BasemapConfig;
pub use cors::CorsConfig;
pub use main::Config;
pub use overpass::OverpassConfig;
pub use render::RenderConfig;
pub use server::ServerConfig;
