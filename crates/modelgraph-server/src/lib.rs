pub mod config;
pub mod handlers;
pub mod observability;
pub mod server;

pub use config::{AppConfig, LoggingConfig, ModelsConfig, ServerConfig};
pub use observability::{apply_logging_level, init_tracing};
pub use server::{ModelgraphServer, ServerBuilder, StartupError, build_app};
