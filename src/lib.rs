pub mod api_server_axum;
pub mod app_config;
pub mod logging;
pub mod pipeline;
pub mod smartapi;
pub mod store;

pub use app_config::AppConfig;
pub use pipeline::SnapshotPipeline;
pub use store::SnapshotStore;
