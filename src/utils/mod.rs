pub mod config_loader;
pub mod http_client;
pub mod logging;
