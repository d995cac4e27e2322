pub mod client_server;
pub mod codec_scenarios;
pub mod properties;
pub mod query_protocol;
pub mod schema_loading;
pub mod server_dispatch;
