pub mod config;
pub mod credential_store;
pub mod error;
pub mod local_storage;
pub mod logging;
pub mod oauth_redirect;
pub mod sheets_gateway;
pub mod storage;
