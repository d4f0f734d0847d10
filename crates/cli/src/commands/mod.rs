pub mod config_cmd;
pub mod extract;
pub mod preprocess;
pub mod session;
