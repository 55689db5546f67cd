pub mod config;
pub mod dispatch;
pub mod registry;
pub mod server;
pub mod sweep;
pub mod verify;
pub mod ws;
