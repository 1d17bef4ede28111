pub mod coalition;
pub mod config;
pub mod output;
pub mod party;
pub mod polls;
pub mod positions;
pub mod scoring;
pub mod server;
pub mod session;
