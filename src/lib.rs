pub mod common;
pub mod configs;
pub mod monitoring;
pub mod output;
pub mod player;
pub mod protocol;
pub mod server;
pub mod sources;
