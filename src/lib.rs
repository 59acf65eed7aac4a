pub mod config;
pub mod html_table;
pub mod http_client;
pub mod ingest;
pub mod model;
pub mod per_game;
pub mod roster;
pub mod store;
