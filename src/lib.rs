pub mod broadcast;
pub mod config;
pub mod db;
pub mod error;
pub mod gateway;
pub mod handlers;
pub mod models;
pub mod registry;
pub mod routes;
pub mod state;
pub mod store;
pub mod transport;
