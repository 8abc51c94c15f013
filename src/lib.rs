pub mod auth;
pub mod bookmark;
pub mod configuration;
pub mod error;
pub mod feed;
pub mod routes;
pub mod startup;
pub mod store;
pub mod telemetry;
pub mod view;
pub mod websocket;
