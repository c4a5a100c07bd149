//! Plank timer: the attempt-logging HTTP service and the terminal timer client.

pub mod client;
pub mod config;
/// Persistence: entities, the storage error type and the store backends.
pub mod dao;
/// Request and response bodies of the JSON API.
pub mod dto;
pub mod duration;
/// Service and HTTP error types.
pub mod error;
/// Axum routers, handlers and the route guard.
pub mod routes;
/// Business logic behind the handlers.
pub mod services;
/// Shared application state and the session registry.
pub mod state;
