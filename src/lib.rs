/// Basic application code
pub mod app;
/// Administrative access guard
pub mod auth;
/// REST clients for outside providers
pub mod client;
/// Controllers for REST endpoints
pub mod controller;
/// The static 100-day curriculum
pub mod curriculum;
/// Domain objects
pub mod domain;
/// Error enums
pub mod error;
/// Database records
pub mod model;
/// Background programme generation
pub mod programme;
/// Message rendering and scheduling
pub mod render;
/// Repositories
pub mod repo;
/// Application settings
pub mod settings;
/// Application telemetry for tracing and logging
pub mod telemetry;
