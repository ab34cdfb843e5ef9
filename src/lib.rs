// Shared infrastructure
pub mod config;
pub mod error;
pub mod metrics;
pub mod telemetry;

// Channel plumbing
pub mod connection;
pub mod websocket;

// Clients and their UI effects
pub mod chat;
pub mod notification;
pub mod ui;

// Collaborators and orchestration
pub mod api;
pub mod session;
