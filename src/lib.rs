// src/lib.rs

pub mod config;
pub mod editor;
pub mod error;
pub mod handlers;
pub mod library;
pub mod models;
pub mod routes;
pub mod state;

// Re-export specific items for convenience if needed
pub use routes::create_router;
