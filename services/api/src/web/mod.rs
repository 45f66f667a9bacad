pub mod auth;
pub mod canvas;
pub mod chat;
pub mod folders;
pub mod lists;
pub mod middleware;
pub mod notes;
pub mod projects;
pub mod rest;
pub mod routes;
pub mod settings;
pub mod state;
pub mod tasks;

// Re-export the router and its guard so the binary can assemble the server.
pub use middleware::require_auth;
pub use routes::api_router;
