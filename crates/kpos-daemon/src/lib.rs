//! kpos-daemon
//!
//! HTTP surface over the kiosk engine: per-session carts, the mutation
//! channel used by the ordering agent, checkout, kitchen status and
//! readiness. `main.rs` is a thin wrapper that loads config, builds
//! [`state::AppState`] and serves [`routes::build_router`].

pub mod api_types;
pub mod routes;
pub mod state;
