//! JSON-RPC and REST transport for the appointments service.
//!
//! A single method table ([`dispatch`]) answers both wire shapes: the
//! JSON-RPC 2.0 envelope at `/rpc` and the literal REST paths mounted
//! alongside it. Every handler owns whichever of the four signed-envelope
//! auth gates its call requires and talks to `kiebitz-core` services
//! through a shared, cloneable [`AppState`].

pub mod dispatch;
pub mod domain;
pub mod forms;
pub mod middleware;
pub mod rest;
pub mod rpc;
pub mod service;
pub mod state;

pub use domain::{CorsConfig, GatewayConfig, GatewayError};
pub use service::ApiGatewayService;
pub use state::AppState;
