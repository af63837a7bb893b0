//! API layer for session-gate.
//!
//! This module exposes the gate's navigation state and the provider's
//! sign-in operations over HTTP and WebSocket.
//!
//! ## Endpoints
//!
//! ### Health & Info
//! - `GET /health` - Health check
//! - `GET /api/v1` - API information
//!
//! ### Navigation
//! - `GET /api/v1/navigation` - Current navigation mode and user
//! - `WS /api/v1/navigation/ws` - Stream of navigation changes
//! - `GET /api/v1/profile` - Profile of the authenticated user
//!
//! ### Auth
//! - `POST /api/v1/auth/sign-in` - Password sign-in
//! - `POST /api/v1/auth/sign-out` - Sign out

pub mod handlers;
pub mod router;
pub mod types;
pub mod websocket;

// Re-export commonly used types
pub use handlers::AppState;
pub use router::{create_router, serve, ServerConfig};
pub use types::{
    ErrorResponse, NavigationResponse, ProfileResponse, SignInRequest, SignInResponse, WsMessage,
};
