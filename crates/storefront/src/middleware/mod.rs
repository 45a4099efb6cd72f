//! HTTP middleware for the storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, HTTP transaction; added by the binary)
//! 2. `TraceLayer` (request span with an empty `request_id` field)
//! 3. Session layer (tower-sessions)
//! 4. Request ID (fills the span field, echoes `x-request-id`)

pub mod request_id;
pub mod session;

pub use request_id::{REQUEST_ID_HEADER, request_id_middleware};
pub use session::{SESSION_COOKIE_NAME, create_session_layer};
