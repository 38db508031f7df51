//! Janus Axum - HTTP binding for the session renewal guard
//!
//! The [`RenewalLayer`] reads the token headers, runs the guard, and
//! threads an immutable [`AuthContext`] to handlers; rotated tokens ride
//! back to the client on the response headers of every authenticated
//! call.

pub mod context;
pub mod extractors;
pub mod layer;

pub use context::AuthContext;
pub use layer::{RenewalLayer, ACCESS_TOKEN_HEADER, REFRESH_TOKEN_HEADER};
