//! Janus DB - User-store abstractions
//!
//! SQLx-based storage layer for Janus services. The auth core depends
//! only on the [`UserRepository`] trait; the PostgreSQL implementation
//! lives here as plumbing.
//!
//! # Example
//!
//! ```rust,ignore
//! use janus_db::{create_pool, Repositories};
//!
//! let pool = create_pool("postgres://localhost/janus").await?;
//! let repos = Repositories::new(pool);
//!
//! let user = repos.users.find_by_email("user@example.com").await?;
//! ```

pub mod error;
pub mod models;
pub mod pg;
pub mod pool;
pub mod repo;

pub use error::{DbError, DbResult};
pub use models::*;
pub use pg::Repositories;
pub use pool::{create_pool, DbPool};
pub use repo::*;
