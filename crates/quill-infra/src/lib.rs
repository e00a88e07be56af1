//! # Quill Infrastructure
//!
//! Concrete implementations of the ports defined in `quill-core`.
//!
//! ## Feature Flags
//!
//! - `postgres` (default) - PostgreSQL entity store via SeaORM
//! - `minimal` - No database driver, in-memory store only

pub mod auth;
pub mod database;
pub mod memory;

pub use auth::{Argon2PasswordService, JwtConfig, JwtTokenService};
pub use database::DatabaseConnections;
pub use memory::MemoryStore;
