//! # Quill Core
//!
//! The domain layer of the Quill blog.
//! This crate contains pure business logic with zero infrastructure dependencies:
//! entities, the pagination policy, the edit authorization rule, form validation
//! and the services every HTTP handler delegates to.

pub mod domain;
pub mod error;
pub mod forms;
pub mod pagination;
pub mod policy;
pub mod ports;
pub mod service;

pub use error::DomainError;
pub use pagination::{PAGE_SIZE, Page, PageRequest};
