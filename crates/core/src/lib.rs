//! Core library for the task tracking service
//!
//! This crate contains the domain side of the service:
//! - Task records and their validation
//! - The persistence gateway and its SQLite implementation
//! - The task repository contract
//! - The read-through cache for the task list
//! - Pagination of listed tasks

pub mod cache;
pub mod db;
pub mod error;
pub mod pagination;
pub mod task;

pub use error::Error;
pub type Result<T> = std::result::Result<T, Error>;
