//! Task module
//!
//! This module contains task-related types and logic.

mod gateway;
mod model;
mod repository;
mod sqlite_store;
mod validation;

pub use gateway::{TaskGateway, WriteOutcome};
pub use model::*;
pub use repository::{StoreTaskRepository, TaskRepository};
pub use sqlite_store::SqliteTaskStore;
pub use validation::{validate_title, ValidationError};
