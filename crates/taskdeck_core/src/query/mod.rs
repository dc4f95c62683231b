//! List query pipeline.
//!
//! # Responsibility
//! - Apply search, category, priority and completion filters.
//! - Order list results for display.
//!
//! # See also
//! - `crate::service::task_service::TaskService::list`

pub mod filter;
