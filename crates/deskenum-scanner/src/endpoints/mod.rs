//! Concrete search endpoints of the target platform.
//!
//! - [`users`] - customer portal user search (page-ceiling truncation)
//! - [`docs`] - help center article search (total-count truncation)

pub mod docs;
pub mod users;

pub use docs::{fetch_cloud_id, DocumentSearch};
pub use users::{list_service_desks, UserSearch};
