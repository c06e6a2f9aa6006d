//! Database repositories for data access layer
//!
//! Every query runs under a deadline (three seconds by default); a query that
//! misses it fails with [`AppError::Timeout`](labbeauty_core::AppError::Timeout).
//
// Catalog repositories
pub mod category;
pub mod service;
pub mod subcategory;
//
// Back-office accounts
pub mod user;
//
// Deadlines and error mapping shared by all repositories
pub mod query;
//
// Repository traits
pub mod traits;

pub use category::CategoryRepository;
pub use query::{map_db_error, parse_unique_violation};
pub use service::ServiceRepository;
pub use subcategory::SubCategoryRepository;
pub use traits::{PhotoRecordStore, SubCategoryStore, UserStore};
pub use user::UserRepository;
