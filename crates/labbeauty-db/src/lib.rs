//! LabBeauty database layer
//!
//! PostgreSQL repositories for the catalog (categories, services, subcategories) and
//! back-office users, plus the traits the API depends on so handlers can run against
//! in-memory doubles in tests.

pub mod db;
#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;

pub use db::{
    map_db_error, parse_unique_violation, CategoryRepository, PhotoRecordStore,
    ServiceRepository, SubCategoryRepository, SubCategoryStore, UserRepository, UserStore,
};
