// ABOUTME: Data layer and persistence for Docket
// ABOUTME: SQLite-backed request, thread, and membership stores behind async traits

pub mod db;
pub mod error;
pub mod listing;
pub mod members;
pub mod pagination;
pub mod requests;
pub mod threads;
pub mod traits;

pub use db::Database;
pub use error::{StorageError, StorageResult};
pub use listing::{RequestFilter, RequestSort};
pub use members::SqliteMembershipStore;
pub use pagination::{PaginatedResponse, PaginationMeta, PaginationParams};
pub use requests::SqliteRequestStore;
pub use threads::SqliteThreadStore;
pub use traits::{MembershipSource, NewRequest, RequestReplacement, RequestStore, ThreadStore};
