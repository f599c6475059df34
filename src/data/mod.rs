//! Data layer module
//!
//! Handles user persistence and caching:
//! - The `UserStore` contract the authentication core depends on
//! - SQLite-backed store (the default backend)
//! - In-memory store (test double)
//! - Current-user read cache (volatile)

mod cache;
mod database;
mod memory;
mod models;
mod store;

pub use cache::UserCache;
pub use database::SqliteUserStore;
pub use memory::MemoryUserStore;
pub use models::{EntityId, NewUser, User, UserPatch};
pub use store::UserStore;
