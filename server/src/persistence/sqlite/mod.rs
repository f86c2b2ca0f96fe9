//! SQLite-backed repository implementation.
//!
//! ## Database setup
//!
//! [`Database`] wraps a `sqlx::SqlitePool` configured with:
//! - **WAL mode** — allows one writer and multiple concurrent readers.
//! - **Foreign keys enabled** — `chapters.page` must name a row of `navbar_pages`.
//! - **Embedded migrations** — `sqlx::migrate!` runs `migrations/001_initial_schema.sql`
//!   automatically when [`Database::open`] is called. The schema is idempotent.
//!
//! ## Write transactions
//!
//! Every structural operation of [`SqliteChapterRepository`] opens its
//! transaction by bumping `navbar_pages.revision` for each page it touches.
//! Starting with a write takes SQLite's writer lock before any row is read, so
//! the reads that feed the shift plan always see the latest committed state.
//!
//! Page columns are stored as `TEXT` and round-tripped through the helpers in
//! [`helpers`].

mod chapter_repo;
mod database;
pub(crate) mod helpers;

pub use chapter_repo::SqliteChapterRepository;
pub use database::Database;
