//! Domain model for the federation site's navigation bar.
//!
//! Chapters are the sections shown in the navbar of each [`Page`]. Within a
//! page every chapter holds a `bar_idx`, a 1-based rank that is kept dense
//! (`{1, 2, ..., N}`) by the planner in [`ordering`]. This crate performs no
//! I/O: it decides *which* rows move and by how much, and the persistence
//! layer executes those plans inside a transaction.

pub mod chapter;
pub mod error;
pub mod grouping;
pub mod ordering;
pub mod page;

pub use chapter::{Chapter, ChapterId, ChapterUpdate, NewChapter};
pub use error::NavbarError;
pub use grouping::{group_by_page, sort_by_position, NavbarOrder};
pub use ordering::{
    check_dense, plan_delete, plan_insert, plan_move, plan_reorder, Delta, InsertPlan, MovePlan,
    Placement, Shift,
};
pub use page::Page;
