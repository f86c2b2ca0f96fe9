//! Async repository trait for navbar chapters.
//!
//! Methods return `impl Future + Send` rather than using `async fn` so that
//! the futures are guaranteed `Send` and can be driven from `tokio::spawn`.
//!
//! Structural methods (`create_chapter`, `update_chapter`, `delete_chapter`,
//! `reorder_page`) keep every page's `bar_idx` sequence dense: each runs as
//! one transaction that shifts the affected siblings, writes the chapter, and
//! checks the touched pages before committing. Implementations serialize
//! structural operations per page.

use super::PersistenceError;
use navbar::{Chapter, ChapterId, ChapterUpdate, NewChapter, Page};
use std::future::Future;

pub trait ChapterRepository: Send + Sync {
    /// Insert a chapter at its requested position, or append it.
    fn create_chapter(
        &self,
        data: &NewChapter,
    ) -> impl Future<Output = Result<Chapter, PersistenceError>> + Send;
    fn load_chapter(
        &self,
        id: ChapterId,
    ) -> impl Future<Output = Result<Option<Chapter>, PersistenceError>> + Send;
    /// Rename and/or move a chapter within its page or onto another page.
    fn update_chapter(
        &self,
        id: ChapterId,
        update: &ChapterUpdate,
    ) -> impl Future<Output = Result<Chapter, PersistenceError>> + Send;
    /// Delete a chapter and compact its page. Returns the removed chapter.
    fn delete_chapter(
        &self,
        id: ChapterId,
    ) -> impl Future<Output = Result<Chapter, PersistenceError>> + Send;
    /// Renumber `page` so that `ids[i]` ends up at `bar_idx == i + 1`.
    ///
    /// `ids` must name every chapter of the page exactly once.
    fn reorder_page(
        &self,
        page: Page,
        ids: &[ChapterId],
    ) -> impl Future<Output = Result<Vec<Chapter>, PersistenceError>> + Send;
    /// Chapters of `page` in `bar_idx` order.
    fn list_page(
        &self,
        page: Page,
    ) -> impl Future<Output = Result<Vec<Chapter>, PersistenceError>> + Send;
    fn list_chapters(&self) -> impl Future<Output = Result<Vec<Chapter>, PersistenceError>> + Send;
}
