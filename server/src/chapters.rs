//! Chapter service: the entry point used by the CLI (and any future transport)
//! for navbar chapters.

use navbar::{check_dense, Chapter, ChapterId, ChapterUpdate, NavbarOrder, NewChapter, Page};

use crate::persistence::{ChapterRepository, PersistenceError};

/// Thin facade over a [`ChapterRepository`] adding lookups that fail with
/// `NotFound`, the grouped navbar view, and operation logging.
pub struct ChapterService<R> {
    repo: R,
}

impl<R: ChapterRepository> ChapterService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    #[tracing::instrument(skip(self, data), fields(page = %data.page, bar_idx = ?data.bar_idx))]
    pub async fn create(&self, data: NewChapter) -> Result<Chapter, PersistenceError> {
        let chapter = self.repo.create_chapter(&data).await.inspect_err(log_failure)?;
        tracing::info!(id = %chapter.id, bar_idx = chapter.bar_idx, "Chapter created");
        Ok(chapter)
    }

    pub async fn get(&self, id: ChapterId) -> Result<Chapter, PersistenceError> {
        self.repo
            .load_chapter(id)
            .await?
            .ok_or(PersistenceError::NotFound(id))
    }

    #[tracing::instrument(skip(self, update))]
    pub async fn update(
        &self,
        id: ChapterId,
        update: ChapterUpdate,
    ) -> Result<Chapter, PersistenceError> {
        let chapter = self
            .repo
            .update_chapter(id, &update)
            .await
            .inspect_err(log_failure)?;
        tracing::info!(page = %chapter.page, bar_idx = chapter.bar_idx, "Chapter updated");
        Ok(chapter)
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, id: ChapterId) -> Result<Chapter, PersistenceError> {
        let chapter = self.repo.delete_chapter(id).await.inspect_err(log_failure)?;
        tracing::info!(page = %chapter.page, bar_idx = chapter.bar_idx, "Chapter deleted");
        Ok(chapter)
    }

    #[tracing::instrument(skip(self, ids), fields(count = ids.len()))]
    pub async fn reorder(
        &self,
        page: Page,
        ids: &[ChapterId],
    ) -> Result<Vec<Chapter>, PersistenceError> {
        let chapters = self
            .repo
            .reorder_page(page, ids)
            .await
            .inspect_err(log_failure)?;
        tracing::info!("Page reordered");
        Ok(chapters)
    }

    pub async fn list(&self) -> Result<Vec<Chapter>, PersistenceError> {
        self.repo.list_chapters().await
    }

    pub async fn list_by_page(&self, page: Page) -> Result<Vec<Chapter>, PersistenceError> {
        self.repo.list_page(page).await
    }

    /// Every page's chapters in display order.
    pub async fn navbar_order(&self) -> Result<NavbarOrder, PersistenceError> {
        Ok(NavbarOrder::from_chapters(self.repo.list_chapters().await?))
    }

    /// Check that every page is densely numbered.
    pub async fn verify_all(&self) -> Result<(), PersistenceError> {
        for page in Page::ALL {
            let chapters = self.repo.list_page(page).await?;
            check_dense(page, chapters.iter().map(|c| c.bar_idx)).inspect_err(|e| {
                tracing::error!(%page, error = %e, "Navbar ordering invariant violated");
            })?;
        }
        Ok(())
    }
}

fn log_failure(e: &PersistenceError) {
    if e.is_client_error() {
        tracing::warn!(error = %e, "Chapter request rejected");
    } else {
        tracing::error!(error = %e, "Chapter operation failed");
    }
}
