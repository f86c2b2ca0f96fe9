//! Per-page advisory locks for structural navbar changes.
//!
//! Every operation that shifts `bar_idx` values holds the lock of each page
//! it touches from before `BEGIN` until after commit or rollback. Multiple
//! pages are always locked in `Page` order, so a move from news to gallery
//! and a concurrent move from gallery to news cannot deadlock.

use navbar::Page;
use std::collections::BTreeSet;
use tokio::sync::{Mutex, MutexGuard};

#[derive(Debug, Default)]
pub struct PageLocks {
    news: Mutex<()>,
    gallery: Mutex<()>,
    documents: Mutex<()>,
}

/// Held locks; released on drop.
#[derive(Debug)]
pub struct PageGuard<'a> {
    pages: Vec<Page>,
    _guards: Vec<MutexGuard<'a, ()>>,
}

impl PageGuard<'_> {
    pub fn pages(&self) -> &[Page] {
        &self.pages
    }
}

impl PageLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, page: Page) -> &Mutex<()> {
        match page {
            Page::News => &self.news,
            Page::Gallery => &self.gallery,
            Page::Documents => &self.documents,
        }
    }

    /// Lock every distinct page in `pages`, in `Page` order.
    pub async fn lock(&self, pages: impl IntoIterator<Item = Page>) -> PageGuard<'_> {
        let pages: Vec<Page> = pages.into_iter().collect::<BTreeSet<_>>().into_iter().collect();
        let mut guards = Vec::with_capacity(pages.len());
        for &page in &pages {
            guards.push(self.slot(page).lock().await);
        }
        PageGuard {
            pages,
            _guards: guards,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_lock_dedupes_and_sorts_pages() {
        let locks = PageLocks::new();
        let guard = locks
            .lock([Page::Documents, Page::News, Page::Documents])
            .await;
        assert_eq!(guard.pages(), &[Page::News, Page::Documents]);
    }

    #[tokio::test]
    async fn test_same_page_is_exclusive() {
        let locks = Arc::new(PageLocks::new());
        let guard = locks.lock([Page::News]).await;

        let contender = {
            let locks = Arc::clone(&locks);
            tokio::spawn(async move {
                let _guard = locks.lock([Page::News]).await;
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        drop(guard);
        tokio::time::timeout(Duration::from_secs(1), contender)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_other_pages_are_independent() {
        let locks = PageLocks::new();
        let _news = locks.lock([Page::News]).await;
        let gallery = tokio::time::timeout(Duration::from_millis(100), locks.lock([Page::Gallery]))
            .await;
        assert!(gallery.is_ok());
    }

    #[tokio::test]
    async fn test_opposite_cross_page_moves_do_not_deadlock() {
        let locks = Arc::new(PageLocks::new());
        let mut tasks = Vec::new();
        for i in 0..20 {
            let locks = Arc::clone(&locks);
            tasks.push(tokio::spawn(async move {
                let pages = if i % 2 == 0 {
                    [Page::News, Page::Gallery]
                } else {
                    [Page::Gallery, Page::News]
                };
                let _guard = locks.lock(pages).await;
                tokio::task::yield_now().await;
            }));
        }
        for task in tasks {
            tokio::time::timeout(Duration::from_secs(2), task)
                .await
                .unwrap()
                .unwrap();
        }
    }
}
