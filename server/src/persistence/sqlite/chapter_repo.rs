//! SQLite-backed implementation of [`ChapterRepository`].

use navbar::{
    check_dense, plan_delete, plan_insert, plan_move, plan_reorder, Chapter, ChapterId,
    ChapterUpdate, NewChapter, Page, Shift,
};
use sqlx::{SqliteConnection, SqlitePool};

use super::helpers::{decode_page, decode_position, encode_page};
use crate::locks::PageLocks;
use crate::persistence::traits::ChapterRepository;
use crate::persistence::{now_timestamp, PersistenceError};

/// Attempts to lock a chapter's page before giving up with `Contention`.
const MAX_LOCK_ATTEMPTS: usize = 8;

/// Row type for chapter queries, mapped via `sqlx::FromRow`.
#[derive(sqlx::FromRow)]
struct ChapterRow {
    id: i64,
    name: String,
    page: String,
    bar_idx: i64,
    created_at: i64,
    updated_at: i64,
}

impl TryFrom<ChapterRow> for Chapter {
    type Error = PersistenceError;

    fn try_from(r: ChapterRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: ChapterId(r.id),
            name: r.name,
            page: decode_page(&r.page)?,
            bar_idx: decode_position(r.bar_idx),
            created_at: r.created_at as u64,
            updated_at: r.updated_at as u64,
        })
    }
}

/// SQLite implementation of [`ChapterRepository`].
pub struct SqliteChapterRepository {
    pool: SqlitePool,
    locks: PageLocks,
}

impl SqliteChapterRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            locks: PageLocks::new(),
        }
    }

    /// Current revision of `page`. Every committed structural change to the
    /// page increments it.
    #[cfg(test)]
    pub async fn page_revision(&self, page: Page) -> Result<u64, PersistenceError> {
        let revision: i64 = sqlx::query_scalar("SELECT revision FROM navbar_pages WHERE page = ?")
            .bind(encode_page(page))
            .fetch_one(&self.pool)
            .await?;
        Ok(revision as u64)
    }

    /// Page of chapter `id` as last committed, used to pick the lock to take.
    async fn committed_page(&self, id: ChapterId) -> Result<Page, PersistenceError> {
        let page: Option<String> = sqlx::query_scalar("SELECT page FROM chapters WHERE id = ?")
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?;
        match page {
            Some(p) => Ok(decode_page(&p)?),
            None => Err(PersistenceError::NotFound(id)),
        }
    }
}

impl ChapterRepository for SqliteChapterRepository {
    async fn create_chapter(&self, data: &NewChapter) -> Result<Chapter, PersistenceError> {
        data.validate()?;

        let _guard = self.locks.lock([data.page]).await;
        let mut tx = self.pool.begin().await?;
        claim_pages(&mut tx, &[data.page]).await?;

        let count = count_on_page(&mut tx, data.page).await?;
        let plan = plan_insert(data.page, count, data.bar_idx)?;
        let now = now_timestamp();
        for shift in &plan.shifts {
            apply_shift(&mut tx, shift, now).await?;
        }

        let result = sqlx::query(
            "INSERT INTO chapters (name, page, bar_idx, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&data.name)
        .bind(encode_page(data.page))
        .bind(i64::from(plan.position))
        .bind(now as i64)
        .bind(now as i64)
        .execute(&mut *tx)
        .await?;

        verify_page(&mut tx, data.page).await?;
        tx.commit().await?;

        let chapter = Chapter {
            id: ChapterId(result.last_insert_rowid()),
            name: data.name.clone(),
            page: data.page,
            bar_idx: plan.position,
            created_at: now,
            updated_at: now,
        };
        tracing::debug!(
            id = %chapter.id,
            page = %chapter.page,
            bar_idx = chapter.bar_idx,
            shifted = !plan.shifts.is_empty(),
            "Inserted chapter"
        );
        Ok(chapter)
    }

    async fn load_chapter(&self, id: ChapterId) -> Result<Option<Chapter>, PersistenceError> {
        let mut conn = self.pool.acquire().await?;
        fetch_chapter(&mut conn, id).await
    }

    async fn update_chapter(
        &self,
        id: ChapterId,
        update: &ChapterUpdate,
    ) -> Result<Chapter, PersistenceError> {
        update.validate()?;

        for _ in 0..MAX_LOCK_ATTEMPTS {
            let page = self.committed_page(id).await?;
            let pages: Vec<Page> = std::iter::once(page).chain(update.page).collect();

            let guard = self.locks.lock(pages).await;
            let mut tx = self.pool.begin().await?;
            claim_pages(&mut tx, guard.pages()).await?;

            let chapter = fetch_chapter(&mut tx, id)
                .await?
                .ok_or(PersistenceError::NotFound(id))?;
            if chapter.page != page {
                tracing::debug!(
                    %id,
                    locked = %page,
                    actual = %chapter.page,
                    "Chapter changed page before its lock was taken; retrying"
                );
                continue;
            }

            let target_page = update.page.unwrap_or(chapter.page);
            let target_count = count_on_page(&mut tx, target_page).await?;
            let plan = plan_move(chapter.placement(), update.page, update.bar_idx, target_count)?;
            let now = now_timestamp();
            for shift in &plan.shifts {
                apply_shift(&mut tx, shift, now).await?;
            }

            let name = update.name.clone().unwrap_or(chapter.name);
            sqlx::query(
                "UPDATE chapters SET name = ?, page = ?, bar_idx = ?, updated_at = ? WHERE id = ?",
            )
            .bind(&name)
            .bind(encode_page(plan.to.page))
            .bind(i64::from(plan.to.bar_idx))
            .bind(now as i64)
            .bind(id.0)
            .execute(&mut *tx)
            .await?;

            verify_page(&mut tx, plan.from.page).await?;
            if plan.changes_page() {
                verify_page(&mut tx, plan.to.page).await?;
            }
            tx.commit().await?;

            if !plan.is_noop() {
                tracing::debug!(
                    %id,
                    from_page = %plan.from.page,
                    from_idx = plan.from.bar_idx,
                    to_page = %plan.to.page,
                    to_idx = plan.to.bar_idx,
                    "Moved chapter"
                );
            }
            return Ok(Chapter {
                id,
                name,
                page: plan.to.page,
                bar_idx: plan.to.bar_idx,
                created_at: chapter.created_at,
                updated_at: now,
            });
        }

        Err(PersistenceError::Contention(id))
    }

    async fn delete_chapter(&self, id: ChapterId) -> Result<Chapter, PersistenceError> {
        for _ in 0..MAX_LOCK_ATTEMPTS {
            let page = self.committed_page(id).await?;

            let _guard = self.locks.lock([page]).await;
            let mut tx = self.pool.begin().await?;
            claim_pages(&mut tx, &[page]).await?;

            let chapter = fetch_chapter(&mut tx, id)
                .await?
                .ok_or(PersistenceError::NotFound(id))?;
            if chapter.page != page {
                tracing::debug!(
                    %id,
                    locked = %page,
                    actual = %chapter.page,
                    "Chapter changed page before its lock was taken; retrying"
                );
                continue;
            }

            sqlx::query("DELETE FROM chapters WHERE id = ?")
                .bind(id.0)
                .execute(&mut *tx)
                .await?;
            apply_shift(&mut tx, &plan_delete(chapter.placement()), now_timestamp()).await?;

            verify_page(&mut tx, page).await?;
            tx.commit().await?;

            tracing::debug!(%id, %page, bar_idx = chapter.bar_idx, "Deleted chapter");
            return Ok(chapter);
        }

        Err(PersistenceError::Contention(id))
    }

    async fn reorder_page(
        &self,
        page: Page,
        ids: &[ChapterId],
    ) -> Result<Vec<Chapter>, PersistenceError> {
        let _guard = self.locks.lock([page]).await;
        let mut tx = self.pool.begin().await?;
        claim_pages(&mut tx, &[page]).await?;

        let current = fetch_page(&mut tx, page).await?;
        let current_ids: Vec<ChapterId> = current.iter().map(|c| c.id).collect();
        let assignments = plan_reorder(page, &current_ids, ids)?;

        let now = now_timestamp();
        let mut changed = 0usize;
        for (id, position) in assignments {
            let unchanged = current
                .iter()
                .any(|c| c.id == id && c.bar_idx == position);
            if unchanged {
                continue;
            }
            sqlx::query("UPDATE chapters SET bar_idx = ?, updated_at = ? WHERE id = ?")
                .bind(i64::from(position))
                .bind(now as i64)
                .bind(id.0)
                .execute(&mut *tx)
                .await?;
            changed += 1;
        }

        verify_page(&mut tx, page).await?;
        let reordered = fetch_page(&mut tx, page).await?;
        tx.commit().await?;

        tracing::debug!(%page, changed, "Reordered page");
        Ok(reordered)
    }

    async fn list_page(&self, page: Page) -> Result<Vec<Chapter>, PersistenceError> {
        let mut conn = self.pool.acquire().await?;
        fetch_page(&mut conn, page).await
    }

    async fn list_chapters(&self) -> Result<Vec<Chapter>, PersistenceError> {
        let rows: Vec<ChapterRow> = sqlx::query_as(
            r#"
                SELECT id, name, page, bar_idx, created_at, updated_at
                FROM chapters
                ORDER BY page, bar_idx, id
                "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Chapter::try_from).collect()
    }
}

/// Bump the revision of every page in `pages`.
///
/// Run first in each structural transaction: the write takes SQLite's writer
/// lock before any read, so the plan is computed from the latest state.
async fn claim_pages(conn: &mut SqliteConnection, pages: &[Page]) -> Result<(), PersistenceError> {
    for &page in pages {
        sqlx::query("UPDATE navbar_pages SET revision = revision + 1 WHERE page = ?")
            .bind(encode_page(page))
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

async fn count_on_page(conn: &mut SqliteConnection, page: Page) -> Result<u32, PersistenceError> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM chapters WHERE page = ?")
        .bind(encode_page(page))
        .fetch_one(&mut *conn)
        .await?;
    Ok(count as u32)
}

/// Execute one range-conditional shift.
async fn apply_shift(
    conn: &mut SqliteConnection,
    shift: &Shift,
    now: u64,
) -> Result<u64, PersistenceError> {
    let sql = match shift.end {
        None => {
            "UPDATE chapters SET bar_idx = bar_idx + ?, updated_at = ? \
             WHERE page = ? AND bar_idx >= ?"
        }
        Some(_) => {
            "UPDATE chapters SET bar_idx = bar_idx + ?, updated_at = ? \
             WHERE page = ? AND bar_idx >= ? AND bar_idx <= ?"
        }
    };

    let mut query = sqlx::query(sql)
        .bind(shift.delta.as_i64())
        .bind(now as i64)
        .bind(encode_page(shift.page))
        .bind(i64::from(shift.start));
    if let Some(end) = shift.end {
        query = query.bind(i64::from(end));
    }
    let result = query.execute(&mut *conn).await?;

    tracing::trace!(
        page = %shift.page,
        start = shift.start,
        end = ?shift.end,
        delta = shift.delta.as_i64(),
        rows = result.rows_affected(),
        "Shifted chapters"
    );
    Ok(result.rows_affected())
}

async fn fetch_chapter(
    conn: &mut SqliteConnection,
    id: ChapterId,
) -> Result<Option<Chapter>, PersistenceError> {
    let row: Option<ChapterRow> = sqlx::query_as(
        r#"
            SELECT id, name, page, bar_idx, created_at, updated_at
            FROM chapters
            WHERE id = ?
            "#,
    )
    .bind(id.0)
    .fetch_optional(&mut *conn)
    .await?;

    row.map(Chapter::try_from).transpose()
}

/// Load all chapters of a page ordered by `bar_idx`.
async fn fetch_page(
    conn: &mut SqliteConnection,
    page: Page,
) -> Result<Vec<Chapter>, PersistenceError> {
    let rows: Vec<ChapterRow> = sqlx::query_as(
        r#"
            SELECT id, name, page, bar_idx, created_at, updated_at
            FROM chapters
            WHERE page = ?
            ORDER BY bar_idx, id
            "#,
    )
    .bind(encode_page(page))
    .fetch_all(&mut *conn)
    .await?;

    rows.into_iter().map(Chapter::try_from).collect()
}

/// Fail the transaction if `page` is not densely numbered.
async fn verify_page(conn: &mut SqliteConnection, page: Page) -> Result<(), PersistenceError> {
    let positions: Vec<i64> = sqlx::query_scalar("SELECT bar_idx FROM chapters WHERE page = ?")
        .bind(encode_page(page))
        .fetch_all(&mut *conn)
        .await?;

    check_dense(page, positions.into_iter().map(decode_position)).map_err(|e| {
        tracing::error!(%page, error = %e, "Navbar ordering invariant violated; rolling back");
        PersistenceError::from(e)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::sqlite::Database;

    async fn test_db() -> (Database, SqliteChapterRepository) {
        let db = Database::new_in_memory().await.unwrap();
        let repo = SqliteChapterRepository::new(db.pool().clone());
        (db, repo)
    }

    fn new_chapter(name: &str, page: Page, bar_idx: Option<u32>) -> NewChapter {
        NewChapter {
            name: name.to_string(),
            page,
            bar_idx,
        }
    }

    async fn names(repo: &SqliteChapterRepository, page: Page) -> Vec<String> {
        repo.list_page(page)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect()
    }

    #[tokio::test]
    async fn test_create_and_load_roundtrip() {
        let (_db, repo) = test_db().await;
        let created = repo
            .create_chapter(&new_chapter("Latest", Page::News, None))
            .await
            .unwrap();
        assert_eq!(created.bar_idx, 1);
        let loaded = repo.load_chapter(created.id).await.unwrap();
        assert_eq!(loaded, Some(created));
    }

    #[tokio::test]
    async fn test_load_nonexistent() {
        let (_db, repo) = test_db().await;
        assert_eq!(repo.load_chapter(ChapterId(42)).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_create_validates_input() {
        let (_db, repo) = test_db().await;
        let err = repo
            .create_chapter(&new_chapter("", Page::News, None))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PersistenceError::Navbar(navbar::NavbarError::EmptyName)
        ));
        assert!(repo.list_chapters().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rename_keeps_position() {
        let (_db, repo) = test_db().await;
        repo.create_chapter(&new_chapter("A", Page::News, None))
            .await
            .unwrap();
        let b = repo
            .create_chapter(&new_chapter("B", Page::News, None))
            .await
            .unwrap();

        let update = ChapterUpdate {
            name: Some("Results".to_string()),
            ..Default::default()
        };
        let renamed = repo.update_chapter(b.id, &update).await.unwrap();
        assert_eq!(renamed.bar_idx, 2);
        assert_eq!(names(&repo, Page::News).await, vec!["A", "Results"]);
    }

    #[tokio::test]
    async fn test_update_missing_chapter() {
        let (_db, repo) = test_db().await;
        let err = repo
            .update_chapter(ChapterId(7), &ChapterUpdate::default())
            .await
            .unwrap_err();
        assert!(matches!(err, PersistenceError::NotFound(ChapterId(7))));
    }

    #[tokio::test]
    async fn test_delete_missing_chapter() {
        let (_db, repo) = test_db().await;
        let err = repo.delete_chapter(ChapterId(7)).await.unwrap_err();
        assert!(matches!(err, PersistenceError::NotFound(ChapterId(7))));
    }

    #[tokio::test]
    async fn test_structural_changes_bump_page_revision() {
        let (_db, repo) = test_db().await;
        let a = repo
            .create_chapter(&new_chapter("A", Page::News, None))
            .await
            .unwrap();
        assert_eq!(repo.page_revision(Page::News).await.unwrap(), 1);

        let update = ChapterUpdate {
            page: Some(Page::Gallery),
            ..Default::default()
        };
        repo.update_chapter(a.id, &update).await.unwrap();
        assert_eq!(repo.page_revision(Page::News).await.unwrap(), 2);
        assert_eq!(repo.page_revision(Page::Gallery).await.unwrap(), 1);
        assert_eq!(repo.page_revision(Page::Documents).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_failed_plan_rolls_back_revision() {
        let (_db, repo) = test_db().await;
        let err = repo
            .reorder_page(Page::News, &[ChapterId(1)])
            .await
            .unwrap_err();
        assert!(err.is_client_error());
        assert_eq!(repo.page_revision(Page::News).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_verify_page_detects_gap() {
        let (db, _repo) = test_db().await;
        sqlx::query(
            "INSERT INTO chapters (name, page, bar_idx, created_at, updated_at) \
             VALUES ('a', 'news', 1, 0, 0), ('b', 'news', 3, 0, 0)",
        )
        .execute(db.pool())
        .await
        .unwrap();

        let mut conn = db.pool().acquire().await.unwrap();
        let err = verify_page(&mut conn, Page::News).await.unwrap_err();
        assert!(matches!(
            err,
            PersistenceError::Navbar(navbar::NavbarError::InvariantViolation { .. })
        ));
        assert!(!err.is_client_error());
    }

    #[tokio::test]
    async fn test_list_chapters_groups_rows_by_page() {
        let (_db, repo) = test_db().await;
        repo.create_chapter(&new_chapter("N1", Page::News, None))
            .await
            .unwrap();
        repo.create_chapter(&new_chapter("G1", Page::Gallery, None))
            .await
            .unwrap();
        repo.create_chapter(&new_chapter("N0", Page::News, Some(1)))
            .await
            .unwrap();

        let all = repo.list_chapters().await.unwrap();
        assert_eq!(all.len(), 3);
        let news: Vec<&str> = all
            .iter()
            .filter(|c| c.page == Page::News)
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(news, vec!["N0", "N1"]);
    }
}
