//! Planning of `bar_idx` maintenance.
//!
//! Every structural change to a page is expressed as a list of [`Shift`]s:
//! bulk conditional increments or decrements over an inclusive range of
//! positions on a single page. Executing the shifts and then writing the
//! affected chapter's own placement, all inside one transaction, keeps every
//! page dense.
//!
//! A shift never matches the chapter being inserted, moved or deleted, so the
//! executor may run the shifts and the chapter's own write in any order.
//!
//! Requested positions past the end of a page are clamped:
//! - insert: `N + 1`
//! - move within a page: `N`
//! - move onto another page: `M + 1`, where `M` is that page's size
//!
//! A position of `0` is always rejected.

use std::collections::BTreeSet;

use crate::{ChapterId, NavbarError, Page};

/// Direction of a bulk position change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delta {
    /// `bar_idx + 1`: make room in front.
    Up,
    /// `bar_idx - 1`: close a hole in front.
    Down,
}

impl Delta {
    pub fn as_i64(self) -> i64 {
        match self {
            Self::Up => 1,
            Self::Down => -1,
        }
    }

    fn apply(self, position: u32) -> u32 {
        match self {
            Self::Up => position + 1,
            Self::Down => position.saturating_sub(1),
        }
    }
}

/// Range-conditional update: every chapter of `page` whose `bar_idx` lies in
/// `start..=end` (or `start..` when `end` is `None`) is moved by `delta`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shift {
    pub page: Page,
    pub start: u32,
    pub end: Option<u32>,
    pub delta: Delta,
}

impl Shift {
    /// Free position `at` by pushing it and everything after it back by one.
    pub fn open_slot(page: Page, at: u32) -> Self {
        Self {
            page,
            start: at,
            end: None,
            delta: Delta::Up,
        }
    }

    /// Close the hole left at `vacated` by pulling everything after it forward.
    pub fn close_gap(page: Page, vacated: u32) -> Self {
        Self {
            page,
            start: vacated + 1,
            end: None,
            delta: Delta::Down,
        }
    }

    pub fn range(page: Page, start: u32, end: u32, delta: Delta) -> Self {
        Self {
            page,
            start,
            end: Some(end),
            delta,
        }
    }

    pub fn covers(&self, page: Page, position: u32) -> bool {
        self.page == page && position >= self.start && self.end.map_or(true, |end| position <= end)
    }

    /// Position after this shift ran, for a chapter at `(page, position)`.
    pub fn apply(&self, page: Page, position: u32) -> u32 {
        if self.covers(page, position) {
            self.delta.apply(position)
        } else {
            position
        }
    }
}

/// Where a chapter sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub page: Page,
    pub bar_idx: u32,
}

/// Result of [`plan_insert`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertPlan {
    pub position: u32,
    pub shifts: Vec<Shift>,
}

/// Plan the insertion of a chapter into a page currently holding `count`
/// chapters. Without a requested position the chapter is appended.
pub fn plan_insert(
    page: Page,
    count: u32,
    requested: Option<u32>,
) -> Result<InsertPlan, NavbarError> {
    let append = count + 1;
    let position = match requested {
        None => append,
        Some(0) => return Err(NavbarError::InvalidPosition(0)),
        Some(p) => p.min(append),
    };

    let shifts = if position < append {
        vec![Shift::open_slot(page, position)]
    } else {
        Vec::new()
    };

    Ok(InsertPlan { position, shifts })
}

/// Result of [`plan_move`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovePlan {
    pub from: Placement,
    pub to: Placement,
    pub shifts: Vec<Shift>,
}

impl MovePlan {
    pub fn is_noop(&self) -> bool {
        self.from == self.to
    }

    pub fn changes_page(&self) -> bool {
        self.from.page != self.to.page
    }
}

/// Plan moving a chapter from `from` to a new page and/or position.
///
/// `target_count` is the number of chapters currently on the destination page
/// (`page.unwrap_or(from.page)`), which includes the moving chapter itself
/// when the page does not change.
///
/// When only the page changes, the chapter keeps its old `bar_idx` on the new
/// page, clamped to the end of that page.
pub fn plan_move(
    from: Placement,
    page: Option<Page>,
    bar_idx: Option<u32>,
    target_count: u32,
) -> Result<MovePlan, NavbarError> {
    if bar_idx == Some(0) {
        return Err(NavbarError::InvalidPosition(0));
    }

    let target_page = page.unwrap_or(from.page);

    if target_page != from.page {
        let position = bar_idx.unwrap_or(from.bar_idx).min(target_count + 1);
        let mut shifts = vec![Shift::close_gap(from.page, from.bar_idx)];
        if position <= target_count {
            shifts.push(Shift::open_slot(target_page, position));
        }
        return Ok(MovePlan {
            from,
            to: Placement {
                page: target_page,
                bar_idx: position,
            },
            shifts,
        });
    }

    let old = from.bar_idx;
    let new = bar_idx.map_or(old, |p| p.min(target_count.max(1)));

    let shifts = if new < old {
        vec![Shift::range(from.page, new, old - 1, Delta::Up)]
    } else if new > old {
        vec![Shift::range(from.page, old + 1, new, Delta::Down)]
    } else {
        Vec::new()
    };

    Ok(MovePlan {
        from,
        to: Placement {
            page: from.page,
            bar_idx: new,
        },
        shifts,
    })
}

/// Compaction after the chapter at `at` is removed from its page.
pub fn plan_delete(at: Placement) -> Shift {
    Shift::close_gap(at.page, at.bar_idx)
}

/// Plan a full reorder of `page`.
///
/// `requested` must list exactly the chapters currently on the page (`current`),
/// each once, in the desired order. The result pairs every id with its new
/// 1-based position.
pub fn plan_reorder(
    page: Page,
    current: &[ChapterId],
    requested: &[ChapterId],
) -> Result<Vec<(ChapterId, u32)>, NavbarError> {
    let mut seen = BTreeSet::new();
    for &id in requested {
        if !seen.insert(id) {
            return Err(NavbarError::DuplicateId { page, id });
        }
    }

    let existing: BTreeSet<ChapterId> = current.iter().copied().collect();
    let missing: Vec<ChapterId> = existing.difference(&seen).copied().collect();
    let unexpected: Vec<ChapterId> = seen.difference(&existing).copied().collect();
    if !missing.is_empty() || !unexpected.is_empty() {
        return Err(NavbarError::MembershipMismatch {
            page,
            missing,
            unexpected,
        });
    }

    Ok(requested
        .iter()
        .zip(1u32..)
        .map(|(&id, position)| (id, position))
        .collect())
}

/// Verify that `positions` is exactly `{1, ..., N}`.
pub fn check_dense(
    page: Page,
    positions: impl IntoIterator<Item = u32>,
) -> Result<(), NavbarError> {
    let mut positions: Vec<u32> = positions.into_iter().collect();
    positions.sort_unstable();
    if positions.iter().zip(1u32..).all(|(&p, expected)| p == expected) {
        Ok(())
    } else {
        Err(NavbarError::InvariantViolation { page, positions })
    }
}
