//! Navbar views built from a flat chapter list.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{Chapter, Page};

/// Sort chapters by `bar_idx`. Stable, so equal indices keep their input order.
pub fn sort_by_position(chapters: &mut [Chapter]) {
    chapters.sort_by_key(|c| c.bar_idx);
}

/// Group chapters by page, each group sorted by `bar_idx`.
///
/// Pages without chapters are absent from the map.
pub fn group_by_page(chapters: impl IntoIterator<Item = Chapter>) -> BTreeMap<Page, Vec<Chapter>> {
    let mut groups: BTreeMap<Page, Vec<Chapter>> = BTreeMap::new();
    for chapter in chapters {
        groups.entry(chapter.page).or_default().push(chapter);
    }
    for group in groups.values_mut() {
        sort_by_position(group);
    }
    groups
}

/// Navbar contents of every page, in display order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NavbarOrder {
    pub pages: BTreeMap<Page, Vec<Chapter>>,
}

impl NavbarOrder {
    pub fn from_chapters(chapters: impl IntoIterator<Item = Chapter>) -> Self {
        Self {
            pages: group_by_page(chapters),
        }
    }

    pub fn page(&self, page: Page) -> &[Chapter] {
        self.pages.get(&page).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Chapter names of `page` in display order.
    pub fn names(&self, page: Page) -> Vec<&str> {
        self.page(page).iter().map(|c| c.name.as_str()).collect()
    }
}
