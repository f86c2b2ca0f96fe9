use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{NavbarError, Page, Placement};

/// Row identifier of a chapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChapterId(pub i64);

impl fmt::Display for ChapterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A navbar section shown on one page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    pub id: ChapterId,
    pub name: String,
    pub page: Page,
    pub bar_idx: u32,
    pub created_at: u64,
    pub updated_at: u64,
}

impl Chapter {
    pub fn placement(&self) -> Placement {
        Placement {
            page: self.page,
            bar_idx: self.bar_idx,
        }
    }
}

/// Input for creating a chapter. Without `bar_idx` the chapter is appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewChapter {
    pub name: String,
    pub page: Page,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bar_idx: Option<u32>,
}

impl NewChapter {
    pub fn validate(&self) -> Result<(), NavbarError> {
        validate_name(&self.name)?;
        if self.bar_idx == Some(0) {
            return Err(NavbarError::InvalidPosition(0));
        }
        Ok(())
    }
}

/// Partial update of a chapter. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub page: Option<Page>,
    #[serde(default)]
    pub bar_idx: Option<u32>,
}

impl ChapterUpdate {
    pub fn validate(&self) -> Result<(), NavbarError> {
        if let Some(ref name) = self.name {
            validate_name(name)?;
        }
        if self.bar_idx == Some(0) {
            return Err(NavbarError::InvalidPosition(0));
        }
        Ok(())
    }

    /// True when the update may change the chapter's page or rank.
    pub fn touches_order(&self) -> bool {
        self.page.is_some() || self.bar_idx.is_some()
    }
}

fn validate_name(name: &str) -> Result<(), NavbarError> {
    if name.trim().is_empty() {
        Err(NavbarError::EmptyName)
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_chapter_rejects_zero_position() {
        let dto = NewChapter {
            name: "Results".to_string(),
            page: Page::News,
            bar_idx: Some(0),
        };
        assert_eq!(dto.validate(), Err(NavbarError::InvalidPosition(0)));
    }

    #[test]
    fn test_new_chapter_rejects_blank_name() {
        let dto = NewChapter {
            name: "   ".to_string(),
            page: Page::News,
            bar_idx: None,
        };
        assert_eq!(dto.validate(), Err(NavbarError::EmptyName));
    }

    #[test]
    fn test_update_touches_order() {
        assert!(!ChapterUpdate::default().touches_order());
        let rename = ChapterUpdate {
            name: Some("Archive".to_string()),
            ..Default::default()
        };
        assert!(!rename.touches_order());
        let reorder = ChapterUpdate {
            bar_idx: Some(2),
            ..Default::default()
        };
        assert!(reorder.touches_order());
    }

    #[test]
    fn test_update_deserializes_partial_json() {
        let update: ChapterUpdate = serde_json::from_str(r#"{"page":"gallery"}"#).unwrap();
        assert_eq!(update.page, Some(Page::Gallery));
        assert_eq!(update.bar_idx, None);
        assert_eq!(update.name, None);
    }
}
