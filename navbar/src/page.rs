//! Pages that own a navbar.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::NavbarError;

/// A page of the site. Each page keeps its own independent chapter order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Page {
    News,
    Gallery,
    Documents,
}

impl Page {
    pub const ALL: [Page; 3] = [Page::News, Page::Gallery, Page::Documents];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::News => "news",
            Self::Gallery => "gallery",
            Self::Documents => "documents",
        }
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Page {
    type Err = NavbarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "news" => Ok(Self::News),
            "gallery" => Ok(Self::Gallery),
            "documents" => Ok(Self::Documents),
            other => Err(NavbarError::InvalidPartition(other.to_string())),
        }
    }
}
