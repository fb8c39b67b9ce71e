//! Listing filters shared by every store backend.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{MenuItem, MenuType};

/// Restrict a listing by position in the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ParentFilter {
    /// Top-level items only.
    Root,
    /// Direct children of the given item.
    Child(Uuid),
}

impl FromStr for ParentFilter {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("root") {
            Ok(ParentFilter::Root)
        } else {
            s.parse().map(ParentFilter::Child)
        }
    }
}

impl TryFrom<String> for ParentFilter {
    type Error = uuid::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for ParentFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParentFilter::Root => f.write_str("root"),
            ParentFilter::Child(id) => write!(f, "{id}"),
        }
    }
}

impl From<ParentFilter> for String {
    fn from(filter: ParentFilter) -> Self {
        filter.to_string()
    }
}

/// Criteria for listing menu items.
///
/// Results are always returned in display order `(order, title, id)`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MenuFilter {
    #[serde(rename = "type")]
    pub menu_type: Option<MenuType>,
    pub is_active: Option<bool>,
    pub is_featured: Option<bool>,
    pub parent: Option<ParentFilter>,
    pub created_after: Option<DateTime<Utc>>,
    pub created_before: Option<DateTime<Utc>>,

    /// Case-insensitive exact title match.
    pub title: Option<String>,

    /// Case-insensitive substring match on title, url or icon.
    #[serde(alias = "q")]
    pub search: Option<String>,

    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl MenuFilter {
    /// Active top-level items.
    pub fn main_menus() -> Self {
        Self {
            is_active: Some(true),
            parent: Some(ParentFilter::Root),
            ..Default::default()
        }
    }

    /// Active direct children of `parent_id`.
    pub fn active_children(parent_id: Uuid) -> Self {
        Self {
            is_active: Some(true),
            parent: Some(ParentFilter::Child(parent_id)),
            ..Default::default()
        }
    }

    /// Active items titled `title`, ignoring case.
    pub fn active_titled(title: &str) -> Self {
        Self {
            is_active: Some(true),
            title: Some(title.to_string()),
            ..Default::default()
        }
    }

    /// Every active item.
    pub fn active() -> Self {
        Self {
            is_active: Some(true),
            ..Default::default()
        }
    }

    /// Normalized search needle, if any.
    pub fn search_term(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase)
    }

    /// Check an item against every criterion except pagination.
    pub fn matches(&self, item: &MenuItem) -> bool {
        if self.menu_type.is_some_and(|t| t != item.menu_type) {
            return false;
        }
        if self.is_active.is_some_and(|a| a != item.is_active) {
            return false;
        }
        if self.is_featured.is_some_and(|f| f != item.is_featured) {
            return false;
        }
        match self.parent {
            Some(ParentFilter::Root) if item.parent_id.is_some() => return false,
            Some(ParentFilter::Child(id)) if item.parent_id != Some(id) => return false,
            _ => {}
        }
        if self.created_after.is_some_and(|t| item.created_at < t) {
            return false;
        }
        if self.created_before.is_some_and(|t| item.created_at > t) {
            return false;
        }
        if let Some(title) = &self.title
            && item.title.to_lowercase() != title.to_lowercase()
        {
            return false;
        }
        if let Some(needle) = self.search_term() {
            let hit = [Some(item.title.as_str()), Some(item.url.as_str()), item.icon.as_deref()]
                .into_iter()
                .flatten()
                .any(|s| s.to_lowercase().contains(&needle));
            if !hit {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::models::CreateMenuItem;

    fn item(title: &str, menu_type: MenuType) -> MenuItem {
        MenuItem::from_input(
            Uuid::now_v7(),
            CreateMenuItem::new(title, menu_type),
            Utc::now(),
        )
    }

    #[test]
    fn main_menus_excludes_children_and_inactive() {
        let filter = MenuFilter::main_menus();
        let root = item("Home", MenuType::Dropdown);
        let mut child = item("Child", MenuType::Dropdown);
        child.parent_id = Some(root.id);
        let mut hidden = item("Hidden", MenuType::Dropdown);
        hidden.is_active = false;

        assert!(filter.matches(&root));
        assert!(!filter.matches(&child));
        assert!(!filter.matches(&hidden));
    }

    #[test]
    fn active_children_of_one_parent() {
        let parent = item("Products", MenuType::Dropdown);
        let mut child = item("Widgets", MenuType::Link);
        child.parent_id = Some(parent.id);

        assert!(MenuFilter::active_children(parent.id).matches(&child));
        assert!(!MenuFilter::active_children(Uuid::now_v7()).matches(&child));
        assert!(!MenuFilter::active_children(parent.id).matches(&parent));
    }

    #[test]
    fn search_covers_title_url_icon() {
        let mut item = item("Products", MenuType::Link);
        item.url = "catalog".into();
        item.icon = Some("fa-box".into());

        for needle in ["PROD", "catal", "box"] {
            let filter = MenuFilter {
                search: Some(needle.into()),
                ..Default::default()
            };
            assert!(filter.matches(&item), "{needle} should match");
        }

        let miss = MenuFilter {
            search: Some("blog".into()),
            ..Default::default()
        };
        assert!(!miss.matches(&item));

        let blank = MenuFilter {
            search: Some("  ".into()),
            ..Default::default()
        };
        assert!(blank.matches(&item));
    }

    #[test]
    fn type_and_featured_filters() {
        let mut featured = item("Sale", MenuType::Button);
        featured.is_featured = true;

        let buttons = MenuFilter {
            menu_type: Some(MenuType::Button),
            is_featured: Some(true),
            ..Default::default()
        };
        assert!(buttons.matches(&featured));
        assert!(!buttons.matches(&item("Sale", MenuType::Link)));
    }

    #[test]
    fn created_window() {
        let item = item("Blog", MenuType::Dropdown);
        let before = MenuFilter {
            created_before: Some(item.created_at - chrono::Duration::seconds(1)),
            ..Default::default()
        };
        let after = MenuFilter {
            created_after: Some(item.created_at - chrono::Duration::seconds(1)),
            ..Default::default()
        };
        assert!(!before.matches(&item));
        assert!(after.matches(&item));
    }

    #[test]
    fn title_match_ignores_case_but_not_substrings() {
        let filter = MenuFilter::active_titled("HELP");
        assert!(filter.matches(&item("Help", MenuType::Link)));
        assert!(!filter.matches(&item("Help desk", MenuType::Link)));
    }

    #[test]
    fn parent_filter_parses() {
        assert_eq!("root".parse::<ParentFilter>().unwrap(), ParentFilter::Root);
        let id = Uuid::now_v7();
        assert_eq!(
            id.to_string().parse::<ParentFilter>().unwrap(),
            ParentFilter::Child(id)
        );
        assert!("nope".parse::<ParentFilter>().is_err());
    }
}
