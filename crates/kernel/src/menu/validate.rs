//! Menu item validation.
//!
//! Every create and update runs [`validate`] against the full proposed state
//! before anything is written. Field constraints are checked first, then the
//! type rules, then the parent rules. The first violation wins.

use std::collections::HashSet;

use uuid::Uuid;

use super::error::{MenuError, MenuResult};
use crate::models::MenuItem;
use crate::models::menu::{ICON_MAX_LEN, TITLE_MAX_LEN, URL_MAX_LEN};

/// Input field names reported in validation errors.
pub mod fields {
    pub const TITLE: &str = "title";
    pub const URL: &str = "url";
    pub const ICON: &str = "icon";
    pub const TYPE: &str = "type";
    pub const PARENT_ID: &str = "parent_id";
}

/// Facts about the surrounding tree that validation needs, gathered by the
/// store inside the same transaction or lock as the write.
#[derive(Debug, Clone, Default)]
pub struct TreeContext {
    /// The referenced parent, when `parent_id` is set and the row exists.
    pub parent: Option<MenuItem>,

    /// Ancestor ids above the parent, nearest first.
    pub ancestors: Vec<Uuid>,

    /// Whether the item being saved already has children.
    pub has_children: bool,
}

/// Validate a proposed menu item state.
pub fn validate(item: &MenuItem, ctx: &TreeContext) -> MenuResult<()> {
    validate_fields(item)?;
    validate_type_rules(item)?;
    validate_parent(item, ctx)?;

    if ctx.has_children && !item.is_dropdown() {
        return Err(MenuError::validation(
            fields::TYPE,
            "Menu with submenus must remain a Dropdown.",
        ));
    }

    Ok(())
}

fn validate_fields(item: &MenuItem) -> MenuResult<()> {
    if item.title.trim().is_empty() {
        return Err(MenuError::validation(fields::TITLE, "Title cannot be blank."));
    }
    if item.title.chars().count() > TITLE_MAX_LEN {
        return Err(MenuError::validation(
            fields::TITLE,
            format!("Title must be at most {TITLE_MAX_LEN} characters."),
        ));
    }

    if item.url.chars().count() > URL_MAX_LEN {
        return Err(MenuError::validation(
            fields::URL,
            format!("URL must be at most {URL_MAX_LEN} characters."),
        ));
    }
    if !is_slug(&item.url) {
        return Err(MenuError::validation(
            fields::URL,
            "URL may only contain letters, numbers, underscores or hyphens.",
        ));
    }

    if let Some(icon) = &item.icon
        && icon.chars().count() > ICON_MAX_LEN
    {
        return Err(MenuError::validation(
            fields::ICON,
            format!("Icon must be at most {ICON_MAX_LEN} characters."),
        ));
    }

    Ok(())
}

fn validate_type_rules(item: &MenuItem) -> MenuResult<()> {
    if item.is_link() && item.url.is_empty() {
        return Err(MenuError::validation(
            fields::URL,
            "Menu of type Link must have a URL defined.",
        ));
    }

    if item.is_separator() && !item.url.is_empty() {
        return Err(MenuError::validation(
            fields::URL,
            "Menu of type Separator should not have a URL.",
        ));
    }

    Ok(())
}

fn validate_parent(item: &MenuItem, ctx: &TreeContext) -> MenuResult<()> {
    let Some(parent_id) = item.parent_id else {
        return Ok(());
    };

    if parent_id == item.id {
        return Err(MenuError::validation(
            fields::PARENT_ID,
            "A menu cannot be its own parent.",
        ));
    }

    let Some(parent) = &ctx.parent else {
        return Err(MenuError::validation(
            fields::PARENT_ID,
            format!("Parent menu {parent_id} does not exist."),
        ));
    };

    if !parent.is_dropdown() {
        return Err(MenuError::validation(
            fields::PARENT_ID,
            "Parent menu must be of type Dropdown.",
        ));
    }

    if ctx.ancestors.contains(&item.id) {
        return Err(MenuError::validation(
            fields::PARENT_ID,
            "Parent menu cannot be one of this menu's own submenus.",
        ));
    }

    Ok(())
}

/// Slug charset: ASCII letters, digits, `-` and `_`. The empty string passes;
/// whether a URL is required depends on the menu type.
pub fn is_slug(s: &str) -> bool {
    s.chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Walk parent links upwards from `start`, nearest first.
///
/// `parent_of` returns the parent of an id, or `None` when the id is unknown
/// or a root. Stops on the first repeated id so corrupt data cannot loop.
pub fn ancestor_chain(start: Option<Uuid>, parent_of: impl Fn(Uuid) -> Option<Uuid>) -> Vec<Uuid> {
    let mut chain = Vec::new();
    let mut seen = HashSet::new();
    let mut next = start;

    while let Some(id) = next {
        if !seen.insert(id) {
            break;
        }
        chain.push(id);
        next = parent_of(id);
    }

    chain
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use std::collections::HashMap;

    use chrono::Utc;

    use super::*;
    use crate::models::{CreateMenuItem, MenuType};

    fn item(menu_type: MenuType, url: &str) -> MenuItem {
        let mut input = CreateMenuItem::new("Item", menu_type);
        input.url = url.to_string();
        MenuItem::from_input(Uuid::now_v7(), input, Utc::now())
    }

    fn field_of(result: MenuResult<()>) -> &'static str {
        result.unwrap_err().field().unwrap()
    }

    #[test]
    fn link_requires_url() {
        let ctx = TreeContext::default();
        assert_eq!(field_of(validate(&item(MenuType::Link, ""), &ctx)), fields::URL);
        assert!(validate(&item(MenuType::Link, "about-us"), &ctx).is_ok());
    }

    #[test]
    fn separator_forbids_url() {
        let ctx = TreeContext::default();
        assert_eq!(
            field_of(validate(&item(MenuType::Separator, "foo"), &ctx)),
            fields::URL
        );
        assert!(validate(&item(MenuType::Separator, ""), &ctx).is_ok());
    }

    #[test]
    fn dropdown_and_button_url_optional() {
        let ctx = TreeContext::default();
        for menu_type in [MenuType::Dropdown, MenuType::Button] {
            assert!(validate(&item(menu_type, ""), &ctx).is_ok());
            assert!(validate(&item(menu_type, "shop"), &ctx).is_ok());
        }
    }

    #[test]
    fn title_constraints() {
        let ctx = TreeContext::default();
        let mut blank = item(MenuType::Dropdown, "");
        blank.title = "   ".into();
        assert_eq!(field_of(validate(&blank, &ctx)), fields::TITLE);

        let mut long = item(MenuType::Dropdown, "");
        long.title = "é".repeat(TITLE_MAX_LEN);
        assert!(validate(&long, &ctx).is_ok());
        long.title.push('x');
        assert_eq!(field_of(validate(&long, &ctx)), fields::TITLE);
    }

    #[test]
    fn url_must_be_slug() {
        let ctx = TreeContext::default();
        assert_eq!(
            field_of(validate(&item(MenuType::Link, "/about us"), &ctx)),
            fields::URL
        );
        assert_eq!(
            field_of(validate(&item(MenuType::Link, &"a".repeat(URL_MAX_LEN + 1)), &ctx)),
            fields::URL
        );
        assert!(validate(&item(MenuType::Link, "Sale_2024-items"), &ctx).is_ok());
    }

    #[test]
    fn icon_length() {
        let ctx = TreeContext::default();
        let mut with_icon = item(MenuType::Button, "");
        with_icon.icon = Some("i".repeat(ICON_MAX_LEN + 1));
        assert_eq!(field_of(validate(&with_icon, &ctx)), fields::ICON);
    }

    #[test]
    fn parent_must_be_dropdown() {
        let parent = item(MenuType::Link, "home");
        let mut child = item(MenuType::Link, "child");
        child.parent_id = Some(parent.id);
        let ctx = TreeContext {
            parent: Some(parent),
            ..Default::default()
        };
        assert_eq!(field_of(validate(&child, &ctx)), fields::PARENT_ID);
    }

    #[test]
    fn parent_must_exist() {
        let mut child = item(MenuType::Link, "child");
        child.parent_id = Some(Uuid::now_v7());
        assert_eq!(
            field_of(validate(&child, &TreeContext::default())),
            fields::PARENT_ID
        );
    }

    #[test]
    fn cannot_be_own_parent() {
        let mut dropdown = item(MenuType::Dropdown, "");
        dropdown.parent_id = Some(dropdown.id);
        let ctx = TreeContext {
            parent: Some(dropdown.clone()),
            ..Default::default()
        };
        let err = validate(&dropdown, &ctx).unwrap_err();
        assert_eq!(err.field(), Some(fields::PARENT_ID));
        assert!(err.to_string().contains("own parent"));
    }

    #[test]
    fn rejects_longer_cycles() {
        let mut a = item(MenuType::Dropdown, "");
        let b = item(MenuType::Dropdown, "");
        a.parent_id = Some(b.id);
        // b already sits under a
        let ctx = TreeContext {
            parent: Some(b),
            ancestors: vec![a.id],
            has_children: true,
        };
        assert_eq!(field_of(validate(&a, &ctx)), fields::PARENT_ID);
    }

    #[test]
    fn populated_dropdown_keeps_type() {
        let link = item(MenuType::Link, "was-a-dropdown");
        let ctx = TreeContext {
            has_children: true,
            ..Default::default()
        };
        assert_eq!(field_of(validate(&link, &ctx)), fields::TYPE);
    }

    #[test]
    fn ancestor_chain_stops_on_loops() {
        let (a, b, c) = (Uuid::now_v7(), Uuid::now_v7(), Uuid::now_v7());
        let parents: HashMap<Uuid, Uuid> = [(a, b), (b, c), (c, a)].into_iter().collect();
        let chain = ancestor_chain(Some(a), |id| parents.get(&id).copied());
        assert_eq!(chain, vec![a, b, c]);

        assert!(ancestor_chain(None, |_| None).is_empty());
    }
}
