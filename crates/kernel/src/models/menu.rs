//! Menu item model.
//!
//! A menu item is one node of the site navigation tree. Items are typed
//! (link, dropdown, separator, button), ordered among their siblings by
//! `(order, title)`, and may nest under a dropdown parent.
//!
//! Persistence lives in [`crate::menu`]; this module only holds the data
//! shapes and the pure predicates over them.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value as JsonValue;
use thiserror::Error;
use uuid::Uuid;

use super::viewer::Principal;

/// Maximum title length in characters.
pub const TITLE_MAX_LEN: usize = 100;

/// Maximum URL slug length in characters.
pub const URL_MAX_LEN: usize = 255;

/// Maximum icon identifier length in characters.
pub const ICON_MAX_LEN: usize = 50;

/// A stored string did not match any known choice.
#[derive(Debug, Error)]
#[error("unknown {kind} '{value}'")]
pub struct UnknownChoice {
    pub kind: &'static str,
    pub value: String,
}

/// Kind of menu entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MenuType {
    Link,
    Dropdown,
    Separator,
    Button,
}

impl MenuType {
    /// Stored string value.
    pub fn as_str(self) -> &'static str {
        match self {
            MenuType::Link => "link",
            MenuType::Dropdown => "dropdown",
            MenuType::Separator => "separator",
            MenuType::Button => "button",
        }
    }

    /// Human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            MenuType::Link => "Link",
            MenuType::Dropdown => "Dropdown",
            MenuType::Separator => "Separator",
            MenuType::Button => "Button",
        }
    }
}

impl FromStr for MenuType {
    type Err = UnknownChoice;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "link" => Ok(MenuType::Link),
            "dropdown" => Ok(MenuType::Dropdown),
            "separator" => Ok(MenuType::Separator),
            "button" => Ok(MenuType::Button),
            other => Err(UnknownChoice {
                kind: "menu type",
                value: other.to_string(),
            }),
        }
    }
}

/// Where a link or button opens.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MenuTarget {
    #[default]
    #[serde(rename = "_self")]
    SameTab,
    #[serde(rename = "_blank")]
    NewTab,
}

impl MenuTarget {
    /// Stored string value (the HTML `target` attribute).
    pub fn as_str(self) -> &'static str {
        match self {
            MenuTarget::SameTab => "_self",
            MenuTarget::NewTab => "_blank",
        }
    }
}

impl FromStr for MenuTarget {
    type Err = UnknownChoice;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "_self" => Ok(MenuTarget::SameTab),
            "_blank" => Ok(MenuTarget::NewTab),
            other => Err(UnknownChoice {
                kind: "menu target",
                value: other.to_string(),
            }),
        }
    }
}

/// Role restriction attached to a menu item.
///
/// Stored as a nullable JSON array of role names. Values that cannot be read
/// as a list of strings are kept verbatim in [`AllowedRoles::Unreadable`] so
/// that saving an item never rewrites data it did not touch, and such items
/// stay visible to everyone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Option<JsonValue>", into = "Option<JsonValue>")]
pub enum AllowedRoles {
    /// No restriction.
    #[default]
    Everyone,

    /// Visible to viewers holding at least one of these roles.
    Only(BTreeSet<String>),

    /// Stored value that is not a list of role names.
    Unreadable(JsonValue),
}

impl AllowedRoles {
    /// Restrict to the given roles. An empty list means no restriction.
    pub fn only<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let roles: BTreeSet<String> = roles.into_iter().map(Into::into).collect();
        if roles.is_empty() {
            AllowedRoles::Everyone
        } else {
            AllowedRoles::Only(roles)
        }
    }

    /// Whether no role restriction applies.
    pub fn is_unrestricted(&self) -> bool {
        matches!(self, AllowedRoles::Everyone)
    }

    /// Check whether a viewer passes this restriction.
    ///
    /// Unreadable data grants access.
    pub fn permits(&self, viewer: &dyn Principal) -> bool {
        match self {
            AllowedRoles::Everyone => true,
            AllowedRoles::Unreadable(raw) => {
                tracing::debug!(allowed_roles = %raw, "unreadable role data, granting access");
                true
            }
            AllowedRoles::Only(roles) => {
                viewer.is_superuser() || viewer.roles().iter().any(|r| roles.contains(r))
            }
        }
    }

    fn from_array(values: &[JsonValue]) -> Option<Self> {
        let roles = values
            .iter()
            .map(|v| v.as_str().map(str::to_string))
            .collect::<Option<Vec<_>>>()?;
        Some(AllowedRoles::only(roles))
    }
}

impl From<Option<JsonValue>> for AllowedRoles {
    fn from(value: Option<JsonValue>) -> Self {
        let Some(value) = value else {
            return AllowedRoles::Everyone;
        };

        match &value {
            JsonValue::Null => AllowedRoles::Everyone,
            JsonValue::Array(values) => AllowedRoles::from_array(values)
                .unwrap_or_else(|| AllowedRoles::Unreadable(value.clone())),
            // Older rows hold the array as a JSON-encoded string.
            JsonValue::String(s) if s.is_empty() => AllowedRoles::Everyone,
            JsonValue::String(s) => match serde_json::from_str::<JsonValue>(s) {
                Ok(JsonValue::Array(values)) => AllowedRoles::from_array(&values)
                    .unwrap_or_else(|| AllowedRoles::Unreadable(value.clone())),
                Ok(JsonValue::Null) => AllowedRoles::Everyone,
                _ => AllowedRoles::Unreadable(value.clone()),
            },
            _ => AllowedRoles::Unreadable(value.clone()),
        }
    }
}

impl From<AllowedRoles> for Option<JsonValue> {
    fn from(roles: AllowedRoles) -> Self {
        match roles {
            AllowedRoles::Everyone => None,
            AllowedRoles::Only(roles) => Some(JsonValue::Array(
                roles.into_iter().map(JsonValue::String).collect(),
            )),
            AllowedRoles::Unreadable(raw) => Some(raw),
        }
    }
}

/// Permission names kept for a host's own authorization layer.
///
/// Never evaluated here. A stored value that is not a list of strings is
/// kept verbatim and written back unchanged on the next save.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequiredPermissions {
    Listed(Vec<String>),
    Unreadable(JsonValue),
}

impl RequiredPermissions {
    /// The permission names, when the stored value is readable.
    pub fn listed(&self) -> Option<&[String]> {
        match self {
            RequiredPermissions::Listed(names) => Some(names),
            RequiredPermissions::Unreadable(_) => None,
        }
    }
}

impl From<Vec<String>> for RequiredPermissions {
    fn from(names: Vec<String>) -> Self {
        RequiredPermissions::Listed(names)
    }
}

impl From<JsonValue> for RequiredPermissions {
    fn from(value: JsonValue) -> Self {
        match serde_json::from_value::<Vec<String>>(value.clone()) {
            Ok(names) => RequiredPermissions::Listed(names),
            Err(_) => RequiredPermissions::Unreadable(value),
        }
    }
}

impl From<RequiredPermissions> for JsonValue {
    fn from(permissions: RequiredPermissions) -> Self {
        match permissions {
            RequiredPermissions::Listed(names) => {
                JsonValue::Array(names.into_iter().map(JsonValue::String).collect())
            }
            RequiredPermissions::Unreadable(raw) => raw,
        }
    }
}

/// Menu item record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuItem {
    /// Unique identifier (UUIDv7).
    pub id: Uuid,

    /// Display title.
    pub title: String,

    /// Slug-shaped destination; empty when the type takes none.
    pub url: String,

    /// Optional icon identifier.
    pub icon: Option<String>,

    /// Sibling sort position (ascending).
    pub order: i32,

    #[serde(rename = "type")]
    pub menu_type: MenuType,

    pub target: MenuTarget,

    /// Whether the item is shown at all.
    pub is_active: bool,

    /// Presentational highlight (e.g. a promotion).
    pub is_featured: bool,

    /// Containing dropdown, if nested.
    pub parent_id: Option<Uuid>,

    #[serde(default)]
    pub allowed_roles: AllowedRoles,

    /// Stored for callers with their own authorization layer; never evaluated here.
    pub required_permissions: Option<RequiredPermissions>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a menu item.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateMenuItem {
    pub title: String,
    #[serde(default)]
    pub url: String,
    pub icon: Option<String>,
    pub order: Option<i32>,
    #[serde(rename = "type")]
    pub menu_type: MenuType,
    pub target: Option<MenuTarget>,
    pub is_active: Option<bool>,
    pub is_featured: Option<bool>,
    pub parent_id: Option<Uuid>,
    #[serde(default)]
    pub allowed_roles: AllowedRoles,
    pub required_permissions: Option<Vec<String>>,
}

impl CreateMenuItem {
    /// Minimal input; every other field takes its default.
    pub fn new(title: impl Into<String>, menu_type: MenuType) -> Self {
        Self {
            title: title.into(),
            url: String::new(),
            icon: None,
            order: None,
            menu_type,
            target: None,
            is_active: None,
            is_featured: None,
            parent_id: None,
            allowed_roles: AllowedRoles::Everyone,
            required_permissions: None,
        }
    }
}

/// Input for updating a menu item.
///
/// Absent fields are left unchanged. For the nullable fields an explicit
/// `null` clears the stored value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateMenuItem {
    pub title: Option<String>,
    pub url: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub icon: Option<Option<String>>,
    pub order: Option<i32>,
    #[serde(rename = "type")]
    pub menu_type: Option<MenuType>,
    pub target: Option<MenuTarget>,
    pub is_active: Option<bool>,
    pub is_featured: Option<bool>,
    #[serde(default, deserialize_with = "present")]
    pub parent_id: Option<Option<Uuid>>,
    #[serde(default, deserialize_with = "present")]
    pub allowed_roles: Option<AllowedRoles>,
    #[serde(default, deserialize_with = "present")]
    pub required_permissions: Option<Option<Vec<String>>>,
}

/// Marks a field as present even when its value is `null`.
fn present<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

fn non_empty(icon: Option<String>) -> Option<String> {
    icon.filter(|s| !s.is_empty())
}

impl MenuItem {
    /// Build an unsaved item from creation input.
    pub fn from_input(id: Uuid, input: CreateMenuItem, now: DateTime<Utc>) -> Self {
        Self {
            id,
            title: input.title,
            url: input.url,
            icon: non_empty(input.icon),
            order: input.order.unwrap_or(0),
            menu_type: input.menu_type,
            target: input.target.unwrap_or_default(),
            is_active: input.is_active.unwrap_or(true),
            is_featured: input.is_featured.unwrap_or(false),
            parent_id: input.parent_id,
            allowed_roles: input.allowed_roles,
            required_permissions: input.required_permissions.map(RequiredPermissions::from),
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a patch in place. Does not validate or touch timestamps.
    pub fn apply(&mut self, patch: UpdateMenuItem) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(url) = patch.url {
            self.url = url;
        }
        if let Some(icon) = patch.icon {
            self.icon = non_empty(icon);
        }
        if let Some(order) = patch.order {
            self.order = order;
        }
        if let Some(menu_type) = patch.menu_type {
            self.menu_type = menu_type;
        }
        if let Some(target) = patch.target {
            self.target = target;
        }
        if let Some(is_active) = patch.is_active {
            self.is_active = is_active;
        }
        if let Some(is_featured) = patch.is_featured {
            self.is_featured = is_featured;
        }
        if let Some(parent_id) = patch.parent_id {
            self.parent_id = parent_id;
        }
        if let Some(allowed_roles) = patch.allowed_roles {
            self.allowed_roles = allowed_roles;
        }
        if let Some(required_permissions) = patch.required_permissions {
            self.required_permissions = required_permissions.map(RequiredPermissions::from);
        }
    }

    pub fn is_dropdown(&self) -> bool {
        self.menu_type == MenuType::Dropdown
    }

    pub fn is_link(&self) -> bool {
        self.menu_type == MenuType::Link
    }

    pub fn is_separator(&self) -> bool {
        self.menu_type == MenuType::Separator
    }

    pub fn is_button(&self) -> bool {
        self.menu_type == MenuType::Button
    }

    /// Whether this is a top-level item.
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Check whether a viewer may see this item.
    ///
    /// True when the item has no role restriction, when the viewer is a
    /// superuser, or when the viewer holds one of the allowed roles.
    pub fn visible_to(&self, viewer: &dyn Principal) -> bool {
        self.allowed_roles.permits(viewer)
    }

    /// Display ordering: `order`, then `title` by byte value (uppercase before
    /// lowercase, like `COLLATE "C"`), then `id` as the final tie-break.
    pub fn display_cmp(&self, other: &Self) -> Ordering {
        self.order
            .cmp(&other.order)
            .then_with(|| self.title.cmp(&other.title))
            .then_with(|| self.id.cmp(&other.id))
    }
}

impl fmt::Display for MenuItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.title)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::models::Viewer;
    use serde_json::json;

    fn item(menu_type: MenuType) -> MenuItem {
        MenuItem::from_input(
            Uuid::now_v7(),
            CreateMenuItem::new("Home", menu_type),
            Utc::now(),
        )
    }

    #[test]
    fn type_predicates() {
        assert!(item(MenuType::Link).is_link());
        assert!(item(MenuType::Dropdown).is_dropdown());
        assert!(item(MenuType::Separator).is_separator());
        assert!(item(MenuType::Button).is_button());
        assert!(!item(MenuType::Button).is_link());
    }

    #[test]
    fn stored_string_values() {
        assert_eq!(serde_json::to_value(MenuType::Separator).unwrap(), json!("separator"));
        assert_eq!(serde_json::to_value(MenuTarget::NewTab).unwrap(), json!("_blank"));
        assert_eq!("dropdown".parse::<MenuType>().unwrap(), MenuType::Dropdown);
        assert_eq!("_self".parse::<MenuTarget>().unwrap(), MenuTarget::SameTab);
        assert!("menu".parse::<MenuType>().is_err());
        assert!("_top".parse::<MenuTarget>().is_err());
    }

    #[test]
    fn defaults_from_input() {
        let item = item(MenuType::Link);
        assert_eq!(item.order, 0);
        assert_eq!(item.target, MenuTarget::SameTab);
        assert!(item.is_active);
        assert!(!item.is_featured);
        assert!(item.is_root());
        assert_eq!(item.created_at, item.updated_at);
    }

    #[test]
    fn display_is_title() {
        assert_eq!(item(MenuType::Dropdown).to_string(), "Home");
    }

    #[test]
    fn required_permissions_keep_unreadable_values() {
        assert_eq!(
            RequiredPermissions::from(json!(["menus.view"])),
            RequiredPermissions::Listed(vec!["menus.view".to_string()])
        );

        let raw = json!({"perm": 1});
        let kept = RequiredPermissions::from(raw.clone());
        assert!(kept.listed().is_none());
        assert_eq!(JsonValue::from(kept.clone()), raw);
        assert_eq!(serde_json::to_value(&kept).unwrap(), raw);
    }

    #[test]
    fn patch_without_permissions_leaves_them_alone() {
        let mut item = item(MenuType::Link);
        item.required_permissions = Some(RequiredPermissions::from(json!({"perm": 1})));

        item.apply(UpdateMenuItem {
            order: Some(4),
            ..Default::default()
        });
        assert_eq!(
            item.required_permissions,
            Some(RequiredPermissions::Unreadable(json!({"perm": 1})))
        );

        item.apply(UpdateMenuItem {
            required_permissions: Some(None),
            ..Default::default()
        });
        assert!(item.required_permissions.is_none());
    }

    #[test]
    fn allowed_roles_parsing() {
        assert_eq!(AllowedRoles::from(None), AllowedRoles::Everyone);
        assert_eq!(AllowedRoles::from(Some(json!([]))), AllowedRoles::Everyone);
        assert_eq!(
            AllowedRoles::from(Some(json!(["admin", "user"]))),
            AllowedRoles::only(["admin", "user"])
        );
        assert_eq!(
            AllowedRoles::from(Some(json!("[\"editor\"]"))),
            AllowedRoles::only(["editor"])
        );
        assert!(matches!(
            AllowedRoles::from(Some(json!("not json"))),
            AllowedRoles::Unreadable(_)
        ));
        assert!(matches!(
            AllowedRoles::from(Some(json!([1, 2]))),
            AllowedRoles::Unreadable(_)
        ));
        assert!(matches!(
            AllowedRoles::from(Some(json!({"admin": true}))),
            AllowedRoles::Unreadable(_)
        ));
    }

    #[test]
    fn unreadable_roles_keep_raw_value() {
        let raw = json!({"admin": true});
        let roles = AllowedRoles::from(Some(raw.clone()));
        let stored: Option<JsonValue> = roles.into();
        assert_eq!(stored, Some(raw));
    }

    #[test]
    fn visible_without_roles() {
        let item = item(MenuType::Link);
        assert!(item.visible_to(&Viewer::anonymous()));
        assert!(item.visible_to(&Viewer::with_roles(["staff"])));
    }

    #[test]
    fn visible_to_superuser_regardless_of_roles() {
        let mut item = item(MenuType::Link);
        item.allowed_roles = AllowedRoles::only(["admin"]);
        assert!(item.visible_to(&Viewer::superuser()));
    }

    #[test]
    fn visible_only_with_matching_role() {
        let mut item = item(MenuType::Link);
        item.allowed_roles = AllowedRoles::only(["admin", "editor"]);
        assert!(item.visible_to(&Viewer::with_roles(["editor"])));
        assert!(!item.visible_to(&Viewer::with_roles(["user"])));
        assert!(!item.visible_to(&Viewer::anonymous()));
    }

    #[test]
    fn unreadable_roles_fail_open() {
        let mut item = item(MenuType::Link);
        item.allowed_roles = AllowedRoles::from(Some(json!("{broken")));
        assert!(item.visible_to(&Viewer::anonymous()));
    }

    #[test]
    fn patch_distinguishes_null_from_absent() {
        let parent = Uuid::now_v7();
        let mut item = item(MenuType::Link);
        item.parent_id = Some(parent);
        item.icon = Some("home".into());

        let untouched: UpdateMenuItem = serde_json::from_value(json!({"order": 3})).unwrap();
        item.apply(untouched);
        assert_eq!(item.order, 3);
        assert_eq!(item.parent_id, Some(parent));
        assert_eq!(item.icon.as_deref(), Some("home"));

        let cleared: UpdateMenuItem =
            serde_json::from_value(json!({"parent_id": null, "icon": null})).unwrap();
        item.apply(cleared);
        assert_eq!(item.parent_id, None);
        assert_eq!(item.icon, None);
    }

    #[test]
    fn create_input_from_json() {
        let input: CreateMenuItem = serde_json::from_value(json!({
            "title": "Docs",
            "type": "link",
            "url": "docs",
            "target": "_blank",
            "allowed_roles": ["staff"]
        }))
        .unwrap();
        assert_eq!(input.menu_type, MenuType::Link);
        assert_eq!(input.target, Some(MenuTarget::NewTab));
        assert_eq!(input.allowed_roles, AllowedRoles::only(["staff"]));
    }

    #[test]
    fn display_order_breaks_ties_by_title_then_id() {
        let mut a = item(MenuType::Link);
        let mut b = item(MenuType::Link);
        a.order = 1;
        b.order = 1;
        a.title = "Alpha".into();
        b.title = "Beta".into();
        assert_eq!(a.display_cmp(&b), Ordering::Less);

        b.title = "Alpha".into();
        assert_eq!(a.display_cmp(&b), a.id.cmp(&b.id));
    }
}
