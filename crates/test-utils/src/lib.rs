//! Wayfinder test utilities.
//!
//! Fixture builders for integration tests: JSON menu payloads in the shape
//! the admin API accepts, and identity headers for simulated viewers.

use serde_json::Value as JsonValue;
use uuid::Uuid;

/// Header carrying the viewer's comma-separated roles.
pub const ROLES_HEADER: &str = "x-user-roles";

/// Header marking the viewer as a superuser.
pub const SUPERUSER_HEADER: &str = "x-user-superuser";

/// Create a menu payload with default values.
pub fn test_menu(title: &str, menu_type: &str) -> TestMenu {
    TestMenu {
        title: title.to_string(),
        menu_type: menu_type.to_string(),
        url: String::new(),
        icon: None,
        order: 0,
        target: None,
        is_active: true,
        is_featured: false,
        parent_id: None,
        allowed_roles: None,
    }
}

/// Dropdown payload.
pub fn test_dropdown(title: &str) -> TestMenu {
    test_menu(title, "dropdown")
}

/// Link payload with a URL slug.
pub fn test_link(title: &str, url: &str) -> TestMenu {
    test_menu(title, "link").with_url(url)
}

/// A menu payload builder for creating test fixtures.
#[derive(Debug, Clone)]
pub struct TestMenu {
    pub title: String,
    pub menu_type: String,
    pub url: String,
    pub icon: Option<String>,
    pub order: i32,
    pub target: Option<String>,
    pub is_active: bool,
    pub is_featured: bool,
    pub parent_id: Option<Uuid>,
    pub allowed_roles: Option<JsonValue>,
}

impl TestMenu {
    pub fn with_url(mut self, url: &str) -> Self {
        self.url = url.to_string();
        self
    }

    pub fn with_icon(mut self, icon: &str) -> Self {
        self.icon = Some(icon.to_string());
        self
    }

    pub fn with_order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }

    /// Open in a new tab.
    pub fn new_tab(mut self) -> Self {
        self.target = Some("_blank".to_string());
        self
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }

    pub fn featured(mut self) -> Self {
        self.is_featured = true;
        self
    }

    pub fn under(mut self, parent_id: Uuid) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    /// Restrict to the given roles.
    pub fn for_roles(mut self, roles: &[&str]) -> Self {
        self.allowed_roles = Some(serde_json::json!(roles));
        self
    }

    /// Store an arbitrary raw `allowed_roles` value.
    pub fn with_raw_roles(mut self, raw: JsonValue) -> Self {
        self.allowed_roles = Some(raw);
        self
    }

    /// Render as the JSON body accepted by `POST /api/admin/menus`.
    pub fn to_json(&self) -> JsonValue {
        let mut body = serde_json::json!({
            "title": self.title,
            "type": self.menu_type,
            "url": self.url,
            "order": self.order,
            "is_active": self.is_active,
            "is_featured": self.is_featured,
        });

        if let Some(obj) = body.as_object_mut() {
            if let Some(icon) = &self.icon {
                obj.insert("icon".to_string(), JsonValue::String(icon.clone()));
            }
            if let Some(target) = &self.target {
                obj.insert("target".to_string(), JsonValue::String(target.clone()));
            }
            if let Some(parent_id) = self.parent_id {
                obj.insert("parent_id".to_string(), JsonValue::String(parent_id.to_string()));
            }
            if let Some(roles) = &self.allowed_roles {
                obj.insert("allowed_roles".to_string(), roles.clone());
            }
        }

        body
    }
}

/// Identity of a simulated request.
#[derive(Debug, Clone, Default)]
pub struct TestViewer {
    pub roles: Vec<String>,
    pub is_superuser: bool,
}

/// A viewer holding the given roles.
pub fn test_viewer(roles: &[&str]) -> TestViewer {
    TestViewer {
        roles: roles.iter().map(|s| s.to_string()).collect(),
        is_superuser: false,
    }
}

/// An anonymous viewer.
pub fn anonymous_viewer() -> TestViewer {
    TestViewer::default()
}

/// A superuser viewer.
pub fn superuser() -> TestViewer {
    TestViewer {
        roles: Vec::new(),
        is_superuser: true,
    }
}

impl TestViewer {
    /// Header name/value pairs to attach to a request.
    pub fn headers(&self) -> Vec<(&'static str, String)> {
        let mut headers = Vec::new();
        if !self.roles.is_empty() {
            headers.push((ROLES_HEADER, self.roles.join(",")));
        }
        if self.is_superuser {
            headers.push((SUPERUSER_HEADER, "true".to_string()));
        }
        headers
    }
}

/// Extract the `title` of every object in a JSON array.
pub fn titles(value: &JsonValue) -> Vec<String> {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|i| i["title"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}
