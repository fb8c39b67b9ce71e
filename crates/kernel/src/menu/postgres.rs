//! PostgreSQL implementation of MenuStore.
//!
//! Writes run in a transaction. The parent row is read `FOR SHARE` while its
//! type is checked, and an updated row is locked `FOR UPDATE` before its
//! children are counted, so a parent cannot stop being a Dropdown between
//! the check and the commit. Subtree deletion relies on the
//! `ON DELETE CASCADE` foreign key on `parent_menu_id`.

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::{debug, info};
use uuid::Uuid;

use super::error::{MenuError, MenuResult};
use super::filter::MenuFilter;
use super::query;
use super::validate::{TreeContext, validate};
use super::MenuStore;
use crate::models::{AllowedRoles, CreateMenuItem, MenuItem, RequiredPermissions, UpdateMenuItem};

const MENU_COLUMNS: &str = r#"id, title, url, icon, "order", menu_type, target, is_active, is_featured, parent_menu_id, allowed_roles, required_permissions, created_at, updated_at"#;

/// Row shape of the `menus` table.
#[derive(Debug, sqlx::FromRow)]
struct MenuRow {
    id: Uuid,
    title: String,
    url: String,
    icon: Option<String>,
    order: i32,
    menu_type: String,
    target: String,
    is_active: bool,
    is_featured: bool,
    parent_menu_id: Option<Uuid>,
    allowed_roles: Option<JsonValue>,
    required_permissions: Option<JsonValue>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<MenuRow> for MenuItem {
    type Error = MenuError;

    fn try_from(row: MenuRow) -> Result<Self, Self::Error> {
        let menu_type = row
            .menu_type
            .parse()
            .with_context(|| format!("menu item {} has an invalid type", row.id))?;
        let target = row
            .target
            .parse()
            .with_context(|| format!("menu item {} has an invalid target", row.id))?;

        let required_permissions = row.required_permissions.map(RequiredPermissions::from);
        if let Some(RequiredPermissions::Unreadable(raw)) = &required_permissions {
            debug!(id = %row.id, required_permissions = %raw, "keeping unreadable required_permissions");
        }

        Ok(MenuItem {
            id: row.id,
            title: row.title,
            url: row.url,
            icon: row.icon,
            order: row.order,
            menu_type,
            target,
            is_active: row.is_active,
            is_featured: row.is_featured,
            parent_id: row.parent_menu_id,
            allowed_roles: AllowedRoles::from(row.allowed_roles),
            required_permissions,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn into_items(rows: Vec<MenuRow>) -> MenuResult<Vec<MenuItem>> {
    rows.into_iter().map(MenuItem::try_from).collect()
}

/// Menu store backed by PostgreSQL.
#[derive(Clone)]
pub struct PgMenuStore {
    pool: PgPool,
}

impl PgMenuStore {
    /// Create a new PgMenuStore with a database connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Gather parent, ancestor and child facts for validation, locking the
    /// parent row for the rest of the transaction.
    async fn tree_context(
        tx: &mut Transaction<'_, Postgres>,
        item: &MenuItem,
        check_children: bool,
    ) -> MenuResult<TreeContext> {
        let mut ctx = TreeContext::default();

        if let Some(parent_id) = item.parent_id
            && parent_id != item.id
        {
            let row = sqlx::query_as::<_, MenuRow>(&format!(
                "SELECT {MENU_COLUMNS} FROM menus WHERE id = $1 FOR SHARE"
            ))
            .bind(parent_id)
            .fetch_optional(&mut **tx)
            .await?;

            ctx.parent = row.map(MenuItem::try_from).transpose()?;
        }

        if let Some(grandparent) = ctx.parent.as_ref().and_then(|p| p.parent_id) {
            // UNION (not UNION ALL) stops on rows already seen, so a corrupt
            // cycle cannot recurse forever.
            ctx.ancestors = sqlx::query_scalar(
                r#"
                WITH RECURSIVE chain AS (
                    SELECT id, parent_menu_id FROM menus WHERE id = $1
                    UNION
                    SELECT m.id, m.parent_menu_id
                    FROM menus m
                    JOIN chain c ON m.id = c.parent_menu_id
                )
                SELECT id FROM chain
                "#,
            )
            .bind(grandparent)
            .fetch_all(&mut **tx)
            .await?;
        }

        if check_children {
            ctx.has_children =
                sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM menus WHERE parent_menu_id = $1)")
                    .bind(item.id)
                    .fetch_one(&mut **tx)
                    .await?;
        }

        Ok(ctx)
    }
}

#[async_trait]
impl MenuStore for PgMenuStore {
    async fn create(&self, input: CreateMenuItem) -> MenuResult<MenuItem> {
        let item = MenuItem::from_input(Uuid::now_v7(), input, Utc::now());

        let mut tx = self.pool.begin().await?;
        let ctx = Self::tree_context(&mut tx, &item, false).await?;
        validate(&item, &ctx)?;

        let row = sqlx::query_as::<_, MenuRow>(&format!(
            r#"
            INSERT INTO menus ({MENU_COLUMNS})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING {MENU_COLUMNS}
            "#
        ))
        .bind(item.id)
        .bind(&item.title)
        .bind(&item.url)
        .bind(&item.icon)
        .bind(item.order)
        .bind(item.menu_type.as_str())
        .bind(item.target.as_str())
        .bind(item.is_active)
        .bind(item.is_featured)
        .bind(item.parent_id)
        .bind(Option::<JsonValue>::from(item.allowed_roles.clone()))
        .bind(item.required_permissions.clone().map(JsonValue::from))
        .bind(item.created_at)
        .bind(item.updated_at)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        let created = MenuItem::try_from(row)?;
        info!(id = %created.id, title = %created.title, menu_type = created.menu_type.as_str(), "menu item created");
        Ok(created)
    }

    async fn get(&self, id: Uuid) -> MenuResult<MenuItem> {
        let row = sqlx::query_as::<_, MenuRow>(&format!(
            "SELECT {MENU_COLUMNS} FROM menus WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.ok_or(MenuError::NotFound(id))?.try_into()
    }

    async fn update(&self, id: Uuid, patch: UpdateMenuItem) -> MenuResult<MenuItem> {
        let mut tx = self.pool.begin().await?;

        let existing = sqlx::query_as::<_, MenuRow>(&format!(
            "SELECT {MENU_COLUMNS} FROM menus WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let mut item = MenuItem::try_from(existing.ok_or(MenuError::NotFound(id))?)?;
        item.apply(patch);
        item.updated_at = Utc::now();

        let ctx = Self::tree_context(&mut tx, &item, true).await?;
        validate(&item, &ctx)?;

        let row = sqlx::query_as::<_, MenuRow>(&format!(
            r#"
            UPDATE menus
            SET title = $2, url = $3, icon = $4, "order" = $5, menu_type = $6, target = $7,
                is_active = $8, is_featured = $9, parent_menu_id = $10, allowed_roles = $11,
                required_permissions = $12, updated_at = $13
            WHERE id = $1
            RETURNING {MENU_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&item.title)
        .bind(&item.url)
        .bind(&item.icon)
        .bind(item.order)
        .bind(item.menu_type.as_str())
        .bind(item.target.as_str())
        .bind(item.is_active)
        .bind(item.is_featured)
        .bind(item.parent_id)
        .bind(Option::<JsonValue>::from(item.allowed_roles.clone()))
        .bind(item.required_permissions.clone().map(JsonValue::from))
        .bind(item.updated_at)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        let updated = MenuItem::try_from(row)?;
        info!(id = %id, title = %updated.title, "menu item updated");
        Ok(updated)
    }

    async fn delete(&self, id: Uuid) -> MenuResult<u64> {
        let mut tx = self.pool.begin().await?;

        let exists: Option<Uuid> =
            sqlx::query_scalar("SELECT id FROM menus WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        if exists.is_none() {
            return Err(MenuError::NotFound(id));
        }

        let removed: i64 = sqlx::query_scalar(
            r#"
            WITH RECURSIVE subtree AS (
                SELECT id FROM menus WHERE id = $1
                UNION
                SELECT m.id FROM menus m JOIN subtree s ON m.parent_menu_id = s.id
            )
            SELECT COUNT(*) FROM subtree
            "#,
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM menus WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(id = %id, removed, "menu item deleted");
        Ok(removed as u64)
    }

    async fn list(&self, filter: &MenuFilter) -> MenuResult<Vec<MenuItem>> {
        let rows = sqlx::query_as::<_, MenuRow>(&query::build_list(filter))
            .fetch_all(&self.pool)
            .await?;
        into_items(rows)
    }

    async fn count(&self, filter: &MenuFilter) -> MenuResult<u64> {
        let count: i64 = sqlx::query_scalar(&query::build_count(filter))
            .fetch_one(&self.pool)
            .await?;
        Ok(count as u64)
    }

    async fn find_by_title(&self, title: &str) -> MenuResult<Option<MenuItem>> {
        let title_order = query::TITLE_BYTE_ORDER;
        let row = sqlx::query_as::<_, MenuRow>(&format!(
            r#"
            SELECT {MENU_COLUMNS}
            FROM menus
            WHERE lower(title) = lower($1) AND is_active
            ORDER BY "order", {title_order}, id
            LIMIT 1
            "#
        ))
        .bind(title)
        .fetch_optional(&self.pool)
        .await?;

        row.map(MenuItem::try_from).transpose()
    }

    async fn healthy(&self) -> bool {
        crate::db::check_health(&self.pool).await
    }
}
