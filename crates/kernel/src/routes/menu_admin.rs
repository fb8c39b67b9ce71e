//! Menu administration endpoints.
//!
//! All endpoints require a superuser. Timestamps are read-only; they are not
//! part of any accepted payload. Malformed bodies and query strings are
//! answered with a 400 and the usual JSON error body.

use std::collections::HashMap;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::menu::{MenuError, MenuFilter};
use crate::models::{CreateMenuItem, MenuItem, MenuType, UpdateMenuItem, Viewer};
use crate::routes::helpers::require_superuser;
use crate::state::AppState;

/// Page size when the request sets none.
const DEFAULT_PAGE_SIZE: u64 = 100;

/// Largest page a single request may ask for.
const MAX_PAGE_SIZE: u64 = 500;

/// One row of the admin change list.
#[derive(Debug, Serialize)]
pub struct MenuListRow {
    pub id: Uuid,
    pub title: String,
    #[serde(rename = "type")]
    pub menu_type: MenuType,
    pub order: i32,
    pub parent_id: Option<Uuid>,
    pub parent_title: Option<String>,
    pub is_active: bool,
    pub is_featured: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct MenuListResponse {
    pub items: Vec<MenuListRow>,
    pub total: u64,
    pub limit: u64,
    pub offset: u64,
}

/// Fields editable straight from the change list.
#[derive(Debug, Deserialize)]
pub struct InlineEdit {
    pub order: Option<i32>,
    pub is_active: Option<bool>,
    pub is_featured: Option<bool>,
}

impl From<InlineEdit> for UpdateMenuItem {
    fn from(edit: InlineEdit) -> Self {
        UpdateMenuItem {
            order: edit.order,
            is_active: edit.is_active,
            is_featured: edit.is_featured,
            ..Default::default()
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub deleted: u64,
}

/// GET /api/admin/menus: filtered, searchable, paginated change list.
async fn list_menus(
    State(state): State<AppState>,
    viewer: Viewer,
    query: Result<Query<MenuFilter>, QueryRejection>,
) -> AppResult<Json<MenuListResponse>> {
    require_superuser(&viewer)?;
    let Query(mut filter) = query?;

    let limit = filter.limit.unwrap_or(DEFAULT_PAGE_SIZE);
    if limit == 0 || limit > MAX_PAGE_SIZE {
        return Err(AppError::BadRequest(format!(
            "limit must be between 1 and {MAX_PAGE_SIZE}"
        )));
    }
    let offset = filter.offset.unwrap_or(0);
    filter.limit = Some(limit);
    filter.offset = Some(offset);

    let store = state.menus();
    let items = store.list(&filter).await?;
    let total = store.count(&filter).await?;

    // One lookup per distinct parent on the page.
    let mut parent_titles: HashMap<Uuid, String> = HashMap::new();
    for parent_id in items.iter().filter_map(|i| i.parent_id) {
        if parent_titles.contains_key(&parent_id) {
            continue;
        }
        match store.get(parent_id).await {
            Ok(parent) => {
                parent_titles.insert(parent_id, parent.title);
            }
            // Deleted between the two reads; the row still renders.
            Err(MenuError::NotFound(_)) => {}
            Err(e) => return Err(e.into()),
        }
    }

    let items = items
        .into_iter()
        .map(|item| MenuListRow {
            parent_title: item.parent_id.and_then(|p| parent_titles.get(&p).cloned()),
            id: item.id,
            title: item.title,
            menu_type: item.menu_type,
            order: item.order,
            parent_id: item.parent_id,
            is_active: item.is_active,
            is_featured: item.is_featured,
            created_at: item.created_at,
        })
        .collect();

    Ok(Json(MenuListResponse {
        items,
        total,
        limit,
        offset,
    }))
}

/// POST /api/admin/menus: create a menu item.
async fn create_menu(
    State(state): State<AppState>,
    viewer: Viewer,
    payload: Result<Json<CreateMenuItem>, JsonRejection>,
) -> AppResult<(StatusCode, Json<MenuItem>)> {
    require_superuser(&viewer)?;
    let Json(input) = payload?;
    let item = state.menus().create(input).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// GET /api/admin/menus/{id}: full record.
async fn get_menu(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(id): Path<Uuid>,
) -> AppResult<Json<MenuItem>> {
    require_superuser(&viewer)?;
    Ok(Json(state.menus().get(id).await?))
}

/// PUT /api/admin/menus/{id}: update any editable field.
async fn update_menu(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(id): Path<Uuid>,
    payload: Result<Json<UpdateMenuItem>, JsonRejection>,
) -> AppResult<Json<MenuItem>> {
    require_superuser(&viewer)?;
    let Json(patch) = payload?;
    Ok(Json(state.menus().update(id, patch).await?))
}

/// PATCH /api/admin/menus/{id}: change-list inline edit of order and flags.
async fn inline_edit_menu(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(id): Path<Uuid>,
    payload: Result<Json<InlineEdit>, JsonRejection>,
) -> AppResult<Json<MenuItem>> {
    require_superuser(&viewer)?;
    let Json(edit) = payload?;
    Ok(Json(state.menus().update(id, edit.into()).await?))
}

/// DELETE /api/admin/menus/{id}: delete an item and its submenus.
async fn delete_menu(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(id): Path<Uuid>,
) -> AppResult<Json<DeleteResponse>> {
    require_superuser(&viewer)?;
    let deleted = state.menus().delete(id).await?;
    Ok(Json(DeleteResponse { deleted }))
}

/// Create the menu admin router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/admin/menus", get(list_menus).post(create_menu))
        .route(
            "/api/admin/menus/{id}",
            get(get_menu)
                .put(update_menu)
                .patch(inline_edit_menu)
                .delete(delete_menu),
        )
}
