//! Public navigation endpoints.
//!
//! Everything here is read-only and filtered for the requesting viewer.

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::menu::MenuNode;
use crate::models::{MenuItem, Viewer};
use crate::state::AppState;

/// GET /api/menus: main menus visible to the viewer.
async fn main_menus(
    State(state): State<AppState>,
    viewer: Viewer,
) -> AppResult<Json<Vec<MenuItem>>> {
    let menus = state.menus().menus_for_user(&viewer).await?;
    Ok(Json(menus))
}

/// GET /api/menus/tree: the nested navigation tree visible to the viewer.
async fn menu_tree(
    State(state): State<AppState>,
    viewer: Viewer,
) -> AppResult<Json<Vec<MenuNode>>> {
    let tree = state.menus().menu_tree(&viewer).await?;
    Ok(Json(tree))
}

/// GET /api/menus/{id}/submenus: active children of one item.
async fn submenus(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Vec<MenuItem>>> {
    let parent = state.menus().get(id).await?;
    if !parent.is_active || !parent.visible_to(&viewer) {
        return Err(AppError::NotFound);
    }

    let children = state
        .menus()
        .list_active_submenus(id)
        .await?
        .into_iter()
        .filter(|child| child.visible_to(&viewer))
        .collect();
    Ok(Json(children))
}

/// GET /api/menus/by-title/{title}: first visible active item with this title, ignoring case.
async fn by_title(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(title): Path<String>,
) -> AppResult<Json<MenuItem>> {
    state
        .menus()
        .find_visible_by_title(&title, &viewer)
        .await?
        .map(Json)
        .ok_or(AppError::NotFound)
}

/// Create the navigation router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/menus", get(main_menus))
        .route("/api/menus/tree", get(menu_tree))
        .route("/api/menus/by-title/{title}", get(by_title))
        .route("/api/menus/{id}/submenus", get(submenus))
}
