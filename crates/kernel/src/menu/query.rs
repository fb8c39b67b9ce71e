//! Listing SQL for the PostgreSQL store, built with SeaQuery.

use sea_query::{Asterisk, Cond, Expr, Iden, Order, PostgresQueryBuilder, Query, SelectStatement};

use super::filter::{MenuFilter, ParentFilter};

/// The `menus` table and its columns.
#[derive(Iden, Clone, Copy)]
pub enum Menus {
    Table,
    Id,
    Title,
    Url,
    Icon,
    Order,
    MenuType,
    Target,
    IsActive,
    IsFeatured,
    ParentMenuId,
    AllowedRoles,
    RequiredPermissions,
    CreatedAt,
    UpdatedAt,
}

const COLUMNS: [Menus; 14] = [
    Menus::Id,
    Menus::Title,
    Menus::Url,
    Menus::Icon,
    Menus::Order,
    Menus::MenuType,
    Menus::Target,
    Menus::IsActive,
    Menus::IsFeatured,
    Menus::ParentMenuId,
    Menus::AllowedRoles,
    Menus::RequiredPermissions,
    Menus::CreatedAt,
    Menus::UpdatedAt,
];

/// Title sort key independent of the database's default collation.
pub const TITLE_BYTE_ORDER: &str = r#""title" COLLATE "C""#;

/// Build the SELECT for a filtered, ordered, paginated listing.
pub fn build_list(filter: &MenuFilter) -> String {
    let mut query = Query::select();
    query.columns(COLUMNS).from(Menus::Table);

    add_conditions(&mut query, filter);

    // Byte-order titles, matching `MenuItem::display_cmp` whatever the
    // database collation.
    query
        .order_by(Menus::Order, Order::Asc)
        .order_by_expr(Expr::cust(TITLE_BYTE_ORDER), Order::Asc)
        .order_by(Menus::Id, Order::Asc);

    if let Some(limit) = filter.limit {
        query.limit(limit);
    }
    if let Some(offset) = filter.offset {
        query.offset(offset);
    }

    query.to_string(PostgresQueryBuilder)
}

/// Build a COUNT over the same criteria, ignoring pagination.
pub fn build_count(filter: &MenuFilter) -> String {
    let mut query = Query::select();
    query.expr(Expr::col(Asterisk).count()).from(Menus::Table);

    add_conditions(&mut query, filter);

    query.to_string(PostgresQueryBuilder)
}

fn add_conditions(query: &mut SelectStatement, filter: &MenuFilter) {
    if let Some(menu_type) = filter.menu_type {
        query.and_where(Expr::col(Menus::MenuType).eq(menu_type.as_str()));
    }
    if let Some(is_active) = filter.is_active {
        query.and_where(Expr::col(Menus::IsActive).eq(is_active));
    }
    if let Some(is_featured) = filter.is_featured {
        query.and_where(Expr::col(Menus::IsFeatured).eq(is_featured));
    }

    match filter.parent {
        Some(ParentFilter::Root) => {
            query.and_where(Expr::col(Menus::ParentMenuId).is_null());
        }
        Some(ParentFilter::Child(id)) => {
            query.and_where(Expr::col(Menus::ParentMenuId).eq(id));
        }
        None => {}
    }

    if let Some(after) = filter.created_after {
        query.and_where(Expr::cust_with_values(
            r#""created_at" >= $1::timestamptz"#,
            [after.to_rfc3339()],
        ));
    }
    if let Some(before) = filter.created_before {
        query.and_where(Expr::cust_with_values(
            r#""created_at" <= $1::timestamptz"#,
            [before.to_rfc3339()],
        ));
    }

    if let Some(title) = &filter.title {
        query.and_where(Expr::cust_with_values(
            r#"lower("title") = lower($1)"#,
            [title.clone()],
        ));
    }

    if let Some(needle) = filter.search_term() {
        let pattern = format!("%{}%", escape_like_wildcards(&needle));
        let mut any = Cond::any();
        for column in ["title", "url", "icon"] {
            any = any.add(Expr::cust_with_values(
                format!(r#"lower("{column}") LIKE $1"#),
                [pattern.clone()],
            ));
        }
        query.cond_where(any);
    }
}

/// Escape SQL LIKE wildcard characters (`%`, `_`, `\`) in a value.
fn escape_like_wildcards(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}
