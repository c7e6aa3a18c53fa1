//! Query helpers shared by the services

use athena_common::errors::{AppError, Result};
use athena_common::pagination::{Page, PageRequest};
use sea_orm::sea_query::{Expr, Func, SimpleExpr};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, PrimaryKeyTrait, Select,
};
use uuid::Uuid;

/// Run `select` as one page of `request`
pub async fn fetch_page<E>(
    conn: &DatabaseConnection,
    select: Select<E>,
    request: &PageRequest,
) -> Result<Page<E::Model>>
where
    E: EntityTrait,
    E::Model: Sync,
{
    let paginator = select.paginate(conn, request.size());
    let totals = paginator.num_items_and_pages().await?;
    let content = paginator.fetch_page(request.page()).await?;
    Ok(Page::new(content, request, totals.number_of_items))
}

/// Load a row by id or fail with `NotFound`
pub async fn find_required<E>(conn: &DatabaseConnection, id: Uuid, resource: &str) -> Result<E::Model>
where
    E: EntityTrait,
    <E::PrimaryKey as PrimaryKeyTrait>::ValueType: From<Uuid>,
{
    E::find_by_id(id)
        .one(conn)
        .await?
        .ok_or_else(|| AppError::not_found(resource, id))
}

/// Hard-delete a row by id, failing with `NotFound` when nothing was removed
pub async fn delete_required<E>(conn: &DatabaseConnection, id: Uuid, resource: &str) -> Result<()>
where
    E: EntityTrait,
    <E::PrimaryKey as PrimaryKeyTrait>::ValueType: From<Uuid>,
{
    let result = E::delete_by_id(id).exec(conn).await?;
    if result.rows_affected == 0 {
        return Err(AppError::not_found(resource, id));
    }
    Ok(())
}

/// Case-insensitive substring match on a text column
pub fn contains_ignore_case<C: ColumnTrait>(column: C, needle: &str) -> SimpleExpr {
    Expr::expr(Func::lower(Expr::col(column))).like(like_pattern(needle))
}

/// Case-insensitive equality on a text column
pub fn equals_ignore_case<C: ColumnTrait>(column: C, value: &str) -> SimpleExpr {
    Expr::expr(Func::lower(Expr::col(column))).eq(value.trim().to_lowercase())
}

fn like_pattern(needle: &str) -> String {
    let escaped = needle
        .trim()
        .to_lowercase()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("Defense"), "%defense%");
        assert_eq!(like_pattern(" 100%_done "), "%100\\%\\_done%");
    }
}
