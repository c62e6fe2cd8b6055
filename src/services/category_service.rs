use uuid::Uuid;

use crate::{
    audit,
    db::DbPool,
    dto::{
        categories::{CategoryList, CategoryWithCount, CreateCategoryRequest, UpdateCategoryRequest},
        products::{ProductList, ProductWithCategory},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::Category,
    response::{ApiResponse, Meta},
};

pub async fn list_categories(pool: &DbPool) -> AppResult<ApiResponse<CategoryList>> {
    let items = sqlx::query_as::<_, CategoryWithCount>(
        r#"
        SELECT c.*, count(p.id) AS total_products
        FROM categories c
        LEFT JOIN products p ON p.category_id = c.id
        GROUP BY c.id
        ORDER BY c.name
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(ApiResponse::success(
        "Categories",
        CategoryList { items },
        Some(Meta::empty()),
    ))
}

pub async fn category_products(
    pool: &DbPool,
    id: Uuid,
) -> AppResult<ApiResponse<ProductList>> {
    let exists: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM categories WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    if exists.is_none() {
        return Err(AppError::NotFound);
    }

    let items = sqlx::query_as::<_, ProductWithCategory>(
        r#"
        SELECT p.*, c.name AS category_name, c.icon AS category_icon
        FROM products p
        JOIN categories c ON c.id = p.category_id
        WHERE p.category_id = $1
        ORDER BY p.featured DESC, p.created_at DESC
        "#,
    )
    .bind(id)
    .fetch_all(pool)
    .await?;

    Ok(ApiResponse::success(
        "Category products",
        ProductList { items },
        Some(Meta::empty()),
    ))
}

pub async fn create_category(
    pool: &DbPool,
    user: &AuthUser,
    payload: CreateCategoryRequest,
) -> AppResult<ApiResponse<Category>> {
    ensure_admin(user)?;

    let category = sqlx::query_as::<_, Category>(
        r#"
        INSERT INTO categories (id, name, description, icon)
        VALUES ($1, $2, $3, $4)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(payload.name)
    .bind(payload.description)
    .bind(payload.icon)
    .fetch_one(pool)
    .await?;

    audit::record(
        pool,
        Some(user.user_id),
        "category_create",
        "categories",
        serde_json::json!({ "category_id": category.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Category created",
        category,
        Some(Meta::empty()),
    ))
}

pub async fn update_category(
    pool: &DbPool,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateCategoryRequest,
) -> AppResult<ApiResponse<Category>> {
    ensure_admin(user)?;

    let category = sqlx::query_as::<_, Category>(
        r#"
        UPDATE categories
        SET name = $2, description = $3, icon = $4
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(payload.name)
    .bind(payload.description)
    .bind(payload.icon)
    .fetch_optional(pool)
    .await?;
    let category = match category {
        Some(c) => c,
        None => return Err(AppError::NotFound),
    };

    audit::record(
        pool,
        Some(user.user_id),
        "category_update",
        "categories",
        serde_json::json!({ "category_id": category.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Updated",
        category,
        Some(Meta::empty()),
    ))
}

/// A category keeps its products; deletion is rejected while any product
/// still points at it.
pub async fn delete_category(
    pool: &DbPool,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;

    let referenced: (i64,) =
        sqlx::query_as("SELECT count(*) FROM products WHERE category_id = $1")
            .bind(id)
            .fetch_one(pool)
            .await?;
    if referenced.0 > 0 {
        return Err(AppError::BadRequest(
            "Category has products assigned".into(),
        ));
    }

    let result = sqlx::query("DELETE FROM categories WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }

    audit::record(
        pool,
        Some(user.user_id),
        "category_delete",
        "categories",
        serde_json::json!({ "category_id": id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}
