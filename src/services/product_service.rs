use uuid::Uuid;

use crate::{
    audit,
    db::DbPool,
    dto::products::{
        CreateProductRequest, DeleteProductOutcome, ProductList, ProductWithCategory,
        UpdateProductRequest,
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::Product,
    response::{ApiResponse, Meta},
    routes::params::ProductQuery,
};

const PRODUCT_WITH_CATEGORY: &str = r#"
    SELECT p.*, c.name AS category_name, c.icon AS category_icon
    FROM products p
    LEFT JOIN categories c ON c.id = p.category_id
"#;

pub async fn list_products(
    pool: &DbPool,
    query: ProductQuery,
) -> AppResult<ApiResponse<ProductList>> {
    let (page, limit, offset) = query.pagination.normalize();

    let sql = format!(
        r#"
        {PRODUCT_WITH_CATEGORY}
        WHERE ($1::TEXT IS NULL OR LOWER(c.name) = LOWER($1))
          AND ($2::BOOLEAN IS NULL OR p.featured = $2)
        ORDER BY p.featured DESC, p.created_at DESC
        LIMIT $3 OFFSET $4
        "#
    );
    let items = sqlx::query_as::<_, ProductWithCategory>(&sql)
        .bind(&query.category)
        .bind(query.featured)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

    let total: (i64,) = sqlx::query_as(
        r#"
        SELECT count(*)
        FROM products p
        LEFT JOIN categories c ON c.id = p.category_id
        WHERE ($1::TEXT IS NULL OR LOWER(c.name) = LOWER($1))
          AND ($2::BOOLEAN IS NULL OR p.featured = $2)
        "#,
    )
    .bind(&query.category)
    .bind(query.featured)
    .fetch_one(pool)
    .await?;

    let meta = Meta::new(page, limit, total.0);
    Ok(ApiResponse::success(
        "Products",
        ProductList { items },
        Some(meta),
    ))
}

pub async fn list_featured(pool: &DbPool) -> AppResult<ApiResponse<ProductList>> {
    let sql = format!("{PRODUCT_WITH_CATEGORY} WHERE p.featured ORDER BY p.created_at DESC");
    let items = sqlx::query_as::<_, ProductWithCategory>(&sql)
        .fetch_all(pool)
        .await?;

    Ok(ApiResponse::success(
        "Featured products",
        ProductList { items },
        Some(Meta::empty()),
    ))
}

pub async fn get_product(pool: &DbPool, id: Uuid) -> AppResult<ApiResponse<ProductWithCategory>> {
    let sql = format!("{PRODUCT_WITH_CATEGORY} WHERE p.id = $1");
    let result = sqlx::query_as::<_, ProductWithCategory>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    let result = match result {
        Some(p) => p,
        None => return Err(AppError::NotFound),
    };
    Ok(ApiResponse::success("Product", result, None))
}

/// Substring search across product name, description, brand and category
/// name. Exact-prefix name matches rank first, then suffix matches, then the
/// rest; featured products break ties. Capped at 20 rows.
pub async fn search_products(pool: &DbPool, q: &str) -> AppResult<ApiResponse<ProductList>> {
    let needle = q.trim();
    if needle.is_empty() {
        return Ok(ApiResponse::success(
            "Search results",
            ProductList { items: Vec::new() },
            Some(Meta::empty()),
        ));
    }

    let sql = format!(
        r#"
        {PRODUCT_WITH_CATEGORY}
        WHERE p.name ILIKE $1
           OR p.description ILIKE $1
           OR p.brand ILIKE $1
           OR c.name ILIKE $1
        ORDER BY
            CASE
                WHEN p.name ILIKE $2 THEN 1
                WHEN p.name ILIKE $3 THEN 2
                ELSE 3
            END,
            p.featured DESC
        LIMIT 20
        "#
    );
    let items = sqlx::query_as::<_, ProductWithCategory>(&sql)
        .bind(format!("%{needle}%"))
        .bind(format!("{needle}%"))
        .bind(format!("%{needle}"))
        .fetch_all(pool)
        .await?;

    Ok(ApiResponse::success(
        "Search results",
        ProductList { items },
        Some(Meta::empty()),
    ))
}

pub async fn create_product(
    pool: &DbPool,
    user: &AuthUser,
    payload: CreateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;
    validate_pricing(payload.price, payload.stock, payload.discount)?;

    let id = Uuid::new_v4();
    let product = sqlx::query_as::<_, Product>(
        r#"
        INSERT INTO products
            (id, name, description, price, previous_price, stock,
             category_id, image_url, brand, featured, discount)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(payload.name)
    .bind(payload.description)
    .bind(payload.price)
    .bind(payload.previous_price)
    .bind(payload.stock)
    .bind(payload.category_id)
    .bind(payload.image_url)
    .bind(payload.brand)
    .bind(payload.featured)
    .bind(payload.discount)
    .fetch_one(pool)
    .await?;

    audit::record(
        pool,
        Some(user.user_id),
        "product_create",
        "products",
        serde_json::json!({ "product_id": product.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Product created",
        product,
        Some(Meta::empty()),
    ))
}

pub async fn update_product(
    pool: &DbPool,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;

    let existing = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    let existing = match existing {
        Some(p) => p,
        None => return Err(AppError::NotFound),
    };

    let name = payload.name.unwrap_or(existing.name);
    let description = payload.description.or(existing.description);
    let price = payload.price.unwrap_or(existing.price);
    let previous_price = payload.previous_price.or(existing.previous_price);
    let stock = payload.stock.unwrap_or(existing.stock);
    let category_id = payload.category_id.or(existing.category_id);
    let image_url = payload.image_url.or(existing.image_url);
    let brand = payload.brand.or(existing.brand);
    let featured = payload.featured.unwrap_or(existing.featured);
    let discount = payload.discount.unwrap_or(existing.discount);

    validate_pricing(price, stock, discount)?;

    let product = sqlx::query_as::<_, Product>(
        r#"
        UPDATE products
        SET name = $2, description = $3, price = $4, previous_price = $5,
            stock = $6, category_id = $7, image_url = $8, brand = $9,
            featured = $10, discount = $11, updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(name)
    .bind(description)
    .bind(price)
    .bind(previous_price)
    .bind(stock)
    .bind(category_id)
    .bind(image_url)
    .bind(brand)
    .bind(featured)
    .bind(discount)
    .fetch_one(pool)
    .await?;

    audit::record(
        pool,
        Some(user.user_id),
        "product_update",
        "products",
        serde_json::json!({ "product_id": product.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Updated",
        product,
        Some(Meta::empty()),
    ))
}

/// Products already referenced by sale lines are archived (stock zeroed,
/// featured cleared) to keep sale history intact; others are removed.
pub async fn delete_product(
    pool: &DbPool,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<DeleteProductOutcome>> {
    ensure_admin(user)?;

    let referenced: (i64,) =
        sqlx::query_as("SELECT count(*) FROM sale_items WHERE product_id = $1")
            .bind(id)
            .fetch_one(pool)
            .await?;

    let (message, archived) = if referenced.0 > 0 {
        let result = sqlx::query(
            "UPDATE products SET stock = 0, featured = FALSE, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .execute(pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound);
        }
        ("Product archived", true)
    } else {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound);
        }
        ("Deleted", false)
    };

    audit::record(
        pool,
        Some(user.user_id),
        "product_delete",
        "products",
        serde_json::json!({ "product_id": id, "archived": archived }),
    )
    .await;

    Ok(ApiResponse::success(
        message,
        DeleteProductOutcome { archived },
        Some(Meta::empty()),
    ))
}

fn validate_pricing(price: i64, stock: i32, discount: i32) -> Result<(), AppError> {
    if price < 0 {
        return Err(AppError::BadRequest("price must not be negative".into()));
    }
    if stock < 0 {
        return Err(AppError::BadRequest("stock must not be negative".into()));
    }
    if !(0..=100).contains(&discount) {
        return Err(AppError::BadRequest("discount must be 0-100".into()));
    }
    Ok(())
}
