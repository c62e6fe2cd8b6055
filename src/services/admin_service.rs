use std::collections::HashMap;

use uuid::Uuid;

use crate::{
    db::DbPool,
    dto::{
        admin::{DashboardStats, ProductSummary},
        sales::{PeriodSalesStats, SaleLineDetail, SaleList, SaleWithLines, SalesStats, TopProduct},
    },
    error::AppResult,
    middleware::auth::{AuthUser, ensure_admin},
    models::Sale,
    response::{ApiResponse, Meta},
    routes::params::SaleListQuery,
};

pub async fn dashboard_stats(
    pool: &DbPool,
    user: &AuthUser,
) -> AppResult<ApiResponse<DashboardStats>> {
    ensure_admin(user)?;

    let products: (i64, i64, i64, i64) = sqlx::query_as(
        r#"
        SELECT count(*),
               count(*) FILTER (WHERE stock > 0 AND stock < 5),
               count(*) FILTER (WHERE stock = 0),
               count(*) FILTER (WHERE featured)
        FROM products
        "#,
    )
    .fetch_one(pool)
    .await?;

    let categories: (i64,) = sqlx::query_as("SELECT count(*) FROM categories")
        .fetch_one(pool)
        .await?;

    let sales: (i64, i64) = sqlx::query_as(
        "SELECT count(*), COALESCE(SUM(total), 0)::BIGINT FROM sales",
    )
    .fetch_one(pool)
    .await?;

    let latest_products = sqlx::query_as::<_, ProductSummary>(
        "SELECT id, name, price, stock, created_at FROM products ORDER BY created_at DESC LIMIT 5",
    )
    .fetch_all(pool)
    .await?;

    let stats = DashboardStats {
        total_products: products.0,
        low_stock: products.1,
        out_of_stock: products.2,
        featured: products.3,
        total_categories: categories.0,
        total_sales: sales.0,
        total_revenue: sales.1,
        latest_products,
    };

    Ok(ApiResponse::success("Stats", stats, Some(Meta::empty())))
}

pub async fn list_sales(
    pool: &DbPool,
    user: &AuthUser,
    query: SaleListQuery,
) -> AppResult<ApiResponse<SaleList>> {
    ensure_admin(user)?;
    let (page, limit, offset) = query.pagination.normalize();

    #[derive(sqlx::FromRow)]
    struct SaleRow {
        #[sqlx(flatten)]
        sale: Sale,
        customer_name: Option<String>,
        customer_email: Option<String>,
    }

    let rows = sqlx::query_as::<_, SaleRow>(
        r#"
        SELECT s.*, cu.name AS customer_name, cu.email AS customer_email
        FROM sales s
        LEFT JOIN customers cu ON cu.id = s.customer_id
        WHERE ($1::TEXT IS NULL OR s.status = $1)
        ORDER BY s.created_at DESC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(&query.status)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    let total: (i64,) = sqlx::query_as(
        "SELECT count(*) FROM sales WHERE ($1::TEXT IS NULL OR status = $1)",
    )
    .bind(&query.status)
    .fetch_one(pool)
    .await?;

    let sale_ids: Vec<Uuid> = rows.iter().map(|r| r.sale.id).collect();
    let lines = sqlx::query_as::<_, SaleLineDetail>(
        r#"
        SELECT si.id, si.sale_id, si.product_id, p.name AS product_name,
               si.quantity, si.unit_price, si.subtotal
        FROM sale_items si
        JOIN products p ON p.id = si.product_id
        WHERE si.sale_id = ANY($1)
        ORDER BY si.created_at
        "#,
    )
    .bind(&sale_ids)
    .fetch_all(pool)
    .await?;

    let mut by_sale: HashMap<Uuid, Vec<SaleLineDetail>> = HashMap::new();
    for line in lines {
        by_sale.entry(line.sale_id).or_default().push(line);
    }

    let items = rows
        .into_iter()
        .map(|row| SaleWithLines {
            items: by_sale.remove(&row.sale.id).unwrap_or_default(),
            sale: row.sale,
            customer_name: row.customer_name,
            customer_email: row.customer_email,
        })
        .collect();

    let meta = Meta::new(page, limit, total.0);
    Ok(ApiResponse::success("Sales", SaleList { items }, Some(meta)))
}

pub async fn sales_stats(pool: &DbPool, user: &AuthUser) -> AppResult<ApiResponse<SalesStats>> {
    ensure_admin(user)?;

    let today = sqlx::query_as::<_, PeriodSalesStats>(
        r#"
        SELECT count(*) AS sales, COALESCE(SUM(total), 0)::BIGINT AS revenue
        FROM sales WHERE created_at >= date_trunc('day', NOW())
        "#,
    )
    .fetch_one(pool)
    .await?;

    let week = sqlx::query_as::<_, PeriodSalesStats>(
        r#"
        SELECT count(*) AS sales, COALESCE(SUM(total), 0)::BIGINT AS revenue
        FROM sales WHERE created_at >= date_trunc('week', NOW())
        "#,
    )
    .fetch_one(pool)
    .await?;

    let month = sqlx::query_as::<_, PeriodSalesStats>(
        r#"
        SELECT count(*) AS sales, COALESCE(SUM(total), 0)::BIGINT AS revenue
        FROM sales WHERE created_at >= date_trunc('month', NOW())
        "#,
    )
    .fetch_one(pool)
    .await?;

    let top_products = sqlx::query_as::<_, TopProduct>(
        r#"
        SELECT p.id, p.name, SUM(si.quantity)::BIGINT AS total_sold
        FROM sale_items si
        JOIN products p ON p.id = si.product_id
        GROUP BY p.id, p.name
        ORDER BY total_sold DESC
        LIMIT 5
        "#,
    )
    .fetch_all(pool)
    .await?;

    let stats = SalesStats {
        today,
        week,
        month,
        top_products,
    };

    Ok(ApiResponse::success(
        "Sales stats",
        stats,
        Some(Meta::empty()),
    ))
}
