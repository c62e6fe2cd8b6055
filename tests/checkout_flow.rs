use storefront_api::{
    db::{DbPool, create_pool},
    dto::sales::{CheckoutItem, CheckoutRequest},
    error::AppError,
    services::sale_service,
};
use uuid::Uuid;

// Integration tests for the checkout transaction: atomicity, exact stock
// decrements and the no-oversell guarantee under concurrency. Each test
// seeds its own rows so they can run in parallel against a shared database.

async fn setup_pool() -> anyhow::Result<Option<DbPool>> {
    let database_url =
        match std::env::var("TEST_DATABASE_URL").or_else(|_| std::env::var("DATABASE_URL")) {
            Ok(url) => url,
            Err(_) => {
                eprintln!(
                    "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration tests."
                );
                return Ok(None);
            }
        };

    let pool = create_pool(&database_url).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    Ok(Some(pool))
}

async fn create_product(pool: &DbPool, price: i64, stock: i32) -> anyhow::Result<Uuid> {
    let id = Uuid::new_v4();
    sqlx::query("INSERT INTO products (id, name, price, stock) VALUES ($1, $2, $3, $4)")
        .bind(id)
        .bind(format!("test-product-{id}"))
        .bind(price)
        .bind(stock)
        .execute(pool)
        .await?;
    Ok(id)
}

async fn create_customer(pool: &DbPool) -> anyhow::Result<Uuid> {
    let id = Uuid::new_v4();
    sqlx::query("INSERT INTO customers (id, name) VALUES ($1, $2)")
        .bind(id)
        .bind(format!("test-customer-{id}"))
        .execute(pool)
        .await?;
    Ok(id)
}

async fn stock_of(pool: &DbPool, product_id: Uuid) -> anyhow::Result<i32> {
    let row: (i32,) = sqlx::query_as("SELECT stock FROM products WHERE id = $1")
        .bind(product_id)
        .fetch_one(pool)
        .await?;
    Ok(row.0)
}

async fn sales_for_customer(pool: &DbPool, customer_id: Uuid) -> anyhow::Result<i64> {
    let row: (i64,) = sqlx::query_as("SELECT count(*) FROM sales WHERE customer_id = $1")
        .bind(customer_id)
        .fetch_one(pool)
        .await?;
    Ok(row.0)
}

async fn lines_for_product(pool: &DbPool, product_id: Uuid) -> anyhow::Result<i64> {
    let row: (i64,) = sqlx::query_as("SELECT count(*) FROM sale_items WHERE product_id = $1")
        .bind(product_id)
        .fetch_one(pool)
        .await?;
    Ok(row.0)
}

fn cart_line(product_id: Uuid, quantity: i32, unit_price: i64) -> CheckoutItem {
    CheckoutItem {
        product_id,
        quantity,
        unit_price,
        name: "test item".into(),
    }
}

#[tokio::test]
async fn checkout_decrements_stock_and_records_lines() -> anyhow::Result<()> {
    let Some(pool) = setup_pool().await? else {
        return Ok(());
    };

    let product_id = create_product(&pool, 100, 5).await?;
    let customer_id = create_customer(&pool).await?;

    let resp = sale_service::create_sale(
        &pool,
        CheckoutRequest {
            items: vec![cart_line(product_id, 2, 100)],
            total: 200,
            payment_method: None,
            customer_id: Some(customer_id),
        },
    )
    .await?;
    let sale_id = resp.data.unwrap().sale_id;

    assert_eq!(stock_of(&pool, product_id).await?, 3);
    assert_eq!(sales_for_customer(&pool, customer_id).await?, 1);

    let sale: (i64, String, String) =
        sqlx::query_as("SELECT total, payment_method, status FROM sales WHERE id = $1")
            .bind(sale_id)
            .fetch_one(&pool)
            .await?;
    assert_eq!(sale.0, 200);
    assert_eq!(sale.1, "cash");
    assert_eq!(sale.2, "completed");

    let lines: Vec<(i32, i64, i64)> =
        sqlx::query_as("SELECT quantity, unit_price, subtotal FROM sale_items WHERE sale_id = $1")
            .bind(sale_id)
            .fetch_all(&pool)
            .await?;
    assert_eq!(lines, vec![(2, 100, 200)]);

    Ok(())
}

#[tokio::test]
async fn failed_line_rolls_back_the_whole_cart() -> anyhow::Result<()> {
    let Some(pool) = setup_pool().await? else {
        return Ok(());
    };

    // First line would succeed on its own; the second exceeds stock.
    let plenty = create_product(&pool, 100, 10).await?;
    let scarce = create_product(&pool, 100, 3).await?;
    let customer_id = create_customer(&pool).await?;

    let result = sale_service::create_sale(
        &pool,
        CheckoutRequest {
            items: vec![cart_line(plenty, 1, 100), cart_line(scarce, 10, 100)],
            total: 1100,
            payment_method: None,
            customer_id: Some(customer_id),
        },
    )
    .await;
    assert!(matches!(result, Err(AppError::InsufficientStock { .. })));

    assert_eq!(stock_of(&pool, plenty).await?, 10);
    assert_eq!(stock_of(&pool, scarce).await?, 3);
    assert_eq!(sales_for_customer(&pool, customer_id).await?, 0);
    assert_eq!(lines_for_product(&pool, plenty).await?, 0);
    assert_eq!(lines_for_product(&pool, scarce).await?, 0);

    Ok(())
}

#[tokio::test]
async fn unknown_product_fails_the_checkout() -> anyhow::Result<()> {
    let Some(pool) = setup_pool().await? else {
        return Ok(());
    };

    let customer_id = create_customer(&pool).await?;
    let missing = Uuid::new_v4();

    let result = sale_service::create_sale(
        &pool,
        CheckoutRequest {
            items: vec![cart_line(missing, 1, 100)],
            total: 100,
            payment_method: None,
            customer_id: Some(customer_id),
        },
    )
    .await;

    assert!(matches!(result, Err(AppError::ProductNotFound(id)) if id == missing));
    assert_eq!(sales_for_customer(&pool, customer_id).await?, 0);

    Ok(())
}

#[tokio::test]
async fn mismatched_total_is_rejected_before_any_write() -> anyhow::Result<()> {
    let Some(pool) = setup_pool().await? else {
        return Ok(());
    };

    let product_id = create_product(&pool, 100, 5).await?;
    let customer_id = create_customer(&pool).await?;

    let result = sale_service::create_sale(
        &pool,
        CheckoutRequest {
            items: vec![cart_line(product_id, 2, 100)],
            total: 150,
            payment_method: None,
            customer_id: Some(customer_id),
        },
    )
    .await;

    assert!(matches!(result, Err(AppError::BadRequest(_))));
    assert_eq!(stock_of(&pool, product_id).await?, 5);
    assert_eq!(sales_for_customer(&pool, customer_id).await?, 0);

    Ok(())
}

#[tokio::test]
async fn concurrent_checkouts_never_oversell_the_last_unit() -> anyhow::Result<()> {
    let Some(pool) = setup_pool().await? else {
        return Ok(());
    };

    let product_id = create_product(&pool, 100, 1).await?;

    let request = |pool: DbPool| async move {
        sale_service::create_sale(
            &pool,
            CheckoutRequest {
                items: vec![cart_line(product_id, 1, 100)],
                total: 100,
                payment_method: None,
                customer_id: None,
            },
        )
        .await
    };

    let first = tokio::spawn(request(pool.clone()));
    let second = tokio::spawn(request(pool.clone()));
    let (first, second) = (first.await?, second.await?);

    let successes = [&first, &second].iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1, "exactly one of two racing checkouts must win");

    for result in [first, second] {
        if let Err(err) = result {
            assert!(matches!(err, AppError::InsufficientStock { .. }));
        }
    }

    assert_eq!(stock_of(&pool, product_id).await?, 0);
    assert_eq!(lines_for_product(&pool, product_id).await?, 1);

    Ok(())
}
