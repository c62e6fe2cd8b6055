use storefront_api::{
    db::{DbPool, create_pool},
    dto::{
        categories::CreateCategoryRequest,
        products::{CreateProductRequest, UpdateProductRequest},
        sales::{CheckoutItem, CheckoutRequest},
    },
    error::AppError,
    middleware::auth::AuthUser,
    routes::params::{Pagination, SaleListQuery},
    services::{admin_service, category_service, product_service, sale_service},
};
use uuid::Uuid;

// Admin flows against a real database: catalog CRUD guards, the
// archive-instead-of-delete rule for sold products, and the sales listing.

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

fn admin() -> AuthUser {
    AuthUser {
        user_id: Uuid::new_v4(),
        role: "admin".into(),
    }
}

fn staff() -> AuthUser {
    AuthUser {
        user_id: Uuid::new_v4(),
        role: "staff".into(),
    }
}

fn product_request(name: String) -> CreateProductRequest {
    CreateProductRequest {
        name,
        description: Some("integration test product".into()),
        price: 500,
        previous_price: None,
        stock: 4,
        category_id: None,
        image_url: None,
        brand: Some("Acme".into()),
        featured: false,
        discount: 0,
    }
}

#[tokio::test]
async fn sold_products_are_archived_instead_of_deleted() -> anyhow::Result<()> {
    let Some(pool) = setup_pool().await? else {
        return Ok(());
    };
    let admin = admin();

    let created = product_service::create_product(
        &pool,
        &admin,
        product_request(format!("archive-test-{}", Uuid::new_v4())),
    )
    .await?;
    let product = created.data.unwrap();

    sale_service::create_sale(
        &pool,
        CheckoutRequest {
            items: vec![CheckoutItem {
                product_id: product.id,
                quantity: 1,
                unit_price: 500,
                name: product.name.clone(),
            }],
            total: 500,
            payment_method: Some("card".into()),
            customer_id: None,
        },
    )
    .await?;

    let outcome = product_service::delete_product(&pool, &admin, product.id).await?;
    assert!(outcome.data.unwrap().archived);

    // Still present, but no longer sellable or promoted.
    let row: (i32, bool) = sqlx::query_as("SELECT stock, featured FROM products WHERE id = $1")
        .bind(product.id)
        .fetch_one(&pool)
        .await?;
    assert_eq!(row, (0, false));

    Ok(())
}

#[tokio::test]
async fn unsold_products_are_hard_deleted() -> anyhow::Result<()> {
    let Some(pool) = setup_pool().await? else {
        return Ok(());
    };
    let admin = admin();

    let created = product_service::create_product(
        &pool,
        &admin,
        product_request(format!("delete-test-{}", Uuid::new_v4())),
    )
    .await?;
    let product = created.data.unwrap();

    let outcome = product_service::delete_product(&pool, &admin, product.id).await?;
    assert!(!outcome.data.unwrap().archived);

    let gone: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM products WHERE id = $1")
        .bind(product.id)
        .fetch_optional(&pool)
        .await?;
    assert!(gone.is_none());

    Ok(())
}

#[tokio::test]
async fn category_with_products_cannot_be_deleted() -> anyhow::Result<()> {
    let Some(pool) = setup_pool().await? else {
        return Ok(());
    };
    let admin = admin();

    let category = category_service::create_category(
        &pool,
        &admin,
        CreateCategoryRequest {
            name: format!("category-test-{}", Uuid::new_v4()),
            description: None,
            icon: None,
        },
    )
    .await?
    .data
    .unwrap();

    let mut request = product_request(format!("categorized-{}", Uuid::new_v4()));
    request.category_id = Some(category.id);
    let product = product_service::create_product(&pool, &admin, request)
        .await?
        .data
        .unwrap();

    let blocked = category_service::delete_category(&pool, &admin, category.id).await;
    assert!(matches!(blocked, Err(AppError::BadRequest(_))));

    product_service::delete_product(&pool, &admin, product.id).await?;
    category_service::delete_category(&pool, &admin, category.id).await?;

    Ok(())
}

#[tokio::test]
async fn non_admins_cannot_mutate_the_catalog() -> anyhow::Result<()> {
    let Some(pool) = setup_pool().await? else {
        return Ok(());
    };
    let staff = staff();

    let result = product_service::create_product(
        &pool,
        &staff,
        product_request(format!("forbidden-{}", Uuid::new_v4())),
    )
    .await;
    assert!(matches!(result, Err(AppError::Forbidden)));

    let result = admin_service::dashboard_stats(&pool, &staff).await;
    assert!(matches!(result, Err(AppError::Forbidden)));

    Ok(())
}

#[tokio::test]
async fn invalid_discount_is_rejected() -> anyhow::Result<()> {
    let Some(pool) = setup_pool().await? else {
        return Ok(());
    };
    let admin = admin();

    let mut request = product_request(format!("discount-{}", Uuid::new_v4()));
    request.discount = 150;
    let result = product_service::create_product(&pool, &admin, request).await;
    assert!(matches!(result, Err(AppError::BadRequest(_))));

    let created = product_service::create_product(
        &pool,
        &admin,
        product_request(format!("discount-ok-{}", Uuid::new_v4())),
    )
    .await?
    .data
    .unwrap();

    let result = product_service::update_product(
        &pool,
        &admin,
        created.id,
        UpdateProductRequest {
            name: None,
            description: None,
            price: None,
            previous_price: None,
            stock: None,
            category_id: None,
            image_url: None,
            brand: None,
            featured: None,
            discount: Some(-1),
        },
    )
    .await;
    assert!(matches!(result, Err(AppError::BadRequest(_))));

    Ok(())
}

#[tokio::test]
async fn sales_listing_carries_line_items() -> anyhow::Result<()> {
    let Some(pool) = setup_pool().await? else {
        return Ok(());
    };
    let admin = admin();

    let product = product_service::create_product(
        &pool,
        &admin,
        product_request(format!("listing-{}", Uuid::new_v4())),
    )
    .await?
    .data
    .unwrap();

    let sale_id = sale_service::create_sale(
        &pool,
        CheckoutRequest {
            items: vec![CheckoutItem {
                product_id: product.id,
                quantity: 2,
                unit_price: 500,
                name: product.name.clone(),
            }],
            total: 1000,
            payment_method: None,
            customer_id: None,
        },
    )
    .await?
    .data
    .unwrap()
    .sale_id;

    let listing = admin_service::list_sales(
        &pool,
        &admin,
        SaleListQuery {
            pagination: Pagination {
                page: Some(1),
                per_page: Some(100),
            },
            status: Some("completed".into()),
        },
    )
    .await?
    .data
    .unwrap();

    let sale = listing
        .items
        .iter()
        .find(|s| s.sale.id == sale_id)
        .expect("sale should appear in the admin listing");
    assert_eq!(sale.items.len(), 1);
    assert_eq!(sale.items[0].product_name, product.name);
    assert_eq!(sale.items[0].subtotal, 1000);

    Ok(())
}
