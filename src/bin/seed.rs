use argon2::{
    Argon2, PasswordHasher,
    password_hash::{SaltString, rand_core::OsRng},
};
use storefront_api::{config::AppConfig, db::create_pool};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    // Ensure migrations are applied.
    sqlx::migrate!("./migrations").run(&pool).await?;

    let admin_id = ensure_user(&pool, "admin@example.com", "admin123", "admin").await?;
    seed_catalog(&pool).await?;

    println!("Seed completed. Admin ID: {admin_id}");
    Ok(())
}

async fn ensure_user(
    pool: &sqlx::PgPool,
    email: &str,
    password: &str,
    role: &str,
) -> anyhow::Result<Uuid> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!(e.to_string()))?
        .to_string();

    let row: Option<(Uuid,)> = sqlx::query_as(
        r#"
        INSERT INTO users (id, email, password_hash, role)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (email) DO UPDATE SET role = EXCLUDED.role
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(email)
    .bind(password_hash)
    .bind(role)
    .fetch_optional(pool)
    .await?;

    // If user already exists, fetch id
    let user_id = match row {
        Some((id,)) => id,
        None => {
            let existing: (Uuid,) = sqlx::query_as("SELECT id FROM users WHERE email = $1")
                .bind(email)
                .fetch_one(pool)
                .await?;
            existing.0
        }
    };

    println!("Ensured user {email} (role={role})");
    Ok(user_id)
}

async fn seed_catalog(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let categories = vec![
        ("Processors", "CPUs for desktops and workstations", "cpu"),
        ("Graphics Cards", "Dedicated GPUs", "gpu"),
        ("Memory", "RAM modules", "memory"),
        ("Peripherals", "Keyboards, mice and headsets", "keyboard"),
    ];

    for (name, desc, icon) in &categories {
        sqlx::query(
            r#"
            INSERT INTO categories (id, name, description, icon)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (name) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(desc)
        .bind(icon)
        .execute(pool)
        .await?;
    }

    // (name, description, price, stock, category, brand, featured, discount)
    let products = vec![
        (
            "Ryzen 9 7950X",
            "16-core desktop processor",
            69_900_i64,
            25,
            "Processors",
            "AMD",
            true,
            5,
        ),
        (
            "Core i7-14700K",
            "20-core desktop processor",
            41_900_i64,
            40,
            "Processors",
            "Intel",
            false,
            0,
        ),
        (
            "GeForce RTX 4070",
            "12GB GDDR6X graphics card",
            59_900_i64,
            15,
            "Graphics Cards",
            "NVIDIA",
            true,
            0,
        ),
        (
            "Vengeance 32GB DDR5",
            "2x16GB 6000MHz kit",
            12_900_i64,
            80,
            "Memory",
            "Corsair",
            false,
            10,
        ),
        (
            "MX Master 3S",
            "Wireless performance mouse",
            9_900_i64,
            120,
            "Peripherals",
            "Logitech",
            false,
            0,
        ),
    ];

    for (name, desc, price, stock, category, brand, featured, discount) in products {
        sqlx::query(
            r#"
            INSERT INTO products
                (id, name, description, price, stock, category_id, brand, featured, discount)
            SELECT $1::UUID, $2::TEXT, $3::TEXT, $4::BIGINT, $5::INT, c.id, $7::TEXT, $8::BOOLEAN, $9::INT
            FROM categories c
            WHERE c.name = $6
            ON CONFLICT (name) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(desc)
        .bind(price)
        .bind(stock)
        .bind(category)
        .bind(brand)
        .bind(featured)
        .bind(discount)
        .execute(pool)
        .await?;
    }

    println!("Seeded catalog");
    Ok(())
}
