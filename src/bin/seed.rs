use storefront_api::{
    config::AppConfig,
    db::{create_pool, run_migrations},
    services::auth_service::hash_password,
};

const CATEGORIES: [&str; 5] = ["Laptops", "Smartphones", "Books", "T-Shirts", "Headphones"];

// (name, description, price in cents, image, category)
const PRODUCTS: [(&str, &str, i64, &str, &str); 10] = [
    ("MacBook Pro", "The latest MacBook Pro with M3 chip.", 250_000, "https://placeimg.com/640/480/tech", "Laptops"),
    ("Dell XPS 15", "A powerful and stylish Windows laptop.", 200_000, "https://placeimg.com/640/480/tech?2", "Laptops"),
    ("iPhone 15 Pro", "The latest iPhone with A17 Pro chip.", 120_000, "https://placeimg.com/640/480/tech?3", "Smartphones"),
    ("Samsung Galaxy S24", "The latest Samsung phone with Galaxy AI.", 110_000, "https://placeimg.com/640/480/tech?4", "Smartphones"),
    ("The Pragmatic Programmer", "Your journey to mastery, 20th Anniversary Edition.", 5_000, "https://placeimg.com/640/480/arch", "Books"),
    ("Clean Code", "A Handbook of Agile Software Craftsmanship.", 4_500, "https://placeimg.com/640/480/arch?2", "Books"),
    ("Ferris T-Shirt", "A comfortable t-shirt for Rust developers.", 3_000, "https://placeimg.com/640/480/people", "T-Shirts"),
    ("Axum T-Shirt", "Show your love for the axum framework.", 3_000, "https://placeimg.com/640/480/people?2", "T-Shirts"),
    ("Sony WH-1000XM5", "Industry-leading noise canceling headphones.", 40_000, "https://placeimg.com/640/480/tech?5", "Headphones"),
    ("Bose QuietComfort Ultra", "The next generation of noise-cancelling headphones.", 43_000, "https://placeimg.com/640/480/tech?6", "Headphones"),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url, 1).await?;
    // Ensure migrations are applied.
    run_migrations(&pool).await?;

    seed_categories(&pool).await?;
    seed_products(&pool).await?;
    let user_id = ensure_user(&pool, "demo", "demo1234").await?;

    println!("Seed completed. Demo user ID: {user_id}");
    Ok(())
}

async fn seed_categories(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    for name in CATEGORIES {
        sqlx::query("INSERT INTO categories (name) VALUES ($1) ON CONFLICT (name) DO NOTHING")
            .bind(name)
            .execute(pool)
            .await?;
    }
    println!("Seeded categories");
    Ok(())
}

async fn seed_products(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    for (name, desc, price, image_url, category) in PRODUCTS {
        sqlx::query(
            r#"
            INSERT INTO products (name, description, price, image_url, category_id)
            SELECT $1, $2, $3, $4, c.id FROM categories c WHERE c.name = $5
            ON CONFLICT (name) DO NOTHING
            "#,
        )
        .bind(name)
        .bind(desc)
        .bind(price)
        .bind(image_url)
        .bind(category)
        .execute(pool)
        .await?;
    }
    println!("Seeded products");
    Ok(())
}

async fn ensure_user(pool: &sqlx::PgPool, username: &str, password: &str) -> anyhow::Result<i64> {
    let password_hash = hash_password(password).map_err(|e| anyhow::anyhow!(e.to_string()))?;

    let (user_id,): (i64,) = sqlx::query_as(
        r#"
        INSERT INTO users (username, password_hash)
        VALUES ($1, $2)
        ON CONFLICT (username) DO UPDATE SET username = EXCLUDED.username
        RETURNING id
        "#,
    )
    .bind(username)
    .bind(password_hash)
    .fetch_one(pool)
    .await?;

    println!("Ensured user {username}");
    Ok(user_id)
}
