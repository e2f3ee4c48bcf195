use crate::{
    db::DbPool,
    dto::reviews::CreateReviewRequest,
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::Review,
};

pub async fn list_reviews(pool: &DbPool, product_id: i64) -> AppResult<Vec<Review>> {
    let reviews = sqlx::query_as::<_, Review>(
        r#"
        SELECT id, product_id, user_id, rating, comment, created_at
        FROM reviews
        WHERE product_id = $1
        ORDER BY created_at DESC, id DESC
        "#,
    )
    .bind(product_id)
    .fetch_all(pool)
    .await?;
    Ok(reviews)
}

pub async fn create_review(
    pool: &DbPool,
    user: &AuthUser,
    product_id: i64,
    payload: CreateReviewRequest,
) -> AppResult<Review> {
    if !(1..=5).contains(&payload.rating) {
        return Err(AppError::BadRequest(
            "rating must be between 1 and 5".to_string(),
        ));
    }

    let product_exists: Option<(i64,)> = sqlx::query_as("SELECT id FROM products WHERE id = $1")
        .bind(product_id)
        .fetch_optional(pool)
        .await?;
    if product_exists.is_none() {
        return Err(AppError::NotFound);
    }

    let comment = payload
        .comment
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty());

    let review = sqlx::query_as::<_, Review>(
        r#"
        INSERT INTO reviews (product_id, user_id, rating, comment)
        VALUES ($1, $2, $3, $4)
        RETURNING id, product_id, user_id, rating, comment, created_at
        "#,
    )
    .bind(product_id)
    .bind(user.user_id)
    .bind(payload.rating)
    .bind(comment)
    .fetch_one(pool)
    .await?;

    tracing::info!(
        review_id = review.id,
        product_id,
        user_id = user.user_id,
        "review created"
    );
    Ok(review)
}
