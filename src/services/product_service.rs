use sqlx::{Postgres, QueryBuilder};

use crate::{
    db::DbPool,
    error::{AppError, AppResult},
    models::{Category, Product},
    routes::params::ProductQuery,
};

pub async fn list_products(pool: &DbPool, query: ProductQuery) -> AppResult<Vec<Product>> {
    let mut builder = QueryBuilder::<Postgres>::new(
        "SELECT id, name, description, price, image_url, category_id FROM products WHERE TRUE",
    );

    if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = like_pattern(search);
        builder
            .push(" AND (name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR description ILIKE ")
            .push_bind(pattern)
            .push(")");
    }

    if let Some(category_id) = query.category {
        builder.push(" AND category_id = ").push_bind(category_id);
    }

    builder.push(" ORDER BY id");

    let products = builder
        .build_query_as::<Product>()
        .fetch_all(pool)
        .await?;
    Ok(products)
}

pub async fn get_product(pool: &DbPool, id: i64) -> AppResult<Product> {
    let product = sqlx::query_as::<_, Product>(
        "SELECT id, name, description, price, image_url, category_id FROM products WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    product.ok_or(AppError::NotFound)
}

pub async fn list_categories(pool: &DbPool) -> AppResult<Vec<Category>> {
    let categories = sqlx::query_as::<_, Category>("SELECT id, name FROM categories ORDER BY id")
        .fetch_all(pool)
        .await?;
    Ok(categories)
}

/// Substring pattern for `ILIKE` with the wildcard characters of `term` escaped.
fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

#[cfg(test)]
mod tests {
    use super::like_pattern;

    #[test]
    fn like_pattern_wraps_and_escapes_wildcards() {
        assert_eq!(like_pattern("mug"), "%mug%");
        assert_eq!(like_pattern("100%_off"), "%100\\%\\_off%");
    }
}
