use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Category {
    pub id: i64,
    pub name: String,
}

/// Catalog entry. `price` is in minor currency units.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub price: i64,
    pub image_url: Option<String>,
    pub category_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Review {
    pub id: i64,
    pub product_id: i64,
    pub user_id: i64,
    pub rating: i32,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Raw cart row as stored, without product data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CartItem {
    pub id: i64,
    pub cart_id: i64,
    pub product_id: i64,
    pub quantity: i32,
}

/// Live product data attached to a cart line. Not frozen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ProductSummary {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub price: i64,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CartLine {
    pub id: i64,
    pub cart_id: i64,
    pub product_id: i64,
    pub quantity: i32,
    pub product: ProductSummary,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Cart {
    pub id: i64,
    pub items: Vec<CartLine>,
}

/// One purchased product with the unit price captured at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct OrderLine {
    pub id: i64,
    pub order_id: i64,
    pub product_id: i64,
    pub quantity: i32,
    pub price: i64,
}

impl OrderLine {
    /// Saturates at `i64::MAX` instead of overflowing.
    pub fn subtotal(&self) -> i64 {
        self.price.saturating_mul(i64::from(self.quantity))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Order {
    pub id: i64,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub items: Vec<OrderLine>,
}

impl Order {
    pub fn total(&self) -> i64 {
        self.items
            .iter()
            .map(OrderLine::subtotal)
            .fold(0, i64::saturating_add)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_total_sums_line_subtotals() {
        let order = Order {
            id: 1,
            user_id: 7,
            created_at: Utc::now(),
            items: vec![
                OrderLine {
                    id: 1,
                    order_id: 1,
                    product_id: 10,
                    quantity: 2,
                    price: 1000,
                },
                OrderLine {
                    id: 2,
                    order_id: 1,
                    product_id: 11,
                    quantity: 1,
                    price: 500,
                },
            ],
        };
        assert_eq!(order.total(), 2500);
    }

    #[test]
    fn oversized_totals_saturate_instead_of_overflowing() {
        let line = |id, price, quantity| OrderLine {
            id,
            order_id: 1,
            product_id: id,
            quantity,
            price,
        };
        let order = Order {
            id: 1,
            user_id: 7,
            created_at: Utc::now(),
            items: vec![line(1, 5_000_000_000, i32::MAX), line(2, 100, 1)],
        };
        assert_eq!(order.items[0].subtotal(), i64::MAX);
        assert_eq!(order.total(), i64::MAX);

        let order = Order {
            items: vec![line(1, i64::MAX / 2, 1), line(2, i64::MAX / 2, 1), line(3, 10, 1)],
            ..order
        };
        assert_eq!(order.total(), i64::MAX);
    }

    #[test]
    fn password_hash_is_never_serialized() {
        let user = User {
            id: 1,
            username: "ferris".into(),
            password_hash: "$argon2id$secret".into(),
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["username"], "ferris");
    }
}
