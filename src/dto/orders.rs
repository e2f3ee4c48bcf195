use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{Order, OrderLine};

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct CreateOrderRequest {
    pub cart_id: i64,
}

/// An order as returned to clients, with its derived total.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderResponse {
    pub id: i64,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub items: Vec<OrderLine>,
    pub total: i64,
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        let total = order.total();
        Self {
            id: order.id,
            user_id: order.user_id,
            created_at: order.created_at,
            items: order.items,
            total,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct OrderList {
    #[schema(value_type = Vec<OrderResponse>)]
    pub items: Vec<OrderResponse>,
}
