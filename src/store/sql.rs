use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::{Expr, LockType, OnConflict};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction, DbErr,
    EntityTrait, FromQueryResult, JoinType, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
    RelationTrait, Set, TransactionTrait,
};

use super::{NewOrderLine, Store, StoreResult, StoreTx};
use crate::{
    entity::{
        cart_items::{self, ActiveModel as CartItemActive, Column as CartCol, Entity as CartItems},
        carts::{ActiveModel as CartActive, Entity as Carts},
        order_items::{
            ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems,
            Model as OrderItemModel,
        },
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel},
        products::{Column as ProdCol, Entity as Products},
    },
    models::{CartItem, CartLine, Order, OrderLine, ProductSummary},
};

/// Postgres-backed [`Store`] built on SeaORM.
#[derive(Debug, Clone)]
pub struct SeaOrmStore {
    conn: DatabaseConnection,
}

impl SeaOrmStore {
    pub fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }
}

#[derive(Debug, FromQueryResult)]
struct CartLineRow {
    id: i64,
    cart_id: i64,
    product_id: i64,
    quantity: i32,
    name: String,
    description: Option<String>,
    price: i64,
    image_url: Option<String>,
}

impl From<CartLineRow> for CartLine {
    fn from(row: CartLineRow) -> Self {
        CartLine {
            id: row.id,
            cart_id: row.cart_id,
            product_id: row.product_id,
            quantity: row.quantity,
            product: ProductSummary {
                id: row.product_id,
                name: row.name,
                description: row.description,
                price: row.price,
                image_url: row.image_url,
            },
        }
    }
}

async fn load_cart_lines<C: ConnectionTrait>(conn: &C, cart_id: i64) -> Result<Vec<CartLine>, DbErr> {
    let rows = CartItems::find()
        .select_only()
        .column(CartCol::Id)
        .column(CartCol::CartId)
        .column(CartCol::ProductId)
        .column(CartCol::Quantity)
        .column(ProdCol::Name)
        .column(ProdCol::Description)
        .column(ProdCol::Price)
        .column(ProdCol::ImageUrl)
        .join(JoinType::InnerJoin, cart_items::Relation::Products.def())
        .filter(CartCol::CartId.eq(cart_id))
        .order_by_asc(CartCol::Id)
        .into_model::<CartLineRow>()
        .all(conn)
        .await?;

    Ok(rows.into_iter().map(CartLine::from).collect())
}

#[async_trait]
impl Store for SeaOrmStore {
    async fn create_cart(&self) -> StoreResult<i64> {
        let cart = CartActive {
            id: NotSet,
            created_at: Set(Utc::now().into()),
        }
        .insert(&self.conn)
        .await?;
        Ok(cart.id)
    }

    async fn cart_exists(&self, cart_id: i64) -> StoreResult<bool> {
        let count = Carts::find_by_id(cart_id).count(&self.conn).await?;
        Ok(count > 0)
    }

    async fn product_exists(&self, product_id: i64) -> StoreResult<bool> {
        let count = Products::find_by_id(product_id).count(&self.conn).await?;
        Ok(count > 0)
    }

    async fn add_cart_item(
        &self,
        cart_id: i64,
        product_id: i64,
        quantity: i32,
    ) -> StoreResult<CartItem> {
        // Single statement so concurrent adds to the same line cannot lose an increment.
        let on_conflict = OnConflict::columns([CartCol::CartId, CartCol::ProductId])
            .value(
                CartCol::Quantity,
                Expr::col((CartItems, CartCol::Quantity)).add(Expr::cust("EXCLUDED.quantity")),
            )
            .to_owned();

        let item = CartItems::insert(CartItemActive {
            id: NotSet,
            cart_id: Set(cart_id),
            product_id: Set(product_id),
            quantity: Set(quantity),
            created_at: Set(Utc::now().into()),
        })
        .on_conflict(on_conflict)
        .exec_with_returning(&self.conn)
        .await?;

        Ok(CartItem {
            id: item.id,
            cart_id: item.cart_id,
            product_id: item.product_id,
            quantity: item.quantity,
        })
    }

    async fn cart_lines(&self, cart_id: i64) -> StoreResult<Vec<CartLine>> {
        Ok(load_cart_lines(&self.conn, cart_id).await?)
    }

    async fn begin(&self) -> StoreResult<Box<dyn StoreTx>> {
        let txn = self.conn.begin().await?;
        Ok(Box::new(SeaOrmTx { txn }))
    }

    async fn orders_for_user(&self, user_id: i64) -> StoreResult<Vec<Order>> {
        let orders = Orders::find()
            .filter(OrderCol::UserId.eq(user_id))
            .order_by_desc(OrderCol::CreatedAt)
            .order_by_desc(OrderCol::Id)
            .all(&self.conn)
            .await?;
        if orders.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i64> = orders.iter().map(|order| order.id).collect();
        let mut lines_by_order: HashMap<i64, Vec<OrderLine>> = HashMap::new();
        for item in OrderItems::find()
            .filter(OrderItemCol::OrderId.is_in(ids))
            .order_by_asc(OrderItemCol::Id)
            .all(&self.conn)
            .await?
        {
            lines_by_order
                .entry(item.order_id)
                .or_default()
                .push(order_line_from_entity(item));
        }

        Ok(orders
            .into_iter()
            .map(|order| {
                let items = lines_by_order.remove(&order.id).unwrap_or_default();
                order_from_entity(order, items)
            })
            .collect())
    }
}

struct SeaOrmTx {
    txn: DatabaseTransaction,
}

#[async_trait]
impl StoreTx for SeaOrmTx {
    async fn lock_cart(&mut self, cart_id: i64) -> StoreResult<Vec<CartLine>> {
        // SELECT ... FOR UPDATE on the cart row serializes checkouts of the same cart.
        Carts::find_by_id(cart_id)
            .lock(LockType::Update)
            .one(&self.txn)
            .await?;
        Ok(load_cart_lines(&self.txn, cart_id).await?)
    }

    async fn insert_order(&mut self, user_id: i64, created_at: DateTime<Utc>) -> StoreResult<i64> {
        let order = OrderActive {
            id: NotSet,
            user_id: Set(user_id),
            created_at: Set(created_at.into()),
        }
        .insert(&self.txn)
        .await?;
        Ok(order.id)
    }

    async fn insert_order_line(&mut self, line: NewOrderLine) -> StoreResult<OrderLine> {
        let item = OrderItemActive {
            id: NotSet,
            order_id: Set(line.order_id),
            product_id: Set(line.product_id),
            quantity: Set(line.quantity),
            price: Set(line.price),
        }
        .insert(&self.txn)
        .await?;
        Ok(order_line_from_entity(item))
    }

    async fn clear_cart(&mut self, cart_id: i64) -> StoreResult<u64> {
        let result = CartItems::delete_many()
            .filter(CartCol::CartId.eq(cart_id))
            .exec(&self.txn)
            .await?;
        Ok(result.rows_affected)
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        self.txn.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> StoreResult<()> {
        self.txn.rollback().await?;
        Ok(())
    }
}

fn order_from_entity(model: OrderModel, items: Vec<OrderLine>) -> Order {
    Order {
        id: model.id,
        user_id: model.user_id,
        created_at: model.created_at.with_timezone(&Utc),
        items,
    }
}

fn order_line_from_entity(model: OrderItemModel) -> OrderLine {
    OrderLine {
        id: model.id,
        order_id: model.order_id,
        product_id: model.product_id,
        quantity: model.quantity,
        price: model.price,
    }
}
