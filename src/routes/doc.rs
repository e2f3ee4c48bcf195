use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        auth::{LoginRequest, LoginResponse, MeResponse, RegisterRequest},
        cart::{AddItemRequest, CartCreated},
        orders::{CreateOrderRequest, OrderList, OrderResponse},
        products::{CategoryList, ProductList},
        reviews::{CreateReviewRequest, ReviewList},
    },
    models::{Cart, CartItem, CartLine, Category, OrderLine, Product, ProductSummary, Review, User},
    response::{ApiResponse, Meta},
    routes::{auth, cart, categories, health, orders, params, products, reviews},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::login,
        auth::register,
        auth::me,
        products::list_products,
        products::get_product,
        categories::list_categories,
        reviews::list_reviews,
        reviews::create_review,
        cart::create_cart,
        cart::get_cart,
        cart::add_item,
        orders::create_order,
        orders::list_orders,
    ),
    components(
        schemas(
            User,
            Category,
            Product,
            ProductSummary,
            Review,
            Cart,
            CartItem,
            CartLine,
            OrderLine,
            OrderResponse,
            OrderList,
            ProductList,
            CategoryList,
            ReviewList,
            AddItemRequest,
            CartCreated,
            CreateOrderRequest,
            CreateReviewRequest,
            RegisterRequest,
            LoginRequest,
            LoginResponse,
            MeResponse,
            params::ProductQuery,
            Meta,
            ApiResponse<Cart>,
            ApiResponse<OrderResponse>,
            ApiResponse<OrderList>,
            ApiResponse<ProductList>
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Products", description = "Catalog endpoints"),
        (name = "Reviews", description = "Product review endpoints"),
        (name = "Cart", description = "Cart endpoints"),
        (name = "Orders", description = "Checkout and order history"),
        (name = "Auth", description = "Authentication endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
