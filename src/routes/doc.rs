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
        auth::{Claims, LoginRequest, LoginResponse, RegisterRequest, UserResponse},
        cart::{AddToCartRequest, CartItemDto, CartResponse, UpdateCartItemRequest},
        categories::{CategoryList, CreateCategoryRequest, UpdateCategoryRequest},
        orders::{
            OrderLineRequest, OrderList, OrderWithItems, PlaceOrderRequest,
            ShippingAddressRequest,
        },
        payments::CreatePaymentRequest,
        products::{CreateProductRequest, ProductList, UpdateProductRequest},
        reviews::{CreateReviewRequest, ReviewList},
        users::{Profile, UpdateProfileRequest},
    },
    models::{
        Cart, CartItem, Category, Order, OrderItem, Payment, Product, Review, ShippingAddress,
    },
    response::{ApiResponse, Meta},
    routes::{auth, cart, categories, health, orders, params, payments, products, reviews, users},
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
        auth::register,
        auth::login,
        auth::logout,
        users::me,
        users::update_me,
        users::delete_me,
        categories::list_categories,
        categories::get_category,
        categories::create_category,
        categories::update_category,
        categories::delete_category,
        products::list_products,
        products::get_product,
        products::create_product,
        products::update_product,
        products::delete_product,
        products::list_product_reviews,
        cart::get_cart,
        cart::add_to_cart,
        cart::update_cart_item,
        cart::remove_from_cart,
        cart::clear_cart,
        orders::list_orders,
        orders::place_order,
        orders::get_order,
        payments::create_payment,
        payments::get_payment,
        reviews::create_review,
        reviews::delete_review
    ),
    components(
        schemas(
            Category,
            Product,
            Cart,
            CartItem,
            Order,
            OrderItem,
            ShippingAddress,
            Review,
            Payment,
            RegisterRequest,
            LoginRequest,
            LoginResponse,
            Claims,
            UserResponse,
            Profile,
            UpdateProfileRequest,
            CreateCategoryRequest,
            UpdateCategoryRequest,
            CategoryList,
            CreateProductRequest,
            UpdateProductRequest,
            ProductList,
            AddToCartRequest,
            UpdateCartItemRequest,
            CartItemDto,
            CartResponse,
            PlaceOrderRequest,
            OrderLineRequest,
            ShippingAddressRequest,
            OrderList,
            OrderWithItems,
            CreatePaymentRequest,
            CreateReviewRequest,
            ReviewList,
            params::Pagination,
            params::ProductQuery,
            params::OrderListQuery,
            Meta,
            ApiResponse<Product>,
            ApiResponse<ProductList>,
            ApiResponse<OrderWithItems>,
            ApiResponse<OrderList>,
            ApiResponse<CartResponse>,
            ApiResponse<Payment>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Authentication endpoints"),
        (name = "Users", description = "Profile endpoints"),
        (name = "Categories", description = "Category endpoints"),
        (name = "Products", description = "Product endpoints"),
        (name = "Cart", description = "Cart endpoints"),
        (name = "Orders", description = "Order endpoints"),
        (name = "Payments", description = "Payment endpoints"),
        (name = "Reviews", description = "Review endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
