use axum::{
    middleware as axum_middleware,
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;

use crate::api::handlers;
use crate::auth::middleware::{admin_middleware, auth_middleware};
use crate::AppState;

pub fn create_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/auth/register", post(handlers::auth::register))
        .route("/auth/login", post(handlers::auth::login))
        .route("/auth/forgot-password", post(handlers::auth::forgot_password))
        .route("/auth/reset-password", post(handlers::auth::reset_password))
        // Catalog
        .route("/products", get(handlers::catalog::list_products))
        .route("/products/:id", get(handlers::catalog::get_product))
        // Referral click tracking (rate limited inside the handler)
        .route("/affiliate/click", post(handlers::affiliate::record_click));

    // Protected routes (auth required)
    let protected_routes = Router::new()
        // Account
        .route("/account/profile", get(handlers::auth::get_profile))
        // Cart & wishlist
        .route("/cart", get(handlers::cart::get_cart))
        .route("/cart", post(handlers::cart::add_items))
        .route("/cart", delete(handlers::cart::clear_cart))
        .route("/cart/:product_id", delete(handlers::cart::remove_item))
        .route("/wishlist", get(handlers::cart::get_wishlist))
        .route("/wishlist/toggle", post(handlers::cart::toggle_wishlist))
        // Orders
        .route("/orders", post(handlers::order::place_order))
        .route("/orders/my", get(handlers::order::my_orders))
        .route(
            "/orders/:order_id/lines/:line_index/return",
            post(handlers::order::request_return),
        )
        // Payments
        .route("/payments/intent", post(handlers::payments::create_intent))
        // Affiliate program
        .route("/affiliate/activate", post(handlers::affiliate::activate))
        .route(
            "/affiliate/payment-method",
            post(handlers::affiliate::save_payment_method),
        )
        .route("/affiliate/me", get(handlers::affiliate::me))
        .route("/affiliate/withdraw", post(handlers::affiliate::withdraw))
        .route(
            "/affiliate/withdrawals",
            get(handlers::affiliate::withdraw_history),
        )
        .route("/affiliate/earnings", get(handlers::affiliate::earnings))
        .route("/affiliate/analytics", get(handlers::affiliate::analytics))
        .route(
            "/affiliate/orders",
            get(handlers::affiliate::my_attributed_orders),
        )
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    // Admin routes (auth + admin role)
    let admin_routes = Router::new()
        // Catalog management
        .route("/admin/products", post(handlers::catalog::create_product))
        .route("/admin/products/:id", put(handlers::catalog::update_product))
        .route(
            "/admin/products/:id",
            delete(handlers::catalog::delete_product),
        )
        // Order desk
        .route("/admin/orders", get(handlers::order::list_orders))
        .route("/admin/orders/last48h", get(handlers::order::last48h_orders))
        .route("/admin/orders/returns", get(handlers::order::list_returns))
        .route(
            "/admin/orders/last48h/returns",
            get(handlers::order::last48h_returns),
        )
        .route(
            "/admin/orders/:order_id/status",
            put(handlers::order::update_status),
        )
        .route(
            "/admin/orders/:order_id/lines/:line_index/return",
            put(handlers::order::decide_return),
        )
        // Affiliate desk
        .route(
            "/admin/affiliates",
            get(handlers::admin_affiliate::list_affiliates),
        )
        .route(
            "/admin/affiliates/orders",
            get(handlers::admin_affiliate::affiliate_orders),
        )
        .route(
            "/admin/withdrawals",
            get(handlers::admin_affiliate::list_withdrawals),
        )
        .route(
            "/admin/withdrawals/:id",
            put(handlers::admin_affiliate::set_withdrawal_status),
        )
        .route(
            "/admin/earnings/approve",
            post(handlers::admin_affiliate::approve_earning),
        )
        .route(
            "/admin/earnings/reject",
            post(handlers::admin_affiliate::reject_earning),
        )
        // Dashboards
        .route(
            "/admin/dashboard/summary",
            get(handlers::admin_dashboard::summary),
        )
        .route(
            "/admin/dashboard/top-earners",
            get(handlers::admin_dashboard::top_earners),
        )
        .route(
            "/admin/dashboard/best-products",
            get(handlers::admin_dashboard::best_products),
        )
        .route(
            "/admin/dashboard/orders-graph",
            get(handlers::admin_dashboard::orders_graph),
        )
        .layer(axum_middleware::from_fn(admin_middleware))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .merge(admin_routes)
}
