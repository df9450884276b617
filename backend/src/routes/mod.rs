//! Route definitions for the AutoManager API

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        // Auth routes (public except /me)
        .nest("/auth", auth_routes())
        // Protected resources
        .nest("/clients", client_routes())
        .nest("/vehicles", vehicle_routes())
        .nest("/mechanics", mechanic_routes())
        .nest("/parts", part_routes())
        .nest("/inventory", inventory_routes())
        .nest("/work-orders", workorder_routes())
        .nest("/invoices", invoice_routes())
        .nest("/notifications", notification_routes())
}

/// Authentication routes
fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(handlers::register))
        .route("/login", post(handlers::login))
        .route("/refresh", post(handlers::refresh))
        .route(
            "/me",
            get(handlers::me).route_layer(middleware::from_fn(auth_middleware)),
        )
}

/// Client management routes (protected)
fn client_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_clients).post(handlers::create_client))
        .route(
            "/:client_id",
            get(handlers::get_client)
                .put(handlers::update_client)
                .delete(handlers::delete_client),
        )
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Vehicle management routes (protected)
fn vehicle_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_vehicles).post(handlers::create_vehicle))
        .route(
            "/:vehicle_id",
            get(handlers::get_vehicle)
                .put(handlers::update_vehicle)
                .delete(handlers::delete_vehicle),
        )
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Mechanic management routes (protected)
fn mechanic_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_mechanics).post(handlers::create_mechanic))
        .route(
            "/:mechanic_id",
            get(handlers::get_mechanic)
                .put(handlers::update_mechanic)
                .delete(handlers::delete_mechanic),
        )
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Part catalog routes (protected)
fn part_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_parts).post(handlers::create_part))
        .route(
            "/:part_id",
            get(handlers::get_part)
                .put(handlers::update_part)
                .delete(handlers::delete_part),
        )
        .route("/:part_id/movements", get(handlers::list_part_movements))
        .route("/:part_id/reconcile", get(handlers::reconcile_stock))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Inventory ledger routes (protected)
fn inventory_routes() -> Router<AppState> {
    Router::new()
        .route("/restock", post(handlers::restock))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Work order routes (protected)
fn workorder_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_orders).post(handlers::create_order))
        .route(
            "/:order_id",
            get(handlers::get_order).delete(handlers::delete_order),
        )
        .route("/:order_id/state", put(handlers::change_state))
        .route("/:order_id/history", get(handlers::get_state_history))
        .route("/:order_id/diagnosis", put(handlers::record_diagnosis))
        .route("/:order_id/readings", put(handlers::record_readings))
        .route("/:order_id/cost", get(handlers::get_order_cost))
        // Parts on the order
        .route(
            "/:order_id/parts",
            get(handlers::get_order_parts).post(handlers::consume_part),
        )
        .route("/:order_id/parts/return", post(handlers::return_part))
        .route("/:order_id/parts/adjust", put(handlers::adjust_quantity))
        .route("/:order_id/movements", get(handlers::list_order_movements))
        // Labor
        .route(
            "/:order_id/labor",
            get(handlers::list_labor).post(handlers::log_labor),
        )
        .route(
            "/:order_id/labor/:entry_id",
            axum::routing::delete(handlers::delete_labor_entry),
        )
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Billing routes (protected)
fn invoice_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_invoices).post(handlers::generate_invoice))
        .route("/:invoice_id", get(handlers::get_invoice))
        .route("/:invoice_id/void", post(handlers::void_invoice))
        .route(
            "/:invoice_id/payments",
            get(handlers::list_payments).post(handlers::add_payment),
        )
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Notification routes (protected)
fn notification_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_notifications))
        .route("/unread-count", get(handlers::get_unread_count))
        .route("/mark-all-read", post(handlers::mark_all_as_read))
        .route("/:notification_id/read", post(handlers::mark_as_read))
        .route_layer(middleware::from_fn(auth_middleware))
}
