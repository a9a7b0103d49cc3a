use crate::handlers::{balance, login, orders, register, withdraw, withdrawals};
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub fn create_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/user/register", post(register::register))
        .route("/user/login", post(login::login))
        .route(
            "/user/orders",
            post(orders::upload_order).get(orders::list_orders),
        )
        .route("/user/balance", get(balance::get_balance))
        .route("/user/balance/withdraw", post(withdraw::withdraw))
        .route("/user/withdrawals", get(withdrawals::list_withdrawals));

    Router::new()
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
