//! HTTP route handlers.
//!
//! | Method   | Path                | Auth   | Handler                       |
//! |----------|---------------------|--------|-------------------------------|
//! | `GET`    | `/health`           | none   | liveness probe                |
//! | `POST`   | `/auth/signup`      | none   | [`auth::signup`]              |
//! | `POST`   | `/auth/login`       | none   | [`auth::login`]               |
//! | `GET`    | `/products`         | none   | [`products::index`]           |
//! | `GET`    | `/products/recent`  | none   | [`products::recent`]          |
//! | `GET`    | `/products/featured`| none   | [`products::featured`]        |
//! | `POST`   | `/products`         | none   | [`products::create`]          |
//! | `DELETE` | `/products/{id}`    | none   | [`products::remove`]          |
//! | `GET`    | `/cart`             | bearer | [`cart::show`]                |
//! | `POST`   | `/cart/items`       | bearer | [`cart::add`]                 |
//! | `DELETE` | `/cart/items`       | bearer | [`cart::remove`]              |
//! | `POST`   | `/orders`           | bearer | [`orders::create`]            |

pub mod auth;
pub mod cart;
pub mod orders;
pub mod products;

use axum::Router;
use axum::routing::{delete, get, post};

use crate::state::AppState;

/// Build the complete application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(auth_routes())
        .merge(product_routes())
        .merge(cart_routes())
        .merge(order_routes())
        .with_state(state)
}

fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/signup", post(auth::signup))
        .route("/auth/login", post(auth::login))
}

fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(products::index).post(products::create))
        .route("/products/recent", get(products::recent))
        .route("/products/featured", get(products::featured))
        .route("/products/{id}", delete(products::remove))
}

fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/cart", get(cart::show))
        .route("/cart/items", post(cart::add).delete(cart::remove))
}

fn order_routes() -> Router<AppState> {
    Router::new().route("/orders", post(orders::create))
}

async fn health() -> &'static str {
    "ok"
}
