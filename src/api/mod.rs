pub mod auth;
pub mod bills;
pub mod collectors;
pub mod customers;
pub mod dashboards;
pub mod password_reset;
pub mod payments;
pub mod plans;
pub mod reference_data;
pub mod super_admin;

use crate::middleware::AppState;
use axum::Router;

pub(crate) use crate::utils::today;

pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::routes())
        .nest("/super-admin", super_admin::routes())
        .nest("/customers", customers::routes())
        .nest("/collectors", collectors::routes())
        .nest("/bills", bills::routes())
        .nest("/payments", payments::routes())
        .nest("/plans", plans::routes())
        .nest("/dashboard", dashboards::routes())
        .nest("/reference-data", reference_data::routes())
        .merge(password_reset::routes())
}
