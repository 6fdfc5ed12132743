//! # Web API Routes

use axum::routing::{get, patch};
use axum::Router;

use crate::auth::Permission;
use crate::web::authorize::authorize;
use crate::web::handlers::drinks;
use crate::web::state::AppState;

/// Drink routes. Only the public listing skips authorization.
pub fn drink_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/drinks",
            get(drinks::list_drinks)
                .post(authorize(Permission::PostDrinks, drinks::create_drink)),
        )
        .route(
            "/drinks-detail",
            get(authorize(Permission::GetDrinksDetail, drinks::get_drinks_detail)),
        )
        .route(
            "/drinks/:id",
            patch(authorize(Permission::PatchDrinks, drinks::update_drink))
                .delete(authorize(Permission::DeleteDrinks, drinks::delete_drink)),
        )
}
