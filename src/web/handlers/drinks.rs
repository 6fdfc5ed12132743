//! # Drink Handlers
//!
//! The drinks menu: a public listing, a detailed listing, and the mutation
//! endpoints. Permission checks are applied at the route level via
//! [`authorize`](crate::web::authorize::authorize).

use axum::extract::{FromRequest, Path, Request, State};
use axum::Json;
use tracing::{debug, error, info, warn};

use crate::auth::AuthClaims;
use crate::models::{Drink, DrinkDraft, DrinkError, LongDrink, ShortDrink};
use crate::web::errors::{ApiError, ApiResult};
use crate::web::extractors::JsonBody;
use crate::web::response_types::{DeleteResponse, DrinksResponse};
use crate::web::state::AppState;

/// Ids that are not integers can never match a row.
fn parse_drink_id(raw: &str) -> ApiResult<i32> {
    raw.parse::<i32>().map_err(|_| {
        debug!(id = %raw, "Non-numeric drink id");
        ApiError::NotFound
    })
}

/// Lookups outside a mutation are unexpected failures (500).
fn lookup_failed(err: DrinkError) -> ApiError {
    error!(kind = err.kind(), error = %err, "Drink lookup failed");
    ApiError::Internal
}

/// Any failure during a mutation collapses to 422; the cause is only logged.
fn mutation_failed(operation: &'static str) -> impl Fn(DrinkError) -> ApiError {
    move |err| {
        warn!(operation, kind = err.kind(), error = %err, "Drink mutation failed");
        ApiError::unprocessable(err.to_string())
    }
}

async fn find_drink(state: &AppState, id: i32) -> ApiResult<Drink> {
    Drink::find_by_id(state.drinks(), id)
        .await
        .map_err(lookup_failed)?
        .ok_or_else(|| {
            debug!(id, "Drink not found");
            ApiError::NotFound
        })
}

/// List drinks: GET /drinks (public, short view)
pub async fn list_drinks(State(state): State<AppState>) -> ApiResult<Json<DrinksResponse<ShortDrink>>> {
    let drinks = Drink::all(state.drinks()).await.map_err(lookup_failed)?;
    let views = drinks
        .iter()
        .map(Drink::short)
        .collect::<Result<Vec<_>, _>>()
        .map_err(lookup_failed)?;

    debug!(count = views.len(), "Listed drinks");
    Ok(Json(DrinksResponse::new(views)))
}

/// Drink details: GET /drinks-detail (`get:drinks-detail`, long view)
pub async fn get_drinks_detail(
    State(state): State<AppState>,
    claims: AuthClaims,
) -> ApiResult<Json<DrinksResponse<LongDrink>>> {
    let drinks = Drink::all(state.drinks()).await.map_err(lookup_failed)?;
    let views = drinks
        .iter()
        .map(Drink::long)
        .collect::<Result<Vec<_>, _>>()
        .map_err(lookup_failed)?;

    debug!(subject = %claims.subject, count = views.len(), "Listed drink details");
    Ok(Json(DrinksResponse::new(views)))
}

/// Create a drink: POST /drinks (`post:drinks`)
pub async fn create_drink(
    State(state): State<AppState>,
    claims: AuthClaims,
    JsonBody(draft): JsonBody<DrinkDraft>,
) -> ApiResult<Json<DrinksResponse<LongDrink>>> {
    info!(subject = %claims.subject, title = ?draft.title, "Creating drink");

    let drink = Drink::insert(state.drinks(), draft)
        .await
        .map_err(mutation_failed("create"))?;
    let view = drink.long().map_err(mutation_failed("create"))?;

    info!(id = drink.id, title = %drink.title, "Drink created");
    Ok(Json(DrinksResponse::new(vec![view])))
}

/// Update a drink: PATCH /drinks/:id (`patch:drinks`)
///
/// Title and recipe are replaced wholesale. The body is only read once the
/// drink exists, so an unknown id is a 404 whatever the payload.
pub async fn update_drink(
    State(state): State<AppState>,
    claims: AuthClaims,
    Path(raw_id): Path<String>,
    request: Request,
) -> ApiResult<Json<DrinksResponse<LongDrink>>> {
    let id = parse_drink_id(&raw_id)?;
    let mut drink = find_drink(&state, id).await?;
    let JsonBody(draft) = JsonBody::<DrinkDraft>::from_request(request, &state).await?;

    info!(subject = %claims.subject, id, title = ?draft.title, "Updating drink");

    drink
        .update(state.drinks(), draft)
        .await
        .map_err(mutation_failed("update"))?;
    let view = drink.long().map_err(mutation_failed("update"))?;

    info!(id, title = %drink.title, "Drink updated");
    Ok(Json(DrinksResponse::new(vec![view])))
}

/// Delete a drink: DELETE /drinks/:id (`delete:drinks`)
pub async fn delete_drink(
    State(state): State<AppState>,
    claims: AuthClaims,
    Path(raw_id): Path<String>,
) -> ApiResult<Json<DeleteResponse>> {
    let id = parse_drink_id(&raw_id)?;
    let drink = find_drink(&state, id).await?;

    info!(subject = %claims.subject, id, title = %drink.title, "Deleting drink");

    drink
        .delete(state.drinks())
        .await
        .map_err(mutation_failed("delete"))?;

    info!(id, "Drink deleted");
    Ok(Json(DeleteResponse::new(id)))
}
