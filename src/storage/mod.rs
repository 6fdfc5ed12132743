//! # Storage
//!
//! Persistence seam for drinks. Handlers only see [`DrinkStore`]; the
//! Postgres implementation lives in [`postgres`].

use async_trait::async_trait;

use crate::models::{Drink, DrinkError, NewDrink};

pub mod postgres;

pub use postgres::PgDrinkStore;

/// Row-level operations over the drinks table.
///
/// Each call is a single statement; no transaction spans calls.
#[async_trait]
pub trait DrinkStore: Send + Sync + 'static {
    async fn all(&self) -> Result<Vec<Drink>, DrinkError>;

    async fn find_by_id(&self, id: i32) -> Result<Option<Drink>, DrinkError>;

    /// Fails with `DuplicateTitle` when the title is taken.
    async fn insert(&self, drink: NewDrink) -> Result<Drink, DrinkError>;

    /// Fails with `NotFound` when no row has `drink.id`.
    async fn update(&self, drink: &Drink) -> Result<Drink, DrinkError>;

    async fn delete(&self, id: i32) -> Result<(), DrinkError>;
}
