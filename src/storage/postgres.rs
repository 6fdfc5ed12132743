use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::{debug, info};

use super::DrinkStore;
use crate::config::DatabaseSettings;
use crate::models::{Drink, DrinkError, NewDrink};

const CREATE_DRINKS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS drinks (
        id SERIAL PRIMARY KEY,
        title TEXT NOT NULL UNIQUE,
        recipe TEXT NOT NULL
    )
"#;

/// Map a write failure, surfacing unique violations on `title`.
fn classify_write_error(err: sqlx::Error, title: &str) -> DrinkError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            DrinkError::DuplicateTitle {
                title: title.to_string(),
            }
        }
        _ => DrinkError::Database(err),
    }
}

/// Postgres-backed [`DrinkStore`]
#[derive(Debug, Clone)]
pub struct PgDrinkStore {
    pool: PgPool,
}

impl PgDrinkStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(settings: &DatabaseSettings) -> Result<Self, sqlx::Error> {
        info!(
            url = %settings.redacted_url(),
            max_connections = settings.max_connections,
            "Connecting to database"
        );

        let pool = PgPoolOptions::new()
            .max_connections(settings.max_connections)
            .acquire_timeout(Duration::from_secs(settings.acquire_timeout_seconds))
            .connect(&settings.url)
            .await?;

        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Create the drinks table if it does not exist.
    pub async fn setup_schema(&self) -> Result<(), sqlx::Error> {
        sqlx::query(CREATE_DRINKS_TABLE).execute(&self.pool).await?;
        debug!("Drinks schema ready");
        Ok(())
    }

    /// Drop and recreate the drinks table, then seed a single sample drink.
    ///
    /// Destroys all stored drinks.
    pub async fn drop_and_create_all(&self) -> Result<(), DrinkError> {
        sqlx::query("DROP TABLE IF EXISTS drinks")
            .execute(&self.pool)
            .await?;
        self.setup_schema().await?;

        let seed = NewDrink {
            title: "water".to_string(),
            recipe: json!([{"name": "water", "color": "blue", "parts": 1}]).to_string(),
        };
        let drink = self.insert(seed).await?;

        info!(seed_id = drink.id, "Drinks table reset and seeded");
        Ok(())
    }
}

#[async_trait]
impl DrinkStore for PgDrinkStore {
    async fn all(&self) -> Result<Vec<Drink>, DrinkError> {
        let drinks = sqlx::query_as::<_, Drink>(
            r#"
            SELECT id, title, recipe
            FROM drinks
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(drinks)
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<Drink>, DrinkError> {
        let drink = sqlx::query_as::<_, Drink>(
            r#"
            SELECT id, title, recipe
            FROM drinks
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(drink)
    }

    async fn insert(&self, drink: NewDrink) -> Result<Drink, DrinkError> {
        sqlx::query_as::<_, Drink>(
            r#"
            INSERT INTO drinks (title, recipe)
            VALUES ($1, $2)
            RETURNING id, title, recipe
            "#,
        )
        .bind(&drink.title)
        .bind(&drink.recipe)
        .fetch_one(&self.pool)
        .await
        .map_err(|err| classify_write_error(err, &drink.title))
    }

    async fn update(&self, drink: &Drink) -> Result<Drink, DrinkError> {
        sqlx::query_as::<_, Drink>(
            r#"
            UPDATE drinks
            SET title = $2, recipe = $3
            WHERE id = $1
            RETURNING id, title, recipe
            "#,
        )
        .bind(drink.id)
        .bind(&drink.title)
        .bind(&drink.recipe)
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| classify_write_error(err, &drink.title))?
        .ok_or(DrinkError::NotFound { id: drink.id })
    }

    async fn delete(&self, id: i32) -> Result<(), DrinkError> {
        let result = sqlx::query("DELETE FROM drinks WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DrinkError::NotFound { id });
        }
        Ok(())
    }
}
