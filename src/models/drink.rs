use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use sqlx::FromRow;
use thiserror::Error;

use crate::storage::DrinkStore;

/// Drink maps to the `drinks` table.
///
/// The recipe is kept as serialized JSON text and parsed again whenever a
/// view is rendered.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Drink {
    pub id: i32,
    pub title: String,
    pub recipe: String,
}

/// One recipe entry. Only `color` and `parts` are required, since the public
/// listing shows them; everything else is kept as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ingredient {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub color: String,
    pub parts: Number,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Recipe entry with the ingredient name stripped, for public listings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortIngredient {
    pub color: String,
    pub parts: Number,
}

impl From<&Ingredient> for ShortIngredient {
    fn from(ingredient: &Ingredient) -> Self {
        Self {
            color: ingredient.color.clone(),
            parts: ingredient.parts.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DrinkView<I> {
    pub id: i32,
    pub title: String,
    pub recipe: Vec<I>,
}

pub type ShortDrink = DrinkView<ShortIngredient>;
pub type LongDrink = DrinkView<Ingredient>;

/// Request body for create and update
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DrinkDraft {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub recipe: Option<Value>,
}

/// Validated drink ready for storage (without generated fields)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDrink {
    pub title: String,
    pub recipe: String,
}

#[derive(Debug, Error)]
pub enum DrinkError {
    #[error("Drink not found: {id}")]
    NotFound { id: i32 },

    #[error("A drink titled '{title}' already exists")]
    DuplicateTitle { title: String },

    #[error("Missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("Recipe serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Database operation failed: {0}")]
    Database(#[from] sqlx::Error),
}

impl DrinkError {
    /// Short label for structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            DrinkError::NotFound { .. } => "not_found",
            DrinkError::DuplicateTitle { .. } => "duplicate_title",
            DrinkError::MissingField { .. } => "missing_field",
            DrinkError::Serialization(_) => "serialization",
            DrinkError::Database(_) => "database",
        }
    }
}

impl TryFrom<DrinkDraft> for NewDrink {
    type Error = DrinkError;

    fn try_from(draft: DrinkDraft) -> Result<Self, Self::Error> {
        let title = draft
            .title
            .ok_or(DrinkError::MissingField { field: "title" })?;
        let recipe = match draft.recipe {
            None | Some(Value::Null) => return Err(DrinkError::MissingField { field: "recipe" }),
            Some(value) => value,
        };

        // Parse before storing so every persisted recipe renders in both views.
        let ingredients: Vec<Ingredient> = serde_json::from_value(recipe)?;

        Ok(NewDrink {
            title,
            recipe: serde_json::to_string(&ingredients)?,
        })
    }
}

impl Drink {
    pub fn ingredients(&self) -> Result<Vec<Ingredient>, DrinkError> {
        Ok(serde_json::from_str(&self.recipe)?)
    }

    /// Public projection: recipe entries reduced to color and parts.
    pub fn short(&self) -> Result<ShortDrink, DrinkError> {
        let recipe = self
            .ingredients()?
            .iter()
            .map(ShortIngredient::from)
            .collect();

        Ok(DrinkView {
            id: self.id,
            title: self.title.clone(),
            recipe,
        })
    }

    /// Detailed projection with every recipe field.
    pub fn long(&self) -> Result<LongDrink, DrinkError> {
        Ok(DrinkView {
            id: self.id,
            title: self.title.clone(),
            recipe: self.ingredients()?,
        })
    }

    /// List all drinks, ordered by id
    pub async fn all(store: &dyn DrinkStore) -> Result<Vec<Drink>, DrinkError> {
        store.all().await
    }

    pub async fn find_by_id(store: &dyn DrinkStore, id: i32) -> Result<Option<Drink>, DrinkError> {
        store.find_by_id(id).await
    }

    /// Persist a new drink; storage assigns the id.
    pub async fn insert(store: &dyn DrinkStore, draft: DrinkDraft) -> Result<Drink, DrinkError> {
        let new_drink = NewDrink::try_from(draft)?;
        store.insert(new_drink).await
    }

    /// Replace title and recipe wholesale and persist the change.
    pub async fn update(&mut self, store: &dyn DrinkStore, draft: DrinkDraft) -> Result<(), DrinkError> {
        let changes = NewDrink::try_from(draft)?;
        let mut updated = self.clone();
        updated.title = changes.title;
        updated.recipe = changes.recipe;

        *self = store.update(&updated).await?;
        Ok(())
    }

    /// Hard delete. Fails with `NotFound` if the row is already gone.
    pub async fn delete(self, store: &dyn DrinkStore) -> Result<(), DrinkError> {
        store.delete(self.id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn latte() -> Drink {
        Drink {
            id: 7,
            title: "Latte".to_string(),
            recipe: r#"[{"name":"Milk","color":"white","parts":3},{"name":"Espresso","color":"brown","parts":1,"temperature":"hot"}]"#
                .to_string(),
        }
    }

    #[test]
    fn test_short_view_drops_names() {
        let short = serde_json::to_value(latte().short().unwrap()).unwrap();

        assert_eq!(
            short,
            json!({
                "id": 7,
                "title": "Latte",
                "recipe": [
                    {"color": "white", "parts": 3},
                    {"color": "brown", "parts": 1}
                ]
            })
        );
    }

    #[test]
    fn test_long_view_keeps_every_field() {
        let long = serde_json::to_value(latte().long().unwrap()).unwrap();

        assert_eq!(
            long["recipe"],
            json!([
                {"name": "Milk", "color": "white", "parts": 3},
                {"name": "Espresso", "color": "brown", "parts": 1, "temperature": "hot"}
            ])
        );
    }

    #[test]
    fn test_corrupt_recipe_fails_projection() {
        let drink = Drink {
            id: 1,
            title: "Broken".to_string(),
            recipe: "null".to_string(),
        };

        assert!(matches!(drink.short(), Err(DrinkError::Serialization(_))));
        assert!(matches!(drink.long(), Err(DrinkError::Serialization(_))));
    }

    #[test]
    fn test_draft_serializes_recipe() {
        let draft: DrinkDraft = serde_json::from_value(json!({
            "title": "Water",
            "recipe": [{"name": "Water", "color": "blue", "parts": 1}]
        }))
        .unwrap();

        let new_drink = NewDrink::try_from(draft).unwrap();
        assert_eq!(new_drink.title, "Water");
        assert_eq!(
            serde_json::from_str::<Value>(&new_drink.recipe).unwrap(),
            json!([{"name": "Water", "color": "blue", "parts": 1}])
        );
    }

    #[test]
    fn test_draft_missing_fields() {
        let no_title = DrinkDraft {
            title: None,
            recipe: Some(json!([])),
        };
        assert!(matches!(
            NewDrink::try_from(no_title),
            Err(DrinkError::MissingField { field: "title" })
        ));

        let null_recipe = DrinkDraft {
            title: Some("Tea".to_string()),
            recipe: Some(Value::Null),
        };
        assert!(matches!(
            NewDrink::try_from(null_recipe),
            Err(DrinkError::MissingField { field: "recipe" })
        ));
    }

    #[test]
    fn test_draft_rejects_malformed_recipe() {
        let draft = DrinkDraft {
            title: Some("Mocha".to_string()),
            recipe: Some(json!([{"name": "Chocolate", "color": "brown"}])),
        };

        assert!(matches!(
            NewDrink::try_from(draft),
            Err(DrinkError::Serialization(_))
        ));
    }

    #[test]
    fn test_draft_accepts_fractional_parts_and_nameless_entries() {
        let draft = DrinkDraft {
            title: Some("Cortado".to_string()),
            recipe: Some(json!([
                {"name": "Milk", "color": "white", "parts": 0.5},
                {"color": "brown", "parts": 1}
            ])),
        };

        let new_drink = NewDrink::try_from(draft).unwrap();
        let drink = Drink {
            id: 3,
            title: new_drink.title,
            recipe: new_drink.recipe,
        };

        assert_eq!(
            serde_json::to_value(drink.long().unwrap()).unwrap()["recipe"],
            json!([
                {"name": "Milk", "color": "white", "parts": 0.5},
                {"color": "brown", "parts": 1}
            ])
        );
        assert_eq!(
            serde_json::to_value(drink.short().unwrap()).unwrap()["recipe"],
            json!([
                {"color": "white", "parts": 0.5},
                {"color": "brown", "parts": 1}
            ])
        );
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(DrinkError::NotFound { id: 1 }.kind(), "not_found");
        assert_eq!(
            DrinkError::DuplicateTitle {
                title: "Latte".to_string()
            }
            .kind(),
            "duplicate_title"
        );
    }
}
