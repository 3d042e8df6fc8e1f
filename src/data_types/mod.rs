pub mod cli_data_types;
pub mod shopping_data_types;

use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use shopping_data_types::format_number;

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Backend {
    Sqlite,
    Memory,
}

/// A single line of a recipe. The quantity is free text ("1", "1.5", "to taste").
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Ingredient {
    pub name: String,
    #[serde(default, deserialize_with = "quantity_from_text_or_number")]
    pub quantity: String,
    #[serde(default)]
    pub unit: String,
}

impl Ingredient {
    pub fn new(name: &str, quantity: &str, unit: &str) -> Self {
        Ingredient {
            name: name.to_string(),
            quantity: quantity.to_string(),
            unit: unit.to_string(),
        }
    }
}

// recipe files may carry `"quantity": 2` as well as `"quantity": "2"`
fn quantity_from_text_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawQuantity {
        Text(String),
        Int(i64),
        Float(f64),
    }

    Ok(match Option::<RawQuantity>::deserialize(deserializer)? {
        Some(RawQuantity::Text(s)) => s,
        Some(RawQuantity::Int(i)) => i.to_string(),
        Some(RawQuantity::Float(f)) => format_number(f),
        None => String::new(),
    })
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Recipe {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub instructions: String,
    pub source_url: Option<String>,
    pub ingredients: Vec<Ingredient>,
    pub created_at: String,
}

/// A named collection of recipe references. Recipes are referenced, not owned.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MealPlan {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub recipe_ids: Vec<Uuid>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct RecipePayload {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub instructions: String,
    #[serde(default)]
    pub source_url: Option<String>,
    #[serde(default)]
    pub ingredients: Vec<Ingredient>,
}

// unset fields keep their stored value
#[derive(Debug, Clone, Default)]
pub struct RecipeUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub instructions: Option<String>,
    pub source_url: Option<String>,
    pub ingredients: Option<Vec<Ingredient>>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct MealPlanPayload {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub recipe_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, Default)]
pub struct MealPlanUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub recipe_ids: Option<Vec<Uuid>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ingredient_quantity_accepts_numbers_and_text() {
        let json = r#"[
            {"name": "Flour", "quantity": 2, "unit": "cup"},
            {"name": "Sugar", "quantity": 0.5, "unit": "cup"},
            {"name": "Salt", "quantity": "to taste", "unit": ""},
            {"name": "Water"}
        ]"#;
        let ingredients: Vec<Ingredient> = serde_json::from_str(json).unwrap();

        assert_eq!(ingredients[0].quantity, "2");
        assert_eq!(ingredients[1].quantity, "0.5");
        assert_eq!(ingredients[2].quantity, "to taste");
        assert_eq!(ingredients[3].quantity, "");
        assert_eq!(ingredients[3].unit, "");
    }

    #[test]
    fn recipe_payload_optional_fields_default() {
        let payload: RecipePayload =
            serde_json::from_str(r#"{"name": "Toast", "instructions": "Toast it."}"#).unwrap();
        assert_eq!(payload.name, "Toast");
        assert!(payload.description.is_none());
        assert!(payload.ingredients.is_empty());
    }
}
