use std::{fs, path::Path};

use anyhow::Context;
use regex_lite::Regex;
use serde::Deserialize;
use static_init::dynamic;

use crate::data_backend::MealStore;
use crate::data_types::{Ingredient, Recipe, RecipePayload};
use crate::errors::{StoreResult, ValidationError};

/// One ingredient per non-blank line. The whole line is the name, quantity
/// and unit stay empty.
pub fn parse_ingredient_lines(text: &str) -> Vec<Ingredient> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| Ingredient::new(line, "", ""))
        .collect()
}

/// Parses `name;quantity;unit`. Quantity and unit may be left out.
pub fn parse_ingredient_spec(spec: &str) -> Result<Ingredient, ValidationError> {
    #[dynamic]
    static RE: Regex = Regex::new(r"^([^;]*)(?:;([^;]*))?(?:;([^;]*))?$").unwrap();

    let invalid = || ValidationError::InvalidIngredientSpec(spec.to_string());
    let caps = RE.captures(spec).ok_or_else(invalid)?;

    let field = |idx: usize| caps.get(idx).map_or("", |m| m.as_str().trim());
    let name = field(1);
    if name.is_empty() {
        return Err(invalid());
    }

    Ok(Ingredient::new(name, field(2), field(3)))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RecipeFile {
    Many(Vec<RecipePayload>),
    One(RecipePayload),
}

/// Reads a recipe import file holding either one recipe object or a list of them.
pub fn load_recipe_file(path: &Path) -> anyhow::Result<Vec<RecipePayload>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("could not read recipe file {}", path.display()))?;

    let parsed: RecipeFile = serde_json::from_str(&text)
        .with_context(|| format!("{} is not a valid recipe file", path.display()))?;

    Ok(match parsed {
        RecipeFile::Many(recipes) => recipes,
        RecipeFile::One(recipe) => vec![recipe],
    })
}

fn demo_recipes() -> Vec<RecipePayload> {
    vec![
        RecipePayload {
            name: "Classic Pancakes".to_string(),
            description: Some("Fluffy, classic pancakes from scratch.".to_string()),
            instructions: "1. In a large bowl, whisk together flour, sugar, baking powder, and salt.\n\
                2. In a separate bowl, whisk together milk, egg, and melted butter.\n\
                3. Pour the wet ingredients into the dry ingredients and stir until just combined.\n\
                4. Heat a lightly oiled griddle or frying pan over medium-high heat.\n\
                5. Pour or scoop the batter onto the griddle, using approximately 1/4 cup for each pancake.\n\
                6. Brown on both sides and serve hot."
                .to_string(),
            source_url: None,
            ingredients: vec![
                Ingredient::new("Flour", "1.5", "cups"),
                Ingredient::new("Sugar", "1", "tbsp"),
                Ingredient::new("Baking Powder", "2", "tsp"),
                Ingredient::new("Salt", "0.5", "tsp"),
                Ingredient::new("Milk", "1.25", "cups"),
                Ingredient::new("Egg", "1", ""),
                Ingredient::new("Butter", "2", "tbsp"),
            ],
        },
        RecipePayload {
            name: "Simple Omelette".to_string(),
            description: Some("A quick and easy two-egg omelette.".to_string()),
            instructions: "1. Whisk eggs, water, salt, and pepper in a small bowl.\n\
                2. Heat butter in a non-stick skillet over medium heat.\n\
                3. Pour in the egg mixture and cook until the edges begin to set.\n\
                4. Sprinkle cheese over one half, fold and serve."
                .to_string(),
            source_url: None,
            ingredients: vec![
                Ingredient::new("Eggs", "2", ""),
                Ingredient::new("Water", "2", "tbsp"),
                Ingredient::new("Salt", "1", "pinch"),
                Ingredient::new("Pepper", "1", "pinch"),
                Ingredient::new("Cheese", "0.25", "cup"),
            ],
        },
    ]
}

/// Inserts the demo recipes that are not in the store yet (matched by name).
pub fn seed_database<S>(store: &mut S) -> StoreResult<Vec<Recipe>>
where
    S: MealStore + ?Sized,
{
    let existing: Vec<String> = store
        .list_recipes()?
        .into_iter()
        .map(|r| r.name.to_lowercase())
        .collect();

    let mut created = Vec::new();
    for payload in demo_recipes() {
        if existing.contains(&payload.name.to_lowercase()) {
            log::info!("seed: '{}' already present", payload.name);
            continue;
        }
        created.push(store.create_recipe(payload)?);
    }

    log::info!("seed: {} recipes added", created.len());
    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_backend::mem_store::MemStore;
    use std::io::Write;

    #[test]
    fn test_ingredient_lines_skip_blanks() {
        let parsed = parse_ingredient_lines("Flour\n\n  Sugar  \r\n   \nEggs");
        assert_eq!(
            parsed,
            vec![
                Ingredient::new("Flour", "", ""),
                Ingredient::new("Sugar", "", ""),
                Ingredient::new("Eggs", "", ""),
            ]
        );
    }

    #[test]
    fn test_ingredient_spec_forms() {
        assert_eq!(
            parse_ingredient_spec("Flour;2;cup").unwrap(),
            Ingredient::new("Flour", "2", "cup")
        );
        assert_eq!(
            parse_ingredient_spec(" Salt ; to taste ").unwrap(),
            Ingredient::new("Salt", "to taste", "")
        );
        assert_eq!(
            parse_ingredient_spec("Basil").unwrap(),
            Ingredient::new("Basil", "", "")
        );
    }

    #[test]
    fn test_ingredient_spec_rejects_bad_input() {
        for bad in ["", " ;1;cup", "a;b;c;d"] {
            assert_eq!(
                parse_ingredient_spec(bad),
                Err(ValidationError::InvalidIngredientSpec(bad.to_string()))
            );
        }
    }

    #[test]
    fn test_recipe_file_single_and_list() {
        let mut single = tempfile::NamedTempFile::new().unwrap();
        write!(
            single,
            r#"{{"name": "Toast", "instructions": "Toast it.",
                "ingredients": [{{"name": "Bread", "quantity": 2, "unit": "slice"}}]}}"#
        )
        .unwrap();
        let recipes = load_recipe_file(single.path()).unwrap();
        assert_eq!(recipes.len(), 1);
        assert_eq!(
            recipes[0].ingredients,
            vec![Ingredient::new("Bread", "2", "slice")]
        );

        let mut many = tempfile::NamedTempFile::new().unwrap();
        write!(
            many,
            r#"[{{"name": "A", "instructions": "x"}}, {{"name": "B", "instructions": "y"}}]"#
        )
        .unwrap();
        assert_eq!(load_recipe_file(many.path()).unwrap().len(), 2);

        let mut broken = tempfile::NamedTempFile::new().unwrap();
        write!(broken, "not json").unwrap();
        assert!(load_recipe_file(broken.path()).is_err());
    }

    #[test]
    fn test_seed_is_idempotent() {
        let mut store = MemStore::new();
        let first = seed_database(&mut store).unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(first[0].name, "Classic Pancakes");
        assert_eq!(first[0].ingredients.len(), 7);
        assert_eq!(first[1].ingredients.len(), 5);

        let second = seed_database(&mut store).unwrap();
        assert!(second.is_empty());
        assert_eq!(store.list_recipes().unwrap().len(), 2);
    }
}
