use crate::data_backend::MealStore;
use crate::data_types::Recipe;
use crate::errors::StoreResult;

fn normalize(term: &str) -> Option<String> {
    let term = term.trim();
    if term.is_empty() {
        None
    } else {
        Some(term.to_lowercase())
    }
}

fn has_ingredient(recipe: &Recipe, needle: &str) -> bool {
    recipe
        .ingredients
        .iter()
        .any(|i| i.name.to_lowercase().contains(needle))
}

fn matches_query(recipe: &Recipe, needle: &str) -> bool {
    if recipe.name.to_lowercase().contains(needle) {
        return true;
    }
    if recipe
        .description
        .as_deref()
        .is_some_and(|d| d.to_lowercase().contains(needle))
    {
        return true;
    }
    has_ingredient(recipe, needle)
}

/// Case-insensitive recipe search over name, description and ingredient names.
///
/// `filter_ingredient` narrows the hits to recipes with a matching ingredient,
/// and searches the whole collection when `query` is blank. Blank query and
/// no filter finds nothing. Hits come back in store order.
pub fn search_recipes<S>(
    store: &S,
    query: &str,
    filter_ingredient: Option<&str>,
) -> StoreResult<Vec<Recipe>>
where
    S: MealStore + ?Sized,
{
    let query = normalize(query);
    let filter = filter_ingredient.and_then(normalize);

    if query.is_none() && filter.is_none() {
        return Ok(Vec::new());
    }

    let hits: Vec<Recipe> = store
        .list_recipes()?
        .into_iter()
        .filter(|r| query.as_deref().map_or(true, |q| matches_query(r, q)))
        .filter(|r| filter.as_deref().map_or(true, |f| has_ingredient(r, f)))
        .collect();

    log::debug!(
        "search {:?} / {:?}: {} hits",
        query,
        filter,
        hits.len()
    );
    Ok(hits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_backend::mem_store::MemStore;
    use crate::data_types::{Ingredient, RecipePayload};

    fn add(store: &mut MemStore, name: &str, description: Option<&str>, ingredients: &[&str]) {
        store
            .create_recipe(RecipePayload {
                name: name.to_string(),
                description: description.map(str::to_string),
                instructions: "Cook.".to_string(),
                source_url: None,
                ingredients: ingredients
                    .iter()
                    .map(|i| Ingredient::new(i, "1", ""))
                    .collect(),
            })
            .unwrap();
    }

    fn kitchen() -> MemStore {
        let mut store = MemStore::new();
        add(&mut store, "Milkshake", None, &["Ice Cream", "Sugar"]);
        add(&mut store, "Pancakes", Some("Made with buttermilk"), &["Flour"]);
        add(&mut store, "Porridge", None, &["Oats", "Whole Milk"]);
        add(&mut store, "Carrot Soup", None, &["Carrot", "Onion"]);
        add(&mut store, "Tomato Soup", Some("Classic"), &["Tomato", "Onion"]);
        add(&mut store, "Soup of the day", None, &["Baby carrots", "Leek"]);
        add(&mut store, "Carrot Cake", None, &["Carrot", "Flour"]);
        store
    }

    fn names(recipes: Vec<Recipe>) -> Vec<String> {
        recipes.into_iter().map(|r| r.name).collect()
    }

    #[test]
    fn test_query_matches_name_description_and_ingredients() {
        let store = kitchen();
        let hits = search_recipes(&store, "MILK", None).unwrap();
        assert_eq!(names(hits), vec!["Milkshake", "Pancakes", "Porridge"]);
    }

    #[test]
    fn test_query_with_ingredient_filter() {
        let store = kitchen();
        let hits = search_recipes(&store, "soup", Some("carrot")).unwrap();
        assert_eq!(names(hits), vec!["Carrot Soup", "Soup of the day"]);
    }

    #[test]
    fn test_filter_alone_scans_everything() {
        let store = kitchen();
        let hits = search_recipes(&store, "  ", Some(" Carrot ")).unwrap();
        assert_eq!(
            names(hits),
            vec!["Carrot Soup", "Soup of the day", "Carrot Cake"]
        );
    }

    #[test]
    fn test_nothing_to_search_for() {
        let store = kitchen();
        assert!(search_recipes(&store, "", None).unwrap().is_empty());
        assert!(search_recipes(&store, "", Some("")).unwrap().is_empty());
        assert!(search_recipes(&store, "caviar", None).unwrap().is_empty());
    }
}
