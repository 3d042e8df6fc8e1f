use std::time::Instant;

use uuid::Uuid;

use crate::aggregator::aggregate_ingredients;
use crate::data_backend::{now_timestamp, MealStore};
use crate::data_types::shopping_data_types::{ShoppingList, ShoppingListItem};
use crate::data_types::{MealPlan, Recipe};
use crate::errors::StoreResult;

/// Recipes referenced by a meal plan, in plan order. `None` if the plan does
/// not exist; references that no longer resolve are skipped.
pub fn resolve_meal_plan_recipes<S>(
    store: &S,
    meal_plan_id: &Uuid,
) -> StoreResult<Option<Vec<Recipe>>>
where
    S: MealStore + ?Sized,
{
    Ok(store
        .get_meal_plan_with_recipes(meal_plan_id)?
        .map(|(_, recipes)| recipes))
}

fn aggregate_plan(plan: &MealPlan, recipes: &[Recipe]) -> Vec<ShoppingListItem> {
    let now = Instant::now();
    let items = aggregate_ingredients(recipes.iter().flat_map(|r| r.ingredients.iter()));
    log::debug!(
        "resolve {}: {} recipes, {} items in {:.2?}",
        plan.id,
        recipes.len(),
        items.len(),
        now.elapsed()
    );
    items
}

/// Aggregated shopping list of a meal plan.
///
/// `None` means the meal plan does not exist, an empty list means it exists
/// but has nothing to buy.
pub fn resolve_shopping_list<S>(
    store: &S,
    meal_plan_id: &Uuid,
) -> StoreResult<Option<Vec<ShoppingListItem>>>
where
    S: MealStore + ?Sized,
{
    Ok(store
        .get_meal_plan_with_recipes(meal_plan_id)?
        .map(|(plan, recipes)| aggregate_plan(&plan, &recipes)))
}

/// Stores the current aggregation of a meal plan as a snapshot. Later edits
/// of the plan or its recipes do not touch the stored items.
pub fn create_shopping_list<S>(
    store: &mut S,
    meal_plan_id: &Uuid,
    name: Option<String>,
) -> StoreResult<Option<ShoppingList>>
where
    S: MealStore + ?Sized,
{
    let build = |plan: &MealPlan, recipes: &[Recipe]| ShoppingList {
        id: Uuid::new_v4(),
        name: name
            .clone()
            .unwrap_or_else(|| format!("{} shopping list", plan.name)),
        meal_plan_id: Some(plan.id),
        created_at: now_timestamp(),
        items: aggregate_plan(plan, recipes),
    };

    let list = store.insert_meal_plan_snapshot(meal_plan_id, &build)?;
    if let Some(list) = &list {
        log::info!("saved shopping list '{}' ({})", list.name, list.id);
    }
    Ok(list)
}

/// Marks one item of a stored list. `None` if the list or the index is unknown.
pub fn set_item_purchased<S>(
    store: &mut S,
    list_id: &Uuid,
    index: usize,
    purchased: bool,
) -> StoreResult<Option<ShoppingList>>
where
    S: MealStore + ?Sized,
{
    let list = store.set_list_item_purchased(list_id, index, purchased)?;
    if list.is_some() {
        log::debug!("list {}: item {} purchased={}", list_id, index, purchased);
    }
    Ok(list)
}
