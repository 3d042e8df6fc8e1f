use std::path::Path;

use uuid::Uuid;

use crate::data_types::shopping_data_types::{ShoppingList, ShoppingListUpdate};
use crate::data_types::{
    Backend, MealPlan, MealPlanPayload, MealPlanUpdate, Recipe, RecipePayload, RecipeUpdate,
};
use crate::errors::{StoreResult, ValidationError};

pub mod mem_store;
pub mod sqlite_store;

use mem_store::MemStore;
use sqlite_store::SqliteStore;

/// Entity store for recipes, meal plans and shopping list snapshots.
///
/// Lookups never treat a missing id as an error: getters return `None`,
/// deletes return `false`. Validation runs before anything is written.
pub trait MealStore {
    fn create_recipe(&mut self, payload: RecipePayload) -> StoreResult<Recipe>;
    fn get_recipe(&self, id: &Uuid) -> StoreResult<Option<Recipe>>;
    /// All recipes in creation order.
    fn list_recipes(&self) -> StoreResult<Vec<Recipe>>;
    /// Only `Some` fields change; `ingredients` replaces the whole list.
    fn update_recipe(&mut self, id: &Uuid, update: RecipeUpdate) -> StoreResult<Option<Recipe>>;
    /// Also drops the recipe from every meal plan referencing it.
    fn delete_recipe(&mut self, id: &Uuid) -> StoreResult<bool>;

    fn create_meal_plan(&mut self, payload: MealPlanPayload) -> StoreResult<MealPlan>;
    fn get_meal_plan(&self, id: &Uuid) -> StoreResult<Option<MealPlan>>;
    fn list_meal_plans(&self) -> StoreResult<Vec<MealPlan>>;
    fn update_meal_plan(
        &mut self,
        id: &Uuid,
        update: MealPlanUpdate,
    ) -> StoreResult<Option<MealPlan>>;
    fn delete_meal_plan(&mut self, id: &Uuid) -> StoreResult<bool>;
    /// `None` if the plan is missing. An unknown or already present recipe
    /// leaves the plan as it is.
    fn add_recipe_to_meal_plan(
        &mut self,
        plan_id: &Uuid,
        recipe_id: &Uuid,
    ) -> StoreResult<Option<MealPlan>>;
    fn remove_recipe_from_meal_plan(
        &mut self,
        plan_id: &Uuid,
        recipe_id: &Uuid,
    ) -> StoreResult<Option<MealPlan>>;

    /// The plan together with its recipes in plan order, read as one state.
    /// References that no longer resolve are skipped.
    fn get_meal_plan_with_recipes(
        &self,
        id: &Uuid,
    ) -> StoreResult<Option<(MealPlan, Vec<Recipe>)>> {
        let Some(plan) = self.get_meal_plan(id)? else {
            return Ok(None);
        };

        let mut recipes = Vec::with_capacity(plan.recipe_ids.len());
        for recipe_id in &plan.recipe_ids {
            match self.get_recipe(recipe_id)? {
                Some(recipe) => recipes.push(recipe),
                None => log::debug!("meal plan {}: dangling recipe {}", plan.name, recipe_id),
            }
        }
        Ok(Some((plan, recipes)))
    }

    fn insert_shopping_list(&mut self, list: ShoppingList) -> StoreResult<ShoppingList>;

    /// Builds a list from the plan and its recipes and stores it, without
    /// letting other writers in between. `None` if the plan is missing.
    fn insert_meal_plan_snapshot(
        &mut self,
        meal_plan_id: &Uuid,
        build: &dyn Fn(&MealPlan, &[Recipe]) -> ShoppingList,
    ) -> StoreResult<Option<ShoppingList>> {
        let Some((plan, recipes)) = self.get_meal_plan_with_recipes(meal_plan_id)? else {
            return Ok(None);
        };
        self.insert_shopping_list(build(&plan, &recipes)).map(Some)
    }

    fn get_shopping_list(&self, id: &Uuid) -> StoreResult<Option<ShoppingList>>;
    fn list_shopping_lists(&self) -> StoreResult<Vec<ShoppingList>>;
    fn update_shopping_list(
        &mut self,
        id: &Uuid,
        update: ShoppingListUpdate,
    ) -> StoreResult<Option<ShoppingList>>;

    /// `None` if the list or the index is unknown.
    fn set_list_item_purchased(
        &mut self,
        list_id: &Uuid,
        index: usize,
        purchased: bool,
    ) -> StoreResult<Option<ShoppingList>> {
        let Some(mut list) = self.get_shopping_list(list_id)? else {
            return Ok(None);
        };
        let Some(item) = list.items.get_mut(index) else {
            return Ok(None);
        };
        item.purchased = purchased;

        self.update_shopping_list(
            list_id,
            ShoppingListUpdate {
                name: None,
                items: Some(list.items),
            },
        )
    }

    fn delete_shopping_list(&mut self, id: &Uuid) -> StoreResult<bool>;
}

pub fn open_store(backend: Backend, db_path: &Path) -> StoreResult<Box<dyn MealStore>> {
    Ok(match backend {
        Backend::Sqlite => {
            log::debug!("opening sqlite store at {}", db_path.display());
            Box::new(SqliteStore::open(db_path)?)
        }
        Backend::Memory => Box::new(MemStore::new()),
    })
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

pub(crate) fn validate_recipe_payload(payload: &RecipePayload) -> Result<(), ValidationError> {
    if is_blank(&payload.name) {
        return Err(ValidationError::MissingRecipeName);
    }
    if is_blank(&payload.instructions) {
        return Err(ValidationError::MissingInstructions);
    }
    Ok(())
}

pub(crate) fn validate_recipe_update(update: &RecipeUpdate) -> Result<(), ValidationError> {
    if update.name.as_deref().is_some_and(is_blank) {
        return Err(ValidationError::MissingRecipeName);
    }
    if update.instructions.as_deref().is_some_and(is_blank) {
        return Err(ValidationError::MissingInstructions);
    }
    Ok(())
}

pub(crate) fn validate_meal_plan_name(name: &str) -> Result<(), ValidationError> {
    if is_blank(name) {
        return Err(ValidationError::MissingMealPlanName);
    }
    Ok(())
}

pub(crate) fn validate_shopping_list_name(name: &str) -> Result<(), ValidationError> {
    if is_blank(name) {
        return Err(ValidationError::MissingShoppingListName);
    }
    Ok(())
}

// blank optional text is stored as absent
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !is_blank(v))
}

pub(crate) fn now_timestamp() -> String {
    chrono::Local::now().to_rfc3339()
}
