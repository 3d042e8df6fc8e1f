use uuid::Uuid;

use super::{
    non_blank, now_timestamp, validate_meal_plan_name, validate_recipe_payload,
    validate_recipe_update, validate_shopping_list_name, MealStore,
};
use crate::data_types::shopping_data_types::{ShoppingList, ShoppingListUpdate};
use crate::data_types::{
    MealPlan, MealPlanPayload, MealPlanUpdate, Recipe, RecipePayload, RecipeUpdate,
};
use crate::errors::StoreResult;

/// Non-persistent store, owned by whoever opened it.
#[derive(Debug, Default)]
pub struct MemStore {
    recipes: Vec<Recipe>,
    meal_plans: Vec<MealPlan>,
    shopping_lists: Vec<ShoppingList>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn has_recipe(&self, id: &Uuid) -> bool {
        self.recipes.iter().any(|r| &r.id == id)
    }

    // unknown recipes and duplicates are dropped
    fn known_recipe_ids(&self, plan_name: &str, recipe_ids: Vec<Uuid>) -> Vec<Uuid> {
        let mut kept: Vec<Uuid> = Vec::with_capacity(recipe_ids.len());
        for id in recipe_ids {
            if !self.has_recipe(&id) {
                log::warn!("meal plan {}: skipping unknown recipe {}", plan_name, id);
            } else if !kept.contains(&id) {
                kept.push(id);
            }
        }
        kept
    }

    fn plan_mut(&mut self, id: &Uuid) -> Option<&mut MealPlan> {
        self.meal_plans.iter_mut().find(|p| &p.id == id)
    }
}

impl MealStore for MemStore {
    fn create_recipe(&mut self, payload: RecipePayload) -> StoreResult<Recipe> {
        validate_recipe_payload(&payload)?;

        let recipe = Recipe {
            id: Uuid::new_v4(),
            name: payload.name,
            description: non_blank(payload.description),
            instructions: payload.instructions,
            source_url: non_blank(payload.source_url),
            ingredients: payload.ingredients,
            created_at: now_timestamp(),
        };
        self.recipes.push(recipe.clone());

        Ok(recipe)
    }

    fn get_recipe(&self, id: &Uuid) -> StoreResult<Option<Recipe>> {
        Ok(self.recipes.iter().find(|r| &r.id == id).cloned())
    }

    fn list_recipes(&self) -> StoreResult<Vec<Recipe>> {
        Ok(self.recipes.clone())
    }

    fn update_recipe(&mut self, id: &Uuid, update: RecipeUpdate) -> StoreResult<Option<Recipe>> {
        validate_recipe_update(&update)?;

        let Some(recipe) = self.recipes.iter_mut().find(|r| &r.id == id) else {
            return Ok(None);
        };
        if let Some(name) = update.name {
            recipe.name = name;
        }
        if let Some(description) = update.description {
            recipe.description = non_blank(Some(description));
        }
        if let Some(instructions) = update.instructions {
            recipe.instructions = instructions;
        }
        if let Some(source_url) = update.source_url {
            recipe.source_url = non_blank(Some(source_url));
        }
        if let Some(ingredients) = update.ingredients {
            recipe.ingredients = ingredients;
        }

        Ok(Some(recipe.clone()))
    }

    fn delete_recipe(&mut self, id: &Uuid) -> StoreResult<bool> {
        let before = self.recipes.len();
        self.recipes.retain(|r| &r.id != id);
        if self.recipes.len() == before {
            return Ok(false);
        }

        for plan in self.meal_plans.iter_mut() {
            plan.recipe_ids.retain(|r| r != id);
        }
        Ok(true)
    }

    fn create_meal_plan(&mut self, payload: MealPlanPayload) -> StoreResult<MealPlan> {
        validate_meal_plan_name(&payload.name)?;

        let plan = MealPlan {
            id: Uuid::new_v4(),
            recipe_ids: self.known_recipe_ids(&payload.name, payload.recipe_ids),
            name: payload.name,
            description: non_blank(payload.description),
        };
        self.meal_plans.push(plan.clone());

        Ok(plan)
    }

    fn get_meal_plan(&self, id: &Uuid) -> StoreResult<Option<MealPlan>> {
        Ok(self.meal_plans.iter().find(|p| &p.id == id).cloned())
    }

    fn list_meal_plans(&self) -> StoreResult<Vec<MealPlan>> {
        Ok(self.meal_plans.clone())
    }

    fn update_meal_plan(
        &mut self,
        id: &Uuid,
        update: MealPlanUpdate,
    ) -> StoreResult<Option<MealPlan>> {
        if let Some(name) = &update.name {
            validate_meal_plan_name(name)?;
        }
        let recipe_ids = update
            .recipe_ids
            .map(|ids| self.known_recipe_ids(&id.to_string(), ids));

        let Some(plan) = self.plan_mut(id) else {
            return Ok(None);
        };
        if let Some(name) = update.name {
            plan.name = name;
        }
        if let Some(description) = update.description {
            plan.description = non_blank(Some(description));
        }
        if let Some(recipe_ids) = recipe_ids {
            plan.recipe_ids = recipe_ids;
        }

        Ok(Some(plan.clone()))
    }

    fn delete_meal_plan(&mut self, id: &Uuid) -> StoreResult<bool> {
        let before = self.meal_plans.len();
        self.meal_plans.retain(|p| &p.id != id);
        if self.meal_plans.len() == before {
            return Ok(false);
        }

        for list in self.shopping_lists.iter_mut() {
            if list.meal_plan_id.as_ref() == Some(id) {
                list.meal_plan_id = None;
            }
        }
        Ok(true)
    }

    fn add_recipe_to_meal_plan(
        &mut self,
        plan_id: &Uuid,
        recipe_id: &Uuid,
    ) -> StoreResult<Option<MealPlan>> {
        let known = self.has_recipe(recipe_id);

        let Some(plan) = self.plan_mut(plan_id) else {
            return Ok(None);
        };
        if !known {
            log::warn!("meal plan {}: unknown recipe {}", plan_id, recipe_id);
        } else if !plan.recipe_ids.contains(recipe_id) {
            plan.recipe_ids.push(*recipe_id);
        }

        Ok(Some(plan.clone()))
    }

    fn remove_recipe_from_meal_plan(
        &mut self,
        plan_id: &Uuid,
        recipe_id: &Uuid,
    ) -> StoreResult<Option<MealPlan>> {
        let Some(plan) = self.plan_mut(plan_id) else {
            return Ok(None);
        };
        plan.recipe_ids.retain(|r| r != recipe_id);

        Ok(Some(plan.clone()))
    }

    fn insert_shopping_list(&mut self, mut list: ShoppingList) -> StoreResult<ShoppingList> {
        validate_shopping_list_name(&list.name)?;

        if let Some(plan_id) = list.meal_plan_id {
            if !self.meal_plans.iter().any(|p| p.id == plan_id) {
                log::warn!("shopping list {}: meal plan {} is gone", list.id, plan_id);
                list.meal_plan_id = None;
            }
        }
        self.shopping_lists.push(list.clone());

        Ok(list)
    }

    fn get_shopping_list(&self, id: &Uuid) -> StoreResult<Option<ShoppingList>> {
        Ok(self.shopping_lists.iter().find(|l| &l.id == id).cloned())
    }

    fn list_shopping_lists(&self) -> StoreResult<Vec<ShoppingList>> {
        Ok(self.shopping_lists.clone())
    }

    fn update_shopping_list(
        &mut self,
        id: &Uuid,
        update: ShoppingListUpdate,
    ) -> StoreResult<Option<ShoppingList>> {
        if let Some(name) = &update.name {
            validate_shopping_list_name(name)?;
        }
        let Some(list) = self.shopping_lists.iter_mut().find(|l| &l.id == id) else {
            return Ok(None);
        };
        if let Some(name) = update.name {
            list.name = name;
        }
        if let Some(items) = update.items {
            list.items = items;
        }

        Ok(Some(list.clone()))
    }

    fn delete_shopping_list(&mut self, id: &Uuid) -> StoreResult<bool> {
        let before = self.shopping_lists.len();
        self.shopping_lists.retain(|l| &l.id != id);
        Ok(self.shopping_lists.len() != before)
    }
}
