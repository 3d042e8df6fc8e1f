use anyhow::{bail, Context};
use uuid::Uuid;

use crate::command_helpers::{
    load_recipe_file, parse_ingredient_lines, parse_ingredient_spec, seed_database,
};
use crate::constants::{MEAL_PLAN_NOT_FOUND_MSG, RECIPE_NOT_FOUND_MSG, SHOPPING_LIST_NOT_FOUND_MSG};
use crate::data_backend::MealStore;
use crate::data_types::cli_data_types::{
    Command, ListsCommand, PlanCommand, RecipeCommand, RecipeFields,
};
use crate::data_types::shopping_data_types::ShoppingListUpdate;
use crate::data_types::{Ingredient, MealPlanPayload, MealPlanUpdate, RecipePayload, RecipeUpdate};
use crate::render::{
    meal_plan_details, recipe_details, recipe_line, shopping_list_snapshot, shopping_list_table,
};
use crate::search::search_recipes;
use crate::shopping_list::{
    create_shopping_list, resolve_meal_plan_recipes, resolve_shopping_list, set_item_purchased,
};

pub type HandlerResult = anyhow::Result<String>;

pub fn handle_command(store: &mut dyn MealStore, command: Command) -> HandlerResult {
    match command {
        Command::Recipe(cmd) => recipe_cmd(store, cmd),
        Command::Plan(cmd) => plan_cmd(store, cmd),
        Command::Shopping { plan_id, json } => shopping_cmd(store, &plan_id, json),
        Command::Lists(cmd) => lists_cmd(store, cmd),
        Command::Search { query, ingredient } => {
            search_cmd(store, query.as_deref().unwrap_or(""), ingredient.as_deref())
        }
        Command::Seed => seed_cmd(store),
    }
}

// `None` when neither form of ingredient argument was given
fn ingredients_from_fields(fields: &RecipeFields) -> anyhow::Result<Option<Vec<Ingredient>>> {
    if let Some(lines) = &fields.ingredient_lines {
        return Ok(Some(parse_ingredient_lines(lines)));
    }
    if fields.ingredients.is_empty() {
        return Ok(None);
    }

    let ingredients = fields
        .ingredients
        .iter()
        .map(|spec| parse_ingredient_spec(spec))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Some(ingredients))
}

pub fn recipe_cmd(store: &mut dyn MealStore, cmd: RecipeCommand) -> HandlerResult {
    match cmd {
        RecipeCommand::Add {
            from_json: Some(path),
            ..
        } => {
            let mut msg = String::new();
            for payload in load_recipe_file(&path)? {
                let name = payload.name.clone();
                let recipe = store
                    .create_recipe(payload)
                    .with_context(|| format!("could not import recipe '{}'", name))?;
                msg += &format!("Imported {}\n", recipe_line(&recipe));
            }
            Ok(msg)
        }
        RecipeCommand::Add { fields, .. } => {
            let payload = RecipePayload {
                ingredients: ingredients_from_fields(&fields)?.unwrap_or_default(),
                name: fields.name.unwrap_or_default(),
                description: fields.description,
                instructions: fields.instructions.unwrap_or_default(),
                source_url: fields.source_url,
            };
            let recipe = store.create_recipe(payload)?;
            Ok(format!("Created recipe\n\n{}", recipe_details(&recipe)))
        }
        RecipeCommand::List => {
            let recipes = store.list_recipes()?;
            if recipes.is_empty() {
                return Ok("No recipes yet.\n".to_string());
            }
            Ok(recipes.iter().map(|r| recipe_line(r) + "\n").collect())
        }
        RecipeCommand::Show { id } => match store.get_recipe(&id)? {
            Some(recipe) => Ok(recipe_details(&recipe)),
            None => bail!("{}: {}", RECIPE_NOT_FOUND_MSG, id),
        },
        RecipeCommand::Edit { id, fields } => {
            let update = RecipeUpdate {
                ingredients: ingredients_from_fields(&fields)?,
                name: fields.name,
                description: fields.description,
                instructions: fields.instructions,
                source_url: fields.source_url,
            };
            match store.update_recipe(&id, update)? {
                Some(recipe) => Ok(format!("Updated recipe\n\n{}", recipe_details(&recipe))),
                None => bail!("{}: {}", RECIPE_NOT_FOUND_MSG, id),
            }
        }
        RecipeCommand::Delete { id } => {
            if !store.delete_recipe(&id)? {
                bail!("{}: {}", RECIPE_NOT_FOUND_MSG, id);
            }
            Ok(format!("Deleted recipe {}\n", id))
        }
    }
}

fn plan_details(store: &dyn MealStore, id: &Uuid) -> HandlerResult {
    let Some(plan) = store.get_meal_plan(id)? else {
        bail!("{}: {}", MEAL_PLAN_NOT_FOUND_MSG, id);
    };
    let recipes = resolve_meal_plan_recipes(store, id)?.unwrap_or_default();
    Ok(meal_plan_details(&plan, &recipes))
}

pub fn plan_cmd(store: &mut dyn MealStore, cmd: PlanCommand) -> HandlerResult {
    match cmd {
        PlanCommand::Create {
            name,
            description,
            recipes,
        } => {
            let plan = store.create_meal_plan(MealPlanPayload {
                name,
                description,
                recipe_ids: recipes,
            })?;
            Ok(format!("Created meal plan\n\n{}", plan_details(store, &plan.id)?))
        }
        PlanCommand::List => {
            let plans = store.list_meal_plans()?;
            if plans.is_empty() {
                return Ok("No meal plans yet.\n".to_string());
            }
            Ok(plans
                .iter()
                .map(|p| format!("{}  {} ({} recipes)\n", p.id, p.name, p.recipe_ids.len()))
                .collect())
        }
        PlanCommand::Show { id } => plan_details(store, &id),
        PlanCommand::Edit {
            id,
            name,
            description,
            recipes,
            clear_recipes,
        } => {
            let recipe_ids = if clear_recipes {
                Some(Vec::new())
            } else if recipes.is_empty() {
                None
            } else {
                Some(recipes)
            };
            let update = MealPlanUpdate {
                name,
                description,
                recipe_ids,
            };
            if store.update_meal_plan(&id, update)?.is_none() {
                bail!("{}: {}", MEAL_PLAN_NOT_FOUND_MSG, id);
            }
            Ok(format!("Updated meal plan\n\n{}", plan_details(store, &id)?))
        }
        PlanCommand::AddRecipe { plan_id, recipe_id } => {
            if store.get_recipe(&recipe_id)?.is_none() {
                bail!("{}: {}", RECIPE_NOT_FOUND_MSG, recipe_id);
            }
            if store.add_recipe_to_meal_plan(&plan_id, &recipe_id)?.is_none() {
                bail!("{}: {}", MEAL_PLAN_NOT_FOUND_MSG, plan_id);
            }
            plan_details(store, &plan_id)
        }
        PlanCommand::RemoveRecipe { plan_id, recipe_id } => {
            if store
                .remove_recipe_from_meal_plan(&plan_id, &recipe_id)?
                .is_none()
            {
                bail!("{}: {}", MEAL_PLAN_NOT_FOUND_MSG, plan_id);
            }
            plan_details(store, &plan_id)
        }
        PlanCommand::Delete { id } => {
            if !store.delete_meal_plan(&id)? {
                bail!("{}: {}", MEAL_PLAN_NOT_FOUND_MSG, id);
            }
            Ok(format!("Deleted meal plan {}\n", id))
        }
    }
}

pub fn shopping_cmd(store: &dyn MealStore, plan_id: &Uuid, json: bool) -> HandlerResult {
    let Some(plan) = store.get_meal_plan(plan_id)? else {
        bail!("{}: {}", MEAL_PLAN_NOT_FOUND_MSG, plan_id);
    };
    let Some(items) = resolve_shopping_list(store, plan_id)? else {
        bail!("{}: {}", MEAL_PLAN_NOT_FOUND_MSG, plan_id);
    };

    if json {
        return Ok(serde_json::to_string_pretty(&items)? + "\n");
    }
    Ok(shopping_list_table(
        &format!("Shopping list for {}", plan.name),
        &items,
    ))
}

pub fn lists_cmd(store: &mut dyn MealStore, cmd: ListsCommand) -> HandlerResult {
    match cmd {
        ListsCommand::Save { plan_id, name } => match create_shopping_list(store, &plan_id, name)? {
            Some(list) => Ok(format!("Saved\n\n{}", shopping_list_snapshot(&list))),
            None => bail!("{}: {}", MEAL_PLAN_NOT_FOUND_MSG, plan_id),
        },
        ListsCommand::Show { id, json } => {
            let Some(list) = store.get_shopping_list(&id)? else {
                bail!("{}: {}", SHOPPING_LIST_NOT_FOUND_MSG, id);
            };
            if json {
                return Ok(serde_json::to_string_pretty(&list)? + "\n");
            }
            Ok(shopping_list_snapshot(&list))
        }
        ListsCommand::All => {
            let lists = store.list_shopping_lists()?;
            if lists.is_empty() {
                return Ok("No saved shopping lists.\n".to_string());
            }
            Ok(lists
                .iter()
                .map(|l| {
                    let done = l.items.iter().filter(|i| i.purchased).count();
                    format!(
                        "{}  {} ({}/{} purchased, {})\n",
                        l.id,
                        l.name,
                        done,
                        l.items.len(),
                        l.created_at
                    )
                })
                .collect())
        }
        ListsCommand::Rename { id, name } => {
            let update = ShoppingListUpdate {
                name: Some(name),
                items: None,
            };
            match store.update_shopping_list(&id, update)? {
                Some(list) => Ok(format!("Renamed to '{}'\n", list.name)),
                None => bail!("{}: {}", SHOPPING_LIST_NOT_FOUND_MSG, id),
            }
        }
        ListsCommand::Check { id, index, undo } => {
            match set_item_purchased(store, &id, index, !undo)? {
                Some(list) => Ok(shopping_list_snapshot(&list)),
                None if store.get_shopping_list(&id)?.is_some() => {
                    bail!("shopping list {} has no item {}", id, index)
                }
                None => bail!("{}: {}", SHOPPING_LIST_NOT_FOUND_MSG, id),
            }
        }
        ListsCommand::Delete { id } => {
            if !store.delete_shopping_list(&id)? {
                bail!("{}: {}", SHOPPING_LIST_NOT_FOUND_MSG, id);
            }
            Ok(format!("Deleted shopping list {}\n", id))
        }
    }
}

pub fn search_cmd(store: &dyn MealStore, query: &str, ingredient: Option<&str>) -> HandlerResult {
    let hits = search_recipes(store, query, ingredient)?;
    if hits.is_empty() {
        return Ok("No matching recipes.\n".to_string());
    }
    Ok(hits.iter().map(|r| recipe_line(r) + "\n").collect())
}

pub fn seed_cmd(store: &mut dyn MealStore) -> HandlerResult {
    let created = seed_database(store)?;
    let mut msg = format!("Seeded {} recipes\n", created.len());
    for recipe in &created {
        msg += &format!("{}\n", recipe_line(recipe));
    }
    Ok(msg)
}
