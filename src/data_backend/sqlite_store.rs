use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};
use uuid::Uuid;

use super::{
    non_blank, now_timestamp, validate_meal_plan_name, validate_recipe_payload,
    validate_recipe_update, validate_shopping_list_name, MealStore,
};
use crate::data_types::shopping_data_types::{ShoppingList, ShoppingListItem, ShoppingListUpdate};
use crate::data_types::{
    Ingredient, MealPlan, MealPlanPayload, MealPlanUpdate, Recipe, RecipePayload, RecipeUpdate,
};
use crate::errors::StoreResult;

const SCHEMA: [&str; 6] = [
    "create table if not exists recipes (
        id text not null primary key,
        name text not null,
        description text,
        instructions text not null,
        source_url text,
        created_at text not null
    )",
    // ingredients live and die with their recipe
    "create table if not exists ingredients (
        recipe_id text not null,
        position integer not null,
        name text not null,
        quantity text not null,
        unit text not null,
        foreign key (recipe_id) references recipes(id) on delete cascade
    )",
    "create table if not exists meal_plans (
        id text not null primary key,
        name text not null,
        description text
    )",
    "create table if not exists mealplan_recipes (
        meal_plan_id text not null,
        recipe_id text not null,
        position integer not null,
        primary key (meal_plan_id, recipe_id),
        foreign key (meal_plan_id) references meal_plans(id) on delete cascade,
        foreign key (recipe_id) references recipes(id) on delete cascade
    )",
    "create table if not exists shopping_lists (
        id text not null primary key,
        name text not null,
        meal_plan_id text,
        created_at text not null,
        foreign key (meal_plan_id) references meal_plans(id) on delete set null
    )",
    "create table if not exists shopping_list_items (
        shopping_list_id text not null,
        position integer not null,
        name text not null,
        quantity_json text not null,
        unit text not null,
        purchased integer not null default 0,
        foreign key (shopping_list_id) references shopping_lists(id) on delete cascade
    )",
];

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(path: &Path) -> StoreResult<Self> {
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> StoreResult<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> StoreResult<Self> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        for stmt in SCHEMA {
            conn.execute(stmt, [])?;
        }
        Ok(SqliteStore { conn })
    }

    // takes the write lock up front, so what a mutation reads is still true when it writes
    fn write_tx(&mut self) -> rusqlite::Result<Transaction<'_>> {
        self.conn.transaction_with_behavior(TransactionBehavior::Immediate)
    }

    // reads spanning several tables see a single database state
    fn read_tx(&self) -> rusqlite::Result<Transaction<'_>> {
        self.conn.unchecked_transaction()
    }
}

struct RecipeRow {
    id: String,
    name: String,
    description: Option<String>,
    instructions: String,
    source_url: Option<String>,
    created_at: String,
}

fn recipe_row(row: &Row<'_>) -> rusqlite::Result<RecipeRow> {
    Ok(RecipeRow {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        instructions: row.get(3)?,
        source_url: row.get(4)?,
        created_at: row.get(5)?,
    })
}

fn load_ingredients(conn: &Connection, recipe_id: &str) -> rusqlite::Result<Vec<Ingredient>> {
    let mut stmt = conn.prepare_cached(
        "select name, quantity, unit from ingredients
            where recipe_id = ?1
            order by position",
    )?;
    let rows = stmt.query_map(params![recipe_id], |row| {
        Ok(Ingredient {
            name: row.get(0)?,
            quantity: row.get(1)?,
            unit: row.get(2)?,
        })
    })?;
    rows.collect()
}

fn write_ingredients(
    conn: &Connection,
    recipe_id: &str,
    ingredients: &[Ingredient],
) -> rusqlite::Result<()> {
    conn.execute(
        "delete from ingredients where recipe_id = ?1",
        params![recipe_id],
    )?;
    let mut stmt = conn.prepare_cached(
        "insert into ingredients (recipe_id, position, name, quantity, unit)
            values (?1, ?2, ?3, ?4, ?5)",
    )?;
    for (pos, ingredient) in ingredients.iter().enumerate() {
        stmt.execute(params![
            recipe_id,
            pos as i64,
            ingredient.name,
            ingredient.quantity,
            ingredient.unit
        ])?;
    }
    Ok(())
}

fn build_recipe(conn: &Connection, row: RecipeRow) -> StoreResult<Recipe> {
    let ingredients = load_ingredients(conn, &row.id)?;
    Ok(Recipe {
        id: Uuid::parse_str(&row.id)?,
        name: row.name,
        description: row.description,
        instructions: row.instructions,
        source_url: row.source_url,
        ingredients,
        created_at: row.created_at,
    })
}

fn build_recipes(conn: &Connection, rows: Vec<RecipeRow>) -> StoreResult<Vec<Recipe>> {
    rows.into_iter().map(|row| build_recipe(conn, row)).collect()
}

fn load_recipe(conn: &Connection, id: &Uuid) -> StoreResult<Option<Recipe>> {
    let row = conn
        .prepare_cached(
            "select id, name, description, instructions, source_url, created_at
                from recipes where id = ?1",
        )?
        .query_row(params![id.to_string()], recipe_row)
        .optional()?;

    row.map(|row| build_recipe(conn, row)).transpose()
}

fn load_all_recipes(conn: &Connection) -> StoreResult<Vec<Recipe>> {
    let rows = conn
        .prepare_cached(
            "select id, name, description, instructions, source_url, created_at
                from recipes order by rowid",
        )?
        .query_map([], recipe_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    build_recipes(conn, rows)
}

// the inner join leaves out references whose recipe row is gone
fn load_plan_recipes(conn: &Connection, plan_id: &str) -> StoreResult<Vec<Recipe>> {
    let rows = conn
        .prepare_cached(
            "select r.id, r.name, r.description, r.instructions, r.source_url, r.created_at
                from mealplan_recipes mr
                join recipes r on r.id = mr.recipe_id
                where mr.meal_plan_id = ?1
                order by mr.position",
        )?
        .query_map(params![plan_id], recipe_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    build_recipes(conn, rows)
}

fn recipe_exists(conn: &Connection, id: &str) -> rusqlite::Result<bool> {
    conn.prepare_cached("select 1 from recipes where id = ?1")?
        .exists(params![id])
}

fn meal_plan_exists(conn: &Connection, id: &str) -> rusqlite::Result<bool> {
    conn.prepare_cached("select 1 from meal_plans where id = ?1")?
        .exists(params![id])
}

fn load_plan_recipe_ids(conn: &Connection, plan_id: &str) -> StoreResult<Vec<Uuid>> {
    let mut stmt = conn.prepare_cached(
        "select recipe_id from mealplan_recipes
            where meal_plan_id = ?1
            order by position",
    )?;
    let ids = stmt
        .query_map(params![plan_id], |row| row.get::<_, String>(0))?
        .collect::<rusqlite::Result<Vec<String>>>()?;

    let mut recipe_ids = Vec::with_capacity(ids.len());
    for id in ids {
        recipe_ids.push(Uuid::parse_str(&id)?);
    }
    Ok(recipe_ids)
}

// replaces the plan's references, dropping unknown recipes and duplicates
fn write_plan_recipe_ids(
    conn: &Connection,
    plan_id: &str,
    recipe_ids: &[Uuid],
) -> rusqlite::Result<()> {
    conn.execute(
        "delete from mealplan_recipes where meal_plan_id = ?1",
        params![plan_id],
    )?;
    let mut stmt = conn.prepare_cached(
        "insert or ignore into mealplan_recipes (meal_plan_id, recipe_id, position)
            values (?1, ?2, ?3)",
    )?;
    for (pos, recipe_id) in recipe_ids.iter().enumerate() {
        let recipe_id = recipe_id.to_string();
        if !recipe_exists(conn, &recipe_id)? {
            log::warn!("meal plan {}: skipping unknown recipe {}", plan_id, recipe_id);
            continue;
        }
        stmt.execute(params![plan_id, recipe_id, pos as i64])?;
    }
    Ok(())
}

fn load_meal_plan(conn: &Connection, id: &Uuid) -> StoreResult<Option<MealPlan>> {
    let key = id.to_string();
    let row = conn
        .prepare_cached("select name, description from meal_plans where id = ?1")?
        .query_row(params![key], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, Option<String>>(1)?))
        })
        .optional()?;

    let Some((name, description)) = row else {
        return Ok(None);
    };
    Ok(Some(MealPlan {
        id: *id,
        name,
        description,
        recipe_ids: load_plan_recipe_ids(conn, &key)?,
    }))
}

fn write_list_items(
    conn: &Connection,
    list_id: &str,
    items: &[ShoppingListItem],
) -> StoreResult<()> {
    conn.execute(
        "delete from shopping_list_items where shopping_list_id = ?1",
        params![list_id],
    )?;
    let mut stmt = conn.prepare_cached(
        "insert into shopping_list_items
            (shopping_list_id, position, name, quantity_json, unit, purchased)
            values (?1, ?2, ?3, ?4, ?5, ?6)",
    )?;
    for (pos, item) in items.iter().enumerate() {
        stmt.execute(params![
            list_id,
            pos as i64,
            item.name,
            serde_json::to_string(&item.quantity)?,
            item.unit,
            item.purchased
        ])?;
    }
    Ok(())
}

fn load_list_items(conn: &Connection, list_id: &str) -> StoreResult<Vec<ShoppingListItem>> {
    let mut stmt = conn.prepare_cached(
        "select name, quantity_json, unit, purchased from shopping_list_items
            where shopping_list_id = ?1
            order by position",
    )?;
    let rows = stmt
        .query_map(params![list_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, bool>(3)?,
            ))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut items = Vec::with_capacity(rows.len());
    for (name, quantity_json, unit, purchased) in rows {
        items.push(ShoppingListItem {
            name,
            quantity: serde_json::from_str(&quantity_json)?,
            unit,
            purchased,
        });
    }
    Ok(items)
}

fn load_shopping_list(conn: &Connection, id: &Uuid) -> StoreResult<Option<ShoppingList>> {
    let key = id.to_string();
    let row = conn
        .prepare_cached("select name, meal_plan_id, created_at from shopping_lists where id = ?1")?
        .query_row(params![key], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, Option<String>>(1)?,
                row.get::<_, String>(2)?,
            ))
        })
        .optional()?;

    let Some((name, meal_plan_id, created_at)) = row else {
        return Ok(None);
    };
    Ok(Some(ShoppingList {
        id: *id,
        name,
        meal_plan_id: meal_plan_id.as_deref().map(Uuid::parse_str).transpose()?,
        created_at,
        items: load_list_items(conn, &key)?,
    }))
}

fn insert_list(conn: &Connection, list: &mut ShoppingList) -> StoreResult<()> {
    let key = list.id.to_string();
    if let Some(plan_id) = list.meal_plan_id {
        if !meal_plan_exists(conn, &plan_id.to_string())? {
            log::warn!("shopping list {}: meal plan {} is gone", key, plan_id);
            list.meal_plan_id = None;
        }
    }
    conn.execute(
        "insert into shopping_lists (id, name, meal_plan_id, created_at)
            values (?1, ?2, ?3, ?4)",
        params![
            key,
            list.name,
            list.meal_plan_id.map(|id| id.to_string()),
            list.created_at
        ],
    )?;
    write_list_items(conn, &key, &list.items)
}

impl MealStore for SqliteStore {
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
        let id = recipe.id.to_string();

        let tx = self.write_tx()?;
        tx.execute(
            "insert into recipes (id, name, description, instructions, source_url, created_at)
                values (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                id,
                recipe.name,
                recipe.description,
                recipe.instructions,
                recipe.source_url,
                recipe.created_at
            ],
        )?;
        write_ingredients(&tx, &id, &recipe.ingredients)?;
        tx.commit()?;

        log::debug!("created recipe {} ({})", recipe.name, id);
        Ok(recipe)
    }

    fn get_recipe(&self, id: &Uuid) -> StoreResult<Option<Recipe>> {
        let tx = self.read_tx()?;
        let recipe = load_recipe(&tx, id)?;
        Ok(recipe)
    }

    fn list_recipes(&self) -> StoreResult<Vec<Recipe>> {
        let tx = self.read_tx()?;
        let recipes = load_all_recipes(&tx)?;
        Ok(recipes)
    }

    fn update_recipe(&mut self, id: &Uuid, update: RecipeUpdate) -> StoreResult<Option<Recipe>> {
        validate_recipe_update(&update)?;

        let tx = self.write_tx()?;
        let Some(mut recipe) = load_recipe(&tx, id)? else {
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

        let key = id.to_string();
        tx.execute(
            "update recipes
                set name = ?2, description = ?3, instructions = ?4, source_url = ?5
                where id = ?1",
            params![
                key,
                recipe.name,
                recipe.description,
                recipe.instructions,
                recipe.source_url
            ],
        )?;
        if let Some(ingredients) = update.ingredients {
            write_ingredients(&tx, &key, &ingredients)?;
            recipe.ingredients = ingredients;
        }
        tx.commit()?;

        Ok(Some(recipe))
    }

    fn delete_recipe(&mut self, id: &Uuid) -> StoreResult<bool> {
        let tx = self.write_tx()?;
        // ingredients and meal plan references cascade
        let deleted = tx.execute("delete from recipes where id = ?1", params![id.to_string()])?;
        tx.commit()?;

        Ok(deleted > 0)
    }

    fn create_meal_plan(&mut self, payload: MealPlanPayload) -> StoreResult<MealPlan> {
        validate_meal_plan_name(&payload.name)?;

        let id = Uuid::new_v4();
        let key = id.to_string();

        let tx = self.write_tx()?;
        tx.execute(
            "insert into meal_plans (id, name, description) values (?1, ?2, ?3)",
            params![key, payload.name, non_blank(payload.description.clone())],
        )?;
        write_plan_recipe_ids(&tx, &key, &payload.recipe_ids)?;
        let recipe_ids = load_plan_recipe_ids(&tx, &key)?;
        tx.commit()?;

        Ok(MealPlan {
            id,
            name: payload.name,
            description: non_blank(payload.description),
            recipe_ids,
        })
    }

    fn get_meal_plan(&self, id: &Uuid) -> StoreResult<Option<MealPlan>> {
        let tx = self.read_tx()?;
        let plan = load_meal_plan(&tx, id)?;
        Ok(plan)
    }

    fn list_meal_plans(&self) -> StoreResult<Vec<MealPlan>> {
        let tx = self.read_tx()?;
        let ids = tx
            .prepare_cached("select id from meal_plans order by rowid")?
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;

        let mut plans = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(plan) = load_meal_plan(&tx, &Uuid::parse_str(&id)?)? {
                plans.push(plan);
            }
        }
        Ok(plans)
    }

    fn get_meal_plan_with_recipes(
        &self,
        id: &Uuid,
    ) -> StoreResult<Option<(MealPlan, Vec<Recipe>)>> {
        let tx = self.read_tx()?;
        let Some(plan) = load_meal_plan(&tx, id)? else {
            return Ok(None);
        };
        let recipes = load_plan_recipes(&tx, &id.to_string())?;
        if recipes.len() < plan.recipe_ids.len() {
            log::debug!(
                "meal plan {}: skipped {} dangling recipes",
                plan.name,
                plan.recipe_ids.len() - recipes.len()
            );
        }
        Ok(Some((plan, recipes)))
    }

    fn update_meal_plan(
        &mut self,
        id: &Uuid,
        update: MealPlanUpdate,
    ) -> StoreResult<Option<MealPlan>> {
        if let Some(name) = &update.name {
            validate_meal_plan_name(name)?;
        }

        let tx = self.write_tx()?;
        let Some(mut plan) = load_meal_plan(&tx, id)? else {
            return Ok(None);
        };

        if let Some(name) = update.name {
            plan.name = name;
        }
        if let Some(description) = update.description {
            plan.description = non_blank(Some(description));
        }

        let key = id.to_string();
        tx.execute(
            "update meal_plans set name = ?2, description = ?3 where id = ?1",
            params![key, plan.name, plan.description],
        )?;
        if let Some(recipe_ids) = update.recipe_ids {
            write_plan_recipe_ids(&tx, &key, &recipe_ids)?;
            plan.recipe_ids = load_plan_recipe_ids(&tx, &key)?;
        }
        tx.commit()?;

        Ok(Some(plan))
    }

    fn delete_meal_plan(&mut self, id: &Uuid) -> StoreResult<bool> {
        let tx = self.write_tx()?;
        let deleted = tx.execute(
            "delete from meal_plans where id = ?1",
            params![id.to_string()],
        )?;
        tx.commit()?;

        Ok(deleted > 0)
    }

    fn add_recipe_to_meal_plan(
        &mut self,
        plan_id: &Uuid,
        recipe_id: &Uuid,
    ) -> StoreResult<Option<MealPlan>> {
        let plan_key = plan_id.to_string();
        let recipe_key = recipe_id.to_string();

        let tx = self.write_tx()?;
        if !meal_plan_exists(&tx, &plan_key)? {
            return Ok(None);
        }
        if recipe_exists(&tx, &recipe_key)? {
            tx.execute(
                "insert or ignore into mealplan_recipes (meal_plan_id, recipe_id, position)
                    select ?1, ?2, coalesce(max(position) + 1, 0)
                    from mealplan_recipes where meal_plan_id = ?1",
                params![plan_key, recipe_key],
            )?;
        } else {
            log::warn!("meal plan {}: unknown recipe {}", plan_key, recipe_key);
        }
        let plan = load_meal_plan(&tx, plan_id)?;
        tx.commit()?;

        Ok(plan)
    }

    fn remove_recipe_from_meal_plan(
        &mut self,
        plan_id: &Uuid,
        recipe_id: &Uuid,
    ) -> StoreResult<Option<MealPlan>> {
        let plan_key = plan_id.to_string();

        let tx = self.write_tx()?;
        if !meal_plan_exists(&tx, &plan_key)? {
            return Ok(None);
        }
        tx.execute(
            "delete from mealplan_recipes where meal_plan_id = ?1 and recipe_id = ?2",
            params![plan_key, recipe_id.to_string()],
        )?;
        let plan = load_meal_plan(&tx, plan_id)?;
        tx.commit()?;

        Ok(plan)
    }

    fn insert_shopping_list(&mut self, mut list: ShoppingList) -> StoreResult<ShoppingList> {
        validate_shopping_list_name(&list.name)?;

        let tx = self.write_tx()?;
        insert_list(&tx, &mut list)?;
        tx.commit()?;

        Ok(list)
    }

    fn insert_meal_plan_snapshot(
        &mut self,
        meal_plan_id: &Uuid,
        build: &dyn Fn(&MealPlan, &[Recipe]) -> ShoppingList,
    ) -> StoreResult<Option<ShoppingList>> {
        let tx = self.write_tx()?;
        let Some(plan) = load_meal_plan(&tx, meal_plan_id)? else {
            return Ok(None);
        };
        let recipes = load_plan_recipes(&tx, &meal_plan_id.to_string())?;

        let mut list = build(&plan, &recipes);
        validate_shopping_list_name(&list.name)?;
        insert_list(&tx, &mut list)?;
        tx.commit()?;

        Ok(Some(list))
    }

    fn get_shopping_list(&self, id: &Uuid) -> StoreResult<Option<ShoppingList>> {
        let tx = self.read_tx()?;
        let list = load_shopping_list(&tx, id)?;
        Ok(list)
    }

    fn list_shopping_lists(&self) -> StoreResult<Vec<ShoppingList>> {
        let tx = self.read_tx()?;
        let ids = tx
            .prepare_cached("select id from shopping_lists order by rowid")?
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;

        let mut lists = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(list) = load_shopping_list(&tx, &Uuid::parse_str(&id)?)? {
                lists.push(list);
            }
        }
        Ok(lists)
    }

    fn update_shopping_list(
        &mut self,
        id: &Uuid,
        update: ShoppingListUpdate,
    ) -> StoreResult<Option<ShoppingList>> {
        if let Some(name) = &update.name {
            validate_shopping_list_name(name)?;
        }

        let tx = self.write_tx()?;
        let Some(mut list) = load_shopping_list(&tx, id)? else {
            return Ok(None);
        };

        let key = id.to_string();
        if let Some(name) = update.name {
            tx.execute(
                "update shopping_lists set name = ?2 where id = ?1",
                params![key, name],
            )?;
            list.name = name;
        }
        if let Some(items) = update.items {
            write_list_items(&tx, &key, &items)?;
            list.items = items;
        }
        tx.commit()?;

        Ok(Some(list))
    }

    fn set_list_item_purchased(
        &mut self,
        list_id: &Uuid,
        index: usize,
        purchased: bool,
    ) -> StoreResult<Option<ShoppingList>> {
        let tx = self.write_tx()?;
        let Some(mut list) = load_shopping_list(&tx, list_id)? else {
            return Ok(None);
        };
        let Some(item) = list.items.get_mut(index) else {
            return Ok(None);
        };
        item.purchased = purchased;

        // item positions are their list indices
        tx.execute(
            "update shopping_list_items set purchased = ?3
                where shopping_list_id = ?1 and position = ?2",
            params![list_id.to_string(), index as i64, purchased],
        )?;
        tx.commit()?;

        Ok(Some(list))
    }

    fn delete_shopping_list(&mut self, id: &Uuid) -> StoreResult<bool> {
        let tx = self.write_tx()?;
        let deleted = tx.execute(
            "delete from shopping_lists where id = ?1",
            params![id.to_string()],
        )?;
        tx.commit()?;

        Ok(deleted > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::data_types::shopping_data_types::Quantity;
    use crate::errors::StoreError;
    use crate::shopping_list::{
        create_shopping_list, resolve_meal_plan_recipes, resolve_shopping_list,
    };

    fn recipe(store: &mut SqliteStore, name: &str, ingredients: Vec<Ingredient>) -> Recipe {
        store
            .create_recipe(RecipePayload {
                name: name.to_string(),
                instructions: "Cook it.".to_string(),
                ingredients,
                ..Default::default()
            })
            .unwrap()
    }

    fn plan(store: &mut SqliteStore, recipe_ids: Vec<Uuid>) -> Uuid {
        store
            .create_meal_plan(MealPlanPayload {
                name: "Week".to_string(),
                description: None,
                recipe_ids,
            })
            .unwrap()
            .id
    }

    #[test]
    fn test_data_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("meals.sqlite");

        let (recipe_id, plan_id) = {
            let mut store = SqliteStore::open(&path).unwrap();
            let recipe = store
                .create_recipe(RecipePayload {
                    name: "Omelette".to_string(),
                    instructions: "Whisk and fry.".to_string(),
                    ingredients: vec![
                        Ingredient::new("Egg", "3", "pc"),
                        Ingredient::new("Salt", "to taste", ""),
                    ],
                    ..Default::default()
                })
                .unwrap();
            let plan = store
                .create_meal_plan(MealPlanPayload {
                    name: "Breakfast".to_string(),
                    description: None,
                    recipe_ids: vec![recipe.id],
                })
                .unwrap();
            (recipe.id, plan.id)
        };

        let store = SqliteStore::open(&path).unwrap();
        let recipe = store.get_recipe(&recipe_id).unwrap().unwrap();
        assert_eq!(recipe.name, "Omelette");
        assert_eq!(
            recipe.ingredients,
            vec![
                Ingredient::new("Egg", "3", "pc"),
                Ingredient::new("Salt", "to taste", ""),
            ]
        );
        let plan = store.get_meal_plan(&plan_id).unwrap().unwrap();
        assert_eq!(plan.recipe_ids, vec![recipe_id]);
    }

    #[test]
    fn test_recipe_delete_cascades_to_ingredients() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let recipe = store
            .create_recipe(RecipePayload {
                name: "Salad".to_string(),
                instructions: "Toss.".to_string(),
                ingredients: vec![Ingredient::new("Lettuce", "1", "head")],
                ..Default::default()
            })
            .unwrap();
        store.delete_recipe(&recipe.id).unwrap();

        let left: i64 = store
            .conn
            .query_row("select count(*) from ingredients", [], |row| row.get(0))
            .unwrap();
        assert_eq!(left, 0);
    }

    #[test]
    fn test_failed_item_write_rolls_back() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store
            .conn
            .execute_batch("drop table shopping_list_items")
            .unwrap();

        let list = ShoppingList {
            id: Uuid::new_v4(),
            name: "Groceries".to_string(),
            meal_plan_id: None,
            created_at: now_timestamp(),
            items: vec![ShoppingListItem {
                name: "Egg".to_string(),
                quantity: Quantity::Numeric(4.0),
                unit: "pc".to_string(),
                purchased: false,
            }],
        };
        assert!(store.insert_shopping_list(list.clone()).is_err());

        // the list header must not outlive the failed item write
        let lists: i64 = store
            .conn
            .query_row(
                "select count(*) from shopping_lists where id = ?1",
                params![list.id.to_string()],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(lists, 0);
    }

    #[test]
    fn test_resolver_skips_rows_deleted_behind_its_back() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let pancakes = recipe(
            &mut store,
            "Pancakes",
            vec![Ingredient::new("Egg", "1", "pc"), Ingredient::new("Flour", "2", "cup")],
        );
        let omelette = recipe(&mut store, "Omelette", vec![Ingredient::new("Egg", "3", "pc")]);
        let mp = plan(&mut store, vec![pancakes.id, omelette.id]);

        // without the cascade the plan keeps pointing at the vanished recipe
        store.conn.pragma_update(None, "foreign_keys", "OFF").unwrap();
        store
            .conn
            .execute(
                "delete from recipes where id = ?1",
                params![omelette.id.to_string()],
            )
            .unwrap();
        let stale = store.get_meal_plan(&mp).unwrap().unwrap();
        assert_eq!(stale.recipe_ids, vec![pancakes.id, omelette.id]);

        let recipes = resolve_meal_plan_recipes(&store, &mp).unwrap().unwrap();
        assert_eq!(recipes, vec![pancakes.clone()]);

        let items = resolve_shopping_list(&store, &mp).unwrap().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].name, "Egg");
        assert_eq!(items[0].quantity, Quantity::Numeric(1.0));

        let list = create_shopping_list(&mut store, &mp, None).unwrap().unwrap();
        assert_eq!(list.items, items);
    }

    #[test]
    fn test_mutation_takes_write_lock_before_reading() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("meals.sqlite");
        let mut store = SqliteStore::open(&path).unwrap();
        store.conn.busy_timeout(Duration::ZERO).unwrap();
        let omelette = recipe(&mut store, "Omelette", vec![Ingredient::new("Egg", "3", "pc")]);

        let other = Connection::open(&path).unwrap();
        other.execute_batch("begin immediate").unwrap();

        // reads still go through while another writer holds the lock
        assert!(store.get_recipe(&omelette.id).unwrap().is_some());

        let rename = || RecipeUpdate {
            name: Some("Frittata".to_string()),
            ..Default::default()
        };
        let blocked = store.update_recipe(&omelette.id, rename());
        assert!(matches!(blocked, Err(StoreError::Db(_))));
        // even a lookup that finds nothing waits for the lock
        assert!(store.update_recipe(&Uuid::new_v4(), rename()).is_err());
        assert!(store.conn.is_autocommit());

        other.execute_batch("rollback").unwrap();
        let renamed = store.update_recipe(&omelette.id, rename()).unwrap().unwrap();
        assert_eq!(renamed.name, "Frittata");
        assert_eq!(renamed.ingredients, omelette.ingredients);
    }

    #[test]
    fn test_missing_rows_end_their_transaction() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let missing = Uuid::new_v4();

        assert!(store
            .update_recipe(&missing, RecipeUpdate::default())
            .unwrap()
            .is_none());
        assert!(store
            .update_meal_plan(&missing, MealPlanUpdate::default())
            .unwrap()
            .is_none());
        assert!(store
            .update_shopping_list(&missing, ShoppingListUpdate::default())
            .unwrap()
            .is_none());
        assert!(store
            .add_recipe_to_meal_plan(&missing, &missing)
            .unwrap()
            .is_none());
        assert!(store.set_list_item_purchased(&missing, 0, true).unwrap().is_none());
        assert!(store.conn.is_autocommit());

        // the connection is free for the next write
        recipe(&mut store, "Toast", vec![]);
    }

    #[test]
    fn test_purchase_toggle_touches_one_row() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let pancakes = recipe(
            &mut store,
            "Pancakes",
            vec![
                Ingredient::new("Egg", "1", "pc"),
                Ingredient::new("Flour", "2", "cup"),
                Ingredient::new("Salt", "a pinch", ""),
            ],
        );
        let mp = plan(&mut store, vec![pancakes.id]);
        let list = create_shopping_list(&mut store, &mp, None).unwrap().unwrap();

        let toggled = store.set_list_item_purchased(&list.id, 2, true).unwrap().unwrap();
        assert_eq!(
            toggled.items.iter().map(|i| i.purchased).collect::<Vec<_>>(),
            vec![false, false, true]
        );
        assert_eq!(store.get_shopping_list(&list.id).unwrap().unwrap(), toggled);
        assert!(store.set_list_item_purchased(&list.id, 3, true).unwrap().is_none());
    }

    #[test]
    fn test_oversized_quantities_survive_a_saved_list() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("meals.sqlite");
        let huge = format!("1{}", "0".repeat(400));
        let big = "9".repeat(308);

        let list_id = {
            let mut store = SqliteStore::open(&path).unwrap();
            let rice = recipe(
                &mut store,
                "Rice",
                vec![
                    Ingredient::new("Rice", &huge, "g"),
                    Ingredient::new("Beans", &big, "g"),
                    Ingredient::new("Beans", &big, "g"),
                    Ingredient::new("Salt", "0.00001", "kg"),
                    Ingredient::new("Salt", "a pinch", "kg"),
                ],
            );
            let mp = plan(&mut store, vec![rice.id]);
            create_shopping_list(&mut store, &mp, None).unwrap().unwrap().id
        };

        let store = SqliteStore::open(&path).unwrap();
        let list = store.get_shopping_list(&list_id).unwrap().unwrap();
        assert_eq!(list.items[0].quantity, Quantity::Text(huge));
        assert!(matches!(
            list.items[1].quantity,
            Quantity::Mixed { subtotal: Some(_), ref texts } if texts == &vec![big.clone()]
        ));
        assert_eq!(list.items[2].quantity.to_string(), "0.00001, a pinch");
        assert_eq!(store.list_shopping_lists().unwrap(), vec![list]);
    }
}
