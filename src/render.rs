use crate::constants::{EMPTY_LIST_MSG, TABLE_HEADERS};
use crate::data_types::shopping_data_types::{ShoppingList, ShoppingListItem};
use crate::data_types::{MealPlan, Recipe};

fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (col, cell) in row.iter().enumerate() {
            widths[col] = widths[col].max(cell.chars().count());
        }
    }

    let line = |cells: Vec<&str>| -> String {
        let padded: Vec<String> = cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
            .collect();
        padded.join(" | ").trim_end().to_string() + "\n"
    };

    let mut msg = line(headers.to_vec());
    msg += &widths
        .iter()
        .map(|w| "-".repeat(*w))
        .collect::<Vec<_>>()
        .join("-+-");
    msg += "\n";
    for row in rows {
        msg += &line(row.iter().map(String::as_str).collect());
    }
    msg
}

fn item_cells(item: &ShoppingListItem) -> Vec<String> {
    // Display joins list quantities with ", "
    vec![item.name.clone(), item.quantity.to_string(), item.unit.clone()]
}

/// Ingredient / Quantity / Unit table under a title line.
pub fn shopping_list_table(title: &str, items: &[ShoppingListItem]) -> String {
    let mut msg = format!("{}\n\n", title);
    if items.is_empty() {
        msg += EMPTY_LIST_MSG;
        msg += "\n";
        return msg;
    }

    let rows: Vec<Vec<String>> = items.iter().map(item_cells).collect();
    msg += &render_table(&TABLE_HEADERS, &rows);
    msg
}

/// Stored list with item numbers and purchase marks, as used by `lists check`.
pub fn shopping_list_snapshot(list: &ShoppingList) -> String {
    let mut msg = format!("{}\n", list.name);
    msg += &format!("id: {}\n", list.id);
    msg += &format!("created: {}\n", list.created_at);
    match list.meal_plan_id {
        Some(plan_id) => msg += &format!("meal plan: {}\n", plan_id),
        None => msg += "meal plan: (deleted)\n",
    }
    msg += "\n";

    if list.items.is_empty() {
        msg += EMPTY_LIST_MSG;
        msg += "\n";
        return msg;
    }

    let mut headers = vec!["#", "Done"];
    headers.extend(TABLE_HEADERS);
    let rows: Vec<Vec<String>> = list
        .items
        .iter()
        .enumerate()
        .map(|(idx, item)| {
            let mut row = vec![
                idx.to_string(),
                if item.purchased { "[x]" } else { "[ ]" }.to_string(),
            ];
            row.extend(item_cells(item));
            row
        })
        .collect();
    msg += &render_table(&headers, &rows);
    msg
}

/// One line per recipe for listings.
pub fn recipe_line(recipe: &Recipe) -> String {
    match &recipe.description {
        Some(description) => format!("{}  {} - {}", recipe.id, recipe.name, description),
        None => format!("{}  {}", recipe.id, recipe.name),
    }
}

pub fn recipe_details(recipe: &Recipe) -> String {
    let mut msg = format!("{}\n", recipe.name);
    msg += &format!("id: {}\n", recipe.id);
    if let Some(description) = &recipe.description {
        msg += &format!("{}\n", description);
    }
    if let Some(url) = &recipe.source_url {
        msg += &format!("source: {}\n", url);
    }

    msg += "\nIngredients:\n";
    if recipe.ingredients.is_empty() {
        msg += "  (none)\n";
    }
    for ingredient in &recipe.ingredients {
        let amount = [ingredient.quantity.trim(), ingredient.unit.trim()]
            .iter()
            .filter(|s| !s.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join(" ");
        if amount.is_empty() {
            msg += &format!("  • {}\n", ingredient.name);
        } else {
            msg += &format!("  • {} ({})\n", ingredient.name, amount);
        }
    }

    msg += &format!("\nInstructions:\n{}\n", recipe.instructions);
    msg
}

/// Plan header plus the recipes that still resolve.
pub fn meal_plan_details(plan: &MealPlan, recipes: &[Recipe]) -> String {
    let mut msg = format!("{}\n", plan.name);
    msg += &format!("id: {}\n", plan.id);
    if let Some(description) = &plan.description {
        msg += &format!("{}\n", description);
    }

    msg += "\nRecipes:\n";
    if recipes.is_empty() {
        msg += "  (none)\n";
    }
    for recipe in recipes {
        msg += &format!("  • {} ({})\n", recipe.name, recipe.id);
    }
    msg
}
