pub const DEFAULT_DB: &str = "meal_planner.sqlite";
pub const DB_ENV: &str = "MEAL_PLANNER_DB";

pub const EMPTY_LIST_MSG: &str = "This shopping list is empty.";
pub const RECIPE_NOT_FOUND_MSG: &str = "Recipe not found";
pub const MEAL_PLAN_NOT_FOUND_MSG: &str = "Meal plan not found";
pub const SHOPPING_LIST_NOT_FOUND_MSG: &str = "Shopping list not found";

// column headers of the rendered shopping list
pub const TABLE_HEADERS: [&str; 3] = ["Ingredient", "Quantity", "Unit"];
