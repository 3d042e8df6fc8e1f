use std::path::PathBuf;

use clap::{Args, Subcommand};
use uuid::Uuid;

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create, show, edit and delete recipes
    #[command(subcommand)]
    Recipe(RecipeCommand),
    /// Group recipes into meal plans
    #[command(subcommand)]
    Plan(PlanCommand),
    /// Print the aggregated shopping list of a meal plan
    Shopping {
        plan_id: Uuid,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Saved shopping list snapshots
    #[command(subcommand)]
    Lists(ListsCommand),
    /// Search recipes by name, description or ingredient
    Search {
        query: Option<String>,
        /// Only recipes with an ingredient containing this text
        #[arg(short, long)]
        ingredient: Option<String>,
    },
    /// Add the demo recipes
    Seed,
}

/// Recipe fields shared by `add` and `edit`. Unset fields are left alone on edit.
#[derive(Args, Debug, Clone, Default)]
pub struct RecipeFields {
    #[arg(short, long)]
    pub name: Option<String>,
    #[arg(short, long)]
    pub description: Option<String>,
    #[arg(long)]
    pub instructions: Option<String>,
    #[arg(long)]
    pub source_url: Option<String>,
    /// Ingredient as 'name;quantity;unit', may be repeated
    #[arg(short, long = "ingredient")]
    pub ingredients: Vec<String>,
    /// Ingredient names, one per line
    #[arg(long, conflicts_with = "ingredients")]
    pub ingredient_lines: Option<String>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum RecipeCommand {
    Add {
        #[command(flatten)]
        fields: RecipeFields,
        /// Import recipes from a JSON file (one object or a list)
        #[arg(long, conflicts_with_all = ["name", "instructions"])]
        from_json: Option<PathBuf>,
    },
    List,
    Show {
        id: Uuid,
    },
    Edit {
        id: Uuid,
        #[command(flatten)]
        fields: RecipeFields,
    },
    Delete {
        id: Uuid,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum PlanCommand {
    Create {
        name: String,
        #[arg(short, long)]
        description: Option<String>,
        /// Recipe id, may be repeated
        #[arg(short, long = "recipe")]
        recipes: Vec<Uuid>,
    },
    List,
    Show {
        id: Uuid,
    },
    Edit {
        id: Uuid,
        #[arg(short, long)]
        name: Option<String>,
        #[arg(short, long)]
        description: Option<String>,
        /// Replaces the plan's recipes, may be repeated
        #[arg(short, long = "recipe")]
        recipes: Vec<Uuid>,
        /// Remove all recipes from the plan
        #[arg(long, conflicts_with = "recipes")]
        clear_recipes: bool,
    },
    AddRecipe {
        plan_id: Uuid,
        recipe_id: Uuid,
    },
    RemoveRecipe {
        plan_id: Uuid,
        recipe_id: Uuid,
    },
    Delete {
        id: Uuid,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum ListsCommand {
    /// Save the current shopping list of a meal plan
    Save {
        plan_id: Uuid,
        /// Defaults to '<plan name> shopping list'
        #[arg(short, long)]
        name: Option<String>,
    },
    Show {
        id: Uuid,
        #[arg(long)]
        json: bool,
    },
    All,
    Rename {
        id: Uuid,
        name: String,
    },
    /// Mark an item (by number) as purchased
    Check {
        id: Uuid,
        index: usize,
        /// Unmark instead
        #[arg(long)]
        undo: bool,
    },
    Delete {
        id: Uuid,
    },
}
