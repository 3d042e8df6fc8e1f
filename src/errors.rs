use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    #[error("recipe name is required")]
    MissingRecipeName,
    #[error("recipe instructions are required")]
    MissingInstructions,
    #[error("meal plan name is required")]
    MissingMealPlanName,
    #[error("shopping list name is required")]
    MissingShoppingListName,
    #[error("invalid ingredient '{0}', expected 'name;quantity;unit'")]
    InvalidIngredientSpec(String),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("database error: {0}")]
    Db(#[from] rusqlite::Error),
    #[error("stored quantity could not be (de)serialized: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("stored id is not a valid uuid: {0}")]
    CorruptId(#[from] uuid::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;
