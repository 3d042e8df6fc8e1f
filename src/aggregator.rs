use std::collections::HashMap;
use std::time::Instant;

use crate::data_types::shopping_data_types::{parse_numeric, Quantity, ShoppingListItem};
use crate::data_types::Ingredient;

impl Quantity {
    /// Quantity of the first ingredient seen for a group.
    pub fn from_raw(raw: &str) -> Self {
        match parse_numeric(raw) {
            Some(n) => Quantity::Numeric(n),
            None => Quantity::Text(raw.to_string()),
        }
    }

    /// Folds one more raw quantity into the group. Never fails: anything that
    /// does not parse as a number is kept as text, and so is a number whose
    /// sum with the group would leave the finite range.
    pub fn merge(self, raw: &str) -> Self {
        let incoming = parse_numeric(raw);

        match (self, incoming) {
            (Quantity::Numeric(acc), Some(n)) => match finite_sum(acc, n) {
                Some(sum) => Quantity::Numeric(sum),
                None => Quantity::Mixed {
                    subtotal: Some(acc),
                    texts: vec![raw.to_string()],
                },
            },
            (Quantity::Numeric(acc), None) => Quantity::Mixed {
                subtotal: Some(acc),
                texts: vec![raw.to_string()],
            },
            (Quantity::Text(prev), Some(n)) => Quantity::Mixed {
                subtotal: Some(n),
                texts: vec![prev],
            },
            (Quantity::Text(prev), None) => Quantity::Mixed {
                subtotal: None,
                texts: vec![prev, raw.to_string()],
            },
            (Quantity::Mixed { subtotal, mut texts }, Some(n)) => {
                match finite_sum(subtotal.unwrap_or(0.0), n) {
                    Some(sum) => Quantity::Mixed {
                        subtotal: Some(sum),
                        texts,
                    },
                    None => {
                        texts.push(raw.to_string());
                        Quantity::Mixed { subtotal, texts }
                    }
                }
            }
            (Quantity::Mixed { subtotal, mut texts }, None) => {
                texts.push(raw.to_string());
                Quantity::Mixed { subtotal, texts }
            }
        }
    }
}

fn finite_sum(a: f64, b: f64) -> Option<f64> {
    Some(a + b).filter(|sum| sum.is_finite())
}

fn group_key(ingredient: &Ingredient) -> (String, String) {
    (
        ingredient.name.trim().to_lowercase(),
        ingredient.unit.trim().to_lowercase(),
    )
}

/// Merges a flattened ingredient stream into shopping list entries.
///
/// Entries keep the spelling of the first ingredient of their group and come
/// out in first-encountered order.
pub fn aggregate_ingredients<'a, I>(ingredients: I) -> Vec<ShoppingListItem>
where
    I: IntoIterator<Item = &'a Ingredient>,
{
    let now = Instant::now();
    let mut items: Vec<ShoppingListItem> = Vec::new();
    let mut index_by_key: HashMap<(String, String), usize> = HashMap::new();

    for ingredient in ingredients {
        match index_by_key.get(&group_key(ingredient)) {
            Some(&idx) => {
                let item = &mut items[idx];
                let prev = std::mem::replace(&mut item.quantity, Quantity::Numeric(0.0));
                item.quantity = prev.merge(&ingredient.quantity);
            }
            None => {
                index_by_key.insert(group_key(ingredient), items.len());
                items.push(ShoppingListItem {
                    name: ingredient.name.clone(),
                    quantity: Quantity::from_raw(&ingredient.quantity),
                    unit: ingredient.unit.clone(),
                    purchased: false,
                });
            }
        }
    }

    log::debug!(
        "aggregate: {} entries in {:.2?}",
        items.len(),
        now.elapsed()
    );
    items
}
