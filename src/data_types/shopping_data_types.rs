use std::fmt;

use regex_lite::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use static_init::dynamic;
use uuid::Uuid;

/// Aggregated quantity of one shopping list entry.
///
/// `Mixed` keeps the numeric contributions summed in `subtotal` and every
/// non-numeric raw quantity in contribution order. It serializes as a list of
/// strings with the subtotal first.
#[derive(Debug, Clone, PartialEq)]
pub enum Quantity {
    Numeric(f64),
    Text(String),
    Mixed {
        subtotal: Option<f64>,
        texts: Vec<String>,
    },
}

impl Quantity {
    /// String representations in output order (subtotal first).
    pub fn as_strings(&self) -> Vec<String> {
        match self {
            Quantity::Numeric(n) => vec![format_number(*n)],
            Quantity::Text(s) => vec![s.clone()],
            Quantity::Mixed { subtotal, texts } => subtotal
                .map(format_number)
                .into_iter()
                .chain(texts.iter().cloned())
                .collect(),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Quantity::Numeric(n) => Some(*n),
            _ => None,
        }
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Quantity::Numeric(n) => write!(f, "{}", format_number(*n)),
            Quantity::Text(s) => write!(f, "{}", s),
            Quantity::Mixed { .. } => write!(f, "{}", self.as_strings().join(", ")),
        }
    }
}

impl Serialize for Quantity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Quantity::Numeric(n) => serializer.serialize_f64(*n),
            Quantity::Text(s) => serializer.serialize_str(s),
            Quantity::Mixed { .. } => self.as_strings().serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for Quantity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Stored {
            Numeric(f64),
            Text(String),
            List(Vec<String>),
        }

        Ok(match Stored::deserialize(deserializer)? {
            Stored::Numeric(n) => Quantity::Numeric(n),
            Stored::Text(s) => Quantity::Text(s),
            Stored::List(mut texts) => {
                // texts never parse as numbers, so a numeric head is the subtotal
                let subtotal = texts.first().and_then(|head| parse_numeric(head));
                if subtotal.is_some() {
                    texts.remove(0);
                }
                Quantity::Mixed { subtotal, texts }
            }
        })
    }
}

/// Parses integer and plain decimal forms ("2", "-1", "0.5", ".5", "3.").
/// Everything else, the empty string included, is not numeric. So are digit
/// strings too long to fit a finite `f64`.
pub fn parse_numeric(raw: &str) -> Option<f64> {
    #[dynamic]
    static RE: Regex = Regex::new(r"^[+-]?(\d+\.?\d*|\.\d+)$").unwrap();

    let trimmed = raw.trim();
    if !RE.is_match(trimmed) {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Stringifies an accumulated number the way it is shown in mixed lists: `2.0`, `0.5`.
///
/// The output never uses exponent notation, so `parse_numeric` reads every
/// finite value back.
pub fn format_number(n: f64) -> String {
    let plain = n.to_string();
    if plain.contains('.') {
        plain
    } else {
        plain + ".0"
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ShoppingListItem {
    pub name: String,
    pub quantity: Quantity,
    pub unit: String,
    #[serde(default)]
    pub purchased: bool,
}

/// Persisted snapshot of an aggregation. It is frozen at creation and does not
/// follow later edits of the meal plan or its recipes.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ShoppingList {
    pub id: Uuid,
    pub name: String,
    pub meal_plan_id: Option<Uuid>,
    pub created_at: String,
    pub items: Vec<ShoppingListItem>,
}

#[derive(Debug, Clone, Default)]
pub struct ShoppingListUpdate {
    pub name: Option<String>,
    pub items: Option<Vec<ShoppingListItem>>,
}
