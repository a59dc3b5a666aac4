//! Sort options for queries: an ordered list of (field, direction) pairs.

use crate::error::DataError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Asc,
    Des,
}

impl Direction {
    pub fn is_ascending(self) -> bool {
        self == Direction::Asc
    }

    pub fn is_descending(self) -> bool {
        self == Direction::Des
    }

    pub const fn as_sql(self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Des => "DESC",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Asc => write!(f, "asc"),
            Direction::Des => write!(f, "des"),
        }
    }
}

/// Case-insensitive: `asc`/`ascending`, `des`/`desc`/`descending`.
impl FromStr for Direction {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "asc" | "ascending" => Ok(Direction::Asc),
            "des" | "desc" | "descending" => Ok(Direction::Des),
            _ => Err(DataError::invalid_argument(format!(
                "invalid sort direction: {} (expected asc or des)",
                s
            ))),
        }
    }
}

/// A property paired with the direction to sort it in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    field: String,
    direction: Direction,
}

impl Order {
    pub fn new(field: impl Into<String>, direction: Direction) -> Self {
        Order {
            field: field.into(),
            direction,
        }
    }

    pub fn asc(field: impl Into<String>) -> Self {
        Order::new(field, Direction::Asc)
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Order::new(field, Direction::Des)
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sort {
    orders: Vec<Order>,
}

impl Sort {
    pub const DEFAULT_DIRECTION: Direction = Direction::Asc;

    pub fn new(orders: Vec<Order>) -> Self {
        Sort { orders }
    }

    pub fn unsorted() -> Self {
        Sort::default()
    }

    /// One ascending order per field, in the given order.
    pub fn by<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Sort::by_direction(Self::DEFAULT_DIRECTION, fields)
    }

    pub fn by_direction<I, S>(direction: Direction, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Sort {
            orders: fields.into_iter().map(|f| Order::new(f, direction)).collect(),
        }
    }

    pub fn ascending(self) -> Self {
        self.with_direction(Direction::Asc)
    }

    pub fn descending(self) -> Self {
        self.with_direction(Direction::Des)
    }

    fn with_direction(self, direction: Direction) -> Self {
        Sort {
            orders: self
                .orders
                .into_iter()
                .map(|o| Order::new(o.field, direction))
                .collect(),
        }
    }

    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Order> {
        self.orders.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }
}

impl<'a> IntoIterator for &'a Sort {
    type Item = &'a Order;
    type IntoIter = std::slice::Iter<'a, Order>;

    fn into_iter(self) -> Self::IntoIter {
        self.orders.iter()
    }
}

fn field_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("static pattern"))
}

/// True when `name` can be used as a sort field or column identifier.
pub fn is_identifier(name: &str) -> bool {
    field_pattern().is_match(name)
}

/// Query syntax: `id.asc,value.des` (direction optional, defaults to asc).
impl FromStr for Sort {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut orders = Vec::new();
        for token in s.split(',') {
            let token = token.trim();
            let (field, direction) = match token.split_once('.') {
                Some((field, dir)) => (field, dir.parse::<Direction>()?),
                None => (token, Self::DEFAULT_DIRECTION),
            };
            if !is_identifier(field) {
                return Err(DataError::invalid_argument(format!("invalid sort field: '{}'", field)));
            }
            orders.push(Order::new(field, direction));
        }
        Ok(Sort { orders })
    }
}
