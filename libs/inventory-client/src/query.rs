//! Query filter documents
//!
//! A [`Filter`] is a recursive tree of field conditions and logical
//! combinators that serializes to the MongoDB filter shape. It is never
//! interpreted locally; the server owns its semantics.

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

/// Comparison and element operators applied to a single field path
#[derive(Debug, Clone, PartialEq)]
pub enum Operator {
    Eq(Value),
    Ne(Value),
    Gt(Value),
    Gte(Value),
    Lt(Value),
    Lte(Value),
    In(Vec<Value>),
    Nin(Vec<Value>),
    Exists(bool),
    Regex {
        pattern: String,
        options: Option<String>,
    },
    /// Match array elements against a sub-document filter
    ElemMatch(Filter),
    Size(u64),
    /// BSON type alias (`"string"`) or number
    Type(Value),
    Mod {
        divisor: i64,
        remainder: i64,
    },
    Not(Vec<Operator>),
}

impl Operator {
    fn write_into(&self, target: &mut Map<String, Value>) {
        let (key, value) = match self {
            Self::Eq(v) => ("$eq", v.clone()),
            Self::Ne(v) => ("$ne", v.clone()),
            Self::Gt(v) => ("$gt", v.clone()),
            Self::Gte(v) => ("$gte", v.clone()),
            Self::Lt(v) => ("$lt", v.clone()),
            Self::Lte(v) => ("$lte", v.clone()),
            Self::In(vs) => ("$in", Value::Array(vs.clone())),
            Self::Nin(vs) => ("$nin", Value::Array(vs.clone())),
            Self::Exists(b) => ("$exists", Value::Bool(*b)),
            Self::Regex { pattern, options } => {
                target.insert("$regex".to_string(), Value::String(pattern.clone()));
                if let Some(options) = options {
                    target.insert("$options".to_string(), Value::String(options.clone()));
                }
                return;
            }
            Self::ElemMatch(filter) => ("$elemMatch", filter.to_value()),
            Self::Size(n) => ("$size", Value::from(*n)),
            Self::Type(t) => ("$type", t.clone()),
            Self::Mod { divisor, remainder } => (
                "$mod",
                Value::Array(vec![Value::from(*divisor), Value::from(*remainder)]),
            ),
            Self::Not(ops) => ("$not", operators_to_value(ops)),
        };
        target.insert(key.to_string(), value);
    }
}

fn operators_to_value(ops: &[Operator]) -> Value {
    let mut map = Map::new();
    for op in ops {
        op.write_into(&mut map);
    }
    Value::Object(map)
}

/// What a field path must satisfy
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// Implicit equality: `{path: value}`
    Literal(Value),
    /// Operator object: `{path: {$gt: .., $lt: ..}}`
    Operators(Vec<Operator>),
}

impl Condition {
    fn to_value(&self) -> Value {
        match self {
            Self::Literal(v) => v.clone(),
            Self::Operators(ops) => operators_to_value(ops),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Clause {
    Field { path: String, condition: Condition },
    And(Vec<Filter>),
    Or(Vec<Filter>),
    Nor(Vec<Filter>),
    Text { search: String, language: Option<String> },
    Expr(Value),
}

/// Query document built from field conditions and logical combinators
///
/// ```
/// use inventory_client::{Filter, Operator};
///
/// let filter = Filter::new()
///     .eq("category", "widgets")
///     .field("quantity", Operator::Gte(10.into()))
///     .or(vec![
///         Filter::new().eq("brand", "acme"),
///         Filter::new().field("tags", Operator::In(vec!["sale".into()])),
///     ]);
///
/// assert_eq!(
///     serde_json::to_string(&filter).unwrap(),
///     r#"{"category":"widgets","quantity":{"$gte":10},"$or":[{"brand":"acme"},{"tags":{"$in":["sale"]}}]}"#
/// );
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    clauses: Vec<Clause>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Literal equality on a dotted path; replaces any earlier condition on it
    pub fn eq(mut self, path: impl Into<String>, value: impl Into<Value>) -> Self {
        let path = path.into();
        self.clauses
            .retain(|c| !matches!(c, Clause::Field { path: p, .. } if *p == path));
        self.clauses.push(Clause::Field {
            path,
            condition: Condition::Literal(value.into()),
        });
        self
    }

    /// Add an operator on a dotted path; operators on the same path accumulate
    pub fn field(mut self, path: impl Into<String>, operator: Operator) -> Self {
        let path = path.into();
        let existing = self.clauses.iter_mut().find_map(|c| match c {
            Clause::Field {
                path: p,
                condition: Condition::Operators(ops),
            } if *p == path => Some(ops),
            _ => None,
        });
        match existing {
            Some(ops) => ops.push(operator),
            None => {
                self.clauses
                    .retain(|c| !matches!(c, Clause::Field { path: p, .. } if *p == path));
                self.clauses.push(Clause::Field {
                    path,
                    condition: Condition::Operators(vec![operator]),
                });
            }
        }
        self
    }

    pub fn and(mut self, filters: Vec<Filter>) -> Self {
        match self.clauses.iter_mut().find_map(|c| match c {
            Clause::And(existing) => Some(existing),
            _ => None,
        }) {
            Some(existing) => existing.extend(filters),
            None => self.clauses.push(Clause::And(filters)),
        }
        self
    }

    pub fn or(mut self, filters: Vec<Filter>) -> Self {
        match self.clauses.iter_mut().find_map(|c| match c {
            Clause::Or(existing) => Some(existing),
            _ => None,
        }) {
            Some(existing) => existing.extend(filters),
            None => self.clauses.push(Clause::Or(filters)),
        }
        self
    }

    pub fn nor(mut self, filters: Vec<Filter>) -> Self {
        match self.clauses.iter_mut().find_map(|c| match c {
            Clause::Nor(existing) => Some(existing),
            _ => None,
        }) {
            Some(existing) => existing.extend(filters),
            None => self.clauses.push(Clause::Nor(filters)),
        }
        self
    }

    /// Full-text search (`$text: {$search}`)
    pub fn text(mut self, search: impl Into<String>, language: Option<String>) -> Self {
        self.clauses.retain(|c| !matches!(c, Clause::Text { .. }));
        self.clauses.push(Clause::Text {
            search: search.into(),
            language,
        });
        self
    }

    /// Aggregation expression (`$expr`)
    pub fn expr(mut self, expression: Value) -> Self {
        self.clauses.retain(|c| !matches!(c, Clause::Expr(_)));
        self.clauses.push(Clause::Expr(expression));
        self
    }

    /// Render as a JSON object, preserving clause order
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        for clause in &self.clauses {
            match clause {
                Clause::Field { path, condition } => {
                    map.insert(path.clone(), condition.to_value());
                }
                Clause::And(filters) => {
                    map.insert("$and".to_string(), filters_to_value(filters));
                }
                Clause::Or(filters) => {
                    map.insert("$or".to_string(), filters_to_value(filters));
                }
                Clause::Nor(filters) => {
                    map.insert("$nor".to_string(), filters_to_value(filters));
                }
                Clause::Text { search, language } => {
                    let mut text = Map::new();
                    text.insert("$search".to_string(), Value::String(search.clone()));
                    if let Some(language) = language {
                        text.insert("$language".to_string(), Value::String(language.clone()));
                    }
                    map.insert("$text".to_string(), Value::Object(text));
                }
                Clause::Expr(expression) => {
                    map.insert("$expr".to_string(), expression.clone());
                }
            }
        }
        Value::Object(map)
    }
}

fn filters_to_value(filters: &[Filter]) -> Value {
    Value::Array(filters.iter().map(Filter::to_value).collect())
}

impl Serialize for Filter {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

impl From<Filter> for Value {
    fn from(filter: Filter) -> Self {
        filter.to_value()
    }
}
