//! Filter predicates sent to the backend.
//!
//! A predicate is either a single field condition or a logical OR over
//! nested predicates. The same value renders as a where clause for REST
//! queries, serializes to JSON for realtime subscriptions, and can be
//! evaluated locally against a JSON record.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Comparison operator of a single condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operator {
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
}

impl Operator {
    fn as_sql(self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Ne => "!=",
        }
    }
}

/// `(field, op, value)` condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub field: String,
    pub op: Operator,
    pub value: Value,
}

impl Condition {
    pub fn matches(&self, record: &Value) -> bool {
        let actual = record.get(&self.field).unwrap_or(&Value::Null);
        match self.op {
            Operator::Eq => actual == &self.value,
            Operator::Ne => actual != &self.value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Predicate {
    Condition(Condition),
    Or(Vec<Predicate>),
}

impl Predicate {
    /// Logical OR over the given predicates.
    pub fn or<I>(predicates: I) -> Self
    where
        I: IntoIterator<Item = Predicate>,
    {
        Predicate::Or(predicates.into_iter().collect())
    }

    /// Extend this predicate with one more alternative.
    ///
    /// An existing top-level OR is widened in place instead of nested.
    pub fn or_else(self, other: Predicate) -> Self {
        match self {
            Predicate::Or(mut alternatives) => {
                alternatives.push(other);
                Predicate::Or(alternatives)
            }
            condition => Predicate::Or(vec![condition, other]),
        }
    }

    /// Evaluate the predicate against a JSON record.
    ///
    /// Missing fields read as `null`. An empty OR matches nothing.
    pub fn matches(&self, record: &Value) -> bool {
        match self {
            Predicate::Condition(condition) => condition.matches(record),
            Predicate::Or(alternatives) => alternatives.iter().any(|p| p.matches(record)),
        }
    }

    fn write_clause(&self, f: &mut fmt::Formatter<'_>, nested: bool) -> fmt::Result {
        match self {
            Predicate::Condition(condition) => {
                write!(f, "{} {} ", condition.field, condition.op.as_sql())?;
                write_literal(f, &condition.value)
            }
            // never true; keeps the clause syntactically valid
            Predicate::Or(alternatives) if alternatives.is_empty() => f.write_str("1 = 0"),
            Predicate::Or(alternatives) => {
                let wrap = nested && alternatives.len() > 1;
                if wrap {
                    f.write_str("(")?;
                }
                for (index, alternative) in alternatives.iter().enumerate() {
                    if index > 0 {
                        f.write_str(" OR ")?;
                    }
                    alternative.write_clause(f, true)?;
                }
                if wrap {
                    f.write_str(")")?;
                }
                Ok(())
            }
        }
    }
}

fn write_literal(f: &mut fmt::Formatter<'_>, value: &Value) -> fmt::Result {
    match value {
        Value::String(text) => write!(f, "'{}'", text.replace('\'', "''")),
        Value::Null => f.write_str("NULL"),
        Value::Bool(flag) => write!(f, "{}", flag),
        Value::Number(number) => write!(f, "{}", number),
        other => write!(f, "'{}'", other.to_string().replace('\'', "''")),
    }
}

/// Renders the predicate as a SQL-style where clause.
impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_clause(f, false)
    }
}

impl From<Condition> for Predicate {
    fn from(condition: Condition) -> Self {
        Predicate::Condition(condition)
    }
}

/// Field reference used to build conditions.
#[derive(Debug, Clone)]
pub struct Field(String);

impl Field {
    pub fn eq(self, value: impl Into<Value>) -> Predicate {
        self.condition(Operator::Eq, value)
    }

    pub fn ne(self, value: impl Into<Value>) -> Predicate {
        self.condition(Operator::Ne, value)
    }

    fn condition(self, op: Operator, value: impl Into<Value>) -> Predicate {
        Predicate::Condition(Condition {
            field: self.0,
            op,
            value: value.into(),
        })
    }
}

/// Start a condition on `name`.
pub fn field(name: impl Into<String>) -> Field {
    Field(name.into())
}

/// Logical OR over the given predicates.
pub fn or<I>(predicates: I) -> Predicate
where
    I: IntoIterator<Item = Predicate>,
{
    Predicate::or(predicates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn equality_matches_only_equal_values() {
        let predicate = field("from").eq("u1");
        assert!(predicate.matches(&json!({"from": "u1"})));
        assert!(!predicate.matches(&json!({"from": "u2"})));
        assert!(!predicate.matches(&json!({"to": "u1"})));
    }

    #[test]
    fn inequality_treats_missing_field_as_different() {
        let predicate = field("id").ne("u1");
        assert!(predicate.matches(&json!({"id": "u2"})));
        assert!(!predicate.matches(&json!({"id": "u1"})));
        assert!(predicate.matches(&json!({"name": "no id"})));
    }

    #[test]
    fn or_matches_any_alternative_at_any_depth() {
        let predicate = or([
            field("from").eq("u1"),
            or([field("to").eq("u1"), field("to").eq("ALL")]),
        ]);

        assert!(predicate.matches(&json!({"from": "u1", "to": "u9"})));
        assert!(predicate.matches(&json!({"from": "u9", "to": "u1"})));
        assert!(predicate.matches(&json!({"from": "u9", "to": "ALL"})));
        assert!(!predicate.matches(&json!({"from": "u2", "to": "u3"})));
    }

    #[test]
    fn empty_or_matches_nothing() {
        let predicate = Predicate::or(Vec::new());
        assert!(!predicate.matches(&json!({})));
        assert_eq!(predicate.to_string(), "1 = 0");
    }

    #[test]
    fn or_else_widens_existing_alternatives() {
        let predicate = field("a").eq(1).or_else(field("b").eq(2)).or_else(field("c").eq(3));
        match &predicate {
            Predicate::Or(alternatives) => assert_eq!(alternatives.len(), 3),
            other => panic!("expected OR, got {other:?}"),
        }
    }

    #[test]
    fn display_renders_where_clause() {
        let predicate = or([
            field("from").eq("u1"),
            field("to").eq("u1"),
            field("to").eq("ALL"),
        ]);
        assert_eq!(
            predicate.to_string(),
            "from = 'u1' OR to = 'u1' OR to = 'ALL'"
        );
    }

    #[test]
    fn display_parenthesises_nested_or_and_escapes_quotes() {
        let predicate = or([
            field("name").ne("O'Brien"),
            or([field("read").eq(false), field("count").eq(3)]),
        ]);
        assert_eq!(
            predicate.to_string(),
            "name != 'O''Brien' OR (read = false OR count = 3)"
        );
    }

    #[test]
    fn serializes_to_tagged_json() {
        let predicate = or([field("chatId").eq("c1")]);
        let encoded = serde_json::to_value(&predicate).unwrap();
        assert_eq!(
            encoded,
            json!({"or": [{"condition": {"field": "chatId", "op": "==", "value": "c1"}}]})
        );

        let decoded: Predicate = serde_json::from_value(encoded).unwrap();
        assert_eq!(decoded, predicate);
    }
}
