//! Filter and sort clause vocabulary.
//!
//! Clauses are plain data; nothing here knows about tables. Field names and
//! value shapes are checked later by the compiler against an entity schema.

use super::compiler::SchemaError;
use rusqlite::types::Value;
use std::str::FromStr;
use uuid::Uuid;

/// Comparison operator of one filter clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    NotEq,
    Gt,
    Gte,
    Lt,
    Lte,
    Like,
    NotLike,
    In,
    NotIn,
    IsNull,
    IsNotNull,
    Between,
}

impl FilterOp {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::NotEq => "ne",
            Self::Gt => "gt",
            Self::Gte => "gte",
            Self::Lt => "lt",
            Self::Lte => "lte",
            Self::Like => "like",
            Self::NotLike => "not_like",
            Self::In => "in",
            Self::NotIn => "not_in",
            Self::IsNull => "is_null",
            Self::IsNotNull => "is_not_null",
            Self::Between => "between",
        }
    }
}

impl FromStr for FilterOp {
    type Err = SchemaError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "eq" | "=" | "==" => Ok(Self::Eq),
            "ne" | "neq" | "!=" | "<>" => Ok(Self::NotEq),
            "gt" | ">" => Ok(Self::Gt),
            "gte" | ">=" => Ok(Self::Gte),
            "lt" | "<" => Ok(Self::Lt),
            "lte" | "<=" => Ok(Self::Lte),
            "like" => Ok(Self::Like),
            "not_like" | "notlike" => Ok(Self::NotLike),
            "in" => Ok(Self::In),
            "not_in" | "notin" => Ok(Self::NotIn),
            "is_null" | "isnull" => Ok(Self::IsNull),
            "is_not_null" | "isnotnull" => Ok(Self::IsNotNull),
            "between" | "range" => Ok(Self::Between),
            _ => Err(SchemaError::UnsupportedOperator(value.to_string())),
        }
    }
}

/// Right-hand side of a filter clause.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Scalar(Value),
    List(Vec<FilterValue>),
    Range(Box<FilterValue>, Box<FilterValue>),
}

impl FilterValue {
    pub fn null() -> Self {
        Self::Scalar(Value::Null)
    }

    pub fn list<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<FilterValue>,
    {
        Self::List(values.into_iter().map(Into::into).collect())
    }

    pub fn range(low: impl Into<FilterValue>, high: impl Into<FilterValue>) -> Self {
        Self::Range(Box::new(low.into()), Box::new(high.into()))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Scalar(Value::Null))
    }
}

impl From<Value> for FilterValue {
    fn from(value: Value) -> Self {
        Self::Scalar(value)
    }
}

impl From<bool> for FilterValue {
    fn from(value: bool) -> Self {
        Self::Scalar(Value::Integer(i64::from(value)))
    }
}

impl From<i32> for FilterValue {
    fn from(value: i32) -> Self {
        Self::Scalar(Value::Integer(i64::from(value)))
    }
}

impl From<i64> for FilterValue {
    fn from(value: i64) -> Self {
        Self::Scalar(Value::Integer(value))
    }
}

impl From<u32> for FilterValue {
    fn from(value: u32) -> Self {
        Self::Scalar(Value::Integer(i64::from(value)))
    }
}

impl From<f64> for FilterValue {
    fn from(value: f64) -> Self {
        Self::Scalar(Value::Real(value))
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        Self::Scalar(Value::Text(value.to_string()))
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        Self::Scalar(Value::Text(value))
    }
}

impl From<Uuid> for FilterValue {
    fn from(value: Uuid) -> Self {
        Self::Scalar(Value::Text(value.to_string()))
    }
}

impl From<Option<Uuid>> for FilterValue {
    fn from(value: Option<Uuid>) -> Self {
        value.map_or_else(Self::null, Self::from)
    }
}

/// One `(field, operator, value)` predicate. Clauses in a list are ANDed.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterClause {
    pub field: String,
    pub op: FilterOp,
    pub value: FilterValue,
}

impl FilterClause {
    pub fn new(field: impl Into<String>, op: FilterOp, value: impl Into<FilterValue>) -> Self {
        Self {
            field: field.into(),
            op,
            value: value.into(),
        }
    }

    /// Builds a clause from a wire operator such as `"eq"` or `">="`.
    pub fn parse(
        field: impl Into<String>,
        op: &str,
        value: impl Into<FilterValue>,
    ) -> Result<Self, SchemaError> {
        Ok(Self::new(field, op.parse()?, value))
    }

    pub fn eq(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::new(field, FilterOp::Eq, value)
    }

    pub fn not_eq(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::new(field, FilterOp::NotEq, value)
    }

    pub fn gt(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::new(field, FilterOp::Gt, value)
    }

    pub fn gte(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::new(field, FilterOp::Gte, value)
    }

    pub fn lt(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::new(field, FilterOp::Lt, value)
    }

    pub fn lte(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::new(field, FilterOp::Lte, value)
    }

    pub fn like(field: impl Into<String>, pattern: impl Into<String>) -> Self {
        let pattern: String = pattern.into();
        Self::new(field, FilterOp::Like, pattern)
    }

    pub fn is_in<I, V>(field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<FilterValue>,
    {
        Self::new(field, FilterOp::In, FilterValue::list(values))
    }

    pub fn not_in<I, V>(field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<FilterValue>,
    {
        Self::new(field, FilterOp::NotIn, FilterValue::list(values))
    }

    pub fn is_null(field: impl Into<String>) -> Self {
        Self::new(field, FilterOp::IsNull, FilterValue::null())
    }

    pub fn is_not_null(field: impl Into<String>) -> Self {
        Self::new(field, FilterOp::IsNotNull, FilterValue::null())
    }

    pub fn between(
        field: impl Into<String>,
        low: impl Into<FilterValue>,
        high: impl Into<FilterValue>,
    ) -> Self {
        Self::new(field, FilterOp::Between, FilterValue::range(low, high))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

impl FromStr for SortDirection {
    type Err = SchemaError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(Self::Asc),
            "desc" | "descending" => Ok(Self::Desc),
            _ => Err(SchemaError::UnsupportedSortDirection(value.to_string())),
        }
    }
}

/// Sort directive; a list of clauses is applied in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortClause {
    pub field: String,
    pub direction: SortDirection,
}

impl SortClause {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Desc,
        }
    }

    pub fn parse(field: impl Into<String>, direction: &str) -> Result<Self, SchemaError> {
        Ok(Self {
            field: field.into(),
            direction: direction.parse()?,
        })
    }
}
