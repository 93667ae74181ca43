//! Filter/sort compilation into parameterized SQLite fragments.
//!
//! # Responsibility
//! - Resolve clause field names against an entity schema.
//! - Produce `WHERE`/`ORDER BY`/`JOIN` fragments with positional parameters.
//!
//! # Invariants
//! - Only resolved, quoted identifiers reach SQL text; values are always bound.
//! - Conditions are ANDed in clause order; sorts keep list order.
//! - Unknown fields, relations, operators or value shapes are `SchemaError`s,
//!   never an empty result.

use super::filter::{FilterClause, FilterOp, FilterValue, SortClause};
use crate::model::{Entity, SYSTEM_COLUMNS};
use rusqlite::types::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Caller-side mistakes detected while shaping a storage query.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaError {
    UnknownField {
        entity: &'static str,
        field: String,
    },
    UnknownRelation {
        entity: &'static str,
        relation: String,
    },
    InvalidRelationPath(String),
    UnsupportedOperator(String),
    UnsupportedSortDirection(String),
    InvalidValue {
        field: String,
        op: &'static str,
        reason: &'static str,
    },
    ReadOnlyViolation(String),
}

impl Display for SchemaError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownField { entity, field } => {
                write!(f, "unknown field `{field}` on `{entity}`")
            }
            Self::UnknownRelation { entity, relation } => {
                write!(f, "unknown relation `{relation}` on `{entity}`")
            }
            Self::InvalidRelationPath(path) => write!(f, "invalid relation path `{path}`"),
            Self::UnsupportedOperator(op) => write!(f, "unsupported filter operator `{op}`"),
            Self::UnsupportedSortDirection(direction) => {
                write!(f, "unsupported sort direction `{direction}`")
            }
            Self::InvalidValue { field, op, reason } => {
                write!(f, "invalid value for `{field}` with `{op}`: {reason}")
            }
            Self::ReadOnlyViolation(sql) => {
                write!(f, "query handle only accepts read-only statements: `{sql}`")
            }
        }
    }
}

impl Error for SchemaError {}

/// A belongs-to relation reachable from filters as `Relation.column`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinSpec {
    pub relation: &'static str,
    pub table: &'static str,
    pub local_column: &'static str,
    pub columns: Vec<&'static str>,
}

impl JoinSpec {
    pub fn of<R: Entity>(relation: &'static str, local_column: &'static str) -> Self {
        Self {
            relation,
            table: R::TABLE,
            local_column,
            columns: all_columns::<R>(),
        }
    }

    fn sql(&self, base_table: &str) -> String {
        format!(
            "LEFT JOIN {table} AS {alias} ON {alias}.\"id\" = {base}.{local} AND {alias}.\"deleted_at\" IS NULL",
            table = quote(self.table),
            alias = quote(self.relation),
            base = quote(base_table),
            local = quote(self.local_column),
        )
    }
}

/// Column and join catalogue of one entity table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntitySchema {
    pub entity: &'static str,
    pub table: &'static str,
    pub columns: Vec<&'static str>,
    pub joins: Vec<JoinSpec>,
}

impl EntitySchema {
    pub fn of<T: Entity>() -> Self {
        Self {
            entity: T::NAME,
            table: T::TABLE,
            columns: all_columns::<T>(),
            joins: T::relations()
                .into_iter()
                .filter_map(|relation| relation.join().cloned())
                .collect(),
        }
    }

    /// Resolves a bare field name to one of this table's columns.
    pub fn resolve_column(&self, field: &str) -> Option<&'static str> {
        resolve_in(&self.columns, field)
    }

    fn join(&self, relation: &str) -> Option<&JoinSpec> {
        self.joins
            .iter()
            .find(|join| relation_matches(join.relation, relation))
    }
}

/// Output of [`compile`]: SQL fragments plus positional parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompiledQuery {
    pub joins: Vec<String>,
    pub conditions: Vec<String>,
    pub order_by: Vec<String>,
    pub params: Vec<Value>,
}

impl CompiledQuery {
    /// Renders `FROM` targets, including any relation joins.
    pub fn from_sql(&self, table: &str) -> String {
        let mut sql = quote(table);
        for join in &self.joins {
            sql.push(' ');
            sql.push_str(join);
        }
        sql
    }

    /// Renders the predicate, ANDing `base` with every compiled condition.
    pub fn where_sql(&self, base: &str) -> String {
        let mut parts = Vec::with_capacity(self.conditions.len() + 1);
        parts.push(base.to_string());
        parts.extend(self.conditions.iter().map(|condition| format!("({condition})")));
        parts.join(" AND ")
    }

    pub fn order_sql(&self) -> String {
        self.order_by.join(", ")
    }
}

/// Compiles filters and sorts for `schema`.
///
/// An empty filter list adds no predicate. An empty sort list orders by
/// `created_at DESC`; ties stay storage-defined unless the caller adds a
/// unique tiebreaker such as `id`.
pub fn compile(
    schema: &EntitySchema,
    filters: &[FilterClause],
    sorts: &[SortClause],
) -> Result<CompiledQuery, SchemaError> {
    let mut compiled = CompiledQuery::default();

    for clause in filters {
        let column = resolve_field(schema, &clause.field, &mut compiled.joins)?;
        if let Some(condition) = condition_sql(clause, &column, &mut compiled.params)? {
            compiled.conditions.push(condition);
        }
    }

    for sort in sorts {
        let column = resolve_field(schema, &sort.field, &mut compiled.joins)?;
        compiled
            .order_by
            .push(format!("{column} {}", sort.direction.as_sql()));
    }
    if compiled.order_by.is_empty() {
        compiled
            .order_by
            .push(format!("{}.\"created_at\" DESC", quote(schema.table)));
    }

    Ok(compiled)
}

/// Converts `OrganizationID` / `organizationId` style names to snake_case.
pub fn to_snake_case(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    let mut out = String::with_capacity(value.len() + 4);
    for (index, ch) in chars.iter().enumerate() {
        if ch.is_ascii_uppercase() {
            let prev = index.checked_sub(1).map(|i| chars[i]);
            let next = chars.get(index + 1);
            let boundary = match prev {
                Some(prev) if prev.is_ascii_lowercase() || prev.is_ascii_digit() => true,
                Some(prev) if prev.is_ascii_uppercase() => {
                    next.is_some_and(|next| next.is_ascii_lowercase())
                }
                _ => false,
            };
            if boundary && !out.ends_with('_') {
                out.push('_');
            }
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(*ch);
        }
    }
    out
}

pub(crate) fn quote(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

pub(crate) fn relation_matches(relation: &str, segment: &str) -> bool {
    relation == segment
        || relation.eq_ignore_ascii_case(segment)
        || to_snake_case(relation) == to_snake_case(segment)
}

pub(crate) fn all_columns<T: Entity>() -> Vec<&'static str> {
    SYSTEM_COLUMNS
        .iter()
        .chain(T::COLUMNS.iter())
        .copied()
        .collect()
}

fn resolve_in(columns: &[&'static str], field: &str) -> Option<&'static str> {
    let field = field.trim();
    if let Some(column) = columns.iter().find(|column| **column == field) {
        return Some(*column);
    }
    let snake = to_snake_case(field);
    if let Some(column) = columns.iter().find(|column| **column == snake) {
        return Some(*column);
    }
    let lower = field.to_ascii_lowercase();
    columns.iter().find(|column| **column == lower).copied()
}

fn resolve_field(
    schema: &EntitySchema,
    field: &str,
    joins: &mut Vec<String>,
) -> Result<String, SchemaError> {
    let Some((relation, column)) = field.split_once('.') else {
        let column = schema
            .resolve_column(field)
            .ok_or_else(|| SchemaError::UnknownField {
                entity: schema.entity,
                field: field.to_string(),
            })?;
        return Ok(format!("{}.{}", quote(schema.table), quote(column)));
    };

    if relation.is_empty() || column.is_empty() || column.contains('.') {
        return Err(SchemaError::InvalidRelationPath(field.to_string()));
    }
    let join = schema
        .join(relation)
        .ok_or_else(|| SchemaError::UnknownRelation {
            entity: schema.entity,
            relation: relation.to_string(),
        })?;
    let resolved = resolve_in(&join.columns, column).ok_or_else(|| SchemaError::UnknownField {
        entity: schema.entity,
        field: field.to_string(),
    })?;

    let join_sql = join.sql(schema.table);
    if !joins.contains(&join_sql) {
        joins.push(join_sql);
    }
    Ok(format!("{}.{}", quote(join.relation), quote(resolved)))
}

fn condition_sql(
    clause: &FilterClause,
    column: &str,
    params: &mut Vec<Value>,
) -> Result<Option<String>, SchemaError> {
    let invalid = |reason: &'static str| SchemaError::InvalidValue {
        field: clause.field.clone(),
        op: clause.op.as_str(),
        reason,
    };

    let condition = match clause.op {
        FilterOp::Eq | FilterOp::NotEq => {
            let value = scalar(&clause.value).ok_or_else(|| invalid("expected a single value"))?;
            match (clause.op, value) {
                (FilterOp::Eq, Value::Null) => format!("{column} IS NULL"),
                (_, Value::Null) => format!("{column} IS NOT NULL"),
                (FilterOp::Eq, value) => {
                    params.push(value.clone());
                    format!("{column} = ?")
                }
                (_, value) => {
                    params.push(value.clone());
                    format!("{column} IS NOT ?")
                }
            }
        }
        FilterOp::Gt | FilterOp::Gte | FilterOp::Lt | FilterOp::Lte => {
            let value = non_null(&clause.value).ok_or_else(|| invalid("expected a non-null value"))?;
            params.push(value.clone());
            let symbol = match clause.op {
                FilterOp::Gt => ">",
                FilterOp::Gte => ">=",
                FilterOp::Lt => "<",
                _ => "<=",
            };
            format!("{column} {symbol} ?")
        }
        FilterOp::Like | FilterOp::NotLike => {
            let Some(Value::Text(pattern)) = scalar(&clause.value) else {
                return Err(invalid("expected a text pattern"));
            };
            params.push(Value::Text(pattern.clone()));
            if clause.op == FilterOp::Like {
                format!("{column} LIKE ?")
            } else {
                format!("{column} NOT LIKE ?")
            }
        }
        FilterOp::In | FilterOp::NotIn => {
            let FilterValue::List(items) = &clause.value else {
                return Err(invalid("expected a list"));
            };
            if items.is_empty() {
                return Ok((clause.op == FilterOp::In).then(|| "0 = 1".to_string()));
            }
            for item in items {
                let value = non_null(item).ok_or_else(|| invalid("list items must be non-null values"))?;
                params.push(value.clone());
            }
            let placeholders = vec!["?"; items.len()].join(", ");
            if clause.op == FilterOp::In {
                format!("{column} IN ({placeholders})")
            } else {
                format!("{column} NOT IN ({placeholders})")
            }
        }
        FilterOp::IsNull | FilterOp::IsNotNull => {
            if !clause.value.is_null() {
                return Err(invalid("null checks take no value"));
            }
            if clause.op == FilterOp::IsNull {
                format!("{column} IS NULL")
            } else {
                format!("{column} IS NOT NULL")
            }
        }
        FilterOp::Between => {
            let FilterValue::Range(low, high) = &clause.value else {
                return Err(invalid("expected a range"));
            };
            let (Some(low), Some(high)) = (non_null(low), non_null(high)) else {
                return Err(invalid("range bounds must be non-null values"));
            };
            params.push(low.clone());
            params.push(high.clone());
            format!("{column} BETWEEN ? AND ?")
        }
    };

    Ok(Some(condition))
}

fn scalar(value: &FilterValue) -> Option<&Value> {
    match value {
        FilterValue::Scalar(value) => Some(value),
        FilterValue::List(_) | FilterValue::Range(_, _) => None,
    }
}

fn non_null(value: &FilterValue) -> Option<&Value> {
    scalar(value).filter(|value| !matches!(value, Value::Null))
}

#[cfg(test)]
mod tests {
    use super::{compile, to_snake_case, EntitySchema, JoinSpec, SchemaError};
    use crate::query::{FilterClause, FilterOp, FilterValue, SortClause};
    use rusqlite::types::Value;

    fn schema() -> EntitySchema {
        EntitySchema {
            entity: "account",
            table: "accounts",
            columns: vec!["id", "created_at", "organization_id", "name", "is_internal"],
            joins: vec![JoinSpec {
                relation: "GeneralLedgerDefinition",
                table: "general_ledger_definitions",
                local_column: "general_ledger_definition_id",
                columns: vec!["id", "name"],
            }],
        }
    }

    #[test]
    fn snake_case_handles_acronyms_and_camel_case() {
        assert_eq!(to_snake_case("OrganizationID"), "organization_id");
        assert_eq!(to_snake_case("organizationId"), "organization_id");
        assert_eq!(to_snake_case("isInternal"), "is_internal");
        assert_eq!(to_snake_case("name"), "name");
    }

    #[test]
    fn compiles_conditions_in_clause_order_with_bound_params() {
        let compiled = compile(
            &schema(),
            &[
                FilterClause::eq("OrganizationID", "org"),
                FilterClause::is_in("name", ["a", "b"]),
            ],
            &[SortClause::asc("name"), SortClause::desc("id")],
        )
        .unwrap();

        assert_eq!(
            compiled.conditions,
            vec![
                "\"accounts\".\"organization_id\" = ?".to_string(),
                "\"accounts\".\"name\" IN (?, ?)".to_string(),
            ]
        );
        assert_eq!(compiled.params.len(), 3);
        assert_eq!(
            compiled.order_sql(),
            "\"accounts\".\"name\" ASC, \"accounts\".\"id\" DESC"
        );
    }

    #[test]
    fn empty_input_has_no_predicate_and_default_order() {
        let compiled = compile(&schema(), &[], &[]).unwrap();
        assert!(compiled.conditions.is_empty());
        assert_eq!(compiled.where_sql("1 = 1"), "1 = 1");
        assert_eq!(compiled.order_sql(), "\"accounts\".\"created_at\" DESC");
    }

    #[test]
    fn unknown_field_is_schema_error() {
        let err = compile(&schema(), &[FilterClause::eq("nmae", "x")], &[]).unwrap_err();
        assert_eq!(
            err,
            SchemaError::UnknownField {
                entity: "account",
                field: "nmae".to_string()
            }
        );
    }

    #[test]
    fn dotted_field_joins_belongs_to_relation_once() {
        let compiled = compile(
            &schema(),
            &[FilterClause::eq("GeneralLedgerDefinition.name", "Cash")],
            &[SortClause::asc("general_ledger_definition.name")],
        )
        .unwrap();
        assert_eq!(compiled.joins.len(), 1);
        assert!(compiled.from_sql("accounts").contains("LEFT JOIN \"general_ledger_definitions\""));
        assert_eq!(
            compiled.conditions[0],
            "\"GeneralLedgerDefinition\".\"name\" = ?"
        );
    }

    #[test]
    fn relation_paths_are_checked() {
        let unknown = compile(&schema(), &[FilterClause::eq("Branch.name", "x")], &[]);
        assert!(matches!(unknown, Err(SchemaError::UnknownRelation { .. })));

        let nested = compile(
            &schema(),
            &[FilterClause::eq("GeneralLedgerDefinition.Grouping.name", "x")],
            &[],
        );
        assert!(matches!(nested, Err(SchemaError::InvalidRelationPath(_))));
    }

    #[test]
    fn value_shapes_are_validated_per_operator() {
        let in_without_list = compile(&schema(), &[FilterClause::new("name", FilterOp::In, "x")], &[]);
        assert!(matches!(in_without_list, Err(SchemaError::InvalidValue { .. })));

        let null_with_value = compile(&schema(), &[FilterClause::new("name", FilterOp::IsNull, "x")], &[]);
        assert!(matches!(null_with_value, Err(SchemaError::InvalidValue { .. })));

        let bad_range = compile(
            &schema(),
            &[FilterClause::new("created_at", FilterOp::Between, 5_i64)],
            &[],
        );
        assert!(matches!(bad_range, Err(SchemaError::InvalidValue { .. })));
    }

    #[test]
    fn null_equality_and_empty_lists() {
        let compiled = compile(
            &schema(),
            &[
                FilterClause::eq("name", FilterValue::null()),
                FilterClause::not_eq("organization_id", FilterValue::Scalar(Value::Null)),
                FilterClause::is_in("name", Vec::<String>::new()),
                FilterClause::not_in("name", Vec::<String>::new()),
            ],
            &[],
        )
        .unwrap();
        assert_eq!(
            compiled.conditions,
            vec![
                "\"accounts\".\"name\" IS NULL".to_string(),
                "\"accounts\".\"organization_id\" IS NOT NULL".to_string(),
                "0 = 1".to_string(),
            ]
        );
        assert!(compiled.params.is_empty());
    }
}
