//! Named relation preloading.
//!
//! # Responsibility
//! - Declare belongs-to and has-many relations between entities.
//! - Resolve dotted relation paths and batch-load each level once.
//!
//! # Invariants
//! - One query per relation level per chunk of keys, never one per row.
//! - Paths are validated before the owning query runs.
//! - Preloads are additive: call paths extend the descriptor defaults.

use super::error::KindResult;
use super::sql::{live_predicate, query_entities, select_list};
use crate::db::value::uuid_value;
use crate::model::Entity;
use crate::query::compiler::{quote, relation_matches};
use crate::query::{JoinSpec, SchemaError};
use rusqlite::Connection;
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

/// Upper bound on bound keys per `IN (...)` batch.
const PRELOAD_CHUNK: usize = 500;

type LoadFn<T> = dyn Fn(&Connection, &mut [T], &[String]) -> KindResult<()> + Send + Sync;

/// A preloadable relation of `T`.
pub struct Relation<T> {
    name: &'static str,
    join: Option<JoinSpec>,
    validate: fn(&[String]) -> Result<(), SchemaError>,
    load: Box<LoadFn<T>>,
}

impl<T: Entity> Relation<T> {
    /// `T` holds `fk_column` pointing at one `R`.
    ///
    /// Also makes `R`'s columns filterable as `name.column`.
    pub fn belongs_to<R: Entity>(
        name: &'static str,
        fk_column: &'static str,
        key: fn(&T) -> Option<Uuid>,
        assign: fn(&mut T, Option<R>),
    ) -> Self {
        let load = move |conn: &Connection, rows: &mut [T], nested: &[String]| -> KindResult<()> {
            let keys = unique(rows.iter().filter_map(key));
            let mut parents = fetch_by_column::<R>(conn, "id", &keys)?;
            preload(conn, &mut parents, nested)?;
            let by_id: HashMap<Uuid, R> = parents
                .into_iter()
                .map(|parent| (parent.id(), parent))
                .collect();
            for row in rows.iter_mut() {
                let parent = key(row).and_then(|id| by_id.get(&id).cloned());
                assign(row, parent);
            }
            Ok(())
        };

        Self {
            name,
            join: Some(JoinSpec::of::<R>(name, fk_column)),
            validate: validate_nested::<R>,
            load: Box::new(load),
        }
    }

    /// Many `R` rows hold `fk_column` pointing at `T`.
    pub fn has_many<R: Entity>(
        name: &'static str,
        fk_column: &'static str,
        parent: fn(&R) -> Option<Uuid>,
        assign: fn(&mut T, Vec<R>),
    ) -> Self {
        let load = move |conn: &Connection, rows: &mut [T], nested: &[String]| -> KindResult<()> {
            let ids = unique(rows.iter().map(|row| row.id()));
            let mut children = fetch_by_column::<R>(conn, fk_column, &ids)?;
            preload(conn, &mut children, nested)?;
            let mut grouped: HashMap<Uuid, Vec<R>> = HashMap::new();
            for child in children {
                if let Some(owner) = parent(&child) {
                    grouped.entry(owner).or_default().push(child);
                }
            }
            for row in rows.iter_mut() {
                let owned = grouped.remove(&row.id()).unwrap_or_default();
                assign(row, owned);
            }
            Ok(())
        };

        Self {
            name,
            join: None,
            validate: validate_nested::<R>,
            load: Box::new(load),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn join(&self) -> Option<&JoinSpec> {
        self.join.as_ref()
    }
}

/// Default paths followed by call paths, without duplicates.
pub(crate) fn merge_preloads(defaults: &[String], extras: &[&str]) -> Vec<String> {
    let mut merged: Vec<String> = Vec::with_capacity(defaults.len() + extras.len());
    for path in defaults.iter().map(String::as_str).chain(extras.iter().copied()) {
        if !merged.iter().any(|existing| existing == path) {
            merged.push(path.to_string());
        }
    }
    merged
}

/// Checks every path against `relations` without touching storage.
pub(crate) fn validate_paths<T: Entity>(
    relations: &[Relation<T>],
    paths: &[String],
) -> Result<(), SchemaError> {
    for (head, nested) in group_paths(paths)? {
        let relation = find_relation::<T>(relations, &head)?;
        (relation.validate)(&nested)?;
    }
    Ok(())
}

/// Loads every path into `rows` using `relations` of `T`.
pub(crate) fn load_paths<T: Entity>(
    relations: &[Relation<T>],
    conn: &Connection,
    rows: &mut [T],
    paths: &[String],
) -> KindResult<()> {
    if rows.is_empty() || paths.is_empty() {
        return Ok(());
    }
    for (head, nested) in group_paths(paths)? {
        let relation = find_relation::<T>(relations, &head)?;
        (relation.load)(conn, rows, &nested)?;
    }
    Ok(())
}

fn preload<T: Entity>(conn: &Connection, rows: &mut [T], paths: &[String]) -> KindResult<()> {
    load_paths(&T::relations(), conn, rows, paths)
}

fn validate_nested<R: Entity>(paths: &[String]) -> Result<(), SchemaError> {
    validate_paths(&R::relations(), paths)
}

fn find_relation<'r, T: Entity>(
    relations: &'r [Relation<T>],
    head: &str,
) -> Result<&'r Relation<T>, SchemaError> {
    relations
        .iter()
        .find(|relation| relation_matches(relation.name, head))
        .ok_or_else(|| SchemaError::UnknownRelation {
            entity: T::NAME,
            relation: head.to_string(),
        })
}

/// Splits `A.B.C` paths into `A -> [B.C]` groups, keeping first-seen order.
fn group_paths(paths: &[String]) -> Result<Vec<(String, Vec<String>)>, SchemaError> {
    let mut groups: Vec<(String, Vec<String>)> = Vec::new();
    for path in paths {
        let trimmed = path.trim();
        if trimmed.is_empty() || trimmed.split('.').any(str::is_empty) {
            return Err(SchemaError::InvalidRelationPath(path.clone()));
        }
        let (head, rest) = match trimmed.split_once('.') {
            Some((head, rest)) => (head, Some(rest)),
            None => (trimmed, None),
        };
        let index = match groups.iter().position(|(existing, _)| existing == head) {
            Some(index) => index,
            None => {
                groups.push((head.to_string(), Vec::new()));
                groups.len() - 1
            }
        };
        if let Some(rest) = rest {
            let nested = &mut groups[index].1;
            if !nested.iter().any(|existing| existing == rest) {
                nested.push(rest.to_string());
            }
        }
    }
    Ok(groups)
}

fn unique(ids: impl Iterator<Item = Uuid>) -> Vec<Uuid> {
    let mut seen = HashSet::new();
    ids.filter(|id| seen.insert(*id)).collect()
}

/// Live rows of `R` whose `column` is one of `keys`, ordered by
/// `(created_at, id)`.
fn fetch_by_column<R: Entity>(
    conn: &Connection,
    column: &str,
    keys: &[Uuid],
) -> KindResult<Vec<R>> {
    let mut out = Vec::new();
    for chunk in keys.chunks(PRELOAD_CHUNK) {
        let sql = format!(
            "SELECT {} FROM {} WHERE {} AND {}.{} IN ({});",
            select_list::<R>(),
            quote(R::TABLE),
            live_predicate(R::TABLE),
            quote(R::TABLE),
            quote(column),
            vec!["?"; chunk.len()].join(", ")
        );
        let params = chunk.iter().copied().map(uuid_value).collect();
        out.extend(query_entities::<R>(conn, &sql, params)?);
    }
    out.sort_by(|a, b| (a.record().created_at, a.id()).cmp(&(b.record().created_at, b.id())));
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::{group_paths, merge_preloads};
    use crate::query::SchemaError;

    #[test]
    fn paths_group_by_first_segment() {
        let paths = vec![
            "Organization".to_string(),
            "Branch.Organization".to_string(),
            "Organization.Branches".to_string(),
        ];
        let groups = group_paths(&paths).unwrap();
        assert_eq!(
            groups,
            vec![
                ("Organization".to_string(), vec!["Branches".to_string()]),
                ("Branch".to_string(), vec!["Organization".to_string()]),
            ]
        );
    }

    #[test]
    fn empty_segments_are_invalid() {
        for path in ["", "Branch..Organization", ".Branch", "Branch."] {
            let err = group_paths(&[path.to_string()]).unwrap_err();
            assert!(matches!(err, SchemaError::InvalidRelationPath(_)));
        }
    }

    #[test]
    fn preloads_are_unioned_in_order() {
        let defaults = vec!["Organization".to_string()];
        assert_eq!(
            merge_preloads(&defaults, &["Branch", "Organization"]),
            vec!["Organization".to_string(), "Branch".to_string()]
        );
    }
}
