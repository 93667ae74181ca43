//! Dynamic query vocabulary shared by every registry.
//!
//! # Responsibility
//! - Describe filters, sorts and pages as data.
//! - Compile them against an entity schema into parameterized SQL.

pub mod compiler;
pub mod filter;
pub mod page;

pub use compiler::{compile, to_snake_case, CompiledQuery, EntitySchema, JoinSpec, SchemaError};
pub use filter::{FilterClause, FilterOp, FilterValue, SortClause, SortDirection};
pub use page::{Page, PageRequest};
