//! Per-entity registry configuration.

use crate::model::TenantScoped;
use crate::topic::{created_topics, deleted_topics, updated_topics, Action};

/// How `delete` removes a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeleteMode {
    /// Sets `deleted_at`; every read then skips the row.
    #[default]
    Soft,
    Hard,
}

impl std::str::FromStr for DeleteMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "soft" => Ok(Self::Soft),
            "hard" => Ok(Self::Hard),
            other => Err(format!("unsupported delete mode `{other}`; expected soft|hard")),
        }
    }
}

/// Default preloads, projection and topic functions of one entity type.
///
/// Projection and topic functions are plain function pointers, so they can
/// not capture state and are only invoked after storage succeeded.
pub struct Descriptor<T, R> {
    pub preloads: Vec<String>,
    pub resource: fn(&T) -> R,
    pub created: fn(&T) -> Vec<String>,
    pub updated: fn(&T) -> Vec<String>,
    pub deleted: fn(&T) -> Vec<String>,
    pub delete_mode: DeleteMode,
}

impl<T, R> Descriptor<T, R> {
    /// Descriptor for a branch-scoped entity using the standard topic set.
    pub fn tenant(resource: fn(&T) -> R, preloads: &[&str]) -> Self
    where
        T: TenantScoped,
    {
        Self {
            preloads: preloads.iter().map(|path| path.to_string()).collect(),
            resource,
            created: created_topics::<T>,
            updated: updated_topics::<T>,
            deleted: deleted_topics::<T>,
            delete_mode: DeleteMode::default(),
        }
    }

    pub fn with_delete_mode(mut self, delete_mode: DeleteMode) -> Self {
        self.delete_mode = delete_mode;
        self
    }

    pub fn topics(&self, action: Action, data: &T) -> Vec<String> {
        match action {
            Action::Create => (self.created)(data),
            Action::Update => (self.updated)(data),
            Action::Delete => (self.deleted)(data),
        }
    }
}
