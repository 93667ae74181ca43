//! Change-notification topics and broker boundary.
//!
//! # Responsibility
//! - Derive hierarchical topic strings from a mutated entity.
//! - Validate and hand topics plus a JSON payload to a [`Broker`].
//!
//! # Invariants
//! - Topic computation is pure: same entity state, same topic list.
//! - Every event carries one scope-free base topic (`<entity>.<action>`).
//! - The dispatcher never retries or deduplicates.

use crate::model::{TenantScope, TenantScoped};
use log::{info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

static TOPIC_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-z][a-z0-9_]*(\.[A-Za-z0-9_-]+)+$").expect("valid topic regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Create,
    Update,
    Delete,
}

impl Action {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

#[derive(Debug)]
pub enum DispatchError {
    EmptyTopics,
    InvalidTopic(String),
    MissingBaseTopic,
    Payload(serde_json::Error),
    Broker(String),
}

impl Display for DispatchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTopics => write!(f, "no topics to dispatch"),
            Self::InvalidTopic(topic) => write!(f, "invalid topic `{topic}`"),
            Self::MissingBaseTopic => write!(f, "topic set has no scope-free base topic"),
            Self::Payload(err) => write!(f, "failed to encode payload: {err}"),
            Self::Broker(message) => write!(f, "broker rejected publish: {message}"),
        }
    }
}

impl Error for DispatchError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Payload(err) => Some(err),
            _ => None,
        }
    }
}

/// External publish transport.
///
/// One call is one multi-topic publish of a single event.
pub trait Broker: Send + Sync {
    fn dispatch(&self, topics: &[String], payload: &serde_json::Value)
        -> Result<(), DispatchError>;
}

/// Topics for entities outside a branch scope (organizations, branches).
pub fn entity_topics(
    entity: &str,
    action: Action,
    id: Uuid,
    references: &[(&str, Uuid)],
) -> Vec<String> {
    let base = format!("{entity}.{}", action.as_str());
    let mut topics = Vec::with_capacity(references.len() + 2);
    topics.push(format!("{base}.{id}"));
    topics.extend(
        references
            .iter()
            .map(|(segment, reference)| format!("{base}.{segment}.{reference}")),
    );
    topics.insert(0, base);
    topics
}

/// Standard topic set of a branch-scoped entity.
pub fn tenant_topics(
    entity: &str,
    action: Action,
    id: Uuid,
    scope: TenantScope,
    references: &[(&str, Uuid)],
) -> Vec<String> {
    let mut scoped = vec![
        ("branch", scope.branch_id),
        ("organization", scope.organization_id),
    ];
    scoped.extend_from_slice(references);
    entity_topics(entity, action, id, &scoped)
}

pub fn created_topics<T: TenantScoped>(data: &T) -> Vec<String> {
    scoped_topics(data, Action::Create)
}

pub fn updated_topics<T: TenantScoped>(data: &T) -> Vec<String> {
    scoped_topics(data, Action::Update)
}

pub fn deleted_topics<T: TenantScoped>(data: &T) -> Vec<String> {
    scoped_topics(data, Action::Delete)
}

fn scoped_topics<T: TenantScoped>(data: &T, action: Action) -> Vec<String> {
    tenant_topics(
        T::NAME,
        action,
        data.id(),
        data.scope(),
        &data.topic_references(),
    )
}

/// Checks topic grammar and the presence of a base topic.
pub fn validate_topics(topics: &[String]) -> Result<(), DispatchError> {
    if topics.is_empty() {
        return Err(DispatchError::EmptyTopics);
    }
    if let Some(topic) = topics.iter().find(|topic| !TOPIC_PATTERN.is_match(topic)) {
        return Err(DispatchError::InvalidTopic(topic.clone()));
    }
    if !topics.iter().any(|topic| topic.split('.').count() == 2) {
        return Err(DispatchError::MissingBaseTopic);
    }
    Ok(())
}

/// Validates topics, encodes the payload and publishes through the broker.
#[derive(Clone)]
pub struct TopicDispatcher {
    broker: Arc<dyn Broker>,
}

impl TopicDispatcher {
    pub fn new(broker: Arc<dyn Broker>) -> Self {
        Self { broker }
    }

    pub fn dispatch<P: Serialize>(&self, topics: &[String], payload: &P) -> Result<(), DispatchError> {
        validate_topics(topics)?;
        let payload = serde_json::to_value(payload).map_err(DispatchError::Payload)?;
        self.broker.dispatch(topics, &payload)
    }
}

/// One recorded publish.
#[derive(Debug, Clone, PartialEq)]
pub struct Published {
    pub topics: Vec<String>,
    pub payload: serde_json::Value,
}

/// In-process broker that records publishes. Used by tests and tools.
#[derive(Debug, Default)]
pub struct MemoryBroker {
    published: Mutex<Vec<Published>>,
    failing: Mutex<Option<String>>,
}

impl MemoryBroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every following publish fail with `message` until cleared.
    pub fn fail_with(&self, message: impl Into<String>) {
        *lock(&self.failing) = Some(message.into());
    }

    pub fn recover(&self) {
        *lock(&self.failing) = None;
    }

    pub fn published(&self) -> Vec<Published> {
        lock(&self.published).clone()
    }

    pub fn take(&self) -> Vec<Published> {
        std::mem::take(&mut *lock(&self.published))
    }
}

impl Broker for MemoryBroker {
    fn dispatch(
        &self,
        topics: &[String],
        payload: &serde_json::Value,
    ) -> Result<(), DispatchError> {
        if let Some(message) = lock(&self.failing).clone() {
            return Err(DispatchError::Broker(message));
        }
        lock(&self.published).push(Published {
            topics: topics.to_vec(),
            payload: payload.clone(),
        });
        Ok(())
    }
}

/// Broker that only writes a metadata log line per publish.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogBroker;

impl Broker for LogBroker {
    fn dispatch(
        &self,
        topics: &[String],
        _payload: &serde_json::Value,
    ) -> Result<(), DispatchError> {
        match topics.first() {
            Some(base) => {
                info!(
                    "event=topic_publish module=topic status=ok base={} topic_count={}",
                    base,
                    topics.len()
                );
                Ok(())
            }
            None => {
                warn!("event=topic_publish module=topic status=error error_code=empty_topics");
                Err(DispatchError::EmptyTopics)
            }
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::{
        entity_topics, tenant_topics, validate_topics, Action, Broker, DispatchError,
        MemoryBroker, TopicDispatcher,
    };
    use crate::model::TenantScope;
    use serde_json::json;
    use std::sync::Arc;
    use uuid::Uuid;

    #[test]
    fn tenant_topics_cover_base_id_scope_and_references() {
        let id = Uuid::new_v4();
        let scope = TenantScope::new(Uuid::new_v4(), Uuid::new_v4());
        let definition = Uuid::new_v4();

        let topics = tenant_topics(
            "account",
            Action::Create,
            id,
            scope,
            &[("general_ledger_definition", definition)],
        );

        assert_eq!(
            topics,
            vec![
                "account.create".to_string(),
                format!("account.create.{id}"),
                format!("account.create.branch.{}", scope.branch_id),
                format!("account.create.organization.{}", scope.organization_id),
                format!("account.create.general_ledger_definition.{definition}"),
            ]
        );
        assert_eq!(
            topics,
            tenant_topics(
                "account",
                Action::Create,
                id,
                scope,
                &[("general_ledger_definition", definition)],
            )
        );
    }

    #[test]
    fn validation_rejects_empty_malformed_and_baseless_sets() {
        assert!(matches!(validate_topics(&[]), Err(DispatchError::EmptyTopics)));
        assert!(matches!(
            validate_topics(&["Bank.create".to_string()]),
            Err(DispatchError::InvalidTopic(_))
        ));
        assert!(matches!(
            validate_topics(&["bank.create.branch.x".to_string()]),
            Err(DispatchError::MissingBaseTopic)
        ));
        assert!(validate_topics(&entity_topics("bank", Action::Delete, Uuid::new_v4(), &[])).is_ok());
    }

    #[test]
    fn dispatcher_publishes_once_per_event() {
        let broker = Arc::new(MemoryBroker::new());
        let dispatcher = TopicDispatcher::new(broker.clone());
        let topics = entity_topics("organization", Action::Update, Uuid::new_v4(), &[]);

        dispatcher.dispatch(&topics, &json!({"name": "Coop"})).unwrap();

        let published = broker.published();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].topics, topics);
        assert_eq!(published[0].payload["name"], "Coop");
    }

    #[test]
    fn failing_memory_broker_reports_broker_error() {
        let broker = MemoryBroker::new();
        broker.fail_with("offline");
        let err = broker
            .dispatch(&["bank.create".to_string()], &json!(null))
            .unwrap_err();
        assert!(matches!(err, DispatchError::Broker(message) if message == "offline"));
        broker.recover();
        assert!(broker.dispatch(&["bank.create".to_string()], &json!(null)).is_ok());
        assert_eq!(broker.take().len(), 1);
        assert!(broker.published().is_empty());
    }
}
