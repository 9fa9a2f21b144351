//! Mutation requests carried by a task.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationKind {
    Create,
    Update,
    Delete,
}

impl fmt::Display for MutationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MutationKind::Create => "create",
            MutationKind::Update => "update",
            MutationKind::Delete => "delete",
        };
        f.write_str(s)
    }
}

/// A conditional mutation against one key.
///
/// Delete carries no value; the enum makes a value-less create/update
/// unrepresentable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Mutation {
    Create { key: String, value: String },
    Update { key: String, value: String },
    Delete { key: String },
}

impl Mutation {
    pub fn create(key: impl Into<String>, value: impl Into<String>) -> Self {
        Mutation::Create {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn update(key: impl Into<String>, value: impl Into<String>) -> Self {
        Mutation::Update {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn delete(key: impl Into<String>) -> Self {
        Mutation::Delete { key: key.into() }
    }

    pub fn kind(&self) -> MutationKind {
        match self {
            Mutation::Create { .. } => MutationKind::Create,
            Mutation::Update { .. } => MutationKind::Update,
            Mutation::Delete { .. } => MutationKind::Delete,
        }
    }

    pub fn key(&self) -> &str {
        match self {
            Mutation::Create { key, .. } | Mutation::Update { key, .. } | Mutation::Delete { key } => {
                key
            }
        }
    }
}
