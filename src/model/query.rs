//! Structured queries: which entity, which columns, which records.

use serde::{Deserialize, Serialize};

use super::entity::{Entity, Value};

/// A query for records of a single entity type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryExpression {
    pub entity_name: String,
    pub columns: ColumnSet,
    /// Conditions a record must all satisfy. Empty matches every record.
    pub criteria: Vec<ConditionExpression>,
}

/// Which attributes a query returns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ColumnSet {
    All,
    Columns(Vec<String>),
}

/// A single attribute comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "operator", rename_all = "camelCase")]
pub enum ConditionExpression {
    /// The attribute equals the value. A missing attribute compares as `Null`.
    Equal { attribute: String, value: Value },
}

impl QueryExpression {
    /// A query returning every record of `entity_name` with all columns.
    pub fn new(entity_name: impl Into<String>) -> Self {
        Self {
            entity_name: entity_name.into(),
            columns: ColumnSet::All,
            criteria: Vec::new(),
        }
    }

    #[must_use]
    pub fn select<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = ColumnSet::Columns(columns.into_iter().map(Into::into).collect());
        self
    }

    /// Adds a condition. Conditions are ANDed.
    #[must_use]
    pub fn filter(mut self, condition: ConditionExpression) -> Self {
        self.criteria.push(condition);
        self
    }

    /// Whether `entity` satisfies every condition.
    pub fn matches(&self, entity: &Entity) -> bool {
        self.criteria.iter().all(|c| c.matches(entity))
    }

    /// Copy of `entity` carrying only the requested columns.
    ///
    /// The id always survives projection.
    pub fn project(&self, entity: &Entity) -> Entity {
        match &self.columns {
            ColumnSet::All => entity.clone(),
            ColumnSet::Columns(columns) => Entity {
                logical_name: entity.logical_name.clone(),
                id: entity.id,
                attributes: entity
                    .attributes
                    .iter()
                    .filter(|(name, _)| columns.contains(name))
                    .map(|(name, value)| (name.clone(), value.clone()))
                    .collect(),
            },
        }
    }
}

impl ConditionExpression {
    pub fn equal(attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Equal {
            attribute: attribute.into(),
            value: value.into(),
        }
    }

    pub fn matches(&self, entity: &Entity) -> bool {
        match self {
            Self::Equal { attribute, value } => {
                entity.get(attribute).unwrap_or(&Value::Null) == value
            }
        }
    }
}
