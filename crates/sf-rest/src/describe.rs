//! Describe types.
//!
//! Only the parts of the describe payloads the query editor uses are
//! modelled; everything else is ignored on deserialization.

use serde::{Deserialize, Serialize};

/// Result of the describeGlobal operation.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DescribeGlobalResult {
    #[serde(default)]
    pub encoding: Option<String>,
    #[serde(rename = "maxBatchSize", default)]
    pub max_batch_size: Option<u32>,
    pub sobjects: Vec<SObjectBasicInfo>,
}

/// Basic information about an SObject from describeGlobal.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SObjectBasicInfo {
    pub name: String,
    pub label: String,
    #[serde(rename = "labelPlural", default)]
    pub label_plural: Option<String>,
    #[serde(rename = "keyPrefix", default)]
    pub key_prefix: Option<String>,
    #[serde(default)]
    pub custom: bool,
    #[serde(default)]
    pub queryable: bool,
    #[serde(default)]
    pub createable: bool,
    #[serde(default)]
    pub updateable: bool,
    #[serde(default)]
    pub deletable: bool,
}

/// SObject describe result.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DescribeSObjectResult {
    pub name: String,
    pub label: String,
    #[serde(rename = "labelPlural", default)]
    pub label_plural: Option<String>,
    #[serde(rename = "keyPrefix", default)]
    pub key_prefix: Option<String>,
    #[serde(default)]
    pub custom: bool,
    #[serde(default)]
    pub queryable: bool,
    #[serde(default)]
    pub createable: bool,
    #[serde(default)]
    pub updateable: bool,
    #[serde(default)]
    pub deletable: bool,
    #[serde(rename = "childRelationships", default)]
    pub child_relationships: Vec<ChildRelationship>,
    pub fields: Vec<FieldDescribe>,
}

impl DescribeSObjectResult {
    /// Field names in describe order.
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }
}

/// Child relationship metadata for an SObject.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChildRelationship {
    #[serde(rename = "childSObject")]
    pub child_sobject: String,
    pub field: String,
    #[serde(rename = "relationshipName", default)]
    pub relationship_name: Option<String>,
}

/// Field metadata from an SObject describe.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FieldDescribe {
    pub name: String,
    #[serde(default)]
    pub label: String,
    #[serde(rename = "type", default)]
    pub field_type: String,
    #[serde(default)]
    pub custom: Option<bool>,
    #[serde(default)]
    pub length: Option<i32>,
    #[serde(default)]
    pub nillable: bool,
    #[serde(default)]
    pub filterable: bool,
    #[serde(default)]
    pub sortable: bool,
    #[serde(rename = "referenceTo", default)]
    pub reference_to: Option<Vec<String>>,
    #[serde(rename = "relationshipName", default)]
    pub relationship_name: Option<String>,
    #[serde(rename = "picklistValues", default)]
    pub picklist_values: Option<Vec<PicklistValue>>,
}

/// Picklist value for picklist fields.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PicklistValue {
    pub value: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub active: bool,
    #[serde(rename = "defaultValue", default)]
    pub default_value: bool,
}

/// Compact field view for editor autocomplete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSummary {
    pub name: String,
    pub label: String,
    #[serde(rename = "type")]
    pub field_type: String,
    /// Lookup or master-detail field that can be traversed by relationship name.
    pub is_relationship: bool,
    pub relationship_name: Option<String>,
    pub reference_to: Vec<String>,
}

impl From<&FieldDescribe> for FieldSummary {
    fn from(field: &FieldDescribe) -> Self {
        let reference_to = field.reference_to.clone().unwrap_or_default();
        Self {
            name: field.name.clone(),
            label: field.label.clone(),
            field_type: field.field_type.clone(),
            is_relationship: field.field_type == "reference"
                && field.relationship_name.is_some()
                && !reference_to.is_empty(),
            relationship_name: field.relationship_name.clone(),
            reference_to,
        }
    }
}
