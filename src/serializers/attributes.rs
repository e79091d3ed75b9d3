use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::global_id::to_global_id;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AttributeInputType {
    Dropdown,
    Multiselect,
    File,
    Reference,
    Numeric,
    RichText,
    Swatch,
    Boolean,
    Date,
    DateTime,
}

impl AttributeInputType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttributeInputType::Dropdown => "dropdown",
            AttributeInputType::Multiselect => "multiselect",
            AttributeInputType::File => "file",
            AttributeInputType::Reference => "reference",
            AttributeInputType::Numeric => "numeric",
            AttributeInputType::RichText => "rich-text",
            AttributeInputType::Swatch => "swatch",
            AttributeInputType::Boolean => "boolean",
            AttributeInputType::Date => "date",
            AttributeInputType::DateTime => "date-time",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    pub pk: String,
    pub name: String,
    pub slug: String,
    pub input_type: AttributeInputType,
    #[serde(default)]
    pub unit: Option<String>,
    /// Node type referenced values point at (e.g. `Page`, `Product`).
    #[serde(default)]
    pub entity_type: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeFile {
    pub content_type: Option<String>,
    pub file_url: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AttributeValue {
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub file: Option<AttributeFile>,
    /// Primary key of the referenced node.
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub rich_text: Option<Value>,
    #[serde(default)]
    pub date_time: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub boolean: Option<bool>,
}

/// An attribute together with the values a product or variant has for it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AssignedAttribute {
    pub attribute: Attribute,
    pub values: Vec<AttributeValue>,
}

fn serialize_value(attribute: &Attribute, value: &AttributeValue) -> Value {
    let file = value.file.as_ref().map(|file| {
        json!({
            "content_type": file.content_type,
            "file_url": file.file_url,
        })
    });
    let reference = value.reference.as_ref().map(|pk| match &attribute.entity_type {
        Some(entity_type) => to_global_id(entity_type, pk),
        None => pk.clone(),
    });

    json!({
        "name": value.name,
        "slug": value.slug,
        "value": value.value,
        "file": file,
        "reference": reference,
        "rich_text": value.rich_text,
        "date_time": value.date_time,
        "date": value.date,
        "boolean": value.boolean,
    })
}

/// One JSON object per assigned attribute, values in assignment order.
pub fn serialize_attributes(assigned: &[AssignedAttribute]) -> Vec<Value> {
    assigned
        .iter()
        .map(|AssignedAttribute { attribute, values }| {
            json!({
                "id": to_global_id("Attribute", &attribute.pk),
                "name": attribute.name,
                "slug": attribute.slug,
                "input_type": attribute.input_type.as_str(),
                "unit": attribute.unit,
                "entity_type": attribute.entity_type,
                "values": values
                    .iter()
                    .map(|value| serialize_value(attribute, value))
                    .collect::<Vec<_>>(),
            })
        })
        .collect()
}
