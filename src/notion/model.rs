use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Declared value type of a database property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyType {
    Title,
    RichText,
    MultiSelect,
    Select,
    Url,
    Date,
    Number,
    /// A type with no book encoding (`checkbox`, `people`, ...), kept verbatim.
    Other(String),
}

impl PropertyType {
    pub fn as_str(&self) -> &str {
        match self {
            PropertyType::Title => "title",
            PropertyType::RichText => "rich_text",
            PropertyType::MultiSelect => "multi_select",
            PropertyType::Select => "select",
            PropertyType::Url => "url",
            PropertyType::Date => "date",
            PropertyType::Number => "number",
            PropertyType::Other(other) => other,
        }
    }
}

impl From<&str> for PropertyType {
    fn from(tag: &str) -> Self {
        match tag {
            "title" => PropertyType::Title,
            "rich_text" => PropertyType::RichText,
            "multi_select" => PropertyType::MultiSelect,
            "select" => PropertyType::Select,
            "url" => PropertyType::Url,
            "date" => PropertyType::Date,
            "number" => PropertyType::Number,
            other => PropertyType::Other(other.to_owned()),
        }
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for PropertyType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaProperty {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: PropertyType,
}

/// Property definitions of a database, in the order the API listed them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Schema {
    pub properties: Vec<SchemaProperty>,
}

impl Schema {
    pub fn new(properties: impl IntoIterator<Item = (String, PropertyType)>) -> Self {
        Self {
            properties: properties
                .into_iter()
                .map(|(name, kind)| SchemaProperty { name, kind })
                .collect(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &SchemaProperty> {
        self.properties.iter()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Database {
    pub title: Option<String>,
    pub schema: Schema,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RichText {
    pub text: TextContent,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextContent {
    pub content: String,
}

impl RichText {
    pub fn plain(content: impl Into<String>) -> Vec<RichText> {
        vec![RichText {
            text: TextContent {
                content: content.into(),
            },
        }]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectOption {
    pub name: String,
}

impl SelectOption {
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DateValue {
    pub start: String,
}

/// A type-tagged property value, serialized in the page-create wire shape
/// (`{"rich_text": [...]}`, `{"select": {"name": ..}}`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyValue {
    Title(Vec<RichText>),
    RichText(Vec<RichText>),
    MultiSelect(Vec<SelectOption>),
    Select(SelectOption),
    Url(String),
    Date(DateValue),
    Number(i64),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExternalFile {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FileObject {
    External { external: ExternalFile },
}

impl FileObject {
    pub fn external(url: impl Into<String>) -> Self {
        FileObject::External {
            external: ExternalFile { url: url.into() },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Parent {
    pub database_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreatePageRequest {
    pub parent: Parent,
    pub properties: BTreeMap<String, PropertyValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover: Option<FileObject>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<FileObject>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedPage {
    pub id: String,
    #[serde(default)]
    pub url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn property_values_use_wire_shape() -> anyhow::Result<()> {
        let cases = [
            (
                PropertyValue::Title(RichText::plain("T")),
                serde_json::json!({"title": [{"text": {"content": "T"}}]}),
            ),
            (
                PropertyValue::MultiSelect(vec![SelectOption::named("A")]),
                serde_json::json!({"multi_select": [{"name": "A"}]}),
            ),
            (
                PropertyValue::Select(SelectOption::named("책")),
                serde_json::json!({"select": {"name": "책"}}),
            ),
            (
                PropertyValue::Date(DateValue {
                    start: "2023-05-01".to_owned(),
                }),
                serde_json::json!({"date": {"start": "2023-05-01"}}),
            ),
            (
                PropertyValue::Number(9788936434120),
                serde_json::json!({"number": 9788936434120_i64}),
            ),
        ];

        for (value, expected) in cases {
            assert_eq!(serde_json::to_value(&value)?, expected);
        }
        Ok(())
    }

    #[test]
    fn cover_serializes_as_external_file() -> anyhow::Result<()> {
        let request = CreatePageRequest {
            parent: Parent {
                database_id: "db".to_owned(),
            },
            properties: BTreeMap::new(),
            cover: Some(FileObject::external("https://img/x.jpg")),
            icon: None,
        };
        assert_eq!(
            serde_json::to_value(&request)?,
            serde_json::json!({
                "parent": {"database_id": "db"},
                "properties": {},
                "cover": {"type": "external", "external": {"url": "https://img/x.jpg"}}
            })
        );
        Ok(())
    }

    #[test]
    fn unknown_property_types_keep_their_tag() {
        let kind = PropertyType::from("checkbox");
        assert_eq!(kind, PropertyType::Other("checkbox".to_owned()));
        assert_eq!(kind.to_string(), "checkbox");
        assert_eq!(PropertyType::from("rich_text"), PropertyType::RichText);
    }
}
