//! Decoding of Notion page properties.
//!
//! Notion tags every property value with a `type`. The shapes this crate
//! reads form a closed enum; anything else decodes to
//! [`PropertyValue::Unsupported`]. Each field extractor is total: a missing
//! property or an unexpected shape yields an empty result, never an error.

use std::collections::{BTreeSet, HashMap};

use serde::Deserialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RichTextSpan {
    #[serde(default)]
    pub plain_text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SelectOption {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DateValue {
    #[serde(default)]
    pub start: Option<String>,
}

/// A property value as returned by the Notion API.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PropertyValue {
    Title {
        #[serde(default)]
        title: Vec<RichTextSpan>,
    },
    RichText {
        #[serde(default)]
        rich_text: Vec<RichTextSpan>,
    },
    Select {
        #[serde(default)]
        select: Option<SelectOption>,
    },
    MultiSelect {
        #[serde(default)]
        multi_select: Vec<SelectOption>,
    },
    Date {
        #[serde(default)]
        date: Option<DateValue>,
    },
    #[serde(other)]
    Unsupported,
}

pub type Properties = HashMap<String, PropertyValue>;

fn join_spans(spans: &[RichTextSpan]) -> String {
    spans
        .iter()
        .map(|span| span.plain_text.as_str())
        .collect::<String>()
}

fn normalize(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Text of a title property.
pub fn title_text(props: &Properties, name: &str) -> String {
    match props.get(name) {
        Some(PropertyValue::Title { title }) => join_spans(title).trim().to_string(),
        _ => String::new(),
    }
}

/// Text of a rich-text property, or the option name of a select.
pub fn plain_text(props: &Properties, name: &str) -> String {
    match props.get(name) {
        Some(PropertyValue::RichText { rich_text }) => join_spans(rich_text).trim().to_string(),
        Some(PropertyValue::Select {
            select: Some(option),
        }) => option.name.trim().to_string(),
        _ => String::new(),
    }
}

/// Start of a date property.
pub fn date_start(props: &Properties, name: &str) -> Option<String> {
    match props.get(name) {
        Some(PropertyValue::Date { date: Some(date) }) => date.start.clone(),
        _ => None,
    }
}

/// Category labels from a multi-select, a select, or comma-separated text.
pub fn categories(props: &Properties, name: &str) -> BTreeSet<String> {
    match props.get(name) {
        Some(PropertyValue::MultiSelect { multi_select }) => multi_select
            .iter()
            .filter_map(|option| normalize(&option.name))
            .collect(),
        Some(PropertyValue::Select {
            select: Some(option),
        }) => normalize(&option.name).into_iter().collect(),
        Some(PropertyValue::RichText { rich_text }) => {
            join_spans(rich_text).split(',').filter_map(normalize).collect()
        }
        _ => BTreeSet::new(),
    }
}
