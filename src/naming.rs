//! Canonical dynamic content names
//!
//! Fields map to `TF::Title-<title>`, options to `TF::Title-<field>::<value>`.
//! Content created by earlier runs carries these exact names, so the format
//! must not change.

use crate::extract::{FieldRecord, OptionRecord};
use serde::Serialize;

pub const KEY_PREFIX: &str = "TF::Title-";
pub const OPTION_SEPARATOR: &str = "::";

/// Dynamic content to create: name plus the text of its default variant
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ContentItem {
    pub key: String,
    pub body: String,
}

impl From<&FieldRecord> for ContentItem {
    fn from(field: &FieldRecord) -> Self {
        Self {
            key: format!("{}{}", KEY_PREFIX, field.title()),
            body: field.title().to_string(),
        }
    }
}

impl From<&OptionRecord> for ContentItem {
    fn from(option: &OptionRecord) -> Self {
        Self {
            key: format!(
                "{}{}{}{}",
                KEY_PREFIX,
                option.field_name(),
                OPTION_SEPARATOR,
                option.option_value()
            ),
            body: option.option_value().to_string(),
        }
    }
}

/// Fields first, then options, each in extract order
pub fn resolve<F, O>(fields: F, options: O) -> Vec<ContentItem>
where
    F: IntoIterator<Item = FieldRecord>,
    O: IntoIterator<Item = OptionRecord>,
{
    fields
        .into_iter()
        .map(|f| ContentItem::from(&f))
        .chain(options.into_iter().map(|o| ContentItem::from(&o)))
        .collect()
}
