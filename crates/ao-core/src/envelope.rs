//! Response envelope returned by every configuration-store endpoint, plus the
//! structured validation messages carried by rejected requests.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_json::value::RawValue;

use crate::error::{AoError, AoResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub items: Vec<Box<RawValue>>,
    #[serde(default)]
    pub count: usize,
}

impl Envelope {
    pub fn parse(body: &str) -> AoResult<Self> {
        serde_json::from_str(body).map_err(|e| AoError::decode("response envelope", e))
    }

    /// Decode the envelope's only item.
    ///
    /// Returns `None` for an empty item list; more than one item is an inconsistency.
    pub fn single_item<T: DeserializeOwned>(&self, what: &'static str) -> AoResult<Option<T>> {
        if self.count > 1 || self.items.len() > 1 {
            return Err(AoError::Inconsistency(format!(
                "multiple items not supported in {what} response (count {}, items {})",
                self.count,
                self.items.len()
            )));
        }
        match self.items.first() {
            Some(raw) => serde_json::from_str(raw.get())
                .map(Some)
                .map_err(|e| AoError::decode(what, e)),
            None => Ok(None),
        }
    }

    pub fn validation_report(&self) -> ValidationReport {
        let items = self
            .items
            .iter()
            .map(|raw| match serde_json::from_str::<ValidationItem>(raw.get()) {
                Ok(item) => ReportItem::Structured(item),
                Err(_) => ReportItem::Raw(raw.get().to_string()),
            })
            .collect();
        ValidationReport {
            message: self.message.clone(),
            items,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationItem {
    #[serde(default)]
    pub application: String,
    #[serde(default)]
    pub environment: String,
    #[serde(default)]
    pub messages: Vec<ValidationMessage>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationMessage {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub field: ValidationField,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationField {
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub value: Value,
    #[serde(default)]
    pub source: String,
}

#[derive(Debug, Clone)]
pub enum ReportItem {
    Structured(ValidationItem),
    /// Item that did not have the per-field shape; kept verbatim.
    Raw(String),
}

/// Validation failure reported by the store, rendered verbatim for the user.
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub message: String,
    pub items: Vec<ReportItem>,
}

impl ValidationReport {
    /// Report for a rejection whose body was not a store envelope.
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            message: text.into(),
            items: Vec::new(),
        }
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.message.is_empty() {
            write!(f, "{}:", self.message)?;
        }
        for item in &self.items {
            match item {
                ReportItem::Structured(item) => {
                    write!(f, "\n\t{}/{}:", item.environment, item.application)?;
                    for msg in &item.messages {
                        write!(
                            f,
                            "\n\t\t{} ({}) in {}\n\t\t\t{}",
                            msg.field.path,
                            display_value(&msg.field.value),
                            msg.field.source,
                            msg.message
                        )?;
                    }
                }
                ReportItem::Raw(text) => write!(f, "\n\t{text}")?,
            }
        }
        Ok(())
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
