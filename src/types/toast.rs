use crate::error::Error;
use crate::types::UserId;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use time::OffsetDateTime;

/// Free-form structured data attached to a toast, returned untouched.
pub type ToastContext = Map<String, Value>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastVariant {
    Success,
    Error,
    #[default]
    Info,
    Warning,
}

impl ToastVariant {
    pub fn as_str(self) -> &'static str {
        match self {
            ToastVariant::Success => "success",
            ToastVariant::Error => "error",
            ToastVariant::Info => "info",
            ToastVariant::Warning => "warning",
        }
    }
}

impl FromStr for ToastVariant {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "success" => Ok(ToastVariant::Success),
            "error" => Ok(ToastVariant::Error),
            "info" => Ok(ToastVariant::Info),
            "warning" => Ok(ToastVariant::Warning),
            other => Err(Error::InvalidVariant(other.to_string())),
        }
    }
}

impl fmt::Display for ToastVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToastEntry {
    pub id: i64,
    #[serde(skip)]
    pub user_id: UserId,
    pub message: String,
    #[serde(rename = "type")]
    pub variant: ToastVariant,
    pub context: ToastContext,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}
