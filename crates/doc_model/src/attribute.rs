//! Structural attributes carried by table nodes

use crate::{DocModelError, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Keys of the attributes the table engine reads and writes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttributeKey {
    HeadingRows,
    HeadingColumns,
    Colspan,
    Rowspan,
    ColumnWidth,
}

impl AttributeKey {
    /// Attribute name as it appears in outlines and change logs
    pub fn name(self) -> &'static str {
        match self {
            AttributeKey::HeadingRows => "headingRows",
            AttributeKey::HeadingColumns => "headingColumns",
            AttributeKey::Colspan => "colspan",
            AttributeKey::Rowspan => "rowspan",
            AttributeKey::ColumnWidth => "columnWidth",
        }
    }

    /// Implicit value of a numeric attribute when it is absent
    pub fn numeric_default(self) -> Option<u32> {
        match self {
            AttributeKey::HeadingRows | AttributeKey::HeadingColumns => Some(0),
            AttributeKey::Colspan | AttributeKey::Rowspan => Some(1),
            AttributeKey::ColumnWidth => None,
        }
    }
}

impl std::fmt::Display for AttributeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Value of a structural attribute
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttributeValue {
    Number(u32),
    Width(ColumnWidth),
}

impl AttributeValue {
    pub fn as_number(&self) -> Option<u32> {
        match self {
            AttributeValue::Number(n) => Some(*n),
            AttributeValue::Width(_) => None,
        }
    }

    pub fn as_width(&self) -> Option<ColumnWidth> {
        match self {
            AttributeValue::Width(w) => Some(*w),
            AttributeValue::Number(_) => None,
        }
    }
}

impl std::fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AttributeValue::Number(n) => write!(f, "{}", n),
            AttributeValue::Width(w) => write!(f, "{}", w),
        }
    }
}

impl From<u32> for AttributeValue {
    fn from(value: u32) -> Self {
        AttributeValue::Number(value)
    }
}

impl From<ColumnWidth> for AttributeValue {
    fn from(value: ColumnWidth) -> Self {
        AttributeValue::Width(value)
    }
}

/// Store a numeric attribute canonically: the default value is kept as `None`.
pub(crate) fn canonical(value: u32, default: u32) -> Option<u32> {
    if value == default {
        None
    } else {
        Some(value)
    }
}

/// Extract the numeric payload of an attribute write, or fail for the wrong kind.
pub(crate) fn expect_number(
    key: AttributeKey,
    value: Option<AttributeValue>,
) -> Result<Option<u32>> {
    match value {
        None => Ok(None),
        Some(AttributeValue::Number(n)) => Ok(Some(n)),
        Some(other) => Err(DocModelError::InvalidAttributeValue {
            key,
            value: other.to_string(),
        }),
    }
}

// =============================================================================
// Column Width
// =============================================================================

/// Width of one grid column in the column-width side table
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum ColumnWidth {
    /// Percentage of the table width
    Percent(f64),
    /// Width not yet decided; receives a share of the remainder on normalization
    Auto,
}

impl ColumnWidth {
    pub fn percent(&self) -> Option<f64> {
        match self {
            ColumnWidth::Percent(p) => Some(*p),
            ColumnWidth::Auto => None,
        }
    }

    pub fn is_auto(&self) -> bool {
        matches!(self, ColumnWidth::Auto)
    }
}

impl std::fmt::Display for ColumnWidth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ColumnWidth::Percent(p) => write!(f, "{}%", p),
            ColumnWidth::Auto => f.write_str("auto"),
        }
    }
}

impl FromStr for ColumnWidth {
    type Err = DocModelError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("auto") {
            return Ok(ColumnWidth::Auto);
        }
        let number = trimmed.strip_suffix('%').unwrap_or(trimmed).trim();
        match number.parse::<f64>() {
            Ok(value) if value.is_finite() && value >= 0.0 => Ok(ColumnWidth::Percent(value)),
            _ => Err(DocModelError::InvalidColumnWidth(s.to_string())),
        }
    }
}

impl From<ColumnWidth> for String {
    fn from(width: ColumnWidth) -> Self {
        width.to_string()
    }
}

impl TryFrom<String> for ColumnWidth {
    type Error = DocModelError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}
