//! Request and response records exchanged at the boundary.
//!
//! Field names follow the JSON contract of the `/remediate-array` endpoint,
//! so a batch produced by an ABAP extractor deserializes without mapping.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// One unit of ABAP source (a method, form, include section...) plus the
/// metadata that identifies where it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeUnit {
    pub pgm_name: String,
    pub inc_name: String,
    #[serde(rename = "type")]
    pub unit_type: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub class_implementation: Option<String>,
    #[serde(default)]
    pub start_line: Option<i64>,
    #[serde(default)]
    pub end_line: Option<i64>,
    /// Source text. Absent and `null` both mean empty.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub code: String,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl CodeUnit {
    /// Create a unit with only the required identifying fields.
    pub fn new(
        pgm_name: impl Into<String>,
        inc_name: impl Into<String>,
        unit_type: impl Into<String>,
        code: impl Into<String>,
    ) -> Self {
        Self {
            pgm_name: pgm_name.into(),
            inc_name: inc_name.into(),
            unit_type: unit_type.into(),
            name: None,
            class_implementation: None,
            start_line: None,
            end_line: None,
            code: code.into(),
        }
    }

    /// Set the unit name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the source line range.
    pub fn with_lines(mut self, start: i64, end: i64) -> Self {
        self.start_line = Some(start);
        self.end_line = Some(end);
        self
    }
}

/// Kind of variable a SELECT writes into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetType {
    /// `INTO TABLE itab`
    Itab,
    /// `INTO wa`
    Wa,
}

impl fmt::Display for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetType::Itab => write!(f, "itab"),
            TargetType::Wa => write!(f, "wa"),
        }
    }
}

/// Per-statement finding returned in metadata mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemediationRecord {
    pub table: String,
    pub target_type: TargetType,
    pub target_name: String,
    /// Character offset of the statement start in the unit code.
    pub start_char_in_unit: usize,
    /// Character offset one past the terminating period.
    pub end_char_in_unit: usize,
    /// Field usage analysis is not performed; always empty.
    pub used_fields: Vec<String>,
    pub ambiguous: bool,
    pub suggested_fields: Option<Vec<String>>,
    /// Rewritten statement, present only when the filter had to be added.
    pub suggested_statement: Option<String>,
}

/// What a processed unit carries besides its identifying fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitOutcome {
    Selects(Vec<RemediationRecord>),
    RemediatedCode(String),
}

/// Result for one input unit: the unit echoed back plus its outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitResult {
    #[serde(flatten)]
    pub unit: CodeUnit,
    #[serde(flatten)]
    pub outcome: UnitOutcome,
    /// Set only when processing this unit failed internally.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl UnitResult {
    /// Records of a metadata-mode result, empty otherwise.
    pub fn selects(&self) -> &[RemediationRecord] {
        match &self.outcome {
            UnitOutcome::Selects(records) => records,
            UnitOutcome::RemediatedCode(_) => &[],
        }
    }

    /// Rewritten code of a rewrite-mode result.
    pub fn remediated_code(&self) -> Option<&str> {
        match &self.outcome {
            UnitOutcome::RemediatedCode(code) => Some(code),
            UnitOutcome::Selects(_) => None,
        }
    }
}
