//! Unit processor: locate, inject, edit, and assemble per-unit results.

use std::panic::{self, AssertUnwindSafe};

use crate::config::{OutputMode, RemediatorConfig};
use crate::editor::{Edit, apply_edits};
use crate::injector::build_replacement;
use crate::locator::{CharCursor, find_selects};
use crate::model::{CodeUnit, RemediationRecord, UnitOutcome, UnitResult};

/// Everything derived from one unit's code in a single pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnitAnalysis {
    /// One record per located statement, in source order.
    pub records: Vec<RemediationRecord>,
    /// Byte-span edits against the original code.
    pub edits: Vec<Edit>,
    /// The code with `edits` applied.
    pub remediated_code: String,
}

impl UnitAnalysis {
    /// Number of statements that received a suggestion.
    pub fn suggestion_count(&self) -> usize {
        self.edits.len()
    }
}

/// Stateless remediation engine. Cheap to share behind an `Arc`.
#[derive(Debug, Clone, Default)]
pub struct Remediator {
    config: RemediatorConfig,
}

impl Remediator {
    pub fn new(config: RemediatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RemediatorConfig {
        &self.config
    }

    pub fn mode(&self) -> OutputMode {
        self.config.mode
    }

    /// Locate every `SELECT *` in `code` and compute its suggestion.
    ///
    /// Record offsets are character offsets into `code`; edits use bytes.
    pub fn analyze(&self, code: &str) -> UnitAnalysis {
        let mut records = Vec::new();
        let mut edits = Vec::new();
        let mut cursor = CharCursor::new(code);

        for stmt in find_selects(code) {
            let suggested = build_replacement(&stmt, self.config.normalize_whitespace);
            tracing::debug!(
                "SELECT * FROM {} into {} {} at {:?} ({})",
                stmt.table,
                stmt.target_type,
                stmt.target_name,
                stmt.span,
                if suggested.is_some() { "needs filter" } else { "unchanged" }
            );

            if let Some(ref replacement) = suggested {
                edits.push(Edit::new(stmt.span.clone(), replacement.clone()));
            }

            let chars = cursor.char_span(stmt.span.clone());
            records.push(RemediationRecord {
                table: stmt.table.to_string(),
                target_type: stmt.target_type,
                target_name: stmt.target_name.to_string(),
                start_char_in_unit: chars.start,
                end_char_in_unit: chars.end,
                used_fields: Vec::new(),
                ambiguous: false,
                suggested_fields: None,
                suggested_statement: suggested,
            });
        }

        let remediated_code = apply_edits(code, &edits);
        UnitAnalysis {
            records,
            edits,
            remediated_code,
        }
    }

    /// Process one unit according to the configured output mode.
    pub fn process_unit(&self, unit: &CodeUnit) -> UnitResult {
        let analysis = self.analyze(&unit.code);
        let outcome = match self.config.mode {
            OutputMode::Metadata => UnitOutcome::Selects(analysis.records),
            OutputMode::Rewrite => UnitOutcome::RemediatedCode(analysis.remediated_code),
        };

        UnitResult {
            unit: unit.clone(),
            outcome,
            error: None,
        }
    }

    /// Process a batch, preserving input order.
    ///
    /// Each unit runs in its own unwind guard: a unit that fails internally
    /// comes back with `error` set and does not affect its siblings.
    pub fn process_batch(&self, units: &[CodeUnit]) -> Vec<UnitResult> {
        self.process_batch_with(units, |unit| self.process_unit(unit))
    }

    fn process_batch_with<F>(&self, units: &[CodeUnit], process: F) -> Vec<UnitResult>
    where
        F: Fn(&CodeUnit) -> UnitResult,
    {
        let results: Vec<UnitResult> = units
            .iter()
            .map(|unit| self.run_isolated(unit, &process))
            .collect();

        let statements: usize = results.iter().map(|r| r.selects().len()).sum();
        let failed = results.iter().filter(|r| r.error.is_some()).count();
        tracing::info!(
            "Processed {} unit(s) in {} mode: {} statement(s), {} failed",
            results.len(),
            self.config.mode,
            statements,
            failed
        );
        results
    }

    fn run_isolated<F>(&self, unit: &CodeUnit, f: F) -> UnitResult
    where
        F: FnOnce(&CodeUnit) -> UnitResult,
    {
        match panic::catch_unwind(AssertUnwindSafe(|| f(unit))) {
            Ok(result) => result,
            Err(payload) => {
                let message = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown failure".to_string());
                tracing::error!(
                    "Unit {}/{} failed: {}",
                    unit.pgm_name,
                    unit.inc_name,
                    message
                );

                let outcome = match self.config.mode {
                    OutputMode::Metadata => UnitOutcome::Selects(Vec::new()),
                    OutputMode::Rewrite => UnitOutcome::RemediatedCode(unit.code.clone()),
                };
                UnitResult {
                    unit: unit.clone(),
                    outcome,
                    error: Some(format!("internal error: {message}")),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TargetType;
    use pretty_assertions::assert_eq;

    fn metadata() -> Remediator {
        Remediator::default()
    }

    fn rewrite() -> Remediator {
        Remediator::new(RemediatorConfig::builder().mode(OutputMode::Rewrite).build())
    }

    #[test]
    fn test_metadata_record_fields() {
        let analysis = metadata().analyze("SELECT * FROM VBRK INTO TABLE LT_VBRK.");
        assert_eq!(
            analysis.records,
            vec![RemediationRecord {
                table: "VBRK".to_string(),
                target_type: TargetType::Itab,
                target_name: "LT_VBRK".to_string(),
                start_char_in_unit: 0,
                end_char_in_unit: 38,
                used_fields: vec![],
                ambiguous: false,
                suggested_fields: None,
                suggested_statement: Some(
                    "SELECT * FROM VBRK WHERE VBRK-DRAFT = SPACE INTO TABLE LT_VBRK.".to_string()
                ),
            }]
        );
    }

    #[test]
    fn test_span_matches_original_text() {
        let code = "DATA lt TYPE TABLE OF vbrk.\n\nSELECT *\n  FROM vbrk\n  INTO TABLE lt.\nSELECT SINGLE * FROM mara INTO ls_mara.\n";
        let analysis = metadata().analyze(code);
        assert_eq!(analysis.records.len(), 2);
        for record in &analysis.records {
            let text: String = code
                .chars()
                .skip(record.start_char_in_unit)
                .take(record.end_char_in_unit - record.start_char_in_unit)
                .collect();
            assert!(text.starts_with("SELECT"));
            assert!(text.ends_with('.'));
        }
    }

    #[test]
    fn test_rewrite_applies_all_edits() {
        let code = "SELECT * FROM VBRK INTO TABLE LT_K.\nSELECT * FROM MARA INTO TABLE LT_M.\nSELECT SINGLE * FROM VBRP WHERE POSNR = '10' INTO LS_P.\n";
        let unit = CodeUnit::new("ZPROG", "ZPROG", "PROG", code);
        let result = rewrite().process_unit(&unit);
        assert_eq!(
            result.remediated_code(),
            Some(
                "SELECT * FROM VBRK WHERE VBRK-DRAFT = SPACE INTO TABLE LT_K.\nSELECT * FROM MARA INTO TABLE LT_M.\nSELECT SINGLE * FROM VBRP WHERE VBRP-DRAFT = SPACE AND POSNR = '10' INTO LS_P.\n"
            )
        );
        assert!(result.selects().is_empty());
    }

    #[test]
    fn test_rewrite_without_matches_keeps_code() {
        let code = "WRITE: / 'no selects here'.";
        let result = rewrite().process_unit(&CodeUnit::new("Z", "Z", "PROG", code));
        assert_eq!(result.remediated_code(), Some(code));
    }

    #[test]
    fn test_empty_code() {
        let unit = CodeUnit::new("Z", "Z", "PROG", "");
        assert!(metadata().process_unit(&unit).selects().is_empty());
        assert_eq!(rewrite().process_unit(&unit).remediated_code(), Some(""));
    }

    #[test]
    fn test_normalized_suggestions() {
        let remediator = Remediator::new(RemediatorConfig::builder().normalize(true).build());
        let analysis = remediator.analyze("SELECT *\n   FROM vbrk\n   INTO TABLE lt.");
        assert_eq!(
            analysis.records[0].suggested_statement.as_deref(),
            Some("SELECT * FROM vbrk WHERE VBRK-DRAFT = SPACE INTO TABLE lt.")
        );
    }

    #[test]
    fn test_batch_preserves_order() {
        let units = vec![
            CodeUnit::new("A", "A", "FORM", "SELECT * FROM MARA INTO TABLE LT."),
            CodeUnit::new("B", "B", "FORM", ""),
            CodeUnit::new("C", "C", "FORM", "SELECT * FROM VBRK INTO TABLE LT."),
        ];
        let results = metadata().process_batch(&units);
        let names: Vec<_> = results.iter().map(|r| r.unit.pgm_name.as_str()).collect();
        assert_eq!(names, vec!["A", "B", "C"]);
        assert_eq!(results[0].selects()[0].suggested_statement, None);
        assert!(results[1].selects().is_empty());
        assert!(results[2].selects()[0].suggested_statement.is_some());
    }

    #[test]
    fn test_failing_unit_is_isolated() {
        let unit = CodeUnit::new("ZPROG", "ZPROG_F01", "FORM", "SELECT * FROM VBRK INTO TABLE LT.");
        let remediator = rewrite();
        let result = remediator.run_isolated(&unit, |_| panic!("span bookkeeping broke"));
        assert_eq!(
            result.error.as_deref(),
            Some("internal error: span bookkeeping broke")
        );
        assert_eq!(result.remediated_code(), Some(unit.code.as_str()));

        let ok = remediator.run_isolated(&unit, |u| remediator.process_unit(u));
        assert_eq!(ok.error, None);
    }
    #[test]
    fn test_failing_unit_in_batch_keeps_siblings() {
        let units = vec![
            CodeUnit::new("A", "A", "FORM", "SELECT * FROM VBRK INTO TABLE LT_A."),
            CodeUnit::new("B", "B", "FORM", "SELECT * FROM VBRP INTO TABLE LT_B."),
            CodeUnit::new("C", "C", "FORM", "SELECT SINGLE * FROM VBRK INTO LS_C."),
        ];
        let remediator = metadata();
        let results = remediator.process_batch_with(&units, |unit| {
            if unit.pgm_name == "B" {
                panic!("unit B cannot be processed");
            }
            remediator.process_unit(unit)
        });

        let names: Vec<_> = results.iter().map(|r| r.unit.pgm_name.as_str()).collect();
        assert_eq!(names, vec!["A", "B", "C"]);

        assert_eq!(results[0].error, None);
        assert_eq!(
            results[0].selects()[0].suggested_statement.as_deref(),
            Some("SELECT * FROM VBRK WHERE VBRK-DRAFT = SPACE INTO TABLE LT_A.")
        );

        assert_eq!(
            results[1].error.as_deref(),
            Some("internal error: unit B cannot be processed")
        );
        assert!(results[1].selects().is_empty());
        assert_eq!(results[1].unit, units[1]);

        assert_eq!(results[2].error, None);
        assert_eq!(
            results[2].selects()[0].suggested_statement.as_deref(),
            Some("SELECT SINGLE * FROM VBRK WHERE VBRK-DRAFT = SPACE INTO LS_C.")
        );
    }

    #[test]
    fn test_failing_unit_in_rewrite_batch_returns_original_code() {
        let units = vec![
            CodeUnit::new("A", "A", "FORM", "SELECT * FROM VBRK INTO TABLE LT."),
            CodeUnit::new("B", "B", "FORM", "SELECT * FROM VBRP INTO TABLE LT."),
        ];
        let remediator = rewrite();
        let results = remediator.process_batch_with(&units, |unit| {
            if unit.pgm_name == "A" {
                panic!("unit {} failed", unit.pgm_name);
            }
            remediator.process_unit(unit)
        });

        assert_eq!(results[0].error.as_deref(), Some("internal error: unit A failed"));
        assert_eq!(results[0].remediated_code(), Some(units[0].code.as_str()));
        assert_eq!(results[1].error, None);
        assert_eq!(
            results[1].remediated_code(),
            Some("SELECT * FROM VBRP WHERE VBRP-DRAFT = SPACE INTO TABLE LT.")
        );
    }

    #[test]
    fn test_rewrite_with_normalized_whitespace() {
        let remediator = Remediator::new(
            RemediatorConfig::builder()
                .mode(OutputMode::Rewrite)
                .normalize(true)
                .build(),
        );
        let code = "FORM read.
  SELECT *
    FROM vbrk
    INTO TABLE lt.
  SELECT * FROM mara
    INTO TABLE lm.
ENDFORM.
";
        let result = remediator.process_unit(&CodeUnit::new("Z", "Z", "FORM", code));
        assert_eq!(
            result.remediated_code(),
            Some(
                "FORM read.
  SELECT * FROM vbrk WHERE VBRK-DRAFT = SPACE INTO TABLE lt.
  SELECT * FROM mara
    INTO TABLE lm.
ENDFORM.
"
            )
        );
    }
}
