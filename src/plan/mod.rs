//! JSON plan format for sequential find/replace steps.
//!
//! A plan is a list of find/replace pairs, each aimed at one file. Steps
//! run in order; the first failing step stops the plan and earlier steps
//! stay applied.

use crate::error::{Result, ReshapeError};
use crate::ingest::detect_language;
use crate::matcher::{find_matches, SearchOptions};
use crate::patch::{patch_file, read_with_hash, BackupWriter, FilePatchSummary};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// A plan containing sequential replacement steps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    /// Steps to execute, in order.
    pub steps: Vec<ReplaceStep>,
}

/// A single step in the plan.
///
/// Each step is equivalent to one `reshape replace` invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplaceStep {
    /// File to edit, relative to the plan's directory.
    pub file: String,

    /// Find snippet.
    pub find: String,

    /// Replacement text. Empty deletes the matches.
    #[serde(default)]
    pub replace: String,

    /// Ignore the declared name of matched constructs.
    #[serde(default)]
    pub ignore_identifiers: bool,

    /// Language tag, detected from the file extension when absent.
    #[serde(default)]
    pub language: Option<String>,
}

/// What one executed step did.
#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    /// 1-based step number.
    pub step: usize,
    /// Patch summary. `replacements` is 0 when nothing matched.
    #[serde(flatten)]
    pub summary: FilePatchSummary,
}

/// Parse and validate a plan file.
///
/// # Arguments
/// * `plan_path` - Path to plan.json file
///
/// # Returns
/// * `Ok(Plan)` - Parsed plan with validated schema
/// * `Err(ReshapeError)` - I/O error, JSON parse error or schema validation error
pub fn parse_plan(plan_path: &Path) -> Result<Plan> {
    let content = fs::read_to_string(plan_path).map_err(|e| ReshapeError::Io {
        path: plan_path.to_path_buf(),
        source: e,
    })?;

    let plan: Plan = serde_json::from_str(&content).map_err(|e| ReshapeError::InvalidPlanSchema {
        message: format!("JSON parse error: {}", e),
    })?;

    validate_plan(&plan)?;
    Ok(plan)
}

fn validate_plan(plan: &Plan) -> Result<()> {
    if plan.steps.is_empty() {
        return Err(ReshapeError::InvalidPlanSchema {
            message: "Plan must contain at least one step".to_string(),
        });
    }

    for (i, step) in plan.steps.iter().enumerate() {
        if step.file.is_empty() {
            return Err(ReshapeError::InvalidPlanSchema {
                message: format!("Step {} has empty 'file' field", i + 1),
            });
        }

        if step.find.trim().is_empty() {
            return Err(ReshapeError::InvalidPlanSchema {
                message: format!("Step {} has empty 'find' field", i + 1),
            });
        }

        if matches!(step.language.as_deref(), Some("")) {
            return Err(ReshapeError::InvalidPlanSchema {
                message: format!("Step {} has empty 'language' field", i + 1),
            });
        }
    }

    Ok(())
}

/// Execute every step of a plan.
///
/// Paths are resolved against `workspace_dir`. With a backup writer, each
/// file is copied aside before its first write.
///
/// # Returns
/// * `Ok(Vec<StepReport>)` - One report per step
/// * `Err(ReshapeError::PlanExecutionFailed)` - The first failing step
pub fn execute_plan(
    plan_path: &Path,
    workspace_dir: &Path,
    mut backup: Option<&mut BackupWriter>,
) -> Result<Vec<StepReport>> {
    let plan = parse_plan(plan_path)?;
    let mut reports = Vec::with_capacity(plan.steps.len());

    for (step_num, step) in plan.steps.iter().enumerate() {
        let step_index = step_num + 1;

        match execute_single_step(step, workspace_dir, backup.as_deref_mut()) {
            Ok(summary) => {
                log::info!(
                    "Step {}: {} replacement(s) in {}",
                    step_index,
                    summary.replacements,
                    summary.file.display()
                );
                reports.push(StepReport {
                    step: step_index,
                    summary,
                });
            }
            Err(e) => {
                return Err(ReshapeError::PlanExecutionFailed {
                    step: step_index,
                    error: e.to_string(),
                });
            }
        }
    }

    Ok(reports)
}

fn execute_single_step(
    step: &ReplaceStep,
    workspace_dir: &Path,
    backup: Option<&mut BackupWriter>,
) -> Result<FilePatchSummary> {
    let file_path = workspace_dir.join(&step.file);

    let language = match &step.language {
        Some(tag) => tag.clone(),
        None => detect_language(&file_path)
            .map(|language| language.as_str().to_string())
            .ok_or_else(|| {
                ReshapeError::Other(format!(
                    "Cannot detect language for file: {}",
                    file_path.display()
                ))
            })?,
    };

    let (original, before_hash) = read_with_hash(&file_path)?;
    let options = SearchOptions {
        ignore_identifiers: step.ignore_identifiers,
        ..SearchOptions::default()
    };
    let matches = find_matches(&original, &step.find, &language, &options)?;

    if matches.is_empty() {
        return Ok(FilePatchSummary {
            file: file_path,
            replacements: 0,
            after_hash: before_hash.clone(),
            before_hash,
        });
    }

    if let Some(writer) = backup {
        writer.backup_file(&file_path)?;
    }

    patch_file(&file_path, &matches, &step.replace)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_step_defaults() {
        let json = r#"{"steps": [{"file": "src/app.ts", "find": "foo();"}]}"#;
        let plan: Plan = serde_json::from_str(json).expect("Failed to parse plan");
        assert_eq!(plan.steps.len(), 1);
        assert_eq!(plan.steps[0].replace, "");
        assert!(!plan.steps[0].ignore_identifiers);
        assert_eq!(plan.steps[0].language, None);
        assert!(validate_plan(&plan).is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_plan_and_fields() {
        let empty = Plan { steps: vec![] };
        assert!(matches!(
            validate_plan(&empty),
            Err(ReshapeError::InvalidPlanSchema { .. })
        ));

        let blank_find: Plan =
            serde_json::from_str(r#"{"steps": [{"file": "a.ts", "find": "  "}]}"#)
                .expect("Failed to parse plan");
        match validate_plan(&blank_find) {
            Err(ReshapeError::InvalidPlanSchema { message }) => assert!(message.contains("'find'")),
            other => panic!("Expected schema error, got {:?}", other),
        }
    }
}
