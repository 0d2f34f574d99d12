//! Reshape CLI binary
//!
//! This is the main entry point for the reshape command-line interface.
//! The CLI is a thin adapter over the library APIs.

use reshape::cli::{BackupArgs, CliErrorPayload, CliSuccessPayload, Commands, FindArgs, ReplaceArgs};
use reshape::ingest::detect_language;
use reshape::matcher::SearchOptions;
use reshape::patch::{
    apply_to_files, find_in_files, restore_from_manifest, ApplyFilesConfig, BackupWriter,
    FileBuffer, TextBuffer,
};
use reshape::session::Session;
use reshape::ReshapeError;
use serde_json::json;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

type CommandResult = Result<CliSuccessPayload, ReshapeError>;

fn main() -> ExitCode {
    // Parse CLI arguments
    let cli = reshape::cli::parse_args();

    // Initialize logger if verbose
    if cli.verbose {
        env_logger::init();
    }

    let result = match cli.command {
        Commands::Find {
            file,
            find,
            preview,
        } => execute_find(&file, &find, preview.as_deref()),
        Commands::Replace {
            file,
            find,
            replace,
            backup,
        } => execute_replace(&file, &find, &replace, &backup),
        Commands::ApplyFiles {
            glob,
            find,
            replace,
            backup,
        } => execute_apply_files(&glob, &find, &replace, &backup),
        Commands::Plan { file, backup } => execute_plan(&file, &backup),
        Commands::Undo { manifest } => execute_undo(&manifest),
    };

    match result {
        Ok(payload) => {
            if cli.json {
                print_json(&payload);
            } else {
                println!("{}", payload.message);
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            if cli.json {
                print_json(&CliErrorPayload::from_error(&e));
            } else {
                eprintln!("Error: {}", e);
                if let Some(hint) = e.hint() {
                    eprintln!("Hint: {}", hint);
                }
            }
            ExitCode::from(1)
        }
    }
}

fn print_json<T: serde::Serialize>(payload: &T) {
    match serde_json::to_string_pretty(payload) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error: failed to serialize output: {}", e),
    }
}

/// Execute the find command.
fn execute_find(file: &Path, args: &FindArgs, preview: Option<&str>) -> CommandResult {
    let buffer = FileBuffer::open(file)?;
    let (snippet, language, options) = search_inputs(args, Some(file))?;

    let mut session = Session::new();
    let set = session.find_in(&buffer, &snippet, &language, &options)?;
    let text = buffer.text();

    let mut lines = vec![format!("{} match(es) in {}", set.len(), file.display())];
    let mut entries = Vec::with_capacity(set.len());
    for result in set.matches() {
        let position = buffer.position_at(result.span.start);
        lines.push(format!(
            "{}:{}:{}: {}",
            file.display(),
            position.line + 1,
            position.column + 1,
            result.label()
        ));
        if let Some(replacement) = preview {
            lines.push(result.describe(&text, replacement, &language));
        }
        entries.push(json!({
            "line": position.line + 1,
            "column": position.column,
            "text": text.get(result.span.start..result.span.end).unwrap_or(""),
            "match": result,
        }));
    }

    Ok(CliSuccessPayload::with_data(
        lines.join("\n"),
        json!({ "file": file, "language": language, "matches": entries }),
    ))
}

/// Execute the replace command.
fn execute_replace(
    file: &Path,
    args: &FindArgs,
    replace: &ReplaceArgs,
    backup: &BackupArgs,
) -> CommandResult {
    let file = canonical(file)?;
    let mut buffer = FileBuffer::open(&file)?;
    let (snippet, language, options) = search_inputs(args, Some(&file))?;
    let replacement = read_text(replace.replace.as_deref(), replace.replace_file.as_deref())?;

    let mut session = Session::new();
    if session.find_in(&buffer, &snippet, &language, &options)?.is_empty() {
        return Ok(CliSuccessPayload::message_only(format!(
            "No matches in {}",
            file.display()
        )));
    }

    let writer = match backup.create_backup {
        true => {
            let workspace_dir = file.parent().ok_or_else(|| {
                ReshapeError::Other("Cannot determine workspace directory".to_string())
            })?;
            let mut writer = BackupWriter::new(workspace_dir, backup.operation_id.clone())?;
            writer.backup_file(&file)?;
            Some(writer)
        }
        false => None,
    };

    let outcome = session.replace(&mut buffer, &replacement)?;
    if let Some(save_error) = outcome.save_error {
        return Err(ReshapeError::Other(format!(
            "Replaced {} match(es) but could not save {}: {}",
            outcome.replaced,
            file.display(),
            save_error
        )));
    }

    let manifest = writer.map(BackupWriter::finalize).transpose()?;
    Ok(CliSuccessPayload::with_data(
        format!(
            "Replaced {} match(es) in {}",
            outcome.replaced,
            file.display()
        ),
        json!({ "file": file, "replaced": outcome.replaced, "backup_manifest": manifest }),
    ))
}

/// Execute the apply-files command.
fn execute_apply_files(
    glob_pattern: &str,
    args: &FindArgs,
    replace: &ReplaceArgs,
    backup: &BackupArgs,
) -> CommandResult {
    let workspace_dir = std::env::current_dir().map_err(|e| ReshapeError::Io {
        path: PathBuf::from("."),
        source: e,
    })?;
    let absolute_glob = if Path::new(glob_pattern).is_absolute() {
        glob_pattern.to_string()
    } else {
        workspace_dir.join(glob_pattern).to_string_lossy().to_string()
    };

    let (snippet, _, options) = search_inputs(args, None)?;
    let config = ApplyFilesConfig {
        glob_pattern: absolute_glob,
        find: snippet,
        replace: read_text(replace.replace.as_deref(), replace.replace_file.as_deref())?,
        language: args.language.clone(),
        options,
    };

    if find_in_files(&config)?.is_empty() {
        return Ok(CliSuccessPayload::message_only(format!(
            "No matches in files matching {}",
            glob_pattern
        )));
    }

    let mut writer = match backup.create_backup {
        true => Some(BackupWriter::new(&workspace_dir, backup.operation_id.clone())?),
        false => None,
    };
    let result = apply_to_files(&config, writer.as_mut())?;
    let manifest = writer.map(BackupWriter::finalize).transpose()?;

    Ok(CliSuccessPayload::with_data(
        format!(
            "Replaced {} match(es) in {} file(s)",
            result.replacements_count,
            result.files_patched.len()
        ),
        json!({ "result": result, "backup_manifest": manifest }),
    ))
}

/// Execute the plan command.
fn execute_plan(plan_path: &Path, backup: &BackupArgs) -> CommandResult {
    let plan_path = canonical(plan_path)?;
    let workspace_dir = plan_path.parent().ok_or_else(|| {
        ReshapeError::Other("Cannot determine workspace directory from plan path".to_string())
    })?;

    let mut writer = match backup.create_backup {
        true => Some(BackupWriter::new(workspace_dir, backup.operation_id.clone())?),
        false => None,
    };

    let reports = reshape::plan::execute_plan(&plan_path, workspace_dir, writer.as_mut());
    // Earlier steps stay applied on failure, so their backups must be kept.
    let manifest = writer.map(BackupWriter::finalize).transpose()?;
    let reports = reports?;

    let replaced: usize = reports.iter().map(|report| report.summary.replacements).sum();
    Ok(CliSuccessPayload::with_data(
        format!(
            "Plan executed successfully: {} steps completed, {} replacement(s)",
            reports.len(),
            replaced
        ),
        json!({ "steps": reports, "backup_manifest": manifest }),
    ))
}

/// Execute the undo command.
fn execute_undo(manifest_path: &Path) -> CommandResult {
    let manifest_path = canonical(manifest_path)?;
    // <workspace>/.reshape-backup/<operation_id>/manifest.json
    let workspace_root = manifest_path.ancestors().nth(3).ok_or_else(|| {
        ReshapeError::Other(format!(
            "Manifest {} is not inside a backup directory",
            manifest_path.display()
        ))
    })?;

    let restored = restore_from_manifest(&manifest_path, workspace_root)?;
    Ok(CliSuccessPayload::with_data(
        format!("Restored {} file(s)", restored),
        json!({ "restored": restored }),
    ))
}

/// Snippet, language tag and search options for a command.
fn search_inputs(args: &FindArgs, file: Option<&Path>) -> Result<(String, String, SearchOptions), ReshapeError> {
    let snippet = read_text(args.find.as_deref(), args.find_file.as_deref())?;

    let language = match (&args.language, file) {
        (Some(tag), _) => tag.clone(),
        (None, Some(path)) => detect_language(path)
            .map(|language| language.as_str().to_string())
            .ok_or_else(|| {
                ReshapeError::Other(format!(
                    "Cannot detect language for file: {} (use --language)",
                    path.display()
                ))
            })?,
        (None, None) => String::new(),
    };

    if let Some(score) = args.fuzzy {
        if !(0.0..=1.0).contains(&score) {
            return Err(ReshapeError::Other(format!(
                "Fuzzy score must be between 0.0 and 1.0, got {}",
                score
            )));
        }
    }

    let options = SearchOptions {
        ignore_identifiers: args.ignore_identifiers,
        fuzzy_threshold: args.fuzzy,
    };
    Ok((snippet, language, options))
}

fn read_text(inline: Option<&str>, file: Option<&Path>) -> Result<String, ReshapeError> {
    match (inline, file) {
        (Some(text), _) => Ok(text.to_string()),
        (None, Some(path)) => std::fs::read_to_string(path).map_err(|e| ReshapeError::Io {
            path: path.to_path_buf(),
            source: e,
        }),
        (None, None) => Ok(String::new()),
    }
}

fn canonical(path: &Path) -> Result<PathBuf, ReshapeError> {
    std::fs::canonicalize(path).map_err(|e| ReshapeError::Io {
        path: path.to_path_buf(),
        source: e,
    })
}
