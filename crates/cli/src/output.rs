//! Writing the joined CSV and the optional JSON summary.

use std::io::Write;
use std::path::Path;

use parceljoin_join::table::write_joined_csv;
use parceljoin_join::JoinResult;

use crate::exit_codes::EXIT_OUTPUT;
use crate::CliError;

fn output_err(msg: impl Into<String>) -> CliError {
    CliError {
        code: EXIT_OUTPUT,
        message: msg.into(),
        hint: None,
    }
}

/// Write `bytes` to `path`, creating parent directories. The bytes go to a
/// sibling temp file first and are renamed into place, so `path` is either
/// untouched or complete.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), CliError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .map_err(|e| output_err(format!("cannot create {}: {e}", parent.display())))?;
    }

    let file_name = path
        .file_name()
        .ok_or_else(|| output_err(format!("{} is not a file path", path.display())))?;
    let mut tmp_name = file_name.to_os_string();
    tmp_name.push(".partial");
    let tmp_path = path.with_file_name(tmp_name);

    let mut file = std::fs::File::create(&tmp_path)
        .map_err(|e| output_err(format!("cannot create {}: {e}", tmp_path.display())))?;
    file.write_all(bytes)
        .and_then(|_| file.sync_all())
        .map_err(|e| output_err(format!("cannot write {}: {e}", tmp_path.display())))?;
    drop(file);

    std::fs::rename(&tmp_path, path).map_err(|e| {
        let _ = std::fs::remove_file(&tmp_path);
        output_err(format!("cannot write {}: {e}", path.display()))
    })
}

/// Render the joined rows as CSV.
pub fn render_csv(result: &JoinResult) -> Result<Vec<u8>, CliError> {
    let mut buf = Vec::new();
    write_joined_csv(&result.rows, &mut buf).map_err(|e| output_err(e.to_string()))?;
    Ok(buf)
}

/// Render run metadata and summary counters as pretty JSON.
pub fn render_summary_json(result: &JoinResult) -> Result<Vec<u8>, CliError> {
    let mut json = serde_json::to_string_pretty(result)
        .map_err(|e| output_err(format!("JSON serialization error: {e}")))?;
    json.push('\n');
    Ok(json.into_bytes())
}

/// Write the output CSV and, when asked for, the summary JSON.
///
/// Both are rendered before anything touches disk and the CSV is written
/// last, so a failed run never leaves the CSV behind. If the CSV write
/// fails, a summary written in this run is removed too.
pub fn write_outputs(
    result: &JoinResult,
    csv_path: &Path,
    summary_path: Option<&Path>,
) -> Result<(), CliError> {
    let csv = render_csv(result)?;
    let summary = summary_path
        .map(|path| render_summary_json(result).map(|json| (path, json)))
        .transpose()?;

    if let Some((path, json)) = &summary {
        write_atomic(path, json)?;
    }
    write_atomic(csv_path, &csv).map_err(|e| {
        if let Some((path, _)) = &summary {
            let _ = std::fs::remove_file(path);
        }
        e
    })
}
