use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use image::ImageFormat;

use crate::{
    db::{Database, ImportReport},
    log_debug, log_info, log_warn,
};

const ENABLE_LOGS: bool = true;

/// Candidate files found under the import inputs.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ScanResult {
    pub candidates: Vec<String>,
    pub skipped: Vec<String>,
}

/// Whether the extension maps to a format the display layer can show.
pub fn is_supported_image(path: &Path) -> bool {
    matches!(
        ImageFormat::from_path(path),
        Ok(ImageFormat::Png | ImageFormat::Jpeg | ImageFormat::Gif | ImageFormat::WebP)
    )
}

/// Expand files and directories (one level deep) into canonical image
/// paths. Unsupported or unreadable entries land in `skipped`.
pub fn scan_inputs(inputs: &[PathBuf]) -> Result<ScanResult> {
    let mut result = ScanResult::default();
    let mut seen = HashSet::new();

    for input in inputs {
        if input.is_dir() {
            let mut entries = fs::read_dir(input)
                .with_context(|| format!("failed to read directory {}", input.display()))?
                .filter_map(|entry| entry.ok().map(|entry| entry.path()))
                .filter(|path| path.is_file())
                .collect::<Vec<_>>();
            entries.sort();

            log_debug!("Scanning {} ({} files)", input.display(), entries.len());
            for path in entries {
                push_candidate(&path, &mut result, &mut seen);
            }
        } else {
            push_candidate(input, &mut result, &mut seen);
        }
    }

    Ok(result)
}

fn push_candidate(path: &Path, result: &mut ScanResult, seen: &mut HashSet<String>) {
    let display = path.display().to_string();

    if !is_supported_image(path) {
        result.skipped.push(display);
        return;
    }

    let canonical = match fs::canonicalize(path) {
        Ok(canonical) => canonical,
        Err(err) => {
            log_warn!("Skipping {display}: {err}");
            result.skipped.push(display);
            return;
        }
    };

    let Some(text) = canonical.to_str() else {
        log_warn!("Skipping {display}: path is not valid UTF-8");
        result.skipped.push(display);
        return;
    };

    if seen.insert(text.to_string()) {
        result.candidates.push(text.to_string());
    }
}

pub async fn import_images(db: &Database, inputs: Vec<PathBuf>) -> Result<ImportReport> {
    let scan = tokio::task::spawn_blocking(move || scan_inputs(&inputs))
        .await
        .context("image scan task failed")??;

    let (imported, duplicates) = db.insert_images(scan.candidates).await?;

    log_info!(
        "Imported {} images ({} already present, {} skipped)",
        imported.len(),
        duplicates.len(),
        scan.skipped.len()
    );

    Ok(ImportReport {
        imported,
        duplicates,
        skipped: scan.skipped,
    })
}
