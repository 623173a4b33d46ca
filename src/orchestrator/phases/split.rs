//! Stage 6: Oversized-Object Splitter - write `install.wim` as FAT32-sized chunks.
//!
//! FAT32 cannot hold a file of 4 GiB or more. `wimlib-imagex split` names its output
//! `install.swm`, `install2.swm`, `install3.swm`, ...

use crate::error::{ProvisionError, Result};
use crate::models::{SourceMount, TargetVolume};
use crate::system::{tools, ToolRunner};
use std::fs;
use std::path::{Path, PathBuf};

/// Split `<source>/<relative>` into chunks under `<target>/<relative dir>`.
///
/// Returns the chunk files found after the split, in chunk order.
///
/// # Errors
/// * `SourceObjectMissing` if the object is absent (the split tool is never run)
/// * `SplitFailed` if the tool fails or leaves no chunk behind
pub async fn split_oversized_object(
    runner: &dyn ToolRunner,
    source: &SourceMount,
    target: &TargetVolume,
    relative: &str,
    chunk_size_mb: u64,
    chunk_extension: &str,
) -> Result<Vec<PathBuf>> {
    let object = source.path().join(relative);
    let first_chunk = target.path().join(relative).with_extension(chunk_extension);

    crate::log_parsed!("Splitting {}...", relative);
    if !object.is_file() {
        return Err(ProvisionError::SourceObjectMissing(format!(
            "{} not found at {}",
            relative,
            object.display()
        )));
    }

    let chunk_dir = first_chunk
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| target.path().to_path_buf());
    fs::create_dir_all(&chunk_dir).map_err(|e| {
        ProvisionError::SplitFailed(format!(
            "cannot create {}: {}",
            chunk_dir.display(),
            e
        ))
    })?;

    runner
        .run(tools::wim_split(&object, &first_chunk, chunk_size_mb))
        .await
        .map_err(|e| ProvisionError::SplitFailed(e.with_output()))?;

    let stem = first_chunk
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let chunks = find_chunks(&chunk_dir, &stem, chunk_extension).map_err(|e| {
        ProvisionError::SplitFailed(format!("cannot list {}: {}", chunk_dir.display(), e))
    })?;

    if chunks.is_empty() {
        return Err(ProvisionError::SplitFailed(format!(
            "no {}*.{} files produced in {}",
            stem,
            chunk_extension,
            chunk_dir.display()
        )));
    }

    log::info!(
        "[Split] {} split into {} chunk(s) of at most {} MB",
        relative,
        chunks.len(),
        chunk_size_mb
    );
    Ok(chunks)
}

/// Chunk files `<stem>.<ext>`, `<stem>2.<ext>`, ... in `dir`, ordered by index.
pub fn find_chunks(dir: &Path, stem: &str, extension: &str) -> std::io::Result<Vec<PathBuf>> {
    let mut indexed = Vec::new();

    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() || path.extension().map_or(true, |ext| ext != extension) {
            continue;
        }
        let Some(name_stem) = path.file_stem().map(|s| s.to_string_lossy().into_owned()) else {
            continue;
        };
        let Some(suffix) = name_stem.strip_prefix(stem) else {
            continue;
        };
        let index = if suffix.is_empty() {
            1
        } else if let Ok(n) = suffix.parse::<u32>() {
            n
        } else {
            continue;
        };
        indexed.push((index, path));
    }

    indexed.sort_by_key(|(index, _)| *index);
    Ok(indexed.into_iter().map(|(_, path)| path).collect())
}
