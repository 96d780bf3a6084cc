use anyhow::{Context, Result};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Expands ~ and env vars if possible (only for UTF-8 paths), and always returns an absolute PathBuf.
/// Does NOT fail if the file does not exist.
pub fn expand_and_resolve_path<P: AsRef<Path>>(input: P) -> Result<PathBuf> {
    let input = input.as_ref();
    let expanded = match input.to_str() {
        Some(s) => match shellexpand::full(s) {
            Ok(expanded) => PathBuf::from(expanded.as_ref()),
            Err(e) => {
                log::warn!("Failed to expand path {:?} ({}), using it as is", input, e);
                input.to_path_buf()
            }
        },
        None => {
            log::warn!("Path {:?} is not valid UTF-8, skipping expansion", input);
            input.to_path_buf()
        }
    };

    if let Ok(absolute) = fs::canonicalize(&expanded) {
        return Ok(absolute);
    }
    if expanded.is_absolute() {
        return Ok(expanded);
    }
    Ok(env::current_dir()
        .context("Failed to get current directory")?
        .join(expanded))
}
