//! Writing fetched component source into the project tree

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::config::Language;

/// Write component source to `<component_dir>/<name>.<ext>`, creating the
/// directory tree as needed. An existing file is replaced; re-adding a
/// component is how updates are pulled in.
pub async fn write_component(
    component_dir: &Path,
    name: &str,
    language: Language,
    source: &str,
) -> Result<PathBuf> {
    tokio::fs::create_dir_all(component_dir)
        .await
        .with_context(|| {
            format!(
                "Failed to create component directory {}",
                component_dir.display()
            )
        })?;

    let file_path = component_dir.join(format!("{}.{}", name, language.extension()));
    tokio::fs::write(&file_path, source)
        .await
        .with_context(|| format!("Failed to write {}", file_path.display()))?;

    Ok(file_path)
}
