use std::path::{Path, PathBuf};

use super::paths::{self, FileKind};
use crate::error::{Result, UpdateError};
use crate::locale::Locale;
use crate::project::Project;

/// Save the downloaded body as the project's `.po` file, replacing any previous copy.
pub async fn write_po(
    destination: &Path,
    project: &Project,
    locale: &Locale,
    body: &[u8],
) -> Result<PathBuf> {
    let path = paths::file_path(destination, project, locale, FileKind::Po);
    write_file(&path, body).await?;
    Ok(path)
}

/// Write `contents` to `path`. A failed write may leave a truncated file behind.
pub async fn write_file(path: &Path, contents: &[u8]) -> Result<()> {
    tracing::debug!(path = %path.display(), bytes = contents.len(), "Writing file");
    tokio::fs::write(path, contents)
        .await
        .map_err(|e| UpdateError::write(path, e))
}
