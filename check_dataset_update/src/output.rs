//! Atomic write of a downloaded dataset.

use std::io;
use std::path::Path;

use tokio::{fs, io::AsyncWriteExt};

/// Writes `contents` next to `path` and renames it into place, so readers see
/// either the previous file or the complete new one.
pub async fn write_atomically(path: &Path, contents: &str) -> io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }

    let temp_path = path.with_extension("tmp");
    let mut file = fs::File::create(&temp_path).await?;
    file.write_all(contents.as_bytes()).await?;
    file.sync_all().await?;
    drop(file);

    fs::rename(temp_path, path).await
}
