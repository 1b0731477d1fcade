use std::path::Path;

use anyhow::{Context, Result};
use tokio::io::AsyncRead;

/// A boxed byte source: a file or stdin.
pub type Source = Box<dyn AsyncRead + Unpin + Send>;

/// Open `path` for streaming, treating `-` as stdin.
///
/// # Errors
///
/// Returns an error if the file cannot be opened.
pub async fn open(path: &Path) -> Result<Source> {
    if is_stdin(path) {
        return Ok(Box::new(tokio::io::stdin()));
    }

    let file = tokio::fs::File::open(path)
        .await
        .with_context(|| format!("cannot read {}", path.display()))?;
    Ok(Box::new(file))
}

/// Human-readable name of the source for reports.
pub fn describe(path: &Path) -> String {
    if is_stdin(path) {
        "<stdin>".to_string()
    } else {
        path.display().to_string()
    }
}

fn is_stdin(path: &Path) -> bool {
    path == Path::new("-")
}
