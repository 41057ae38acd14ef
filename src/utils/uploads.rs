use std::path::{Path, PathBuf};

/// Resolves the configured upload dir against the working directory.
pub fn get_uploads_dir(configured: &str) -> std::io::Result<PathBuf> {
    let configured = Path::new(configured);
    if configured.is_absolute() {
        return Ok(configured.to_path_buf());
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(configured))
}

/// Reduces a client supplied file name to something safe to put on disk: no path
/// separators, no leading dots, only `[A-Za-z0-9._-]`.
pub fn sanitize_filename(name: &str) -> String {
    // browsers on windows may send the full client path
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();

    let cleaned: String = base
        .trim()
        .chars()
        .map(|c| match c {
            c if c.is_ascii_alphanumeric() => c,
            '.' | '-' | '_' => c,
            c if c.is_whitespace() => '_',
            _ => '_',
        })
        .collect();

    let cleaned = cleaned.trim_start_matches(['.', '_']);
    if cleaned.is_empty() {
        String::from("file")
    } else {
        cleaned.to_string()
    }
}
