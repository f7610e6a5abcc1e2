//! Small helpers shared across modules.

use std::path::Path;

/// Display a path with the home directory replaced by `~`.
///
/// Keeps user names out of logs that may be pasted into bug reports.
pub fn private_path(path: &Path) -> String {
    if let Some(home) = dirs::home_dir()
        && let Ok(rest) = path.strip_prefix(&home)
    {
        if rest.as_os_str().is_empty() {
            return "~".to_string();
        }
        return format!("~/{}", rest.display());
    }
    path.display().to_string()
}
