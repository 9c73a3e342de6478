use ignore::WalkBuilder;
use log::debug;
use std::path::{Path, PathBuf};

/// A local file queued for upload. `name` is the `/`-separated path it
/// should get below the target folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFile {
    pub path: PathBuf,
    pub name: String,
}

pub fn validate_path(requested_path: &Path) -> Result<PathBuf, String> {
    if !requested_path.exists() {
        return Err(format!("Path does not exist: {}", requested_path.display()));
    }
    requested_path
        .canonicalize()
        .map_err(|e| format!("Failed to canonicalize path: {}", e))
}

/// Expands files and directories into a flat upload list. Directories keep
/// their own name as a prefix and honor `.gitignore`.
pub fn collect_upload_files(paths: &[PathBuf]) -> Result<Vec<LocalFile>, String> {
    let mut files = Vec::new();
    for requested in paths {
        let path = validate_path(requested)?;
        let base_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| format!("Cannot upload a path without a name: {}", path.display()))?;

        if path.is_dir() {
            files.extend(walk_directory(&path, &base_name)?);
        } else {
            files.push(LocalFile { path, name: base_name });
        }
    }
    Ok(files)
}

fn walk_directory(root: &Path, base_name: &str) -> Result<Vec<LocalFile>, String> {
    debug!("Collecting upload files under: {}", root.display());
    let mut files = Vec::new();
    let walker = WalkBuilder::new(root).require_git(false).build();

    for entry in walker {
        let entry = entry.map_err(|e| format!("Failed to read directory entry: {}", e))?;
        if !entry.file_type().map_or(false, |ft| ft.is_file()) {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(root)
            .map_err(|e| format!("Failed to relativize {}: {}", entry.path().display(), e))?;
        let segments: Vec<String> = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().to_string())
            .collect();
        files.push(LocalFile {
            path: entry.path().to_path_buf(),
            name: format!("{}/{}", base_name, segments.join("/")),
        });
    }

    files.sort_by(|a, b| natord::compare(&a.name, &b.name));
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn plain_files_keep_their_name() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("index.html");
        fs::write(&file, "<p>hi</p>").unwrap();

        let files = collect_upload_files(&[file]).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].name, "index.html");
    }

    #[test]
    fn directories_are_walked_with_gitignore() {
        let dir = tempfile::tempdir().unwrap();
        let site = dir.path().join("site");
        fs::create_dir_all(site.join("css")).unwrap();
        fs::write(site.join(".gitignore"), "*.log\n").unwrap();
        fs::write(site.join("page10.html"), "").unwrap();
        fs::write(site.join("page2.html"), "").unwrap();
        fs::write(site.join("debug.log"), "").unwrap();
        fs::write(site.join("css").join("main.css"), "").unwrap();

        let names: Vec<String> = collect_upload_files(&[site])
            .unwrap()
            .into_iter()
            .map(|f| f.name)
            .collect();
        assert_eq!(names, ["site/css/main.css", "site/page2.html", "site/page10.html"]);
    }

    #[test]
    fn missing_paths_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = collect_upload_files(&[dir.path().join("nope.txt")]).unwrap_err();
        assert!(err.contains("does not exist"));
    }
}
