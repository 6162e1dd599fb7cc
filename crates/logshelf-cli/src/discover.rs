use anyhow::{Context, Result, bail};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use logshelf_config::normalize_prefix;

/// One session log found under the projects root.
#[derive(Debug, Clone, Serialize)]
pub struct SessionFile {
    pub project: String,
    pub path: PathBuf,
    /// `<prefix><project>/<relative path>`, forward slashes
    pub key: String,
    pub size: u64,
    /// Modification time in whole seconds since the Unix epoch, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified: Option<u64>,
}

/// Find every `*.jsonl` file under each project directory of `root`.
///
/// Projects are the immediate subdirectories of `root`. Projects that cannot
/// be walked are skipped with a warning.
pub fn discover(root: &Path, prefix: &str) -> Result<Vec<SessionFile>> {
    let metadata = std::fs::metadata(root)
        .with_context(|| format!("Projects root does not exist: {}", root.display()))?;
    if !metadata.is_dir() {
        bail!("Projects root is not a directory: {}", root.display());
    }

    let mut projects = Vec::new();
    for entry in std::fs::read_dir(root)
        .with_context(|| format!("Failed to read projects root {}", root.display()))?
    {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            projects.push(entry.path());
        }
    }
    projects.sort();

    let mut files = Vec::new();
    for project_path in projects {
        let project = project_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        match project_files(&project_path, &project, prefix) {
            Ok(found) => files.extend(found),
            Err(e) => tracing::warn!("Skipping project {}: {:#}", project, e),
        }
    }

    Ok(files)
}

fn project_files(project_path: &Path, project: &str, prefix: &str) -> Result<Vec<SessionFile>> {
    let mut files = Vec::new();

    for entry in walkdir::WalkDir::new(project_path).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() || !is_jsonl(entry.path()) {
            continue;
        }

        let relative = entry.path().strip_prefix(project_path)?;
        let metadata = entry
            .metadata()
            .with_context(|| format!("Failed to stat {}", entry.path().display()))?;
        let modified = metadata.modified().ok().and_then(unix_seconds);

        files.push(SessionFile {
            project: project.to_string(),
            key: object_key(prefix, project, &relative.to_string_lossy()),
            path: entry.into_path(),
            size: metadata.len(),
            modified,
        });
    }

    Ok(files)
}

fn unix_seconds(time: SystemTime) -> Option<u64> {
    time.duration_since(UNIX_EPOCH).ok().map(|d| d.as_secs())
}

fn is_jsonl(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("jsonl"))
}

/// Destination key for a session log. Backslashes become forward slashes.
pub fn object_key(prefix: &str, project: &str, relative: &str) -> String {
    format!(
        "{}{}/{}",
        normalize_prefix(prefix),
        project.replace('\\', "/"),
        relative.replace('\\', "/")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_object_key() {
        let cases = [
            ("claude-code/", "proj", "a.jsonl", "claude-code/proj/a.jsonl"),
            ("claude-code", "proj", "a.jsonl", "claude-code/proj/a.jsonl"),
            ("", "proj", "a.jsonl", "proj/a.jsonl"),
            ("p/", "proj", "sub\\b.jsonl", "p/proj/sub/b.jsonl"),
            ("win\\prefix", "my\\proj", "x.jsonl", "win/prefix/my/proj/x.jsonl"),
        ];
        for (prefix, project, relative, want) in cases {
            assert_eq!(object_key(prefix, project, relative), want);
        }
    }

    #[test]
    fn test_discover_projects() {
        let root = tempfile::tempdir().unwrap();
        let alpha = root.path().join("alpha");
        let beta = root.path().join("beta");
        fs::create_dir_all(alpha.join("nested")).unwrap();
        fs::create_dir_all(&beta).unwrap();

        fs::write(alpha.join("b.jsonl"), "{}\n").unwrap();
        fs::write(alpha.join("a.JSONL"), "{}\n{}\n").unwrap();
        fs::write(alpha.join("notes.txt"), "ignored").unwrap();
        fs::write(alpha.join("nested").join("c.jsonl"), "").unwrap();
        fs::write(beta.join("d.jsonl"), "{}\n").unwrap();
        // Files directly under the root are not projects.
        fs::write(root.path().join("stray.jsonl"), "{}\n").unwrap();

        let files = discover(root.path(), "logs").unwrap();
        let keys: Vec<&str> = files.iter().map(|f| f.key.as_str()).collect();
        assert_eq!(
            keys,
            vec![
                "logs/alpha/a.JSONL",
                "logs/alpha/b.jsonl",
                "logs/alpha/nested/c.jsonl",
                "logs/beta/d.jsonl",
            ]
        );
        assert_eq!(files[0].project, "alpha");
        assert_eq!(files[0].size, 6);
        assert_eq!(files[3].path, beta.join("d.jsonl"));
        assert!(files.iter().all(|f| f.modified.is_some()));
    }

    #[test]
    fn test_discover_missing_root() {
        let root = tempfile::tempdir().unwrap();
        let err = discover(&root.path().join("missing"), "").unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn test_discover_root_is_file() {
        let root = tempfile::tempdir().unwrap();
        let file = root.path().join("file");
        fs::write(&file, "").unwrap();
        let err = discover(&file, "").unwrap_err();
        assert!(err.to_string().contains("not a directory"));
    }
}
