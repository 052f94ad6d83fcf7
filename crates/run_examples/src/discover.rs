// crates/run_examples/src/discover.rs

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use comment_extractor::rules;
use walkdir::WalkDir;

fn skipped(path: &Path, skip: &[PathBuf]) -> bool {
    skip.iter().any(|s| path == s || path.starts_with(s))
}

/// Expands `paths` into the list of files to check, in argument order.
///
/// Directories are walked recursively (sorted by name) and only files with
/// a known comment rule are kept from them; files named explicitly are
/// always kept. Anything at or below a `skip` path is dropped.
pub fn discover(paths: &[PathBuf], skip: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut seen = HashSet::new();
    let mut files = Vec::new();

    for path in paths {
        if !path.exists() {
            return Err(anyhow!("No such file or directory: {}", path.display()));
        }
        if path.is_dir() {
            for entry in WalkDir::new(path)
                .sort_by_file_name()
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file())
            {
                let file = entry.path();
                if rules::for_path(file).is_some()
                    && !skipped(file, skip)
                    && seen.insert(file.to_path_buf())
                {
                    files.push(file.to_path_buf());
                }
            }
        } else if !skipped(path, skip) && seen.insert(path.clone()) {
            files.push(path.clone());
        }
    }
    log::debug!("{} file(s) to check", files.len());
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_directories_are_walked_in_order() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("b.py"), "").unwrap();
        fs::write(dir.path().join("a.md"), "").unwrap();
        fs::write(dir.path().join("sub/c.sh"), "").unwrap();
        fs::write(dir.path().join("notes.unknown"), "").unwrap();

        let files = discover(&[dir.path().to_path_buf()], &[]).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.strip_prefix(dir.path()).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            names,
            vec![
                PathBuf::from("a.md"),
                PathBuf::from("b.py"),
                PathBuf::from("sub/c.sh")
            ]
        );
    }

    #[test]
    fn test_skip_and_duplicates() {
        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("sub");
        fs::create_dir(&sub).unwrap();
        fs::write(dir.path().join("a.py"), "").unwrap();
        fs::write(sub.join("b.py"), "").unwrap();

        let a = dir.path().join("a.py");
        let files = discover(&[a.clone(), dir.path().to_path_buf()], &[sub]).unwrap();
        assert_eq!(files, vec![a]);
    }

    #[test]
    fn test_explicit_files_are_kept() {
        let dir = tempfile::tempdir().unwrap();
        let odd = dir.path().join("README");
        fs::write(&odd, "").unwrap();
        assert_eq!(discover(&[odd.clone()], &[]).unwrap(), vec![odd]);
    }

    #[test]
    fn test_missing_path() {
        let dir = tempfile::tempdir().unwrap();
        let err = discover(&[dir.path().join("nope")], &[]).unwrap_err();
        assert!(err.to_string().contains("No such file or directory"));
    }
}
