//! Input resolution
//!
//! Expands a file or directory argument into the ordered list of documents to
//! convert.

use log::{debug, warn};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::{Result, Xml2CsvError};
use crate::pattern::PatternMatcher;

/// Resolve `input` into candidate documents.
///
/// A file must match `matcher`. A directory yields its matching files,
/// immediate children only unless `recursive`, sorted by path.
pub fn resolve_inputs(
    input: &Path,
    recursive: bool,
    matcher: &PatternMatcher,
) -> Result<Vec<PathBuf>> {
    if !input.exists() {
        return Err(Xml2CsvError::InputNotFound {
            path: input.to_path_buf(),
        });
    }

    if input.is_file() {
        return resolve_single_file(input, matcher).map(|path| vec![path]);
    }

    if !input.is_dir() {
        return Err(Xml2CsvError::UnsupportedInput {
            path: input.to_path_buf(),
        });
    }

    let files = collect_from_directory(input, recursive, matcher);
    if files.is_empty() {
        return Err(Xml2CsvError::NoFilesFound {
            path: input.to_path_buf(),
        });
    }

    debug!("resolved {} documents under {}", files.len(), input.display());
    Ok(files)
}

/// Validate a single input file against the pattern
pub fn resolve_single_file(path: &Path, matcher: &PatternMatcher) -> Result<PathBuf> {
    let accepted = path.is_file()
        && path
            .file_name()
            .and_then(|s| s.to_str())
            .map(|s| matcher.matches(s))
            .unwrap_or(false);

    if accepted {
        Ok(path.to_path_buf())
    } else {
        Err(Xml2CsvError::WrongExtension {
            path: path.to_path_buf(),
            expected: matcher.as_str().to_string(),
        })
    }
}

fn collect_from_directory(dir: &Path, recursive: bool, matcher: &PatternMatcher) -> Vec<PathBuf> {
    let max_depth = if recursive { usize::MAX } else { 1 };

    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(max_depth)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| match e {
            Ok(entry) => Some(entry),
            Err(err) => {
                warn!("skipping unreadable entry: {err}");
                None
            }
        })
        .filter(|e| e.path().is_file())
        .filter(|e| {
            e.file_name()
                .to_str()
                .map(|s| matcher.matches(s))
                .unwrap_or(false)
        })
        .map(|e| e.into_path())
        .collect();

    // Plain string order: "a-b/x.xml" sorts before "a/x.xml"
    files.sort_by_cached_key(|p| p.to_string_lossy().into_owned());
    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, "<F/>").unwrap();
        path
    }

    fn xml_matcher() -> PatternMatcher {
        PatternMatcher::new("*.xml").unwrap()
    }

    #[test]
    fn test_single_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = touch(temp_dir.path(), "flow.xml");

        let files = resolve_inputs(&path, false, &xml_matcher()).unwrap();
        assert_eq!(files, vec![path]);
    }

    #[test]
    fn test_single_file_wrong_extension() {
        let temp_dir = TempDir::new().unwrap();
        let path = touch(temp_dir.path(), "flow.txt");

        let result = resolve_inputs(&path, false, &xml_matcher());
        assert!(matches!(result, Err(Xml2CsvError::WrongExtension { .. })));
    }

    #[test]
    fn test_missing_path() {
        let result = resolve_inputs(Path::new("/nonexistent/flow.xml"), false, &xml_matcher());
        assert!(matches!(result, Err(Xml2CsvError::InputNotFound { .. })));
    }

    #[test]
    fn test_directory_sorted_and_filtered() {
        let temp_dir = TempDir::new().unwrap();
        touch(temp_dir.path(), "b.xml");
        touch(temp_dir.path(), "a.XML");
        touch(temp_dir.path(), "notes.txt");

        let files = resolve_inputs(temp_dir.path(), false, &xml_matcher()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap())
            .collect();
        assert_eq!(names, vec!["a.XML", "b.xml"]);
    }

    #[test]
    fn test_recursive_flag() {
        let temp_dir = TempDir::new().unwrap();
        let deep = temp_dir.path().join("one").join("two");
        fs::create_dir_all(&deep).unwrap();
        let top = touch(temp_dir.path(), "top.xml");
        let nested = touch(&deep, "deep.xml");

        let flat = resolve_inputs(temp_dir.path(), false, &xml_matcher()).unwrap();
        assert_eq!(flat, vec![top.clone()]);

        let all = resolve_inputs(temp_dir.path(), true, &xml_matcher()).unwrap();
        assert_eq!(all, vec![nested, top]);
    }

    #[test]
    fn test_recursive_order_follows_path_text() {
        let temp_dir = TempDir::new().unwrap();
        let plain = temp_dir.path().join("a");
        let dashed = temp_dir.path().join("a-b");
        fs::create_dir_all(&plain).unwrap();
        fs::create_dir_all(&dashed).unwrap();
        let in_plain = touch(&plain, "x.xml");
        let in_dashed = touch(&dashed, "x.xml");

        let files = resolve_inputs(temp_dir.path(), true, &xml_matcher()).unwrap();
        assert_eq!(files, vec![in_dashed, in_plain]);
    }

    #[test]
    fn test_empty_directory() {
        let temp_dir = TempDir::new().unwrap();
        touch(temp_dir.path(), "readme.md");

        let result = resolve_inputs(temp_dir.path(), false, &xml_matcher());
        assert!(matches!(result, Err(Xml2CsvError::NoFilesFound { .. })));
    }
}
