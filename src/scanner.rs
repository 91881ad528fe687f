use log::warn;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Lists the production source files of a package.
///
/// A package is one directory; its sub-directories are packages of their own and are
/// not descended into. Test-only files are left out:
/// - `tests.rs`, `*_test.rs` and `*_tests.rs`
/// - `build.rs`
/// - hidden files (starting with `.`)
///
/// # Example
///
/// ```no_run
/// use api_doc_sync::scanner::PackageScanner;
/// use std::path::PathBuf;
///
/// let scanner = PackageScanner::new(PathBuf::from("./svc/users"));
/// let result = scanner.scan().unwrap();
/// println!("Found {} source files", result.source_files.len());
/// ```
pub struct PackageScanner {
    package_dir: PathBuf,
}

/// Result of scanning a package directory.
pub struct ScanResult {
    /// Source files of the package, sorted by path
    pub source_files: Vec<PathBuf>,
    /// Warning messages for entries that could not be read
    pub warnings: Vec<String>,
}

impl PackageScanner {
    pub fn new(package_dir: PathBuf) -> Self {
        Self { package_dir }
    }

    /// Scans the package directory.
    ///
    /// Unreadable entries are recorded as warnings and skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the package directory itself cannot be read.
    pub fn scan(&self) -> std::io::Result<ScanResult> {
        // Surface a missing or unreadable package as an error rather than an empty scan.
        std::fs::read_dir(&self.package_dir)?;

        let mut source_files = Vec::new();
        let mut warnings = Vec::new();

        for entry in WalkDir::new(&self.package_dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            match entry {
                Ok(entry) => {
                    let path = entry.path();
                    if entry.file_type().is_file() && is_production_source(path) {
                        source_files.push(path.to_path_buf());
                    }
                }
                Err(e) => {
                    let warning = format!("Failed to access path: {}", e);
                    warn!("{}", warning);
                    warnings.push(warning);
                }
            }
        }

        Ok(ScanResult {
            source_files,
            warnings,
        })
    }
}

/// Whether `path` names a non-test Rust source file
pub fn is_production_source(path: &Path) -> bool {
    if path.extension().and_then(|s| s.to_str()) != Some("rs") {
        return false;
    }
    let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
        return false;
    };
    !(stem.starts_with('.')
        || stem == "tests"
        || stem == "build"
        || stem.ends_with("_test")
        || stem.ends_with("_tests"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn file_names(result: &ScanResult) -> Vec<String> {
        result
            .source_files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect()
    }

    #[test]
    fn test_scan_package_directory() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        fs::write(root.join("users.rs"), "pub fn list() {}").unwrap();
        fs::write(root.join("api.rs"), "pub fn get() {}").unwrap();
        fs::write(root.join("readme.md"), "# README").unwrap();

        let scanner = PackageScanner::new(root.to_path_buf());
        let result = scanner.scan().unwrap();

        assert_eq!(file_names(&result), vec!["api.rs", "users.rs"]);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_scan_does_not_descend() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        fs::create_dir(root.join("nested")).unwrap();
        fs::write(root.join("nested/inner.rs"), "struct Inner;").unwrap();
        fs::write(root.join("api.rs"), "pub fn get() {}").unwrap();

        let scanner = PackageScanner::new(root.to_path_buf());
        let result = scanner.scan().unwrap();

        assert_eq!(file_names(&result), vec!["api.rs"]);
    }

    #[test]
    fn test_scan_skips_test_sources() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        fs::write(root.join("api.rs"), "pub fn get() {}").unwrap();
        fs::write(root.join("api_test.rs"), "#[test] fn t() {}").unwrap();
        fs::write(root.join("api_tests.rs"), "#[test] fn t() {}").unwrap();
        fs::write(root.join("tests.rs"), "#[test] fn t() {}").unwrap();
        fs::write(root.join("build.rs"), "fn main() {}").unwrap();

        let scanner = PackageScanner::new(root.to_path_buf());
        let result = scanner.scan().unwrap();

        assert_eq!(file_names(&result), vec!["api.rs"]);
    }

    #[test]
    fn test_scan_missing_directory_fails() {
        let temp_dir = TempDir::new().unwrap();
        let scanner = PackageScanner::new(temp_dir.path().join("absent"));
        assert!(scanner.scan().is_err());
    }

    #[test]
    fn test_scan_empty_directory() {
        let temp_dir = TempDir::new().unwrap();
        let scanner = PackageScanner::new(temp_dir.path().to_path_buf());
        let result = scanner.scan().unwrap();
        assert!(result.source_files.is_empty());
    }
}
