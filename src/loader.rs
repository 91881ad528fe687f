//! Parsing session: overlay-aware package loading and diagnostic collection.
//!
//! A [`Session`] is scoped to one application root. Files can be overlaid with in-memory
//! contents, which take precedence over the disk and make a file part of its package even
//! if it does not exist on disk yet. Everything that goes wrong while loading is recorded
//! in the session's [`Diagnostics`] instead of aborting the run.

use crate::error::{Error, Result};
use crate::parser::{AstParser, ParsedFile};
use crate::scanner::{is_production_source, PackageScanner};
use log::{debug, warn};
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A loaded package: one directory worth of parsed production sources.
#[derive(Debug)]
pub struct Package {
    pub dir: PathBuf,
    /// Directory name, used for default endpoint paths
    pub name: String,
    pub files: Vec<ParsedFile>,
}

/// Diagnostics collected during a run, rendered relative to the application root.
#[derive(Debug, Default)]
pub struct Diagnostics {
    root: PathBuf,
    messages: Vec<String>,
}

impl Diagnostics {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            messages: Vec::new(),
        }
    }

    /// Record a message about a file
    pub fn at(&mut self, path: &Path, message: impl std::fmt::Display) {
        let rendered = format!("{}: {}", self.display_path(path), message);
        warn!("{}", rendered);
        self.messages.push(rendered);
    }

    /// Record a message not tied to a file
    pub fn push(&mut self, message: impl Into<String>) {
        let message = message.into();
        warn!("{}", message);
        self.messages.push(message);
    }

    /// Translate a crate error into a diagnostic
    pub fn error(&mut self, err: &Error) {
        match err {
            Error::ParseError { file, message } => self.at(file, message),
            Error::Io { path, source } => self.at(path, source),
            other => self.push(other.to_string()),
        }
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    pub fn into_messages(self) -> Vec<String> {
        self.messages
    }

    fn display_path(&self, path: &Path) -> String {
        path.strip_prefix(&self.root)
            .unwrap_or(path)
            .display()
            .to_string()
    }
}

/// A parsing session over one application.
pub struct Session {
    app_root: PathBuf,
    overlay: BTreeMap<PathBuf, String>,
    cancel: Option<Arc<AtomicBool>>,
    pub diagnostics: Diagnostics,
}

impl Session {
    pub fn new(app_root: &Path) -> Self {
        let app_root = normalize_path(app_root);
        Self {
            diagnostics: Diagnostics::new(app_root.clone()),
            app_root,
            overlay: BTreeMap::new(),
            cancel: None,
        }
    }

    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn app_root(&self) -> &Path {
        &self.app_root
    }

    /// Resolve a path given relative to the application root
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            normalize_path(path)
        } else {
            normalize_path(&self.app_root.join(path))
        }
    }

    /// Overlay a file with in-memory contents
    pub fn add_overlay(&mut self, path: &Path, contents: String) {
        let path = self.resolve(path);
        debug!("Overlaying {}", path.display());
        self.overlay.insert(path, contents);
    }

    pub fn is_canceled(&self) -> bool {
        self.cancel
            .as_ref()
            .map(|flag| flag.load(Ordering::Relaxed))
            .unwrap_or(false)
    }

    /// Read a file, preferring its overlay contents
    pub fn read_file(&self, path: &Path) -> Result<String> {
        let path = self.resolve(path);
        if let Some(contents) = self.overlay.get(&path) {
            return Ok(contents.clone());
        }
        std::fs::read_to_string(&path).map_err(|e| Error::io(path, e))
    }

    /// Load the production sources of the package in `dir`.
    ///
    /// Files that fail to parse are reported as diagnostics and left out of the package.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be read and no overlay files live in it.
    pub fn load_package(&mut self, dir: &Path) -> Result<Package> {
        let dir = self.resolve(dir);
        debug!("Loading package {}", dir.display());

        let overlaid: Vec<PathBuf> = self
            .overlay
            .keys()
            .filter(|path| path.parent() == Some(dir.as_path()) && is_production_source(path))
            .cloned()
            .collect();

        let mut paths = match PackageScanner::new(dir.clone()).scan() {
            Ok(scan) => {
                for warning in &scan.warnings {
                    self.diagnostics.at(&dir, warning);
                }
                scan.source_files
            }
            Err(e) if !overlaid.is_empty() => {
                debug!("Package {} only exists as overlay: {}", dir.display(), e);
                Vec::new()
            }
            Err(e) => return Err(Error::io(dir, e)),
        };
        for path in overlaid {
            if !paths.contains(&path) {
                paths.push(path);
            }
        }
        paths.sort();

        let mut files = Vec::with_capacity(paths.len());
        for path in &paths {
            let parsed = self
                .read_file(path)
                .and_then(|content| AstParser::parse_source(path, &content));
            match parsed {
                Ok(parsed) => files.push(parsed),
                Err(e) => self.diagnostics.error(&e),
            }
        }

        let name = dir
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        debug!("Loaded package {} with {} files", name, files.len());

        Ok(Package { dir, name, files })
    }
}

/// Lexically normalize a path: drop `.` components and fold `..` into their parent.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    normalized.push("..");
                }
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}
