//! Synchronization runs.
//!
//! A run loads the packages referenced by the caller's targets, discovers their
//! declarations (endpoints first, then types), correlates each declaration with the
//! targets and hands the targets back together with every diagnostic collected.
//!
//! # Example
//!
//! ```no_run
//! use api_doc_sync::model::{ServiceInput, Target};
//! use api_doc_sync::sync::synchronize;
//! use std::path::Path;
//!
//! let services = vec![ServiceInput {
//!     name: "users".to_string(),
//!     targets: vec![Target::new("users/api.rs")],
//! }];
//! let result = synchronize(Path::new("./my-app"), services);
//! for error in &result.errors {
//!     eprintln!("{}", error);
//! }
//! ```

use crate::correlate::{Correlator, TargetSet};
use crate::discover::{Pass, TypeIndex};
use crate::error::Error;
use crate::loader::{Package, Session};
use crate::model::{ServiceInput, SyncResult};
use log::{debug, info};
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

/// Diagnostic recorded when a run stops early
pub const CANCELED_MESSAGE: &str = "synchronization canceled";

/// Callback invoked with a package's name once its declarations are correlated
pub type PackageHook = Box<dyn Fn(&str) + Send + Sync>;

/// Runs synchronization for one application.
pub struct Synchronizer {
    app_root: PathBuf,
    cancel: Option<Arc<AtomicBool>>,
    on_package: Option<PackageHook>,
}

impl Synchronizer {
    pub fn new(app_root: impl Into<PathBuf>) -> Self {
        Self {
            app_root: app_root.into(),
            cancel: None,
            on_package: None,
        }
    }

    /// Report progress after each package
    pub fn on_package(mut self, hook: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.on_package = Some(Box::new(hook));
        self
    }

    /// Stop the run at the next package boundary once `flag` is set
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Synchronize `services` with the application's sources.
    ///
    /// Never fails: problems end up in [`SyncResult::errors`] and the targets keep
    /// whatever was filled in before the problem occurred.
    pub fn run(&self, services: Vec<ServiceInput>) -> SyncResult {
        let mut session = Session::new(&self.app_root);
        if let Some(flag) = &self.cancel {
            session = session.with_cancel_flag(flag.clone());
        }
        info!(
            "Synchronizing {} services in {}",
            services.len(),
            session.app_root().display()
        );

        let mut targets = TargetSet::new(session.app_root(), services);
        for path in targets.conflicts() {
            session
                .diagnostics
                .at(path, "named by more than one target, only the first is filled in");
        }
        for (path, contents) in targets.overlays() {
            session.add_overlay(&path, contents);
        }

        let canceled = match load_packages(&mut session, &targets.package_dirs()) {
            Some(packages) => {
                let index = TypeIndex::build(&packages, &mut session.diagnostics);
                !correlate_packages(
                    &mut session,
                    &packages,
                    &index,
                    &mut targets,
                    self.on_package.as_deref(),
                )
            }
            None => true,
        };
        if canceled {
            info!("Synchronization canceled");
            session.diagnostics.push(CANCELED_MESSAGE);
        }

        let errors = session.diagnostics.into_messages();
        info!("Synchronization finished with {} diagnostics", errors.len());
        SyncResult {
            services: targets.into_services(),
            errors,
        }
    }
}

/// Load every package directory. Returns `None` if the run was canceled.
fn load_packages(session: &mut Session, dirs: &[PathBuf]) -> Option<Vec<Package>> {
    let mut packages = Vec::with_capacity(dirs.len());
    for dir in dirs {
        if session.is_canceled() {
            return None;
        }
        match session.load_package(dir) {
            Ok(package) => packages.push(package),
            Err(Error::Io { source, .. }) => session
                .diagnostics
                .at(dir, format!("failed to load package: {}", source)),
            Err(e) => session
                .diagnostics
                .at(dir, format!("failed to load package: {}", e)),
        }
    }
    Some(packages)
}

/// Discover and correlate the declarations of every package. Returns `false` if the run
/// was canceled.
fn correlate_packages(
    session: &mut Session,
    packages: &[Package],
    index: &TypeIndex,
    targets: &mut TargetSet,
    on_package: Option<&(dyn Fn(&str) + Send + Sync)>,
) -> bool {
    for package in packages {
        if session.is_canceled() {
            return false;
        }
        let declarations = Pass::new(package, index, &mut session.diagnostics).declarations();
        debug!(
            "Correlating {} declarations of package {}",
            declarations.len(),
            package.name
        );

        for declaration in &declarations {
            match Correlator::correlate(declaration, targets) {
                Ok(correlation) => targets.apply(correlation),
                Err(message) => session.diagnostics.at(declaration.file(), message),
            }
        }
        if let Some(hook) = on_package {
            hook(&package.name);
        }
    }
    true
}

/// Synchronize `services` with the sources under `app_root`.
pub fn synchronize(app_root: &Path, services: Vec<ServiceInput>) -> SyncResult {
    Synchronizer::new(app_root).run(services)
}
