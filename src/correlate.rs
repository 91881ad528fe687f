//! Correlation of discovered declarations with the caller's targets.
//!
//! A [`TargetSet`] indexes the targets of every service by normalized file path. The
//! [`Correlator`] turns one [`Declaration`] into a [`Correlation`]: a freshly built record
//! for the target that claims the declaration's file. Records are only merged into the
//! targets through [`TargetSet::apply`].

use crate::annotations::{extract_error_annotations, extract_path_annotations};
use crate::discover::{Access, Declaration, EndpointDecl, TypeDecl, TypeEncoding, TypeRef};
use crate::loader::normalize_path;
use crate::model::{
    EndpointRecord, FieldRecord, HttpMethod, PathSegment, SegmentKind, ServiceInput,
    TypeRecord, Visibility,
};
use log::debug;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Position of a target: service index, then target index within the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TargetId {
    pub service: usize,
    pub target: usize,
}

/// The targets of a run, indexed by the file they name.
#[derive(Debug)]
pub struct TargetSet {
    services: Vec<ServiceInput>,
    claims: BTreeMap<PathBuf, TargetId>,
    conflicts: Vec<PathBuf>,
}

impl TargetSet {
    /// Index `services`, resolving relative target paths against `app_root`.
    ///
    /// Claimed targets start the run without types; type records are rebuilt from the
    /// sources every run. When several targets name the same file the first one claims
    /// it; the others are reported by [`TargetSet::conflicts`] and left untouched.
    pub fn new(app_root: &Path, mut services: Vec<ServiceInput>) -> Self {
        let app_root = normalize_path(app_root);
        let mut claims = BTreeMap::new();
        let mut conflicts = Vec::new();

        for (service_index, service) in services.iter_mut().enumerate() {
            for (target_index, target) in service.targets.iter_mut().enumerate() {
                let path = resolve(&app_root, &target.path);
                let id = TargetId {
                    service: service_index,
                    target: target_index,
                };
                if claims.contains_key(&path) {
                    conflicts.push(path);
                } else {
                    target.endpoint.types.clear();
                    claims.insert(path, id);
                }
            }
        }

        debug!(
            "Indexed {} target files across {} services",
            claims.len(),
            services.len()
        );
        Self {
            services,
            claims,
            conflicts,
        }
    }

    /// The target that claims `file`, if any
    pub fn claim(&self, file: &Path) -> Option<TargetId> {
        self.claims.get(&normalize_path(file)).copied()
    }

    /// Files named by more than one target
    pub fn conflicts(&self) -> &[PathBuf] {
        &self.conflicts
    }

    pub fn record(&self, id: TargetId) -> Option<&EndpointRecord> {
        self.services
            .get(id.service)
            .and_then(|service| service.targets.get(id.target))
            .map(|target| &target.endpoint)
    }

    /// Package directories referenced by the targets, in first-seen order
    pub fn package_dirs(&self) -> Vec<PathBuf> {
        let mut dirs: Vec<PathBuf> = Vec::new();
        for (path, _) in self.claimed_in_order() {
            if let Some(dir) = path.parent() {
                if !dirs.iter().any(|seen| seen == dir) {
                    dirs.push(dir.to_path_buf());
                }
            }
        }
        dirs
    }

    /// Overlay contents supplied by the targets, keyed by resolved path
    pub fn overlays(&self) -> Vec<(PathBuf, String)> {
        self.claimed_in_order()
            .into_iter()
            .filter_map(|(path, id)| {
                let target = &self.services[id.service].targets[id.target];
                target
                    .contents
                    .as_ref()
                    .map(|contents| (path.clone(), contents.clone()))
            })
            .collect()
    }

    /// Merge a correlation into its target.
    ///
    /// Endpoint fields, types included, replace what the target holds. Auxiliary types
    /// are appended unless a type with the same name is already recorded.
    pub fn apply(&mut self, correlation: Correlation) {
        match correlation {
            Correlation::Endpoint { target, record } => {
                let Some(existing) = self.record_mut(target) else {
                    return;
                };
                let EndpointRecord {
                    name,
                    http_method,
                    visibility,
                    path,
                    doc,
                    errors,
                    request_type_name,
                    response_type_name,
                    types,
                } = record;
                existing.name = name;
                existing.http_method = http_method;
                existing.visibility = visibility;
                existing.path = path;
                existing.doc = doc;
                existing.errors = errors;
                existing.request_type_name = request_type_name;
                existing.response_type_name = response_type_name;
                existing.types = types;
            }
            Correlation::Type { target, record } => {
                if let Some(existing) = self.record_mut(target) {
                    existing.push_type(record);
                }
            }
            Correlation::Unclaimed | Correlation::AlreadyRecorded => {}
        }
    }

    pub fn services(&self) -> &[ServiceInput] {
        &self.services
    }

    pub fn into_services(self) -> Vec<ServiceInput> {
        self.services
    }

    fn record_mut(&mut self, id: TargetId) -> Option<&mut EndpointRecord> {
        self.services
            .get_mut(id.service)
            .and_then(|service| service.targets.get_mut(id.target))
            .map(|target| &mut target.endpoint)
    }

    fn claimed_in_order(&self) -> Vec<(&PathBuf, TargetId)> {
        let mut claimed: Vec<(&PathBuf, TargetId)> =
            self.claims.iter().map(|(path, id)| (path, *id)).collect();
        claimed.sort_by_key(|(_, id)| *id);
        claimed
    }
}

fn resolve(app_root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        normalize_path(path)
    } else {
        normalize_path(&app_root.join(path))
    }
}

/// What a declaration contributes to the targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Correlation {
    /// Endpoint metadata for the target claiming the endpoint's file
    Endpoint {
        target: TargetId,
        record: EndpointRecord,
    },
    /// An auxiliary type for the target claiming the type's file
    Type { target: TargetId, record: TypeRecord },
    /// No target claims the declaration's file
    Unclaimed,
    /// The target already records a type of that name
    AlreadyRecorded,
}

/// Builds target records from declarations.
pub struct Correlator;

impl Correlator {
    /// Correlate one declaration with the targets.
    ///
    /// Returns an error message for declarations that cannot be turned into a record;
    /// the caller reports it and moves on.
    pub fn correlate(
        declaration: &Declaration,
        targets: &TargetSet,
    ) -> std::result::Result<Correlation, String> {
        let Some(target) = targets.claim(declaration.file()) else {
            return Ok(Correlation::Unclaimed);
        };
        match declaration {
            Declaration::Endpoint(endpoint) => Ok(Correlation::Endpoint {
                target,
                record: Self::endpoint_record(endpoint)?,
            }),
            Declaration::Type(decl) => {
                let already = targets
                    .record(target)
                    .is_some_and(|record| record.has_type(&decl.name));
                if already {
                    debug!("Type {} already recorded, skipping", decl.name);
                    return Ok(Correlation::AlreadyRecorded);
                }
                Ok(Correlation::Type {
                    target,
                    record: declared_type_record(decl),
                })
            }
        }
    }

    fn endpoint_record(endpoint: &EndpointDecl) -> std::result::Result<EndpointRecord, String> {
        let method: HttpMethod = *endpoint
            .methods
            .first()
            .ok_or_else(|| format!("endpoint `{}` declares no HTTP methods", endpoint.name))?;

        let (doc, errors) = extract_error_annotations(&endpoint.doc);
        let (doc, param_docs) = extract_path_annotations(&doc);

        let path = endpoint
            .path
            .iter()
            .map(|segment| {
                let mut segment: PathSegment = segment.clone();
                if segment.kind != SegmentKind::Literal {
                    if let Some(doc) = param_docs.get(&segment.value) {
                        segment.doc = Some(doc.clone());
                    }
                }
                segment
            })
            .collect();

        let mut record = EndpointRecord {
            name: endpoint.name.clone(),
            http_method: Some(method),
            visibility: visibility(endpoint.access),
            path,
            doc: doc.trim().to_string(),
            errors,
            ..Default::default()
        };

        if let Some(name) = named_ident(endpoint.request.as_ref()) {
            record.request_type_name = Some(name.to_string());
            if let Some(encoding) = &endpoint.request_encoding {
                record.push_type(encoded_type_record(name, encoding));
            }
        }
        if let Some(name) = named_ident(endpoint.response.as_ref()) {
            record.response_type_name = Some(name.to_string());
            if let Some(encoding) = &endpoint.response_encoding {
                record.push_type(encoded_type_record(name, encoding));
            }
        }

        Ok(record)
    }
}

fn visibility(access: Access) -> Visibility {
    match access {
        Access::Public => Visibility::Public,
        Access::Private => Visibility::Private,
        Access::Auth => Visibility::Auth,
    }
}

/// The identifier of the named type behind any pointer or optional indirection
fn named_ident(type_ref: Option<&TypeRef>) -> Option<&str> {
    match type_ref?.deref() {
        TypeRef::Named { ident, .. } => Some(ident),
        _ => None,
    }
}

fn encoded_type_record(name: &str, encoding: &TypeEncoding) -> TypeRecord {
    TypeRecord {
        name: name.to_string(),
        doc: encoding.doc.trim().to_string(),
        fields: encoding
            .parameters
            .iter()
            .map(|param| FieldRecord {
                name: param.src_name.clone(),
                wire_name: Some(param.wire_name.clone()),
                location: Some(param.location),
                type_name: param.type_name.clone(),
                doc: param.doc.trim().to_string(),
            })
            .collect(),
    }
}

fn declared_type_record(decl: &TypeDecl) -> TypeRecord {
    TypeRecord {
        name: decl.name.clone(),
        doc: decl.doc.trim().to_string(),
        fields: decl
            .fields
            .iter()
            .map(|field| FieldRecord {
                name: field.name.clone(),
                wire_name: None,
                location: None,
                type_name: field.type_name.clone(),
                doc: field.doc.trim().to_string(),
            })
            .collect(),
    }
}
