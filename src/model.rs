//! Records exchanged with the caller of a synchronization run.
//!
//! The caller supplies [`ServiceInput`]s whose [`Target`]s name the source files of
//! interest. A run fills each target's [`EndpointRecord`] and hands everything back in a
//! [`SyncResult`] together with the diagnostics collected along the way.

use crate::error_codes;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// A service and the files of it that should be synchronized.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceInput {
    pub name: String,
    #[serde(default)]
    pub targets: Vec<Target>,
}

/// A source file of interest together with the record to populate for it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Target {
    /// File path, absolute or relative to the application root
    pub path: PathBuf,
    /// Overlay contents that replace the file on disk
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contents: Option<String>,
    #[serde(default)]
    pub endpoint: EndpointRecord,
}

impl Target {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            contents: None,
            endpoint: EndpointRecord::default(),
        }
    }

    /// Attach overlay contents to this target
    pub fn with_contents(mut self, contents: impl Into<String>) -> Self {
        self.contents = Some(contents.into());
        self
    }
}

/// Metadata for one API endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointRecord {
    pub name: String,
    #[serde(default)]
    pub http_method: Option<HttpMethod>,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub path: Vec<PathSegment>,
    #[serde(default)]
    pub doc: String,
    #[serde(default)]
    pub errors: Vec<ErrorEntry>,
    #[serde(default)]
    pub request_type_name: Option<String>,
    #[serde(default)]
    pub response_type_name: Option<String>,
    /// Referenced types, unique by name
    #[serde(default)]
    pub types: Vec<TypeRecord>,
}

impl EndpointRecord {
    pub fn has_type(&self, name: &str) -> bool {
        self.types.iter().any(|t| t.name == name)
    }

    /// Append a type unless one with the same name is already recorded.
    /// Returns whether the type was added.
    pub fn push_type(&mut self, record: TypeRecord) -> bool {
        if self.has_type(&record.name) {
            return false;
        }
        self.types.push(record);
        true
    }
}

/// HTTP methods an endpoint can be declared with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Options,
    Head,
}

impl HttpMethod {
    /// Parse a method name, case-insensitively
    pub fn parse(method: &str) -> Option<Self> {
        match method.trim().to_lowercase().as_str() {
            "get" => Some(HttpMethod::Get),
            "post" => Some(HttpMethod::Post),
            "put" => Some(HttpMethod::Put),
            "delete" => Some(HttpMethod::Delete),
            "patch" => Some(HttpMethod::Patch),
            "head" => Some(HttpMethod::Head),
            "options" => Some(HttpMethod::Options),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Head => "HEAD",
        }
    }

    /// Whether request data travels in the query string by default
    pub fn sends_query(&self) -> bool {
        matches!(self, HttpMethod::Get | HttpMethod::Head | HttpMethod::Delete)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who may call an endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    #[default]
    Private,
    Auth,
}

/// One `/`-separated piece of an endpoint path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathSegment {
    pub kind: SegmentKind,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_type: Option<String>,
}

impl PathSegment {
    pub fn literal(value: impl Into<String>) -> Self {
        Self::new(SegmentKind::Literal, value)
    }

    pub fn new(kind: SegmentKind, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
            doc: None,
            value_type: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentKind {
    Literal,
    Param,
    Wildcard,
    Fallback,
}

/// A documented error an endpoint can return.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEntry {
    /// Symbolic error code, e.g. `NotFound`
    pub code: String,
    pub doc: String,
}

impl ErrorEntry {
    /// The conventional HTTP status for this entry's code, if the code is well known
    pub fn http_status(&self) -> Option<u16> {
        error_codes::http_status(&self.code)
    }
}

/// A data type referenced by an endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeRecord {
    pub name: String,
    pub doc: String,
    pub fields: Vec<FieldRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldRecord {
    pub name: String,
    /// Only set for fields that take part in wire encoding
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wire_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<WireLocation>,
    #[serde(rename = "type")]
    pub type_name: String,
    pub doc: String,
}

/// Where a wire-encoded field travels in an HTTP exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WireLocation {
    Header,
    Query,
    Body,
    Cookie,
}

/// Outcome of a synchronization run: the caller's services with their records filled
/// in, plus every diagnostic collected during the run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncResult {
    pub services: Vec<ServiceInput>,
    pub errors: Vec<String>,
}
