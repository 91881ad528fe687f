//! Declaration discovery over loaded packages.
//!
//! Turns the parsed sources of a [`Package`] into [`Declaration`]s: API endpoints and the
//! struct types they (and their neighbours) declare. Discovery runs in two passes per
//! package, endpoints first and types second, through a [`Pass`].
//!
//! # Example
//!
//! ```no_run
//! use api_doc_sync::discover::{Pass, TypeIndex};
//! use api_doc_sync::loader::Session;
//! use std::path::Path;
//!
//! let mut session = Session::new(Path::new("./my-app"));
//! let package = session.load_package(Path::new("users")).unwrap();
//! let packages = vec![package];
//! let index = TypeIndex::build(&packages, &mut session.diagnostics);
//! let mut pass = Pass::new(&packages[0], &index, &mut session.diagnostics);
//! for endpoint in pass.endpoints() {
//!     println!("{} {:?}", endpoint.name, endpoint.methods);
//! }
//! ```

pub mod encoding;
pub mod endpoints;
pub mod path;
pub mod types;

use crate::loader::{Diagnostics, Package};
use crate::model::{HttpMethod, PathSegment, WireLocation};
use log::debug;
use std::path::{Path, PathBuf};

/// A declaration discovered in a package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Declaration {
    Endpoint(EndpointDecl),
    Type(TypeDecl),
}

impl Declaration {
    /// The file the declaration lives in
    pub fn file(&self) -> &Path {
        match self {
            Declaration::Endpoint(endpoint) => &endpoint.file,
            Declaration::Type(decl) => &decl.file,
        }
    }
}

/// Access level declared for an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Access {
    Public,
    Private,
    Auth,
}

/// An API endpoint declared by a handler function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointDecl {
    pub file: PathBuf,
    pub name: String,
    /// Raw doc comment, annotations included
    pub doc: String,
    /// Declared methods, in declaration order
    pub methods: Vec<HttpMethod>,
    pub access: Access,
    pub path: Vec<PathSegment>,
    pub request: Option<TypeRef>,
    pub response: Option<TypeRef>,
    pub request_encoding: Option<TypeEncoding>,
    pub response_encoding: Option<TypeEncoding>,
}

/// A struct type declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDecl {
    pub file: PathBuf,
    pub name: String,
    pub doc: String,
    /// Struct-level serde `rename_all` rule
    pub rename_all: Option<String>,
    pub fields: Vec<StructField>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructField {
    /// Field name; tuple fields are named by position
    pub name: String,
    pub type_name: String,
    pub doc: String,
    pub attrs: FieldAttrs,
}

/// Encoding-relevant attributes of a field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldAttrs {
    pub rename: Option<String>,
    pub skip_serializing: bool,
    pub skip_deserializing: bool,
    /// Explicit `#[api(header|query|cookie [= "name"])]`
    pub wire: Option<WireTag>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireTag {
    pub location: WireLocation,
    pub name: Option<String>,
}

/// A reference to a type from an endpoint signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeRef {
    /// A user-declared type. `name` is the type as written, `ident` its last path segment.
    Named { name: String, ident: String },
    /// `&T`, `Box<T>`, `Arc<T>` and friends
    Pointer(Box<TypeRef>),
    /// `Option<T>`
    Optional(Box<TypeRef>),
    /// Primitives, strings and std collections
    Builtin(String),
    /// Anything else, e.g. `impl Responder`
    Other(String),
}

impl TypeRef {
    /// Strip pointer and optional indirection.
    pub fn deref(&self) -> &TypeRef {
        let mut current = self;
        while let TypeRef::Pointer(inner) | TypeRef::Optional(inner) = current {
            current = inner.as_ref();
        }
        current
    }

    /// The type's name if it is a named type
    pub fn named(&self) -> Option<&str> {
        match self {
            TypeRef::Named { name, .. } => Some(name),
            _ => None,
        }
    }
}

/// How a request or response type travels on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeEncoding {
    /// Doc comment of the encoded type
    pub doc: String,
    pub parameters: Vec<ParameterEncoding>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterEncoding {
    pub src_name: String,
    pub wire_name: String,
    pub location: WireLocation,
    pub type_name: String,
    pub doc: String,
}

/// Struct declarations of every loaded package, for resolving type references.
#[derive(Debug, Default)]
pub struct TypeIndex {
    packages: Vec<(PathBuf, Vec<TypeDecl>)>,
}

impl TypeIndex {
    pub fn build(packages: &[Package], diagnostics: &mut Diagnostics) -> Self {
        let packages = packages
            .iter()
            .map(|package| {
                (
                    package.dir.clone(),
                    types::collect_structs(&package.files, diagnostics),
                )
            })
            .collect();
        Self { packages }
    }

    /// Find a struct by identifier, looking in `package_dir` before other packages.
    pub fn lookup(&self, package_dir: &Path, ident: &str) -> Option<&TypeDecl> {
        self.in_package(package_dir)
            .and_then(|decls| find_decl(decls, ident))
            .or_else(|| {
                self.packages
                    .iter()
                    .filter(|(dir, _)| dir != package_dir)
                    .find_map(|(_, decls)| find_decl(decls, ident))
            })
    }

    pub fn in_package(&self, package_dir: &Path) -> Option<&[TypeDecl]> {
        self.packages
            .iter()
            .find(|(dir, _)| dir == package_dir)
            .map(|(_, decls)| decls.as_slice())
    }
}

fn find_decl<'d>(decls: &'d [TypeDecl], ident: &str) -> Option<&'d TypeDecl> {
    decls.iter().find(|decl| decl.name == ident)
}

/// Discovery over one package.
pub struct Pass<'a> {
    package: &'a Package,
    index: &'a TypeIndex,
    diagnostics: &'a mut Diagnostics,
}

impl<'a> Pass<'a> {
    pub fn new(package: &'a Package, index: &'a TypeIndex, diagnostics: &'a mut Diagnostics) -> Self {
        Self {
            package,
            index,
            diagnostics,
        }
    }

    /// Endpoints declared in the package, in file order then source order.
    pub fn endpoints(&mut self) -> Vec<EndpointDecl> {
        let endpoints = endpoints::extract_endpoints(self.package, self.index, self.diagnostics);
        debug!(
            "Discovered {} endpoints in package {}",
            endpoints.len(),
            self.package.name
        );
        endpoints
    }

    /// Struct types declared in the package, in file order then source order.
    pub fn types(&self) -> Vec<TypeDecl> {
        self.index
            .in_package(&self.package.dir)
            .map(<[TypeDecl]>::to_vec)
            .unwrap_or_default()
    }

    /// Both passes, endpoints first.
    pub fn declarations(&mut self) -> Vec<Declaration> {
        let mut declarations: Vec<Declaration> =
            self.endpoints().into_iter().map(Declaration::Endpoint).collect();
        declarations.extend(self.types().into_iter().map(Declaration::Type));
        declarations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::AstParser;

    fn package(dir: &str, files: &[(&str, &str)]) -> Package {
        Package {
            dir: PathBuf::from(dir),
            name: Path::new(dir)
                .file_name()
                .unwrap()
                .to_string_lossy()
                .to_string(),
            files: files
                .iter()
                .map(|(name, code)| {
                    AstParser::parse_source(&Path::new(dir).join(name), code).unwrap()
                })
                .collect(),
        }
    }

    #[test]
    fn test_lookup_prefers_own_package() {
        let packages = vec![
            package("/app/users", &[("types.rs", "/// users\npub struct Page;")]),
            package("/app/posts", &[("types.rs", "/// posts\npub struct Page;\npub struct Post;")]),
        ];
        let mut diagnostics = Diagnostics::default();
        let index = TypeIndex::build(&packages, &mut diagnostics);

        assert_eq!(index.lookup(Path::new("/app/posts"), "Page").unwrap().doc, "posts");
        assert_eq!(index.lookup(Path::new("/app/users"), "Page").unwrap().doc, "users");
        assert_eq!(
            index.lookup(Path::new("/app/users"), "Post").unwrap().file,
            PathBuf::from("/app/posts/types.rs")
        );
        assert!(index.lookup(Path::new("/app/users"), "Missing").is_none());
    }

    #[test]
    fn test_declarations_put_endpoints_first() {
        let packages = vec![package(
            "/app/users",
            &[(
                "api.rs",
                r#"
                pub struct Params { pub id: u32 }

                #[api(public, method = "POST", path = "/users")]
                pub async fn create(p: Params) -> Result<(), Error> { Ok(()) }
                "#,
            )],
        )];
        let mut diagnostics = Diagnostics::default();
        let index = TypeIndex::build(&packages, &mut diagnostics);
        let mut pass = Pass::new(&packages[0], &index, &mut diagnostics);

        let declarations = pass.declarations();
        assert_eq!(declarations.len(), 2);
        assert!(matches!(declarations[0], Declaration::Endpoint(_)));
        assert!(matches!(declarations[1], Declaration::Type(_)));
        assert_eq!(declarations[1].file(), Path::new("/app/users/api.rs"));
    }

    #[test]
    fn test_deref_stops_at_named() {
        let nested = TypeRef::Pointer(Box::new(TypeRef::Optional(Box::new(TypeRef::Named {
            name: "Params".to_string(),
            ident: "Params".to_string(),
        }))));
        assert_eq!(nested.deref().named(), Some("Params"));
        assert_eq!(TypeRef::Builtin("String".to_string()).deref().named(), None);
    }
}
