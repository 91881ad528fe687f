use super::encoding::{request_encoding, response_encoding};
use super::path::parse_path;
use super::types::{classify, doc_comment, first_generic, last_ident, render_type};
use super::{Access, EndpointDecl, TypeDecl, TypeIndex, TypeRef};
use crate::loader::{Diagnostics, Package};
use crate::model::{HttpMethod, PathSegment, SegmentKind};
use log::debug;
use std::path::PathBuf;
use syn::visit::Visit;
use syn::{Attribute, FnArg, LitStr, Pat};

/// Route macros that name a single HTTP method
const METHOD_MACROS: &[&str] = &["get", "post", "put", "delete", "patch", "head", "options"];

/// Handler arguments supplied by the framework rather than the caller
const CONTEXT_TYPES: &[&str] = &[
    "HttpRequest",
    "Request",
    "Data",
    "State",
    "Extension",
    "HeaderMap",
    "Payload",
];

/// Wrappers whose type argument is the request or response data
const BODY_WRAPPERS: &[&str] = &["Json", "Query", "Form"];

/// Framework response types that are not data types unless the package declares them
const RESPONSE_TYPES: &[&str] = &["HttpResponse", "Response", "StatusCode", "Html", "Redirect"];

/// Extract the endpoints declared in a package.
///
/// An endpoint is a function or method carrying an `#[api(...)]` attribute and/or a route
/// macro such as `#[get("/users/{id}")]`. Problems are reported to `diagnostics`; an
/// endpoint whose attributes cannot be read at all is skipped.
pub fn extract_endpoints(
    package: &Package,
    index: &TypeIndex,
    diagnostics: &mut Diagnostics,
) -> Vec<EndpointDecl> {
    let mut visitor = EndpointVisitor {
        package,
        index,
        diagnostics,
        file: PathBuf::new(),
        endpoints: Vec::new(),
    };
    for parsed in &package.files {
        visitor.file = parsed.path.clone();
        visitor.visit_file(&parsed.syntax_tree);
    }
    visitor.endpoints
}

/// Visitor for traversing the AST and finding endpoint handlers
struct EndpointVisitor<'a> {
    package: &'a Package,
    index: &'a TypeIndex,
    diagnostics: &'a mut Diagnostics,
    file: PathBuf,
    endpoints: Vec<EndpointDecl>,
}

/// What the attributes of a handler declare
#[derive(Debug, Default)]
struct EndpointAttrs {
    /// Whether any endpoint attribute was found
    found: bool,
    access: Option<Access>,
    /// Method names as written, validated later
    methods: Vec<String>,
    path: Option<String>,
}

impl<'ast> Visit<'ast> for EndpointVisitor<'_> {
    fn visit_item_fn(&mut self, node: &'ast syn::ItemFn) {
        self.inspect_handler(&node.attrs, &node.sig);
        // Handlers are not nested in function bodies.
    }

    fn visit_impl_item_fn(&mut self, node: &'ast syn::ImplItemFn) {
        self.inspect_handler(&node.attrs, &node.sig);
    }
}

impl<'a> EndpointVisitor<'a> {
    fn inspect_handler(&mut self, attrs: &[Attribute], sig: &syn::Signature) {
        let name = sig.ident.to_string();
        let declared = match parse_endpoint_attrs(attrs) {
            Ok(declared) if declared.found => declared,
            Ok(_) => return,
            Err(e) => {
                self.diagnostics
                    .at(&self.file, format!("endpoint `{}`: {}", name, e));
                return;
            }
        };
        debug!("Found endpoint {} in {}", name, self.file.display());

        let raw_path = declared
            .path
            .clone()
            .unwrap_or_else(|| format!("/{}.{}", self.package.name, name));
        let (mut path, problems) = parse_path(&raw_path);
        for problem in problems {
            self.diagnostics
                .at(&self.file, format!("endpoint `{}`: {}", name, problem));
        }

        let request = self.resolve_request(sig, &mut path);
        let response = self.resolve_response(sig);
        let methods = self.resolve_methods(&name, &declared.methods, request.is_some());

        let request_encoding = match (request.as_ref(), methods.first()) {
            (Some(request), Some(method)) => self
                .lookup(request)
                .and_then(|decl| request_encoding(decl, *method)),
            _ => None,
        };
        let response_encoding = response
            .as_ref()
            .and_then(|response| self.lookup(response))
            .and_then(response_encoding);

        self.endpoints.push(EndpointDecl {
            file: self.file.clone(),
            name,
            doc: doc_comment(attrs),
            methods,
            access: declared.access.unwrap_or(Access::Private),
            path,
            request,
            response,
            request_encoding,
            response_encoding,
        });
    }

    /// Validate declared methods, falling back to defaults when none are usable.
    fn resolve_methods(
        &mut self,
        name: &str,
        declared: &[String],
        has_request: bool,
    ) -> Vec<HttpMethod> {
        let mut methods = Vec::new();
        for raw in declared {
            match HttpMethod::parse(raw) {
                Some(method) if !methods.contains(&method) => methods.push(method),
                Some(_) => {}
                None => self.diagnostics.at(
                    &self.file,
                    format!("endpoint `{}`: unknown HTTP method `{}`", name, raw),
                ),
            }
        }
        if methods.is_empty() {
            methods = if has_request {
                vec![HttpMethod::Post]
            } else {
                vec![HttpMethod::Get, HttpMethod::Post]
            };
        }
        methods
    }

    /// Find the request type among the handler arguments.
    ///
    /// Arguments named after a path parameter, and `Path<...>` extractors, give the
    /// parameters their value types instead.
    fn resolve_request(&self, sig: &syn::Signature, path: &mut [PathSegment]) -> Option<TypeRef> {
        let mut request = None;

        for input in &sig.inputs {
            let FnArg::Typed(pat_type) = input else {
                continue;
            };
            let arg_name = match pat_type.pat.as_ref() {
                Pat::Ident(pat_ident) => Some(pat_ident.ident.to_string()),
                _ => None,
            };

            if let Some(arg) = arg_name.as_deref() {
                if let Some(segment) = param_segment(path, arg) {
                    segment.value_type = Some(render_type(&pat_type.ty));
                    continue;
                }
            }

            let Some(ident) = last_ident(&pat_type.ty) else {
                if request.is_none() {
                    request = Some(classify(&pat_type.ty));
                }
                continue;
            };
            if ident == "Path" {
                assign_path_extractor(&pat_type.ty, path);
                continue;
            }
            if CONTEXT_TYPES.contains(&ident.as_str()) || request.is_some() {
                continue;
            }
            request = Some(match unwrap_wrappers(&pat_type.ty, BODY_WRAPPERS) {
                Some(inner) => classify(inner),
                None => classify(&pat_type.ty),
            });
        }

        request
    }

    fn resolve_response(&self, sig: &syn::Signature) -> Option<TypeRef> {
        let syn::ReturnType::Type(_, ty) = &sig.output else {
            return None;
        };

        let mut ty: &syn::Type = ty;
        while let Some(inner) = unwrap_wrappers(ty, &["Result", "Json"]) {
            ty = inner;
        }

        match classify(ty) {
            TypeRef::Builtin(name) if name == "()" => None,
            TypeRef::Other(_) => None,
            TypeRef::Named { ident, .. }
                if RESPONSE_TYPES.contains(&ident.as_str())
                    && self.index.lookup(&self.package.dir, &ident).is_none() =>
            {
                None
            }
            other => Some(other),
        }
    }

    fn lookup(&self, type_ref: &TypeRef) -> Option<&'a TypeDecl> {
        match type_ref.deref() {
            TypeRef::Named { ident, .. } => self.index.lookup(&self.package.dir, ident),
            _ => None,
        }
    }
}

fn param_segment<'p>(path: &'p mut [PathSegment], name: &str) -> Option<&'p mut PathSegment> {
    path.iter_mut()
        .find(|segment| segment.kind != SegmentKind::Literal && segment.value == name)
}

/// Give path parameters the types of a `Path<T>` or `Path<(A, B)>` extractor, in order.
fn assign_path_extractor(ty: &syn::Type, path: &mut [PathSegment]) {
    let Some(inner) = unwrap_wrappers(ty, &["Path"]) else {
        return;
    };
    let types: Vec<String> = match inner {
        syn::Type::Tuple(tuple) => tuple.elems.iter().map(render_type).collect(),
        other => vec![render_type(other)],
    };
    let params = path
        .iter_mut()
        .filter(|segment| segment.kind != SegmentKind::Literal);
    for (segment, value_type) in params.zip(types) {
        if segment.value_type.is_none() {
            segment.value_type = Some(value_type);
        }
    }
}

/// `T` if `ty` is one of `wrappers` around `T`, e.g. `Json<T>`
fn unwrap_wrappers<'t>(ty: &'t syn::Type, wrappers: &[&str]) -> Option<&'t syn::Type> {
    let syn::Type::Path(type_path) = ty else {
        return None;
    };
    let ident = type_path.path.segments.last()?.ident.to_string();
    if wrappers.contains(&ident.as_str()) {
        first_generic(type_path)
    } else {
        None
    }
}

/// Read the endpoint attributes of a handler
fn parse_endpoint_attrs(attrs: &[Attribute]) -> syn::Result<EndpointAttrs> {
    let mut declared = EndpointAttrs::default();

    for attr in attrs {
        let Some(attr_name) = attr.path().segments.last().map(|s| s.ident.to_string()) else {
            continue;
        };

        if attr_name == "api" {
            declared.found = true;
            parse_api_attr(attr, &mut declared)?;
        } else if METHOD_MACROS.contains(&attr_name.as_str()) {
            // Actix macros look like: #[get("/path")] or #[get("/path", wrap = "...")]
            let route_path = attr.parse_args_with(|input: syn::parse::ParseStream| {
                let path: LitStr = input.parse()?;
                let _rest: proc_macro2::TokenStream = input.parse()?;
                Ok(path)
            })?;
            declared.found = true;
            declared.methods.push(attr_name);
            declared.path.get_or_insert(route_path.value());
            declared.access.get_or_insert(Access::Public);
        } else if attr_name == "route" {
            parse_route_attr(attr, &mut declared)?;
            declared.found = true;
            declared.access.get_or_insert(Access::Public);
        }
    }

    Ok(declared)
}

/// `#[api(public, method = "GET,POST", path = "/users/:id")]`
fn parse_api_attr(attr: &Attribute, declared: &mut EndpointAttrs) -> syn::Result<()> {
    if let syn::Meta::Path(_) = attr.meta {
        return Ok(());
    }

    // An explicit access level overrides the public default of route macros.
    attr.parse_nested_meta(|meta| {
        if meta.path.is_ident("public") {
            declared.access = Some(Access::Public);
        } else if meta.path.is_ident("private") {
            declared.access = Some(Access::Private);
        } else if meta.path.is_ident("auth") {
            declared.access = Some(Access::Auth);
        } else if meta.path.is_ident("raw") {
            // Raw endpoints handle the request themselves; nothing to record.
        } else if meta.path.is_ident("method") {
            let value: LitStr = meta.value()?.parse()?;
            for method in value.value().split(',') {
                let method = method.trim();
                if !method.is_empty() {
                    declared.methods.push(method.to_string());
                }
            }
        } else if meta.path.is_ident("path") {
            let value: LitStr = meta.value()?.parse()?;
            declared.path = Some(value.value());
        } else {
            return Err(meta.error("unsupported api attribute"));
        }
        Ok(())
    })
}

/// `#[route("/path", method = "GET", method = "POST")]`
fn parse_route_attr(attr: &Attribute, declared: &mut EndpointAttrs) -> syn::Result<()> {
    let (route_path, methods) = attr.parse_args_with(|input: syn::parse::ParseStream| {
        let path: LitStr = input.parse()?;
        let mut methods = Vec::new();
        while !input.is_empty() {
            input.parse::<syn::Token![,]>()?;
            if input.is_empty() {
                break;
            }
            let nv: syn::MetaNameValue = input.parse()?;
            if nv.path.is_ident("method") {
                if let syn::Expr::Lit(syn::ExprLit {
                    lit: syn::Lit::Str(s),
                    ..
                }) = &nv.value
                {
                    methods.push(s.value());
                }
            }
        }
        Ok((path, methods))
    })?;

    declared.path.get_or_insert(route_path.value());
    declared.methods.extend(methods);
    Ok(())
}
