//! Type declarations and type references.
//!
//! Collects every struct declared in a package, renders `syn` types back to source-like
//! strings, and classifies type references so endpoints can tell named types apart from
//! builtins and indirections.

use super::{FieldAttrs, StructField, TypeDecl, TypeRef, WireTag};
use crate::loader::Diagnostics;
use crate::model::WireLocation;
use crate::parser::ParsedFile;
use log::debug;
use std::path::PathBuf;
use syn::visit::Visit;

/// Types that are never user-declared named types
const BUILTIN_TYPES: &[&str] = &[
    "String", "str", "bool", "char", "i8", "i16", "i32", "i64", "i128", "isize", "u8", "u16",
    "u32", "u64", "u128", "usize", "f32", "f64", "Vec", "VecDeque", "HashMap", "BTreeMap",
    "HashSet", "BTreeSet", "Value",
];

/// Smart pointers unwrapped like references
const POINTER_TYPES: &[&str] = &["Box", "Arc", "Rc", "Cow"];

/// Collect the structs declared in `files`, in file order then source order.
pub fn collect_structs(files: &[ParsedFile], diagnostics: &mut Diagnostics) -> Vec<TypeDecl> {
    let mut visitor = StructVisitor {
        file: PathBuf::new(),
        decls: Vec::new(),
        diagnostics,
    };
    for parsed in files {
        visitor.file = parsed.path.clone();
        visitor.visit_file(&parsed.syntax_tree);
    }
    debug!("Collected {} struct declarations", visitor.decls.len());
    visitor.decls
}

struct StructVisitor<'d> {
    file: PathBuf,
    decls: Vec<TypeDecl>,
    diagnostics: &'d mut Diagnostics,
}

impl<'ast> Visit<'ast> for StructVisitor<'_> {
    fn visit_item_struct(&mut self, node: &'ast syn::ItemStruct) {
        let name = node.ident.to_string();
        let fields = node
            .fields
            .iter()
            .enumerate()
            .map(|(i, field)| {
                let name = field
                    .ident
                    .as_ref()
                    .map(|ident| ident.to_string())
                    .unwrap_or_else(|| i.to_string());
                let attrs = match parse_field_attrs(&field.attrs) {
                    Ok(attrs) => attrs,
                    Err(e) => {
                        self.diagnostics
                            .at(&self.file, format!("field `{}.{}`: {}", node.ident, name, e));
                        FieldAttrs::default()
                    }
                };
                StructField {
                    name,
                    type_name: render_type(&field.ty),
                    doc: doc_comment(&field.attrs),
                    attrs,
                }
            })
            .collect();

        self.decls.push(TypeDecl {
            file: self.file.clone(),
            name,
            doc: doc_comment(&node.attrs),
            rename_all: serde_rename_all(&node.attrs),
            fields,
        });
    }

    // Items local to function bodies are not part of the package's API.
    fn visit_item_fn(&mut self, _node: &'ast syn::ItemFn) {}

    fn visit_impl_item_fn(&mut self, _node: &'ast syn::ImplItemFn) {}
}

/// Join the `///` lines of an item, without the single space that follows the slashes.
pub fn doc_comment(attrs: &[syn::Attribute]) -> String {
    let mut lines = Vec::new();
    for attr in attrs {
        if !attr.path().is_ident("doc") {
            continue;
        }
        if let syn::Meta::NameValue(nv) = &attr.meta {
            if let syn::Expr::Lit(syn::ExprLit {
                lit: syn::Lit::Str(s),
                ..
            }) = &nv.value
            {
                let value = s.value();
                // Block comments arrive as a single value spanning several lines.
                for line in value.split('\n') {
                    lines.push(line.strip_prefix(' ').unwrap_or(line).to_string());
                }
            }
        }
    }
    lines.join("\n")
}

/// Render a type the way it is written in source, normalized for whitespace.
pub fn render_type(ty: &syn::Type) -> String {
    match ty {
        syn::Type::Path(type_path) => {
            let mut rendered = String::new();
            if let Some(qself) = &type_path.qself {
                rendered.push('<');
                rendered.push_str(&render_type(&qself.ty));
                rendered.push('>');
                rendered.push_str("::");
            } else if type_path.path.leading_colon.is_some() {
                rendered.push_str("::");
            }
            rendered.push_str(&render_path(&type_path.path));
            rendered
        }
        syn::Type::Reference(reference) => {
            let mut rendered = String::from("&");
            if let Some(lifetime) = &reference.lifetime {
                rendered.push_str(&format!("'{} ", lifetime.ident));
            }
            if reference.mutability.is_some() {
                rendered.push_str("mut ");
            }
            rendered.push_str(&render_type(&reference.elem));
            rendered
        }
        syn::Type::Ptr(ptr) => {
            let qualifier = if ptr.mutability.is_some() { "mut" } else { "const" };
            format!("*{} {}", qualifier, render_type(&ptr.elem))
        }
        syn::Type::Slice(slice) => format!("[{}]", render_type(&slice.elem)),
        syn::Type::Array(array) => {
            format!("[{}; {}]", render_type(&array.elem), render_expr(&array.len))
        }
        syn::Type::Tuple(tuple) => {
            let elems: Vec<String> = tuple.elems.iter().map(render_type).collect();
            if elems.len() == 1 {
                format!("({},)", elems[0])
            } else {
                format!("({})", elems.join(", "))
            }
        }
        syn::Type::Paren(paren) => render_type(&paren.elem),
        syn::Type::Group(group) => render_type(&group.elem),
        syn::Type::ImplTrait(impl_trait) => format!("impl {}", render_bounds(&impl_trait.bounds)),
        syn::Type::TraitObject(object) => format!("dyn {}", render_bounds(&object.bounds)),
        syn::Type::Never(_) => "!".to_string(),
        syn::Type::Infer(_) => "_".to_string(),
        _ => "unknown".to_string(),
    }
}

fn render_path(path: &syn::Path) -> String {
    path.segments
        .iter()
        .map(|segment| {
            let ident = segment.ident.to_string();
            match &segment.arguments {
                syn::PathArguments::None => ident,
                syn::PathArguments::AngleBracketed(args) => {
                    let args: Vec<String> = args.args.iter().map(render_generic_arg).collect();
                    format!("{}<{}>", ident, args.join(", "))
                }
                syn::PathArguments::Parenthesized(args) => {
                    let inputs: Vec<String> = args.inputs.iter().map(render_type).collect();
                    match &args.output {
                        syn::ReturnType::Default => format!("{}({})", ident, inputs.join(", ")),
                        syn::ReturnType::Type(_, ty) => {
                            format!("{}({}) -> {}", ident, inputs.join(", "), render_type(ty))
                        }
                    }
                }
            }
        })
        .collect::<Vec<_>>()
        .join("::")
}

fn render_generic_arg(arg: &syn::GenericArgument) -> String {
    match arg {
        syn::GenericArgument::Type(ty) => render_type(ty),
        syn::GenericArgument::Lifetime(lifetime) => format!("'{}", lifetime.ident),
        syn::GenericArgument::Const(expr) => render_expr(expr),
        syn::GenericArgument::AssocType(assoc) => {
            format!("{} = {}", assoc.ident, render_type(&assoc.ty))
        }
        _ => "_".to_string(),
    }
}

fn render_bounds(
    bounds: &syn::punctuated::Punctuated<syn::TypeParamBound, syn::Token![+]>,
) -> String {
    bounds
        .iter()
        .map(|bound| match bound {
            syn::TypeParamBound::Trait(trait_bound) => render_path(&trait_bound.path),
            syn::TypeParamBound::Lifetime(lifetime) => format!("'{}", lifetime.ident),
            _ => "_".to_string(),
        })
        .collect::<Vec<_>>()
        .join(" + ")
}

fn render_expr(expr: &syn::Expr) -> String {
    match expr {
        syn::Expr::Lit(syn::ExprLit {
            lit: syn::Lit::Int(int),
            ..
        }) => int.base10_digits().to_string(),
        syn::Expr::Path(path) => render_path(&path.path),
        syn::Expr::Block(block) if block.block.stmts.len() == 1 => match &block.block.stmts[0] {
            syn::Stmt::Expr(inner, None) => render_expr(inner),
            _ => "_".to_string(),
        },
        _ => "_".to_string(),
    }
}

/// The first generic type argument of the last path segment, e.g. `T` in `Json<T>`
pub fn first_generic(type_path: &syn::TypePath) -> Option<&syn::Type> {
    let segment = type_path.path.segments.last()?;
    if let syn::PathArguments::AngleBracketed(args) = &segment.arguments {
        args.args.iter().find_map(|arg| match arg {
            syn::GenericArgument::Type(ty) => Some(ty),
            _ => None,
        })
    } else {
        None
    }
}

/// The identifier of the last path segment, if `ty` is a plain path type
pub fn last_ident(ty: &syn::Type) -> Option<String> {
    match ty {
        syn::Type::Path(type_path) if type_path.qself.is_none() => type_path
            .path
            .segments
            .last()
            .map(|segment| segment.ident.to_string()),
        syn::Type::Paren(paren) => last_ident(&paren.elem),
        syn::Type::Group(group) => last_ident(&group.elem),
        _ => None,
    }
}

/// Classify a type reference.
pub fn classify(ty: &syn::Type) -> TypeRef {
    match ty {
        syn::Type::Reference(reference) => TypeRef::Pointer(Box::new(classify(&reference.elem))),
        syn::Type::Ptr(ptr) => TypeRef::Pointer(Box::new(classify(&ptr.elem))),
        syn::Type::Paren(paren) => classify(&paren.elem),
        syn::Type::Group(group) => classify(&group.elem),
        syn::Type::Tuple(tuple) if tuple.elems.is_empty() => TypeRef::Builtin("()".to_string()),
        syn::Type::Slice(_) | syn::Type::Array(_) => TypeRef::Builtin(render_type(ty)),
        syn::Type::Path(type_path) if type_path.qself.is_none() => {
            let Some(segment) = type_path.path.segments.last() else {
                return TypeRef::Other(render_type(ty));
            };
            let ident = segment.ident.to_string();

            if POINTER_TYPES.contains(&ident.as_str()) {
                if let Some(inner) = first_generic(type_path) {
                    return TypeRef::Pointer(Box::new(classify(inner)));
                }
            }
            if ident == "Option" {
                if let Some(inner) = first_generic(type_path) {
                    return TypeRef::Optional(Box::new(classify(inner)));
                }
            }
            if BUILTIN_TYPES.contains(&ident.as_str()) {
                return TypeRef::Builtin(render_type(ty));
            }
            TypeRef::Named {
                name: render_type(ty),
                ident,
            }
        }
        _ => TypeRef::Other(render_type(ty)),
    }
}

/// Parse the serde and `api` attributes of a struct field.
///
/// Serde attributes are read leniently since they belong to another crate; a malformed
/// `#[api(...)]` attribute is an error.
pub fn parse_field_attrs(attrs: &[syn::Attribute]) -> syn::Result<FieldAttrs> {
    let mut field_attrs = FieldAttrs::default();

    for attr in attrs {
        if attr.path().is_ident("serde") {
            // Malformed serde attributes are serde's to report; keep what parsed.
            let parsed = attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("rename") {
                    if meta.input.peek(syn::Token![=]) {
                        let value: syn::LitStr = meta.value()?.parse()?;
                        field_attrs.rename = Some(value.value());
                    } else {
                        meta.parse_nested_meta(|inner| {
                            if inner.path.is_ident("serialize") {
                                let value: syn::LitStr = inner.value()?.parse()?;
                                field_attrs.rename = Some(value.value());
                                Ok(())
                            } else {
                                skip_meta_value(&inner)
                            }
                        })?;
                    }
                } else if meta.path.is_ident("skip") {
                    field_attrs.skip_serializing = true;
                    field_attrs.skip_deserializing = true;
                } else if meta.path.is_ident("skip_serializing") {
                    field_attrs.skip_serializing = true;
                } else if meta.path.is_ident("skip_deserializing") {
                    field_attrs.skip_deserializing = true;
                } else {
                    skip_meta_value(&meta)?;
                }
                Ok(())
            });
            if let Err(e) = parsed {
                debug!("Ignoring malformed serde field attribute: {}", e);
            }
        } else if attr.path().is_ident("api") {
            attr.parse_nested_meta(|meta| {
                let location = if meta.path.is_ident("header") {
                    WireLocation::Header
                } else if meta.path.is_ident("query") {
                    WireLocation::Query
                } else if meta.path.is_ident("cookie") {
                    WireLocation::Cookie
                } else {
                    return Err(meta.error("expected `header`, `query` or `cookie`"));
                };
                let name = if meta.input.peek(syn::Token![=]) {
                    let value: syn::LitStr = meta.value()?.parse()?;
                    Some(value.value())
                } else {
                    None
                };
                field_attrs.wire = Some(WireTag { location, name });
                Ok(())
            })?;
        }
    }

    Ok(field_attrs)
}

/// Struct-level `#[serde(rename_all = "...")]`
fn serde_rename_all(attrs: &[syn::Attribute]) -> Option<String> {
    let mut rename_all = None;
    for attr in attrs.iter().filter(|attr| attr.path().is_ident("serde")) {
        let parsed = attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename_all") && meta.input.peek(syn::Token![=]) {
                let value: syn::LitStr = meta.value()?.parse()?;
                rename_all = Some(value.value());
                Ok(())
            } else {
                skip_meta_value(&meta)
            }
        });
        if let Err(e) = parsed {
            debug!("Ignoring malformed serde container attribute: {}", e);
        }
    }
    rename_all
}

/// Consume the value of a nested meta item we do not interpret.
fn skip_meta_value(meta: &syn::meta::ParseNestedMeta) -> syn::Result<()> {
    if meta.input.peek(syn::Token![=]) {
        let _: syn::Expr = meta.value()?.parse()?;
    } else if meta.input.peek(syn::token::Paren) {
        meta.parse_nested_meta(|inner| skip_meta_value(&inner))?;
    }
    Ok(())
}
