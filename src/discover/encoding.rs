//! Wire encoding of request and response types.
//!
//! Decides, for each field of a struct used as an endpoint's request or response, where
//! the field travels (header, query string, cookie or body) and under which name.

use super::{ParameterEncoding, StructField, TypeDecl, TypeEncoding};
use crate::model::{HttpMethod, WireLocation};
use heck::{
    ToKebabCase, ToLowerCamelCase, ToShoutyKebabCase, ToShoutySnakeCase, ToSnakeCase,
    ToTrainCase, ToUpperCamelCase,
};

/// Encoding of `decl` used as the request of an endpoint called with `method`.
///
/// Fields tagged `#[api(header)]`, `#[api(query)]` or `#[api(cookie)]` go there; the rest
/// go to the query string for methods without a body and to the body otherwise. Returns
/// `None` when no field is encoded.
pub fn request_encoding(decl: &TypeDecl, method: HttpMethod) -> Option<TypeEncoding> {
    let default_location = if method.sends_query() {
        WireLocation::Query
    } else {
        WireLocation::Body
    };
    encode(
        decl,
        |field| field.attrs.skip_deserializing,
        |field| match &field.attrs.wire {
            Some(tag) => tag.location,
            None => default_location,
        },
    )
}

/// Encoding of `decl` used as the response of an endpoint.
///
/// Only headers can be set explicitly; everything else is part of the body.
pub fn response_encoding(decl: &TypeDecl) -> Option<TypeEncoding> {
    encode(
        decl,
        |field| field.attrs.skip_serializing,
        |field| match &field.attrs.wire {
            Some(tag) if tag.location == WireLocation::Header => WireLocation::Header,
            _ => WireLocation::Body,
        },
    )
}

fn encode(
    decl: &TypeDecl,
    skipped: impl Fn(&StructField) -> bool,
    location: impl Fn(&StructField) -> WireLocation,
) -> Option<TypeEncoding> {
    let parameters: Vec<ParameterEncoding> = decl
        .fields
        .iter()
        .filter(|field| !skipped(field))
        .map(|field| {
            let location = location(field);
            ParameterEncoding {
                src_name: field.name.clone(),
                wire_name: wire_name(decl, field, location),
                location,
                type_name: field.type_name.clone(),
                doc: field.doc.clone(),
            }
        })
        .collect();

    if parameters.is_empty() {
        return None;
    }
    Some(TypeEncoding {
        doc: decl.doc.clone(),
        parameters,
    })
}

/// The name a field goes by on the wire.
///
/// An explicit name in the `api` attribute wins over a serde rename, which wins over the
/// struct's `rename_all` rule. Headers without an explicit name use Train-Case.
fn wire_name(decl: &TypeDecl, field: &StructField, location: WireLocation) -> String {
    if let Some(tag) = &field.attrs.wire {
        if tag.location == location {
            if let Some(name) = &tag.name {
                return name.clone();
            }
        }
    }
    if location == WireLocation::Header {
        return field.name.to_train_case();
    }
    if let Some(rename) = &field.attrs.rename {
        return rename.clone();
    }
    match decl.rename_all.as_deref() {
        Some(rule) => apply_rename_rule(rule, &field.name),
        None => field.name.clone(),
    }
}

/// Apply a serde `rename_all` rule to a snake_case field name
fn apply_rename_rule(rule: &str, name: &str) -> String {
    match rule {
        "lowercase" => name.to_lowercase(),
        "UPPERCASE" => name.to_uppercase(),
        "PascalCase" => name.to_upper_camel_case(),
        "camelCase" => name.to_lower_camel_case(),
        "snake_case" => name.to_snake_case(),
        "SCREAMING_SNAKE_CASE" => name.to_shouty_snake_case(),
        "kebab-case" => name.to_kebab_case(),
        "SCREAMING-KEBAB-CASE" => name.to_shouty_kebab_case(),
        _ => name.to_string(),
    }
}
