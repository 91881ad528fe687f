use crate::error::{Error, Result};
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};

/// AST (Abstract Syntax Tree) parser for Rust source files.
///
/// The `AstParser` uses the `syn` crate to parse Rust source code into an abstract syntax tree.
/// Test-only items (`#[cfg(test)]` modules and `#[test]` functions) are removed from the
/// tree, so later passes only ever see production code.
///
/// # Example
///
/// ```no_run
/// use api_doc_sync::parser::AstParser;
/// use std::path::Path;
///
/// let parsed = AstParser::parse_file(Path::new("src/main.rs")).unwrap();
/// println!("Parsed {} items", parsed.syntax_tree.items.len());
/// ```
pub struct AstParser;

/// A successfully parsed Rust file with its abstract syntax tree.
#[derive(Debug)]
pub struct ParsedFile {
    /// Path to the source file
    pub path: PathBuf,
    /// The parsed abstract syntax tree, without test-only items
    pub syntax_tree: syn::File,
}

impl AstParser {
    /// Reads and parses a single Rust source file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or contains invalid Rust syntax.
    pub fn parse_file(path: &Path) -> Result<ParsedFile> {
        let content = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Self::parse_source(path, &content)
    }

    /// Parses source text that belongs to `path`.
    ///
    /// Used for overlay contents that replace, or stand in for, the file on disk.
    pub fn parse_source(path: &Path, content: &str) -> Result<ParsedFile> {
        debug!("Parsing file: {}", path.display());

        let mut syntax_tree = syn::parse_file(content).map_err(|e| {
            let start = e.span().start();
            Error::ParseError {
                file: path.to_path_buf(),
                message: format!("{}:{}: {}", start.line, start.column + 1, e),
            }
        })?;
        strip_test_items(&mut syntax_tree.items);

        debug!("Successfully parsed file: {}", path.display());

        Ok(ParsedFile {
            path: path.to_path_buf(),
            syntax_tree,
        })
    }
}

/// Whether the attributes mark an item as test-only
pub fn is_test_only(attrs: &[syn::Attribute]) -> bool {
    attrs.iter().any(|attr| {
        if attr.path().is_ident("test") {
            return true;
        }
        attr.path().is_ident("cfg")
            && attr
                .parse_args::<syn::Ident>()
                .map(|ident| ident == "test")
                .unwrap_or(false)
    })
}

fn strip_test_items(items: &mut Vec<syn::Item>) {
    items.retain(|item| !is_test_only(item_attrs(item)));
    for item in items.iter_mut() {
        match item {
            syn::Item::Mod(item_mod) => {
                if let Some((_, nested)) = &mut item_mod.content {
                    strip_test_items(nested);
                }
            }
            syn::Item::Impl(item_impl) => {
                item_impl.items.retain(|impl_item| match impl_item {
                    syn::ImplItem::Fn(f) => !is_test_only(&f.attrs),
                    _ => true,
                });
            }
            _ => {}
        }
    }
}

fn item_attrs(item: &syn::Item) -> &[syn::Attribute] {
    match item {
        syn::Item::Fn(i) => &i.attrs,
        syn::Item::Mod(i) => &i.attrs,
        syn::Item::Struct(i) => &i.attrs,
        syn::Item::Enum(i) => &i.attrs,
        syn::Item::Impl(i) => &i.attrs,
        syn::Item::Use(i) => &i.attrs,
        syn::Item::Const(i) => &i.attrs,
        syn::Item::Static(i) => &i.attrs,
        syn::Item::Type(i) => &i.attrs,
        syn::Item::Trait(i) => &i.attrs,
        _ => &[],
    }
}
