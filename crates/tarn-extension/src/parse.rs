//! Finding command definitions in Rust sources.
//!
//! A public free function with no parameters or a single `&[String]`
//! parameter, returning `()` or a `Result`, is a command. A public struct
//! whose inherent `impl` has such public methods (optionally taking `&self`)
//! is a namespace. `///` comments become descriptions, and a
//! `pub const ALIASES: &[(&str, &str)]` table maps aliases to commands.
//!
//! A `&self` method on a struct with fields needs an instance, so its struct
//! must derive or implement `Default` in the same file. Methods on other
//! structs are skipped with a warning.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};

use syn::ext::IdentExt;
use syn::{
    Attribute, Expr, FnArg, GenericArgument, ImplItem, Item, ItemConst, ItemFn, ItemImpl,
    ItemStruct, Lit, Meta, PathArguments, ReturnType, Signature, Type, Visibility,
};
use tracing::{debug, warn};

use crate::error::{ExtensionError, Result};

/// How the harness calls a definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Function {
        ident: String,
    },
    Method {
        ty: String,
        ident: String,
        /// Takes `&self`; the harness builds an instance first.
        receiver: bool,
        /// `Unit` structs are constructed directly, others via `Default`.
        unit_struct: bool,
    },
}

/// One command found in a source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandDef {
    pub namespace: Option<String>,
    pub method: Option<String>,
    pub name: String,
    pub description: Option<String>,
    pub long_description: Option<String>,
    /// Notice from `#[deprecated]`.
    pub deprecated: Option<String>,
    pub takes_args: bool,
    pub target: Target,
    pub source: PathBuf,
}

impl CommandDef {
    /// Lowercase full name, `namespace:method` or the function name.
    pub fn full_name(&self) -> String {
        match (&self.namespace, &self.method) {
            (Some(ns), Some(method)) => format!("{}:{}", ns.to_lowercase(), method.to_lowercase()),
            _ => self.name.to_lowercase(),
        }
    }
}

/// Everything found in one file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedFile {
    pub commands: Vec<CommandDef>,
    /// alias -> command name
    pub aliases: BTreeMap<String, String>,
}

/// Read and parse a source file.
pub fn parse_file(path: &Path) -> Result<ParsedFile> {
    let content = std::fs::read_to_string(path).map_err(ExtensionError::io(path))?;
    parse_source(path, &content)
}

/// Parse source text; `path` is recorded on each definition.
pub fn parse_source(path: &Path, content: &str) -> Result<ParsedFile> {
    let file = syn::parse_file(content).map_err(|e| ExtensionError::Parse {
        path: path.to_path_buf(),
        line: Some(e.span().start().line),
        message: e.to_string(),
    })?;

    let mut parsed = ParsedFile::default();
    let mut structs: HashMap<String, &ItemStruct> = HashMap::new();
    let mut defaultable: HashSet<String> = HashSet::new();

    for item in &file.items {
        match item {
            Item::Struct(item) => {
                if derives_default(&item.attrs) {
                    defaultable.insert(item.ident.to_string());
                }
                if is_pub(&item.vis) && !is_doc_hidden(&item.attrs) {
                    structs.insert(item.ident.to_string(), item);
                }
            }
            Item::Impl(item) if implements_default(item) => {
                if let Some(ty) = self_type_name(&item.self_ty) {
                    defaultable.insert(ty);
                }
            }
            Item::Const(item) if item.ident == "ALIASES" => {
                parsed.aliases.extend(alias_table(item));
            }
            _ => {}
        }
    }

    for item in &file.items {
        match item {
            Item::Fn(item) => {
                if let Some(def) = function_command(path, item) {
                    parsed.commands.push(def);
                }
            }
            Item::Impl(item) => {
                parsed.commands.extend(method_commands(path, item, &structs, &defaultable));
            }
            _ => {}
        }
    }

    debug!(
        path = %path.display(),
        commands = parsed.commands.len(),
        aliases = parsed.aliases.len(),
        "parsed command source"
    );
    Ok(parsed)
}

fn function_command(path: &Path, item: &ItemFn) -> Option<CommandDef> {
    if !is_pub(&item.vis) || item.sig.ident == "main" || is_doc_hidden(&item.attrs) {
        return None;
    }
    let shape = signature_shape(&item.sig)?;
    if shape.receiver {
        return None;
    }
    let (description, long_description) = doc_text(&item.attrs);
    let ident = item.sig.ident.to_string();
    Some(CommandDef {
        namespace: None,
        method: None,
        name: item.sig.ident.unraw().to_string(),
        description,
        long_description,
        deprecated: deprecation(&item.attrs),
        takes_args: shape.takes_args,
        target: Target::Function { ident },
        source: path.to_path_buf(),
    })
}

fn method_commands(
    path: &Path,
    item: &ItemImpl,
    structs: &HashMap<String, &ItemStruct>,
    defaultable: &HashSet<String>,
) -> Vec<CommandDef> {
    if item.trait_.is_some() || !item.generics.params.is_empty() {
        return Vec::new();
    }
    let Some(ty) = self_type_name(&item.self_ty) else {
        return Vec::new();
    };
    let Some(strukt) = structs.get(&ty) else {
        return Vec::new();
    };
    let unit_struct = matches!(strukt.fields, syn::Fields::Unit);
    let (namespace_doc, _) = doc_text(&strukt.attrs);

    item.items
        .iter()
        .filter_map(|member| match member {
            ImplItem::Fn(method) => Some(method),
            _ => None,
        })
        .filter(|method| is_pub(&method.vis) && !is_doc_hidden(&method.attrs))
        .filter_map(|method| {
            let shape = signature_shape(&method.sig)?;
            if shape.receiver && !unit_struct && !defaultable.contains(&ty) {
                warn!(
                    path = %path.display(),
                    command = %format!("{ty}:{}", method.sig.ident.unraw()).to_lowercase(),
                    "skipping method: `{ty}` has fields but no `Default`, so it cannot be constructed"
                );
                return None;
            }
            let (description, long_description) = doc_text(&method.attrs);
            let ident = method.sig.ident.to_string();
            let method_name = method.sig.ident.unraw().to_string();
            Some(CommandDef {
                namespace: Some(ty.clone()),
                method: Some(method_name.clone()),
                name: format!("{ty}:{method_name}"),
                description: description.or_else(|| namespace_doc.clone()),
                long_description,
                deprecated: deprecation(&method.attrs).or_else(|| deprecation(&strukt.attrs)),
                takes_args: shape.takes_args,
                target: Target::Method {
                    ty: ty.clone(),
                    ident,
                    receiver: shape.receiver,
                    unit_struct,
                },
                source: path.to_path_buf(),
            })
        })
        .collect()
}

struct Shape {
    receiver: bool,
    takes_args: bool,
}

/// Accepted: no generics, not async, optional `&self`, then nothing or
/// `&[String]`, returning `()` or a `Result`.
fn signature_shape(sig: &Signature) -> Option<Shape> {
    if sig.asyncness.is_some() || sig.unsafety.is_some() || !sig.generics.params.is_empty() {
        return None;
    }
    if !returns_unit_or_result(&sig.output) {
        return None;
    }

    let mut receiver = false;
    let mut typed = Vec::new();
    for input in &sig.inputs {
        match input {
            FnArg::Receiver(r) if r.reference.is_some() && r.mutability.is_none() => receiver = true,
            FnArg::Receiver(_) => return None,
            FnArg::Typed(pat) => typed.push(&*pat.ty),
        }
    }

    let takes_args = match typed.as_slice() {
        [] => false,
        [ty] if is_string_slice(ty) => true,
        _ => return None,
    };
    Some(Shape {
        receiver,
        takes_args,
    })
}

fn is_unit(ty: &Type) -> bool {
    matches!(ty, Type::Tuple(tuple) if tuple.elems.is_empty())
}

/// `()`, or any `Result` whose success type is `()`.
fn returns_unit_or_result(output: &ReturnType) -> bool {
    let ty = match output {
        ReturnType::Default => return true,
        ReturnType::Type(_, ty) => &**ty,
    };
    if is_unit(ty) {
        return true;
    }
    let Type::Path(path) = ty else {
        return false;
    };
    let Some(last) = path.path.segments.last() else {
        return false;
    };
    if last.ident != "Result" {
        return false;
    }
    match &last.arguments {
        PathArguments::AngleBracketed(args) => matches!(
            args.args.first(),
            Some(GenericArgument::Type(ok)) if is_unit(ok)
        ),
        _ => false,
    }
}

fn is_string_slice(ty: &Type) -> bool {
    let Type::Reference(reference) = ty else {
        return false;
    };
    if reference.mutability.is_some() {
        return false;
    }
    let Type::Slice(slice) = &*reference.elem else {
        return false;
    };
    matches!(&*slice.elem, Type::Path(p) if p.path.segments.last().is_some_and(|s| s.ident == "String"))
}

fn self_type_name(ty: &Type) -> Option<String> {
    match ty {
        Type::Path(p) if p.qself.is_none() && p.path.segments.len() == 1 => {
            Some(p.path.segments[0].ident.to_string())
        }
        _ => None,
    }
}

/// Notice of a `#[deprecated]` attribute in any of its three forms.
fn deprecation(attrs: &[Attribute]) -> Option<String> {
    const NO_NOTE: &str = "it may be removed in a future version";

    let attr = attrs.iter().find(|attr| attr.path().is_ident("deprecated"))?;
    match &attr.meta {
        Meta::Path(_) => Some(NO_NOTE.to_string()),
        Meta::NameValue(nv) => Some(string_literal(&nv.value).unwrap_or_else(|| NO_NOTE.to_string())),
        Meta::List(_) => {
            let mut note = None;
            let _ = attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("note") {
                    note = Some(meta.value()?.parse::<syn::LitStr>()?.value());
                } else if meta.input.peek(syn::Token![=]) {
                    meta.value()?.parse::<Expr>()?;
                }
                Ok(())
            });
            Some(note.unwrap_or_else(|| NO_NOTE.to_string()))
        }
    }
}

/// `#[derive(Default)]`, also as `#[derive(std::default::Default)]`.
fn derives_default(attrs: &[Attribute]) -> bool {
    attrs.iter().filter(|attr| attr.path().is_ident("derive")).any(|attr| {
        let mut found = false;
        let _ = attr.parse_nested_meta(|meta| {
            if meta.path.segments.last().is_some_and(|s| s.ident == "Default") {
                found = true;
            }
            Ok(())
        });
        found
    })
}

fn implements_default(item: &ItemImpl) -> bool {
    let Some((negative, path, _)) = &item.trait_ else {
        return false;
    };
    negative.is_none()
        && item.generics.params.is_empty()
        && path.segments.last().is_some_and(|s| s.ident == "Default")
}

fn is_pub(vis: &Visibility) -> bool {
    matches!(vis, Visibility::Public(_))
}

fn is_doc_hidden(attrs: &[Attribute]) -> bool {
    attrs.iter().any(|attr| {
        if !attr.path().is_ident("doc") || !matches!(attr.meta, Meta::List(_)) {
            return false;
        }
        let mut hidden = false;
        let _ = attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("hidden") {
                hidden = true;
            }
            Ok(())
        });
        hidden
    })
}

/// First doc line as the description, the whole comment as the long one
/// when it has more than one line.
fn doc_text(attrs: &[Attribute]) -> (Option<String>, Option<String>) {
    let lines: Vec<String> = attrs
        .iter()
        .filter_map(|attr| match &attr.meta {
            Meta::NameValue(nv) if nv.path.is_ident("doc") => match &nv.value {
                Expr::Lit(expr) => match &expr.lit {
                    Lit::Str(s) => Some(s.value().trim().to_string()),
                    _ => None,
                },
                _ => None,
            },
            _ => None,
        })
        .collect();

    let text = lines.join("\n").trim().to_string();
    if text.is_empty() {
        return (None, None);
    }
    let summary = text.lines().next().map(str::to_string);
    let long = (text.lines().count() > 1).then_some(text);
    (summary, long)
}

/// `pub const ALIASES: &[(&str, &str)] = &[("b", "build")];`
fn alias_table(item: &ItemConst) -> Vec<(String, String)> {
    let expr = match &*item.expr {
        Expr::Reference(r) => &*r.expr,
        other => other,
    };
    let Expr::Array(array) = expr else {
        return Vec::new();
    };
    array
        .elems
        .iter()
        .filter_map(|elem| {
            let Expr::Tuple(tuple) = elem else {
                return None;
            };
            let mut parts = tuple.elems.iter().filter_map(string_literal);
            let alias = parts.next()?;
            let target = parts.next()?;
            Some((alias.to_lowercase(), target.to_lowercase()))
        })
        .collect()
}

fn string_literal(expr: &Expr) -> Option<String> {
    match expr {
        Expr::Lit(lit) => match &lit.lit {
            Lit::Str(s) => Some(s.value()),
            _ => None,
        },
        _ => None,
    }
}
