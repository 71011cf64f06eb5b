//! Generated cargo project that runs project commands.
//!
//! The harness binary takes a command name as its first argument, reads the
//! invocation tokens from the parameter channel, runs the matching body and
//! prints a single report line on stderr.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use tarn_exec::REPORT_PREFIX;
use tarn_params::ARGS_ENV;

use crate::error::{ExtensionError, Result};
use crate::parse::{CommandDef, Target};

/// Name of the generated package and binary.
pub const HARNESS_BIN: &str = "tarn-harness";

const MANIFEST: &str = r#"[package]
name = "tarn-harness"
version = "0.0.0"
edition = "2021"
publish = false

[dependencies]
serde_json = "1"
shell-words = "1"

[profile.release]
opt-level = 1
incremental = true

[workspace]
"#;

/// A source file included as a module of the harness.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarnessModule {
    pub ident: String,
    pub path: PathBuf,
}

/// Module names for source files, unique and derived from their path
/// relative to `base`.
pub fn module_names(base: &Path, files: &[PathBuf]) -> Vec<HarnessModule> {
    let mut taken = HashSet::new();
    files
        .iter()
        .map(|path| {
            let relative = path.strip_prefix(base).unwrap_or(path).with_extension("");
            let stem: String = relative
                .to_string_lossy()
                .chars()
                .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
                .collect();
            let mut ident = format!("tarn_{}", stem.trim_matches('_'));
            let mut n = 1;
            while !taken.insert(ident.clone()) {
                n += 1;
                ident = format!("tarn_{}_{n}", stem.trim_matches('_'));
            }
            HarnessModule {
                ident,
                path: path.clone(),
            }
        })
        .collect()
}

/// Generated `Cargo.toml` and `src/main.rs`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Harness {
    pub manifest: String,
    pub main_rs: String,
}

impl Harness {
    /// Generate a harness for `commands`, each paired with the ident of the
    /// module that defines it.
    pub fn generate(modules: &[HarnessModule], commands: &[(String, CommandDef)]) -> Self {
        let mut items: Vec<TokenStream> = Vec::new();

        items.push(quote! {
            #![allow(dead_code, deprecated, unused_imports, unused_variables, non_snake_case)]
        });
        for module in modules {
            let ident = format_ident!("{}", module.ident);
            let path = module.path.to_string_lossy().into_owned();
            items.push(quote! {
                #[path = #path]
                mod #ident;
            });
        }

        items.push(quote! {
            trait IntoOutcome {
                fn into_outcome(self) -> ::std::result::Result<(), ::std::string::String>;
            }

            impl IntoOutcome for () {
                fn into_outcome(self) -> ::std::result::Result<(), ::std::string::String> {
                    Ok(())
                }
            }

            impl<E: ::std::fmt::Display> IntoOutcome for ::std::result::Result<(), E> {
                fn into_outcome(self) -> ::std::result::Result<(), ::std::string::String> {
                    self.map_err(|e| e.to_string())
                }
            }
        });

        let arms = commands.iter().map(|(module, def)| {
            let name = def.full_name();
            let call = call_expr(module, def);
            quote! { #name => IntoOutcome::into_outcome(#call), }
        });
        items.push(quote! {
            fn dispatch(name: &str, args: &[String]) -> Option<Result<(), String>> {
                Some(match name {
                    #(#arms)*
                    _ => return None,
                })
            }
        });

        items.push(quote! {
            fn read_args(local: &[String]) -> Vec<String> {
                match ::std::env::var(#ARGS_ENV) {
                    Ok(raw) if !raw.trim().is_empty() => match shell_words::split(&raw) {
                        Ok(tokens) => tokens,
                        Err(e) => {
                            eprintln!("tarn-harness: malformed {}: {}; falling back to whitespace splitting", #ARGS_ENV, e);
                            raw.split_whitespace().map(String::from).collect()
                        }
                    },
                    _ => local.to_vec(),
                }
            }
        });

        items.push(quote! {
            fn main() {
                let mut argv = ::std::env::args().skip(1);
                let Some(name) = argv.next() else {
                    eprintln!("usage: tarn-harness <command> [args...]");
                    ::std::process::exit(2);
                };
                let local: Vec<String> = argv.collect();
                let args = read_args(&local);

                let outcome = match ::std::panic::catch_unwind(|| dispatch(&name, &args)) {
                    Ok(Some(outcome)) => outcome,
                    Ok(None) => Err(format!("unknown command '{}'", name)),
                    Err(_) => Err(format!("command '{}' panicked", name)),
                };

                let report = serde_json::json!({
                    "command": name,
                    "ok": outcome.is_ok(),
                    "error": outcome.as_ref().err(),
                });
                eprintln!("{}{}", #REPORT_PREFIX, report);
                if outcome.is_err() {
                    ::std::process::exit(1);
                }
            }
        });

        let mut main_rs = String::from("// @generated by tarn. Do not edit.\n");
        for item in items {
            main_rs.push_str(&item.to_string());
            main_rs.push('\n');
        }

        Self {
            manifest: MANIFEST.to_string(),
            main_rs,
        }
    }

    /// Write the project into `dir`.
    pub fn write_to(&self, dir: &Path) -> Result<()> {
        let src = dir.join("src");
        std::fs::create_dir_all(&src).map_err(ExtensionError::io(&src))?;
        let manifest = dir.join("Cargo.toml");
        std::fs::write(&manifest, &self.manifest).map_err(ExtensionError::io(&manifest))?;
        let main_rs = src.join("main.rs");
        std::fs::write(&main_rs, &self.main_rs).map_err(ExtensionError::io(&main_rs))?;
        Ok(())
    }
}

/// Path of the release binary inside a harness project.
pub fn binary_path(project_dir: &Path) -> PathBuf {
    project_dir
        .join("target")
        .join("release")
        .join(format!("{HARNESS_BIN}{}", std::env::consts::EXE_SUFFIX))
}

fn call_expr(module: &str, def: &CommandDef) -> TokenStream {
    let module = format_ident!("{}", module);
    let args = if def.takes_args { quote!(args) } else { quote!() };
    match &def.target {
        Target::Function { ident } => {
            let function = format_ident!("{}", ident);
            quote! { #module::#function(#args) }
        }
        Target::Method {
            ty,
            ident,
            receiver,
            unit_struct,
        } => {
            let ty = format_ident!("{}", ty);
            let method = format_ident!("{}", ident);
            if !*receiver {
                quote! { #module::#ty::#method(#args) }
            } else if *unit_struct {
                quote! { #module::#ty.#method(#args) }
            } else {
                quote! { <#module::#ty as ::core::default::Default>::default().#method(#args) }
            }
        }
    }
}
