//! Minimal CLI: decode → select → (closure listing | generated Rust types)
use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};

use crate::codegen::Codegen;
use crate::select::{Closure, select};
use crate::spec::{Model, TypeName, decode_model};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// generate standalone Rust type definitions for one feature area of a
/// specification schema
#[derive(Parser, Debug)]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// select the seeded types plus their dependencies and emit Rust source
    Generate(GenerateOut),
    /// print the closure a selection would emit, one definition per line
    Closure(ClosureOut),
}

#[derive(Args, Debug, Clone)]
struct SelectionSettings {
    /// JSON file containing the specification schema
    #[arg(long, short = 'f')]
    schema: PathBuf,

    /// select a type by exact identity, written as `namespace:Name` (repeatable)
    #[arg(long = "type", value_name = "NAMESPACE:NAME")]
    types: Vec<String>,

    /// select every type whose inheritance parent has this name (repeatable)
    #[arg(long = "inherits", value_name = "NAME")]
    inherits: Vec<String>,
}

#[derive(Args, Debug)]
struct GenerateOut {
    #[command(flatten)]
    selection: SelectionSettings,

    /// output .rs file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct ClosureOut {
    #[command(flatten)]
    selection: SelectionSettings,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl SelectionSettings {
    fn load_model(&self) -> anyhow::Result<Model> {
        let source = std::fs::read_to_string(&self.schema)
            .with_context(|| format!("failed to read schema file {}", self.schema.display()))?;
        let model = decode_model(&source)
            .with_context(|| format!("failed to decode schema file {}", self.schema.display()))?;
        Ok(model)
    }

    fn run_selection(&self, model: &Model) -> anyhow::Result<Closure> {
        if self.types.is_empty() && self.inherits.is_empty() {
            bail!("nothing selected: pass at least one --type or --inherits");
        }
        let seeds = self
            .types
            .iter()
            .map(|raw| parse_type_name(raw))
            .collect::<anyhow::Result<Vec<TypeName>>>()?;
        let parents = &self.inherits;

        Ok(select(model, |name, parent| {
            seeds.contains(name)
                || parent.is_some_and(|p| parents.iter().any(|want| *want == p.name))
        }))
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn run(&self) -> anyhow::Result<()> {
        match &self.cmd {
            Command::Generate(target) => {
                // 1) build state
                let model = target.selection.load_model()?;
                let closure = target.selection.run_selection(&model)?;

                // 2) render before touching the destination, so a failed run
                //    leaves no artifact behind
                let rust_src = Codegen::new(&closure).render()?;

                // 3) write
                if let Some(out) = target.out.as_ref() {
                    if let Some(parent) = out.parent() {
                        std::fs::create_dir_all(parent).with_context(|| {
                            format!("failed to create output directory {}", parent.display())
                        })?;
                    }
                    std::fs::write(out, &rust_src)
                        .with_context(|| format!("failed to write {}", out.display()))?;
                    eprintln!(
                        "Done. Generated {} type definitions to {}",
                        closure.types.len(),
                        out.display()
                    );
                } else {
                    println!("{rust_src}");
                }
            }
            Command::Closure(target) => {
                let model = target.selection.load_model()?;
                let closure = target.selection.run_selection(&model)?;
                for def in closure.types.values() {
                    println!("{} {}", def.kind(), def.name());
                }
                for name in &closure.unresolved {
                    println!("external {name}");
                }
            }
        }
        Ok(())
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn parse_type_name(raw: &str) -> anyhow::Result<TypeName> {
    match raw.split_once(':') {
        Some((namespace, name)) if !namespace.is_empty() && !name.is_empty() => {
            Ok(TypeName::new(namespace, name))
        }
        _ => bail!("invalid type selector {raw:?}: expected `namespace:Name`"),
    }
}
