//! Renders a selection closure as standalone Rust type definitions.
//!
//! Output is deterministic: items appear in closure discovery order and no
//! unordered collection leaks into the rendering. Inherited fields are
//! embedded through `#[serde(flatten)]`, optional properties become `Option`
//! (presence semantics, never a sentinel), and any reference cycle is broken
//! with `Box` at the referencing field.

use std::collections::{HashMap, HashSet};

use serde_json::Value;

use crate::error::Error;
use crate::select::{Closure, definition_references};
use crate::spec::{
    Deprecation, Enum, Inherits, Interface, Property, TypeAlias, TypeDefinition, TypeName, UnionOf,
    ValueOf,
};

pub struct Codegen<'a> {
    closure: &'a Closure,
    /// Outgoing references per closure member, for cycle detection.
    references: HashMap<TypeName, Vec<TypeName>>,
    out: String,
}

impl<'a> Codegen<'a> {
    pub fn new(closure: &'a Closure) -> Self {
        let references = closure
            .types
            .iter()
            .map(|(name, def)| (name.clone(), definition_references(def)))
            .collect();
        Self { closure, references, out: String::new() }
    }

    /// Render the whole closure into one source artifact.
    pub fn render(mut self) -> Result<String, Error> {
        let closure = self.closure;
        self.push("// Code generated by spec-typegen. DO NOT EDIT.\n");
        self.push("\n");
        self.push("use serde::{Deserialize, Serialize};\n");

        for def in closure.types.values() {
            self.push("\n");
            match def {
                TypeDefinition::Interface(iface) => self.emit_interface(iface)?,
                TypeDefinition::Enum(en) => self.emit_enum(en),
                TypeDefinition::TypeAlias(alias) => self.emit_alias(alias)?,
            }
        }
        Ok(self.out)
    }

    fn push(&mut self, text: &str) {
        self.out.push_str(text);
    }

    // ————————————————————————————————————————————————————————————————————————
    // INTERFACES
    // ————————————————————————————————————————————————————————————————————————

    fn emit_interface(&mut self, iface: &Interface) -> Result<(), Error> {
        let owner = iface.name.clone();
        let in_scope: HashSet<String> =
            iface.generics.iter().map(|g| g.name.clone()).collect();

        let mut docs = doc_lines(&iface.description, &iface.doc_url, &iface.deprecation);
        if let Some(shortcut) = &iface.shortcut_property {
            docs.push(format!("Shortcut property: `{shortcut}`."));
        }
        self.push_docs("", &docs);

        self.push("#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]\n");
        let params = generic_params(&iface.generics);
        self.push(&format!("pub struct {}{params} {{\n", pascal_ident(&iface.name.name)));

        let mut first = true;
        for edge in iface.inherits.iter().chain(&iface.implements).chain(&iface.behaviors) {
            if !self.closure.contains(&edge.type_name) {
                // External behavior contract; nothing to embed.
                continue;
            }
            if !first {
                self.push("\n");
            }
            first = false;
            let embedded = self.edge_type(edge, &owner, &in_scope)?;
            let (ident, _) = field_ident(&edge.type_name.name);
            self.push("    #[serde(flatten)]\n");
            self.push(&format!("    pub {ident}: {embedded},\n"));
        }

        for property in &iface.properties {
            if !first {
                self.push("\n");
            }
            first = false;
            self.emit_property(property, &owner, &in_scope)?;
        }

        self.push("}\n");
        Ok(())
    }

    fn emit_property(
        &mut self,
        property: &Property,
        owner: &TypeName,
        in_scope: &HashSet<String>,
    ) -> Result<(), Error> {
        let mut docs = doc_lines(&property.description, &property.doc_url, &property.deprecation);
        if let Some(default) = &property.server_default {
            docs.push(format!("Server default: `{default}`."));
        }
        if !property.aliases.is_empty() {
            docs.push(format!("Aliases: {}.", property.aliases.join(", ")));
        }
        self.push_docs("    ", &docs);

        let source_name = property.name.as_str();
        let preferred = property.codegen_name.as_deref().unwrap_or(source_name);
        let (ident, plain) = field_ident(preferred);

        let rendered = match &property.typ {
            Some(value) => self.rust_type(value, owner, in_scope, true)?,
            None => "serde_json::Value".to_string(),
        };

        let mut attrs = Vec::new();
        if plain != source_name {
            attrs.push(format!("rename = \"{source_name}\""));
        }
        let ty = if property.is_required() {
            rendered
        } else {
            attrs.push("default".to_string());
            attrs.push("skip_serializing_if = \"Option::is_none\"".to_string());
            format!("Option<{rendered}>")
        };
        if !attrs.is_empty() {
            self.push(&format!("    #[serde({})]\n", attrs.join(", ")));
        }
        self.push(&format!("    pub {ident}: {ty},\n"));
        Ok(())
    }

    // ————————————————————————————————————————————————————————————————————————
    // ENUMS
    // ————————————————————————————————————————————————————————————————————————

    fn emit_enum(&mut self, en: &Enum) {
        let docs = doc_lines(&en.description, &en.doc_url, &en.deprecation);
        self.push_docs("", &docs);
        self.push("#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]\n");
        self.push(&format!("pub enum {} {{\n", pascal_ident(&en.name.name)));

        let mut used = HashSet::new();
        for member in &en.members {
            let mut docs = doc_lines(&member.description, &None, &member.deprecation);
            if let Some(since) = &member.since {
                docs.push(format!("Since {since}."));
            }
            self.push_docs("    ", &docs);

            let preferred = member.identifier.as_deref().unwrap_or(&member.name);
            let variant = unique_label(pascal_ident(preferred), &mut used);
            if variant != member.name {
                self.push(&format!("    #[serde(rename = \"{}\")]\n", member.name));
            }
            self.push(&format!("    {variant},\n"));
        }
        self.push("}\n");
    }

    // ————————————————————————————————————————————————————————————————————————
    // TYPE ALIASES
    // ————————————————————————————————————————————————————————————————————————

    fn emit_alias(&mut self, alias: &TypeAlias) -> Result<(), Error> {
        let owner = alias.name.clone();
        let in_scope: HashSet<String> =
            alias.generics.iter().map(|g| g.name.clone()).collect();
        let docs = doc_lines(&alias.description, &alias.doc_url, &alias.deprecation);
        let params = generic_params(&alias.generics);
        let rust_name = pascal_ident(&alias.name.name);

        let Some(value) = &alias.typ else {
            self.push_docs("", &docs);
            self.push(&format!("pub type {rust_name}{params} = serde_json::Value;\n"));
            return Ok(());
        };

        if let ValueOf::UnionOf(union) = value {
            let all_literals = union.items.iter().all(|i| matches!(i, ValueOf::LiteralValue(_)));
            if all_literals {
                return self.emit_literal_union(alias, &docs, &rust_name, &union.items);
            }
            if alias.variants.is_some() || !union.items.is_empty() {
                return self
                    .emit_union_alias(alias, &docs, &rust_name, &params, union, &owner, &in_scope);
            }
        }

        // Plain synonym.
        let target = self.rust_type(value, &owner, &in_scope, false)?;
        self.push_docs("", &docs);
        self.push(&format!("pub type {rust_name}{params} = {target};\n"));
        Ok(())
    }

    /// A union of literal constants renders as a closed set of unit variants;
    /// the serde names are the literal tag values themselves.
    fn emit_literal_union(
        &mut self,
        alias: &TypeAlias,
        docs: &[String],
        rust_name: &str,
        items: &[ValueOf],
    ) -> Result<(), Error> {
        self.push_docs("", docs);
        self.push("#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]\n");
        self.push(&format!("pub enum {rust_name} {{\n"));
        let mut used = HashSet::new();
        for item in items {
            let ValueOf::LiteralValue(lit) = item else { unreachable!() };
            let tag = literal_tag(&lit.value, &alias.name)?;
            let variant = unique_label(pascal_ident(&tag), &mut used);
            if variant != tag {
                self.push(&format!("    #[serde(rename = \"{tag}\")]\n"));
            }
            self.push(&format!("    {variant},\n"));
        }
        self.push("}\n");
        Ok(())
    }

    fn emit_union_alias(
        &mut self,
        alias: &TypeAlias,
        docs: &[String],
        rust_name: &str,
        params: &str,
        union: &UnionOf,
        owner: &TypeName,
        in_scope: &HashSet<String>,
    ) -> Result<(), Error> {
        let variants = alias.variants.as_ref();
        let internal_tag = variants
            .filter(|v| v.kind.as_deref() == Some("internal_tag"))
            .and_then(|v| v.tag.clone());

        self.push_docs("", docs);
        self.push("#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]\n");
        if let Some(tag) = &internal_tag {
            self.push(&format!("#[serde(tag = \"{tag}\")]\n"));
        } else if variants.is_none() {
            // Positional union: no discriminant on the wire.
            self.push("#[serde(untagged)]\n");
        }
        self.push(&format!("pub enum {rust_name}{params} {{\n"));

        let strict = variants.is_some();
        let mut used = HashSet::new();
        let mut markers: Vec<(String, Value)> = Vec::new();
        for (index, item) in union.items.iter().enumerate() {
            match item {
                ValueOf::InstanceOf(instance) => {
                    let tag = self.member_variant_name(&instance.type_name);
                    let variant = unique_label(pascal_ident(&tag), &mut used);
                    if variant != tag && strict {
                        self.push(&format!("    #[serde(rename = \"{tag}\")]\n"));
                    }
                    let payload = self.rust_type(item, owner, in_scope, true)?;
                    self.push(&format!("    {variant}({payload}),\n"));
                }
                ValueOf::LiteralValue(lit) => {
                    let tag = literal_tag(&lit.value, &alias.name)?;
                    let variant = unique_label(pascal_ident(&tag), &mut used);
                    if strict {
                        if variant != tag {
                            self.push(&format!("    #[serde(rename = \"{tag}\")]\n"));
                        }
                        self.push(&format!("    {variant},\n"));
                    } else {
                        // An untagged unit variant (de)serializes as null, so
                        // the constant rides in a marker type pinned to its
                        // wire value.
                        let marker = format!("{rust_name}{variant}");
                        self.push(&format!("    {variant}({marker}),\n"));
                        markers.push((marker, lit.value.clone()));
                    }
                }
                other if strict => {
                    return Err(Error::Emit {
                        type_name: alias.name.to_string(),
                        message: format!(
                            "tagged union member {index} is a {}, which carries no discriminant",
                            other.kind()
                        ),
                    });
                }
                other => {
                    let variant = unique_label(union_member_label(other), &mut used);
                    let payload = self.rust_type(other, owner, in_scope, true)?;
                    self.push(&format!("    {variant}({payload}),\n"));
                }
            }
        }
        self.push("}\n");
        for (marker, value) in &markers {
            self.emit_literal_marker(marker, value);
        }
        Ok(())
    }

    /// One literal constant inside an untagged union: serializes as exactly
    /// that constant and refuses anything else on the way in.
    fn emit_literal_marker(&mut self, name: &str, value: &Value) {
        let shown = value.to_string();
        self.push("\n");
        self.push(&format!("/// The wire constant `{shown}`.\n"));
        self.push("#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]\n");
        self.push(&format!("pub struct {name};\n"));
        self.push("\n");
        self.push(&format!("impl Serialize for {name} {{\n"));
        self.push(
            "    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {\n",
        );
        self.push(&format!("        serde_json::json!({shown}).serialize(serializer)\n"));
        self.push("    }\n");
        self.push("}\n");
        self.push("\n");
        self.push(&format!("impl<'de> Deserialize<'de> for {name} {{\n"));
        self.push(
            "    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {\n",
        );
        self.push("        let value = serde_json::Value::deserialize(deserializer)?;\n");
        self.push(&format!("        if value == serde_json::json!({shown}) {{\n"));
        self.push("            Ok(Self)\n");
        self.push("        } else {\n");
        self.push(&format!(
            "            Err(serde::de::Error::custom(\"expected the constant {}\"))\n",
            shown.escape_debug()
        ));
        self.push("        }\n");
        self.push("    }\n");
        self.push("}\n");
    }

    /// Discriminant for a union member that references a named definition:
    /// its declared variant name when the definition carries one.
    fn member_variant_name(&self, name: &TypeName) -> String {
        let declared = self.closure.types.get(name).and_then(|def| match def {
            TypeDefinition::Interface(o) => o.variant_name.clone(),
            TypeDefinition::Enum(o) => o.variant_name.clone(),
            TypeDefinition::TypeAlias(o) => o.variant_name.clone(),
        });
        declared.unwrap_or_else(|| name.name.clone())
    }

    // ————————————————————————————————————————————————————————————————————————
    // VALUE RENDERING
    // ————————————————————————————————————————————————————————————————————————

    /// Render one Value as a Rust type. `direct` is true when the result is
    /// embedded without indirection (a struct field or enum payload), which is
    /// where cycles must be boxed; `Vec` and `HashMap` already indirect.
    fn rust_type(
        &self,
        value: &ValueOf,
        owner: &TypeName,
        in_scope: &HashSet<String>,
        direct: bool,
    ) -> Result<String, Error> {
        let rendered = match value {
            ValueOf::InstanceOf(instance) => {
                let target = &instance.type_name;
                if in_scope.contains(&target.name) {
                    return Ok(target.name.clone());
                }
                if !self.closure.contains(target) {
                    return Ok(builtin_type(target).unwrap_or("serde_json::Value").to_string());
                }
                let mut rendered = pascal_ident(&target.name);
                let arity = self.generic_arity(target);
                if arity > 0 {
                    let mut args = Vec::with_capacity(arity);
                    if let Some(argument) = &instance.generics {
                        if !matches!(argument.as_ref(), ValueOf::Unset(_)) {
                            args.push(self.rust_type(argument, owner, in_scope, false)?);
                        }
                    }
                    while args.len() < arity {
                        args.push("serde_json::Value".to_string());
                    }
                    rendered = format!("{rendered}<{}>", args.join(", "));
                }
                if direct && self.reaches(target, owner) {
                    rendered = format!("Box<{rendered}>");
                }
                rendered
            }
            ValueOf::ArrayOf(array) => {
                format!("Vec<{}>", self.rust_type(&array.value, owner, in_scope, false)?)
            }
            ValueOf::DictionaryOf(dictionary) => {
                let key = self.rust_type(&dictionary.key, owner, in_scope, false)?;
                let key = if self.hashable_key(&dictionary.key, &key) {
                    key
                } else {
                    "String".to_string()
                };
                let value = self.rust_type(&dictionary.value, owner, in_scope, false)?;
                format!("std::collections::HashMap<{key}, {value}>")
            }
            // Anonymous union at a property position: no name to hang a
            // discriminated enum on, so it stays dynamically typed.
            ValueOf::UnionOf(_) => "serde_json::Value".to_string(),
            ValueOf::UserDefinedValue | ValueOf::LiteralValue(_) | ValueOf::Unset(_) => {
                "serde_json::Value".to_string()
            }
        };
        Ok(rendered)
    }

    fn edge_type(
        &self,
        edge: &Inherits,
        owner: &TypeName,
        in_scope: &HashSet<String>,
    ) -> Result<String, Error> {
        let mut rendered = pascal_ident(&edge.type_name.name);
        let arity = self.generic_arity(&edge.type_name);
        if arity > 0 {
            let mut args = Vec::with_capacity(arity);
            for argument in &edge.generics {
                args.push(self.rust_type(argument, owner, in_scope, false)?);
            }
            while args.len() < arity {
                args.push("serde_json::Value".to_string());
            }
            args.truncate(arity);
            rendered = format!("{rendered}<{}>", args.join(", "));
        }
        Ok(rendered)
    }

    /// `HashMap` keys must be `Eq + Hash`. Integer and string scalars
    /// qualify, as do generated unit enums; every other rendering collapses
    /// to `String`, the wire form of any JSON object key.
    fn hashable_key(&self, key: &ValueOf, rendered: &str) -> bool {
        if matches!(rendered, "String" | "i32" | "i64" | "u32" | "u64") {
            return true;
        }
        match key {
            ValueOf::InstanceOf(instance) => matches!(
                self.closure.types.get(&instance.type_name),
                Some(TypeDefinition::Enum(_))
            ),
            _ => false,
        }
    }

    fn generic_arity(&self, name: &TypeName) -> usize {
        match self.closure.types.get(name) {
            Some(TypeDefinition::Interface(o)) => o.generics.len(),
            Some(TypeDefinition::TypeAlias(o)) => o.generics.len(),
            _ => 0,
        }
    }

    /// Whether `from` can reach `to` through closure references. A type that
    /// reaches its owner closes a cycle and must be held behind indirection.
    fn reaches(&self, from: &TypeName, to: &TypeName) -> bool {
        if from == to {
            return true;
        }
        let mut visited = HashSet::new();
        let mut stack = vec![from];
        while let Some(current) = stack.pop() {
            if !visited.insert(current.clone()) {
                continue;
            }
            if current == to {
                return true;
            }
            if let Some(references) = self.references.get(current) {
                stack.extend(references.iter());
            }
        }
        false
    }

    fn push_docs(&mut self, indent: &str, lines: &[String]) {
        for line in lines {
            for part in line.split('\n') {
                let part = part.trim_end();
                if part.is_empty() {
                    self.push(&format!("{indent}///\n"));
                } else {
                    self.push(&format!("{indent}/// {part}\n"));
                }
            }
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// NAMING HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn doc_lines(
    description: &Option<String>,
    doc_url: &Option<String>,
    deprecation: &Option<Deprecation>,
) -> Vec<String> {
    let mut lines = Vec::new();
    if let Some(description) = description {
        lines.push(description.clone());
    }
    if let Some(deprecation) = deprecation {
        let mut line = "Deprecated".to_string();
        if let Some(version) = &deprecation.version {
            line.push_str(&format!(" (since {version})"));
        }
        if let Some(description) = &deprecation.description {
            line.push_str(&format!(": {description}"));
        } else {
            line.push('.');
        }
        lines.push(line);
    }
    if let Some(url) = doc_url {
        lines.push(format!("See <{url}>."));
    }
    lines
}

fn generic_params(generics: &[TypeName]) -> String {
    if generics.is_empty() {
        return String::new();
    }
    let names: Vec<&str> = generics.iter().map(|g| g.name.as_str()).collect();
    format!("<{}>", names.join(", "))
}

/// Tag value for a literal union member. Only scalar literals can act as
/// discriminants.
fn literal_tag(value: &Value, owner: &TypeName) -> Result<String, Error> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(Error::Emit {
            type_name: owner.to_string(),
            message: format!("literal {other} cannot be used as a union discriminant"),
        }),
    }
}

fn union_member_label(value: &ValueOf) -> String {
    match value {
        ValueOf::InstanceOf(instance) => pascal_ident(&instance.type_name.name),
        ValueOf::ArrayOf(array) => format!("{}Array", union_member_label(&array.value)),
        ValueOf::DictionaryOf(_) => "Map".to_string(),
        ValueOf::UnionOf(_) | ValueOf::UserDefinedValue | ValueOf::Unset(_) => "Any".to_string(),
        ValueOf::LiteralValue(_) => "Literal".to_string(),
    }
}

fn unique_label(candidate: String, used: &mut HashSet<String>) -> String {
    if used.insert(candidate.clone()) {
        return candidate;
    }
    let mut counter = 2;
    loop {
        let numbered = format!("{candidate}{counter}");
        if used.insert(numbered.clone()) {
            return numbered;
        }
        counter += 1;
    }
}

const KEYWORDS: &[&str] = &[
    "as", "async", "await", "box", "break", "const", "continue", "dyn", "else", "enum", "extern",
    "false", "fn", "for", "if", "impl", "in", "let", "loop", "match", "mod", "move", "mut", "pub",
    "ref", "return", "static", "struct", "trait", "true", "type", "union", "unsafe", "use",
    "where", "while",
];

/// Snake-case field identifier plus the name serde will use for it (raw
/// prefixes are invisible to serde, so `r#if` still serializes as `if`).
fn field_ident(name: &str) -> (String, String) {
    let mut out = String::new();
    let mut prev_lower = false;
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            if ch.is_ascii_uppercase() && prev_lower {
                out.push('_');
            }
            out.push(ch.to_ascii_lowercase());
            prev_lower = ch.is_ascii_lowercase() || ch.is_ascii_digit();
        } else {
            if !out.is_empty() && !out.ends_with('_') {
                out.push('_');
            }
            prev_lower = false;
        }
    }
    let trimmed = out.trim_matches('_');
    let mut ident = if trimmed.is_empty() { "field".to_string() } else { trimmed.to_string() };
    if ident.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        ident.insert(0, '_');
    }
    // `self`/`crate`/`super` cannot be raw identifiers.
    if matches!(ident.as_str(), "self" | "crate" | "super") {
        ident.push('_');
    }
    let plain = ident.clone();
    if KEYWORDS.contains(&ident.as_str()) {
        ident = format!("r#{ident}");
    }
    (ident, plain)
}

/// Well-known primitive names that never resolve to a definition. Anything
/// else unresolved stays dynamically typed.
fn builtin_type(name: &TypeName) -> Option<&'static str> {
    if !matches!(name.namespace.as_str(), "_builtins" | "_types" | "") {
        return None;
    }
    let rendered = match name.name.as_str() {
        "string" => "String",
        "boolean" => "bool",
        "binary" => "String",
        "integer" => "i64",
        "long" => "i64",
        "short" => "i32",
        "byte" => "i32",
        "uint" => "u32",
        "ulong" => "u64",
        "float" => "f32",
        "double" => "f64",
        "number" => "f64",
        "null" => "()",
        "void" => "()",
        _ => return None,
    };
    Some(rendered)
}

fn pascal_ident(name: &str) -> String {
    let mut out = String::new();
    let mut upper_next = true;
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            if upper_next {
                out.extend(ch.to_uppercase());
                upper_next = false;
            } else {
                out.push(ch);
            }
        } else {
            upper_next = true;
        }
    }
    if out.is_empty() {
        return "Unnamed".to_string();
    }
    if out.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        out.insert(0, 'N');
    }
    out
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————

#[cfg(test)]
mod tests {
    use super::*;
    use crate::select::select;
    use crate::spec::decode_model;
    use serde_json::json;

    fn render_selection(doc: &serde_json::Value, seed_name: &str) -> String {
        let model = decode_model(&serde_json::to_string(doc).unwrap()).unwrap();
        let closure = select(&model, |name, _| name.name == seed_name);
        Codegen::new(&closure).render().unwrap()
    }

    fn pipeline_doc() -> serde_json::Value {
        json!({
            "types": [
                {
                    "kind": "interface",
                    "name": { "namespace": "ingest._types", "name": "Pipeline" },
                    "description": "An ingest pipeline.",
                    "properties": [{
                        "name": "processors",
                        "type": {
                            "kind": "array_of",
                            "value": { "kind": "instance_of", "type": { "namespace": "ingest._types", "name": "ProcessorContainer" } }
                        }
                    }]
                },
                {
                    "kind": "interface",
                    "name": { "namespace": "ingest._types", "name": "ProcessorContainer" },
                    "properties": [{
                        "name": "grok",
                        "type": { "kind": "instance_of", "type": { "namespace": "ingest._types", "name": "GrokProcessor" } }
                    }]
                },
                {
                    "kind": "interface",
                    "name": { "namespace": "ingest._types", "name": "GrokProcessor" },
                    "inherits": { "type": { "namespace": "ingest._types", "name": "ProcessorBase" } },
                    "properties": [{
                        "name": "field",
                        "type": { "kind": "instance_of", "type": { "namespace": "_builtins", "name": "string" } },
                        "required": true
                    }]
                },
                {
                    "kind": "interface",
                    "name": { "namespace": "ingest._types", "name": "ProcessorBase" },
                    "properties": [
                        { "name": "description", "type": { "kind": "instance_of", "type": { "namespace": "_builtins", "name": "string" } } },
                        { "name": "if", "type": { "kind": "instance_of", "type": { "namespace": "_builtins", "name": "string" } } }
                    ]
                }
            ]
        })
    }

    #[test]
    fn pipeline_scenario_renders_every_closure_member() {
        let src = render_selection(&pipeline_doc(), "Pipeline");
        assert!(src.contains("pub struct Pipeline {"));
        assert!(src.contains("pub struct ProcessorContainer {"));
        assert!(src.contains("pub struct GrokProcessor {"));
        assert!(src.contains("pub struct ProcessorBase {"));
        // Optional array property keeps presence semantics.
        assert!(src.contains("pub processors: Option<Vec<ProcessorContainer>>"));
        // Required property is a plain field.
        assert!(src.contains("pub field: String,"));
        // Inherited fields are reachable through the flattened embed.
        assert!(src.contains("#[serde(flatten)]\n    pub processor_base: ProcessorBase,"));
        // Keyword property names become raw identifiers, no rename needed.
        assert!(src.contains("pub r#if: Option<String>"));
    }

    #[test]
    fn emission_is_deterministic() {
        let model =
            decode_model(&serde_json::to_string(&pipeline_doc()).unwrap()).unwrap();
        let first = Codegen::new(&select(&model, |n, _| n.name == "Pipeline")).render().unwrap();
        let second = Codegen::new(&select(&model, |n, _| n.name == "Pipeline")).render().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn deprecated_enum_members_are_emitted_with_doc_metadata() {
        let doc = json!({
            "types": [{
                "kind": "enum",
                "name": { "namespace": "_types", "name": "ConflictStrategy" },
                "members": [
                    { "name": "abort" },
                    { "name": "proceed", "deprecation": { "version": "8.0.0", "description": "Use abort." } }
                ]
            }]
        });
        let src = render_selection(&doc, "ConflictStrategy");
        assert!(src.contains("    Proceed,\n"), "deprecated member must not be omitted:\n{src}");
        assert!(src.contains("/// Deprecated (since 8.0.0): Use abort."));
        assert!(src.contains("#[serde(rename = \"proceed\")]"));
    }

    #[test]
    fn mutual_references_are_boxed() {
        let doc = json!({
            "types": [
                {
                    "kind": "interface",
                    "name": { "namespace": "x", "name": "A" },
                    "properties": [{ "name": "b", "type": { "kind": "instance_of", "type": { "namespace": "x", "name": "B" } }, "required": true }]
                },
                {
                    "kind": "interface",
                    "name": { "namespace": "x", "name": "B" },
                    "properties": [{ "name": "a", "type": { "kind": "instance_of", "type": { "namespace": "x", "name": "A" } } }]
                }
            ]
        });
        let src = render_selection(&doc, "A");
        assert!(src.contains("pub b: Box<B>,"));
        assert!(src.contains("pub a: Option<Box<A>>,"));
    }

    #[test]
    fn arrays_are_not_boxed() {
        // Vec already provides the indirection a self-reference needs.
        let doc = json!({
            "types": [{
                "kind": "interface",
                "name": { "namespace": "x", "name": "Node" },
                "properties": [{
                    "name": "children",
                    "type": { "kind": "array_of", "value": { "kind": "instance_of", "type": { "namespace": "x", "name": "Node" } } }
                }]
            }]
        });
        let src = render_selection(&doc, "Node");
        assert!(src.contains("pub children: Option<Vec<Node>>,"));
    }

    #[test]
    fn internally_tagged_alias_renders_serde_tag() {
        let doc = json!({
            "types": [
                {
                    "kind": "type_alias",
                    "name": { "namespace": "x", "name": "Shape" },
                    "variants": { "kind": "internal_tag", "tag": "type" },
                    "type": {
                        "kind": "union_of",
                        "items": [
                            { "kind": "instance_of", "type": { "namespace": "x", "name": "Circle" } },
                            { "kind": "instance_of", "type": { "namespace": "x", "name": "Square" } }
                        ]
                    }
                },
                {
                    "kind": "interface",
                    "name": { "namespace": "x", "name": "Circle" },
                    "variantName": "circle",
                    "properties": [{ "name": "radius", "type": { "kind": "instance_of", "type": { "namespace": "_builtins", "name": "double" } }, "required": true }]
                },
                {
                    "kind": "interface",
                    "name": { "namespace": "x", "name": "Square" },
                    "variantName": "square",
                    "properties": [{ "name": "side", "type": { "kind": "instance_of", "type": { "namespace": "_builtins", "name": "double" } }, "required": true }]
                }
            ]
        });
        let src = render_selection(&doc, "Shape");
        assert!(src.contains("#[serde(tag = \"type\")]"));
        assert!(src.contains("#[serde(rename = \"circle\")]\n    Circle(Circle),"));
        assert!(src.contains("pub radius: f64,"));
    }

    #[test]
    fn literal_union_alias_renders_unit_enum() {
        let doc = json!({
            "types": [{
                "kind": "type_alias",
                "name": { "namespace": "x", "name": "Refresh" },
                "type": {
                    "kind": "union_of",
                    "items": [
                        { "kind": "literal_value", "value": "true" },
                        { "kind": "literal_value", "value": "false" },
                        { "kind": "literal_value", "value": "wait_for" }
                    ]
                }
            }]
        });
        let src = render_selection(&doc, "Refresh");
        assert!(src.contains("pub enum Refresh {"));
        assert!(src.contains("#[serde(rename = \"wait_for\")]\n    WaitFor,"));
    }

    #[test]
    fn untagged_literal_members_pin_their_wire_constant() {
        // boolean | "wait_for": a bare unit variant in an untagged enum would
        // (de)serialize as null, losing the constant.
        let doc = json!({
            "types": [{
                "kind": "type_alias",
                "name": { "namespace": "x", "name": "Refresh" },
                "type": {
                    "kind": "union_of",
                    "items": [
                        { "kind": "instance_of", "type": { "namespace": "_builtins", "name": "boolean" } },
                        { "kind": "literal_value", "value": "wait_for" }
                    ]
                }
            }]
        });
        let src = render_selection(&doc, "Refresh");
        assert!(src.contains("#[serde(untagged)]"));
        assert!(src.contains("    Boolean(bool),\n"));
        assert!(src.contains("    WaitFor(RefreshWaitFor),\n"), "bare unit variant:\n{src}");
        assert!(!src.contains("    WaitFor,\n"));
        assert!(src.contains("pub struct RefreshWaitFor;"));
        assert!(src.contains("serde_json::json!(\"wait_for\").serialize(serializer)"));
        assert!(src.contains("if value == serde_json::json!(\"wait_for\")"));
    }

    #[test]
    fn plain_alias_renders_type_synonym() {
        let doc = json!({
            "types": [{
                "kind": "type_alias",
                "name": { "namespace": "_types", "name": "Field" },
                "type": { "kind": "instance_of", "type": { "namespace": "_builtins", "name": "string" } }
            }]
        });
        let src = render_selection(&doc, "Field");
        assert!(src.contains("pub type Field = String;"));
    }

    #[test]
    fn tagged_union_member_without_discriminant_fails_emission() {
        let doc = json!({
            "types": [{
                "kind": "type_alias",
                "name": { "namespace": "x", "name": "Broken" },
                "variants": { "kind": "internal_tag", "tag": "type" },
                "type": {
                    "kind": "union_of",
                    "items": [{
                        "kind": "dictionary_of",
                        "key": { "kind": "instance_of", "type": { "namespace": "_builtins", "name": "string" } },
                        "value": { "kind": "user_defined_value" }
                    }]
                }
            }]
        });
        let model = decode_model(&serde_json::to_string(&doc).unwrap()).unwrap();
        let closure = select(&model, |name, _| name.name == "Broken");
        let err = Codegen::new(&closure).render().unwrap_err();
        assert!(matches!(err, Error::Emit { .. }), "got {err:?}");
    }

    #[test]
    fn dictionaries_and_opaque_values_render_dynamic_types() {
        let doc = json!({
            "types": [{
                "kind": "interface",
                "name": { "namespace": "x", "name": "Meta" },
                "properties": [
                    {
                        "name": "fields",
                        "type": {
                            "kind": "dictionary_of",
                            "key": { "kind": "instance_of", "type": { "namespace": "_builtins", "name": "string" } },
                            "value": { "kind": "user_defined_value" },
                            "singleKey": false
                        }
                    },
                    { "name": "raw", "type": { "kind": "user_defined_value" } }
                ]
            }]
        });
        let src = render_selection(&doc, "Meta");
        assert!(src.contains("Option<std::collections::HashMap<String, serde_json::Value>>"));
        assert!(src.contains("pub raw: Option<serde_json::Value>,"));
    }

    #[test]
    fn unhashable_dictionary_keys_collapse_to_string() {
        let doc = json!({
            "types": [{
                "kind": "interface",
                "name": { "namespace": "x", "name": "Buckets" },
                "properties": [{
                    "name": "by_ratio",
                    "type": {
                        "kind": "dictionary_of",
                        "key": { "kind": "instance_of", "type": { "namespace": "_builtins", "name": "double" } },
                        "value": { "kind": "instance_of", "type": { "namespace": "_builtins", "name": "long" } }
                    }
                }]
            }]
        });
        let src = render_selection(&doc, "Buckets");
        assert!(src.contains("std::collections::HashMap<String, i64>"));
        assert!(!src.contains("HashMap<f64"), "f64 is neither Eq nor Hash:\n{src}");
    }

    #[test]
    fn renamed_properties_keep_their_wire_names() {
        let doc = json!({
            "types": [{
                "kind": "interface",
                "name": { "namespace": "x", "name": "Event" },
                "properties": [{
                    "name": "@timestamp",
                    "type": { "kind": "instance_of", "type": { "namespace": "_builtins", "name": "string" } },
                    "required": true
                }]
            }]
        });
        let src = render_selection(&doc, "Event");
        assert!(src.contains("#[serde(rename = \"@timestamp\")]\n    pub timestamp: String,"));
    }

    #[test]
    fn generic_interfaces_carry_their_parameters() {
        let doc = json!({
            "types": [
                {
                    "kind": "interface",
                    "name": { "namespace": "x", "name": "Envelope" },
                    "generics": [ { "namespace": "x.Envelope", "name": "TPayload" } ],
                    "properties": [{
                        "name": "payload",
                        "type": { "kind": "instance_of", "type": { "namespace": "x.Envelope", "name": "TPayload" } },
                        "required": true
                    }]
                },
                {
                    "kind": "interface",
                    "name": { "namespace": "x", "name": "Holder" },
                    "properties": [{
                        "name": "wrapped",
                        "type": {
                            "kind": "instance_of",
                            "type": { "namespace": "x", "name": "Envelope" },
                            "generics": { "kind": "instance_of", "type": { "namespace": "_builtins", "name": "long" } }
                        }
                    }]
                }
            ]
        });
        let src = render_selection(&doc, "Holder");
        assert!(src.contains("pub struct Envelope<TPayload> {"));
        assert!(src.contains("pub payload: TPayload,"));
        assert!(src.contains("pub wrapped: Option<Envelope<i64>>,"));
    }

    #[test]
    fn builtin_references_map_to_rust_scalars() {
        let doc = json!({
            "types": [{
                "kind": "interface",
                "name": { "namespace": "x", "name": "Scalars" },
                "properties": [
                    { "name": "flag", "type": { "kind": "instance_of", "type": { "namespace": "_builtins", "name": "boolean" } }, "required": true },
                    { "name": "count", "type": { "kind": "instance_of", "type": { "namespace": "_types", "name": "integer" } }, "required": true },
                    { "name": "ratio", "type": { "kind": "instance_of", "type": { "namespace": "_types", "name": "double" } }, "required": true }
                ]
            }]
        });
        let src = render_selection(&doc, "Scalars");
        assert!(src.contains("pub flag: bool,"));
        assert!(src.contains("pub count: i64,"));
        assert!(src.contains("pub ratio: f64,"));
    }
}
