//! Seed-predicate selection: the transitive closure of type definitions
//! reachable from whatever the caller's predicate picks out of the model.

use std::collections::VecDeque;

use indexmap::{IndexMap, IndexSet};

use crate::spec::{Inherits, Model, TypeDefinition, TypeName, ValueOf};

/// The dependency-complete subset a selection produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Closure {
    /// Selected definitions in first-discovered order. The order is part of
    /// the contract: emission must be byte-identical across runs.
    pub types: IndexMap<TypeName, TypeDefinition>,
    /// Names referenced by the selection that have no definition in the model
    /// (builtins and externally defined types), in discovery order.
    pub unresolved: IndexSet<TypeName>,
}

impl Closure {
    pub fn contains(&self, name: &TypeName) -> bool {
        self.types.contains_key(name)
    }
}

/// Compute the closure of every definition satisfying `seed`.
///
/// The predicate sees each definition's identity and, for interfaces, its
/// inheritance parent. Processing is a worklist run to fixpoint; the
/// closed-set membership check doubles as the cycle guard, so mutually
/// referential definitions terminate.
pub fn select<F>(model: &Model, seed: F) -> Closure
where
    F: Fn(&TypeName, Option<&TypeName>) -> bool,
{
    let mut closure = Closure::default();
    let mut queue = VecDeque::new();

    for def in model.types.values() {
        if seed(def.name(), inheritance_parent(def)) {
            queue.push_back(def.name().clone());
        }
    }

    while let Some(name) = queue.pop_front() {
        if closure.types.contains_key(&name) {
            continue;
        }
        let Some(def) = model.get(&name) else {
            closure.unresolved.insert(name);
            continue;
        };
        let def = def.clone();
        let references = definition_references(&def);
        closure.types.insert(name, def);

        for reference in references {
            if closure.types.contains_key(&reference) {
                continue;
            }
            if model.contains(&reference) {
                queue.push_back(reference);
            } else {
                closure.unresolved.insert(reference);
            }
        }
    }

    closure
}

fn inheritance_parent(def: &TypeDefinition) -> Option<&TypeName> {
    match def {
        TypeDefinition::Interface(iface) => iface.inherits.as_ref().map(|edge| &edge.type_name),
        _ => None,
    }
}

/// Every type name a definition structurally references, in declaration
/// order: inheritance edges first, then properties, then the alias binding.
/// Generic *parameter* names are binders and never appear here.
pub(crate) fn definition_references(def: &TypeDefinition) -> Vec<TypeName> {
    let mut out = Vec::new();
    match def {
        TypeDefinition::Interface(iface) => {
            for edge in iface
                .inherits
                .iter()
                .chain(&iface.implements)
                .chain(&iface.behaviors)
            {
                collect_edge(edge, &mut out);
            }
            for property in &iface.properties {
                if let Some(value) = &property.typ {
                    collect_value(value, &mut out);
                }
            }
        }
        TypeDefinition::Enum(_) => {}
        TypeDefinition::TypeAlias(alias) => {
            if let Some(value) = &alias.typ {
                collect_value(value, &mut out);
            }
        }
    }
    out
}

fn collect_edge(edge: &Inherits, out: &mut Vec<TypeName>) {
    out.push(edge.type_name.clone());
    for generic in &edge.generics {
        collect_value(generic, out);
    }
}

/// Unwrap the value grammar recursively, collecting every instance reference.
pub(crate) fn collect_value(value: &ValueOf, out: &mut Vec<TypeName>) {
    match value {
        ValueOf::InstanceOf(instance) => {
            out.push(instance.type_name.clone());
            if let Some(generic) = &instance.generics {
                collect_value(generic, out);
            }
        }
        ValueOf::ArrayOf(array) => collect_value(&array.value, out),
        ValueOf::UnionOf(union) => {
            for item in &union.items {
                collect_value(item, out);
            }
        }
        ValueOf::DictionaryOf(dictionary) => {
            collect_value(&dictionary.key, out);
            collect_value(&dictionary.value, out);
        }
        ValueOf::UserDefinedValue | ValueOf::LiteralValue(_) | ValueOf::Unset(_) => {}
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————
