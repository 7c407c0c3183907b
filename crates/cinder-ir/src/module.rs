//! Modules, namespaces and compilation units
//!
//! A module owns every type it declares, nested ones included, in one arena.
//! Types refer to each other (and members to their declaring type) by id.

use crate::ident::Identifier;
use crate::index::{Idx, IndexVec};
use crate::member::MemberKind;
use crate::types::{Attribute, TypeKind, TypeNode};
use cinder_error::SourceContext;
use std::collections::BTreeSet;
use std::fmt;

crate::simple_index! {
    /// Position of a module in the type universe
    pub struct ModuleId;
}

crate::simple_index! {
    /// Position of a type in its module's arena
    pub struct TypeIndex;
}

/// Globally unique type id
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TypeId {
    pub module: ModuleId,
    pub index: TypeIndex,
}

impl TypeId {
    pub fn new(module: ModuleId, index: TypeIndex) -> Self {
        Self { module, index }
    }
}

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.module, self.index)
    }
}

/// A member, addressed by its declaring type and position
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MemberRef {
    pub ty: TypeId,
    pub index: usize,
}

impl MemberRef {
    pub fn new(ty: TypeId, index: usize) -> Self {
        Self { ty, index }
    }
}

impl fmt::Display for MemberRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.ty, self.index)
    }
}

/// A resolved assembly reference
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AssemblyReference {
    pub name: String,
    /// Stable key that identifies the assembly regardless of how it was named
    pub identity_key: String,
}

impl AssemblyReference {
    pub fn new(name: impl Into<String>, identity_key: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            identity_key: identity_key.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Module {
    pub id: ModuleId,
    pub name: String,
    /// Every type declared by the module, nested ones included
    pub types: IndexVec<TypeIndex, TypeNode>,
    /// Types not nested in another type, in declaration order
    pub top_level: Vec<TypeId>,
    pub assembly_references: Vec<AssemblyReference>,
    pub attributes: Vec<Attribute>,
}

impl Module {
    pub fn new(id: ModuleId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            types: IndexVec::new(),
            top_level: Vec::new(),
            assembly_references: Vec::new(),
            attributes: Vec::new(),
        }
    }

    /// Adds a type to the arena; top-level types are also listed in `top_level`
    pub fn add_type(&mut self, node: TypeNode) -> TypeId {
        let nested = node.declaring_type.is_some();
        let id = TypeId::new(self.id, self.types.push(node));
        if !nested {
            self.top_level.push(id);
        }
        id
    }

    pub fn type_node(&self, id: TypeId) -> Option<&TypeNode> {
        if id.module != self.id {
            return None;
        }
        self.types.get(id.index)
    }

    pub fn type_node_mut(&mut self, id: TypeId) -> Option<&mut TypeNode> {
        if id.module != self.id {
            return None;
        }
        self.types.get_mut(id.index)
    }

    pub fn has_reference(&self, identity_key: &str) -> bool {
        self.assembly_references
            .iter()
            .any(|r| r.identity_key == identity_key)
    }

    pub fn find_type(&self, namespace: &str, name: &str) -> Option<TypeId> {
        self.types
            .enumerate()
            .find(|(_, t)| t.declaring_type.is_none() && t.namespace == namespace && t.name == name)
            .map(|(index, _)| TypeId::new(self.id, index))
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "; Module: {}", self.name)?;

        for reference in &self.assembly_references {
            writeln!(f, "; reference {} [{}]", reference.name, reference.identity_key)?;
        }
        if !self.assembly_references.is_empty() {
            writeln!(f)?;
        }

        for (index, node) in self.types.enumerate() {
            write!(
                f,
                "{} {} (type#{})",
                node.kind.as_str(),
                node.full_name(),
                TypeId::new(self.id, index)
            )?;
            if let Some(outer) = node.declaring_type {
                write!(f, " in type#{}", outer)?;
            }
            match &node.kind {
                TypeKind::Enum { underlying } => write!(f, " : {}", underlying)?,
                TypeKind::Delegate {
                    parameters,
                    return_type,
                } => {
                    write!(f, " (")?;
                    for (i, p) in parameters.iter().enumerate() {
                        if i > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "{}", p)?;
                    }
                    write!(f, ") -> {}", return_type)?;
                }
                _ => {
                    if !node.interfaces.is_empty() {
                        write!(f, " :")?;
                        for interface in &node.interfaces {
                            write!(f, " {}", interface)?;
                        }
                    }
                }
            }
            writeln!(f)?;

            for member in &node.members {
                match &member.kind {
                    MemberKind::Field(field) => {
                        write!(f, "  field {} {} {}", field.flags, field.ty, member.name)?;
                        if let Some(value) = &field.default_value {
                            write!(f, " = {}", value)?;
                        } else if let Some(init) = &field.initializer {
                            write!(f, " = {}", init)?;
                        }
                        writeln!(f)?;
                    }
                    MemberKind::Method(method) => {
                        write!(f, "  method {} {} {}(", method.flags, method.return_type, member.name)?;
                        for (i, p) in method.parameters.iter().enumerate() {
                            if i > 0 {
                                write!(f, ", ")?;
                            }
                            write!(f, "{}", p)?;
                        }
                        write!(f, ")")?;
                        if let Some(symbol) = &method.conditional_symbol {
                            write!(f, " [if {}]", symbol)?;
                        }
                        match &method.body {
                            Some(body) => writeln!(f, " {}", body.block)?,
                            None => writeln!(f, ";")?,
                        }
                    }
                    MemberKind::Property(property) => {
                        writeln!(
                            f,
                            "  property {} {} [{}{}]",
                            property.ty,
                            member.name,
                            if property.getter.is_some() { "get" } else { "" },
                            if property.setter.is_some() { " set" } else { "" }
                        )?;
                    }
                    MemberKind::Event(event) => {
                        writeln!(
                            f,
                            "  event {} {} {}",
                            event.handler_flags, event.handler_type, member.name
                        )?;
                    }
                    MemberKind::NestedType(id) => writeln!(f, "  nested type#{}", id)?,
                    MemberKind::Snippet => match &member.source {
                        Some(source) => writeln!(f, "  snippet {:?}", source.text())?,
                        None => writeln!(f, "  snippet")?,
                    },
                }
            }
        }

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Namespace {
    /// Empty for the root namespace
    pub name: Identifier,
    pub namespaces: Vec<Namespace>,
    pub types: Vec<TypeId>,
    pub used_namespaces: Vec<Identifier>,
    pub source: Option<SourceContext>,
}

impl Namespace {
    pub fn new(name: Identifier) -> Self {
        Self {
            name,
            ..Self::default()
        }
    }

    /// Types of this namespace and all nested ones, depth first
    pub fn all_types(&self) -> Vec<TypeId> {
        let mut out = self.types.clone();
        for nested in &self.namespaces {
            out.extend(nested.all_types());
        }
        out
    }
}

/// Result of lowering one code tree
#[derive(Debug, Clone, PartialEq)]
pub struct CompilationUnit {
    pub name: Option<Identifier>,
    pub root: Namespace,
    pub source: Option<SourceContext>,
    /// Preprocessor symbols; absent when the front-end supplied none
    pub defined_symbols: Option<BTreeSet<String>>,
    pub is_snippet: bool,
}

impl CompilationUnit {
    pub fn new() -> Self {
        Self {
            name: None,
            root: Namespace::default(),
            source: None,
            defined_symbols: None,
            is_snippet: false,
        }
    }

    pub fn with_symbols<I, S>(mut self, symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.defined_symbols = Some(symbols.into_iter().map(Into::into).collect());
        self
    }

    pub fn defines(&self, symbol: &str) -> bool {
        self.defined_symbols
            .as_ref()
            .is_some_and(|symbols| symbols.contains(symbol))
    }
}

impl Default for CompilationUnit {
    fn default() -> Self {
        Self::new()
    }
}
