//! Type members

use crate::code::{Block, Expression, Literal, LocalId};
use crate::flags::{FieldFlags, MethodFlags};
use crate::ident::Identifier;
use crate::index::Idx;
use crate::module::{MemberRef, TypeId};
use crate::types::{Attribute, TypeRef};
use cinder_error::SourceContext;
use std::fmt;

/// A member, owned by exactly one type
#[derive(Debug, Clone, PartialEq)]
pub struct Member {
    pub name: Identifier,
    /// Owning type; set when the member is created
    pub declaring_type: TypeId,
    pub attributes: Vec<Attribute>,
    pub kind: MemberKind,
    pub source: Option<SourceContext>,
}

impl Member {
    pub fn new(name: Identifier, declaring_type: TypeId, kind: MemberKind) -> Self {
        Self {
            name,
            declaring_type,
            attributes: Vec::new(),
            kind,
            source: None,
        }
    }

    pub fn as_method(&self) -> Option<&Method> {
        match &self.kind {
            MemberKind::Method(method) => Some(method),
            _ => None,
        }
    }

    pub fn as_method_mut(&mut self) -> Option<&mut Method> {
        match &mut self.kind {
            MemberKind::Method(method) => Some(method),
            _ => None,
        }
    }

    pub fn as_field(&self) -> Option<&Field> {
        match &self.kind {
            MemberKind::Field(field) => Some(field),
            _ => None,
        }
    }

    pub fn as_property(&self) -> Option<&Property> {
        match &self.kind {
            MemberKind::Property(property) => Some(property),
            _ => None,
        }
    }

    /// Static members have no receiver; nested types and snippets count as static
    pub fn is_static(&self) -> bool {
        match &self.kind {
            MemberKind::Field(field) => field.flags.is_static,
            MemberKind::Method(method) => method.flags.is_static,
            MemberKind::Property(property) => property.is_static,
            MemberKind::Event(event) => event.handler_flags.is_static,
            MemberKind::NestedType(_) | MemberKind::Snippet => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MemberKind {
    Field(Field),
    Method(Method),
    Property(Property),
    Event(Event),
    /// A nested type, which is also a member of its declaring type
    NestedType(TypeId),
    /// Verbatim member source; the text lives in the member's source context
    Snippet,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub ty: TypeRef,
    pub flags: FieldFlags,
    pub initializer: Option<Expression>,
    /// Constant value of literal fields
    pub default_value: Option<Literal>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: Identifier,
    /// A [`TypeRef::Reference`] for by-reference parameters
    pub ty: TypeRef,
    pub attributes: Vec<Attribute>,
}

impl Parameter {
    pub fn new(name: Identifier, ty: TypeRef) -> Self {
        Self {
            name,
            ty,
            attributes: Vec::new(),
        }
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.ty, self.name)
    }
}

/// Facts a caller must establish before calling a method
#[derive(Debug, Clone, PartialEq)]
pub enum Precondition {
    NonNull(Expression),
}

impl fmt::Display for Precondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Precondition::NonNull(e) => write!(f, "{} != null", e),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodKind {
    Ordinary,
    /// Instance constructor; its body starts with a chained constructor call
    InstanceInitializer,
}

/// Statements of a method together with its temporary counter
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Body {
    pub block: Block,
    next_temp: u32,
}

impl Body {
    pub fn new(block: Block) -> Self {
        Self {
            block,
            next_temp: 0,
        }
    }

    /// Allocates a fresh temporary
    pub fn new_temp(&mut self) -> LocalId {
        let id = LocalId::new(self.next_temp as usize);
        self.next_temp += 1;
        id
    }

    /// Number of temporaries allocated so far
    pub fn temp_count(&self) -> u32 {
        self.next_temp
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Method {
    pub kind: MethodKind,
    pub parameters: Vec<Parameter>,
    pub return_type: TypeRef,
    pub return_attributes: Vec<Attribute>,
    pub flags: MethodFlags,
    /// Absent for abstract and non-static interface methods
    pub body: Option<Body>,
    /// Explicitly implemented interface types
    pub implemented_types: Vec<TypeRef>,
    /// Calls are kept only when this symbol is defined
    pub conditional_symbol: Option<String>,
    pub preconditions: Vec<Precondition>,
    /// Inferred preconditions of methods not visible outside the assembly
    pub implicit_preconditions: Vec<Precondition>,
}

impl Method {
    pub fn new(kind: MethodKind, flags: MethodFlags, return_type: TypeRef) -> Self {
        Self {
            kind,
            parameters: Vec::new(),
            return_type,
            return_attributes: Vec::new(),
            flags,
            body: None,
            implemented_types: Vec::new(),
            conditional_symbol: None,
            preconditions: Vec::new(),
            implicit_preconditions: Vec::new(),
        }
    }

    pub fn with_body(mut self, block: Block) -> Self {
        self.body = Some(Body::new(block));
        self
    }

    pub fn is_constructor(&self) -> bool {
        self.kind == MethodKind::InstanceInitializer
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub ty: TypeRef,
    /// Indexer parameters
    pub parameters: Vec<Parameter>,
    pub getter: Option<MemberRef>,
    pub setter: Option<MemberRef>,
    pub implemented_types: Vec<TypeRef>,
    pub is_static: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub handler_type: TypeRef,
    pub handler_flags: MethodFlags,
    pub implemented_types: Vec<TypeRef>,
}
