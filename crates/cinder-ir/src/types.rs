//! Type declarations and type references

use crate::code::Expression;
use crate::flags::TypeFlags;
use crate::ident::Identifier;
use crate::member::{Member, MemberKind, Method, MethodKind, Parameter};
use crate::module::{MemberRef, ModuleId, TypeId};
use cinder_error::SourceContext;
use std::fmt;

/// Built-in types known without resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    Void,
    Object,
    Boolean,
    Char,
    Int8,
    UInt8,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Single,
    Double,
    Decimal,
    String,
    DateTime,
    DbNull,
}

impl PrimitiveType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrimitiveType::Void => "void",
            PrimitiveType::Object => "object",
            PrimitiveType::Boolean => "bool",
            PrimitiveType::Char => "char",
            PrimitiveType::Int8 => "int8",
            PrimitiveType::UInt8 => "uint8",
            PrimitiveType::Int16 => "int16",
            PrimitiveType::UInt16 => "uint16",
            PrimitiveType::Int32 => "int32",
            PrimitiveType::UInt32 => "uint32",
            PrimitiveType::Int64 => "int64",
            PrimitiveType::UInt64 => "uint64",
            PrimitiveType::Single => "float32",
            PrimitiveType::Double => "float64",
            PrimitiveType::Decimal => "decimal",
            PrimitiveType::String => "string",
            PrimitiveType::DateTime => "datetime",
            PrimitiveType::DbNull => "dbnull",
        }
    }
}

/// A use of a type
#[derive(Debug, Clone, PartialEq)]
pub enum TypeRef {
    Primitive(PrimitiveType),
    /// Not yet resolved: an identifier or qualified identifier
    Named(Box<Expression>),
    Array { element: Box<TypeRef>, rank: u32 },
    /// By-reference (`out`/`ref`) parameter type
    Reference(Box<TypeRef>),
    /// Resolved to a declaration in the universe
    Bound(TypeId),
}

impl TypeRef {
    pub const VOID: TypeRef = TypeRef::Primitive(PrimitiveType::Void);
    pub const INT32: TypeRef = TypeRef::Primitive(PrimitiveType::Int32);

    pub fn is_reference(&self) -> bool {
        matches!(self, TypeRef::Reference(_))
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Primitive(p) => write!(f, "{}", p.as_str()),
            TypeRef::Named(name) => write!(f, "{}", name),
            TypeRef::Array { element, rank } => {
                write!(f, "{}[", element)?;
                for _ in 1..*rank {
                    write!(f, ",")?;
                }
                write!(f, "]")
            }
            TypeRef::Reference(inner) => write!(f, "{}&", inner),
            TypeRef::Bound(id) => write!(f, "type#{}", id),
        }
    }
}

/// The per-type guard protocol: where the guard lives and how to fetch it
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TypeContract {
    /// Method returning the instance's guard
    pub frame_getter: Option<MemberRef>,
    /// Field holding the guard itself
    pub frame_field: Option<MemberRef>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AttributeArgument {
    Positional(Expression),
    Named { name: Identifier, value: Expression },
}

/// Custom attribute application
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    /// Attribute type name (identifier or qualified identifier)
    pub constructor: Expression,
    pub arguments: Vec<AttributeArgument>,
}

impl Attribute {
    pub fn positional(&self) -> impl Iterator<Item = &Expression> {
        self.arguments.iter().filter_map(|arg| match arg {
            AttributeArgument::Positional(value) => Some(value),
            AttributeArgument::Named { .. } => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypeKind {
    Class,
    Struct,
    Interface,
    Enum {
        underlying: TypeRef,
    },
    Delegate {
        parameters: Vec<Parameter>,
        return_type: TypeRef,
    },
}

impl TypeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TypeKind::Class => "class",
            TypeKind::Struct => "struct",
            TypeKind::Interface => "interface",
            TypeKind::Enum { .. } => "enum",
            TypeKind::Delegate { .. } => "delegate",
        }
    }
}

/// A declared type; owns its members
#[derive(Debug, Clone, PartialEq)]
pub struct TypeNode {
    pub kind: TypeKind,
    pub name: Identifier,
    pub namespace: Identifier,
    pub declaring_module: ModuleId,
    /// Enclosing type for nested types
    pub declaring_type: Option<TypeId>,
    pub flags: TypeFlags,
    pub interfaces: Vec<TypeRef>,
    pub members: Vec<Member>,
    pub attributes: Vec<Attribute>,
    pub contract: Option<TypeContract>,
    pub source: Option<SourceContext>,
}

impl TypeNode {
    pub fn new(kind: TypeKind, name: Identifier, declaring_module: ModuleId) -> Self {
        Self {
            kind,
            name,
            namespace: Identifier::empty(),
            declaring_module,
            declaring_type: None,
            flags: TypeFlags::default(),
            interfaces: Vec::new(),
            members: Vec::new(),
            attributes: Vec::new(),
            contract: None,
            source: None,
        }
    }

    pub fn is_interface(&self) -> bool {
        matches!(self.kind, TypeKind::Interface)
    }

    pub fn is_value_type(&self) -> bool {
        matches!(self.kind, TypeKind::Struct | TypeKind::Enum { .. })
    }

    /// `Namespace.Name`, or just the name outside any namespace
    pub fn full_name(&self) -> String {
        if self.namespace.is_empty() {
            self.name.to_string()
        } else {
            format!("{}.{}", self.namespace, self.name)
        }
    }

    /// Instance constructors, in declaration order
    pub fn constructors(&self) -> impl Iterator<Item = &Method> {
        self.members.iter().filter_map(|m| match &m.kind {
            MemberKind::Method(method) if method.kind == MethodKind::InstanceInitializer => {
                Some(method)
            }
            _ => None,
        })
    }

    /// Index of the first member with the given name
    pub fn member_index(&self, name: &str) -> Option<usize> {
        self.members.iter().position(|m| m.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code::ExpressionKind;
    use crate::index::Idx;

    #[test]
    fn test_type_ref_display() {
        let named = TypeRef::Named(Box::new(Expression::new(ExpressionKind::Identifier(
            Identifier::new("Widget"),
        ))));
        let array = TypeRef::Array {
            element: Box::new(named),
            rank: 2,
        };
        assert_eq!(array.to_string(), "Widget[,]");
        assert_eq!(TypeRef::Reference(Box::new(TypeRef::INT32)).to_string(), "int32&");
    }

    #[test]
    fn test_full_name() {
        let mut node = TypeNode::new(TypeKind::Class, Identifier::new("Guard"), ModuleId::new(0));
        assert_eq!(node.full_name(), "Guard");
        node.namespace = Identifier::new("Microsoft.Contracts");
        assert_eq!(node.full_name(), "Microsoft.Contracts.Guard");
        assert!(!node.is_value_type());
    }
}
