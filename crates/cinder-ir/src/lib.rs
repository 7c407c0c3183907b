//! cinder-ir - Intermediate representation of the Cinder middle-end
//!
//! The IR is a typed tree of modules, types, members and method bodies that
//! the middle-end passes rewrite in place:
//!
//! ```text
//! CodeCompileUnit (cinder-codetree)
//!         ↓
//!    [Lowering]
//!         ↓
//!   TypeUniverse
//!   ├── Modules
//!   │   ├── Types (arena, nested ones included)
//!   │   │   └── Members
//!   │   │       └── Method bodies
//!   │   └── Assembly references
//!   └── Compilation units (namespace trees over type ids)
//!         ↓
//!    [Passes] (cinder-passes)
//! ```

pub mod index;
pub mod ident;
pub mod flags;
pub mod code;
pub mod types;
pub mod member;
pub mod module;
pub mod universe;
pub mod visit;
pub mod rewrite;
pub mod lower;

pub use code::{
    Assignment, BinaryOp, Block, Catch, Decimal, Expression, ExpressionKind, Literal, LocalId,
    MemberBinding, MethodCall, Statement, StatementKind,
};
pub use flags::{Dispatch, FieldFlags, MethodFlags, TypeFlags, TypeVisibility, Visibility};
pub use ident::{Identifier, Interner};
pub use index::{Idx, IndexVec};
pub use lower::{translate, ReferenceResolver, Translator};
pub use member::{Body, Event, Field, Member, MemberKind, Method, MethodKind, Parameter, Precondition, Property};
pub use module::{AssemblyReference, CompilationUnit, MemberRef, Module, ModuleId, Namespace, TypeId, TypeIndex};
pub use rewrite::{rewrite_unit_bodies, BodyPass, Rewriter};
pub use types::{Attribute, AttributeArgument, PrimitiveType, TypeContract, TypeKind, TypeNode, TypeRef};
pub use universe::TypeUniverse;
pub use visit::Visitor;
