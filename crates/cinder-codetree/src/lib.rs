//! cinder-codetree - Input program trees for the Cinder middle-end
//!
//! Front-ends produce a [`CodeCompileUnit`] (in memory or as JSON) and the
//! lowering translator in `cinder-ir` turns it into IR. Names in the tree are
//! plain dotted strings; nothing here is resolved.
//!
//! # Example
//!
//! ```rust
//! use cinder_codetree::CodeCompileUnit;
//!
//! let unit = CodeCompileUnit::from_json(r#"{
//!     "namespaces": [{ "name": "Shapes", "types": [
//!         { "name": "Circle", "type_kind": { "kind": "Class" } }
//!     ]}]
//! }"#).unwrap();
//!
//! assert_eq!(unit.namespaces[0].types[0].name, "Circle");
//! ```

pub mod attributes;
pub mod tree;

pub use attributes::{MemberAttributes, TypeAttributes};
pub use tree::*;
