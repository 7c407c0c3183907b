//! Attribute masks carried by declarations
//!
//! Front-ends hand over type and member modifiers as raw masks, the way the
//! metadata tables store them. Each mask groups several mutually exclusive
//! categories (selected with the `*_MASK` constants) plus independent bits.

use serde::{Deserialize, Serialize};
use std::ops::BitOr;

/// Modifiers of a type declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeAttributes(pub u32);

impl TypeAttributes {
    pub const VISIBILITY_MASK: u32 = 0x0000_0007;
    pub const NOT_PUBLIC: u32 = 0x0000_0000;
    pub const PUBLIC: u32 = 0x0000_0001;
    pub const NESTED_PUBLIC: u32 = 0x0000_0002;
    pub const NESTED_PRIVATE: u32 = 0x0000_0003;
    pub const NESTED_FAMILY: u32 = 0x0000_0004;
    pub const NESTED_ASSEMBLY: u32 = 0x0000_0005;
    pub const NESTED_FAM_AND_ASSEM: u32 = 0x0000_0006;
    pub const NESTED_FAM_OR_ASSEM: u32 = 0x0000_0007;

    pub const LAYOUT_MASK: u32 = 0x0000_0018;
    pub const AUTO_LAYOUT: u32 = 0x0000_0000;
    pub const SEQUENTIAL_LAYOUT: u32 = 0x0000_0008;
    pub const EXPLICIT_LAYOUT: u32 = 0x0000_0010;

    pub const STRING_FORMAT_MASK: u32 = 0x0003_0000;
    pub const ANSI_CLASS: u32 = 0x0000_0000;
    pub const UNICODE_CLASS: u32 = 0x0001_0000;
    pub const AUTO_CLASS: u32 = 0x0002_0000;

    pub const ABSTRACT: u32 = 0x0000_0080;
    pub const SEALED: u32 = 0x0000_0100;
    pub const SPECIAL_NAME: u32 = 0x0000_0400;
    pub const RT_SPECIAL_NAME: u32 = 0x0000_0800;
    pub const IMPORT: u32 = 0x0000_1000;
    pub const SERIALIZABLE: u32 = 0x0000_2000;
    pub const HAS_SECURITY: u32 = 0x0004_0000;
    pub const BEFORE_FIELD_INIT: u32 = 0x0010_0000;

    pub const fn new(bits: u32) -> Self {
        Self(bits)
    }

    pub fn bits(self) -> u32 {
        self.0
    }

    /// Value of the category selected by `mask`
    pub fn category(self, mask: u32) -> u32 {
        self.0 & mask
    }

    pub fn contains(self, bit: u32) -> bool {
        self.0 & bit == bit
    }
}

impl BitOr<u32> for TypeAttributes {
    type Output = Self;

    fn bitor(self, rhs: u32) -> Self {
        Self(self.0 | rhs)
    }
}

/// Modifiers of a type member
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemberAttributes(pub u32);

impl Default for MemberAttributes {
    /// Private and final, matching what front-ends emit for a bare member
    fn default() -> Self {
        Self(Self::PRIVATE | Self::FINAL)
    }
}

impl MemberAttributes {
    pub const SCOPE_MASK: u32 = 0x0000_000F;
    pub const ABSTRACT: u32 = 0x0000_0001;
    pub const FINAL: u32 = 0x0000_0002;
    pub const STATIC: u32 = 0x0000_0003;
    pub const OVERRIDE: u32 = 0x0000_0004;
    pub const CONST: u32 = 0x0000_0005;

    pub const VTABLE_MASK: u32 = 0x0000_00F0;
    pub const NEW: u32 = 0x0000_0010;

    pub const ACCESS_MASK: u32 = 0x0000_F000;
    pub const ASSEMBLY: u32 = 0x0000_1000;
    pub const FAMILY_AND_ASSEMBLY: u32 = 0x0000_2000;
    pub const FAMILY: u32 = 0x0000_3000;
    pub const FAMILY_OR_ASSEMBLY: u32 = 0x0000_4000;
    pub const PRIVATE: u32 = 0x0000_5000;
    pub const PUBLIC: u32 = 0x0000_6000;

    pub const fn new(bits: u32) -> Self {
        Self(bits)
    }

    pub fn bits(self) -> u32 {
        self.0
    }

    pub fn access(self) -> u32 {
        self.0 & Self::ACCESS_MASK
    }

    pub fn scope(self) -> u32 {
        self.0 & Self::SCOPE_MASK
    }

    pub fn is_new(self) -> bool {
        self.0 & Self::VTABLE_MASK == Self::NEW
    }
}

impl BitOr<u32> for MemberAttributes {
    type Output = Self;

    fn bitor(self, rhs: u32) -> Self {
        Self(self.0 | rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_member_categories() {
        let attrs = MemberAttributes::new(MemberAttributes::PUBLIC | MemberAttributes::STATIC);
        assert_eq!(attrs.access(), MemberAttributes::PUBLIC);
        assert_eq!(attrs.scope(), MemberAttributes::STATIC);
        assert!(!attrs.is_new());
    }

    #[test]
    fn test_type_categories() {
        let attrs = TypeAttributes::default()
            | TypeAttributes::NESTED_FAMILY
            | TypeAttributes::EXPLICIT_LAYOUT
            | TypeAttributes::SEALED;
        assert_eq!(
            attrs.category(TypeAttributes::VISIBILITY_MASK),
            TypeAttributes::NESTED_FAMILY
        );
        assert_eq!(
            attrs.category(TypeAttributes::LAYOUT_MASK),
            TypeAttributes::EXPLICIT_LAYOUT
        );
        assert!(attrs.contains(TypeAttributes::SEALED));
        assert!(!attrs.contains(TypeAttributes::ABSTRACT));
    }
}
