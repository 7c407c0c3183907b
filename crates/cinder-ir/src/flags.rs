//! Modifier flags of types and members
//!
//! Each mutually exclusive category is an enum, so a flag set always resolves
//! to exactly one value per category.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TypeVisibility {
    #[default]
    NotPublic,
    Public,
    NestedPublic,
    NestedPrivate,
    NestedFamily,
    NestedAssembly,
    NestedFamAndAssem,
    NestedFamOrAssem,
}

impl TypeVisibility {
    /// Whether code outside the declaring assembly can see the type,
    /// given that its declaring type (if any) is visible
    pub fn is_visible_outside(self) -> bool {
        matches!(
            self,
            TypeVisibility::Public
                | TypeVisibility::NestedPublic
                | TypeVisibility::NestedFamily
                | TypeVisibility::NestedFamOrAssem
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Layout {
    #[default]
    Auto,
    Sequential,
    Explicit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StringFormat {
    #[default]
    Ansi,
    Unicode,
    Auto,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TypeFlags {
    pub visibility: TypeVisibility,
    pub layout: Layout,
    pub string_format: StringFormat,
    pub is_abstract: bool,
    pub sealed: bool,
    pub special_name: bool,
    pub rt_special_name: bool,
    pub serializable: bool,
    pub before_field_init: bool,
    pub has_security: bool,
    pub import: bool,
}

impl TypeFlags {
    pub fn public() -> Self {
        Self {
            visibility: TypeVisibility::Public,
            ..Self::default()
        }
    }
}

/// Accessibility shared by methods, fields and events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Visibility {
    #[default]
    Private,
    Assembly,
    Family,
    FamAndAssem,
    FamOrAssem,
    Public,
}

impl Visibility {
    pub fn is_visible_outside(self) -> bool {
        matches!(
            self,
            Visibility::Public | Visibility::Family | Visibility::FamOrAssem
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Visibility::Private => "private",
            Visibility::Assembly => "assembly",
            Visibility::Family => "family",
            Visibility::FamAndAssem => "famandassem",
            Visibility::FamOrAssem => "famorassem",
            Visibility::Public => "public",
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Virtual dispatch category of a method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Dispatch {
    #[default]
    None,
    Virtual,
    Abstract,
    /// Virtual, reusing the slot of the overridden method
    Override,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MethodFlags {
    pub visibility: Visibility,
    pub dispatch: Dispatch,
    pub new_slot: bool,
    pub is_static: bool,
    pub special_name: bool,
    pub rt_special_name: bool,
    /// Calling convention passes `this`
    pub has_this: bool,
}

impl MethodFlags {
    /// Instance method with the given visibility and no dispatch
    pub fn instance(visibility: Visibility) -> Self {
        Self {
            visibility,
            has_this: true,
            ..Self::default()
        }
    }
}

impl fmt::Display for MethodFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.visibility)?;
        if self.is_static {
            write!(f, " static")?;
        }
        match self.dispatch {
            Dispatch::None => {}
            Dispatch::Virtual => write!(f, " virtual")?,
            Dispatch::Abstract => write!(f, " abstract")?,
            Dispatch::Override => write!(f, " override")?,
        }
        if self.new_slot {
            write!(f, " newslot")?;
        }
        if self.special_name {
            write!(f, " specialname")?;
        }
        if self.rt_special_name {
            write!(f, " rtspecialname")?;
        }
        if self.has_this {
            write!(f, " instance")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FieldFlags {
    pub visibility: Visibility,
    pub is_static: bool,
    pub literal: bool,
    pub has_default: bool,
}

impl fmt::Display for FieldFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.visibility)?;
        if self.is_static {
            write!(f, " static")?;
        }
        if self.literal {
            write!(f, " literal")?;
        }
        if self.has_default {
            write!(f, " hasdefault")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_flags_display() {
        let mut flags = MethodFlags::instance(Visibility::Public);
        flags.special_name = true;
        assert_eq!(flags.to_string(), "public specialname instance");
    }

    #[test]
    fn test_visibility_outside_assembly() {
        assert!(Visibility::Family.is_visible_outside());
        assert!(!Visibility::FamAndAssem.is_visible_outside());
        assert!(!TypeVisibility::NestedAssembly.is_visible_outside());
    }
}
