//! Symbols the passes refer to by name

use cinder_error::{InternalError, Result};
use cinder_ir::{MemberRef, TypeId, TypeUniverse};

pub const GUARD_TYPE: &str = "Microsoft.Contracts.Guard";
pub const CHECK_IS_READING: &str = "CheckIsReading";
pub const CHECK_IS_WRITING: &str = "CheckIsWriting";

/// Looked up once per universe and handed to every pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WellKnown {
    pub guard_type: TypeId,
    pub check_is_reading: MemberRef,
    pub check_is_writing: MemberRef,
}

impl WellKnown {
    pub fn from_universe(universe: &TypeUniverse) -> Result<Self> {
        let guard_type = universe
            .find_type(GUARD_TYPE)
            .ok_or_else(|| InternalError::MissingWellKnown(GUARD_TYPE.to_string()))?;
        let method = |name: &str| {
            universe
                .find_method(guard_type, name)
                .ok_or_else(|| InternalError::MissingWellKnown(format!("{}.{}", GUARD_TYPE, name)))
        };

        Ok(Self {
            guard_type,
            check_is_reading: method(CHECK_IS_READING)?,
            check_is_writing: method(CHECK_IS_WRITING)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::Fixture;

    #[test]
    fn test_lookup_in_core_module() {
        let fixture = Fixture::new();
        let well_known = WellKnown::from_universe(&fixture.universe).unwrap();
        assert_eq!(well_known.guard_type, fixture.guard_type);
        assert_ne!(well_known.check_is_reading, well_known.check_is_writing);
    }

    #[test]
    fn test_missing_guard_type() {
        let universe = TypeUniverse::new();
        assert_eq!(
            WellKnown::from_universe(&universe).unwrap_err(),
            InternalError::MissingWellKnown(GUARD_TYPE.to_string())
        );
    }
}
