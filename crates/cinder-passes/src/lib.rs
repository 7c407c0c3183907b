//! cinder-passes - Rewrite passes of the Cinder middle-end
//!
//! Every pass walks the method bodies of one compilation unit after lowering:
//!
//! - [`guard`]: routes instance field reads and writes through the object's guard
//! - [`conditional`]: removes calls whose conditional symbol is not defined
//! - [`precondition`]: collects non-null facts and callee preconditions
//!
//! [`Pipeline`] runs them in that order.
//!
//! # Example
//!
//! ```rust,no_run
//! use cinder_error::ErrorSink;
//! use cinder_ir::{CompilationUnit, TypeUniverse};
//! use cinder_passes::{Pipeline, PipelineConfig, WellKnown};
//!
//! # fn main() -> cinder_error::Result<()> {
//! let mut universe = TypeUniverse::new();
//! let unit = CompilationUnit::new();
//! let errors = ErrorSink::new();
//!
//! let well_known = WellKnown::from_universe(&universe)?;
//! let mut pipeline = Pipeline::new(PipelineConfig::default(), well_known);
//! pipeline.run(&unit, &mut universe, &errors)?;
//! # Ok(())
//! # }
//! ```

pub mod conditional;
pub mod guard;
pub mod pipeline;
pub mod precondition;
pub mod well_known;

#[cfg(test)]
mod fixtures;

pub use conditional::ConditionalElimination;
pub use guard::GuardInstrumentation;
pub use pipeline::{Pipeline, PipelineConfig};
pub use precondition::{PreconditionPropagation, PreconditionSet};
pub use well_known::WellKnown;
