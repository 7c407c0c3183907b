//! Pass driver

use crate::conditional::ConditionalElimination;
use crate::guard::GuardInstrumentation;
use crate::precondition::PreconditionPropagation;
use crate::well_known::WellKnown;
use cinder_error::{ErrorSink, Result};
use cinder_ir::{rewrite_unit_bodies, BodyPass, CompilationUnit, TypeUniverse};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Which passes run, and whether recorded errors stop the remaining ones
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub instrument_guards: bool,
    pub eliminate_conditionals: bool,
    pub propagate_preconditions: bool,
    pub stop_on_error: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            instrument_guards: true,
            eliminate_conditionals: true,
            propagate_preconditions: true,
            stop_on_error: true,
        }
    }
}

impl PipelineConfig {
    /// Parses a config; absent fields keep their defaults
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }
}

/// Runs guard instrumentation, conditional elimination and precondition
/// propagation, in that order, over one unit at a time
pub struct Pipeline {
    config: PipelineConfig,
    guard: GuardInstrumentation,
    conditional: ConditionalElimination,
    precondition: PreconditionPropagation,
}

impl Pipeline {
    pub fn new(config: PipelineConfig, well_known: WellKnown) -> Self {
        Self {
            config,
            guard: GuardInstrumentation::new(well_known),
            conditional: ConditionalElimination::new(),
            precondition: PreconditionPropagation::new(),
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Returns the names of the passes that ran
    pub fn run(
        &mut self,
        unit: &CompilationUnit,
        universe: &mut TypeUniverse,
        errors: &ErrorSink,
    ) -> Result<Vec<&'static str>> {
        let mut ran = Vec::new();

        if self.config.instrument_guards && self.may_continue(errors) {
            run_pass(&mut self.guard, unit, universe, &mut ran)?;
        }
        if self.config.eliminate_conditionals && self.may_continue(errors) {
            run_pass(&mut self.conditional, unit, universe, &mut ran)?;
        }
        if self.config.propagate_preconditions && self.may_continue(errors) {
            run_pass(&mut self.precondition, unit, universe, &mut ran)?;
        }

        debug!(
            unit = ?unit.name,
            passes = ran.len(),
            instrumented = self.guard.instrumented(),
            eliminated = self.conditional.eliminated(),
            "pipeline finished"
        );
        Ok(ran)
    }

    fn may_continue(&self, errors: &ErrorSink) -> bool {
        if self.config.stop_on_error && errors.has_errors() {
            debug!(errors = errors.len(), "errors recorded, skipping remaining passes");
            return false;
        }
        true
    }
}

fn run_pass(
    pass: &mut impl BodyPass,
    unit: &CompilationUnit,
    universe: &mut TypeUniverse,
    ran: &mut Vec<&'static str>,
) -> Result<()> {
    rewrite_unit_bodies(pass, unit, universe)?;
    ran.push(pass.name());
    Ok(())
}
