//! Conditional-call elimination
//!
//! Calls to a method that carries a conditional symbol survive only when the
//! current unit defines that symbol. A removed call takes its arguments with
//! it, and the removal spreads to whatever required the call's value.

use cinder_error::{InternalError, Result, SourceContext};
use cinder_ir::rewrite::walk_method_call;
use cinder_ir::{
    Body, BodyPass, CompilationUnit, Expression, ExpressionKind, MemberKind, MemberRef,
    MethodCall, Rewriter, TypeRef, TypeUniverse,
};
use std::collections::BTreeSet;
use tracing::trace;

#[derive(Debug, Default)]
pub struct ConditionalElimination {
    /// Symbols of the unit being processed
    symbols: Option<BTreeSet<String>>,
    saved: Vec<Option<BTreeSet<String>>>,
    eliminated: usize,
}

impl ConditionalElimination {
    pub fn new() -> Self {
        Self::default()
    }

    /// Calls removed so far
    pub fn eliminated(&self) -> usize {
        self.eliminated
    }
}

impl BodyPass for ConditionalElimination {
    fn name(&self) -> &'static str {
        "conditional-elimination"
    }

    fn begin_unit(&mut self, unit: &CompilationUnit) {
        let outer = std::mem::replace(&mut self.symbols, unit.defined_symbols.clone());
        self.saved.push(outer);
    }

    fn end_unit(&mut self, _unit: &CompilationUnit) {
        self.symbols = self.saved.pop().flatten();
    }

    fn rewrite_body(
        &mut self,
        universe: &TypeUniverse,
        _method: MemberRef,
        body: &mut Body,
    ) -> Result<()> {
        let mut rewriter = CallEliminator {
            universe,
            symbols: self.symbols.as_ref(),
            eliminated: 0,
            failure: None,
        };
        body.block = rewriter.rewrite_block(std::mem::take(&mut body.block));
        if let Some(err) = rewriter.failure {
            return Err(err);
        }
        self.eliminated += rewriter.eliminated;
        Ok(())
    }
}

struct CallEliminator<'a> {
    universe: &'a TypeUniverse,
    symbols: Option<&'a BTreeSet<String>>,
    eliminated: usize,
    failure: Option<InternalError>,
}

impl<'a> CallEliminator<'a> {
    fn conditional_symbol(&self, callee: &Expression) -> Result<Option<&'a str>> {
        let ExpressionKind::MemberBinding(binding) = &callee.kind else {
            return Ok(None);
        };
        let universe: &'a TypeUniverse = self.universe;
        match &universe.member(binding.member)?.kind {
            MemberKind::Method(method) => Ok(method.conditional_symbol.as_deref()),
            _ => Ok(None),
        }
    }

    fn is_defined(&self, symbol: &str) -> bool {
        self.symbols.is_some_and(|symbols| symbols.contains(symbol))
    }
}

impl Rewriter for CallEliminator<'_> {
    fn rewrite_method_call(
        &mut self,
        call: MethodCall,
        ty: Option<TypeRef>,
        source: Option<SourceContext>,
    ) -> Option<Expression> {
        match self.conditional_symbol(&call.callee) {
            Ok(Some(symbol)) if !self.is_defined(symbol) => {
                trace!(symbol, callee = %call.callee, "eliminated conditional call");
                self.eliminated += 1;
                return None;
            }
            Ok(_) => {}
            Err(err) => {
                self.failure.get_or_insert(err);
            }
        }
        walk_method_call(self, call, ty, source)
    }
}
