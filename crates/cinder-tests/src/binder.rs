//! Minimal name binding for end-to-end runs
//!
//! Real resolution is a separate phase. This binder handles just enough for
//! the passes to have something to work on: `this.name`, `expr.name` when
//! `expr` has a bound type, and bare names of members of the enclosing type.

use cinder_error::Result;
use cinder_ir::rewrite::walk_expression;
use cinder_ir::{
    Body, BodyPass, CompilationUnit, Expression, ExpressionKind, Identifier, MemberBinding,
    MemberKind, MemberRef, MethodCall, Rewriter, TypeContract, TypeId, TypeRef, TypeUniverse,
};
use tracing::{debug, trace};

/// Binds member names in every method body of a unit
#[derive(Debug, Default)]
pub struct MemberBinder {
    bound: usize,
}

impl MemberBinder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bound(&self) -> usize {
        self.bound
    }
}

impl BodyPass for MemberBinder {
    fn name(&self) -> &'static str {
        "member-binding"
    }

    fn rewrite_body(
        &mut self,
        universe: &TypeUniverse,
        method: MemberRef,
        body: &mut Body,
    ) -> Result<()> {
        let mut rewriter = BindingRewriter {
            universe,
            owner: method.ty,
            bound: 0,
        };
        body.block = rewriter.rewrite_block(std::mem::take(&mut body.block));
        self.bound += rewriter.bound;
        Ok(())
    }
}

struct BindingRewriter<'a> {
    universe: &'a TypeUniverse,
    owner: TypeId,
    bound: usize,
}

impl BindingRewriter<'_> {
    /// The member, its value type (fields only) and whether it is static
    fn lookup(&self, ty: TypeId, name: &Identifier) -> Option<(MemberRef, Option<TypeRef>, bool)> {
        let member = self.universe.find_member(ty, name.as_str())?;
        let node = self.universe.member(member).ok()?;
        let value_type = match &node.kind {
            MemberKind::Field(field) => Some(resolve_type(self.universe, &field.ty)),
            _ => None,
        };
        Some((member, value_type, node.is_static()))
    }

    fn this(&self) -> Expression {
        Expression::new(ExpressionKind::This).with_type(TypeRef::Bound(self.owner))
    }

    fn binding(&mut self, target: Option<Expression>, member: MemberRef) -> ExpressionKind {
        trace!(%member, "bound member");
        self.bound += 1;
        ExpressionKind::MemberBinding(MemberBinding {
            target: target.map(Box::new),
            member,
        })
    }

    fn call_type(&self, call: &MethodCall) -> Option<TypeRef> {
        let ExpressionKind::MemberBinding(binding) = &call.callee.kind else {
            return None;
        };
        let method = self.universe.method(binding.member).ok()?;
        Some(resolve_type(self.universe, &method.return_type))
    }

    fn bind(&mut self, expression: Expression) -> Expression {
        let Expression { kind, ty, source } = expression;
        let (kind, ty) = match kind {
            ExpressionKind::This => (ExpressionKind::This, Some(TypeRef::Bound(self.owner))),
            ExpressionKind::Identifier(name) => match self.lookup(self.owner, &name) {
                Some((member, value_type, is_static)) => {
                    let target = (!is_static).then(|| self.this());
                    (self.binding(target, member), value_type)
                }
                None => (ExpressionKind::Identifier(name), ty),
            },
            ExpressionKind::Qualified { qualifier, name } => {
                let found = match &qualifier.ty {
                    Some(TypeRef::Bound(owner)) => self.lookup(*owner, &name),
                    _ => None,
                };
                match found {
                    Some((member, value_type, _)) => {
                        (self.binding(Some(*qualifier), member), value_type)
                    }
                    None => (ExpressionKind::Qualified { qualifier, name }, ty),
                }
            }
            ExpressionKind::MethodCall(call) => {
                let ty = self.call_type(&call).or(ty);
                (ExpressionKind::MethodCall(call), ty)
            }
            kind => (kind, ty),
        };
        Expression { kind, ty, source }
    }
}

impl Rewriter for BindingRewriter<'_> {
    fn rewrite_expression(&mut self, expression: Expression) -> Option<Expression> {
        let expression = walk_expression(self, expression)?;
        Some(self.bind(expression))
    }
}

/// Resolves a named type against the universe; anything else is kept
pub fn resolve_type(universe: &TypeUniverse, ty: &TypeRef) -> TypeRef {
    match ty {
        TypeRef::Named(name) => dotted_name(name)
            .and_then(|name| universe.find_type(&name))
            .map_or_else(|| ty.clone(), TypeRef::Bound),
        other => other.clone(),
    }
}

/// `((A).B).C` back to `A.B.C`
pub fn dotted_name(expression: &Expression) -> Option<String> {
    match &expression.kind {
        ExpressionKind::Identifier(name) => Some(name.to_string()),
        ExpressionKind::Qualified { qualifier, name } => {
            Some(format!("{}.{}", dotted_name(qualifier)?, name))
        }
        _ => None,
    }
}

/// Gives every type of the unit that holds a guard a contract: the first
/// instance field of the guard type is the frame field, the first
/// parameterless instance method returning it is the frame getter
pub fn install_guard_contracts(
    universe: &mut TypeUniverse,
    unit: &CompilationUnit,
    guard_type: TypeId,
) -> Result<usize> {
    let guard = TypeRef::Bound(guard_type);
    let mut installed = 0;

    for ty in unit.root.all_types() {
        let node = universe.type_node(ty)?;
        let mut contract = TypeContract::default();
        for (index, member) in node.members.iter().enumerate() {
            match &member.kind {
                MemberKind::Field(field)
                    if !field.flags.is_static
                        && contract.frame_field.is_none()
                        && resolve_type(universe, &field.ty) == guard =>
                {
                    contract.frame_field = Some(MemberRef::new(ty, index));
                }
                MemberKind::Method(method)
                    if method.flags.has_this
                        && method.parameters.is_empty()
                        && !method.is_constructor()
                        && contract.frame_getter.is_none()
                        && resolve_type(universe, &method.return_type) == guard =>
                {
                    contract.frame_getter = Some(MemberRef::new(ty, index));
                }
                _ => {}
            }
        }

        if contract != TypeContract::default() {
            universe.type_node_mut(ty)?.contract = Some(contract);
            installed += 1;
        }
    }

    debug!(installed, "guard contracts installed");
    Ok(installed)
}
