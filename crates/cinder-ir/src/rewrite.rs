//! Consuming rewrites of method bodies
//!
//! A rewriter takes each node by value and returns its replacement, or `None`
//! when the node is deleted. Deletion of a required child deletes the parent;
//! an optional child (a return value, a loop test, a local initializer) just
//! becomes empty, and deleted statements drop out of their block.
//!
//! Passes implement [`BodyPass`]; [`rewrite_unit_bodies`] detaches every
//! method body of a unit from the universe, hands it to the pass, and puts the
//! result back.

use crate::code::{
    Assignment, Block, Catch, Expression, ExpressionKind, MemberBinding, MethodCall, Statement,
    StatementKind,
};
use crate::member::Body;
use crate::module::{CompilationUnit, MemberRef};
use crate::types::TypeRef;
use crate::universe::TypeUniverse;
use cinder_error::{Result, SourceContext};
use tracing::debug;

pub trait Rewriter: Sized {
    fn rewrite_block(&mut self, block: Block) -> Block {
        walk_block(self, block)
    }

    fn rewrite_statement(&mut self, statement: Statement) -> Option<Statement> {
        walk_statement(self, statement)
    }

    fn rewrite_expression(&mut self, expression: Expression) -> Option<Expression> {
        walk_expression(self, expression)
    }

    /// `ty` and `source` belong to the expression the binding came from
    fn rewrite_member_binding(
        &mut self,
        binding: MemberBinding,
        ty: Option<TypeRef>,
        source: Option<SourceContext>,
    ) -> Option<Expression> {
        walk_member_binding(self, binding, ty, source)
    }

    fn rewrite_method_call(
        &mut self,
        call: MethodCall,
        ty: Option<TypeRef>,
        source: Option<SourceContext>,
    ) -> Option<Expression> {
        walk_method_call(self, call, ty, source)
    }

    fn rewrite_assignment(
        &mut self,
        assignment: Assignment,
        source: Option<SourceContext>,
    ) -> Option<Statement> {
        walk_assignment(self, assignment, source)
    }
}

pub fn walk_block(rewriter: &mut impl Rewriter, block: Block) -> Block {
    let statements = rewrite_statements(rewriter, block.statements);
    Block {
        statements,
        source: block.source,
    }
}

fn rewrite_statements(rewriter: &mut impl Rewriter, statements: Vec<Statement>) -> Vec<Statement> {
    statements
        .into_iter()
        .filter_map(|s| rewriter.rewrite_statement(s))
        .collect()
}

/// Rewrites every expression; one deletion deletes the whole list
fn rewrite_required(
    rewriter: &mut impl Rewriter,
    expressions: Vec<Expression>,
) -> Option<Vec<Expression>> {
    expressions
        .into_iter()
        .map(|e| rewriter.rewrite_expression(e))
        .collect()
}

fn rewrite_boxed(rewriter: &mut impl Rewriter, expression: Box<Expression>) -> Option<Box<Expression>> {
    rewriter.rewrite_expression(*expression).map(Box::new)
}

pub fn walk_statement(rewriter: &mut impl Rewriter, statement: Statement) -> Option<Statement> {
    let source = statement.source;
    let kind = match statement.kind {
        StatementKind::Assignment(assignment) => {
            return rewriter.rewrite_assignment(assignment, source);
        }
        StatementKind::AttachEvent { event, handler } => StatementKind::AttachEvent {
            event: rewriter.rewrite_expression(event)?,
            handler: rewriter.rewrite_expression(handler)?,
        },
        StatementKind::RemoveEvent { event, handler } => StatementKind::RemoveEvent {
            event: rewriter.rewrite_expression(event)?,
            handler: rewriter.rewrite_expression(handler)?,
        },
        StatementKind::If {
            condition,
            then_block,
            else_block,
        } => StatementKind::If {
            condition: rewriter.rewrite_expression(condition)?,
            then_block: rewriter.rewrite_block(then_block),
            else_block: rewriter.rewrite_block(else_block),
        },
        StatementKind::Expression(expression) => {
            StatementKind::Expression(rewriter.rewrite_expression(expression)?)
        }
        StatementKind::Labeled { label, statement } => StatementKind::Labeled {
            label,
            statement: statement
                .and_then(|inner| rewriter.rewrite_statement(*inner))
                .map(Box::new),
        },
        StatementKind::For {
            init,
            test,
            increment,
            body,
        } => StatementKind::For {
            init: rewrite_statements(rewriter, init),
            test: test.and_then(|t| rewriter.rewrite_expression(t)),
            increment: rewrite_statements(rewriter, increment),
            body: rewriter.rewrite_block(body),
        },
        StatementKind::Return(value) => {
            StatementKind::Return(value.and_then(|v| rewriter.rewrite_expression(v)))
        }
        StatementKind::Throw(value) => {
            StatementKind::Throw(value.and_then(|v| rewriter.rewrite_expression(v)))
        }
        StatementKind::Try {
            block,
            catchers,
            finally,
        } => StatementKind::Try {
            block: rewriter.rewrite_block(block),
            catchers: catchers
                .into_iter()
                .map(|catcher| Catch {
                    ty: catcher.ty,
                    variable: catcher.variable,
                    block: rewriter.rewrite_block(catcher.block),
                })
                .collect(),
            finally: finally.map(|f| rewriter.rewrite_block(f)),
        },
        StatementKind::VariableDeclaration {
            name,
            ty,
            initializer,
        } => StatementKind::VariableDeclaration {
            name,
            ty,
            initializer: initializer.and_then(|i| rewriter.rewrite_expression(i)),
        },
        StatementKind::Block(block) => StatementKind::Block(rewriter.rewrite_block(block)),
        kind @ (StatementKind::Goto(_) | StatementKind::Snippet) => kind,
    };

    Some(Statement { kind, source })
}

pub fn walk_assignment(
    rewriter: &mut impl Rewriter,
    assignment: Assignment,
    source: Option<SourceContext>,
) -> Option<Statement> {
    let target = rewriter.rewrite_expression(assignment.target)?;
    let value = rewriter.rewrite_expression(assignment.source)?;
    Some(Statement::assignment(target, value).with_source(source))
}

pub fn walk_expression(rewriter: &mut impl Rewriter, expression: Expression) -> Option<Expression> {
    let Expression { kind, ty, source } = expression;
    let kind = match kind {
        ExpressionKind::MemberBinding(binding) => {
            return rewriter.rewrite_member_binding(binding, ty, source);
        }
        ExpressionKind::MethodCall(call) => {
            return rewriter.rewrite_method_call(call, ty, source);
        }
        ExpressionKind::Qualified { qualifier, name } => ExpressionKind::Qualified {
            qualifier: rewrite_boxed(rewriter, qualifier)?,
            name,
        },
        ExpressionKind::Binary { op, left, right } => ExpressionKind::Binary {
            op,
            left: rewrite_boxed(rewriter, left)?,
            right: rewrite_boxed(rewriter, right)?,
        },
        ExpressionKind::Assignment(statement) => {
            ExpressionKind::Assignment(Box::new(rewriter.rewrite_statement(*statement)?))
        }
        ExpressionKind::Cast { operand, target } => ExpressionKind::Cast {
            operand: rewrite_boxed(rewriter, operand)?,
            target,
        },
        ExpressionKind::Indexer { object, operands } => ExpressionKind::Indexer {
            object: rewrite_boxed(rewriter, object)?,
            operands: rewrite_required(rewriter, operands)?,
        },
        ExpressionKind::ConstructArray {
            element_type,
            size,
            initializers,
        } => ExpressionKind::ConstructArray {
            element_type,
            size: rewrite_boxed(rewriter, size)?,
            initializers: rewrite_required(rewriter, initializers)?,
        },
        ExpressionKind::Construct {
            constructor,
            operands,
        } => ExpressionKind::Construct {
            constructor,
            operands: rewrite_required(rewriter, operands)?,
        },
        ExpressionKind::ConstructDelegate {
            delegate_type,
            target,
            method_name,
        } => ExpressionKind::ConstructDelegate {
            delegate_type,
            target: rewrite_boxed(rewriter, target)?,
            method_name,
        },
        ExpressionKind::AddressOf(operand) => {
            ExpressionKind::AddressOf(rewrite_boxed(rewriter, operand)?)
        }
        ExpressionKind::Block(block) => ExpressionKind::Block(rewriter.rewrite_block(block)),
        kind @ (ExpressionKind::Literal(_)
        | ExpressionKind::Identifier(_)
        | ExpressionKind::This
        | ExpressionKind::Base
        | ExpressionKind::SetterValue
        | ExpressionKind::TypeExpression(_)
        | ExpressionKind::TypeOf(_)
        | ExpressionKind::Snippet
        | ExpressionKind::Local(_)
        | ExpressionKind::Missing) => kind,
    };

    Some(Expression { kind, ty, source })
}

pub fn walk_member_binding(
    rewriter: &mut impl Rewriter,
    binding: MemberBinding,
    ty: Option<TypeRef>,
    source: Option<SourceContext>,
) -> Option<Expression> {
    let target = match binding.target {
        Some(target) => Some(rewrite_boxed(rewriter, target)?),
        None => None,
    };
    Some(Expression {
        kind: ExpressionKind::MemberBinding(MemberBinding {
            target,
            member: binding.member,
        }),
        ty,
        source,
    })
}

pub fn walk_method_call(
    rewriter: &mut impl Rewriter,
    call: MethodCall,
    ty: Option<TypeRef>,
    source: Option<SourceContext>,
) -> Option<Expression> {
    let callee = rewrite_boxed(rewriter, call.callee)?;
    let arguments = rewrite_required(rewriter, call.arguments)?;
    Some(Expression {
        kind: ExpressionKind::MethodCall(MethodCall { callee, arguments }),
        ty,
        source,
    })
}

/// A pass over every method body of a compilation unit
pub trait BodyPass {
    fn name(&self) -> &'static str;

    /// Called before the first body of a unit
    fn begin_unit(&mut self, _unit: &CompilationUnit) {}

    /// Called after the last body of a unit, also when the unit failed
    fn end_unit(&mut self, _unit: &CompilationUnit) {}

    /// Rewrites `body` in place; whatever it holds afterwards goes back into
    /// the universe, also when the pass fails
    fn rewrite_body(
        &mut self,
        universe: &TypeUniverse,
        method: MemberRef,
        body: &mut Body,
    ) -> Result<()>;

    /// Called once the method's body is back in the universe
    fn finish_method(&mut self, _universe: &mut TypeUniverse, _method: MemberRef) -> Result<()> {
        Ok(())
    }
}

/// Runs a pass over every method of the unit, nested types included
pub fn rewrite_unit_bodies(
    pass: &mut impl BodyPass,
    unit: &CompilationUnit,
    universe: &mut TypeUniverse,
) -> Result<()> {
    pass.begin_unit(unit);
    let result = rewrite_methods(pass, unit, universe);
    pass.end_unit(unit);
    result
}

fn rewrite_methods(
    pass: &mut impl BodyPass,
    unit: &CompilationUnit,
    universe: &mut TypeUniverse,
) -> Result<()> {
    let methods = universe.unit_methods(unit)?;
    debug!(pass = pass.name(), methods = methods.len(), "rewriting method bodies");

    for method in methods {
        if let Some(mut body) = universe.detach_body(method)? {
            let rewritten = pass.rewrite_body(universe, method, &mut body);
            universe.attach_body(method, body)?;
            rewritten?;
        }
        pass.finish_method(universe, method)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code::Literal;
    use crate::flags::{MethodFlags, Visibility};
    use crate::ident::Identifier;
    use crate::member::{Member, MemberKind, Method, MethodKind};
    use crate::types::{TypeKind, TypeNode};
    use cinder_error::InternalError;

    /// Deletes every call to a method named `Trace`
    struct DropTrace;

    impl Rewriter for DropTrace {
        fn rewrite_method_call(
            &mut self,
            call: MethodCall,
            ty: Option<TypeRef>,
            source: Option<SourceContext>,
        ) -> Option<Expression> {
            if let ExpressionKind::Identifier(name) = &call.callee.kind {
                if name == "Trace" {
                    return None;
                }
            }
            walk_method_call(self, call, ty, source)
        }
    }

    fn trace(argument: Expression) -> Expression {
        Expression::call(Expression::identifier(Identifier::new("Trace")), vec![argument])
    }

    fn int(value: i32) -> Expression {
        Expression::literal(Literal::Int32(value))
    }

    #[test]
    fn test_deleted_expression_statement_leaves_block() {
        let block = Block::new(vec![
            Statement::expression(trace(int(1))),
            Statement::new(StatementKind::Goto(Identifier::new("done"))),
        ]);
        let block = DropTrace.rewrite_block(block);
        assert_eq!(block.len(), 1);
        assert_eq!(block.to_string(), "{ goto done; }");
    }

    #[test]
    fn test_deletion_propagates_through_required_slots() {
        let sum = Expression::new(ExpressionKind::Binary {
            op: crate::code::BinaryOp::Add,
            left: Box::new(int(1)),
            right: Box::new(trace(int(2))),
        });
        let assignment = Statement::assignment(Expression::identifier(Identifier::new("x")), sum);
        assert!(DropTrace.rewrite_statement(assignment).is_none());
    }

    #[test]
    fn test_optional_slots_become_empty() {
        let ret = Statement::new(StatementKind::Return(Some(trace(int(3)))));
        let ret = DropTrace.rewrite_statement(ret).unwrap();
        assert_eq!(ret.kind, StatementKind::Return(None));

        let local = Statement::new(StatementKind::VariableDeclaration {
            name: Identifier::new("y"),
            ty: TypeRef::INT32,
            initializer: Some(trace(int(4))),
        });
        let local = DropTrace.rewrite_statement(local).unwrap();
        assert_eq!(local.to_string(), "local int32 y");
    }

    /// Empties the body, then gives up
    struct Failing;

    impl BodyPass for Failing {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn rewrite_body(
            &mut self,
            _universe: &TypeUniverse,
            method: MemberRef,
            body: &mut Body,
        ) -> Result<()> {
            body.block = DropTrace.rewrite_block(std::mem::take(&mut body.block));
            Err(InternalError::DanglingMember {
                ty: method.ty.to_string(),
                index: method.index,
            })
        }
    }

    #[test]
    fn test_failed_pass_leaves_body_attached() {
        let mut universe = TypeUniverse::new();
        let module = universe.new_module("App");
        let node = TypeNode::new(TypeKind::Class, Identifier::new("Worker"), module);
        let ty = universe.module_mut(module).map(|m| m.add_type(node)).unwrap();
        let method = Method::new(
            MethodKind::Ordinary,
            MethodFlags::instance(Visibility::Public),
            TypeRef::VOID,
        )
        .with_body(Block::new(vec![
            Statement::expression(trace(int(1))),
            Statement::new(StatementKind::Goto(Identifier::new("done"))),
        ]));
        universe
            .type_node_mut(ty)
            .unwrap()
            .members
            .push(Member::new(Identifier::new("Run"), ty, MemberKind::Method(method)));

        let mut unit = CompilationUnit::new();
        unit.root.types.push(ty);
        let err = rewrite_unit_bodies(&mut Failing, &unit, &mut universe).unwrap_err();

        assert!(matches!(err, InternalError::DanglingMember { .. }));
        let body = universe.method(MemberRef::new(ty, 0)).unwrap().body.as_ref();
        assert_eq!(body.unwrap().block.to_string(), "{ goto done; }");
    }
}
