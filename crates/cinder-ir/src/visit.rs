//! Read-only traversal of method bodies

use crate::code::{Block, Expression, ExpressionKind, MemberBinding, MethodCall, Statement, StatementKind};

pub trait Visitor: Sized {
    fn visit_block(&mut self, block: &Block) {
        walk_block(self, block)
    }

    fn visit_statement(&mut self, statement: &Statement) {
        walk_statement(self, statement)
    }

    fn visit_expression(&mut self, expression: &Expression) {
        walk_expression(self, expression)
    }

    fn visit_member_binding(&mut self, binding: &MemberBinding) {
        walk_member_binding(self, binding)
    }

    fn visit_method_call(&mut self, call: &MethodCall) {
        walk_method_call(self, call)
    }
}

pub fn walk_block(visitor: &mut impl Visitor, block: &Block) {
    for statement in &block.statements {
        visitor.visit_statement(statement);
    }
}

pub fn walk_statement(visitor: &mut impl Visitor, statement: &Statement) {
    match &statement.kind {
        StatementKind::Assignment(assignment) => {
            visitor.visit_expression(&assignment.target);
            visitor.visit_expression(&assignment.source);
        }
        StatementKind::AttachEvent { event, handler }
        | StatementKind::RemoveEvent { event, handler } => {
            visitor.visit_expression(event);
            visitor.visit_expression(handler);
        }
        StatementKind::If {
            condition,
            then_block,
            else_block,
        } => {
            visitor.visit_expression(condition);
            visitor.visit_block(then_block);
            visitor.visit_block(else_block);
        }
        StatementKind::Expression(expression) => visitor.visit_expression(expression),
        StatementKind::Labeled { statement, .. } => {
            if let Some(inner) = statement {
                visitor.visit_statement(inner);
            }
        }
        StatementKind::For {
            init,
            test,
            increment,
            body,
        } => {
            for statement in init {
                visitor.visit_statement(statement);
            }
            if let Some(test) = test {
                visitor.visit_expression(test);
            }
            for statement in increment {
                visitor.visit_statement(statement);
            }
            visitor.visit_block(body);
        }
        StatementKind::Return(value) | StatementKind::Throw(value) => {
            if let Some(value) = value {
                visitor.visit_expression(value);
            }
        }
        StatementKind::Try {
            block,
            catchers,
            finally,
        } => {
            visitor.visit_block(block);
            for catcher in catchers {
                visitor.visit_block(&catcher.block);
            }
            if let Some(finally) = finally {
                visitor.visit_block(finally);
            }
        }
        StatementKind::VariableDeclaration { initializer, .. } => {
            if let Some(initializer) = initializer {
                visitor.visit_expression(initializer);
            }
        }
        StatementKind::Block(block) => visitor.visit_block(block),
        StatementKind::Goto(_) | StatementKind::Snippet => {}
    }
}

pub fn walk_expression(visitor: &mut impl Visitor, expression: &Expression) {
    match &expression.kind {
        ExpressionKind::Qualified { qualifier, .. } => visitor.visit_expression(qualifier),
        ExpressionKind::Binary { left, right, .. } => {
            visitor.visit_expression(left);
            visitor.visit_expression(right);
        }
        ExpressionKind::Assignment(statement) => visitor.visit_statement(statement),
        ExpressionKind::Cast { operand, .. } | ExpressionKind::AddressOf(operand) => {
            visitor.visit_expression(operand)
        }
        ExpressionKind::Indexer { object, operands } => {
            visitor.visit_expression(object);
            for operand in operands {
                visitor.visit_expression(operand);
            }
        }
        ExpressionKind::ConstructArray {
            size, initializers, ..
        } => {
            visitor.visit_expression(size);
            for initializer in initializers {
                visitor.visit_expression(initializer);
            }
        }
        ExpressionKind::Construct { operands, .. } => {
            for operand in operands {
                visitor.visit_expression(operand);
            }
        }
        ExpressionKind::ConstructDelegate { target, .. } => visitor.visit_expression(target),
        ExpressionKind::MethodCall(call) => visitor.visit_method_call(call),
        ExpressionKind::MemberBinding(binding) => visitor.visit_member_binding(binding),
        ExpressionKind::Block(block) => visitor.visit_block(block),
        ExpressionKind::Literal(_)
        | ExpressionKind::Identifier(_)
        | ExpressionKind::This
        | ExpressionKind::Base
        | ExpressionKind::SetterValue
        | ExpressionKind::TypeExpression(_)
        | ExpressionKind::TypeOf(_)
        | ExpressionKind::Snippet
        | ExpressionKind::Local(_)
        | ExpressionKind::Missing => {}
    }
}

pub fn walk_member_binding(visitor: &mut impl Visitor, binding: &MemberBinding) {
    if let Some(target) = &binding.target {
        visitor.visit_expression(target);
    }
}

pub fn walk_method_call(visitor: &mut impl Visitor, call: &MethodCall) {
    visitor.visit_expression(&call.callee);
    for argument in &call.arguments {
        visitor.visit_expression(argument);
    }
}
