//! Guard instrumentation
//!
//! Reads and writes of instance fields on guarded types are routed through the
//! object's guard:
//!
//! ```text
//! o.f        =>  { t1 = o; t1.frameGetter().CheckIsReading(); t1.f }
//! o.f = v    =>  { t1 = o; t2 = v; t1.frameGetter().CheckIsWriting(); t1.f = t2 }
//! ```
//!
//! The receiver and the stored value are each evaluated exactly once, in
//! their original order. Static fields, the frame field itself and types
//! without a frame getter are left alone, as are writes into value types.

use crate::well_known::WellKnown;
use cinder_error::{InternalError, Result, SourceContext};
use cinder_ir::rewrite::{walk_assignment, walk_member_binding};
use cinder_ir::{
    Assignment, Block, Body, BodyPass, Expression, ExpressionKind, MemberBinding, MemberKind,
    MemberRef, Rewriter, Statement, StatementKind, TypeId, TypeRef, TypeUniverse,
};
use tracing::trace;

pub struct GuardInstrumentation {
    well_known: WellKnown,
    instrumented: usize,
}

impl GuardInstrumentation {
    pub fn new(well_known: WellKnown) -> Self {
        Self {
            well_known,
            instrumented: 0,
        }
    }

    /// Field accesses rewritten so far
    pub fn instrumented(&self) -> usize {
        self.instrumented
    }
}

impl BodyPass for GuardInstrumentation {
    fn name(&self) -> &'static str {
        "guard-instrumentation"
    }

    fn rewrite_body(
        &mut self,
        universe: &TypeUniverse,
        _method: MemberRef,
        body: &mut Body,
    ) -> Result<()> {
        let block = std::mem::take(&mut body.block);
        let mut rewriter = GuardRewriter {
            universe,
            well_known: &self.well_known,
            body: &mut *body,
            instrumented: 0,
            failure: None,
        };
        let block = rewriter.rewrite_block(block);
        let (instrumented, failure) = (rewriter.instrumented, rewriter.failure);
        body.block = block;
        if let Some(err) = failure {
            return Err(err);
        }
        self.instrumented += instrumented;
        Ok(())
    }
}

/// What the rewrite needs to know about a bound field
struct FieldInfo {
    ty: TypeRef,
    is_static: bool,
    declaring_type: TypeId,
    in_value_type: bool,
    frame_getter: Option<MemberRef>,
    is_frame_field: bool,
}

impl FieldInfo {
    fn guarded_read(&self) -> Option<MemberRef> {
        if self.is_static || self.is_frame_field {
            return None;
        }
        self.frame_getter
    }

    fn guarded_write(&self) -> Option<MemberRef> {
        if self.in_value_type {
            return None;
        }
        self.guarded_read()
    }
}

struct GuardRewriter<'a> {
    universe: &'a TypeUniverse,
    well_known: &'a WellKnown,
    body: &'a mut Body,
    instrumented: usize,
    failure: Option<InternalError>,
}

impl GuardRewriter<'_> {
    /// `None` when the member is not a field
    fn field_info(&mut self, member: MemberRef) -> Option<FieldInfo> {
        match self.lookup_field(member) {
            Ok(info) => info,
            Err(err) => {
                self.failure.get_or_insert(err);
                None
            }
        }
    }

    fn lookup_field(&self, member: MemberRef) -> Result<Option<FieldInfo>> {
        let node = self.universe.member(member)?;
        let MemberKind::Field(field) = &node.kind else {
            return Ok(None);
        };
        let owner = self.universe.type_node(node.declaring_type)?;
        let contract = owner.contract.as_ref();
        Ok(Some(FieldInfo {
            ty: field.ty.clone(),
            is_static: field.flags.is_static,
            declaring_type: node.declaring_type,
            in_value_type: owner.is_value_type(),
            frame_getter: contract.and_then(|c| c.frame_getter),
            is_frame_field: contract.and_then(|c| c.frame_field) == Some(member),
        }))
    }

    /// `t = value`, returning the temporary
    fn spill(&mut self, value: Expression, fallback: TypeRef) -> (Statement, Expression) {
        let ty = value.ty.clone().unwrap_or(fallback);
        let temp = Expression::local(self.body.new_temp(), ty);
        (Statement::assignment(temp.clone(), value), temp)
    }

    fn instrument_read(
        &mut self,
        target: Expression,
        member: MemberRef,
        info: FieldInfo,
        frame_getter: MemberRef,
        ty: Option<TypeRef>,
        source: Option<SourceContext>,
    ) -> Option<Expression> {
        let target = self.rewrite_expression(target)?;
        let (store, temp) = self.spill(target, TypeRef::Bound(info.declaring_type));
        let check = self.check(temp.clone(), frame_getter, self.well_known.check_is_reading);
        let read = Expression::member(Some(temp), member).with_type(ty.clone().unwrap_or(info.ty));
        trace!(field = %member, "guarded field read");
        self.instrumented += 1;

        let block = Block::new(vec![store, check, Statement::expression(read)]);
        Some(Expression {
            kind: ExpressionKind::Block(block),
            ty,
            source,
        })
    }

    /// `temp.frameGetter().check()`
    fn check(&self, temp: Expression, frame_getter: MemberRef, check: MemberRef) -> Statement {
        let guard = Expression::call(Expression::member(Some(temp), frame_getter), Vec::new());
        Statement::expression(Expression::call(
            Expression::member(Some(guard), check),
            Vec::new(),
        ))
    }
}

impl Rewriter for GuardRewriter<'_> {
    fn rewrite_member_binding(
        &mut self,
        binding: MemberBinding,
        ty: Option<TypeRef>,
        source: Option<SourceContext>,
    ) -> Option<Expression> {
        let member = binding.member;
        let info = self.field_info(member);
        let frame_getter = info.as_ref().and_then(FieldInfo::guarded_read);
        match (info, frame_getter, binding.target) {
            (Some(info), Some(frame_getter), Some(target)) => {
                self.instrument_read(*target, member, info, frame_getter, ty, source)
            }
            (_, _, target) => {
                walk_member_binding(self, MemberBinding { target, member }, ty, source)
            }
        }
    }

    fn rewrite_assignment(
        &mut self,
        assignment: Assignment,
        source: Option<SourceContext>,
    ) -> Option<Statement> {
        let value = assignment.source;
        let (binding, ty, target_source) = match assignment.target {
            Expression {
                kind: ExpressionKind::MemberBinding(binding),
                ty,
                source: target_source,
            } => (binding, ty, target_source),
            target => return walk_assignment(self, Assignment { target, source: value }, source),
        };
        let member = binding.member;
        let Some(info) = self.field_info(member) else {
            let target = Expression {
                kind: ExpressionKind::MemberBinding(binding),
                ty,
                source: target_source,
            };
            return walk_assignment(self, Assignment { target, source: value }, source);
        };

        // The field itself is not read, only its receiver
        let object = match binding.target {
            Some(object) => Some(self.rewrite_expression(*object)?),
            None => None,
        };
        let value = self.rewrite_expression(value)?;

        let (object, frame_getter) = match (object, info.guarded_write()) {
            (Some(object), Some(frame_getter)) => (object, frame_getter),
            (object, _) => {
                let target = Expression {
                    kind: ExpressionKind::MemberBinding(MemberBinding {
                        target: object.map(Box::new),
                        member,
                    }),
                    ty,
                    source: target_source,
                };
                return Some(Statement::assignment(target, value).with_source(source));
            }
        };

        let (store_object, object_temp) = self.spill(object, TypeRef::Bound(info.declaring_type));
        let (store_value, value_temp) = self.spill(value, info.ty.clone());
        let check = self.check(
            object_temp.clone(),
            frame_getter,
            self.well_known.check_is_writing,
        );
        let mut field = Expression::member(Some(object_temp), member);
        field.ty = ty.or(Some(info.ty));
        field.source = target_source;
        trace!(field = %member, "guarded field write");
        self.instrumented += 1;

        let block = Block::new(vec![
            store_object,
            store_value,
            check,
            Statement::assignment(field, value_temp),
        ]);
        Some(Statement::new(StatementKind::Block(block)).with_source(source))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::Fixture;
    use cinder_ir::{rewrite_unit_bodies, Identifier, Literal};
    use pretty_assertions::assert_eq;

    fn instrument(fixture: &mut Fixture) -> usize {
        let well_known = WellKnown::from_universe(&fixture.universe).unwrap();
        let mut pass = GuardInstrumentation::new(well_known);
        rewrite_unit_bodies(&mut pass, &fixture.unit, &mut fixture.universe).unwrap();
        pass.instrumented()
    }

    /// A receiver with a visible side effect
    fn next_account(fixture: &Fixture) -> Expression {
        let callee = Expression::identifier(Identifier::new("NextAccount"));
        Expression::call(callee, Vec::new()).with_type(TypeRef::Bound(fixture.account))
    }

    #[test]
    fn test_read_is_guarded() {
        let mut fixture = Fixture::new();
        let read = fixture.read(Some(fixture.this()), fixture.balance);
        fixture.set_body(fixture.run, vec![Statement::new(StatementKind::Return(Some(read)))]);

        assert_eq!(instrument(&mut fixture), 1);
        let run = &fixture.body(fixture.run).block;
        assert_eq!(
            run.to_string(),
            "{ return { $t0 = this; $t0.<1:0#1>().<0:0#0>(); $t0.<1:0#2>; }; }"
        );
        assert_eq!(fixture.body(fixture.run).temp_count(), 1);
    }

    #[test]
    fn test_read_target_is_evaluated_once() {
        let mut fixture = Fixture::new();
        let read = fixture.read(Some(next_account(&fixture)), fixture.balance);
        fixture.set_body(fixture.run, vec![Statement::expression(read)]);
        instrument(&mut fixture);

        let printed = fixture.body(fixture.run).block.to_string();
        assert_eq!(printed.matches("NextAccount()").count(), 1);
        assert!(printed.starts_with("{ { $t0 = NextAccount();"));
    }

    #[test]
    fn test_nested_reads_are_instrumented_inside_out() {
        let mut fixture = Fixture::new();
        let inner = fixture.read(Some(fixture.this()), fixture.balance);
        let outer = fixture.read(Some(inner), fixture.balance);
        fixture.set_body(fixture.run, vec![Statement::expression(outer)]);

        assert_eq!(instrument(&mut fixture), 2);
        let body = fixture.body(fixture.run);
        assert_eq!(body.temp_count(), 2);
        match &body.block.statements[0].kind {
            StatementKind::Expression(Expression {
                kind: ExpressionKind::Block(block),
                ty,
                ..
            }) => {
                assert_eq!(ty, &Some(TypeRef::INT32));
                assert_eq!(block.statements.len(), 3);
                assert!(block.statements[0].to_string().starts_with("$t1 = { $t0 = this;"));
            }
            other => panic!("expected a guarded read, got {:?}", other),
        }
    }

    #[test]
    fn test_write_is_guarded() {
        let mut fixture = Fixture::new();
        let target = Expression::member(Some(next_account(&fixture)), fixture.balance);
        let value = Expression::literal(Literal::Int32(10));
        fixture.set_body(fixture.run, vec![Statement::assignment(target, value)]);

        assert_eq!(instrument(&mut fixture), 1);
        assert_eq!(
            fixture.body(fixture.run).block.to_string(),
            "{ { $t0 = NextAccount(); $t1 = 10; $t0.<1:0#1>().<0:0#1>(); $t0.<1:0#2> = $t1; }; }"
        );
    }

    #[test]
    fn test_write_source_reads_are_guarded_first() {
        let mut fixture = Fixture::new();
        let target = Expression::member(Some(fixture.this()), fixture.balance);
        let value = fixture.read(Some(fixture.this()), fixture.balance);
        fixture.set_body(fixture.run, vec![Statement::assignment(target, value)]);

        assert_eq!(instrument(&mut fixture), 2);
        let printed = fixture.body(fixture.run).block.to_string();
        assert!(printed.contains("$t1 = this; $t2 = { $t0 = this; $t0.<1:0#1>().<0:0#0>(); $t0.<1:0#2>; };"));
        assert!(printed.contains("$t1.<1:0#1>().<0:0#1>(); $t1.<1:0#2> = $t2;"));
    }

    #[test]
    fn test_exempt_accesses_are_unchanged() {
        let mut fixture = Fixture::new();
        let point = Expression::identifier(Identifier::new("p"))
            .with_type(TypeRef::Bound(fixture.point));
        let statements = vec![
            Statement::expression(fixture.read(None, fixture.total)),
            Statement::expression(Expression::member(Some(fixture.this()), fixture.frame)),
            Statement::assignment(
                Expression::member(Some(point), fixture.point_x),
                Expression::literal(Literal::Int32(1)),
            ),
            Statement::assignment(
                fixture.read(None, fixture.total),
                Expression::literal(Literal::Int32(2)),
            ),
        ];
        fixture.set_body(fixture.run, statements.clone());

        assert_eq!(instrument(&mut fixture), 0);
        assert_eq!(fixture.body(fixture.run).block.statements, statements);
    }

    #[test]
    fn test_value_type_reads_are_still_guarded() {
        let mut fixture = Fixture::new();
        let point = Expression::identifier(Identifier::new("p"))
            .with_type(TypeRef::Bound(fixture.point));
        let read = fixture.read(Some(point), fixture.point_x);
        fixture.set_body(fixture.run, vec![Statement::expression(read)]);
        assert_eq!(instrument(&mut fixture), 1);
    }

    #[test]
    fn test_dangling_binding_fails_the_unit() {
        let mut fixture = Fixture::new();
        let missing = MemberRef::new(fixture.account, 42);
        let read = fixture.read(Some(fixture.this()), missing);
        fixture.set_body(fixture.run, vec![Statement::expression(read)]);

        let well_known = WellKnown::from_universe(&fixture.universe).unwrap();
        let mut pass = GuardInstrumentation::new(well_known);
        let err = rewrite_unit_bodies(&mut pass, &fixture.unit, &mut fixture.universe)
            .unwrap_err();
        assert!(matches!(err, InternalError::DanglingMember { index: 42, .. }));
    }
}
