//! Bound IR shared by the pass tests

use cinder_ir::{
    Block, Body, CompilationUnit, Expression, ExpressionKind, Field, FieldFlags, Identifier,
    Member, MemberKind, MemberRef, Method, MethodFlags, MethodKind, Parameter, Statement,
    TypeContract, TypeFlags, TypeId, TypeKind, TypeNode, TypeRef, TypeUniverse, Visibility,
};

pub struct Fixture {
    pub universe: TypeUniverse,
    pub unit: CompilationUnit,
    pub guard_type: TypeId,
    /// Guarded class
    pub account: TypeId,
    /// Guarded struct
    pub point: TypeId,
    pub frame: MemberRef,
    pub balance: MemberRef,
    pub total: MemberRef,
    /// Public static, conditional on `DEBUG`
    pub log: MemberRef,
    /// Public instance method whose body the tests fill in
    pub run: MemberRef,
    /// Private instance method whose body the tests fill in
    pub helper: MemberRef,
    pub point_x: MemberRef,
}

fn method(name: &str, owner: TypeId, flags: MethodFlags, ret: TypeRef) -> Member {
    let method = Method::new(MethodKind::Ordinary, flags, ret).with_body(Block::default());
    Member::new(Identifier::new(name), owner, MemberKind::Method(method))
}

fn field(name: &str, owner: TypeId, ty: TypeRef, is_static: bool) -> Member {
    let field = Field {
        ty,
        flags: FieldFlags {
            visibility: Visibility::Private,
            is_static,
            ..FieldFlags::default()
        },
        initializer: None,
        default_value: None,
    };
    Member::new(Identifier::new(name), owner, MemberKind::Field(field))
}

/// Frame field at 0 and frame getter at 1
fn guarded(ty: TypeId, guard: TypeId) -> Vec<Member> {
    let frame = MemberRef::new(ty, 0);
    let mut getter = method(
        "get_Frame",
        ty,
        MethodFlags::instance(Visibility::Public),
        TypeRef::Bound(guard),
    );
    if let MemberKind::Method(m) = &mut getter.kind {
        let read = Expression::member(Some(Expression::new(ExpressionKind::This)), frame);
        m.body = Some(Body::new(Block::new(vec![Statement::new(
            cinder_ir::StatementKind::Return(Some(read)),
        )])));
    }
    vec![field("frame", ty, TypeRef::Bound(guard), false), getter]
}

impl Fixture {
    pub fn new() -> Self {
        let mut universe = TypeUniverse::new();

        let core = universe.new_module("Core");
        let mut guard = TypeNode::new(TypeKind::Class, Identifier::new("Guard"), core);
        guard.namespace = Identifier::new("Microsoft.Contracts");
        guard.flags = TypeFlags::public();
        let guard_type = add_type(&mut universe, guard);
        let public = MethodFlags::instance(Visibility::Public);
        members(&mut universe, guard_type).extend([
            method("CheckIsReading", guard_type, public, TypeRef::VOID),
            method("CheckIsWriting", guard_type, public, TypeRef::VOID),
        ]);

        let app = universe.new_module("App");
        let mut account = TypeNode::new(TypeKind::Class, Identifier::new("Account"), app);
        account.namespace = Identifier::new("Bank");
        account.flags = TypeFlags::public();
        let account = add_type(&mut universe, account);

        let mut log = method(
            "Log",
            account,
            MethodFlags {
                is_static: true,
                ..MethodFlags::instance(Visibility::Public)
            },
            TypeRef::VOID,
        );
        if let MemberKind::Method(m) = &mut log.kind {
            m.flags.has_this = false;
            m.conditional_symbol = Some("DEBUG".to_string());
            m.parameters
                .push(Parameter::new(Identifier::new("message"), TypeRef::INT32));
        }

        let mut body = guarded(account, guard_type);
        body.extend([
            field("balance", account, TypeRef::INT32, false),
            field("total", account, TypeRef::INT32, true),
            log,
            method("Run", account, public, TypeRef::VOID),
            method(
                "Helper",
                account,
                MethodFlags::instance(Visibility::Private),
                TypeRef::VOID,
            ),
        ]);
        *members(&mut universe, account) = body;

        let mut point = TypeNode::new(TypeKind::Struct, Identifier::new("Point"), app);
        point.namespace = Identifier::new("Bank");
        point.flags = TypeFlags::public();
        let point = add_type(&mut universe, point);
        let mut body = guarded(point, guard_type);
        body.push(field("x", point, TypeRef::INT32, false));
        *members(&mut universe, point) = body;

        for ty in [account, point] {
            universe.type_node_mut(ty).unwrap().contract = Some(TypeContract {
                frame_getter: Some(MemberRef::new(ty, 1)),
                frame_field: Some(MemberRef::new(ty, 0)),
            });
        }

        let mut unit = CompilationUnit::new();
        unit.root.types = vec![account, point];

        Self {
            universe,
            unit,
            guard_type,
            account,
            point,
            frame: MemberRef::new(account, 0),
            balance: MemberRef::new(account, 2),
            total: MemberRef::new(account, 3),
            log: MemberRef::new(account, 4),
            run: MemberRef::new(account, 5),
            helper: MemberRef::new(account, 6),
            point_x: MemberRef::new(point, 2),
        }
    }

    pub fn this(&self) -> Expression {
        Expression::new(ExpressionKind::This).with_type(TypeRef::Bound(self.account))
    }

    /// `target.<field>` typed as int
    pub fn read(&self, target: Option<Expression>, field: MemberRef) -> Expression {
        Expression::member(target, field).with_type(TypeRef::INT32)
    }

    pub fn call(&self, method: MemberRef, arguments: Vec<Expression>) -> Expression {
        Expression::call(Expression::member(None, method), arguments)
    }

    pub fn set_body(&mut self, method: MemberRef, statements: Vec<Statement>) {
        self.universe.method_mut(method).unwrap().body = Some(Body::new(Block::new(statements)));
    }

    pub fn body(&self, method: MemberRef) -> &Body {
        self.universe.method(method).unwrap().body.as_ref().unwrap()
    }
}

fn add_type(universe: &mut TypeUniverse, node: TypeNode) -> TypeId {
    let module = node.declaring_module;
    universe.module_mut(module).unwrap().add_type(node)
}

fn members(universe: &mut TypeUniverse, ty: TypeId) -> &mut Vec<Member> {
    &mut universe.type_node_mut(ty).unwrap().members
}
