//! Statements and expressions
//!
//! Both are closed enums wrapped in a small struct carrying the optional
//! source context (and, for expressions, the static type when known).

use crate::ident::Identifier;
use crate::module::MemberRef;
use crate::types::{PrimitiveType, TypeRef};
use cinder_error::SourceContext;
use std::fmt;

crate::simple_index! {
    /// A compiler-introduced temporary, numbered per method body
    pub struct LocalId;
}

/// Fixed-point decimal value: `mantissa / 10^scale`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Decimal {
    pub mantissa: i64,
    pub scale: u8,
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.mantissa.unsigned_abs().to_string();
        let sign = if self.mantissa < 0 { "-" } else { "" };
        let scale = self.scale as usize;
        if scale == 0 {
            return write!(f, "{}{}m", sign, digits);
        }
        let padded = format!("{:0>width$}", digits, width = scale + 1);
        let (whole, frac) = padded.split_at(padded.len() - scale);
        write!(f, "{}{}.{}m", sign, whole, frac)
    }
}

/// Constant value of a literal expression
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Null,
    Boolean(bool),
    Char(char),
    Int8(i8),
    UInt8(u8),
    Int16(i16),
    UInt16(u16),
    Int32(i32),
    UInt32(u32),
    Int64(i64),
    UInt64(u64),
    Single(f32),
    Double(f64),
    Decimal(Decimal),
    String(String),
    /// Ticks since the runtime's epoch
    DateTime(i64),
    DbNull,
}

impl Literal {
    /// Static type of the constant; `null` is typed as object
    pub fn primitive_type(&self) -> PrimitiveType {
        match self {
            Literal::Null => PrimitiveType::Object,
            Literal::Boolean(_) => PrimitiveType::Boolean,
            Literal::Char(_) => PrimitiveType::Char,
            Literal::Int8(_) => PrimitiveType::Int8,
            Literal::UInt8(_) => PrimitiveType::UInt8,
            Literal::Int16(_) => PrimitiveType::Int16,
            Literal::UInt16(_) => PrimitiveType::UInt16,
            Literal::Int32(_) => PrimitiveType::Int32,
            Literal::UInt32(_) => PrimitiveType::UInt32,
            Literal::Int64(_) => PrimitiveType::Int64,
            Literal::UInt64(_) => PrimitiveType::UInt64,
            Literal::Single(_) => PrimitiveType::Single,
            Literal::Double(_) => PrimitiveType::Double,
            Literal::Decimal(_) => PrimitiveType::Decimal,
            Literal::String(_) => PrimitiveType::String,
            Literal::DateTime(_) => PrimitiveType::DateTime,
            Literal::DbNull => PrimitiveType::DbNull,
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Null => write!(f, "null"),
            Literal::Boolean(v) => write!(f, "{}", v),
            Literal::Char(c) => write!(f, "'{}'", c.escape_default()),
            Literal::Int8(v) => write!(f, "{}", v),
            Literal::UInt8(v) => write!(f, "{}", v),
            Literal::Int16(v) => write!(f, "{}", v),
            Literal::UInt16(v) => write!(f, "{}", v),
            Literal::Int32(v) => write!(f, "{}", v),
            Literal::UInt32(v) => write!(f, "{}u", v),
            Literal::Int64(v) => write!(f, "{}L", v),
            Literal::UInt64(v) => write!(f, "{}UL", v),
            Literal::Single(v) => write!(f, "{}f", v),
            Literal::Double(v) => write!(f, "{:?}", v),
            Literal::Decimal(d) => write!(f, "{}", d),
            Literal::String(s) => write!(f, "\"{}\"", s.escape_default()),
            Literal::DateTime(ticks) => write!(f, "datetime({})", ticks),
            Literal::DbNull => write!(f, "dbnull"),
        }
    }
}

/// Binary operators (assignment is not one of them)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    And,
    Or,
    LogicalAnd,
    LogicalOr,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::And => "&",
            BinaryOp::Or => "|",
            BinaryOp::LogicalAnd => "&&",
            BinaryOp::LogicalOr => "||",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
        };
        write!(f, "{}", s)
    }
}

/// A call; the callee is bound to a method once resolution has run
#[derive(Debug, Clone, PartialEq)]
pub struct MethodCall {
    pub callee: Box<Expression>,
    pub arguments: Vec<Expression>,
}

/// Reference to a resolved field, property, event or method
#[derive(Debug, Clone, PartialEq)]
pub struct MemberBinding {
    /// Receiver; absent for static members
    pub target: Option<Box<Expression>>,
    pub member: MemberRef,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    pub kind: ExpressionKind,
    /// Static type, when known
    pub ty: Option<TypeRef>,
    pub source: Option<SourceContext>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExpressionKind {
    Literal(Literal),
    Identifier(Identifier),
    /// `qualifier.name`
    Qualified {
        qualifier: Box<Expression>,
        name: Identifier,
    },
    This,
    Base,
    /// The implicit `value` of a property setter
    SetterValue,
    Binary {
        op: BinaryOp,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    /// Assignment used as an expression
    Assignment(Box<Statement>),
    Cast {
        operand: Box<Expression>,
        target: TypeRef,
    },
    Indexer {
        object: Box<Expression>,
        operands: Vec<Expression>,
    },
    ConstructArray {
        element_type: TypeRef,
        size: Box<Expression>,
        initializers: Vec<Expression>,
    },
    Construct {
        constructor: TypeRef,
        operands: Vec<Expression>,
    },
    ConstructDelegate {
        delegate_type: TypeRef,
        target: Box<Expression>,
        method_name: Identifier,
    },
    MethodCall(MethodCall),
    MemberBinding(MemberBinding),
    TypeExpression(TypeRef),
    TypeOf(TypeRef),
    AddressOf(Box<Expression>),
    /// Verbatim source; the text lives in the source context's document
    Snippet,
    /// Statements followed by the value of the last expression statement
    Block(Block),
    Local(LocalId),
    /// Stands in for a required child the translator could not read
    Missing,
}

impl Expression {
    pub fn new(kind: ExpressionKind) -> Self {
        Self {
            kind,
            ty: None,
            source: None,
        }
    }

    pub fn with_type(mut self, ty: TypeRef) -> Self {
        self.ty = Some(ty);
        self
    }

    pub fn with_source(mut self, source: Option<SourceContext>) -> Self {
        self.source = source;
        self
    }

    /// A literal typed by its primitive kind
    pub fn literal(literal: Literal) -> Self {
        let ty = TypeRef::Primitive(literal.primitive_type());
        Self::new(ExpressionKind::Literal(literal)).with_type(ty)
    }

    pub fn identifier(name: Identifier) -> Self {
        Self::new(ExpressionKind::Identifier(name))
    }

    pub fn missing() -> Self {
        Self::new(ExpressionKind::Missing)
    }

    pub fn qualified(qualifier: Expression, name: Identifier) -> Self {
        Self::new(ExpressionKind::Qualified {
            qualifier: Box::new(qualifier),
            name,
        })
    }

    pub fn call(callee: Expression, arguments: Vec<Expression>) -> Self {
        Self::new(ExpressionKind::MethodCall(MethodCall {
            callee: Box::new(callee),
            arguments,
        }))
    }

    pub fn member(target: Option<Expression>, member: MemberRef) -> Self {
        Self::new(ExpressionKind::MemberBinding(MemberBinding {
            target: target.map(Box::new),
            member,
        }))
    }

    pub fn local(id: LocalId, ty: TypeRef) -> Self {
        Self::new(ExpressionKind::Local(id)).with_type(ty)
    }

    pub fn as_literal(&self) -> Option<&Literal> {
        match &self.kind {
            ExpressionKind::Literal(lit) => Some(lit),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Block {
    pub statements: Vec<Statement>,
    pub source: Option<SourceContext>,
}

impl Block {
    pub fn new(statements: Vec<Statement>) -> Self {
        Self {
            statements,
            source: None,
        }
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub target: Expression,
    pub source: Expression,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Catch {
    /// Caught exception type; absent catches everything
    pub ty: Option<TypeRef>,
    pub variable: Identifier,
    pub block: Block,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub kind: StatementKind,
    pub source: Option<SourceContext>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StatementKind {
    Assignment(Assignment),
    AttachEvent {
        event: Expression,
        handler: Expression,
    },
    RemoveEvent {
        event: Expression,
        handler: Expression,
    },
    If {
        condition: Expression,
        then_block: Block,
        else_block: Block,
    },
    Expression(Expression),
    Goto(Identifier),
    Labeled {
        label: Identifier,
        statement: Option<Box<Statement>>,
    },
    For {
        init: Vec<Statement>,
        test: Option<Expression>,
        increment: Vec<Statement>,
        body: Block,
    },
    Return(Option<Expression>),
    Throw(Option<Expression>),
    Try {
        block: Block,
        catchers: Vec<Catch>,
        finally: Option<Block>,
    },
    VariableDeclaration {
        name: Identifier,
        ty: TypeRef,
        initializer: Option<Expression>,
    },
    /// Verbatim source; the text lives in the source context's document
    Snippet,
    Block(Block),
}

impl Statement {
    pub fn new(kind: StatementKind) -> Self {
        Self { kind, source: None }
    }

    pub fn with_source(mut self, source: Option<SourceContext>) -> Self {
        self.source = source;
        self
    }

    pub fn expression(expression: Expression) -> Self {
        Self::new(StatementKind::Expression(expression))
    }

    pub fn assignment(target: Expression, source: Expression) -> Self {
        Self::new(StatementKind::Assignment(Assignment { target, source }))
    }
}

// ============================================================================
// Printing
// ============================================================================

fn write_list<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ExpressionKind::Literal(lit) => write!(f, "{}", lit),
            ExpressionKind::Identifier(name) => write!(f, "{}", name),
            ExpressionKind::Qualified { qualifier, name } => {
                write!(f, "({}).{}", qualifier, name)
            }
            ExpressionKind::This => write!(f, "this"),
            ExpressionKind::Base => write!(f, "base"),
            ExpressionKind::SetterValue => write!(f, "value"),
            ExpressionKind::Binary { op, left, right } => {
                write!(f, "({} {} {})", left, op, right)
            }
            ExpressionKind::Assignment(statement) => write!(f, "({})", statement),
            ExpressionKind::Cast { operand, target } => write!(f, "(({}) {})", target, operand),
            ExpressionKind::Indexer { object, operands } => {
                write!(f, "{}[", object)?;
                write_list(f, operands)?;
                write!(f, "]")
            }
            ExpressionKind::ConstructArray {
                element_type,
                size,
                initializers,
            } => {
                write!(f, "new {}[{}] {{", element_type, size)?;
                write_list(f, initializers)?;
                write!(f, "}}")
            }
            ExpressionKind::Construct {
                constructor,
                operands,
            } => {
                write!(f, "new {}(", constructor)?;
                write_list(f, operands)?;
                write!(f, ")")
            }
            ExpressionKind::ConstructDelegate {
                delegate_type,
                target,
                method_name,
            } => write!(f, "new {}({}.{})", delegate_type, target, method_name),
            ExpressionKind::MethodCall(call) => {
                write!(f, "{}(", call.callee)?;
                write_list(f, &call.arguments)?;
                write!(f, ")")
            }
            ExpressionKind::MemberBinding(binding) => match &binding.target {
                Some(target) => write!(f, "{}.<{}>", target, binding.member),
                None => write!(f, "<{}>", binding.member),
            },
            ExpressionKind::TypeExpression(ty) => write!(f, "{}", ty),
            ExpressionKind::TypeOf(ty) => write!(f, "typeof({})", ty),
            ExpressionKind::AddressOf(operand) => write!(f, "&{}", operand),
            ExpressionKind::Snippet => match &self.source {
                Some(source) => write!(f, "snippet({:?})", source.text()),
                None => write!(f, "snippet"),
            },
            ExpressionKind::Block(block) => write!(f, "{}", block),
            ExpressionKind::Local(id) => write!(f, "$t{}", id),
            ExpressionKind::Missing => write!(f, "<missing>"),
        }
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            StatementKind::Assignment(a) => write!(f, "{} = {}", a.target, a.source),
            StatementKind::AttachEvent { event, handler } => write!(f, "{} += {}", event, handler),
            StatementKind::RemoveEvent { event, handler } => write!(f, "{} -= {}", event, handler),
            StatementKind::If {
                condition,
                then_block,
                else_block,
            } => write!(f, "if {} {} else {}", condition, then_block, else_block),
            StatementKind::Expression(e) => write!(f, "{}", e),
            StatementKind::Goto(label) => write!(f, "goto {}", label),
            StatementKind::Labeled { label, statement } => match statement {
                Some(s) => write!(f, "{}: {}", label, s),
                None => write!(f, "{}:", label),
            },
            StatementKind::For {
                init,
                test,
                increment,
                body,
            } => {
                write!(f, "for (")?;
                write_list(f, init)?;
                write!(f, "; ")?;
                if let Some(test) = test {
                    write!(f, "{}", test)?;
                }
                write!(f, "; ")?;
                write_list(f, increment)?;
                write!(f, ") {}", body)
            }
            StatementKind::Return(Some(e)) => write!(f, "return {}", e),
            StatementKind::Return(None) => write!(f, "return"),
            StatementKind::Throw(Some(e)) => write!(f, "throw {}", e),
            StatementKind::Throw(None) => write!(f, "throw"),
            StatementKind::Try {
                block,
                catchers,
                finally,
            } => {
                write!(f, "try {}", block)?;
                for catcher in catchers {
                    match &catcher.ty {
                        Some(ty) => write!(f, " catch ({} {})", ty, catcher.variable)?,
                        None => write!(f, " catch")?,
                    }
                    write!(f, " {}", catcher.block)?;
                }
                if let Some(finally) = finally {
                    write!(f, " finally {}", finally)?;
                }
                Ok(())
            }
            StatementKind::VariableDeclaration {
                name,
                ty,
                initializer,
            } => match initializer {
                Some(init) => write!(f, "local {} {} = {}", ty, name, init),
                None => write!(f, "local {} {}", ty, name),
            },
            StatementKind::Snippet => match &self.source {
                Some(source) => write!(f, "snippet({:?})", source.text()),
                None => write!(f, "snippet"),
            },
            StatementKind::Block(block) => write!(f, "{}", block),
        }
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{ ")?;
        for statement in &self.statements {
            write!(f, "{}; ", statement)?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_types() {
        assert_eq!(Literal::Null.primitive_type(), PrimitiveType::Object);
        assert_eq!(Literal::UInt8(7).primitive_type(), PrimitiveType::UInt8);
        let lit = Expression::literal(Literal::String("hi".to_string()));
        assert_eq!(lit.ty, Some(TypeRef::Primitive(PrimitiveType::String)));
    }

    #[test]
    fn test_decimal_display() {
        let d = Decimal {
            mantissa: -1205,
            scale: 2,
        };
        assert_eq!(d.to_string(), "-12.05m");
        let d = Decimal {
            mantissa: 5,
            scale: 3,
        };
        assert_eq!(d.to_string(), "0.005m");
    }

    #[test]
    fn test_statement_display() {
        let target = Expression::qualified(
            Expression::new(ExpressionKind::This),
            Identifier::new("count"),
        );
        let source = Expression::literal(Literal::Int32(3));
        let statement = Statement::assignment(target, source);
        assert_eq!(statement.to_string(), "(this).count = 3");
    }
}
