//! Code tree - the program representation handed over by front-ends
//!
//! Declarations are closed sets. Members, statements and expressions are
//! open: a front-end newer than this crate may produce shapes it does not
//! know, which deserialize as [`Shape::Unrecognized`] instead of failing the
//! whole tree.

use crate::attributes::{MemberAttributes, TypeAttributes};
use cinder_error::SourceContext;
use serde::{Deserialize, Serialize};

/// A node of an open set of shapes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Shape<T> {
    Known(T),
    /// Any other tagged object; `kind` is its tag
    Unrecognized { kind: String },
}

/// Origin of a snippet inside a larger file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeLinePragma {
    pub file_name: String,
    pub line_number: u32,
}

/// Root of a code tree
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CodeCompileUnit {
    #[serde(default)]
    pub namespaces: Vec<CodeNamespace>,
    #[serde(default)]
    pub referenced_assemblies: Vec<String>,
    #[serde(default)]
    pub assembly_custom_attributes: Vec<CodeAttributeDeclaration>,
    /// Preprocessor symbols defined for this unit, when the front-end knows them
    #[serde(default)]
    pub defined_symbols: Option<Vec<String>>,
    /// Present when the whole unit is a verbatim snippet
    #[serde(default)]
    pub snippet: Option<CodeSnippetUnit>,
}

impl CodeCompileUnit {
    /// Parses a unit from its JSON form
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn is_snippet(&self) -> bool {
        self.snippet.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeSnippetUnit {
    pub value: String,
    #[serde(default)]
    pub line_pragma: Option<CodeLinePragma>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CodeNamespace {
    pub name: String,
    #[serde(default)]
    pub imports: Vec<String>,
    #[serde(default)]
    pub types: Vec<CodeTypeDeclaration>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<SourceContext>,
}

/// Reference to a type by dotted name, or to an array of such a type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeTypeReference {
    #[serde(default)]
    pub base_type: String,
    #[serde(default)]
    pub array_element_type: Option<Box<CodeTypeReference>>,
    #[serde(default)]
    pub array_rank: u32,
}

impl CodeTypeReference {
    pub fn new(base_type: impl Into<String>) -> Self {
        Self {
            base_type: base_type.into(),
            array_element_type: None,
            array_rank: 0,
        }
    }

    pub fn array(element: CodeTypeReference, rank: u32) -> Self {
        Self {
            base_type: String::new(),
            array_element_type: Some(Box::new(element)),
            array_rank: rank,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeAttributeDeclaration {
    pub name: String,
    #[serde(default)]
    pub arguments: Vec<CodeAttributeArgument>,
}

/// Attribute argument; a missing or empty name makes it positional
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeAttributeArgument {
    #[serde(default)]
    pub name: Option<String>,
    pub value: CodeExpression,
}

// ============================================================================
// Declarations
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeTypeDeclaration {
    pub name: String,
    pub type_kind: CodeTypeKind,
    #[serde(default)]
    pub type_attributes: TypeAttributes,
    #[serde(default)]
    pub base_types: Vec<CodeTypeReference>,
    #[serde(default)]
    pub members: Vec<CodeTypeMember>,
    #[serde(default)]
    pub custom_attributes: Vec<CodeAttributeDeclaration>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<SourceContext>,
}

impl CodeTypeDeclaration {
    pub fn new(name: impl Into<String>, type_kind: CodeTypeKind) -> Self {
        Self {
            name: name.into(),
            type_kind,
            type_attributes: TypeAttributes::default(),
            base_types: Vec::new(),
            members: Vec::new(),
            custom_attributes: Vec::new(),
            source: None,
        }
    }

    pub fn with_attributes(mut self, attributes: TypeAttributes) -> Self {
        self.type_attributes = attributes;
        self
    }

    pub fn with_base_type(mut self, base: CodeTypeReference) -> Self {
        self.base_types.push(base);
        self
    }

    pub fn with_member(mut self, member: impl Into<CodeTypeMember>) -> Self {
        self.members.push(member.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum CodeTypeKind {
    Class,
    Struct,
    Interface,
    Enum,
    Delegate {
        #[serde(default)]
        parameters: Vec<CodeParameterDeclaration>,
        #[serde(default)]
        return_type: Option<CodeTypeReference>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FieldDirection {
    #[default]
    In,
    Out,
    Ref,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeParameterDeclaration {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: CodeTypeReference,
    #[serde(default)]
    pub direction: FieldDirection,
    #[serde(default)]
    pub custom_attributes: Vec<CodeAttributeDeclaration>,
}

impl CodeParameterDeclaration {
    pub fn new(name: impl Into<String>, ty: CodeTypeReference) -> Self {
        Self {
            name: name.into(),
            ty,
            direction: FieldDirection::In,
            custom_attributes: Vec::new(),
        }
    }
}

// ============================================================================
// Members
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeTypeMember {
    #[serde(flatten)]
    pub shape: Shape<CodeTypeMemberKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<SourceContext>,
}

impl CodeTypeMember {
    pub fn unrecognized(kind: impl Into<String>) -> Self {
        Self {
            shape: Shape::Unrecognized { kind: kind.into() },
            source: None,
        }
    }
}

impl From<CodeTypeMemberKind> for CodeTypeMember {
    fn from(kind: CodeTypeMemberKind) -> Self {
        Self {
            shape: Shape::Known(kind),
            source: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum CodeTypeMemberKind {
    Field(CodeMemberField),
    Method(CodeMemberMethod),
    /// Program entry point; always becomes a public static `Main`
    EntryPoint(CodeMemberMethod),
    Constructor(CodeConstructor),
    Property(CodeMemberProperty),
    Event(CodeMemberEvent),
    Snippet(CodeSnippetTypeMember),
    NestedType(CodeTypeDeclaration),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeMemberField {
    pub name: String,
    #[serde(default)]
    pub attributes: MemberAttributes,
    #[serde(rename = "type")]
    pub ty: CodeTypeReference,
    #[serde(default)]
    pub init_expression: Option<CodeExpression>,
    #[serde(default)]
    pub custom_attributes: Vec<CodeAttributeDeclaration>,
}

impl CodeMemberField {
    pub fn new(name: impl Into<String>, ty: CodeTypeReference) -> Self {
        Self {
            name: name.into(),
            attributes: MemberAttributes::default(),
            ty,
            init_expression: None,
            custom_attributes: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CodeMemberMethod {
    pub name: String,
    #[serde(default)]
    pub attributes: MemberAttributes,
    #[serde(default)]
    pub parameters: Vec<CodeParameterDeclaration>,
    /// Absent means void
    #[serde(default)]
    pub return_type: Option<CodeTypeReference>,
    #[serde(default)]
    pub return_type_custom_attributes: Vec<CodeAttributeDeclaration>,
    #[serde(default)]
    pub statements: Vec<CodeStatement>,
    #[serde(default)]
    pub implementation_types: Vec<CodeTypeReference>,
    #[serde(default)]
    pub private_implementation_type: Option<CodeTypeReference>,
    #[serde(default)]
    pub custom_attributes: Vec<CodeAttributeDeclaration>,
}

impl CodeMemberMethod {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CodeConstructor {
    #[serde(default)]
    pub attributes: MemberAttributes,
    #[serde(default)]
    pub parameters: Vec<CodeParameterDeclaration>,
    #[serde(default)]
    pub statements: Vec<CodeStatement>,
    #[serde(default)]
    pub base_constructor_args: Vec<CodeExpression>,
    #[serde(default)]
    pub chained_constructor_args: Vec<CodeExpression>,
    #[serde(default)]
    pub custom_attributes: Vec<CodeAttributeDeclaration>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeMemberProperty {
    pub name: String,
    #[serde(default)]
    pub attributes: MemberAttributes,
    #[serde(rename = "type")]
    pub ty: CodeTypeReference,
    /// Indexer parameters
    #[serde(default)]
    pub parameters: Vec<CodeParameterDeclaration>,
    #[serde(default)]
    pub has_get: bool,
    #[serde(default)]
    pub has_set: bool,
    #[serde(default)]
    pub get_statements: Vec<CodeStatement>,
    #[serde(default)]
    pub set_statements: Vec<CodeStatement>,
    #[serde(default)]
    pub implementation_types: Vec<CodeTypeReference>,
    #[serde(default)]
    pub private_implementation_type: Option<CodeTypeReference>,
    #[serde(default)]
    pub custom_attributes: Vec<CodeAttributeDeclaration>,
}

impl CodeMemberProperty {
    pub fn new(name: impl Into<String>, ty: CodeTypeReference) -> Self {
        Self {
            name: name.into(),
            attributes: MemberAttributes::default(),
            ty,
            parameters: Vec::new(),
            has_get: false,
            has_set: false,
            get_statements: Vec::new(),
            set_statements: Vec::new(),
            implementation_types: Vec::new(),
            private_implementation_type: None,
            custom_attributes: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeMemberEvent {
    pub name: String,
    #[serde(default)]
    pub attributes: MemberAttributes,
    #[serde(rename = "type")]
    pub ty: CodeTypeReference,
    #[serde(default)]
    pub implementation_types: Vec<CodeTypeReference>,
    #[serde(default)]
    pub private_implementation_type: Option<CodeTypeReference>,
    #[serde(default)]
    pub custom_attributes: Vec<CodeAttributeDeclaration>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeSnippetTypeMember {
    pub text: String,
    #[serde(default)]
    pub line_pragma: Option<CodeLinePragma>,
}

// ============================================================================
// Statements
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeStatement {
    #[serde(flatten)]
    pub shape: Shape<CodeStatementKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<SourceContext>,
}

impl CodeStatement {
    pub fn unrecognized(kind: impl Into<String>) -> Self {
        Self {
            shape: Shape::Unrecognized { kind: kind.into() },
            source: None,
        }
    }

    pub fn expression(expression: CodeExpression) -> Self {
        CodeStatementKind::Expression { expression }.into()
    }
}

impl From<CodeStatementKind> for CodeStatement {
    fn from(kind: CodeStatementKind) -> Self {
        Self {
            shape: Shape::Known(kind),
            source: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum CodeStatementKind {
    Assign {
        left: CodeExpression,
        right: CodeExpression,
    },
    AttachEvent {
        event: CodeExpression,
        listener: CodeExpression,
    },
    RemoveEvent {
        event: CodeExpression,
        listener: CodeExpression,
    },
    Comment {
        #[serde(default)]
        text: String,
    },
    Condition {
        condition: CodeExpression,
        #[serde(default)]
        true_statements: Vec<CodeStatement>,
        #[serde(default)]
        false_statements: Vec<CodeStatement>,
    },
    Expression {
        expression: CodeExpression,
    },
    Goto {
        label: String,
    },
    Iteration {
        #[serde(default)]
        init_statement: Option<Box<CodeStatement>>,
        #[serde(default)]
        test_expression: Option<CodeExpression>,
        #[serde(default)]
        increment_statement: Option<Box<CodeStatement>>,
        #[serde(default)]
        statements: Vec<CodeStatement>,
    },
    Labeled {
        label: String,
        #[serde(default)]
        statement: Option<Box<CodeStatement>>,
    },
    MethodReturn {
        #[serde(default)]
        expression: Option<CodeExpression>,
    },
    Snippet {
        value: String,
        #[serde(default)]
        line_pragma: Option<CodeLinePragma>,
    },
    ThrowException {
        #[serde(default)]
        to_throw: Option<CodeExpression>,
    },
    TryCatchFinally {
        #[serde(default)]
        try_statements: Vec<CodeStatement>,
        #[serde(default)]
        catch_clauses: Vec<CodeCatchClause>,
        #[serde(default)]
        finally_statements: Vec<CodeStatement>,
    },
    VariableDeclaration {
        name: String,
        #[serde(rename = "type")]
        ty: CodeTypeReference,
        #[serde(default)]
        init_expression: Option<CodeExpression>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeCatchClause {
    pub local_name: String,
    /// Absent catches everything
    #[serde(default)]
    pub catch_exception_type: Option<CodeTypeReference>,
    #[serde(default)]
    pub statements: Vec<CodeStatement>,
}

// ============================================================================
// Expressions
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeExpression {
    #[serde(flatten)]
    pub shape: Shape<CodeExpressionKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<SourceContext>,
}

impl CodeExpression {
    pub fn unrecognized(kind: impl Into<String>) -> Self {
        Self {
            shape: Shape::Unrecognized { kind: kind.into() },
            source: None,
        }
    }

    pub fn with_source(mut self, source: SourceContext) -> Self {
        self.source = Some(source);
        self
    }

    pub fn primitive(value: CodePrimitive) -> Self {
        CodeExpressionKind::Primitive { value }.into()
    }

    pub fn variable(name: impl Into<String>) -> Self {
        CodeExpressionKind::VariableReference {
            variable_name: name.into(),
        }
        .into()
    }

    pub fn this() -> Self {
        CodeExpressionKind::ThisReference.into()
    }
}

impl From<CodeExpressionKind> for CodeExpression {
    fn from(kind: CodeExpressionKind) -> Self {
        Self {
            shape: Shape::Known(kind),
            source: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CodeBinaryOperator {
    Add,
    Assign,
    BitwiseAnd,
    BitwiseOr,
    BooleanAnd,
    BooleanOr,
    Divide,
    GreaterThan,
    GreaterThanOrEqual,
    IdentityEquality,
    IdentityInequality,
    LessThan,
    LessThanOrEqual,
    Modulus,
    Multiply,
    Subtract,
    ValueEquality,
}

/// Fixed-point decimal value: `mantissa / 10^scale`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CodeDecimal {
    pub mantissa: i64,
    pub scale: u8,
}

/// Primitive constant carried by a [`CodeExpressionKind::Primitive`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CodePrimitive {
    Null,
    Boolean(bool),
    Char(char),
    SByte(i8),
    Byte(u8),
    Int16(i16),
    UInt16(u16),
    Int32(i32),
    UInt32(u32),
    Int64(i64),
    UInt64(u64),
    Single(f32),
    Double(f64),
    Decimal(CodeDecimal),
    String(String),
    /// Ticks since the epoch of the target runtime
    DateTime(i64),
    DbNull,
}

/// Method named by a call, optionally through a target object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeMethodReference {
    #[serde(default)]
    pub target_object: Option<Box<CodeExpression>>,
    pub method_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum CodeExpressionKind {
    ArgumentReference {
        parameter_name: String,
    },
    ArrayCreate {
        create_type: CodeTypeReference,
        #[serde(default)]
        initializers: Vec<CodeExpression>,
        /// Literal size; ignored when `size_expression` is present
        #[serde(default)]
        size: i32,
        #[serde(default)]
        size_expression: Option<Box<CodeExpression>>,
    },
    ArrayIndexer {
        target_object: Box<CodeExpression>,
        #[serde(default)]
        indices: Vec<CodeExpression>,
    },
    BaseReference,
    BinaryOperator {
        left: Box<CodeExpression>,
        operator: CodeBinaryOperator,
        right: Box<CodeExpression>,
    },
    Cast {
        target_type: CodeTypeReference,
        expression: Box<CodeExpression>,
    },
    DelegateCreate {
        delegate_type: CodeTypeReference,
        target_object: Box<CodeExpression>,
        method_name: String,
    },
    DelegateInvoke {
        target_object: Box<CodeExpression>,
        #[serde(default)]
        parameters: Vec<CodeExpression>,
    },
    Direction {
        direction: FieldDirection,
        expression: Box<CodeExpression>,
    },
    EventReference {
        target_object: Box<CodeExpression>,
        event_name: String,
    },
    FieldReference {
        #[serde(default)]
        target_object: Option<Box<CodeExpression>>,
        field_name: String,
    },
    Indexer {
        target_object: Box<CodeExpression>,
        #[serde(default)]
        indices: Vec<CodeExpression>,
    },
    MethodInvoke {
        method: CodeMethodReference,
        #[serde(default)]
        parameters: Vec<CodeExpression>,
    },
    MethodReference(CodeMethodReference),
    ObjectCreate {
        create_type: CodeTypeReference,
        #[serde(default)]
        parameters: Vec<CodeExpression>,
    },
    Primitive {
        value: CodePrimitive,
    },
    PropertyReference {
        target_object: Box<CodeExpression>,
        property_name: String,
    },
    PropertySetValueReference,
    Snippet {
        value: String,
    },
    ThisReference,
    TypeOf {
        #[serde(rename = "type")]
        ty: CodeTypeReference,
    },
    TypeReference {
        #[serde(rename = "type")]
        ty: CodeTypeReference,
    },
    VariableReference {
        variable_name: String,
    },
}
