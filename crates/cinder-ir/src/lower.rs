//! Lowering code tree → IR
//!
//! Walks a [`CodeCompileUnit`] and enters its declarations into the module
//! under construction. Shapes the translator does not recognize are reported
//! to the error sink and translate to nothing, so their siblings still
//! translate. Where the parent needs the child, it gets a
//! [`ExpressionKind::Missing`] hole in its place and survives.

use crate::code::{
    BinaryOp, Block, Catch, Decimal, Expression, ExpressionKind, Literal, Statement, StatementKind,
};
use crate::flags::{
    Dispatch, FieldFlags, Layout, MethodFlags, StringFormat, TypeFlags, TypeVisibility, Visibility,
};
use crate::ident::{standard, Identifier, Interner};
use crate::member::{
    Body, Event, Field, Member, MemberKind, Method, MethodKind, Parameter, Property,
};
use crate::module::{AssemblyReference, CompilationUnit, MemberRef, Module, Namespace, TypeId};
use crate::types::{Attribute, AttributeArgument, TypeKind, TypeNode, TypeRef};
use cinder_codetree::{
    CodeAttributeDeclaration, CodeBinaryOperator, CodeCatchClause, CodeCompileUnit,
    CodeConstructor, CodeExpression, CodeExpressionKind, CodeLinePragma, CodeMemberEvent,
    CodeMemberField, CodeMemberMethod, CodeMemberProperty, CodeMethodReference, CodeNamespace,
    CodeParameterDeclaration, CodePrimitive, CodeStatement, CodeStatementKind, CodeTypeDeclaration,
    CodeTypeKind, CodeTypeMember, CodeTypeMemberKind, CodeTypeReference, FieldDirection,
    MemberAttributes, Shape, TypeAttributes,
};
use cinder_error::{
    Diagnostic, Document, DocumentFactory, ErrorKind, ErrorSink, ResolveError, SourceContext,
};
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Turns assembly names into references
pub trait ReferenceResolver {
    /// `already_seen` holds the identity keys the module already references
    fn resolve(
        &mut self,
        name: &str,
        already_seen: &HashSet<String>,
    ) -> Result<AssemblyReference, ResolveError>;
}

/// Attribute names that make calls to a method conditional on a symbol
const CONDITIONAL_ATTRIBUTES: [&str; 4] = [
    "Conditional",
    "ConditionalAttribute",
    "System.Diagnostics.Conditional",
    "System.Diagnostics.ConditionalAttribute",
];

/// Translates a code tree, entering its types into `module`
pub fn translate(
    unit: &CodeCompileUnit,
    module: &mut Module,
    resolver: &mut dyn ReferenceResolver,
    documents: &dyn DocumentFactory,
    errors: &mut ErrorSink,
) -> CompilationUnit {
    Translator::new(module, resolver, documents, errors).translate_unit(unit)
}

/// Translation state for one compilation unit
pub struct Translator<'a> {
    module: &'a mut Module,
    resolver: &'a mut dyn ReferenceResolver,
    documents: &'a dyn DocumentFactory,
    errors: &'a mut ErrorSink,
    names: Interner,
}

impl<'a> Translator<'a> {
    pub fn new(
        module: &'a mut Module,
        resolver: &'a mut dyn ReferenceResolver,
        documents: &'a dyn DocumentFactory,
        errors: &'a mut ErrorSink,
    ) -> Self {
        Self {
            module,
            resolver,
            documents,
            errors,
            names: Interner::new(),
        }
    }

    pub fn translate_unit(mut self, unit: &CodeCompileUnit) -> CompilationUnit {
        let errors_before = self.errors.len();

        let attributes = self.translate_attributes(&unit.assembly_custom_attributes);
        self.module.attributes.extend(attributes);
        self.add_references(&unit.referenced_assemblies);

        let mut result = CompilationUnit::new();
        for namespace in &unit.namespaces {
            let namespace = self.translate_namespace(namespace);
            result.root.namespaces.push(namespace);
        }
        result.defined_symbols = unit
            .defined_symbols
            .as_ref()
            .map(|symbols| symbols.iter().cloned().collect::<BTreeSet<_>>());

        if let Some(snippet) = &unit.snippet {
            let document = match &snippet.line_pragma {
                Some(pragma) => {
                    result.name = Some(self.names.intern(&pragma.file_name));
                    self.documents.create(
                        Some(pragma.file_name.as_str()),
                        pragma.line_number,
                        &snippet.value,
                    )
                }
                None => {
                    let module_name = self.module.name.as_str();
                    self.documents.create(Some(module_name), 1, &snippet.value)
                }
            };
            let source = SourceContext::whole(document);
            result.root.source = Some(source.clone());
            result.source = Some(source);
            result.is_snippet = true;
        }

        debug!(
            module = %self.module.name,
            types = self.module.types.len(),
            errors = self.errors.len() - errors_before,
            "translated compilation unit"
        );
        result
    }

    fn add_references(&mut self, names: &[String]) {
        let mut seen: HashSet<String> = self
            .module
            .assembly_references
            .iter()
            .map(|r| r.identity_key.clone())
            .collect();

        for name in names {
            match self.resolver.resolve(name, &seen) {
                Ok(reference) => {
                    if seen.insert(reference.identity_key.clone()) {
                        self.module.assembly_references.push(reference);
                    } else {
                        trace!(assembly = %name, "reference already present");
                    }
                }
                Err(err) => {
                    warn!(assembly = %name, error = %err, "could not resolve assembly reference");
                    self.errors.push(
                        Diagnostic::error(ErrorKind::ReferenceResolution, name.as_str())
                            .with_note(err.to_string()),
                    );
                }
            }
        }
    }

    fn did_not_expect(&mut self, kind: &str, source: &Option<SourceContext>) {
        trace!(kind, "unrecognized code tree shape");
        self.errors
            .report(ErrorKind::StructuralTranslation, kind, source.clone());
    }

    fn snippet_document(&self, pragma: &Option<CodeLinePragma>, text: &str) -> Arc<Document> {
        match pragma {
            Some(pragma) => self
                .documents
                .create(Some(pragma.file_name.as_str()), pragma.line_number, text),
            None => self.documents.create(None, 1, text),
        }
    }

    // ========================================================================
    // Names and types
    // ========================================================================

    /// `A.B.C` → `((A).B).C`; a dot at position 0 does not split
    fn qualify(&mut self, dotted: &str) -> Expression {
        match dotted.rfind('.') {
            Some(pos) if pos > 0 => {
                let qualifier = self.qualify(&dotted[..pos]);
                let name = self.names.intern(&dotted[pos + 1..]);
                Expression::qualified(qualifier, name)
            }
            _ => Expression::identifier(self.names.intern(dotted)),
        }
    }

    fn translate_type(&mut self, reference: &CodeTypeReference) -> TypeRef {
        match &reference.array_element_type {
            Some(element) => TypeRef::Array {
                element: Box::new(self.translate_type(element)),
                rank: reference.array_rank,
            },
            None => TypeRef::Named(Box::new(self.qualify(&reference.base_type))),
        }
    }

    fn translate_types(&mut self, references: &[CodeTypeReference]) -> Vec<TypeRef> {
        references.iter().map(|r| self.translate_type(r)).collect()
    }

    /// A private implementation type wins over the implementation type list
    fn implemented_types(
        &mut self,
        private: &Option<CodeTypeReference>,
        listed: &[CodeTypeReference],
    ) -> Vec<TypeRef> {
        match private {
            Some(private) => vec![self.translate_type(private)],
            None => self.translate_types(listed),
        }
    }

    fn translate_attributes(&mut self, attributes: &[CodeAttributeDeclaration]) -> Vec<Attribute> {
        attributes
            .iter()
            .map(|a| self.translate_attribute(a))
            .collect()
    }

    fn translate_attribute(&mut self, attribute: &CodeAttributeDeclaration) -> Attribute {
        let constructor = self.qualify(&attribute.name);
        let mut arguments = Vec::with_capacity(attribute.arguments.len());
        for argument in &attribute.arguments {
            let Some(value) = self.translate_expression(&argument.value) else {
                continue;
            };
            match argument.name.as_deref() {
                None | Some("") => arguments.push(AttributeArgument::Positional(value)),
                Some(name) => arguments.push(AttributeArgument::Named {
                    name: self.names.intern(name),
                    value,
                }),
            }
        }
        Attribute {
            constructor,
            arguments,
        }
    }

    fn translate_parameters(&mut self, parameters: &[CodeParameterDeclaration]) -> Vec<Parameter> {
        parameters
            .iter()
            .map(|p| self.translate_parameter(p))
            .collect()
    }

    fn translate_parameter(&mut self, parameter: &CodeParameterDeclaration) -> Parameter {
        let mut ty = self.translate_type(&parameter.ty);
        if parameter.direction != FieldDirection::In {
            ty = TypeRef::Reference(Box::new(ty));
        }
        Parameter {
            name: self.names.intern(&parameter.name),
            ty,
            attributes: self.translate_attributes(&parameter.custom_attributes),
        }
    }

    // ========================================================================
    // Namespaces and types
    // ========================================================================

    fn translate_namespace(&mut self, namespace: &CodeNamespace) -> Namespace {
        let name = self.names.intern(&namespace.name);
        let mut result = Namespace::new(name.clone());
        result.source = namespace.source.clone();
        result.used_namespaces = namespace
            .imports
            .iter()
            .map(|import| self.names.intern(import))
            .collect();
        for declaration in &namespace.types {
            let id = self.translate_type_declaration(declaration, name.clone(), None);
            result.types.push(id);
        }
        result
    }

    fn translate_type_declaration(
        &mut self,
        declaration: &CodeTypeDeclaration,
        namespace: Identifier,
        declaring_type: Option<TypeId>,
    ) -> TypeId {
        let mut flags = type_flags(declaration.type_attributes);
        let kind = match &declaration.type_kind {
            CodeTypeKind::Class => TypeKind::Class,
            CodeTypeKind::Struct => TypeKind::Struct,
            CodeTypeKind::Interface => TypeKind::Interface,
            CodeTypeKind::Enum => TypeKind::Enum {
                underlying: match declaration.base_types.first() {
                    Some(base) => self.translate_type(base),
                    None => TypeRef::INT32,
                },
            },
            CodeTypeKind::Delegate {
                parameters,
                return_type,
            } => {
                flags.sealed = true;
                TypeKind::Delegate {
                    parameters: self.translate_parameters(parameters),
                    return_type: match return_type {
                        Some(ty) => self.translate_type(ty),
                        None => TypeRef::VOID,
                    },
                }
            }
        };

        let mut node = TypeNode::new(kind, self.names.intern(&declaration.name), self.module.id);
        node.namespace = namespace;
        node.declaring_type = declaring_type;
        node.flags = flags;
        node.attributes = self.translate_attributes(&declaration.custom_attributes);
        node.source = declaration.source.clone();
        if matches!(
            declaration.type_kind,
            CodeTypeKind::Class | CodeTypeKind::Struct | CodeTypeKind::Interface
        ) {
            node.interfaces = self.translate_types(&declaration.base_types);
        }
        let is_class = matches!(node.kind, TypeKind::Class);
        let is_delegate = matches!(node.kind, TypeKind::Delegate { .. });

        let id = self.module.add_type(node);
        if is_delegate {
            return id;
        }

        let mut members = Vec::with_capacity(declaration.members.len());
        for member in &declaration.members {
            self.translate_member(member, id, &mut members);
        }

        if is_class && !members.iter().any(is_constructor) {
            members.push(default_constructor(id, &mut self.names));
        }

        trace!(ty = %declaration.name, members = members.len(), "translated type");
        self.module.types[id.index].members = members;
        id
    }

    // ========================================================================
    // Members
    // ========================================================================

    fn translate_member(&mut self, member: &CodeTypeMember, owner: TypeId, members: &mut Vec<Member>) {
        let kind = match &member.shape {
            Shape::Known(kind) => kind,
            Shape::Unrecognized { kind } => {
                self.did_not_expect(kind, &member.source);
                return;
            }
        };

        let is_interface = self.module.types[owner.index].is_interface();
        let is_enum = matches!(self.module.types[owner.index].kind, TypeKind::Enum { .. });
        let mut translated = match kind {
            CodeTypeMemberKind::Field(field) => self.translate_field(field, owner, is_enum),
            CodeTypeMemberKind::Method(method) => {
                self.translate_method(method, method.attributes, &method.name, owner, is_interface)
            }
            CodeTypeMemberKind::EntryPoint(method) => self.translate_method(
                method,
                MemberAttributes::new(MemberAttributes::STATIC | MemberAttributes::PUBLIC),
                standard::MAIN,
                owner,
                is_interface,
            ),
            CodeTypeMemberKind::Constructor(constructor) => {
                self.translate_constructor(constructor, owner)
            }
            CodeTypeMemberKind::Property(property) => {
                self.translate_property(property, owner, is_interface, member, members);
                return;
            }
            CodeTypeMemberKind::Event(event) => self.translate_event(event, owner),
            CodeTypeMemberKind::Snippet(snippet) => {
                let document = self.snippet_document(&snippet.line_pragma, &snippet.text);
                let mut result = Member::new(Identifier::empty(), owner, MemberKind::Snippet);
                result.source = Some(SourceContext::whole(document));
                members.push(result);
                return;
            }
            CodeTypeMemberKind::NestedType(nested) => {
                let id = self.translate_type_declaration(nested, Identifier::empty(), Some(owner));
                let name = self.module.types[id.index].name.clone();
                Member::new(name, owner, MemberKind::NestedType(id))
            }
        };

        if translated.source.is_none() {
            translated.source = member.source.clone();
        }
        members.push(translated);
    }

    fn translate_field(&mut self, field: &CodeMemberField, owner: TypeId, is_enum: bool) -> Member {
        let visibility = visibility(field.attributes);
        let kind = if is_enum {
            let default_value = field
                .init_expression
                .as_ref()
                .and_then(|init| self.translate_expression(init))
                .and_then(|init| init.as_literal().cloned());
            Field {
                ty: TypeRef::Bound(owner),
                flags: FieldFlags {
                    visibility,
                    is_static: true,
                    literal: true,
                    has_default: true,
                },
                initializer: None,
                default_value,
            }
        } else {
            let scope = field.attributes.scope();
            Field {
                ty: self.translate_type(&field.ty),
                flags: FieldFlags {
                    visibility,
                    is_static: scope == MemberAttributes::STATIC,
                    literal: scope == MemberAttributes::CONST,
                    has_default: false,
                },
                initializer: field
                    .init_expression
                    .as_ref()
                    .and_then(|init| self.translate_expression(init)),
                default_value: None,
            }
        };

        let mut member = Member::new(self.names.intern(&field.name), owner, MemberKind::Field(kind));
        member.attributes = self.translate_attributes(&field.custom_attributes);
        member
    }

    fn translate_method(
        &mut self,
        method: &CodeMemberMethod,
        attributes: MemberAttributes,
        name: &str,
        owner: TypeId,
        is_interface: bool,
    ) -> Member {
        let flags = method_flags(attributes);
        let return_type = match &method.return_type {
            Some(ty) => self.translate_type(ty),
            None => TypeRef::VOID,
        };

        let mut result = Method::new(MethodKind::Ordinary, flags, return_type);
        result.parameters = self.translate_parameters(&method.parameters);
        result.return_attributes = self.translate_attributes(&method.return_type_custom_attributes);
        result.implemented_types =
            self.implemented_types(&method.private_implementation_type, &method.implementation_types);
        result.conditional_symbol = conditional_symbol(&method.custom_attributes);
        if !is_interface || flags.is_static {
            let block = Block::new(self.translate_statements(&method.statements));
            result.body = Some(Body::new(block));
        }

        let mut member = Member::new(self.names.intern(name), owner, MemberKind::Method(result));
        member.attributes = self.translate_attributes(&method.custom_attributes);
        member
    }

    fn translate_constructor(&mut self, constructor: &CodeConstructor, owner: TypeId) -> Member {
        let mut flags = method_flags(constructor.attributes);
        flags.special_name = true;
        flags.rt_special_name = true;

        let (receiver, arguments) = if !constructor.chained_constructor_args.is_empty() {
            (ExpressionKind::This, &constructor.chained_constructor_args)
        } else {
            (ExpressionKind::Base, &constructor.base_constructor_args)
        };
        let arguments = arguments
            .iter()
            .filter_map(|argument| self.translate_expression(argument))
            .collect();
        let chain = self.constructor_call(receiver, arguments);

        let mut statements = Vec::with_capacity(constructor.statements.len() + 1);
        statements.push(chain);
        statements.extend(self.translate_statements(&constructor.statements));

        let mut method = Method::new(MethodKind::InstanceInitializer, flags, TypeRef::VOID);
        method.parameters = self.translate_parameters(&constructor.parameters);
        method.body = Some(Body::new(Block::new(statements)));

        let mut member = Member::new(
            self.names.intern(standard::CTOR),
            owner,
            MemberKind::Method(method),
        );
        member.attributes = self.translate_attributes(&constructor.custom_attributes);
        member
    }

    fn constructor_call(&mut self, receiver: ExpressionKind, arguments: Vec<Expression>) -> Statement {
        let callee = Expression::qualified(
            Expression::new(receiver),
            self.names.intern(standard::CTOR),
        );
        Statement::expression(Expression::call(callee, arguments))
    }

    /// Adds the accessors, then the property itself
    fn translate_property(
        &mut self,
        property: &CodeMemberProperty,
        owner: TypeId,
        is_interface: bool,
        origin: &CodeTypeMember,
        members: &mut Vec<Member>,
    ) {
        let mut flags = method_flags(property.attributes);
        flags.special_name = true;
        let implemented_types = self.implemented_types(
            &property.private_implementation_type,
            &property.implementation_types,
        );
        let parameters = self.translate_parameters(&property.parameters);
        let ty = self.translate_type(&property.ty);
        let has_body = !is_interface || flags.is_static;

        let mut getter = None;
        if property.has_get {
            let mut method = Method::new(MethodKind::Ordinary, flags, ty.clone());
            method.parameters = parameters.clone();
            method.implemented_types = implemented_types.clone();
            if has_body {
                let block = Block::new(self.translate_statements(&property.get_statements));
                method.body = Some(Body::new(block));
            }
            let name = self.names.intern(&format!("get_{}", property.name));
            let mut member = Member::new(name, owner, MemberKind::Method(method));
            member.source = origin.source.clone();
            getter = Some(MemberRef::new(owner, members.len()));
            members.push(member);
        }

        let mut setter = None;
        if property.has_set {
            let mut method = Method::new(MethodKind::Ordinary, flags, TypeRef::VOID);
            method.parameters = parameters.clone();
            method
                .parameters
                .push(Parameter::new(self.names.intern(standard::VALUE), ty.clone()));
            method.implemented_types = implemented_types.clone();
            if has_body {
                let block = Block::new(self.translate_statements(&property.set_statements));
                method.body = Some(Body::new(block));
            }
            let name = self.names.intern(&format!("set_{}", property.name));
            let mut member = Member::new(name, owner, MemberKind::Method(method));
            member.source = origin.source.clone();
            setter = Some(MemberRef::new(owner, members.len()));
            members.push(member);
        }

        let kind = MemberKind::Property(Property {
            ty,
            parameters,
            getter,
            setter,
            implemented_types,
            is_static: flags.is_static,
        });
        let mut member = Member::new(self.names.intern(&property.name), owner, kind);
        member.attributes = self.translate_attributes(&property.custom_attributes);
        member.source = origin.source.clone();
        members.push(member);
    }

    fn translate_event(&mut self, event: &CodeMemberEvent, owner: TypeId) -> Member {
        let mut handler_flags = method_flags(event.attributes);
        handler_flags.special_name = true;
        let kind = MemberKind::Event(Event {
            handler_type: self.translate_type(&event.ty),
            handler_flags,
            implemented_types: self
                .implemented_types(&event.private_implementation_type, &event.implementation_types),
        });
        let mut member = Member::new(self.names.intern(&event.name), owner, kind);
        member.attributes = self.translate_attributes(&event.custom_attributes);
        member
    }

    // ========================================================================
    // Statements
    // ========================================================================

    fn translate_statements(&mut self, statements: &[CodeStatement]) -> Vec<Statement> {
        statements
            .iter()
            .filter_map(|s| self.translate_statement(s))
            .collect()
    }

    fn translate_block(&mut self, statements: &[CodeStatement]) -> Block {
        Block::new(self.translate_statements(statements))
    }

    fn translate_statement(&mut self, statement: &CodeStatement) -> Option<Statement> {
        let kind = match &statement.shape {
            Shape::Known(kind) => kind,
            Shape::Unrecognized { kind } => {
                self.did_not_expect(kind, &statement.source);
                return None;
            }
        };
        let source = statement.source.clone();

        let kind = match kind {
            CodeStatementKind::Assign { left, right } => {
                let target = self.translate_operand(left);
                let value = self.translate_operand(right);
                return Some(Statement::assignment(target, value).with_source(source));
            }
            CodeStatementKind::AttachEvent { event, listener } => StatementKind::AttachEvent {
                event: self.translate_operand(event),
                handler: self.translate_operand(listener),
            },
            CodeStatementKind::RemoveEvent { event, listener } => StatementKind::RemoveEvent {
                event: self.translate_operand(event),
                handler: self.translate_operand(listener),
            },
            CodeStatementKind::Comment { .. } => return None,
            CodeStatementKind::Condition {
                condition,
                true_statements,
                false_statements,
            } => StatementKind::If {
                condition: self.translate_operand(condition),
                then_block: self.translate_block(true_statements),
                else_block: self.translate_block(false_statements),
            },
            CodeStatementKind::Expression { expression } => {
                StatementKind::Expression(self.translate_expression(expression)?)
            }
            CodeStatementKind::Goto { label } => StatementKind::Goto(self.names.intern(label)),
            CodeStatementKind::Iteration {
                init_statement,
                test_expression,
                increment_statement,
                statements,
            } => StatementKind::For {
                init: init_statement
                    .iter()
                    .filter_map(|s| self.translate_statement(s))
                    .collect(),
                test: test_expression
                    .as_ref()
                    .and_then(|t| self.translate_expression(t)),
                increment: increment_statement
                    .iter()
                    .filter_map(|s| self.translate_statement(s))
                    .collect(),
                body: self.translate_block(statements),
            },
            CodeStatementKind::Labeled { label, statement } => StatementKind::Labeled {
                label: self.names.intern(label),
                statement: statement
                    .as_ref()
                    .and_then(|s| self.translate_statement(s))
                    .map(Box::new),
            },
            CodeStatementKind::MethodReturn { expression } => StatementKind::Return(
                expression
                    .as_ref()
                    .and_then(|e| self.translate_expression(e)),
            ),
            CodeStatementKind::Snippet { value, line_pragma } => {
                let document = self.snippet_document(line_pragma, value);
                return Some(
                    Statement::new(StatementKind::Snippet)
                        .with_source(Some(SourceContext::whole(document))),
                );
            }
            CodeStatementKind::ThrowException { to_throw } => StatementKind::Throw(
                to_throw.as_ref().and_then(|e| self.translate_expression(e)),
            ),
            CodeStatementKind::TryCatchFinally {
                try_statements,
                catch_clauses,
                finally_statements,
            } => StatementKind::Try {
                block: self.translate_block(try_statements),
                catchers: catch_clauses
                    .iter()
                    .map(|c| self.translate_catch(c))
                    .collect(),
                finally: if finally_statements.is_empty() {
                    None
                } else {
                    Some(self.translate_block(finally_statements))
                },
            },
            CodeStatementKind::VariableDeclaration {
                name,
                ty,
                init_expression,
            } => StatementKind::VariableDeclaration {
                name: self.names.intern(name),
                ty: self.translate_type(ty),
                initializer: init_expression
                    .as_ref()
                    .and_then(|e| self.translate_expression(e)),
            },
        };

        Some(Statement { kind, source })
    }

    fn translate_catch(&mut self, clause: &CodeCatchClause) -> Catch {
        Catch {
            ty: clause
                .catch_exception_type
                .as_ref()
                .map(|ty| self.translate_type(ty)),
            variable: self.names.intern(&clause.local_name),
            block: self.translate_block(&clause.statements),
        }
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    /// A required child; an unreadable one leaves a [`ExpressionKind::Missing`] hole
    fn translate_operand(&mut self, expression: &CodeExpression) -> Expression {
        self.translate_expression(expression)
            .unwrap_or_else(Expression::missing)
    }

    /// Positions are kept, so every element is translated and holes stay in place
    fn translate_expressions(&mut self, expressions: &[CodeExpression]) -> Vec<Expression> {
        expressions
            .iter()
            .map(|e| self.translate_operand(e))
            .collect()
    }

    fn translate_boxed(&mut self, expression: &CodeExpression) -> Box<Expression> {
        Box::new(self.translate_operand(expression))
    }

    fn translate_method_reference(&mut self, method: &CodeMethodReference) -> Expression {
        let name = self.names.intern(&method.method_name);
        match &method.target_object {
            Some(target) => Expression::qualified(self.translate_operand(target), name),
            None => Expression::identifier(name),
        }
    }

    pub fn translate_expression(&mut self, expression: &CodeExpression) -> Option<Expression> {
        let kind = match &expression.shape {
            Shape::Known(kind) => kind,
            Shape::Unrecognized { kind } => {
                self.did_not_expect(kind, &expression.source);
                return None;
            }
        };
        let source = expression.source.clone();

        let translated = match kind {
            CodeExpressionKind::ArgumentReference { parameter_name } => {
                Expression::identifier(self.names.intern(parameter_name))
            }
            CodeExpressionKind::ArrayCreate {
                create_type,
                initializers,
                size,
                size_expression,
            } => {
                let element_type = self.translate_type(create_type);
                let initializers = self.translate_expressions(initializers);
                let size = match size_expression {
                    Some(size) => self.translate_operand(size),
                    None => {
                        let count = i32::try_from(initializers.len()).unwrap_or(i32::MAX);
                        Expression::literal(Literal::Int32(count.max(*size)))
                    }
                };
                Expression::new(ExpressionKind::ConstructArray {
                    element_type,
                    size: Box::new(size),
                    initializers,
                })
            }
            CodeExpressionKind::ArrayIndexer {
                target_object,
                indices,
            }
            | CodeExpressionKind::Indexer {
                target_object,
                indices,
            } => Expression::new(ExpressionKind::Indexer {
                object: self.translate_boxed(target_object),
                operands: self.translate_expressions(indices),
            }),
            CodeExpressionKind::BaseReference => Expression::new(ExpressionKind::Base),
            CodeExpressionKind::BinaryOperator {
                left,
                operator,
                right,
            } => {
                let left = self.translate_operand(left);
                let right = self.translate_operand(right);
                match binary_op(*operator) {
                    Some(op) => Expression::new(ExpressionKind::Binary {
                        op,
                        left: Box::new(left),
                        right: Box::new(right),
                    }),
                    None => Expression::new(ExpressionKind::Assignment(Box::new(
                        Statement::assignment(left, right).with_source(source.clone()),
                    ))),
                }
            }
            CodeExpressionKind::Cast {
                target_type,
                expression,
            } => Expression::new(ExpressionKind::Cast {
                operand: self.translate_boxed(expression),
                target: self.translate_type(target_type),
            }),
            CodeExpressionKind::DelegateCreate {
                delegate_type,
                target_object,
                method_name,
            } => Expression::new(ExpressionKind::ConstructDelegate {
                delegate_type: self.translate_type(delegate_type),
                target: self.translate_boxed(target_object),
                method_name: self.names.intern(method_name),
            }),
            CodeExpressionKind::DelegateInvoke {
                target_object,
                parameters,
            } => {
                let target = self.translate_operand(target_object);
                let callee = Expression::qualified(target, self.names.intern(standard::INVOKE));
                Expression::call(callee, self.translate_expressions(parameters))
            }
            CodeExpressionKind::Direction {
                direction,
                expression,
            } => match direction {
                FieldDirection::In => return self.translate_expression(expression),
                FieldDirection::Out | FieldDirection::Ref => {
                    Expression::new(ExpressionKind::AddressOf(self.translate_boxed(expression)))
                }
            },
            CodeExpressionKind::EventReference {
                target_object,
                event_name,
            } => {
                let target = self.translate_operand(target_object);
                Expression::qualified(target, self.names.intern(event_name))
            }
            CodeExpressionKind::FieldReference {
                target_object,
                field_name,
            } => {
                let name = self.names.intern(field_name);
                match target_object {
                    Some(target) => Expression::qualified(self.translate_operand(target), name),
                    None => Expression::identifier(name),
                }
            }
            CodeExpressionKind::MethodInvoke { method, parameters } => {
                let callee = self.translate_method_reference(method);
                Expression::call(callee, self.translate_expressions(parameters))
            }
            CodeExpressionKind::MethodReference(method) => self.translate_method_reference(method),
            CodeExpressionKind::ObjectCreate {
                create_type,
                parameters,
            } => Expression::new(ExpressionKind::Construct {
                constructor: self.translate_type(create_type),
                operands: self.translate_expressions(parameters),
            }),
            CodeExpressionKind::Primitive { value } => Expression::literal(literal(value)),
            CodeExpressionKind::PropertyReference {
                target_object,
                property_name,
            } => {
                let target = self.translate_operand(target_object);
                Expression::qualified(target, self.names.intern(property_name))
            }
            CodeExpressionKind::PropertySetValueReference => {
                Expression::new(ExpressionKind::SetterValue)
            }
            CodeExpressionKind::Snippet { value } => {
                let document = self.documents.create(None, 1, value);
                return Some(
                    Expression::new(ExpressionKind::Snippet)
                        .with_source(Some(SourceContext::whole(document))),
                );
            }
            CodeExpressionKind::ThisReference => Expression::new(ExpressionKind::This),
            CodeExpressionKind::TypeOf { ty } => {
                Expression::new(ExpressionKind::TypeOf(self.translate_type(ty)))
            }
            CodeExpressionKind::TypeReference { ty } => {
                Expression::new(ExpressionKind::TypeExpression(self.translate_type(ty)))
            }
            CodeExpressionKind::VariableReference { variable_name } => {
                Expression::identifier(self.names.intern(variable_name))
            }
        };

        Some(translated.with_source(source))
    }
}

// ============================================================================
// Flag and constant mapping
// ============================================================================

fn type_flags(attributes: TypeAttributes) -> TypeFlags {
    TypeFlags {
        visibility: match attributes.category(TypeAttributes::VISIBILITY_MASK) {
            TypeAttributes::PUBLIC => TypeVisibility::Public,
            TypeAttributes::NESTED_PUBLIC => TypeVisibility::NestedPublic,
            TypeAttributes::NESTED_PRIVATE => TypeVisibility::NestedPrivate,
            TypeAttributes::NESTED_FAMILY => TypeVisibility::NestedFamily,
            TypeAttributes::NESTED_ASSEMBLY => TypeVisibility::NestedAssembly,
            TypeAttributes::NESTED_FAM_AND_ASSEM => TypeVisibility::NestedFamAndAssem,
            TypeAttributes::NESTED_FAM_OR_ASSEM => TypeVisibility::NestedFamOrAssem,
            _ => TypeVisibility::NotPublic,
        },
        layout: match attributes.category(TypeAttributes::LAYOUT_MASK) {
            TypeAttributes::SEQUENTIAL_LAYOUT => Layout::Sequential,
            TypeAttributes::EXPLICIT_LAYOUT => Layout::Explicit,
            _ => Layout::Auto,
        },
        string_format: match attributes.category(TypeAttributes::STRING_FORMAT_MASK) {
            TypeAttributes::UNICODE_CLASS => StringFormat::Unicode,
            TypeAttributes::AUTO_CLASS => StringFormat::Auto,
            _ => StringFormat::Ansi,
        },
        is_abstract: attributes.contains(TypeAttributes::ABSTRACT),
        sealed: attributes.contains(TypeAttributes::SEALED),
        special_name: attributes.contains(TypeAttributes::SPECIAL_NAME),
        rt_special_name: attributes.contains(TypeAttributes::RT_SPECIAL_NAME),
        serializable: attributes.contains(TypeAttributes::SERIALIZABLE),
        before_field_init: attributes.contains(TypeAttributes::BEFORE_FIELD_INIT),
        has_security: attributes.contains(TypeAttributes::HAS_SECURITY),
        import: attributes.contains(TypeAttributes::IMPORT),
    }
}

fn visibility(attributes: MemberAttributes) -> Visibility {
    match attributes.access() {
        MemberAttributes::ASSEMBLY => Visibility::Assembly,
        MemberAttributes::FAMILY => Visibility::Family,
        MemberAttributes::FAMILY_AND_ASSEMBLY => Visibility::FamAndAssem,
        MemberAttributes::FAMILY_OR_ASSEMBLY => Visibility::FamOrAssem,
        MemberAttributes::PUBLIC => Visibility::Public,
        _ => Visibility::Private,
    }
}

fn method_flags(attributes: MemberAttributes) -> MethodFlags {
    let mut flags = MethodFlags {
        visibility: visibility(attributes),
        ..MethodFlags::default()
    };
    match attributes.scope() {
        MemberAttributes::ABSTRACT => flags.dispatch = Dispatch::Abstract,
        MemberAttributes::FINAL => {}
        MemberAttributes::STATIC => flags.is_static = true,
        MemberAttributes::OVERRIDE => flags.dispatch = Dispatch::Override,
        _ => flags.dispatch = Dispatch::Virtual,
    }
    flags.new_slot = attributes.is_new();
    flags.has_this = !flags.is_static;
    flags
}

/// `Assign` has no binary counterpart
fn binary_op(operator: CodeBinaryOperator) -> Option<BinaryOp> {
    let op = match operator {
        CodeBinaryOperator::Add => BinaryOp::Add,
        CodeBinaryOperator::Assign => return None,
        CodeBinaryOperator::BitwiseAnd => BinaryOp::And,
        CodeBinaryOperator::BitwiseOr => BinaryOp::Or,
        CodeBinaryOperator::BooleanAnd => BinaryOp::LogicalAnd,
        CodeBinaryOperator::BooleanOr => BinaryOp::LogicalOr,
        CodeBinaryOperator::Divide => BinaryOp::Div,
        CodeBinaryOperator::GreaterThan => BinaryOp::Gt,
        CodeBinaryOperator::GreaterThanOrEqual => BinaryOp::Ge,
        CodeBinaryOperator::IdentityEquality | CodeBinaryOperator::ValueEquality => BinaryOp::Eq,
        CodeBinaryOperator::IdentityInequality => BinaryOp::Ne,
        CodeBinaryOperator::LessThan => BinaryOp::Lt,
        CodeBinaryOperator::LessThanOrEqual => BinaryOp::Le,
        CodeBinaryOperator::Modulus => BinaryOp::Rem,
        CodeBinaryOperator::Multiply => BinaryOp::Mul,
        CodeBinaryOperator::Subtract => BinaryOp::Sub,
    };
    Some(op)
}

fn literal(value: &CodePrimitive) -> Literal {
    match value {
        CodePrimitive::Null => Literal::Null,
        CodePrimitive::Boolean(v) => Literal::Boolean(*v),
        CodePrimitive::Char(v) => Literal::Char(*v),
        CodePrimitive::SByte(v) => Literal::Int8(*v),
        CodePrimitive::Byte(v) => Literal::UInt8(*v),
        CodePrimitive::Int16(v) => Literal::Int16(*v),
        CodePrimitive::UInt16(v) => Literal::UInt16(*v),
        CodePrimitive::Int32(v) => Literal::Int32(*v),
        CodePrimitive::UInt32(v) => Literal::UInt32(*v),
        CodePrimitive::Int64(v) => Literal::Int64(*v),
        CodePrimitive::UInt64(v) => Literal::UInt64(*v),
        CodePrimitive::Single(v) => Literal::Single(*v),
        CodePrimitive::Double(v) => Literal::Double(*v),
        CodePrimitive::Decimal(d) => Literal::Decimal(Decimal {
            mantissa: d.mantissa,
            scale: d.scale,
        }),
        CodePrimitive::String(s) => Literal::String(s.clone()),
        CodePrimitive::DateTime(ticks) => Literal::DateTime(*ticks),
        CodePrimitive::DbNull => Literal::DbNull,
    }
}

/// Symbol named by the first positional string argument of a conditional attribute
fn conditional_symbol(attributes: &[CodeAttributeDeclaration]) -> Option<String> {
    attributes
        .iter()
        .filter(|a| CONDITIONAL_ATTRIBUTES.contains(&a.name.as_str()))
        .find_map(|a| {
            let first = a
                .arguments
                .iter()
                .find(|arg| arg.name.as_deref().map_or(true, str::is_empty))?;
            match &first.value.shape {
                Shape::Known(CodeExpressionKind::Primitive {
                    value: CodePrimitive::String(symbol),
                }) => Some(symbol.clone()),
                _ => None,
            }
        })
}

fn is_constructor(member: &Member) -> bool {
    member.as_method().is_some_and(Method::is_constructor)
}

/// `public .ctor() { base..ctor(); }`
fn default_constructor(owner: TypeId, names: &mut Interner) -> Member {
    let callee = Expression::qualified(
        Expression::new(ExpressionKind::Base),
        names.intern(standard::CTOR),
    );
    let body = Block::new(vec![Statement::expression(Expression::call(callee, Vec::new()))]);
    let method = Method::new(
        MethodKind::InstanceInitializer,
        MethodFlags::instance(Visibility::Public),
        TypeRef::VOID,
    )
    .with_body(body);
    Member::new(names.intern(standard::CTOR), owner, MemberKind::Method(method))
}
