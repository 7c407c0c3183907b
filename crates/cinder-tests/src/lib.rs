//! Integration tests for the Cinder middle-end
//!
//! This crate drives code trees through the whole middle-end:
//! Code tree → Lowering → Member binding → Guard contracts → Passes
//!
//! Binding and contract discovery here are deliberately small stand-ins for
//! the resolution phase, which lives outside the middle-end.

pub mod binder;
pub mod samples;

use binder::{install_guard_contracts, MemberBinder};
use cinder_codetree::CodeCompileUnit;
use cinder_error::{
    DefaultDocumentFactory, DiagnosticRenderer, ErrorKind, ErrorSink, InternalError, ResolveError,
    Result,
};
use cinder_ir::{
    rewrite_unit_bodies, translate, AssemblyReference, Block, CompilationUnit, Identifier, Member,
    MemberKind, MemberRef, Method, MethodFlags, MethodKind, ModuleId, ReferenceResolver,
    TypeFlags, TypeId, TypeKind, TypeNode, TypeRef, TypeUniverse, Visibility,
};
use cinder_passes::well_known::{CHECK_IS_READING, CHECK_IS_WRITING};
use cinder_passes::{Pipeline, PipelineConfig, WellKnown};
use std::collections::{BTreeMap, HashSet};

pub const CORE_MODULE: &str = "Core";
pub const APP_MODULE: &str = "App";

/// Resolves assembly names from a fixed table
#[derive(Debug, Clone, Default)]
pub struct StaticResolver {
    /// Assembly name to identity key
    assemblies: BTreeMap<String, String>,
    requests: Vec<String>,
}

impl StaticResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Knows `System` and `Microsoft.Contracts`
    pub fn standard() -> Self {
        Self::new()
            .with_assembly("System", "system, version=4.0.0.0")
            .with_assembly("Microsoft.Contracts", "microsoft.contracts, version=1.0.0.0")
    }

    pub fn with_assembly(mut self, name: &str, identity_key: &str) -> Self {
        self.assemblies
            .insert(name.to_string(), identity_key.to_string());
        self
    }

    /// Every name asked for, in order
    pub fn requests(&self) -> &[String] {
        &self.requests
    }
}

impl ReferenceResolver for StaticResolver {
    fn resolve(
        &mut self,
        name: &str,
        _already_seen: &HashSet<String>,
    ) -> std::result::Result<AssemblyReference, ResolveError> {
        self.requests.push(name.to_string());
        self.assemblies
            .get(name)
            .map(|key| AssemblyReference::new(name, key.as_str()))
            .ok_or_else(|| ResolveError::NotFound(name.to_string()))
    }
}

/// A universe holding the core library: `Microsoft.Contracts.Guard` with
/// its two check methods
pub fn core_universe() -> Result<TypeUniverse> {
    let mut universe = TypeUniverse::new();
    let core = universe.new_module(CORE_MODULE);
    let module = universe
        .module_mut(core)
        .ok_or_else(|| InternalError::DanglingModule(core.to_string()))?;

    let mut guard = TypeNode::new(TypeKind::Class, Identifier::new("Guard"), core);
    guard.namespace = Identifier::new("Microsoft.Contracts");
    guard.flags = TypeFlags::public();
    let guard = module.add_type(guard);

    let check = |name: &str| {
        let method = Method::new(
            MethodKind::Ordinary,
            MethodFlags::instance(Visibility::Public),
            TypeRef::VOID,
        );
        Member::new(Identifier::new(name), guard, MemberKind::Method(method))
    };
    module.types[guard.index].members = vec![check(CHECK_IS_READING), check(CHECK_IS_WRITING)];

    Ok(universe)
}

/// Result of running a code tree through the middle-end
#[derive(Debug)]
pub struct Compilation {
    pub universe: TypeUniverse,
    /// The module the tree was translated into
    pub module: ModuleId,
    pub unit: CompilationUnit,
    pub errors: ErrorSink,
    /// Names of the passes that ran
    pub passes: Vec<&'static str>,
}

impl Compilation {
    pub fn success(&self) -> bool {
        !self.errors.has_errors()
    }

    /// The translated module, printed
    pub fn ir(&self) -> String {
        self.universe
            .module(self.module)
            .map(ToString::to_string)
            .unwrap_or_default()
    }

    pub fn type_node(&self, qualified: &str) -> Option<&TypeNode> {
        let id = self.universe.find_type(qualified)?;
        self.universe.type_node(id).ok()
    }

    pub fn find_type(&self, qualified: &str) -> Option<TypeId> {
        self.universe.find_type(qualified)
    }

    pub fn find_member(&self, ty: &str, name: &str) -> Option<MemberRef> {
        self.universe.find_member(self.find_type(ty)?, name)
    }

    pub fn find_method(&self, ty: &str, name: &str) -> Option<MemberRef> {
        self.universe.find_method(self.find_type(ty)?, name)
    }

    pub fn method(&self, ty: &str, name: &str) -> Option<&Method> {
        self.universe.method(self.find_method(ty, name)?).ok()
    }

    pub fn body(&self, ty: &str, name: &str) -> Option<&Block> {
        self.method(ty, name)?.body.as_ref().map(|body| &body.block)
    }

    pub fn body_text(&self, ty: &str, name: &str) -> Option<String> {
        self.body(ty, name).map(ToString::to_string)
    }

    pub fn implicit_preconditions(&self, ty: &str, name: &str) -> Vec<String> {
        self.method(ty, name)
            .map(|method| {
                method
                    .implicit_preconditions
                    .iter()
                    .map(ToString::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn render_errors(&self) -> String {
        self.errors
            .render(&DiagnosticRenderer::new().without_colors())
    }
}

/// Translates a tree into a fresh module next to the core library
pub fn lower(tree: &CodeCompileUnit) -> Result<Compilation> {
    lower_with(tree, &mut StaticResolver::standard())
}

pub fn lower_with(
    tree: &CodeCompileUnit,
    resolver: &mut dyn ReferenceResolver,
) -> Result<Compilation> {
    let mut universe = core_universe()?;
    let module = universe.new_module(APP_MODULE);
    let mut errors = ErrorSink::new();

    let target = universe
        .module_mut(module)
        .ok_or_else(|| InternalError::DanglingModule(module.to_string()))?;
    let unit = translate(tree, target, resolver, &DefaultDocumentFactory, &mut errors);

    Ok(Compilation {
        universe,
        module,
        unit,
        errors,
        passes: Vec::new(),
    })
}

/// Lowers, binds and runs every pass with the default configuration
pub fn compile(tree: &CodeCompileUnit) -> Result<Compilation> {
    compile_with(tree, PipelineConfig::default())
}

pub fn compile_with(tree: &CodeCompileUnit, config: PipelineConfig) -> Result<Compilation> {
    let mut compilation = lower(tree)?;
    let well_known = WellKnown::from_universe(&compilation.universe)?;

    rewrite_unit_bodies(
        &mut MemberBinder::new(),
        &compilation.unit,
        &mut compilation.universe,
    )?;
    install_guard_contracts(
        &mut compilation.universe,
        &compilation.unit,
        well_known.guard_type,
    )?;

    let mut pipeline = Pipeline::new(config, well_known);
    compilation.passes = pipeline.run(
        &compilation.unit,
        &mut compilation.universe,
        &compilation.errors,
    )?;
    Ok(compilation)
}

/// Asserts that the tree goes through the middle-end without errors
pub fn assert_compiles(tree: &CodeCompileUnit) -> Compilation {
    let compilation = match compile(tree) {
        Ok(compilation) => compilation,
        Err(err) => panic!("Expected tree to compile, but the pipeline failed: {}", err),
    };
    if !compilation.success() {
        panic!(
            "Expected tree to compile, but got errors:\n{}",
            compilation.render_errors()
        );
    }
    compilation
}

/// Asserts that lowering records exactly `count` errors of `kind`
pub fn assert_lowering_reports(tree: &CodeCompileUnit, kind: ErrorKind, count: usize) -> Compilation {
    let compilation = match lower(tree) {
        Ok(compilation) => compilation,
        Err(err) => panic!("Expected lowering to finish, but it failed: {}", err),
    };
    let found = compilation.errors.count(kind);
    if found != count {
        panic!(
            "Expected {} error(s) of kind {:?}, found {}:\n{}",
            count,
            kind,
            found,
            compilation.render_errors()
        );
    }
    compilation
}

/// Asserts that the tree compiles and the printed IR contains `expected`
pub fn assert_ir_contains(tree: &CodeCompileUnit, expected: &str) {
    let ir = assert_compiles(tree).ir();
    if !ir.contains(expected) {
        panic!(
            "Expected IR to contain '{}', but it didn't.\n\nGenerated IR:\n{}",
            expected, ir
        );
    }
}

#[cfg(test)]
mod pipeline_tests {
    use super::*;
    use crate::samples::{bank, class, structure, unit_with};
    use cinder_codetree::{
        CodeConstructor, CodeExpression, CodeExpressionKind, CodeLinePragma, CodeMemberField,
        CodeMemberMethod, CodeMemberProperty, CodeParameterDeclaration, CodePrimitive,
        CodeSnippetUnit, CodeStatement, CodeTypeMember, CodeTypeMemberKind,
        CodeTypeReference, MemberAttributes,
    };
    use pretty_assertions::assert_eq;

    fn init_tracing() {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    }

    fn occurrences(haystack: &str, needle: &str) -> usize {
        haystack.matches(needle).count()
    }

    fn int32(value: i32) -> CodeExpression {
        CodeExpression::primitive(CodePrimitive::Int32(value))
    }

    fn public_final() -> MemberAttributes {
        MemberAttributes::new(MemberAttributes::PUBLIC | MemberAttributes::FINAL)
    }

    fn method_with(name: &str, statements: Vec<CodeStatement>) -> CodeMemberMethod {
        CodeMemberMethod {
            attributes: public_final(),
            statements,
            ..CodeMemberMethod::new(name)
        }
    }

    fn constructors(compilation: &Compilation, ty: &str) -> Vec<String> {
        compilation
            .type_node(ty)
            .unwrap()
            .constructors()
            .map(|ctor| ctor.body.as_ref().unwrap().block.to_string())
            .collect()
    }

    // =========================================
    // Lowering
    // =========================================

    #[test]
    fn test_empty_unit() {
        let compilation = assert_compiles(&CodeCompileUnit::default());
        assert_eq!(compilation.ir(), "; Module: App\n");
        assert_eq!(compilation.passes.len(), 3);
    }

    #[test]
    fn test_translation_is_deterministic() {
        let tree = bank();
        let first = lower(&tree).unwrap();
        let second = lower(&tree).unwrap();

        assert_eq!(first.ir(), second.ir());
        assert_eq!(
            first.universe.module(first.module),
            second.universe.module(second.module)
        );
        assert_eq!(first.unit, second.unit);
    }

    #[test]
    fn test_default_constructor() {
        let compilation = assert_compiles(&unit_with("Shapes", vec![class("Circle")]));

        let circle = compilation.type_node("Shapes.Circle").unwrap();
        let ctors: Vec<_> = circle.constructors().collect();
        assert_eq!(ctors.len(), 1);
        assert_eq!(ctors[0].flags.visibility, Visibility::Public);
        assert!(ctors[0].parameters.is_empty());
        assert_eq!(constructors(&compilation, "Shapes.Circle"), ["{ (base)..ctor(); }"]);
    }

    #[test]
    fn test_structs_get_no_default_constructor() {
        let compilation = assert_compiles(&unit_with("Shapes", vec![structure("Point")]));
        assert!(constructors(&compilation, "Shapes.Point").is_empty());
    }

    #[test]
    fn test_constructor_chaining() {
        let init = CodeStatement::expression(CodeExpression::variable("init"));
        let chained = CodeConstructor {
            attributes: public_final(),
            chained_constructor_args: vec![int32(1)],
            base_constructor_args: vec![int32(2)],
            statements: vec![init.clone()],
            ..CodeConstructor::default()
        };
        let based = CodeConstructor {
            attributes: public_final(),
            base_constructor_args: vec![int32(2)],
            statements: vec![init],
            ..CodeConstructor::default()
        };
        let plain = CodeConstructor {
            attributes: public_final(),
            ..CodeConstructor::default()
        };
        let circle = class("Circle")
            .with_member(CodeTypeMemberKind::Constructor(chained))
            .with_member(CodeTypeMemberKind::Constructor(based))
            .with_member(CodeTypeMemberKind::Constructor(plain));

        let compilation = lower(&unit_with("Shapes", vec![circle])).unwrap();
        assert_eq!(
            constructors(&compilation, "Shapes.Circle"),
            [
                "{ (this)..ctor(1); init; }",
                "{ (base)..ctor(2); init; }",
                "{ (base)..ctor(); }"
            ]
        );
        let ctor = compilation.type_node("Shapes.Circle").unwrap().constructors().next().unwrap();
        assert!(ctor.flags.special_name);
        assert!(ctor.flags.rt_special_name);
    }

    #[test]
    fn test_indexer_accessors() {
        let int = CodeTypeReference::new("System.Int32");
        let item = CodeMemberProperty {
            attributes: public_final(),
            parameters: vec![
                CodeParameterDeclaration::new("row", int.clone()),
                CodeParameterDeclaration::new("column", int.clone()),
            ],
            has_get: true,
            has_set: true,
            ..CodeMemberProperty::new("Item", CodeTypeReference::new("System.String"))
        };
        let grid = class("Grid").with_member(CodeTypeMemberKind::Property(item));
        let compilation = lower(&unit_with("Sheets", vec![grid])).unwrap();

        let names: Vec<_> = compilation
            .type_node("Sheets.Grid")
            .unwrap()
            .members
            .iter()
            .map(|m| m.name.to_string())
            .collect();
        assert_eq!(names, ["get_Item", "set_Item", "Item", ".ctor"]);

        let getter = compilation.method("Sheets.Grid", "get_Item").unwrap();
        assert_eq!(getter.parameters.len(), 2);
        assert_eq!(getter.return_type.to_string(), "(System).String");

        let setter = compilation.method("Sheets.Grid", "set_Item").unwrap();
        assert_eq!(setter.parameters.len(), 3);
        let value = &setter.parameters[2];
        assert!(value.name == "value");
        assert_eq!(value.ty.to_string(), "(System).String");
        assert_eq!(setter.return_type, TypeRef::VOID);
    }

    #[test]
    fn test_array_sizing() {
        let create = |size: i32| -> CodeExpression {
            CodeExpressionKind::ArrayCreate {
                create_type: CodeTypeReference::new("System.Int32"),
                initializers: vec![int32(1), int32(2), int32(3)],
                size,
                size_expression: None,
            }
            .into()
        };
        let fill = method_with(
            "Fill",
            vec![
                CodeStatement::expression(create(5)),
                CodeStatement::expression(create(2)),
            ],
        );
        let tree = unit_with("Sheets", vec![class("Grid").with_member(CodeTypeMemberKind::Method(fill))]);
        let compilation = assert_compiles(&tree);

        assert_eq!(
            compilation.body_text("Sheets.Grid", "Fill").unwrap(),
            "{ new (System).Int32[5] {1, 2, 3}; new (System).Int32[3] {1, 2, 3}; }"
        );
    }

    #[test]
    fn test_dotted_names() {
        let codec = structure("Codec").with_member(CodeTypeMemberKind::Field(CodeMemberField::new(
            "encoding",
            CodeTypeReference::new("System.Text.Encoding"),
        )));
        let compilation = lower(&unit_with("Text", vec![codec])).unwrap();

        let field = compilation.type_node("Text.Codec").unwrap().members[0]
            .as_field()
            .unwrap();
        assert_eq!(field.ty.to_string(), "((System).Text).Encoding");
    }

    #[test]
    fn test_fault_containment() {
        let mut vector = structure("Vector");
        for i in 0..9 {
            let field = CodeMemberField::new(format!("f{}", i), CodeTypeReference::new("System.Int32"));
            vector = vector.with_member(CodeTypeMemberKind::Field(field));
            if i == 4 {
                vector = vector.with_member(CodeTypeMember::unrecognized("CodeMemberRecord"));
            }
        }
        let tree = unit_with("Geometry", vec![vector]);

        let compilation = assert_lowering_reports(&tree, ErrorKind::StructuralTranslation, 1);
        assert_eq!(compilation.errors.len(), 1);
        assert_eq!(
            compilation.errors.iter().next().unwrap().argument,
            "CodeMemberRecord"
        );
        assert_eq!(compilation.type_node("Geometry.Vector").unwrap().members.len(), 9);
    }

    #[test]
    fn test_unknown_statement_from_json() {
        let tree = CodeCompileUnit::from_json(
            r#"{ "namespaces": [{ "name": "Jobs", "types": [{
                "name": "Worker", "type_kind": { "kind": "Class" },
                "members": [{ "kind": "Method", "name": "Run", "statements": [
                    { "kind": "CodeYieldStatement" },
                    { "kind": "MethodReturn" }
                ]}]
            }]}]}"#,
        )
        .unwrap();

        let compilation = assert_lowering_reports(&tree, ErrorKind::StructuralTranslation, 1);
        assert_eq!(compilation.body_text("Jobs.Worker", "Run").unwrap(), "{ return; }");
        assert!(compilation.render_errors().starts_with(
            "error[ET001]: did not expect a node of kind `CodeYieldStatement`"
        ));
    }

    #[test]
    fn test_malformed_siblings_each_report_and_leave_holes() {
        let tree = CodeCompileUnit::from_json(
            r#"{ "namespaces": [{ "name": "Jobs", "types": [{
                "name": "Worker", "type_kind": { "kind": "Class" },
                "members": [{ "kind": "Method", "name": "Run", "statements": [
                    { "kind": "Expression", "expression": {
                        "kind": "BinaryOperator", "operator": "Add",
                        "left": { "kind": "CodeLambdaExpression" },
                        "right": { "kind": "CodeDefaultValueExpression" } } },
                    { "kind": "Condition",
                      "condition": { "kind": "CodeIsPatternExpression" },
                      "true_statements": [
                        { "kind": "CodeYieldStatement" },
                        { "kind": "Expression", "expression": {
                            "kind": "VariableReference", "variable_name": "kept" } }
                      ] }
                ]}]
            }]}]}"#,
        )
        .unwrap();

        let compilation = assert_lowering_reports(&tree, ErrorKind::StructuralTranslation, 4);
        let kinds: Vec<_> = compilation.errors.iter().map(|d| d.argument.as_str()).collect();
        assert_eq!(
            kinds,
            [
                "CodeLambdaExpression",
                "CodeDefaultValueExpression",
                "CodeIsPatternExpression",
                "CodeYieldStatement",
            ]
        );
        assert_eq!(
            compilation.body_text("Jobs.Worker", "Run").unwrap(),
            "{ (<missing> + <missing>); if <missing> { kept; } else { }; }"
        );
    }

    #[test]
    fn test_unresolved_references_are_reported_once_each() {
        let tree = CodeCompileUnit {
            referenced_assemblies: vec![
                "System".to_string(),
                "Missing.Lib".to_string(),
                "System".to_string(),
            ],
            ..CodeCompileUnit::default()
        };
        let compilation = assert_lowering_reports(&tree, ErrorKind::ReferenceResolution, 1);

        let module = compilation.universe.module(compilation.module).unwrap();
        assert_eq!(module.assembly_references.len(), 1);
        assert!(compilation
            .render_errors()
            .starts_with("error[ER001]: could not resolve assembly reference `Missing.Lib`"));
    }

    #[test]
    fn test_aliased_assemblies_share_a_reference() {
        let tree = CodeCompileUnit {
            referenced_assemblies: vec!["mscorlib".to_string(), "System.Private.CoreLib".to_string()],
            ..CodeCompileUnit::default()
        };
        let mut resolver = StaticResolver::new()
            .with_assembly("mscorlib", "corlib")
            .with_assembly("System.Private.CoreLib", "corlib");
        let compilation = lower_with(&tree, &mut resolver).unwrap();

        assert!(compilation.success());
        assert_eq!(resolver.requests().len(), 2);
        let module = compilation.universe.module(compilation.module).unwrap();
        assert_eq!(module.assembly_references.len(), 1);
        assert_eq!(module.assembly_references[0].name, "mscorlib");
    }

    #[test]
    fn test_snippet_unit_takes_its_pragma() {
        let tree = CodeCompileUnit {
            snippet: Some(CodeSnippetUnit {
                value: "class Legacy {}".to_string(),
                line_pragma: Some(CodeLinePragma {
                    file_name: "legacy.cs".to_string(),
                    line_number: 7,
                }),
            }),
            ..CodeCompileUnit::default()
        };
        let compilation = lower(&tree).unwrap();

        assert!(compilation.unit.is_snippet);
        assert_eq!(compilation.unit.name, Some(Identifier::new("legacy.cs")));
        let source = compilation.unit.source.as_ref().unwrap();
        assert_eq!(source.text(), "class Legacy {}");
        assert_eq!(source.document.display_name(), "legacy.cs");
        assert_eq!(compilation.unit.root.source.as_ref(), Some(source));
    }

    // =========================================
    // Guard instrumentation
    // =========================================

    #[test]
    fn test_guarded_write_evaluates_its_target_once() {
        init_tracing();
        let compilation = assert_compiles(&bank());
        let well_known = WellKnown::from_universe(&compilation.universe).unwrap();
        let next = compilation.find_method("Bank.Account", "Next").unwrap();

        let deposit = compilation.body("Bank.Account", "Deposit").unwrap();
        assert_eq!(deposit.len(), 1);
        let text = deposit.to_string();
        assert_eq!(occurrences(&text, &format!("<{}>()", next)), 1);
        assert_eq!(
            occurrences(&text, &format!("<{}>()", well_known.check_is_writing)),
            1
        );
        assert_eq!(
            occurrences(&text, &format!("<{}>()", well_known.check_is_reading)),
            1
        );
    }

    #[test]
    fn test_frame_field_is_not_guarded() {
        let compilation = assert_compiles(&bank());
        let frame = compilation.find_member("Bank.Account", "frame").unwrap();
        assert_eq!(
            compilation.body_text("Bank.Account", "GetFrame").unwrap(),
            format!("{{ return this.<{}>; }}", frame)
        );

        let contract = compilation
            .type_node("Bank.Account")
            .unwrap()
            .contract
            .clone()
            .unwrap();
        assert_eq!(contract.frame_field, Some(frame));
        assert_eq!(
            contract.frame_getter,
            compilation.find_method("Bank.Account", "GetFrame")
        );
    }

    // =========================================
    // Conditional elimination
    // =========================================

    #[test]
    fn test_undefined_symbol_removes_the_call_and_its_argument() {
        let compilation = assert_compiles(&bank());
        let log = compilation.find_method("Bank.Account", "Log").unwrap();
        let balance = compilation.find_member("Bank.Account", "balance").unwrap();

        let text = compilation.body_text("Bank.Account", "Deposit").unwrap();
        assert!(!text.contains(&format!("<{}>", log)));
        // the write target and the right-hand read remain
        assert_eq!(occurrences(&text, &format!("<{}>", balance)), 2);
    }

    #[test]
    fn test_defined_symbol_keeps_the_call() {
        let mut tree = bank();
        tree.defined_symbols = Some(vec!["DEBUG".to_string()]);
        let compilation = assert_compiles(&tree);
        let log = compilation.find_method("Bank.Account", "Log").unwrap();

        let deposit = compilation.body("Bank.Account", "Deposit").unwrap();
        assert_eq!(deposit.len(), 2);
        assert!(deposit.to_string().contains(&format!("<{}>(", log)));
    }

    // =========================================
    // Precondition propagation
    // =========================================

    #[test]
    fn test_private_method_gets_implicit_preconditions() {
        let config = PipelineConfig {
            instrument_guards: false,
            ..PipelineConfig::default()
        };
        let compilation = compile_with(&bank(), config).unwrap();

        assert_eq!(
            compilation.implicit_preconditions("Bank.Account", "Audit"),
            ["this != null"]
        );
        assert!(compilation
            .implicit_preconditions("Bank.Account", "Deposit")
            .is_empty());
    }

    #[test]
    fn test_preconditions_see_through_guard_temporaries() {
        let compilation = assert_compiles(&bank());
        let preconditions = compilation.implicit_preconditions("Bank.Account", "Audit");
        assert_eq!(preconditions.len(), 2);
        assert!(preconditions.contains(&"this != null".to_string()));
        assert!(preconditions.iter().all(|p| !p.contains("$t")));
    }

    // =========================================
    // Pipeline
    // =========================================

    #[test]
    fn test_config_from_json_selects_passes() {
        let config = PipelineConfig::from_json(
            r#"{ "instrument_guards": false, "eliminate_conditionals": false }"#,
        )
        .unwrap();
        let compilation = compile_with(&bank(), config).unwrap();
        assert_eq!(compilation.passes, ["precondition-propagation"]);

        let text = compilation.body_text("Bank.Account", "Deposit").unwrap();
        let log = compilation.find_method("Bank.Account", "Log").unwrap();
        assert!(text.contains(&format!("<{}>(", log)));
        assert!(!text.contains("$t0"));
    }

    #[test]
    fn test_errors_stop_the_passes() {
        let mut tree = bank();
        tree.referenced_assemblies.push("Missing.Lib".to_string());

        let compilation = compile(&tree).unwrap();
        assert!(!compilation.success());
        assert!(compilation.passes.is_empty());
        let text = compilation.body_text("Bank.Account", "Deposit").unwrap();
        assert!(!text.contains("$t0"));

        let config = PipelineConfig {
            stop_on_error: false,
            ..PipelineConfig::default()
        };
        let compilation = compile_with(&tree, config).unwrap();
        assert_eq!(compilation.passes.len(), 3);
    }

    #[test]
    fn test_missing_core_library_is_an_internal_error() {
        let mut compilation = lower(&bank()).unwrap();
        compilation.universe = TypeUniverse::new();
        assert!(matches!(
            WellKnown::from_universe(&compilation.universe),
            Err(InternalError::MissingWellKnown(_))
        ));
    }

    #[test]
    fn test_ir_lists_members() {
        assert_ir_contains(&bank(), "class Bank.Account (type#1:0)");
        assert_ir_contains(&bank(), "[if DEBUG]");
    }
}
