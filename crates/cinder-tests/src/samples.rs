//! Sample code trees

use cinder_codetree::{
    CodeCompileUnit, CodeNamespace, CodeTypeDeclaration, CodeTypeKind, TypeAttributes,
};

/// A bank account whose state sits behind a guard
///
/// `Account` holds its guard in `frame` and hands it out through `GetFrame`.
/// `Deposit` writes through a call (`this.Next().balance = this.balance + 1`)
/// and then logs through `Log`, which only exists when `DEBUG` is defined.
/// `Audit` is private and reads the balance.
pub const BANK: &str = r#"{
  "referenced_assemblies": ["System", "Microsoft.Contracts"],
  "namespaces": [{
    "name": "Bank",
    "imports": ["System"],
    "types": [{
      "name": "Account",
      "type_kind": { "kind": "Class" },
      "type_attributes": 1,
      "members": [
        { "kind": "Field", "name": "frame",
          "type": { "base_type": "Microsoft.Contracts.Guard" } },
        { "kind": "Method", "name": "GetFrame", "attributes": 24578,
          "return_type": { "base_type": "Microsoft.Contracts.Guard" },
          "statements": [
            { "kind": "MethodReturn",
              "expression": { "kind": "FieldReference",
                              "target_object": { "kind": "ThisReference" },
                              "field_name": "frame" } }
          ] },
        { "kind": "Field", "name": "balance",
          "type": { "base_type": "System.Int32" } },
        { "kind": "Method", "name": "Next", "attributes": 24578,
          "return_type": { "base_type": "Bank.Account" },
          "statements": [
            { "kind": "MethodReturn", "expression": { "kind": "ThisReference" } }
          ] },
        { "kind": "Method", "name": "Log", "attributes": 24579,
          "parameters": [
            { "name": "message", "type": { "base_type": "System.Int32" } }
          ],
          "custom_attributes": [
            { "name": "System.Diagnostics.Conditional",
              "arguments": [
                { "value": { "kind": "Primitive", "value": { "String": "DEBUG" } } }
              ] }
          ] },
        { "kind": "Method", "name": "Deposit", "attributes": 24578,
          "statements": [
            { "kind": "Assign",
              "left": { "kind": "FieldReference",
                        "target_object": {
                          "kind": "MethodInvoke",
                          "method": { "target_object": { "kind": "ThisReference" },
                                      "method_name": "Next" }
                        },
                        "field_name": "balance" },
              "right": { "kind": "BinaryOperator",
                         "left": { "kind": "FieldReference",
                                   "target_object": { "kind": "ThisReference" },
                                   "field_name": "balance" },
                         "operator": "Add",
                         "right": { "kind": "Primitive", "value": { "Int32": 1 } } } },
            { "kind": "Expression",
              "expression": {
                "kind": "MethodInvoke",
                "method": { "method_name": "Log" },
                "parameters": [
                  { "kind": "FieldReference",
                    "target_object": { "kind": "ThisReference" },
                    "field_name": "balance" }
                ]
              } }
          ] },
        { "kind": "Method", "name": "Audit", "attributes": 20482,
          "return_type": { "base_type": "System.Int32" },
          "statements": [
            { "kind": "MethodReturn",
              "expression": { "kind": "FieldReference",
                              "target_object": { "kind": "ThisReference" },
                              "field_name": "balance" } }
          ] }
      ]
    }]
  }]
}"#;

/// The parsed [`BANK`] tree
pub fn bank() -> CodeCompileUnit {
    match CodeCompileUnit::from_json(BANK) {
        Ok(tree) => tree,
        Err(err) => panic!("sample tree does not parse: {}", err),
    }
}

/// A public class with no members
pub fn class(name: &str) -> CodeTypeDeclaration {
    CodeTypeDeclaration::new(name, CodeTypeKind::Class)
        .with_attributes(TypeAttributes::new(TypeAttributes::PUBLIC))
}

/// A public struct with no members
pub fn structure(name: &str) -> CodeTypeDeclaration {
    CodeTypeDeclaration::new(name, CodeTypeKind::Struct)
        .with_attributes(TypeAttributes::new(TypeAttributes::PUBLIC))
}

/// A unit with one namespace holding `types`
pub fn unit_with(namespace: &str, types: Vec<CodeTypeDeclaration>) -> CodeCompileUnit {
    CodeCompileUnit {
        namespaces: vec![CodeNamespace {
            name: namespace.to_string(),
            types,
            ..CodeNamespace::default()
        }],
        ..CodeCompileUnit::default()
    }
}
