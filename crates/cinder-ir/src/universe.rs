//! Registry of every module visible to the passes

use crate::index::IndexVec;
use crate::member::{Body, Member, MemberKind, Method};
use crate::module::{CompilationUnit, MemberRef, Module, ModuleId, TypeId};
use crate::types::TypeNode;
use cinder_error::{InternalError, Result};

/// All modules: referenced libraries and the module under construction
#[derive(Debug, Clone, Default)]
pub struct TypeUniverse {
    modules: IndexVec<ModuleId, Module>,
}

impl TypeUniverse {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an empty module
    pub fn new_module(&mut self, name: impl Into<String>) -> ModuleId {
        let id = self.modules.next_index();
        self.modules.push(Module::new(id, name))
    }

    pub fn modules(&self) -> impl Iterator<Item = &Module> {
        self.modules.iter()
    }

    pub fn module(&self, id: ModuleId) -> Option<&Module> {
        self.modules.get(id)
    }

    pub fn module_mut(&mut self, id: ModuleId) -> Option<&mut Module> {
        self.modules.get_mut(id)
    }

    pub fn type_node(&self, id: TypeId) -> Result<&TypeNode> {
        self.modules
            .get(id.module)
            .and_then(|module| module.type_node(id))
            .ok_or_else(|| InternalError::DanglingType(id.to_string()))
    }

    pub fn type_node_mut(&mut self, id: TypeId) -> Result<&mut TypeNode> {
        self.modules
            .get_mut(id.module)
            .and_then(|module| module.type_node_mut(id))
            .ok_or_else(|| InternalError::DanglingType(id.to_string()))
    }

    pub fn member(&self, member: MemberRef) -> Result<&Member> {
        self.type_node(member.ty)?
            .members
            .get(member.index)
            .ok_or_else(|| dangling(member))
    }

    pub fn member_mut(&mut self, member: MemberRef) -> Result<&mut Member> {
        self.type_node_mut(member.ty)?
            .members
            .get_mut(member.index)
            .ok_or_else(|| dangling(member))
    }

    pub fn method(&self, member: MemberRef) -> Result<&Method> {
        self.member(member)?
            .as_method()
            .ok_or_else(|| dangling(member))
    }

    pub fn method_mut(&mut self, member: MemberRef) -> Result<&mut Method> {
        self.member_mut(member)?
            .as_method_mut()
            .ok_or_else(|| dangling(member))
    }

    /// Looks up a top-level type by its dotted full name
    pub fn find_type(&self, qualified: &str) -> Option<TypeId> {
        let (namespace, name) = match qualified.rfind('.') {
            Some(pos) => (&qualified[..pos], &qualified[pos + 1..]),
            None => ("", qualified),
        };
        self.modules
            .iter()
            .find_map(|module| module.find_type(namespace, name))
    }

    /// First member of a type with the given name
    pub fn find_member(&self, ty: TypeId, name: &str) -> Option<MemberRef> {
        let node = self.type_node(ty).ok()?;
        node.member_index(name).map(|index| MemberRef::new(ty, index))
    }

    /// First method of a type with the given name
    pub fn find_method(&self, ty: TypeId, name: &str) -> Option<MemberRef> {
        let node = self.type_node(ty).ok()?;
        node.members
            .iter()
            .position(|m| m.name == name && m.as_method().is_some())
            .map(|index| MemberRef::new(ty, index))
    }

    pub fn full_name(&self, ty: TypeId) -> Result<String> {
        let node = self.type_node(ty)?;
        match node.declaring_type {
            Some(outer) => Ok(format!("{}+{}", self.full_name(outer)?, node.name)),
            None => Ok(node.full_name()),
        }
    }

    /// Whether code outside the declaring assembly can call the method
    pub fn is_externally_visible(&self, method: MemberRef) -> Result<bool> {
        if !self.method(method)?.flags.visibility.is_visible_outside() {
            return Ok(false);
        }

        let mut current = Some(method.ty);
        while let Some(ty) = current {
            let node = self.type_node(ty)?;
            if !node.flags.visibility.is_visible_outside() {
                return Ok(false);
            }
            current = node.declaring_type;
        }
        Ok(true)
    }

    /// Takes a method's body out of the universe for rewriting
    pub fn detach_body(&mut self, method: MemberRef) -> Result<Option<Body>> {
        Ok(self.method_mut(method)?.body.take())
    }

    /// Puts a rewritten body back; fails if the method already has one
    pub fn attach_body(&mut self, method: MemberRef, body: Body) -> Result<()> {
        let slot = &mut self.method_mut(method)?.body;
        if slot.is_some() {
            return Err(InternalError::BodyConflict(method.to_string()));
        }
        *slot = Some(body);
        Ok(())
    }

    /// Methods of every type in the unit, nested types included, in declaration order
    pub fn unit_methods(&self, unit: &CompilationUnit) -> Result<Vec<MemberRef>> {
        let mut methods = Vec::new();
        let mut pending: Vec<TypeId> = unit.root.all_types();
        pending.reverse();

        while let Some(ty) = pending.pop() {
            let node = self.type_node(ty)?;
            let mut nested = Vec::new();
            for (index, member) in node.members.iter().enumerate() {
                match &member.kind {
                    MemberKind::Method(_) => methods.push(MemberRef::new(ty, index)),
                    MemberKind::NestedType(inner) => nested.push(*inner),
                    _ => {}
                }
            }
            pending.extend(nested.into_iter().rev());
        }

        Ok(methods)
    }
}

fn dangling(member: MemberRef) -> InternalError {
    InternalError::DanglingMember {
        ty: member.ty.to_string(),
        index: member.index,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code::Block;
    use crate::flags::{MethodFlags, TypeVisibility, Visibility};
    use crate::ident::Identifier;
    use crate::member::MethodKind;
    use crate::types::{TypeKind, TypeRef};

    fn universe_with_method(visibility: Visibility) -> (TypeUniverse, MemberRef) {
        let mut universe = TypeUniverse::new();
        let module = universe.new_module("Core");
        let mut node = TypeNode::new(TypeKind::Class, Identifier::new("Guard"), module);
        node.namespace = Identifier::new("Microsoft.Contracts");
        node.flags.visibility = TypeVisibility::Public;
        let ty = universe.module_mut(module).map(|m| m.add_type(node)).unwrap();

        let method = Method::new(
            MethodKind::Ordinary,
            MethodFlags::instance(visibility),
            TypeRef::VOID,
        )
        .with_body(Block::default());
        let member = Member::new(
            Identifier::new("CheckIsReading"),
            ty,
            MemberKind::Method(method),
        );
        universe.type_node_mut(ty).unwrap().members.push(member);
        (universe, MemberRef::new(ty, 0))
    }

    #[test]
    fn test_lookup_by_qualified_name() {
        let (universe, method) = universe_with_method(Visibility::Public);
        let guard = universe.find_type("Microsoft.Contracts.Guard");
        assert_eq!(guard, Some(method.ty));
        assert_eq!(universe.find_method(method.ty, "CheckIsReading"), Some(method));
        assert_eq!(universe.find_type("Guard"), None);
        assert_eq!(
            universe.full_name(method.ty).unwrap(),
            "Microsoft.Contracts.Guard"
        );
    }

    #[test]
    fn test_body_detach_and_attach() {
        let (mut universe, method) = universe_with_method(Visibility::Public);
        let body = universe.detach_body(method).unwrap().unwrap();
        assert!(universe.method(method).unwrap().body.is_none());

        universe.attach_body(method, body.clone()).unwrap();
        let err = universe.attach_body(method, body).unwrap_err();
        assert!(matches!(err, InternalError::BodyConflict(_)));
    }

    #[test]
    fn test_dangling_member_is_an_internal_error() {
        let (universe, method) = universe_with_method(Visibility::Public);
        let missing = MemberRef::new(method.ty, 9);
        assert_eq!(
            universe.member(missing).unwrap_err(),
            InternalError::DanglingMember {
                ty: method.ty.to_string(),
                index: 9
            }
        );
    }

    #[test]
    fn test_external_visibility_follows_declaring_types() {
        let (universe, method) = universe_with_method(Visibility::Assembly);
        assert!(!universe.is_externally_visible(method).unwrap());

        let (mut universe, method) = universe_with_method(Visibility::Public);
        assert!(universe.is_externally_visible(method).unwrap());
        universe.type_node_mut(method.ty).unwrap().flags.visibility = TypeVisibility::NotPublic;
        assert!(!universe.is_externally_visible(method).unwrap());
    }
}
