//! The scoped symbol table used while lowering a function body. Each
//! lexical block pushes a scope; declarations shadow outer bindings and
//! collide only within their own scope.

use flint_ir::Local;
use indexmap::IndexMap;

#[derive(Default)]
pub struct SymbolTable {
    scopes: Vec<IndexMap<String, Local>>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_scope(&mut self) {
        self.scopes.push(IndexMap::new());
    }

    pub fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    /// Bind `name` in the innermost scope. Fails when the scope already
    /// declares it.
    pub fn declare(&mut self, name: &str, local: Local) -> Result<(), ()> {
        let scope = self.scopes.last_mut().expect("no scope to declare into");
        if scope.contains_key(name) {
            return Err(());
        }
        scope.insert(name.to_string(), local);
        Ok(())
    }

    /// Resolve `name` against the innermost scope that binds it.
    pub fn lookup(&self, name: &str) -> Option<Local> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name).copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flint_ir::{LocalId, TyId};

    fn local(index: usize) -> Local {
        Local { id: LocalId::from_usize(index), ty: TyId::INT }
    }

    #[test]
    fn inner_scopes_shadow_and_unwind() {
        let mut symbols = SymbolTable::new();
        symbols.push_scope();
        symbols.declare("a", local(1)).unwrap();

        symbols.push_scope();
        symbols.declare("a", local(2)).unwrap();
        assert_eq!(symbols.lookup("a"), Some(local(2)));

        symbols.pop_scope();
        assert_eq!(symbols.lookup("a"), Some(local(1)));
    }

    #[test]
    fn redeclaration_in_one_scope_fails() {
        let mut symbols = SymbolTable::new();
        symbols.push_scope();
        symbols.declare("a", local(1)).unwrap();
        assert!(symbols.declare("a", local(2)).is_err());
    }
}
