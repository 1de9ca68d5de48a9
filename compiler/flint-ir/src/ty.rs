//! The value types of the IR. Types are interned in a process-wide pool
//! that is seeded with the primitive types at startup; pointer types are
//! interned lazily the first time they are requested. Two [TyId]s denote
//! the same type exactly when they are equal.

use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;

use flint_target::Size;
use lazy_static::lazy_static;

/// A handle into the process-wide type pool. Equality of types is equality
/// of handles.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TyId(u32);

struct TyData {
    name: String,
    size: Size,
    pointee: Option<TyId>,
}

struct TyPool {
    tys: Vec<TyData>,
    pointers: HashMap<TyId, TyId>,
}

impl TyPool {
    fn seeded() -> Self {
        let primitive = |name: &str, size: u64| TyData {
            name: name.to_string(),
            size: Size::from_bytes(size),
            pointee: None,
        };

        Self {
            // Order matters: the distinguished constants below index into
            // this vector.
            tys: vec![
                primitive("int", 4),
                primitive("char", 1),
                primitive("short", 2),
                primitive("long", 8),
                primitive("bool", 1),
                primitive("void", 0),
            ],
            pointers: HashMap::new(),
        }
    }
}

lazy_static! {
    static ref TY_POOL: Mutex<TyPool> = Mutex::new(TyPool::seeded());
}

impl TyId {
    pub const INT: TyId = TyId(0);
    pub const CHAR: TyId = TyId(1);
    pub const SHORT: TyId = TyId(2);
    pub const LONG: TyId = TyId(3);
    pub const BOOL: TyId = TyId(4);
    pub const VOID: TyId = TyId(5);

    /// Intern (or look up) the pointer-to-`target` type.
    pub fn pointer_to(target: TyId) -> TyId {
        let mut pool = TY_POOL.lock().unwrap();
        if let Some(&existing) = pool.pointers.get(&target) {
            return existing;
        }

        let name = format!("{}*", pool.tys[target.0 as usize].name);
        let id = TyId(pool.tys.len() as u32);
        pool.tys.push(TyData { name, size: Size::from_bytes(8), pointee: Some(target) });
        pool.pointers.insert(target, id);
        id
    }

    /// Look up a primitive type by its source-level name.
    pub fn from_name(name: &str) -> Option<TyId> {
        match name {
            "int" => Some(Self::INT),
            "char" => Some(Self::CHAR),
            "short" => Some(Self::SHORT),
            "long" => Some(Self::LONG),
            "bool" => Some(Self::BOOL),
            "void" => Some(Self::VOID),
            _ => None,
        }
    }

    /// The width of a value of this type.
    pub fn size(self) -> Size {
        TY_POOL.lock().unwrap().tys[self.0 as usize].size
    }

    /// The type pointed to, for pointer types.
    pub fn pointee(self) -> Option<TyId> {
        TY_POOL.lock().unwrap().tys[self.0 as usize].pointee
    }

    pub fn is_pointer(self) -> bool {
        self.pointee().is_some()
    }

    /// The source-level name of the type, e.g. `int` or `char*`.
    pub fn name(self) -> String {
        TY_POOL.lock().unwrap().tys[self.0 as usize].name.clone()
    }
}

impl fmt::Display for TyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitive_sizes() {
        assert_eq!(TyId::INT.size().bytes(), 4);
        assert_eq!(TyId::CHAR.size().bytes(), 1);
        assert_eq!(TyId::SHORT.size().bytes(), 2);
        assert_eq!(TyId::LONG.size().bytes(), 8);
        assert_eq!(TyId::BOOL.size().bytes(), 1);
        assert_eq!(TyId::VOID.size().bytes(), 0);
    }

    #[test]
    fn pointer_types_are_interned() {
        let a = TyId::pointer_to(TyId::INT);
        let b = TyId::pointer_to(TyId::INT);
        assert_eq!(a, b);
        assert_eq!(a.size().bytes(), 8);
        assert_eq!(a.pointee(), Some(TyId::INT));
        assert_ne!(a, TyId::pointer_to(TyId::CHAR));
        assert_eq!(a.name(), "int*");
    }
}
