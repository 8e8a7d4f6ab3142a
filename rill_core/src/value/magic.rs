//! Per-type magic-method dispatch tables.
//!
//! Operator handlers are not stored on objects; each type tag owns a
//! fixed-size record of optional function pointers, one slot per operator
//! kind. Lookup is two array indexes, no heap indirection.

use crate::error::RillResult;
use crate::value::{Type, Value};

/// Signature of a magic-method handler.
///
/// The receiver is passed explicitly; the argument slice never repeats it.
/// Binary operators receive one argument, unary operators none.
pub type MagicFn = fn(&Value, &[Value]) -> RillResult<Value>;

/// Operator kinds dispatched through magic methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(usize)]
pub enum MagicOp {
    /// `+`
    Add = 0,
    /// `-`
    Sub = 1,
    /// `*`
    Mul = 2,
    /// `/`
    Div = 3,
    /// `%`
    Mod = 4,
    /// `^`
    Pow = 5,
    /// `==`
    Eq = 6,
    /// `<`
    Lt = 7,
    /// `>`
    Gt = 8,
    /// `in`
    In = 9,
    /// Truthiness override.
    Bool = 10,
}

impl MagicOp {
    /// Number of operator kinds, sizing the slot record.
    pub const COUNT: usize = 11;

    /// Slot index.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Source-level symbol, used in error messages.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Mod => "%",
            Self::Pow => "^",
            Self::Eq => "==",
            Self::Lt => "<",
            Self::Gt => ">",
            Self::In => "in",
            Self::Bool => "bool",
        }
    }
}

/// The slot record of one type: an optional handler per operator kind.
#[derive(Clone, Copy, Default)]
pub struct MagicTable {
    slots: [Option<MagicFn>; MagicOp::COUNT],
}

impl MagicTable {
    /// An empty table: every operation unsupported.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            slots: [None; MagicOp::COUNT],
        }
    }

    /// Populate a slot.
    #[inline]
    pub fn set(&mut self, op: MagicOp, func: MagicFn) {
        self.slots[op.index()] = Some(func);
    }

    /// Look up a slot.
    #[inline]
    #[must_use]
    pub fn get(&self, op: MagicOp) -> Option<MagicFn> {
        self.slots[op.index()]
    }
}

impl std::fmt::Debug for MagicTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let populated: Vec<&str> = (0..MagicOp::COUNT)
            .filter(|&i| self.slots[i].is_some())
            .map(|i| match i {
                0 => "add",
                1 => "sub",
                2 => "mul",
                3 => "div",
                4 => "mod",
                5 => "pow",
                6 => "eq",
                7 => "lt",
                8 => "gt",
                9 => "in",
                _ => "bool",
            })
            .collect();
        f.debug_struct("MagicTable").field("slots", &populated).finish()
    }
}

/// One magic table per type tag.
#[derive(Debug, Clone, Default)]
pub struct TypeTables {
    tables: [MagicTable; Type::COUNT],
}

impl TypeTables {
    /// Create empty tables for every type.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mutable access to a type's table, for registration.
    #[inline]
    pub fn table_mut(&mut self, ty: Type) -> &mut MagicTable {
        &mut self.tables[ty.index()]
    }

    /// Look up a handler for `(type, operator)`.
    #[inline]
    #[must_use]
    pub fn lookup(&self, ty: Type, op: MagicOp) -> Option<MagicFn> {
        self.tables[ty.index()].get(op)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stub(receiver: &Value, _args: &[Value]) -> RillResult<Value> {
        Ok(receiver.clone())
    }

    #[test]
    fn test_empty_table_has_no_slots() {
        let table = MagicTable::new();
        assert!(table.get(MagicOp::Add).is_none());
        assert!(table.get(MagicOp::Bool).is_none());
    }

    #[test]
    fn test_set_and_get() {
        let mut table = MagicTable::new();
        table.set(MagicOp::Add, stub);
        assert!(table.get(MagicOp::Add).is_some());
        assert!(table.get(MagicOp::Sub).is_none());
    }

    #[test]
    fn test_type_tables_lookup() {
        let mut tables = TypeTables::new();
        tables.table_mut(Type::Int).set(MagicOp::Mul, stub);

        assert!(tables.lookup(Type::Int, MagicOp::Mul).is_some());
        assert!(tables.lookup(Type::Int, MagicOp::Div).is_none());
        assert!(tables.lookup(Type::Str, MagicOp::Mul).is_none());
    }

    #[test]
    fn test_symbols() {
        assert_eq!(MagicOp::Add.symbol(), "+");
        assert_eq!(MagicOp::Pow.symbol(), "^");
        assert_eq!(MagicOp::In.symbol(), "in");
    }
}
