//! The heap value model.
//!
//! Every runtime value is a [`Value`]: a cheap handle (`Rc`) to a heap
//! object carrying a typed payload and an insertion-ordered attribute map.
//! Cloning a handle is taking a reference; dropping the last handle destroys
//! the object and releases everything it owns (list elements, dict entries,
//! attributes, nested code objects). Reference cycles are not collected.

pub mod magic;

use crate::bytecode::CodeObject;
use crate::error::RillResult;
use crate::host::Host;
use indexmap::IndexMap;
use num_bigint::BigInt;
use num_rational::BigRational;
use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::rc::Rc;

/// Signature of a native (host-provided) function.
///
/// The receiver is passed explicitly and is *not* repeated in the argument
/// slice. Free-standing built-ins receive `Nil` as the receiver.
pub type NativeFn = fn(&mut dyn Host, &Value, &[Value]) -> RillResult<Value>;

// =============================================================================
// Type Tags
// =============================================================================

/// Type tag of a heap object. Immutable after construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum Type {
    /// The nil singleton.
    Nil = 0,
    /// Boolean.
    Bool = 1,
    /// Unbounded-precision integer.
    Int = 2,
    /// Reduced rational with positive denominator.
    Rational = 3,
    /// UTF-8 string.
    Str = 4,
    /// Ordered sequence of values.
    List = 5,
    /// String-keyed mapping.
    Dict = 6,
    /// Immutable bytecode object.
    Code = 7,
    /// User function (name, code, arity).
    Function = 8,
    /// Native host function.
    Native = 9,
    /// Module: named code plus exported bindings.
    Module = 10,
}

impl Type {
    /// Number of type tags, sizing per-type dispatch tables.
    pub const COUNT: usize = 11;

    /// The user-visible type name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Nil => "Nil",
            Self::Bool => "Bool",
            Self::Int => "Int",
            Self::Rational => "Rational",
            Self::Str => "String",
            Self::List => "List",
            Self::Dict => "Dict",
            Self::Code => "Code",
            Self::Function => "Function",
            Self::Native => "NativeFunction",
            Self::Module => "Module",
        }
    }

    /// Index into per-type tables.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// Payloads
// =============================================================================

/// User function data.
#[derive(Debug, Clone)]
pub struct FunctionData {
    /// Function name (`<lambda>` for anonymous functions).
    pub name: String,
    /// Compiled body. The function owns one reference.
    pub code: Rc<CodeObject>,
    /// Number of required positional parameters.
    pub arity: usize,
}

/// Native function data.
#[derive(Clone, Copy)]
pub struct NativeData {
    /// Name used in renderings and error messages.
    pub name: &'static str,
    /// The host callable.
    pub func: NativeFn,
}

impl fmt::Debug for NativeData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeData").field("name", &self.name).finish()
    }
}

/// Module data. Exported bindings live in the object's attribute map.
#[derive(Debug, Clone)]
pub struct ModuleData {
    /// Module name.
    pub name: String,
    /// Top-level code, absent for native modules.
    pub code: Option<Rc<CodeObject>>,
}

/// The typed payload of a heap object.
#[derive(Debug)]
pub enum Payload {
    /// Nil.
    Nil,
    /// Boolean.
    Bool(bool),
    /// Unbounded integer.
    Int(BigInt),
    /// Reduced rational; sign on the numerator, denominator positive.
    Rational(BigRational),
    /// String.
    Str(String),
    /// List elements, owned by the list.
    List(RefCell<Vec<Value>>),
    /// Dict. Entries live in the object's attribute map.
    Dict,
    /// Bytecode object.
    Code(Rc<CodeObject>),
    /// User function.
    Function(FunctionData),
    /// Native function.
    Native(NativeData),
    /// Module.
    Module(ModuleData),
}

/// A heap object: payload plus attribute map.
#[derive(Debug)]
pub struct Obj {
    payload: Payload,
    attrs: RefCell<IndexMap<String, Value>>,
}

// =============================================================================
// Value Handle
// =============================================================================

/// A reference-counted handle to a heap object.
#[derive(Clone)]
pub struct Value(Rc<Obj>);

thread_local! {
    static NIL: Value = Value::alloc(Payload::Nil);
    static TRUE: Value = Value::alloc(Payload::Bool(true));
    static FALSE: Value = Value::alloc(Payload::Bool(false));
}

impl Value {
    fn alloc(payload: Payload) -> Self {
        Self(Rc::new(Obj {
            payload,
            attrs: RefCell::new(IndexMap::new()),
        }))
    }

    /// The nil singleton.
    #[must_use]
    pub fn nil() -> Self {
        NIL.with(Self::clone)
    }

    /// A boolean. `true` and `false` are singletons.
    #[must_use]
    pub fn bool(value: bool) -> Self {
        if value {
            TRUE.with(Self::clone)
        } else {
            FALSE.with(Self::clone)
        }
    }

    /// A fresh integer.
    #[must_use]
    pub fn int(value: impl Into<BigInt>) -> Self {
        Self::alloc(Payload::Int(value.into()))
    }

    /// A fresh rational. `BigRational` keeps the reduced, positive-denominator
    /// canonical form.
    #[must_use]
    pub fn rational(value: BigRational) -> Self {
        Self::alloc(Payload::Rational(value))
    }

    /// A fresh string.
    #[must_use]
    pub fn str(value: impl Into<String>) -> Self {
        Self::alloc(Payload::Str(value.into()))
    }

    /// A fresh list owning its elements.
    #[must_use]
    pub fn list(items: Vec<Value>) -> Self {
        Self::alloc(Payload::List(RefCell::new(items)))
    }

    /// A fresh empty dict.
    #[must_use]
    pub fn dict() -> Self {
        Self::alloc(Payload::Dict)
    }

    /// A code object value.
    #[must_use]
    pub fn code(code: Rc<CodeObject>) -> Self {
        Self::alloc(Payload::Code(code))
    }

    /// A user function.
    #[must_use]
    pub fn function(name: impl Into<String>, code: Rc<CodeObject>, arity: usize) -> Self {
        Self::alloc(Payload::Function(FunctionData {
            name: name.into(),
            code,
            arity,
        }))
    }

    /// A native function.
    #[must_use]
    pub fn native(name: &'static str, func: NativeFn) -> Self {
        Self::alloc(Payload::Native(NativeData { name, func }))
    }

    /// A module without code (native modules).
    #[must_use]
    pub fn module(name: impl Into<String>) -> Self {
        Self::alloc(Payload::Module(ModuleData {
            name: name.into(),
            code: None,
        }))
    }

    /// A module with top-level code.
    #[must_use]
    pub fn module_with_code(name: impl Into<String>, code: Rc<CodeObject>) -> Self {
        Self::alloc(Payload::Module(ModuleData {
            name: name.into(),
            code: Some(code),
        }))
    }

    // =========================================================================
    // Inspection
    // =========================================================================

    /// The payload.
    #[inline]
    #[must_use]
    pub fn payload(&self) -> &Payload {
        &self.0.payload
    }

    /// The type tag.
    #[must_use]
    pub fn type_of(&self) -> Type {
        match self.0.payload {
            Payload::Nil => Type::Nil,
            Payload::Bool(_) => Type::Bool,
            Payload::Int(_) => Type::Int,
            Payload::Rational(_) => Type::Rational,
            Payload::Str(_) => Type::Str,
            Payload::List(_) => Type::List,
            Payload::Dict => Type::Dict,
            Payload::Code(_) => Type::Code,
            Payload::Function(_) => Type::Function,
            Payload::Native(_) => Type::Native,
            Payload::Module(_) => Type::Module,
        }
    }

    /// Check for nil.
    #[inline]
    #[must_use]
    pub fn is_nil(&self) -> bool {
        matches!(self.0.payload, Payload::Nil)
    }

    /// Unwrap a boolean payload.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self.0.payload {
            Payload::Bool(b) => Some(b),
            _ => None,
        }
    }

    /// Borrow an integer payload.
    #[must_use]
    pub fn as_int(&self) -> Option<&BigInt> {
        match &self.0.payload {
            Payload::Int(i) => Some(i),
            _ => None,
        }
    }

    /// Borrow a rational payload.
    #[must_use]
    pub fn as_rational(&self) -> Option<&BigRational> {
        match &self.0.payload {
            Payload::Rational(r) => Some(r),
            _ => None,
        }
    }

    /// Borrow a string payload.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match &self.0.payload {
            Payload::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Borrow list elements.
    #[must_use]
    pub fn list_items(&self) -> Option<Ref<'_, Vec<Value>>> {
        match &self.0.payload {
            Payload::List(items) => Some(items.borrow()),
            _ => None,
        }
    }

    /// Mutably borrow list elements.
    #[must_use]
    pub fn list_items_mut(&self) -> Option<RefMut<'_, Vec<Value>>> {
        match &self.0.payload {
            Payload::List(items) => Some(items.borrow_mut()),
            _ => None,
        }
    }

    /// Pointer identity, the semantics of the `is` operator.
    #[inline]
    #[must_use]
    pub fn ptr_eq(&self, other: &Value) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Number of live handles to this object.
    #[must_use]
    pub fn refcount(&self) -> usize {
        Rc::strong_count(&self.0)
    }

    /// Base truthiness: nil is false, booleans unwrap, everything else is
    /// true. The VM consults a type's `bool` magic slot before this.
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        match self.0.payload {
            Payload::Nil => false,
            Payload::Bool(b) => b,
            _ => true,
        }
    }

    // =========================================================================
    // Attributes
    // =========================================================================

    /// Borrow the attribute map. For dicts this is the entry map.
    #[must_use]
    pub fn attrs(&self) -> Ref<'_, IndexMap<String, Value>> {
        self.0.attrs.borrow()
    }

    /// Look up an attribute, taking a new reference to the value.
    #[must_use]
    pub fn get_attr(&self, name: &str) -> Option<Value> {
        self.0.attrs.borrow().get(name).cloned()
    }

    /// Install an attribute, releasing any previous binding.
    pub fn set_attr(&self, name: impl Into<String>, value: Value) {
        self.0.attrs.borrow_mut().insert(name.into(), value);
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

// =============================================================================
// Rendering
// =============================================================================

impl fmt::Display for Value {
    /// The `to_string` rendering used by `print`, the REPL echo, and
    /// diagnostics. Strings render with their surrounding quotes.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0.payload {
            Payload::Nil => f.write_str("Nil"),
            Payload::Bool(true) => f.write_str("True"),
            Payload::Bool(false) => f.write_str("False"),
            Payload::Int(i) => write!(f, "{}", i),
            Payload::Rational(r) => write!(f, "{}/{}", r.numer(), r.denom()),
            Payload::Str(s) => write!(f, "\"{}\"", s),
            Payload::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.borrow().iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
            Payload::Dict => {
                f.write_str("{")?;
                for (i, (key, value)) in self.0.attrs.borrow().iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", key, value)?;
                }
                f.write_str("}")
            }
            Payload::Code(code) => {
                write!(f, "<code object: {} instructions>", code.instructions.len())
            }
            Payload::Function(func) => write!(f, "<function {}/{}>", func.name, func.arity),
            Payload::Native(native) => write!(f, "<native function {}>", native.name),
            Payload::Module(module) => write!(f, "<module \"{}\">", module.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_traits::One;

    #[test]
    fn test_singletons_share_identity() {
        assert!(Value::nil().ptr_eq(&Value::nil()));
        assert!(Value::bool(true).ptr_eq(&Value::bool(true)));
        assert!(!Value::bool(true).ptr_eq(&Value::bool(false)));
    }

    #[test]
    fn test_type_tags() {
        assert_eq!(Value::nil().type_of(), Type::Nil);
        assert_eq!(Value::int(3).type_of(), Type::Int);
        assert_eq!(Value::str("x").type_of(), Type::Str);
        assert_eq!(Value::list(vec![]).type_of(), Type::List);
        assert_eq!(Value::dict().type_of(), Type::Dict);
        assert_eq!(Type::Str.name(), "String");
        assert_eq!(Type::Module.index(), Type::COUNT - 1);
    }

    #[test]
    fn test_renderings() {
        assert_eq!(Value::nil().to_string(), "Nil");
        assert_eq!(Value::bool(true).to_string(), "True");
        assert_eq!(Value::bool(false).to_string(), "False");
        assert_eq!(Value::int(42).to_string(), "42");
        assert_eq!(Value::str("hi").to_string(), "\"hi\"");

        let third = BigRational::new(BigInt::from(1), BigInt::from(3));
        assert_eq!(Value::rational(third).to_string(), "1/3");

        // Even a whole-valued rational keeps the slash form.
        let two = BigRational::new(BigInt::from(4), BigInt::from(2));
        assert_eq!(Value::rational(two).to_string(), "2/1");
    }

    #[test]
    fn test_list_rendering() {
        let list = Value::list(vec![Value::int(1), Value::int(2), Value::int(3)]);
        assert_eq!(list.to_string(), "[1, 2, 3]");
        assert_eq!(Value::list(vec![]).to_string(), "[]");
    }

    #[test]
    fn test_dict_rendering_is_insertion_ordered() {
        let dict = Value::dict();
        dict.set_attr("b", Value::int(2));
        dict.set_attr("a", Value::int(1));
        assert_eq!(dict.to_string(), "{b: 2, a: 1}");
    }

    #[test]
    fn test_rational_canonical_form() {
        let r = BigRational::new(BigInt::from(2), BigInt::from(-4));
        let value = Value::rational(r);
        let inner = value.as_rational().unwrap();
        // Sign lives on the numerator, fraction fully reduced.
        assert_eq!(inner.numer(), &BigInt::from(-1));
        assert_eq!(inner.denom(), &BigInt::from(2));
    }

    #[test]
    fn test_truthiness() {
        assert!(!Value::nil().is_truthy());
        assert!(!Value::bool(false).is_truthy());
        assert!(Value::bool(true).is_truthy());
        assert!(Value::int(0).is_truthy());
        assert!(Value::str("").is_truthy());
        assert!(Value::list(vec![]).is_truthy());
    }

    #[test]
    fn test_attr_store_releases_old_binding() {
        let obj = Value::dict();
        let first = Value::int(1);
        obj.set_attr("k", first.clone());
        assert_eq!(first.refcount(), 2);

        obj.set_attr("k", Value::int(2));
        assert_eq!(first.refcount(), 1);
        assert_eq!(obj.get_attr("k").unwrap().to_string(), "2");
    }

    #[test]
    fn test_list_owns_elements() {
        let element = Value::str("owned");
        let count = element.refcount();
        let list = Value::list(vec![element.clone()]);
        assert_eq!(element.refcount(), count + 1);
        drop(list);
        assert_eq!(element.refcount(), count);
    }

    #[test]
    fn test_as_accessors() {
        assert_eq!(Value::int(7).as_int(), Some(&BigInt::from(7)));
        assert_eq!(Value::bool(true).as_bool(), Some(true));
        assert_eq!(Value::str("s").as_str(), Some("s"));
        assert!(Value::int(7).as_str().is_none());
        assert!(Value::rational(BigRational::one()).as_rational().is_some());
    }
}
