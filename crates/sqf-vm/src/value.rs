use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::instruction::CodeBlock;
use crate::namespace::NamespaceRef;

/// Shared array storage. Assignment shares the reference; element mutation
/// is visible through every holder.
pub type ArrayRef = Rc<RefCell<Vec<Value>>>;

/// An opaque identity token for domain-typed handles (object, group, side
/// and similar). Two handles are equal only when they are the same token.
#[derive(Debug)]
pub struct ObjectHandle {
    kind: String,
}

impl ObjectHandle {
    pub fn new(kind: impl Into<String>) -> Rc<Self> {
        Rc::new(Self { kind: kind.into() })
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }
}

/// A runtime value.
///
/// Scalars, booleans, strings and nothing are value-semantic; arrays, code,
/// namespaces and object handles are shared and compare by identity.
#[derive(Clone, Debug)]
pub enum Value {
    Nothing,
    Boolean(bool),
    Scalar(f64),
    String(Rc<str>),
    Array(ArrayRef),
    Code(Rc<CodeBlock>),
    Namespace(NamespaceRef),
    Object(Rc<ObjectHandle>),
}

impl Value {
    /// The uppercase type name used by `typeName` and the assembly surface.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nothing => "NOTHING",
            Value::Boolean(_) => "BOOL",
            Value::Scalar(_) => "SCALAR",
            Value::String(_) => "STRING",
            Value::Array(_) => "ARRAY",
            Value::Code(_) => "CODE",
            Value::Namespace(_) => "NAMESPACE",
            Value::Object(_) => "OBJECT",
        }
    }

    pub fn string(s: impl Into<String>) -> Self {
        Value::String(Rc::from(s.into()))
    }

    /// Fresh shared array from elements.
    pub fn array(elements: Vec<Value>) -> Self {
        Value::Array(Rc::new(RefCell::new(elements)))
    }

    pub fn code(block: CodeBlock) -> Self {
        Value::Code(Rc::new(block))
    }

    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            Value::Scalar(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<ArrayRef> {
        match self {
            Value::Array(a) => Some(Rc::clone(a)),
            _ => None,
        }
    }

    pub fn as_code(&self) -> Option<Rc<CodeBlock>> {
        match self {
            Value::Code(c) => Some(Rc::clone(c)),
            _ => None,
        }
    }

    pub fn as_namespace(&self) -> Option<NamespaceRef> {
        match self {
            Value::Namespace(n) => Some(Rc::clone(n)),
            _ => None,
        }
    }

    pub fn is_nothing(&self) -> bool {
        matches!(self, Value::Nothing)
    }

    /// Printable form: arrays `[a, b, c]`, strings quoted with doubled inner
    /// quotes. Self-containing arrays render the back-reference as `...`.
    pub fn as_string(&self) -> String {
        self.to_string()
    }

    /// Whether this value's array graph reaches back into itself.
    pub fn is_cyclic(&self) -> bool {
        fn walk(value: &Value, visited: &mut Vec<*const RefCell<Vec<Value>>>) -> bool {
            if let Value::Array(array) = value {
                let ptr = Rc::as_ptr(array);
                if visited.contains(&ptr) {
                    return true;
                }
                visited.push(ptr);
                let cyclic = array.borrow().iter().any(|v| walk(v, visited));
                visited.pop();
                cyclic
            } else {
                false
            }
        }
        walk(self, &mut Vec::new())
    }

    fn render(&self, f: &mut fmt::Formatter<'_>, visited: &mut Vec<*const RefCell<Vec<Value>>>) -> fmt::Result {
        match self {
            Value::Nothing => write!(f, "nil"),
            Value::Boolean(v) => write!(f, "{}", v),
            Value::Scalar(v) => write!(f, "{}", v),
            Value::String(s) => {
                write!(f, "\"")?;
                for c in s.chars() {
                    if c == '"' {
                        write!(f, "\"\"")?;
                    } else {
                        write!(f, "{}", c)?;
                    }
                }
                write!(f, "\"")
            }
            Value::Array(array) => {
                let ptr = Rc::as_ptr(array);
                if visited.contains(&ptr) {
                    return write!(f, "...");
                }
                visited.push(ptr);
                write!(f, "[")?;
                for (i, element) in array.borrow().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    element.render(f, visited)?;
                }
                visited.pop();
                write!(f, "]")
            }
            Value::Code(code) => write!(f, "{}", code),
            Value::Namespace(ns) => write!(f, "{}", ns.borrow().name()),
            Value::Object(handle) => write!(f, "<{}>", handle.kind()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.render(f, &mut Vec::new())
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nothing, Value::Nothing) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Scalar(a), Value::Scalar(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b),
            (Value::Code(a), Value::Code(b)) => Rc::ptr_eq(a, b),
            (Value::Namespace(a), Value::Namespace(b)) => Rc::ptr_eq(a, b),
            (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Scalar(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::string(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::array(v)
    }
}
