//! Semantic types.
//!
//! `Type` is what a `TypeName` resolves to once aliases and user types are
//! known. The primitive and literal tables are built once and shared by every
//! compilation.

use std::{collections::HashMap, fmt::Display};

use lazy_static::lazy_static;

use crate::{ast::expressions::LiteralKind, scope::scope::ScopeId, Span};

lazy_static! {
    pub static ref PRIMITIVE_TYPES: HashMap<&'static str, Primitive> = build_primitive_table();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    None,
    Bool,
    Char,
    String,
    Object,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
}

impl Primitive {
    pub fn name(&self) -> &'static str {
        match self {
            Primitive::None => "none",
            Primitive::Bool => "bool",
            Primitive::Char => "char",
            Primitive::String => "string",
            Primitive::Object => "object",
            Primitive::I8 => "i8",
            Primitive::I16 => "i16",
            Primitive::I32 => "i32",
            Primitive::I64 => "i64",
            Primitive::U8 => "u8",
            Primitive::U16 => "u16",
            Primitive::U32 => "u32",
            Primitive::U64 => "u64",
            Primitive::F32 => "f32",
            Primitive::F64 => "f64",
        }
    }

    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            Primitive::I8
                | Primitive::I16
                | Primitive::I32
                | Primitive::I64
                | Primitive::U8
                | Primitive::U16
                | Primitive::U32
                | Primitive::U64
        )
    }

    pub fn is_float(&self) -> bool {
        matches!(self, Primitive::F32 | Primitive::F64)
    }
}

pub fn build_primitive_table() -> HashMap<&'static str, Primitive> {
    [
        Primitive::None,
        Primitive::Bool,
        Primitive::Char,
        Primitive::String,
        Primitive::Object,
        Primitive::I8,
        Primitive::I16,
        Primitive::I32,
        Primitive::I64,
        Primitive::U8,
        Primitive::U16,
        Primitive::U32,
        Primitive::U64,
        Primitive::F32,
        Primitive::F64,
    ]
    .into_iter()
    .map(|primitive| (primitive.name(), primitive))
    .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    Primitive(Primitive),
    Pointer(Box<Type>),
    Array(Box<Type>),
    Tuple(Vec<Type>),
    /// A struct, enum or union registered in the [`TypeRegistry`].
    Named(String),
    /// Result of a failed deduction. Never reported twice.
    Unknown,
}

impl Type {
    pub fn void() -> Self {
        Type::Primitive(Primitive::None)
    }

    pub fn object() -> Self {
        Type::Primitive(Primitive::Object)
    }

    pub fn bool() -> Self {
        Type::Primitive(Primitive::Bool)
    }

    pub fn string() -> Self {
        Type::Primitive(Primitive::String)
    }

    pub fn i32() -> Self {
        Type::Primitive(Primitive::I32)
    }

    pub fn is_unknown(&self) -> bool {
        match self {
            Type::Unknown => true,
            Type::Pointer(inner) | Type::Array(inner) => inner.is_unknown(),
            Type::Tuple(elements) => elements.iter().any(Type::is_unknown),
            _ => false,
        }
    }

    pub fn is_void(&self) -> bool {
        *self == Type::void()
    }

    pub fn is_object(&self) -> bool {
        *self == Type::object()
    }

    pub fn is_bool(&self) -> bool {
        *self == Type::bool()
    }

    pub fn is_string(&self) -> bool {
        *self == Type::string()
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, Type::Primitive(p) if p.is_integer())
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Type::Primitive(p) if p.is_integer() || p.is_float())
    }

    pub fn pointee(&self) -> Option<&Type> {
        match self {
            Type::Pointer(inner) => Some(inner),
            _ => None,
        }
    }

    /// Name of the user type this value belongs to, if any.
    pub fn named(&self) -> Option<&str> {
        match self {
            Type::Named(name) => Some(name),
            _ => None,
        }
    }

    /// Exact match, or any value into `object`. `none` is not a value, so it
    /// only matches itself. There is no numeric widening.
    pub fn is_assignable_to(&self, target: &Type) -> bool {
        self == target || (target.is_object() && !self.is_void())
    }
}

impl Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Type::Primitive(primitive) => write!(f, "{}", primitive.name()),
            Type::Pointer(inner) => write!(f, "{}*", inner),
            Type::Array(inner) => write!(f, "{}[]", inner),
            Type::Tuple(elements) => {
                let inner = elements.iter().map(|e| e.to_string()).collect::<Vec<String>>();
                write!(f, "({})", inner.join(", "))
            }
            Type::Named(name) => write!(f, "{}", name),
            Type::Unknown => write!(f, "<unknown>"),
        }
    }
}

/// Static type of a literal token.
///
/// # Returns
///
/// `None` when the literal does not fit any integer type.
pub fn literal_type(kind: LiteralKind, value: &str) -> Option<Type> {
    let primitive = match kind {
        LiteralKind::Integer => integer_type(value.parse::<u64>().ok()?),
        LiteralKind::Hex => integer_type(u64::from_str_radix(value, 16).ok()?),
        LiteralKind::Binary => integer_type(u64::from_str_radix(value, 2).ok()?),
        LiteralKind::Float => {
            value.parse::<f64>().ok()?;
            Primitive::F64
        }
        LiteralKind::String => Primitive::String,
        LiteralKind::Char => Primitive::Char,
        LiteralKind::Bool => Primitive::Bool,
        LiteralKind::None => Primitive::Object,
    };

    Some(Type::Primitive(primitive))
}

fn integer_type(value: u64) -> Primitive {
    if value <= i32::MAX as u64 {
        Primitive::I32
    } else if value <= i64::MAX as u64 {
        Primitive::I64
    } else {
        Primitive::U64
    }
}

/// One callable: a free function, a method, an operator overload or a builtin.
#[derive(Debug, Clone, PartialEq)]
pub struct Signature {
    pub name: String,
    /// Containing type, the free-functions container, or `None` for builtins.
    pub owner: Option<String>,
    pub parameters: Vec<Parameter>,
    pub return_type: Type,
    pub is_static: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub ty: Type,
    pub is_out: bool,
}

impl Signature {
    pub fn builtin(name: &str, parameters: &[Type]) -> Self {
        Signature {
            name: name.to_string(),
            owner: None,
            parameters: parameters
                .iter()
                .enumerate()
                .map(|(i, ty)| Parameter {
                    name: format!("arg{}", i),
                    ty: ty.clone(),
                    is_out: false,
                })
                .collect(),
            return_type: Type::void(),
            is_static: true,
        }
    }

    pub fn is_builtin(&self) -> bool {
        self.owner.is_none()
    }

    pub fn parameter_types(&self) -> Vec<Type> {
        self.parameters.iter().map(|p| p.ty.clone()).collect()
    }

    /// Same name and parameter types. Return types do not take part.
    pub fn same_parameters(&self, other: &Signature) -> bool {
        self.name == other.name && self.parameter_types() == other.parameter_types()
    }
}

impl Display for Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parameters = self.parameters.iter().map(|p| p.ty.to_string()).collect::<Vec<String>>();
        write!(f, "{}({}) -> {}", self.name, parameters.join(", "), self.return_type)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    Struct,
    Enum,
    Union,
}

/// A user type. Its fields and methods live in `scope`.
#[derive(Debug, Clone)]
pub struct TypeDef {
    pub name: String,
    pub kind: TypeKind,
    pub scope: ScopeId,
    pub span: Span,
}

/// User types by name, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    types: HashMap<String, TypeDef>,
    order: Vec<String>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        TypeRegistry::default()
    }

    /// Returns false when a type with that name already exists.
    pub fn register(&mut self, def: TypeDef) -> bool {
        if self.types.contains_key(&def.name) || PRIMITIVE_TYPES.contains_key(def.name.as_str()) {
            return false;
        }

        self.order.push(def.name.clone());
        self.types.insert(def.name.clone(), def);
        true
    }

    pub fn get(&self, name: &str) -> Option<&TypeDef> {
        self.types.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TypeDef> {
        self.order.iter().filter_map(|name| self.types.get(name))
    }
}
