//! Constant values, stored by value rather than by constant-pool index.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A loadable constant.
///
/// Floating point values keep their IEEE-754 bit pattern so that constants
/// compare, hash and serialize exactly (`NaN` payloads and `-0.0` included).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Constant {
    Int(i32),
    /// `f32` bit pattern.
    Float(u32),
    Long(i64),
    /// `f64` bit pattern.
    Double(u64),
    String(String),
    /// Internal name or array descriptor.
    Class(String),
    MethodType(String),
    MethodHandle(Handle),
    Dynamic(Box<DynamicRef>),
}

impl Constant {
    pub fn float(value: f32) -> Self {
        Self::Float(value.to_bits())
    }

    pub fn double(value: f64) -> Self {
        Self::Double(value.to_bits())
    }

    /// Nesting depth of dynamic constants inside this constant.
    pub fn depth(&self) -> usize {
        match self {
            Self::Dynamic(dynamic) => dynamic.depth(),
            _ => 0,
        }
    }
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(bits) => write!(f, "{}f", f32::from_bits(*bits)),
            Self::Long(v) => write!(f, "{v}L"),
            Self::Double(bits) => write!(f, "{}d", f64::from_bits(*bits)),
            Self::String(s) => write!(f, "{s:?}"),
            Self::Class(name) => write!(f, "{name}.class"),
            Self::MethodType(desc) => write!(f, "MethodType {desc}"),
            Self::MethodHandle(handle) => write!(f, "{handle}"),
            Self::Dynamic(dynamic) => write!(f, "ConstantDynamic {}", dynamic.name),
        }
    }
}

/// A method handle constant.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Handle {
    /// `REF_getField` (1) through `REF_invokeInterface` (9).
    pub kind: u8,
    pub owner: String,
    pub name: String,
    pub descriptor: String,
    pub interface: bool,
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "MethodHandle[{}] {}.{}{}",
            self.kind, self.owner, self.name, self.descriptor
        )
    }
}

/// A dynamically-computed call site or constant.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DynamicRef {
    pub name: String,
    pub descriptor: String,
    pub bootstrap: Handle,
    pub arguments: Vec<Constant>,
}

impl DynamicRef {
    /// This reference plus the deepest chain of dynamic bootstrap arguments.
    pub fn depth(&self) -> usize {
        1 + self.arguments.iter().map(Constant::depth).max().unwrap_or(0)
    }
}

/// A symbolic reference to a field or method of some class.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MemberRef {
    pub owner: String,
    pub name: String,
    pub descriptor: String,
    /// Whether the owner is an interface (only meaningful for methods).
    pub interface: bool,
}

impl MemberRef {
    pub fn new(owner: impl Into<String>, name: impl Into<String>, descriptor: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
            descriptor: descriptor.into(),
            interface: false,
        }
    }
}

impl fmt::Display for MemberRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}{}", self.owner, self.name, self.descriptor)
    }
}
