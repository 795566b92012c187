//! Attributes and the position-bearing tables of a method body.
//!
//! Unlike label operands, the tables here use absolute instruction
//! positions. The diff engine rebases them through the instruction
//! alignment instead of comparing them verbatim.

use serde::{Deserialize, Serialize};

/// Attribute name of the line number table.
pub const LINE_NUMBER_TABLE: &str = "LineNumberTable";
/// Attribute name of the local variable table.
pub const LOCAL_VARIABLE_TABLE: &str = "LocalVariableTable";

/// A named attribute.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,
    pub body: AttributeBody,
}

impl Attribute {
    /// An attribute the model does not interpret.
    pub fn opaque(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            body: AttributeBody::Opaque(bytes),
        }
    }

    pub fn line_numbers(entries: Vec<LineNumber>) -> Self {
        Self {
            name: LINE_NUMBER_TABLE.into(),
            body: AttributeBody::LineNumbers(entries),
        }
    }

    pub fn local_variables(entries: Vec<LocalVariable>) -> Self {
        Self {
            name: LOCAL_VARIABLE_TABLE.into(),
            body: AttributeBody::LocalVariables(entries),
        }
    }

    /// Returns `true` if the attribute carries an uninterpreted byte blob.
    pub fn is_opaque(&self) -> bool {
        matches!(self.body, AttributeBody::Opaque(_))
    }
}

/// Recognized sub-tree or opaque contents of an attribute.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttributeBody {
    LineNumbers(Vec<LineNumber>),
    LocalVariables(Vec<LocalVariable>),
    Opaque(Vec<u8>),
}

impl AttributeBody {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::LineNumbers(_) => "line-numbers",
            Self::LocalVariables(_) => "local-variables",
            Self::Opaque(_) => "opaque",
        }
    }
}

/// Maps the instruction at `start` to a source line.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LineNumber {
    pub start: u32,
    pub line: u32,
}

/// A local variable's scope `[start, end)` over instruction positions.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LocalVariable {
    pub name: String,
    pub descriptor: String,
    pub signature: Option<String>,
    pub start: u32,
    pub end: u32,
    pub index: u16,
}

/// An exception table entry protecting `[start, end)`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExceptionHandler {
    pub start: u32,
    pub end: u32,
    pub handler: u32,
    /// `None` catches everything (`finally`).
    pub catch_type: Option<String>,
}
