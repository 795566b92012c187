//! Fields, methods and record components.
//!
//! All three are identified across versions by their [`MemberKey`]: two
//! members are the same logical member iff name and descriptor match, even
//! when everything else about them differs.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::annotation::{Annotation, AnnotationValue};
use crate::attribute::{Attribute, AttributeBody, ExceptionHandler};
use crate::constant::Constant;
use crate::instruction::Instruction;

/// Identity key of a member: `(name, descriptor)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MemberKey<'a> {
    pub name: &'a str,
    pub descriptor: &'a str,
}

impl fmt::Display for MemberKey<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.descriptor.starts_with('(') {
            write!(f, "{}{}", self.name, self.descriptor)
        } else {
            write!(f, "{}:{}", self.name, self.descriptor)
        }
    }
}

/// Behavior shared by keyed class members.
pub trait Member {
    fn name(&self) -> &str;

    fn descriptor(&self) -> &str;

    fn key(&self) -> MemberKey<'_> {
        MemberKey {
            name: self.name(),
            descriptor: self.descriptor(),
        }
    }

    /// Equality over every property except the name.
    fn eq_ignoring_name(&self, other: &Self) -> bool;
}

/// A field declaration.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Field {
    pub access: u32,
    pub name: String,
    pub descriptor: String,
    pub signature: Option<String>,
    /// `ConstantValue` initializer.
    pub value: Option<Constant>,
    pub visible_annotations: Vec<Annotation>,
    pub invisible_annotations: Vec<Annotation>,
    pub attributes: Vec<Attribute>,
}

impl Field {
    pub fn new(access: u32, name: impl Into<String>, descriptor: impl Into<String>) -> Self {
        Self {
            access,
            name: name.into(),
            descriptor: descriptor.into(),
            signature: None,
            value: None,
            visible_annotations: Vec::new(),
            invisible_annotations: Vec::new(),
            attributes: Vec::new(),
        }
    }
}

impl Member for Field {
    fn name(&self) -> &str {
        &self.name
    }

    fn descriptor(&self) -> &str {
        &self.descriptor
    }

    fn eq_ignoring_name(&self, other: &Self) -> bool {
        self.access == other.access
            && self.descriptor == other.descriptor
            && self.signature == other.signature
            && self.value == other.value
            && self.visible_annotations == other.visible_annotations
            && self.invisible_annotations == other.invisible_annotations
            && self.attributes == other.attributes
    }
}

/// An entry of the `MethodParameters` attribute.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Parameter {
    pub name: Option<String>,
    pub access: u32,
}

/// A method declaration and, unless abstract or native, its body.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Method {
    pub access: u32,
    pub name: String,
    pub descriptor: String,
    pub signature: Option<String>,
    pub exceptions: Vec<String>,
    pub parameters: Vec<Parameter>,
    pub annotation_default: Option<AnnotationValue>,
    pub visible_annotations: Vec<Annotation>,
    pub invisible_annotations: Vec<Annotation>,
    /// Per-parameter annotation lists, one entry per annotated parameter.
    pub visible_parameter_annotations: Vec<Vec<Annotation>>,
    pub invisible_parameter_annotations: Vec<Vec<Annotation>>,
    pub max_stack: u16,
    pub max_locals: u16,
    pub instructions: Vec<Instruction>,
    pub handlers: Vec<ExceptionHandler>,
    pub attributes: Vec<Attribute>,
}

impl Method {
    pub fn new(access: u32, name: impl Into<String>, descriptor: impl Into<String>) -> Self {
        Self {
            access,
            name: name.into(),
            descriptor: descriptor.into(),
            signature: None,
            exceptions: Vec::new(),
            parameters: Vec::new(),
            annotation_default: None,
            visible_annotations: Vec::new(),
            invisible_annotations: Vec::new(),
            visible_parameter_annotations: Vec::new(),
            invisible_parameter_annotations: Vec::new(),
            max_stack: 0,
            max_locals: 0,
            instructions: Vec::new(),
            handlers: Vec::new(),
            attributes: Vec::new(),
        }
    }

    pub fn with_body(mut self, max_stack: u16, max_locals: u16, instructions: Vec<Instruction>) -> Self {
        self.max_stack = max_stack;
        self.max_locals = max_locals;
        self.instructions = instructions;
        self
    }

    /// The line number table, if present.
    pub fn line_numbers(&self) -> Option<&[crate::attribute::LineNumber]> {
        self.attributes.iter().find_map(|attr| match &attr.body {
            AttributeBody::LineNumbers(entries) => Some(entries.as_slice()),
            _ => None,
        })
    }
}

impl Member for Method {
    fn name(&self) -> &str {
        &self.name
    }

    fn descriptor(&self) -> &str {
        &self.descriptor
    }

    fn eq_ignoring_name(&self, other: &Self) -> bool {
        self.access == other.access
            && self.descriptor == other.descriptor
            && self.signature == other.signature
            && self.exceptions == other.exceptions
            && self.parameters == other.parameters
            && self.annotation_default == other.annotation_default
            && self.visible_annotations == other.visible_annotations
            && self.invisible_annotations == other.invisible_annotations
            && self.visible_parameter_annotations == other.visible_parameter_annotations
            && self.invisible_parameter_annotations == other.invisible_parameter_annotations
            && self.max_stack == other.max_stack
            && self.max_locals == other.max_locals
            && self.instructions == other.instructions
            && self.handlers == other.handlers
            && self.attributes == other.attributes
    }
}

/// A component of a record class.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordComponent {
    pub name: String,
    pub descriptor: String,
    pub signature: Option<String>,
    pub visible_annotations: Vec<Annotation>,
    pub invisible_annotations: Vec<Annotation>,
    pub attributes: Vec<Attribute>,
}

impl RecordComponent {
    pub fn new(name: impl Into<String>, descriptor: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            descriptor: descriptor.into(),
            signature: None,
            visible_annotations: Vec::new(),
            invisible_annotations: Vec::new(),
            attributes: Vec::new(),
        }
    }
}

impl Member for RecordComponent {
    fn name(&self) -> &str {
        &self.name
    }

    fn descriptor(&self) -> &str {
        &self.descriptor
    }

    fn eq_ignoring_name(&self, other: &Self) -> bool {
        self.descriptor == other.descriptor
            && self.signature == other.signature
            && self.visible_annotations == other.visible_annotations
            && self.invisible_annotations == other.invisible_annotations
            && self.attributes == other.attributes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_display() {
        let field = Field::new(0, "count", "I");
        assert_eq!(field.key().to_string(), "count:I");
        let method = Method::new(0, "run", "()V");
        assert_eq!(method.key().to_string(), "run()V");
    }

    #[test]
    fn rename_only_is_equal_ignoring_name() {
        let a = Field::new(1, "a", "I");
        let b = Field::new(1, "b", "I");
        assert!(a.eq_ignoring_name(&b));
        assert_ne!(a.key(), b.key());

        let c = Field::new(2, "c", "I");
        assert!(!a.eq_ignoring_name(&c));
    }

    #[test]
    fn method_rename_compares_body() {
        use crate::opcodes::RETURN;
        let a = Method::new(1, "a", "()V").with_body(0, 1, vec![Instruction::simple(RETURN)]);
        let b = Method::new(1, "b", "()V").with_body(0, 1, vec![Instruction::simple(RETURN)]);
        let c = Method::new(1, "c", "()V").with_body(0, 1, vec![]);
        assert!(a.eq_ignoring_name(&b));
        assert!(!a.eq_ignoring_name(&c));
    }
}
