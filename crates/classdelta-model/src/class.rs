use serde::{Deserialize, Serialize};

use crate::annotation::Annotation;
use crate::attribute::Attribute;
use crate::member::{Field, Method, RecordComponent};

/// The structural tree of one class.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClassNode {
    /// `minor << 16 | major`.
    pub version: u32,
    pub access: u32,
    /// Internal name, e.g. `com/example/Foo`.
    pub name: String,
    pub signature: Option<String>,
    pub super_name: Option<String>,
    pub interfaces: Vec<String>,
    pub source_file: Option<String>,
    pub source_debug: Option<String>,
    pub outer_class: Option<OuterClass>,
    pub nest_host: Option<String>,
    pub nest_members: Vec<String>,
    pub permitted_subclasses: Vec<String>,
    pub inner_classes: Vec<InnerClass>,
    pub visible_annotations: Vec<Annotation>,
    pub invisible_annotations: Vec<Annotation>,
    pub record_components: Vec<RecordComponent>,
    pub fields: Vec<Field>,
    pub methods: Vec<Method>,
    pub attributes: Vec<Attribute>,
}

impl ClassNode {
    /// Java 8 (`52.0`).
    pub const JAVA_8: u32 = 52;
    /// Java 17 (`61.0`).
    pub const JAVA_17: u32 = 61;

    /// A public class extending `java/lang/Object` with no members.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            version: Self::JAVA_8,
            access: 0x0021,
            name: name.into(),
            signature: None,
            super_name: Some("java/lang/Object".into()),
            interfaces: Vec::new(),
            source_file: None,
            source_debug: None,
            outer_class: None,
            nest_host: None,
            nest_members: Vec::new(),
            permitted_subclasses: Vec::new(),
            inner_classes: Vec::new(),
            visible_annotations: Vec::new(),
            invisible_annotations: Vec::new(),
            record_components: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            attributes: Vec::new(),
        }
    }

    pub fn with_field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.methods.push(method);
        self
    }

    /// Total number of instructions across all methods.
    pub fn instruction_count(&self) -> usize {
        self.methods.iter().map(|m| m.instructions.len()).sum()
    }
}

/// An `InnerClasses` attribute entry.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InnerClass {
    pub name: String,
    pub outer_name: Option<String>,
    pub inner_name: Option<String>,
    pub access: u32,
}

/// The `EnclosingMethod` attribute.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OuterClass {
    pub owner: String,
    pub method_name: Option<String>,
    pub method_descriptor: Option<String>,
}
