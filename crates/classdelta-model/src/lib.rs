//! Structural model of a JVM class for the classdelta patch engine.
//!
//! A [`ClassNode`] is an owned tree of value types with structural equality.
//! Every other classdelta crate depends on `classdelta-model`.
//!
//! # Key Types
//!
//! - [`ClassNode`]: The root: header properties plus ordered member lists
//! - [`Field`], [`Method`], [`RecordComponent`]: Members keyed by `(name, descriptor)`
//! - [`Instruction`]: An opcode with typed operands; jump targets are relative
//! - [`Attribute`]: Line numbers, local variables, or an opaque byte blob
//! - [`ContentHasher`]: Domain-separated BLAKE3 digests of model values
//! - [`ClassFormat`]: Collaborator that converts bytes to and from trees

pub mod annotation;
pub mod attribute;
pub mod class;
pub mod constant;
pub mod digest;
pub mod error;
pub mod format;
pub mod instruction;
pub mod member;
pub mod opcodes;
pub mod strip;
pub mod validate;

pub use annotation::{Annotation, AnnotationValue};
pub use attribute::{
    Attribute, AttributeBody, ExceptionHandler, LineNumber, LocalVariable, LINE_NUMBER_TABLE,
    LOCAL_VARIABLE_TABLE,
};
pub use class::{ClassNode, InnerClass, OuterClass};
pub use constant::{Constant, DynamicRef, Handle, MemberRef};
pub use digest::{checksum, name_checksum, ContentHasher, Digest};
pub use error::{ModelError, ModelResult};
pub use format::{ClassFormat, JsonClassFormat};
pub use instruction::{Instruction, Operand};
pub use member::{Field, Member, MemberKey, Method, Parameter, RecordComponent};
pub use validate::MAX_ANNOTATION_DEPTH;
