//! Wire encodings of primitives and class tree elements.
//!
//! Integers are varints (signed ones zigzagged), float and double bits are
//! fixed-width big-endian, strings and byte strings are length-prefixed.
//! Enum variants are introduced by a one-byte tag.

use classdelta_model::{
    Annotation, AnnotationValue, Attribute, AttributeBody, Constant, DynamicRef, ExceptionHandler,
    Field, Handle, InnerClass, Instruction, LineNumber, LocalVariable, MemberRef, Method, Operand,
    OuterClass, Parameter, RecordComponent,
};

use crate::error::{CodecError, CodecResult};
use crate::reader::{Decode, PatchReader};
use crate::writer::{Encode, PatchWriter};

fn unknown_tag(r: &PatchReader<'_>, what: &str, tag: u8) -> CodecError {
    CodecError::corrupt(r.position().saturating_sub(1), format!("unknown {what} tag {tag}"))
}

impl Encode for u8 {
    fn encode(&self, w: &mut PatchWriter) {
        w.u8(*self);
    }
}

impl Decode for u8 {
    fn decode(r: &mut PatchReader<'_>) -> CodecResult<Self> {
        r.u8()
    }
}

impl Encode for bool {
    fn encode(&self, w: &mut PatchWriter) {
        w.bool(*self);
    }
}

impl Decode for bool {
    fn decode(r: &mut PatchReader<'_>) -> CodecResult<Self> {
        r.bool()
    }
}

impl Encode for u16 {
    fn encode(&self, w: &mut PatchWriter) {
        w.varint(u64::from(*self));
    }
}

impl Decode for u16 {
    fn decode(r: &mut PatchReader<'_>) -> CodecResult<Self> {
        r.u16()
    }
}

impl Encode for u32 {
    fn encode(&self, w: &mut PatchWriter) {
        w.varint(u64::from(*self));
    }
}

impl Decode for u32 {
    fn decode(r: &mut PatchReader<'_>) -> CodecResult<Self> {
        r.u32()
    }
}

impl Encode for i32 {
    fn encode(&self, w: &mut PatchWriter) {
        w.signed(i64::from(*self));
    }
}

impl Decode for i32 {
    fn decode(r: &mut PatchReader<'_>) -> CodecResult<Self> {
        r.i32()
    }
}

impl Encode for i64 {
    fn encode(&self, w: &mut PatchWriter) {
        w.signed(*self);
    }
}

impl Decode for i64 {
    fn decode(r: &mut PatchReader<'_>) -> CodecResult<Self> {
        r.signed()
    }
}

impl Encode for String {
    fn encode(&self, w: &mut PatchWriter) {
        w.bytes(self.as_bytes());
    }
}

impl Decode for String {
    fn decode(r: &mut PatchReader<'_>) -> CodecResult<Self> {
        r.string()
    }
}

impl<T: Encode> Encode for Option<T> {
    fn encode(&self, w: &mut PatchWriter) {
        match self {
            None => w.u8(0),
            Some(value) => {
                w.u8(1);
                value.encode(w);
            }
        }
    }
}

impl<T: Decode> Decode for Option<T> {
    fn decode(r: &mut PatchReader<'_>) -> CodecResult<Self> {
        match r.u8()? {
            0 => Ok(None),
            1 => Ok(Some(r.get()?)),
            tag => Err(unknown_tag(r, "option", tag)),
        }
    }
}

impl<T: Encode> Encode for [T] {
    fn encode(&self, w: &mut PatchWriter) {
        w.count(self.len());
        for item in self {
            item.encode(w);
        }
    }
}

impl<T: Encode> Encode for Vec<T> {
    fn encode(&self, w: &mut PatchWriter) {
        self.as_slice().encode(w);
    }
}

impl<T: Decode> Decode for Vec<T> {
    fn decode(r: &mut PatchReader<'_>) -> CodecResult<Self> {
        let count = r.count()?;
        let mut items = Vec::with_capacity(count);
        for _ in 0..count {
            items.push(r.get()?);
        }
        Ok(items)
    }
}

impl<T: Encode> Encode for Box<T> {
    fn encode(&self, w: &mut PatchWriter) {
        self.as_ref().encode(w);
    }
}

impl<T: Decode> Decode for Box<T> {
    fn decode(r: &mut PatchReader<'_>) -> CodecResult<Self> {
        Ok(Box::new(r.get()?))
    }
}

impl<A: Encode, B: Encode> Encode for (A, B) {
    fn encode(&self, w: &mut PatchWriter) {
        self.0.encode(w);
        self.1.encode(w);
    }
}

impl<A: Decode, B: Decode> Decode for (A, B) {
    fn decode(r: &mut PatchReader<'_>) -> CodecResult<Self> {
        Ok((r.get()?, r.get()?))
    }
}

impl Encode for Handle {
    fn encode(&self, w: &mut PatchWriter) {
        w.u8(self.kind);
        w.put(&self.owner);
        w.put(&self.name);
        w.put(&self.descriptor);
        w.bool(self.interface);
    }
}

impl Decode for Handle {
    fn decode(r: &mut PatchReader<'_>) -> CodecResult<Self> {
        Ok(Self {
            kind: r.u8()?,
            owner: r.get()?,
            name: r.get()?,
            descriptor: r.get()?,
            interface: r.bool()?,
        })
    }
}

impl Encode for MemberRef {
    fn encode(&self, w: &mut PatchWriter) {
        w.put(&self.owner);
        w.put(&self.name);
        w.put(&self.descriptor);
        w.bool(self.interface);
    }
}

impl Decode for MemberRef {
    fn decode(r: &mut PatchReader<'_>) -> CodecResult<Self> {
        Ok(Self {
            owner: r.get()?,
            name: r.get()?,
            descriptor: r.get()?,
            interface: r.bool()?,
        })
    }
}

impl Encode for DynamicRef {
    fn encode(&self, w: &mut PatchWriter) {
        w.put(&self.name);
        w.put(&self.descriptor);
        w.put(&self.bootstrap);
        w.put(&self.arguments);
    }
}

impl Decode for DynamicRef {
    fn decode(r: &mut PatchReader<'_>) -> CodecResult<Self> {
        r.nested(|r| {
            Ok(Self {
                name: r.get()?,
                descriptor: r.get()?,
                bootstrap: r.get()?,
                arguments: r.get()?,
            })
        })
    }
}

impl Encode for Constant {
    fn encode(&self, w: &mut PatchWriter) {
        match self {
            Self::Int(v) => {
                w.u8(0);
                w.put(v);
            }
            Self::Float(bits) => {
                w.u8(1);
                w.fixed_u32(*bits);
            }
            Self::Long(v) => {
                w.u8(2);
                w.put(v);
            }
            Self::Double(bits) => {
                w.u8(3);
                w.fixed_u64(*bits);
            }
            Self::String(s) => {
                w.u8(4);
                w.put(s);
            }
            Self::Class(s) => {
                w.u8(5);
                w.put(s);
            }
            Self::MethodType(s) => {
                w.u8(6);
                w.put(s);
            }
            Self::MethodHandle(h) => {
                w.u8(7);
                w.put(h);
            }
            Self::Dynamic(d) => {
                w.u8(8);
                w.put(d);
            }
        }
    }
}

impl Decode for Constant {
    fn decode(r: &mut PatchReader<'_>) -> CodecResult<Self> {
        Ok(match r.u8()? {
            0 => Self::Int(r.get()?),
            1 => Self::Float(r.fixed_u32()?),
            2 => Self::Long(r.get()?),
            3 => Self::Double(r.fixed_u64()?),
            4 => Self::String(r.get()?),
            5 => Self::Class(r.get()?),
            6 => Self::MethodType(r.get()?),
            7 => Self::MethodHandle(r.get()?),
            8 => Self::Dynamic(r.get()?),
            tag => return Err(unknown_tag(r, "constant", tag)),
        })
    }
}

impl Encode for Operand {
    fn encode(&self, w: &mut PatchWriter) {
        match self {
            Self::Int(v) => {
                w.u8(0);
                w.put(v);
            }
            Self::Label(offset) => {
                w.u8(1);
                w.put(offset);
            }
            Self::Var(index) => {
                w.u8(2);
                w.put(index);
            }
            Self::Constant(c) => {
                w.u8(3);
                w.put(c);
            }
            Self::Type(name) => {
                w.u8(4);
                w.put(name);
            }
            Self::Field(member) => {
                w.u8(5);
                w.put(member);
            }
            Self::Method(member) => {
                w.u8(6);
                w.put(member);
            }
            Self::Dynamic(d) => {
                w.u8(7);
                w.put(d);
            }
        }
    }
}

impl Decode for Operand {
    fn decode(r: &mut PatchReader<'_>) -> CodecResult<Self> {
        Ok(match r.u8()? {
            0 => Self::Int(r.get()?),
            1 => Self::Label(r.get()?),
            2 => Self::Var(r.get()?),
            3 => Self::Constant(r.get()?),
            4 => Self::Type(r.get()?),
            5 => Self::Field(r.get()?),
            6 => Self::Method(r.get()?),
            7 => Self::Dynamic(r.get()?),
            tag => return Err(unknown_tag(r, "operand", tag)),
        })
    }
}

impl Encode for Instruction {
    fn encode(&self, w: &mut PatchWriter) {
        w.u8(self.opcode);
        w.put(&self.operands);
    }
}

impl Decode for Instruction {
    fn decode(r: &mut PatchReader<'_>) -> CodecResult<Self> {
        Ok(Self {
            opcode: r.u8()?,
            operands: r.get()?,
        })
    }
}

impl Encode for AnnotationValue {
    fn encode(&self, w: &mut PatchWriter) {
        match self {
            Self::Byte(v) => {
                w.u8(0);
                w.signed(i64::from(*v));
            }
            Self::Char(v) => {
                w.u8(1);
                w.put(v);
            }
            Self::Short(v) => {
                w.u8(2);
                w.signed(i64::from(*v));
            }
            Self::Int(v) => {
                w.u8(3);
                w.put(v);
            }
            Self::Long(v) => {
                w.u8(4);
                w.put(v);
            }
            Self::Float(bits) => {
                w.u8(5);
                w.fixed_u32(*bits);
            }
            Self::Double(bits) => {
                w.u8(6);
                w.fixed_u64(*bits);
            }
            Self::Boolean(v) => {
                w.u8(7);
                w.bool(*v);
            }
            Self::String(s) => {
                w.u8(8);
                w.put(s);
            }
            Self::Enum { descriptor, name } => {
                w.u8(9);
                w.put(descriptor);
                w.put(name);
            }
            Self::Class(s) => {
                w.u8(10);
                w.put(s);
            }
            Self::Annotation(a) => {
                w.u8(11);
                w.put(a);
            }
            Self::Array(items) => {
                w.u8(12);
                w.put(items);
            }
        }
    }
}

impl Decode for AnnotationValue {
    fn decode(r: &mut PatchReader<'_>) -> CodecResult<Self> {
        Ok(match r.u8()? {
            0 => Self::Byte(r.i8()?),
            1 => Self::Char(r.get()?),
            2 => Self::Short(r.i16()?),
            3 => Self::Int(r.get()?),
            4 => Self::Long(r.get()?),
            5 => Self::Float(r.fixed_u32()?),
            6 => Self::Double(r.fixed_u64()?),
            7 => Self::Boolean(r.bool()?),
            8 => Self::String(r.get()?),
            9 => Self::Enum {
                descriptor: r.get()?,
                name: r.get()?,
            },
            10 => Self::Class(r.get()?),
            11 => Self::Annotation(r.get()?),
            12 => Self::Array(r.nested(|r| r.get())?),
            tag => return Err(unknown_tag(r, "annotation value", tag)),
        })
    }
}

impl Encode for Annotation {
    fn encode(&self, w: &mut PatchWriter) {
        w.put(&self.descriptor);
        w.put(&self.values);
    }
}

impl Decode for Annotation {
    fn decode(r: &mut PatchReader<'_>) -> CodecResult<Self> {
        r.nested(|r| {
            Ok(Self {
                descriptor: r.get()?,
                values: r.get()?,
            })
        })
    }
}

impl Encode for LineNumber {
    fn encode(&self, w: &mut PatchWriter) {
        w.put(&self.start);
        w.put(&self.line);
    }
}

impl Decode for LineNumber {
    fn decode(r: &mut PatchReader<'_>) -> CodecResult<Self> {
        Ok(Self {
            start: r.get()?,
            line: r.get()?,
        })
    }
}

impl Encode for LocalVariable {
    fn encode(&self, w: &mut PatchWriter) {
        w.put(&self.name);
        w.put(&self.descriptor);
        w.put(&self.signature);
        w.put(&self.start);
        w.put(&self.end);
        w.put(&self.index);
    }
}

impl Decode for LocalVariable {
    fn decode(r: &mut PatchReader<'_>) -> CodecResult<Self> {
        Ok(Self {
            name: r.get()?,
            descriptor: r.get()?,
            signature: r.get()?,
            start: r.get()?,
            end: r.get()?,
            index: r.get()?,
        })
    }
}

impl Encode for Attribute {
    fn encode(&self, w: &mut PatchWriter) {
        w.put(&self.name);
        match &self.body {
            AttributeBody::LineNumbers(entries) => {
                w.u8(0);
                w.put(entries);
            }
            AttributeBody::LocalVariables(entries) => {
                w.u8(1);
                w.put(entries);
            }
            AttributeBody::Opaque(bytes) => {
                w.u8(2);
                w.bytes(bytes);
            }
        }
    }
}

impl Decode for Attribute {
    fn decode(r: &mut PatchReader<'_>) -> CodecResult<Self> {
        let name = r.get()?;
        let body = match r.u8()? {
            0 => AttributeBody::LineNumbers(r.get()?),
            1 => AttributeBody::LocalVariables(r.get()?),
            2 => AttributeBody::Opaque(r.bytes()?),
            tag => return Err(unknown_tag(r, "attribute body", tag)),
        };
        Ok(Self { name, body })
    }
}

impl Encode for ExceptionHandler {
    fn encode(&self, w: &mut PatchWriter) {
        w.put(&self.start);
        w.put(&self.end);
        w.put(&self.handler);
        w.put(&self.catch_type);
    }
}

impl Decode for ExceptionHandler {
    fn decode(r: &mut PatchReader<'_>) -> CodecResult<Self> {
        Ok(Self {
            start: r.get()?,
            end: r.get()?,
            handler: r.get()?,
            catch_type: r.get()?,
        })
    }
}

impl Encode for InnerClass {
    fn encode(&self, w: &mut PatchWriter) {
        w.put(&self.name);
        w.put(&self.outer_name);
        w.put(&self.inner_name);
        w.put(&self.access);
    }
}

impl Decode for InnerClass {
    fn decode(r: &mut PatchReader<'_>) -> CodecResult<Self> {
        Ok(Self {
            name: r.get()?,
            outer_name: r.get()?,
            inner_name: r.get()?,
            access: r.get()?,
        })
    }
}

impl Encode for OuterClass {
    fn encode(&self, w: &mut PatchWriter) {
        w.put(&self.owner);
        w.put(&self.method_name);
        w.put(&self.method_descriptor);
    }
}

impl Decode for OuterClass {
    fn decode(r: &mut PatchReader<'_>) -> CodecResult<Self> {
        Ok(Self {
            owner: r.get()?,
            method_name: r.get()?,
            method_descriptor: r.get()?,
        })
    }
}

impl Encode for Parameter {
    fn encode(&self, w: &mut PatchWriter) {
        w.put(&self.name);
        w.put(&self.access);
    }
}

impl Decode for Parameter {
    fn decode(r: &mut PatchReader<'_>) -> CodecResult<Self> {
        Ok(Self {
            name: r.get()?,
            access: r.get()?,
        })
    }
}

impl Encode for Field {
    fn encode(&self, w: &mut PatchWriter) {
        w.put(&self.access);
        w.put(&self.name);
        w.put(&self.descriptor);
        w.put(&self.signature);
        w.put(&self.value);
        w.put(&self.visible_annotations);
        w.put(&self.invisible_annotations);
        w.put(&self.attributes);
    }
}

impl Decode for Field {
    fn decode(r: &mut PatchReader<'_>) -> CodecResult<Self> {
        Ok(Self {
            access: r.get()?,
            name: r.get()?,
            descriptor: r.get()?,
            signature: r.get()?,
            value: r.get()?,
            visible_annotations: r.get()?,
            invisible_annotations: r.get()?,
            attributes: r.get()?,
        })
    }
}

impl Encode for Method {
    fn encode(&self, w: &mut PatchWriter) {
        w.put(&self.access);
        w.put(&self.name);
        w.put(&self.descriptor);
        w.put(&self.signature);
        w.put(&self.exceptions);
        w.put(&self.parameters);
        w.put(&self.annotation_default);
        w.put(&self.visible_annotations);
        w.put(&self.invisible_annotations);
        w.put(&self.visible_parameter_annotations);
        w.put(&self.invisible_parameter_annotations);
        w.put(&self.max_stack);
        w.put(&self.max_locals);
        w.put(&self.instructions);
        w.put(&self.handlers);
        w.put(&self.attributes);
    }
}

impl Decode for Method {
    fn decode(r: &mut PatchReader<'_>) -> CodecResult<Self> {
        Ok(Self {
            access: r.get()?,
            name: r.get()?,
            descriptor: r.get()?,
            signature: r.get()?,
            exceptions: r.get()?,
            parameters: r.get()?,
            annotation_default: r.get()?,
            visible_annotations: r.get()?,
            invisible_annotations: r.get()?,
            visible_parameter_annotations: r.get()?,
            invisible_parameter_annotations: r.get()?,
            max_stack: r.get()?,
            max_locals: r.get()?,
            instructions: r.get()?,
            handlers: r.get()?,
            attributes: r.get()?,
        })
    }
}

impl Encode for RecordComponent {
    fn encode(&self, w: &mut PatchWriter) {
        w.put(&self.name);
        w.put(&self.descriptor);
        w.put(&self.signature);
        w.put(&self.visible_annotations);
        w.put(&self.invisible_annotations);
        w.put(&self.attributes);
    }
}

impl Decode for RecordComponent {
    fn decode(r: &mut PatchReader<'_>) -> CodecResult<Self> {
        Ok(Self {
            name: r.get()?,
            descriptor: r.get()?,
            signature: r.get()?,
            visible_annotations: r.get()?,
            invisible_annotations: r.get()?,
            attributes: r.get()?,
        })
    }
}
