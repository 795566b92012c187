//! Wire encodings of the patch tree, in pre-order.

use classdelta_diff::{
    AttributePatch, BodyPatch, ClassDiff, FieldPatch, MethodPatch, RecordComponentPatch, Scalar,
};

use crate::error::{CodecError, CodecResult};
use crate::level::Level;
use crate::reader::{Decode, PatchReader};
use crate::writer::{Encode, PatchWriter};

impl<T: Encode> Encode for Scalar<T> {
    fn encode(&self, w: &mut PatchWriter) {
        match self {
            Scalar::Same => w.u8(0),
            Scalar::Changed(value) => {
                w.u8(1);
                w.put(value);
            }
        }
    }
}

impl<T: Decode> Decode for Scalar<T> {
    fn decode(r: &mut PatchReader<'_>) -> CodecResult<Self> {
        match r.u8()? {
            0 => Ok(Scalar::Same),
            1 => Ok(Scalar::Changed(r.get()?)),
            tag => Err(CodecError::corrupt(
                r.position() - 1,
                format!("unknown scalar tag {tag}"),
            )),
        }
    }
}

impl Encode for AttributePatch {
    fn encode(&self, w: &mut PatchWriter) {
        match self {
            Self::LineNumbers(script) => {
                w.u8(0);
                w.script(Level::LineNumbers, script);
            }
            Self::LocalVariables(script) => {
                w.u8(1);
                w.script(Level::LocalVariables, script);
            }
            Self::Opaque(delta) => {
                w.u8(2);
                w.bytes(delta);
            }
            Self::Replace(attribute) => {
                w.u8(3);
                w.put(attribute);
            }
        }
    }
}

impl Decode for AttributePatch {
    fn decode(r: &mut PatchReader<'_>) -> CodecResult<Self> {
        Ok(match r.u8()? {
            0 => Self::LineNumbers(r.script(Level::LineNumbers)?),
            1 => Self::LocalVariables(r.script(Level::LocalVariables)?),
            2 => Self::Opaque(r.bytes()?),
            3 => Self::Replace(r.get()?),
            tag => {
                return Err(CodecError::corrupt(
                    r.position() - 1,
                    format!("unknown attribute patch tag {tag}"),
                ))
            }
        })
    }
}

impl Encode for FieldPatch {
    fn encode(&self, w: &mut PatchWriter) {
        w.put(&self.access);
        w.put(&self.name);
        w.put(&self.signature);
        w.put(&self.value);
        w.script(Level::VisibleAnnotations, &self.visible_annotations);
        w.script(Level::InvisibleAnnotations, &self.invisible_annotations);
        w.script(Level::Attributes, &self.attributes);
    }
}

impl Decode for FieldPatch {
    fn decode(r: &mut PatchReader<'_>) -> CodecResult<Self> {
        Ok(Self {
            access: r.get()?,
            name: r.get()?,
            signature: r.get()?,
            value: r.get()?,
            visible_annotations: r.script(Level::VisibleAnnotations)?,
            invisible_annotations: r.script(Level::InvisibleAnnotations)?,
            attributes: r.script(Level::Attributes)?,
        })
    }
}

impl Encode for MethodPatch {
    fn encode(&self, w: &mut PatchWriter) {
        w.put(&self.access);
        w.put(&self.name);
        w.put(&self.signature);
        w.script(Level::Exceptions, &self.exceptions);
        w.script(Level::Parameters, &self.parameters);
        w.put(&self.annotation_default);
        w.script(Level::VisibleAnnotations, &self.visible_annotations);
        w.script(Level::InvisibleAnnotations, &self.invisible_annotations);
        w.script(Level::VisibleParameterAnnotations, &self.visible_parameter_annotations);
        w.script(Level::InvisibleParameterAnnotations, &self.invisible_parameter_annotations);
        w.put(&self.max_stack);
        w.put(&self.max_locals);
        w.script(Level::Instructions, &self.body.instructions);
        w.script(Level::Handlers, &self.body.handlers);
        w.script(Level::Attributes, &self.attributes);
    }
}

impl Decode for MethodPatch {
    fn decode(r: &mut PatchReader<'_>) -> CodecResult<Self> {
        Ok(Self {
            access: r.get()?,
            name: r.get()?,
            signature: r.get()?,
            exceptions: r.script(Level::Exceptions)?,
            parameters: r.script(Level::Parameters)?,
            annotation_default: r.get()?,
            visible_annotations: r.script(Level::VisibleAnnotations)?,
            invisible_annotations: r.script(Level::InvisibleAnnotations)?,
            visible_parameter_annotations: r.script(Level::VisibleParameterAnnotations)?,
            invisible_parameter_annotations: r.script(Level::InvisibleParameterAnnotations)?,
            max_stack: r.get()?,
            max_locals: r.get()?,
            body: BodyPatch {
                instructions: r.script(Level::Instructions)?,
                handlers: r.script(Level::Handlers)?,
            },
            attributes: r.script(Level::Attributes)?,
        })
    }
}

impl Encode for RecordComponentPatch {
    fn encode(&self, w: &mut PatchWriter) {
        w.put(&self.name);
        w.put(&self.signature);
        w.script(Level::VisibleAnnotations, &self.visible_annotations);
        w.script(Level::InvisibleAnnotations, &self.invisible_annotations);
        w.script(Level::Attributes, &self.attributes);
    }
}

impl Decode for RecordComponentPatch {
    fn decode(r: &mut PatchReader<'_>) -> CodecResult<Self> {
        Ok(Self {
            name: r.get()?,
            signature: r.get()?,
            visible_annotations: r.script(Level::VisibleAnnotations)?,
            invisible_annotations: r.script(Level::InvisibleAnnotations)?,
            attributes: r.script(Level::Attributes)?,
        })
    }
}

impl Encode for ClassDiff {
    fn encode(&self, w: &mut PatchWriter) {
        w.put(&self.version);
        w.put(&self.access);
        w.put(&self.name);
        w.put(&self.signature);
        w.put(&self.super_name);
        w.script(Level::Interfaces, &self.interfaces);
        w.put(&self.source_file);
        w.put(&self.source_debug);
        w.put(&self.outer_class);
        w.put(&self.nest_host);
        w.script(Level::NestMembers, &self.nest_members);
        w.script(Level::PermittedSubclasses, &self.permitted_subclasses);
        w.script(Level::InnerClasses, &self.inner_classes);
        w.script(Level::VisibleAnnotations, &self.visible_annotations);
        w.script(Level::InvisibleAnnotations, &self.invisible_annotations);
        w.script(Level::RecordComponents, &self.record_components);
        w.script(Level::Fields, &self.fields);
        w.script(Level::Methods, &self.methods);
        w.script(Level::Attributes, &self.attributes);
    }
}

impl Decode for ClassDiff {
    fn decode(r: &mut PatchReader<'_>) -> CodecResult<Self> {
        Ok(Self {
            version: r.get()?,
            access: r.get()?,
            name: r.get()?,
            signature: r.get()?,
            super_name: r.get()?,
            interfaces: r.script(Level::Interfaces)?,
            source_file: r.get()?,
            source_debug: r.get()?,
            outer_class: r.get()?,
            nest_host: r.get()?,
            nest_members: r.script(Level::NestMembers)?,
            permitted_subclasses: r.script(Level::PermittedSubclasses)?,
            inner_classes: r.script(Level::InnerClasses)?,
            visible_annotations: r.script(Level::VisibleAnnotations)?,
            invisible_annotations: r.script(Level::InvisibleAnnotations)?,
            record_components: r.script(Level::RecordComponents)?,
            fields: r.script(Level::Fields)?,
            methods: r.script(Level::Methods)?,
            attributes: r.script(Level::Attributes)?,
        })
    }
}
