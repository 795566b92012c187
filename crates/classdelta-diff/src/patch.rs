//! Nested patch payloads and the root [`ClassDiff`].

use classdelta_model::{
    Annotation, AnnotationValue, Attribute, Constant, ExceptionHandler, Field, InnerClass,
    Instruction, LineNumber, LocalVariable, Method, OuterClass, Parameter, RecordComponent,
};
use serde::{Deserialize, Serialize};

use crate::script::{DiffStats, EditScript, Scalar};

/// The complete edit from one class to another.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassDiff {
    pub version: Scalar<u32>,
    pub access: Scalar<u32>,
    pub name: Scalar<String>,
    pub signature: Scalar<Option<String>>,
    pub super_name: Scalar<Option<String>>,
    pub interfaces: EditScript<String>,
    pub source_file: Scalar<Option<String>>,
    pub source_debug: Scalar<Option<String>>,
    pub outer_class: Scalar<Option<OuterClass>>,
    pub nest_host: Scalar<Option<String>>,
    pub nest_members: EditScript<String>,
    pub permitted_subclasses: EditScript<String>,
    pub inner_classes: EditScript<InnerClass>,
    pub visible_annotations: EditScript<Annotation>,
    pub invisible_annotations: EditScript<Annotation>,
    pub record_components: EditScript<RecordComponent, RecordComponentPatch>,
    pub fields: EditScript<Field, FieldPatch>,
    pub methods: EditScript<Method, MethodPatch>,
    pub attributes: EditScript<Attribute, AttributePatch>,
}

impl ClassDiff {
    /// Element counts over every level.
    pub fn stats(&self) -> DiffStats {
        let mut stats = DiffStats::default();
        for scalar in [
            self.version.is_changed(),
            self.access.is_changed(),
            self.name.is_changed(),
            self.signature.is_changed(),
            self.super_name.is_changed(),
            self.source_file.is_changed(),
            self.source_debug.is_changed(),
            self.outer_class.is_changed(),
            self.nest_host.is_changed(),
        ] {
            stats.changed_scalars += usize::from(scalar);
        }
        self.interfaces.tally(&mut stats);
        self.nest_members.tally(&mut stats);
        self.permitted_subclasses.tally(&mut stats);
        self.inner_classes.tally(&mut stats);
        self.visible_annotations.tally(&mut stats);
        self.invisible_annotations.tally(&mut stats);

        self.record_components.tally(&mut stats);
        self.record_components.updates().for_each(|p| p.tally(&mut stats));
        self.fields.tally(&mut stats);
        self.fields.updates().for_each(|p| p.tally(&mut stats));
        self.methods.tally(&mut stats);
        self.methods.updates().for_each(|p| p.tally(&mut stats));
        tally_attributes(&self.attributes, &mut stats);
        stats
    }

    /// Returns `true` if applying this diff reproduces its source unchanged.
    pub fn is_identity(&self) -> bool {
        self.stats().is_identity()
    }
}

/// Changes to a field that kept its slot in the member list.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldPatch {
    pub access: Scalar<u32>,
    pub name: Scalar<String>,
    pub signature: Scalar<Option<String>>,
    pub value: Scalar<Option<Constant>>,
    pub visible_annotations: EditScript<Annotation>,
    pub invisible_annotations: EditScript<Annotation>,
    pub attributes: EditScript<Attribute, AttributePatch>,
}

impl FieldPatch {
    fn tally(&self, stats: &mut DiffStats) {
        self.access.tally(stats);
        self.name.tally(stats);
        self.signature.tally(stats);
        self.value.tally(stats);
        self.visible_annotations.tally(stats);
        self.invisible_annotations.tally(stats);
        tally_attributes(&self.attributes, stats);
    }
}

/// Changes to a method that kept its slot in the member list.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodPatch {
    pub access: Scalar<u32>,
    pub name: Scalar<String>,
    pub signature: Scalar<Option<String>>,
    pub exceptions: EditScript<String>,
    pub parameters: EditScript<Parameter>,
    pub annotation_default: Scalar<Option<AnnotationValue>>,
    pub visible_annotations: EditScript<Annotation>,
    pub invisible_annotations: EditScript<Annotation>,
    /// Aligned per parameter; an update replaces that parameter's list.
    pub visible_parameter_annotations: EditScript<Vec<Annotation>>,
    pub invisible_parameter_annotations: EditScript<Vec<Annotation>>,
    pub max_stack: Scalar<u16>,
    pub max_locals: Scalar<u16>,
    pub body: BodyPatch,
    /// Applies to the source attributes after their positions are rebased
    /// through `body.instructions`.
    pub attributes: EditScript<Attribute, AttributePatch>,
}

impl MethodPatch {
    fn tally(&self, stats: &mut DiffStats) {
        self.access.tally(stats);
        self.name.tally(stats);
        self.signature.tally(stats);
        self.exceptions.tally(stats);
        self.parameters.tally(stats);
        self.annotation_default.tally(stats);
        self.visible_annotations.tally(stats);
        self.invisible_annotations.tally(stats);
        self.visible_parameter_annotations.tally(stats);
        self.invisible_parameter_annotations.tally(stats);
        self.max_stack.tally(stats);
        self.max_locals.tally(stats);
        self.body.instructions.tally(stats);
        self.body.handlers.tally(stats);
        tally_attributes(&self.attributes, stats);
    }
}

/// Instruction and exception table changes of a method body.
///
/// `handlers` applies to the source handlers after their positions are
/// rebased through `instructions`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BodyPatch {
    pub instructions: EditScript<Instruction>,
    pub handlers: EditScript<ExceptionHandler>,
}

/// Changes to a record component that kept its slot.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordComponentPatch {
    pub name: Scalar<String>,
    pub signature: Scalar<Option<String>>,
    pub visible_annotations: EditScript<Annotation>,
    pub invisible_annotations: EditScript<Annotation>,
    pub attributes: EditScript<Attribute, AttributePatch>,
}

impl RecordComponentPatch {
    fn tally(&self, stats: &mut DiffStats) {
        self.name.tally(stats);
        self.signature.tally(stats);
        self.visible_annotations.tally(stats);
        self.invisible_annotations.tally(stats);
        tally_attributes(&self.attributes, stats);
    }
}

/// Change to an attribute that kept its name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttributePatch {
    LineNumbers(EditScript<LineNumber>),
    LocalVariables(EditScript<LocalVariable>),
    /// Byte delta of an opaque body.
    Opaque(Vec<u8>),
    /// The body changed kind; carries the new attribute whole.
    Replace(Attribute),
}

fn tally_attributes(script: &EditScript<Attribute, AttributePatch>, stats: &mut DiffStats) {
    script.tally(stats);
    for patch in script.updates() {
        match patch {
            AttributePatch::LineNumbers(entries) => entries.tally(stats),
            AttributePatch::LocalVariables(entries) => entries.tally(stats),
            AttributePatch::Opaque(_) | AttributePatch::Replace(_) => {}
        }
    }
}
