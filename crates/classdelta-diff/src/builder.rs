//! Diff builder: walks two class trees and produces a [`ClassDiff`].

use std::hash::Hash;

use classdelta_model::{
    checksum, Annotation, Attribute, AttributeBody, ClassNode, ExceptionHandler, Field, InnerClass,
    LineNumber, LocalVariable, Member, Method, RecordComponent,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::align::{align, AlignConfig, Step};
use crate::byte_delta::ByteDelta;
use crate::error::DiffResult;
use crate::matcher::{AttributeMatcher, InstructionMatcher, Matcher, MemberMatcher, ValueMatcher};
use crate::patch::{AttributePatch, BodyPatch, ClassDiff, FieldPatch, MethodPatch, RecordComponentPatch};
use crate::position::PositionMap;
use crate::script::{EditScript, Scalar};

/// Options for [`diff_classes`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiffOptions {
    pub align: AlignConfig,
}

/// Compute the edit that turns `old` into `new`.
///
/// Pure and deterministic: the same inputs always yield the same diff.
/// Opaque attribute bodies that changed are encoded with `delta`.
pub fn diff_classes(
    old: &ClassNode,
    new: &ClassNode,
    options: &DiffOptions,
    delta: &dyn ByteDelta,
) -> DiffResult<ClassDiff> {
    let builder = DiffBuilder {
        align: &options.align,
        delta,
    };

    let diff = ClassDiff {
        version: Scalar::between(&old.version, &new.version),
        access: Scalar::between(&old.access, &new.access),
        name: Scalar::between(&old.name, &new.name),
        signature: Scalar::between(&old.signature, &new.signature),
        super_name: Scalar::between(&old.super_name, &new.super_name),
        interfaces: builder.values("interfaces", &old.interfaces, &new.interfaces, ValueMatcher::new())?,
        source_file: Scalar::between(&old.source_file, &new.source_file),
        source_debug: Scalar::between(&old.source_debug, &new.source_debug),
        outer_class: Scalar::between(&old.outer_class, &new.outer_class),
        nest_host: Scalar::between(&old.nest_host, &new.nest_host),
        nest_members: builder.values(
            "nest_members",
            &old.nest_members,
            &new.nest_members,
            ValueMatcher::new(),
        )?,
        permitted_subclasses: builder.values(
            "permitted_subclasses",
            &old.permitted_subclasses,
            &new.permitted_subclasses,
            ValueMatcher::new(),
        )?,
        inner_classes: builder.values(
            "inner_classes",
            &old.inner_classes,
            &new.inner_classes,
            ValueMatcher::with_similarity(same_inner_class),
        )?,
        visible_annotations: builder.annotations(
            "visible_annotations",
            &old.visible_annotations,
            &new.visible_annotations,
        )?,
        invisible_annotations: builder.annotations(
            "invisible_annotations",
            &old.invisible_annotations,
            &new.invisible_annotations,
        )?,
        record_components: builder.script(
            "record_components",
            &old.record_components,
            &new.record_components,
            &MemberMatcher,
            |o, n| builder.record_component(o, n),
        )?,
        fields: builder.script("fields", &old.fields, &new.fields, &MemberMatcher, |o, n| {
            builder.field(o, n)
        })?,
        methods: builder.script("methods", &old.methods, &new.methods, &MemberMatcher, |o, n| {
            builder.method(o, n)
        })?,
        attributes: builder.attributes("attributes", &old.attributes, &new.attributes)?,
    };

    let stats = diff.stats();
    info!(
        class = %new.name,
        equal = stats.equal,
        inserted = stats.inserted,
        deleted = stats.deleted,
        updated = stats.updated,
        scalars = stats.changed_scalars,
        "built class diff"
    );
    Ok(diff)
}

struct DiffBuilder<'o> {
    align: &'o AlignConfig,
    delta: &'o dyn ByteDelta,
}

impl DiffBuilder<'_> {
    /// Align one level and turn the steps into an edit script.
    ///
    /// Equal and deleted runs record the checksum of the old slice they
    /// consume; updated elements record the checksum of the old element.
    fn script<'a, T, U, M>(
        &self,
        level: &str,
        old: &'a [T],
        new: &'a [T],
        matcher: &M,
        mut change: impl FnMut(&T, &T) -> DiffResult<U>,
    ) -> DiffResult<EditScript<T, U>>
    where
        T: Clone + Serialize,
        M: Matcher<'a, T>,
    {
        let mut script = EditScript::new();
        let mut run: Option<Run> = None;

        for step in align(old, new, matcher, self.align) {
            let next = match step {
                Step::Equal { old: o, .. } => Some((RunKind::Equal, o)),
                Step::Delete(o) => Some((RunKind::Delete, o)),
                Step::Insert(_) | Step::Update { .. } => None,
            };
            if let (Some(pending), Some((kind, index))) = (run.as_mut(), next) {
                if pending.kind == kind && pending.start + pending.count == index {
                    pending.count += 1;
                    continue;
                }
            }
            if let Some(pending) = run.take() {
                pending.flush(old, &mut script)?;
            }
            match step {
                Step::Equal { old: o, .. } => run = Some(Run::new(RunKind::Equal, o)),
                Step::Delete(o) => run = Some(Run::new(RunKind::Delete, o)),
                Step::Insert(n) => script.push_insert(new[n].clone()),
                Step::Update { old: o, new: n } => {
                    let expected = checksum(&old[o])?;
                    script.push_update(expected, change(&old[o], &new[n])?);
                }
            }
        }
        if let Some(pending) = run {
            pending.flush(old, &mut script)?;
        }

        if !script.is_identity() {
            debug!(path = level, old = old.len(), new = new.len(), ops = script.ops.len(), "aligned level");
        }
        Ok(script)
    }

    /// Leaf level: an update carries the new element.
    fn values<T>(&self, level: &str, old: &[T], new: &[T], matcher: ValueMatcher<T>) -> DiffResult<EditScript<T>>
    where
        T: Clone + Hash + Eq + Serialize,
    {
        self.script(level, old, new, &matcher, |_, n| Ok(n.clone()))
    }

    fn annotations(&self, level: &str, old: &[Annotation], new: &[Annotation]) -> DiffResult<EditScript<Annotation>> {
        self.values(level, old, new, ValueMatcher::with_similarity(same_annotation_type))
    }

    fn attributes(
        &self,
        level: &str,
        old: &[Attribute],
        new: &[Attribute],
    ) -> DiffResult<EditScript<Attribute, AttributePatch>> {
        self.script(level, old, new, &AttributeMatcher, |o, n| self.attribute(level, o, n))
    }

    fn attribute(&self, level: &str, old: &Attribute, new: &Attribute) -> DiffResult<AttributePatch> {
        let level = format!("{level}.{}", old.name);
        Ok(match (&old.body, &new.body) {
            (AttributeBody::LineNumbers(a), AttributeBody::LineNumbers(b)) => AttributePatch::LineNumbers(
                self.values(&level, a, b, ValueMatcher::with_similarity(same_line_start))?,
            ),
            (AttributeBody::LocalVariables(a), AttributeBody::LocalVariables(b)) => {
                AttributePatch::LocalVariables(self.values(&level, a, b, ValueMatcher::with_similarity(same_local))?)
            }
            (AttributeBody::Opaque(a), AttributeBody::Opaque(b)) => AttributePatch::Opaque(self.delta.diff(a, b)?),
            _ => AttributePatch::Replace(new.clone()),
        })
    }

    fn field(&self, old: &Field, new: &Field) -> DiffResult<FieldPatch> {
        let level = format!("fields[{}]", old.key());
        Ok(FieldPatch {
            access: Scalar::between(&old.access, &new.access),
            name: Scalar::between(&old.name, &new.name),
            signature: Scalar::between(&old.signature, &new.signature),
            value: Scalar::between(&old.value, &new.value),
            visible_annotations: self.annotations(
                &format!("{level}.visible_annotations"),
                &old.visible_annotations,
                &new.visible_annotations,
            )?,
            invisible_annotations: self.annotations(
                &format!("{level}.invisible_annotations"),
                &old.invisible_annotations,
                &new.invisible_annotations,
            )?,
            attributes: self.attributes(&format!("{level}.attributes"), &old.attributes, &new.attributes)?,
        })
    }

    /// Instructions first; the handler and debug tables of `old` are then
    /// rebased through the instruction script before being aligned.
    fn method(&self, old: &Method, new: &Method) -> DiffResult<MethodPatch> {
        let level = format!("methods[{}]", old.key());

        let instructions = self.script(
            &format!("{level}.instructions"),
            &old.instructions,
            &new.instructions,
            &InstructionMatcher,
            |_, n| Ok(n.clone()),
        )?;
        let positions = PositionMap::from_script(old.instructions.len(), &instructions);

        let handlers = self.values(
            &format!("{level}.handlers"),
            &positions.rebase_handlers(&old.handlers),
            &new.handlers,
            ValueMatcher::with_similarity(same_handler_range),
        )?;
        let attributes = self.attributes(
            &format!("{level}.attributes"),
            &positions.rebase_attributes(&old.attributes),
            &new.attributes,
        )?;

        Ok(MethodPatch {
            access: Scalar::between(&old.access, &new.access),
            name: Scalar::between(&old.name, &new.name),
            signature: Scalar::between(&old.signature, &new.signature),
            exceptions: self.values(
                &format!("{level}.exceptions"),
                &old.exceptions,
                &new.exceptions,
                ValueMatcher::new(),
            )?,
            parameters: self.values(
                &format!("{level}.parameters"),
                &old.parameters,
                &new.parameters,
                ValueMatcher::new(),
            )?,
            annotation_default: Scalar::between(&old.annotation_default, &new.annotation_default),
            visible_annotations: self.annotations(
                &format!("{level}.visible_annotations"),
                &old.visible_annotations,
                &new.visible_annotations,
            )?,
            invisible_annotations: self.annotations(
                &format!("{level}.invisible_annotations"),
                &old.invisible_annotations,
                &new.invisible_annotations,
            )?,
            visible_parameter_annotations: self.values(
                &format!("{level}.visible_parameter_annotations"),
                &old.visible_parameter_annotations,
                &new.visible_parameter_annotations,
                ValueMatcher::with_similarity(same_parameter_slot),
            )?,
            invisible_parameter_annotations: self.values(
                &format!("{level}.invisible_parameter_annotations"),
                &old.invisible_parameter_annotations,
                &new.invisible_parameter_annotations,
                ValueMatcher::with_similarity(same_parameter_slot),
            )?,
            max_stack: Scalar::between(&old.max_stack, &new.max_stack),
            max_locals: Scalar::between(&old.max_locals, &new.max_locals),
            body: BodyPatch {
                instructions,
                handlers,
            },
            attributes,
        })
    }

    fn record_component(&self, old: &RecordComponent, new: &RecordComponent) -> DiffResult<RecordComponentPatch> {
        let level = format!("record_components[{}]", old.key());
        Ok(RecordComponentPatch {
            name: Scalar::between(&old.name, &new.name),
            signature: Scalar::between(&old.signature, &new.signature),
            visible_annotations: self.annotations(
                &format!("{level}.visible_annotations"),
                &old.visible_annotations,
                &new.visible_annotations,
            )?,
            invisible_annotations: self.annotations(
                &format!("{level}.invisible_annotations"),
                &old.invisible_annotations,
                &new.invisible_annotations,
            )?,
            attributes: self.attributes(&format!("{level}.attributes"), &old.attributes, &new.attributes)?,
        })
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum RunKind {
    Equal,
    Delete,
}

/// A pending run of consecutive old elements that are copied or skipped.
struct Run {
    kind: RunKind,
    start: usize,
    count: usize,
}

impl Run {
    fn new(kind: RunKind, start: usize) -> Self {
        Self { kind, start, count: 1 }
    }

    fn flush<T: Serialize, U>(self, old: &[T], script: &mut EditScript<T, U>) -> DiffResult<()> {
        let sum = checksum(&old[self.start..self.start + self.count])?;
        match self.kind {
            RunKind::Equal => script.push_equal(self.count, sum),
            RunKind::Delete => script.push_delete(self.count, sum),
        }
        Ok(())
    }
}

fn same_annotation_type(a: &Annotation, b: &Annotation) -> bool {
    a.descriptor == b.descriptor
}

/// Parameter annotation lists are positional, so any replaced list pairs up.
#[allow(clippy::ptr_arg)]
fn same_parameter_slot(_: &Vec<Annotation>, _: &Vec<Annotation>) -> bool {
    true
}

fn same_inner_class(a: &InnerClass, b: &InnerClass) -> bool {
    a.name == b.name
}

fn same_handler_range(a: &ExceptionHandler, b: &ExceptionHandler) -> bool {
    a.start == b.start && a.end == b.end
}

fn same_line_start(a: &LineNumber, b: &LineNumber) -> bool {
    a.start == b.start
}

fn same_local(a: &LocalVariable, b: &LocalVariable) -> bool {
    a.index == b.index && a.name == b.name
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::byte_delta::ZstdDelta;
    use crate::script::Op;
    use classdelta_model::opcodes::*;
    use classdelta_model::{Constant, Instruction, MemberRef};

    fn diff(old: &ClassNode, new: &ClassNode) -> ClassDiff {
        diff_classes(old, new, &DiffOptions::default(), &ZstdDelta::default()).unwrap()
    }

    fn counting_method() -> Method {
        Method::new(1, "count", "(I)I").with_body(
            2,
            2,
            vec![
                Instruction::var(ILOAD, 1),
                Instruction::jump(IFLE, 3),
                Instruction::var(ILOAD, 1),
                Instruction::simple(IRETURN),
                Instruction::simple(ICONST_0),
                Instruction::simple(IRETURN),
            ],
        )
    }

    fn sample() -> ClassNode {
        ClassNode::new("demo/Counter")
            .with_field(Field::new(2, "total", "I"))
            .with_field(Field::new(2, "name", "Ljava/lang/String;"))
            .with_method(Method::new(1, "<init>", "()V").with_body(
                1,
                1,
                vec![
                    Instruction::var(ALOAD, 0),
                    Instruction::method(INVOKESPECIAL, MemberRef::new("java/lang/Object", "<init>", "()V")),
                    Instruction::simple(RETURN),
                ],
            ))
            .with_method(counting_method())
    }

    #[test]
    fn identical_classes_give_identity_diff() {
        let class = sample();
        let diff = diff(&class, &class);
        assert!(diff.is_identity());
        assert_eq!(
            diff.fields.ops,
            vec![Op::Equal {
                count: 2,
                checksum: checksum(&class.fields[..]).unwrap()
            }]
        );
        assert_eq!(diff.methods.ops.len(), 1);
    }

    #[test]
    fn field_rename_is_single_update() {
        let old = sample();
        let mut new = old.clone();
        new.fields[0].name = "sum".into();

        let diff = diff(&old, &new);
        let stats = diff.stats();
        assert_eq!(stats.updated, 1);
        assert_eq!((stats.inserted, stats.deleted), (0, 0));
        match &diff.fields.ops[0] {
            Op::Update { change, .. } => assert_eq!(change.name, Scalar::Changed("sum".to_string())),
            other => panic!("expected update, got {other:?}"),
        }
    }

    #[test]
    fn inserted_instruction_leaves_rest_equal() {
        let old = sample();
        let mut new = old.clone();
        new.methods[1]
            .instructions
            .insert(0, Instruction::simple(NOP));

        let diff = diff(&old, &new);
        let patch = diff.methods.updates().next().unwrap();
        assert_eq!(
            patch.body.instructions.ops,
            vec![
                Op::Insert(vec![Instruction::simple(NOP)]),
                Op::Equal {
                    count: 6,
                    checksum: checksum(&old.methods[1].instructions[..]).unwrap()
                }
            ]
        );
        assert_eq!(diff.stats().inserted, 1);
    }

    #[test]
    fn changed_constant_is_instruction_update() {
        let mut old = sample();
        old.methods[1].instructions[4] = Instruction::ldc(Constant::Int(7));
        let mut new = old.clone();
        new.methods[1].instructions[4] = Instruction::ldc(Constant::Int(8));

        let diff = diff(&old, &new);
        let patch = diff.methods.updates().next().unwrap();
        let updates: Vec<_> = patch.body.instructions.updates().collect();
        assert_eq!(updates, vec![&Instruction::ldc(Constant::Int(8))]);
    }

    #[test]
    fn handlers_follow_instruction_shift() {
        let mut old = sample();
        old.methods[1].handlers.push(ExceptionHandler {
            start: 2,
            end: 4,
            handler: 4,
            catch_type: None,
        });
        let mut new = old.clone();
        new.methods[1].instructions.insert(0, Instruction::simple(NOP));
        new.methods[1].handlers[0] = ExceptionHandler {
            start: 3,
            end: 5,
            handler: 5,
            catch_type: None,
        };

        let diff = diff(&old, &new);
        let patch = diff.methods.updates().next().unwrap();
        assert!(patch.body.handlers.is_identity());
    }

    #[test]
    fn parameter_annotation_change_is_positional_update() {
        let mut old = sample();
        old.methods[1].visible_parameter_annotations = vec![vec![Annotation::new("Ldemo/Positive;")]];
        let mut new = old.clone();
        new.methods[1].visible_parameter_annotations = vec![vec![Annotation::new("Ldemo/NonZero;")]];

        let diff = diff(&old, &new);
        let patch = diff.methods.updates().next().unwrap();
        let updates: Vec<_> = patch.visible_parameter_annotations.updates().collect();
        assert_eq!(updates, vec![&vec![Annotation::new("Ldemo/NonZero;")]]);
        assert!(patch.invisible_parameter_annotations.is_identity());
        assert!(patch.body.instructions.is_identity());
    }

    #[test]
    fn opaque_attribute_change_uses_byte_delta() {
        let mut old = sample();
        old.attributes.push(Attribute::opaque("Custom", vec![1, 2, 3, 4]));
        let mut new = old.clone();
        new.attributes[0] = Attribute::opaque("Custom", vec![1, 2, 3, 5]);

        let diff = diff(&old, &new);
        assert!(matches!(
            diff.attributes.updates().next(),
            Some(AttributePatch::Opaque(_))
        ));
    }

    #[test]
    fn attribute_kind_change_is_replacement() {
        let mut old = sample();
        old.attributes.push(Attribute::opaque(classdelta_model::LINE_NUMBER_TABLE, vec![0]));
        let mut new = old.clone();
        new.attributes[0] = Attribute::line_numbers(vec![]);

        let diff = diff(&old, &new);
        assert!(matches!(
            diff.attributes.updates().next(),
            Some(AttributePatch::Replace(_))
        ));
    }

    #[test]
    fn removed_members_record_checksum() {
        let old = sample();
        let mut new = old.clone();
        new.fields.clear();

        let diff = diff(&old, &new);
        assert_eq!(
            diff.fields.ops,
            vec![Op::Delete {
                count: 2,
                checksum: checksum(&old.fields[..]).unwrap()
            }]
        );
    }

    #[test]
    fn diffs_are_deterministic() {
        let old = sample();
        let mut new = old.clone();
        new.methods.swap(0, 1);
        new.interfaces.push("java/io/Serializable".into());
        assert_eq!(diff(&old, &new), diff(&old, &new));
    }
}
