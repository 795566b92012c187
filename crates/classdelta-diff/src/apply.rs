//! Patch applier: replays a [`ClassDiff`] against its source tree.

use classdelta_model::{
    checksum, Attribute, AttributeBody, ClassNode, Field, Member, Method, RecordComponent,
};
use serde::Serialize;
use tracing::info;

use crate::byte_delta::ByteDelta;
use crate::describe::Describe;
use crate::error::{DiffError, DiffResult};
use crate::patch::{AttributePatch, ClassDiff, FieldPatch, MethodPatch, RecordComponentPatch};
use crate::position::PositionMap;
use crate::script::{EditScript, Op};

/// Apply `diff` to `source`, reproducing the tree it was built against.
///
/// Every source element a script copies, skips or updates is checked
/// against the checksum recorded when the diff was built, and every script
/// must consume its source sequence
/// exactly. Any disagreement fails with [`DiffError::StructuralMismatch`];
/// no partial result is returned.
pub fn apply_diff(source: &ClassNode, diff: &ClassDiff, delta: &dyn ByteDelta) -> DiffResult<ClassNode> {
    let applier = Applier { delta };

    let class = ClassNode {
        version: diff.version.resolve(&source.version),
        access: diff.access.resolve(&source.access),
        name: diff.name.resolve(&source.name),
        signature: diff.signature.resolve(&source.signature),
        super_name: diff.super_name.resolve(&source.super_name),
        interfaces: apply_script("interfaces", &source.interfaces, &diff.interfaces, |_, new| {
            Ok(new.clone())
        })?,
        source_file: diff.source_file.resolve(&source.source_file),
        source_debug: diff.source_debug.resolve(&source.source_debug),
        outer_class: diff.outer_class.resolve(&source.outer_class),
        nest_host: diff.nest_host.resolve(&source.nest_host),
        nest_members: apply_script("nest_members", &source.nest_members, &diff.nest_members, |_, new| {
            Ok(new.clone())
        })?,
        permitted_subclasses: apply_script(
            "permitted_subclasses",
            &source.permitted_subclasses,
            &diff.permitted_subclasses,
            |_, new| Ok(new.clone()),
        )?,
        inner_classes: apply_script("inner_classes", &source.inner_classes, &diff.inner_classes, |_, new| {
            Ok(new.clone())
        })?,
        visible_annotations: apply_script(
            "visible_annotations",
            &source.visible_annotations,
            &diff.visible_annotations,
            |_, new| Ok(new.clone()),
        )?,
        invisible_annotations: apply_script(
            "invisible_annotations",
            &source.invisible_annotations,
            &diff.invisible_annotations,
            |_, new| Ok(new.clone()),
        )?,
        record_components: apply_script(
            "record_components",
            &source.record_components,
            &diff.record_components,
            |component, patch| applier.record_component(component, patch),
        )?,
        fields: apply_script("fields", &source.fields, &diff.fields, |field, patch| {
            applier.field(field, patch)
        })?,
        methods: apply_script("methods", &source.methods, &diff.methods, |method, patch| {
            applier.method(method, patch)
        })?,
        attributes: applier.attributes("attributes", &source.attributes, &diff.attributes)?,
    };

    info!(
        class = %class.name,
        fields = class.fields.len(),
        methods = class.methods.len(),
        instructions = class.instruction_count(),
        "applied class diff"
    );
    Ok(class)
}

/// Replay one level's script over `source`.
pub fn apply_script<T, U>(
    level: &str,
    source: &[T],
    script: &EditScript<T, U>,
    mut update: impl FnMut(&T, &U) -> DiffResult<T>,
) -> DiffResult<Vec<T>>
where
    T: Clone + Serialize + Describe,
{
    let mut out = Vec::with_capacity(source.len());
    let mut cursor = 0;

    for op in &script.ops {
        match op {
            Op::Equal { count, checksum } => {
                let end = take(level, source, cursor, *count)?;
                verify(level, cursor, &source[cursor..end], *checksum)?;
                out.extend_from_slice(&source[cursor..end]);
                cursor = end;
            }
            Op::Insert(items) => out.extend(items.iter().cloned()),
            Op::Delete { count, checksum } => {
                let end = take(level, source, cursor, *count)?;
                verify(level, cursor, &source[cursor..end], *checksum)?;
                cursor = end;
            }
            Op::Update { checksum, change } => {
                let end = take(level, source, cursor, 1)?;
                verify(level, cursor, &source[cursor], *checksum)?;
                out.push(update(&source[cursor], change)?);
                cursor = end;
            }
        }
    }

    if let Some(rest) = source.get(cursor) {
        return Err(DiffError::mismatch(
            level,
            cursor,
            "end of sequence",
            format!("{} ({} unconsumed)", rest.describe(), source.len() - cursor),
        ));
    }
    Ok(out)
}

/// End index of the next `n` source elements, or a mismatch if the source
/// runs out first.
fn take<T>(level: &str, source: &[T], cursor: usize, n: usize) -> DiffResult<usize> {
    match cursor.checked_add(n) {
        Some(end) if end <= source.len() => Ok(end),
        _ => Err(DiffError::mismatch(
            level,
            cursor,
            format!("{n} more elements"),
            format!("{} remaining", source.len() - cursor),
        )),
    }
}

fn verify<V>(level: &str, index: usize, found: &V, expected: u32) -> DiffResult<()>
where
    V: Serialize + Describe + ?Sized,
{
    let actual = checksum(found)?;
    if actual != expected {
        return Err(DiffError::mismatch(
            level,
            index,
            format!("checksum {expected:08x}"),
            format!("{} (checksum {actual:08x})", found.describe()),
        ));
    }
    Ok(())
}

struct Applier<'d> {
    delta: &'d dyn ByteDelta,
}

impl Applier<'_> {
    fn attributes(
        &self,
        level: &str,
        source: &[Attribute],
        script: &EditScript<Attribute, AttributePatch>,
    ) -> DiffResult<Vec<Attribute>> {
        apply_script(level, source, script, |attr, patch| self.attribute(level, attr, patch))
    }

    fn attribute(&self, level: &str, source: &Attribute, patch: &AttributePatch) -> DiffResult<Attribute> {
        let level = format!("{level}.{}", source.name);
        let body = match (patch, &source.body) {
            (AttributePatch::Replace(attr), _) => return Ok(attr.clone()),
            (AttributePatch::LineNumbers(script), AttributeBody::LineNumbers(entries)) => {
                AttributeBody::LineNumbers(apply_script(&level, entries, script, |_, new| Ok(new.clone()))?)
            }
            (AttributePatch::LocalVariables(script), AttributeBody::LocalVariables(entries)) => {
                AttributeBody::LocalVariables(apply_script(&level, entries, script, |_, new| Ok(new.clone()))?)
            }
            (AttributePatch::Opaque(blob), AttributeBody::Opaque(bytes)) => {
                AttributeBody::Opaque(self.delta.apply(bytes, blob)?)
            }
            (patch, body) => {
                return Err(DiffError::mismatch(
                    &level,
                    0,
                    format!("{} body", patch_kind(patch)),
                    format!("{} body", body.kind()),
                ))
            }
        };
        Ok(Attribute {
            name: source.name.clone(),
            body,
        })
    }

    fn field(&self, source: &Field, patch: &FieldPatch) -> DiffResult<Field> {
        let level = format!("fields[{}]", source.key());
        Ok(Field {
            access: patch.access.resolve(&source.access),
            name: patch.name.resolve(&source.name),
            descriptor: source.descriptor.clone(),
            signature: patch.signature.resolve(&source.signature),
            value: patch.value.resolve(&source.value),
            visible_annotations: apply_script(
                &format!("{level}.visible_annotations"),
                &source.visible_annotations,
                &patch.visible_annotations,
                |_, new| Ok(new.clone()),
            )?,
            invisible_annotations: apply_script(
                &format!("{level}.invisible_annotations"),
                &source.invisible_annotations,
                &patch.invisible_annotations,
                |_, new| Ok(new.clone()),
            )?,
            attributes: self.attributes(&format!("{level}.attributes"), &source.attributes, &patch.attributes)?,
        })
    }

    fn method(&self, source: &Method, patch: &MethodPatch) -> DiffResult<Method> {
        let level = format!("methods[{}]", source.key());

        let instructions = apply_script(
            &format!("{level}.instructions"),
            &source.instructions,
            &patch.body.instructions,
            |_, new| Ok(new.clone()),
        )?;
        let positions = PositionMap::from_script(source.instructions.len(), &patch.body.instructions);
        let handlers = apply_script(
            &format!("{level}.handlers"),
            &positions.rebase_handlers(&source.handlers),
            &patch.body.handlers,
            |_, new| Ok(new.clone()),
        )?;
        let attributes = self.attributes(
            &format!("{level}.attributes"),
            &positions.rebase_attributes(&source.attributes),
            &patch.attributes,
        )?;

        Ok(Method {
            access: patch.access.resolve(&source.access),
            name: patch.name.resolve(&source.name),
            descriptor: source.descriptor.clone(),
            signature: patch.signature.resolve(&source.signature),
            exceptions: apply_script(
                &format!("{level}.exceptions"),
                &source.exceptions,
                &patch.exceptions,
                |_, new| Ok(new.clone()),
            )?,
            parameters: apply_script(
                &format!("{level}.parameters"),
                &source.parameters,
                &patch.parameters,
                |_, new| Ok(new.clone()),
            )?,
            annotation_default: patch.annotation_default.resolve(&source.annotation_default),
            visible_annotations: apply_script(
                &format!("{level}.visible_annotations"),
                &source.visible_annotations,
                &patch.visible_annotations,
                |_, new| Ok(new.clone()),
            )?,
            invisible_annotations: apply_script(
                &format!("{level}.invisible_annotations"),
                &source.invisible_annotations,
                &patch.invisible_annotations,
                |_, new| Ok(new.clone()),
            )?,
            visible_parameter_annotations: apply_script(
                &format!("{level}.visible_parameter_annotations"),
                &source.visible_parameter_annotations,
                &patch.visible_parameter_annotations,
                |_, new| Ok(new.clone()),
            )?,
            invisible_parameter_annotations: apply_script(
                &format!("{level}.invisible_parameter_annotations"),
                &source.invisible_parameter_annotations,
                &patch.invisible_parameter_annotations,
                |_, new| Ok(new.clone()),
            )?,
            max_stack: patch.max_stack.resolve(&source.max_stack),
            max_locals: patch.max_locals.resolve(&source.max_locals),
            instructions,
            handlers,
            attributes,
        })
    }

    fn record_component(&self, source: &RecordComponent, patch: &RecordComponentPatch) -> DiffResult<RecordComponent> {
        let level = format!("record_components[{}]", source.key());
        Ok(RecordComponent {
            name: patch.name.resolve(&source.name),
            descriptor: source.descriptor.clone(),
            signature: patch.signature.resolve(&source.signature),
            visible_annotations: apply_script(
                &format!("{level}.visible_annotations"),
                &source.visible_annotations,
                &patch.visible_annotations,
                |_, new| Ok(new.clone()),
            )?,
            invisible_annotations: apply_script(
                &format!("{level}.invisible_annotations"),
                &source.invisible_annotations,
                &patch.invisible_annotations,
                |_, new| Ok(new.clone()),
            )?,
            attributes: self.attributes(&format!("{level}.attributes"), &source.attributes, &patch.attributes)?,
        })
    }
}

fn patch_kind(patch: &AttributePatch) -> &'static str {
    match patch {
        AttributePatch::LineNumbers(_) => "line-numbers",
        AttributePatch::LocalVariables(_) => "local-variables",
        AttributePatch::Opaque(_) => "opaque",
        AttributePatch::Replace(_) => "replacement",
    }
}
