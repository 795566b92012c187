//! Structural invariants checked before a tree enters the diff engine.

use std::collections::HashSet;

use crate::annotation::Annotation;
use crate::attribute::{Attribute, AttributeBody};
use crate::class::ClassNode;
use crate::constant::Constant;
use crate::error::{ModelError, ModelResult};
use crate::instruction::Operand;
use crate::member::{Member, Method};
use crate::opcodes;

/// Deepest annotation or dynamic-constant nesting accepted by validation and
/// by patch decoding.
pub const MAX_ANNOTATION_DEPTH: usize = 64;

impl ClassNode {
    /// Check the invariants the diff engine relies on.
    ///
    /// Rejects empty class names, duplicate member identity keys, dangling
    /// label operands, labels on non-branch instructions, exception handler
    /// and debug table positions outside the owning body, and annotation or
    /// dynamic constant nesting deeper than [`MAX_ANNOTATION_DEPTH`].
    pub fn validate(&self) -> ModelResult<()> {
        if self.name.is_empty() {
            return Err(ModelError::malformed("class", "empty class name"));
        }

        unique_keys("fields", &self.fields)?;
        unique_keys("methods", &self.methods)?;
        unique_keys("record_components", &self.record_components)?;

        annotations("class", &self.visible_annotations)?;
        annotations("class", &self.invisible_annotations)?;
        for field in &self.fields {
            let location = format!("fields[{}]", field.key());
            annotations(&location, &field.visible_annotations)?;
            annotations(&location, &field.invisible_annotations)?;
            if let Some(value) = &field.value {
                constant(&location, value)?;
            }
        }
        for component in &self.record_components {
            let location = format!("record_components[{}]", component.key());
            annotations(&location, &component.visible_annotations)?;
            annotations(&location, &component.invisible_annotations)?;
        }
        for method in &self.methods {
            validate_method(method)?;
        }
        Ok(())
    }
}

fn unique_keys<M: Member>(level: &str, members: &[M]) -> ModelResult<()> {
    let mut seen = HashSet::with_capacity(members.len());
    for (index, member) in members.iter().enumerate() {
        if !seen.insert(member.key()) {
            return Err(ModelError::malformed(
                format!("{level}[{index}]"),
                format!("duplicate member `{}`", member.key()),
            ));
        }
    }
    Ok(())
}

fn annotations(location: &str, list: &[Annotation]) -> ModelResult<()> {
    for annotation in list {
        nesting(location, || format!("annotation {}", annotation.descriptor), annotation.depth())?;
    }
    Ok(())
}

fn constant(location: &str, value: &Constant) -> ModelResult<()> {
    nesting(location, || format!("constant {value}"), value.depth())
}

fn nesting(location: &str, what: impl FnOnce() -> String, depth: usize) -> ModelResult<()> {
    if depth > MAX_ANNOTATION_DEPTH {
        return Err(ModelError::malformed(
            location,
            format!("{} nests deeper than {MAX_ANNOTATION_DEPTH}", what()),
        ));
    }
    Ok(())
}

fn validate_method(method: &Method) -> ModelResult<()> {
    let location = format!("methods[{}]", method.key());
    let len = method.instructions.len() as i64;

    annotations(&location, &method.visible_annotations)?;
    annotations(&location, &method.invisible_annotations)?;
    for list in method
        .visible_parameter_annotations
        .iter()
        .chain(&method.invisible_parameter_annotations)
    {
        annotations(&location, list)?;
    }
    if let Some(value) = &method.annotation_default {
        nesting(&location, || "annotation default".to_string(), value.depth())?;
    }

    for (index, insn) in method.instructions.iter().enumerate() {
        for operand in &insn.operands {
            let depth = match operand {
                Operand::Constant(value) => value.depth(),
                Operand::Dynamic(dynamic) => dynamic.depth(),
                _ => 0,
            };
            if depth > MAX_ANNOTATION_DEPTH {
                return Err(ModelError::malformed(
                    format!("{location}.instructions[{index}]"),
                    format!("`{insn}` nests deeper than {MAX_ANNOTATION_DEPTH}"),
                ));
            }
        }

        let mut targets = insn.targets(index).peekable();
        if targets.peek().is_some() && !opcodes::is_branch(insn.opcode) {
            return Err(ModelError::malformed(
                format!("{location}.instructions[{index}]"),
                format!("label operand on non-branch instruction `{insn}`"),
            ));
        }
        for target in targets {
            if target < 0 || target >= len {
                return Err(ModelError::malformed(
                    format!("{location}.instructions[{index}]"),
                    format!("dangling label: target {target} outside 0..{len}"),
                ));
            }
        }
    }

    let len = method.instructions.len() as u32;
    for (index, handler) in method.handlers.iter().enumerate() {
        if handler.start >= handler.end || handler.end > len || handler.handler >= len {
            return Err(ModelError::malformed(
                format!("{location}.handlers[{index}]"),
                format!(
                    "range [{}, {}) -> {} outside body of {len} instructions",
                    handler.start, handler.end, handler.handler
                ),
            ));
        }
    }

    for attr in &method.attributes {
        validate_code_attribute(&location, attr, len)?;
    }
    Ok(())
}

fn validate_code_attribute(location: &str, attr: &Attribute, len: u32) -> ModelResult<()> {
    match &attr.body {
        AttributeBody::LineNumbers(entries) => {
            for (index, entry) in entries.iter().enumerate() {
                if entry.start >= len {
                    return Err(ModelError::malformed(
                        format!("{location}.{}[{index}]", attr.name),
                        format!("line {} starts at {} outside body of {len}", entry.line, entry.start),
                    ));
                }
            }
        }
        AttributeBody::LocalVariables(entries) => {
            for (index, entry) in entries.iter().enumerate() {
                if entry.start > entry.end || entry.end > len {
                    return Err(ModelError::malformed(
                        format!("{location}.{}[{index}]", attr.name),
                        format!(
                            "variable {} scope [{}, {}) outside body of {len}",
                            entry.name, entry.start, entry.end
                        ),
                    ));
                }
            }
        }
        AttributeBody::Opaque(_) => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::AnnotationValue;
    use crate::attribute::{ExceptionHandler, LineNumber, LocalVariable};
    use crate::constant::{DynamicRef, Handle};
    use crate::instruction::Instruction;
    use crate::member::Field;
    use crate::opcodes::*;

    fn body(instructions: Vec<Instruction>) -> Method {
        Method::new(1, "m", "()V").with_body(1, 1, instructions)
    }

    fn assert_malformed(class: &ClassNode) {
        assert!(matches!(
            class.validate(),
            Err(ModelError::MalformedInput { .. })
        ));
    }

    #[test]
    fn minimal_class_is_valid() {
        let class = ClassNode::new("a/B")
            .with_field(Field::new(0, "x", "I"))
            .with_method(body(vec![
                Instruction::jump(GOTO, 1),
                Instruction::simple(RETURN),
            ]));
        assert_eq!(class.validate(), Ok(()));
    }

    #[test]
    fn empty_name_rejected() {
        assert_malformed(&ClassNode::new(""));
    }

    #[test]
    fn duplicate_field_key_rejected() {
        let class = ClassNode::new("a/B")
            .with_field(Field::new(0, "x", "I"))
            .with_field(Field::new(8, "x", "I"));
        let err = class.validate().unwrap_err();
        match err {
            ModelError::MalformedInput { location, reason } => {
                assert_eq!(location, "fields[1]");
                assert!(reason.contains("x:I"));
            }
            other => panic!("expected MalformedInput, got {other:?}"),
        }
    }

    #[test]
    fn same_name_different_descriptor_allowed() {
        let class = ClassNode::new("a/B")
            .with_method(Method::new(0, "f", "()V"))
            .with_method(Method::new(0, "f", "(I)V"));
        assert!(class.validate().is_ok());
    }

    #[test]
    fn dangling_label_rejected() {
        let class = ClassNode::new("a/B").with_method(body(vec![
            Instruction::jump(GOTO, 5),
            Instruction::simple(RETURN),
        ]));
        assert_malformed(&class);

        let backwards = ClassNode::new("a/B").with_method(body(vec![Instruction::jump(GOTO, -1)]));
        assert_malformed(&backwards);
    }

    #[test]
    fn label_on_non_branch_rejected() {
        let class = ClassNode::new("a/B").with_method(body(vec![
            Instruction::jump(IADD, 0),
            Instruction::simple(RETURN),
        ]));
        assert_malformed(&class);
    }

    #[test]
    fn handler_range_checked() {
        let mut method = body(vec![Instruction::simple(NOP), Instruction::simple(RETURN)]);
        method.handlers.push(ExceptionHandler {
            start: 0,
            end: 2,
            handler: 1,
            catch_type: None,
        });
        assert!(ClassNode::new("a/B").with_method(method.clone()).validate().is_ok());

        method.handlers[0].end = 3;
        assert_malformed(&ClassNode::new("a/B").with_method(method.clone()));

        method.handlers[0].end = 0;
        assert_malformed(&ClassNode::new("a/B").with_method(method));
    }

    #[test]
    fn debug_tables_checked() {
        let mut method = body(vec![Instruction::simple(RETURN)]);
        method.attributes.push(Attribute::line_numbers(vec![LineNumber { start: 1, line: 10 }]));
        assert_malformed(&ClassNode::new("a/B").with_method(method));

        let mut method = body(vec![Instruction::simple(RETURN)]);
        method.attributes.push(Attribute::local_variables(vec![LocalVariable {
            name: "this".into(),
            descriptor: "La/B;".into(),
            signature: None,
            start: 0,
            end: 1,
            index: 0,
        }]));
        assert!(ClassNode::new("a/B").with_method(method).validate().is_ok());
    }

    #[test]
    fn deep_annotation_rejected() {
        let mut value = AnnotationValue::Int(0);
        for _ in 0..MAX_ANNOTATION_DEPTH + 1 {
            value = AnnotationValue::Array(vec![value]);
        }
        let mut class = ClassNode::new("a/B");
        class
            .visible_annotations
            .push(Annotation::new("LDeep;").with_value("v", value));
        assert_malformed(&class);
    }

    fn nested_arrays(depth: usize) -> AnnotationValue {
        let mut value = AnnotationValue::Int(0);
        for _ in 0..depth {
            value = AnnotationValue::Array(vec![value]);
        }
        value
    }

    #[test]
    fn deep_annotation_default_rejected() {
        let mut method = Method::new(0x401, "value", "()[I");
        method.annotation_default = Some(nested_arrays(MAX_ANNOTATION_DEPTH));
        assert!(ClassNode::new("a/B").with_method(method.clone()).validate().is_ok());

        method.annotation_default = Some(nested_arrays(70));
        let err = ClassNode::new("a/B").with_method(method).validate().unwrap_err();
        match err {
            ModelError::MalformedInput { location, reason } => {
                assert_eq!(location, "methods[value()[I]");
                assert!(reason.contains("annotation default"), "{reason}");
            }
            other => panic!("expected MalformedInput, got {other:?}"),
        }
    }

    #[test]
    fn deep_parameter_annotation_rejected() {
        let mut method = Method::new(0, "f", "(I)V");
        method.invisible_parameter_annotations = vec![vec![
            Annotation::new("LDeep;").with_value("v", nested_arrays(MAX_ANNOTATION_DEPTH))
        ]];
        assert_malformed(&ClassNode::new("a/B").with_method(method));
    }

    fn dynamic_chain(depth: usize) -> DynamicRef {
        let bootstrap = Handle {
            kind: 6,
            owner: "a/Boot".into(),
            name: "make".into(),
            descriptor: "()I".into(),
            interface: false,
        };
        let mut dynamic = DynamicRef {
            name: "c0".into(),
            descriptor: "I".into(),
            bootstrap: bootstrap.clone(),
            arguments: Vec::new(),
        };
        for level in 1..depth {
            dynamic = DynamicRef {
                name: format!("c{level}"),
                descriptor: "I".into(),
                bootstrap: bootstrap.clone(),
                arguments: vec![Constant::Dynamic(Box::new(dynamic))],
            };
        }
        dynamic
    }

    #[test]
    fn deep_dynamic_constant_rejected() {
        let shallow = Constant::Dynamic(Box::new(dynamic_chain(MAX_ANNOTATION_DEPTH)));
        let class = ClassNode::new("a/B").with_method(body(vec![
            Instruction::ldc(shallow),
            Instruction::simple(RETURN),
        ]));
        assert!(class.validate().is_ok());

        let deep = Constant::Dynamic(Box::new(dynamic_chain(70)));
        let class = ClassNode::new("a/B").with_method(body(vec![
            Instruction::ldc(deep.clone()),
            Instruction::simple(RETURN),
        ]));
        assert_malformed(&class);

        let mut field = Field::new(0x18, "K", "I");
        field.value = Some(deep);
        assert_malformed(&ClassNode::new("a/B").with_field(field));
    }

    #[test]
    fn deep_invokedynamic_rejected() {
        let mut insn = Instruction::simple(INVOKEDYNAMIC);
        insn.operands.push(Operand::Dynamic(dynamic_chain(70)));
        let class = ClassNode::new("a/B").with_method(body(vec![insn, Instruction::simple(RETURN)]));
        assert_malformed(&class);
    }
}
