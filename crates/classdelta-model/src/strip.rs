//! Tree transforms applied before diffing when debug data or unknown
//! attributes should not take part in the patch.

use crate::attribute::{Attribute, AttributeBody};
use crate::class::ClassNode;

/// Remove source file names, line numbers, local variable tables and
/// method parameter names.
pub fn strip_debug(class: &mut ClassNode) {
    class.source_file = None;
    class.source_debug = None;
    for method in &mut class.methods {
        method.parameters.clear();
        method.attributes.retain(|attr| {
            !matches!(
                attr.body,
                AttributeBody::LineNumbers(_) | AttributeBody::LocalVariables(_)
            )
        });
    }
}

/// Remove every attribute the model does not interpret.
pub fn strip_unknown_attributes(class: &mut ClassNode) {
    retain_known(&mut class.attributes);
    for field in &mut class.fields {
        retain_known(&mut field.attributes);
    }
    for method in &mut class.methods {
        retain_known(&mut method.attributes);
    }
    for component in &mut class.record_components {
        retain_known(&mut component.attributes);
    }
}

fn retain_known(attributes: &mut Vec<Attribute>) {
    attributes.retain(|attr| !attr.is_opaque());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::LineNumber;
    use crate::instruction::Instruction;
    use crate::member::{Field, Method, Parameter};
    use crate::opcodes::RETURN;

    fn sample() -> ClassNode {
        let mut method = Method::new(1, "run", "(I)V").with_body(0, 2, vec![Instruction::simple(RETURN)]);
        method.parameters.push(Parameter {
            name: Some("count".into()),
            access: 0,
        });
        method
            .attributes
            .push(Attribute::line_numbers(vec![LineNumber { start: 0, line: 3 }]));
        method.attributes.push(Attribute::opaque("Custom", vec![1, 2]));

        let mut field = Field::new(0, "x", "I");
        field.attributes.push(Attribute::opaque("Custom", vec![3]));

        let mut class = ClassNode::new("a/B").with_method(method).with_field(field);
        class.source_file = Some("B.java".into());
        class.attributes.push(Attribute::opaque("Custom", vec![4]));
        class
    }

    #[test]
    fn debug_stripped_custom_kept() {
        let mut class = sample();
        strip_debug(&mut class);
        assert_eq!(class.source_file, None);
        let method = &class.methods[0];
        assert!(method.parameters.is_empty());
        assert!(method.line_numbers().is_none());
        assert_eq!(method.attributes.len(), 1);
        assert_eq!(class.attributes.len(), 1);
    }

    #[test]
    fn unknown_attributes_stripped_debug_kept() {
        let mut class = sample();
        strip_unknown_attributes(&mut class);
        assert!(class.attributes.is_empty());
        assert!(class.fields[0].attributes.is_empty());
        assert_eq!(class.methods[0].attributes.len(), 1);
        assert!(class.methods[0].line_numbers().is_some());
        assert_eq!(class.source_file.as_deref(), Some("B.java"));
    }
}
