//! High-level API for classdelta.
//!
//! [`diff`] turns two class trees into patch bytes and [`apply`] turns a
//! source tree and patch bytes back into the target tree. Both validate
//! their inputs and check the patch header against the class they are
//! given. [`ClassPatcher`] exposes the same operations with a custom
//! [`PatcherConfig`], plus [`ClassPatcher::inspect`].

pub mod config;
pub mod error;
pub mod patcher;

pub use config::PatcherConfig;
pub use error::{ErrorKind, SdkError, SdkResult};
pub use patcher::{ClassPatcher, PatchBytes, PatchSummary};

// Re-export key types
pub use classdelta_codec::CodecError;
pub use classdelta_diff::{AlignConfig, DiffError, DiffStats};
pub use classdelta_model::{ClassFormat, ClassNode, Digest, JsonClassFormat, ModelError};

/// Encode the edit from `old` to `new` with the default configuration.
pub fn diff(old: &ClassNode, new: &ClassNode) -> SdkResult<PatchBytes> {
    ClassPatcher::default().diff(old, new)
}

/// Reconstruct the target of `patch` from `old` with the default configuration.
pub fn apply(old: &ClassNode, patch: &PatchBytes) -> SdkResult<ClassNode> {
    ClassPatcher::default().apply(old, patch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use classdelta_codec::{HEADER_LEN, TRAILER_LEN};
    use classdelta_model::opcodes::*;
    use classdelta_model::{
        Annotation, AnnotationValue, Attribute, Constant, ContentHasher, ExceptionHandler, Field,
        Instruction, LineNumber, LocalVariable, MemberRef, Method, RecordComponent,
    };

    fn counter() -> ClassNode {
        let mut tick = Method::new(1, "tick", "()I").with_body(
            3,
            1,
            vec![
                Instruction::var(ALOAD, 0),
                Instruction::simple(DUP),
                Instruction::field(GETFIELD, MemberRef::new("demo/Counter", "count", "I")),
                Instruction::simple(ICONST_1),
                Instruction::simple(IADD),
                Instruction::field(PUTFIELD, MemberRef::new("demo/Counter", "count", "I")),
                Instruction::var(ALOAD, 0),
                Instruction::field(GETFIELD, MemberRef::new("demo/Counter", "count", "I")),
                Instruction::simple(IRETURN),
            ],
        );
        tick.attributes.push(Attribute::line_numbers(vec![
            LineNumber { start: 0, line: 10 },
            LineNumber { start: 6, line: 11 },
        ]));
        tick.attributes.push(Attribute::local_variables(vec![LocalVariable {
            name: "this".into(),
            descriptor: "Ldemo/Counter;".into(),
            signature: None,
            start: 0,
            end: 9,
            index: 0,
        }]));

        let mut class = ClassNode::new("demo/Counter")
            .with_field(Field::new(2, "count", "I"))
            .with_method(Method::new(1, "<init>", "()V").with_body(
                1,
                1,
                vec![
                    Instruction::var(ALOAD, 0),
                    Instruction::method(
                        INVOKESPECIAL,
                        MemberRef::new("java/lang/Object", "<init>", "()V"),
                    ),
                    Instruction::simple(RETURN),
                ],
            ))
            .with_method(tick);
        class.source_file = Some("Counter.java".into());
        class
    }

    fn counter_v2() -> ClassNode {
        let mut class = counter();
        class.fields[0].name = "total".into();
        class.fields.push(Field::new(0x1a, "STEP", "I"));
        class.fields[1].value = Some(Constant::Int(2));
        class.visible_annotations.push(
            Annotation::new("Ldemo/Since;").with_value("value", AnnotationValue::Int(2)),
        );
        let tick = &mut class.methods[1];
        tick.instructions[3] = Instruction::simple(ICONST_2);
        tick.instructions.insert(0, Instruction::simple(NOP));
        tick.handlers.push(ExceptionHandler {
            start: 1,
            end: 8,
            handler: 9,
            catch_type: None,
        });
        tick.max_stack = 4;
        tick.invisible_parameter_annotations = vec![vec![Annotation::new("Ldemo/Unchecked;")]];
        class.attributes.push(Attribute::opaque("Build", b"v2".to_vec()));
        class
    }

    #[test]
    fn diff_then_apply() {
        let (old, new) = (counter(), counter_v2());
        let patch = diff(&old, &new).unwrap();
        assert_eq!(apply(&old, &patch).unwrap(), new);
    }

    #[test]
    fn identity_patch() {
        let class = counter();
        let patch = diff(&class, &class).unwrap();
        let summary = ClassPatcher::default().inspect(&patch).unwrap();
        assert!(summary.stats.is_identity());
        assert_eq!(summary.stats.updated, 0);
        assert_eq!(apply(&class, &patch).unwrap(), class);
    }

    #[test]
    fn inspect_reports_header() {
        let (old, new) = (counter(), counter_v2());
        let patch = diff(&old, &new).unwrap();
        let summary = ClassPatcher::default().inspect(&patch).unwrap();
        assert_eq!(summary.format_version, 1);
        assert_eq!(summary.size, patch.len());
        assert_eq!(
            summary.target_digest,
            ContentHasher::CLASS.fingerprint(&new).unwrap()
        );
        assert!(!summary.stats.is_identity());
    }

    #[test]
    fn malformed_input_rejected_before_diffing() {
        let old = counter();
        let mut new = counter();
        new.methods.push(new.methods[0].clone());
        let err = diff(&old, &new).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedInput);

        let mut dangling = counter();
        dangling.methods[1].instructions.push(Instruction::jump(GOTO, 40));
        assert_eq!(diff(&dangling, &old).unwrap_err().kind(), ErrorKind::MalformedInput);
    }

    #[test]
    fn truncated_patch_is_corrupt() {
        let patch = diff(&counter(), &counter_v2()).unwrap();
        let mut bytes = patch.into_inner();
        bytes.truncate(bytes.len() - 4);
        let err = apply(&counter(), &PatchBytes::from(bytes)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CorruptPatch);
    }

    #[test]
    fn future_version_is_unsupported() {
        let mut bytes = diff(&counter(), &counter_v2()).unwrap().into_inner();
        bytes[5] = 2;
        let err = apply(&counter(), &PatchBytes::from(bytes)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedVersion);
    }

    #[test]
    fn wrong_class_name_rejected() {
        let patch = diff(&counter(), &counter_v2()).unwrap();
        let mut other = counter();
        other.name = "demo/Other".into();
        match apply(&other, &patch).unwrap_err() {
            SdkError::StructuralMismatch { level, .. } => assert_eq!(level, "header.source_name"),
            err => panic!("unexpected error: {err}"),
        }
    }

    #[test]
    fn skewed_method_body_rejected() {
        let patch = diff(&counter(), &counter_v2()).unwrap();
        let mut skewed = counter();
        skewed.methods[1].instructions[4] = Instruction::simple(ISUB);
        let err = apply(&skewed, &patch).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StructuralMismatch);
        assert!(err.to_string().contains("methods"), "{err}");
    }

    #[test]
    fn target_digest_checked() {
        let (old, new) = (counter(), counter_v2());
        let mut bytes = diff(&old, &new).unwrap().into_inner();
        // Corrupt the recorded digest and reseal the trailer.
        bytes[HEADER_LEN - 1] ^= 0xff;
        let end = bytes.len() - TRAILER_LEN;
        let crc = crc32fast::hash(&bytes[..end]);
        bytes[end..].copy_from_slice(&crc.to_be_bytes());
        let patch = PatchBytes::from(bytes);

        match apply(&old, &patch).unwrap_err() {
            SdkError::StructuralMismatch { level, .. } => assert_eq!(level, "target.digest"),
            err => panic!("unexpected error: {err}"),
        }

        let lenient = ClassPatcher::new(PatcherConfig {
            verify_target: false,
            ..PatcherConfig::default()
        });
        assert_eq!(lenient.apply(&old, &patch).unwrap(), new);
    }

    #[test]
    fn skewed_unchanged_method_rejected_without_target_check() {
        let patch = diff(&counter(), &counter_v2()).unwrap();
        let mut skewed = counter();
        skewed.methods[0].instructions[1] = Instruction::method(
            INVOKESPECIAL,
            MemberRef::new("java/lang/Number", "<init>", "()V"),
        );

        let lenient = ClassPatcher::new(PatcherConfig {
            verify_target: false,
            ..PatcherConfig::default()
        });
        let err = lenient.apply(&skewed, &patch).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StructuralMismatch);
        assert!(err.to_string().contains("<init>()V"), "{err}");
    }

    #[test]
    fn record_components_round_trip() {
        let mut old = ClassNode::new("demo/Point");
        old.access |= 0x0010;
        old.super_name = Some("java/lang/Record".into());
        old.record_components.push(RecordComponent::new("x", "I"));
        old.record_components.push(RecordComponent::new("y", "I"));
        let mut new = old.clone();
        new.record_components[1].descriptor = "J".into();
        new.record_components.push(RecordComponent::new("z", "I"));

        let patch = diff(&old, &new).unwrap();
        assert_eq!(apply(&old, &patch).unwrap(), new);
    }

    #[test]
    fn repeated_diffs_are_identical() {
        let (old, new) = (counter(), counter_v2());
        assert_eq!(diff(&old, &new).unwrap(), diff(&old, &new).unwrap());
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        fn instruction() -> impl Strategy<Value = Instruction> {
            prop_oneof![
                prop::sample::select(vec![NOP, ICONST_0, ICONST_1, POP, DUP, IADD])
                    .prop_map(Instruction::simple),
                any::<i8>().prop_map(|v| Instruction::int(BIPUSH, i32::from(v))),
                (0u16..4).prop_map(|slot| Instruction::var(ILOAD, slot)),
                "[a-z]{1,6}".prop_map(|s| Instruction::ldc(Constant::String(s))),
            ]
        }

        fn class() -> impl Strategy<Value = ClassNode> {
            (
                prop::collection::btree_set("[a-z]{1,4}", 0..5),
                prop::collection::vec(prop::collection::vec(instruction(), 0..24), 1..4),
                prop::collection::vec("[a-z]{1,5}/[A-Z][a-z]{0,5}", 0..3),
            )
                .prop_map(|(fields, bodies, interfaces)| {
                    let mut class = ClassNode::new("demo/Generated");
                    class.interfaces = interfaces;
                    for name in fields {
                        class.fields.push(Field::new(2, name, "I"));
                    }
                    for (i, mut body) in bodies.into_iter().enumerate() {
                        body.push(Instruction::simple(RETURN));
                        class.methods.push(
                            Method::new(1, format!("m{i}"), "()V").with_body(4, 4, body),
                        );
                    }
                    class
                })
        }

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(64))]

            #[test]
            fn apply_reproduces_target(old in class(), new in class()) {
                let patch = diff(&old, &new).unwrap();
                prop_assert_eq!(apply(&old, &patch).unwrap(), new);
            }

            #[test]
            fn self_diff_is_identity(class in class()) {
                let patch = diff(&class, &class).unwrap();
                let summary = ClassPatcher::default().inspect(&patch).unwrap();
                prop_assert!(summary.stats.is_identity());
                prop_assert_eq!(apply(&class, &patch).unwrap(), class);
            }
        }
    }
}
