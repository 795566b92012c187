//! Element matchers: how each level decides "same element" and "equal".

use std::hash::Hash;

use classdelta_model::{Attribute, Instruction, Member, MemberKey};

/// Identity and equality rules for one level of the tree.
///
/// Elements with equal identity keys are aligned against each other. An
/// aligned pair that is not [`is_equal`](Matcher::is_equal) becomes an
/// Update. Within a replaced region, pairs reported
/// [`is_similar`](Matcher::is_similar) also become Updates rather than a
/// Delete + Insert.
pub trait Matcher<'a, T: 'a> {
    type Key: Hash + Eq;

    fn identity_key(&self, item: &'a T) -> Self::Key;

    fn is_equal(&self, old: &T, new: &T) -> bool;

    fn is_similar(&self, _old: &T, _new: &T) -> bool {
        false
    }
}

/// Fields, methods and record components, keyed by name and descriptor.
///
/// A member that differs from its counterpart only in its name is similar,
/// so a rename costs a single Update.
#[derive(Clone, Copy, Debug, Default)]
pub struct MemberMatcher;

impl<'a, M: Member + PartialEq + 'a> Matcher<'a, M> for MemberMatcher {
    type Key = MemberKey<'a>;

    fn identity_key(&self, item: &'a M) -> MemberKey<'a> {
        item.key()
    }

    fn is_equal(&self, old: &M, new: &M) -> bool {
        old == new
    }

    fn is_similar(&self, old: &M, new: &M) -> bool {
        old.eq_ignoring_name(new)
    }
}

/// Instructions, keyed by the whole instruction.
///
/// Label operands are relative offsets, so an instruction whose target moved
/// together with it still matches. Instructions sharing an opcode are
/// similar.
#[derive(Clone, Copy, Debug, Default)]
pub struct InstructionMatcher;

impl<'a> Matcher<'a, Instruction> for InstructionMatcher {
    type Key = &'a Instruction;

    fn identity_key(&self, item: &'a Instruction) -> &'a Instruction {
        item
    }

    fn is_equal(&self, old: &Instruction, new: &Instruction) -> bool {
        old == new
    }

    fn is_similar(&self, old: &Instruction, new: &Instruction) -> bool {
        old.opcode == new.opcode
    }
}

/// Attributes, keyed by name.
#[derive(Clone, Copy, Debug, Default)]
pub struct AttributeMatcher;

impl<'a> Matcher<'a, Attribute> for AttributeMatcher {
    type Key = &'a str;

    fn identity_key(&self, item: &'a Attribute) -> &'a str {
        &item.name
    }

    fn is_equal(&self, old: &Attribute, new: &Attribute) -> bool {
        old.body == new.body
    }
}

/// Plain values keyed by themselves, with an optional similarity rule.
pub struct ValueMatcher<T> {
    similar: Option<fn(&T, &T) -> bool>,
}

impl<T> ValueMatcher<T> {
    pub fn new() -> Self {
        Self { similar: None }
    }

    pub fn with_similarity(similar: fn(&T, &T) -> bool) -> Self {
        Self {
            similar: Some(similar),
        }
    }
}

impl<T> Default for ValueMatcher<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, T: Hash + Eq + 'a> Matcher<'a, T> for ValueMatcher<T> {
    type Key = &'a T;

    fn identity_key(&self, item: &'a T) -> &'a T {
        item
    }

    fn is_equal(&self, old: &T, new: &T) -> bool {
        old == new
    }

    fn is_similar(&self, old: &T, new: &T) -> bool {
        self.similar.is_some_and(|similar| similar(old, new))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use classdelta_model::opcodes::*;
    use classdelta_model::{Constant, Field};

    #[test]
    fn member_rename_is_similar_not_same_key() {
        let a = Field::new(1, "a", "I");
        let b = Field::new(1, "b", "I");
        let m = MemberMatcher;
        assert_ne!(m.identity_key(&a), m.identity_key(&b));
        assert!(m.is_similar(&a, &b));
        assert!(!m.is_equal(&a, &b));
    }

    #[test]
    fn member_flag_change_keeps_key() {
        let a = Field::new(1, "a", "I");
        let b = Field::new(9, "a", "I");
        let m = MemberMatcher;
        assert_eq!(m.identity_key(&a), m.identity_key(&b));
        assert!(!m.is_equal(&a, &b));
    }

    #[test]
    fn instruction_similarity_is_opcode() {
        let m = InstructionMatcher;
        let a = Instruction::ldc(Constant::Int(1));
        let b = Instruction::ldc(Constant::Int(2));
        assert!(m.is_similar(&a, &b));
        assert!(!m.is_similar(&a, &Instruction::simple(NOP)));
        assert_eq!(
            m.identity_key(&Instruction::jump(GOTO, 2)),
            m.identity_key(&Instruction::jump(GOTO, 2))
        );
    }

    #[test]
    fn attribute_keyed_by_name() {
        let m = AttributeMatcher;
        let a = Attribute::opaque("X", vec![1]);
        let b = Attribute::opaque("X", vec![2]);
        assert_eq!(m.identity_key(&a), m.identity_key(&b));
        assert!(!m.is_equal(&a, &b));
    }

    #[test]
    fn value_similarity_is_optional() {
        let plain: ValueMatcher<String> = ValueMatcher::new();
        assert!(!plain.is_similar(&"a".to_string(), &"b".to_string()));

        let by_len: ValueMatcher<String> = ValueMatcher::with_similarity(|a, b| a.len() == b.len());
        assert!(by_len.is_similar(&"a".to_string(), &"b".to_string()));
    }
}
