//! Sequence alignment over identity keys.
//!
//! Keys are aligned with Myers' O(ND) algorithm from `similar`, which needs
//! nothing beyond key equality. Adjacent delete/insert runs are folded into
//! replacements before pairing. Myers trims
//! the common prefix before searching, so among the minimal scripts the one
//! whose first equal run is longest is chosen, and the output depends only
//! on the inputs.

use serde::{Deserialize, Serialize};
use similar::algorithms::{myers, Capture, Replace};
use similar::DiffTag;
use tracing::warn;

use crate::matcher::Matcher;

/// Bounds on the aligner's cost.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlignConfig {
    /// Combined length of both sequences above which the exact alignment is
    /// replaced by a linear prefix/suffix trim.
    pub exact_limit: usize,
}

impl Default for AlignConfig {
    fn default() -> Self {
        Self { exact_limit: 20_000 }
    }
}

/// One aligned element pair or unpaired element, by index.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    Equal { old: usize, new: usize },
    Update { old: usize, new: usize },
    Delete(usize),
    Insert(usize),
}

/// Align `old` against `new` under `matcher`.
///
/// The returned steps visit every old index and every new index exactly once,
/// both in increasing order.
pub fn align<'a, T, M>(old: &'a [T], new: &'a [T], matcher: &M, config: &AlignConfig) -> Vec<Step>
where
    M: Matcher<'a, T>,
{
    let old_keys: Vec<M::Key> = old.iter().map(|item| matcher.identity_key(item)).collect();
    let new_keys: Vec<M::Key> = new.iter().map(|item| matcher.identity_key(item)).collect();
    let mut steps = Vec::with_capacity(old.len().max(new.len()));

    if old.len() + new.len() > config.exact_limit {
        warn!(
            old = old.len(),
            new = new.len(),
            limit = config.exact_limit,
            "sequence too long for exact alignment, trimming prefix and suffix"
        );
        let max = old.len().min(new.len());
        let prefix = (0..max).take_while(|&i| old_keys[i] == new_keys[i]).count();
        let suffix = (0..max - prefix)
            .take_while(|&i| old_keys[old.len() - 1 - i] == new_keys[new.len() - 1 - i])
            .count();

        paired(&mut steps, old, new, matcher, 0, 0, prefix);
        replaced(
            &mut steps,
            old,
            new,
            matcher,
            prefix..old.len() - suffix,
            prefix..new.len() - suffix,
        );
        paired(
            &mut steps,
            old,
            new,
            matcher,
            old.len() - suffix,
            new.len() - suffix,
            suffix,
        );
        return steps;
    }

    let mut hook = Replace::new(Capture::new());
    let diffed = myers::diff(
        &mut hook,
        &old_keys[..],
        0..old_keys.len(),
        &new_keys[..],
        0..new_keys.len(),
    );
    if let Err(never) = diffed {
        match never {}
    }

    for op in hook.into_inner().into_ops() {
        let (tag, old_range, new_range) = op.as_tag_tuple();
        match tag {
            DiffTag::Equal => paired(
                &mut steps,
                old,
                new,
                matcher,
                old_range.start,
                new_range.start,
                old_range.len(),
            ),
            DiffTag::Delete => steps.extend(old_range.map(Step::Delete)),
            DiffTag::Insert => steps.extend(new_range.map(Step::Insert)),
            DiffTag::Replace => replaced(&mut steps, old, new, matcher, old_range, new_range),
        }
    }
    steps
}

/// Key-equal run: equal pairs stay Equal, the rest become Updates.
fn paired<'a, T: 'a, M: Matcher<'a, T>>(
    steps: &mut Vec<Step>,
    old: &[T],
    new: &[T],
    matcher: &M,
    old_start: usize,
    new_start: usize,
    len: usize,
) {
    for k in 0..len {
        let (o, n) = (old_start + k, new_start + k);
        if matcher.is_equal(&old[o], &new[n]) {
            steps.push(Step::Equal { old: o, new: n });
        } else {
            steps.push(Step::Update { old: o, new: n });
        }
    }
}

/// Replaced run: pair front to back while similar, then Delete + Insert.
fn replaced<'a, T: 'a, M: Matcher<'a, T>>(
    steps: &mut Vec<Step>,
    old: &[T],
    new: &[T],
    matcher: &M,
    old_range: std::ops::Range<usize>,
    new_range: std::ops::Range<usize>,
) {
    let similar = old_range
        .clone()
        .zip(new_range.clone())
        .take_while(|&(o, n)| matcher.is_similar(&old[o], &new[n]))
        .count();
    steps.extend(
        (0..similar).map(|k| Step::Update {
            old: old_range.start + k,
            new: new_range.start + k,
        }),
    );
    steps.extend((old_range.start + similar..old_range.end).map(Step::Delete));
    steps.extend((new_range.start + similar..new_range.end).map(Step::Insert));
}
