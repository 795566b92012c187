//! Edit scripts: ordered operations transforming one sequence into another.
//!
//! A script is consumed front to back against its source sequence. Equal,
//! Delete and Update consume source elements; Insert and Update emit output
//! elements. Every operation that consumes source elements carries the
//! CRC32 of the elements it expects, so a script applied to the wrong
//! source fails instead of producing a corrupt result.

use serde::{Deserialize, Serialize};

/// A single edit operation.
///
/// `T` is the element type. `U` is the payload of an in-place update: the
/// replacement element for leaf levels, a nested patch for member levels.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Op<T, U = T> {
    /// Copy `count` source elements whose encoded slice hashes to `checksum`.
    Equal { count: usize, checksum: u32 },
    /// Emit these new elements.
    Insert(Vec<T>),
    /// Skip `count` source elements whose encoded slice hashes to `checksum`.
    Delete { count: usize, checksum: u32 },
    /// Replace one source element (hashing to `checksum`) with the result of
    /// applying `change` to it.
    Update { checksum: u32, change: U },
}

impl<T, U> Op<T, U> {
    /// Number of source elements this operation consumes.
    pub fn consumed(&self) -> usize {
        match self {
            Self::Equal { count, .. } => *count,
            Self::Insert(_) => 0,
            Self::Delete { count, .. } => *count,
            Self::Update { .. } => 1,
        }
    }

    /// Number of output elements this operation produces.
    pub fn produced(&self) -> usize {
        match self {
            Self::Equal { count, .. } => *count,
            Self::Insert(items) => items.len(),
            Self::Delete { .. } => 0,
            Self::Update { .. } => 1,
        }
    }
}

/// An ordered, non-overlapping list of operations over one sequence.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditScript<T, U = T> {
    pub ops: Vec<Op<T, U>>,
}

impl<T, U> Default for EditScript<T, U> {
    fn default() -> Self {
        Self { ops: Vec::new() }
    }
}

impl<T, U> EditScript<T, U> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an Equal run. Runs are not merged: each checksum covers
    /// exactly the slice it was computed over.
    pub fn push_equal(&mut self, count: usize, checksum: u32) {
        if count > 0 {
            self.ops.push(Op::Equal { count, checksum });
        }
    }

    /// Append an inserted element, merging with a preceding Insert.
    pub fn push_insert(&mut self, item: T) {
        if let Some(Op::Insert(items)) = self.ops.last_mut() {
            items.push(item);
        } else {
            self.ops.push(Op::Insert(vec![item]));
        }
    }

    pub fn push_delete(&mut self, count: usize, checksum: u32) {
        if count > 0 {
            self.ops.push(Op::Delete { count, checksum });
        }
    }

    pub fn push_update(&mut self, checksum: u32, change: U) {
        self.ops.push(Op::Update { checksum, change });
    }

    /// Number of source elements the script expects.
    pub fn source_len(&self) -> usize {
        self.ops.iter().map(Op::consumed).sum()
    }

    /// Number of elements the script produces.
    pub fn target_len(&self) -> usize {
        self.ops.iter().map(Op::produced).sum()
    }

    /// Returns `true` if the script contains nothing but Equal runs.
    pub fn is_identity(&self) -> bool {
        self.ops.iter().all(|op| matches!(op, Op::Equal { .. }))
    }

    /// Nested payloads of every Update.
    pub fn updates(&self) -> impl Iterator<Item = &U> {
        self.ops.iter().filter_map(|op| match op {
            Op::Update { change, .. } => Some(change),
            _ => None,
        })
    }

    /// Add this level's element counts to `stats`.
    pub fn tally(&self, stats: &mut DiffStats) {
        for op in &self.ops {
            match op {
                Op::Equal { count, .. } => stats.equal += count,
                Op::Insert(items) => stats.inserted += items.len(),
                Op::Delete { count, .. } => stats.deleted += count,
                Op::Update { .. } => stats.updated += 1,
            }
        }
    }
}

/// A scalar property of a node: unchanged, or replaced wholesale.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Scalar<T> {
    Same,
    Changed(T),
}

impl<T> Default for Scalar<T> {
    fn default() -> Self {
        Self::Same
    }
}

impl<T: Clone + PartialEq> Scalar<T> {
    pub fn between(old: &T, new: &T) -> Self {
        if old == new {
            Self::Same
        } else {
            Self::Changed(new.clone())
        }
    }

    /// The property value after the change.
    pub fn resolve(&self, current: &T) -> T {
        match self {
            Self::Same => current.clone(),
            Self::Changed(value) => value.clone(),
        }
    }
}

impl<T> Scalar<T> {
    pub fn is_changed(&self) -> bool {
        matches!(self, Self::Changed(_))
    }

    pub fn tally(&self, stats: &mut DiffStats) {
        if self.is_changed() {
            stats.changed_scalars += 1;
        }
    }
}

/// Element counts over every level of a diff.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffStats {
    pub equal: usize,
    pub inserted: usize,
    pub deleted: usize,
    pub updated: usize,
    pub changed_scalars: usize,
}

impl DiffStats {
    /// Returns `true` if nothing was inserted, deleted, updated or changed.
    pub fn is_identity(&self) -> bool {
        self.inserted == 0 && self.deleted == 0 && self.updated == 0 && self.changed_scalars == 0
    }
}
