//! Structural diff engine for JVM classes.
//!
//! Aligns two [`ClassNode`](classdelta_model::ClassNode) trees level by level
//! and records the difference as nested edit scripts, then replays those
//! scripts against a source tree to reproduce the target.
//!
//! # Key Types
//!
//! - [`EditScript`] / [`Op`] -- Equal / Insert / Delete / Update over one sequence
//! - [`ClassDiff`] -- Root of the nested scripts, with [`DiffStats`]
//! - [`Matcher`] -- Identity, equality and similarity rules per level
//! - [`ByteDelta`] / [`ZstdDelta`] -- Deltas for opaque attribute bodies
//! - [`diff_classes`] / [`apply_diff`] -- Build and apply

pub mod align;
pub mod apply;
pub mod builder;
pub mod byte_delta;
pub mod describe;
pub mod error;
pub mod matcher;
pub mod patch;
pub mod position;
pub mod script;

pub use align::{align, AlignConfig, Step};
pub use apply::{apply_diff, apply_script};
pub use builder::{diff_classes, DiffOptions};
pub use byte_delta::{ByteDelta, ZstdDelta};
pub use describe::Describe;
pub use error::{DiffError, DiffResult};
pub use matcher::{AttributeMatcher, InstructionMatcher, Matcher, MemberMatcher, ValueMatcher};
pub use patch::{AttributePatch, BodyPatch, ClassDiff, FieldPatch, MethodPatch, RecordComponentPatch};
pub use position::PositionMap;
pub use script::{DiffStats, EditScript, Op, Scalar};
