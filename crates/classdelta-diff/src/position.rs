//! Rebasing of absolute instruction positions through an instruction script.

use classdelta_model::{Attribute, AttributeBody, ExceptionHandler, LineNumber, LocalVariable};

use crate::script::{EditScript, Op};

/// Old instruction position to new position.
///
/// Kept and updated instructions map to their new index. A deleted
/// instruction maps to the position of whatever the output holds next.
/// The end position (`old_len`) maps to the new length. Positions past the
/// end clamp to the new length.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PositionMap {
    map: Vec<u32>,
}

impl PositionMap {
    pub fn from_script<T, U>(old_len: usize, script: &EditScript<T, U>) -> Self {
        let mut map = Vec::with_capacity(old_len + 1);
        let mut out = 0u32;
        for op in &script.ops {
            match op {
                Op::Equal { count, .. } => {
                    for _ in 0..*count {
                        map.push(out);
                        out += 1;
                    }
                }
                Op::Insert(items) => out += items.len() as u32,
                Op::Delete { count, .. } => map.extend(std::iter::repeat(out).take(*count)),
                Op::Update { .. } => {
                    map.push(out);
                    out += 1;
                }
            }
        }
        map.resize(old_len, out);
        map.truncate(old_len);
        map.push(out);
        Self { map }
    }

    pub fn rebase(&self, position: u32) -> u32 {
        match self.map.get(position as usize) {
            Some(&mapped) => mapped,
            None => self.new_len(),
        }
    }

    pub fn new_len(&self) -> u32 {
        self.map.last().copied().unwrap_or(0)
    }

    pub fn rebase_handlers(&self, handlers: &[ExceptionHandler]) -> Vec<ExceptionHandler> {
        handlers
            .iter()
            .map(|h| ExceptionHandler {
                start: self.rebase(h.start),
                end: self.rebase(h.end),
                handler: self.rebase(h.handler),
                catch_type: h.catch_type.clone(),
            })
            .collect()
    }

    /// Rebase the position-bearing tables among `attributes`; other
    /// attributes are copied as they are.
    pub fn rebase_attributes(&self, attributes: &[Attribute]) -> Vec<Attribute> {
        attributes
            .iter()
            .map(|attr| {
                let body = match &attr.body {
                    AttributeBody::LineNumbers(entries) => AttributeBody::LineNumbers(
                        entries
                            .iter()
                            .map(|e| LineNumber {
                                start: self.rebase(e.start),
                                line: e.line,
                            })
                            .collect(),
                    ),
                    AttributeBody::LocalVariables(entries) => AttributeBody::LocalVariables(
                        entries
                            .iter()
                            .map(|e| LocalVariable {
                                start: self.rebase(e.start),
                                end: self.rebase(e.end),
                                ..e.clone()
                            })
                            .collect(),
                    ),
                    AttributeBody::Opaque(bytes) => AttributeBody::Opaque(bytes.clone()),
                };
                Attribute {
                    name: attr.name.clone(),
                    body,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use classdelta_model::LINE_NUMBER_TABLE;

    fn script(ops: Vec<Op<u8>>) -> EditScript<u8> {
        EditScript { ops }
    }

    fn equal(count: usize) -> Op<u8> {
        Op::Equal { count, checksum: 0 }
    }

    #[test]
    fn identity_map() {
        let map = PositionMap::from_script(3, &script(vec![equal(3)]));
        assert_eq!((0..=3).map(|p| map.rebase(p)).collect::<Vec<_>>(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn insert_shifts_later_positions() {
        let map = PositionMap::from_script(
            4,
            &script(vec![equal(2), Op::Insert(vec![9, 9]), equal(2)]),
        );
        assert_eq!((0..=4).map(|p| map.rebase(p)).collect::<Vec<_>>(), vec![0, 1, 4, 5, 6]);
    }

    #[test]
    fn deleted_positions_map_to_next_output() {
        let map = PositionMap::from_script(
            4,
            &script(vec![
                equal(1),
                Op::Delete {
                    count: 2,
                    checksum: 0,
                },
                Op::Update {
                    checksum: 0,
                    change: 7,
                },
            ]),
        );
        assert_eq!((0..=4).map(|p| map.rebase(p)).collect::<Vec<_>>(), vec![0, 1, 1, 1, 2]);
        assert_eq!(map.rebase(40), 2);
        assert_eq!(map.new_len(), 2);
    }

    #[test]
    fn rebases_tables() {
        let map = PositionMap::from_script(2, &script(vec![Op::Insert(vec![0]), equal(2)]));
        let handlers = map.rebase_handlers(&[ExceptionHandler {
            start: 0,
            end: 1,
            handler: 1,
            catch_type: Some("java/lang/Exception".into()),
        }]);
        assert_eq!((handlers[0].start, handlers[0].end, handlers[0].handler), (1, 2, 2));

        let attrs = map.rebase_attributes(&[
            Attribute::line_numbers(vec![LineNumber { start: 1, line: 7 }]),
            Attribute::opaque("X", vec![1]),
        ]);
        assert_eq!(attrs[0].name, LINE_NUMBER_TABLE);
        assert_eq!(
            attrs[0].body,
            AttributeBody::LineNumbers(vec![LineNumber { start: 2, line: 7 }])
        );
        assert_eq!(attrs[1], Attribute::opaque("X", vec![1]));
    }
}
