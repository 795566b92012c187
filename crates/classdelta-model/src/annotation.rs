use serde::{Deserialize, Serialize};

/// A runtime annotation: a type descriptor plus ordered element values.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Annotation {
    pub descriptor: String,
    pub values: Vec<(String, AnnotationValue)>,
}

impl Annotation {
    pub fn new(descriptor: impl Into<String>) -> Self {
        Self {
            descriptor: descriptor.into(),
            values: Vec::new(),
        }
    }

    pub fn with_value(mut self, name: impl Into<String>, value: AnnotationValue) -> Self {
        self.values.push((name.into(), value));
        self
    }

    /// Maximum nesting depth of annotation values below this annotation.
    pub fn depth(&self) -> usize {
        1 + self
            .values
            .iter()
            .map(|(_, value)| value.depth())
            .max()
            .unwrap_or(0)
    }
}

/// An annotation element value.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnnotationValue {
    Byte(i8),
    Char(u16),
    Short(i16),
    Int(i32),
    Long(i64),
    /// `f32` bit pattern.
    Float(u32),
    /// `f64` bit pattern.
    Double(u64),
    Boolean(bool),
    String(String),
    /// Class literal, as a field descriptor.
    Class(String),
    Enum { descriptor: String, name: String },
    Annotation(Box<Annotation>),
    Array(Vec<AnnotationValue>),
}

impl AnnotationValue {
    /// Number of arrays and annotations enclosing the deepest leaf value.
    pub fn depth(&self) -> usize {
        match self {
            Self::Annotation(inner) => inner.depth(),
            Self::Array(items) => 1 + items.iter().map(Self::depth).max().unwrap_or(0),
            _ => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn depth_counts_nesting() {
        let flat = Annotation::new("Ljava/lang/Deprecated;");
        assert_eq!(flat.depth(), 1);

        let nested = Annotation::new("LOuter;").with_value(
            "inner",
            AnnotationValue::Array(vec![AnnotationValue::Annotation(Box::new(
                Annotation::new("LInner;").with_value("x", AnnotationValue::Int(1)),
            ))]),
        );
        assert_eq!(nested.depth(), 3);
    }
}
