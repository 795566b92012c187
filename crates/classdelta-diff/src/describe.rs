//! Short human-readable descriptions of elements, used in mismatch errors.

use classdelta_model::{
    Annotation, Attribute, ExceptionHandler, Field, InnerClass, Instruction, LineNumber,
    LocalVariable, Member, Method, Parameter, RecordComponent,
};

pub trait Describe {
    fn describe(&self) -> String;
}

impl<T: Describe> Describe for [T] {
    fn describe(&self) -> String {
        match self {
            [] => "nothing".to_string(),
            [one] => one.describe(),
            [first, rest @ ..] => format!("{} and {} more", first.describe(), rest.len()),
        }
    }
}

impl<T: Describe> Describe for Vec<T> {
    fn describe(&self) -> String {
        self.as_slice().describe()
    }
}

impl Describe for String {
    fn describe(&self) -> String {
        self.clone()
    }
}

impl Describe for Instruction {
    fn describe(&self) -> String {
        self.to_string()
    }
}

impl Describe for Field {
    fn describe(&self) -> String {
        format!("field {}", self.key())
    }
}

impl Describe for Method {
    fn describe(&self) -> String {
        format!("method {}", self.key())
    }
}

impl Describe for RecordComponent {
    fn describe(&self) -> String {
        format!("record component {}", self.key())
    }
}

impl Describe for Attribute {
    fn describe(&self) -> String {
        format!("{} attribute {}", self.body.kind(), self.name)
    }
}

impl Describe for Annotation {
    fn describe(&self) -> String {
        format!("@{}", self.descriptor)
    }
}

impl Describe for InnerClass {
    fn describe(&self) -> String {
        format!("inner class {}", self.name)
    }
}

impl Describe for ExceptionHandler {
    fn describe(&self) -> String {
        format!(
            "handler [{}, {}) -> {} catching {}",
            self.start,
            self.end,
            self.handler,
            self.catch_type.as_deref().unwrap_or("any")
        )
    }
}

impl Describe for LineNumber {
    fn describe(&self) -> String {
        format!("line {} at {}", self.line, self.start)
    }
}

impl Describe for LocalVariable {
    fn describe(&self) -> String {
        format!("local {} ${} [{}, {})", self.name, self.index, self.start, self.end)
    }
}

impl Describe for Parameter {
    fn describe(&self) -> String {
        format!("parameter {}", self.name.as_deref().unwrap_or("<unnamed>"))
    }
}
