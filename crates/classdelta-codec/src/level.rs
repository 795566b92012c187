/// Tag written before every edit script, naming the sequence it edits.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Level {
    Interfaces = 1,
    NestMembers = 2,
    PermittedSubclasses = 3,
    InnerClasses = 4,
    VisibleAnnotations = 5,
    InvisibleAnnotations = 6,
    RecordComponents = 7,
    Fields = 8,
    Methods = 9,
    Attributes = 10,
    Instructions = 11,
    Handlers = 12,
    Exceptions = 13,
    Parameters = 14,
    LineNumbers = 15,
    LocalVariables = 16,
    VisibleParameterAnnotations = 17,
    InvisibleParameterAnnotations = 18,
}

impl Level {
    pub fn name(self) -> &'static str {
        match self {
            Self::Interfaces => "interfaces",
            Self::NestMembers => "nest_members",
            Self::PermittedSubclasses => "permitted_subclasses",
            Self::InnerClasses => "inner_classes",
            Self::VisibleAnnotations => "visible_annotations",
            Self::InvisibleAnnotations => "invisible_annotations",
            Self::RecordComponents => "record_components",
            Self::Fields => "fields",
            Self::Methods => "methods",
            Self::Attributes => "attributes",
            Self::Instructions => "instructions",
            Self::Handlers => "handlers",
            Self::Exceptions => "exceptions",
            Self::Parameters => "parameters",
            Self::LineNumbers => "line_numbers",
            Self::LocalVariables => "local_variables",
            Self::VisibleParameterAnnotations => "visible_parameter_annotations",
            Self::InvisibleParameterAnnotations => "invisible_parameter_annotations",
        }
    }
}
