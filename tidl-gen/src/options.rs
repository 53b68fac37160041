use serde::Deserialize;

/// Knobs of the C backend. Everything else comes from the program itself.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Options {
    /// Extension of the declarations file, `<program>_types.<ext>`.
    pub declarations_extension: String,
    /// Extension of the definitions file.
    pub definitions_extension: String,
    /// Turn every [`Notice`](crate::Notice) into a hard error.
    pub strict: bool,
    /// Width handed to the pretty printer.
    pub line_width: usize,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            declarations_extension: "h".to_owned(),
            definitions_extension: "c".to_owned(),
            strict: false,
            line_width: 100,
        }
    }
}
