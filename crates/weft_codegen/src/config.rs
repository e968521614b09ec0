//! Code generator configuration

/// Options for [`CodeGenerator`](crate::CodeGenerator)
///
/// # Example
///
/// ```rust
/// use weft_codegen::CodegenConfig;
///
/// let config = CodegenConfig {
///     start_rule: Some("expr".into()),
///     ..CodegenConfig::named("CalcParser")
/// };
/// assert_eq!(config.parser_name, "CalcParser");
/// assert_eq!(config.runtime_path, "::weft");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodegenConfig {
    /// Name of the generated parser type
    pub parser_name: String,
    /// Path under which the generated code finds the runtime crate
    pub runtime_path: String,
    /// Rule run by `parse`; the first rule when unset
    pub start_rule: Option<String>,
    /// Visibility of the generated type and its rule methods, e.g. `pub(crate)`
    pub visibility: String,
}

impl Default for CodegenConfig {
    fn default() -> Self {
        Self {
            parser_name: "GrammarParser".to_string(),
            runtime_path: "::weft".to_string(),
            start_rule: None,
            visibility: "pub".to_string(),
        }
    }
}

impl CodegenConfig {
    /// Default configuration with a custom type name
    #[must_use]
    pub fn named(parser_name: impl Into<String>) -> Self {
        Self {
            parser_name: parser_name.into(),
            ..Self::default()
        }
    }
}
