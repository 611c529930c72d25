use thiserror::Error;

pub type FormulaResult<T> = Result<T, FormulaError>;

#[derive(Error, Debug)]
pub enum FormulaError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Formula nests deeper than {0} levels")]
    TooDeep(usize),

    #[error("Formula has more than {0} terms")]
    TooLong(usize),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Calculated field '{0}' already exists")]
    DuplicateField(String),

    #[error("Calculated field '{0}' not found")]
    UnknownField(String),
}
