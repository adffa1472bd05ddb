use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("home directory not found: set HOME or ACADEMY_HOME")]
    HomeNotFound,

    #[error("unexpected response shape: expected {expected}, found {found}")]
    Shape {
        expected: &'static str,
        found: &'static str,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;
