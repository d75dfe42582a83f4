use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GazeError {
    #[error("Invalid parameter {name}: {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },
}

pub type Result<T> = std::result::Result<T, GazeError>;
