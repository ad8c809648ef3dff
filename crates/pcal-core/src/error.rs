use thiserror::Error;

pub type CoreResult<T> = Result<T, CoreError>;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Invalid date '{text}': expected YYYY-MM-DD")]
    InvalidDate { text: String },
}
