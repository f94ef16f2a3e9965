use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Client {0} not found")]
    NotFound(i32),

    #[error("Storage error: {0:#}")]
    Storage(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, RegistryError>;
