use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("register error: {0}")]
    Register(#[from] voteroll_policies::RegisterError),

    #[error("store error: {0}")]
    Store(#[from] voteroll_store::StoreError),

    #[error("config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
