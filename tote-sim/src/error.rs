use tote_core::CoreError;
use tote_store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum SimError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type SimResult<T> = Result<T, SimError>;
