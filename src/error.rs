use thiserror::Error;

use crate::store::StoreError;

/// Error surface of the engine operations. An empty result is never an
/// error: `recommend` and `suggest_from_history` signal it as `Ok(None)`.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("validation error: {0}")]
    Validation(String),
    #[error("persistence error: {0}")]
    Persistence(StoreError),
}

impl EngineError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found(entity: &str, key: &str) -> Self {
        Self::NotFound(format!("{entity} {key}"))
    }
}

// StoreError 转换映射：
// - NotFound / Validation 原样归类，调用方可安全呈现
// - 其余（sled、序列化、CAS 耗尽、迁移）一律归为 Persistence，不做隐式重试
impl From<StoreError> for EngineError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NotFound { entity, key } => {
                EngineError::NotFound(format!("{entity} {key}"))
            }
            StoreError::Validation(message) => EngineError::Validation(message),
            other => EngineError::Persistence(other),
        }
    }
}
