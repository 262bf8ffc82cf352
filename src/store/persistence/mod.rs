pub mod postgres;
pub mod retry;
pub mod sqlite;
pub mod traits;

use crate::error::{AppError, AppResult};
use std::sync::Arc;
use traits::Persistence;

/// Connects the persistence backend selected by `database_url`'s scheme.
pub async fn connect(database_url: &str) -> AppResult<Arc<dyn Persistence>> {
    if database_url.starts_with("sqlite:") {
        let store = sqlite::SqlitePersistence::connect(database_url).await?;
        Ok(Arc::new(store))
    } else if database_url.starts_with("postgres://") || database_url.starts_with("postgresql://") {
        let store = postgres::PostgresPersistence::connect(database_url).await?;
        Ok(Arc::new(store))
    } else {
        Err(AppError::Validation(format!(
            "unsupported DATABASE_URL scheme in '{database_url}', expected sqlite: or postgres://"
        )))
    }
}
