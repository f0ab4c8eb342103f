use futures::future::BoxFuture;
use sqlx::{PgConnection, PgPool};

use crate::error::{Error, Result};

/// Runs `f` inside a transaction: commit on `Ok`, rollback on `Err`.
///
/// A failed rollback is reported together with the error that triggered it.
pub async fn exec_tx<T, F>(pool: &PgPool, f: F) -> Result<T>
where
    T: Send,
    F: for<'c> FnOnce(&'c mut PgConnection) -> BoxFuture<'c, Result<T>> + Send,
{
    let mut tx = pool.begin().await?;
    match f(&mut *tx).await {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rb_err) = tx.rollback().await {
                tracing::error!(error = %err, rollback_error = %rb_err, "transaction rollback failed");
                return Err(Error::Internal(format!(
                    "tx err: {}, rb err: {}",
                    err, rb_err
                )));
            }
            Err(err)
        }
    }
}
