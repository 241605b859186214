use crate::application::repos::RepoError;

/// SQLSTATE for `query_canceled`, raised when `statement_timeout` fires.
const QUERY_CANCELED: &str = "57014";

pub fn map_sqlx_error(err: sqlx::Error) -> RepoError {
    let timed_out = match &err {
        sqlx::Error::PoolTimedOut => true,
        sqlx::Error::Database(db) => db.code().as_deref() == Some(QUERY_CANCELED),
        _ => false,
    };

    if timed_out {
        RepoError::Timeout
    } else {
        RepoError::from_persistence(err)
    }
}
