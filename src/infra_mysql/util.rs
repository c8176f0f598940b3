use super::repo_tx_mysql::MySqlTx;
use crate::domain_port::*;
use chrono::{DateTime, SubsecRound, Utc};
use sqlx::mysql::MySqlDatabaseError;

pub fn downcast<'a, 't>(tx: &'a mut dyn StorageTx<'t>) -> &'a mut MySqlTx<'t> {
    // SAFETY: MySQL repos are only wired together with `MySqlTxManager`.
    unsafe {
        let p = tx as *mut dyn StorageTx<'t>;
        let p = p as *mut MySqlTx<'t>;
        &mut *p
    }
}

pub const ER_DUP_ENTRY: u16 = 1062;
pub const ER_NO_REFERENCED_ROW_2: u16 = 1452;

/// Server error number of a MySQL database error.
pub fn error_number(err: &sqlx::Error) -> Option<u16> {
    match err {
        sqlx::Error::Database(db) => db
            .try_downcast_ref::<MySqlDatabaseError>()
            .map(MySqlDatabaseError::number),
        _ => None,
    }
}

pub fn is_dup_key(err: &sqlx::Error) -> bool {
    error_number(err) == Some(ER_DUP_ENTRY)
}

/// Current time at `DATETIME(6)` precision, so values read back compare equal.
pub fn db_now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}
