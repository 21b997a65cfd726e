//! Creates the application's database schema.

use rusqlite::{Connection, Transaction as SqlTransaction, TransactionBehavior};

use crate::Error;

/// Create the expense table and its indices if they do not exist yet.
///
/// # Errors
/// Returns an [Error::SqlError] if the schema could not be created.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    let transaction = SqlTransaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    create_expense_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}

fn create_expense_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS expense (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            owner_id INTEGER NOT NULL,
            title TEXT NOT NULL,
            amount REAL NOT NULL CHECK (amount >= 0),
            category TEXT NOT NULL,
            notes TEXT,
            incurred_on INTEGER NOT NULL,
            created_at INTEGER NOT NULL,
            updated_at INTEGER
        );

        CREATE INDEX IF NOT EXISTS idx_expense_owner_incurred_on
            ON expense(owner_id, incurred_on);
        CREATE INDEX IF NOT EXISTS idx_expense_owner_category
            ON expense(owner_id, category);",
    )
}
