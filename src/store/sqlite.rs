//! Implements a SQLite backed expense store.

use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::{
    Connection, OptionalExtension, Row, params_from_iter,
    types::{Type, Value},
};
use time::OffsetDateTime;

use crate::{
    Error,
    database_id::ExpenseId,
    expense::{ExpenseRecord, NewExpense},
    owner::OwnerId,
    store::{
        AggregateQuery, Bucket, Clause, ExpenseStore, Filters, RecordOrder,
        pipeline::{self, GroupInput},
    },
};

const RECORD_COLUMNS: &str =
    "id, owner_id, title, amount, category, notes, incurred_on, created_at, updated_at";

/// Stores expenses in a SQLite database.
///
/// The `expense` table must exist, see [initialize_db](crate::initialize_db).
#[derive(Debug, Clone)]
pub struct SQLiteExpenseStore {
    connection: Arc<Mutex<Connection>>,
}

impl SQLiteExpenseStore {
    /// Create a new store for the SQLite `connection`.
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        Self { connection }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, Error> {
        self.connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)
    }

    /// Check that `id` exists and belongs to `owner`.
    fn check_owner(connection: &Connection, owner: OwnerId, id: ExpenseId) -> Result<(), Error> {
        let stored_owner: Option<i64> = connection
            .query_row("SELECT owner_id FROM expense WHERE id = ?1", (id,), |row| {
                row.get(0)
            })
            .optional()?;

        match stored_owner {
            None => Err(Error::NotFound),
            Some(stored_owner) if stored_owner != owner.as_i64() => Err(Error::Forbidden),
            Some(_) => Ok(()),
        }
    }

    fn select_record(connection: &Connection, id: ExpenseId) -> Result<ExpenseRecord, Error> {
        let record = connection
            .prepare(&format!("SELECT {RECORD_COLUMNS} FROM expense WHERE id = :id"))?
            .query_row(&[(":id", &id)], map_expense_row)?;

        Ok(record)
    }
}

impl ExpenseStore for SQLiteExpenseStore {
    /// Insert a new expense into the database.
    ///
    /// # Errors
    /// This function will return a:
    /// - record invariant error if the expense is invalid,
    /// - [Error::DatabaseLockError] if the connection lock is poisoned,
    /// - or [Error::SqlError] if there is some other SQL error.
    fn create(
        &self,
        owner: OwnerId,
        expense: NewExpense,
        now: OffsetDateTime,
    ) -> Result<ExpenseRecord, Error> {
        let record = expense.validate()?.into_record(0, owner, now)?;
        let connection = self.lock()?;

        let record = connection
            .prepare(&format!(
                "INSERT INTO expense (owner_id, title, amount, category, notes, incurred_on, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                 RETURNING {RECORD_COLUMNS}"
            ))?
            .query_row(
                (
                    record.owner.as_i64(),
                    &record.title,
                    record.amount,
                    &record.category,
                    &record.notes,
                    record.incurred_on.unix_timestamp(),
                    record.created_at.unix_timestamp(),
                ),
                map_expense_row,
            )?;

        tracing::debug!("created expense {} for owner {owner}", record.id);

        Ok(record)
    }

    fn get(&self, owner: OwnerId, id: ExpenseId) -> Result<ExpenseRecord, Error> {
        let connection = self.lock()?;
        Self::check_owner(&connection, owner, id)?;

        Self::select_record(&connection, id)
    }

    fn update(
        &self,
        owner: OwnerId,
        id: ExpenseId,
        expense: NewExpense,
        now: OffsetDateTime,
    ) -> Result<ExpenseRecord, Error> {
        let expense = expense.validate()?;
        let connection = self.lock()?;
        Self::check_owner(&connection, owner, id)?;

        let mut record = Self::select_record(&connection, id)?;
        expense.apply_to(&mut record, now)?;

        connection.execute(
            "UPDATE expense
             SET title = ?1, amount = ?2, category = ?3, notes = ?4, incurred_on = ?5, updated_at = ?6
             WHERE id = ?7",
            (
                &record.title,
                record.amount,
                &record.category,
                &record.notes,
                record.incurred_on.unix_timestamp(),
                record.updated_at.map(|updated_at| updated_at.unix_timestamp()),
                id,
            ),
        )?;

        Ok(record)
    }

    fn delete(&self, owner: OwnerId, id: ExpenseId) -> Result<ExpenseRecord, Error> {
        let connection = self.lock()?;
        Self::check_owner(&connection, owner, id)?;

        let record = Self::select_record(&connection, id)?;
        connection.execute("DELETE FROM expense WHERE id = ?1", (id,))?;

        Ok(record)
    }

    /// Query for an owner's expenses in the database.
    ///
    /// # Errors
    /// This function will return a [Error::SqlError] if there is a SQL error.
    fn records(
        &self,
        owner: OwnerId,
        filters: &Filters,
        order: RecordOrder,
    ) -> Result<Vec<ExpenseRecord>, Error> {
        let (where_clause, params) = where_clause(owner, filters);
        let order_by = match order {
            RecordOrder::Stored => "id ASC",
            RecordOrder::IncurredAscending => "incurred_on ASC, id ASC",
            RecordOrder::IncurredDescending => "incurred_on DESC, id ASC",
        };
        let query =
            format!("SELECT {RECORD_COLUMNS} FROM expense {where_clause} ORDER BY {order_by}");

        let connection = self.lock()?;
        let mut stmt = connection.prepare(&query)?;
        let records = stmt
            .query_map(params_from_iter(params), map_expense_row)?
            .collect::<Result<Vec<ExpenseRecord>, rusqlite::Error>>()?;

        Ok(records)
    }

    /// Aggregate an owner's expenses.
    ///
    /// Filtering happens in SQL. The matching rows are grouped and reduced by
    /// the same pipeline as every other store, in creation order, so calendar
    /// keys use the timezone database and sums match to the last bit.
    fn aggregate(&self, owner: OwnerId, query: &AggregateQuery) -> Result<Vec<Bucket>, Error> {
        let (where_clause, params) = where_clause(owner, &query.filters);
        let sql =
            format!("SELECT category, incurred_on, amount FROM expense {where_clause} ORDER BY id");

        let connection = self.lock()?;
        let mut stmt = connection.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(params), |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    timestamp_column(row, 1)?,
                    row.get::<_, f64>(2)?,
                ))
            })?
            .collect::<Result<Vec<_>, rusqlite::Error>>()?;

        pipeline::aggregate(
            rows.iter()
                .map(|(category, incurred_on, amount)| GroupInput {
                    category,
                    incurred_on: *incurred_on,
                    amount: *amount,
                }),
            query,
        )
    }
}

/// Build the `WHERE` clause scoping a query to `owner` and `filters`.
fn where_clause(owner: OwnerId, filters: &Filters) -> (String, Vec<Value>) {
    let mut conditions = vec!["owner_id = ?".to_owned()];
    let mut params = vec![Value::Integer(owner.as_i64())];

    for clause in filters.clauses() {
        match clause {
            Clause::IncurredOn(comparator, bound) => {
                conditions.push(format!("incurred_on {} ?", comparator.as_sql()));
                params.push(Value::Integer(bound.unix_timestamp()));
            }
            Clause::Category(comparator, bound) => {
                conditions.push(format!("category {} ?", comparator.as_sql()));
                params.push(Value::Text(bound.clone()));
            }
        }
    }

    (format!("WHERE {}", conditions.join(" AND ")), params)
}

fn timestamp_column(row: &Row, index: usize) -> Result<OffsetDateTime, rusqlite::Error> {
    let timestamp: i64 = row.get(index)?;

    OffsetDateTime::from_unix_timestamp(timestamp).map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(index, Type::Integer, Box::new(error))
    })
}

fn map_expense_row(row: &Row) -> Result<ExpenseRecord, rusqlite::Error> {
    let updated_at: Option<i64> = row.get(8)?;
    let updated_at = match updated_at {
        Some(_) => Some(timestamp_column(row, 8)?),
        None => None,
    };

    Ok(ExpenseRecord {
        id: row.get(0)?,
        owner: OwnerId::new(row.get(1)?),
        title: row.get(2)?,
        amount: row.get(3)?,
        category: row.get(4)?,
        notes: row.get(5)?,
        incurred_on: timestamp_column(row, 6)?,
        created_at: timestamp_column(row, 7)?,
        updated_at,
    })
}
