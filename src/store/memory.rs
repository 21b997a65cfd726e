//! Implements an in-memory expense store.

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use time::OffsetDateTime;

use crate::{
    Error,
    database_id::ExpenseId,
    expense::{ExpenseRecord, NewExpense},
    owner::OwnerId,
    store::{
        AggregateQuery, Bucket, ExpenseStore, Filters, RecordOrder,
        pipeline::{self, GroupInput},
    },
};

/// Keeps expenses in memory, in creation order.
///
/// Useful for tests and for callers that load records from elsewhere.
#[derive(Debug, Default)]
pub struct MemoryExpenseStore {
    state: RwLock<State>,
}

#[derive(Debug, Default)]
struct State {
    last_id: ExpenseId,
    records: Vec<ExpenseRecord>,
}

impl MemoryExpenseStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, State>, Error> {
        self.state
            .read()
            .inspect_err(|error| tracing::error!("could not acquire the store lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, State>, Error> {
        self.state
            .write()
            .inspect_err(|error| tracing::error!("could not acquire the store lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)
    }
}

impl State {
    /// The position of `owner`'s expense `id`.
    fn position(&self, owner: OwnerId, id: ExpenseId) -> Result<usize, Error> {
        let position = self
            .records
            .iter()
            .position(|record| record.id == id)
            .ok_or(Error::NotFound)?;

        if self.records[position].owner != owner {
            return Err(Error::Forbidden);
        }

        Ok(position)
    }

    fn matching<'a>(
        &'a self,
        owner: OwnerId,
        filters: &'a Filters,
    ) -> impl Iterator<Item = &'a ExpenseRecord> {
        self.records
            .iter()
            .filter(move |record| record.owner == owner && filters.matches(record))
    }
}

impl ExpenseStore for MemoryExpenseStore {
    fn create(
        &self,
        owner: OwnerId,
        expense: NewExpense,
        now: OffsetDateTime,
    ) -> Result<ExpenseRecord, Error> {
        let expense = expense.validate()?;
        let mut state = self.write()?;

        let record = expense.into_record(state.last_id + 1, owner, now)?;
        state.last_id = record.id;
        state.records.push(record.clone());

        Ok(record)
    }

    fn get(&self, owner: OwnerId, id: ExpenseId) -> Result<ExpenseRecord, Error> {
        let state = self.read()?;
        let position = state.position(owner, id)?;

        Ok(state.records[position].clone())
    }

    fn update(
        &self,
        owner: OwnerId,
        id: ExpenseId,
        expense: NewExpense,
        now: OffsetDateTime,
    ) -> Result<ExpenseRecord, Error> {
        let expense = expense.validate()?;
        let mut state = self.write()?;
        let position = state.position(owner, id)?;

        let record = &mut state.records[position];
        expense.apply_to(record, now)?;

        Ok(record.clone())
    }

    fn delete(&self, owner: OwnerId, id: ExpenseId) -> Result<ExpenseRecord, Error> {
        let mut state = self.write()?;
        let position = state.position(owner, id)?;

        Ok(state.records.remove(position))
    }

    fn records(
        &self,
        owner: OwnerId,
        filters: &Filters,
        order: RecordOrder,
    ) -> Result<Vec<ExpenseRecord>, Error> {
        let state = self.read()?;
        let mut records: Vec<ExpenseRecord> = state.matching(owner, filters).cloned().collect();

        // Stable sorts keep creation order between expenses incurred at the same instant.
        match order {
            RecordOrder::Stored => {}
            RecordOrder::IncurredAscending => records.sort_by_key(|record| record.incurred_on),
            RecordOrder::IncurredDescending => {
                records.sort_by_key(|record| std::cmp::Reverse(record.incurred_on))
            }
        }

        Ok(records)
    }

    fn aggregate(&self, owner: OwnerId, query: &AggregateQuery) -> Result<Vec<Bucket>, Error> {
        let state = self.read()?;
        let rows = state
            .matching(owner, &query.filters)
            .map(|record| GroupInput {
                category: &record.category,
                incurred_on: record.incurred_on,
                amount: record.amount,
            });

        pipeline::aggregate(rows, query)
    }
}
