//! Generic record repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD operations for any `Record` type over one connection.
//! - Scope every write to its own transaction and log its outcome once.
//!
//! # Invariants
//! - A failed write never leaves a transaction open: the transaction guard
//!   rolls back on every non-commit exit path.
//! - Ids are bound to records only after a successful commit.
//! - Sort columns are validated against the registered column set before
//!   they reach SQL text.

use crate::db::migrations::latest_version;
use crate::repo::record::{Record, RecordId};
use crate::repo::{RepoError, RepoResult};
use log::{error, info};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, Transaction, TransactionBehavior};
use std::marker::PhantomData;

/// Repository interface for generic record CRUD operations.
///
/// One implementation binds one record type to one session. Writes take
/// `&mut self`: callers serialize access to the shared session, and the
/// exclusive borrow makes that explicit.
pub trait RecordRepository<T: Record> {
    /// Inserts one record in its own transaction and binds the assigned id.
    fn save(&mut self, record: &mut T) -> RepoResult<()>;
    /// Inserts a sequence of records in one transaction; any failure aborts
    /// the whole batch.
    fn save_all(&mut self, records: &mut [T]) -> RepoResult<()>;
    /// Returns all rows of the bound table in engine order.
    fn list(&self) -> RepoResult<Vec<T>>;
    /// Returns the record with the given id, or `None`.
    fn get_by_id(&self, id: RecordId) -> RepoResult<Option<T>>;
    /// Returns all records whose id is in `ids`; an empty input returns an
    /// empty vector without querying.
    fn get_by_ids(&self, ids: &[RecordId]) -> RepoResult<Vec<T>>;
    /// Returns all rows ordered ascending by the given columns; with no
    /// columns this behaves exactly like `list`.
    fn list_sorted(&self, order_by: &[&str]) -> RepoResult<Vec<T>>;
    /// Returns the total row count of the bound table.
    fn count_all(&self) -> RepoResult<i64>;
    /// Merges the record's current state in its own transaction: an
    /// existing row is overwritten, a record without an id is inserted.
    fn update(&mut self, record: &mut T) -> RepoResult<()>;
    /// Deletes the record's row in its own transaction.
    fn remove(&mut self, record: &T) -> RepoResult<()>;
}

/// SQLite-backed generic record repository.
pub struct SqliteRecordRepository<'conn, T: Record> {
    conn: &'conn mut Connection,
    select_sql: String,
    _record: PhantomData<T>,
}

impl<'conn, T: Record> SqliteRecordRepository<'conn, T> {
    /// Constructs a repository from a migrated/ready connection.
    ///
    /// Validates once that migrations have been applied and that the bound
    /// table carries the registered columns.
    pub fn try_new(conn: &'conn mut Connection) -> RepoResult<Self> {
        ensure_record_connection_ready::<T>(conn)?;
        Ok(Self {
            conn,
            select_sql: build_select_sql::<T>(),
            _record: PhantomData,
        })
    }

    fn insert_in_tx(&mut self, record: &mut T) -> RepoResult<RecordId> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let id = insert_record(&tx, record)?;
        tx.commit()?;
        record.assign_id(id);
        Ok(id)
    }

    fn insert_all_in_tx(&mut self, records: &mut [T]) -> RepoResult<usize> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let mut ids = Vec::with_capacity(records.len());
        for record in records.iter() {
            ids.push(insert_record(&tx, record)?);
        }
        tx.commit()?;
        for (record, id) in records.iter_mut().zip(ids) {
            record.assign_id(id);
        }
        Ok(records.len())
    }

    fn upsert_in_tx(&mut self, record: &mut T) -> RepoResult<RecordId> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let id = match record.id() {
            Some(id) => {
                upsert_record(&tx, record, id)?;
                id
            }
            None => insert_record(&tx, record)?,
        };
        tx.commit()?;
        record.assign_id(id);
        Ok(id)
    }

    fn delete_in_tx(&mut self, id: RecordId) -> RepoResult<()> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let changed = tx.execute(&format!("DELETE FROM {} WHERE id = ?1;", T::TABLE), [id])?;
        if changed == 0 {
            return Err(RepoError::NotFound { table: T::TABLE, id });
        }
        tx.commit()?;
        Ok(())
    }
}

impl<T: Record> RecordRepository<T> for SqliteRecordRepository<'_, T> {
    fn save(&mut self, record: &mut T) -> RepoResult<()> {
        match self.insert_in_tx(record) {
            Ok(id) => {
                info!(
                    "event=record_save module=repo status=ok table={} id={id}",
                    T::TABLE
                );
                Ok(())
            }
            Err(err) => {
                error!(
                    "event=record_save module=repo status=error table={} error={err}",
                    T::TABLE
                );
                Err(err)
            }
        }
    }

    fn save_all(&mut self, records: &mut [T]) -> RepoResult<()> {
        match self.insert_all_in_tx(records) {
            Ok(count) => {
                info!(
                    "event=record_save_all module=repo status=ok table={} count={count}",
                    T::TABLE
                );
                Ok(())
            }
            Err(err) => {
                error!(
                    "event=record_save_all module=repo status=error table={} error={err}",
                    T::TABLE
                );
                Err(err)
            }
        }
    }

    fn list(&self) -> RepoResult<Vec<T>> {
        collect_records(self.conn, &format!("{};", self.select_sql), Vec::new())
    }

    fn get_by_id(&self, id: RecordId) -> RepoResult<Option<T>> {
        let sql = format!("{} WHERE id = ?1;", self.select_sql);
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query([id])?;

        let Some(row) = rows.next()? else {
            return Ok(None);
        };
        let record = T::from_row(row)?;

        if rows.next()?.is_some() {
            return Err(RepoError::MultipleRowsForId { table: T::TABLE, id });
        }

        Ok(Some(record))
    }

    fn get_by_ids(&self, ids: &[RecordId]) -> RepoResult<Vec<T>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders: Vec<String> = (1..=ids.len()).map(|n| format!("?{n}")).collect();
        let sql = format!(
            "{} WHERE id IN ({});",
            self.select_sql,
            placeholders.join(", ")
        );
        let values: Vec<Value> = ids.iter().map(|id| Value::Integer(*id)).collect();
        collect_records(self.conn, &sql, values)
    }

    fn list_sorted(&self, order_by: &[&str]) -> RepoResult<Vec<T>> {
        if order_by.is_empty() {
            return self.list();
        }

        for column in order_by {
            if *column != "id" && !T::COLUMNS.contains(column) {
                return Err(RepoError::UnknownSortColumn {
                    table: T::TABLE,
                    column: (*column).to_string(),
                });
            }
        }

        let sql = format!("{} ORDER BY {};", self.select_sql, order_by.join(", "));
        collect_records(self.conn, &sql, Vec::new())
    }

    fn count_all(&self) -> RepoResult<i64> {
        let count =
            self.conn
                .query_row(&format!("SELECT COUNT(*) FROM {};", T::TABLE), [], |row| {
                    row.get(0)
                })?;
        Ok(count)
    }

    fn update(&mut self, record: &mut T) -> RepoResult<()> {
        match self.upsert_in_tx(record) {
            Ok(id) => {
                info!(
                    "event=record_update module=repo status=ok table={} id={id}",
                    T::TABLE
                );
                Ok(())
            }
            Err(err) => {
                error!(
                    "event=record_update module=repo status=error table={} error={err}",
                    T::TABLE
                );
                Err(err)
            }
        }
    }

    fn remove(&mut self, record: &T) -> RepoResult<()> {
        let Some(id) = record.id() else {
            let err = RepoError::MissingId { table: T::TABLE };
            error!(
                "event=record_remove module=repo status=error table={} error={err}",
                T::TABLE
            );
            return Err(err);
        };

        match self.delete_in_tx(id) {
            Ok(()) => {
                info!(
                    "event=record_remove module=repo status=ok table={} id={id}",
                    T::TABLE
                );
                Ok(())
            }
            Err(err) => {
                error!(
                    "event=record_remove module=repo status=error table={} error={err}",
                    T::TABLE
                );
                Err(err)
            }
        }
    }
}

fn build_select_sql<T: Record>() -> String {
    let mut columns: Vec<&str> = Vec::with_capacity(T::COLUMNS.len() + 1);
    columns.push("id");
    columns.extend_from_slice(T::COLUMNS);
    format!("SELECT {} FROM {}", columns.join(", "), T::TABLE)
}

fn insert_record<T: Record>(tx: &Transaction<'_>, record: &T) -> RepoResult<RecordId> {
    let mut columns: Vec<&str> = Vec::with_capacity(T::COLUMNS.len() + 1);
    let mut values: Vec<Value> = Vec::with_capacity(T::COLUMNS.len() + 1);
    if let Some(id) = record.id() {
        columns.push("id");
        values.push(Value::Integer(id));
    }
    columns.extend_from_slice(T::COLUMNS);
    values.extend(record.to_values());

    let placeholders: Vec<String> = (1..=values.len()).map(|n| format!("?{n}")).collect();
    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({});",
        T::TABLE,
        columns.join(", "),
        placeholders.join(", ")
    );
    tx.execute(&sql, params_from_iter(values))?;

    Ok(match record.id() {
        Some(id) => id,
        None => tx.last_insert_rowid(),
    })
}

fn upsert_record<T: Record>(tx: &Transaction<'_>, record: &T, id: RecordId) -> RepoResult<()> {
    let mut columns: Vec<&str> = Vec::with_capacity(T::COLUMNS.len() + 1);
    columns.push("id");
    columns.extend_from_slice(T::COLUMNS);

    let mut values: Vec<Value> = Vec::with_capacity(T::COLUMNS.len() + 1);
    values.push(Value::Integer(id));
    values.extend(record.to_values());

    let placeholders: Vec<String> = (1..=values.len()).map(|n| format!("?{n}")).collect();
    let assignments: Vec<String> = T::COLUMNS
        .iter()
        .map(|column| format!("{column} = excluded.{column}"))
        .collect();
    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({}) ON CONFLICT(id) DO UPDATE SET {};",
        T::TABLE,
        columns.join(", "),
        placeholders.join(", "),
        assignments.join(", ")
    );
    tx.execute(&sql, params_from_iter(values))?;
    Ok(())
}

fn collect_records<T: Record>(
    conn: &Connection,
    sql: &str,
    values: Vec<Value>,
) -> RepoResult<Vec<T>> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query(params_from_iter(values))?;
    let mut records = Vec::new();
    while let Some(row) = rows.next()? {
        records.push(T::from_row(row)?);
    }
    Ok(records)
}

fn ensure_record_connection_ready<T: Record>(conn: &Connection) -> RepoResult<()> {
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version == 0 {
        return Err(RepoError::UninitializedConnection {
            expected_version: latest_version(),
            actual_version,
        });
    }

    if !table_exists(conn, T::TABLE)? {
        return Err(RepoError::MissingRequiredTable(T::TABLE));
    }

    if !table_has_column(conn, T::TABLE, "id")? {
        return Err(RepoError::MissingRequiredColumn {
            table: T::TABLE,
            column: "id",
        });
    }
    for &column in T::COLUMNS {
        if !table_has_column(conn, T::TABLE, column)? {
            return Err(RepoError::MissingRequiredColumn {
                table: T::TABLE,
                column,
            });
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
