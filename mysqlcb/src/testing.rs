/* *********************************************************************
* Copyright (c) 2024 Mimer Information Technology
*
* Permission is hereby granted, free of charge, to any person obtaining a copy
* of this software and associated documentation files (the "Software"), to deal
* in the Software without restriction, including without limitation the rights
* to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
* copies of the Software, and to permit persons to whom the Software is
* furnished to do so, subject to the following conditions:
*
* The above copyright notice and this permission notice shall be included in all
* copies or substantial portions of the Software.
*
* THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
* IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
* FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
* AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
* LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
* OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
* SOFTWARE.
*
* See license for more details.
* *********************************************************************/

#![allow(dead_code)]

//! A scripted, in-memory implementation of the driver seam.
//!
//! [MemoryDriver] serves canned result sets keyed by SQL text and writes fetched values through the
//! binder entries the way `mysql_stmt_fetch` does: values longer than the bound buffer are cut at
//! `buffer_length`, flagged in the error indicator and reported as a truncated fetch.

use crate::binder::Binder;
use crate::common::mysql_options::{ColumnFlags, ColumnType};
use crate::driver::{Driver, FetchStatus, Field, NativeConnection, NativeStatement};
use crate::mysql_error::{ClientError, CR_NO_RESULT_SET};
use crate::opts::ConnectOpts;
use crate::params::Param;
use crate::{params, Error, Result};

#[doc(hidden)]
use std::{
    cell::{Cell, RefCell},
    collections::{HashMap, HashSet},
    rc::Rc,
};

pub const EXAMPLE_TABLE: &str = "test_table";
pub const EXAMPLE_QUERY: &str = "SELECT column_1 FROM test_table";
pub const EXAMPLE_VALUES: [&str; 3] = ["the number one ÅÄÖ", "two", "three"];

pub const PEOPLE_QUERY: &str = "SELECT id, name, born, score FROM people WHERE id > ?";
pub const INSERT_PERSON: &str = "INSERT INTO people (name, born, score) VALUES (?, ?, ?)";
pub const SPATIAL_QUERY: &str = "SELECT id, location FROM places";

/// A canned result set.
#[derive(Debug, Clone, Default)]
pub struct MemoryTable {
    fields: Vec<Field>,
    rows: Vec<Vec<Param<'static>>>,
}

impl MemoryTable {
    pub fn new(fields: Vec<Field>) -> MemoryTable {
        MemoryTable {
            fields,
            rows: Vec::new(),
        }
    }

    /// Appends a row. Missing trailing values and [Param::null] are fetched as NULL.
    pub fn row(mut self, values: Vec<Param<'_>>) -> MemoryTable {
        self.rows
            .push(values.into_iter().map(Param::into_owned).collect());
        self
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// A statement execution as seen by the driver: the SQL and the bound parameter bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Executed {
    pub sql: String,
    pub params: Vec<Option<Vec<u8>>>,
}

/// Counters shared by a driver and everything it opened.
#[derive(Debug, Default)]
pub struct Stats {
    connections_opened: Cell<usize>,
    connections_closed: Cell<usize>,
    statements_prepared: Cell<usize>,
    statements_closed: Cell<usize>,
    fetches: Cell<usize>,
    executed: RefCell<Vec<Executed>>,
    last_opts: RefCell<Option<ConnectOpts>>,
}

fn bump(counter: &Cell<usize>) {
    counter.set(counter.get() + 1);
}

impl Stats {
    pub fn connections_opened(&self) -> usize {
        self.connections_opened.get()
    }

    pub fn connections_closed(&self) -> usize {
        self.connections_closed.get()
    }

    pub fn statements_prepared(&self) -> usize {
        self.statements_prepared.get()
    }

    pub fn statements_closed(&self) -> usize {
        self.statements_closed.get()
    }

    pub fn fetches(&self) -> usize {
        self.fetches.get()
    }

    pub fn executed(&self) -> Vec<Executed> {
        self.executed.borrow().clone()
    }

    /// The options of the most recent connect.
    pub fn last_opts(&self) -> Option<ConnectOpts> {
        self.last_opts.borrow().clone()
    }
}

#[derive(Debug, Clone, Default)]
struct Script {
    tables: HashMap<String, MemoryTable>,
    prepare_errors: HashMap<String, ClientError>,
    execute_errors: HashMap<String, ClientError>,
    missing_metadata: HashSet<String>,
    connect_error: Option<ClientError>,
}

/// Scripted driver. Statements without a scripted table behave like `INSERT`/`UPDATE`: they execute
/// and have no result set.
#[derive(Debug, Clone, Default)]
pub struct MemoryDriver {
    script: Rc<Script>,
    stats: Rc<Stats>,
}

impl MemoryDriver {
    pub fn new() -> MemoryDriver {
        MemoryDriver::default()
    }

    /// Serves `table` for statements whose SQL is exactly `sql`.
    pub fn with_table(mut self, sql: &str, table: MemoryTable) -> MemoryDriver {
        Rc::make_mut(&mut self.script)
            .tables
            .insert(sql.to_string(), table);
        self
    }

    pub fn with_prepare_error(mut self, sql: &str, code: u32, message: &str) -> MemoryDriver {
        Rc::make_mut(&mut self.script)
            .prepare_errors
            .insert(sql.to_string(), ClientError::new(code, message));
        self
    }

    pub fn with_execute_error(mut self, sql: &str, code: u32, message: &str) -> MemoryDriver {
        Rc::make_mut(&mut self.script)
            .execute_errors
            .insert(sql.to_string(), ClientError::new(code, message));
        self
    }

    /// Makes the result metadata of `sql` unavailable even though it reports columns.
    pub fn without_metadata(mut self, sql: &str) -> MemoryDriver {
        Rc::make_mut(&mut self.script)
            .missing_metadata
            .insert(sql.to_string());
        self
    }

    /// Refuses every connection attempt.
    pub fn refusing(mut self, code: u32, message: &str) -> MemoryDriver {
        Rc::make_mut(&mut self.script).connect_error = Some(ClientError::new(code, message));
        self
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }
}

impl Driver for MemoryDriver {
    type Connection = MemoryConnection;

    fn connect(&self, opts: &ConnectOpts) -> Result<MemoryConnection> {
        if let Some(err) = &self.script.connect_error {
            return Err(Error::Connect(err.clone()));
        }
        bump(&self.stats.connections_opened);
        *self.stats.last_opts.borrow_mut() = Some(opts.clone());
        Ok(MemoryConnection {
            script: Rc::clone(&self.script),
            stats: Rc::clone(&self.stats),
        })
    }
}

pub struct MemoryConnection {
    script: Rc<Script>,
    stats: Rc<Stats>,
}

impl Drop for MemoryConnection {
    fn drop(&mut self) {
        bump(&self.stats.connections_closed);
    }
}

impl NativeConnection for MemoryConnection {
    type Statement<'a> = MemoryStatement<'a>;

    fn prepare(&mut self, sql: &str) -> Result<MemoryStatement<'_>> {
        let connection: &MemoryConnection = self;
        if let Some(err) = connection.script.prepare_errors.get(sql) {
            return Err(Error::Prepare(err.clone()));
        }
        bump(&connection.stats.statements_prepared);
        Ok(MemoryStatement {
            connection,
            sql: sql.to_string(),
            table: connection.script.tables.get(sql),
            cursor: 0,
        })
    }
}

pub struct MemoryStatement<'a> {
    connection: &'a MemoryConnection,
    sql: String,
    table: Option<&'a MemoryTable>,
    cursor: usize,
}

impl Drop for MemoryStatement<'_> {
    fn drop(&mut self) {
        bump(&self.connection.stats.statements_closed);
    }
}

impl NativeStatement for MemoryStatement<'_> {
    fn param_count(&self) -> usize {
        self.sql.matches('?').count()
    }

    fn execute(&mut self, params: &mut Binder) -> Result<()> {
        if let Some(err) = self.connection.script.execute_errors.get(&self.sql) {
            return Err(Error::Execute(err.clone()));
        }
        let params = params
            .bind_data()
            .iter()
            .map(|data| (!data.is_null()).then(|| data.value_bytes().to_vec()))
            .collect();
        self.connection.stats.executed.borrow_mut().push(Executed {
            sql: self.sql.clone(),
            params,
        });
        self.cursor = 0;
        Ok(())
    }

    fn field_count(&self) -> usize {
        self.table.map_or(0, |table| table.fields.len())
    }

    fn result_metadata(&mut self) -> Result<Vec<Field>> {
        match self.table {
            Some(table) if !self.connection.script.missing_metadata.contains(&self.sql) => {
                Ok(table.fields.clone())
            }
            _ => Err(Error::Metadata(ClientError::new(
                CR_NO_RESULT_SET,
                "Attempt to read a row while there is no result set associated with the statement",
            ))),
        }
    }

    fn store_result(&mut self) -> Result<u64> {
        Ok(self.table.map_or(0, |table| table.rows.len() as u64))
    }

    fn fetch(&mut self, binder: &mut Binder) -> Result<FetchStatus> {
        bump(&self.connection.stats.fetches);
        let Some(row) = self.table.and_then(|table| table.rows.get(self.cursor)) else {
            return Ok(FetchStatus::NoData);
        };
        self.cursor += 1;

        let mut truncated = false;
        for (index, (bind, data)) in binder.slots_mut().enumerate() {
            let Some(value) = row.get(index).filter(|value| !value.is_null()) else {
                data.set_fetched(0, true, false);
                continue;
            };
            let bytes = value.bytes();
            let buffer = data.buffer_mut();
            let n = bytes.len().min(bind.buffer_length).min(buffer.len());
            buffer[..n].copy_from_slice(&bytes[..n]);
            if n < buffer.len() && value.bdtype().is_some_and(|t| t.is_variable_length()) {
                buffer[n] = 0;
            }
            let is_error = bytes.len() > bind.buffer_length;
            truncated |= is_error;
            data.set_fetched(bytes.len(), false, is_error);
        }

        Ok(if truncated {
            FetchStatus::Truncated
        } else {
            FetchStatus::Row
        })
    }
}

/// Options pointing nowhere in particular; the memory driver only records them.
pub fn example_opts() -> ConnectOpts {
    ConnectOpts {
        host: Some("localhost".to_string()),
        user: Some("rustuser".to_string()),
        password: Some("rustpassword".to_string()),
        db: Some("test".to_string()),
        ..ConnectOpts::default()
    }
}

/// One `VARCHAR(30)` column holding [EXAMPLE_VALUES].
pub fn example_table() -> MemoryTable {
    let fields = vec![Field::new("column_1", ColumnType::MYSQL_TYPE_VAR_STRING)
        .with_length(30)
        .with_table(EXAMPLE_TABLE)];
    EXAMPLE_VALUES
        .iter()
        .fold(MemoryTable::new(fields), |table, value| table.row(params![value]))
}

/// Numbers, text, a date and a double, plus a NULL score in the last row.
pub fn people_table() -> MemoryTable {
    use chrono::NaiveDate;

    let fields = vec![
        Field::new("id", ColumnType::MYSQL_TYPE_LONG).with_flags(
            ColumnFlags::NOT_NULL
                | ColumnFlags::PRI_KEY
                | ColumnFlags::UNSIGNED
                | ColumnFlags::AUTO_INCREMENT,
        ),
        Field::new("name", ColumnType::MYSQL_TYPE_VAR_STRING).with_length(40),
        Field::new("born", ColumnType::MYSQL_TYPE_DATE),
        Field::new("score", ColumnType::MYSQL_TYPE_DOUBLE),
    ];
    let ada = NaiveDate::from_ymd_opt(1815, 12, 10);
    let grace = NaiveDate::from_ymd_opt(1906, 12, 9);
    MemoryTable::new(fields)
        .row(params![1u32, "Ada Lovelace", ada, 97.25f64])
        .row(params![2u32, "Grace Hopper", grace, None::<f64>])
}

/// A driver serving [EXAMPLE_QUERY], [PEOPLE_QUERY] and a [SPATIAL_QUERY] with a geometry column.
pub fn example_driver() -> MemoryDriver {
    let places = MemoryTable::new(vec![
        Field::new("id", ColumnType::MYSQL_TYPE_LONG),
        Field::new("location", ColumnType::MYSQL_TYPE_GEOMETRY),
    ]);
    MemoryDriver::new()
        .with_table(EXAMPLE_QUERY, example_table())
        .with_table(PEOPLE_QUERY, people_table())
        .with_table(SPATIAL_QUERY, places)
}
