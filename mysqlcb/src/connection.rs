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

use crate::binder::Binder;
use crate::cursor::{execute_pull, PullPack};
use crate::driver::{Driver, NativeConnection};
use crate::opts::{BindOptions, ConnectOpts};
use crate::params::Param;
use crate::query::execute_push;
use crate::{Error, Result};
use tracing::{debug, warn};

#[doc(hidden)]
use parking_lot::{Mutex, MutexGuard};

/// An open connection that runs one query at a time.
///
/// Queries take the connection for as long as their rows are being delivered. Starting another query
/// on the same connection from inside a row callback fails with [Error::QueryInProgress]; it is never
/// queued. The connection is closed when dropped.
pub struct Connection<C: NativeConnection> {
    inner: Mutex<C>,
    bind_options: BindOptions,
}

impl<C: NativeConnection> Connection<C> {
    /// Opens a connection through `driver`.
    ///
    /// # Errors
    /// Returns [Error::Connect] when the client library refuses the connection.
    ///
    /// # Examples
    /// ```
    /// # use mysqlcb::*;
    /// # use mysqlcb::testing::*;
    /// let driver = example_driver();
    /// let conn = Connection::open(&driver, &example_opts()).unwrap();
    /// ```
    pub fn open<D>(driver: &D, opts: &ConnectOpts) -> Result<Connection<C>>
    where
        D: Driver<Connection = C>,
    {
        debug!(host = ?opts.host, db = ?opts.db, "Connecting");
        let native = driver.connect(opts)?;
        Ok(Connection {
            inner: Mutex::new(native),
            bind_options: opts.bind,
        })
    }

    pub fn bind_options(&self) -> BindOptions {
        self.bind_options
    }

    /// Whether a query is currently delivering rows.
    pub fn in_query(&self) -> bool {
        self.inner.is_locked()
    }

    fn begin_query(&self) -> Result<MutexGuard<'_, C>> {
        self.inner.try_lock().ok_or_else(|| {
            warn!("Old query must run to completion before starting a new query.");
            Error::QueryInProgress
        })
    }

    /// Executes `sql` with `params` and calls `on_row` once for every fetched row. Returns the number of
    /// rows delivered, `0` for statements without a result set.
    ///
    /// # Errors
    /// Returns [Err] when the statement cannot be prepared, bound, executed or fetched, when a column has
    /// no supported type, when another query is in progress, or with whatever `on_row` returned.
    ///
    /// # Examples
    /// ```
    /// # use mysqlcb::*;
    /// # use mysqlcb::testing::*;
    /// let driver = example_driver();
    /// let conn = Connection::open(&driver, &example_opts()).unwrap();
    ///
    /// let rows = conn
    ///     .push(PEOPLE_QUERY, &params![0u32], |row| {
    ///         let line: Vec<String> = row.columns().map(|c| c.to_string()).collect();
    ///         println!("{}", line.join("\t"));
    ///         Ok(())
    ///     })
    ///     .unwrap();
    /// assert_eq!(rows, 2);
    /// ```
    pub fn push<F>(&self, sql: &str, params: &[Param<'_>], on_row: F) -> Result<u64>
    where
        F: FnMut(&Binder) -> Result<()>,
    {
        let mut native = self.begin_query()?;
        execute_push(&mut *native, sql, params, &self.bind_options, on_row)
    }

    /// Executes `sql` with `params`, buffers the whole result set and calls `f` once with a
    /// [PullPack] to walk it.
    pub fn pull<F, R>(&self, sql: &str, params: &[Param<'_>], f: F) -> Result<R>
    where
        F: FnOnce(&mut PullPack<'_>) -> Result<R>,
    {
        let mut native = self.begin_query()?;
        execute_pull(&mut *native, sql, params, &self.bind_options, f)
    }

    /// Executes a statement without parameters, discarding any rows. Mainly used for DDL statements.
    pub fn execute_statement(&self, sql: &str) -> Result<()> {
        self.push(sql, &[], |_| Ok(())).map(|_| ())
    }

    pub fn querier(&self) -> Querier<'_, C> {
        Querier { connection: self }
    }
}

impl<C: NativeConnection> Drop for Connection<C> {
    fn drop(&mut self) {
        debug!("Closing connection");
    }
}

/// The push and pull operations of one connection, without access to the connection itself.
pub struct Querier<'a, C: NativeConnection> {
    connection: &'a Connection<C>,
}

impl<C: NativeConnection> Clone for Querier<'_, C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C: NativeConnection> Copy for Querier<'_, C> {}

impl<C: NativeConnection> Querier<'_, C> {
    /// See [Connection::push].
    pub fn push<F>(&self, sql: &str, params: &[Param<'_>], on_row: F) -> Result<u64>
    where
        F: FnMut(&Binder) -> Result<()>,
    {
        self.connection.push(sql, params, on_row)
    }

    /// See [Connection::pull].
    pub fn pull<F, R>(&self, sql: &str, params: &[Param<'_>], f: F) -> Result<R>
    where
        F: FnOnce(&mut PullPack<'_>) -> Result<R>,
    {
        self.connection.pull(sql, params, f)
    }
}

/// Opens a connection, hands it to `f` and closes it when `f` returns, whether or not `f` succeeded.
///
/// # Errors
/// Returns [Error::Connect] without calling `f` when the connection cannot be opened, otherwise what
/// `f` returned.
///
/// # Examples
/// ```
/// # use mysqlcb::*;
/// # use mysqlcb::testing::*;
/// let count = with_connection(&example_driver(), &example_opts(), |conn| {
///     conn.push(EXAMPLE_QUERY, &[], |_| Ok(()))
/// })
/// .unwrap();
/// assert_eq!(count, 3);
/// ```
pub fn with_connection<D, F, R>(driver: &D, opts: &ConnectOpts, f: F) -> Result<R>
where
    D: Driver,
    F: FnOnce(&Connection<D::Connection>) -> Result<R>,
{
    let connection = Connection::open(driver, opts)?;
    f(&connection)
}

/// Like [with_connection], but hands `f` only the [Querier] of the connection.
pub fn with_querier<D, F, R>(driver: &D, opts: &ConnectOpts, f: F) -> Result<R>
where
    D: Driver,
    F: FnOnce(Querier<'_, D::Connection>) -> Result<R>,
{
    with_connection(driver, opts, |connection| f(connection.querier()))
}

#[cfg(test)]
mod connection_tests {
    use super::*;
    use crate::common::mysql_options::Advance;
    use crate::testing::*;

    #[test]
    fn connection_open_close() {
        let driver = example_driver();
        let conn = Connection::open(&driver, &example_opts()).unwrap();
        assert_eq!(driver.stats().connections_opened(), 1);
        assert!(!conn.in_query());
        drop(conn);
        assert_eq!(driver.stats().connections_closed(), 1);
    }

    #[test]
    fn connect_failure_skips_callback() {
        let driver = MemoryDriver::new().refusing(1045, "Access denied for user 'rustuser'");
        let mut called = false;
        let err = with_connection(&driver, &example_opts(), |_| {
            called = true;
            Ok(())
        })
        .unwrap_err();
        assert!(!called);
        assert!(err.to_string().starts_with("MySQL connection failed"));
        assert_eq!(err.client_error().map(|e| e.error_code()), Some(1045));
    }

    #[test]
    fn closed_after_callback_error() {
        let driver = example_driver();
        let result: Result<()> = with_connection(&driver, &example_opts(), |_| {
            Err(Error::BadConfig("boom".to_string()))
        });
        assert!(result.is_err());
        assert_eq!(driver.stats().connections_closed(), 1);
    }

    #[test]
    fn options_reach_the_driver() {
        let driver = example_driver();
        let mut opts = example_opts();
        opts.bind.reserve_terminator = true;
        with_connection(&driver, &opts, |conn| {
            assert!(conn.bind_options().reserve_terminator);
            Ok(())
        })
        .unwrap();
        assert_eq!(driver.stats().last_opts(), Some(opts));
    }

    #[test]
    fn nested_push_is_rejected() {
        let driver = example_driver();
        let mut outer_rows = Vec::new();
        let mut inner_errors = 0;

        let delivered = with_querier(&driver, &example_opts(), |querier| {
            querier.push(EXAMPLE_QUERY, &[], |row| {
                match querier.push(EXAMPLE_QUERY, &[], |_| Ok(())) {
                    Err(Error::QueryInProgress) => inner_errors += 1,
                    other => panic!("nested push was not rejected: {other:?}"),
                }
                outer_rows.push(row.column(0).unwrap().render().unwrap());
                Ok(())
            })
        })
        .unwrap();

        assert_eq!(delivered, 3);
        assert_eq!(inner_errors, 3);
        assert_eq!(outer_rows, EXAMPLE_VALUES.to_vec());
        assert_eq!(driver.stats().statements_prepared(), 1);
    }

    #[test]
    fn nested_pull_is_rejected() {
        let driver = example_driver();
        with_querier(&driver, &example_opts(), |querier| {
            querier.pull(EXAMPLE_QUERY, &[], |pack| {
                assert!(pack.advance(Advance::Step)?);
                let nested = querier.pull(EXAMPLE_QUERY, &[], |_| Ok(()));
                assert!(matches!(nested, Err(Error::QueryInProgress)));
                assert!(!pack.advance(Advance::Drain)?);
                assert_eq!(pack.rows_fetched(), 3);
                Ok(())
            })
        })
        .unwrap();
    }

    #[test]
    fn sequential_queries_share_a_connection() {
        let driver = example_driver();
        with_connection(&driver, &example_opts(), |conn| {
            assert_eq!(conn.push(EXAMPLE_QUERY, &[], |_| Ok(()))?, 3);
            let count = conn.pull(EXAMPLE_QUERY, &[], |pack| Ok(pack.row_count()))?;
            assert_eq!(count, 3);
            conn.execute_statement("DROP TABLE test_table")?;
            assert!(!conn.in_query());
            Ok(())
        })
        .unwrap();
        assert_eq!(driver.stats().connections_opened(), 1);
        assert_eq!(driver.stats().statements_closed(), 3);
    }
}
