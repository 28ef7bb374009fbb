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
use crate::common::mysql_options::Advance;
use crate::driver::{FetchStatus, NativeConnection, NativeStatement};
use crate::opts::BindOptions;
use crate::params::Param;
use crate::query::{bind_results, start};
use crate::{Error, Result};
use tracing::debug;

#[doc(hidden)]
use fallible_streaming_iterator::FallibleStreamingIterator;

/// A caller-driven handle over a buffered result set.
///
/// Handed to the callback of a pull query. Every [advance](PullPack::advance) overwrites the entries
/// of [binder](PullPack::binder) with the next row.
pub struct PullPack<'a> {
    statement: &'a mut dyn NativeStatement,
    binder: &'a mut Binder,
    row_count: u64,
    rows_fetched: u64,
    has_row: bool,
    exhausted: bool,
}

impl<'a> PullPack<'a> {
    pub(crate) fn new(
        statement: &'a mut dyn NativeStatement,
        binder: &'a mut Binder,
        row_count: u64,
    ) -> PullPack<'a> {
        PullPack {
            statement,
            binder,
            row_count,
            rows_fetched: 0,
            has_row: false,
            exhausted: row_count == 0,
        }
    }

    /// Moves through the result set and returns whether more rows remain.
    ///
    /// [Advance::Step] fetches one row. [Advance::Drain] fetches until the result set is exhausted,
    /// leaving the last row in the binder, and always returns `false`.
    ///
    /// # Examples
    /// ```
    /// # use mysqlcb::*;
    /// # use mysqlcb::testing::*;
    /// with_querier(&example_driver(), &example_opts(), |querier| {
    ///     querier.pull(EXAMPLE_QUERY, &[], |pack| {
    ///         assert!(pack.advance(Advance::Step)?);
    ///         println!("{}", pack.binder().column(0).unwrap());
    ///         assert!(!pack.advance(Advance::Drain)?);
    ///         Ok(())
    ///     })
    /// })
    /// .unwrap();
    /// ```
    pub fn advance(&mut self, mode: Advance) -> Result<bool> {
        match mode {
            Advance::Step => {
                if !self.fetch_one()? {
                    self.has_row = false;
                }
            }
            Advance::Drain => while self.fetch_one()? {},
        }
        Ok(self.more_remaining())
    }

    fn fetch_one(&mut self) -> Result<bool> {
        if !self.more_remaining() {
            self.exhausted = true;
            return Ok(false);
        }
        let status = self.statement.fetch(self.binder)?;
        if status == FetchStatus::NoData {
            self.exhausted = true;
            self.has_row = false;
            return Ok(false);
        }
        self.binder.record_fetch(status);
        self.rows_fetched += 1;
        self.has_row = true;
        Ok(true)
    }

    fn more_remaining(&self) -> bool {
        !self.exhausted && self.rows_fetched < self.row_count
    }

    /// Whether the binder holds a fetched row.
    pub fn has_row(&self) -> bool {
        self.has_row
    }

    pub fn rows_fetched(&self) -> u64 {
        self.rows_fetched
    }

    /// Number of rows in the buffered result set.
    pub fn row_count(&self) -> u64 {
        self.row_count
    }

    pub fn binder(&self) -> &Binder {
        &*self.binder
    }

    /// The current row, if any.
    pub fn row(&self) -> Option<&Binder> {
        self.has_row.then_some(&*self.binder)
    }

    /// Fetches the next row and returns it, or [None] once the result set is exhausted.
    pub fn next_row(&mut self) -> Result<Option<&Binder>> {
        self.next()
    }
}

impl FallibleStreamingIterator for PullPack<'_> {
    type Error = Error;
    type Item = Binder;

    fn advance(&mut self) -> Result<()> {
        PullPack::advance(self, Advance::Step).map(|_| ())
    }

    fn get(&self) -> Option<&Binder> {
        self.row()
    }
}

/// Executes `sql`, buffers its result set client-side and hands a [PullPack] over it to `f`.
///
/// `f` is invoked exactly once, also for statements without a result set, which get an empty,
/// exhausted handle.
#[tracing::instrument(skip_all)]
pub(crate) fn execute_pull<C, F, R>(
    connection: &mut C,
    sql: &str,
    params: &[Param<'_>],
    options: &BindOptions,
    f: F,
) -> Result<R>
where
    C: NativeConnection,
    F: FnOnce(&mut PullPack<'_>) -> Result<R>,
{
    let mut statement = start(connection, sql, params)?;
    let (mut binder, row_count) = match bind_results(&mut statement, options)? {
        Some(binder) => {
            let row_count = statement.store_result()?;
            (binder, row_count)
        }
        None => (Binder::default(), 0),
    };
    debug!(row_count, "Result stored");

    let mut pack = PullPack::new(&mut statement, &mut binder, row_count);
    f(&mut pack)
}
