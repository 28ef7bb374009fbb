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

use crate::binder::{bind_result_columns, Binder};
use crate::driver::{FetchStatus, NativeConnection, NativeStatement};
use crate::mysql_error::{ClientError, CR_PARAMS_NOT_BOUND};
use crate::opts::BindOptions;
use crate::params::{bind_parameters, Param};
use crate::{Error, Result};
use tracing::debug;

/// Prepares `sql`, binds `params` and executes it.
///
/// The parameter bindings only live until the statement has executed. Any failure drops the statement,
/// which releases it.
pub(crate) fn start<'c, C>(
    connection: &'c mut C,
    sql: &str,
    params: &[Param<'_>],
) -> Result<C::Statement<'c>>
where
    C: NativeConnection,
{
    debug!(sql, "Preparing statement");
    let mut statement = connection.prepare(sql)?;

    let expected = statement.param_count();
    if expected != params.len() {
        return Err(Error::BindParams(ClientError::new(
            CR_PARAMS_NOT_BOUND,
            format!(
                "Statement expects {expected} parameters, {} given",
                params.len()
            ),
        )));
    }

    let mut param_binder = bind_parameters(params);
    debug!(params = params.len(), "Executing statement");
    statement.execute(&mut param_binder)?;
    Ok(statement)
}

/// Builds the result bindings of an executed statement, [None] if it has no result set.
pub(crate) fn bind_results<S>(statement: &mut S, options: &BindOptions) -> Result<Option<Binder>>
where
    S: NativeStatement + ?Sized,
{
    if statement.field_count() == 0 {
        return Ok(None);
    }
    let fields = statement.result_metadata()?;
    bind_result_columns(fields, options).map(Some)
}

/// Executes `sql` and hands every row to `on_row` as it is fetched. Returns the number of rows
/// delivered.
///
/// Rows are not buffered client-side. A truncated row is still delivered, with the affected entries
/// marked. An error from `on_row` stops delivery and is returned as is.
#[tracing::instrument(skip_all)]
pub(crate) fn execute_push<C, F>(
    connection: &mut C,
    sql: &str,
    params: &[Param<'_>],
    options: &BindOptions,
    mut on_row: F,
) -> Result<u64>
where
    C: NativeConnection,
    F: FnMut(&Binder) -> Result<()>,
{
    let mut statement = start(connection, sql, params)?;
    let Some(mut binder) = bind_results(&mut statement, options)? else {
        debug!("Statement has no result set");
        return Ok(0);
    };

    let mut delivered = 0;
    loop {
        let status = statement.fetch(&mut binder)?;
        if status == FetchStatus::NoData {
            break;
        }
        binder.record_fetch(status);
        on_row(&binder)?;
        delivered += 1;
    }

    debug!(rows = delivered, "Result delivered");
    Ok(delivered)
}
