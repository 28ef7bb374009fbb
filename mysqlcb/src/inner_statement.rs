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
use crate::common::mysql_options::ColumnFlags;
use crate::driver::{FetchStatus, Field, NativeStatement};
use crate::inner_connection::{c_string_lossy, InnerConnection};
use crate::mysql_error::ClientError;
use crate::{Error, Result};
use mysqlcb_sys as ffi;
use tracing::debug;

#[doc(hidden)]
use std::{
    ffi::{c_ulong, c_void},
    marker::PhantomData,
    ptr::{self, NonNull},
};

/// Owns a `MYSQL_STMT` handle borrowed from an [InnerConnection]. The handle is closed on drop.
pub struct InnerStatement<'a> {
    stmt: NonNull<ffi::MYSQL_STMT>,
    _connection: PhantomData<&'a mut InnerConnection>,
}

/// Points fresh `MYSQL_BIND` records at the entries of `binder`.
///
/// The client library copies the records but keeps the pointers, which are only valid while `binder`
/// is neither moved nor dropped. They are rebuilt for every call that hands them over.
fn raw_binds(binder: &mut Binder) -> Vec<ffi::MYSQL_BIND> {
    binder
        .slots_mut()
        .map(|(desc, data)| {
            let mut bind = ffi::MYSQL_BIND::default();
            bind.length = ptr::addr_of_mut!(data.len_data);
            bind.is_null = ptr::addr_of_mut!(data.is_null);
            bind.error = ptr::addr_of_mut!(data.is_error);
            bind.buffer = data.buffer_mut().as_mut_ptr().cast::<c_void>();
            bind.buffer_length = desc.buffer_length as c_ulong;
            bind.buffer_type = desc.buffer_type.code();
            bind.is_unsigned = desc.is_unsigned;
            bind
        })
        .collect()
}

/// Frees a result metadata handle on drop.
struct ResultMetadata(NonNull<ffi::MYSQL_RES>);

impl Drop for ResultMetadata {
    fn drop(&mut self) {
        // SAFETY: the handle came from mysql_stmt_result_metadata and is freed exactly once.
        unsafe { ffi::mysql_free_result(self.0.as_ptr()) };
    }
}

fn field_from_raw(raw: &ffi::MYSQL_FIELD) -> Field {
    Field {
        name: c_string_lossy(raw.name),
        org_name: c_string_lossy(raw.org_name),
        table: c_string_lossy(raw.table),
        org_table: c_string_lossy(raw.org_table),
        db: c_string_lossy(raw.db),
        catalog: c_string_lossy(raw.catalog),
        length: u64::from(raw.length),
        max_length: u64::from(raw.max_length),
        flags: ColumnFlags::from_bits_retain(raw.flags),
        decimals: raw.decimals,
        charsetnr: raw.charsetnr,
        type_code: raw.type_,
    }
}

impl<'a> InnerStatement<'a> {
    pub(crate) fn prepare(connection: &'a mut InnerConnection, sql: &str) -> Result<Self> {
        // SAFETY: the connection handle is live for 'a.
        let raw = unsafe { ffi::mysql_stmt_init(connection.as_ptr()) };
        let stmt = NonNull::new(raw).ok_or_else(|| Error::Prepare(connection.last_error()))?;
        let statement = InnerStatement {
            stmt,
            _connection: PhantomData,
        };

        // SAFETY: the query pointer and length describe `sql`, which outlives the call.
        let rc = unsafe {
            ffi::mysql_stmt_prepare(stmt.as_ptr(), sql.as_ptr().cast(), sql.len() as c_ulong)
        };
        if rc != 0 {
            return Err(Error::Prepare(statement.last_error()));
        }
        Ok(statement)
    }

    fn last_error(&self) -> ClientError {
        // SAFETY: the statement handle stays valid until drop.
        let (code, message) = unsafe {
            (
                ffi::mysql_stmt_errno(self.stmt.as_ptr()),
                ffi::mysql_stmt_error(self.stmt.as_ptr()),
            )
        };
        let err = ClientError::new(code, c_string_lossy(message));
        debug!(code, message = err.error_message(), "Statement error");
        err
    }
}

impl Drop for InnerStatement<'_> {
    fn drop(&mut self) {
        // SAFETY: the handle came from mysql_stmt_init and is closed exactly once, here.
        unsafe { ffi::mysql_stmt_close(self.stmt.as_ptr()) };
    }
}

impl NativeStatement for InnerStatement<'_> {
    fn param_count(&self) -> usize {
        // SAFETY: prepared statement handle.
        unsafe { ffi::mysql_stmt_param_count(self.stmt.as_ptr()) as usize }
    }

    fn execute(&mut self, params: &mut Binder) -> Result<()> {
        if !params.is_empty() {
            let mut binds = raw_binds(params);
            // SAFETY: `binds` points into `params`, which outlives the execute call below.
            if unsafe { ffi::mysql_stmt_bind_param(self.stmt.as_ptr(), binds.as_mut_ptr()) } {
                return Err(Error::BindParams(self.last_error()));
            }
        }

        // SAFETY: prepared statement handle; bound parameters are still alive.
        if unsafe { ffi::mysql_stmt_execute(self.stmt.as_ptr()) } != 0 {
            return Err(Error::Execute(self.last_error()));
        }
        Ok(())
    }

    fn field_count(&self) -> usize {
        // SAFETY: prepared statement handle.
        unsafe { ffi::mysql_stmt_field_count(self.stmt.as_ptr()) as usize }
    }

    fn result_metadata(&mut self) -> Result<Vec<Field>> {
        // SAFETY: executed statement handle.
        let raw = unsafe { ffi::mysql_stmt_result_metadata(self.stmt.as_ptr()) };
        let metadata = ResultMetadata(
            NonNull::new(raw).ok_or_else(|| Error::Metadata(self.last_error()))?,
        );

        // SAFETY: the field array holds `count` entries and lives as long as `metadata`.
        let fields: &[ffi::MYSQL_FIELD] = unsafe {
            let count = ffi::mysql_num_fields(metadata.0.as_ptr()) as usize;
            let first = ffi::mysql_fetch_fields(metadata.0.as_ptr());
            if first.is_null() {
                &[]
            } else {
                std::slice::from_raw_parts(first, count)
            }
        };
        Ok(fields.iter().map(field_from_raw).collect())
    }

    fn store_result(&mut self) -> Result<u64> {
        // SAFETY: executed statement handle.
        if unsafe { ffi::mysql_stmt_store_result(self.stmt.as_ptr()) } != 0 {
            return Err(Error::Fetch(self.last_error()));
        }
        // SAFETY: as above; the result is buffered now.
        Ok(unsafe { ffi::mysql_stmt_num_rows(self.stmt.as_ptr()) })
    }

    fn fetch(&mut self, binder: &mut Binder) -> Result<FetchStatus> {
        let mut binds = raw_binds(binder);
        // SAFETY: `binds` points into `binder`, which is exclusively borrowed for the whole fetch.
        if unsafe { ffi::mysql_stmt_bind_result(self.stmt.as_ptr(), binds.as_mut_ptr()) } {
            return Err(Error::Fetch(self.last_error()));
        }

        // SAFETY: as above.
        match unsafe { ffi::mysql_stmt_fetch(self.stmt.as_ptr()) } {
            0 => Ok(FetchStatus::Row),
            ffi::MYSQL_DATA_TRUNCATED => Ok(FetchStatus::Truncated),
            ffi::MYSQL_NO_DATA => Ok(FetchStatus::NoData),
            _ => Err(Error::Fetch(self.last_error())),
        }
    }
}
