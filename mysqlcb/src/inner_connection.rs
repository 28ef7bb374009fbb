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

use crate::driver::{Driver, NativeConnection};
use crate::inner_statement::InnerStatement;
use crate::mysql_error::{ClientError, CR_OUT_OF_MEMORY};
use crate::opts::ConnectOpts;
use crate::{Error, Result};
use mysqlcb_sys as ffi;
use tracing::debug;

#[doc(hidden)]
use lazy_static::lazy_static;
#[doc(hidden)]
use parking_lot::Mutex;
#[doc(hidden)]
use std::{
    ffi::{c_uint, CStr, CString},
    ptr::{self, NonNull},
};

lazy_static! {
    // mysql_init and mysql_close touch library-global state.
    static ref connect_disconnect_mtx: Mutex<()> = Mutex::new(());
}

/// Opens connections through libmysqlclient.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeDriver;

impl Driver for NativeDriver {
    type Connection = InnerConnection;

    fn connect(&self, opts: &ConnectOpts) -> Result<InnerConnection> {
        InnerConnection::open(opts)
    }
}

/// Owns a `MYSQL` handle. The handle is closed on drop.
pub struct InnerConnection {
    mysql: NonNull<ffi::MYSQL>,
}

// The handle is only ever used through `&mut self` or from the owning thread.
unsafe impl Send for InnerConnection {}

fn to_cstring(value: Option<&str>) -> Result<Option<CString>> {
    Ok(value.map(CString::new).transpose()?)
}

fn as_ptr(value: &Option<CString>) -> *const std::ffi::c_char {
    value.as_ref().map_or(ptr::null(), |v| v.as_ptr())
}

/// Copies a possibly-null C string.
pub(crate) fn c_string_lossy(ptr: *const std::ffi::c_char) -> String {
    if ptr.is_null() {
        return String::new();
    }
    // SAFETY: non-null strings handed out by the client library are NUL-terminated.
    unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned()
}

impl InnerConnection {
    /// Connects with `opts`, reading the default option file and group first.
    pub fn open(opts: &ConnectOpts) -> Result<InnerConnection> {
        let host = to_cstring(opts.host.as_deref())?;
        let user = to_cstring(opts.user.as_deref())?;
        let password = to_cstring(opts.password.as_deref())?;
        let db = to_cstring(opts.db.as_deref())?;
        let socket = to_cstring(opts.socket.as_deref())?;
        let default_file = to_cstring(opts.expanded_default_file().as_deref())?;
        let default_group = to_cstring(opts.default_group.as_deref())?;

        let connection = {
            let _lck = connect_disconnect_mtx.lock();
            // SAFETY: a null argument asks the library to allocate the handle.
            let raw = unsafe { ffi::mysql_init(ptr::null_mut()) };
            let mysql = NonNull::new(raw).ok_or_else(|| {
                Error::Connect(ClientError::new(
                    CR_OUT_OF_MEMORY,
                    "Failed to initialize MySQL: insufficient memory?",
                ))
            })?;
            InnerConnection { mysql }
        };

        // SAFETY: the handle is initialized and the option strings outlive the calls.
        unsafe {
            if let Some(file) = &default_file {
                ffi::mysql_options(
                    connection.mysql.as_ptr(),
                    ffi::MYSQL_READ_DEFAULT_FILE,
                    file.as_ptr().cast(),
                );
            }
            if let Some(group) = &default_group {
                ffi::mysql_options(
                    connection.mysql.as_ptr(),
                    ffi::MYSQL_READ_DEFAULT_GROUP,
                    group.as_ptr().cast(),
                );
            }
        }

        // SAFETY: as above; every pointer is either null or a live NUL-terminated string.
        let handle = unsafe {
            ffi::mysql_real_connect(
                connection.mysql.as_ptr(),
                as_ptr(&host),
                as_ptr(&user),
                as_ptr(&password),
                as_ptr(&db),
                c_uint::from(opts.port),
                as_ptr(&socket),
                0,
            )
        };
        if handle.is_null() {
            let err = connection.last_error();
            debug!(code = err.error_code(), message = err.error_message(), "Connect failed");
            return Err(Error::Connect(err));
        }

        debug!(host = ?opts.host, db = ?opts.db, "Connected");
        Ok(connection)
    }

    pub(crate) fn as_ptr(&self) -> *mut ffi::MYSQL {
        self.mysql.as_ptr()
    }

    pub(crate) fn last_error(&self) -> ClientError {
        // SAFETY: the handle stays valid until drop.
        let (code, message) = unsafe {
            (
                ffi::mysql_errno(self.mysql.as_ptr()),
                ffi::mysql_error(self.mysql.as_ptr()),
            )
        };
        ClientError::new(code, c_string_lossy(message))
    }
}

impl Drop for InnerConnection {
    fn drop(&mut self) {
        let _lck = connect_disconnect_mtx.lock();
        // SAFETY: the handle came from mysql_init and is closed exactly once, here.
        unsafe { ffi::mysql_close(self.mysql.as_ptr()) };
    }
}

impl NativeConnection for InnerConnection {
    type Statement<'a> = InnerStatement<'a>;

    fn prepare(&mut self, sql: &str) -> Result<InnerStatement<'_>> {
        InnerStatement::prepare(self, sql)
    }
}
