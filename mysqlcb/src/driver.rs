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

//! The seam between the binding protocols and a client library.
//!
//! [Driver] opens connections, [NativeConnection] prepares statements and [NativeStatement] is a single
//! prepared statement. The `native` feature provides an implementation on top of libmysqlclient;
//! `testing::MemoryDriver` is a scripted in-memory one.

use crate::binder::Binder;
use crate::common::mysql_options::{ColumnFlags, ColumnType};
use crate::opts::ConnectOpts;
use crate::Result;

/// Column metadata, copied out of the statement's result metadata.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Field {
    pub name: String,
    pub org_name: String,
    pub table: String,
    pub org_table: String,
    pub db: String,
    pub catalog: String,
    /// Declared width of the column in bytes.
    pub length: u64,
    pub max_length: u64,
    pub flags: ColumnFlags,
    pub decimals: u32,
    pub charsetnr: u32,
    /// The raw `enum_field_types` code.
    pub type_code: u32,
}

impl Field {
    /// A field with only a name and a wire type, as handy for scripted drivers.
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Field {
        Field {
            name: name.into(),
            type_code: column_type.code(),
            ..Field::default()
        }
    }

    pub fn with_length(mut self, length: u64) -> Field {
        self.length = length;
        self
    }

    pub fn with_flags(mut self, flags: ColumnFlags) -> Field {
        self.flags = flags;
        self
    }

    pub fn with_table(mut self, table: impl Into<String>) -> Field {
        self.table = table.into();
        self
    }

    /// The reported wire type, [None] if the code is unknown.
    pub fn column_type(&self) -> Option<ColumnType> {
        ColumnType::from_code(self.type_code)
    }

    /// The type used to pick a descriptor. Enum and set columns arrive as strings carrying a flag.
    pub fn effective_type(&self) -> Option<ColumnType> {
        match self.column_type()? {
            ColumnType::MYSQL_TYPE_STRING if self.flags.contains(ColumnFlags::ENUM) => {
                Some(ColumnType::MYSQL_TYPE_ENUM)
            }
            ColumnType::MYSQL_TYPE_STRING if self.flags.contains(ColumnFlags::SET) => {
                Some(ColumnType::MYSQL_TYPE_SET)
            }
            other => Some(other),
        }
    }

    pub fn is_unsigned(&self) -> bool {
        self.flags.contains(ColumnFlags::UNSIGNED)
    }
}

/// Outcome of one fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStatus {
    /// A row was written into the binder.
    Row,
    /// A row was written, but at least one value did not fit its buffer.
    Truncated,
    /// The result set is exhausted.
    NoData,
}

pub trait Driver {
    type Connection: NativeConnection;

    /// Opens a connection. Failures are reported as [Error::Connect](crate::Error::Connect).
    fn connect(&self, opts: &ConnectOpts) -> Result<Self::Connection>;
}

/// An open connection. Dropping it closes the connection.
pub trait NativeConnection {
    type Statement<'a>: NativeStatement
    where
        Self: 'a;

    /// Prepares `sql`. Failures are reported as [Error::Prepare](crate::Error::Prepare).
    fn prepare(&mut self, sql: &str) -> Result<Self::Statement<'_>>;
}

/// A prepared statement. Dropping it releases the statement handle.
pub trait NativeStatement {
    /// Number of placeholders in the prepared SQL.
    fn param_count(&self) -> usize;

    /// Binds `params` (unless empty) and executes. The parameter buffers only need to live for the
    /// duration of the call.
    fn execute(&mut self, params: &mut Binder) -> Result<()>;

    /// Number of result columns, `0` for statements without a result set.
    fn field_count(&self) -> usize;

    fn result_metadata(&mut self) -> Result<Vec<Field>>;

    /// Buffers the whole result set client-side and returns its row count.
    fn store_result(&mut self) -> Result<u64>;

    /// Fetches the next row into the entries of `binder`.
    fn fetch(&mut self, binder: &mut Binder) -> Result<FetchStatus>;
}

#[cfg(test)]
mod driver_tests {
    use super::*;

    #[test]
    fn effective_type_of_enum_and_set() {
        let plain = Field::new("name", ColumnType::MYSQL_TYPE_STRING);
        assert_eq!(plain.effective_type(), Some(ColumnType::MYSQL_TYPE_STRING));

        let color = plain.clone().with_flags(ColumnFlags::ENUM);
        assert_eq!(color.effective_type(), Some(ColumnType::MYSQL_TYPE_ENUM));

        let tags = plain.with_flags(ColumnFlags::SET | ColumnFlags::NOT_NULL);
        assert_eq!(tags.effective_type(), Some(ColumnType::MYSQL_TYPE_SET));
    }

    #[test]
    fn unknown_type_code() {
        let field = Field {
            type_code: 0x99,
            ..Field::default()
        };
        assert_eq!(field.column_type(), None);
        assert!(!field.is_unsigned());
    }
}
