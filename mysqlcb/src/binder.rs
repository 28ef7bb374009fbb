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

use crate::bind_data::{BindData, BindDescriptor};
use crate::driver::{FetchStatus, Field};
use crate::opts::BindOptions;
use crate::row::Column;
use crate::types::resolve;
use crate::{Error, Result};
use tracing::{debug, warn};

#[doc(hidden)]
use std::ffi::c_ulong;

/// Upper bound on the scratch buffer of a single result column.
pub const MAX_BIND_BUFFER: usize = 1024;

/// A set of bindings: one [BindDescriptor] and one [BindData] per result column or parameter.
///
/// Result binders also carry the column metadata. A binder is built for one statement execution and
/// dropped when the push or pull call that built it returns; between fetches the entries are
/// overwritten in place.
#[derive(Debug, Default)]
pub struct Binder {
    pub(crate) fields: Vec<Field>,
    pub(crate) binds: Vec<BindDescriptor>,
    pub(crate) bind_data: Vec<BindData>,
}

impl Binder {
    pub(crate) fn with_capacity(capacity: usize) -> Binder {
        Binder {
            fields: Vec::with_capacity(capacity),
            binds: Vec::with_capacity(capacity),
            bind_data: Vec::with_capacity(capacity),
        }
    }

    pub(crate) fn push(&mut self, bind: BindDescriptor, data: BindData) {
        self.binds.push(bind);
        self.bind_data.push(data);
    }

    pub fn field_count(&self) -> usize {
        self.bind_data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bind_data.is_empty()
    }

    /// Column metadata. Empty for parameter binders.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn binds(&self) -> &[BindDescriptor] {
        &self.binds
    }

    pub fn bind_data(&self) -> &[BindData] {
        &self.bind_data
    }

    /// A view of column `index` (zero-based) of the current row.
    pub fn column(&self, index: usize) -> Option<Column<'_>> {
        let bind = self.binds.get(index)?;
        let data = self.bind_data.get(index)?;
        Some(Column::new(index, self.fields.get(index), bind, data))
    }

    /// The first column called `name`, compared case-insensitively.
    pub fn column_by_name(&self, name: &str) -> Option<Column<'_>> {
        let index = self
            .fields
            .iter()
            .position(|field| field.name.eq_ignore_ascii_case(name))?;
        self.column(index)
    }

    pub fn columns(&self) -> impl Iterator<Item = Column<'_>> + '_ {
        (0..self.field_count()).filter_map(|index| self.column(index))
    }

    /// Whether any value of the current row was truncated.
    pub fn is_truncated(&self) -> bool {
        self.bind_data.iter().any(|data| data.is_truncated)
    }

    /// Descriptor and entry pairs, for driver implementations writing a fetched row.
    pub fn slots_mut(&mut self) -> impl Iterator<Item = (&BindDescriptor, &mut BindData)> {
        self.binds.iter().zip(self.bind_data.iter_mut())
    }

    /// Updates the truncation marks after a fetch and logs every truncated column.
    pub(crate) fn record_fetch(&mut self, status: FetchStatus) {
        let truncated = status == FetchStatus::Truncated;
        for (index, data) in self.bind_data.iter_mut().enumerate() {
            data.is_truncated = truncated && data.is_error;
            if data.is_truncated {
                let column = self.fields.get(index).map_or("", |field| field.name.as_str());
                warn!(
                    column,
                    len_data = data.len_data(),
                    buffer_length = data.buffer_length(),
                    "Truncated value"
                );
            }
        }
    }
}

/// Builds the result bindings for the columns described by `fields`.
///
/// Every column gets an entry whose scratch buffer is sized by its descriptor, clamped to
/// [MAX_BIND_BUFFER]. Fails with [Error::UnsupportedColumnType] on the first column no descriptor
/// exists for.
pub fn bind_result_columns(fields: Vec<Field>, options: &BindOptions) -> Result<Binder> {
    let mut binder = Binder::with_capacity(fields.len());

    for field in &fields {
        let bdtype = field
            .effective_type()
            .and_then(|column_type| resolve(column_type, field.is_unsigned()))
            .ok_or_else(|| Error::UnsupportedColumnType {
                column: field.name.clone(),
                type_code: field.type_code,
            })?;

        let mut data = BindData::new(Some(bdtype), 0);
        data.len_data = bdtype.declared_buffer_size(field.length) as c_ulong;

        let mut size = bdtype.required_buffer_size(&data);
        if options.reserve_terminator && bdtype.is_variable_length() {
            size = size.saturating_add(1);
        }
        if size > MAX_BIND_BUFFER {
            debug!(column = %field.name, size, "Clamping bind buffer to {MAX_BIND_BUFFER} bytes");
            size = MAX_BIND_BUFFER;
        }
        data.allocate(size);

        binder.push(
            BindDescriptor {
                buffer_type: bdtype.buffer_type(),
                is_unsigned: field.is_unsigned(),
                buffer_length: size,
            },
            data,
        );
    }

    binder.fields = fields;
    Ok(binder)
}

#[cfg(test)]
mod binder_tests {
    use super::*;
    use crate::common::mysql_options::{ColumnFlags, ColumnType};
    use crate::types::{MysqlTime, TypeDescriptor};

    #[test]
    fn sizes_follow_descriptors() {
        let fields = vec![
            Field::new("id", ColumnType::MYSQL_TYPE_LONG).with_flags(ColumnFlags::UNSIGNED),
            Field::new("name", ColumnType::MYSQL_TYPE_VAR_STRING).with_length(64),
            Field::new("born", ColumnType::MYSQL_TYPE_DATE),
            Field::new("score", ColumnType::MYSQL_TYPE_DOUBLE),
        ];
        let binder = bind_result_columns(fields, &BindOptions::default()).unwrap();

        let lengths: Vec<_> = binder.binds().iter().map(|b| b.buffer_length).collect();
        assert_eq!(lengths, vec![4, 64, MysqlTime::SIZE, 8]);
        assert!(binder.binds()[0].is_unsigned);
        assert_eq!(binder.binds()[1].buffer_type, ColumnType::MYSQL_TYPE_VAR_STRING);
        assert_eq!(
            binder.bind_data()[0].bdtype(),
            Some(TypeDescriptor::UInt32.instance())
        );
        for (bind, data) in binder.binds().iter().zip(binder.bind_data()) {
            assert_eq!(bind.buffer_length, data.buffer_length());
        }
    }

    #[test]
    fn oversized_columns_are_clamped() {
        let fields = vec![
            Field::new("body", ColumnType::MYSQL_TYPE_BLOB).with_length(65535),
            Field::new("doc", ColumnType::MYSQL_TYPE_LONG_BLOB).with_length(u64::from(u32::MAX)),
            Field::new("exact", ColumnType::MYSQL_TYPE_STRING).with_length(1024),
        ];
        let binder = bind_result_columns(fields, &BindOptions::default()).unwrap();
        for data in binder.bind_data() {
            assert_eq!(data.buffer_length(), MAX_BIND_BUFFER);
            assert_eq!(data.data().len(), MAX_BIND_BUFFER);
        }
    }

    #[test]
    fn terminator_reservation() {
        let fields = vec![
            Field::new("code", ColumnType::MYSQL_TYPE_STRING).with_length(3),
            Field::new("n", ColumnType::MYSQL_TYPE_TINY),
            Field::new("big", ColumnType::MYSQL_TYPE_STRING).with_length(1024),
        ];
        let options = BindOptions {
            reserve_terminator: true,
        };
        let binder = bind_result_columns(fields, &options).unwrap();
        let lengths: Vec<_> = binder.binds().iter().map(|b| b.buffer_length).collect();
        assert_eq!(lengths, vec![4, 1, MAX_BIND_BUFFER]);
    }

    #[test]
    fn unsupported_column_names_the_column() {
        let fields = vec![
            Field::new("id", ColumnType::MYSQL_TYPE_LONG),
            Field::new("location", ColumnType::MYSQL_TYPE_GEOMETRY),
        ];
        let err = bind_result_columns(fields, &BindOptions::default()).unwrap_err();
        assert!(matches!(
            &err,
            Error::UnsupportedColumnType { column, type_code: 255 } if column == "location"
        ));
        assert!(err.to_string().contains("location"));
    }

    #[test]
    fn enum_columns_fetch_as_strings() {
        let fields = vec![Field::new("size", ColumnType::MYSQL_TYPE_STRING)
            .with_flags(ColumnFlags::ENUM)
            .with_length(8)];
        let binder = bind_result_columns(fields, &BindOptions::default()).unwrap();
        assert_eq!(
            binder.bind_data()[0].bdtype(),
            Some(TypeDescriptor::Enum.instance())
        );
        assert_eq!(binder.binds()[0].buffer_type, ColumnType::MYSQL_TYPE_STRING);
    }

    #[test]
    fn truncation_marks_follow_error_flags() {
        let fields = vec![
            Field::new("a", ColumnType::MYSQL_TYPE_VAR_STRING).with_length(2),
            Field::new("b", ColumnType::MYSQL_TYPE_VAR_STRING).with_length(8),
        ];
        let mut binder = bind_result_columns(fields, &BindOptions::default()).unwrap();
        binder.bind_data[0].set_fetched(5, false, true);
        binder.bind_data[1].set_fetched(3, false, false);

        binder.record_fetch(FetchStatus::Truncated);
        assert!(binder.bind_data()[0].is_truncated());
        assert!(!binder.bind_data()[1].is_truncated());
        assert!(binder.is_truncated());

        binder.record_fetch(FetchStatus::Row);
        assert!(!binder.is_truncated());
    }

    #[test]
    fn columns_by_name() {
        let fields = vec![
            Field::new("Id", ColumnType::MYSQL_TYPE_LONG),
            Field::new("Name", ColumnType::MYSQL_TYPE_VAR_STRING).with_length(10),
        ];
        let binder = bind_result_columns(fields, &BindOptions::default()).unwrap();
        assert_eq!(binder.column_by_name("name").map(|c| c.index()), Some(1));
        assert!(binder.column_by_name("missing").is_none());
        assert_eq!(binder.columns().count(), 2);
        assert!(binder.column(2).is_none());
    }
}
