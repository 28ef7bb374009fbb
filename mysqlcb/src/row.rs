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
use crate::common::mysql_options::ColumnFlags;
use crate::driver::Field;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

#[doc(hidden)]
use std::fmt;

/// One column of the row currently held by a [Binder](crate::Binder).
///
/// All accessors read straight out of the bound scratch buffer; nothing is converted until asked for.
/// Typed accessors return [None] for NULL values and for columns of an incompatible kind.
#[derive(Debug, Clone, Copy)]
pub struct Column<'a> {
    index: usize,
    field: Option<&'a Field>,
    bind: &'a BindDescriptor,
    data: &'a BindData,
}

impl<'a> Column<'a> {
    pub(crate) fn new(
        index: usize,
        field: Option<&'a Field>,
        bind: &'a BindDescriptor,
        data: &'a BindData,
    ) -> Column<'a> {
        Column {
            index,
            field,
            bind,
            data,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// The column name, empty for parameters.
    pub fn name(&self) -> &'a str {
        self.field.map_or("", |field| field.name.as_str())
    }

    pub fn field(&self) -> Option<&'a Field> {
        self.field
    }

    pub fn bind(&self) -> &'a BindDescriptor {
        self.bind
    }

    pub fn bind_data(&self) -> &'a BindData {
        self.data
    }

    /// SQL name of the column's type, e.g. `"int unsigned"`.
    pub fn type_name(&self) -> &'static str {
        self.data.bdtype().map_or("null", |bdtype| bdtype.type_name())
    }

    pub fn flags(&self) -> ColumnFlags {
        self.field.map(|field| field.flags).unwrap_or_default()
    }

    pub fn is_null(&self) -> bool {
        self.data.is_null()
    }

    pub fn is_truncated(&self) -> bool {
        self.data.is_truncated()
    }

    pub fn len_data(&self) -> usize {
        self.data.len_data()
    }

    /// Bytes needed by [copy_into](Column::copy_into).
    pub fn size(&self) -> usize {
        self.data.get_size()
    }

    /// Copies the raw value into `buf`, terminating variable-length values with a `0` byte when there
    /// is room. Returns the number of value bytes written.
    pub fn copy_into(&self, buf: &mut [u8]) -> usize {
        self.data.set_with_value(buf)
    }

    /// The raw value, in a buffer of exactly [size](Column::size) bytes plus a terminator.
    pub fn copy_to_vec(&self) -> Vec<u8> {
        let mut buf = vec![0u8; self.size() + 1];
        let n = self.copy_into(&mut buf);
        buf.truncate(n);
        buf
    }

    /// The value as text, [None] when NULL.
    pub fn render(&self) -> Option<String> {
        let bdtype = self.data.bdtype()?;
        (!self.is_null()).then(|| bdtype.render(self.data))
    }

    /// Length in bytes of the value's text, `0` when NULL. Text kinds count their raw bytes, which
    /// may differ from [render](Column::render)'s output for non-UTF-8 values.
    pub fn text_length(&self) -> usize {
        match self.data.bdtype() {
            Some(bdtype) if !self.is_null() => bdtype.text_length(self.data),
            _ => 0,
        }
    }

    /// The raw bytes held for this value: the native representation of fixed-width kinds, the
    /// (possibly truncated) value of variable-length ones.
    pub fn as_bytes(&self) -> Option<&'a [u8]> {
        if self.is_null() {
            return None;
        }
        let bdtype = self.data.bdtype()?;
        match bdtype.fixed_width() {
            Some(width) => self.data.data().get(..width),
            None => Some(self.data.value_bytes()),
        }
    }

    /// The value of a text column, [None] if NULL, not text or not valid UTF-8.
    pub fn as_str(&self) -> Option<&'a str> {
        let bdtype = self.data.bdtype()?;
        if !bdtype.is_variable_length() || self.is_null() {
            return None;
        }
        std::str::from_utf8(self.data.value_bytes()).ok()
    }

    pub fn as_i64(&self) -> Option<i64> {
        self.integer().and_then(|v| i64::try_from(v).ok())
    }

    pub fn as_u64(&self) -> Option<u64> {
        self.integer().and_then(|v| u64::try_from(v).ok())
    }

    pub fn as_f64(&self) -> Option<f64> {
        if self.is_null() {
            return None;
        }
        self.data.bdtype()?.float_value(self.data)
    }

    pub fn as_naive_date(&self) -> Option<NaiveDate> {
        self.time()?.to_naive_date()
    }

    pub fn as_naive_time(&self) -> Option<NaiveTime> {
        self.time()?.to_naive_time()
    }

    pub fn as_naive_datetime(&self) -> Option<NaiveDateTime> {
        self.time()?.to_naive_datetime()
    }

    fn integer(&self) -> Option<i128> {
        if self.is_null() {
            return None;
        }
        self.data.bdtype()?.integer_value(self.data)
    }

    fn time(&self) -> Option<crate::types::MysqlTime> {
        if self.is_null() {
            return None;
        }
        self.data.bdtype()?.time_value(self.data)
    }
}

impl fmt::Display for Column<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self.data, f)
    }
}

#[cfg(test)]
mod row_tests {
    use super::*;
    use crate::types::{MysqlTime, TypeDescriptor};

    fn slot(bdtype: TypeDescriptor, bytes: &[u8], buffer_length: usize) -> (BindDescriptor, BindData) {
        let mut data = BindData::new(Some(bdtype.instance()), buffer_length);
        let n = bytes.len().min(buffer_length);
        data.buffer_mut()[..n].copy_from_slice(&bytes[..n]);
        data.set_fetched(bytes.len(), false, bytes.len() > buffer_length);
        let bind = BindDescriptor {
            buffer_type: bdtype.buffer_type(),
            is_unsigned: bdtype.is_unsigned(),
            buffer_length,
        };
        (bind, data)
    }

    #[test]
    fn integer_accessors() {
        let (bind, data) = slot(TypeDescriptor::Int16, &(-7i16).to_ne_bytes(), 2);
        let column = Column::new(0, None, &bind, &data);
        assert_eq!(column.as_i64(), Some(-7));
        assert_eq!(column.as_u64(), None);
        assert_eq!(column.as_f64(), Some(-7.0));
        assert_eq!(column.as_str(), None);
        assert_eq!(column.render().as_deref(), Some("-7"));
        assert_eq!(column.type_name(), "smallint");

        let (bind, data) = slot(TypeDescriptor::UInt64, &u64::MAX.to_ne_bytes(), 8);
        let column = Column::new(0, None, &bind, &data);
        assert_eq!(column.as_u64(), Some(u64::MAX));
        assert_eq!(column.as_i64(), None);
    }

    #[test]
    fn text_accessors() {
        let (bind, data) = slot(TypeDescriptor::VarString, b"caf\xc3\xa9", 16);
        let field = Field::new("dish", crate::ColumnType::MYSQL_TYPE_VAR_STRING)
            .with_flags(ColumnFlags::NOT_NULL);
        let column = Column::new(3, Some(&field), &bind, &data);
        assert_eq!(column.name(), "dish");
        assert_eq!(column.index(), 3);
        assert_eq!(column.as_str(), Some("café"));
        assert_eq!(column.size(), 5);
        assert_eq!(column.copy_to_vec(), b"caf\xc3\xa9".to_vec());
        assert_eq!(column.text_length(), 5);
        assert_eq!(column.flags().attribute_names().collect::<Vec<_>>(), vec!["not_null"]);
        assert_eq!(column.to_string(), "café");
    }

    #[test]
    fn truncated_text_is_partial() {
        let (bind, data) = slot(TypeDescriptor::Blob, b"0123456789", 4);
        let column = Column::new(0, None, &bind, &data);
        assert_eq!(column.len_data(), 10);
        assert_eq!(column.as_bytes(), Some(&b"0123"[..]));
        assert_eq!(column.copy_to_vec(), b"0123".to_vec());
    }

    #[test]
    fn null_values() {
        let (bind, mut data) = slot(TypeDescriptor::Int32, &5i32.to_ne_bytes(), 4);
        data.set_fetched(0, true, false);
        let column = Column::new(0, None, &bind, &data);
        assert!(column.is_null());
        assert_eq!(column.render(), None);
        assert_eq!(column.as_i64(), None);
        assert_eq!(column.as_bytes(), None);
        assert_eq!(column.text_length(), 0);
        assert_eq!(column.to_string(), "NULL");
    }

    #[test]
    fn temporal_accessors() {
        let stamp = NaiveDate::from_ymd_opt(2024, 3, 7)
            .unwrap()
            .and_hms_opt(8, 30, 0)
            .unwrap();
        let bytes = MysqlTime::from(stamp).to_bytes();
        let (bind, data) = slot(TypeDescriptor::DateTime, &bytes, MysqlTime::SIZE);
        let column = Column::new(0, None, &bind, &data);
        assert_eq!(column.as_naive_datetime(), Some(stamp));
        assert_eq!(column.as_naive_date(), NaiveDate::from_ymd_opt(2024, 3, 7));
        assert_eq!(column.as_naive_time(), NaiveTime::from_hms_opt(8, 30, 0));
        assert_eq!(column.render().as_deref(), Some("2024-03-07 08:30:00"));
        assert_eq!(column.as_i64(), None);
    }
}
