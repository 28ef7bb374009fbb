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

/// Defines the wire-level enums and options shared by the binding layer.
pub mod mysql_options {
    use bitflags::bitflags;

    /// Column types as reported by the server (`enum_field_types`).
    #[allow(non_camel_case_types)]
    #[repr(u8)]
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub enum ColumnType {
        MYSQL_TYPE_DECIMAL = 0x00,
        MYSQL_TYPE_TINY = 0x01,
        MYSQL_TYPE_SHORT = 0x02,
        MYSQL_TYPE_LONG = 0x03,
        MYSQL_TYPE_FLOAT = 0x04,
        MYSQL_TYPE_DOUBLE = 0x05,
        MYSQL_TYPE_NULL = 0x06,
        MYSQL_TYPE_TIMESTAMP = 0x07,
        MYSQL_TYPE_LONGLONG = 0x08,
        MYSQL_TYPE_INT24 = 0x09,
        MYSQL_TYPE_DATE = 0x0a,
        MYSQL_TYPE_TIME = 0x0b,
        MYSQL_TYPE_DATETIME = 0x0c,
        MYSQL_TYPE_YEAR = 0x0d,
        MYSQL_TYPE_NEWDATE = 0x0e,
        MYSQL_TYPE_VARCHAR = 0x0f,
        MYSQL_TYPE_BIT = 0x10,
        MYSQL_TYPE_TIMESTAMP2 = 0x11,
        MYSQL_TYPE_DATETIME2 = 0x12,
        MYSQL_TYPE_TIME2 = 0x13,
        MYSQL_TYPE_TYPED_ARRAY = 0x14,
        MYSQL_TYPE_JSON = 0xf5,
        MYSQL_TYPE_NEWDECIMAL = 0xf6,
        MYSQL_TYPE_ENUM = 0xf7,
        MYSQL_TYPE_SET = 0xf8,
        MYSQL_TYPE_TINY_BLOB = 0xf9,
        MYSQL_TYPE_MEDIUM_BLOB = 0xfa,
        MYSQL_TYPE_LONG_BLOB = 0xfb,
        MYSQL_TYPE_BLOB = 0xfc,
        MYSQL_TYPE_VAR_STRING = 0xfd,
        MYSQL_TYPE_STRING = 0xfe,
        MYSQL_TYPE_GEOMETRY = 0xff,
    }

    impl ColumnType {
        /// Maps the numeric code reported by the client library. Codes this crate has never heard
        /// of give [None].
        pub fn from_code(value: u32) -> Option<Self> {
            match value {
                0x00 => Some(Self::MYSQL_TYPE_DECIMAL),
                0x01 => Some(Self::MYSQL_TYPE_TINY),
                0x02 => Some(Self::MYSQL_TYPE_SHORT),
                0x03 => Some(Self::MYSQL_TYPE_LONG),
                0x04 => Some(Self::MYSQL_TYPE_FLOAT),
                0x05 => Some(Self::MYSQL_TYPE_DOUBLE),
                0x06 => Some(Self::MYSQL_TYPE_NULL),
                0x07 => Some(Self::MYSQL_TYPE_TIMESTAMP),
                0x08 => Some(Self::MYSQL_TYPE_LONGLONG),
                0x09 => Some(Self::MYSQL_TYPE_INT24),
                0x0a => Some(Self::MYSQL_TYPE_DATE),
                0x0b => Some(Self::MYSQL_TYPE_TIME),
                0x0c => Some(Self::MYSQL_TYPE_DATETIME),
                0x0d => Some(Self::MYSQL_TYPE_YEAR),
                0x0e => Some(Self::MYSQL_TYPE_NEWDATE),
                0x0f => Some(Self::MYSQL_TYPE_VARCHAR),
                0x10 => Some(Self::MYSQL_TYPE_BIT),
                0x11 => Some(Self::MYSQL_TYPE_TIMESTAMP2),
                0x12 => Some(Self::MYSQL_TYPE_DATETIME2),
                0x13 => Some(Self::MYSQL_TYPE_TIME2),
                0x14 => Some(Self::MYSQL_TYPE_TYPED_ARRAY),
                0xf5 => Some(Self::MYSQL_TYPE_JSON),
                0xf6 => Some(Self::MYSQL_TYPE_NEWDECIMAL),
                0xf7 => Some(Self::MYSQL_TYPE_ENUM),
                0xf8 => Some(Self::MYSQL_TYPE_SET),
                0xf9 => Some(Self::MYSQL_TYPE_TINY_BLOB),
                0xfa => Some(Self::MYSQL_TYPE_MEDIUM_BLOB),
                0xfb => Some(Self::MYSQL_TYPE_LONG_BLOB),
                0xfc => Some(Self::MYSQL_TYPE_BLOB),
                0xfd => Some(Self::MYSQL_TYPE_VAR_STRING),
                0xfe => Some(Self::MYSQL_TYPE_STRING),
                0xff => Some(Self::MYSQL_TYPE_GEOMETRY),
                _ => None,
            }
        }

        /// The numeric code handed to the client library.
        pub fn code(self) -> u32 {
            self as u8 as u32
        }
    }

    bitflags! {
        /// Column definition flags (`MYSQL_FIELD::flags`).
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub struct ColumnFlags: u32 {
            const NOT_NULL = 0x0001;
            const PRI_KEY = 0x0002;
            const UNIQUE_KEY = 0x0004;
            const MULTIPLE_KEY = 0x0008;
            const BLOB = 0x0010;
            const UNSIGNED = 0x0020;
            const ZEROFILL = 0x0040;
            const BINARY = 0x0080;
            const ENUM = 0x0100;
            const AUTO_INCREMENT = 0x0200;
            const TIMESTAMP = 0x0400;
            const SET = 0x0800;
            const NO_DEFAULT_VALUE = 0x1000;
            const ON_UPDATE_NOW = 0x2000;
            const NUM = 0x8000;
        }
    }

    const ATTRIBUTE_NAMES: [(ColumnFlags, &str); 12] = [
        (ColumnFlags::NOT_NULL, "not_null"),
        (ColumnFlags::PRI_KEY, "primary_key"),
        (ColumnFlags::UNIQUE_KEY, "unique_key"),
        (ColumnFlags::MULTIPLE_KEY, "multiple_key"),
        (ColumnFlags::BLOB, "blob"),
        (ColumnFlags::UNSIGNED, "unsigned"),
        (ColumnFlags::ZEROFILL, "zero_fill"),
        (ColumnFlags::BINARY, "binary"),
        (ColumnFlags::ENUM, "enum"),
        (ColumnFlags::AUTO_INCREMENT, "auto_increment"),
        (ColumnFlags::TIMESTAMP, "timestamp"),
        (ColumnFlags::SET, "set"),
    ];

    impl ColumnFlags {
        /// Names of the set flags, in the order a schema description lists them.
        /// Flags without a schema meaning (e.g. `NUM`) are skipped.
        pub fn attribute_names(self) -> impl Iterator<Item = &'static str> {
            ATTRIBUTE_NAMES
                .into_iter()
                .filter(move |(flag, _)| self.contains(*flag))
                .map(|(_, name)| name)
        }
    }

    impl Default for ColumnFlags {
        fn default() -> Self {
            ColumnFlags::empty()
        }
    }

    /// How far [advance](crate::PullPack::advance) moves a pull handle.
    #[derive(Debug, PartialEq, Eq, Clone, Copy)]
    pub enum Advance {
        /// Fetch exactly one row.
        Step,
        /// Fetch until the result set is exhausted, ignoring the intermediate rows.
        Drain,
    }
}
