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

use crate::bind_data::BindData;
use crate::common::mysql_options::ColumnType;
use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use lazy_static::lazy_static;

#[doc(hidden)]
use std::{
    collections::HashMap,
    ffi::{c_int, c_uint, c_ulong},
    fmt::{self, Write},
    mem::{offset_of, size_of},
};

pub const MYSQL_TIMESTAMP_DATE: c_int = 0;
pub const MYSQL_TIMESTAMP_DATETIME: c_int = 1;
pub const MYSQL_TIMESTAMP_TIME: c_int = 2;

/// Layout-compatible mirror of the client library's `MYSQL_TIME`.
///
/// Temporal columns and parameters carry one of these in their scratch buffer. The record is read and
/// written field by field at its `repr(C)` offsets, so padding bytes are never observed.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MysqlTime {
    pub year: c_uint,
    pub month: c_uint,
    pub day: c_uint,
    pub hour: c_uint,
    pub minute: c_uint,
    pub second: c_uint,
    pub second_part: c_ulong,
    pub neg: bool,
    pub time_type: c_int,
    pub time_zone_displacement: c_int,
}

macro_rules! get_field {
    ($bytes:expr, $field:ident, $ty:ty) => {{
        let at = offset_of!(MysqlTime, $field);
        let mut raw = [0u8; size_of::<$ty>()];
        raw.copy_from_slice(&$bytes[at..at + size_of::<$ty>()]);
        <$ty>::from_ne_bytes(raw)
    }};
}

macro_rules! put_field {
    ($out:expr, $field:ident, $value:expr) => {{
        let at = offset_of!(MysqlTime, $field);
        let raw = $value.to_ne_bytes();
        $out[at..at + raw.len()].copy_from_slice(&raw);
    }};
}

impl MysqlTime {
    pub const SIZE: usize = size_of::<MysqlTime>();

    /// Reads a record from the start of `bytes`. [None] if fewer than [MysqlTime::SIZE] bytes are given.
    pub fn read_from(bytes: &[u8]) -> Option<MysqlTime> {
        if bytes.len() < Self::SIZE {
            return None;
        }
        Some(MysqlTime {
            year: get_field!(bytes, year, c_uint),
            month: get_field!(bytes, month, c_uint),
            day: get_field!(bytes, day, c_uint),
            hour: get_field!(bytes, hour, c_uint),
            minute: get_field!(bytes, minute, c_uint),
            second: get_field!(bytes, second, c_uint),
            second_part: get_field!(bytes, second_part, c_ulong),
            neg: bytes[offset_of!(MysqlTime, neg)] != 0,
            time_type: get_field!(bytes, time_type, c_int),
            time_zone_displacement: get_field!(bytes, time_zone_displacement, c_int),
        })
    }

    /// The record as the client library expects to find it in a bound buffer.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = vec![0u8; Self::SIZE];
        put_field!(out, year, self.year);
        put_field!(out, month, self.month);
        put_field!(out, day, self.day);
        put_field!(out, hour, self.hour);
        put_field!(out, minute, self.minute);
        put_field!(out, second, self.second);
        put_field!(out, second_part, self.second_part);
        out[offset_of!(MysqlTime, neg)] = u8::from(self.neg);
        put_field!(out, time_type, self.time_type);
        put_field!(out, time_zone_displacement, self.time_zone_displacement);
        out
    }

    pub fn to_naive_date(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(i32::try_from(self.year).ok()?, self.month, self.day)
    }

    /// [None] for negative or out-of-day durations, which `TIME` columns can hold but chrono cannot.
    pub fn to_naive_time(&self) -> Option<NaiveTime> {
        if self.neg {
            return None;
        }
        NaiveTime::from_hms_micro_opt(
            self.hour,
            self.minute,
            self.second,
            u32::try_from(self.second_part).ok()?,
        )
    }

    pub fn to_naive_datetime(&self) -> Option<NaiveDateTime> {
        Some(self.to_naive_date()?.and_time(self.to_naive_time()?))
    }

    fn write_date<W: Write + ?Sized>(&self, out: &mut W) -> fmt::Result {
        write!(out, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }

    fn write_time<W: Write + ?Sized>(&self, out: &mut W) -> fmt::Result {
        if self.neg {
            out.write_char('-')?;
        }
        write!(out, "{:02}:{:02}:{:02}", self.hour, self.minute, self.second)
    }
}

impl From<NaiveDate> for MysqlTime {
    fn from(date: NaiveDate) -> Self {
        MysqlTime {
            year: date.year().max(0) as c_uint,
            month: date.month(),
            day: date.day(),
            time_type: MYSQL_TIMESTAMP_DATE,
            ..MysqlTime::default()
        }
    }
}

impl From<NaiveTime> for MysqlTime {
    fn from(time: NaiveTime) -> Self {
        MysqlTime {
            hour: time.hour(),
            minute: time.minute(),
            second: time.second(),
            second_part: (time.nanosecond() / 1000) as c_ulong,
            time_type: MYSQL_TIMESTAMP_TIME,
            ..MysqlTime::default()
        }
    }
}

impl From<NaiveDateTime> for MysqlTime {
    fn from(datetime: NaiveDateTime) -> Self {
        let time = MysqlTime::from(datetime.time());
        MysqlTime {
            hour: time.hour,
            minute: time.minute,
            second: time.second,
            second_part: time.second_part,
            time_type: MYSQL_TIMESTAMP_DATETIME,
            ..MysqlTime::from(datetime.date())
        }
    }
}

/// Describes how values of one column type are sized, copied and turned into text.
///
/// The set is closed: [resolve] maps a wire type onto one of the variants, and every variant lives
/// exactly once in a process-wide registry, so resolution always hands out the same
/// `&'static TypeDescriptor`.
///
/// | Variant | Wire type | Buffer |
/// |---------|-----------|--------|
/// | `Int8`/`UInt8` | `MYSQL_TYPE_TINY` | 1 byte |
/// | `Int16`/`UInt16` | `MYSQL_TYPE_SHORT` | 2 bytes |
/// | `Int24`/`UInt24` | `MYSQL_TYPE_INT24` | 4 bytes |
/// | `Int32`/`UInt32` | `MYSQL_TYPE_LONG` | 4 bytes |
/// | `Int64`/`UInt64` | `MYSQL_TYPE_LONGLONG` | 8 bytes |
/// | `Float`/`Double` | `MYSQL_TYPE_FLOAT`/`MYSQL_TYPE_DOUBLE` | 4/8 bytes |
/// | `Date`, `Time`, `DateTime`, `Timestamp` | the matching temporal type | a [MysqlTime] |
/// | `String`, `VarString`, `Blob`, `Enum`, `Set`, `Decimal` | the matching text type | the value length |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeDescriptor {
    Int8,
    UInt8,
    Int16,
    UInt16,
    Int24,
    UInt24,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Float,
    Double,
    Date,
    Time,
    DateTime,
    Timestamp,
    String,
    VarString,
    Blob,
    Enum,
    Set,
    Decimal,
}

use TypeDescriptor::*;

// Indexed by discriminant, see `TypeDescriptor::instance`.
static REGISTRY: [TypeDescriptor; 22] = [
    Int8, UInt8, Int16, UInt16, Int24, UInt24, Int32, UInt32, Int64, UInt64, Float, Double, Date,
    Time, DateTime, Timestamp, String, VarString, Blob, Enum, Set, Decimal,
];

lazy_static! {
    static ref NAME_INDEX: HashMap<&'static str, &'static TypeDescriptor> = {
        let mut index: HashMap<&'static str, &'static TypeDescriptor> =
            REGISTRY.iter().map(|bdtype| (bdtype.type_name(), bdtype)).collect();
        for (alias, bdtype) in [
            ("integer", Int32),
            ("integer unsigned", UInt32),
            ("bool", Int8),
            ("boolean", Int8),
            ("real", Double),
            ("numeric", Decimal),
            ("text", Blob),
        ] {
            index.insert(alias, bdtype.instance());
        }
        index
    };
}

/// Finds the descriptor for a column of wire type `field_type`.
///
/// Signedness only matters for the integer kinds. Wire types the client library reports under
/// several codes (`VARCHAR`, the sized blobs, `NEWDATE`) are folded onto their canonical kind
/// first. Returns [None] for kinds without a descriptor, such as geometry, JSON or bit columns.
pub fn resolve(field_type: ColumnType, is_unsigned: bool) -> Option<&'static TypeDescriptor> {
    let field_type = match field_type {
        ColumnType::MYSQL_TYPE_VARCHAR => ColumnType::MYSQL_TYPE_VAR_STRING,
        ColumnType::MYSQL_TYPE_TINY_BLOB
        | ColumnType::MYSQL_TYPE_MEDIUM_BLOB
        | ColumnType::MYSQL_TYPE_LONG_BLOB => ColumnType::MYSQL_TYPE_BLOB,
        ColumnType::MYSQL_TYPE_NEWDATE => ColumnType::MYSQL_TYPE_DATE,
        other => other,
    };
    REGISTRY.iter().find(|bdtype| {
        bdtype.field_type() == field_type && (!bdtype.is_integer() || bdtype.is_unsigned() == is_unsigned)
    })
}

/// Finds a descriptor by its SQL type name, ignoring case and extra whitespace.
///
/// # Examples
/// ```
/// # use mysqlcb::{resolve_by_name, TypeDescriptor};
/// assert_eq!(resolve_by_name("INT  Unsigned"), Some(&TypeDescriptor::UInt32));
/// assert_eq!(resolve_by_name("geometry"), None);
/// ```
pub fn resolve_by_name(name: &str) -> Option<&'static TypeDescriptor> {
    let normalized = name
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_ascii_lowercase();
    NAME_INDEX.get(normalized.as_str()).copied()
}

/// A value decoded from a slot according to its descriptor.
enum Decoded<'a> {
    Signed(i64),
    Unsigned(u64),
    Real(f64),
    Date(MysqlTime),
    Time(MysqlTime),
    DateTime(MysqlTime),
    Bytes(&'a [u8]),
}

/// Copies the first `N` bytes, zero-filling whatever `bytes` lacks.
fn ne_array<const N: usize>(bytes: &[u8]) -> [u8; N] {
    let mut raw = [0u8; N];
    let n = bytes.len().min(N);
    raw[..n].copy_from_slice(&bytes[..n]);
    raw
}

impl TypeDescriptor {
    /// The registry's instance of this variant.
    pub fn instance(self) -> &'static TypeDescriptor {
        &REGISTRY[self as usize]
    }

    /// The wire type this descriptor stands for.
    pub fn field_type(&self) -> ColumnType {
        match self {
            Int8 | UInt8 => ColumnType::MYSQL_TYPE_TINY,
            Int16 | UInt16 => ColumnType::MYSQL_TYPE_SHORT,
            Int24 | UInt24 => ColumnType::MYSQL_TYPE_INT24,
            Int32 | UInt32 => ColumnType::MYSQL_TYPE_LONG,
            Int64 | UInt64 => ColumnType::MYSQL_TYPE_LONGLONG,
            Float => ColumnType::MYSQL_TYPE_FLOAT,
            Double => ColumnType::MYSQL_TYPE_DOUBLE,
            Date => ColumnType::MYSQL_TYPE_DATE,
            Time => ColumnType::MYSQL_TYPE_TIME,
            DateTime => ColumnType::MYSQL_TYPE_DATETIME,
            Timestamp => ColumnType::MYSQL_TYPE_TIMESTAMP,
            String => ColumnType::MYSQL_TYPE_STRING,
            VarString => ColumnType::MYSQL_TYPE_VAR_STRING,
            Blob => ColumnType::MYSQL_TYPE_BLOB,
            Enum => ColumnType::MYSQL_TYPE_ENUM,
            Set => ColumnType::MYSQL_TYPE_SET,
            Decimal => ColumnType::MYSQL_TYPE_NEWDECIMAL,
        }
    }

    /// The buffer type requested from the client library. The library has no conversion for
    /// `ENUM`/`SET` buffers, so those are fetched as strings.
    pub fn buffer_type(&self) -> ColumnType {
        match self {
            Enum | Set => ColumnType::MYSQL_TYPE_STRING,
            _ => self.field_type(),
        }
    }

    pub fn is_unsigned(&self) -> bool {
        matches!(self, UInt8 | UInt16 | UInt24 | UInt32 | UInt64)
    }

    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            Int8 | UInt8 | Int16 | UInt16 | Int24 | UInt24 | Int32 | UInt32 | Int64 | UInt64
        )
    }

    pub fn is_temporal(&self) -> bool {
        matches!(self, Date | Time | DateTime | Timestamp)
    }

    /// Whether the value length varies from row to row.
    pub fn is_variable_length(&self) -> bool {
        self.fixed_width().is_none()
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Int8 => "tinyint",
            UInt8 => "tinyint unsigned",
            Int16 => "smallint",
            UInt16 => "smallint unsigned",
            Int24 => "mediumint",
            UInt24 => "mediumint unsigned",
            Int32 => "int",
            UInt32 => "int unsigned",
            Int64 => "bigint",
            UInt64 => "bigint unsigned",
            Float => "float",
            Double => "double",
            Date => "date",
            Time => "time",
            DateTime => "datetime",
            Timestamp => "timestamp",
            String => "char",
            VarString => "varchar",
            Blob => "blob",
            Enum => "enum",
            Set => "set",
            Decimal => "decimal",
        }
    }

    /// Native width of fixed-size kinds, [None] for variable-length ones.
    pub fn fixed_width(&self) -> Option<usize> {
        match self {
            Int8 | UInt8 => Some(1),
            Int16 | UInt16 => Some(2),
            Int24 | UInt24 | Int32 | UInt32 | Float => Some(4),
            Int64 | UInt64 | Double => Some(8),
            Date | Time | DateTime | Timestamp => Some(MysqlTime::SIZE),
            String | VarString | Blob | Enum | Set | Decimal => None,
        }
    }

    /// The size a slot starts out with before any row is fetched: the native width, or the
    /// column's declared length for variable-length kinds.
    pub fn declared_buffer_size(&self, declared_length: u64) -> usize {
        self.fixed_width()
            .unwrap_or_else(|| usize::try_from(declared_length).unwrap_or(usize::MAX))
    }

    /// Bytes needed to hold the value currently described by `entry`.
    pub fn required_buffer_size(&self, entry: &BindData) -> usize {
        self.fixed_width().unwrap_or_else(|| entry.len_data())
    }

    /// Copies the raw value of `entry` into `buf` and returns the number of value bytes written.
    ///
    /// Fixed-width values are copied verbatim. Variable-length values copy `len_data` bytes, bounded by
    /// what scratch holds and by `buf`, followed by a `0` byte if `buf` has room for it.
    pub fn copy_into(&self, entry: &BindData, buf: &mut [u8]) -> usize {
        let data = entry.data();
        let wanted = self.fixed_width().unwrap_or_else(|| entry.len_data());
        let n = wanted.min(data.len()).min(buf.len());
        buf[..n].copy_from_slice(&data[..n]);
        if self.is_variable_length() && n < buf.len() {
            buf[n] = 0;
        }
        n
    }

    fn decode<'a>(&self, entry: &'a BindData) -> Decoded<'a> {
        let data = entry.data();
        let time = || MysqlTime::read_from(data).unwrap_or_default();
        match self {
            Int8 => Decoded::Signed(i8::from_ne_bytes(ne_array(data)).into()),
            UInt8 => Decoded::Unsigned(u8::from_ne_bytes(ne_array(data)).into()),
            Int16 => Decoded::Signed(i16::from_ne_bytes(ne_array(data)).into()),
            UInt16 => Decoded::Unsigned(u16::from_ne_bytes(ne_array(data)).into()),
            Int24 | Int32 => Decoded::Signed(i32::from_ne_bytes(ne_array(data)).into()),
            UInt24 | UInt32 => Decoded::Unsigned(u32::from_ne_bytes(ne_array(data)).into()),
            Int64 => Decoded::Signed(i64::from_ne_bytes(ne_array(data))),
            UInt64 => Decoded::Unsigned(u64::from_ne_bytes(ne_array(data))),
            Float => Decoded::Real(f32::from_ne_bytes(ne_array(data)).into()),
            Double => Decoded::Real(f64::from_ne_bytes(ne_array(data))),
            Date => Decoded::Date(time()),
            Time => Decoded::Time(time()),
            DateTime | Timestamp => Decoded::DateTime(time()),
            String | VarString | Blob | Enum | Set | Decimal => Decoded::Bytes(entry.value_bytes()),
        }
    }

    /// Writes the text form of the value held by `entry`.
    pub fn write_text<W: Write + ?Sized>(&self, entry: &BindData, out: &mut W) -> fmt::Result {
        match self.decode(entry) {
            Decoded::Signed(v) => write!(out, "{v}"),
            Decoded::Unsigned(v) => write!(out, "{v}"),
            Decoded::Real(v) => write_general(out, v),
            Decoded::Date(t) => t.write_date(out),
            Decoded::Time(t) => t.write_time(out),
            Decoded::DateTime(t) => {
                t.write_date(out)?;
                out.write_char(' ')?;
                t.write_time(out)
            }
            Decoded::Bytes(bytes) => out.write_str(&std::string::String::from_utf8_lossy(bytes)),
        }
    }

    /// The text form as a `String`. Invalid UTF-8 in text kinds is replaced, see
    /// [render_into](TypeDescriptor::render_into) for the raw bytes.
    pub fn render(&self, entry: &BindData) -> std::string::String {
        let mut text = std::string::String::new();
        // Writing into a String cannot fail.
        let _ = self.write_text(entry, &mut text);
        text
    }

    /// Length in bytes of [render_into](TypeDescriptor::render_into)'s output, without allocating.
    /// For text kinds this is the number of value bytes held in scratch.
    pub fn text_length(&self, entry: &BindData) -> usize {
        let mut empty = [0u8; 0];
        let mut sink = SliceWriter::new(&mut empty);
        self.write_raw_text(entry, &mut sink);
        sink.needed
    }

    /// Renders into `buf`, `snprintf` style: writes what fits, terminates with a `0` byte if room
    /// remains and returns the full text length. Text kinds are copied byte for byte, whatever
    /// their encoding.
    pub fn render_into(&self, entry: &BindData, buf: &mut [u8]) -> usize {
        let mut sink = SliceWriter::new(buf);
        self.write_raw_text(entry, &mut sink);
        let (written, needed) = (sink.written, sink.needed);
        if let Some(terminator) = buf.get_mut(written) {
            *terminator = 0;
        }
        needed
    }

    fn write_raw_text(&self, entry: &BindData, sink: &mut SliceWriter<'_>) {
        match self.decode(entry) {
            Decoded::Bytes(bytes) => sink.write_bytes(bytes),
            _ => {
                let _ = self.write_text(entry, sink);
            }
        }
    }

    pub(crate) fn integer_value(&self, entry: &BindData) -> Option<i128> {
        match self.decode(entry) {
            Decoded::Signed(v) => Some(v.into()),
            Decoded::Unsigned(v) => Some(v.into()),
            _ => None,
        }
    }

    pub(crate) fn float_value(&self, entry: &BindData) -> Option<f64> {
        match self.decode(entry) {
            Decoded::Real(v) => Some(v),
            Decoded::Signed(v) => Some(v as f64),
            Decoded::Unsigned(v) => Some(v as f64),
            _ => None,
        }
    }

    pub(crate) fn time_value(&self, entry: &BindData) -> Option<MysqlTime> {
        match self.decode(entry) {
            Decoded::Date(t) | Decoded::Time(t) | Decoded::DateTime(t) => Some(t),
            _ => None,
        }
    }
}

/// `%.5g`: five significant digits, fixed or scientific notation, trailing zeros stripped.
fn write_general<W: Write + ?Sized>(out: &mut W, value: f64) -> fmt::Result {
    const PRECISION: i32 = 5;

    if value.is_nan() {
        return out.write_str("nan");
    }
    if value.is_infinite() {
        return out.write_str(if value < 0.0 { "-inf" } else { "inf" });
    }
    if value == 0.0 {
        return out.write_str(if value.is_sign_negative() { "-0" } else { "0" });
    }

    let scientific = format!("{:.*e}", (PRECISION - 1) as usize, value);
    let (mantissa, exponent) = scientific.split_once('e').unwrap_or((&scientific, "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);

    if exponent < -4 || exponent >= PRECISION {
        let sign = if exponent < 0 { '-' } else { '+' };
        write!(out, "{}e{}{:02}", trim_zeros(mantissa), sign, exponent.abs())
    } else {
        let fixed = format!("{:.*}", (PRECISION - 1 - exponent) as usize, value);
        out.write_str(trim_zeros(&fixed))
    }
}

fn trim_zeros(number: &str) -> &str {
    if number.contains('.') {
        number.trim_end_matches('0').trim_end_matches('.')
    } else {
        number
    }
}

/// Writes into a fixed buffer, counting what did not fit.
struct SliceWriter<'a> {
    buf: &'a mut [u8],
    written: usize,
    needed: usize,
}

impl<'a> SliceWriter<'a> {
    fn new(buf: &'a mut [u8]) -> Self {
        SliceWriter {
            buf,
            written: 0,
            needed: 0,
        }
    }
}

impl SliceWriter<'_> {
    fn write_bytes(&mut self, bytes: &[u8]) {
        let room = self.buf.len().saturating_sub(self.written);
        let n = bytes.len().min(room);
        self.buf[self.written..self.written + n].copy_from_slice(&bytes[..n]);
        self.written += n;
        self.needed += bytes.len();
    }
}

impl Write for SliceWriter<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.write_bytes(s.as_bytes());
        Ok(())
    }
}

#[cfg(test)]
mod types_tests {
    use super::*;
    use crate::bind_data::BindData;

    fn entry(bdtype: TypeDescriptor, bytes: &[u8]) -> BindData {
        let mut entry = BindData::new(Some(bdtype.instance()), bytes.len());
        entry.buffer_mut().copy_from_slice(bytes);
        entry.set_fetched(bytes.len(), false, false);
        entry
    }

    #[test]
    fn registry_is_indexed_by_discriminant() {
        for (i, bdtype) in REGISTRY.iter().enumerate() {
            assert_eq!(*bdtype as usize, i);
            assert!(std::ptr::eq(bdtype.instance(), bdtype));
        }
    }

    #[test]
    fn resolve_supported_pairs() {
        let cases = [
            (ColumnType::MYSQL_TYPE_TINY, false, Int8),
            (ColumnType::MYSQL_TYPE_TINY, true, UInt8),
            (ColumnType::MYSQL_TYPE_SHORT, true, UInt16),
            (ColumnType::MYSQL_TYPE_INT24, false, Int24),
            (ColumnType::MYSQL_TYPE_LONG, false, Int32),
            (ColumnType::MYSQL_TYPE_LONG, true, UInt32),
            (ColumnType::MYSQL_TYPE_LONGLONG, true, UInt64),
            (ColumnType::MYSQL_TYPE_DOUBLE, true, Double),
            (ColumnType::MYSQL_TYPE_DATE, false, Date),
            (ColumnType::MYSQL_TYPE_TIMESTAMP, false, Timestamp),
            (ColumnType::MYSQL_TYPE_VAR_STRING, false, VarString),
            (ColumnType::MYSQL_TYPE_NEWDECIMAL, false, Decimal),
        ];
        for (field_type, unsigned, expected) in cases {
            let bdtype = resolve(field_type, unsigned).unwrap();
            assert_eq!(*bdtype, expected);
            if bdtype.is_integer() {
                assert_eq!(bdtype.is_unsigned(), unsigned);
            }
            assert_eq!(bdtype.field_type(), field_type);
        }
    }

    #[test]
    fn resolve_unsupported() {
        assert!(resolve(ColumnType::MYSQL_TYPE_GEOMETRY, false).is_none());
        assert!(resolve(ColumnType::MYSQL_TYPE_JSON, false).is_none());
        assert!(resolve(ColumnType::MYSQL_TYPE_BIT, true).is_none());
        assert!(resolve(ColumnType::MYSQL_TYPE_NULL, false).is_none());
    }

    #[test]
    fn resolve_folds_aliases() {
        assert_eq!(
            resolve(ColumnType::MYSQL_TYPE_LONG_BLOB, false),
            Some(Blob.instance())
        );
        assert_eq!(
            resolve(ColumnType::MYSQL_TYPE_VARCHAR, false),
            Some(VarString.instance())
        );
    }

    #[test]
    fn resolve_returns_same_instance() {
        let first = resolve(ColumnType::MYSQL_TYPE_LONG, false).unwrap();
        let second = resolve(ColumnType::MYSQL_TYPE_LONG, false).unwrap();
        assert!(std::ptr::eq(first, second));
        assert!(std::ptr::eq(first, Int32.instance()));
    }

    #[test]
    fn resolve_by_type_name() {
        assert_eq!(resolve_by_name("VARCHAR"), Some(VarString.instance()));
        assert_eq!(resolve_by_name(" bigint   unsigned "), Some(UInt64.instance()));
        assert_eq!(resolve_by_name("Integer"), Some(Int32.instance()));
        assert_eq!(resolve_by_name("json"), None);
    }

    #[test]
    fn fixed_width_copy() {
        let cases: [(TypeDescriptor, Vec<u8>); 8] = [
            (Int8, (-5i8).to_ne_bytes().to_vec()),
            (UInt8, 250u8.to_ne_bytes().to_vec()),
            (Int16, (-300i16).to_ne_bytes().to_vec()),
            (UInt16, 60000u16.to_ne_bytes().to_vec()),
            (Int32, (-123i32).to_ne_bytes().to_vec()),
            (UInt32, u32::MAX.to_ne_bytes().to_vec()),
            (Int64, i64::MIN.to_ne_bytes().to_vec()),
            (UInt64, u64::MAX.to_ne_bytes().to_vec()),
        ];
        for (bdtype, bytes) in cases {
            let e = entry(bdtype, &bytes);
            let mut buf = [0xAAu8; 16];
            let n = bdtype.copy_into(&e, &mut buf);
            assert_eq!(n, bytes.len());
            assert_eq!(&buf[..n], &bytes[..]);
            assert_eq!(buf[n], 0xAA);
            assert_eq!(bdtype.required_buffer_size(&e), bytes.len());
        }
    }

    #[test]
    fn variable_length_copy() {
        let mut e = BindData::new(Some(VarString.instance()), 16);
        e.buffer_mut()[..11].copy_from_slice(b"hello world");
        e.set_fetched(11, false, false);
        assert_eq!(VarString.required_buffer_size(&e), 11);

        let mut buf = [0xFFu8; 12];
        assert_eq!(VarString.copy_into(&e, &mut buf), 11);
        assert_eq!(&buf[..11], b"hello world");
        assert_eq!(buf[11], 0);

        let mut exact = [0xFFu8; 11];
        assert_eq!(VarString.copy_into(&e, &mut exact), 11);
        assert_eq!(&exact, b"hello world");
    }

    #[test]
    fn integer_rendering() {
        assert_eq!(Int32.render(&entry(Int32, &(-123i32).to_ne_bytes())), "-123");
        assert_eq!(
            UInt32.render(&entry(UInt32, &4294967295u32.to_ne_bytes())),
            "4294967295"
        );
        assert_eq!(
            Int64.render(&entry(Int64, &i64::MIN.to_ne_bytes())),
            "-9223372036854775808"
        );
        assert_eq!(Int8.render(&entry(Int8, &[0])), "0");
    }

    #[test]
    fn float_rendering() {
        let render = |v: f64| Double.render(&entry(Double, &v.to_ne_bytes()));
        assert_eq!(render(3.14159265), "3.1416");
        assert_eq!(render(1.5), "1.5");
        assert_eq!(render(100000.0), "1e+05");
        assert_eq!(render(123456.0), "1.2346e+05");
        assert_eq!(render(0.0001), "0.0001");
        assert_eq!(render(0.00001234), "1.234e-05");
        assert_eq!(render(-2.0), "-2");
        assert_eq!(render(0.0), "0");
        assert_eq!(Float.render(&entry(Float, &2.5f32.to_ne_bytes())), "2.5");
    }

    #[test]
    fn temporal_rendering() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
        let e = entry(Date, &MysqlTime::from(date).to_bytes());
        assert_eq!(Date.render(&e), "2024-03-07");
        assert_eq!(Date.required_buffer_size(&e), MysqlTime::SIZE);

        let elapsed = MysqlTime {
            hour: 838,
            minute: 59,
            second: 59,
            neg: true,
            time_type: MYSQL_TIMESTAMP_TIME,
            ..MysqlTime::default()
        };
        assert_eq!(Time.render(&entry(Time, &elapsed.to_bytes())), "-838:59:59");

        let stamp = date.and_hms_opt(13, 5, 9).unwrap();
        let e = entry(DateTime, &MysqlTime::from(stamp).to_bytes());
        assert_eq!(DateTime.render(&e), "2024-03-07 13:05:09");
        assert_eq!(Timestamp.render(&e), "2024-03-07 13:05:09");
    }

    #[test]
    fn mysql_time_round_trip() {
        let stamp = NaiveDate::from_ymd_opt(1999, 12, 31)
            .unwrap()
            .and_hms_micro_opt(23, 59, 58, 250_000)
            .unwrap();
        let record = MysqlTime::from(stamp);
        let back = MysqlTime::read_from(&record.to_bytes()).unwrap();
        assert_eq!(back, record);
        assert_eq!(back.to_naive_datetime(), Some(stamp));
        assert!(MysqlTime::read_from(&[0u8; 4]).is_none());
    }

    #[test]
    fn text_rendering_and_length() {
        let mut e = BindData::new(Some(Blob.instance()), 8);
        e.buffer_mut().copy_from_slice(b"abcdefgh");
        e.set_fetched(20, false, true);
        assert_eq!(Blob.render(&e), "abcdefgh");
        assert_eq!(Blob.text_length(&e), 8);

        let n = entry(Int32, &(-45i32).to_ne_bytes());
        assert_eq!(Int32.text_length(&n), 3);

        let mut small = [0xFFu8; 3];
        assert_eq!(Int32.render_into(&n, &mut small), 3);
        assert_eq!(&small, b"-45");

        let mut roomy = [0xFFu8; 5];
        assert_eq!(Int32.render_into(&n, &mut roomy), 3);
        assert_eq!(&roomy[..4], b"-45\0");
    }

    #[test]
    fn raw_text_keeps_non_utf8_bytes() {
        let e = entry(Blob, &[0xff, 0x00, 0x41]);
        assert_eq!(Blob.text_length(&e), 3);

        let mut buf = [0xAAu8; 8];
        assert_eq!(Blob.render_into(&e, &mut buf), 3);
        assert_eq!(&buf[..4], &[0xff, 0x00, 0x41, 0x00]);

        let latin1 = entry(VarString, b"caf\xe9");
        let mut short = [0u8; 2];
        assert_eq!(VarString.render_into(&latin1, &mut short), 4);
        assert_eq!(&short, b"ca");
        assert_eq!(VarString.text_length(&latin1), 4);

        // Only the String form replaces invalid sequences.
        assert_eq!(Blob.render(&e), "\u{fffd}\0A");
    }
}
