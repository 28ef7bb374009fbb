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
use crate::binder::Binder;
use crate::common::mysql_options::ColumnType;
use crate::types::{MysqlTime, TypeDescriptor};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

#[doc(hidden)]
use std::{borrow::Cow, ffi::c_ulong};

/// An outgoing parameter: the value in the representation the client library expects, tagged with
/// its type. A parameter without a type is SQL NULL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param<'a> {
    value: Cow<'a, [u8]>,
    bdtype: Option<&'static TypeDescriptor>,
}

impl<'a> Param<'a> {
    pub fn new(bdtype: &'static TypeDescriptor, value: impl Into<Cow<'a, [u8]>>) -> Param<'a> {
        Param {
            value: value.into(),
            bdtype: Some(bdtype),
        }
    }

    pub fn null() -> Param<'static> {
        Param {
            value: Cow::Borrowed(&[]),
            bdtype: None,
        }
    }

    pub fn is_null(&self) -> bool {
        self.bdtype.is_none()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.value
    }

    pub fn len(&self) -> usize {
        self.value.len()
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    pub fn bdtype(&self) -> Option<&'static TypeDescriptor> {
        self.bdtype
    }

    pub fn into_owned(self) -> Param<'static> {
        Param {
            value: Cow::Owned(self.value.into_owned()),
            bdtype: self.bdtype,
        }
    }
}

/// Defines translation of Rust values into statement parameters.
///
/// | Rust type | Sent as |
/// |---------|---------|
/// | [`Option<T>`] where T: [ToParam] | *NULL* if [None], otherwise as T |
/// | [i8]/[u8], [i16]/[u16], [i32]/[u32], [i64]/[u64] | *TINYINT*, *SMALLINT*, *INT*, *BIGINT* (signed or unsigned) |
/// | [bool] | *TINYINT* (0 or 1) |
/// | [f32], [f64] | *FLOAT*, *DOUBLE* |
/// | [str], [String] | *CHAR* |
/// | `[u8]`, `[u8; N]`, [`Vec<u8>`] | *BLOB* |
/// | [chrono::NaiveDate], [chrono::NaiveTime], [chrono::NaiveDateTime] | *DATE*, *TIME*, *DATETIME* |
/// | [uuid::Uuid] | *BLOB* (16 bytes) |
pub trait ToParam {
    fn to_param(&self) -> Param<'_>;
}

macro_rules! impl_to_param_for_number {
    ($($ty:ty => $bdtype:ident),* $(,)?) => {
        $(
            impl ToParam for $ty {
                fn to_param(&self) -> Param<'_> {
                    Param::new(TypeDescriptor::$bdtype.instance(), self.to_ne_bytes().to_vec())
                }
            }
        )*
    };
}

impl_to_param_for_number! {
    i8 => Int8,
    u8 => UInt8,
    i16 => Int16,
    u16 => UInt16,
    i32 => Int32,
    u32 => UInt32,
    i64 => Int64,
    u64 => UInt64,
    f32 => Float,
    f64 => Double,
}

impl ToParam for bool {
    fn to_param(&self) -> Param<'_> {
        i8::from(*self).to_param().into_owned()
    }
}

impl ToParam for str {
    fn to_param(&self) -> Param<'_> {
        Param::new(TypeDescriptor::String.instance(), self.as_bytes())
    }
}

impl ToParam for String {
    fn to_param(&self) -> Param<'_> {
        self.as_str().to_param()
    }
}

impl ToParam for [u8] {
    fn to_param(&self) -> Param<'_> {
        Param::new(TypeDescriptor::Blob.instance(), self)
    }
}

impl<const N: usize> ToParam for [u8; N] {
    fn to_param(&self) -> Param<'_> {
        self.as_slice().to_param()
    }
}

impl ToParam for Vec<u8> {
    fn to_param(&self) -> Param<'_> {
        self.as_slice().to_param()
    }
}

impl ToParam for NaiveDate {
    fn to_param(&self) -> Param<'_> {
        Param::new(
            TypeDescriptor::Date.instance(),
            MysqlTime::from(*self).to_bytes(),
        )
    }
}

impl ToParam for NaiveTime {
    fn to_param(&self) -> Param<'_> {
        Param::new(
            TypeDescriptor::Time.instance(),
            MysqlTime::from(*self).to_bytes(),
        )
    }
}

impl ToParam for NaiveDateTime {
    fn to_param(&self) -> Param<'_> {
        Param::new(
            TypeDescriptor::DateTime.instance(),
            MysqlTime::from(*self).to_bytes(),
        )
    }
}

impl ToParam for uuid::Uuid {
    fn to_param(&self) -> Param<'_> {
        self.as_bytes().to_param()
    }
}

impl<T> ToParam for Option<T>
where
    T: ToParam,
{
    fn to_param(&self) -> Param<'_> {
        match self {
            Some(v) => v.to_param(),
            None => Param::null(),
        }
    }
}

impl<T> ToParam for &T
where
    T: ToParam + ?Sized,
{
    fn to_param(&self) -> Param<'_> {
        (**self).to_param()
    }
}

impl ToParam for Param<'_> {
    fn to_param(&self) -> Param<'_> {
        Param {
            value: Cow::Borrowed(self.bytes()),
            bdtype: self.bdtype,
        }
    }
}

/// Builds a `Vec<Param>` from heterogeneous values, each converted with [ToParam].
///
/// The values are borrowed, so they must outlive the list:
/// ```
/// # use mysqlcb::params;
/// let name = String::from("Ada");
/// let params = params![1815i32, name, None::<i64>, "London"];
/// assert_eq!(params.len(), 4);
/// assert!(params[2].is_null());
/// ```
///
/// Computed values such as `n + 1` or `format!(..)` are temporaries. A list built from them can be
/// passed straight to a query in the same expression, but cannot be kept in a `let` binding
/// (`E0716`). Turn it into owned parameters to keep it:
/// ```compile_fail
/// # use mysqlcb::params;
/// let n = 41;
/// let params = params![n + 1, format!("row {n}")];
/// assert_eq!(params.len(), 2);
/// ```
/// ```
/// # use mysqlcb::{params, Param};
/// let n = 41;
/// let params: Vec<Param<'static>> = params![n + 1, format!("row {n}")]
///     .into_iter()
///     .map(Param::into_owned)
///     .collect();
/// assert_eq!(params[1].bytes(), b"row 41");
/// ```
#[macro_export]
macro_rules! params {
    () => {
        ::std::vec::Vec::<$crate::Param<'_>>::new()
    };
    ($($value:expr),+ $(,)?) => {
        ::std::vec![$($crate::ToParam::to_param(&$value)),+]
    };
}

/// Builds the bindings for an outgoing parameter list.
///
/// Every parameter gets its own copy of the value bytes, sized to the value. NULL parameters are
/// bound as `MYSQL_TYPE_NULL` with the null indicator set. An empty list yields an empty binder.
pub fn bind_parameters(params: &[Param<'_>]) -> Binder {
    let mut binder = Binder::with_capacity(params.len());

    for param in params {
        let (buffer_type, is_unsigned) = match param.bdtype() {
            Some(bdtype) => (bdtype.buffer_type(), bdtype.is_unsigned()),
            None => (ColumnType::MYSQL_TYPE_NULL, false),
        };

        let mut data = BindData::new(param.bdtype(), param.len());
        data.buffer_mut().copy_from_slice(param.bytes());
        data.len_data = param.len() as c_ulong;
        data.is_null = param.is_null();

        binder.push(
            BindDescriptor {
                buffer_type,
                is_unsigned,
                buffer_length: param.len(),
            },
            data,
        );
    }

    binder
}
