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

//! Raw declarations for the parts of the MySQL C client library (`libmysqlclient`)
//! used by the [mysqlcb](https://crates.io/crates/mysqlcb) crate.
//!
//! The layouts follow `mysql.h` of the 8.x client. `my_bool` is declared as `bool`, which has
//! the same size as the `char` used by older client versions.
//! It is not meant for direct use.

#![allow(non_camel_case_types)]
#![allow(non_upper_case_globals)]
#![allow(non_snake_case)]

use std::os::raw::{c_char, c_int, c_uchar, c_uint, c_ulong, c_void};

pub type my_bool = bool;
pub type my_ulonglong = u64;
pub type enum_field_types = c_uint;
pub type enum_mysql_timestamp_type = c_int;
pub type mysql_option = c_uint;

/// Opaque connection handle.
#[repr(C)]
pub struct MYSQL {
    _private: [u8; 0],
}

/// Opaque prepared statement handle.
#[repr(C)]
pub struct MYSQL_STMT {
    _private: [u8; 0],
}

/// Opaque result set handle.
#[repr(C)]
pub struct MYSQL_RES {
    _private: [u8; 0],
}

pub const MYSQL_TYPE_DECIMAL: enum_field_types = 0;
pub const MYSQL_TYPE_TINY: enum_field_types = 1;
pub const MYSQL_TYPE_SHORT: enum_field_types = 2;
pub const MYSQL_TYPE_LONG: enum_field_types = 3;
pub const MYSQL_TYPE_FLOAT: enum_field_types = 4;
pub const MYSQL_TYPE_DOUBLE: enum_field_types = 5;
pub const MYSQL_TYPE_NULL: enum_field_types = 6;
pub const MYSQL_TYPE_TIMESTAMP: enum_field_types = 7;
pub const MYSQL_TYPE_LONGLONG: enum_field_types = 8;
pub const MYSQL_TYPE_INT24: enum_field_types = 9;
pub const MYSQL_TYPE_DATE: enum_field_types = 10;
pub const MYSQL_TYPE_TIME: enum_field_types = 11;
pub const MYSQL_TYPE_DATETIME: enum_field_types = 12;
pub const MYSQL_TYPE_YEAR: enum_field_types = 13;
pub const MYSQL_TYPE_NEWDATE: enum_field_types = 14;
pub const MYSQL_TYPE_VARCHAR: enum_field_types = 15;
pub const MYSQL_TYPE_BIT: enum_field_types = 16;
pub const MYSQL_TYPE_JSON: enum_field_types = 245;
pub const MYSQL_TYPE_NEWDECIMAL: enum_field_types = 246;
pub const MYSQL_TYPE_ENUM: enum_field_types = 247;
pub const MYSQL_TYPE_SET: enum_field_types = 248;
pub const MYSQL_TYPE_TINY_BLOB: enum_field_types = 249;
pub const MYSQL_TYPE_MEDIUM_BLOB: enum_field_types = 250;
pub const MYSQL_TYPE_LONG_BLOB: enum_field_types = 251;
pub const MYSQL_TYPE_BLOB: enum_field_types = 252;
pub const MYSQL_TYPE_VAR_STRING: enum_field_types = 253;
pub const MYSQL_TYPE_STRING: enum_field_types = 254;
pub const MYSQL_TYPE_GEOMETRY: enum_field_types = 255;

pub const MYSQL_TIMESTAMP_NONE: enum_mysql_timestamp_type = -2;
pub const MYSQL_TIMESTAMP_ERROR: enum_mysql_timestamp_type = -1;
pub const MYSQL_TIMESTAMP_DATE: enum_mysql_timestamp_type = 0;
pub const MYSQL_TIMESTAMP_DATETIME: enum_mysql_timestamp_type = 1;
pub const MYSQL_TIMESTAMP_TIME: enum_mysql_timestamp_type = 2;

pub const MYSQL_READ_DEFAULT_FILE: mysql_option = 4;
pub const MYSQL_READ_DEFAULT_GROUP: mysql_option = 5;

/// Returned by `mysql_stmt_fetch` when the result set is exhausted.
pub const MYSQL_NO_DATA: c_int = 100;
/// Returned by `mysql_stmt_fetch` when at least one column did not fit its buffer.
pub const MYSQL_DATA_TRUNCATED: c_int = 101;

pub const NOT_NULL_FLAG: c_uint = 1;
pub const PRI_KEY_FLAG: c_uint = 2;
pub const UNIQUE_KEY_FLAG: c_uint = 4;
pub const MULTIPLE_KEY_FLAG: c_uint = 8;
pub const BLOB_FLAG: c_uint = 16;
pub const UNSIGNED_FLAG: c_uint = 32;
pub const ZEROFILL_FLAG: c_uint = 64;
pub const BINARY_FLAG: c_uint = 128;
pub const ENUM_FLAG: c_uint = 256;
pub const AUTO_INCREMENT_FLAG: c_uint = 512;
pub const TIMESTAMP_FLAG: c_uint = 1024;
pub const SET_FLAG: c_uint = 2048;

#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct MYSQL_FIELD {
    pub name: *mut c_char,
    pub org_name: *mut c_char,
    pub table: *mut c_char,
    pub org_table: *mut c_char,
    pub db: *mut c_char,
    pub catalog: *mut c_char,
    pub def: *mut c_char,
    pub length: c_ulong,
    pub max_length: c_ulong,
    pub name_length: c_uint,
    pub org_name_length: c_uint,
    pub table_length: c_uint,
    pub org_table_length: c_uint,
    pub db_length: c_uint,
    pub catalog_length: c_uint,
    pub def_length: c_uint,
    pub flags: c_uint,
    pub decimals: c_uint,
    pub charsetnr: c_uint,
    pub type_: enum_field_types,
    pub extension: *mut c_void,
}

#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct MYSQL_TIME {
    pub year: c_uint,
    pub month: c_uint,
    pub day: c_uint,
    pub hour: c_uint,
    pub minute: c_uint,
    pub second: c_uint,
    pub second_part: c_ulong,
    pub neg: my_bool,
    pub time_type: enum_mysql_timestamp_type,
    pub time_zone_displacement: c_int,
}

pub type store_param_func_t = Option<unsafe extern "C" fn(net: *mut c_void, param: *mut MYSQL_BIND)>;
pub type fetch_result_func_t =
    Option<unsafe extern "C" fn(param: *mut MYSQL_BIND, field: *mut MYSQL_FIELD, row: *mut *mut c_uchar)>;

/// The binding descriptor read and written by `mysql_stmt_bind_param`, `mysql_stmt_bind_result`
/// and `mysql_stmt_fetch`.
#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct MYSQL_BIND {
    pub length: *mut c_ulong,
    pub is_null: *mut my_bool,
    pub buffer: *mut c_void,
    pub error: *mut my_bool,
    pub row_ptr: *mut c_uchar,
    pub store_param_func: store_param_func_t,
    pub fetch_result: fetch_result_func_t,
    pub skip_result: fetch_result_func_t,
    pub buffer_length: c_ulong,
    pub offset: c_ulong,
    pub length_value: c_ulong,
    pub param_number: c_uint,
    pub pack_length: c_uint,
    pub buffer_type: enum_field_types,
    pub error_value: my_bool,
    pub is_unsigned: my_bool,
    pub long_data_used: my_bool,
    pub is_null_value: my_bool,
    pub extension: *mut c_void,
}

impl Default for MYSQL_BIND {
    fn default() -> Self {
        // SAFETY: every field is a raw pointer, an optional function pointer, an integer or a
        // bool, all of which accept the all-zero bit pattern. This is the memset(0) the C API
        // documentation asks for.
        unsafe { std::mem::zeroed() }
    }
}

extern "C" {
    pub fn mysql_init(mysql: *mut MYSQL) -> *mut MYSQL;
    pub fn mysql_options(mysql: *mut MYSQL, option: mysql_option, arg: *const c_void) -> c_int;
    pub fn mysql_real_connect(
        mysql: *mut MYSQL,
        host: *const c_char,
        user: *const c_char,
        passwd: *const c_char,
        db: *const c_char,
        port: c_uint,
        unix_socket: *const c_char,
        clientflag: c_ulong,
    ) -> *mut MYSQL;
    pub fn mysql_close(sock: *mut MYSQL);
    pub fn mysql_errno(mysql: *mut MYSQL) -> c_uint;
    pub fn mysql_error(mysql: *mut MYSQL) -> *const c_char;

    pub fn mysql_num_fields(res: *mut MYSQL_RES) -> c_uint;
    pub fn mysql_fetch_fields(res: *mut MYSQL_RES) -> *mut MYSQL_FIELD;
    pub fn mysql_free_result(result: *mut MYSQL_RES);

    pub fn mysql_stmt_init(mysql: *mut MYSQL) -> *mut MYSQL_STMT;
    pub fn mysql_stmt_prepare(stmt: *mut MYSQL_STMT, query: *const c_char, length: c_ulong) -> c_int;
    pub fn mysql_stmt_param_count(stmt: *mut MYSQL_STMT) -> c_ulong;
    pub fn mysql_stmt_field_count(stmt: *mut MYSQL_STMT) -> c_uint;
    pub fn mysql_stmt_bind_param(stmt: *mut MYSQL_STMT, bnd: *mut MYSQL_BIND) -> my_bool;
    pub fn mysql_stmt_execute(stmt: *mut MYSQL_STMT) -> c_int;
    pub fn mysql_stmt_result_metadata(stmt: *mut MYSQL_STMT) -> *mut MYSQL_RES;
    pub fn mysql_stmt_bind_result(stmt: *mut MYSQL_STMT, bnd: *mut MYSQL_BIND) -> my_bool;
    pub fn mysql_stmt_store_result(stmt: *mut MYSQL_STMT) -> c_int;
    pub fn mysql_stmt_num_rows(stmt: *mut MYSQL_STMT) -> my_ulonglong;
    pub fn mysql_stmt_fetch(stmt: *mut MYSQL_STMT) -> c_int;
    pub fn mysql_stmt_close(stmt: *mut MYSQL_STMT) -> my_bool;
    pub fn mysql_stmt_errno(stmt: *mut MYSQL_STMT) -> c_uint;
    pub fn mysql_stmt_error(stmt: *mut MYSQL_STMT) -> *const c_char;
}
