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

use crate::common::mysql_options::ColumnType;
use crate::types::TypeDescriptor;

#[doc(hidden)]
use std::{ffi::c_ulong, fmt};

/// Owned scratch storage for one bound value.
///
/// Backed by `u64` words so that temporal records and 8-byte integers written by the client library
/// are always suitably aligned.
pub(crate) struct Scratch {
    words: Box<[u64]>,
    len: usize,
}

impl Scratch {
    pub(crate) fn new(len: usize) -> Scratch {
        Scratch {
            words: vec![0u64; len.div_ceil(8)].into_boxed_slice(),
            len,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn as_bytes(&self) -> &[u8] {
        // SAFETY: `words` holds at least `len` initialized bytes and u8 has no alignment requirement.
        unsafe { std::slice::from_raw_parts(self.words.as_ptr().cast::<u8>(), self.len) }
    }

    pub(crate) fn as_bytes_mut(&mut self) -> &mut [u8] {
        // SAFETY: as above; the exclusive borrow of `self` covers the whole allocation.
        unsafe { std::slice::from_raw_parts_mut(self.words.as_mut_ptr().cast::<u8>(), self.len) }
    }
}

impl fmt::Debug for Scratch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scratch").field("len", &self.len).finish()
    }
}

/// What a binding tells the client library about its buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BindDescriptor {
    /// The wire type requested from (or sent to) the server.
    pub buffer_type: ColumnType,
    pub is_unsigned: bool,
    /// Number of scratch bytes available to the client library.
    pub buffer_length: usize,
}

/// One column or parameter slot: the length, null and error indicators the client library writes
/// into, the owned scratch buffer and the resolved type.
#[derive(Debug)]
pub struct BindData {
    pub(crate) len_data: c_ulong,
    pub(crate) is_null: bool,
    pub(crate) is_error: bool,
    pub(crate) is_truncated: bool,
    pub(crate) data: Scratch,
    pub(crate) bdtype: Option<&'static TypeDescriptor>,
}

impl BindData {
    pub(crate) fn new(bdtype: Option<&'static TypeDescriptor>, buffer_length: usize) -> BindData {
        BindData {
            len_data: 0,
            is_null: false,
            is_error: false,
            is_truncated: false,
            data: Scratch::new(buffer_length),
            bdtype,
        }
    }

    /// Length of the value in the current row, as reported by the client library.
    /// May exceed [buffer_length](BindData::buffer_length) when the value was truncated.
    pub fn len_data(&self) -> usize {
        self.len_data as usize
    }

    pub fn is_null(&self) -> bool {
        self.is_null
    }

    /// Set by the client library when the value did not fit.
    pub fn is_error(&self) -> bool {
        self.is_error
    }

    /// Copied from [is_error](BindData::is_error) when a fetch reports truncation.
    pub fn is_truncated(&self) -> bool {
        self.is_truncated
    }

    pub fn buffer_length(&self) -> usize {
        self.data.len()
    }

    /// The whole scratch buffer.
    pub fn data(&self) -> &[u8] {
        self.data.as_bytes()
    }

    /// The bytes of the current value that are actually held in scratch.
    pub fn value_bytes(&self) -> &[u8] {
        let held = self.len_data().min(self.buffer_length());
        &self.data.as_bytes()[..held]
    }

    /// The type resolved for this slot. [None] only for NULL parameters.
    pub fn bdtype(&self) -> Option<&'static TypeDescriptor> {
        self.bdtype
    }

    /// Bytes needed to hold the current value, see [TypeDescriptor::required_buffer_size].
    pub fn get_size(&self) -> usize {
        self.bdtype
            .map_or(0, |bdtype| bdtype.required_buffer_size(self))
    }

    /// Copies the current value into `buf`, see [TypeDescriptor::copy_into].
    pub fn set_with_value(&self, buf: &mut [u8]) -> usize {
        self.bdtype.map_or(0, |bdtype| bdtype.copy_into(self, buf))
    }

    /// Writable scratch, for driver implementations filling in a fetched row.
    pub fn buffer_mut(&mut self) -> &mut [u8] {
        self.data.as_bytes_mut()
    }

    /// Records the outcome of a fetch for this slot, as `mysql_stmt_fetch` would.
    pub fn set_fetched(&mut self, len_data: usize, is_null: bool, is_error: bool) {
        self.len_data = len_data as c_ulong;
        self.is_null = is_null;
        self.is_error = is_error;
    }

    pub(crate) fn allocate(&mut self, buffer_length: usize) {
        self.data = Scratch::new(buffer_length);
    }
}

impl fmt::Display for BindData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.bdtype {
            _ if self.is_null => f.write_str("NULL"),
            Some(bdtype) => bdtype.write_text(self, f),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod bind_data_tests {
    use super::*;
    use crate::types::TypeDescriptor;

    #[test]
    fn scratch_is_zeroed_and_aligned() {
        let scratch = Scratch::new(13);
        assert_eq!(scratch.len(), 13);
        assert!(scratch.as_bytes().iter().all(|b| *b == 0));
        assert_eq!(scratch.as_bytes().as_ptr() as usize % 8, 0);
        assert!(Scratch::new(0).as_bytes().is_empty());
    }

    #[test]
    fn value_bytes_bounded_by_buffer() {
        let mut entry = BindData::new(Some(TypeDescriptor::VarString.instance()), 4);
        entry.buffer_mut().copy_from_slice(b"abcd");
        entry.set_fetched(10, false, true);
        assert_eq!(entry.value_bytes(), b"abcd");
        assert_eq!(entry.len_data(), 10);
        assert!(entry.is_error());

        entry.set_fetched(2, false, false);
        assert_eq!(entry.value_bytes(), b"ab");
    }

    #[test]
    fn display_null() {
        let mut entry = BindData::new(Some(TypeDescriptor::Int32.instance()), 4);
        entry.set_fetched(4, true, false);
        assert_eq!(entry.to_string(), "NULL");
    }
}
