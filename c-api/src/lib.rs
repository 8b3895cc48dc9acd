// Copyright 2015 Google Inc. All rights reserved.
//
// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to deal
// in the Software without restriction, including without limitation the rights
// to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
// copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in
// all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN
// THE SOFTWARE.


//! C ABI for the cssg engine.
//!
//! Every returned buffer is NUL-terminated and owned by the caller, who
//! releases it with the `free` of the allocator that produced it. A NULL
//! return means allocation failed or the arguments were invalid.

use std::ptr;
use std::slice;

use cssg::{convert, Mem, Options};
use libc::{c_char, c_int, size_t};
use log::warn;

/// C name of the allocator vtable.
#[allow(non_camel_case_types)]
pub type cssg_mem = Mem;

unsafe fn convert_raw(
    text: *const c_char,
    len: size_t,
    options: c_int,
    mem: *const Mem,
    out_len: *mut size_t,
) -> *mut c_char {
    let input: &[u8] = if len == 0 {
        &[]
    } else if text.is_null() {
        warn!("null input pointer with length {}", len);
        return ptr::null_mut();
    } else {
        slice::from_raw_parts(text.cast::<u8>(), len)
    };
    let mem = mem.as_ref().unwrap_or(Mem::default_allocator());

    match convert(input, Options::from_bits_truncate(options), mem) {
        Ok(html) => {
            let (buf, buf_len) = html.into_raw_parts();
            if !out_len.is_null() {
                *out_len = buf_len;
            }
            buf.cast::<c_char>()
        }
        Err(e) => {
            warn!("conversion failed: {}", e);
            ptr::null_mut()
        }
    }
}

/// Converts `len` bytes of markdown at `text` to HTML using the default
/// allocator.
///
/// # Safety
///
/// `text` must be valid for reads of `len` bytes.
#[no_mangle]
pub unsafe extern "C" fn cssg_markdown_to_html(
    text: *const c_char,
    len: size_t,
    options: c_int,
) -> *mut c_char {
    convert_raw(text, len, options, ptr::null(), ptr::null_mut())
}

/// Like [`cssg_markdown_to_html`], allocating the result through `mem`.
/// A NULL `mem` selects the default allocator.
///
/// # Safety
///
/// `text` must be valid for reads of `len` bytes and `mem`, when not NULL,
/// must point to a valid vtable that outlives the call.
#[no_mangle]
pub unsafe extern "C" fn cssg_markdown_to_html_with_mem(
    text: *const c_char,
    len: size_t,
    options: c_int,
    mem: *const cssg_mem,
) -> *mut c_char {
    convert_raw(text, len, options, mem, ptr::null_mut())
}

/// Like [`cssg_markdown_to_html_with_mem`], also storing the output length,
/// terminator excluded, in `out_len` when it is not NULL.
///
/// # Safety
///
/// Same as [`cssg_markdown_to_html_with_mem`]; `out_len`, when not NULL,
/// must be valid for writes.
#[no_mangle]
pub unsafe extern "C" fn cssg_markdown_to_html_len(
    text: *const c_char,
    len: size_t,
    options: c_int,
    mem: *const cssg_mem,
    out_len: *mut size_t,
) -> *mut c_char {
    convert_raw(text, len, options, mem, out_len)
}

/// Returns the process-wide default allocator. The vtable is immutable.
#[no_mangle]
pub extern "C" fn cssg_get_default_mem_allocator() -> *const cssg_mem {
    Mem::default_allocator()
}

/// Returns the library version as `major << 16 | minor << 8 | patch`, so
/// `0x010203` is version 1.2.3.
#[no_mangle]
pub extern "C" fn cssg_version() -> c_int {
    let part = |s: &str| s.parse::<c_int>().unwrap_or(0) & 0xff;
    part(env!("CARGO_PKG_VERSION_MAJOR")) << 16
        | part(env!("CARGO_PKG_VERSION_MINOR")) << 8
        | part(env!("CARGO_PKG_VERSION_PATCH"))
}

/// Returns the library version as a static NUL-terminated string.
#[no_mangle]
pub extern "C" fn cssg_version_string() -> *const c_char {
    concat!(env!("CARGO_PKG_VERSION"), "\0").as_ptr().cast()
}
