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

//! Caller-replaceable allocator and the output buffer built on top of it.
//!
//! Every buffer the engine hands across the public boundary is obtained
//! from a [`Mem`] vtable and must be released through the same vtable.

use std::fmt::{self, Arguments};
use std::ptr::{self, NonNull};
use std::slice;

use cssg_escape::StrWrite;
use libc::{c_void, size_t};

/// Error returned when the allocator could not satisfy a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("allocation of {requested} bytes failed")]
pub struct AllocError {
    /// Size in bytes of the failed request.
    pub requested: usize,
}

/// Allocator vtable.
///
/// `calloc` must return zeroed memory or null, `realloc` must preserve the
/// leading content of the block and leave the original untouched when it
/// returns null, and `free` must accept null.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct Mem {
    pub calloc: unsafe extern "C" fn(count: size_t, size: size_t) -> *mut c_void,
    pub realloc: unsafe extern "C" fn(ptr: *mut c_void, size: size_t) -> *mut c_void,
    pub free: unsafe extern "C" fn(ptr: *mut c_void),
}

impl fmt::Debug for Mem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mem")
            .field("calloc", &(self.calloc as *const ()))
            .field("realloc", &(self.realloc as *const ()))
            .field("free", &(self.free as *const ()))
            .finish()
    }
}

/// The process-wide default allocator, backed by the C library heap.
pub static DEFAULT_MEM_ALLOCATOR: Mem = Mem {
    calloc: libc::calloc,
    realloc: libc::realloc,
    free: libc::free,
};

impl Mem {
    pub fn default_allocator() -> &'static Mem {
        &DEFAULT_MEM_ALLOCATOR
    }

    /// Allocates `count * size` zeroed bytes.
    pub fn alloc(&self, count: usize, size: usize) -> Result<NonNull<u8>, AllocError> {
        let requested = count
            .checked_mul(size)
            .ok_or(AllocError { requested: usize::MAX })?;
        // SAFETY: the vtable contract makes calloc callable with any sizes.
        let ptr = unsafe { (self.calloc)(count, size) };
        NonNull::new(ptr.cast::<u8>()).ok_or(AllocError { requested })
    }

    /// Resizes a block obtained from this vtable. On failure the original
    /// block stays valid and owned by the caller.
    ///
    /// # Safety
    ///
    /// `block` must come from this vtable and not have been freed.
    pub unsafe fn resize(&self, block: NonNull<u8>, size: usize) -> Result<NonNull<u8>, AllocError> {
        let ptr = (self.realloc)(block.as_ptr().cast::<c_void>(), size);
        NonNull::new(ptr.cast::<u8>()).ok_or(AllocError { requested: size })
    }

    /// Releases a block obtained from this vtable.
    ///
    /// # Safety
    ///
    /// `block` must come from this vtable and must not be used afterwards.
    pub unsafe fn release(&self, block: *mut u8) {
        (self.free)(block.cast::<c_void>());
    }
}

const MIN_CAPACITY: usize = 64;

/// Growable, NUL-terminated byte buffer owned through a [`Mem`].
///
/// Only `str` data is ever written, so the content is always valid UTF-8.
pub struct MemBuf<'m> {
    mem: &'m Mem,
    ptr: NonNull<u8>,
    len: usize,
    /// Allocated size, including room for the trailing NUL.
    cap: usize,
}

impl<'m> MemBuf<'m> {
    /// Creates a buffer with room for at least `capacity` bytes of content.
    pub fn with_capacity(mem: &'m Mem, capacity: usize) -> Result<MemBuf<'m>, AllocError> {
        let cap = capacity
            .checked_add(1)
            .ok_or(AllocError { requested: usize::MAX })?
            .max(MIN_CAPACITY);
        let ptr = mem.alloc(cap, 1)?;
        Ok(MemBuf { mem, ptr, len: 0, cap })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.cap - 1
    }

    pub fn allocator(&self) -> &'m Mem {
        self.mem
    }

    pub fn as_bytes(&self) -> &[u8] {
        // SAFETY: `ptr` is valid for `cap` bytes and the first `len` are initialised.
        unsafe { slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }

    pub fn as_str(&self) -> &str {
        // SAFETY: only whole `str`s are ever appended.
        unsafe { std::str::from_utf8_unchecked(self.as_bytes()) }
    }

    fn reserve(&mut self, additional: usize) -> Result<(), AllocError> {
        let needed = self
            .len
            .checked_add(additional)
            .and_then(|n| n.checked_add(1))
            .ok_or(AllocError { requested: usize::MAX })?;
        if needed <= self.cap {
            return Ok(());
        }
        let new_cap = self.cap.checked_mul(2).unwrap_or(needed).max(needed);
        // SAFETY: `ptr` came from `self.mem` and is still live.
        self.ptr = unsafe { self.mem.resize(self.ptr, new_cap)? };
        self.cap = new_cap;
        Ok(())
    }

    pub fn push_str(&mut self, s: &str) -> Result<(), AllocError> {
        self.reserve(s.len())?;
        // SAFETY: `reserve` guarantees room for `s` plus the terminator.
        unsafe {
            let end = self.ptr.as_ptr().add(self.len);
            ptr::copy_nonoverlapping(s.as_ptr(), end, s.len());
            *end.add(s.len()) = 0;
        }
        self.len += s.len();
        Ok(())
    }

    /// Hands the block to the caller as `(pointer, length)`.
    ///
    /// The pointer is NUL-terminated at `length` and must be released with
    /// the allocator's `free`.
    pub fn into_raw_parts(self) -> (*mut u8, usize) {
        let parts = (self.ptr.as_ptr(), self.len);
        std::mem::forget(self);
        parts
    }
}

impl Drop for MemBuf<'_> {
    fn drop(&mut self) {
        // SAFETY: the block is owned by this buffer.
        unsafe { self.mem.release(self.ptr.as_ptr()) }
    }
}

impl fmt::Debug for MemBuf<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemBuf")
            .field("len", &self.len)
            .field("cap", &self.cap)
            .field("content", &self.as_str())
            .finish()
    }
}

impl AsRef<[u8]> for MemBuf<'_> {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl StrWrite for MemBuf<'_> {
    type Error = AllocError;

    #[inline]
    fn write_str(&mut self, s: &str) -> Result<(), AllocError> {
        self.push_str(s)
    }

    fn write_fmt(&mut self, args: Arguments) -> Result<(), AllocError> {
        struct Adapter<'a, 'm> {
            buf: &'a mut MemBuf<'m>,
            error: Option<AllocError>,
        }

        impl fmt::Write for Adapter<'_, '_> {
            fn write_str(&mut self, s: &str) -> fmt::Result {
                self.buf.push_str(s).map_err(|e| {
                    self.error = Some(e);
                    fmt::Error
                })
            }
        }

        let mut adapter = Adapter {
            buf: self,
            error: None,
        };
        fmt::write(&mut adapter, args)
            .map_err(|_| adapter.error.unwrap_or(AllocError { requested: 0 }))
    }
}
