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

//! [CommonMark](https://commonmark.org) to HTML5 conversion with a
//! caller-supplied allocator.
//!
//! The output buffer of [`convert`] is obtained from a [`Mem`] vtable, which
//! makes the engine usable behind a C ABI where the caller owns all memory.
//! Rust callers that do not care about the allocator can use
//! [`markdown_to_html`].
//!
//! # Example
//! ```rust
//! use cssg::{convert, Mem, Options};
//!
//! let html = convert(b"Hello *world*", Options::empty(), Mem::default_allocator()).unwrap();
//! assert_eq!(html.as_str(), "<p>Hello <em>world</em></p>\n");
//! ```
//!
//! Raw HTML is suppressed unless [`Options::UNSAFE`] is set:
//!
//! ```rust
//! use cssg::{markdown_to_html, Options};
//!
//! assert_eq!(markdown_to_html("<b>hi</b>", Options::empty()), "<p><!-- raw HTML omitted -->hi<!-- raw HTML omitted --></p>\n");
//! assert_eq!(markdown_to_html("<b>hi</b>", Options::UNSAFE), "<p><b>hi</b></p>\n");
//! ```

#![warn(missing_debug_implementations)]

pub mod entities;
pub mod mem;

mod firstpass;
mod html;
mod linklabel;
mod parse;
mod puncttable;
mod scanners;
mod strings;
mod tree;

use std::borrow::Cow;
use std::fmt::Display;

use log::debug;
use memchr::memchr;

pub use crate::mem::{AllocError, Mem, MemBuf};
use crate::strings::CowStr;

/// Codeblock kind.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum CodeBlockKind<'a> {
    Indented,
    /// The value contained in the tag describes the language of the code, which may be empty.
    Fenced(CowStr<'a>),
}

/// Tags for elements that can contain other elements.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Tag<'a> {
    /// A paragraph of text and other inline elements.
    Paragraph,
    Heading(HeadingLevel),
    BlockQuote,
    /// A code block.
    CodeBlock(CodeBlockKind<'a>),
    /// A raw HTML block. Its lines arrive as `Html` events.
    HtmlBlock,
    /// A list. If the list is ordered the field indicates the number of the first item.
    /// Contains only list items.
    List(Option<u64>),
    /// A list item.
    Item,
    Emphasis,
    Strong,
    /// A link.
    Link {
        link_type: LinkType,
        dest_url: CowStr<'a>,
        title: CowStr<'a>,
    },
    /// An image. The image's children form its alternative text.
    Image {
        link_type: LinkType,
        dest_url: CowStr<'a>,
        title: CowStr<'a>,
    },
}

/// The end of a `Tag`.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub(crate) enum TagEnd {
    Paragraph,
    Heading(HeadingLevel),
    BlockQuote,
    CodeBlock,
    HtmlBlock,
    /// A list, `true` for ordered lists.
    List(bool),
    Item,
    Emphasis,
    Strong,
    Link,
    Image,
}

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub(crate) enum HeadingLevel {
    H1 = 1,
    H2,
    H3,
    H4,
    H5,
    H6,
}

impl Display for HeadingLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::H1 => write!(f, "h1"),
            Self::H2 => write!(f, "h2"),
            Self::H3 => write!(f, "h3"),
            Self::H4 => write!(f, "h4"),
            Self::H5 => write!(f, "h5"),
            Self::H6 => write!(f, "h6"),
        }
    }
}

/// Returned when trying to convert a `usize` into a `Heading` but it fails
/// because the usize isn't a valid heading level
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub(crate) struct InvalidHeadingLevel(usize);

impl TryFrom<usize> for HeadingLevel {
    type Error = InvalidHeadingLevel;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::H1),
            2 => Ok(Self::H2),
            3 => Ok(Self::H3),
            4 => Ok(Self::H4),
            5 => Ok(Self::H5),
            6 => Ok(Self::H6),
            _ => Err(InvalidHeadingLevel(value)),
        }
    }
}

/// Type specifier for links.
#[derive(Clone, Debug, PartialEq, Copy)]
pub(crate) enum LinkType {
    /// Inline link like `[foo](bar)`
    Inline,
    /// Reference link like `[foo][bar]`
    Reference,
    /// Collapsed link like `[foo][]`
    Collapsed,
    /// Shortcut link like `[foo]`
    Shortcut,
    /// Autolink like `<http://foo.bar/baz>`
    Autolink,
    /// Email address in autolink like `<john@example.org>`
    Email,
}

/// Markdown events that are generated in a preorder traversal of the document
/// tree, with additional `End` events whenever all of an inner node's children
/// have been visited.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Event<'a> {
    /// Start of a tagged element. Events that are yielded after this event
    /// and before its corresponding `End` event are inside this element.
    /// Start and end events are guaranteed to be balanced.
    Start(Tag<'a>),
    /// End of a tagged element.
    End(TagEnd),
    /// A text node.
    Text(CowStr<'a>),
    /// An inline code node.
    Code(CowStr<'a>),
    /// A line of an HTML block, line ending included.
    Html(CowStr<'a>),
    /// An inline HTML node.
    InlineHtml(CowStr<'a>),
    SoftBreak,
    HardBreak,
    /// A thematic break.
    Rule,
}

bitflags::bitflags! {
    /// Rendering options. The values match the C `int` flags, and unknown
    /// bits are ignored by [`Options::from_bits_truncate`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
    pub struct Options: i32 {
        /// Adds a `data-sourcepos` attribute to block elements.
        const SOURCEPOS = 1 << 1;
        /// Renders soft breaks as hard breaks.
        const HARDBREAKS = 1 << 2;
        /// Renders soft breaks as spaces. `HARDBREAKS` takes precedence.
        const NOBREAKS = 1 << 4;
        /// Accepted for compatibility; input is always validated and invalid
        /// sequences are replaced with U+FFFD.
        const VALIDATE_UTF8 = 1 << 9;
        /// Replaces straight quotes with curly quotes, `--` and `---` with
        /// dashes and `...` with an ellipsis.
        const SMART = 1 << 10;
        /// Resolves HTML5 legacy named references without the trailing
        /// semicolon, such as `&copy`.
        const LEGACY_ENTITIES = 1 << 11;
        /// Passes raw HTML and dangerous URLs through. Without it raw HTML is
        /// replaced by a comment and `javascript:` style URLs are dropped.
        const UNSAFE = 1 << 17;
    }
}

/// Error of a conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The allocator returned null. No partial output is returned.
    #[error(transparent)]
    Alloc(#[from] AllocError),
}

/// Decodes input bytes, replacing invalid UTF-8 and NUL with U+FFFD.
fn normalize_input(input: &[u8]) -> Cow<'_, str> {
    let text = String::from_utf8_lossy(input);
    if memchr(0, text.as_bytes()).is_none() {
        return text;
    }
    Cow::Owned(text.replace('\0', "\u{FFFD}"))
}

/// Converts markdown to HTML in a buffer obtained from `mem`.
///
/// On success the caller owns the buffer; dropping it releases the memory
/// through `mem`, and [`MemBuf::into_raw_parts`] hands it out instead.
/// Any allocation failure aborts the conversion.
pub fn convert<'m>(input: &[u8], options: Options, mem: &'m Mem) -> Result<MemBuf<'m>, Error> {
    let text = normalize_input(input);
    // output is usually a bit longer than the input
    let mut buf = MemBuf::with_capacity(mem, text.len() + text.len() / 4)?;
    html::write_html(&mut buf, &text, options)?;
    debug!(
        "converted {} input bytes to {} output bytes with {:?}",
        input.len(),
        buf.len(),
        options
    );
    Ok(buf)
}

/// Converts markdown to HTML using the global Rust allocator.
///
/// Produces the same output as [`convert`].
pub fn markdown_to_html(input: &str, options: Options) -> String {
    let text = normalize_input(input.as_bytes());
    let mut out = String::with_capacity(text.len() + text.len() / 4);
    match html::write_html(&mut out, &text, options) {
        Ok(()) => {}
        Err(never) => match never {},
    }
    debug!(
        "converted {} input bytes to {} output bytes with {:?}",
        input.len(),
        out.len(),
        options
    );
    out
}
