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

//! Scanners for the lexical pieces of CommonMark: container markers, block
//! openers, HTML, autolinks, entities and link destinations.

use std::char;

use memchr::memchr;

use crate::entities;
use crate::parse::HtmlScanGuard;
pub(crate) use crate::puncttable::is_ascii_punctuation;
use crate::strings::CowStr;
use crate::{HeadingLevel, LinkType};

/// Block-level HTML tag names (start condition 6), sorted for binary search.
const HTML_TAGS: [&str; 62] = [
    "address", "article", "aside", "base", "basefont", "blockquote", "body", "caption",
    "center", "col", "colgroup", "dd", "details", "dialog", "dir", "div", "dl", "dt",
    "fieldset", "figcaption", "figure", "footer", "form", "frame", "frameset", "h1", "h2",
    "h3", "h4", "h5", "h6", "head", "header", "hr", "html", "iframe", "legend", "li", "link",
    "main", "menu", "menuitem", "nav", "noframes", "ol", "optgroup", "option", "p", "param",
    "search", "section", "summary", "table", "tbody", "td", "tfoot", "th", "thead", "title",
    "tr", "track", "ul",
];

/// Cursor over the start of a line that understands tab stops.
///
/// Tabs count as advancing to the next multiple of four columns. A tab may
/// be consumed partially, in which case the leftover columns are remembered
/// in `spaces_remaining` and handed out first on the next request.
#[derive(Clone)]
pub(crate) struct LineStart<'a> {
    bytes: &'a [u8],
    ix: usize,
    /// Index just past the last tab consumed; treated as a tab stop.
    tab_start: usize,
    /// Columns of a partially consumed tab that are still available.
    spaces_remaining: usize,
    /// Thematic breaks cannot start before this index.
    min_hrule_offset: usize,
}

impl<'a> LineStart<'a> {
    pub(crate) fn new(bytes: &[u8]) -> LineStart<'_> {
        LineStart {
            bytes,
            ix: 0,
            tab_start: 0,
            spaces_remaining: 0,
            min_hrule_offset: 0,
        }
    }

    /// Consumes `n_space` columns of indentation. Returns true when all of
    /// them were available. Columns are consumed even on failure.
    pub(crate) fn scan_space(&mut self, n_space: usize) -> bool {
        self.consume_columns(n_space) == 0
    }

    /// Consumes up to `n_space` columns and returns how many were found.
    pub(crate) fn scan_space_upto(&mut self, n_space: usize) -> usize {
        n_space - self.consume_columns(n_space)
    }

    /// Returns the number of requested columns that could not be consumed.
    fn consume_columns(&mut self, wanted: usize) -> usize {
        let from_tab = self.spaces_remaining.min(wanted);
        self.spaces_remaining -= from_tab;
        let mut wanted = wanted - from_tab;

        while wanted > 0 {
            match self.bytes.get(self.ix) {
                Some(b' ') => {
                    self.ix += 1;
                    wanted -= 1;
                }
                Some(b'\t') => {
                    let width = 4 - (self.ix - self.tab_start) % 4;
                    self.ix += 1;
                    self.tab_start = self.ix;
                    let used = width.min(wanted);
                    wanted -= used;
                    self.spaces_remaining = width - used;
                }
                _ => break,
            }
        }
        wanted
    }

    /// Skips all spaces and tabs up to the line end.
    pub(crate) fn scan_all_space(&mut self) {
        self.spaces_remaining = 0;
        self.ix += scan_while(&self.bytes[self.ix..], |b| b == b' ' || b == b'\t');
    }

    /// True at a line ending or at the end of input.
    pub(crate) fn is_at_eol(&self) -> bool {
        matches!(self.bytes.get(self.ix), None | Some(b'\n') | Some(b'\r'))
    }

    fn scan_ch(&mut self, c: u8) -> bool {
        let found = self.bytes.get(self.ix) == Some(&c);
        if found {
            self.ix += 1;
        }
        found
    }

    /// Consumes `>` (after up to three columns) and one optional column.
    pub(crate) fn scan_blockquote_marker(&mut self) -> bool {
        let save = self.clone();
        let _ = self.scan_space(3);
        if self.scan_ch(b'>') {
            let _ = self.scan_space(1);
            true
        } else {
            *self = save;
            false
        }
    }

    /// Scans a list item marker.
    ///
    /// Returns the marker character (`-`, `+`, `*`, `.` or `)`), the start
    /// number for ordered markers and the content indent in columns.
    pub(crate) fn scan_list_marker(&mut self) -> Option<(u8, u64, usize)> {
        let save = self.clone();
        let indent = self.scan_space_upto(4);
        if indent < 4 {
            if let Some(found) = self.scan_marker_after_indent(indent) {
                return Some(found);
            }
        }
        *self = save;
        None
    }

    fn scan_marker_after_indent(&mut self, indent: usize) -> Option<(u8, u64, usize)> {
        let c = *self.bytes.get(self.ix)?;
        match c {
            b'-' | b'+' | b'*' => {
                if self.ix >= self.min_hrule_offset {
                    // a thematic break takes precedence over a bullet
                    match scan_hrule(&self.bytes[self.ix..]) {
                        Ok(_) => return None,
                        Err(min_offset) => self.min_hrule_offset = self.ix + min_offset,
                    }
                }
                self.ix += 1;
                if self.scan_space(1) || self.is_at_eol() {
                    return self.finish_list_marker(c, 0, indent + 2);
                }
                None
            }
            b'0'..=b'9' => {
                let start_ix = self.ix;
                let digits = scan_while(&self.bytes[start_ix..], |b| b.is_ascii_digit());
                if digits > 9 {
                    return None;
                }
                let value = self.bytes[start_ix..start_ix + digits]
                    .iter()
                    .fold(0u64, |acc, &d| acc * 10 + u64::from(d - b'0'));
                let delim = *self.bytes.get(start_ix + digits)?;
                if delim != b'.' && delim != b')' {
                    return None;
                }
                self.ix = start_ix + digits + 1;
                if self.scan_space(1) || self.is_at_eol() {
                    return self.finish_list_marker(delim, value, indent + digits + 2);
                }
                None
            }
            _ => None,
        }
    }

    /// Adds the spaces after the marker to the indent, unless there are
    /// five or more of them (then the content is indented code and only one
    /// column counts).
    fn finish_list_marker(&mut self, c: u8, start: u64, mut indent: usize) -> Option<(u8, u64, usize)> {
        let save = self.clone();

        if scan_blank_line(&self.bytes[self.ix..]).is_some() {
            return Some((c, start, indent));
        }

        let post_indent = self.scan_space_upto(4);
        if post_indent < 4 {
            indent += post_indent;
        } else {
            *self = save;
        }
        Some((c, start, indent))
    }

    pub(crate) fn bytes_scanned(&self) -> usize {
        self.ix
    }

    pub(crate) fn remaining_space(&self) -> usize {
        self.spaces_remaining
    }
}

pub(crate) fn is_ascii_whitespace(c: u8) -> bool {
    (0x09..=0x0d).contains(&c) || c == b' '
}

pub(crate) fn is_ascii_whitespace_no_nl(c: u8) -> bool {
    c == b'\t' || c == 0x0b || c == 0x0c || c == b' '
}

fn is_ascii_alpha(c: u8) -> bool {
    c.is_ascii_alphabetic()
}

fn is_ascii_alphanumeric(c: u8) -> bool {
    c.is_ascii_alphanumeric()
}

fn is_ascii_letterdigitdash(c: u8) -> bool {
    c == b'-' || is_ascii_alphanumeric(c)
}

fn is_valid_unquoted_attr_value_char(c: u8) -> bool {
    !matches!(
        c,
        b'\'' | b'"' | b' ' | b'\t' | b'=' | b'>' | b'<' | b'`' | b'\n' | b'\r'
    )
}

/// Returns 1 when `data` starts with `c`, else 0.
pub(crate) fn scan_ch(data: &[u8], c: u8) -> usize {
    usize::from(data.first() == Some(&c))
}

pub(crate) fn scan_while<F>(data: &[u8], mut f: F) -> usize
where
    F: FnMut(u8) -> bool,
{
    data.iter().take_while(|&&c| f(c)).count()
}

pub(crate) fn scan_rev_while<F>(data: &[u8], mut f: F) -> usize
where
    F: FnMut(u8) -> bool,
{
    data.iter().rev().take_while(|&&c| f(c)).count()
}

pub(crate) fn scan_ch_repeat(data: &[u8], c: u8) -> usize {
    scan_while(data, |x| x == c)
}

/// ASCII whitespace other than line endings.
pub(crate) fn scan_whitespace_no_nl(data: &[u8]) -> usize {
    scan_while(data, is_ascii_whitespace_no_nl)
}

/// Length of the line ending at the start of `bytes` (`\n`, `\r\n` or a lone
/// `\r`). End of input counts as a zero-length line ending.
pub(crate) fn scan_eol(bytes: &[u8]) -> Option<usize> {
    match bytes.first() {
        None => Some(0),
        Some(b'\n') => Some(1),
        Some(b'\r') => Some(if bytes.get(1) == Some(&b'\n') { 2 } else { 1 }),
        Some(_) => None,
    }
}

/// Length of a whitespace-only line, line ending included.
pub(crate) fn scan_blank_line(bytes: &[u8]) -> Option<usize> {
    let i = scan_whitespace_no_nl(bytes);
    scan_eol(&bytes[i..]).map(|n| i + n)
}

/// Offset of the start of the next line.
pub(crate) fn scan_nextline(bytes: &[u8]) -> usize {
    match memchr::memchr2(b'\n', b'\r', bytes) {
        Some(ix) => ix + scan_eol(&bytes[ix..]).unwrap_or(1),
        None => bytes.len(),
    }
}

/// Checks for a closing code fence of at least `n_fence_char` times
/// `fence_char`. Returns the offset of the line ending on success.
pub(crate) fn scan_closing_code_fence(bytes: &[u8], fence_char: u8, n_fence_char: usize) -> Option<usize> {
    if bytes.is_empty() {
        return Some(0);
    }
    let fence_len = scan_ch_repeat(bytes, fence_char);
    if fence_len < n_fence_char {
        return None;
    }
    let i = fence_len + scan_whitespace_no_nl(&bytes[fence_len..]);
    scan_eol(&bytes[i..]).map(|_| i)
}

/// Returns `(bytes, columns)` of the leading indentation, stopping once
/// `max` columns are reached.
pub(crate) fn calc_indent(text: &[u8], max: usize) -> (usize, usize) {
    let mut columns = 0;
    let mut offset = 0;

    for &b in text {
        let next = match b {
            b' ' => columns + 1,
            b'\t' => columns + 4 - (columns & 3),
            _ => break,
        };
        if next > max {
            break;
        }
        columns = next;
        offset += 1;
        if columns == max {
            break;
        }
    }

    (offset, columns)
}

/// Scans a thematic break.
///
/// `Ok(n)` is the length of the line, line ending included. `Err(n)` is an
/// offset before which no thematic break can start.
pub(crate) fn scan_hrule(bytes: &[u8]) -> Result<usize, usize> {
    let c = match bytes.first() {
        Some(&c) if c == b'*' || c == b'-' || c == b'_' => c,
        _ => return Err(0),
    };
    let mut count = 0;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'\n' | b'\r' => {
                i += scan_eol(&bytes[i..]).unwrap_or(0);
                break;
            }
            b if b == c => count += 1,
            b' ' | b'\t' => (),
            _ => return Err(i),
        }
        i += 1;
    }
    if count >= 3 {
        Ok(i)
    } else {
        Err(i)
    }
}

/// Scans an ATX heading opener and returns its level.
pub(crate) fn scan_atx_heading(data: &[u8]) -> Option<HeadingLevel> {
    let level = scan_ch_repeat(data, b'#');
    match data.get(level) {
        Some(&b) if !is_ascii_whitespace(b) => None,
        _ => HeadingLevel::try_from(level).ok(),
    }
}

/// Scans a setext underline. Returns the line length (ending included)
/// and the level it gives the heading.
pub(crate) fn scan_setext_heading(data: &[u8]) -> Option<(usize, HeadingLevel)> {
    let level = match *data.first()? {
        b'=' => HeadingLevel::H1,
        b'-' => HeadingLevel::H2,
        _ => return None,
    };
    let run = scan_ch_repeat(data, data[0]);
    let rest = scan_blank_line(&data[run..])?;
    Some((run + rest, level))
}

/// Scans a code fence opener. Returns the fence length and character.
pub(crate) fn scan_code_fence(data: &[u8]) -> Option<(usize, u8)> {
    let c = *data.first()?;
    if c != b'`' && c != b'~' {
        return None;
    }
    let n = scan_ch_repeat(data, c);
    if n < 3 {
        return None;
    }
    if c == b'`' {
        let line_end = n + scan_nextline(&data[n..]);
        // backtick fences cannot have backticks in their info string
        if memchr(b'`', &data[n..line_end]).is_some() {
            return None;
        }
    }
    Some((n, c))
}

/// Scans `>` plus one optional space at the start of `data`.
pub(crate) fn scan_blockquote_start(data: &[u8]) -> Option<usize> {
    if data.first() != Some(&b'>') {
        return None;
    }
    Some(1 + scan_ch(&data[1..], b' '))
}

/// Scans a list item marker at the start of `bytes` (no leading indent).
///
/// Returns bytes scanned, delimiter, start number and content indent.
pub(crate) fn scan_listitem(bytes: &[u8]) -> Option<(usize, u8, usize, usize)> {
    let mut c = *bytes.first()?;
    let (width, start) = match c {
        b'-' | b'+' | b'*' => (1, 0),
        b'0'..=b'9' => {
            let (length, start) = parse_decimal(bytes, 9);
            c = *bytes.get(length)?;
            if !(c == b'.' || c == b')') {
                return None;
            }
            (length + 1, start)
        }
        _ => return None,
    };
    let (mut post_bytes, mut post_indent) = calc_indent(&bytes[width..], 5);
    if post_indent == 0 {
        scan_eol(&bytes[width..])?;
        post_indent += 1;
    } else if post_indent > 4 {
        post_bytes = 1;
        post_indent = 1;
    }
    if scan_blank_line(&bytes[width..]).is_some() {
        post_bytes = 0;
        post_indent = 1;
    }
    Some((width + post_bytes, c, start, width + post_indent))
}

/// Parses up to `limit` decimal digits. Returns `(digits, value)`, stopping
/// early rather than overflowing.
fn parse_decimal(bytes: &[u8], limit: usize) -> (usize, usize) {
    let mut value = 0usize;
    let mut count = 0;
    for &b in bytes.iter().take(limit) {
        if !b.is_ascii_digit() {
            break;
        }
        match value
            .checked_mul(10)
            .and_then(|v| v.checked_add(usize::from(b - b'0')))
        {
            Some(v) => value = v,
            None => break,
        }
        count += 1;
    }
    (count, value)
}

/// Parses up to `limit` hexadecimal digits. Returns `(digits, value)`.
fn parse_hex(bytes: &[u8], limit: usize) -> (usize, usize) {
    let mut value = 0usize;
    let mut count = 0;
    for &b in bytes.iter().take(limit) {
        let digit = match (b as char).to_digit(16) {
            Some(d) => d as usize,
            None => break,
        };
        value = value * 16 + digit;
        count += 1;
    }
    (count, value)
}

/// Scans an entity or numeric character reference. `bytes[0]` is the `&`.
///
/// Returns the length of the reference and its expansion, or `(0, None)`
/// when there is no valid reference here. With `legacy` set, names from the
/// HTML5 legacy subset are also accepted without a trailing semicolon.
pub(crate) fn scan_entity(bytes: &[u8], legacy: bool) -> (usize, Option<CowStr<'static>>) {
    let mut end = 1;
    if scan_ch(&bytes[end..], b'#') == 1 {
        end += 1;
        let (digits, value) = if end < bytes.len() && bytes[end] | 0x20 == b'x' {
            end += 1;
            parse_hex(&bytes[end..], 6)
        } else {
            parse_decimal(&bytes[end..], 7)
        };
        end += digits;
        if digits == 0 || scan_ch(&bytes[end..], b';') == 0 {
            return (0, None);
        }
        let c = u32::try_from(value).map_or(char::REPLACEMENT_CHARACTER, entities::decode_numeric);
        return (end + 1, Some(c.into()));
    }

    end += scan_while(&bytes[end..], is_ascii_alphanumeric);
    if scan_ch(&bytes[end..], b';') == 1 {
        if let Some(value) = entities::get_entity(&bytes[1..end]) {
            return (end + 1, Some(value.into()));
        }
    }
    if legacy {
        // the legacy name must not be followed by an alphanumeric
        if let Some((len, value)) = entities::lookup_legacy_prefix(&bytes[1..end]) {
            if !bytes.get(len + 1).map_or(false, u8::is_ascii_alphanumeric) {
                return (len + 1, Some(value.into()));
            }
        }
    }
    (0, None)
}

/// Scans a link destination starting at `start_ix`. Returns the bytes
/// scanned and the raw (still escaped) destination.
///
/// Pointy destinations `<...>` may contain spaces but no line endings.
/// Bare destinations stop at whitespace or control characters and allow at
/// most `max_nest` levels of balanced parentheses.
pub(crate) fn scan_link_dest(data: &str, start_ix: usize, max_nest: usize) -> Option<(usize, &str)> {
    let bytes = &data.as_bytes()[start_ix..];
    let mut i = scan_ch(bytes, b'<');

    if i != 0 {
        while i < bytes.len() {
            match bytes[i] {
                b'\n' | b'\r' | b'<' => return None,
                b'>' => return Some((i + 1, &data[(start_ix + 1)..(start_ix + i)])),
                b'\\' if i + 1 < bytes.len() && is_ascii_punctuation(bytes[i + 1]) => {
                    i += 1;
                }
                _ => {}
            }
            i += 1;
        }
        return None;
    }

    let mut nest = 0;
    while i < bytes.len() {
        match bytes[i] {
            0x0..=0x20 | 0x7f => break,
            b'(' => {
                if nest >= max_nest {
                    return None;
                }
                nest += 1;
            }
            b')' => {
                if nest == 0 {
                    break;
                }
                nest -= 1;
            }
            b'\\' if i + 1 < bytes.len() && is_ascii_punctuation(bytes[i + 1]) => {
                i += 1;
            }
            _ => {}
        }
        i += 1;
    }
    if nest != 0 {
        return None;
    }
    Some((i, &data[start_ix..(start_ix + i)]))
}

type NewlineHandler<'h> = Option<&'h dyn Fn(&[u8]) -> usize>;

/// Collects the bytes of an HTML construct that spans container prefixes.
///
/// When a newline handler skips bytes after a line ending, everything up to
/// the line ending is copied into `buffer` so the skipped prefix can be
/// dropped from the final text.
struct SpanBuffer {
    buffer: Vec<u8>,
    copied_up_to: usize,
}

impl SpanBuffer {
    fn skip(&mut self, data: &[u8], from: usize, n: usize) {
        if n > 0 {
            self.buffer.extend_from_slice(&data[self.copied_up_to..from]);
            self.copied_up_to = from + n;
        }
    }

    /// Skips whitespace, following line endings through the handler.
    fn whitespace(&mut self, data: &[u8], mut i: usize, handler: NewlineHandler) -> Option<usize> {
        while let Some(&b) = data.get(i) {
            if !is_ascii_whitespace(b) {
                break;
            }
            match scan_eol(&data[i..]) {
                Some(eol) => {
                    let handler = handler?;
                    i += eol;
                    let skipped = handler(&data[i..]);
                    self.skip(data, i, skipped);
                    i += skipped;
                }
                None => i += 1,
            }
        }
        Some(i)
    }
}

fn scan_attribute_name(data: &[u8]) -> Option<usize> {
    let (&c, tail) = data.split_first()?;
    if is_ascii_alpha(c) || c == b'_' || c == b':' {
        Some(
            1 + scan_while(tail, |c| {
                is_ascii_alphanumeric(c) || matches!(c, b'_' | b'.' | b':' | b'-')
            }),
        )
    } else {
        None
    }
}

/// Scans one attribute starting at `ix`. Returns the index after it.
fn scan_attribute(data: &[u8], ix: usize, handler: NewlineHandler, span: &mut SpanBuffer) -> Option<usize> {
    let after_name = ix + scan_attribute_name(&data[ix..])?;
    // look ahead for `=` without committing the whitespace to the buffer
    let mut probe = SpanBuffer {
        buffer: Vec::new(),
        copied_up_to: span.copied_up_to,
    };
    let eq_ix = probe.whitespace(data, after_name, handler)?;
    if scan_ch(&data[eq_ix..], b'=') == 0 {
        // whitespace belongs to the next attribute
        return Some(after_name);
    }
    let eq_ix = span.whitespace(data, after_name, handler)?;
    let value_ix = span.whitespace(data, eq_ix + 1, handler)?;
    scan_attribute_value(data, value_ix, handler, span)
}

fn scan_attribute_value(data: &[u8], mut i: usize, handler: NewlineHandler, span: &mut SpanBuffer) -> Option<usize> {
    match *data.get(i)? {
        quote @ (b'"' | b'\'') => {
            i += 1;
            while let Some(&b) = data.get(i) {
                if b == quote {
                    return Some(i + 1);
                }
                match scan_eol(&data[i..]) {
                    Some(eol) => {
                        let handler = handler?;
                        i += eol;
                        let skipped = handler(&data[i..]);
                        span.skip(data, i, skipped);
                        i += skipped;
                    }
                    None => i += 1,
                }
            }
            None
        }
        b if !is_valid_unquoted_attr_value_char(b) => None,
        _ => Some(i + scan_while(&data[i..], is_valid_unquoted_attr_value_char)),
    }
}

/// Removes backslash escapes and resolves character references.
pub(crate) fn unescape<'a, I: Into<CowStr<'a>>>(input: I, legacy_entities: bool) -> CowStr<'a> {
    let input = input.into();
    let bytes = input.as_bytes();
    let mut result = String::new();
    let mut mark = 0;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' if i + 1 < bytes.len() && is_ascii_punctuation(bytes[i + 1]) => {
                result.push_str(&input[mark..i]);
                mark = i + 1;
                i += 2;
            }
            b'&' => match scan_entity(&bytes[i..], legacy_entities) {
                (n, Some(value)) => {
                    result.push_str(&input[mark..i]);
                    result.push_str(&value);
                    i += n;
                    mark = i;
                }
                _ => i += 1,
            },
            b'\r' => {
                result.push_str(&input[mark..i]);
                i += 1;
                mark = i;
            }
            _ => i += 1,
        }
    }
    if mark == 0 {
        input
    } else {
        result.push_str(&input[mark..]);
        result.into()
    }
}

/// Start condition 6. `data` begins right after the `<`.
pub(crate) fn starts_html_block_type_6(data: &[u8]) -> bool {
    let tail = &data[scan_ch(data, b'/')..];
    let n = scan_while(tail, is_ascii_alphanumeric);
    if !is_html_tag(&tail[..n]) {
        return false;
    }
    match &tail[n..] {
        [] => true,
        [b' ' | b'\t' | b'\r' | b'\n' | b'>', ..] => true,
        rest => rest.starts_with(b"/>"),
    }
}

fn is_html_tag(tag: &[u8]) -> bool {
    HTML_TAGS
        .binary_search_by(|probe| {
            // probes are lowercase ASCII, so folding the tag suffices
            probe
                .bytes()
                .cmp(tag.iter().map(|&b| b.to_ascii_lowercase()))
        })
        .is_ok()
}

/// Start condition 7: a complete open or closing tag alone on its line.
/// `data` starts with `<`; returns the index just past the tag.
pub(crate) fn scan_html_type_7(data: &[u8]) -> Option<usize> {
    let (_, i) = scan_html_block_inner(data, None)?;
    scan_blank_line(&data[i..])?;
    Some(i)
}

/// Scans an open or closing tag. `data` starts with `<`.
///
/// Returns the tag text when container prefixes had to be skipped (empty
/// otherwise) and the index just past the tag.
pub(crate) fn scan_html_block_inner(data: &[u8], handler: NewlineHandler) -> Option<(Vec<u8>, usize)> {
    let mut span = SpanBuffer {
        buffer: Vec::new(),
        copied_up_to: 0,
    };

    let closing = scan_ch(&data[1..], b'/');
    let name_len = scan_while(&data[(1 + closing)..], is_ascii_alpha);
    if name_len == 0 {
        return None;
    }
    let mut i = 1 + closing + name_len;
    i += scan_while(&data[i..], is_ascii_letterdigitdash);

    if closing == 0 {
        loop {
            let before_ws = i;
            i += scan_whitespace_no_nl(&data[i..]);
            while let Some(eol) = scan_eol(&data[i..]) {
                if eol == 0 {
                    return None;
                }
                let handler = handler?;
                i += eol;
                let skipped = handler(&data[i..]);
                span.skip(data, i, skipped);
                i += skipped;
                i += scan_whitespace_no_nl(&data[i..]);
            }
            if matches!(data.get(i), Some(b'/') | Some(b'>')) {
                break;
            }
            if before_ws == i {
                // attributes must be preceded by whitespace
                return None;
            }
            i = scan_attribute(data, i, handler, &mut span)?;
        }
    }

    i += scan_whitespace_no_nl(&data[i..]);
    if closing == 0 {
        i += scan_ch(&data[i..], b'/');
    }
    if scan_ch(&data[i..], b'>') == 0 {
        return None;
    }
    i += 1;
    if !span.buffer.is_empty() {
        span.buffer.extend_from_slice(&data[span.copied_up_to..i]);
    }
    Some((span.buffer, i))
}

/// Scans an autolink body after `<`. Returns the index after `>`, the
/// destination text and whether it is a URI or an e-mail address.
pub(crate) fn scan_autolink(text: &str, start_ix: usize) -> Option<(usize, CowStr<'_>, LinkType)> {
    scan_uri(text, start_ix)
        .map(|(ix, uri)| (ix, uri, LinkType::Autolink))
        .or_else(|| scan_email(text, start_ix).map(|(ix, addr)| (ix, addr, LinkType::Email)))
}

fn scan_uri(text: &str, start_ix: usize) -> Option<(usize, CowStr<'_>)> {
    let bytes = &text.as_bytes()[start_ix..];

    if !is_ascii_alpha(*bytes.first()?) {
        return None;
    }
    let scheme_len = 1 + scan_while(&bytes[1..], |c| {
        is_ascii_alphanumeric(c) || matches!(c, b'.' | b'-' | b'+')
    });
    // scheme of 2 to 32 characters followed by a colon
    if !(2..=32).contains(&scheme_len) || bytes.get(scheme_len) != Some(&b':') {
        return None;
    }

    let mut i = scheme_len + 1;
    while let Some(&b) = bytes.get(i) {
        match b {
            b'>' => return Some((start_ix + i + 1, text[start_ix..(start_ix + i)].into())),
            b'\0'..=b' ' | b'<' | 0x7f => return None,
            _ => i += 1,
        }
    }
    None
}

fn scan_email(text: &str, start_ix: usize) -> Option<(usize, CowStr<'_>)> {
    let bytes = &text.as_bytes()[start_ix..];

    let local_len = scan_while(bytes, |c| {
        is_ascii_alphanumeric(c)
            || matches!(
                c,
                b'.' | b'!' | b'#' | b'$' | b'%' | b'&' | b'\'' | b'*' | b'+' | b'/' | b'='
                    | b'?' | b'^' | b'_' | b'`' | b'{' | b'|' | b'}' | b'~' | b'-'
            )
    });
    if local_len == 0 || bytes.get(local_len) != Some(&b'@') {
        return None;
    }
    let mut i = local_len + 1;

    loop {
        let label_len = scan_while(&bytes[i..], is_ascii_letterdigitdash);
        let label = &bytes[i..i + label_len];
        if label.is_empty()
            || label.len() > 63
            || label[0] == b'-'
            || label[label.len() - 1] == b'-'
        {
            return None;
        }
        i += label_len;
        if scan_ch(&bytes[i..], b'.') == 0 {
            break;
        }
        i += 1;
    }

    if scan_ch(&bytes[i..], b'>') == 0 {
        return None;
    }
    Some((start_ix + i + 1, text[start_ix..(start_ix + i)].into()))
}

/// Scans a comment, declaration or CDATA section. `bytes[ix]` is the byte
/// right after `<!`. Returns the index after the construct.
pub(crate) fn scan_inline_html_comment(bytes: &[u8], mut ix: usize, scan_guard: &mut HtmlScanGuard) -> Option<usize> {
    let c = *bytes.get(ix)?;
    ix += 1;
    match c {
        b'-' => {
            if *bytes.get(ix)? != b'-' {
                return None;
            }
            // `<!-->` and `<!--->` are complete comments
            let body = ix + 1;
            for shortcut in [&b">"[..], &b"->"[..]] {
                if bytes[body..].starts_with(shortcut) {
                    return Some(body + shortcut.len());
                }
            }
            if body <= scan_guard.comment {
                return None;
            }
            let mut search = body;
            while let Some(x) = memchr(b'-', &bytes[search..]) {
                search += x + 1;
                if bytes[search..].starts_with(b"->") {
                    return Some(search + 2);
                }
            }
            scan_guard.comment = bytes.len();
            None
        }
        b'[' if bytes[ix..].starts_with(b"CDATA[") && ix > scan_guard.cdata => {
            ix += b"CDATA[".len();
            let mut search = ix;
            while let Some(x) = memchr(b']', &bytes[search..]) {
                search += x + 1;
                if bytes[search..].starts_with(b"]>") {
                    return Some(search + 2);
                }
            }
            scan_guard.cdata = bytes.len();
            None
        }
        _ if c.is_ascii_alphabetic() && ix > scan_guard.declaration => {
            match memchr(b'>', &bytes[ix..]) {
                Some(x) => Some(ix + x + 1),
                None => {
                    scan_guard.declaration = bytes.len();
                    None
                }
            }
        }
        _ => None,
    }
}

/// Scans a processing instruction. `ix` is the index right after `<?`.
pub(crate) fn scan_inline_html_processing(bytes: &[u8], mut ix: usize, scan_guard: &mut HtmlScanGuard) -> Option<usize> {
    if ix <= scan_guard.processing {
        return None;
    }
    while let Some(offset) = memchr(b'?', &bytes[ix..]) {
        ix += offset + 1;
        if scan_ch(&bytes[ix..], b'>') == 1 {
            return Some(ix + 1);
        }
    }
    scan_guard.processing = ix;
    None
}
