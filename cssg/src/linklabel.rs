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

//! Link label parsing and matching.

use unicase::UniCase;

use crate::scanners::scan_eol;
use crate::strings::CowStr;

/// Normalized link label. Comparison uses Unicode case folding.
pub(crate) type LinkLabel<'a> = UniCase<CowStr<'a>>;

/// Labels longer than this many characters are not labels.
const LINK_LABEL_MAX_CHARS: usize = 999;

fn is_label_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r')
}

/// Scans `[label]` at the start of `text`.
///
/// Returns the number of bytes consumed, brackets included, and the
/// normalized label.
pub(crate) fn scan_link_label<'a>(
    text: &'a str,
    linebreak_handler: &dyn Fn(&[u8]) -> Option<usize>,
) -> Option<(usize, CowStr<'a>)> {
    if text.len() < 2 || text.as_bytes()[0] != b'[' {
        return None;
    }
    let (n, label) = scan_link_label_rest(&text[1..], linebreak_handler)?;
    Some((n + 1, label))
}

/// Scans a label whose opening bracket was already consumed.
///
/// Whitespace runs (line endings included) collapse to one space and the
/// ends are trimmed. After each line ending `linebreak_handler` is given the
/// rest of the input and returns how many container-prefix bytes to skip, or
/// `None` when the label cannot continue onto that line.
///
/// Returns the number of bytes read, closing bracket included.
pub(crate) fn scan_link_label_rest<'t>(
    text: &'t str,
    linebreak_handler: &dyn Fn(&[u8]) -> Option<usize>,
) -> Option<(usize, CowStr<'t>)> {
    let bytes = text.as_bytes();
    let mut ix = 0;
    let mut chars = 0;
    let mut label = String::new();
    let mut pending_space = false;

    loop {
        let c = text[ix..].chars().next()?;
        chars += 1;
        if chars > LINK_LABEL_MAX_CHARS + 1 {
            return None;
        }
        match c {
            '[' => return None,
            ']' => {
                ix += 1;
                break;
            }
            '\n' | '\r' => {
                ix += scan_eol(&bytes[ix..]).unwrap_or(1);
                ix += linebreak_handler(&bytes[ix..])?;
                pending_space = true;
                continue;
            }
            c if is_label_whitespace(c) => {
                pending_space = true;
            }
            _ => {
                if pending_space && !label.is_empty() {
                    label.push(' ');
                }
                pending_space = false;
                label.push(c);
                if c == '\\' {
                    if let Some(next) = text[ix + 1..].chars().next() {
                        if !is_label_whitespace(next) {
                            label.push(next);
                            ix += next.len_utf8();
                            chars += 1;
                        }
                    }
                }
            }
        }
        ix += c.len_utf8();
    }

    if label.is_empty() {
        return None;
    }
    let content = &text[..ix - 1];
    let cow = if content == label {
        CowStr::Borrowed(content)
    } else {
        label.into()
    };
    Some((ix, cow))
}
