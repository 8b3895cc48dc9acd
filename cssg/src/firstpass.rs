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

//! The first pass resolves all block structure and collects link reference
//! definitions. Within a leaf block, items form a linear chain in which
//! potential inline markup is only marked, not resolved.

use std::cmp::max;

use log::trace;
use unicase::UniCase;

use crate::linklabel::{scan_link_label_rest, LinkLabel};
use crate::parse::{scan_containers, Allocations, Item, ItemBody, LinkDef, LINK_MAX_NESTED_PARENS};
use crate::puncttable::{is_ascii_punctuation, is_punctuation};
use crate::scanners::*;
use crate::strings::CowStr;
use crate::tree::{Tree, TreeIndex};
use crate::{HeadingLevel, Options};

/// Runs the first pass, which resolves the block structure of the document,
/// and returns the resulting tree.
pub(crate) fn run_first_pass(text: &str, options: Options) -> (Tree<Item>, Allocations<'_>) {
    // rough guess at the number of nodes
    let start_capacity = max(128, text.len() / 32);
    let lookup_table = &special_bytes(options);
    let first_pass = FirstPass {
        text,
        tree: Tree::with_capacity(start_capacity),
        begin_list_item: None,
        last_line_blank: false,
        allocs: Allocations::new(),
        options,
        lookup_table,
    };
    first_pass.run()
}

/// State for the first parsing pass.
struct FirstPass<'a, 'b> {
    text: &'a str,
    tree: Tree<Item>,
    /// Set while the innermost list item has only seen its marker line.
    begin_list_item: Option<usize>,
    last_line_blank: bool,
    allocs: Allocations<'a>,
    options: Options,
    lookup_table: &'b LookupTable,
}

impl<'a, 'b> FirstPass<'a, 'b> {
    fn run(mut self) -> (Tree<Item>, Allocations<'a>) {
        let mut ix = 0;
        while ix < self.text.len() {
            ix = self.parse_block(ix);
        }
        for _ in 0..self.tree.spine_len() {
            self.pop(ix);
        }
        (self.tree, self.allocs)
    }

    fn legacy_entities(&self) -> bool {
        self.options.contains(Options::LEGACY_ENTITIES)
    }

    /// Returns offset after block.
    fn parse_block(&mut self, mut start_ix: usize) -> usize {
        let bytes = self.text.as_bytes();
        let mut line_start = LineStart::new(&bytes[start_ix..]);

        let i = scan_containers(&self.tree, &mut line_start);
        for _ in i..self.tree.spine_len() {
            self.pop(start_ix);
        }

        // Process new containers
        loop {
            let container_start = start_ix + line_start.bytes_scanned();
            if let Some((ch, index, indent)) = line_start.scan_list_marker() {
                let after_marker_index = start_ix + line_start.bytes_scanned();
                self.continue_list(container_start, ch, index);
                self.tree.append(Item {
                    start: container_start,
                    end: after_marker_index, // updated later if the item has content
                    body: ItemBody::ListItem(indent),
                });
                self.tree.push();
                if let Some(n) = scan_blank_line(&bytes[after_marker_index..]) {
                    self.begin_list_item = Some(after_marker_index + n);
                    return after_marker_index + n;
                }
            } else if line_start.scan_blockquote_marker() {
                self.finish_list(start_ix);
                self.tree.append(Item {
                    start: container_start,
                    end: 0, // set later
                    body: ItemBody::BlockQuote,
                });
                self.tree.push();
            } else {
                break;
            }
        }

        let ix = start_ix + line_start.bytes_scanned();

        if let Some(n) = scan_blank_line(&bytes[ix..]) {
            if let Some(node_ix) = self.tree.peek_up() {
                match &mut self.tree[node_ix].item.body {
                    ItemBody::BlockQuote => (),
                    ItemBody::ListItem(indent) if self.begin_list_item.is_some() => {
                        self.last_line_blank = true;
                        // An item that starts with a blank line can be
                        // continued by later items but can hold nothing else.
                        *indent = 0;
                    }
                    _ => {
                        self.last_line_blank = true;
                    }
                }
            }
            return ix + n;
        }

        self.finish_list(start_ix);

        // needed by HTML blocks, which keep the partial tab of their first line
        let remaining_space = line_start.remaining_space();

        let indent = line_start.scan_space_upto(4);
        if indent == 4 {
            let ix = start_ix + line_start.bytes_scanned();
            let remaining_space = line_start.remaining_space();
            return self.parse_indented_code_block(ix, remaining_space);
        }

        let ix = start_ix + line_start.bytes_scanned();

        if bytes[ix] == b'<' {
            // types 1 to 5 end on a marker line rather than a blank line
            if let Some(html_end_tag) = get_html_end_tag(&bytes[(ix + 1)..]) {
                return self.parse_html_block_type_1_to_5(ix, html_end_tag, remaining_space, indent);
            }

            if starts_html_block_type_6(&bytes[(ix + 1)..]) || scan_html_type_7(&bytes[ix..]).is_some() {
                return self.parse_html_block_type_6_or_7(ix, remaining_space, indent);
            }
        }

        if let Ok(n) = scan_hrule(&bytes[ix..]) {
            return self.parse_hrule(n, ix);
        }

        if let Some(atx_level) = scan_atx_heading(&bytes[ix..]) {
            return self.parse_atx_heading(ix, atx_level);
        }

        if let Some((n, fence_ch)) = scan_code_fence(&bytes[ix..]) {
            return self.parse_fenced_code_block(ix, indent, fence_ch, n);
        }

        while let Some((bytecount, label, link_def)) =
            self.parse_refdef_total(start_ix + line_start.bytes_scanned())
        {
            trace!("reference definition [{}] -> {}", label.as_ref(), link_def.dest);
            self.allocs.refdefs.0.entry(label).or_insert(link_def);
            let container_start = start_ix + line_start.bytes_scanned();
            let mut ix = container_start + bytecount;
            // A definition behaves like paragraph text for lazy continuation:
            // `> [foo]: /url` followed by `bar` keeps `bar` in the quote.
            if let Some(nl) = scan_blank_line(&bytes[ix..]) {
                ix += nl;
                let mut lazy_line_start = LineStart::new(&bytes[ix..]);
                let current_container =
                    scan_containers(&self.tree, &mut lazy_line_start) == self.tree.spine_len();
                if !lazy_line_start.scan_space(4)
                    && scan_paragraph_interrupt(
                        &bytes[ix + lazy_line_start.bytes_scanned()..],
                        current_container,
                    )
                {
                    return ix;
                } else {
                    line_start = lazy_line_start;
                    line_start.scan_all_space();
                    start_ix = ix;
                }
            } else {
                return ix;
            }
        }

        let ix = start_ix + line_start.bytes_scanned();

        self.parse_paragraph(ix)
    }

    /// Returns offset of line start after paragraph.
    fn parse_paragraph(&mut self, start_ix: usize) -> usize {
        let node_ix = self.tree.append(Item {
            start: start_ix,
            end: 0, // set later
            body: ItemBody::Paragraph,
        });
        self.tree.push();

        let bytes = self.text.as_bytes();
        let mut ix = start_ix;
        loop {
            let (next_ix, brk) = self.parse_line(ix);

            ix = next_ix;
            let mut line_start = LineStart::new(&bytes[ix..]);
            let current_container =
                scan_containers(&self.tree, &mut line_start) == self.tree.spine_len();
            // a backslash before the final line ending is literal
            let trailing_backslash_pos = match brk {
                Some(Item {
                    start,
                    body: ItemBody::HardBreak(true),
                    ..
                }) if bytes[start] == b'\\' => Some(start),
                _ => None,
            };
            if !line_start.scan_space(4) {
                let ix_new = ix + line_start.bytes_scanned();
                if current_container {
                    if let Some(ix_setext) =
                        self.parse_setext_heading(ix_new, node_ix, trailing_backslash_pos.is_some())
                    {
                        if let Some(pos) = trailing_backslash_pos {
                            self.tree.append_text(pos, pos + 1);
                        }
                        ix = ix_setext;
                        break;
                    }
                }
                if scan_paragraph_interrupt(&bytes[ix_new..], current_container) {
                    if let Some(pos) = trailing_backslash_pos {
                        self.tree.append_text(pos, pos + 1);
                    }
                    break;
                }
            }
            line_start.scan_all_space();
            if line_start.is_at_eol() {
                if let Some(pos) = trailing_backslash_pos {
                    self.tree.append_text(pos, pos + 1);
                }
                break;
            }
            ix = next_ix + line_start.bytes_scanned();
            if let Some(item) = brk {
                self.tree.append(item);
            }
        }

        self.pop(ix);
        ix
    }

    /// Turns the open paragraph `node_ix` into a setext heading when the line
    /// at `ix` is an underline. Returns the offset after the underline.
    fn parse_setext_heading(
        &mut self,
        ix: usize,
        node_ix: TreeIndex,
        has_trailing_content: bool,
    ) -> Option<usize> {
        let bytes = self.text.as_bytes();
        let (n, level) = scan_setext_heading(&bytes[ix..])?;

        if let Some(cur_ix) = self.tree.cur() {
            let header_start = self.tree[node_ix].item.start;
            // the paragraph end is not known yet; its last child bounds it
            let header_end = self.tree[cur_ix].item.end;
            let new_end = if has_trailing_content {
                header_end
            } else {
                let trailing_ws =
                    scan_rev_while(&bytes[header_start..header_end], is_ascii_whitespace_no_nl);
                header_end - trailing_ws
            };
            self.tree[cur_ix].item.end = max(new_end, self.tree[cur_ix].item.start);
        }

        self.tree[node_ix].item.body = ItemBody::Heading(level);

        Some(ix + n)
    }

    /// Parses one line of paragraph or heading text, appending text and
    /// potential inline markup to the tree.
    ///
    /// Returns the offset after the line and the item for its line break.
    fn parse_line(&mut self, start: usize) -> (usize, Option<Item>) {
        let bytes = self.text.as_bytes();
        let bytes_len = bytes.len();
        let legacy_entities = self.legacy_entities();
        let mut begin_text = start;

        let (final_ix, brk) = iterate_special_bytes(self.lookup_table, bytes, start, |ix, byte| {
            match byte {
                b'\n' | b'\r' => {
                    let mut i = ix;
                    let eol_bytes = scan_eol(&bytes[ix..]).unwrap_or(1);

                    let end_ix = ix + eol_bytes;
                    let trailing_backslashes = scan_rev_while(&bytes[begin_text..ix], |b| b == b'\\');
                    if trailing_backslashes % 2 == 1 && end_ix < bytes_len {
                        i -= 1;
                        self.tree.append_text(begin_text, i);
                        return LoopInstruction::BreakAtWith(
                            end_ix,
                            Some(Item {
                                start: i,
                                end: end_ix,
                                body: ItemBody::HardBreak(true),
                            }),
                        );
                    }

                    let trailing_whitespace =
                        scan_rev_while(&bytes[begin_text..ix], is_ascii_whitespace_no_nl);
                    if trailing_whitespace >= 2 {
                        i -= trailing_whitespace;
                        self.tree.append_text(begin_text, i);
                        return LoopInstruction::BreakAtWith(
                            end_ix,
                            Some(Item {
                                start: i,
                                end: end_ix,
                                body: ItemBody::HardBreak(false),
                            }),
                        );
                    }

                    self.tree.append_text(begin_text, ix - trailing_whitespace);

                    LoopInstruction::BreakAtWith(
                        end_ix,
                        Some(Item {
                            start: i,
                            end: end_ix,
                            body: ItemBody::SoftBreak,
                        }),
                    )
                }
                b'\\' => {
                    if ix + 1 < bytes_len && is_ascii_punctuation(bytes[ix + 1]) {
                        self.tree.append_text(begin_text, ix);
                        if bytes[ix + 1] == b'`' {
                            let count = 1 + scan_ch_repeat(&bytes[(ix + 2)..], b'`');
                            self.tree.append(Item {
                                start: ix + 1,
                                end: ix + count + 1,
                                body: ItemBody::MaybeCode(count, true),
                            });
                            begin_text = ix + 1 + count;
                            LoopInstruction::ContinueAndSkip(count)
                        } else {
                            begin_text = ix + 1;
                            LoopInstruction::ContinueAndSkip(1)
                        }
                    } else {
                        LoopInstruction::ContinueAndSkip(0)
                    }
                }
                c @ b'*' | c @ b'_' => {
                    let string_suffix = &self.text[ix..];
                    let count = 1 + scan_ch_repeat(&string_suffix.as_bytes()[1..], c);
                    let can_open = delim_run_can_open(&self.text[start..], string_suffix, count, ix - start);
                    let can_close = delim_run_can_close(&self.text[start..], string_suffix, count, ix - start);

                    if can_open || can_close {
                        self.tree.append_text(begin_text, ix);
                        for i in 0..count {
                            self.tree.append(Item {
                                start: ix + i,
                                end: ix + i + 1,
                                body: ItemBody::MaybeEmphasis(count - i, can_open, can_close),
                            });
                        }
                        begin_text = ix + count;
                    }
                    LoopInstruction::ContinueAndSkip(count - 1)
                }
                b'`' => {
                    self.tree.append_text(begin_text, ix);
                    let count = 1 + scan_ch_repeat(&bytes[(ix + 1)..], b'`');
                    self.tree.append(Item {
                        start: ix,
                        end: ix + count,
                        body: ItemBody::MaybeCode(count, false),
                    });
                    begin_text = ix + count;
                    LoopInstruction::ContinueAndSkip(count - 1)
                }
                b'<' if bytes.get(ix + 1) != Some(&b'\\') => {
                    self.tree.append_text(begin_text, ix);
                    self.tree.append(Item {
                        start: ix,
                        end: ix + 1,
                        body: ItemBody::MaybeHtml,
                    });
                    begin_text = ix + 1;
                    LoopInstruction::ContinueAndSkip(0)
                }
                b'!' => {
                    if ix + 1 < bytes_len && bytes[ix + 1] == b'[' {
                        self.tree.append_text(begin_text, ix);
                        self.tree.append(Item {
                            start: ix,
                            end: ix + 2,
                            body: ItemBody::MaybeImage,
                        });
                        begin_text = ix + 2;
                        LoopInstruction::ContinueAndSkip(1)
                    } else {
                        LoopInstruction::ContinueAndSkip(0)
                    }
                }
                b'[' => {
                    self.tree.append_text(begin_text, ix);
                    self.tree.append(Item {
                        start: ix,
                        end: ix + 1,
                        body: ItemBody::MaybeLinkOpen,
                    });
                    begin_text = ix + 1;
                    LoopInstruction::ContinueAndSkip(0)
                }
                b']' => {
                    self.tree.append_text(begin_text, ix);
                    self.tree.append(Item {
                        start: ix,
                        end: ix + 1,
                        body: ItemBody::MaybeLinkClose(true),
                    });
                    begin_text = ix + 1;
                    LoopInstruction::ContinueAndSkip(0)
                }
                b'&' => match scan_entity(&bytes[ix..], legacy_entities) {
                    (n, Some(value)) => {
                        self.tree.append_text(begin_text, ix);
                        self.tree.append(Item {
                            start: ix,
                            end: ix + n,
                            body: ItemBody::SynthesizeText(self.allocs.allocate_cow(value)),
                        });
                        begin_text = ix + n;
                        LoopInstruction::ContinueAndSkip(n - 1)
                    }
                    _ => LoopInstruction::ContinueAndSkip(0),
                },
                b'.' => {
                    if bytes[ix..].starts_with(b"...") {
                        self.tree.append_text(begin_text, ix);
                        self.tree.append(Item {
                            start: ix,
                            end: ix + 3,
                            body: ItemBody::SynthesizeChar('…'),
                        });
                        begin_text = ix + 3;
                        LoopInstruction::ContinueAndSkip(2)
                    } else {
                        LoopInstruction::ContinueAndSkip(0)
                    }
                }
                b'-' => {
                    let count = 1 + scan_ch_repeat(&bytes[(ix + 1)..], b'-');
                    if count == 1 {
                        LoopInstruction::ContinueAndSkip(0)
                    } else {
                        let itembody = match count {
                            2 => ItemBody::SynthesizeChar('–'),
                            3 => ItemBody::SynthesizeChar('—'),
                            _ => {
                                let (ems, ens) = dash_distribution(count);
                                let mut buf = String::with_capacity(3 * (ems + ens));
                                buf.extend(std::iter::repeat('—').take(ems));
                                buf.extend(std::iter::repeat('–').take(ens));
                                ItemBody::SynthesizeText(self.allocs.allocate_cow(buf.into()))
                            }
                        };

                        self.tree.append_text(begin_text, ix);
                        self.tree.append(Item {
                            start: ix,
                            end: ix + count,
                            body: itembody,
                        });
                        begin_text = ix + count;
                        LoopInstruction::ContinueAndSkip(count - 1)
                    }
                }
                c @ b'\'' | c @ b'"' => {
                    let string_suffix = &self.text[ix..];
                    let can_open = delim_run_can_open(&self.text[start..], string_suffix, 1, ix - start);
                    let can_close = delim_run_can_close(&self.text[start..], string_suffix, 1, ix - start);

                    self.tree.append_text(begin_text, ix);
                    self.tree.append(Item {
                        start: ix,
                        end: ix + 1,
                        body: ItemBody::MaybeSmartQuote(c, can_open, can_close),
                    });
                    begin_text = ix + 1;

                    LoopInstruction::ContinueAndSkip(0)
                }
                _ => LoopInstruction::ContinueAndSkip(0),
            }
        });

        if brk.is_none() {
            // need to close text at eof
            let trailing_whitespace =
                scan_rev_while(&bytes[begin_text..final_ix], is_ascii_whitespace_no_nl);
            self.tree.append_text(begin_text, final_ix - trailing_whitespace);
        }
        (final_ix, brk)
    }

    /// Parses an HTML block of types 1 to 5, which ends on the first line
    /// containing `html_end_tag` (or when its container ends).
    fn parse_html_block_type_1_to_5(
        &mut self,
        start_ix: usize,
        html_end_tag: &str,
        mut remaining_space: usize,
        mut indent: usize,
    ) -> usize {
        self.tree.append(Item {
            start: start_ix,
            end: 0, // set later
            body: ItemBody::HtmlBlock,
        });
        self.tree.push();

        let bytes = self.text.as_bytes();
        let mut ix = start_ix;
        let end_ix;
        loop {
            let line_start_ix = ix;
            ix += scan_nextline(&bytes[ix..]);
            self.append_html_line(remaining_space.max(indent), line_start_ix, ix);

            let mut line_start = LineStart::new(&bytes[ix..]);
            let n_containers = scan_containers(&self.tree, &mut line_start);
            if n_containers < self.tree.spine_len() {
                end_ix = ix;
                break;
            }

            if contains_ignore_ascii_case(&bytes[line_start_ix..ix], html_end_tag.as_bytes()) {
                end_ix = ix;
                break;
            }

            let next_line_ix = ix + line_start.bytes_scanned();
            if next_line_ix == self.text.len() {
                end_ix = next_line_ix;
                break;
            }
            ix = next_line_ix;
            remaining_space = line_start.remaining_space();
            indent = 0;
        }
        self.pop(end_ix);
        ix
    }

    /// Parses an HTML block of type 6 or 7, which runs until a blank line.
    fn parse_html_block_type_6_or_7(
        &mut self,
        start_ix: usize,
        mut remaining_space: usize,
        mut indent: usize,
    ) -> usize {
        self.tree.append(Item {
            start: start_ix,
            end: 0, // set later
            body: ItemBody::HtmlBlock,
        });
        self.tree.push();

        let bytes = self.text.as_bytes();
        let mut ix = start_ix;
        let end_ix;
        loop {
            let line_start_ix = ix;
            ix += scan_nextline(&bytes[ix..]);
            self.append_html_line(remaining_space.max(indent), line_start_ix, ix);

            let mut line_start = LineStart::new(&bytes[ix..]);
            let n_containers = scan_containers(&self.tree, &mut line_start);
            if n_containers < self.tree.spine_len() || line_start.is_at_eol() {
                end_ix = ix;
                break;
            }

            let next_line_ix = ix + line_start.bytes_scanned();
            if next_line_ix == self.text.len() || scan_blank_line(&bytes[next_line_ix..]).is_some() {
                end_ix = next_line_ix;
                break;
            }
            ix = next_line_ix;
            remaining_space = line_start.remaining_space();
            indent = 0;
        }
        self.pop(end_ix);
        ix
    }

    fn parse_indented_code_block(&mut self, start_ix: usize, mut remaining_space: usize) -> usize {
        self.tree.append(Item {
            start: start_ix,
            end: 0, // set later
            body: ItemBody::IndentCodeBlock,
        });
        self.tree.push();
        let bytes = self.text.as_bytes();
        let mut last_nonblank_child = None;
        let mut last_nonblank_ix = 0;
        let mut end_ix = 0;
        self.last_line_blank = false;

        let mut ix = start_ix;
        loop {
            let line_start_ix = ix;
            ix += scan_nextline(&bytes[ix..]);
            self.append_code_text(remaining_space, line_start_ix, ix);

            if !self.last_line_blank {
                last_nonblank_child = self.tree.cur();
                last_nonblank_ix = ix;
                end_ix = ix;
            }

            let mut line_start = LineStart::new(&bytes[ix..]);
            let n_containers = scan_containers(&self.tree, &mut line_start);
            if n_containers < self.tree.spine_len()
                || !(line_start.scan_space(4) || line_start.is_at_eol())
            {
                break;
            }
            let next_line_ix = ix + line_start.bytes_scanned();
            if next_line_ix == self.text.len() {
                break;
            }
            ix = next_line_ix;
            remaining_space = line_start.remaining_space();
            self.last_line_blank = scan_blank_line(&bytes[ix..]).is_some();
        }

        // trailing blank lines are not part of the block
        if let Some(child) = last_nonblank_child {
            self.tree[child].next = None;
            self.tree[child].item.end = max(self.tree[child].item.start, last_nonblank_ix);
        }
        self.pop(end_ix);
        ix
    }

    fn parse_fenced_code_block(
        &mut self,
        start_ix: usize,
        indent: usize,
        fence_ch: u8,
        n_fence_char: usize,
    ) -> usize {
        let bytes = self.text.as_bytes();
        let mut info_start = start_ix + n_fence_char;
        info_start += scan_whitespace_no_nl(&bytes[info_start..]);
        let mut ix = info_start + scan_nextline(&bytes[info_start..]);
        let info_end = ix - scan_rev_while(&bytes[info_start..ix], is_ascii_whitespace);
        let info_string = unescape(&self.text[info_start..info_end], self.legacy_entities());
        self.tree.append(Item {
            start: start_ix,
            end: 0, // set later
            body: ItemBody::FencedCodeBlock(self.allocs.allocate_cow(info_string)),
        });
        self.tree.push();
        loop {
            let mut line_start = LineStart::new(&bytes[ix..]);
            let n_containers = scan_containers(&self.tree, &mut line_start);
            if n_containers < self.tree.spine_len() {
                // the line is parsed again outside of the code block
                self.pop(ix);
                return ix;
            }
            line_start.scan_space(indent);
            let mut close_line_start = line_start.clone();
            if !close_line_start.scan_space(4 - indent) {
                let close_ix = ix + close_line_start.bytes_scanned();
                if let Some(n) = scan_closing_code_fence(&bytes[close_ix..], fence_ch, n_fence_char) {
                    ix = close_ix + n;
                    self.pop(ix);
                    // eat the line ending so it does not count as a blank line
                    return ix + scan_blank_line(&bytes[ix..]).unwrap_or(0);
                }
            }
            let remaining_space = line_start.remaining_space();
            ix += line_start.bytes_scanned();
            let next_ix = ix + scan_nextline(&bytes[ix..]);
            self.append_code_text(remaining_space, ix, next_ix);
            ix = next_ix;
        }
    }

    /// Appends one line of code block content. Line endings are normalized
    /// to `\n` and a missing final line ending is supplied.
    fn append_code_text(&mut self, remaining_space: usize, start: usize, end: usize) {
        if remaining_space > 0 {
            let cow_ix = self.allocs.allocate_cow("   "[..remaining_space].into());
            self.tree.append(Item {
                start,
                end: start,
                body: ItemBody::SynthesizeText(cow_ix),
            });
        }
        match &self.text.as_bytes()[start..end] {
            [.., b'\r', b'\n'] => {
                self.tree.append_text(start, end - 2);
                self.tree.append_text(end - 1, end);
            }
            [.., b'\r'] => {
                self.tree.append_text(start, end - 1);
                self.append_newline(end - 1, end);
            }
            [.., b'\n'] => self.tree.append_text(start, end),
            _ => {
                self.tree.append_text(start, end);
                self.append_newline(end, end);
            }
        }
    }

    fn append_newline(&mut self, start: usize, end: usize) {
        self.tree.append(Item {
            start,
            end,
            body: ItemBody::SynthesizeChar('\n'),
        });
    }

    /// Appends a line of HTML to the tree.
    fn append_html_line(&mut self, remaining_space: usize, start: usize, end: usize) {
        if remaining_space > 0 {
            let cow_ix = self.allocs.allocate_cow("   "[..remaining_space].into());
            self.tree.append(Item {
                start,
                end: start,
                body: ItemBody::SynthesizeText(cow_ix),
            });
        }
        if self.text.as_bytes()[start..end].ends_with(b"\r\n") {
            self.tree.append(Item {
                start,
                end: end - 2,
                body: ItemBody::Html,
            });
            self.tree.append(Item {
                start: end - 1,
                end,
                body: ItemBody::Html,
            });
        } else {
            self.tree.append(Item {
                start,
                end,
                body: ItemBody::Html,
            });
        }
    }

    /// Pops a container, setting its end.
    fn pop(&mut self, ix: usize) {
        let Some(cur_ix) = self.tree.pop() else {
            return;
        };
        self.tree[cur_ix].item.end = ix;
        if let ItemBody::List(true, _, _) = self.tree[cur_ix].item.body {
            surgerize_tight_list(&mut self.tree, cur_ix);
            self.begin_list_item = None;
        }
    }

    /// Closes a list if it's open, marking it loose if the last line was
    /// blank, and ends a lone empty list item.
    fn finish_list(&mut self, ix: usize) {
        self.finish_empty_list_item();
        if let Some(node_ix) = self.tree.peek_up() {
            if let ItemBody::List(_, _, _) = self.tree[node_ix].item.body {
                self.pop(ix);
            }
        }
        if self.last_line_blank {
            if let Some(node_ix) = self.tree.peek_grandparent() {
                let list_start = self.tree[node_ix].item.start;
                if let ItemBody::List(ref mut is_tight, _, _) = self.tree[node_ix].item.body {
                    if *is_tight {
                        trace!("list at {} is loose", list_start);
                    }
                    *is_tight = false;
                }
            }
            self.last_line_blank = false;
        }
    }

    fn finish_empty_list_item(&mut self) {
        if let Some(begin_list_item) = self.begin_list_item {
            if self.last_line_blank {
                // a list item can begin with at most one blank line
                if let Some(node_ix) = self.tree.peek_up() {
                    if let ItemBody::ListItem(_) = self.tree[node_ix].item.body {
                        self.pop(begin_list_item);
                    }
                }
            }
        }
        self.begin_list_item = None;
    }

    /// Continues the open list if the marker matches, or starts a new one.
    fn continue_list(&mut self, start: usize, ch: u8, index: u64) {
        self.finish_empty_list_item();
        if let Some(node_ix) = self.tree.peek_up() {
            let list_start = self.tree[node_ix].item.start;
            if let ItemBody::List(ref mut is_tight, existing_ch, _) = self.tree[node_ix].item.body {
                if existing_ch == ch {
                    if self.last_line_blank {
                        if *is_tight {
                            trace!("list at {} is loose", list_start);
                        }
                        *is_tight = false;
                        self.last_line_blank = false;
                    }
                    return;
                }
            }
            self.finish_list(start);
        }
        self.tree.append(Item {
            start,
            end: 0, // set later
            body: ItemBody::List(true, ch, index),
        });
        self.tree.push();
        self.last_line_blank = false;
    }

    /// Parses a thematic break. Returns index of start of next line.
    fn parse_hrule(&mut self, hrule_size: usize, ix: usize) -> usize {
        self.tree.append(Item {
            start: ix,
            end: ix + hrule_size,
            body: ItemBody::Rule,
        });
        ix + hrule_size
    }

    /// Parses an ATX heading. Returns index of start of next line.
    fn parse_atx_heading(&mut self, start: usize, atx_level: HeadingLevel) -> usize {
        let mut ix = start;
        let heading_ix = self.tree.append(Item {
            start,
            end: 0,                     // set later
            body: ItemBody::Heading(atx_level),
        });
        ix += atx_level as usize;
        // the opening run is followed by whitespace or a line ending
        let bytes = self.text.as_bytes();
        if let Some(eol_bytes) = scan_eol(&bytes[ix..]) {
            self.tree[heading_ix].item.end = ix + eol_bytes;
            return ix + eol_bytes;
        }
        ix += scan_whitespace_no_nl(&bytes[ix..]);

        let header_start = ix;
        self.tree.push();
        let (line_ix, line_brk) = self.parse_line(ix);
        ix = line_ix;
        // a backslash before the line ending is literal in a heading
        if let Some(Item {
            start,
            end,
            body: ItemBody::HardBreak(true),
        }) = line_brk
        {
            self.tree.append_text(start, end);
        }
        self.tree[heading_ix].item.end = ix;

        // strip the optional closing sequence
        let mut empty_text_node = false;
        if let Some(cur_ix) = self.tree.cur() {
            let header_text = &bytes[header_start..ix];
            let mut limit = header_text
                .iter()
                .rposition(|&b| !matches!(b, b'\n' | b'\r' | b' ' | b'\t'))
                .map_or(0, |i| i + 1);
            let closer = header_text[..limit]
                .iter()
                .rposition(|&b| b != b'#')
                .map_or(0, |i| i + 1);
            if closer == 0 {
                limit = closer;
            } else {
                let spaces = scan_rev_while(&header_text[..closer], |b| b == b' ' || b == b'\t');
                if spaces > 0 {
                    limit = closer - spaces;
                }
            }
            let node_start = self.tree[cur_ix].item.start;
            self.tree[cur_ix].item.end = max(node_start, limit + header_start);
            empty_text_node = limit == 0;
        }

        self.tree.pop();
        if empty_text_node {
            // only the closing sequence was left
            self.tree[heading_ix].child = None;
        }

        ix
    }

    /// Tries to parse a reference label, which can be interrupted by new
    /// blocks. On success, returns the number of bytes of the label and the
    /// label itself.
    fn parse_refdef_label(&self, start: usize) -> Option<(usize, CowStr<'a>)> {
        scan_link_label_rest(&self.text[start..], &|bytes| {
            let mut line_start = LineStart::new(bytes);
            let current_container =
                scan_containers(&self.tree, &mut line_start) == self.tree.spine_len();
            if line_start.scan_space(4) {
                return Some(line_start.bytes_scanned());
            }
            let bytes_scanned = line_start.bytes_scanned();
            let suffix = &bytes[bytes_scanned..];
            if scan_paragraph_interrupt(suffix, current_container)
                || (current_container && scan_setext_heading(suffix).is_some())
            {
                None
            } else {
                Some(bytes_scanned)
            }
        })
    }

    /// Returns number of bytes scanned, label and definition on success.
    fn parse_refdef_total(&mut self, start: usize) -> Option<(usize, LinkLabel<'a>, LinkDef<'a>)> {
        let bytes = &self.text.as_bytes()[start..];
        if scan_ch(bytes, b'[') == 0 {
            return None;
        }
        let (mut i, label) = self.parse_refdef_label(start + 1)?;
        i += 1;
        if scan_ch(&bytes[i..], b':') == 0 {
            return None;
        }
        i += 1;
        let (bytecount, link_def) = self.scan_refdef(start + i)?;
        Some((bytecount + i, UniCase::new(label), link_def))
    }

    /// Returns number of bytes and number of newlines.
    fn scan_refdef_space(&self, bytes: &[u8], mut i: usize) -> Option<(usize, usize)> {
        let mut newlines = 0;
        loop {
            i += scan_whitespace_no_nl(&bytes[i..]);
            if let Some(eol_bytes) = scan_eol(&bytes[i..]) {
                if eol_bytes == 0 {
                    break;
                }
                i += eol_bytes;
                newlines += 1;
                if newlines > 1 {
                    return None;
                }
            } else {
                break;
            }
            let mut line_start = LineStart::new(&bytes[i..]);
            let current_container =
                scan_containers(&self.tree, &mut line_start) == self.tree.spine_len();
            if !line_start.scan_space(4) {
                let suffix = &bytes[i + line_start.bytes_scanned()..];
                if scan_paragraph_interrupt(suffix, current_container)
                    || scan_setext_heading(suffix).is_some()
                {
                    return None;
                }
            }
            i += line_start.bytes_scanned();
        }
        Some((i, newlines))
    }

    /// Returns the byte length and the raw text of a link title.
    fn scan_refdef_title<'t>(&self, text: &'t str) -> Option<(usize, CowStr<'t>)> {
        let bytes = text.as_bytes();
        let closing_delim = match bytes.first()? {
            b'\'' => b'\'',
            b'"' => b'"',
            b'(' => b')',
            _ => return None,
        };
        let mut bytecount = 1;
        let mut linestart = 1;

        let mut linebuf: Option<String> = None;

        while let Some(&c) = bytes.get(bytecount) {
            match c {
                // only escaped parentheses inside a parenthesized title
                b'(' if closing_delim == b')' => return None,
                b'\n' | b'\r' => {
                    // container prefixes of continuation lines are dropped
                    let buf = linebuf.get_or_insert_with(String::new);
                    buf.push_str(&text[linestart..bytecount]);
                    buf.push('\n');
                    bytecount += 1;
                    if c == b'\r' && bytes.get(bytecount) == Some(&b'\n') {
                        bytecount += 1;
                    }
                    let mut line_start = LineStart::new(&bytes[bytecount..]);
                    let current_container =
                        scan_containers(&self.tree, &mut line_start) == self.tree.spine_len();
                    if !line_start.scan_space(4) {
                        let suffix = &bytes[bytecount + line_start.bytes_scanned()..];
                        if scan_paragraph_interrupt(suffix, current_container)
                            || scan_setext_heading(suffix).is_some()
                        {
                            return None;
                        }
                    }
                    line_start.scan_all_space();
                    bytecount += line_start.bytes_scanned();
                    linestart = bytecount;
                    if scan_blank_line(&bytes[bytecount..]).is_some() {
                        // titles cannot contain blank lines
                        return None;
                    }
                }
                b'\\' => {
                    bytecount += 1;
                    if let Some(c) = bytes.get(bytecount) {
                        if c != &b'\r' && c != &b'\n' {
                            bytecount += 1;
                        }
                    }
                }
                c if c == closing_delim => {
                    let cow = if let Some(mut linebuf) = linebuf {
                        linebuf.push_str(&text[linestart..bytecount]);
                        CowStr::from(linebuf)
                    } else {
                        CowStr::from(&text[linestart..bytecount])
                    };
                    return Some((bytecount + 1, cow));
                }
                _ => {
                    bytecount += 1;
                }
            }
        }
        None
    }

    /// Returns # of bytes and definition.
    /// Assumes the label of the reference including colon has already been scanned.
    fn scan_refdef(&self, start: usize) -> Option<(usize, LinkDef<'a>)> {
        let bytes = self.text.as_bytes();
        let legacy = self.legacy_entities();

        // whitespace between label and url (including up to one newline)
        let (mut i, _newlines) = self.scan_refdef_space(bytes, start)?;

        let (dest_length, dest) = scan_link_dest(self.text, i, LINK_MAX_NESTED_PARENS)?;
        if dest_length == 0 {
            return None;
        }
        let dest = unescape(dest, legacy);
        i += dest_length;

        // the definition without a title, used when no valid title follows
        let mut backup = (i - start, LinkDef { dest, title: None });

        let (mut i, newlines) = if let Some((new_i, mut newlines)) = self.scan_refdef_space(bytes, i) {
            if i == self.text.len() {
                newlines += 1;
            }
            if new_i == i && newlines == 0 {
                return None;
            }
            if newlines > 1 {
                return Some(backup);
            };
            (new_i, newlines)
        } else {
            return Some(backup);
        };

        // a title must end its line; otherwise only a title-less definition
        // on the previous line survives
        if let Some((title_length, title)) = self.scan_refdef_title(&self.text[i..]) {
            i += title_length;
            if scan_blank_line(&bytes[i..]).is_some() {
                backup.0 = i - start;
                backup.1.title = Some(unescape(title, legacy));
                return Some(backup);
            }
        }
        if newlines > 0 {
            Some(backup)
        } else {
            None
        }
    }
}

/// Checks whether the line in `bytes` interrupts an open paragraph.
fn scan_paragraph_interrupt(bytes: &[u8], current_container: bool) -> bool {
    scan_eol(bytes).is_some()
        || scan_hrule(bytes).is_ok()
        || scan_atx_heading(bytes).is_some()
        || scan_code_fence(bytes).is_some()
        || scan_blockquote_start(bytes).is_some()
        || scan_listitem(bytes).map_or(false, |(ix, delim, index, _)| {
            // empty items and ordered items not starting at 1 cannot
            // interrupt a paragraph in the same container
            !current_container
                || (matches!(delim, b'*' | b'-' | b'+') || index == 1)
                    && scan_blank_line(&bytes[ix..]).is_none()
        })
        || bytes.starts_with(b"<")
            && (get_html_end_tag(&bytes[1..]).is_some() || starts_html_block_type_6(&bytes[1..]))
}

/// Returns the end marker of HTML block types 1 to 5.
/// Assumes `text_bytes` is preceded by `<`.
fn get_html_end_tag(text_bytes: &[u8]) -> Option<&'static str> {
    static BEGIN_TAGS: &[(&[u8], &str); 4] = &[
        (b"pre", "</pre>"),
        (b"style", "</style>"),
        (b"script", "</script>"),
        (b"textarea", "</textarea>"),
    ];
    static ST_BEGIN_TAGS: &[(&[u8], &str); 3] =
        &[(b"!--", "-->"), (b"?", "?>"), (b"![CDATA[", "]]>")];

    for &(beg_tag, end_tag) in BEGIN_TAGS {
        let tag_len = beg_tag.len();
        if text_bytes.len() < tag_len {
            // tags are sorted by length
            break;
        }
        if !text_bytes[..tag_len].eq_ignore_ascii_case(beg_tag) {
            continue;
        }
        match text_bytes.get(tag_len) {
            None => return Some(end_tag),
            Some(&s) if is_ascii_whitespace(s) || s == b'>' => return Some(end_tag),
            Some(_) => {}
        }
    }

    for &(beg_tag, end_tag) in ST_BEGIN_TAGS {
        if text_bytes.starts_with(beg_tag) {
            return Some(end_tag);
        }
    }

    if text_bytes.len() > 1 && text_bytes[0] == b'!' && text_bytes[1].is_ascii_alphabetic() {
        Some(">")
    } else {
        None
    }
}

fn contains_ignore_ascii_case(haystack: &[u8], needle: &[u8]) -> bool {
    haystack
        .windows(needle.len())
        .any(|window| window.eq_ignore_ascii_case(needle))
}

/// Replaces every paragraph directly inside the items of a tight list by the
/// paragraph's children.
fn surgerize_tight_list(tree: &mut Tree<Item>, list_ix: TreeIndex) {
    let mut list_item = tree[list_ix].child;
    while let Some(item_ix) = list_item {
        let mut tail: Option<TreeIndex> = None;
        let mut child = tree[item_ix].child;
        while let Some(child_ix) = child {
            let next = tree[child_ix].next;
            let (first, last) = match (tree[child_ix].item.body, tree[child_ix].child) {
                (ItemBody::Paragraph, Some(first)) => {
                    let mut last = first;
                    while let Some(next_ix) = tree[last].next {
                        last = next_ix;
                    }
                    (first, last)
                }
                _ => (child_ix, child_ix),
            };
            match tail {
                Some(tail_ix) => tree[tail_ix].next = Some(first),
                None => tree[item_ix].child = Some(first),
            }
            tree[last].next = next;
            tail = Some(last);
            child = next;
        }
        list_item = tree[item_ix].next;
    }
}

/// Splits a run of more than three hyphens into em and en dashes: em dashes
/// when the count divides by three, en dashes when it divides by two, and
/// otherwise as many em dashes as possible.
fn dash_distribution(count: usize) -> (usize, usize) {
    match count % 6 {
        0 | 3 => (count / 3, 0),
        2 | 4 => (0, count / 2),
        1 => (count / 3 - 1, 2),
        _ => (count / 3, 1),
    }
}

/// Determines whether the delimiter run of `run_len` bytes at `ix` can open
/// emphasis (for `*` and `_`) or a quote (for `'` and `"`).
///
/// `s` starts at the beginning of the line and `suffix` is `&s[ix..]`;
/// the start of the line counts as whitespace.
fn delim_run_can_open(s: &str, suffix: &str, run_len: usize, ix: usize) -> bool {
    let next_char = match suffix[run_len..].chars().next() {
        Some(c) => c,
        None => return false,
    };
    if next_char.is_whitespace() {
        return false;
    }
    let prev_char = s[..ix].chars().last();
    let prev_ws = prev_char.map_or(true, char::is_whitespace);
    let prev_punct = prev_char.map_or(false, is_punctuation);
    match suffix.as_bytes()[0] {
        // left-flanking
        b'*' => !is_punctuation(next_char) || prev_ws || prev_punct,
        // left-flanking and not intraword
        b'_' => prev_ws || prev_punct,
        // left-flanking but not right-flanking
        _ => {
            (prev_ws || prev_punct && !is_punctuation(next_char))
                && !matches!(prev_char, Some(']') | Some(')'))
        }
    }
}

/// Determines whether the delimiter run of `run_len` bytes at `ix` can close
/// emphasis or a quote. Arguments as for [`delim_run_can_open`].
fn delim_run_can_close(s: &str, suffix: &str, run_len: usize, ix: usize) -> bool {
    let prev_char = match s[..ix].chars().last() {
        Some(c) => c,
        None => return false,
    };
    if prev_char.is_whitespace() {
        return false;
    }
    let next_char = match suffix[run_len..].chars().next() {
        Some(c) => c,
        None => return true,
    };
    let next_ws_or_punct = next_char.is_whitespace() || is_punctuation(next_char);
    match suffix.as_bytes()[0] {
        b'_' => next_ws_or_punct,
        // right-flanking
        _ => !is_punctuation(prev_char) || next_ws_or_punct,
    }
}

type LookupTable = [bool; 256];

fn special_bytes(options: Options) -> LookupTable {
    let mut bytes = [false; 256];
    let standard_bytes = [b'\n', b'\r', b'*', b'_', b'&', b'\\', b'[', b']', b'<', b'!', b'`'];

    for &byte in &standard_bytes {
        bytes[byte as usize] = true;
    }
    if options.contains(Options::SMART) {
        for &byte in &[b'.', b'-', b'"', b'\''] {
            bytes[byte as usize] = true;
        }
    }

    bytes
}

enum LoopInstruction<T> {
    /// Continue looking for more special bytes, but skip next few bytes.
    ContinueAndSkip(usize),
    /// Break looping immediately, returning with the given index and value.
    BreakAtWith(usize, T),
}

/// Walks `bytes` from `ix`, calling `callback` on every byte marked in
/// `lut`.
///
/// After `ContinueAndSkip(n)` the callback is not called again for indices
/// below `ix + n + 1`. `BreakAtWith(end, val)` stops the walk and returns
/// `(end, val)`. Without a break, returns the length of `bytes` and `None`.
fn iterate_special_bytes<F, T>(
    lut: &LookupTable,
    bytes: &[u8],
    mut ix: usize,
    mut callback: F,
) -> (usize, Option<T>)
where
    F: FnMut(usize, u8) -> LoopInstruction<Option<T>>,
{
    while ix < bytes.len() {
        let b = bytes[ix];
        if lut[b as usize] {
            match callback(ix, b) {
                LoopInstruction::ContinueAndSkip(skip) => {
                    ix += skip;
                }
                LoopInstruction::BreakAtWith(ix, val) => {
                    return (ix, val);
                }
            }
        }
        ix += 1;
    }

    (ix, None)
}
