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

//! HTML renderer that takes an iterator of events as input.

use std::ops::Range;

use cssg_escape::{escape_href, escape_html, StrWrite};

use crate::parse::Parser;
use crate::Event::*;
use crate::{CodeBlockKind, Event, LinkType, Options, Tag, TagEnd};

const RAW_HTML_OMITTED: &str = "<!-- raw HTML omitted -->";

struct HtmlWriter<'a, I, W> {
    /// Iterator supplying events.
    iter: I,

    /// Writer to write to.
    writer: W,

    options: Options,

    /// Whether or not the last write wrote a newline.
    end_newline: bool,

    /// Whether the events belong to an HTML block.
    in_html_block: bool,

    /// Byte offsets of line starts, present with `Options::SOURCEPOS`.
    line_starts: Option<Vec<usize>>,

    source: &'a str,
}

impl<'a, I, W> HtmlWriter<'a, I, W>
where
    I: Iterator<Item = (Event<'a>, Range<usize>)>,
    W: StrWrite,
{
    fn new(iter: I, writer: W, source: &'a str, options: Options) -> Self {
        let line_starts = options
            .contains(Options::SOURCEPOS)
            .then(|| line_starts(source));
        Self {
            iter,
            writer,
            options,
            end_newline: true,
            in_html_block: false,
            line_starts,
            source,
        }
    }

    /// Writes a new line.
    #[inline]
    fn write_newline(&mut self) -> Result<(), W::Error> {
        self.end_newline = true;
        self.writer.write_str("\n")
    }

    /// Writes a buffer, and tracks whether or not a newline was written.
    #[inline]
    fn write(&mut self, s: &str) -> Result<(), W::Error> {
        self.writer.write_str(s)?;

        if !s.is_empty() {
            self.end_newline = s.ends_with('\n');
        }
        Ok(())
    }

    /// Starts a block element on a fresh line.
    fn write_block_open(&mut self, s: &str) -> Result<(), W::Error> {
        if !self.end_newline {
            self.write_newline()?;
        }
        self.write(s)
    }

    fn unsafe_html(&self) -> bool {
        self.options.contains(Options::UNSAFE)
    }

    fn run(mut self) -> Result<(), W::Error> {
        while let Some((event, range)) = self.iter.next() {
            match event {
                Start(tag) => {
                    self.start_tag(tag, range)?;
                }
                End(tag) => {
                    self.end_tag(tag)?;
                }
                Text(text) => {
                    // indentation of HTML block lines
                    if self.in_html_block && !self.unsafe_html() {
                        continue;
                    }
                    escape_html(&mut self.writer, &text)?;
                    if !text.is_empty() {
                        self.end_newline = text.ends_with('\n');
                    }
                }
                Code(text) => {
                    self.write("<code>")?;
                    escape_html(&mut self.writer, &text)?;
                    self.write("</code>")?;
                }
                Html(html) => {
                    if self.unsafe_html() {
                        self.write(&html)?;
                    }
                }
                InlineHtml(html) => {
                    if self.unsafe_html() {
                        self.write(&html)?;
                    } else {
                        self.write(RAW_HTML_OMITTED)?;
                    }
                }
                SoftBreak => {
                    if self.options.contains(Options::HARDBREAKS) {
                        self.write("<br />\n")?;
                    } else if self.options.contains(Options::NOBREAKS) {
                        self.write(" ")?;
                    } else {
                        self.write_newline()?;
                    }
                }
                HardBreak => {
                    self.write("<br />\n")?;
                }
                Rule => {
                    self.write_block_open("<hr")?;
                    self.write_sourcepos(&range)?;
                    self.write(" />\n")?;
                }
            }
        }
        Ok(())
    }

    /// Writes the start of an HTML tag.
    fn start_tag(&mut self, tag: Tag<'a>, range: Range<usize>) -> Result<(), W::Error> {
        match tag {
            Tag::HtmlBlock => {
                self.in_html_block = true;
                if self.unsafe_html() {
                    if !self.end_newline {
                        self.write_newline()?;
                    }
                    Ok(())
                } else {
                    self.write_block_open(RAW_HTML_OMITTED)
                }
            }
            Tag::Paragraph => {
                self.write_block_open("<p")?;
                self.write_sourcepos(&range)?;
                self.write(">")
            }
            Tag::Heading(level) => {
                self.write_block_open("<")?;
                write!(&mut self.writer, "{}", level)?;
                self.write_sourcepos(&range)?;
                self.write(">")
            }
            Tag::BlockQuote => {
                self.write_block_open("<blockquote")?;
                self.write_sourcepos(&range)?;
                self.write(">\n")
            }
            Tag::CodeBlock(info) => {
                self.write_block_open("<pre")?;
                self.write_sourcepos(&range)?;
                match info {
                    CodeBlockKind::Fenced(info) => {
                        let lang = info.split(|c: char| c.is_ascii_whitespace()).next().unwrap_or("");
                        if lang.is_empty() {
                            self.write("><code>")
                        } else {
                            self.write("><code class=\"")?;
                            if !lang.starts_with("language-") {
                                self.write("language-")?;
                            }
                            escape_html(&mut self.writer, lang)?;
                            self.write("\">")
                        }
                    }
                    CodeBlockKind::Indented => self.write("><code>"),
                }
            }
            Tag::List(Some(start)) => {
                self.write_block_open("<ol")?;
                self.write_sourcepos(&range)?;
                if start != 1 {
                    write!(&mut self.writer, " start=\"{}\"", start)?;
                }
                self.write(">\n")
            }
            Tag::List(None) => {
                self.write_block_open("<ul")?;
                self.write_sourcepos(&range)?;
                self.write(">\n")
            }
            Tag::Item => {
                self.write_block_open("<li")?;
                self.write_sourcepos(&range)?;
                self.write(">")
            }
            Tag::Emphasis => self.write("<em>"),
            Tag::Strong => self.write("<strong>"),
            Tag::Link {
                link_type,
                dest_url,
                title,
            } => {
                self.write("<a href=\"")?;
                if link_type == LinkType::Email {
                    self.write("mailto:")?;
                }
                self.write_url(&dest_url)?;
                if !title.is_empty() {
                    self.write("\" title=\"")?;
                    escape_html(&mut self.writer, &title)?;
                }
                self.write("\">")
            }
            Tag::Image {
                link_type: _,
                dest_url,
                title,
            } => {
                self.write("<img src=\"")?;
                self.write_url(&dest_url)?;
                self.write("\" alt=\"")?;
                self.raw_text()?;
                if !title.is_empty() {
                    self.write("\" title=\"")?;
                    escape_html(&mut self.writer, &title)?;
                }
                self.write("\" />")
            }
        }
    }

    fn end_tag(&mut self, tag: TagEnd) -> Result<(), W::Error> {
        match tag {
            TagEnd::HtmlBlock => {
                self.in_html_block = false;
                if !self.end_newline {
                    self.write_newline()?;
                }
            }
            TagEnd::Paragraph => {
                self.write("</p>\n")?;
            }
            TagEnd::Heading(level) => {
                self.write("</")?;
                write!(&mut self.writer, "{}", level)?;
                self.write(">\n")?;
            }
            TagEnd::BlockQuote => {
                self.write_block_open("</blockquote>\n")?;
            }
            TagEnd::CodeBlock => {
                self.write("</code></pre>\n")?;
            }
            TagEnd::List(true) => {
                self.write_block_open("</ol>\n")?;
            }
            TagEnd::List(false) => {
                self.write_block_open("</ul>\n")?;
            }
            TagEnd::Item => {
                self.write("</li>\n")?;
            }
            TagEnd::Emphasis => {
                self.write("</em>")?;
            }
            TagEnd::Strong => {
                self.write("</strong>")?;
            }
            TagEnd::Link => {
                self.write("</a>")?;
            }
            TagEnd::Image => (), // shouldn't happen, handled in start
        }
        Ok(())
    }

    /// Writes a link or image destination, dropping dangerous ones unless
    /// raw HTML is allowed.
    fn write_url(&mut self, url: &str) -> Result<(), W::Error> {
        if !self.unsafe_html() && is_dangerous_url(url) {
            return Ok(());
        }
        escape_href(&mut self.writer, url)
    }

    /// Writes ` data-sourcepos="l:c-l:c"` for the source range of a block.
    fn write_sourcepos(&mut self, range: &Range<usize>) -> Result<(), W::Error> {
        let Some(line_starts) = &self.line_starts else {
            return Ok(());
        };
        let block = &self.source[range.start..range.end];
        let content_len = block.trim_end_matches(|c: char| c.is_ascii_whitespace()).len();
        // the end position is inclusive
        let last = range.start + content_len.saturating_sub(1);
        let (start_line, start_col) = line_col(line_starts, range.start);
        let (end_line, end_col) = line_col(line_starts, last);
        write!(
            &mut self.writer,
            " data-sourcepos=\"{}:{}-{}:{}\"",
            start_line, start_col, end_line, end_col
        )
    }

    // run raw text, consuming end tag
    fn raw_text(&mut self) -> Result<(), W::Error> {
        let mut nest = 0;
        while let Some((event, _)) = self.iter.next() {
            match event {
                Start(_) => nest += 1,
                End(_) => {
                    if nest == 0 {
                        break;
                    }
                    nest -= 1;
                }
                Html(_) => {}
                InlineHtml(text) | Code(text) | Text(text) => {
                    // The output of this function is used in the `alt` attribute.
                    escape_html(&mut self.writer, &text)?;
                    self.end_newline = text.ends_with('\n');
                }
                SoftBreak | HardBreak | Rule => {
                    self.write(" ")?;
                }
            }
        }
        Ok(())
    }
}

fn line_starts(source: &str) -> Vec<usize> {
    let bytes = source.as_bytes();
    let mut starts = vec![0];
    for (ix, &b) in bytes.iter().enumerate() {
        let ends_line = b == b'\n' || (b == b'\r' && bytes.get(ix + 1) != Some(&b'\n'));
        if ends_line {
            starts.push(ix + 1);
        }
    }
    starts
}

/// Converts a byte offset into a 1-based line and byte column.
fn line_col(line_starts: &[usize], offset: usize) -> (usize, usize) {
    let line = line_starts.partition_point(|&start| start <= offset).max(1);
    (line, offset - line_starts[line - 1] + 1)
}

/// URL schemes that can run code. Common raster image data URLs are allowed.
fn is_dangerous_url(url: &str) -> bool {
    fn has_prefix(bytes: &[u8], prefix: &[u8]) -> bool {
        bytes.len() >= prefix.len() && bytes[..prefix.len()].eq_ignore_ascii_case(prefix)
    }

    let bytes = url.as_bytes();
    if has_prefix(bytes, b"data:") {
        let media = &bytes[5..];
        return ![&b"image/png"[..], b"image/gif", b"image/jpeg", b"image/webp"]
            .iter()
            .any(|allowed| has_prefix(media, allowed));
    }
    [&b"javascript:"[..], b"vbscript:", b"file:"]
        .iter()
        .any(|scheme| has_prefix(bytes, scheme))
}

/// Parses `text` and writes its HTML rendering to `writer`.
pub(crate) fn write_html<W: StrWrite>(writer: W, text: &str, options: Options) -> Result<(), W::Error> {
    HtmlWriter::new(Parser::new(text, options), writer, text, options).run()
}
