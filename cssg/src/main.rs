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


//! Command line tool to convert CommonMark to HTML.

#![forbid(unsafe_code)]

use cssg::{convert, Mem, Options};

use std::env;
use std::fs::File;
use std::io::{self, Read, Write};
use std::process;

fn brief(program: &str) -> String {
    format!(
        "Usage: {} [options] [FILE...]\n\n{}",
        program, "Reads markdown from files or standard input and emits HTML.",
    )
}

fn render(input: &[u8], opts: Options, out: &mut impl Write) -> io::Result<()> {
    let html = convert(input, opts, Mem::default_allocator())
        .map_err(|e| io::Error::new(io::ErrorKind::OutOfMemory, e))?;
    out.write_all(html.as_bytes())
}

pub fn main() -> io::Result<()> {
    let args: Vec<_> = env::args().collect();
    let mut opts = getopts::Options::new();
    opts.optflag("h", "help", "this help message");
    opts.optflag("", "sourcepos", "add data-sourcepos attributes to block elements");
    opts.optflag("", "hardbreaks", "render soft breaks as <br />");
    opts.optflag("", "nobreaks", "render soft breaks as spaces");
    opts.optflag("", "smart", "enable smart punctuation");
    opts.optflag("", "unsafe", "pass raw HTML and dangerous URLs through");
    opts.optflag(
        "",
        "legacy-entities",
        "resolve legacy named references without a semicolon",
    );

    let matches = match opts.parse(&args[1..]) {
        Ok(m) => m,
        Err(f) => {
            eprintln!("{}\n{}", f, opts.usage(&brief(&args[0])));
            process::exit(1);
        }
    };
    if matches.opt_present("help") {
        println!("{}", opts.usage(&brief(&args[0])));
        return Ok(());
    }
    let mut options = Options::empty();
    for (flag, option) in [
        ("sourcepos", Options::SOURCEPOS),
        ("hardbreaks", Options::HARDBREAKS),
        ("nobreaks", Options::NOBREAKS),
        ("smart", Options::SMART),
        ("unsafe", Options::UNSAFE),
        ("legacy-entities", Options::LEGACY_ENTITIES),
    ] {
        if matches.opt_present(flag) {
            options.insert(option);
        }
    }

    let mut input = Vec::new();
    if matches.free.is_empty() {
        io::stdin().lock().read_to_end(&mut input)?;
    } else {
        for filename in &matches.free {
            let mut f = match File::open(filename) {
                Ok(f) => f,
                Err(e) => {
                    eprintln!("{}: {}", filename, e);
                    process::exit(1);
                }
            };
            f.read_to_end(&mut input)?;
        }
    }

    let stdout = io::stdout();
    let mut out = io::BufWriter::with_capacity(1024 * 1024, stdout.lock());
    render(&input, options, &mut out)?;
    out.flush()
}
