#![no_main]
use libfuzzer_sys::fuzz_target;

use cssg::{convert, Mem, Options};
use libfuzzer_sys::arbitrary::{self, Arbitrary};

#[derive(Debug, Arbitrary)]
struct FuzzingInput<'a> {
    markdown: &'a [u8],
    options: i32,
}

fuzz_target!(|data: FuzzingInput<'_>| {
    let opts = Options::from_bits_truncate(data.options);
    let html = convert(data.markdown, opts, Mem::default_allocator()).unwrap();
    assert!(html.is_empty() || html.as_str().ends_with('\n'));
    if !opts.contains(Options::UNSAFE) {
        assert!(!html.as_str().contains("<script"));
    }
});
