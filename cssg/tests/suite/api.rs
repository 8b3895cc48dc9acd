// Conversion entry point behaviour on unusual input.

use cssg::{convert, Mem, Options};

fn to_html(input: &[u8], opts: Options) -> String {
    convert(input, opts, Mem::default_allocator())
        .unwrap()
        .as_str()
        .to_owned()
}

fn paren_wrapped(bytes: &[u8]) -> Vec<u8> {
    let mut buf = b"((((".to_vec();
    buf.extend_from_slice(bytes);
    buf.extend_from_slice(b"))))");
    buf
}

#[test]
fn valid_utf8_passes_through() {
    for bytes in [
        &b"\x01"[..],
        b"\x7F",
        b"\xC2\x80",
        b"\xDF\xBF",
        b"\xE0\xA0\x80",
        b"\xED\x9F\xBF",
        b"\xF0\x90\x80\x80",
        b"\xF4\x8F\xBF\xBF",
    ] {
        let expected = format!("<p>(((({}))))</p>\n", std::str::from_utf8(bytes).unwrap());
        assert_eq!(to_html(&paren_wrapped(bytes), Options::VALIDATE_UTF8), expected);
    }
}

#[test]
fn invalid_utf8_becomes_one_replacement() {
    for bytes in [
        &b"\x80"[..],
        b"\xBF",
        b"\xF8",
        b"\xFF",
        b"\xE0\xA0",
    ] {
        assert_eq!(
            to_html(&paren_wrapped(bytes), Options::VALIDATE_UTF8),
            "<p>((((\u{FFFD}))))</p>\n",
            "{:?}",
            bytes
        );
    }
}

#[test]
fn incomplete_sequence_at_end() {
    assert_eq!(to_html(b"----\xE0\xA0", Options::empty()), "<p>----\u{FFFD}</p>\n");
    assert_eq!(to_html(b"----\xF0\x90\x80", Options::empty()), "<p>----\u{FFFD}</p>\n");
}

#[test]
fn broken_continuation_byte() {
    assert_eq!(
        to_html(b"((((\xE0\x20\x80))))", Options::empty()),
        "<p>((((\u{FFFD} \u{FFFD}))))</p>\n"
    );
}

#[test]
fn nul_characters() {
    assert_eq!(to_html(b"((((\0))))", Options::empty()), "<p>((((\u{FFFD}))))</p>\n");
    assert_eq!(
        to_html(b"```\n\0\n```\n", Options::empty()),
        "<pre><code>\u{FFFD}\n</code></pre>\n"
    );
}

#[test]
fn line_endings() {
    assert_eq!(
        to_html(b"- a\n- b\r\n- c\r- d", Options::empty()),
        "<ul>\n<li>a</li>\n<li>b</li>\n<li>c</li>\n<li>d</li>\n</ul>\n"
    );
    assert_eq!(
        to_html(b"line\r\nline\r\n", Options::HARDBREAKS),
        "<p>line<br />\nline</p>\n"
    );
    assert_eq!(to_html(b"line\r\nline\r\n", Options::NOBREAKS), "<p>line line</p>\n");
    assert_eq!(
        to_html(b"```\nline\n```", Options::empty()),
        "<pre><code>line\n</code></pre>\n"
    );
}

#[test]
fn numeric_entities() {
    let cases = [
        ("&#0;", "<p>\u{FFFD}</p>\n"),
        ("&#55295;", "<p>\u{D7FF}</p>\n"),
        ("&#xD800;", "<p>\u{FFFD}</p>\n"),
        ("&#xDFFF;", "<p>\u{FFFD}</p>\n"),
        ("&#57344;", "<p>\u{E000}</p>\n"),
        ("&#x10FFFF;", "<p>\u{10FFFF}</p>\n"),
        ("&#x110000;", "<p>\u{FFFD}</p>\n"),
        ("&#x80000000;", "<p>&amp;#x80000000;</p>\n"),
        ("&#xFFFFFFFF;", "<p>&amp;#xFFFFFFFF;</p>\n"),
        ("&#99999999;", "<p>&amp;#99999999;</p>\n"),
        ("&#;", "<p>&amp;#;</p>\n"),
        ("&#x;", "<p>&amp;#x;</p>\n"),
        ("&#999999999;", "<p>&amp;#999999999;</p>\n"),
        ("&#x000000041;", "<p>&amp;#x000000041;</p>\n"),
        ("&#65; &#x41;", "<p>A A</p>\n"),
    ];
    for (input, expected) in cases {
        assert_eq!(to_html(input.as_bytes(), Options::VALIDATE_UTF8), expected, "{}", input);
    }
}

#[test]
fn raw_html_and_dangerous_links_without_unsafe() {
    let input = "<div>\nhi\n</div>\n\n<a>hi</a>\n[link](JAVAscript:alert('hi'))\n![image](file:my.js)\n";
    assert_eq!(
        to_html(input.as_bytes(), Options::empty()),
        "<!-- raw HTML omitted -->\n<p><!-- raw HTML omitted -->hi<!-- raw HTML omitted -->\n\
         <a href=\"\">link</a>\n<img src=\"\" alt=\"image\" /></p>\n"
    );
}

#[test]
fn raw_html_and_dangerous_links_with_unsafe() {
    let input = "<div>\nhi\n</div>\n\n<a>hi</a>\n[link](JAVAscript:alert('hi'))\n";
    assert_eq!(
        to_html(input.as_bytes(), Options::UNSAFE),
        "<div>\nhi\n</div>\n<p><a>hi</a>\n<a href=\"JAVAscript:alert(&#x27;hi&#x27;)\">link</a></p>\n"
    );
}
