fn main() {
    generate_tests_from_spec()
}

// If the "gen-tests" feature is absent,
// this function will be compiled down to nothing
#[cfg(not(feature = "gen-tests"))]
fn generate_tests_from_spec() {}

// If the feature is present, generate tests
// from the CommonMark spec file in third_party/.
#[cfg(feature = "gen-tests")]
fn generate_tests_from_spec() {
    use std::fs::File;
    use std::io::{Read, Write};
    use std::path::PathBuf;

    let spec_path = PathBuf::from("third_party/CommonMark/spec.txt");
    println!("cargo:rerun-if-changed={}", spec_path.display());

    let mut raw_spec = String::new();
    File::open(&spec_path)
        .and_then(|mut f| f.read_to_string(&mut raw_spec))
        .expect("Could not read the spec file");

    let mut rust_file = File::create("tests/suite/spec.rs").expect("Could not create spec.rs");
    rust_file
        .write_all(
            b"// This file is auto-generated by the build script\n\
              // Please, do not modify it manually\n\
              \n\
              use super::super::test_markdown_html;\n\
              use cssg::Options;\n",
        )
        .expect("Could not write the header");

    for (i, testcase) in Spec::new(&raw_spec).enumerate() {
        let original = hashed_literal(&testcase.original);
        let expected = hashed_literal(&testcase.expected);
        writeln!(
            rust_file,
            "\n#[test]\nfn spec_test_{n}() {{\n    let original = {original};\n    let expected = {expected};\n\n    test_markdown_html(original, expected, Options::UNSAFE);\n}}",
            n = i + 1,
        )
        .expect("Could not write the test");
    }
}

/// Wraps `s` in a raw string literal with enough hashes to hold it.
#[cfg(feature = "gen-tests")]
fn hashed_literal(s: &str) -> String {
    let mut hashes = String::from("##");
    while s.contains(&format!("\"{hashes}")) {
        hashes.push('#');
    }
    format!("r{hashes}\"{s}\"{hashes}")
}

#[cfg(feature = "gen-tests")]
pub struct Spec<'a> {
    spec: &'a str,
}

#[cfg(feature = "gen-tests")]
impl<'a> Spec<'a> {
    pub fn new(spec: &'a str) -> Self {
        Spec { spec }
    }
}

#[cfg(feature = "gen-tests")]
pub struct TestCase {
    pub original: String,
    pub expected: String,
}

#[cfg(feature = "gen-tests")]
impl<'a> Iterator for Spec<'a> {
    type Item = TestCase;

    fn next(&mut self) -> Option<TestCase> {
        const FENCE: &str = "```````````````````````````````` example\n";
        const CLOSE: &str = "\n````````````````````````````````\n";

        let i_start = self.spec.find(FENCE)? + FENCE.len();
        let rest = &self.spec[i_start..];
        let i_dot = rest.find("\n.\n")?;
        let original = &rest[..=i_dot];
        let after_dot = &rest[i_dot + 3..];
        let (expected, consumed) = match after_dot.strip_prefix("````````````````````````````````\n") {
            // empty expectation
            Some(_) => ("", i_dot + 3),
            None => {
                let i_end = after_dot.find(CLOSE)?;
                (&after_dot[..=i_end], i_dot + 3 + i_end + 1)
            }
        };
        self.spec = &self.spec[i_start + consumed..];

        Some(TestCase {
            original: original.replace('→', "\t"),
            expected: expected.replace('→', "\t"),
        })
    }
}
