//! Fixture tests
//!
//! Filters each fixtures/*.tfvars file and compares the result with the matching *.expected file.
//! The first line of every fixture lists the declared variables: `# declared: a, b`

use pretty_assertions::assert_eq;
use tfvars_filter::diagnostics::Origin;
use tfvars_filter::document::Document;
use tfvars_filter::filter::{filter, DeclaredSet, NULL_LITERAL};

fn declared_from_header(src: &str) -> DeclaredSet {
    let header = src
        .lines()
        .next()
        .and_then(|line| line.strip_prefix("# declared:"))
        .expect("fixture must start with a `# declared:` line");

    header
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .collect()
}

/// `src` with exactly the original value spans of `neutralized` replaced
fn splice_nulls(src: &[u8], document: &Document, neutralized: &[String]) -> Vec<u8> {
    let mut spans: Vec<_> = neutralized
        .iter()
        .map(|name| document.value_span(name).expect("neutralized names are assigned"))
        .collect();
    spans.sort_by_key(|span| span.start);

    let mut expected = vec![];
    let mut cursor = 0;
    for span in spans {
        expected.extend_from_slice(&src[cursor..span.start]);
        expected.extend_from_slice(NULL_LITERAL.as_bytes());
        cursor = span.end;
    }
    expected.extend_from_slice(&src[cursor..]);
    expected
}

#[test]
fn fixtures() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_env("TFVARS_FILTER_LOG"))
        .with_writer(std::io::stderr)
        .try_init();

    insta::glob!("fixtures/*.tfvars", |path| {
        let src = std::fs::read(path).unwrap();
        let expected = std::fs::read(path.with_extension("expected")).unwrap();
        let declared = declared_from_header(std::str::from_utf8(&src).unwrap());
        let origin = Origin::new(path.display().to_string());

        // unmodified documents serialize to their input
        let document = Document::parse(&src, &origin).expect("fixture must parse");
        assert_eq!(document.to_string().as_bytes(), src.as_slice());

        let filtered = filter(&src, &origin, &declared).expect("fixture must filter");
        assert_eq!(
            String::from_utf8_lossy(&filtered.bytes),
            String::from_utf8_lossy(&expected),
            "{}",
            path.display()
        );

        // bytes outside of neutralized values are untouched
        assert_eq!(
            String::from_utf8_lossy(&filtered.bytes),
            String::from_utf8_lossy(&splice_nulls(&src, &document, &filtered.neutralized)),
        );

        let again = filter(&filtered.bytes, &origin, &declared).expect("output must parse");
        assert_eq!(again.bytes, filtered.bytes, "filtering must be idempotent");
    });
}

/// Every byte outside of a neutralized value is preserved
#[test]
fn untouched_regions_are_preserved() {
    let src = "# head\nkeep = [1, 2]  # tail\ndrop = {\n  x = 1\n}\nalso = \"y\"\n";
    let declared: DeclaredSet = ["keep"].into_iter().collect();
    let origin = Origin::new("inline.tfvars");

    let document = Document::parse(src.as_bytes(), &origin).expect("must parse");
    let filtered = filter(src.as_bytes(), &origin, &declared).expect("must filter");

    assert_eq!(filtered.neutralized, vec!["drop", "also"]);
    assert_eq!(
        String::from_utf8(filtered.bytes).expect("utf-8"),
        "# head\nkeep = [1, 2]  # tail\ndrop = null\nalso = null\n"
    );
    assert_eq!(
        splice_nulls(src.as_bytes(), &document, &["drop".into(), "also".into()]),
        b"# head\nkeep = [1, 2]  # tail\ndrop = null\nalso = null\n"
    );
}
