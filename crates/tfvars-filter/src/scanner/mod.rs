//! attribute boundary detection
//!
//! A [SpanScanner] turns document text into a list of [AttributeSpan]s: where each root attribute's name and value
//! are located. Everything else about the grammar stays behind this trait.
//!
//! [HclScanner] is the scanner [crate::document::Document::parse] uses. It parses the document with [hcl_edit] and
//! reads the byte ranges the parser records for each root attribute's key and value expression. Comments and
//! whitespace around a value are decor and not part of its span.
use crate::diagnostics::{Diagnostic, Diagnostics, Origin, Subject};
use hcl_edit::Span;
use std::ops::Range;

/// Location of a single root attribute
#[derive(Debug, Clone, PartialEq, Eq, derive_new::new)]
pub struct AttributeSpan {
    pub name: String,
    pub name_span: Range<usize>,
    pub value_span: Range<usize>,
}

pub trait SpanScanner {
    /// Finds all root attributes in document order
    ///
    /// Spans must be ordered, must not overlap and must not be empty. Names must be unique.
    fn find_attribute_spans(
        &self,
        src: &str,
        origin: &Origin,
    ) -> Result<Vec<AttributeSpan>, Diagnostics>;
}

/// Boundaries as recorded by the [hcl_edit] parser
#[derive(Debug, Default, Clone, Copy)]
pub struct HclScanner;

impl SpanScanner for HclScanner {
    #[tracing::instrument(level = "trace", skip_all, fields(source = %origin.source))]
    fn find_attribute_spans(
        &self,
        src: &str,
        origin: &Origin,
    ) -> Result<Vec<AttributeSpan>, Diagnostics> {
        let body = hcl_edit::parser::parse_body(src).map_err(|err| syntax_error(&err, origin))?;

        let mut spans = vec![];
        for attribute in body.attributes() {
            let name = attribute.key.value().as_str();
            let (Some(name_span), Some(value_span)) = (attribute.key.span(), attribute.value.span())
            else {
                return Err(Diagnostic::error(
                    "Invalid attribute boundaries",
                    format!("The location of attribute \"{name}\" could not be determined."),
                )
                .with_subject(origin.subject_at(src, 0))
                .into());
            };

            tracing::trace!(name, ?name_span, ?value_span, "attribute found");
            spans.push(AttributeSpan::new(name.to_string(), name_span, value_span));
        }

        Ok(spans)
    }
}

/// A root attribute that is assigned more than once
pub(crate) fn duplicate_argument(name: &str) -> Diagnostic {
    let detail = if name.is_empty() {
        "Each argument may be set only once.".to_string()
    } else {
        format!("The argument \"{name}\" was already set. Each argument may be set only once.")
    };
    Diagnostic::error("Duplicate argument", detail)
}

fn syntax_error(err: &hcl_edit::parser::Error, origin: &Origin) -> Diagnostic {
    let location = err.location();
    let subject = Subject::new(
        origin.source.clone(),
        origin.translate(location.line(), location.column(), location.offset()),
    );

    // the parser refuses a repeated key at the root, pointing at the repetition
    if err.message().contains("redefined attribute") {
        let name: String = err
            .line()
            .trim_start()
            .chars()
            .take_while(|c| c.is_alphanumeric() || *c == '_' || *c == '-')
            .collect();
        return duplicate_argument(&name).with_subject(subject);
    }

    Diagnostic::error("Invalid HCL syntax", err.message()).with_subject(subject)
}
