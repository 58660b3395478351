//! format-preserving document
//!
//! A [Document] keeps the original text and splits it into an arena of segments:
//! - opaque segments are copied verbatim when serializing (comments, whitespace, blocks, attribute names, `=`)
//! - value segments hold one root attribute value and can be replaced
//!
//! `# comment\nfoo = [1,2,3]\n` becomes `Opaque("# comment\nfoo = ")`, `Value("[1,2,3]")`, `Opaque("\n")`.
//!
//! Replacing a value only swaps the payload of its segment. Segment order and every opaque byte stay as they are, so
//! serializing an unmodified document yields its input again.
use crate::diagnostics::{Diagnostic, Diagnostics, Origin};
use crate::scanner::{duplicate_argument, AttributeSpan, HclScanner, SpanScanner};
use indexmap::IndexMap;
use std::fmt;
use std::ops::Range;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Opaque(Range<usize>),
    Value {
        span: Range<usize>,
        replacement: Option<String>,
    },
}

#[derive(Debug, Clone)]
pub struct Document {
    source: String,
    segments: Vec<Segment>,
    /// attribute name to the index of its value segment, in document order
    attributes: IndexMap<String, usize>,
}

impl Document {
    /// Parses an HCL document
    pub fn parse(bytes: &[u8], origin: &Origin) -> Result<Self, Diagnostics> {
        Self::parse_with(&HclScanner, bytes, origin)
    }

    /// Parses a document, using `scanner` to locate attributes
    #[tracing::instrument(level = "debug", skip_all, fields(source = %origin.source))]
    pub fn parse_with(
        scanner: &dyn SpanScanner,
        bytes: &[u8],
        origin: &Origin,
    ) -> Result<Self, Diagnostics> {
        let source = match std::str::from_utf8(bytes) {
            Ok(source) => source.to_string(),
            Err(err) => {
                let valid = String::from_utf8_lossy(&bytes[..err.valid_up_to()]);
                return Err(Diagnostic::error(
                    "Invalid character encoding",
                    "All input files must be UTF-8 encoded.",
                )
                .with_subject(origin.subject_at(&valid, valid.len()))
                .into());
            }
        };

        let spans = scanner.find_attribute_spans(&source, origin)?;
        Self::from_spans(source, spans, origin)
    }

    fn from_spans(
        source: String,
        spans: Vec<AttributeSpan>,
        origin: &Origin,
    ) -> Result<Self, Diagnostics> {
        let mut segments = vec![];
        let mut attributes: IndexMap<String, usize> = IndexMap::new();
        let mut cursor = 0;

        for span in spans {
            let AttributeSpan {
                name,
                name_span,
                value_span,
            } = span;

            let well_formed = cursor <= name_span.start
                && name_span.end <= value_span.start
                && value_span.start < value_span.end
                && value_span.end <= source.len()
                && source.is_char_boundary(value_span.start)
                && source.is_char_boundary(value_span.end)
                && source.get(name_span.clone()) == Some(name.as_str());
            if !well_formed {
                return Err(Diagnostic::error(
                    "Invalid attribute boundaries",
                    format!("The location found for attribute \"{name}\" is not valid for this document."),
                )
                .with_subject(origin.subject_at(&source, name_span.start))
                .into());
            }

            if attributes.contains_key(&name) {
                return Err(duplicate_argument(&name)
                    .with_subject(origin.subject_at(&source, name_span.start))
                    .into());
            }

            if cursor < value_span.start {
                segments.push(Segment::Opaque(cursor..value_span.start));
            }
            cursor = value_span.end;

            attributes.insert(name, segments.len());
            segments.push(Segment::Value {
                span: value_span,
                replacement: None,
            });
        }

        if cursor < source.len() {
            segments.push(Segment::Opaque(cursor..source.len()));
        }

        tracing::debug!(attributes = attributes.len(), segments = segments.len(), "document split");

        Ok(Self {
            source,
            segments,
            attributes,
        })
    }

    /// Root attribute names in document order
    ///
    /// The iterator can be cloned to walk the names again.
    pub fn names(&self) -> impl Iterator<Item = &str> + Clone + '_ {
        self.attributes.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// Current value text of `name`
    pub fn value(&self, name: &str) -> Option<&str> {
        let index = *self.attributes.get(name)?;
        Some(self.segment_text(&self.segments[index]))
    }

    /// Span of the original value of `name` in the input
    pub fn value_span(&self, name: &str) -> Option<Range<usize>> {
        match &self.segments[*self.attributes.get(name)?] {
            Segment::Value { span, .. } => Some(span.clone()),
            Segment::Opaque(_) => None,
        }
    }

    /// Replaces the value assigned to `name` with `text`
    ///
    /// Returns `false` if there is no such attribute.
    pub fn set_value(&mut self, name: &str, text: &str) -> bool {
        let Some(index) = self.attributes.get(name) else {
            return false;
        };

        if let Segment::Value { replacement, .. } = &mut self.segments[*index] {
            *replacement = Some(text.to_string());
        }

        tracing::trace!(name, text, "value replaced");
        true
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.to_string().into_bytes()
    }

    fn segment_text<'a>(&'a self, segment: &'a Segment) -> &'a str {
        match segment {
            Segment::Opaque(span) => &self.source[span.clone()],
            Segment::Value {
                replacement: Some(replacement),
                ..
            } => replacement.as_str(),
            Segment::Value { span, .. } => &self.source[span.clone()],
        }
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            f.write_str(self.segment_text(segment))?;
        }
        Ok(())
    }
}
