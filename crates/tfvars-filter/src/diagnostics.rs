//! positioned diagnostics
//!
//! Every failure the library reports to a user is a [Diagnostic]: a summary, a detail text and (usually) the
//! [Subject] it refers to. Failures are collected into [Diagnostics] so that a caller can show all of them at once.
use std::fmt;

/// A position inside a source, 1-based line and column, 0-based byte offset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pos {
    pub line: usize,
    pub column: usize,
    pub byte: usize,
}

impl Pos {
    pub const START: Pos = Pos {
        line: 1,
        column: 1,
        byte: 0,
    };
}

impl Default for Pos {
    fn default() -> Self {
        Self::START
    }
}

/// Where a diagnostic points to
#[derive(Debug, Clone, PartialEq, Eq, derive_new::new)]
pub struct Subject {
    pub source: String,
    pub start: Pos,
}

/// Name and starting position of a text that is about to be parsed
///
/// The starting position is not necessarily [Pos::START]: a document may be a fragment of a larger stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Origin {
    pub source: String,
    pub start: Pos,
}

impl Origin {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            start: Pos::START,
        }
    }

    pub fn with_start(source: impl Into<String>, start: Pos) -> Self {
        Self {
            source: source.into(),
            start,
        }
    }

    /// Position of `offset` in `src`, shifted by the start position
    ///
    /// `offset` is clamped to the length of `src`.
    pub fn position_of(&self, src: &str, offset: usize) -> Pos {
        let mut offset = offset.min(src.len());
        while !src.is_char_boundary(offset) {
            offset -= 1;
        }

        let before = &src[..offset];
        let newlines = before.matches('\n').count();
        let column = match before.rfind('\n') {
            Some(newline) => before[newline + 1..].chars().count() + 1,
            None => self.start.column + before.chars().count(),
        };

        Pos {
            line: self.start.line + newlines,
            column,
            byte: self.start.byte + offset,
        }
    }

    /// Translates a position relative to the beginning of the text into one relative to [Origin::start]
    pub fn translate(&self, line: usize, column: usize, offset: usize) -> Pos {
        Pos {
            line: self.start.line + line.saturating_sub(1),
            column: if line <= 1 {
                self.start.column + column.saturating_sub(1)
            } else {
                column
            },
            byte: self.start.byte + offset,
        }
    }

    pub fn subject_at(&self, src: &str, offset: usize) -> Subject {
        Subject::new(self.source.clone(), self.position_of(src, offset))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub summary: String,
    pub detail: String,
    pub subject: Option<Subject>,
}

impl Diagnostic {
    pub fn error(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
            detail: detail.into(),
            subject: None,
        }
    }

    pub fn with_subject(mut self, subject: Subject) -> Self {
        self.subject = Some(subject);
        self
    }
}

/// Renders as `source:line: summary; detail`, without the location prefix when there is no subject
impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(subject) = &self.subject {
            write!(f, "{}:{}: ", subject.source, subject.start.line)?;
        }
        write!(f, "{}; {}", self.summary, self.detail)
    }
}

/// An ordered collection of [Diagnostic]s
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics(Vec<Diagnostic>);

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        tracing::trace!(%diagnostic, "diagnostic recorded");
        self.0.push(diagnostic);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.0.iter()
    }

    /// `Err(self)` if anything was recorded, `Ok(value)` otherwise
    pub fn into_result<T>(self, value: T) -> Result<T, Diagnostics> {
        if !self.is_empty() {
            Err(self)
        } else {
            Ok(value)
        }
    }
}

impl From<Diagnostic> for Diagnostics {
    fn from(value: Diagnostic) -> Self {
        Self(vec![value])
    }
}

impl Extend<Diagnostic> for Diagnostics {
    fn extend<T: IntoIterator<Item = Diagnostic>>(&mut self, iter: T) {
        for diagnostic in iter {
            self.push(diagnostic);
        }
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl std::error::Error for Diagnostics {}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, diagnostic) in self.0.iter().enumerate() {
            if index > 0 {
                f.write_str("\n")?;
            }
            diagnostic.fmt(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn position_of_counts_lines_and_columns() {
        let origin = Origin::new("test.tfvars");
        let src = "a = 1\nbb = \"x\"\n";

        assert_eq!(origin.position_of(src, 0), Pos::START);
        assert_eq!(
            origin.position_of(src, 8),
            Pos {
                line: 2,
                column: 3,
                byte: 8
            }
        );
    }

    #[test]
    fn position_of_respects_start() {
        let origin = Origin::with_start(
            "stream",
            Pos {
                line: 10,
                column: 5,
                byte: 100,
            },
        );
        let src = "a = 1\nb = 2";

        assert_eq!(
            origin.position_of(src, 4),
            Pos {
                line: 10,
                column: 9,
                byte: 104
            }
        );
        assert_eq!(
            origin.position_of(src, 10),
            Pos {
                line: 11,
                column: 5,
                byte: 110
            }
        );
    }

    #[test]
    fn display() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.push(
            Diagnostic::error("Unterminated template string", "No closing marker was found.")
                .with_subject(Subject::new("a.tfvars".into(), Pos::START)),
        );
        diagnostics.push(Diagnostic::error("Failed", "Something else."));

        insta::assert_snapshot!(diagnostics.to_string(), @r###"
        a.tfvars:1: Unterminated template string; No closing marker was found.
        Failed; Something else.
        "###);
    }

    #[test]
    fn into_result() {
        assert_eq!(Diagnostics::new().into_result(1), Ok(1));

        let diagnostics: Diagnostics = Diagnostic::error("Failed", "Something.").into();
        assert_eq!(diagnostics.clone().into_result(1), Err(diagnostics));
    }
}
