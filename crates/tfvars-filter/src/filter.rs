//! Neutralizing undeclared attributes
//!
//! Attributes are never removed: their value is replaced by [NULL_LITERAL], which for a module input means "not set".
use crate::diagnostics::{Diagnostics, Origin};
use crate::document::Document;
use indexmap::IndexSet;

/// Replacement for every undeclared value, whatever its type was
pub const NULL_LITERAL: &str = "null";

/// Names of the variables a module accepts
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeclaredSet(IndexSet<String>);

impl DeclaredSet {
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> + Clone + '_ {
        self.0.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for DeclaredSet {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// Result of [filter]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filtered {
    pub bytes: Vec<u8>,
    /// Declared attributes, left untouched
    pub kept: Vec<String>,
    /// Undeclared attributes, now `null`
    pub neutralized: Vec<String>,
}

/// Sets every attribute of `document` not in `declared` to [NULL_LITERAL]
///
/// Returns the neutralized names in document order. Applying this twice has the same result as applying it once.
pub fn neutralize_undeclared(document: &mut Document, declared: &DeclaredSet) -> Vec<String> {
    let undeclared: Vec<String> = document
        .names()
        .filter(|name| !declared.contains(name))
        .map(str::to_string)
        .collect();

    for name in &undeclared {
        tracing::debug!(%name, "neutralizing undeclared attribute");
        document.set_value(name, NULL_LITERAL);
    }

    undeclared
}

/// Parses `bytes`, neutralizes undeclared attributes and serializes the result
///
/// Fails without a result if the document is not valid.
#[tracing::instrument(level = "info", skip_all, fields(source = %origin.source))]
pub fn filter(bytes: &[u8], origin: &Origin, declared: &DeclaredSet) -> Result<Filtered, Diagnostics> {
    let mut document = Document::parse(bytes, origin)?;

    let neutralized = neutralize_undeclared(&mut document, declared);
    let kept = document
        .names()
        .filter(|name| declared.contains(name))
        .map(str::to_string)
        .collect();

    tracing::info!(
        attributes = document.len(),
        neutralized = neutralized.len(),
        "document filtered"
    );

    Ok(Filtered {
        bytes: document.to_bytes(),
        kept,
        neutralized,
    })
}
