//! Summary of a filter run
//!
//! Serializes as a map of three name lists:
//! - `declared`: variables the module accepts
//! - `kept`: attributes of the document that are declared
//! - `neutralized`: attributes that were set to `null`
use crate::filter::{DeclaredSet, Filtered};
use serde::{
    ser::{SerializeMap, SerializeSeq},
    Serializer,
};

#[derive(Debug, Clone, derive_new::new)]
pub struct Report<'a> {
    declared: &'a DeclaredSet,
    filtered: &'a Filtered,
}

struct Names<I>(I);

impl<'n, I> serde::ser::Serialize for Names<I>
where
    I: Iterator<Item = &'n str> + Clone,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut ser = serializer.serialize_seq(None)?;
        for name in self.0.clone() {
            ser.serialize_element(name)?;
        }
        ser.end()
    }
}

impl serde::ser::Serialize for Report<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut ser = serializer.serialize_map(Some(3))?;
        ser.serialize_entry("declared", &Names(self.declared.iter()))?;
        ser.serialize_entry(
            "kept",
            &Names(self.filtered.kept.iter().map(String::as_str)),
        )?;
        ser.serialize_entry(
            "neutralized",
            &Names(self.filtered.neutralized.iter().map(String::as_str)),
        )?;
        ser.end()
    }
}
