//! Field Navigator addressing.
//!
//! A [`FieldPath`] names one value inside a message: segment, segment repetition,
//! field, field repetition, component and subcomponent. Two textual notations are
//! accepted and resolve identically:
//!
//! - context-qualified: `/.PID-5-1`, `/.OBX(2)-3-1`
//! - bare: `PID-5-1`, `OBX(2)-3-1`
//!
//! Repetition indices are zero-based and written in parentheses after the segment
//! name or field number (`PID-3(1)-1`). Field, component and subcomponent numbers
//! are one-based, as in the HL7 standard.

use crate::{Hl7Error, Hl7Result};
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FieldPath {
    pub segment: String,
    pub segment_repetition: usize,
    pub field: usize,
    pub field_repetition: usize,
    pub component: Option<usize>,
    pub subcomponent: Option<usize>,
}

impl FieldPath {
    /// Address a whole field of the first occurrence of a segment.
    pub fn new(segment: impl Into<String>, field: usize) -> Self {
        Self {
            segment: segment.into(),
            segment_repetition: 0,
            field,
            field_repetition: 0,
            component: None,
            subcomponent: None,
        }
    }

    /// Select the zero-based occurrence of a repeating segment.
    pub fn repetition(mut self, repetition: usize) -> Self {
        self.segment_repetition = repetition;
        self
    }

    /// Select the zero-based repetition of a repeating field.
    pub fn field_repetition(mut self, repetition: usize) -> Self {
        self.field_repetition = repetition;
        self
    }

    /// Select a one-based component.
    pub fn component(mut self, component: usize) -> Self {
        self.component = Some(component);
        self
    }

    /// Select a one-based subcomponent of the selected component.
    pub fn subcomponent(mut self, subcomponent: usize) -> Self {
        self.subcomponent = Some(subcomponent);
        self
    }
}

/// Split `NAME(3)` into `("NAME", 3)`; a missing index means zero.
fn split_index(part: &str) -> Hl7Result<(&str, usize)> {
    match part.split_once('(') {
        None => Ok((part, 0)),
        Some((head, tail)) => {
            let index = tail
                .strip_suffix(')')
                .and_then(|n| n.parse::<usize>().ok())
                .ok_or_else(|| Hl7Error::InvalidPath(format!("bad repetition index in '{part}'")))?;
            Ok((head, index))
        }
    }
}

fn position(part: &str, what: &str) -> Hl7Result<usize> {
    match part.parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n),
        _ => Err(Hl7Error::InvalidPath(format!("{what} '{part}' is not a positive number"))),
    }
}

impl FromStr for FieldPath {
    type Err = Hl7Error;

    fn from_str(notation: &str) -> Hl7Result<Self> {
        let bare = notation
            .trim()
            .trim_start_matches("/.")
            .trim_start_matches('/');
        let mut parts = bare.split('-');

        let (segment, segment_repetition) = split_index(parts.next().unwrap_or_default())?;
        if segment.len() != 3 || !segment.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(Hl7Error::InvalidPath(format!(
                "'{notation}' does not start with a segment name"
            )));
        }

        let field_part = parts
            .next()
            .ok_or_else(|| Hl7Error::InvalidPath(format!("'{notation}' has no field number")))?;
        let (field, field_repetition) = split_index(field_part)?;
        let field = position(field, "field")?;

        let component = parts.next().map(|c| position(c, "component")).transpose()?;
        let subcomponent = parts
            .next()
            .map(|s| position(s, "subcomponent"))
            .transpose()?;
        if parts.next().is_some() {
            return Err(Hl7Error::InvalidPath(format!(
                "'{notation}' addresses below subcomponent level"
            )));
        }

        Ok(Self {
            segment: segment.to_ascii_uppercase(),
            segment_repetition,
            field,
            field_repetition,
            component,
            subcomponent,
        })
    }
}

impl fmt::Display for FieldPath {
    /// Renders the bare notation, omitting zero repetition indices.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segment)?;
        if self.segment_repetition > 0 {
            write!(f, "({})", self.segment_repetition)?;
        }
        write!(f, "-{}", self.field)?;
        if self.field_repetition > 0 {
            write!(f, "({})", self.field_repetition)?;
        }
        if let Some(component) = self.component {
            write!(f, "-{component}")?;
        }
        if let Some(subcomponent) = self.subcomponent {
            write!(f, "-{subcomponent}")?;
        }
        Ok(())
    }
}
