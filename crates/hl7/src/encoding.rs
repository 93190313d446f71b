//! Delimiter discovery and escape-sequence decoding.
//!
//! An HL7 v2 message declares its own delimiters: the character immediately
//! after `MSH` is the field separator, and MSH-2 lists the component,
//! repetition, escape and subcomponent characters in that order.

use crate::{Hl7Error, Hl7Result};
use std::borrow::Cow;

/// The five delimiter characters in effect for one message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Delimiters {
    pub field: char,
    pub component: char,
    pub repetition: char,
    pub escape: char,
    pub subcomponent: char,
}

impl Default for Delimiters {
    fn default() -> Self {
        Self {
            field: '|',
            component: '^',
            repetition: '~',
            escape: '\\',
            subcomponent: '&',
        }
    }
}

impl Delimiters {
    /// Read the delimiters declared by an MSH segment line.
    ///
    /// # Arguments
    ///
    /// * `header_line` - A single segment line starting with `MSH`.
    ///
    /// # Errors
    ///
    /// Returns [`Hl7Error::InvalidHeader`] if the field separator cannot be established and
    /// [`Hl7Error::UnsupportedEncoding`] if MSH-2 does not declare four distinct, usable
    /// encoding characters (a fifth truncation character, as in v2.7, is tolerated).
    pub fn from_header(header_line: &str) -> Hl7Result<Self> {
        let mut chars = header_line.chars();
        let name: String = chars.by_ref().take(3).collect();
        if name != crate::HEADER_SEGMENT {
            return Err(Hl7Error::InvalidHeader(format!(
                "segment '{name}' is not a header segment"
            )));
        }

        let field = chars
            .next()
            .ok_or_else(|| Hl7Error::InvalidHeader("field separator not declared".into()))?;
        if field.is_alphanumeric() || field.is_whitespace() {
            return Err(Hl7Error::InvalidHeader(format!(
                "'{field}' cannot be used as a field separator"
            )));
        }

        let encoding: Vec<char> = chars.take_while(|c| *c != field).collect();
        if !(4..=5).contains(&encoding.len()) {
            return Err(Hl7Error::UnsupportedEncoding(format!(
                "expected 4 encoding characters, found '{}'",
                encoding.iter().collect::<String>()
            )));
        }

        let declared = &encoding[..4];
        for (i, c) in declared.iter().enumerate() {
            if c.is_alphanumeric() || c.is_whitespace() || declared[i + 1..].contains(c) {
                return Err(Hl7Error::UnsupportedEncoding(format!(
                    "'{}' is not a valid set of encoding characters",
                    declared.iter().collect::<String>()
                )));
            }
        }

        Ok(Self {
            field,
            component: declared[0],
            repetition: declared[1],
            escape: declared[2],
            subcomponent: declared[3],
        })
    }

    /// The MSH-2 encoding characters as they appear on the wire.
    pub fn encoding_characters(&self) -> String {
        [self.component, self.repetition, self.escape, self.subcomponent]
            .iter()
            .collect()
    }

    /// Decode the standard delimiter escape sequences in a value.
    ///
    /// `\F\`, `\S\`, `\T\`, `\R\` and `\E\` are replaced by the field, component,
    /// subcomponent, repetition and escape characters. Other sequences (hex data,
    /// formatting commands) and unterminated sequences are kept verbatim.
    pub fn unescape<'a>(&self, value: &'a str) -> Cow<'a, str> {
        if !value.contains(self.escape) {
            return Cow::Borrowed(value);
        }

        let mut out = String::with_capacity(value.len());
        let mut rest = value;
        while let Some(start) = rest.find(self.escape) {
            out.push_str(&rest[..start]);
            let after = &rest[start + self.escape.len_utf8()..];
            let Some(end) = after.find(self.escape) else {
                out.push_str(&rest[start..]);
                return Cow::Owned(out);
            };

            let decoded = match &after[..end] {
                "F" => Some(self.field),
                "S" => Some(self.component),
                "T" => Some(self.subcomponent),
                "R" => Some(self.repetition),
                "E" => Some(self.escape),
                _ => None,
            };
            let consumed = start + self.escape.len_utf8() * 2 + end;
            match decoded {
                Some(c) => out.push(c),
                None => out.push_str(&rest[start..consumed]),
            }
            rest = &rest[consumed..];
        }
        out.push_str(rest);
        Cow::Owned(out)
    }
}
