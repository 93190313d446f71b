//! Positional segment tree for one HL7 v2 message.
//!
//! Responsibilities:
//! - Strip transport framing (MLLP start/end bytes) and accept `\r`, `\n` or `\r\n`
//!   segment terminators
//! - Locate the MSH header and establish the delimiters it declares
//! - Split every segment into fields, keeping field numbers aligned with the HL7
//!   numbering (MSH-1 is the field separator itself)
//! - Answer Field Navigator queries, returning `None` for anything absent
//!
//! Notes:
//! - Lines that do not start with a three-character segment name are dropped with a
//!   warning rather than failing the message
//! - Empty values and the HL7 explicit null (`""`) are both reported as absent

use crate::{Delimiters, FieldPath, Hl7Error, Hl7Result};
use std::borrow::Cow;

/// Name of the message header segment.
pub const HEADER_SEGMENT: &str = "MSH";

const MLLP_START_BLOCK: char = '\u{0b}';
const MLLP_END_BLOCK: char = '\u{1c}';
const EXPLICIT_NULL: &str = "\"\"";

/// One named segment with its raw field text.
///
/// `fields[0]` holds the segment name so that `fields[n]` is field `n`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Segment {
    fields: Vec<String>,
}

impl Segment {
    fn parse(line: &str, delimiters: &Delimiters) -> Option<Self> {
        let name: String = line.chars().take(3).collect();
        let well_formed = name.len() == 3
            && name
                .chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
            && line[3..]
                .chars()
                .next()
                .map_or(true, |c| c == delimiters.field);
        if !well_formed {
            return None;
        }

        let mut parts = line.split(delimiters.field);
        let mut fields: Vec<String> = Vec::new();
        fields.push(parts.next().unwrap_or_default().to_string());
        if name == HEADER_SEGMENT {
            // MSH-1 is the separator that split the line.
            fields.push(delimiters.field.to_string());
        }
        fields.extend(parts.map(str::to_string));
        Some(Self { fields })
    }

    /// The three-character segment name.
    pub fn name(&self) -> &str {
        &self.fields[0]
    }

    /// Raw, undecoded text of field `number`, if present and non-empty.
    pub fn raw_field(&self, number: usize) -> Option<&str> {
        if number == 0 {
            return None;
        }
        self.fields
            .get(number)
            .map(String::as_str)
            .filter(|f| !f.is_empty())
    }

    /// Resolve the field/repetition/component/subcomponent part of a path.
    fn locate<'a>(&'a self, path: &FieldPath, delimiters: &Delimiters) -> Option<&'a str> {
        let raw = self.raw_field(path.field)?;

        // MSH-1 and MSH-2 contain delimiter characters and are never split.
        if self.name() == HEADER_SEGMENT && path.field <= 2 {
            return match (path.field_repetition, path.component) {
                (0, None | Some(1)) => Some(raw),
                _ => None,
            };
        }

        let mut value = raw.split(delimiters.repetition).nth(path.field_repetition)?;
        if let Some(component) = path.component {
            value = value.split(delimiters.component).nth(component.checked_sub(1)?)?;
        }
        if let Some(subcomponent) = path.subcomponent {
            value = value
                .split(delimiters.subcomponent)
                .nth(subcomponent.checked_sub(1)?)?;
        }
        Some(value)
    }
}

/// A decoded message: its delimiters and its segments in wire order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    delimiters: Delimiters,
    segments: Vec<Segment>,
}

impl Message {
    /// Decompose raw text into header plus segments.
    ///
    /// # Arguments
    ///
    /// * `raw` - Message text, optionally MLLP-framed.
    ///
    /// # Returns
    ///
    /// Returns a [`Message`] containing every well-formed segment in source order.
    ///
    /// # Errors
    ///
    /// Returns [`Hl7Error`] if:
    /// - the text is empty or whitespace,
    /// - no segment starts with `MSH`,
    /// - the header does not declare usable delimiters,
    /// - the header declares a version outside the 2.x family.
    pub fn parse(raw: &str) -> Hl7Result<Self> {
        let text = raw
            .trim_matches(|c: char| c == MLLP_START_BLOCK || c == MLLP_END_BLOCK || c.is_whitespace());
        if text.is_empty() {
            return Err(Hl7Error::EmptyMessage);
        }

        let lines: Vec<&str> = text
            .split(['\r', '\n'])
            .filter(|line| !line.trim().is_empty())
            .collect();

        let header_line = lines
            .iter()
            .find(|line| line.starts_with(HEADER_SEGMENT))
            .ok_or(Hl7Error::MissingHeader)?;
        let delimiters = Delimiters::from_header(header_line)?;

        let mut segments = Vec::with_capacity(lines.len());
        for (index, line) in lines.iter().enumerate() {
            match Segment::parse(line, &delimiters) {
                Some(segment) => segments.push(segment),
                None => tracing::warn!(line = index + 1, "dropping line without a segment name"),
            }
        }

        let message = Self {
            delimiters,
            segments,
        };

        if let Some(version) = message.get(&FieldPath::new(HEADER_SEGMENT, 12).component(1)) {
            if !version.trim_start().starts_with('2') {
                return Err(Hl7Error::UnsupportedVersion(version));
            }
        }

        Ok(message)
    }

    pub fn delimiters(&self) -> &Delimiters {
        &self.delimiters
    }

    /// All segments in wire order.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Segment names in wire order.
    pub fn segment_names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().map(Segment::name)
    }

    /// Every occurrence of the named segment, in wire order.
    pub fn segments_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Segment> {
        self.segments.iter().filter(move |s| s.name() == name)
    }

    /// The `repetition`-th (zero-based) occurrence of the named segment.
    pub fn segment(&self, name: &str, repetition: usize) -> Option<&Segment> {
        self.segments
            .iter()
            .filter(|s| s.name() == name)
            .nth(repetition)
    }

    /// Number of occurrences of the named segment.
    pub fn count(&self, name: &str) -> usize {
        self.segments.iter().filter(|s| s.name() == name).count()
    }

    pub fn has_segment(&self, name: &str) -> bool {
        self.segment(name, 0).is_some()
    }

    /// The MSH header segment.
    pub fn header(&self) -> Option<&Segment> {
        self.segment(HEADER_SEGMENT, 0)
    }

    /// Field Navigator: resolve a path to a decoded value.
    ///
    /// Returns `None` when the segment, repetition, field, component or subcomponent is
    /// absent, or when the addressed value is empty or the HL7 explicit null.
    pub fn get(&self, path: &FieldPath) -> Option<String> {
        let segment = self.segment(&path.segment, path.segment_repetition)?;
        let raw = segment.locate(path, &self.delimiters)?;
        if raw.is_empty() || raw == EXPLICIT_NULL {
            return None;
        }

        // MSH-2 holds the escape character itself.
        let decoded = if segment.name() == HEADER_SEGMENT && path.field <= 2 {
            Cow::Borrowed(raw)
        } else {
            self.delimiters.unescape(raw)
        };
        let trimmed = decoded.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    }

    /// Field Navigator over textual notation (`/.PID-5-1`, `PID-5-1`, `OBX(2)-3-1`).
    ///
    /// An unparseable path is reported as absent and logged at debug level.
    pub fn value(&self, notation: &str) -> Option<String> {
        match notation.parse::<FieldPath>() {
            Ok(path) => self.get(&path),
            Err(err) => {
                tracing::debug!(%notation, "unusable field path: {err}");
                None
            }
        }
    }

    /// Shorthand for a whole field of the first occurrence of a segment.
    pub fn field(&self, segment: &str, field: usize) -> Option<String> {
        self.get(&FieldPath::new(segment, field))
    }

    /// Shorthand for one component of a field of the first occurrence of a segment.
    pub fn component(&self, segment: &str, field: usize, component: usize) -> Option<String> {
        self.get(&FieldPath::new(segment, field).component(component))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADT: &str = "MSH|^~\\&|A|F1|B|F2|20240715120000||ADT^A01|12345|P|2.4\rPID|1||123^^^MRN||DOE^JOHN||19800101|M\r";

    #[test]
    fn parses_segments_in_wire_order() {
        let message = Message::parse(ADT).expect("parse adt");
        let names: Vec<&str> = message.segment_names().collect();
        assert_eq!(names, vec!["MSH", "PID"]);
    }

    #[test]
    fn header_field_numbers_follow_hl7_numbering() {
        let message = Message::parse(ADT).expect("parse adt");
        assert_eq!(message.field("MSH", 1).as_deref(), Some("|"));
        assert_eq!(message.field("MSH", 2).as_deref(), Some("^~\\&"));
        assert_eq!(message.field("MSH", 3).as_deref(), Some("A"));
        assert_eq!(message.field("MSH", 7).as_deref(), Some("20240715120000"));
        assert_eq!(message.field("MSH", 8), None);
        assert_eq!(message.component("MSH", 9, 2).as_deref(), Some("A01"));
        assert_eq!(message.field("MSH", 12).as_deref(), Some("2.4"));
    }

    #[test]
    fn both_notations_resolve_identically() {
        let message = Message::parse(ADT).expect("parse adt");
        assert_eq!(message.value("/.PID-5-1").as_deref(), Some("DOE"));
        assert_eq!(message.value("PID-5-1").as_deref(), Some("DOE"));
        assert_eq!(message.value("/.PID-5-2"), message.value("PID-5-2"));
    }

    #[test]
    fn absent_things_are_none() {
        let message = Message::parse(ADT).expect("parse adt");
        assert_eq!(message.value("PV1-2"), None);
        assert_eq!(message.value("PID-5-3"), None);
        assert_eq!(message.value("PID-30"), None);
        assert_eq!(message.value("PID(1)-3"), None);
        assert_eq!(message.value("not a path"), None);
    }

    #[test]
    fn accepts_newlines_and_mllp_framing() {
        let framed = format!("\u{0b}{}\u{1c}\r", ADT.replace('\r', "\r\n"));
        let message = Message::parse(&framed).expect("parse framed");
        assert_eq!(message.count("PID"), 1);
        assert_eq!(message.value("PID-3-1").as_deref(), Some("123"));
    }

    #[test]
    fn addresses_repeating_segments_and_fields() {
        let text = "MSH|^~\\&|LAB||EHR||20240101||ORU^R01|9|P|2.5\r\
                    PID|1||111^^^A^PI~222^^^B^MR\r\
                    OBX|1|NM|GLU^Glucose||5.4\r\
                    OBX|2|ST|COL^Colour||Amber\r";
        let message = Message::parse(text).expect("parse oru");
        assert_eq!(message.value("PID-3(1)-1").as_deref(), Some("222"));
        assert_eq!(message.value("OBX(1)-3-2").as_deref(), Some("Colour"));
        assert_eq!(message.value("OBX(2)-3"), None);
    }

    #[test]
    fn decodes_escapes_and_explicit_null() {
        let text = "MSH|^~\\&|A||B||20240101||ADT^A08|1|P|2.3\rPID|1||9||O\\S\\BRIEN^\"\"";
        let message = Message::parse(text).expect("parse");
        assert_eq!(message.value("PID-5-1").as_deref(), Some("O^BRIEN"));
        assert_eq!(message.value("PID-5-2"), None);
    }

    #[test]
    fn drops_lines_without_segment_names() {
        let text = format!("{ADT}free text continuation\rpv1|x");
        let message = Message::parse(&text).expect("parse");
        assert_eq!(message.segments().len(), 2);
    }

    #[test]
    fn rejects_text_without_header() {
        let err = Message::parse("this is not hl7").expect_err("no header");
        assert!(matches!(err, Hl7Error::MissingHeader));

        let err = Message::parse("  \r\n ").expect_err("blank");
        assert!(matches!(err, Hl7Error::EmptyMessage));
    }

    #[test]
    fn rejects_non_v2_versions() {
        let err = Message::parse("MSH|^~\\&|A||B||20240101||ADT^A01|1|P|3.0")
            .expect_err("v3 declared");
        assert!(matches!(err, Hl7Error::UnsupportedVersion(v) if v == "3.0"));
    }

    #[test]
    fn header_need_not_be_first() {
        let text = "PID|1||123\rMSH|^~\\&|A||B||20240101||ADT^A01|1|P|2.4";
        let message = Message::parse(text).expect("parse");
        assert_eq!(message.segment_names().next(), Some("PID"));
        assert!(message.header().is_some());
    }

    #[test]
    fn segment_lookup_outlives_a_temporary_name() {
        let text = format!("{ADT}OBX|1||A\rOBX|2||B");
        let message = Message::parse(&text).expect("parse");

        let second = {
            let name = String::from("OBX");
            message.segment(&name, 1)
        };
        assert_eq!(second.and_then(|s| s.raw_field(3)), Some("B"));
        assert_eq!(message.count(&String::from("OBX")), 2);
        assert_eq!(message.segments_named("OBX").count(), 2);
    }
}
