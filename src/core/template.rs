//! Label template rendering.
//!
//! Templates use positional slots: `{}` takes the next value, `{N}` takes
//! value `N` (zero based). `{{` and `}}` produce literal braces. The two slot
//! styles cannot be mixed in one template.

use crate::core::Record;
use crate::domain::model::LabelTemplate;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    #[error("template needs {required} field names but the binding configures {configured}")]
    InsufficientFields { required: usize, configured: usize },

    #[error("record has no field '{field}'")]
    MissingField { field: String },

    #[error("placeholder {{{index}}} is out of range for nr_fields = {nr_fields}")]
    PlaceholderOutOfRange { index: usize, nr_fields: usize },

    #[error("malformed template at byte {position}: {reason}")]
    MalformedTemplate { position: usize, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Slot(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Numbering {
    Unknown,
    Automatic,
    Manual,
}

fn malformed(position: usize, reason: &str) -> RenderError {
    RenderError::MalformedTemplate {
        position,
        reason: reason.to_string(),
    }
}

fn parse(template: &str) -> Result<Vec<Segment>, RenderError> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut numbering = Numbering::Unknown;
    let mut next_auto = 0;
    let mut chars = template.char_indices().peekable();

    while let Some((pos, c)) = chars.next() {
        match c {
            '{' if matches!(chars.peek(), Some((_, '{'))) => {
                chars.next();
                literal.push('{');
            }
            '{' => {
                let mut spec = String::new();
                loop {
                    match chars.next() {
                        Some((_, '}')) => break,
                        Some((_, ch)) => spec.push(ch),
                        None => return Err(malformed(pos, "unclosed '{'")),
                    }
                }

                let index = if spec.is_empty() {
                    if numbering == Numbering::Manual {
                        return Err(malformed(pos, "cannot mix '{}' with numbered slots"));
                    }
                    numbering = Numbering::Automatic;
                    next_auto += 1;
                    next_auto - 1
                } else {
                    if numbering == Numbering::Automatic {
                        return Err(malformed(pos, "cannot mix numbered slots with '{}'"));
                    }
                    numbering = Numbering::Manual;
                    spec.parse::<usize>()
                        .map_err(|_| malformed(pos, "slot must be empty or a number"))?
                };

                if !literal.is_empty() {
                    segments.push(Segment::Literal(std::mem::take(&mut literal)));
                }
                segments.push(Segment::Slot(index));
            }
            '}' if matches!(chars.peek(), Some((_, '}'))) => {
                chars.next();
                literal.push('}');
            }
            '}' => return Err(malformed(pos, "single '}' must be written as '}}'")),
            _ => literal.push(c),
        }
    }

    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }
    Ok(segments)
}

fn check_range(segments: &[Segment], nr_fields: usize) -> Result<(), RenderError> {
    for segment in segments {
        if let Segment::Slot(index) = segment {
            if *index >= nr_fields {
                return Err(RenderError::PlaceholderOutOfRange {
                    index: *index,
                    nr_fields,
                });
            }
        }
    }
    Ok(())
}

fn format_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Bool(b) => b.to_string(),
        serde_json::Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

impl LabelTemplate {
    /// Number of slots in the template text.
    pub fn placeholder_count(&self) -> Result<usize, RenderError> {
        Ok(parse(&self.template)?
            .iter()
            .filter(|s| matches!(s, Segment::Slot(_)))
            .count())
    }

    /// A usable template parses and never reads past `nr_fields`.
    pub fn check(&self) -> Result<(), RenderError> {
        check_range(&parse(&self.template)?, self.nr_fields)
    }
}

/// Fill `template` with the values of the first `nr_fields` names from
/// `field_names` (whitespace separated), read from `record`.
pub fn render_label(
    template: &LabelTemplate,
    field_names: &str,
    record: &Record,
) -> Result<String, RenderError> {
    let names: Vec<&str> = field_names.split_whitespace().collect();
    if names.len() < template.nr_fields {
        return Err(RenderError::InsufficientFields {
            required: template.nr_fields,
            configured: names.len(),
        });
    }

    let segments = parse(&template.template)?;
    check_range(&segments, template.nr_fields)?;

    let values = names[..template.nr_fields]
        .iter()
        .map(|name| {
            record
                .get(name)
                .map(|v| format_value(&v))
                .ok_or_else(|| RenderError::MissingField {
                    field: (*name).to_string(),
                })
        })
        .collect::<Result<Vec<String>, RenderError>>()?;

    let mut label = String::with_capacity(template.template.len());
    for segment in &segments {
        match segment {
            Segment::Literal(text) => label.push_str(text),
            Segment::Slot(index) => label.push_str(&values[*index]),
        }
    }
    Ok(label)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::RecordType;

    fn template(text: &str, nr_fields: usize) -> LabelTemplate {
        LabelTemplate {
            id: 1,
            name: "tube".to_string(),
            template: text.to_string(),
            nr_fields,
        }
    }

    fn sample() -> Record {
        Record::new(RecordType::Sample, 1)
            .with_field("barcode", "S001")
            .with_field("date", "2020-01-01")
            .with_field("temperature", 4.5)
            .with_field("depth", serde_json::Value::Null)
    }

    #[test]
    fn test_render_sequential_slots() {
        let label = render_label(&template("{}-{}", 2), "barcode date", &sample()).unwrap();
        assert_eq!(label, "S001-2020-01-01");
    }

    #[test]
    fn test_render_with_too_few_field_names() {
        let err = render_label(&template("{}-{}", 2), "barcode", &sample()).unwrap_err();
        assert_eq!(
            err,
            RenderError::InsufficientFields {
                required: 2,
                configured: 1
            }
        );
    }

    #[test]
    fn test_render_ignores_extra_field_names() {
        let label = render_label(&template("<{}>", 1), "barcode date id", &sample()).unwrap();
        assert_eq!(label, "<S001>");
    }

    #[test]
    fn test_render_numbered_slots_and_escaped_braces() {
        let zpl = template("^XA^FD{1}{{{0}}}^FS^XZ", 2);
        let label = render_label(&zpl, "barcode date", &sample()).unwrap();
        assert_eq!(label, "^XA^FD2020-01-01{S001}^FS^XZ");
    }

    #[test]
    fn test_render_formats_non_string_values() {
        let label =
            render_label(&template("{}|{}|{}", 3), "id temperature depth", &sample()).unwrap();
        assert_eq!(label, "1|4.5|");
    }

    #[test]
    fn test_render_missing_field() {
        let err = render_label(&template("{}", 1), "salinity", &sample()).unwrap_err();
        assert_eq!(
            err,
            RenderError::MissingField {
                field: "salinity".to_string()
            }
        );
    }

    #[test]
    fn test_check_rejects_slot_past_nr_fields() {
        assert!(template("{}-{}", 2).check().is_ok());
        assert_eq!(
            template("{}-{}-{}", 2).check().unwrap_err(),
            RenderError::PlaceholderOutOfRange {
                index: 2,
                nr_fields: 2
            }
        );
        assert!(template("{3}", 2).check().is_err());
    }

    #[test]
    fn test_malformed_templates() {
        for text in ["{", "}", "{x}", "{}{0}", "{0}{}"] {
            assert!(
                matches!(
                    template(text, 2).check(),
                    Err(RenderError::MalformedTemplate { .. })
                ),
                "expected {:?} to be malformed",
                text
            );
        }
    }

    #[test]
    fn test_placeholder_count() {
        assert_eq!(template("{}-{}", 2).placeholder_count().unwrap(), 2);
        assert_eq!(template("{{}}", 0).placeholder_count().unwrap(), 0);
        assert_eq!(template("{0}{0}", 1).placeholder_count().unwrap(), 2);
    }

    #[test]
    fn test_rendered_label_has_no_slots_left() {
        let label = render_label(&template("ID:{} D:{}", 2), "barcode date", &sample()).unwrap();
        assert!(!label.contains("{}"));
        assert_eq!(label, "ID:S001 D:2020-01-01");
    }
}
