// crates/core/src/template.rs
//! Prompt templates: placeholder filling and configuration validation.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::table::Row;

/// A user-defined (prompt text, output column) pair applied to every row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateConfig {
    pub id: String,
    pub template_text: String,
    pub output_field_name: String,
}

/// Characters that would break CSV header integrity in an output field name.
const UNSAFE_OUTPUT_CHARS: [char; 4] = [',', '"', '\n', '\r'];

/// Substitute `{{field}}` placeholders in `template` with row values.
///
/// Placeholder names run up to the first `}` and are trimmed before lookup.
/// Occurrences are replaced left to right and replacement values are never
/// re-scanned, so a value containing `{{...}}` comes through literally.
/// Missing fields and empty cells substitute as the empty string; filling
/// never fails.
pub fn fill(template: &str, row: &Row) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find("{{") {
        out.push_str(&rest[..open]);
        let body = &rest[open + 2..];
        match body.find('}') {
            Some(close) if body[close..].starts_with("}}") => {
                let name = body[..close].trim();
                if let Some(Some(value)) = row.get(name) {
                    out.push_str(value);
                }
                rest = &body[close + 2..];
            }
            _ => {
                // Unterminated braces are literal text.
                out.push_str("{{");
                rest = body;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Trimmed placeholder names referenced by a template, in order of first
/// appearance, deduplicated.
pub fn placeholders(template: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    let mut rest = template;
    while let Some(open) = rest.find("{{") {
        let body = &rest[open + 2..];
        match body.find('}') {
            Some(close) if body[close..].starts_with("}}") => {
                let name = body[..close].trim();
                if !names.iter().any(|n| n == name) {
                    names.push(name.to_string());
                }
                rest = &body[close + 2..];
            }
            _ => rest = body,
        }
    }
    names
}

/// Validate a batch of template configurations against a table's fields.
///
/// Checked per the data-model invariants: non-empty output names that do not
/// collide with table fields, are unique within the batch, and contain no
/// CSV-breaking characters; every placeholder must reference a real field.
pub fn validate_configs(
    field_names: &[String],
    configs: &[TemplateConfig],
) -> Result<(), ValidationError> {
    if configs.is_empty() {
        return Err(ValidationError::NoConfigs);
    }

    let mut seen_outputs: Vec<&str> = Vec::new();
    for config in configs {
        let output = config.output_field_name.as_str();
        if output.trim().is_empty() {
            return Err(ValidationError::EmptyOutputName);
        }
        if output.contains(UNSAFE_OUTPUT_CHARS) {
            return Err(ValidationError::UnsafeOutputName(output.to_string()));
        }
        if field_names.iter().any(|f| f == output) {
            return Err(ValidationError::OutputNameTaken(output.to_string()));
        }
        if seen_outputs.contains(&output) {
            return Err(ValidationError::DuplicateOutputName(output.to_string()));
        }
        seen_outputs.push(output);

        for name in placeholders(&config.template_text) {
            if !field_names.iter().any(|f| *f == name) {
                return Err(ValidationError::UnknownField(name));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::row_from_pairs;
    use pretty_assertions::assert_eq;

    fn config(id: &str, text: &str, output: &str) -> TemplateConfig {
        TemplateConfig {
            id: id.into(),
            template_text: text.into(),
            output_field_name: output.into(),
        }
    }

    #[test]
    fn test_fill_substitutes_fields() {
        let row = row_from_pairs([("name", Some("Ada")), ("city", Some("London"))]);
        assert_eq!(
            fill("{{name}} lives in {{city}}.", &row),
            "Ada lives in London."
        );
    }

    #[test]
    fn test_fill_repeated_placeholder() {
        let row = row_from_pairs([("name", Some("Ada"))]);
        assert_eq!(fill("{{name}}, {{name}}!", &row), "Ada, Ada!");
    }

    #[test]
    fn test_fill_missing_field_is_empty() {
        let row = row_from_pairs([("name", Some("Ada"))]);
        assert_eq!(fill("Hi {{nope}}!", &row), "Hi !");
    }

    #[test]
    fn test_fill_null_cell_is_empty() {
        let row = row_from_pairs::<_, _, String>([("name", None)]);
        assert_eq!(fill("Hi {{name}}!", &row), "Hi !");
    }

    #[test]
    fn test_fill_trims_placeholder_name() {
        let row = row_from_pairs([("name", Some("Ada"))]);
        assert_eq!(fill("Hi {{ name }}!", &row), "Hi Ada!");
    }

    #[test]
    fn test_fill_no_recursive_expansion() {
        // A substituted value containing placeholder syntax is literal.
        let row = row_from_pairs([("a", Some("{{b}}")), ("b", Some("secret"))]);
        assert_eq!(fill("{{a}}", &row), "{{b}}");
    }

    #[test]
    fn test_fill_is_idempotent() {
        let row = row_from_pairs([("x", Some("1")), ("y", Some("2"))]);
        let template = "{{x}} and {{y}} and {{x}}";
        assert_eq!(fill(template, &row), fill(template, &row));
    }

    #[test]
    fn test_fill_unterminated_braces_stay_literal() {
        let row = row_from_pairs([("a", Some("v"))]);
        assert_eq!(fill("{{a", &row), "{{a");
        assert_eq!(fill("{{a} and {{a}}", &row), "{{a} and v");
    }

    #[test]
    fn test_fill_leaves_plain_text_untouched() {
        let row = row_from_pairs([("a", Some("v"))]);
        assert_eq!(fill("no placeholders here", &row), "no placeholders here");
    }

    #[test]
    fn test_placeholders_dedup_in_order() {
        assert_eq!(
            placeholders("{{b}} {{ a }} {{b}}"),
            vec!["b".to_string(), "a".to_string()]
        );
    }

    #[test]
    fn test_validate_rejects_empty_batch() {
        let fields = vec!["name".to_string()];
        assert_eq!(
            validate_configs(&fields, &[]),
            Err(ValidationError::NoConfigs)
        );
    }

    #[test]
    fn test_validate_rejects_output_name_colliding_with_field() {
        let fields = vec!["name".to_string()];
        let configs = vec![config("1", "hi {{name}}", "name")];
        assert_eq!(
            validate_configs(&fields, &configs),
            Err(ValidationError::OutputNameTaken("name".into()))
        );
    }

    #[test]
    fn test_validate_rejects_duplicate_output_names() {
        let fields = vec!["name".to_string()];
        let configs = vec![
            config("1", "a {{name}}", "out"),
            config("2", "b {{name}}", "out"),
        ];
        assert_eq!(
            validate_configs(&fields, &configs),
            Err(ValidationError::DuplicateOutputName("out".into()))
        );
    }

    #[test]
    fn test_validate_rejects_unsafe_output_name() {
        let fields = vec!["name".to_string()];
        for bad in ["a,b", "a\"b", "a\nb"] {
            let configs = vec![config("1", "t", bad)];
            assert_eq!(
                validate_configs(&fields, &configs),
                Err(ValidationError::UnsafeOutputName(bad.into()))
            );
        }
    }

    #[test]
    fn test_validate_rejects_unknown_placeholder() {
        let fields = vec!["name".to_string()];
        let configs = vec![config("1", "hi {{surname}}", "out")];
        assert_eq!(
            validate_configs(&fields, &configs),
            Err(ValidationError::UnknownField("surname".into()))
        );
    }

    #[test]
    fn test_validate_accepts_good_batch() {
        let fields = vec!["name".to_string(), "city".to_string()];
        let configs = vec![
            config("1", "Describe {{name}} from {{city}}", "bio"),
            config("2", "One fact about {{city}}", "fact"),
        ];
        assert_eq!(validate_configs(&fields, &configs), Ok(()));
    }

    #[test]
    fn test_validate_rejects_empty_output_name() {
        let fields = vec!["name".to_string()];
        let configs = vec![config("1", "t", "  ")];
        assert_eq!(
            validate_configs(&fields, &configs),
            Err(ValidationError::EmptyOutputName)
        );
    }
}
