use super::{Map, ToolError, ToolRuntime, Value};
use crate::config::ToolInputSpec;
use tracing::{debug, warn};

impl ToolRuntime {
    /// Coerces a raw action input into the argument mapping declared for
    /// `tool`. Malformed shapes are repaired, never rejected; the only error
    /// is a tool name missing from the registry.
    pub(crate) fn normalize_input(
        &self,
        tool: &str,
        raw: &Value,
    ) -> Result<Map<String, Value>, ToolError> {
        let Some(config) = self.spec_for(tool) else {
            warn!(requested_tool = %tool, "Unknown tool requested by agent");
            return Err(ToolError::UnknownTool(tool.to_string()));
        };

        let input = match &config.input {
            // Models often hallucinate input text for no-arg tools; discard it.
            ToolInputSpec::NoArguments => Map::new(),
            ToolInputSpec::SingleString {
                key,
                aliases,
                extensions,
            } => match raw {
                Value::Object(map) => rekey_single(map, key, aliases),
                Value::String(text) => coerce_single(text, key, aliases, extensions),
                Value::Null => Map::new(),
                other => {
                    warn!(tool = %config.name, "Non-string tool input; rendering as text");
                    single_entry(key, other.to_string())
                }
            },
            ToolInputSpec::Open => match raw {
                Value::Object(map) => map.clone(),
                Value::String(text) => open_mapping(text, &config.name),
                Value::Null => Map::new(),
                other => {
                    let mut map = Map::new();
                    map.insert("input".to_string(), other.clone());
                    map
                }
            },
        };
        Ok(input)
    }
}

fn rekey_single(map: &Map<String, Value>, key: &str, aliases: &[String]) -> Map<String, Value> {
    if map.contains_key(key) {
        return map.clone();
    }
    if map.len() == 1 {
        if let Some((found, value)) = map.iter().next() {
            if matches_key(found, key, aliases) {
                return single_value(key, value.clone());
            }
        }
    }
    warn!(expected_key = %key, "Tool input mapping lacks the expected key; passing through");
    map.clone()
}

// JSON object text, then a labelled pair, then an extension token, then the
// quoted-bare-string default.
fn coerce_single(
    text: &str,
    key: &str,
    aliases: &[String],
    extensions: &[String],
) -> Map<String, Value> {
    let trimmed = text.trim();

    if trimmed.contains('{') {
        if let Some(map) = parse_json_object(trimmed) {
            return rekey_single(&map, key, aliases);
        }
    }

    if let Some(value) = labelled_value(trimmed, key, aliases) {
        return single_entry(key, value);
    }

    if let Some(token) = extension_token(trimmed, extensions) {
        return single_entry(key, token);
    }

    let stripped = strip_quotes(trimmed);
    if stripped.contains(char::is_whitespace) {
        debug!(key, "Wrapping free-form text as single-key tool input");
    }
    single_entry(key, stripped.to_string())
}

fn open_mapping(text: &str, tool: &str) -> Map<String, Value> {
    let trimmed = text.trim();
    if trimmed.contains('{') {
        if let Some(map) = parse_json_object(trimmed) {
            return map;
        }
    }
    warn!(tool, "Wrapping unstructured tool input under the generic 'input' key");
    single_entry("input", strip_quotes(trimmed).to_string())
}

// Strict parse first, then the outermost brace span for fenced or noisy text.
fn parse_json_object(text: &str) -> Option<Map<String, Value>> {
    if let Ok(Value::Object(map)) = serde_json::from_str(text) {
        return Some(map);
    }
    if let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) {
        if start < end {
            if let Ok(Value::Object(map)) = serde_json::from_str(&text[start..=end]) {
                return Some(map);
            }
        }
    }
    None
}

fn labelled_value(text: &str, key: &str, aliases: &[String]) -> Option<String> {
    let (label, value) = text.split_once(':')?;
    let label = strip_quotes(label.trim());
    if label.is_empty() || !matches_key(label, key, aliases) {
        return None;
    }
    Some(strip_quotes(value.trim()).to_string())
}

// First token carrying one of the declared filename extensions.
fn extension_token(text: &str, extensions: &[String]) -> Option<String> {
    if extensions.is_empty() {
        return None;
    }
    for token in text.split(|c: char| c.is_whitespace() || c == ',' || c == ';') {
        let cleaned = strip_quotes(token.trim_matches(|c| matches!(c, '(' | ')' | '<' | '>')));
        if cleaned.is_empty() {
            continue;
        }
        let lowered = cleaned.to_lowercase();
        if extensions
            .iter()
            .any(|ext| lowered.ends_with(&format!(".{}", ext.to_lowercase())))
        {
            return Some(cleaned.to_string());
        }
    }
    None
}

fn matches_key(candidate: &str, key: &str, aliases: &[String]) -> bool {
    candidate.eq_ignore_ascii_case(key)
        || aliases
            .iter()
            .any(|alias| candidate.eq_ignore_ascii_case(alias))
}

fn strip_quotes(text: &str) -> &str {
    text.trim()
        .trim_matches(|c| matches!(c, '"' | '\'' | '`'))
        .trim()
}

fn single_entry(key: &str, value: String) -> Map<String, Value> {
    single_value(key, Value::String(value))
}

fn single_value(key: &str, value: Value) -> Map<String, Value> {
    let mut map = Map::new();
    map.insert(key.to_string(), value);
    map
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc_aliases() -> Vec<String> {
        vec!["filename".to_string(), "file".to_string()]
    }

    #[test]
    fn quoted_bare_string_is_unwrapped() {
        let map = coerce_single("\"invoice.pdf\"", "doc_id", &doc_aliases(), &[]);
        assert_eq!(map.get("doc_id"), Some(&Value::String("invoice.pdf".into())));
    }

    #[test]
    fn labelled_pair_with_alias_is_rekeyed() {
        let map = coerce_single("filename: invoice.pdf", "doc_id", &doc_aliases(), &[]);
        assert_eq!(map.get("doc_id"), Some(&Value::String("invoice.pdf".into())));
    }

    #[test]
    fn extension_token_extracted_from_noise() {
        let map = coerce_single(
            "please read invoice.pdf for me",
            "doc_id",
            &doc_aliases(),
            &["pdf".to_string()],
        );
        assert_eq!(map.get("doc_id"), Some(&Value::String("invoice.pdf".into())));
    }

    #[test]
    fn broken_json_falls_through_to_string_rules() {
        let map = coerce_single(
            "{doc_id: invoice.pdf",
            "doc_id",
            &doc_aliases(),
            &["pdf".to_string()],
        );
        assert_eq!(map.get("doc_id"), Some(&Value::String("invoice.pdf".into())));
    }

    #[test]
    fn fenced_json_for_open_tools_is_salvaged() {
        let map = open_mapping("```json\n{\"query\": \"tax\", \"limit\": 2}\n```", "search");
        assert_eq!(map.get("query"), Some(&Value::String("tax".into())));
        assert_eq!(map.get("limit"), Some(&Value::Number(2.into())));
    }

    #[test]
    fn json_with_surrounding_junk_is_salvaged() {
        let map = coerce_single(
            "```json\n{\"doc_id\": \"invoice.pdf\"}\n```",
            "doc_id",
            &doc_aliases(),
            &[],
        );
        assert_eq!(map.get("doc_id"), Some(&Value::String("invoice.pdf".into())));
    }

    #[test]
    fn aliased_mapping_entry_is_rekeyed() {
        let mut raw = Map::new();
        raw.insert("filename".to_string(), Value::String("a.pdf".into()));
        let map = rekey_single(&raw, "doc_id", &doc_aliases());
        assert_eq!(map.get("doc_id"), Some(&Value::String("a.pdf".into())));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn mapping_with_expected_key_passes_through() {
        let mut raw = Map::new();
        raw.insert("doc_id".to_string(), Value::String("a.pdf".into()));
        raw.insert("extra".to_string(), Value::Bool(true));
        assert_eq!(rekey_single(&raw, "doc_id", &doc_aliases()), raw);
    }
}
