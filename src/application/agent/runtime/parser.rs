use super::{AgentDirective, AgentError, ToolRuntime, Value};

const FINAL_MARKER: &str = "final answer:";
const ACTION_MARKER: &str = "action:";
const INPUT_MARKER: &str = "action input:";

// Markers that terminate a multi-line action input.
const STOP_MARKERS: [&str; 3] = ["observation:", "thought:", "action:"];

impl ToolRuntime {
    /// Interprets one raw model turn as exactly one directive. A Final Answer
    /// marker beats any stale Action text in the same turn.
    pub(crate) fn interpret(&self, content: &str) -> Result<AgentDirective, AgentError> {
        if let Some(after) = rfind_marker(content, FINAL_MARKER) {
            let answer = content[after..].trim().to_string();
            return Ok(AgentDirective::Final { answer });
        }

        let Some((tool, raw_input)) = scan_action(content) else {
            return Err(AgentError::UnrecognizedFormat {
                raw: content.trim().to_string(),
            });
        };

        let input = self.normalize_input(&tool, &Value::String(raw_input))?;
        Ok(AgentDirective::CallTool { tool, input })
    }
}

// Extracts the first `Action:` / `Action Input:` pair. Only a marker that
// opens its line counts; prose such as "the transaction: 12" must not start
// an action block, and a marker with nothing on its line is skipped.
fn scan_action(content: &str) -> Option<(String, String)> {
    let mut search_from = 0;
    while let Some(found) = find_marker_start(&content[search_from..], ACTION_MARKER) {
        let marker_at = search_from + found;
        search_from = marker_at + ACTION_MARKER.len();
        if !at_line_start(content, marker_at) {
            continue;
        }

        let rest = &content[search_from..];
        let Some(input_start) = find_marker_start(rest, INPUT_MARKER) else {
            continue;
        };
        let line_end = rest.find('\n').unwrap_or(rest.len());
        let tool = clean_tool_name(&rest[..line_end.min(input_start)]);
        if tool.is_empty() {
            continue;
        }

        let raw = &rest[input_start + INPUT_MARKER.len()..];
        let end = STOP_MARKERS
            .iter()
            .filter_map(|marker| find_marker_start(raw, marker))
            .min()
            .unwrap_or(raw.len());
        return Some((tool, raw[..end].trim().to_string()));
    }
    None
}

fn at_line_start(text: &str, at: usize) -> bool {
    let prefix = &text[..at];
    let line = match prefix.rfind('\n') {
        Some(newline) => &prefix[newline + 1..],
        None => prefix,
    };
    line.chars().all(char::is_whitespace)
}

// Models wrap tool names in the brackets or backticks shown in the format
// instructions.
fn clean_tool_name(segment: &str) -> String {
    let mut name = segment.trim();
    if name.len() >= 2 && name.starts_with('[') && name.ends_with(']') {
        name = name[1..name.len() - 1].trim();
    }
    name.trim_matches('`').trim().to_string()
}

// Markers are ASCII, so a byte-level match always falls on a char boundary.
fn find_marker_start(text: &str, marker: &str) -> Option<usize> {
    let needle = marker.as_bytes();
    text.as_bytes()
        .windows(needle.len())
        .position(|window| window.eq_ignore_ascii_case(needle))
}

fn rfind_marker(text: &str, marker: &str) -> Option<usize> {
    let needle = marker.as_bytes();
    text.as_bytes()
        .windows(needle.len())
        .rposition(|window| window.eq_ignore_ascii_case(needle))
        .map(|at| at + marker.len())
}
