/*!
 * Parsing of oracle output into per-line translations.
 *
 * A response is only accepted when it yields exactly one translation per
 * source line. Anything else is reported as an `AttemptOutcome` so the
 * reconciler can escalate.
 */

use once_cell::sync::Lazy;
use regex::Regex;

use crate::app_config::ResponseFormat;
use crate::errors::AttemptOutcome;

/// Markdown fence lines such as ```` ``` ```` or ```` ```text ````
static CODE_FENCE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^[ \t]*```[^\n]*$").unwrap()
});

/// Remove markdown code fences, keeping their content
pub fn strip_code_fences(text: &str) -> String {
    CODE_FENCE_REGEX.replace_all(text, "").into_owned()
}

/// Non-empty trimmed lines of a fence-stripped response
pub fn candidate_lines(text: &str) -> Vec<String> {
    strip_code_fences(text)
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Translation part of one `original,translation` line
///
/// The exact original plus comma is stripped first, which keeps originals
/// containing commas intact. Otherwise the line is split on its first comma,
/// and a line without a comma is taken whole. A line holding nothing but the
/// original yields an empty translation.
pub fn extract_translation(line: &str, source: &str) -> String {
    if let Some(rest) = line.strip_prefix(source.trim()) {
        if rest.trim().is_empty() {
            return String::new();
        }
        if let Some(translation) = rest.trim_start().strip_prefix(',') {
            return translation.trim().to_string();
        }
    }

    match line.split_once(',') {
        Some((_, translation)) => translation.trim().to_string(),
        None => line.trim().to_string(),
    }
}

/// Parse a JSON array of strings, tolerating prose around it
pub fn parse_json_array(text: &str) -> Result<Vec<String>, AttemptOutcome> {
    let stripped = strip_code_fences(text);
    let (start, end) = match (stripped.find('['), stripped.rfind(']')) {
        (Some(start), Some(end)) if start < end => (start, end),
        _ => return Err(AttemptOutcome::Unparseable("no JSON array found".to_string())),
    };

    let values: Vec<String> = serde_json::from_str(&stripped[start..=end])
        .map_err(|e| AttemptOutcome::Unparseable(e.to_string()))?;
    Ok(values.into_iter().map(|v| v.trim().to_string()).collect())
}

/// Parse a response in the given format against the source lines
///
/// Returns one translation per source line, or the outcome explaining why
/// the response was rejected.
pub fn parse_response(format: ResponseFormat, response: &str, sources: &[String]) -> Result<Vec<String>, AttemptOutcome> {
    match format {
        ResponseFormat::Pairs => {
            let lines = candidate_lines(response);
            if lines.len() != sources.len() {
                return Err(AttemptOutcome::LineCount(lines.len()));
            }
            Ok(lines
                .iter()
                .zip(sources)
                .map(|(line, source)| extract_translation(line, source))
                .collect())
        }
        ResponseFormat::JsonArray => {
            let values = parse_json_array(response)?;
            if values.len() != sources.len() {
                return Err(AttemptOutcome::LineCount(values.len()));
            }
            Ok(values)
        }
    }
}
