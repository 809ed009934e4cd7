use fairfight_protocol::WinSplit;
use regex::Regex;

/// Recover the per-party win percentages from free-form verdict text.
///
/// Looks for `name_a … N% … name_b … M%` first, then the reversed order, so
/// values stay bound to names rather than positions. Names match literally
/// and case-insensitively. Returns `None` when no pair tied to both names is
/// found. Decimal values are truncated. The values are not checked to sum to
/// 100.
pub fn extract_percentages(verdict_text: &str, name_a: &str, name_b: &str) -> Option<WinSplit> {
    let name_a = name_a.trim();
    let name_b = name_b.trim();
    if name_a.is_empty() || name_b.is_empty() {
        return None;
    }

    if let Some((a, b)) = capture_pair(verdict_text, name_a, name_b) {
        return Some(WinSplit {
            party_a: a,
            party_b: b,
        });
    }
    capture_pair(verdict_text, name_b, name_a).map(|(b, a)| WinSplit {
        party_a: a,
        party_b: b,
    })
}

/// Integer part captured, fractional part dropped so `62.5%` reads as 62.
const PERCENT: &str = r"\b(\d{1,3})(?:[.,]\d+)?\s*%";

fn capture_pair(text: &str, first: &str, second: &str) -> Option<(u32, u32)> {
    let pattern = format!(
        "(?is){first}.*?{PERCENT}.*?{second}.*?{PERCENT}",
        first = name_pattern(first),
        second = name_pattern(second),
    );
    let regex = match Regex::new(&pattern) {
        Ok(regex) => regex,
        Err(err) => {
            log::debug!("Percentage pattern rejected: {err}");
            return None;
        }
    };
    let captures = regex.captures(text)?;
    let first_pct = captures.get(1)?.as_str().parse().ok()?;
    let second_pct = captures.get(2)?.as_str().parse().ok()?;
    Some((first_pct, second_pct))
}

/// Escaped name, with word boundaries only on sides that are word characters.
fn name_pattern(name: &str) -> String {
    let is_word = |c: char| c.is_alphanumeric() || c == '_';
    let mut pattern = String::new();
    if name.chars().next().is_some_and(is_word) {
        pattern.push_str(r"\b");
    }
    pattern.push_str(&regex::escape(name));
    if name.chars().last().is_some_and(is_word) {
        pattern.push_str(r"\b");
    }
    pattern
}
