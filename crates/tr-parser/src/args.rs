use std::collections::HashMap;
use std::time::Duration;

use crate::regexes::KV_ARG_RE;

/// Parses `key=value key2="quoted value"` style directive arguments into an
/// ordered map (last-write-wins), plus any leading bareword tokens (values
/// with no `=`) collected separately, e.g. `@tag smoke slow` or
/// `@step using=login name=auth`.
pub fn parse_kv_args(raw: &str) -> (HashMap<String, String>, Vec<String>) {
    let mut kv = HashMap::new();
    let mut bare = Vec::new();
    let mut consumed = vec![false; raw.len()];
    for cap in KV_ARG_RE.captures_iter(raw) {
        let m = cap.get(0).unwrap();
        for i in m.start()..m.end() {
            consumed[i] = true;
        }
        let key = cap[1].to_owned();
        let value = cap.get(3).map(|g| g.as_str()).unwrap_or(&cap[2]).to_owned();
        kv.insert(key, value);
    }
    // Any whitespace-delimited token not part of a matched key=value pair is
    // a bareword (e.g. tag names).
    let mut token = String::new();
    for (i, ch) in raw.char_indices() {
        if consumed.get(i).copied().unwrap_or(false) {
            if !token.is_empty() {
                bare.push(std::mem::take(&mut token));
            }
            continue;
        }
        if ch.is_whitespace() {
            if !token.is_empty() {
                bare.push(std::mem::take(&mut token));
            }
        } else {
            token.push(ch);
        }
    }
    if !token.is_empty() {
        bare.push(token);
    }
    (kv, bare)
}

/// Parses a human duration like `500ms`, `2s`, `1m30s` into a `Duration`.
/// Bare integers are interpreted as milliseconds.
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(ms) = s.parse::<u64>() {
        return Some(Duration::from_millis(ms));
    }
    let mut total = Duration::ZERO;
    let mut num = String::new();
    let mut chars = s.chars().peekable();
    let mut matched_any = false;
    while let Some(c) = chars.next() {
        if c.is_ascii_digit() || c == '.' {
            num.push(c);
            continue;
        }
        let mut unit = String::new();
        unit.push(c);
        while let Some(&next) = chars.peek() {
            if next.is_ascii_alphabetic() {
                unit.push(next);
                chars.next();
            } else {
                break;
            }
        }
        let value: f64 = num.parse().ok()?;
        num.clear();
        let unit_dur = match unit.as_str() {
            "ms" => Duration::from_secs_f64(value / 1000.0),
            "s" => Duration::from_secs_f64(value),
            "m" => Duration::from_secs_f64(value * 60.0),
            "h" => Duration::from_secs_f64(value * 3600.0),
            _ => return None,
        };
        total += unit_dur;
        matched_any = true;
    }
    if matched_any { Some(total) } else { None }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kv_parsing_separates_keyed_and_bare_tokens() {
        let (kv, bare) = parse_kv_args(r#"using=login name="user login" on-failure=stop"#);
        assert_eq!(kv.get("using").unwrap(), "login");
        assert_eq!(kv.get("name").unwrap(), "user login");
        assert_eq!(kv.get("on-failure").unwrap(), "stop");
        assert!(bare.is_empty());
    }

    #[test]
    fn bare_tokens_survive_when_no_equals_present() {
        let (kv, bare) = parse_kv_args("smoke slow");
        assert!(kv.is_empty());
        assert_eq!(bare, vec!["smoke", "slow"]);
    }

    #[test]
    fn duration_parses_units_and_bare_ms() {
        assert_eq!(parse_duration("500"), Some(Duration::from_millis(500)));
        assert_eq!(parse_duration("2s"), Some(Duration::from_secs(2)));
        assert_eq!(parse_duration("1m30s"), Some(Duration::from_secs(90)));
        assert_eq!(parse_duration("10ms"), Some(Duration::from_millis(10)));
        assert_eq!(parse_duration("bogus"), None);
    }
}
