//! `$name[:args]` dynamic tokens, evaluated fresh on every expansion (spec §4.2).

use chrono::{Duration as ChronoDuration, Utc};
use rand::Rng;

/// Parses and evaluates one dynamic token body (the text between `$` and the
/// closing `}}`, e.g. `uuid`, `timestamp+1h`, `randomInt:1:100`, `env:HOME`).
/// Returns `None` if `name` isn't a recognized dynamic token so the caller
/// can fall back to treating it as a plain variable lookup.
pub fn evaluate(name: &str, arg: Option<&str>) -> Option<Result<String, String>> {
    match name {
        "uuid" => Some(Ok(uuid::Uuid::new_v4().to_string())),
        "timestamp" => Some(Ok(timestamp(arg))),
        "randomInt" => Some(random_int(arg)),
        "env" => Some(env(arg)),
        _ => None,
    }
}

fn timestamp(arg: Option<&str>) -> String {
    let now = Utc::now();
    let shifted = match arg.map(parse_signed_duration) {
        Some(Some(d)) => now + d,
        _ => now,
    };
    shifted.timestamp().to_string()
}

/// Parses `+1h`, `-30m`, `+90s` style offsets used by `$timestamp+1h`.
fn parse_signed_duration(s: &str) -> Option<ChronoDuration> {
    let s = s.trim();
    let (sign, rest) = match s.strip_prefix('-') {
        Some(r) => (-1, r),
        None => (1, s.strip_prefix('+').unwrap_or(s)),
    };
    let unit = rest.chars().last()?;
    let amount: i64 = rest[..rest.len() - unit.len_utf8()].parse().ok()?;
    let base = match unit {
        's' => ChronoDuration::seconds(amount),
        'm' => ChronoDuration::minutes(amount),
        'h' => ChronoDuration::hours(amount),
        'd' => ChronoDuration::days(amount),
        _ => return None,
    };
    Some(base * sign)
}

fn random_int(arg: Option<&str>) -> Result<String, String> {
    let (min, max) = match arg {
        None => (0i64, i64::from(u32::MAX)),
        Some(a) => {
            let mut parts = a.splitn(2, ':');
            let min = parts.next().unwrap_or("0").parse().map_err(|_| "bad min".to_string())?;
            let max = parts
                .next()
                .map(str::parse)
                .transpose()
                .map_err(|_| "bad max".to_string())?
                .unwrap_or(i64::from(u32::MAX));
            (min, max)
        }
    };
    if min > max {
        return Err(format!("min {min} > max {max}"));
    }
    Ok(rand::thread_rng().gen_range(min..=max).to_string())
}

fn env(arg: Option<&str>) -> Result<String, String> {
    let var = arg.ok_or_else(|| "missing variable name".to_string())?;
    std::env::var(var).map_err(|_| format!("{var} is not set"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uuid_token_produces_a_valid_uuid() {
        let Some(Ok(v)) = evaluate("uuid", None) else {
            panic!("expected uuid token to resolve");
        };
        assert!(uuid::Uuid::parse_str(&v).is_ok());
    }

    #[test]
    fn timestamp_with_offset_shifts_forward() {
        let Some(Ok(base)) = evaluate("timestamp", None) else {
            panic!("expected base timestamp");
        };
        let Some(Ok(shifted)) = evaluate("timestamp", Some("+1h")) else {
            panic!("expected shifted timestamp");
        };
        let base: i64 = base.parse().unwrap();
        let shifted: i64 = shifted.parse().unwrap();
        assert!(shifted - base >= 3599);
    }

    #[test]
    fn random_int_respects_bounds() {
        let Some(Ok(v)) = evaluate("randomInt", Some("5:5")) else {
            panic!("expected randomInt token to resolve");
        };
        assert_eq!(v, "5");
    }

    #[test]
    fn random_int_rejects_inverted_bounds() {
        assert!(matches!(evaluate("randomInt", Some("9:1")), Some(Err(_))));
    }

    #[test]
    fn unknown_token_name_is_not_dynamic() {
        assert!(evaluate("base_url", None).is_none());
    }
}
