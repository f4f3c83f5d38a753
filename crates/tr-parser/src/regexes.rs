use std::sync::LazyLock;

use regex::Regex;

/// `METHOD URL [HTTP-version]`
pub static REQUEST_LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(GET|POST|PUT|PATCH|DELETE|HEAD|OPTIONS|GRPC|WS|WSS|WEBSOCKET)\s+(\S+)(?:\s+(HTTP/\S+))?\s*$").unwrap()
});

/// `Name: Value` header line.
pub static HEADER_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Za-z0-9!#$%&'*+.^_`|~-]+)\s*:\s*(.*)$").unwrap());

/// The canonical variable-declaration grammar, used for both in-request and
/// file-scope variable lines (the implementation resolves spec §9's open
/// question by unifying on this single pattern — see DESIGN.md).
///
/// `@[(scope)][-secret] name [: | = | whitespace] value`
pub static VARIABLE_LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?x)
        ^@
        (?:\((?P<scope>global|file|request)\))?
        (?P<secret>-secret)?
        \s+
        (?P<name>[A-Za-z0-9_.-]+)
        \s*(?:[:=]\s*|\s+)
        (?P<value>.*)
        $",
    )
    .unwrap()
});

/// A leading `@directive_name` token, capturing the directive name and the
/// remainder of the line as raw args (possibly empty).
pub static DIRECTIVE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^@([A-Za-z][A-Za-z0-9_-]*)\s*(.*)$").unwrap());

/// `key=value` or `key="quoted value"` argument tokens inside a directive's
/// argument string.
pub static KV_ARG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"([A-Za-z0-9_.-]+)=("([^"]*)"|\S+)"#).unwrap());

/// `@capture [scope] [-secret] name = expression`
pub static CAPTURE_ARGS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?x)
        ^(?:(?P<scope>global|file|request)\s+)?
        (?P<secret>-secret\s+)?
        (?P<name>[A-Za-z0-9_.-]+)
        \s*=\s*
        (?P<expr>.*)
        $",
    )
    .unwrap()
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variable_regex_parses_plain_and_scoped_secret() {
        let c = VARIABLE_LINE_RE.captures("@token = xyz").unwrap();
        assert_eq!(&c["name"], "token");
        assert_eq!(&c["value"], "xyz");
        assert!(c.name("scope").is_none());
        assert!(c.name("secret").is_none());

        let c = VARIABLE_LINE_RE
            .captures("@(file)-secret api_key: abc123")
            .unwrap();
        assert_eq!(&c["scope"], "file");
        assert!(c.name("secret").is_some());
        assert_eq!(&c["name"], "api_key");
        assert_eq!(&c["value"], "abc123");
    }

    #[test]
    fn variable_regex_accepts_bare_secret_suffix_without_scope() {
        let c = VARIABLE_LINE_RE.captures("@-secret token xyz").unwrap();
        assert!(c.name("scope").is_none());
        assert!(c.name("secret").is_some());
        assert_eq!(&c["name"], "token");
        assert_eq!(&c["value"], "xyz");
    }

    #[test]
    fn request_line_regex_matches_all_methods() {
        for m in ["GET", "POST", "GRPC", "WS", "WEBSOCKET"] {
            let line = format!("{m} https://example.com/x");
            assert!(REQUEST_LINE_RE.is_match(&line), "{m}");
        }
        assert!(!REQUEST_LINE_RE.is_match("NOTAMETHOD https://x"));
    }
}
