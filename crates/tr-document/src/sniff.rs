/// Cheap content sniffer used to disable pretty-printing for binary bodies.
///
/// Mirrors the common "null byte or too many non-printable bytes in the
/// first chunk" heuristic rather than a full MIME sniff table.
pub fn looks_binary(body: &[u8]) -> bool {
    let sample = &body[..body.len().min(512)];
    if sample.is_empty() {
        return false;
    }
    if sample.contains(&0) {
        return true;
    }
    let non_text = sample
        .iter()
        .filter(|&&b| b != b'\n' && b != b'\r' && b != b'\t' && (b < 0x20 || b == 0x7f))
        .count();
    (non_text as f64) / (sample.len() as f64) > 0.30
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_not_binary() {
        assert!(!looks_binary(b"{\"ok\":true}\n"));
    }

    #[test]
    fn null_bytes_are_binary() {
        assert!(looks_binary(&[0x50, 0x4b, 0x03, 0x04, 0, 0, 0]));
    }

    #[test]
    fn empty_body_is_not_binary() {
        assert!(!looks_binary(&[]));
    }
}
