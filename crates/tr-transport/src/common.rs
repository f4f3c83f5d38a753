use crate::error::TransportError;

/// A fully-resolved request ready to hand to a transport: no `{{...}}`
/// placeholders remain, everything here is what goes on the wire.
#[derive(Debug, Clone, Default)]
pub struct ExecRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
    pub timeout: Option<std::time::Duration>,
}

/// Rejects header names/values that can't be sent safely: empty names,
/// non-token characters in the name, or CR/LF in the value (which would
/// otherwise let a resolved template value smuggle a second header in).
pub fn validate_headers(headers: &[(String, String)]) -> Result<(), TransportError> {
    for (name, value) in headers {
        if name.is_empty() || !name.bytes().all(is_token_byte) {
            return Err(TransportError::InvalidHeader {
                name: name.clone(),
                reason: "header name must be a non-empty HTTP token".to_string(),
            });
        }
        if value.bytes().any(|b| b == b'\r' || b == b'\n') {
            return Err(TransportError::InvalidHeader {
                name: name.clone(),
                reason: "header value must not contain CR or LF".to_string(),
            });
        }
    }
    Ok(())
}

fn is_token_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_ordinary_headers() {
        let headers = vec![("Content-Type".to_string(), "application/json".to_string())];
        assert!(validate_headers(&headers).is_ok());
    }

    #[test]
    fn rejects_header_value_with_embedded_crlf() {
        let headers = vec![("X-Evil".to_string(), "a\r\nX-Injected: 1".to_string())];
        assert!(validate_headers(&headers).is_err());
    }

    #[test]
    fn rejects_header_name_with_space() {
        let headers = vec![("X Bad".to_string(), "v".to_string())];
        assert!(validate_headers(&headers).is_err());
    }
}
