use std::collections::HashMap;

/// Keys recognized by settings merging. Unknown keys are preserved but
/// ignored by consumers that don't recognize them (Configuration collaborator
/// contract, §6).
pub mod keys {
    pub const TIMEOUT: &str = "timeout";
    pub const PROXY: &str = "proxy";
    pub const FOLLOW_REDIRECTS: &str = "followredirects";
    pub const INSECURE: &str = "insecure";
    pub const HTTP_ROOT_CAS: &str = "http-root-cas";
    pub const HTTP_ROOT_MODE: &str = "http-root-mode";
    pub const HTTP_CLIENT_CERT: &str = "http-client-cert";
    pub const HTTP_CLIENT_KEY: &str = "http-client-key";
    pub const GRPC_ROOT_CAS: &str = "grpc-root-cas";
    pub const GRPC_CLIENT_CERT: &str = "grpc-client-cert";
    pub const GRPC_CLIENT_KEY: &str = "grpc-client-key";
}

/// Append or replace semantics for `http-root-mode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RootCaMode {
    Append,
    Replace,
}

/// A settings mapping, keyed by lowercase string (§3 "Scoped Settings").
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Settings(pub HashMap<String, String>);

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(&key.to_ascii_lowercase()).map(String::as_str)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into().to_ascii_lowercase(), value.into());
    }

    /// Merge `self` (narrower scope) over `wider`, keeping narrower's values.
    pub fn layered_over(&self, wider: &Settings) -> Settings {
        let mut merged = wider.0.clone();
        merged.extend(self.0.clone());
        Settings(merged)
    }
}

/// Effective value resolution across request > file > process precedence,
/// as three already-parsed `Settings` layers.
pub fn effective<'a>(request: &'a Settings, file: &'a Settings, process: &'a Settings, key: &str) -> Option<&'a str> {
    request
        .get(key)
        .or_else(|| file.get(key))
        .or_else(|| process.get(key))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn precedence_is_request_then_file_then_process() {
        let mut request = Settings::new();
        let mut file = Settings::new();
        let mut process = Settings::new();
        process.set("timeout", "30s");
        file.set("timeout", "10s");
        assert_eq!(effective(&request, &file, &process, "timeout"), Some("10s"));
        request.set("timeout", "5s");
        assert_eq!(effective(&request, &file, &process, "timeout"), Some("5s"));
        assert_eq!(effective(&request, &file, &process, "proxy"), None);
    }

    #[test]
    fn keys_are_case_normalized() {
        let mut s = Settings::new();
        s.set("Timeout", "5s");
        assert_eq!(s.get("TIMEOUT"), Some("5s"));
    }
}
