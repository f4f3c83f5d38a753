use std::fmt;

/// Wraps a value that may need to be hidden from logs/history.
///
/// Scoped secrets are modeled as a parallel redaction mask carried beside
/// the value, not as a tagged variant mixed into the value channel itself:
/// the redaction question gets asked at log time, not at read time.
#[derive(Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Redacted<T> {
    value: T,
    pub secret: bool,
}

impl<T> Redacted<T> {
    pub fn new(value: T, secret: bool) -> Self {
        Self { value, secret }
    }

    pub fn plain(value: T) -> Self {
        Self::new(value, false)
    }

    pub fn get(&self) -> &T {
        &self.value
    }

    pub fn into_inner(self) -> T {
        self.value
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Redacted<U> {
        Redacted {
            value: f(self.value),
            secret: self.secret,
        }
    }
}

impl<T: fmt::Display> fmt::Display for Redacted<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.secret {
            write!(f, "***")
        } else {
            write!(f, "{}", self.value)
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Redacted<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.secret {
            write!(f, "Redacted(***)")
        } else {
            f.debug_tuple("Redacted").field(&self.value).finish()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secret_value_is_hidden_in_display_and_debug() {
        let r = Redacted::new("xyz".to_owned(), true);
        assert_eq!(format!("{r}"), "***");
        assert_eq!(format!("{r:?}"), "Redacted(***)");
        assert_eq!(r.get(), "xyz");
    }

    #[test]
    fn non_secret_value_passes_through() {
        let r = Redacted::plain(42);
        assert_eq!(format!("{r}"), "42");
        assert_eq!(format!("{r:?}"), "Redacted(42)");
    }
}
