use std::collections::HashMap;

/// `key=value` and bare-flag view over invocation tokens.
///
/// ```
/// use tarn_params::Params;
///
/// let params = Params::parse(["time=7s", "verbose", "count=1", "count=3"]);
/// assert_eq!(params.get("time", "1s"), "7s");
/// assert_eq!(params.get("count", "1"), "3");
/// assert!(params.has("verbose"));
/// assert!(params.is_true("verbose"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    tokens: Vec<String>,
    values: HashMap<String, String>,
}

const TRUTHY: &[&str] = &["1", "true", "yes", "on"];

impl Params {
    /// Parse tokens. Later occurrences of a key override earlier ones;
    /// a bare token `flag` is recorded as `flag=true`.
    pub fn parse<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tokens: Vec<String> = tokens.into_iter().map(Into::into).collect();
        let mut values = HashMap::new();
        for token in &tokens {
            match token.split_once('=') {
                Some((key, value)) if !key.is_empty() => {
                    values.insert(key.to_string(), value.to_string());
                }
                Some(_) => {}
                None if !token.is_empty() => {
                    values.insert(token.clone(), "true".to_string());
                }
                None => {}
            }
        }
        Self { tokens, values }
    }

    /// Read the process parameter channel, falling back to `fallback`.
    pub fn from_env(fallback: &[String]) -> Self {
        Self::parse(crate::read_args(fallback))
    }

    /// Value for `key`, or `default` when absent.
    pub fn get<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.values.get(key).map(String::as_str).unwrap_or(default)
    }

    pub fn value(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Whether `name` appeared as a bare flag or as a key.
    pub fn has(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Whether `key` is a bare flag or set to `1`, `true`, `yes` or `on`.
    pub fn is_true(&self, key: &str) -> bool {
        self.values
            .get(key)
            .is_some_and(|v| TRUTHY.contains(&v.to_lowercase().as_str()))
    }

    /// Original tokens in invocation order.
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_last_occurrence_wins_and_order_is_kept() {
        let params = Params::parse(["count=1", "verbose", "count=5"]);
        assert_eq!(params.get("count", "0"), "5");
        assert_eq!(params.tokens(), ["count=1", "verbose", "count=5"]);
    }

    #[test]
    fn test_value_may_contain_equals() {
        let params = Params::parse(["filter=a=b"]);
        assert_eq!(params.value("filter"), Some("a=b"));
    }

    #[test]
    fn test_missing_key_uses_default() {
        let params = Params::parse(Vec::<String>::new());
        assert_eq!(params.get("time", "1s"), "1s");
        assert!(!params.has("time"));
        assert!(params.is_empty());
    }

    #[test]
    fn test_empty_key_is_ignored() {
        let params = Params::parse(["=value", ""]);
        assert!(!params.has(""));
        assert_eq!(params.tokens().len(), 2);
    }

    #[test_case("race", true ; "bare flag")]
    #[test_case("short=true", true ; "true")]
    #[test_case("short=YES", true ; "yes uppercase")]
    #[test_case("short=1", true ; "one")]
    #[test_case("short=false", false ; "false")]
    #[test_case("short=", false ; "empty value")]
    fn test_is_true(token: &str, expected: bool) {
        let params = Params::parse([token]);
        let key = token.split('=').next().unwrap_or(token);
        assert_eq!(params.is_true(key), expected);
    }
}
