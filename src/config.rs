//! Provider configuration and credential resolution.
//!
//! Credentials come from the provider configuration or, when an attribute is
//! not set there, from the process environment:
//!
//! | attribute          | environment variable           |
//! |--------------------|--------------------------------|
//! | `service_token_id` | `PLANETSCALE_SERVICE_TOKEN_ID` |
//! | `service_token`    | `PLANETSCALE_SERVICE_TOKEN`    |
//! | `api_url`          | `PLANETSCALE_API_URL`          |
//!
//! [`resolve`] never produces half-initialized credentials: it either returns
//! a complete [`ResolvedConfig`] or every problem it found as attribute-scoped
//! diagnostics.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use url::Url;

use crate::error::ProviderError;
use crate::schema::{Attribute, Diagnostic, Schema};
use crate::types::is_unknown;

/// Environment variable holding the service token id.
pub const ENV_SERVICE_TOKEN_ID: &str = "PLANETSCALE_SERVICE_TOKEN_ID";

/// Environment variable holding the service token secret.
pub const ENV_SERVICE_TOKEN: &str = "PLANETSCALE_SERVICE_TOKEN";

/// Environment variable overriding the API base URL.
pub const ENV_API_URL: &str = "PLANETSCALE_API_URL";

/// Base URL used when neither configuration nor environment set one.
pub const DEFAULT_API_URL: &str = "https://api.planetscale.com/";

/// A configuration value as sent by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigValue<T> {
    /// Absent or explicitly `null`.
    Null,
    /// Depends on a value that is not known until apply.
    Unknown,
    /// A concrete value.
    Known(T),
}

impl<T> ConfigValue<T> {
    /// Whether the value is unknown.
    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown)
    }

    /// Whether the value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// The known value, if any.
    pub fn known(&self) -> Option<&T> {
        match self {
            Self::Known(value) => Some(value),
            _ => None,
        }
    }
}

impl<T> Default for ConfigValue<T> {
    fn default() -> Self {
        Self::Null
    }
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for ConfigValue<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        if value.is_null() {
            Ok(Self::Null)
        } else if is_unknown(&value) {
            Ok(Self::Unknown)
        } else {
            serde_json::from_value(value)
                .map(Self::Known)
                .map_err(D::Error::custom)
        }
    }
}

/// The provider configuration block.
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub service_token_id: ConfigValue<String>,
    pub service_token: ConfigValue<String>,
    pub api_url: ConfigValue<String>,
}

impl ProviderConfig {
    /// Decode the configuration sent with `Configure`. A null config is empty.
    pub fn from_value(value: &Value) -> Result<Self, ProviderError> {
        if value.is_null() {
            return Ok(Self::default());
        }
        Ok(Self::deserialize(value)?)
    }

    /// Schema of the provider configuration block.
    pub fn schema() -> Schema {
        Schema::v0()
            .with_description("Manage PlanetScale databases, branches and deploy requests.")
            .with_attribute(
                "service_token_id",
                Attribute::optional_string().with_description(format!(
                    "Service token id. May also be set with {ENV_SERVICE_TOKEN_ID}."
                )),
            )
            .with_attribute(
                "service_token",
                Attribute::optional_string()
                    .sensitive()
                    .with_description(format!(
                        "Service token secret. May also be set with {ENV_SERVICE_TOKEN}."
                    )),
            )
            .with_attribute(
                "api_url",
                Attribute::optional_string().with_description(format!(
                    "Base URL of the PlanetScale API. May also be set with {ENV_API_URL}. \
                     Defaults to {DEFAULT_API_URL}."
                )),
            )
    }
}

fn redacted<T>(value: &ConfigValue<T>) -> &'static str {
    match value {
        ConfigValue::Null => "Null",
        ConfigValue::Unknown => "Unknown",
        ConfigValue::Known(_) => "Known(<redacted>)",
    }
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("service_token_id", &self.service_token_id)
            .field("service_token", &redacted(&self.service_token))
            .field("api_url", &self.api_url)
            .finish()
    }
}

/// Source of environment variables.
pub trait EnvSource: Send + Sync {
    /// Look up a variable; `None` when it is unset.
    fn var(&self, key: &str) -> Option<String>;
}

/// The process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl EnvSource for HashMap<String, String> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

impl EnvSource for BTreeMap<String, String> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

/// A service token pair.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub token_id: String,
    pub token: String,
}

impl Credentials {
    pub fn new(token_id: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            token_id: token_id.into(),
            token: token.into(),
        }
    }

    /// Value of the `Authorization` header.
    pub fn authorization(&self) -> String {
        format!("{}:{}", self.token_id, self.token)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("token_id", &self.token_id)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Everything needed to build an API client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    pub credentials: Credentials,
    pub api_url: Url,
}

fn unknown_error(attribute: &str, summary: &str, what: &str, env: &str) -> Diagnostic {
    Diagnostic::attribute_error(
        attribute,
        summary,
        format!(
            "The PlanetScale API client cannot be created because the {what} depends on a value \
             that is not known yet. Apply the source of the value first, set the value \
             statically in the provider configuration, or use the {env} environment variable."
        ),
    )
}

fn missing_error(attribute: &str, summary: &str, what: &str, env: &str) -> Diagnostic {
    Diagnostic::attribute_error(
        attribute,
        summary,
        format!(
            "The PlanetScale API client cannot be created because the {what} is missing or \
             empty. Set it in the provider configuration or use the {env} environment variable. \
             If either is already set, make sure the value is not empty."
        ),
    )
}

fn merge(config: &ConfigValue<String>, env: &dyn EnvSource, key: &str) -> String {
    let from_env = env.var(key).unwrap_or_default();
    match config {
        ConfigValue::Known(value) => value.clone(),
        _ => from_env,
    }
}

/// Resolve credentials and the API URL from configuration and environment.
///
/// Unknown values are reported first, one diagnostic per unknown attribute,
/// and stop resolution. Otherwise each attribute defaults to its environment
/// variable and a known configuration value takes precedence. Empty tokens
/// are reported per attribute and accumulate.
pub fn resolve(config: &ProviderConfig, env: &dyn EnvSource) -> Result<ResolvedConfig, Vec<Diagnostic>> {
    let mut diagnostics = Vec::new();

    if config.service_token_id.is_unknown() {
        diagnostics.push(unknown_error(
            "service_token_id",
            "Unknown ServiceTokenID",
            "service token id",
            ENV_SERVICE_TOKEN_ID,
        ));
    }
    if config.service_token.is_unknown() {
        diagnostics.push(unknown_error(
            "service_token",
            "Unknown ServiceToken",
            "service token",
            ENV_SERVICE_TOKEN,
        ));
    }
    if config.api_url.is_unknown() {
        diagnostics.push(unknown_error("api_url", "Unknown API URL", "API URL", ENV_API_URL));
    }
    if !diagnostics.is_empty() {
        return Err(diagnostics);
    }

    let token_id = merge(&config.service_token_id, env, ENV_SERVICE_TOKEN_ID);
    let token = merge(&config.service_token, env, ENV_SERVICE_TOKEN);
    // An empty `api_url` means "not set" and keeps the environment override.
    let api_url = match config.api_url.known() {
        Some(url) if !url.is_empty() => url.clone(),
        _ => env.var(ENV_API_URL).unwrap_or_default(),
    };

    if token_id.is_empty() {
        diagnostics.push(missing_error(
            "service_token_id",
            "Missing ServiceTokenID",
            "service token id",
            ENV_SERVICE_TOKEN_ID,
        ));
    }
    if token.is_empty() {
        diagnostics.push(missing_error(
            "service_token",
            "Missing ServiceToken",
            "service token",
            ENV_SERVICE_TOKEN,
        ));
    }

    let api_url = if api_url.is_empty() {
        DEFAULT_API_URL.to_string()
    } else {
        api_url
    };
    let parsed_url = match Url::parse(&api_url) {
        Ok(url) if url.cannot_be_a_base() => {
            diagnostics.push(Diagnostic::attribute_error(
                "api_url",
                "Invalid API URL",
                format!("\"{api_url}\" cannot be used as a base URL"),
            ));
            None
        }
        Ok(url) => Some(url),
        Err(err) => {
            diagnostics.push(Diagnostic::attribute_error(
                "api_url",
                "Invalid API URL",
                format!("\"{api_url}\" is not a valid URL: {err}"),
            ));
            None
        }
    };

    match parsed_url {
        Some(api_url) if diagnostics.is_empty() => Ok(ResolvedConfig {
            credentials: Credentials { token_id, token },
            api_url,
        }),
        _ => Err(diagnostics),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn config(value: Value) -> ProviderConfig {
        ProviderConfig::from_value(&value).unwrap()
    }

    fn attributes(diagnostics: &[Diagnostic]) -> Vec<&str> {
        diagnostics
            .iter()
            .filter_map(|d| d.attribute.as_deref())
            .collect()
    }

    #[test]
    fn test_config_value_states() {
        let cfg = config(json!({
            "service_token_id": "abc",
            "service_token": {"$unknown": true},
            "api_url": null
        }));

        assert_eq!(cfg.service_token_id, ConfigValue::Known("abc".to_string()));
        assert!(cfg.service_token.is_unknown());
        assert!(cfg.api_url.is_null());
        assert_eq!(cfg.service_token_id.known().map(String::as_str), Some("abc"));
    }

    #[test]
    fn test_null_config_is_empty() {
        let cfg = ProviderConfig::from_value(&Value::Null).unwrap();
        assert!(cfg.service_token_id.is_null());
        assert!(cfg.service_token.is_null());
    }

    #[test]
    fn test_wrong_type_is_serialization_error() {
        let err = ProviderConfig::from_value(&json!({"service_token_id": 5})).unwrap_err();
        assert!(matches!(err, ProviderError::Serialization(_)));
    }

    #[test]
    fn test_config_takes_precedence_over_env() {
        let resolved = resolve(
            &config(json!({"service_token_id": "from-config", "service_token": "secret-config"})),
            &env(&[
                (ENV_SERVICE_TOKEN_ID, "from-env"),
                (ENV_SERVICE_TOKEN, "secret-env"),
            ]),
        )
        .unwrap();

        assert_eq!(resolved.credentials, Credentials::new("from-config", "secret-config"));
        assert_eq!(resolved.api_url.as_str(), DEFAULT_API_URL);
    }

    #[test]
    fn test_mixed_config_and_env() {
        let resolved = resolve(
            &config(json!({"service_token_id": "abc"})),
            &env(&[(ENV_SERVICE_TOKEN, "secret")]),
        )
        .unwrap();

        assert_eq!(resolved.credentials, Credentials::new("abc", "secret"));
    }

    #[test]
    fn test_env_only() {
        let resolved = resolve(
            &ProviderConfig::default(),
            &env(&[
                (ENV_SERVICE_TOKEN_ID, "id"),
                (ENV_SERVICE_TOKEN, "secret"),
                (ENV_API_URL, "http://localhost:8080/"),
            ]),
        )
        .unwrap();

        assert_eq!(resolved.credentials.token_id, "id");
        assert_eq!(resolved.api_url.as_str(), "http://localhost:8080/");
    }

    #[test]
    fn test_missing_token_id() {
        let diagnostics = resolve(
            &config(json!({"service_token": "secret"})),
            &env(&[]),
        )
        .unwrap_err();

        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].summary, "Missing ServiceTokenID");
        assert_eq!(attributes(&diagnostics), vec!["service_token_id"]);
        assert!(diagnostics[0]
            .detail
            .as_deref()
            .unwrap()
            .contains(ENV_SERVICE_TOKEN_ID));
    }

    #[test]
    fn test_both_missing_accumulate() {
        let diagnostics = resolve(&ProviderConfig::default(), &env(&[])).unwrap_err();

        assert_eq!(attributes(&diagnostics), vec!["service_token_id", "service_token"]);
        assert_eq!(diagnostics[1].summary, "Missing ServiceToken");
    }

    #[test]
    fn test_empty_config_value_does_not_fall_back() {
        let diagnostics = resolve(
            &config(json!({"service_token_id": "", "service_token": "secret"})),
            &env(&[(ENV_SERVICE_TOKEN_ID, "from-env")]),
        )
        .unwrap_err();

        assert_eq!(attributes(&diagnostics), vec!["service_token_id"]);
    }

    #[test]
    fn test_empty_api_url_falls_back_to_env() {
        let resolved = resolve(
            &config(json!({"service_token_id": "id", "service_token": "secret", "api_url": ""})),
            &env(&[(ENV_API_URL, "http://localhost:8080/")]),
        )
        .unwrap();
        assert_eq!(resolved.api_url.as_str(), "http://localhost:8080/");

        let resolved = resolve(
            &config(json!({"service_token_id": "id", "service_token": "secret", "api_url": ""})),
            &env(&[]),
        )
        .unwrap();
        assert_eq!(resolved.api_url.as_str(), DEFAULT_API_URL);
    }

    #[test]
    fn test_unknown_values_reported_per_field() {
        let diagnostics = resolve(
            &config(json!({
                "service_token_id": {"$unknown": true},
                "service_token": {"$unknown": true}
            })),
            &env(&[
                (ENV_SERVICE_TOKEN_ID, "id"),
                (ENV_SERVICE_TOKEN, "secret"),
            ]),
        )
        .unwrap_err();

        assert_eq!(diagnostics.len(), 2);
        assert_eq!(diagnostics[0].summary, "Unknown ServiceTokenID");
        assert_eq!(diagnostics[1].summary, "Unknown ServiceToken");
        assert_eq!(attributes(&diagnostics), vec!["service_token_id", "service_token"]);
    }

    #[test]
    fn test_unknown_stops_before_missing_checks() {
        let diagnostics = resolve(
            &config(json!({"service_token": {"$unknown": true}})),
            &env(&[]),
        )
        .unwrap_err();

        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].summary, "Unknown ServiceToken");
    }

    #[test]
    fn test_invalid_api_url() {
        let diagnostics = resolve(
            &config(json!({
                "service_token_id": "id",
                "service_token": "secret",
                "api_url": "not a url"
            })),
            &env(&[]),
        )
        .unwrap_err();

        assert_eq!(attributes(&diagnostics), vec!["api_url"]);
        assert_eq!(diagnostics[0].summary, "Invalid API URL");
    }

    #[test]
    fn test_precedence_matrix() {
        let cases: &[(Option<&str>, Option<&str>, Option<&str>)] = &[
            (Some("cfg"), Some("env"), Some("cfg")),
            (Some("cfg"), None, Some("cfg")),
            (None, Some("env"), Some("env")),
            (None, None, None),
            (Some(""), Some("env"), None),
            (None, Some(""), None),
        ];

        for (from_config, from_env, expected) in cases {
            let mut cfg = ProviderConfig {
                service_token: ConfigValue::Known("secret".to_string()),
                ..Default::default()
            };
            if let Some(value) = from_config {
                cfg.service_token_id = ConfigValue::Known(value.to_string());
            }
            let mut vars = HashMap::new();
            if let Some(value) = from_env {
                vars.insert(ENV_SERVICE_TOKEN_ID.to_string(), value.to_string());
            }

            let result = resolve(&cfg, &vars);
            match expected {
                Some(id) => assert_eq!(result.unwrap().credentials.token_id, *id),
                None => assert_eq!(attributes(&result.unwrap_err()), vec!["service_token_id"]),
            }
        }
    }

    #[test]
    fn test_debug_redacts_secret() {
        let creds = Credentials::new("id", "super-secret");
        assert!(!format!("{:?}", creds).contains("super-secret"));

        let cfg = config(json!({"service_token": "super-secret"}));
        assert!(!format!("{:?}", cfg).contains("super-secret"));
    }

    #[test]
    fn test_authorization_header_value() {
        assert_eq!(Credentials::new("id", "secret").authorization(), "id:secret");
    }

    #[test]
    fn test_provider_schema_tokens_optional() {
        let schema = ProviderConfig::schema();
        assert!(schema.attribute("service_token_id").unwrap().flags.optional);
        assert!(schema.attribute("service_token").unwrap().flags.sensitive);
        assert!(schema.attribute("api_url").is_some());
    }
}
