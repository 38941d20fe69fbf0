//! Settings consumed by the cache and its HTTP fetchers.
//!
//! [`AuthTokenSettings`] can be deserialized from any serde format or assembled with
//! [`AuthTokenSettingsBuilder`]. Either way, call [`AuthTokenSettings::validate`] (the builder does
//! so automatically) before handing the settings to a fetcher.

// self
use crate::{_prelude::*, token::TokenSecret};

const DEFAULT_TOKEN_TTL_SECONDS: u64 = 10;
const DEFAULT_CONNECT_TIMEOUT_SECONDS: u64 = 5;
const DEFAULT_REQUEST_TIMEOUT_SECONDS: u64 = 10;

/// Errors raised while validating [`AuthTokenSettings`].
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum SettingsError {
	/// Auth endpoint must be reachable over HTTP(S).
	#[error("The auth endpoint must use http or https: {url}.")]
	UnsupportedScheme {
		/// Endpoint URL that failed validation.
		url: String,
	},
	/// A freshly fetched token must stay valid for at least one second.
	#[error("The token TTL must be positive.")]
	ZeroTtl,
	/// Timeouts bound every fetch and must be positive.
	#[error("The {which} timeout must be positive.")]
	ZeroTimeout {
		/// Which timeout failed validation.
		which: &'static str,
	},
	/// Credential payload field is blank.
	#[error("The `{field}` setting is required.")]
	MissingField {
		/// Name of the blank field.
		field: &'static str,
	},
}

/// Endpoint, credential payload, and timing settings for token refreshes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthTokenSettings {
	/// Token-issuing endpoint.
	pub auth_url: Url,
	/// Redirect URL forwarded in the credential payload.
	pub redirect_url: String,
	/// Account name forwarded in the credential payload.
	pub user_name: String,
	/// Account password; redacted from `Debug` output.
	pub password: TokenSecret,
	/// Application name forwarded in the credential payload.
	pub app_name: String,
	/// Secret name forwarded in the credential payload.
	pub secret_name: String,
	/// Vault configuration path forwarded in the credential payload.
	pub vault_config_path: String,
	/// Validity window granted to each freshly fetched token.
	#[serde(default = "default_token_ttl_seconds")]
	pub token_ttl_seconds: u64,
	/// Connection establishment timeout for the token endpoint.
	#[serde(default = "default_connect_timeout_seconds")]
	pub connect_timeout_seconds: u64,
	/// Whole-request timeout for the token endpoint.
	#[serde(default = "default_request_timeout_seconds")]
	pub request_timeout_seconds: u64,
}
impl AuthTokenSettings {
	/// Creates a new builder targeting the provided endpoint.
	pub fn builder(auth_url: Url) -> AuthTokenSettingsBuilder {
		AuthTokenSettingsBuilder::new(auth_url)
	}

	/// Validates invariants for the settings.
	pub fn validate(&self) -> Result<(), SettingsError> {
		if !matches!(self.auth_url.scheme(), "http" | "https") {
			return Err(SettingsError::UnsupportedScheme { url: self.auth_url.to_string() });
		}
		if self.token_ttl_seconds == 0 {
			return Err(SettingsError::ZeroTtl);
		}
		if self.connect_timeout_seconds == 0 {
			return Err(SettingsError::ZeroTimeout { which: "connect" });
		}
		if self.request_timeout_seconds == 0 {
			return Err(SettingsError::ZeroTimeout { which: "request" });
		}

		[
			("redirect_url", self.redirect_url.as_str()),
			("user_name", self.user_name.as_str()),
			("password", self.password.expose()),
			("app_name", self.app_name.as_str()),
			("secret_name", self.secret_name.as_str()),
			("vault_config_path", self.vault_config_path.as_str()),
		]
		.into_iter()
		.try_for_each(|(field, value)| {
			if value.trim().is_empty() {
				Err(SettingsError::MissingField { field })
			} else {
				Ok(())
			}
		})
	}

	/// Returns the token TTL as a clock duration.
	pub fn token_ttl(&self) -> Duration {
		Duration::seconds(i64::try_from(self.token_ttl_seconds).unwrap_or(i64::MAX))
	}

	/// Returns the connect timeout for HTTP clients.
	pub fn connect_timeout(&self) -> std::time::Duration {
		std::time::Duration::from_secs(self.connect_timeout_seconds)
	}

	/// Returns the whole-request timeout for HTTP clients.
	pub fn request_timeout(&self) -> std::time::Duration {
		std::time::Duration::from_secs(self.request_timeout_seconds)
	}
}

/// Builder for [`AuthTokenSettings`] values.
#[derive(Debug)]
pub struct AuthTokenSettingsBuilder {
	settings: AuthTokenSettings,
}
impl AuthTokenSettingsBuilder {
	/// Creates a new builder seeded with the endpoint and default timings.
	pub fn new(auth_url: Url) -> Self {
		Self {
			settings: AuthTokenSettings {
				auth_url,
				redirect_url: String::new(),
				user_name: String::new(),
				password: TokenSecret::new(String::new()),
				app_name: String::new(),
				secret_name: String::new(),
				vault_config_path: String::new(),
				token_ttl_seconds: DEFAULT_TOKEN_TTL_SECONDS,
				connect_timeout_seconds: DEFAULT_CONNECT_TIMEOUT_SECONDS,
				request_timeout_seconds: DEFAULT_REQUEST_TIMEOUT_SECONDS,
			},
		}
	}

	/// Sets the account name and password.
	pub fn credentials(
		mut self,
		user_name: impl Into<String>,
		password: impl Into<String>,
	) -> Self {
		self.settings.user_name = user_name.into();
		self.settings.password = TokenSecret::new(password);

		self
	}

	/// Sets the application name.
	pub fn app_name(mut self, app_name: impl Into<String>) -> Self {
		self.settings.app_name = app_name.into();

		self
	}

	/// Sets the secret name.
	pub fn secret_name(mut self, secret_name: impl Into<String>) -> Self {
		self.settings.secret_name = secret_name.into();

		self
	}

	/// Sets the redirect URL.
	pub fn redirect_url(mut self, redirect_url: impl Into<String>) -> Self {
		self.settings.redirect_url = redirect_url.into();

		self
	}

	/// Sets the vault configuration path.
	pub fn vault_config_path(mut self, path: impl Into<String>) -> Self {
		self.settings.vault_config_path = path.into();

		self
	}

	/// Overrides the token TTL (defaults to 10 seconds).
	pub fn token_ttl_seconds(mut self, seconds: u64) -> Self {
		self.settings.token_ttl_seconds = seconds;

		self
	}

	/// Overrides the connect and request timeouts (default to 5 and 10 seconds).
	pub fn timeouts(mut self, connect_seconds: u64, request_seconds: u64) -> Self {
		self.settings.connect_timeout_seconds = connect_seconds;
		self.settings.request_timeout_seconds = request_seconds;

		self
	}

	/// Consumes the builder and validates the resulting settings.
	pub fn build(self) -> Result<AuthTokenSettings, SettingsError> {
		self.settings.validate()?;

		Ok(self.settings)
	}
}

fn default_token_ttl_seconds() -> u64 {
	DEFAULT_TOKEN_TTL_SECONDS
}

fn default_connect_timeout_seconds() -> u64 {
	DEFAULT_CONNECT_TIMEOUT_SECONDS
}

fn default_request_timeout_seconds() -> u64 {
	DEFAULT_REQUEST_TIMEOUT_SECONDS
}
