// BSD 3-Clause License
// Copyright (c) 2025, ENVGATE
//
//! Authentication collaborator settings

use serde::Serialize;

use crate::config::Configuration;

/// Email/password sign-in, available whatever else is configured.
pub const CREDENTIALS_PROVIDER: &str = "credentials";

#[derive(Debug, Clone, Serialize)]
pub struct AuthSettings {
    pub url: String,
    #[serde(skip)]
    pub secret: String,
    /// Enabled sign-in providers, OAuth first, credentials last
    pub providers: Vec<String>,
}

impl AuthSettings {
    pub fn from_config(config: &Configuration) -> Self {
        let providers = config
            .oauth_providers
            .iter()
            .map(|p| p.name.to_string())
            .chain(std::iter::once(CREDENTIALS_PROVIDER.to_string()))
            .collect();
        Self {
            url: config.auth_url.clone(),
            secret: config.auth_secret.clone(),
            providers,
        }
    }

    pub fn has_provider(&self, name: &str) -> bool {
        self.providers.iter().any(|p| p == name)
    }

    /// OAuth callback URL for `provider`, under the configured auth URL.
    pub fn callback_url(&self, provider: &str) -> String {
        format!(
            "{}/api/auth/callback/{}",
            self.url.trim_end_matches('/'),
            provider
        )
    }
}
