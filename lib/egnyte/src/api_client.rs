//! Tenant-scoped API client.
//!
//! [`EgnyteClient`] pairs a [`Dispatcher`] with the tenant's [`UrlComposer`]
//! and hands out the resource groups. Clones share the transport and its
//! connection pool.

use url::Url;

use crate::api::{Auth, Files};
use crate::{
    ClientConfig, Dispatcher, Error, HttpClient, HyperClient, Result, UrlComposer,
    DEFAULT_AUTHORITY_TEMPLATE,
};

/// Client for one tenant's public API.
///
/// # Example
///
/// ```ignore
/// use egnyte::EgnyteClient;
///
/// let client = EgnyteClient::builder("acme")
///     .access_token("access-token")
///     .build()?;
///
/// let me = client.auth().user_info().await?;
/// println!("signed in as {}", me.payload().username);
/// ```
#[derive(Debug)]
pub struct EgnyteClient<C = HyperClient> {
    dispatcher: Dispatcher<C>,
    composer: UrlComposer,
}

impl<C: Clone> Clone for EgnyteClient<C> {
    fn clone(&self) -> Self {
        Self {
            dispatcher: self.dispatcher.clone(),
            composer: self.composer.clone(),
        }
    }
}

impl EgnyteClient<HyperClient> {
    /// Start configuring a client for `tenant`.
    #[must_use]
    pub fn builder(tenant: impl Into<String>) -> EgnyteClientBuilder {
        EgnyteClientBuilder::new(tenant)
    }
}

impl<C: HttpClient> EgnyteClient<C> {
    /// Create a client for `tenant` on the default authority over `client`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `tenant` is blank.
    pub fn new(client: C, tenant: &str) -> Result<Self> {
        Ok(Self::with_composer(client, UrlComposer::new(tenant)?))
    }

    /// Create a client from a transport and a ready composer.
    #[must_use]
    pub const fn with_composer(client: C, composer: UrlComposer) -> Self {
        Self {
            dispatcher: Dispatcher::new(client),
            composer,
        }
    }

    /// The dispatcher every call goes through.
    #[must_use]
    pub const fn dispatcher(&self) -> &Dispatcher<C> {
        &self.dispatcher
    }

    /// The tenant's URL composer.
    #[must_use]
    pub const fn composer(&self) -> &UrlComposer {
        &self.composer
    }

    /// Absolute URL for `path` with the given query pairs.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUrl`] if the result cannot be parsed.
    pub fn url<K, V>(&self, path: &str, query: &[(K, V)]) -> Result<Url>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        self.composer.compose(path, query)
    }

    /// Authentication calls.
    #[must_use]
    pub const fn auth(&self) -> Auth<'_, C> {
        Auth::new(self)
    }

    /// File system calls.
    #[must_use]
    pub const fn files(&self) -> Files<'_, C> {
        Files::new(self)
    }
}

/// Builder for [`EgnyteClient`].
#[derive(Debug)]
pub struct EgnyteClientBuilder {
    tenant: String,
    access_token: Option<String>,
    authority_template: Option<String>,
    config: Option<ClientConfig>,
    http_client: Option<HyperClient>,
}

impl EgnyteClientBuilder {
    /// Start configuring a client for `tenant`.
    #[must_use]
    pub fn new(tenant: impl Into<String>) -> Self {
        Self {
            tenant: tenant.into(),
            access_token: None,
            authority_template: None,
            config: None,
            http_client: None,
        }
    }

    /// OAuth access token sent as `Authorization: Bearer`.
    #[must_use]
    pub fn access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    /// Authority template with a `{tenant}` placeholder.
    ///
    /// Defaults to [`DEFAULT_AUTHORITY_TEMPLATE`].
    #[must_use]
    pub fn authority_template(mut self, template: impl Into<String>) -> Self {
        self.authority_template = Some(template.into());
        self
    }

    /// Transport configuration for the client built here.
    #[must_use]
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Use an already built transport, e.g. to share a connection pool.
    ///
    /// The transport is used as is: it must carry its own authorization.
    #[must_use]
    pub fn http_client(mut self, client: HyperClient) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Build the client.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if the tenant is blank, or if a
    /// pre-built transport is combined with an access token or a
    /// configuration.
    pub fn build(self) -> Result<EgnyteClient> {
        let template = self
            .authority_template
            .as_deref()
            .unwrap_or(DEFAULT_AUTHORITY_TEMPLATE);
        let composer = UrlComposer::with_template(template, &self.tenant)?;

        let client = match self.http_client {
            Some(_) if self.access_token.is_some() || self.config.is_some() => {
                return Err(Error::invalid_argument(
                    "a pre-built http client cannot be combined with an access token or a config",
                ));
            }
            Some(client) => client,
            None => {
                let mut builder = HyperClient::builder();
                if let Some(config) = self.config {
                    builder = builder
                        .timeout(config.timeout)
                        .connect_timeout(config.connect_timeout)
                        .pool_idle_per_host(config.pool_idle_per_host)
                        .pool_idle_timeout(config.pool_idle_timeout)
                        .user_agent(config.user_agent);
                }
                if let Some(token) = self.access_token {
                    if token.trim().is_empty() {
                        return Err(Error::blank_argument("access_token"));
                    }
                    builder = builder.with_bearer_auth(token);
                }
                builder.build()
            }
        };

        Ok(EgnyteClient::with_composer(client, composer))
    }
}

#[cfg(test)]
mod tests {
    use assert2::let_assert;

    use super::*;

    #[tokio::test]
    async fn builder_uses_default_authority() {
        let client = EgnyteClient::builder("acme")
            .access_token("token")
            .build()
            .expect("client");

        assert_eq!(
            client.composer().base_url().as_str(),
            "https://acme.egnyte.com/"
        );
        let url = client
            .url("/pubapi/v1/userinfo", &[] as &[(&str, &str)])
            .expect("url");
        assert_eq!(url.as_str(), "https://acme.egnyte.com/pubapi/v1/userinfo");
    }

    #[tokio::test]
    async fn builder_custom_template() {
        let client = EgnyteClient::builder("acme")
            .authority_template("http://127.0.0.1:8080/{tenant}/")
            .build()
            .expect("client");

        assert_eq!(
            client.composer().base_url().as_str(),
            "http://127.0.0.1:8080/acme/"
        );
    }

    #[tokio::test]
    async fn builder_rejects_blank_values() {
        let_assert!(Err(err) = EgnyteClient::builder(" ").build());
        assert!(err.is_invalid_argument());
        assert!(err.to_string().contains("tenant"));

        let_assert!(Err(err) = EgnyteClient::builder("acme").access_token("").build());
        assert!(err.is_invalid_argument());
        assert!(err.to_string().contains("access_token"));
    }

    #[tokio::test]
    async fn builder_rejects_token_with_prebuilt_client() {
        let result = EgnyteClient::builder("acme")
            .http_client(HyperClient::new())
            .access_token("token")
            .build();

        let_assert!(Err(err) = result);
        assert!(err.is_invalid_argument());
    }
}
