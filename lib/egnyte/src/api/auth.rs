//! Current user lookup and token revocation.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use super::require;
use crate::{EgnyteClient, HttpClient, Method, Request, ResponseEnvelope, Result};

const USER_INFO_PATH: &str = "/pubapi/v1/userinfo";
const REVOKE_TOKEN_PATH: &str = "/pubapi/v1/tokens/revoke";

/// The user an access token belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    /// Numeric user id.
    pub id: i64,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Login name.
    pub username: String,
}

#[derive(Serialize)]
struct RevokeForm<'a> {
    token: &'a str,
}

/// Authentication calls, see [`EgnyteClient::auth`].
#[derive(Debug)]
pub struct Auth<'a, C> {
    client: &'a EgnyteClient<C>,
}

impl<'a, C: HttpClient> Auth<'a, C> {
    pub(crate) const fn new(client: &'a EgnyteClient<C>) -> Self {
        Self { client }
    }

    /// The user owning the current access token.
    ///
    /// # Errors
    ///
    /// Fails with [`crate::Error::Api`] on an error response or an
    /// undecodable body, or with a transport error.
    pub async fn user_info(&self) -> Result<ResponseEnvelope<UserInfo>> {
        self.user_info_with_cancel(&CancellationToken::new()).await
    }

    /// [`Auth::user_info`], abandoned when `cancel` fires.
    ///
    /// # Errors
    ///
    /// As [`Auth::user_info`], plus [`crate::Error::Cancelled`].
    pub async fn user_info_with_cancel(
        &self,
        cancel: &CancellationToken,
    ) -> Result<ResponseEnvelope<UserInfo>> {
        let url = self.client.url::<&str, &str>(USER_INFO_PATH, &[])?;
        let request = Request::builder(Method::Get, url)
            .header("Accept", "application/json")
            .build();

        self.client.dispatcher().send_json(request, cancel).await
    }

    /// Revoke an OAuth access token. The response text is returned as is.
    ///
    /// # Errors
    ///
    /// Fails with [`crate::Error::InvalidArgument`] if `token` is blank,
    /// before anything is sent.
    pub async fn revoke_token(&self, token: &str) -> Result<ResponseEnvelope<String>> {
        self.revoke_token_with_cancel(token, &CancellationToken::new())
            .await
    }

    /// [`Auth::revoke_token`], abandoned when `cancel` fires.
    ///
    /// # Errors
    ///
    /// As [`Auth::revoke_token`], plus [`crate::Error::Cancelled`].
    pub async fn revoke_token_with_cancel(
        &self,
        token: &str,
        cancel: &CancellationToken,
    ) -> Result<ResponseEnvelope<String>> {
        let token = require("token", token)?;
        let url = self.client.url::<&str, &str>(REVOKE_TOKEN_PATH, &[])?;
        let request: Request<Bytes> = Request::builder(Method::Post, url)
            .form(&RevokeForm { token })?
            .build();

        self.client.dispatcher().send_text(request, cancel).await
    }
}
