//! Response dispatcher.
//!
//! [`Dispatcher`] sends one request through the transport chain and turns
//! the outcome into either a [`ResponseEnvelope`] holding the payload in the
//! shape the caller asked for, or an [`Error`] whose message has been
//! normalized from the error body.

use bytes::Bytes;
use futures_util::{StreamExt, stream};
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::{
    Body, DecodeError, Error, HttpClient, Payload, PayloadShape, Request, Response, ResponseEnvelope,
    Result, escape_brackets, normalize,
};

/// Sends requests and interprets responses.
#[derive(Debug, Clone)]
pub struct Dispatcher<C> {
    client: C,
}

impl<C: HttpClient> Dispatcher<C> {
    /// Dispatch through the given transport.
    pub const fn new(client: C) -> Self {
        Self { client }
    }

    /// The underlying transport.
    pub const fn client(&self) -> &C {
        &self.client
    }

    /// Send `request` and decode a 2xx body as `shape`.
    ///
    /// The whole operation, over-QPS waits and body buffering included,
    /// races `cancel`. A cancelled call fails with [`Error::Cancelled`].
    /// For [`PayloadShape::ByteStream`] the call completes once headers
    /// arrive and the caller owns the unread body; that body still ends with
    /// [`Error::Cancelled`] when `cancel` fires mid-read.
    ///
    /// # Errors
    ///
    /// - [`Error::Api`] for a non-2xx status, with the normalized message
    ///   and the raw body
    /// - [`Error::Api`] carrying the raw body when a 2xx body cannot be
    ///   decoded as `shape`
    /// - [`Error::Cancelled`] when `cancel` fires first
    /// - any transport error
    pub async fn send<T: DeserializeOwned>(
        &self,
        request: Request<Bytes>,
        shape: PayloadShape,
        cancel: &CancellationToken,
    ) -> Result<ResponseEnvelope<Payload<T>>> {
        if cancel.is_cancelled() {
            debug!("call cancelled before sending");
            return Err(Error::Cancelled);
        }

        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                debug!("call cancelled");
                Err(Error::Cancelled)
            }
            result = self.dispatch(request, shape, cancel) => result,
        }
    }

    /// Send and decode a JSON body as `T`.
    ///
    /// # Errors
    ///
    /// See [`Dispatcher::send`].
    pub async fn send_json<T: DeserializeOwned>(
        &self,
        request: Request<Bytes>,
        cancel: &CancellationToken,
    ) -> Result<ResponseEnvelope<T>> {
        let envelope = self
            .send::<T>(request, PayloadShape::Structured, cancel)
            .await?;
        unwrap_payload(envelope, Payload::into_structured)
    }

    /// Send and return the body text unchanged.
    ///
    /// # Errors
    ///
    /// See [`Dispatcher::send`].
    pub async fn send_text(
        &self,
        request: Request<Bytes>,
        cancel: &CancellationToken,
    ) -> Result<ResponseEnvelope<String>> {
        let envelope = self
            .send::<()>(request, PayloadShape::RawText, cancel)
            .await?;
        unwrap_payload(envelope, Payload::into_text)
    }

    /// Send and return the whole body in memory.
    ///
    /// # Errors
    ///
    /// See [`Dispatcher::send`].
    pub async fn send_bytes(
        &self,
        request: Request<Bytes>,
        cancel: &CancellationToken,
    ) -> Result<ResponseEnvelope<Bytes>> {
        let envelope = self
            .send::<()>(request, PayloadShape::RawBytes, cancel)
            .await?;
        unwrap_payload(envelope, Payload::into_bytes)
    }

    /// Send and return the body as an unread stream.
    ///
    /// # Errors
    ///
    /// See [`Dispatcher::send`].
    pub async fn send_stream(
        &self,
        request: Request<Bytes>,
        cancel: &CancellationToken,
    ) -> Result<ResponseEnvelope<Body>> {
        let envelope = self
            .send::<()>(request, PayloadShape::ByteStream, cancel)
            .await?;
        unwrap_payload(envelope, Payload::into_stream)
    }

    async fn dispatch<T: DeserializeOwned>(
        &self,
        mut request: Request<Bytes>,
        shape: PayloadShape,
        cancel: &CancellationToken,
    ) -> Result<ResponseEnvelope<Payload<T>>> {
        let url = escape_brackets(request.url().clone());
        request.set_url(url);
        request.extensions_mut().insert(cancel.clone());

        let method = request.method();
        debug!(%method, url = %request.url(), %shape, "dispatching");

        let response = self.client.execute(request).await?;

        if !response.is_success() {
            return Err(into_api_error(response).await);
        }

        let (status, headers, body) = response.into_parts();
        let payload = match shape {
            PayloadShape::Structured => {
                let response = Response::new(status, headers.clone(), body).collect().await?;
                Payload::Structured(response.json::<T>()?)
            }
            PayloadShape::RawText => {
                let bytes = body.collect().await?;
                let text = String::from_utf8(bytes.to_vec()).map_err(|err| {
                    Error::undecodable(status, bytes.clone(), DecodeError::Utf8(err))
                })?;
                Payload::RawText(text)
            }
            PayloadShape::RawBytes => Payload::RawBytes(body.collect().await?),
            PayloadShape::ByteStream => Payload::ByteStream(cancellable(body, cancel.clone())),
        };

        debug!(status, %shape, "call succeeded");
        Ok(ResponseEnvelope::new(status, headers, payload))
    }
}

/// Build the error for a non-2xx response, reading its body in full.
async fn into_api_error(response: Response) -> Error {
    let status = response.status();
    let content_type = response.content_type().map(str::to_string);

    let body = match response.into_body().collect().await {
        Ok(body) => body,
        Err(err) => {
            warn!(status, error = %err, "failed to read error body");
            return err;
        }
    };

    let text = String::from_utf8_lossy(&body);
    let message = normalize(&text, content_type.as_deref(), status);

    warn!(status, %message, "call failed");
    Error::api_with_body(status, message, body)
}

/// Stream `body` until `cancel` fires, then yield [`Error::Cancelled`] once.
fn cancellable(body: Body, cancel: CancellationToken) -> Body {
    Body::from_stream(stream::unfold(
        Some((body, cancel)),
        |state| async move {
            let (mut body, cancel) = state?;

            let next = tokio::select! {
                biased;
                () = cancel.cancelled() => None,
                chunk = body.next() => Some(chunk),
            };

            match next {
                None => {
                    debug!("body read cancelled");
                    Some((Err(Error::Cancelled), None))
                }
                Some(chunk) => chunk.map(|chunk| (chunk, Some((body, cancel)))),
            }
        },
    ))
}

fn unwrap_payload<T, U>(
    envelope: ResponseEnvelope<Payload<T>>,
    extract: impl FnOnce(Payload<T>) -> Option<U>,
) -> Result<ResponseEnvelope<U>> {
    let status = envelope.status();
    let (payload, headers) = envelope.into_parts();
    let shape = payload.shape();

    extract(payload)
        .map(|payload| ResponseEnvelope::new(status, headers, payload))
        .ok_or_else(|| Error::invalid_request(format!("unexpected {shape} payload")))
}
