//! # Notification Delivery
//!
//! The only place that talks to the outside world on the way out. A
//! [`Dispatcher`] takes finished post text and publishes it; [`deliver`] wraps
//! every attempt with the dry-run switch and a hard timeout so one hung request
//! cannot stall the polling loop.
//!
//! The bundled [`StatusDispatcher`] posts to a Mastodon-style status endpoint:
//! `POST {endpoint}` with a bearer token and a JSON body `{"status": "..."}`.
//! No retries are made here; a failed post is reported and the loop moves on.

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum DispatchError {
    /// Network, TLS, or protocol failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The platform answered but refused the post
    #[error("post rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("post timed out after {0:?}")]
    Timeout(Duration),
}

/// How an attempt ended when it did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// Published; carries the post URL when the platform reports one
    Posted { url: Option<String> },
    /// Suppressed by dry-run
    DryRun,
}

pub trait Dispatcher {
    fn dispatch(&self, text: &str) -> impl Future<Output = Result<Delivery, DispatchError>> + Send;
}

#[derive(Serialize)]
struct StatusRequest<'a> {
    status: &'a str,
}

#[derive(Deserialize)]
struct StatusResponse {
    url: Option<String>,
}

/// Posts to a status endpoint with a bearer token.
#[derive(Debug, Clone)]
pub struct StatusDispatcher {
    client: reqwest::Client,
    endpoint: String,
    access_token: String,
}

impl StatusDispatcher {
    pub fn new(
        endpoint: impl Into<String>,
        access_token: impl Into<String>,
    ) -> Result<Self, DispatchError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("pegel-tracker/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            access_token: access_token.into(),
        })
    }
}

impl Dispatcher for StatusDispatcher {
    async fn dispatch(&self, text: &str) -> Result<Delivery, DispatchError> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.access_token)
            .json(&StatusRequest { status: text })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DispatchError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        // A body we cannot read does not undo a successful post
        let url = response
            .json::<StatusResponse>()
            .await
            .ok()
            .and_then(|r| r.url);
        Ok(Delivery::Posted { url })
    }
}

/// Run one delivery attempt.
///
/// With `dry_run` set the dispatcher is never called and the text is only
/// logged. Otherwise the call is cut off after `timeout`.
pub async fn deliver<D: Dispatcher>(
    dispatcher: &D,
    text: &str,
    dry_run: bool,
    timeout: Duration,
) -> Result<Delivery, DispatchError> {
    if dry_run {
        info!(text, "dry-run, not posting");
        return Ok(Delivery::DryRun);
    }

    debug!(text, ?timeout, "posting");
    match tokio::time::timeout(timeout, dispatcher.dispatch(text)).await {
        Ok(result) => result,
        Err(_) => Err(DispatchError::Timeout(timeout)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counting {
        calls: AtomicUsize,
    }

    impl Dispatcher for Counting {
        async fn dispatch(&self, _text: &str) -> Result<Delivery, DispatchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Delivery::Posted { url: None })
        }
    }

    struct Hanging;

    impl Dispatcher for Hanging {
        async fn dispatch(&self, _text: &str) -> Result<Delivery, DispatchError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(Delivery::Posted { url: None })
        }
    }

    #[tokio::test]
    async fn dry_run_never_calls_dispatcher() {
        let dispatcher = Counting {
            calls: AtomicUsize::new(0),
        };
        let result = deliver(&dispatcher, "hallo", true, Duration::from_secs(1)).await;
        assert_eq!(result.unwrap(), Delivery::DryRun);
        assert_eq!(dispatcher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn live_run_calls_dispatcher_once() {
        let dispatcher = Counting {
            calls: AtomicUsize::new(0),
        };
        let result = deliver(&dispatcher, "hallo", false, Duration::from_secs(1)).await;
        assert_eq!(result.unwrap(), Delivery::Posted { url: None });
        assert_eq!(dispatcher.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn hung_dispatch_times_out() {
        let result = deliver(&Hanging, "hallo", false, Duration::from_secs(30)).await;
        assert!(matches!(result, Err(DispatchError::Timeout(d)) if d == Duration::from_secs(30)));
    }
}
