//! Transport-level resends for gateway calls.
//!
//! A response with any status ends the loop; only `reqwest` errors are
//! candidates for a resend. Whether a given error qualifies depends on the
//! call's [`Resend`] policy: a timed-out issuance may already be recorded
//! on the ledger, so it is only resent when the connection never opened.

use std::future::Future;
use std::time::Duration;

/// Resends after the first attempt.
const MAX_RESENDS: u32 = 3;

/// First backoff step; each further step doubles it.
const BACKOFF_BASE: Duration = Duration::from_millis(200);

/// Which transport failures a call may resend after.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Resend {
    /// Reads and idempotent writes: any transport failure.
    AnyFailure,
    /// Non-idempotent writes: only failures to connect.
    ConnectFailure,
}

impl Resend {
    fn allows(self, err: &reqwest::Error) -> bool {
        match self {
            Self::AnyFailure => true,
            Self::ConnectFailure => err.is_connect(),
        }
    }
}

fn backoff(resend: u32) -> Duration {
    BACKOFF_BASE * 2u32.pow(resend)
}

/// Run `send`, resending per `policy` with exponential backoff.
pub(crate) async fn send_with_resend<F, Fut>(
    policy: Resend,
    send: F,
) -> Result<reqwest::Response, reqwest::Error>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<reqwest::Response, reqwest::Error>>,
{
    let mut resends = 0;
    loop {
        match send().await {
            Err(err) if resends < MAX_RESENDS && policy.allows(&err) => {
                let delay = backoff(resends);
                resends += 1;
                tracing::warn!(
                    resend = resends,
                    ?policy,
                    error = %err,
                    "ledger gateway call failed; resending in {delay:?}"
                );
                tokio::time::sleep(delay).await;
            }
            outcome => return outcome,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    async fn count_sends(policy: Resend, url: &str, timeout: Duration) -> (bool, u32) {
        let client = reqwest::Client::builder().timeout(timeout).build().unwrap();
        let sends = Arc::new(AtomicU32::new(0));
        let result = send_with_resend(policy, || {
            sends.fetch_add(1, Ordering::SeqCst);
            client.get(url).send()
        })
        .await;
        (result.is_ok(), sends.load(Ordering::SeqCst))
    }

    #[test]
    fn backoff_doubles() {
        assert_eq!(backoff(0), Duration::from_millis(200));
        assert_eq!(backoff(2), Duration::from_millis(800));
    }

    #[tokio::test]
    async fn refused_connection_is_resent_under_both_policies() {
        for policy in [Resend::AnyFailure, Resend::ConnectFailure] {
            let (ok, sends) =
                count_sends(policy, "http://127.0.0.1:1/", Duration::from_millis(50)).await;
            assert!(!ok);
            assert_eq!(sends, MAX_RESENDS + 1, "{policy:?}");
        }
    }

    #[tokio::test]
    async fn timeout_is_not_resent_for_connect_only_policy() {
        let server = wiremock::MockServer::start().await;
        wiremock::Mock::given(wiremock::matchers::any())
            .respond_with(wiremock::ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
            .mount(&server)
            .await;

        let (ok, sends) =
            count_sends(Resend::ConnectFailure, &server.uri(), Duration::from_millis(100)).await;
        assert!(!ok);
        assert_eq!(sends, 1);
    }
}
