//! VM discovery across the configured server endpoints.
//!
//! Each endpoint gets a short-lived connection: open, ask for `serverInfo`,
//! close.  Endpoints are queried one after another so the result keeps the
//! configured order.

use tracing::{info, warn};
use vmview_core::VmDescriptor;

use crate::application::session::ClientError;
use crate::infrastructure::client::VmClient;
use crate::infrastructure::display::HeadlessDisplay;

/// Queries every endpoint in `urls` and returns the descriptors of those that
/// answered.  Unreachable or misbehaving endpoints are logged and skipped.
pub async fn discover<I, S>(urls: I) -> Vec<VmDescriptor>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut found = Vec::new();

    for url in urls {
        let url = url.as_ref();
        match query(url).await {
            Ok(vm) => {
                info!("discovered \"{}\" at {url}", vm.name);
                found.push(vm);
            }
            Err(e) => warn!("skipping {url}: {e}"),
        }
    }

    found
}

/// Runs a single discovery query against `url`.
pub async fn query(url: &str) -> Result<VmDescriptor, ClientError> {
    let client = VmClient::connect(url, Box::new(HeadlessDisplay::new()));
    let result = match client.wait_until_connection_open().await {
        Ok(()) => client.list_vm().await,
        Err(e) => Err(e),
    };
    client.close().await;
    result
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_discover_with_no_urls_is_empty() {
        let found = discover(Vec::<String>::new()).await;
        assert!(found.is_empty());
    }

    #[tokio::test]
    async fn test_discover_skips_unreachable_endpoints() {
        let found = discover(["ws://127.0.0.1:1", "ws://127.0.0.1:2"]).await;
        assert!(found.is_empty());
    }

    #[tokio::test]
    async fn test_query_unreachable_endpoint_reports_closed() {
        let result = query("ws://127.0.0.1:1").await;
        assert_eq!(result, Err(ClientError::SessionClosed));
    }
}
