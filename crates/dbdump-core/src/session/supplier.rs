use std::sync::Arc;

use super::{Connector, Session};
use crate::retry::{run_with_retry, ConnectError, ConnectPolicy};
use crate::target::Target;

/// Hands out fresh sessions to the target's SSH host under the retry policy.
/// Cheap to clone; every job and discovery call gets its own session.
#[derive(Clone)]
pub struct ConnectionSupplier {
    connector: Arc<dyn Connector>,
    policy: ConnectPolicy,
}

impl ConnectionSupplier {
    pub fn new(connector: Arc<dyn Connector>, policy: ConnectPolicy) -> Self {
        Self { connector, policy }
    }

    /// Open a session for `target`. `site` names the caller in logs and in the
    /// error returned once all attempts have failed.
    pub async fn connect(
        &self,
        target: &Target,
        site: &str,
    ) -> Result<Box<dyn Session>, ConnectError> {
        let connector = &self.connector;
        let host = target.host.as_str();
        run_with_retry(&self.policy, host, site, |_| connector.connect(host)).await
    }
}
