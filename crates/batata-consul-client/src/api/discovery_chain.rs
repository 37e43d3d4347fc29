// Discovery chain endpoint, `/v1/discovery-chain/:service`

use crate::client::ConsulClient;
use crate::constants::consul_api_path;
use crate::error::Result;
use crate::model::{DiscoveryChainOptions, DiscoveryChainResponse};
use crate::request::{QueryOptions, QueryResult};

/// Compiled routing, splitting and resolution steps for a service
pub struct DiscoveryChain<'a> {
    client: &'a ConsulClient,
}

impl<'a> DiscoveryChain<'a> {
    pub(crate) fn new(client: &'a ConsulClient) -> Self {
        Self { client }
    }

    pub async fn get(
        &self,
        service: &str,
        q: Option<&QueryOptions>,
    ) -> Result<QueryResult<DiscoveryChainResponse>> {
        self.get_with_options(service, &DiscoveryChainOptions::default(), q)
            .await
    }

    /// Compile the chain with overrides.
    ///
    /// Overrides travel in a POST body; without any the request stays a GET.
    pub async fn get_with_options(
        &self,
        service: &str,
        opts: &DiscoveryChainOptions,
        q: Option<&QueryOptions>,
    ) -> Result<QueryResult<DiscoveryChainResponse>> {
        let path = format!("{}/{}", consul_api_path::DISCOVERY_CHAIN, service);
        let request = if opts.requires_post() {
            self.client.post(path).json(opts)?
        } else {
            self.client.get(path)
        };
        request
            .param_opt("compile-dc", opts.evaluate_in_datacenter.as_deref())
            .query_options(q)
            .execute()
            .await
    }
}
