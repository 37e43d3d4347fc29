// User event endpoints, `/v1/event/*`

use uuid::Uuid;

use crate::client::ConsulClient;
use crate::constants::consul_api_path;
use crate::error::{ConsulError, Result};
use crate::model::UserEvent;
use crate::request::{QueryOptions, QueryResult, WriteOptions, WriteResult};

/// Custom events broadcast through gossip
pub struct Event<'a> {
    client: &'a ConsulClient,
}

impl<'a> Event<'a> {
    pub(crate) fn new(client: &'a ConsulClient) -> Self {
        Self { client }
    }

    /// Fire `event`; the returned copy carries the ID assigned by the agent
    pub async fn fire(
        &self,
        event: &UserEvent,
        w: Option<&WriteOptions>,
    ) -> Result<WriteResult<UserEvent>> {
        if event.name.is_empty() {
            return Err(ConsulError::InvalidArgument(
                "event name must not be empty".to_string(),
            ));
        }
        let mut request = self
            .client
            .put(format!("{}/{}", consul_api_path::EVENT_FIRE, event.name))
            .param_opt("node", non_empty(&event.node_filter))
            .param_opt("service", non_empty(&event.service_filter))
            .param_opt("tag", non_empty(&event.tag_filter))
            .write_options(w);
        if let Some(payload) = &event.payload {
            request = request.raw(payload.clone());
        }
        request.execute_write().await
    }

    /// Most recent events known to the agent, optionally only those named `name`.
    ///
    /// Events are not ordered by index; use [`event_id_to_index`] on the last
    /// event ID to feed a blocking query.
    pub async fn list(
        &self,
        name: Option<&str>,
        q: Option<&QueryOptions>,
    ) -> Result<QueryResult<Vec<UserEvent>>> {
        self.client
            .get(consul_api_path::EVENT_LIST)
            .param_opt("name", name)
            .query_options(q)
            .execute()
            .await
    }

    pub fn id_to_index(&self, id: &str) -> Result<u64> {
        event_id_to_index(id)
    }
}

fn non_empty(s: &str) -> Option<&str> {
    Some(s).filter(|s| !s.is_empty())
}

/// Pseudo index of an event ID: XOR of the two 64-bit halves of the UUID
pub fn event_id_to_index(id: &str) -> Result<u64> {
    let uuid = Uuid::parse_str(id)
        .map_err(|e| ConsulError::InvalidArgument(format!("invalid event ID '{id}': {e}")))?;
    let (high, low) = uuid.as_u64_pair();
    Ok(high ^ low)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_id_to_index() {
        let index = event_id_to_index("b54fe110-7af5-cafc-d1fb-afc8ba432b1c").unwrap();
        assert_eq!(index, 0xb54fe1107af5cafc ^ 0xd1fbafc8ba432b1c);
    }

    #[test]
    fn test_event_id_to_index_rejects_garbage() {
        assert!(matches!(
            event_id_to_index("not-a-uuid"),
            Err(ConsulError::InvalidArgument(_))
        ));
    }
}
