// ACL endpoints: bootstrap, login, tokens, policies, roles, auth methods, binding rules

use serde::Serialize;

use crate::client::ConsulClient;
use crate::constants::consul_api_path;
use crate::error::{ConsulError, Result};
use crate::model::{
    AclAuthMethod, AclBindingRule, AclLoginParams, AclPolicy, AclReplicationStatus, AclRole,
    AclToken, AclTokenFilter,
};
use crate::request::{QueryOptions, QueryResult, WriteOptions, WriteResult};

fn require_id<'s>(id: &'s str, what: &str) -> Result<&'s str> {
    if id.is_empty() {
        return Err(ConsulError::InvalidArgument(format!(
            "{what} must be set for an update"
        )));
    }
    Ok(id)
}

// ============================================================================
// Acl
// ============================================================================

/// ACL system level operations
pub struct Acl<'a> {
    client: &'a ConsulClient,
}

impl<'a> Acl<'a> {
    pub(crate) fn new(client: &'a ConsulClient) -> Self {
        Self { client }
    }

    /// Create the initial management token; only succeeds once per cluster
    pub async fn bootstrap(&self) -> Result<WriteResult<AclToken>> {
        self.client
            .put(consul_api_path::ACL_BOOTSTRAP)
            .execute_write()
            .await
    }

    pub async fn replication(
        &self,
        q: Option<&QueryOptions>,
    ) -> Result<QueryResult<AclReplicationStatus>> {
        self.client
            .get(consul_api_path::ACL_REPLICATION)
            .query_options(q)
            .execute()
            .await
    }

    /// Exchange an auth method bearer token for an ACL token
    pub async fn login(
        &self,
        params: &AclLoginParams,
        w: Option<&WriteOptions>,
    ) -> Result<WriteResult<AclToken>> {
        self.client
            .post(consul_api_path::ACL_LOGIN)
            .write_options(w)
            .json(params)?
            .execute_write()
            .await
    }

    /// Destroy the token obtained through `login`; pass it in `w.token`
    pub async fn logout(&self, w: Option<&WriteOptions>) -> Result<WriteResult<()>> {
        self.client
            .post(consul_api_path::ACL_LOGOUT)
            .write_options(w)
            .execute_write_empty()
            .await
    }
}

// ============================================================================
// Tokens
// ============================================================================

pub struct Tokens<'a> {
    client: &'a ConsulClient,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct CloneRequest<'b> {
    description: &'b str,
}

impl<'a> Tokens<'a> {
    pub(crate) fn new(client: &'a ConsulClient) -> Self {
        Self { client }
    }

    pub async fn create(
        &self,
        token: &AclToken,
        w: Option<&WriteOptions>,
    ) -> Result<WriteResult<AclToken>> {
        self.client
            .put(consul_api_path::ACL_TOKEN)
            .write_options(w)
            .json(token)?
            .execute_write()
            .await
    }

    pub async fn update(
        &self,
        token: &AclToken,
        w: Option<&WriteOptions>,
    ) -> Result<WriteResult<AclToken>> {
        let id = require_id(&token.accessor_id, "AccessorID")?;
        self.client
            .put(format!("{}/{}", consul_api_path::ACL_TOKEN, id))
            .write_options(w)
            .json(token)?
            .execute_write()
            .await
    }

    /// Copy a token's links into a new token with fresh IDs
    pub async fn clone(
        &self,
        accessor_id: &str,
        description: &str,
        w: Option<&WriteOptions>,
    ) -> Result<WriteResult<AclToken>> {
        let id = require_id(accessor_id, "AccessorID")?;
        self.client
            .put(format!("{}/{}/clone", consul_api_path::ACL_TOKEN, id))
            .write_options(w)
            .json(&CloneRequest { description })?
            .execute_write()
            .await
    }

    pub async fn delete(
        &self,
        accessor_id: &str,
        w: Option<&WriteOptions>,
    ) -> Result<WriteResult<bool>> {
        self.client
            .delete(format!("{}/{}", consul_api_path::ACL_TOKEN, accessor_id))
            .write_options(w)
            .execute_write()
            .await
    }

    pub async fn read(
        &self,
        accessor_id: &str,
        q: Option<&QueryOptions>,
    ) -> Result<QueryResult<Option<AclToken>>> {
        self.client
            .get(format!("{}/{}", consul_api_path::ACL_TOKEN, accessor_id))
            .query_options(q)
            .execute_optional()
            .await
    }

    /// Token used for the request itself
    pub async fn read_self(&self, q: Option<&QueryOptions>) -> Result<QueryResult<AclToken>> {
        self.client
            .get(consul_api_path::ACL_TOKEN_SELF)
            .query_options(q)
            .execute()
            .await
    }

    /// List tokens; secrets are not included
    pub async fn list(
        &self,
        filter: Option<&AclTokenFilter>,
        q: Option<&QueryOptions>,
    ) -> Result<QueryResult<Vec<AclToken>>> {
        let mut request = self.client.get(consul_api_path::ACL_TOKENS);
        if let Some(f) = filter {
            request = request
                .param_opt("policy", f.policy.as_deref())
                .param_opt("role", f.role.as_deref())
                .param_opt("authmethod", f.auth_method.as_deref())
                .param_opt("servicename", f.service_name.as_deref());
        }
        request.query_options(q).execute().await
    }
}

// ============================================================================
// Policies
// ============================================================================

pub struct Policies<'a> {
    client: &'a ConsulClient,
}

impl<'a> Policies<'a> {
    pub(crate) fn new(client: &'a ConsulClient) -> Self {
        Self { client }
    }

    pub async fn create(
        &self,
        policy: &AclPolicy,
        w: Option<&WriteOptions>,
    ) -> Result<WriteResult<AclPolicy>> {
        self.client
            .put(consul_api_path::ACL_POLICY)
            .write_options(w)
            .json(policy)?
            .execute_write()
            .await
    }

    pub async fn update(
        &self,
        policy: &AclPolicy,
        w: Option<&WriteOptions>,
    ) -> Result<WriteResult<AclPolicy>> {
        let id = require_id(&policy.id, "policy ID")?;
        self.client
            .put(format!("{}/{}", consul_api_path::ACL_POLICY, id))
            .write_options(w)
            .json(policy)?
            .execute_write()
            .await
    }

    pub async fn delete(&self, id: &str, w: Option<&WriteOptions>) -> Result<WriteResult<bool>> {
        self.client
            .delete(format!("{}/{}", consul_api_path::ACL_POLICY, id))
            .write_options(w)
            .execute_write()
            .await
    }

    pub async fn read(
        &self,
        id: &str,
        q: Option<&QueryOptions>,
    ) -> Result<QueryResult<Option<AclPolicy>>> {
        self.client
            .get(format!("{}/{}", consul_api_path::ACL_POLICY, id))
            .query_options(q)
            .execute_optional()
            .await
    }

    pub async fn read_by_name(
        &self,
        name: &str,
        q: Option<&QueryOptions>,
    ) -> Result<QueryResult<Option<AclPolicy>>> {
        self.client
            .get(format!("{}/{}", consul_api_path::ACL_POLICY_NAME, name))
            .query_options(q)
            .execute_optional()
            .await
    }

    /// List policies; rules are left out of the listing
    pub async fn list(&self, q: Option<&QueryOptions>) -> Result<QueryResult<Vec<AclPolicy>>> {
        self.client
            .get(consul_api_path::ACL_POLICIES)
            .query_options(q)
            .execute()
            .await
    }
}

// ============================================================================
// Roles
// ============================================================================

pub struct Roles<'a> {
    client: &'a ConsulClient,
}

impl<'a> Roles<'a> {
    pub(crate) fn new(client: &'a ConsulClient) -> Self {
        Self { client }
    }

    pub async fn create(
        &self,
        role: &AclRole,
        w: Option<&WriteOptions>,
    ) -> Result<WriteResult<AclRole>> {
        self.client
            .put(consul_api_path::ACL_ROLE)
            .write_options(w)
            .json(role)?
            .execute_write()
            .await
    }

    pub async fn update(
        &self,
        role: &AclRole,
        w: Option<&WriteOptions>,
    ) -> Result<WriteResult<AclRole>> {
        let id = require_id(&role.id, "role ID")?;
        self.client
            .put(format!("{}/{}", consul_api_path::ACL_ROLE, id))
            .write_options(w)
            .json(role)?
            .execute_write()
            .await
    }

    pub async fn delete(&self, id: &str, w: Option<&WriteOptions>) -> Result<WriteResult<bool>> {
        self.client
            .delete(format!("{}/{}", consul_api_path::ACL_ROLE, id))
            .write_options(w)
            .execute_write()
            .await
    }

    pub async fn read(
        &self,
        id: &str,
        q: Option<&QueryOptions>,
    ) -> Result<QueryResult<Option<AclRole>>> {
        self.client
            .get(format!("{}/{}", consul_api_path::ACL_ROLE, id))
            .query_options(q)
            .execute_optional()
            .await
    }

    pub async fn read_by_name(
        &self,
        name: &str,
        q: Option<&QueryOptions>,
    ) -> Result<QueryResult<Option<AclRole>>> {
        self.client
            .get(format!("{}/{}", consul_api_path::ACL_ROLE_NAME, name))
            .query_options(q)
            .execute_optional()
            .await
    }

    /// List roles, optionally only those linked to `policy_id`
    pub async fn list(
        &self,
        policy_id: Option<&str>,
        q: Option<&QueryOptions>,
    ) -> Result<QueryResult<Vec<AclRole>>> {
        self.client
            .get(consul_api_path::ACL_ROLES)
            .param_opt("policy", policy_id)
            .query_options(q)
            .execute()
            .await
    }
}

// ============================================================================
// Auth methods
// ============================================================================

pub struct AuthMethods<'a> {
    client: &'a ConsulClient,
}

impl<'a> AuthMethods<'a> {
    pub(crate) fn new(client: &'a ConsulClient) -> Self {
        Self { client }
    }

    pub async fn create(
        &self,
        method: &AclAuthMethod,
        w: Option<&WriteOptions>,
    ) -> Result<WriteResult<AclAuthMethod>> {
        self.client
            .put(consul_api_path::ACL_AUTH_METHOD)
            .write_options(w)
            .json(method)?
            .execute_write()
            .await
    }

    pub async fn update(
        &self,
        method: &AclAuthMethod,
        w: Option<&WriteOptions>,
    ) -> Result<WriteResult<AclAuthMethod>> {
        let name = require_id(&method.name, "auth method name")?;
        self.client
            .put(format!("{}/{}", consul_api_path::ACL_AUTH_METHOD, name))
            .write_options(w)
            .json(method)?
            .execute_write()
            .await
    }

    pub async fn delete(&self, name: &str, w: Option<&WriteOptions>) -> Result<WriteResult<bool>> {
        self.client
            .delete(format!("{}/{}", consul_api_path::ACL_AUTH_METHOD, name))
            .write_options(w)
            .execute_write()
            .await
    }

    pub async fn read(
        &self,
        name: &str,
        q: Option<&QueryOptions>,
    ) -> Result<QueryResult<Option<AclAuthMethod>>> {
        self.client
            .get(format!("{}/{}", consul_api_path::ACL_AUTH_METHOD, name))
            .query_options(q)
            .execute_optional()
            .await
    }

    pub async fn list(&self, q: Option<&QueryOptions>) -> Result<QueryResult<Vec<AclAuthMethod>>> {
        self.client
            .get(consul_api_path::ACL_AUTH_METHODS)
            .query_options(q)
            .execute()
            .await
    }
}

// ============================================================================
// Binding rules
// ============================================================================

pub struct BindingRules<'a> {
    client: &'a ConsulClient,
}

impl<'a> BindingRules<'a> {
    pub(crate) fn new(client: &'a ConsulClient) -> Self {
        Self { client }
    }

    pub async fn create(
        &self,
        rule: &AclBindingRule,
        w: Option<&WriteOptions>,
    ) -> Result<WriteResult<AclBindingRule>> {
        self.client
            .put(consul_api_path::ACL_BINDING_RULE)
            .write_options(w)
            .json(rule)?
            .execute_write()
            .await
    }

    pub async fn update(
        &self,
        rule: &AclBindingRule,
        w: Option<&WriteOptions>,
    ) -> Result<WriteResult<AclBindingRule>> {
        let id = require_id(&rule.id, "binding rule ID")?;
        self.client
            .put(format!("{}/{}", consul_api_path::ACL_BINDING_RULE, id))
            .write_options(w)
            .json(rule)?
            .execute_write()
            .await
    }

    pub async fn delete(&self, id: &str, w: Option<&WriteOptions>) -> Result<WriteResult<bool>> {
        self.client
            .delete(format!("{}/{}", consul_api_path::ACL_BINDING_RULE, id))
            .write_options(w)
            .execute_write()
            .await
    }

    pub async fn read(
        &self,
        id: &str,
        q: Option<&QueryOptions>,
    ) -> Result<QueryResult<Option<AclBindingRule>>> {
        self.client
            .get(format!("{}/{}", consul_api_path::ACL_BINDING_RULE, id))
            .query_options(q)
            .execute_optional()
            .await
    }

    /// List binding rules, optionally only those of `auth_method`
    pub async fn list(
        &self,
        auth_method: Option<&str>,
        q: Option<&QueryOptions>,
    ) -> Result<QueryResult<Vec<AclBindingRule>>> {
        self.client
            .get(consul_api_path::ACL_BINDING_RULES)
            .param_opt("authmethod", auth_method)
            .query_options(q)
            .execute()
            .await
    }
}
