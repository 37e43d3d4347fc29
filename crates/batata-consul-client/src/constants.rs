// HTTP API path, header and environment constants for the Consul agent API

pub mod consul_api_path {
    // ACL
    pub const ACL_BOOTSTRAP: &str = "/v1/acl/bootstrap";
    pub const ACL_REPLICATION: &str = "/v1/acl/replication";
    pub const ACL_LOGIN: &str = "/v1/acl/login";
    pub const ACL_LOGOUT: &str = "/v1/acl/logout";
    pub const ACL_TOKEN: &str = "/v1/acl/token";
    pub const ACL_TOKEN_SELF: &str = "/v1/acl/token/self";
    pub const ACL_TOKENS: &str = "/v1/acl/tokens";
    pub const ACL_POLICY: &str = "/v1/acl/policy";
    pub const ACL_POLICY_NAME: &str = "/v1/acl/policy/name";
    pub const ACL_POLICIES: &str = "/v1/acl/policies";
    pub const ACL_ROLE: &str = "/v1/acl/role";
    pub const ACL_ROLE_NAME: &str = "/v1/acl/role/name";
    pub const ACL_ROLES: &str = "/v1/acl/roles";
    pub const ACL_AUTH_METHOD: &str = "/v1/acl/auth-method";
    pub const ACL_AUTH_METHODS: &str = "/v1/acl/auth-methods";
    pub const ACL_BINDING_RULE: &str = "/v1/acl/binding-rule";
    pub const ACL_BINDING_RULES: &str = "/v1/acl/binding-rules";

    // Agent
    pub const AGENT_SELF: &str = "/v1/agent/self";
    pub const AGENT_HOST: &str = "/v1/agent/host";
    pub const AGENT_VERSION: &str = "/v1/agent/version";
    pub const AGENT_MEMBERS: &str = "/v1/agent/members";
    pub const AGENT_CHECKS: &str = "/v1/agent/checks";
    pub const AGENT_SERVICES: &str = "/v1/agent/services";
    pub const AGENT_SERVICE: &str = "/v1/agent/service";
    pub const AGENT_SERVICE_REGISTER: &str = "/v1/agent/service/register";
    pub const AGENT_SERVICE_DEREGISTER: &str = "/v1/agent/service/deregister";
    pub const AGENT_SERVICE_MAINTENANCE: &str = "/v1/agent/service/maintenance";
    pub const AGENT_CHECK_REGISTER: &str = "/v1/agent/check/register";
    pub const AGENT_CHECK_DEREGISTER: &str = "/v1/agent/check/deregister";
    pub const AGENT_CHECK_UPDATE: &str = "/v1/agent/check/update";
    pub const AGENT_JOIN: &str = "/v1/agent/join";
    pub const AGENT_LEAVE: &str = "/v1/agent/leave";
    pub const AGENT_FORCE_LEAVE: &str = "/v1/agent/force-leave";
    pub const AGENT_MAINTENANCE: &str = "/v1/agent/maintenance";
    pub const AGENT_RELOAD: &str = "/v1/agent/reload";
    pub const AGENT_TOKEN: &str = "/v1/agent/token";
    pub const AGENT_METRICS: &str = "/v1/agent/metrics";
    pub const AGENT_MONITOR: &str = "/v1/agent/monitor";
    pub const AGENT_CA_ROOTS: &str = "/v1/agent/connect/ca/roots";
    pub const AGENT_CA_LEAF: &str = "/v1/agent/connect/ca/leaf";
    pub const AGENT_HEALTH_SERVICE_ID: &str = "/v1/agent/health/service/id";
    pub const AGENT_HEALTH_SERVICE_NAME: &str = "/v1/agent/health/service/name";

    // Catalog
    pub const CATALOG_REGISTER: &str = "/v1/catalog/register";
    pub const CATALOG_DEREGISTER: &str = "/v1/catalog/deregister";
    pub const CATALOG_DATACENTERS: &str = "/v1/catalog/datacenters";
    pub const CATALOG_NODES: &str = "/v1/catalog/nodes";
    pub const CATALOG_SERVICES: &str = "/v1/catalog/services";
    pub const CATALOG_SERVICE: &str = "/v1/catalog/service";
    pub const CATALOG_CONNECT: &str = "/v1/catalog/connect";
    pub const CATALOG_NODE: &str = "/v1/catalog/node";
    pub const CATALOG_GATEWAY_SERVICES: &str = "/v1/catalog/gateway-services";

    // Health
    pub const HEALTH_NODE: &str = "/v1/health/node";
    pub const HEALTH_CHECKS: &str = "/v1/health/checks";
    pub const HEALTH_SERVICE: &str = "/v1/health/service";
    pub const HEALTH_CONNECT: &str = "/v1/health/connect";
    pub const HEALTH_INGRESS: &str = "/v1/health/ingress";
    pub const HEALTH_STATE: &str = "/v1/health/state";

    // KV / Txn
    pub const KV: &str = "/v1/kv";
    pub const TXN: &str = "/v1/txn";

    // Session
    pub const SESSION_CREATE: &str = "/v1/session/create";
    pub const SESSION_DESTROY: &str = "/v1/session/destroy";
    pub const SESSION_INFO: &str = "/v1/session/info";
    pub const SESSION_LIST: &str = "/v1/session/list";
    pub const SESSION_NODE: &str = "/v1/session/node";
    pub const SESSION_RENEW: &str = "/v1/session/renew";

    // Snapshot
    pub const SNAPSHOT: &str = "/v1/snapshot";

    // Operator
    pub const OPERATOR_RAFT_CONFIGURATION: &str = "/v1/operator/raft/configuration";
    pub const OPERATOR_RAFT_PEER: &str = "/v1/operator/raft/peer";
    pub const OPERATOR_RAFT_TRANSFER_LEADER: &str = "/v1/operator/raft/transfer-leader";
    pub const OPERATOR_KEYRING: &str = "/v1/operator/keyring";
    pub const OPERATOR_AUTOPILOT_CONFIGURATION: &str = "/v1/operator/autopilot/configuration";
    pub const OPERATOR_AUTOPILOT_HEALTH: &str = "/v1/operator/autopilot/health";
    pub const OPERATOR_AUTOPILOT_STATE: &str = "/v1/operator/autopilot/state";

    // Config entries
    pub const CONFIG: &str = "/v1/config";

    // Connect
    pub const CONNECT_CA_ROOTS: &str = "/v1/connect/ca/roots";
    pub const CONNECT_CA_CONFIGURATION: &str = "/v1/connect/ca/configuration";
    pub const CONNECT_INTENTIONS: &str = "/v1/connect/intentions";
    pub const CONNECT_INTENTIONS_EXACT: &str = "/v1/connect/intentions/exact";
    pub const CONNECT_INTENTIONS_MATCH: &str = "/v1/connect/intentions/match";
    pub const CONNECT_INTENTIONS_CHECK: &str = "/v1/connect/intentions/check";

    // Discovery chain
    pub const DISCOVERY_CHAIN: &str = "/v1/discovery-chain";

    // Coordinate
    pub const COORDINATE_DATACENTERS: &str = "/v1/coordinate/datacenters";
    pub const COORDINATE_NODES: &str = "/v1/coordinate/nodes";
    pub const COORDINATE_NODE: &str = "/v1/coordinate/node";
    pub const COORDINATE_UPDATE: &str = "/v1/coordinate/update";

    // Event
    pub const EVENT_FIRE: &str = "/v1/event/fire";
    pub const EVENT_LIST: &str = "/v1/event/list";

    // Prepared query
    pub const QUERY: &str = "/v1/query";

    // Status
    pub const STATUS_LEADER: &str = "/v1/status/leader";
    pub const STATUS_PEERS: &str = "/v1/status/peers";

    // Namespace
    pub const NAMESPACE: &str = "/v1/namespace";
    pub const NAMESPACES: &str = "/v1/namespaces";
}

pub mod header {
    pub const TOKEN: &str = "X-Consul-Token";
    pub const INDEX: &str = "X-Consul-Index";
    pub const LAST_CONTACT: &str = "X-Consul-LastContact";
    pub const KNOWN_LEADER: &str = "X-Consul-KnownLeader";
    pub const TRANSLATE_ADDRESSES: &str = "X-Consul-Translate-Addresses";
}

pub mod env {
    pub const HTTP_ADDR: &str = "CONSUL_HTTP_ADDR";
    pub const HTTP_TOKEN: &str = "CONSUL_HTTP_TOKEN";
    pub const HTTP_AUTH: &str = "CONSUL_HTTP_AUTH";
    pub const HTTP_SSL: &str = "CONSUL_HTTP_SSL";
    pub const HTTP_SSL_VERIFY: &str = "CONSUL_HTTP_SSL_VERIFY";
    pub const NAMESPACE: &str = "CONSUL_NAMESPACE";
    pub const PARTITION: &str = "CONSUL_PARTITION";
}
