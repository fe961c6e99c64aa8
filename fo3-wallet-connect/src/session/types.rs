//! Session value types: participants, scope and shared state

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Descriptive metadata about an application
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icons: Option<Vec<String>>,
}

/// One side of a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    /// Session-scoped public key, hex encoded
    pub public_key: String,
    pub metadata: AppMetadata,
}

impl Participant {
    pub fn new(public_key: impl Into<String>, metadata: AppMetadata) -> Self {
        Self {
            public_key: public_key.into(),
            metadata,
        }
    }
}

/// The participant allowed to upgrade and update a settled session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Controller {
    pub public_key: String,
}

/// Blockchain scope, as CAIP-2 chain ids
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockchainPermissions {
    pub chains: BTreeSet<String>,
}

/// JSON-RPC method scope
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonRpcPermissions {
    pub methods: BTreeSet<String>,
}

/// Notification type scope
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPermissions {
    pub types: Vec<String>,
}

/// Requested (proposal) or granted (settled) authorization scope
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionPermissions {
    pub blockchain: BlockchainPermissions,
    pub jsonrpc: JsonRpcPermissions,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notifications: Option<NotificationPermissions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub controller: Option<Controller>,
}

impl SessionPermissions {
    /// Build a scope from chain ids and method names
    pub fn new<C, M>(chains: C, methods: M) -> Self
    where
        C: IntoIterator,
        C::Item: Into<String>,
        M: IntoIterator,
        M::Item: Into<String>,
    {
        Self {
            blockchain: BlockchainPermissions {
                chains: chains.into_iter().map(Into::into).collect(),
            },
            jsonrpc: JsonRpcPermissions {
                methods: methods.into_iter().map(Into::into).collect(),
            },
            notifications: None,
            controller: None,
        }
    }

    pub fn with_notifications<I>(mut self, types: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.notifications = Some(NotificationPermissions {
            types: types.into_iter().map(Into::into).collect(),
        });
        self
    }

    /// Grow chains and methods by set union; nothing is ever removed
    pub fn upgrade(&mut self, other: &SessionPermissions) {
        self.blockchain
            .chains
            .extend(other.blockchain.chains.iter().cloned());
        self.jsonrpc
            .methods
            .extend(other.jsonrpc.methods.iter().cloned());
    }

    pub fn allows_chain(&self, chain_id: &str) -> bool {
        self.blockchain.chains.contains(chain_id)
    }

    pub fn allows_method(&self, method: &str) -> bool {
        self.jsonrpc.methods.contains(method)
    }

    pub fn allows_notification(&self, notification_type: &str) -> bool {
        self.notifications
            .as_ref()
            .map_or(false, |n| n.types.iter().any(|t| t == notification_type))
    }
}

/// Accounts the wallet exposes to the peer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub accounts: BTreeSet<String>,
}

impl SessionState {
    pub fn new<I>(accounts: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        Self {
            accounts: accounts.into_iter().map(Into::into).collect(),
        }
    }
}

/// Relay protocol used to carry the session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayProtocolOptions {
    pub protocol: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Vec<String>>,
}

impl RelayProtocolOptions {
    pub fn new(protocol: impl Into<String>) -> Self {
        Self {
            protocol: protocol.into(),
            params: None,
        }
    }
}

/// The proposing side of a session proposal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Proposer {
    pub public_key: String,
    /// Whether the proposer asks to be the session controller
    pub controller: bool,
    pub metadata: AppMetadata,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalParams {
    pub topic: String,
}

/// How the proposal reached the responder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signal {
    pub method: String,
    pub params: SignalParams,
}

impl Signal {
    pub const PAIRING: &'static str = "pairing";

    pub fn pairing(topic: impl Into<String>) -> Self {
        Self {
            method: Self::PAIRING.to_string(),
            params: SignalParams {
                topic: topic.into(),
            },
        }
    }
}

/// A session proposal, delivered over a pairing topic
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionProposal {
    /// Pairing topic the proposal travels on, not the session topic
    pub topic: String,
    pub relay: RelayProtocolOptions,
    pub proposer: Proposer,
    pub signal: Signal,
    pub permissions: SessionPermissions,
    /// Requested session lifetime in seconds
    pub ttl: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upgrade_is_union() {
        let mut granted = SessionPermissions::new(["eip155:1"], ["eth_sign"]);
        granted.upgrade(&SessionPermissions::new(["eip155:137"], Vec::<String>::new()));
        granted.upgrade(&SessionPermissions::new(["eip155:1"], ["personal_sign"]));

        let chains: Vec<_> = granted.blockchain.chains.iter().map(String::as_str).collect();
        let methods: Vec<_> = granted.jsonrpc.methods.iter().map(String::as_str).collect();
        assert_eq!(chains, vec!["eip155:1", "eip155:137"]);
        assert_eq!(methods, vec!["eth_sign", "personal_sign"]);
    }

    #[test]
    fn test_upgrade_ignores_controller_and_notifications() {
        let mut granted = SessionPermissions::new(["eip155:1"], ["eth_sign"]);
        granted.controller = Some(Controller {
            public_key: "aa".to_string(),
        });

        let mut request = SessionPermissions::new(["eip155:10"], ["eth_sign"])
            .with_notifications(["chainChanged"]);
        request.controller = Some(Controller {
            public_key: "bb".to_string(),
        });
        granted.upgrade(&request);

        assert_eq!(granted.controller.unwrap().public_key, "aa");
        assert!(granted.notifications.is_none());
    }

    #[test]
    fn test_permissions_wire_format() {
        let permissions = SessionPermissions::new(["eip155:1"], ["eth_sign"])
            .with_notifications(["accountsChanged"]);
        let json = serde_json::to_value(&permissions).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "blockchain": {"chains": ["eip155:1"]},
                "jsonrpc": {"methods": ["eth_sign"]},
                "notifications": {"types": ["accountsChanged"]}
            })
        );

        let parsed: SessionPermissions = serde_json::from_str(
            r#"{"blockchain":{"chains":[]},"jsonrpc":{"methods":["eth_sign"]}}"#,
        )
        .unwrap();
        assert!(parsed.allows_method("eth_sign"));
        assert!(!parsed.allows_notification("accountsChanged"));
    }
}
