//! Session sequence: the protocol state machine
//!
//! A sequence is either pending (a proposal that has not settled yet) or
//! settled (a live session with granted scope). The two phases are variants
//! of [`SessionPhase`], so a sequence can never be both or neither.
//!
//! ```text
//! (none) --propose--> Pending/Proposed --respond--> Pending/Responded
//! Pending/*         --fast approve--> Settled/PreSettled --ack--> Settled/Acknowledged
//! Pending/Responded --peer approve--> Settled/Acknowledged
//! ```
//!
//! Settling moves the sequence from the pairing topic to the topic derived
//! from the shared secret.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::expiry::{
    expiry_from_now, expiry_from_timestamp, ExpirableSequence, TTL_PENDING, TTL_PROPOSED,
};
use super::params::{ApproveParams, PayloadParams};
use super::types::{
    AppMetadata, Controller, Participant, RelayProtocolOptions, SessionPermissions,
    SessionProposal, SessionState,
};
use crate::crypto::AgreementSecret;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PendingStatus {
    /// Proposal created, no answer yet
    Proposed,
    /// Responder has answered; the settled topic is known but not active
    Responded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SettledStatus {
    /// Approved locally, peer acknowledgement outstanding
    PreSettled,
    /// Both sides agree the session is live
    Acknowledged,
}

/// Payload of a pending sequence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pending {
    pub status: PendingStatus,
    pub proposal: SessionProposal,
    /// Settled topic derived once the responder answers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome_topic: Option<String>,
}

/// Payload of a settled sequence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settled {
    pub peer: Participant,
    pub permissions: SessionPermissions,
    pub state: SessionState,
    pub status: SettledStatus,
    /// Pairing topic the handshake ran on
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pairing_topic: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionPhase {
    Pending(Pending),
    Settled(Settled),
}

/// A session between this wallet and a peer, keyed by topic
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSequence {
    pub topic: String,
    pub relay: RelayProtocolOptions,
    pub self_participant: Participant,
    pub expiry_date: DateTime<Utc>,
    pub phase: SessionPhase,
}

impl SessionSequence {
    /// A locally created proposal, waiting on the pairing topic
    pub fn build_proposed(proposal: SessionProposal) -> Self {
        Self {
            topic: proposal.topic.clone(),
            relay: proposal.relay.clone(),
            self_participant: Participant::new(
                proposal.proposer.public_key.clone(),
                proposal.proposer.metadata.clone(),
            ),
            expiry_date: expiry_from_now(TTL_PROPOSED),
            phase: SessionPhase::Pending(Pending {
                status: PendingStatus::Proposed,
                proposal,
                outcome_topic: None,
            }),
        }
    }

    /// The responder's view after answering a proposal
    ///
    /// The topic stays on the pairing channel; the settled topic is only
    /// recorded as the outcome.
    pub fn build_responded(
        proposal: SessionProposal,
        agreement: &AgreementSecret,
        metadata: AppMetadata,
    ) -> Self {
        Self {
            topic: proposal.topic.clone(),
            relay: proposal.relay.clone(),
            self_participant: Participant::new(agreement.public_key(), metadata),
            expiry_date: expiry_from_now(TTL_PENDING),
            phase: SessionPhase::Pending(Pending {
                status: PendingStatus::Responded,
                proposal,
                outcome_topic: Some(agreement.derived_topic()),
            }),
        }
    }

    /// The responder's fast path: settle immediately, acknowledgement pending
    pub fn build_pre_settled(
        proposal: &SessionProposal,
        agreement: &AgreementSecret,
        metadata: AppMetadata,
        accounts: BTreeSet<String>,
    ) -> Self {
        let controller_key = if proposal.proposer.controller {
            proposal.proposer.public_key.clone()
        } else {
            agreement.public_key().to_string()
        };

        Self {
            topic: agreement.derived_topic(),
            relay: proposal.relay.clone(),
            self_participant: Participant::new(agreement.public_key(), metadata),
            expiry_date: expiry_from_now(proposal.ttl),
            phase: SessionPhase::Settled(Settled {
                peer: Participant::new(
                    proposal.proposer.public_key.clone(),
                    proposal.proposer.metadata.clone(),
                ),
                permissions: granted_permissions(&proposal.permissions, controller_key),
                state: SessionState { accounts },
                status: SettledStatus::PreSettled,
                pairing_topic: Some(proposal.topic.clone()),
            }),
        }
    }

    /// The proposer's view once the responder's approval arrives
    ///
    /// Expiry is the absolute instant carried by the approval.
    pub fn build_acknowledged(
        approve: &ApproveParams,
        proposal: &SessionProposal,
        agreement: &AgreementSecret,
        metadata: AppMetadata,
    ) -> Result<Self> {
        let controller_key = if proposal.proposer.controller {
            proposal.proposer.public_key.clone()
        } else {
            approve.responder.public_key.clone()
        };

        Ok(Self {
            topic: agreement.derived_topic(),
            relay: approve.relay.clone(),
            self_participant: Participant::new(proposal.proposer.public_key.clone(), metadata),
            expiry_date: expiry_from_timestamp(approve.expiry)?,
            phase: SessionPhase::Settled(Settled {
                peer: Participant::new(
                    approve.responder.public_key.clone(),
                    approve.responder.metadata.clone(),
                ),
                permissions: granted_permissions(&proposal.permissions, controller_key),
                state: approve.state.clone(),
                status: SettledStatus::Acknowledged,
                pairing_topic: Some(proposal.topic.clone()),
            }),
        })
    }

    pub fn pending(&self) -> Option<&Pending> {
        match &self.phase {
            SessionPhase::Pending(pending) => Some(pending),
            SessionPhase::Settled(_) => None,
        }
    }

    pub fn settled(&self) -> Option<&Settled> {
        match &self.phase {
            SessionPhase::Settled(settled) => Some(settled),
            SessionPhase::Pending(_) => None,
        }
    }

    /// Settled and acknowledged by both sides; only then do permissions apply
    pub fn is_settled(&self) -> bool {
        matches!(
            self.settled(),
            Some(Settled {
                status: SettledStatus::Acknowledged,
                ..
            })
        )
    }

    /// Topic the session will move to once settled
    pub fn outcome_topic(&self) -> Option<&str> {
        self.pending()?.outcome_topic.as_deref()
    }

    /// Pairing topic a settled session was negotiated on
    pub fn pairing_topic(&self) -> Option<&str> {
        self.settled()?.pairing_topic.as_deref()
    }

    pub fn peer(&self) -> Option<&Participant> {
        self.settled().map(|settled| &settled.peer)
    }

    pub fn permissions(&self) -> Option<&SessionPermissions> {
        self.settled().map(|settled| &settled.permissions)
    }

    pub fn accounts(&self) -> Option<&BTreeSet<String>> {
        self.settled().map(|settled| &settled.state.accounts)
    }

    /// Granted permissions, but only for an acknowledged session
    fn live_permissions(&self) -> Option<&SessionPermissions> {
        if self.is_settled() {
            self.permissions()
        } else {
            None
        }
    }

    pub fn has_permission_for_chain(&self, chain_id: &str) -> bool {
        self.live_permissions()
            .map_or(false, |permissions| permissions.allows_chain(chain_id))
    }

    pub fn has_permission_for_method(&self, method: &str) -> bool {
        self.live_permissions()
            .map_or(false, |permissions| permissions.allows_method(method))
    }

    pub fn has_permission_for_notification(&self, notification_type: &str) -> bool {
        self.live_permissions()
            .map_or(false, |permissions| permissions.allows_notification(notification_type))
    }

    /// Check an incoming payload against the granted scope
    pub fn authorize(&self, payload: &PayloadParams) -> Result<()> {
        let method = &payload.request.method;
        if !self.has_permission_for_method(method) {
            return Err(Error::PermissionDenied(format!(
                "method {} not granted on {}",
                method, self.topic
            )));
        }
        if let Some(chain_id) = &payload.chain_id {
            if !self.has_permission_for_chain(chain_id) {
                return Err(Error::PermissionDenied(format!(
                    "chain {} not granted on {}",
                    chain_id, self.topic
                )));
            }
        }
        Ok(())
    }

    /// Whether we control the session
    ///
    /// Unlike [`Self::peer_is_controller`] this does not require the session
    /// to be acknowledged: a pre-settled session we control already counts.
    pub fn self_is_controller(&self) -> bool {
        self.permissions()
            .and_then(|permissions| permissions.controller.as_ref())
            .map_or(false, |controller| {
                controller.public_key == self.self_participant.public_key
            })
    }

    /// Whether the peer controls the session; requires acknowledgement
    pub fn peer_is_controller(&self) -> bool {
        if !self.is_settled() {
            return false;
        }
        match (self.peer(), self.permissions().and_then(|p| p.controller.as_ref())) {
            (Some(peer), Some(controller)) => peer.public_key == controller.public_key,
            _ => false,
        }
    }

    /// Grow the granted chains and methods
    pub fn upgrade(&mut self, permissions: &SessionPermissions) -> Result<()> {
        let settled = self.settled_mut()?;
        settled.permissions.upgrade(permissions);
        Ok(())
    }

    /// Replace the exposed accounts
    pub fn update(&mut self, accounts: BTreeSet<String>) -> Result<()> {
        let settled = self.settled_mut()?;
        settled.state.accounts = accounts;
        Ok(())
    }

    /// Mark a pre-settled session as acknowledged by the peer
    pub fn acknowledge(&mut self) -> Result<()> {
        let settled = self.settled_mut()?;
        settled.status = SettledStatus::Acknowledged;
        Ok(())
    }

    fn settled_mut(&mut self) -> Result<&mut Settled> {
        match &mut self.phase {
            SessionPhase::Settled(settled) => Ok(settled),
            SessionPhase::Pending(_) => Err(Error::NotSettled(self.topic.clone())),
        }
    }
}

impl ExpirableSequence for SessionSequence {
    fn topic(&self) -> &str {
        &self.topic
    }

    fn expiry_date(&self) -> DateTime<Utc> {
        self.expiry_date
    }
}

fn granted_permissions(
    requested: &SessionPermissions,
    controller_key: String,
) -> SessionPermissions {
    SessionPermissions {
        blockchain: requested.blockchain.clone(),
        jsonrpc: requested.jsonrpc.clone(),
        notifications: requested.notifications.clone(),
        controller: Some(Controller {
            public_key: controller_key,
        }),
    }
}
