//! Session registry
//!
//! Drives the session lifecycle over persistent storage: sequences are kept
//! in a [`SequenceStore`] keyed by topic and RPC traffic in a
//! [`JsonRpcHistory`], both on the same storage backend. Each operation is
//! atomic against its own store; operations spanning both stores are not.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{info, warn};

use super::expiry::ExpirableSequence;
use super::params::{ApproveParams, DeleteParams, Reason};
use super::sequence::{PendingStatus, SessionSequence, SettledStatus};
use super::store::SequenceStore;
use super::types::{
    AppMetadata, Proposer, RelayProtocolOptions, SessionPermissions, SessionProposal, Signal,
};
use crate::config::WalletConnectConfig;
use crate::crypto::AgreementSecret;
use crate::error::{Error, Result};
use crate::jsonrpc::JsonRpcHistory;
use crate::storage::KeyValueStorage;

/// Storage identifier for session sequences
pub const SESSION_NAMESPACE: &str = "session";
/// Storage identifier for JSON-RPC records
pub const JSONRPC_NAMESPACE: &str = "jsonrpc";

/// Owner of every session sequence and its RPC history
#[derive(Debug)]
pub struct SessionRegistry {
    config: WalletConnectConfig,
    sequences: SequenceStore<SessionSequence>,
    history: JsonRpcHistory,
}

impl SessionRegistry {
    pub fn new(storage: Arc<dyn KeyValueStorage>, config: WalletConnectConfig) -> Self {
        let sequences = SequenceStore::new(storage.clone(), config.namespace(SESSION_NAMESPACE));
        let history = JsonRpcHistory::new(storage, config.namespace(JSONRPC_NAMESPACE));
        Self {
            config,
            sequences,
            history,
        }
    }

    pub fn config(&self) -> &WalletConnectConfig {
        &self.config
    }

    /// The JSON-RPC ledger for every session in this registry
    pub fn history(&self) -> &JsonRpcHistory {
        &self.history
    }

    /// Propose a session on `pairing_topic` (dApp side)
    pub async fn propose(
        &self,
        pairing_topic: &str,
        proposer: Proposer,
        permissions: SessionPermissions,
    ) -> Result<SessionSequence> {
        let proposal = SessionProposal {
            topic: pairing_topic.to_string(),
            relay: RelayProtocolOptions::new(self.config.relay_protocol.clone()),
            proposer,
            signal: Signal::pairing(pairing_topic),
            permissions,
            ttl: self.config.session_ttl,
        };
        let sequence = SessionSequence::build_proposed(proposal);
        self.sequences.set(&sequence).await?;
        info!("Proposed session on pairing topic {}", pairing_topic);
        Ok(sequence)
    }

    /// Answer a received proposal without settling yet (wallet side)
    pub async fn respond(
        &self,
        proposal: SessionProposal,
        agreement: &AgreementSecret,
        metadata: AppMetadata,
    ) -> Result<SessionSequence> {
        let sequence = SessionSequence::build_responded(proposal, agreement, metadata);
        self.sequences.set(&sequence).await?;
        info!(
            "Responded to proposal on {}, settling on {}",
            sequence.topic,
            agreement.derived_topic()
        );
        Ok(sequence)
    }

    /// Approve a proposal on the fast path (wallet side)
    ///
    /// The session is stored pre-settled on the derived topic and any pending
    /// entry on the pairing topic is dropped. A session that would already be
    /// expired is refused and nothing is stored or dropped.
    pub async fn approve(
        &self,
        proposal: &SessionProposal,
        agreement: &AgreementSecret,
        metadata: AppMetadata,
        accounts: BTreeSet<String>,
    ) -> Result<SessionSequence> {
        let sequence = SessionSequence::build_pre_settled(proposal, agreement, metadata, accounts);
        ensure_live(&sequence)?;
        self.sequences.set(&sequence).await?;
        self.sequences.delete(&proposal.topic).await?;
        info!(
            "Pre-settled session {} from pairing topic {}",
            sequence.topic, proposal.topic
        );
        Ok(sequence)
    }

    /// Settle our own proposal once the responder's approval arrives
    pub async fn acknowledge(
        &self,
        pairing_topic: &str,
        approve: &ApproveParams,
        agreement: &AgreementSecret,
        metadata: AppMetadata,
    ) -> Result<SessionSequence> {
        let pending_sequence = self.sequences.require(pairing_topic).await?;
        let pending = pending_sequence.pending().ok_or_else(|| {
            Error::InvalidState(format!("Sequence on {} is already settled", pairing_topic))
        })?;

        let sequence =
            SessionSequence::build_acknowledged(approve, &pending.proposal, agreement, metadata)?;
        ensure_live(&sequence)?;
        self.sequences.set(&sequence).await?;
        self.sequences.delete(pairing_topic).await?;
        info!(
            "Session {} acknowledged, expires at {}",
            sequence.topic, sequence.expiry_date
        );
        Ok(sequence)
    }

    /// Mark a pre-settled session acknowledged by the peer (wallet side)
    pub async fn confirm(&self, topic: &str) -> Result<SessionSequence> {
        let sequence = self
            .sequences
            .update(topic, |sequence| {
                match sequence.settled().map(|settled| settled.status) {
                    Some(SettledStatus::PreSettled) => sequence.acknowledge(),
                    Some(SettledStatus::Acknowledged) => Err(Error::InvalidState(format!(
                        "Session {} already acknowledged",
                        topic
                    ))),
                    None => Err(Error::NotSettled(topic.to_string())),
                }
            })
            .await?;
        info!("Session {} confirmed by peer", topic);
        Ok(sequence)
    }

    /// Live sequence on `topic`
    pub async fn get(&self, topic: &str) -> Result<Option<SessionSequence>> {
        self.sequences.get(topic).await
    }

    /// Every live sequence, pending or settled
    pub async fn sequences(&self) -> Result<Vec<SessionSequence>> {
        self.sequences.get_all().await
    }

    /// Every live settled session
    pub async fn settled_sessions(&self) -> Result<Vec<SessionSequence>> {
        Ok(self
            .sequences
            .get_all()
            .await?
            .into_iter()
            .filter(|sequence| sequence.settled().is_some())
            .collect())
    }

    /// Proposals we are still waiting on
    pub async fn pending_proposals(&self) -> Result<Vec<SessionSequence>> {
        Ok(self
            .sequences
            .get_all()
            .await?
            .into_iter()
            .filter(|sequence| {
                sequence
                    .pending()
                    .map_or(false, |pending| pending.status == PendingStatus::Proposed)
            })
            .collect())
    }

    /// Grow the granted scope of a settled session
    pub async fn upgrade(
        &self,
        topic: &str,
        permissions: &SessionPermissions,
    ) -> Result<SessionSequence> {
        let sequence = self
            .sequences
            .update(topic, |sequence| sequence.upgrade(permissions))
            .await?;
        info!("Upgraded permissions of session {}", topic);
        Ok(sequence)
    }

    /// Replace the accounts exposed on a settled session
    pub async fn update(&self, topic: &str, accounts: BTreeSet<String>) -> Result<SessionSequence> {
        let count = accounts.len();
        let sequence = self
            .sequences
            .update(topic, |sequence| sequence.update(accounts))
            .await?;
        info!("Updated session {} to {} accounts", topic, count);
        Ok(sequence)
    }

    /// Delete a session and every JSON-RPC record on its topics
    ///
    /// Covers the session topic plus the outcome topic of a pending sequence
    /// or the pairing topic a settled one was negotiated on. Returns the
    /// params to send to the peer. Deleting an unknown or expired topic still
    /// purges its history.
    pub async fn delete(&self, topic: &str, reason: Reason) -> Result<DeleteParams> {
        let sequence = self.sequences.get(topic).await?;
        self.sequences.delete(topic).await?;

        let mut purged = self.history.purge(topic).await?;
        let linked = sequence
            .as_ref()
            .and_then(|s| s.outcome_topic().or_else(|| s.pairing_topic()));
        if let Some(linked_topic) = linked {
            purged += self.history.purge(linked_topic).await?;
        }

        match sequence {
            Some(_) => info!(
                "Deleted session {} ({} records purged): {}",
                topic, purged, reason.message
            ),
            None => warn!("Deleted unknown session {} ({} records purged)", topic, purged),
        }
        Ok(DeleteParams { reason })
    }
}

fn ensure_live(sequence: &SessionSequence) -> Result<()> {
    if sequence.is_expired() {
        warn!(
            "Refusing session {} already expired at {}",
            sequence.topic, sequence.expiry_date
        );
        return Err(Error::SessionExpired(sequence.topic.clone()));
    }
    Ok(())
}
