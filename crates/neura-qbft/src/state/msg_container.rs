use std::collections::BTreeMap;

use crate::messagewrappers::SignedMessage;
use crate::types::{Height, OperatorId, Round};

/// Round-indexed store of signed messages of one type for one instance.
///
/// Entries are unique by full structural equality, so an identical resend is a
/// no-op while a conflicting message from the same signer is kept alongside.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MsgContainer {
    height: Height,
    msgs: BTreeMap<Round, Vec<SignedMessage>>,
}

impl MsgContainer {
    pub fn for_height(height: Height) -> Self {
        Self { height, msgs: BTreeMap::new() }
    }

    pub fn height(&self) -> Height {
        self.height
    }

    /// Returns true if the message was not stored yet.
    pub fn add_if_doesnt_exist(&mut self, msg: SignedMessage) -> bool {
        let round_msgs = self.msgs.entry(msg.round()).or_default();
        if round_msgs.contains(&msg) {
            return false;
        }
        round_msgs.push(msg);
        true
    }

    pub fn contains(&self, msg: &SignedMessage) -> bool {
        self.msgs.get(&msg.round()).is_some_and(|round_msgs| round_msgs.contains(msg))
    }

    pub fn messages_for_round(&self, round: Round) -> &[SignedMessage] {
        self.msgs.get(&round).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Messages for `round`, or nothing when `height` is not this container's height.
    pub fn messages_for_height_and_round(&self, height: Height, round: Round) -> Vec<SignedMessage> {
        if height != self.height {
            return Vec::new();
        }
        self.messages_for_round(round).to_vec()
    }

    /// All messages stored for rounds strictly above `round`, lowest round first.
    pub fn rounds_above(&self, round: Round) -> impl Iterator<Item = (Round, &[SignedMessage])> {
        self.msgs
            .range(round.saturating_add(1)..)
            .map(|(round, msgs)| (*round, msgs.as_slice()))
    }

    /// Every stored message, ascending round then insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &SignedMessage> {
        self.msgs.values().flatten()
    }

    pub fn has_signer_in_round(&self, round: Round, signer: OperatorId) -> bool {
        self.messages_for_round(round).iter().any(|msg| msg.signers().contains(&signer))
    }

    /// Highest round above `round` holding a message signed by `signer`.
    pub fn highest_round_for_signer_above(&self, round: Round, signer: OperatorId) -> Option<Round> {
        self.rounds_above(round)
            .filter(|(_, msgs)| msgs.iter().any(|msg| msg.signers().contains(&signer)))
            .map(|(round, _)| round)
            .last()
    }

    /// Drops every message signed by `signer` in rounds above `round`.
    pub fn remove_signer_above(&mut self, round: Round, signer: OperatorId) {
        for (_, msgs) in self.msgs.range_mut(round.saturating_add(1)..) {
            msgs.retain(|msg| !msg.signers().contains(&signer));
        }
        self.msgs.retain(|_, msgs| !msgs.is_empty());
    }

    pub fn len(&self) -> usize {
        self.msgs.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.msgs.values().all(Vec::is_empty)
    }
}
