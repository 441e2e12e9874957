use alloy_primitives::Address;
use std::collections::{BTreeSet, HashSet};

use crate::error::QbftError;
use crate::messagewrappers::SignedMessage;
use crate::types::{Height, OperatorId, Round};

/// A committee member: its operator id and the address of its signing key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Node {
    pub id: OperatorId,
    pub address: Address,
}

impl Node {
    pub fn new(id: OperatorId, address: Address) -> Self {
        Self { id, address }
    }
}

/// The fixed, ordered set of nodes running consensus for an instance.
///
/// Nodes are kept in ascending operator id order, which is also the order used
/// for round-robin proposer selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Committee {
    nodes: Vec<Node>,
}

impl Committee {
    pub fn new(mut nodes: Vec<Node>) -> Result<Self, QbftError> {
        if nodes.is_empty() {
            return Err(QbftError::InvalidCommittee("committee must not be empty".into()));
        }
        nodes.sort_by_key(|node| node.id);

        let mut seen_addresses = HashSet::new();
        for pair in nodes.windows(2) {
            if pair[0].id == pair[1].id {
                return Err(QbftError::InvalidCommittee(format!("duplicate operator id {}", pair[0].id)));
            }
        }
        for node in &nodes {
            if !seen_addresses.insert(node.address) {
                return Err(QbftError::InvalidCommittee(format!("duplicate address {:?}", node.address)));
            }
        }
        Ok(Self { nodes })
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn size(&self) -> usize {
        self.nodes.len()
    }

    pub fn node(&self, id: OperatorId) -> Option<&Node> {
        self.nodes
            .binary_search_by_key(&id, |node| node.id)
            .ok()
            .map(|idx| &self.nodes[idx])
    }

    pub fn contains(&self, id: OperatorId) -> bool {
        self.node(id).is_some()
    }

    // N = 3f + 1 is assumed; for other sizes f rounds down.
    pub fn fault_tolerance(&self) -> usize {
        (self.size() - 1) / 3
    }

    /// ceil(2N/3), which is 2f+1 when N = 3f+1.
    pub fn quorum_size(&self) -> usize {
        (2 * self.size() + 2) / 3
    }

    /// ceil(N/3), which is f+1 when N = 3f+1.
    pub fn partial_quorum_size(&self) -> usize {
        (self.size() + 2) / 3
    }

    /// True iff the distinct signers across `msgs` reach a quorum.
    pub fn has_quorum<'a, I>(&self, msgs: I) -> bool
    where
        I: IntoIterator<Item = &'a SignedMessage>,
    {
        distinct_signers(msgs) >= self.quorum_size()
    }

    /// True iff the distinct signers across `msgs` reach f+1.
    pub fn has_partial_quorum<'a, I>(&self, msgs: I) -> bool
    where
        I: IntoIterator<Item = &'a SignedMessage>,
    {
        distinct_signers(msgs) >= self.partial_quorum_size()
    }

    /// Round-robin leader: `nodes[(height + round) % N]`.
    pub fn proposer(&self, height: Height, round: Round) -> OperatorId {
        let n = self.size() as u64;
        let index = height.wrapping_add(round) % n;
        self.nodes[index as usize].id
    }
}

fn distinct_signers<'a, I>(msgs: I) -> usize
where
    I: IntoIterator<Item = &'a SignedMessage>,
{
    msgs.into_iter()
        .flat_map(|msg| msg.signers().iter().copied())
        .collect::<BTreeSet<OperatorId>>()
        .len()
}
