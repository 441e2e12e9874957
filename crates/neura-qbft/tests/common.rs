#![allow(dead_code)]

use alloy_primitives::Bytes;
use neura_qbft::testing::{TestCommittee, TestNode};
use neura_qbft::types::OperatorId;
use neura_qbft::Controller;

/// A set of online nodes whose mock networks are pumped into each other.
pub struct Cluster {
    pub tc: TestCommittee,
    pub nodes: Vec<TestNode>,
    pub controllers: Vec<Controller>,
}

impl Cluster {
    /// Committee of `size` operators with only `online` ones running.
    pub fn new(size: usize, online: &[OperatorId]) -> Self {
        let tc = TestCommittee::new(size);
        let nodes: Vec<TestNode> = online.iter().map(|id| TestNode::new(&tc, *id)).collect();
        let controllers = nodes
            .iter()
            .map(|node| Controller::new(node.identifier.clone(), node.config.clone()).unwrap())
            .collect();
        Self { tc, nodes, controllers }
    }

    pub fn node(&self, id: OperatorId) -> (&TestNode, &Controller) {
        let index = self.nodes.iter().position(|node| node.id == id).unwrap();
        (&self.nodes[index], &self.controllers[index])
    }

    pub fn start_all(&self, value: &[u8]) {
        for controller in &self.controllers {
            controller.start_new_instance(Bytes::copy_from_slice(value)).unwrap();
        }
    }

    /// Delivers broadcasts to every online node, the sender included, until
    /// the networks go quiet. Returns the number of delivered messages.
    pub fn pump(&self) -> usize {
        let mut delivered = 0;
        for _ in 0..64 {
            let outbound: Vec<_> = self.nodes.iter().flat_map(|node| node.network.drain()).collect();
            if outbound.is_empty() {
                return delivered;
            }
            for msg in &outbound {
                for controller in &self.controllers {
                    let _ = controller.process_msg(msg);
                }
            }
            delivered += outbound.len();
        }
        panic!("cluster did not go quiet");
    }
}
