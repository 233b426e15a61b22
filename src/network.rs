//! The energy network: nodes, directed flows between them and the indices used to look them up.
//!
//! A network is assembled once per run (nodes added one by one, each declaring its attached
//! flows), then treated as read-only by the model builder.
use crate::error::NetworkError;
use crate::id::NodeID;
use indexmap::IndexMap;

/// A directed edge descriptor carrying per-timestep bounds and a scaling constant.
///
/// A flow with neither `fix` nor an explicit `max` profile defaults to `[0, +inf)`. The
/// `nominal_value` scales both the fixed profile and the bound window.
#[derive(PartialEq, Clone, Debug)]
pub struct Flow {
    /// Scale factor applied to the fixed profile or bound window (must be >= 0)
    pub nominal_value: f64,
    /// Per-timestep values pinning the flow exactly (after scaling by `nominal_value`)
    pub fix: Option<Vec<f64>>,
    /// Per-timestep lower bounds (defaults to 0 everywhere)
    pub min: Option<Vec<f64>>,
    /// Per-timestep upper bounds (defaults to unbounded)
    pub max: Option<Vec<f64>>,
    /// Linear cost coefficient in the objective (default 0, i.e. feasibility only)
    pub cost: f64,
}

impl Default for Flow {
    fn default() -> Self {
        Self {
            nominal_value: 1.0,
            fix: None,
            min: None,
            max: None,
            cost: 0.0,
        }
    }
}

impl Flow {
    /// An unbounded-above, non-negative flow with no cost
    pub fn new() -> Self {
        Self::default()
    }

    /// A flow pinned to the given per-timestep profile, scaled by `nominal_value`
    pub fn fixed(fix: Vec<f64>, nominal_value: f64) -> Self {
        Self {
            nominal_value,
            fix: Some(fix),
            ..Self::default()
        }
    }

    /// A flow bounded above by the given per-timestep profile, scaled by `nominal_value`
    pub fn bounded(max: Vec<f64>, nominal_value: f64) -> Self {
        Self {
            nominal_value,
            max: Some(max),
            ..Self::default()
        }
    }
}

/// A node in the energy network.
///
/// Terminal and converting nodes declare their attached flows; the network registers each
/// declared flow exactly once, keyed by its `(source, target)` pair.
#[derive(PartialEq, Clone, Debug)]
pub enum Node {
    /// A pure balancing point: inflows equal outflows at every timestep
    Bus,
    /// A terminal node producing into a single target node
    Source {
        /// The node the produced commodity flows into
        target: NodeID,
        /// The attached flow
        flow: Flow,
    },
    /// A terminal node consuming from a single source node
    Sink {
        /// The node the consumed commodity flows out of
        source: NodeID,
        /// The attached flow
        flow: Flow,
    },
    /// A node converting input flows into output flow(s) via fixed linear ratios.
    ///
    /// The first declared output acts as the reference: at every timestep, each input and each
    /// additional output must satisfy `x / factor == x_ref / factor_ref`, with a missing
    /// conversion factor defaulting to 1. An output's own factor never forces itself.
    Transformer {
        /// Input flows, keyed by the node they are drawn from
        inputs: Vec<(NodeID, Flow)>,
        /// Output flows, keyed by the node they feed into
        outputs: Vec<(NodeID, Flow)>,
        /// Per-neighbour conversion factors relating each flow's rate to the reference output
        conversion_factors: IndexMap<NodeID, f64>,
    },
}

/// The set of nodes and flows making up one model run's network.
///
/// Node labels are unique; each `(source, target)` flow appears exactly once no matter which
/// endpoint declared it. Flows are indexed by source and by target for constraint generation.
#[derive(Default, Clone, Debug)]
pub struct EnergyNetwork {
    nodes: IndexMap<NodeID, Node>,
    flows: IndexMap<(NodeID, NodeID), Flow>,
    flows_by_source: IndexMap<NodeID, Vec<(NodeID, NodeID)>>,
    flows_by_target: IndexMap<NodeID, Vec<(NodeID, NodeID)>>,
}

impl EnergyNetwork {
    /// Create an empty network
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node to the network, registering the flows it declares.
    ///
    /// Fails with [`NetworkError::DuplicateLabel`] if a node with the same label already exists
    /// and with [`NetworkError::DuplicateFlow`] if one of its flows was already declared from the
    /// other side. On failure the network is left unchanged.
    ///
    /// Flow endpoints may reference labels not yet added; they are checked when the model is
    /// built (see [`EnergyNetwork::validate`]).
    pub fn add_node(&mut self, label: &str, node: Node) -> Result<(), NetworkError> {
        let label = NodeID::new(label);
        if self.nodes.contains_key(&label) {
            return Err(NetworkError::DuplicateLabel(label.to_string()));
        }

        // Collect the declared flows first so a duplicate leaves the network untouched
        let mut declared = Vec::new();
        match &node {
            Node::Bus => {}
            Node::Source { target, flow } => {
                declared.push(((label.clone(), target.clone()), flow.clone()));
            }
            Node::Sink { source, flow } => {
                declared.push(((source.clone(), label.clone()), flow.clone()));
            }
            Node::Transformer {
                inputs, outputs, ..
            } => {
                for (source, flow) in inputs {
                    declared.push(((source.clone(), label.clone()), flow.clone()));
                }
                for (target, flow) in outputs {
                    declared.push(((label.clone(), target.clone()), flow.clone()));
                }
            }
        }
        for (key, _) in &declared {
            if self.flows.contains_key(key) {
                return Err(NetworkError::DuplicateFlow(
                    key.0.to_string(),
                    key.1.to_string(),
                ));
            }
        }

        for (key, flow) in declared {
            self.flows_by_source
                .entry(key.0.clone())
                .or_default()
                .push(key.clone());
            self.flows_by_target
                .entry(key.1.clone())
                .or_default()
                .push(key.clone());
            self.flows.insert(key, flow);
        }
        self.nodes.insert(label, node);

        Ok(())
    }

    /// Check that every flow's endpoints exist in the node set.
    ///
    /// The model builder calls this before creating any variables, so a dangling label fails the
    /// build rather than the solve.
    pub fn validate(&self) -> Result<(), NetworkError> {
        for (source, target) in self.flows.keys() {
            for label in [source, target] {
                if !self.nodes.contains_key(label) {
                    return Err(NetworkError::UnknownNode(label.to_string()));
                }
            }
        }

        Ok(())
    }

    /// The number of nodes in the network
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Iterate over all nodes with their labels
    pub fn iter_nodes(&self) -> impl Iterator<Item = (&NodeID, &Node)> {
        self.nodes.iter()
    }

    /// Iterate over all flows with their `(source, target)` keys, in declaration order
    pub fn iter_flows(&self) -> impl Iterator<Item = (&(NodeID, NodeID), &Flow)> {
        self.flows.iter()
    }

    /// Look up a flow by its endpoints
    pub fn get_flow(&self, source: &NodeID, target: &NodeID) -> Option<&Flow> {
        self.flows.get(&(source.clone(), target.clone()))
    }

    /// Iterate over the flows leaving the given node
    pub fn flows_from(&self, label: &NodeID) -> impl Iterator<Item = &(NodeID, NodeID)> {
        self.flows_by_source
            .get(label)
            .into_iter()
            .flat_map(|keys| keys.iter())
    }

    /// Iterate over the flows entering the given node
    pub fn flows_into(&self, label: &NodeID) -> impl Iterator<Item = &(NodeID, NodeID)> {
        self.flows_by_target
            .get(label)
            .into_iter()
            .flat_map(|keys| keys.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use itertools::Itertools;

    fn network_with_bus() -> EnergyNetwork {
        let mut network = EnergyNetwork::new();
        network.add_node("bel", Node::Bus).unwrap();
        network
    }

    #[test]
    fn test_add_node_duplicate_label() {
        let mut network = network_with_bus();
        let result = network.add_node(
            "bel",
            Node::Sink {
                source: "other".into(),
                flow: Flow::new(),
            },
        );
        assert_eq!(result, Err(NetworkError::DuplicateLabel("bel".into())));

        // No partial insert: the node set and flow set are unchanged
        assert_eq!(network.num_nodes(), 1);
        assert_eq!(network.iter_flows().count(), 0);
    }

    #[test]
    fn test_add_node_duplicate_flow() {
        let mut network = network_with_bus();

        // The sink declares the (conv, demand) flow from the consuming side...
        network
            .add_node(
                "demand",
                Node::Sink {
                    source: "conv".into(),
                    flow: Flow::new(),
                },
            )
            .unwrap();

        // ...so a transformer declaring it again from the producing side is rejected
        let result = network.add_node(
            "conv",
            Node::Transformer {
                inputs: vec![("bel".into(), Flow::new())],
                outputs: vec![("demand".into(), Flow::new())],
                conversion_factors: IndexMap::new(),
            },
        );
        assert_eq!(
            result,
            Err(NetworkError::DuplicateFlow("conv".into(), "demand".into()))
        );

        // No partial insert: the transformer's other flow was not registered either
        assert_eq!(network.num_nodes(), 2);
        assert_eq!(network.iter_flows().count(), 1);
    }

    #[test]
    fn test_flows_registered_once_and_grouped() {
        let mut network = network_with_bus();
        network.add_node("com_1", Node::Bus).unwrap();
        network
            .add_node(
                "source_1",
                Node::Source {
                    target: "com_1".into(),
                    flow: Flow::fixed(vec![1.0], 1.0),
                },
            )
            .unwrap();
        network
            .add_node(
                "conversion",
                Node::Transformer {
                    inputs: vec![("com_1".into(), Flow::new())],
                    outputs: vec![("bel".into(), Flow::new())],
                    conversion_factors: IndexMap::from([("com_1".into(), 0.1)]),
                },
            )
            .unwrap();

        // Three flows in total, each appearing exactly once
        assert_eq!(network.iter_flows().count(), 3);
        let keys = network.iter_flows().map(|(key, _)| key).collect_vec();
        assert!(keys.iter().all_unique());

        // Grouped by source and by target
        let from_conversion = network.flows_from(&"conversion".into()).collect_vec();
        assert_eq!(from_conversion, [&("conversion".into(), "bel".into())]);
        let into_com_1 = network.flows_into(&"com_1".into()).collect_vec();
        assert_eq!(into_com_1, [&("source_1".into(), "com_1".into())]);
        let into_conversion = network.flows_into(&"conversion".into()).collect_vec();
        assert_eq!(into_conversion, [&("com_1".into(), "conversion".into())]);
    }

    #[test]
    fn test_validate_unknown_node() {
        let mut network = network_with_bus();
        network
            .add_node(
                "sink",
                Node::Sink {
                    source: "nowhere".into(),
                    flow: Flow::new(),
                },
            )
            .unwrap();

        assert_eq!(
            network.validate(),
            Err(NetworkError::UnknownNode("nowhere".into()))
        );
    }

    #[test]
    fn test_validate_ok() {
        let mut network = network_with_bus();
        network
            .add_node(
                "sink",
                Node::Sink {
                    source: "bel".into(),
                    flow: Flow::new(),
                },
            )
            .unwrap();
        assert_eq!(network.validate(), Ok(()));
    }
}
