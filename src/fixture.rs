//! Fixtures for tests
use crate::network::{EnergyNetwork, Flow, Node};
use crate::time_index::TimeIndex;
use chrono::NaiveDateTime;
use indexmap::IndexMap;

/// Assert that an error with the given message occurs
macro_rules! assert_error {
    ($result:expr, $msg:expr) => {
        assert_eq!(
            $result.unwrap_err().chain().next().unwrap().to_string(),
            $msg
        );
    };
}
pub(crate) use assert_error;

/// An hourly time index starting at the beginning of 2023
pub fn hourly_index(periods: usize) -> TimeIndex {
    let start = NaiveDateTime::parse_from_str("2023-01-01T00:00:00", "%Y-%m-%dT%H:%M:%S").unwrap();
    TimeIndex::hourly(start, periods).unwrap()
}

/// The three-commodity network from the bundled demo model: three fixed sources feeding
/// commodity buses, a transformer with conversion factors 0.1/0.2/0.3 into a power bus, and an
/// unbounded sink.
///
/// The network has eight flows: three from the sources, three into the transformer, one out of
/// it and one into the sink.
pub fn three_source_network(com_1: &[f64], com_2: &[f64], com_3: &[f64]) -> EnergyNetwork {
    let mut network = EnergyNetwork::new();
    for label in ["bel", "com_1", "com_2", "com_3"] {
        network.add_node(label, Node::Bus).unwrap();
    }

    for (label, target, fix) in [
        ("source_1", "com_1", com_1),
        ("source_2", "com_2", com_2),
        ("source_3", "com_3", com_3),
    ] {
        network
            .add_node(
                label,
                Node::Source {
                    target: target.into(),
                    flow: Flow::fixed(fix.to_vec(), 1.0),
                },
            )
            .unwrap();
    }

    network
        .add_node(
            "sink_el",
            Node::Sink {
                source: "bel".into(),
                flow: Flow::new(),
            },
        )
        .unwrap();

    network
        .add_node(
            "conversion",
            Node::Transformer {
                inputs: vec![
                    ("com_1".into(), Flow::new()),
                    ("com_2".into(), Flow::new()),
                    ("com_3".into(), Flow::new()),
                ],
                outputs: vec![("bel".into(), Flow::new())],
                conversion_factors: IndexMap::from([
                    ("com_1".into(), 0.1),
                    ("com_2".into(), 0.2),
                    ("com_3".into(), 0.3),
                ]),
            },
        )
        .unwrap();

    network
}
