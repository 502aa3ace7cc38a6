use petgraph::algo::toposort;
use tracing::warn;

use crate::graph::dag::RelationGraph;
use crate::scenario::ScenarioModel;

/// Order in which a run's tables should be emptied: every child before the
/// parents it references.
///
/// Edges go child → parent, so petgraph's topological order already lists
/// children first. When the relations form a cycle the result falls back to
/// reverse insertion order; at least one side of such a cycle was inserted
/// while its parent pool was still empty, so its references are NULL.
pub fn deletion_order(scenario: &ScenarioModel, inserted: &[String]) -> Vec<String> {
    let graph = RelationGraph::from_scenario(scenario, inserted);

    match toposort(&graph.graph, None) {
        Ok(sorted) => sorted
            .iter()
            .map(|&idx| graph.table_name(idx).to_string())
            .collect(),
        Err(cycle) => {
            warn!(
                "Relation cycle through '{}'; deleting in reverse insertion order",
                graph.table_name(cycle.node_id())
            );
            let mut order: Vec<String> = Vec::with_capacity(inserted.len());
            for table in inserted.iter().rev() {
                if !order.contains(table) {
                    order.push(table.clone());
                }
            }
            order
        }
    }
}
