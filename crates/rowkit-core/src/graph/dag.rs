use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;

use crate::scenario::ScenarioModel;

/// A directed graph of scenario relations between populated tables.
/// Edges point from dependent table to referenced table (child → parent).
pub struct RelationGraph {
    pub graph: DiGraph<String, RelationEdge>,
    pub node_indices: HashMap<String, NodeIndex>,
}

/// One relation column linking a child table to its parent.
#[derive(Debug, Clone)]
pub struct RelationEdge {
    pub column: String,
    pub parent_key: String,
}

impl RelationGraph {
    /// Build the graph over `tables` (typically the tables a run actually
    /// populated, in insertion order).
    ///
    /// Nodes are added in reverse of the given order so that unrelated tables
    /// sort last-inserted first. Relations pointing outside `tables`, malformed
    /// descriptors, and self-references produce no edge.
    pub fn from_scenario(scenario: &ScenarioModel, tables: &[String]) -> Self {
        let mut graph = DiGraph::new();
        let mut node_indices = HashMap::new();

        for table_name in tables.iter().rev() {
            if node_indices.contains_key(table_name) {
                continue;
            }
            let idx = graph.add_node(table_name.clone());
            node_indices.insert(table_name.clone(), idx);
        }

        for table_name in tables {
            let Some(scenario_table) = scenario.table(table_name) else {
                continue;
            };
            for column in scenario_table.relations.keys() {
                let Some(relation) = scenario_table.relation(column) else {
                    continue;
                };
                if relation.parent_table == *table_name {
                    continue;
                }
                if let (Some(&from_idx), Some(&to_idx)) = (
                    node_indices.get(table_name),
                    node_indices.get(&relation.parent_table),
                ) {
                    graph.add_edge(
                        from_idx,
                        to_idx,
                        RelationEdge {
                            column: column.clone(),
                            parent_key: relation.parent_key,
                        },
                    );
                }
            }
        }

        Self {
            graph,
            node_indices,
        }
    }

    pub fn table_name(&self, idx: NodeIndex) -> &str {
        &self.graph[idx]
    }

    pub fn node_index(&self, table_name: &str) -> Option<NodeIndex> {
        self.node_indices.get(table_name).copied()
    }

    pub fn table_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }
}
