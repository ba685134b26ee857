//! Back-alteration ordering as a graph problem.
//!
//! Each flattened path is a node. An edge `producer -> consumer` says
//! "`producer` must be evaluated before `consumer`, because `producer`'s
//! effect would otherwise retroactively alter a literal `consumer`'s
//! conditions already reference." A valid evaluation order is any
//! topological sort of this graph; no such order exists exactly when the
//! graph has a cycle (genuinely mutually dependent paths, as opposed to
//! the circular-but-harmless shape [`crate::verify::must_precede`]
//! excepts).
use crate::error::FlagformError;
use crate::flag::FlagArena;
use crate::flatten::Path;
use crate::verify::must_precede;
use petgraph::algo::toposort;
use petgraph::dot::{Config, Dot};
use petgraph::graph::DiGraph;

/// Build the back-alteration graph: one node per path index, an edge for
/// every must-precede relationship between distinct paths, checked over
/// every ordered pair rather than just the pairs in source order — a
/// reordering can introduce a dependency the written order never exposed,
/// and that's exactly what this graph exists to discover.
pub fn build_graph(arena: &FlagArena, paths: &[Path]) -> DiGraph<usize, ()> {
    let mut graph = DiGraph::new();
    let nodes: Vec<_> = (0..paths.len()).map(|i| graph.add_node(i)).collect();
    for (i, node_i) in nodes.iter().enumerate() {
        for (j, node_j) in nodes.iter().enumerate() {
            if i != j && must_precede(arena, &paths[i], &paths[j]) {
                graph.add_edge(*node_i, *node_j, ());
            }
        }
    }
    graph
}

/// Topologically sort the back-alteration graph, returning path indices in
/// an order that respects every must-precede edge.
pub fn topo_sort(graph: &DiGraph<usize, ()>) -> Result<Vec<usize>, FlagformError> {
    toposort(graph, None)
        .map(|order| order.into_iter().map(|n| graph[n]).collect())
        .map_err(|_| FlagformError::Cyclic)
}

/// Render the graph as Graphviz DOT, labeling nodes with their path text
/// and adding a red bidirectional edge between any two nodes whose effects
/// are the same flag negated (a visual flag for likely contention), as the
/// original prototype's plain-text graph printer did.
pub fn to_dot(arena: &FlagArena, paths: &[Path]) -> String {
    let graph = build_graph(arena, paths);
    let labeled = graph.map(|_, &idx| paths[idx].display(arena), |_, _| "");
    let base = format!(
        "{:?}",
        Dot::with_config(&labeled, &[Config::EdgeNoLabel])
    );

    let mut extra_edges = String::new();
    for i in 0..paths.len() {
        for j in (i + 1)..paths.len() {
            let ei = arena.get(paths[i].effect);
            let ej = arena.get(paths[j].effect);
            if ei.name == ej.name && ei.polarity != ej.polarity {
                extra_edges.push_str(&format!(
                    "    \"{}\" -> \"{}\" [color=red, dir=both];\n",
                    paths[i].display(arena),
                    paths[j].display(arena)
                ));
            }
        }
    }

    if extra_edges.is_empty() {
        base
    } else {
        let mut out = base.trim_end().to_string();
        out.pop(); // drop the closing `}`
        out.push('\n');
        out.push_str(&extra_edges);
        out.push_str("}\n");
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flatten::flatten;
    use crate::parser::parse;

    fn paths_for(src: &str) -> (FlagArena, Vec<Path>) {
        let p = parse(src).unwrap();
        let mut arena = p.arena;
        let paths = flatten(&mut arena, &p.exprs);
        (arena, paths)
    }

    #[test]
    fn already_ordered_constraint_sorts_to_identity() {
        let (arena, paths) = paths_for("a? ( b ) b? ( c )");
        let graph = build_graph(&arena, &paths);
        let order = topo_sort(&graph).unwrap();
        assert_eq!(order, vec![0, 1]);
    }

    #[test]
    fn reversed_dependency_needs_reordering() {
        let (arena, paths) = paths_for("a? ( b ) c? ( a )");
        let graph = build_graph(&arena, &paths);
        let order = topo_sort(&graph).unwrap();
        assert_eq!(order, vec![1, 0]);
    }

    #[test]
    fn mutual_guard_pair_is_not_cyclic() {
        // Each rule guards the other's flag but neither can ever actually
        // retroactively alter the other (§8 scenario 1) — the circular
        // exception in must_precede keeps this graph edge-free.
        let (arena, paths) = paths_for("a? ( b ) b? ( a )");
        let graph = build_graph(&arena, &paths);
        assert_eq!(graph.edge_count(), 0);
        assert!(topo_sort(&graph).is_ok());
    }

    #[test]
    fn three_way_ring_is_genuinely_cyclic() {
        // p -> q -> r -> p: no circular pair is mutually excepted here (each
        // producer/consumer pair touches a different flag), so the ring is
        // a real cycle with no valid single-pass order.
        let (arena, paths) = paths_for("p? ( q ) q? ( r ) r? ( p )");
        let graph = build_graph(&arena, &paths);
        assert!(matches!(topo_sort(&graph), Err(FlagformError::Cyclic)));
    }
}
