//! The façade: parse, flatten, and topo-sort a constraint, then bucket the
//! outcome into the four verdicts a caller (or the CLI's batch mode) cares
//! about.
use crate::error::FlagformError;
use crate::flatten::flatten;
use crate::graph::{build_graph, topo_sort};
use crate::parser::parse;
use crate::validate::validate;
use petgraph::visit::EdgeRef;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// The constraint's written order is already a valid evaluation order.
    Good,
    /// Solvable, but only after reordering the flattened paths.
    NeedTopoSort,
    /// No evaluation order exists: a genuine circular dependency.
    Cyclic,
    /// The input failed to parse or validate.
    ParseError,
}

pub fn classify(constraint: &str) -> Verdict {
    let parsed = match parse(constraint) {
        Ok(p) => p,
        Err(_) => return Verdict::ParseError,
    };
    if validate(&parsed.exprs).is_err() {
        return Verdict::ParseError;
    }

    let mut arena = parsed.arena;
    let paths = flatten(&mut arena, &parsed.exprs);
    let graph = build_graph(&arena, &paths);

    // Step 3: a cycle in the back-alteration graph means no evaluation
    // order exists at all. Step 4: a back-alteration edge that runs against
    // the constraint's written order (producer later than consumer) means
    // that order isn't safe as-is, even though some other order is.
    match topo_sort(&graph) {
        Err(FlagformError::Cyclic) => Verdict::Cyclic,
        Err(_) => Verdict::ParseError,
        Ok(_) => {
            let written_order_is_safe = graph
                .edge_references()
                .all(|edge| graph[edge.source()] <= graph[edge.target()]);
            if written_order_is_safe {
                Verdict::Good
            } else {
                Verdict::NeedTopoSort
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn independent_chain_is_good() {
        assert_eq!(classify("a? ( b ) b? ( c )"), Verdict::Good);
    }

    #[test]
    fn reversed_dependency_needs_topo_sort() {
        assert_eq!(classify("a? ( b ) c? ( a )"), Verdict::NeedTopoSort);
    }

    #[test]
    fn mutual_guard_pair_is_good() {
        // Each rule guards the other's flag but can never retroactively
        // alter it (§8 scenario 1): circular, but harmless.
        assert_eq!(classify("a? ( b ) b? ( a )"), Verdict::Good);
    }

    #[test]
    fn mutual_guard_pair_with_negation_is_good() {
        // §8 scenario 2: same shape, one leg negated.
        assert_eq!(classify("a? ( !b ) b? ( a )"), Verdict::Good);
    }

    #[test]
    fn three_way_ring_is_cyclic() {
        assert_eq!(classify("p? ( q ) q? ( r ) r? ( p )"), Verdict::Cyclic);
    }

    #[test]
    fn exactly_one_of_then_dependent_implication_needs_topo_sort() {
        // §8 scenario 5, written with the ^^ group first.
        assert_eq!(
            classify("^^ ( yassl openssl libressl ) static? ( yassl )"),
            Verdict::NeedTopoSort
        );
    }

    #[test]
    fn exactly_one_of_reordered_after_dependent_implication_is_good() {
        // §8 scenario 5, reordered so the dependency comes first.
        assert_eq!(
            classify("static? ( yassl ) ^^ ( yassl openssl libressl )"),
            Verdict::Good
        );
    }

    #[test]
    fn malformed_input_is_a_parse_error() {
        assert_eq!(classify("a? b )"), Verdict::ParseError);
    }

    #[test]
    fn bare_parens_fail_validation_as_parse_error() {
        assert_eq!(classify("( a b )"), Verdict::ParseError);
    }
}
