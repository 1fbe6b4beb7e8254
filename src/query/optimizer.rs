//! Query tree simplification
//!
//! Post-order rewrite over both layers of the tree: empty subtrees are
//! pruned (propagating upward), and any non-leaf node left with a single
//! child is replaced by that child. A pruned parent's explicit weight moves
//! down onto the surviving child so weighted operators above it still see
//! the weight. Returns `None` when the whole query optimizes away.

use crate::query::iop::{IopKind, IopNode};
use crate::query::score::ScoreAdapter;
use crate::query::sop::{SopKind, SopNode};

/// Simplify a score-level tree; `None` means the query is empty
pub fn optimize(mut node: SopNode) -> Option<SopNode> {
    if let SopKind::Score(_) = node.kind {
        let weight = node.weight;
        let SopKind::Score(adapter) = node.kind else {
            return None;
        };
        let iop = optimize_iop(adapter.into_iop())?;
        let mut leaf = SopNode::score_leaf(ScoreAdapter::new(iop));
        leaf.weight = weight.or(leaf.weight);
        return Some(leaf);
    }

    let children = std::mem::take(&mut node.children);
    node.children = children.into_iter().filter_map(optimize).collect();

    match node.children.len() {
        0 => None,
        1 => {
            let mut child = node.children.remove(0);
            if node.weight.is_some() {
                child.weight = node.weight;
            }
            Some(child)
        }
        _ => Some(node),
    }
}

fn optimize_iop(mut node: IopNode) -> Option<IopNode> {
    if let IopKind::Term { .. } = node.kind {
        return Some(node);
    }

    let children = std::mem::take(&mut node.children);
    node.children = children.into_iter().filter_map(optimize_iop).collect();

    match node.children.len() {
        0 => None,
        1 => {
            let mut child = node.children.remove(0);
            if node.weight.is_some() {
                child.weight = node.weight;
            }
            Some(child)
        }
        _ => Some(node),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TokenizerConfig;
    use crate::index::Field;
    use crate::model::RetrievalModel;
    use crate::query::parser::QueryParser;
    use crate::tokenizer::Tokenizer;

    fn parse(query: &str) -> SopNode {
        let tokenizer = Tokenizer::new(&TokenizerConfig {
            lowercase: true,
            remove_stopwords: false,
            stem: false,
            min_token_length: 1,
            max_token_length: 50,
        });
        QueryParser::new(&tokenizer, RetrievalModel::indri(1000.0, 0.4).unwrap())
            .parse(query)
            .unwrap()
    }

    #[test]
    fn test_single_child_collapse_with_weight() {
        let root = optimize(parse("#and(#wand(2.0 #syn(a b)))")).unwrap();

        // everything collapses onto the synonym leaf, which keeps the weight
        assert_eq!(root.weight, Some(2.0));
        let SopKind::Score(adapter) = &root.kind else {
            panic!("expected a score leaf");
        };
        assert!(matches!(adapter.iop().kind, IopKind::Synonym));
        assert_eq!(adapter.iop().children.len(), 2);
    }

    #[test]
    fn test_multi_child_trees_survive() {
        let root = optimize(parse("#and(a b)")).unwrap();
        assert!(matches!(root.kind, SopKind::And));
        assert_eq!(root.children.len(), 2);
    }

    #[test]
    fn test_term_leaves_untouched() {
        let root = optimize(parse("apple.title")).unwrap();
        let SopKind::Score(adapter) = &root.kind else {
            panic!("expected a score leaf");
        };
        assert_eq!(adapter.iop().field, Field::Title);
    }

    #[test]
    fn test_idempotence() {
        let once = optimize(parse("#and(#wand(2.0 #syn(a b)) #or(c d))")).unwrap();
        let twice = optimize(once.clone()).unwrap();

        assert_eq!(once.display, twice.display);
        assert_eq!(once.children.len(), twice.children.len());
        assert_eq!(once.weight, twice.weight);
    }
}
