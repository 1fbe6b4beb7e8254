//! Positional query operators
//!
//! Term, Synonym, Near and Window all produce an inverted list. Term reads
//! its list straight from the index store; the others build a synthetic list
//! from their children's lists during `evaluate`. Once built, a node's list
//! is never mutated; matching walks it through a cursor.

use tracing::trace;

use crate::error::Result;
use crate::index::{DocId, Field, IndexStore, InvertedList, Posting, PostingCursor};

/// Kind of positional operator
#[derive(Clone, Debug, PartialEq)]
pub enum IopKind {
    Term { term: String },
    Synonym,
    Near { span: u32 },
    Window { span: u32 },
}

/// A node in the positional layer of the query tree
#[derive(Clone, Debug)]
pub struct IopNode {
    pub kind: IopKind,
    pub field: Field,
    pub children: Vec<IopNode>,
    /// Weight attached by an enclosing weighted operator
    pub weight: Option<f64>,
    /// Original query text for this subtree, used in error messages
    pub display: String,
    list: InvertedList,
    cursor: PostingCursor,
}

impl IopNode {
    pub fn term(term: String, field: Field) -> Self {
        let display = if field == Field::Body {
            term.clone()
        } else {
            format!("{term}.{field}")
        };
        Self {
            kind: IopKind::Term { term },
            field,
            children: Vec::new(),
            weight: None,
            display,
            list: InvertedList::default(),
            cursor: PostingCursor::new(),
        }
    }

    pub fn internal(kind: IopKind, children: Vec<IopNode>, display: String) -> Self {
        let field = children.first().map_or(Field::Body, |c| c.field);
        Self {
            kind,
            field,
            children,
            weight: None,
            display,
            list: InvertedList::default(),
            cursor: PostingCursor::new(),
        }
    }

    pub fn list(&self) -> &InvertedList {
        &self.list
    }

    /// Build this node's inverted list, bottom-up
    pub fn evaluate(&mut self, store: &dyn IndexStore) -> Result<()> {
        for child in &mut self.children {
            child.evaluate(store)?;
        }

        self.list = match &self.kind {
            IopKind::Term { term } => store.inverted_list(term, self.field)?,
            IopKind::Synonym => merge_synonym(&self.children),
            IopKind::Near { span } => fold_proximity(&self.children, |a, b| {
                merge_positional(a, b, |x, y| merge_near_doc(x, y, *span))
            }),
            IopKind::Window { span } => fold_proximity(&self.children, |a, b| {
                merge_positional(a, b, |x, y| merge_window_doc(x, y, *span))
            }),
        };
        self.field = self.list.field.unwrap_or(self.field);
        self.cursor = PostingCursor::new();

        trace!(node = %self.display, df = self.list.df, "evaluated positional node");
        Ok(())
    }

    // Cursor protocol, delegated to the node's own list.

    pub fn has_doc_match(&self) -> bool {
        self.cursor.has_doc(&self.list)
    }

    pub fn current_doc(&self) -> DocId {
        self.cursor.current_doc(&self.list)
    }

    pub fn current_posting(&self) -> &Posting {
        self.cursor.posting(&self.list)
    }

    pub fn advance_doc_past(&mut self, doc: DocId) {
        self.cursor.advance_doc_past(&self.list, doc);
    }

    pub fn advance_doc_to(&mut self, doc: DocId) {
        self.cursor.advance_doc_to(&self.list, doc);
    }
}

/// Union the children's lists into one stream
///
/// Positions from all children at a docid are merged, sorted and deduped;
/// df and ctf come from the merged postings, not from summing children.
fn merge_synonym(children: &[IopNode]) -> InvertedList {
    let field = children.first().and_then(|c| c.list.field);
    let mut merged = InvertedList::empty(field);

    let mut cursors: Vec<PostingCursor> = children.iter().map(|_| PostingCursor::new()).collect();
    loop {
        let mut next_doc: Option<DocId> = None;
        for (child, cursor) in children.iter().zip(&cursors) {
            if cursor.has_doc(&child.list) {
                let d = cursor.current_doc(&child.list);
                next_doc = Some(next_doc.map_or(d, |m: DocId| m.min(d)));
            }
        }
        let Some(doc) = next_doc else { break };

        let mut positions = Vec::new();
        for (child, cursor) in children.iter().zip(cursors.iter_mut()) {
            if cursor.has_doc(&child.list) && cursor.current_doc(&child.list) == doc {
                positions.extend_from_slice(&cursor.posting(&child.list).positions);
                cursor.advance_doc_past(&child.list, doc);
            }
        }
        positions.sort_unstable();
        positions.dedup();
        merged.push(Posting::new(doc, positions));
    }

    merged
}

/// Left fold of a pairwise positional merge across the children
///
/// An empty intermediate result short-circuits the remaining folds.
fn fold_proximity<F>(children: &[IopNode], merge: F) -> InvertedList
where
    F: Fn(&InvertedList, &InvertedList) -> Option<InvertedList>,
{
    let field = children.first().and_then(|c| c.list.field);
    let mut acc = match children.first() {
        Some(first) => first.list.clone(),
        None => return InvertedList::empty(field),
    };

    for child in &children[1..] {
        acc = match merge(&acc, &child.list) {
            Some(list) if !list.is_empty() => list,
            _ => return InvertedList::empty(field),
        };
    }
    acc
}

/// Document-level walk shared by Near and Window
///
/// `merge_doc` receives the two postings for a docid present in both lists
/// and returns the merged positions (possibly empty). Returns `None` when
/// the lists' fields differ.
fn merge_positional<F>(a: &InvertedList, b: &InvertedList, merge_doc: F) -> Option<InvertedList>
where
    F: Fn(&Posting, &Posting) -> Vec<u32>,
{
    if a.field != b.field {
        return None;
    }
    let mut merged = InvertedList::empty(a.field);

    let mut ca = PostingCursor::new();
    let mut cb = PostingCursor::new();
    while ca.has_doc(a) {
        let doc = ca.current_doc(a);
        cb.advance_doc_to(b, doc);
        if !cb.has_doc(b) {
            break;
        }
        let other = cb.current_doc(b);
        if other != doc {
            ca.advance_doc_to(a, other);
            continue;
        }

        let positions = merge_doc(ca.posting(a), cb.posting(b));
        if !positions.is_empty() {
            merged.push(Posting::new(doc, positions));
        }
        ca.advance_doc_past(a, doc);
    }

    Some(merged)
}

/// Ordered proximity: for each `a`, the next `b` strictly to its right must
/// satisfy `b - a <= span`; matches record `b`
///
/// Only the left cursor advances on a match, so a right position within
/// span of several left positions is recorded once per left occurrence and
/// the merged tf counts matches, not distinct positions.
fn merge_near_doc(pa: &Posting, pb: &Posting, span: u32) -> Vec<u32> {
    let mut positions = Vec::new();
    let (mut i, mut j) = (0usize, 0usize);

    while i < pa.positions.len() {
        let a = pa.positions[i];
        while j < pb.positions.len() && pb.positions[j] <= a {
            j += 1;
        }
        if j >= pb.positions.len() {
            break;
        }
        let b = pb.positions[j];
        if b - a <= span {
            positions.push(b);
        }
        i += 1;
    }

    positions
}

/// Unordered proximity: a pair with `|a - b| <= span` matches and records
/// `max(a, b)`; otherwise the smaller position advances
fn merge_window_doc(pa: &Posting, pb: &Posting, span: u32) -> Vec<u32> {
    let mut positions = Vec::new();
    let (mut i, mut j) = (0usize, 0usize);

    while i < pa.positions.len() && j < pb.positions.len() {
        let a = pa.positions[i];
        let b = pb.positions[j];
        if a.abs_diff(b) <= span {
            positions.push(a.max(b));
            i += 1;
            j += 1;
        } else if a < b {
            i += 1;
        } else {
            j += 1;
        }
    }

    positions
}
