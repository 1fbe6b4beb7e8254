//! Core index types
//!
//! An inverted list is an immutable snapshot of one term's postings in one
//! field. Operators never mutate lists; they walk them through a
//! [`PostingCursor`], which is the only stateful part of the traversal.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::QuerentError;

/// Internal document identifier, dense and ascending within an index
pub type DocId = u32;

/// Indexed document fields
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Body,
    Title,
    Url,
    Keywords,
    Inlink,
}

impl Field {
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Body => "body",
            Field::Title => "title",
            Field::Url => "url",
            Field::Keywords => "keywords",
            Field::Inlink => "inlink",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Field {
    type Err = QuerentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "body" => Ok(Field::Body),
            "title" => Ok(Field::Title),
            "url" => Ok(Field::Url),
            "keywords" => Ok(Field::Keywords),
            "inlink" => Ok(Field::Inlink),
            other => Err(QuerentError::UnknownField(other.to_string())),
        }
    }
}

/// One document's entry in an inverted list
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Posting {
    pub doc: DocId,
    /// Term frequency; always `positions.len()`
    pub tf: u32,
    /// Ascending 0-indexed token positions within the field
    pub positions: Vec<u32>,
}

impl Posting {
    pub fn new(doc: DocId, positions: Vec<u32>) -> Self {
        Self {
            doc,
            tf: positions.len() as u32,
            positions,
        }
    }
}

/// A term's (or derived match pattern's) postings in one field
///
/// Postings are in strictly ascending document order. `df` and `ctf` are
/// always derived from the postings themselves, including for the synthetic
/// lists produced by the positional operators.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct InvertedList {
    pub field: Option<Field>,
    pub df: u32,
    pub ctf: u64,
    pub postings: Vec<Posting>,
}

impl InvertedList {
    /// Create an empty list for a field
    pub fn empty(field: Option<Field>) -> Self {
        Self {
            field,
            df: 0,
            ctf: 0,
            postings: Vec::new(),
        }
    }

    /// Append a posting, keeping df/ctf consistent
    ///
    /// Postings must be appended in ascending document order.
    pub fn push(&mut self, posting: Posting) {
        debug_assert!(
            self.postings.last().map_or(true, |p| p.doc < posting.doc),
            "postings must be appended in ascending doc order"
        );
        self.df += 1;
        self.ctf += posting.tf as u64;
        self.postings.push(posting);
    }

    pub fn is_empty(&self) -> bool {
        self.postings.is_empty()
    }
}

/// Cursor over an [`InvertedList`]
///
/// Tracks a document position and, within the current document, a location
/// position. Both only move forward; moving the document cursor resets the
/// location cursor to the start of the new document's positions.
#[derive(Clone, Copy, Debug, Default)]
pub struct PostingCursor {
    doc: usize,
    loc: usize,
}

impl PostingCursor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the cursor still points at a document
    pub fn has_doc(&self, list: &InvertedList) -> bool {
        self.doc < list.postings.len()
    }

    /// The current document id; only valid when `has_doc` is true
    pub fn current_doc(&self, list: &InvertedList) -> DocId {
        list.postings[self.doc].doc
    }

    /// The current posting; only valid when `has_doc` is true
    pub fn posting<'a>(&self, list: &'a InvertedList) -> &'a Posting {
        &list.postings[self.doc]
    }

    /// Advance past every document with id <= `doc`
    pub fn advance_doc_past(&mut self, list: &InvertedList, doc: DocId) {
        while self.doc < list.postings.len() && list.postings[self.doc].doc <= doc {
            self.doc += 1;
        }
        self.loc = 0;
    }

    /// Advance to the first document with id >= `doc`
    pub fn advance_doc_to(&mut self, list: &InvertedList, doc: DocId) {
        while self.doc < list.postings.len() && list.postings[self.doc].doc < doc {
            self.doc += 1;
        }
        self.loc = 0;
    }

    /// Whether the current document has a location left to consume
    pub fn has_loc(&self, list: &InvertedList) -> bool {
        self.has_doc(list) && self.loc < list.postings[self.doc].positions.len()
    }

    /// The current location; only valid when `has_loc` is true
    pub fn current_loc(&self, list: &InvertedList) -> u32 {
        list.postings[self.doc].positions[self.loc]
    }

    /// Advance to the next location in the current document
    pub fn advance_loc(&mut self) {
        self.loc += 1;
    }

    /// Advance past every location <= `loc` in the current document; a
    /// no-op when the document cursor is exhausted
    pub fn advance_loc_past(&mut self, list: &InvertedList, loc: u32) {
        if !self.has_doc(list) {
            return;
        }
        let positions = &list.postings[self.doc].positions;
        while self.loc < positions.len() && positions[self.loc] <= loc {
            self.loc += 1;
        }
    }
}
