//! Structured query parser
//!
//! A raw query string is first wrapped in the retrieval model's default
//! top-level operator, then parsed in a single pass with an explicit frame
//! stack: operator tokens open a frame, `)` closes the top frame and
//! appends the finished node to the frame below, bare terms become Term
//! leaves after lexical normalization. Inside `#wand`/`#wsum` a numeric
//! token is consumed as the weight of the following argument.

use std::str::FromStr;

use tracing::debug;

use crate::error::{QuerentError, Result};
use crate::model::RetrievalModel;
use crate::query::iop::{IopKind, IopNode};
use crate::query::score::ScoreAdapter;
use crate::query::sop::{SopKind, SopNode};
use crate::tokenizer::Tokenizer;

pub struct QueryParser<'a> {
    tokenizer: &'a Tokenizer,
    model: RetrievalModel,
}

enum FrameKind {
    Sop(SopKind),
    Iop(IopKind),
}

struct Frame {
    kind: FrameKind,
    sop_children: Vec<SopNode>,
    iop_children: Vec<IopNode>,
    /// Weight awaiting the next argument, inside #wand/#wsum
    pending_weight: Option<f64>,
    display: String,
}

impl Frame {
    fn new(kind: FrameKind, display: String) -> Self {
        Self {
            kind,
            sop_children: Vec::new(),
            iop_children: Vec::new(),
            pending_weight: None,
            display,
        }
    }

    fn expects_weights(&self) -> bool {
        matches!(
            self.kind,
            FrameKind::Sop(SopKind::WeightedAnd) | FrameKind::Sop(SopKind::WeightedSum)
        )
    }

    fn push_iop(&mut self, mut node: IopNode) {
        node.weight = self.pending_weight;
        match &self.kind {
            FrameKind::Iop(_) => self.iop_children.push(node),
            FrameKind::Sop(_) => {
                self.sop_children
                    .push(SopNode::score_leaf(ScoreAdapter::new(node)));
            }
        }
    }

    fn push_sop(&mut self, mut node: SopNode) -> Result<()> {
        match &self.kind {
            FrameKind::Iop(_) => Err(QuerentError::Syntax(format!(
                "{} cannot appear inside {}",
                node.display, self.display
            ))),
            FrameKind::Sop(_) => {
                node.weight = self.pending_weight.take();
                self.sop_children.push(node);
                Ok(())
            }
        }
    }

    fn finish(self) -> Finished {
        match self.kind {
            FrameKind::Sop(kind) => Finished::Sop(SopNode::new(kind, self.sop_children, self.display)),
            FrameKind::Iop(kind) => Finished::Iop(IopNode::internal(kind, self.iop_children, self.display)),
        }
    }
}

enum Finished {
    Sop(SopNode),
    Iop(IopNode),
}

impl<'a> QueryParser<'a> {
    pub fn new(tokenizer: &'a Tokenizer, model: RetrievalModel) -> Self {
        Self { tokenizer, model }
    }

    /// Parse a raw query string into a score-level tree
    pub fn parse(&self, query: &str) -> Result<SopNode> {
        let wrapped = format!("{}({})", self.model.default_operator(), query);
        debug!(query = %wrapped, "parsing query");

        let mut stack: Vec<Frame> = Vec::new();
        let mut root: Option<SopNode> = None;

        for token in lex(&wrapped) {
            if root.is_some() {
                return Err(QuerentError::Syntax(format!(
                    "unexpected token after end of query: {token}"
                )));
            }
            match token {
                "(" => {}
                ")" => {
                    let frame = stack.pop().ok_or_else(|| {
                        QuerentError::Syntax("unbalanced closing parenthesis".to_string())
                    })?;
                    let display = frame.display.clone();
                    match (frame.finish(), stack.last_mut()) {
                        (Finished::Iop(iop), Some(parent)) => {
                            parent.push_iop(iop);
                            parent.pending_weight = None;
                        }
                        (Finished::Sop(sop), Some(parent)) => parent.push_sop(sop)?,
                        (Finished::Sop(sop), None) => root = Some(sop),
                        (Finished::Iop(_), None) => {
                            return Err(QuerentError::Syntax(format!(
                                "{display} cannot be the whole query"
                            )));
                        }
                    }
                }
                token if token.starts_with('#') => {
                    let kind = parse_operator(token)?;
                    stack.push(Frame::new(kind, token.to_lowercase()));
                }
                token => {
                    let frame = stack.last_mut().ok_or_else(|| {
                        QuerentError::Syntax(format!("term outside any operator: {token}"))
                    })?;
                    if frame.expects_weights() && frame.pending_weight.is_none() {
                        if let Ok(w) = token.parse::<f64>() {
                            frame.pending_weight = Some(w);
                            continue;
                        }
                    }
                    self.push_term(frame, token)?;
                    frame.pending_weight = None;
                }
            }
        }

        if !stack.is_empty() {
            return Err(QuerentError::Syntax(
                "unbalanced opening parenthesis".to_string(),
            ));
        }
        root.ok_or_else(|| QuerentError::Syntax("empty query".to_string()))
    }

    /// Normalize a surface term and append the resulting leaves
    ///
    /// Normalization may drop the term entirely (stopword) or split it into
    /// several tokens; every resulting leaf gets the same pending weight.
    fn push_term(&self, frame: &mut Frame, token: &str) -> Result<()> {
        let (surface, field) = match token.split_once('.') {
            Some((term, field)) => (term, crate::index::Field::from_str(&field.to_lowercase())?),
            None => (token, crate::index::Field::Body),
        };

        for normalized in self.tokenizer.tokenize(surface) {
            frame.push_iop(IopNode::term(normalized, field));
        }
        Ok(())
    }
}

/// Split query text into tokens; parentheses are tokens of their own,
/// whitespace and commas are separators
fn lex(text: &str) -> impl Iterator<Item = &str> {
    let mut tokens = Vec::new();
    let mut start = None;
    for (i, c) in text.char_indices() {
        if c == '(' || c == ')' || c.is_whitespace() || c == ',' {
            if let Some(s) = start.take() {
                tokens.push(&text[s..i]);
            }
            if c == '(' || c == ')' {
                tokens.push(&text[i..i + c.len_utf8()]);
            }
        } else if start.is_none() {
            start = Some(i);
        }
    }
    if let Some(s) = start {
        tokens.push(&text[s..]);
    }
    tokens.into_iter()
}

fn parse_operator(token: &str) -> Result<FrameKind> {
    let lower = token.to_lowercase();
    if let Some(span) = lower.strip_prefix("#near/") {
        return Ok(FrameKind::Iop(IopKind::Near {
            span: parse_span(token, span)?,
        }));
    }
    if let Some(span) = lower.strip_prefix("#window/") {
        return Ok(FrameKind::Iop(IopKind::Window {
            span: parse_span(token, span)?,
        }));
    }
    match lower.as_str() {
        "#or" => Ok(FrameKind::Sop(SopKind::Or)),
        "#and" => Ok(FrameKind::Sop(SopKind::And)),
        "#sum" => Ok(FrameKind::Sop(SopKind::Sum)),
        "#wand" => Ok(FrameKind::Sop(SopKind::WeightedAnd)),
        "#wsum" => Ok(FrameKind::Sop(SopKind::WeightedSum)),
        "#syn" => Ok(FrameKind::Iop(IopKind::Synonym)),
        _ => Err(QuerentError::Syntax(format!("unknown operator: {token}"))),
    }
}

fn parse_span(token: &str, span: &str) -> Result<u32> {
    match span.parse::<u32>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(QuerentError::Syntax(format!(
            "malformed proximity span: {token}"
        ))),
    }
}
