use crate::dom::NodeRef;
use crate::errors::ScrapeError;
use crate::models::{Field, FieldValue};
use std::fmt;

// ── Hooks ─────────────────────────────────────────────────────────────────────

/// Structural test against a node and its live ancestry.
pub type NodePredicate = fn(NodeRef<'_>) -> bool;

/// Turns raw element text into a typed value.
pub type FieldReader = fn(&str) -> ReadOutcome;

#[derive(Debug, Clone, PartialEq)]
pub enum ReadOutcome {
    Success(FieldValue),
    /// Nothing usable yet; keep capturing in case more text follows.
    Incomplete,
    Failure(String),
}

/// What the router does when a reader reports [`ReadOutcome::Failure`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Abort the whole session.
    #[default]
    Abort,
    /// Leave the field unset for this item and stop capturing.
    Skip,
}

// ── Field spec ────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct FieldSpec {
    pub field: Field,
    pub opens: Option<NodePredicate>,
    pub closes: Option<NodePredicate>,
    pub reader: Option<FieldReader>,
    pub on_failure: FailurePolicy,
}

impl FieldSpec {
    /// A declared field with no hooks; it always ends up `None`.
    pub fn new(field: Field) -> Self {
        Self {
            field,
            opens: None,
            closes: None,
            reader: None,
            on_failure: FailurePolicy::Abort,
        }
    }

    pub fn opens_on(mut self, predicate: NodePredicate) -> Self {
        self.opens = Some(predicate);
        self
    }

    pub fn closes_on(mut self, predicate: NodePredicate) -> Self {
        self.closes = Some(predicate);
        self
    }

    pub fn read_with(mut self, reader: FieldReader) -> Self {
        self.reader = Some(reader);
        self
    }

    pub fn on_failure(mut self, policy: FailurePolicy) -> Self {
        self.on_failure = policy;
        self
    }
}

impl fmt::Debug for FieldSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldSpec")
            .field("field", &self.field)
            .field("opens", &self.opens.is_some())
            .field("closes", &self.closes.is_some())
            .field("reader", &self.reader.is_some())
            .field("on_failure", &self.on_failure)
            .finish()
    }
}

// ── Schema ────────────────────────────────────────────────────────────────────

/// Ordered field table. Order decides which field wins when several
/// open-predicates accept the same node.
#[derive(Debug, Clone)]
pub struct FieldSchema {
    specs: Vec<FieldSpec>,
}

impl FieldSchema {
    pub fn new(specs: Vec<FieldSpec>) -> Result<Self, ScrapeError> {
        if specs.is_empty() {
            return Err(ScrapeError::Adapter("field schema is empty".into()));
        }

        for (i, spec) in specs.iter().enumerate() {
            if specs[..i].iter().any(|s| s.field == spec.field) {
                return Err(ScrapeError::Adapter(format!(
                    "field {} declared twice",
                    spec.field
                )));
            }

            // Raw text can only populate text fields.
            let needs_reader = matches!(spec.field, Field::Price | Field::InStock);
            if spec.opens.is_some() && needs_reader && spec.reader.is_none() {
                return Err(ScrapeError::Adapter(format!(
                    "field {} captures text but has no reader",
                    spec.field
                )));
            }
        }

        Ok(Self { specs })
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldSpec> {
        self.specs.iter()
    }

    pub fn get(&self, field: Field) -> Option<&FieldSpec> {
        self.specs.iter().find(|s| s.field == field)
    }

    /// First field, in schema order, whose open-predicate accepts `node`.
    pub fn match_open(&self, node: NodeRef<'_>) -> Option<Field> {
        self.specs
            .iter()
            .find(|s| s.opens.is_some_and(|opens| opens(node)))
            .map(|s| s.field)
    }
}
