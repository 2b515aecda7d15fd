//! Item detection, field routing and record aggregation over an event stream.
//!
//! A [`Session`] owns everything mutable for one search page: the ancestor
//! stack, the state of the item currently being read, and the records
//! finished so far. Events must arrive in document order.
//!
//! Known limitation: items do not nest. Once inside an item, nodes that also
//! look like item roots are treated as ordinary descendants.

pub mod readers;
pub mod schema;

use crate::dom::{NodeId, TreeBuilder};
use crate::errors::ScrapeError;
use crate::events::MarkupEvent;
use crate::models::{Field, FieldValue, Record};
use crate::site::SiteAdapter;
use crate::utils::snippet;
use tracing::{debug, error, trace, warn};

use self::schema::{FailurePolicy, FieldSchema, NodePredicate, ReadOutcome};

// ── Item state ────────────────────────────────────────────────────────────────

/// Scratch state for the item subtree currently open.
#[derive(Debug, Default)]
struct ItemState {
    /// Node that opened the item; `Some` exactly while inside an item.
    root: Option<NodeId>,
    /// Field currently capturing text. Only set while `root` is.
    active: Option<Field>,
    pending: Record,
}

impl ItemState {
    fn within_item(&self) -> bool {
        self.root.is_some()
    }
}

// ── Session ───────────────────────────────────────────────────────────────────

pub struct Session {
    is_item_root: NodePredicate,
    schema: FieldSchema,
    tree: TreeBuilder,
    item: ItemState,
    records: Vec<Record>,
}

impl Session {
    /// Start a session with the adapter's item predicate and field schema.
    pub fn begin(adapter: &dyn SiteAdapter) -> Result<Self, ScrapeError> {
        Ok(Self::new(adapter.item_root(), adapter.field_schema()?))
    }

    pub fn new(is_item_root: NodePredicate, schema: FieldSchema) -> Self {
        Self {
            is_item_root,
            schema,
            tree: TreeBuilder::new(),
            item: ItemState::default(),
            records: Vec::new(),
        }
    }

    pub fn feed(&mut self, event: MarkupEvent) -> Result<(), ScrapeError> {
        match event {
            MarkupEvent::Open { tag, attrs } => {
                self.open(&tag, attrs);
                Ok(())
            }
            MarkupEvent::Close { tag } => self.close(&tag),
            MarkupEvent::Text(text) => self.text(&text),
        }
    }

    /// Records finished so far, in document order.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn within_item(&self) -> bool {
        self.item.within_item()
    }

    pub fn active_field(&self) -> Option<Field> {
        self.item.active
    }

    pub fn end(self) -> Vec<Record> {
        if self.item.within_item() {
            warn!(
                "Document ended inside an item; dropping partial record {:?}",
                self.item.pending
            );
        }
        if self.tree.depth() > 0 {
            debug!("{} element(s) left open at end of document", self.tree.depth());
        }
        self.records
    }

    // ── Event handlers ───────────────────────────────────────────────────────

    fn open(&mut self, tag: &str, attrs: Vec<(String, String)>) {
        let node = self.tree.open(tag, attrs);

        if !self.item.within_item() && (self.is_item_root)(node) {
            trace!("Entering item at {:?}", node);
            self.item.root = Some(node.id());
        }

        if self.item.within_item()
            && let Some(field) = self.schema.match_open(node)
        {
            debug!("Processing {} for item object", field);
            self.item.active = Some(field);
        }
    }

    fn close(&mut self, tag: &str) -> Result<(), ScrapeError> {
        let closing = self.tree.close(tag)?;
        let Some(root) = self.item.root else {
            return Ok(());
        };

        let node = self.tree.resolve(&closing);
        for spec in self.schema.iter() {
            let Some(closes) = spec.closes else { continue };
            if !closes(node) {
                continue;
            }
            if self.item.active == Some(spec.field) {
                debug!("Capture for {} ended without a value", spec.field);
                self.item.active = None;
            }
            debug!(
                "Finished {} for item object: {:?}",
                spec.field,
                self.item.pending.get(spec.field)
            );
        }

        if closing.id() == root && (self.is_item_root)(node) {
            self.finalize_item();
        }
        Ok(())
    }

    fn text(&mut self, raw: &str) -> Result<(), ScrapeError> {
        let Some(field) = self.item.active else {
            return Ok(());
        };
        let Some(spec) = self.schema.get(field) else {
            self.item.active = None;
            return Ok(());
        };

        let outcome = match spec.reader {
            Some(read) => read(raw),
            None => ReadOutcome::Success(FieldValue::Text(raw.trim().to_string())),
        };

        match outcome {
            ReadOutcome::Success(value) => {
                self.item.pending.assign(field, value)?;
                self.item.active = None;
            }
            ReadOutcome::Incomplete => {
                trace!("{} not read yet from {:?}", field, snippet(raw, 60));
            }
            ReadOutcome::Failure(reason) => match spec.on_failure {
                FailurePolicy::Abort => {
                    error!("Could not read {} from element data: '{}'", field, raw.trim());
                    return Err(ScrapeError::FieldParse {
                        field,
                        text: raw.trim().to_string(),
                        reason,
                    });
                }
                FailurePolicy::Skip => {
                    warn!("Skipping unreadable {} '{}': {}", field, raw.trim(), reason);
                    self.item.active = None;
                }
            },
        }
        Ok(())
    }

    /// Snapshot the pending fields into a record and reset item state.
    fn finalize_item(&mut self) {
        let item = std::mem::take(&mut self.item);
        debug!("Saving record {:?}", item.pending);
        self.records.push(item.pending);
    }
}
