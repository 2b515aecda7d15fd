//! Flat open/close/text events from raw markup.
//!
//! Markup is run through html5ever's tokenizer only; no document tree is
//! built. Adjacent character tokens are merged so each run of text between
//! two tags reaches the handler as one event, with character references
//! already decoded. Tags in the void set produce no events at all.

use html5ever::tendril::StrTendril;
use html5ever::tokenizer::states::RawKind;
use html5ever::tokenizer::{
    BufferQueue, Tag, TagKind, Token, TokenSink, TokenSinkResult, Tokenizer, TokenizerOpts,
};
use std::cell::RefCell;
use std::collections::HashSet;
use std::fmt;
use tracing::trace;

/// HTML elements that never have a closing tag.
pub const HTML_VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

#[derive(Debug, Clone, PartialEq)]
pub enum MarkupEvent {
    Open {
        tag: String,
        attrs: Vec<(String, String)>,
    },
    Close {
        tag: String,
    },
    Text(String),
}

impl fmt::Display for MarkupEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarkupEvent::Open { tag, attrs } => write!(f, "Start: {tag} - {attrs:?}"),
            MarkupEvent::Close { tag } => write!(f, "End: {tag}"),
            MarkupEvent::Text(text) => write!(f, "Data: {text:?}"),
        }
    }
}

// ── Tokenizer bridge ──────────────────────────────────────────────────────────

/// Tokenize `markup` and hand every event to `handle`, in document order.
/// Stops at the first error the handler returns.
pub fn tokenize<F, E>(markup: &str, void_tags: &[&str], handle: F) -> Result<(), E>
where
    F: FnMut(MarkupEvent) -> Result<(), E>,
{
    let sink = EventSink {
        void_tags: void_tags.iter().map(|t| t.to_ascii_lowercase()).collect(),
        handle: RefCell::new(handle),
        text: RefCell::new(String::new()),
        failed: RefCell::new(None),
    };

    let tokenizer = Tokenizer::new(sink, TokenizerOpts::default());
    let input = BufferQueue::default();
    input.push_back(StrTendril::from_slice(markup));
    let _ = tokenizer.feed(&input);
    tokenizer.end();

    match tokenizer.sink.failed.borrow_mut().take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

struct EventSink<F, E> {
    void_tags: HashSet<String>,
    handle: RefCell<F>,
    text: RefCell<String>,
    failed: RefCell<Option<E>>,
}

impl<F, E> EventSink<F, E>
where
    F: FnMut(MarkupEvent) -> Result<(), E>,
{
    fn emit(&self, event: MarkupEvent) {
        if self.failed.borrow().is_some() {
            return;
        }
        trace!("{}", event);
        let mut handle = self.handle.borrow_mut();
        if let Err(e) = (&mut *handle)(event) {
            *self.failed.borrow_mut() = Some(e);
        }
    }

    fn flush_text(&self) {
        let text = std::mem::take(&mut *self.text.borrow_mut());
        if !text.is_empty() {
            self.emit(MarkupEvent::Text(text));
        }
    }

    fn tag(&self, tag: Tag) -> TokenSinkResult<()> {
        let name = tag.name.to_string();
        if self.void_tags.contains(&name) {
            return TokenSinkResult::Continue;
        }

        match tag.kind {
            TagKind::StartTag => {
                let attrs = tag
                    .attrs
                    .iter()
                    .map(|a| (a.name.local.to_string(), a.value.to_string()))
                    .collect();
                self.emit(MarkupEvent::Open {
                    tag: name.clone(),
                    attrs,
                });
                if tag.self_closing {
                    self.emit(MarkupEvent::Close { tag: name });
                    return TokenSinkResult::Continue;
                }
                raw_text_mode(&name)
                    .map(TokenSinkResult::RawData)
                    .unwrap_or(TokenSinkResult::Continue)
            }
            TagKind::EndTag => {
                self.emit(MarkupEvent::Close { tag: name });
                TokenSinkResult::Continue
            }
        }
    }
}

/// Elements whose content the tokenizer must not read as markup.
fn raw_text_mode(tag: &str) -> Option<RawKind> {
    match tag {
        "script" => Some(RawKind::ScriptData),
        "style" | "xmp" | "iframe" | "noembed" | "noframes" => Some(RawKind::Rawtext),
        "title" | "textarea" => Some(RawKind::Rcdata),
        _ => None,
    }
}

impl<F, E> TokenSink for EventSink<F, E>
where
    F: FnMut(MarkupEvent) -> Result<(), E>,
{
    type Handle = ();

    fn process_token(&self, token: Token, _line_number: u64) -> TokenSinkResult<()> {
        match token {
            Token::CharacterTokens(chars) => {
                self.text.borrow_mut().push_str(&chars);
                TokenSinkResult::Continue
            }
            Token::TagToken(tag) => {
                self.flush_text();
                self.tag(tag)
            }
            Token::EOFToken => {
                self.flush_text();
                TokenSinkResult::Continue
            }
            _ => TokenSinkResult::Continue,
        }
    }
}
