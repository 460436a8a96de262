//! Captures the user's selection when a request starts and writes the result
//! back into it when the user accepts.

use lazy_static::lazy_static;
use regex::Regex;
use std::fmt;
use thiserror::Error;

lazy_static! {
    static ref MARKUP: Regex = Regex::new(r"(?s)<[^<>]*>").unwrap();
}

/// Strip anything that looks like a tag so the replacement is inserted as text.
pub fn sanitize_plain_text(text: &str) -> String {
    MARKUP.replace_all(text, "").into_owned()
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApplyError {
    #[error("The selected text changed or was removed")]
    Stale,

    #[error("The selection is not editable")]
    NotEditable,
}

/// The host page as far as selections are concerned.
pub trait Document {
    type Range: Clone + fmt::Debug;

    /// The current selection, if there is one.
    fn selection(&self) -> Option<Self::Range>;

    /// Whether the element containing `range` accepts user edits.
    fn is_editable(&self, range: &Self::Range) -> bool;

    /// Replace the contents of `range` with `text` and collapse the selection
    /// to its end. Must fail with [`ApplyError::Stale`] instead of touching a
    /// range that no longer matches the document.
    fn replace(&mut self, range: &Self::Range, text: &str) -> Result<(), ApplyError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionCapture<R> {
    pub range: R,
    /// Decided once at capture time.
    pub is_editable: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied,
    NothingCaptured,
    NotEditable,
    Stale,
}

pub struct SelectionBridge<D: Document> {
    capture: Option<SelectionCapture<D::Range>>,
}

impl<D: Document> Default for SelectionBridge<D> {
    fn default() -> Self {
        Self { capture: None }
    }
}

impl<D: Document> SelectionBridge<D> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remember the current selection, replacing any earlier capture.
    /// Returns whether the result may later be applied.
    pub fn capture(&mut self, document: &D) -> bool {
        self.capture = document.selection().map(|range| SelectionCapture {
            is_editable: document.is_editable(&range),
            range,
        });
        self.can_apply()
    }

    pub fn captured(&self) -> Option<&SelectionCapture<D::Range>> {
        self.capture.as_ref()
    }

    pub fn can_apply(&self) -> bool {
        self.capture.as_ref().is_some_and(|c| c.is_editable)
    }

    /// Write `result` over the captured range. Never panics on a stale range.
    pub fn apply(&mut self, document: &mut D, result: &str) -> ApplyOutcome {
        let Some(capture) = &self.capture else {
            return ApplyOutcome::NothingCaptured;
        };
        if !capture.is_editable {
            return ApplyOutcome::NotEditable;
        }

        match document.replace(&capture.range, &sanitize_plain_text(result)) {
            Ok(()) => {
                self.capture = None;
                ApplyOutcome::Applied
            }
            Err(ApplyError::NotEditable) => ApplyOutcome::NotEditable,
            Err(ApplyError::Stale) => {
                tracing::debug!(range = ?capture.range, "captured selection is stale, not applying");
                ApplyOutcome::Stale
            }
        }
    }

    pub fn release(&mut self) {
        self.capture = None;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Paragraph,
    Input,
    TextArea,
    ContentEditable,
}

impl ElementKind {
    pub fn is_editable(self) -> bool {
        !matches!(self, ElementKind::Paragraph)
    }
}

#[derive(Debug, Clone)]
struct Element {
    kind: ElementKind,
    text: String,
    version: u64,
    attached: bool,
}

/// Character range inside one element, tagged with the element's version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextRange {
    pub element: usize,
    pub start: usize,
    pub end: usize,
    version: u64,
}

/// A minimal page: a list of text elements and at most one selection.
#[derive(Debug, Clone, Default)]
pub struct TextDocument {
    elements: Vec<Element>,
    selection: Option<TextRange>,
}

fn byte_offset(text: &str, chars: usize) -> Option<usize> {
    if chars == text.chars().count() {
        return Some(text.len());
    }
    text.char_indices().nth(chars).map(|(offset, _)| offset)
}

impl TextDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an element and return its index.
    pub fn push(&mut self, kind: ElementKind, text: &str) -> usize {
        self.elements.push(Element {
            kind,
            text: text.to_string(),
            version: 0,
            attached: true,
        });
        self.elements.len() - 1
    }

    pub fn text(&self, element: usize) -> Option<&str> {
        self.elements
            .get(element)
            .filter(|e| e.attached)
            .map(|e| e.text.as_str())
    }

    /// Select `start..end` characters of `element`; out of range clears the selection.
    pub fn select(&mut self, element: usize, start: usize, end: usize) {
        self.selection = self.elements.get(element).and_then(|e| {
            let len = e.text.chars().count();
            (e.attached && start <= end && end <= len).then_some(TextRange {
                element,
                start,
                end,
                version: e.version,
            })
        });
    }

    pub fn select_all(&mut self, element: usize) {
        let len = self.text(element).map(|t| t.chars().count()).unwrap_or(0);
        self.select(element, 0, len);
    }

    pub fn selected_text(&self) -> Option<String> {
        let range = self.selection?;
        let text = self.text(range.element)?;
        Some(text.chars().skip(range.start).take(range.end - range.start).collect())
    }

    /// Overwrite an element's text, as a script on the page might.
    pub fn set_text(&mut self, element: usize, text: &str) {
        if let Some(e) = self.elements.get_mut(element) {
            e.text = text.to_string();
            e.version += 1;
        }
    }

    pub fn set_kind(&mut self, element: usize, kind: ElementKind) {
        if let Some(e) = self.elements.get_mut(element) {
            e.kind = kind;
        }
    }

    pub fn detach(&mut self, element: usize) {
        if let Some(e) = self.elements.get_mut(element) {
            e.attached = false;
            e.version += 1;
        }
    }
}

impl Document for TextDocument {
    type Range = TextRange;

    fn selection(&self) -> Option<TextRange> {
        self.selection
    }

    fn is_editable(&self, range: &TextRange) -> bool {
        self.elements
            .get(range.element)
            .is_some_and(|e| e.attached && e.kind.is_editable())
    }

    fn replace(&mut self, range: &TextRange, text: &str) -> Result<(), ApplyError> {
        let element = self
            .elements
            .get_mut(range.element)
            .filter(|e| e.attached && e.version == range.version)
            .ok_or(ApplyError::Stale)?;

        let start = byte_offset(&element.text, range.start).ok_or(ApplyError::Stale)?;
        let end = byte_offset(&element.text, range.end).ok_or(ApplyError::Stale)?;
        element.text.replace_range(start..end, text);
        element.version += 1;

        let caret = range.start + text.chars().count();
        self.selection = Some(TextRange {
            element: range.element,
            start: caret,
            end: caret,
            version: element.version,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_strips_markup() {
        assert_eq!(
            sanitize_plain_text("<b>The</b> cat <img src=x onerror=alert(1)>sat."),
            "The cat sat."
        );
        assert_eq!(sanitize_plain_text("a < b and c > d"), "a < b and c > d");
        assert_eq!(sanitize_plain_text("**bold** stays"), "**bold** stays");
    }

    #[test]
    fn test_apply_replaces_selection_in_editable_field() {
        let mut doc = TextDocument::new();
        let input = doc.push(ElementKind::TextArea, "Note: teh cat sat. Done");
        doc.select(input, 6, 17);
        assert_eq!(doc.selected_text().as_deref(), Some("teh cat sat"));

        let mut bridge = SelectionBridge::new();
        assert!(bridge.capture(&doc));
        assert_eq!(bridge.apply(&mut doc, "The cat sat"), ApplyOutcome::Applied);
        assert_eq!(doc.text(input), Some("Note: The cat sat. Done"));

        // Collapsed after the inserted text.
        let caret = doc.selection().unwrap();
        assert_eq!((caret.start, caret.end), (17, 17));
        assert!(bridge.captured().is_none());
    }

    #[test]
    fn test_read_only_selection_is_view_only() {
        let mut doc = TextDocument::new();
        let p = doc.push(ElementKind::Paragraph, "static text");
        doc.select_all(p);

        let mut bridge = SelectionBridge::new();
        assert!(!bridge.capture(&doc));
        assert_eq!(bridge.apply(&mut doc, "changed"), ApplyOutcome::NotEditable);
        assert_eq!(doc.text(p), Some("static text"));
    }

    #[test]
    fn test_editability_is_fixed_at_capture_time() {
        let mut doc = TextDocument::new();
        let field = doc.push(ElementKind::ContentEditable, "draft");
        doc.select_all(field);

        let mut bridge = SelectionBridge::new();
        bridge.capture(&doc);
        doc.set_kind(field, ElementKind::Paragraph);
        assert!(bridge.can_apply());

        let mut other = SelectionBridge::<TextDocument>::new();
        other.capture(&doc);
        doc.set_kind(field, ElementKind::Input);
        assert!(!other.can_apply());
    }

    #[test]
    fn test_stale_range_is_a_no_op() {
        let mut doc = TextDocument::new();
        let field = doc.push(ElementKind::Input, "hello world");
        doc.select(field, 0, 5);

        let mut bridge = SelectionBridge::new();
        bridge.capture(&doc);
        doc.set_text(field, "hi");
        assert_eq!(bridge.apply(&mut doc, "HELLO"), ApplyOutcome::Stale);
        assert_eq!(doc.text(field), Some("hi"));

        let removed = doc.push(ElementKind::Input, "gone soon");
        doc.select_all(removed);
        bridge.capture(&doc);
        doc.detach(removed);
        assert_eq!(bridge.apply(&mut doc, "x"), ApplyOutcome::Stale);
    }

    #[test]
    fn test_apply_without_capture() {
        let mut doc = TextDocument::new();
        doc.push(ElementKind::Input, "no selection");
        let mut bridge = SelectionBridge::new();
        assert!(!bridge.capture(&doc));
        assert_eq!(bridge.apply(&mut doc, "x"), ApplyOutcome::NothingCaptured);
    }

    #[test]
    fn test_multibyte_offsets() {
        let mut doc = TextDocument::new();
        let field = doc.push(ElementKind::Input, "café au lait");
        doc.select(field, 0, 4);
        let mut bridge = SelectionBridge::new();
        bridge.capture(&doc);
        assert_eq!(bridge.apply(&mut doc, "thé"), ApplyOutcome::Applied);
        assert_eq!(doc.text(field), Some("thé au lait"));
    }
}
