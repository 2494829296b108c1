//! [CSS 2.1 § 12.4 Automatic counters and numbering](https://www.w3.org/TR/CSS2/generate.html#counters)
//!
//! An explicit `counter-reset` is scoped to the subtree of the element that
//! issued it: the element and its descendants see the new instance, and it
//! is popped when traversal leaves the element. A counter referenced with no
//! instance in scope is created at 0 in the enclosing sibling scope, so
//! list items without a resetting parent still count up.

use std::collections::BTreeMap;

use crate::style::{ComputedStyle, Display, QuotePair};

/// The implicit counter driven by `display: list-item`.
pub const LIST_ITEM: &str = "list-item";

/// Counter instances, keyed by name, innermost last.
///
/// Box generation applies an element's counter properties, then calls
/// [`Self::enter_children`] before its children and [`Self::leave_children`]
/// after them. Instances reset by the element, and every implicit instance
/// created among its children, are popped at that point.
#[derive(Debug, Clone)]
pub struct CounterState {
    counters: BTreeMap<String, Vec<i32>>,
    /// Names whose instance is owned by each open element scope.
    scopes: Vec<Vec<String>>,
    /// Explicit resets of the element being entered, owned by its scope
    /// once [`Self::enter_children`] opens it.
    pending: Vec<String>,
}

impl Default for CounterState {
    fn default() -> Self {
        Self::new()
    }
}

impl CounterState {
    /// Empty state with the document-level scope open.
    #[must_use]
    pub fn new() -> Self {
        Self {
            counters: BTreeMap::new(),
            scopes: vec![Vec::new()],
            pending: Vec::new(),
        }
    }

    /// Open the scope of the element whose counters were just applied.
    pub fn enter_children(&mut self) {
        self.scopes.push(std::mem::take(&mut self.pending));
    }

    /// Close the innermost scope, dropping the instances it owns.
    pub fn leave_children(&mut self) {
        let Some(names) = self.scopes.pop() else { return };
        for name in names {
            if let Some(stack) = self.counters.get_mut(&name) {
                let _ = stack.pop();
                if stack.is_empty() {
                    let _ = self.counters.remove(&name);
                }
            }
        }
        if self.scopes.is_empty() {
            self.scopes.push(Vec::new());
        }
    }

    /// End an element that has no children.
    pub fn leave_childless(&mut self) {
        self.enter_children();
        self.leave_children();
    }

    /// `counter-reset`: a new instance visible to this element and its
    /// descendants. Resetting the same name twice on one element replaces
    /// the value.
    pub fn reset(&mut self, name: &str, value: i32) {
        let stack = self.counters.entry(name.to_string()).or_default();
        if self.pending.iter().any(|n| n == name) {
            if let Some(top) = stack.last_mut() {
                *top = value;
                return;
            }
        }
        stack.push(value);
        self.pending.push(name.to_string());
    }

    /// `counter-increment`. A counter with no instance in scope is reset to
    /// zero on this element first.
    pub fn increment(&mut self, name: &str, by: i32) {
        self.ensure(name);
        if let Some(top) = self.counters.get_mut(name).and_then(|s| s.last_mut()) {
            *top = top.saturating_add(by);
        }
    }

    /// Set the innermost instance, as `<li value>` does.
    pub fn set(&mut self, name: &str, value: i32) {
        self.ensure(name);
        if let Some(top) = self.counters.get_mut(name).and_then(|s| s.last_mut()) {
            *top = value;
        }
    }

    /// `counter(name)`: the innermost value.
    pub fn value(&mut self, name: &str) -> i32 {
        self.ensure(name);
        self.peek(name).unwrap_or(0)
    }

    /// `counters(name)`: every instance in scope, outermost first.
    pub fn values(&mut self, name: &str) -> Vec<i32> {
        self.ensure(name);
        self.counters.get(name).cloned().unwrap_or_default()
    }

    /// Innermost value without creating an instance.
    #[must_use]
    pub fn peek(&self, name: &str) -> Option<i32> {
        self.counters.get(name).and_then(|s| s.last().copied())
    }

    fn ensure(&mut self, name: &str) {
        if self.counters.get(name).is_none_or(Vec::is_empty) {
            self.counters.entry(name.to_string()).or_default().push(0);
            if let Some(scope) = self.scopes.last_mut() {
                scope.push(name.to_string());
            }
        }
    }

    /// Apply an element's counter properties in CSS order: resets, then
    /// increments, then the implicit `list-item` step.
    ///
    /// `list_item_value` is the `<li value>` attribute and `list_start` the
    /// `<ol start>` attribute when present.
    pub fn apply(
        &mut self,
        style: &ComputedStyle,
        list_start: Option<i32>,
        list_item_value: Option<i32>,
    ) {
        for op in &style.counter_reset {
            let value = if op.name == LIST_ITEM {
                list_start.map_or(op.value, |start| start.saturating_sub(1))
            } else {
                op.value
            };
            self.reset(&op.name, value);
        }
        if let Some(start) = list_start {
            if !style.counter_reset.iter().any(|op| op.name == LIST_ITEM) {
                self.reset(LIST_ITEM, start.saturating_sub(1));
            }
        }
        for op in &style.counter_increment {
            self.increment(&op.name, op.value);
        }
        if style.display == Display::ListItem
            && !style.counter_increment.iter().any(|op| op.name == LIST_ITEM)
        {
            match list_item_value {
                Some(value) => self.set(LIST_ITEM, value),
                None => self.increment(LIST_ITEM, 1),
            }
        }
    }
}

/// [§ 12.3.2 Inserting quotes with the 'content' property](https://www.w3.org/TR/CSS2/generate.html#quotes-insert)
///
/// "Nesting level 0 corresponds to the first pair of quotes."
#[derive(Debug, Clone, Copy, Default)]
pub struct QuoteState {
    depth: usize,
}

impl QuoteState {
    /// Current nesting depth.
    #[must_use]
    pub const fn depth(&self) -> usize {
        self.depth
    }

    /// `open-quote`: text for the current depth, then one level deeper.
    pub fn open<'q>(&mut self, quotes: &'q [QuotePair]) -> Option<&'q str> {
        let text = Self::pair(quotes, self.depth).map(|q| q.open.as_str());
        self.depth += 1;
        text
    }

    /// `close-quote`: one level out, then the text for that depth. Nothing
    /// at depth zero.
    pub fn close<'q>(&mut self, quotes: &'q [QuotePair]) -> Option<&'q str> {
        if self.depth == 0 {
            return None;
        }
        self.depth -= 1;
        Self::pair(quotes, self.depth).map(|q| q.close.as_str())
    }

    /// `no-open-quote`
    pub const fn skip_open(&mut self) {
        self.depth += 1;
    }

    /// `no-close-quote`
    pub const fn skip_close(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    fn pair(quotes: &[QuotePair], depth: usize) -> Option<&QuotePair> {
        quotes.get(depth.min(quotes.len().saturating_sub(1)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::types::default_quotes;

    #[test]
    fn test_reset_scope_is_the_resetting_subtree() {
        let mut c = CounterState::new();
        c.enter_children(); // body
        c.reset("item", 5);
        c.enter_children(); // children of the resetting element
        c.increment("item", 1);
        assert_eq!(c.value("item"), 6);
        c.leave_children();
        assert_eq!(c.peek("item"), None, "following siblings do not see the reset");
        c.increment("item", 1);
        assert_eq!(c.value("item"), 1, "a sibling reference starts a fresh instance");
        c.leave_children();
        assert_eq!(c.peek("item"), None);
    }

    #[test]
    fn test_implicit_instance_is_shared_by_siblings() {
        let mut c = CounterState::new();
        c.enter_children();
        for expected in 1..=3 {
            c.increment("n", 1);
            c.leave_childless();
            assert_eq!(c.peek("n"), Some(expected));
        }
        c.leave_children();
        assert_eq!(c.peek("n"), None);
    }

    #[test]
    fn test_nested_reset_does_not_leak() {
        let mut c = CounterState::new();
        c.reset("n", 5);
        c.enter_children();
        c.reset("n", 0);
        c.increment("n", 1);
        assert_eq!(c.values("n"), vec![5, 1]);
        c.enter_children();
        assert_eq!(c.values("n"), vec![5, 1]);
        c.leave_children();
        assert_eq!(c.peek("n"), Some(5));
        c.leave_children();
        assert_eq!(c.peek("n"), None);
    }

    #[test]
    fn test_implicit_reset_on_reference() {
        let mut c = CounterState::new();
        c.increment("x", 3);
        assert_eq!(c.value("x"), 3);
        assert_eq!(c.value("never-reset"), 0);
    }

    #[test]
    fn test_repeated_reset_on_one_element_replaces_instance() {
        let mut c = CounterState::new();
        c.reset("n", 1);
        c.reset("n", 7);
        assert_eq!(c.values("n"), vec![7]);
    }

    #[test]
    fn test_negative_increment() {
        let mut c = CounterState::new();
        c.reset("n", 0);
        c.increment("n", -2);
        assert_eq!(c.value("n"), -2);
    }

    #[test]
    fn test_quote_depth_clamps() {
        let quotes = default_quotes();
        let mut q = QuoteState::default();
        assert_eq!(q.close(&quotes), None);
        assert_eq!(q.depth(), 0);
        assert_eq!(q.open(&quotes), Some("\u{201C}"));
        assert_eq!(q.open(&quotes), Some("\u{2018}"));
        assert_eq!(q.open(&quotes), Some("\u{2018}"), "deeper levels reuse the last pair");
        assert_eq!(q.close(&quotes), Some("\u{2019}"));
        q.skip_close();
        q.skip_close();
        q.skip_close();
        assert_eq!(q.depth(), 0);
        q.skip_open();
        assert_eq!(q.close(&quotes), Some("\u{201D}"));
    }

    #[test]
    fn test_empty_quotes_insert_nothing() {
        let mut q = QuoteState::default();
        assert_eq!(q.open(&[]), None);
        assert_eq!(q.depth(), 1);
    }
}
