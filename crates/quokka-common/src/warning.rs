//! De-duplicated engine warnings.
//!
//! Parsers and the cascade report unsupported features (unknown properties,
//! unsupported units, skipped at-rules) through [`warn_once`]. Each unique
//! message is forwarded to the `log` facade a single time per process, so a
//! stylesheet with a thousand `-webkit-` declarations produces one line each.
//!
//! The set only affects diagnostics. Nothing in the render pipeline reads it.

use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

/// Global set of warnings we've already emitted (to deduplicate).
static WARNED: Mutex<Option<HashSet<String>>> = Mutex::new(None);

/// Warn about an unsupported feature (logged once per unique message).
///
/// All warnings share the `quokka` log target, so `RUST_LOG=quokka=off`
/// silences them without hiding other output.
///
/// # Example
/// ```
/// quokka_common::warning::warn_once("CSS", "unsupported unit 'vmin' in width: 3vmin");
/// ```
pub fn warn_once(component: &str, message: &str) {
    let key = format!("[{component}] {message}");
    let first_time = WARNED
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .get_or_insert_with(HashSet::new)
        .insert(key);

    if first_time {
        log::warn!(target: "quokka", "[{component}] {message}");
    }
}

/// Number of distinct warnings recorded so far.
#[must_use]
pub fn warning_count() -> usize {
    WARNED
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .as_ref()
        .map_or(0, HashSet::len)
}

/// Clear all recorded warnings (call between independent documents).
pub fn clear_warnings() {
    let mut guard = WARNED.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(set) = guard.as_mut() {
        set.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_warning_is_recorded_once() {
        let before = warning_count();
        warn_once("Test", "repeated-warning-is-recorded-once");
        warn_once("Test", "repeated-warning-is-recorded-once");
        assert_eq!(warning_count(), before + 1);
    }
}
