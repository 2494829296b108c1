//! Seeded fuzzing against the layout and paint invariants.
//!
//! Each seed deterministically generates a small document. The document is
//! laid out and painted, and both checkers run over the result. Documents
//! that violate an invariant are shrunk with [`minimize`]; documents that
//! panic are recorded separately and not shrunk.

use std::fmt::Write as _;
use std::panic::{self, AssertUnwindSafe};

use log::{debug, error, info};
use quokka_css::{Violation, check_display_list, check_fragment_tree};
use quokka_engine::{render_to_display_list, render_to_fragment_tree};
use rayon::prelude::*;
use serde::Serialize;

use crate::config::HarnessConfig;
use crate::minimize::minimize;

const BLOCK_TAGS: &[&str] = &["div", "p", "section", "ul", "ol", "li", "blockquote", "h2"];
const INLINE_TAGS: &[&str] = &["span", "b", "em", "a", "q", "code"];
const WORDS: &[&str] = &[
    "lorem", "ipsum", "dolor", "sit", "amet", "quokka", "x", "wide-word-without-breaks", "a b",
    "&amp;", "1.", "\u{e9}t\u{e9}",
];
const CLASSES: &[&str] = &["a", "b", "c"];
const DECLARATIONS: &[&str] = &[
    "float: left",
    "float: right",
    "clear: both",
    "clear: left",
    "width: 50%",
    "width: 120px",
    "width: 3em",
    "height: 40px",
    "min-height: 10px",
    "max-width: 80px",
    "margin: 10px",
    "margin-top: -8px",
    "margin: 0 auto",
    "padding: 4px 1em",
    "border: 2px solid black",
    "border-left: 5px dashed red",
    "border-style: double",
    "display: block",
    "display: inline",
    "display: inline-block",
    "display: list-item",
    "display: none",
    "visibility: hidden",
    "position: relative; top: 5px",
    "position: absolute; left: 10px; top: 0",
    "overflow: hidden",
    "line-height: 2",
    "font-size: 20px",
    "font-size: 0.5em",
    "font-weight: bold",
    "font-style: italic",
    "font-variant: small-caps",
    "text-align: center",
    "text-align: justify",
    "text-indent: 2em",
    "white-space: pre",
    "white-space: nowrap",
    "letter-spacing: 2px",
    "word-spacing: 4px",
    "text-transform: uppercase",
    "text-decoration: underline",
    "vertical-align: super",
    "vertical-align: middle",
    "list-style-type: upper-roman",
    "list-style-type: lower-greek",
    "list-style-position: inside",
    "counter-reset: c",
    "counter-increment: c",
    "background-color: #cef",
    "color: rgb(200, 0, 0)",
    "z-index: 2",
];
const RULES: &[&str] = &[
    "li::before { content: counter(c) \". \"; counter-increment: c }",
    "ol { counter-reset: c }",
    ".a::after { content: \" [\" attr(class) \"]\" }",
    "p:first-child { margin-top: 0 }",
    "div > p { text-indent: 1em }",
    ".b::first-letter { font-size: 2em; float: left }",
    ".c::first-line { color: blue }",
    "q::before { content: open-quote } q::after { content: close-quote }",
    "span + span { margin-left: 3px }",
];

/// Deterministic HTML generator.
#[derive(Debug)]
pub struct Generator {
    rng: fastrand::Rng,
    max_elements: usize,
    elements: usize,
}

impl Generator {
    /// A generator for `seed` producing at most `max_elements` elements per
    /// document.
    #[must_use]
    pub fn new(seed: u64, max_elements: usize) -> Self {
        Self {
            rng: fastrand::Rng::with_seed(seed),
            max_elements,
            elements: 0,
        }
    }

    /// Generate one document. The same seed always yields the same text.
    pub fn document(&mut self) -> String {
        self.elements = 0;
        let mut html = String::from("<!DOCTYPE html><html><head><style>");
        for _ in 0..self.rng.usize(0..=3) {
            html.push_str(self.pick(RULES));
            html.push('\n');
        }
        html.push_str("</style></head><body>");
        while self.elements < self.max_elements && self.rng.u8(0..4) != 0 {
            self.element(&mut html, 0);
        }
        html.push_str("</body></html>");
        html
    }

    fn pick<'t>(&mut self, items: &[&'t str]) -> &'t str {
        items[self.rng.usize(0..items.len())]
    }

    fn element(&mut self, html: &mut String, depth: usize) {
        self.elements += 1;
        let inline = depth > 3 || self.rng.u8(0..3) == 0;
        let tag = if inline {
            self.pick(INLINE_TAGS)
        } else {
            self.pick(BLOCK_TAGS)
        };
        let _ = write!(html, "<{tag}");
        if self.rng.bool() {
            let _ = write!(html, " class=\"{}\"", self.pick(CLASSES));
        }
        if self.rng.u8(0..3) != 0 {
            let declarations: Vec<&str> = (0..self.rng.usize(1..=3))
                .map(|_| self.pick(DECLARATIONS))
                .collect();
            let _ = write!(html, " style=\"{}\"", declarations.join("; "));
        }
        html.push('>');
        for _ in 0..self.rng.usize(0..=3) {
            if self.elements < self.max_elements && self.rng.u8(0..3) == 0 {
                self.element(html, depth + 1);
            } else {
                html.push_str(self.pick(WORDS));
                html.push(' ');
            }
        }
        if self.rng.u8(0..8) == 0 {
            html.push_str("<br>");
        }
        if self.rng.u8(0..10) == 0 {
            let _ = write!(html, "<img src=\"missing.png\" width=\"{}\">", self.rng.u8(1..60));
        }
        let _ = write!(html, "</{tag}>");
    }
}

/// Why a fuzz case failed.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FuzzFailure {
    /// The render finished but broke invariants.
    Violations {
        /// Violations of the original document.
        violations: Vec<Violation>,
        /// Smallest document found that still violates an invariant.
        minimized: String,
    },
    /// The render panicked.
    Panic {
        /// Panic payload, when it is a string.
        message: String,
    },
}

/// One failing seed.
#[derive(Debug, Clone, Serialize)]
pub struct FuzzCase {
    /// Generator seed.
    pub seed: u64,
    /// Generated document.
    pub html: String,
    /// What went wrong.
    pub failure: FuzzFailure,
}

/// Results of a fuzz run. Cases are sorted by seed regardless of the order
/// the workers finished in.
#[derive(Debug, Clone, Serialize)]
pub struct FuzzReport {
    /// Seeds run.
    pub cases_run: u64,
    /// Seeds whose documents violated an invariant.
    pub violations: Vec<FuzzCase>,
    /// Seeds whose documents panicked.
    pub panics: Vec<FuzzCase>,
}

impl FuzzReport {
    /// Whether every seed passed.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.violations.is_empty() && self.panics.is_empty()
    }
}

/// Lay out and paint `html`, returning every invariant violation, or the
/// panic message if the render panicked.
///
/// # Errors
///
/// Returns the panic message when layout or paint panics.
pub fn check_html(
    html: &str,
    viewport_width: f32,
    viewport_height: f32,
) -> Result<Vec<Violation>, String> {
    panic::catch_unwind(AssertUnwindSafe(|| {
        let tree = render_to_fragment_tree(html, viewport_width, viewport_height);
        let display_list = render_to_display_list(&tree);
        let mut violations = check_fragment_tree(&tree);
        violations.extend(check_display_list(&display_list));
        violations
    }))
    .map_err(|payload| {
        payload
            .downcast_ref::<&str>()
            .map(ToString::to_string)
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "non-string panic payload".to_string())
    })
}

fn run_seed(seed: u64, config: &HarnessConfig) -> Option<FuzzCase> {
    let html = Generator::new(seed, config.fuzz_max_elements).document();
    let (width, height) = (config.viewport_width, config.viewport_height);
    let failure = match check_html(&html, width, height) {
        Ok(violations) if violations.is_empty() => return None,
        Ok(violations) => {
            debug!("seed {seed}: {} violations, minimizing", violations.len());
            let minimized = minimize(&html, |candidate| {
                check_html(candidate, width, height).is_ok_and(|v| !v.is_empty())
            });
            FuzzFailure::Violations {
                violations,
                minimized,
            }
        }
        Err(message) => {
            error!("seed {seed}: render panicked: {message}");
            FuzzFailure::Panic { message }
        }
    };
    Some(FuzzCase {
        seed,
        html,
        failure,
    })
}

/// Run `config.fuzz_count` seeds starting at `config.fuzz_seed`, in
/// parallel.
#[must_use]
pub fn run_fuzz(config: &HarnessConfig) -> FuzzReport {
    let first = config.fuzz_seed;
    let last = first.saturating_add(config.fuzz_count);
    let mut failures: Vec<FuzzCase> = (first..last)
        .into_par_iter()
        .filter_map(|seed| run_seed(seed, config))
        .collect();
    failures.sort_by_key(|case| case.seed);
    let (panics, violations): (Vec<_>, Vec<_>) = failures
        .into_iter()
        .partition(|case| matches!(case.failure, FuzzFailure::Panic { .. }));
    let report = FuzzReport {
        cases_run: last - first,
        violations,
        panics,
    };
    info!(
        "fuzzed {} seeds: {} with violations, {} panicked",
        report.cases_run,
        report.violations.len(),
        report.panics.len()
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generator_is_deterministic() {
        let a = Generator::new(42, 16).document();
        let b = Generator::new(42, 16).document();
        assert_eq!(a, b);
        assert_ne!(a, Generator::new(43, 16).document());
    }

    #[test]
    fn test_generator_respects_element_budget() {
        for seed in 0..50 {
            let html = Generator::new(seed, 4).document();
            let opened = html.matches("</").count() - 4;
            assert!(opened <= 4, "seed {seed} opened {opened} elements: {html}");
        }
    }

    #[test]
    fn test_check_html_accepts_simple_document() {
        assert_eq!(check_html("<p>fine</p>", 200.0, 100.0), Ok(Vec::new()));
    }
}
