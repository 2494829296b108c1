//! Properties of the delta minimizer.

use quickcheck_macros::quickcheck;
use quokka_harness::{Generator, minimize};

fn two_as(s: &str) -> bool {
    s.chars().filter(|&c| c == 'a').count() >= 2
}

#[quickcheck]
fn minimized_output_still_fails(input: String) -> bool {
    let result = minimize(&input, two_as);
    if two_as(&input) {
        result == "aa"
    } else {
        result == input
    }
}

#[quickcheck]
fn minimized_output_never_grows(seed: u64) -> bool {
    let html = Generator::new(seed, 6).document();
    let result = minimize(&html, |s| s.contains("<li") || s.contains("<p"));
    result.len() <= html.len() && (result == html || result.contains("<li") || result.contains("<p"))
}

#[quickcheck]
fn minimize_is_deterministic(seed: u64) -> bool {
    let html = Generator::new(seed, 6).document();
    let predicate = |s: &str| s.contains("style");
    minimize(&html, predicate) == minimize(&html, predicate)
}
