//! User-agent stylesheet.
//!
//! [CSS 2.1 Appendix D](https://www.w3.org/TR/CSS2/sample.html) and
//! [WHATWG HTML § 15 Rendering](https://html.spec.whatwg.org/multipage/rendering.html).
//!
//! UA rules sit at the bottom of the cascade: any author declaration beats
//! them regardless of specificity.

use std::sync::OnceLock;

use crate::parser::{Stylesheet, parse_stylesheet};

const UA_CSS: &str = r#"
html, address, blockquote, body, dd, div, dl, dt, fieldset, form,
frame, frameset, h1, h2, h3, h4, h5, h6, noframes, ol, p, ul, center,
dir, hr, menu, pre, article, aside, footer, header, main, nav, section,
figure, figcaption, details, summary, legend, hgroup
    { display: block }
li { display: list-item }
head, script, style, title, meta, link, base, template, area, param,
noscript, datalist, noembed { display: none }
table { display: table }
tr { display: table-row }
thead { display: table-header-group }
tbody { display: table-row-group }
tfoot { display: table-footer-group }
col { display: table-column }
colgroup { display: table-column-group }
td, th { display: table-cell }
caption { display: table-caption; text-align: center }
th { font-weight: bolder; text-align: center }
img, input, button, select, textarea { display: inline-block }
body { margin: 8px }
h1 { font-size: 2em; margin: .67em 0 }
h2 { font-size: 1.5em; margin: .83em 0 }
h3 { font-size: 1.17em; margin: 1em 0 }
h4, p, blockquote, ul, fieldset, form, ol, dl, dir, menu { margin: 1em 0 }
h5 { font-size: .83em; margin: 1.67em 0 }
h6 { font-size: .67em; margin: 2.33em 0 }
h1, h2, h3, h4, h5, h6, b, strong { font-weight: bolder }
blockquote, figure { margin-left: 40px; margin-right: 40px }
i, cite, em, var, address, dfn { font-style: italic }
pre, tt, code, kbd, samp { font-family: monospace }
pre { white-space: pre }
big { font-size: 1.17em }
small, sub, sup { font-size: .83em }
s, strike, del { text-decoration: line-through }
u, ins { text-decoration: underline }
a:link { color: #0000ee; text-decoration: underline }
hr { border: 1px inset; margin: .5em 0 }
ol, ul, dir, menu, dd { margin-left: 0 }
ol, ul, dir, menu { padding-left: 40px }
dd { margin-left: 40px }
ol ul, ul ol, ul ul, ol ol { margin-top: 0; margin-bottom: 0 }
ol { list-style-type: decimal }
ul ul, ol ul { list-style-type: circle }
ol ul ul, ol ol ul, ul ol ul, ul ul ul { list-style-type: square }
ol, ul { counter-reset: list-item }
center { text-align: center }
q:before { content: open-quote }
q:after { content: close-quote }
"#;

/// The parsed UA stylesheet, built on first use.
pub fn ua_stylesheet() -> &'static Stylesheet {
    static SHEET: OnceLock<Stylesheet> = OnceLock::new();
    SHEET.get_or_init(|| parse_stylesheet(UA_CSS))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Rule;
    use crate::selector::parse_selector_list;

    #[test]
    fn every_ua_selector_parses() {
        for rule in &ua_stylesheet().rules {
            if let Rule::Style(style) = rule {
                assert!(
                    parse_selector_list(&style.prelude).is_some(),
                    "UA selector '{}' should parse",
                    style.selector_text()
                );
            }
        }
    }
}
