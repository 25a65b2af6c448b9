use crate::error::PageFault;
use scraper::{ElementRef, Html, Selector};

/// Read-only query capability over one rendered page. The engine consumes a
/// ready page through this seam; whoever produced the page (HTTP fetch,
/// headless browser, fixture) owns its lifecycle.
///
/// "Element not found" is a first-class outcome (`Ok(None)` / empty vec);
/// only an unusable page or an unevaluable selector is a `PageFault`.
pub trait PageHandle {
    type Element<'a>
    where
        Self: 'a;

    fn query_one<'a>(&'a self, selector: &str) -> Result<Option<Self::Element<'a>>, PageFault>;
    fn query_all<'a>(&'a self, selector: &str) -> Result<Vec<Self::Element<'a>>, PageFault>;
    fn text_of(&self, element: &Self::Element<'_>) -> Result<String, PageFault>;
    fn attr_of(
        &self,
        element: &Self::Element<'_>,
        name: &str,
    ) -> Result<Option<String>, PageFault>;
}

/// Page backed by a parsed HTML document.
pub struct HtmlPage {
    doc: Html,
}

impl HtmlPage {
    pub fn parse(html: &str) -> Self {
        Self {
            doc: Html::parse_document(html),
        }
    }
}

impl PageHandle for HtmlPage {
    type Element<'a>
        = ElementRef<'a>
    where
        Self: 'a;

    fn query_one<'a>(&'a self, selector: &str) -> Result<Option<ElementRef<'a>>, PageFault> {
        let parsed = parse_selector(selector)?;
        Ok(self.doc.select(&parsed).next())
    }

    fn query_all<'a>(&'a self, selector: &str) -> Result<Vec<ElementRef<'a>>, PageFault> {
        let parsed = parse_selector(selector)?;
        Ok(self.doc.select(&parsed).collect())
    }

    fn text_of(&self, element: &ElementRef<'_>) -> Result<String, PageFault> {
        Ok(element_text(*element))
    }

    fn attr_of(&self, element: &ElementRef<'_>, name: &str) -> Result<Option<String>, PageFault> {
        Ok(element.value().attr(name).map(ToString::to_string))
    }
}

fn parse_selector(selector: &str) -> Result<Selector, PageFault> {
    Selector::parse(selector)
        .map_err(|err| PageFault::new(format!("invalid selector {selector}: {err}")))
}

const BLOCK_TAGS: &[&str] = &[
    "address",
    "article",
    "aside",
    "blockquote",
    "div",
    "dl",
    "dt",
    "dd",
    "fieldset",
    "figcaption",
    "figure",
    "footer",
    "form",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "header",
    "hr",
    "li",
    "main",
    "nav",
    "ol",
    "p",
    "pre",
    "section",
    "table",
    "tr",
    "ul",
];

/// Visible-text rendition of an element: block children and `<br>` become
/// line breaks, whitespace collapses within a line. Field rules that expect
/// a multi-line block (date over time) rely on these line breaks.
pub fn element_text(element: ElementRef<'_>) -> String {
    let mut raw = String::new();
    collect_text(element, &mut raw);

    raw.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            out.push_str(text);
        } else if let Some(el) = ElementRef::wrap(child) {
            let name = el.value().name();
            if name == "br" {
                out.push('\n');
                continue;
            }
            let block = BLOCK_TAGS.contains(&name);
            if block {
                out.push('\n');
            }
            collect_text(el, out);
            if block {
                out.push('\n');
            }
        }
    }
}
