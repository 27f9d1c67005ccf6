//! Keyword scan over a parsed career page.
//!
//! Every element of the document is offered to a [`TextMatcher`]; accepted
//! elements become `(title, link)` candidates. The scan is a heuristic: any
//! element whose text happens to contain the keyword is reported, including
//! wrappers around an already-matched element.

use ego_tree::NodeId;
use scraper::{ElementRef, Html, Node};
use std::cell::{OnceCell, RefCell};
use std::collections::HashMap;
use url::Url;

/// Elements the default matcher looks at.
pub const SCANNED_TAGS: [&str; 4] = ["a", "h3", "span", "div"];

/// The slice of a DOM element a matcher may inspect.
pub trait PageNode {
    fn tag_name(&self) -> &str;

    /// Whitespace-collapsed text, if the element has a single string.
    fn text(&self) -> Option<&str>;

    fn attr(&self, name: &str) -> Option<&str>;
}

/// Decides whether an element is a job-title candidate.
pub trait TextMatcher {
    fn matches(&self, node: &dyn PageNode) -> bool;
}

/// Case-sensitive substring match on the text of the scanned tags.
#[derive(Debug, Clone)]
pub struct KeywordMatcher<'k> {
    keyword: &'k str,
}

impl<'k> KeywordMatcher<'k> {
    pub fn new(keyword: &'k str) -> Self {
        Self { keyword }
    }
}

impl TextMatcher for KeywordMatcher<'_> {
    fn matches(&self, node: &dyn PageNode) -> bool {
        if !SCANNED_TAGS.contains(&node.tag_name()) {
            return false;
        }
        node.text()
            .is_some_and(|text| !text.is_empty() && text.contains(self.keyword))
    }
}

/// A matched element before it is stamped with company and time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub title: String,
    pub link: String,
}

/// Turns anchor hrefs into absolute links.
#[derive(Debug, Clone)]
pub struct LinkResolver {
    page_url: String,
    base: Option<Url>,
}

impl LinkResolver {
    /// Relative hrefs are joined to `base_url`, or to `page_url` when no
    /// base is given.
    pub fn new(page_url: &str, base_url: Option<&str>) -> Self {
        let base = base_url
            .map(Url::parse)
            .unwrap_or_else(|| Url::parse(page_url))
            .ok();
        Self {
            page_url: page_url.to_string(),
            base,
        }
    }

    pub fn resolve(&self, node: &dyn PageNode) -> String {
        let href = match node.attr("href").map(str::trim) {
            Some(href) if node.tag_name() == "a" && !href.is_empty() => href,
            _ => return self.page_url.clone(),
        };

        if href.starts_with("http") {
            return href.to_string();
        }

        match &self.base {
            Some(base) => base
                .join(href)
                .map(String::from)
                .unwrap_or_else(|_| href.to_string()),
            None => href.to_string(),
        }
    }
}

/// Scans `html` and returns one candidate per accepted element, in
/// document order. Malformed markup is recovered by the parser, never
/// reported.
pub fn extract(html: &str, matcher: &dyn TextMatcher, links: &LinkResolver) -> Vec<Candidate> {
    let document = Html::parse_document(html);
    let strings = RefCell::new(SoleStrings::default());

    let candidates: Vec<Candidate> = document
        .root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
        .map(|element| HtmlNode::new(element, &strings))
        .filter(|node| matcher.matches(node))
        .filter_map(|node| {
            let title = node.text()?.to_string();
            Some(Candidate {
                link: links.resolve(&node),
                title,
            })
        })
        .collect();
    candidates
}

/// [`PageNode`] over a `scraper` element. Text is resolved on first use.
struct HtmlNode<'a, 's> {
    element: ElementRef<'a>,
    strings: &'s RefCell<SoleStrings<'a>>,
    text: OnceCell<Option<String>>,
}

impl<'a, 's> HtmlNode<'a, 's> {
    fn new(element: ElementRef<'a>, strings: &'s RefCell<SoleStrings<'a>>) -> Self {
        Self {
            element,
            strings,
            text: OnceCell::new(),
        }
    }
}

impl PageNode for HtmlNode<'_, '_> {
    fn tag_name(&self) -> &str {
        self.element.value().name()
    }

    fn text(&self) -> Option<&str> {
        self.text
            .get_or_init(|| {
                self.strings
                    .borrow_mut()
                    .resolve(self.element)
                    .map(collapse_whitespace)
            })
            .as_deref()
    }

    fn attr(&self, name: &str) -> Option<&str> {
        self.element.value().attr(name)
    }
}

/// Sole strings of one document's elements.
///
/// An element has a sole string when its only child is a text node, or an
/// element that itself has one. Mixed content has none. Nested wrappers
/// share the string at the bottom of their single-child chain, so every
/// chain is walked once.
#[derive(Default)]
struct SoleStrings<'a> {
    known: HashMap<NodeId, Option<&'a str>>,
}

impl<'a> SoleStrings<'a> {
    fn resolve(&mut self, element: ElementRef<'a>) -> Option<&'a str> {
        let mut chain = Vec::new();
        let mut node = *element;

        let found = loop {
            if let Some(&known) = self.known.get(&node.id()) {
                break known;
            }
            chain.push(node.id());

            let mut children = node.children();
            let (Some(only), None) = (children.next(), children.next()) else {
                break None;
            };
            match only.value() {
                Node::Text(text) => break Some(&**text),
                Node::Element(_) => node = only,
                _ => break None,
            }
        };

        for id in chain {
            self.known.insert(id, found);
        }
        found
    }
}

fn collapse_whitespace(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}
