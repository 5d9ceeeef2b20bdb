//! Streaming race extraction over listing markup.
//!
//! Each container selector is tried in a separate `lol_html` pass. Within a
//! pass, matched containers form a stack of open drafts; field elements scoped
//! to the container start text captures that collect every text chunk until
//! their end tag, or until a start tag implies an omitted one (`<p>`, `<li>`,
//! table cells). Nested containers each see the fields of their descendants.

use std::cell::RefCell;
use std::rc::Rc;

use lol_html::html_content::{Element, EndTag};
use lol_html::{RewriteStrSettings, Selector, doc_text, element, rewrite_str};
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use crate::application::sources::ListingSource;
use crate::domain::races::CandidateRecord;

use super::selectors::{CONTAINER_SELECTORS, FIELD_RULES, Field, LINK_SELECTOR, scoped};
use super::text::clean_text;

const TARGET: &str = "racefinder::scrape::extract";

/// Failure that makes a whole listing page unusable.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("invalid selector `{selector}`: {message}")]
    Selector { selector: String, message: String },
    #[error("failed to parse listing document: {message}")]
    Document { message: String },
}

/// Failure confined to one listing element.
#[derive(Debug, Error)]
enum ElementError {
    #[error("href `{href}` cannot be resolved: {message}")]
    UnresolvableHref { href: String, message: String },
    #[error("href `{href}` resolves to unsupported scheme `{scheme}`")]
    UnsupportedScheme { href: String, scheme: String },
}

/// Extract candidate races from one listing page.
///
/// Stops at the first container selector that matches at least one element.
/// Elements lacking a name, location, date or link are dropped silently;
/// elements with an unusable link are dropped with a warning.
pub fn extract_candidates(
    html: &str,
    source: &ListingSource,
) -> Result<Vec<CandidateRecord>, ExtractError> {
    for container in CONTAINER_SELECTORS {
        let drafts = scan(html, container)?;
        if drafts.is_empty() {
            continue;
        }

        debug!(
            target: TARGET,
            source = %source.url,
            container,
            matched = drafts.len(),
            "Container selector matched"
        );
        return Ok(build_candidates(drafts, source, container));
    }

    warn!(
        target: TARGET,
        source = %source.url,
        "No container selector matched the listing page"
    );
    Ok(Vec::new())
}

fn build_candidates(
    drafts: Vec<Draft>,
    source: &ListingSource,
    container: &str,
) -> Vec<CandidateRecord> {
    let root = source.root();
    let mut candidates = Vec::with_capacity(drafts.len());

    for (position, draft) in drafts.into_iter().enumerate() {
        match draft.into_candidate(&root, source) {
            Ok(Some(candidate)) => candidates.push(candidate),
            Ok(None) => {
                debug!(
                    target: TARGET,
                    source = %source.url,
                    container,
                    position,
                    "Skipping incomplete listing element"
                );
            }
            Err(err) => {
                warn!(
                    target: TARGET,
                    source = %source.url,
                    container,
                    position,
                    error = %err,
                    "Skipping listing element"
                );
            }
        }
    }

    candidates
}

/// Text collected for one matched container.
#[derive(Debug)]
struct Draft {
    /// `[rule][rank]`: `None` until the first element for that sub-selector
    /// opens, then the text of that element only.
    slots: Vec<Vec<Option<String>>>,
    /// `None` until the first link opens, then its `href` attribute.
    link: Option<Option<String>>,
}

impl Draft {
    fn new() -> Self {
        Self {
            slots: FIELD_RULES
                .iter()
                .map(|rule| vec![None; rule.selectors.len()])
                .collect(),
            link: None,
        }
    }

    fn text(&self, field: Field) -> Option<String> {
        let rule = FIELD_RULES.iter().position(|rule| rule.field == field)?;
        self.slots[rule]
            .iter()
            .flatten()
            .map(|raw| clean_text(raw))
            .find(|text| !text.is_empty())
    }

    fn into_candidate(
        self,
        root: &Url,
        source: &ListingSource,
    ) -> Result<Option<CandidateRecord>, ElementError> {
        let href = self
            .link
            .clone()
            .flatten()
            .map(|href| href.trim().to_string())
            .filter(|href| !href.is_empty());

        let (Some(name), Some(location), Some(date_text), Some(href)) = (
            self.text(Field::Name),
            self.text(Field::Location),
            self.text(Field::DateText),
            href,
        ) else {
            return Ok(None);
        };

        let url = resolve_href(root, &href)?;

        Ok(Some(CandidateRecord {
            name,
            location,
            date_text,
            url: url.to_string(),
            status_text: self.text(Field::Status).unwrap_or_default(),
            distance: source.distance,
        }))
    }
}

fn resolve_href(root: &Url, href: &str) -> Result<Url, ElementError> {
    let url = root
        .join(href)
        .map_err(|err| ElementError::UnresolvableHref {
            href: href.to_string(),
            message: err.to_string(),
        })?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(ElementError::UnsupportedScheme {
            href: href.to_string(),
            scheme: scheme.to_string(),
        }),
    }
}

#[derive(Debug)]
struct Capture {
    element: u64,
    draft: usize,
    rule: usize,
    rank: usize,
    tag: String,
}

#[derive(Debug)]
struct OpenContainer {
    draft: usize,
    tag: String,
}

#[derive(Debug, Default)]
struct ScanState {
    drafts: Vec<Draft>,
    open: Vec<OpenContainer>,
    captures: Vec<Capture>,
    next_element: u64,
}

impl ScanState {
    fn open_container(&mut self, tag: String) -> usize {
        let draft = self.drafts.len();
        self.drafts.push(Draft::new());
        self.open.push(OpenContainer { draft, tag });
        draft
    }

    fn close_container(&mut self, draft: usize) {
        self.open.retain(|open| open.draft != draft);
        self.captures.retain(|capture| capture.draft != draft);
    }

    /// End containers and captures whose end tag the markup left out and
    /// that a `tag` start tag closes.
    fn element_started(&mut self, tag: &str) {
        self.captures.retain(|capture| !implicitly_closes(&capture.tag, tag));

        let closed: Vec<usize> = self
            .open
            .iter()
            .filter(|open| implicitly_closes(&open.tag, tag))
            .map(|open| open.draft)
            .collect();
        for draft in closed {
            self.close_container(draft);
        }
    }

    /// Claim the `(rule, rank)` slot in every open draft that has not seen it yet.
    /// Returns the capture id when at least one draft claimed it.
    fn open_field(&mut self, rule: usize, rank: usize, tag: &str) -> Option<u64> {
        let element = self.next_element;
        self.next_element += 1;

        let mut claimed = false;
        for open in &self.open {
            let slot = &mut self.drafts[open.draft].slots[rule][rank];
            if slot.is_none() {
                *slot = Some(String::new());
                self.captures.push(Capture {
                    element,
                    draft: open.draft,
                    rule,
                    rank,
                    tag: tag.to_string(),
                });
                claimed = true;
            }
        }

        claimed.then_some(element)
    }

    fn close_field(&mut self, element: u64) {
        self.captures.retain(|capture| capture.element != element);
    }

    fn open_link(&mut self, href: Option<String>) {
        for open in &self.open {
            let link = &mut self.drafts[open.draft].link;
            if link.is_none() {
                *link = Some(href.clone());
            }
        }
    }

    fn append_text(&mut self, chunk: &str) {
        if chunk.is_empty() {
            return;
        }
        for capture in &self.captures {
            if let Some(text) = &mut self.drafts[capture.draft].slots[capture.rule][capture.rank] {
                text.push_str(chunk);
            }
        }
    }
}

/// Start tags that end an open `p` whose `</p>` was omitted.
const P_CLOSERS: &[&str] = &[
    "address", "article", "aside", "blockquote", "details", "dialog", "div", "dl", "fieldset",
    "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header",
    "hgroup", "hr", "main", "menu", "nav", "ol", "p", "pre", "section", "table", "ul",
];

fn implicitly_closes(open: &str, starting: &str) -> bool {
    match open {
        "p" => P_CLOSERS.contains(&starting),
        "li" => starting == "li",
        "dt" | "dd" => matches!(starting, "dt" | "dd"),
        "td" | "th" => matches!(starting, "td" | "th" | "tr" | "tbody" | "thead" | "tfoot"),
        "tr" => matches!(starting, "tr" | "tbody" | "thead" | "tfoot"),
        "option" => matches!(starting, "option" | "optgroup"),
        _ => false,
    }
}

fn tag_of(el: &Element<'_, '_>) -> String {
    el.tag_name().to_ascii_lowercase()
}

/// Run `finish` when `el` closes. Returns `false` for elements without an end tag.
fn on_end_tag(el: &mut Element<'_, '_>, finish: impl FnOnce() + 'static) -> bool {
    match el.end_tag_handlers() {
        Some(handlers) => {
            handlers.push(Box::new(move |_end: &mut EndTag<'_>| {
                finish();
                Ok(())
            }));
            true
        }
        None => false,
    }
}

fn validate_selector(selector: &str) -> Result<(), ExtractError> {
    selector
        .parse::<Selector>()
        .map(|_| ())
        .map_err(|err| ExtractError::Selector {
            selector: selector.to_string(),
            message: err.to_string(),
        })
}

/// One streaming pass collecting drafts for every element matching `container`.
fn scan(html: &str, container: &str) -> Result<Vec<Draft>, ExtractError> {
    let link_selector = scoped(container, LINK_SELECTOR);
    let field_selectors: Vec<(usize, usize, String)> = FIELD_RULES
        .iter()
        .enumerate()
        .flat_map(|(rule, field)| {
            field
                .selectors
                .iter()
                .enumerate()
                .map(move |(rank, inner)| (rule, rank, scoped(container, inner)))
        })
        .collect();

    validate_selector(container)?;
    validate_selector(&link_selector)?;
    for (_, _, selector) in &field_selectors {
        validate_selector(selector)?;
    }

    let state = Rc::new(RefCell::new(ScanState::default()));

    // Registered first so implied ends apply before the new element opens.
    let mut element_content_handlers = vec![
        element!("*", {
            let state = Rc::clone(&state);
            move |el| {
                state.borrow_mut().element_started(&tag_of(el));
                Ok(())
            }
        }),
        element!(container, {
            let state = Rc::clone(&state);
            move |el| {
                let index = state.borrow_mut().open_container(tag_of(el));
                let closer = Rc::clone(&state);
                if !on_end_tag(el, move || closer.borrow_mut().close_container(index)) {
                    state.borrow_mut().close_container(index);
                }
                Ok(())
            }
        }),
        element!(link_selector.as_str(), {
            let state = Rc::clone(&state);
            move |el| {
                state.borrow_mut().open_link(el.get_attribute("href"));
                Ok(())
            }
        }),
    ];

    for (rule, rank, selector) in &field_selectors {
        let (rule, rank) = (*rule, *rank);
        element_content_handlers.push(element!(selector.as_str(), {
            let state = Rc::clone(&state);
            move |el| {
                let tag = tag_of(el);
                let Some(element) = state.borrow_mut().open_field(rule, rank, &tag) else {
                    return Ok(());
                };
                let closer = Rc::clone(&state);
                if !on_end_tag(el, move || closer.borrow_mut().close_field(element)) {
                    state.borrow_mut().close_field(element);
                }
                Ok(())
            }
        }));
    }

    rewrite_str(
        html,
        RewriteStrSettings {
            element_content_handlers,
            document_content_handlers: vec![doc_text!({
                let state = Rc::clone(&state);
                move |chunk| {
                    state.borrow_mut().append_text(chunk.as_str());
                    Ok(())
                }
            })],
            ..RewriteStrSettings::default()
        },
    )
    .map_err(|err| ExtractError::Document {
        message: err.to_string(),
    })?;

    let drafts = std::mem::take(&mut state.borrow_mut().drafts);
    Ok(drafts)
}
