//! Minimal browser-automation capability set.
//!
//! The scraper never talks to a specific automation product. Anything that
//! can navigate, look up elements, read them, click them and scroll a
//! container can drive extraction.

use serde::{Deserialize, Serialize};

use crate::error::BrowserResult;
use crate::types::ImportedCookie;

/// Element lookup strategy.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "by", content = "value", rename_all = "lowercase")]
pub enum Selector {
    Css(String),
    #[serde(rename = "xpath")]
    XPath(String),
    /// Single CSS class name.
    Class(String),
}

impl Selector {
    pub fn css(s: impl Into<String>) -> Self {
        Self::Css(s.into())
    }

    pub fn xpath(s: impl Into<String>) -> Self {
        Self::XPath(s.into())
    }

    pub fn class(s: impl Into<String>) -> Self {
        Self::Class(s.into())
    }
}

impl std::fmt::Display for Selector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Css(s) => write!(f, "css:{}", s),
            Self::XPath(s) => write!(f, "xpath:{}", s),
            Self::Class(s) => write!(f, "class:{}", s),
        }
    }
}

/// Opaque reference to a live element, valid until the page re-renders it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementRef(pub String);

impl ElementRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn id(&self) -> &str {
        &self.0
    }
}

/// Blocking automation handle. One handle drives one page on one thread.
pub trait AutomationHandle {
    fn navigate(&mut self, url: &str) -> BrowserResult<()>;

    fn refresh(&mut self) -> BrowserResult<()>;

    /// First match under `scope` (or the document when `None`).
    fn find_element(&mut self, scope: Option<&ElementRef>, selector: &Selector) -> BrowserResult<ElementRef>;

    /// All matches under `scope`, in document order. No match is an empty list.
    fn find_elements(
        &mut self,
        scope: Option<&ElementRef>,
        selector: &Selector,
    ) -> BrowserResult<Vec<ElementRef>>;

    fn text(&mut self, element: &ElementRef) -> BrowserResult<String>;

    fn attribute(&mut self, element: &ElementRef, name: &str) -> BrowserResult<Option<String>>;

    fn click(&mut self, element: &ElementRef) -> BrowserResult<()>;

    /// Click dispatched from page script; works on elements covered by overlays.
    fn script_click(&mut self, element: &ElementRef) -> BrowserResult<()>;

    fn scroll_by(&mut self, container: &ElementRef, delta: i64) -> BrowserResult<()>;

    fn set_scroll_top(&mut self, container: &ElementRef, top: i64) -> BrowserResult<()>;

    fn scroll_top(&mut self, container: &ElementRef) -> BrowserResult<i64>;

    fn scroll_height(&mut self, container: &ElementRef) -> BrowserResult<i64>;

    fn add_cookie(&mut self, cookie: &ImportedCookie) -> BrowserResult<()>;

    fn delete_all_cookies(&mut self) -> BrowserResult<()>;

    fn quit(&mut self) -> BrowserResult<()>;
}
