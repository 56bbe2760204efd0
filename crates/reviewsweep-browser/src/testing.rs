//! In-memory automation handle for tests and offline replays (feature `testing`).
//!
//! Models one listing page: an optional title, a review tab, a sort menu,
//! a scrollable container and a list of review blocks. Element ids are
//! plain strings (`"block-3/rating"`), and every mutating call is appended
//! to [`FakeBrowser::log`].

use tokio_util::sync::CancellationToken;

use crate::config::ReviewSelectors;
use crate::error::{BrowserError, BrowserResult};
use crate::handle::{AutomationHandle, ElementRef, Selector};
use crate::types::ImportedCookie;

pub const PLACE_ID: &str = "place";
pub const REVIEWS_TAB_ID: &str = "reviews-tab";
pub const SORT_ID: &str = "sort";
pub const LOWEST_OPTION_ID: &str = "opt-lowest";
pub const DEFAULT_OPTION_ID: &str = "opt-default";
pub const CONTAINER_ID: &str = "container";

/// One rendered review block. `None` fields are absent from the DOM.
#[derive(Debug, Clone, Default)]
pub struct FakeBlock {
    pub rating_label: Option<String>,
    pub text: Option<String>,
    pub user: Option<String>,
    pub date: Option<String>,
    pub total_reviews: Option<String>,
    pub has_more: bool,
    /// Every read of this block fails as a stale element.
    pub broken: bool,
}

impl FakeBlock {
    pub fn review(rating: f64, user: &str, text: &str, date: &str) -> Self {
        Self {
            rating_label: Some(format!("{} stars", rating)),
            text: Some(text.to_string()),
            user: Some(user.to_string()),
            date: Some(date.to_string()),
            total_reviews: Some("12 reviews".to_string()),
            has_more: false,
            broken: false,
        }
    }

    pub fn broken() -> Self {
        Self {
            broken: true,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Rating,
    Text,
    User,
    Date,
    Total,
    More,
}

impl Field {
    fn name(self) -> &'static str {
        match self {
            Self::Rating => "rating",
            Self::Text => "text",
            Self::User => "user",
            Self::Date => "date",
            Self::Total => "total",
            Self::More => "more",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        match name {
            "rating" => Some(Self::Rating),
            "text" => Some(Self::Text),
            "user" => Some(Self::User),
            "date" => Some(Self::Date),
            "total" => Some(Self::Total),
            "more" => Some(Self::More),
            _ => None,
        }
    }
}

pub struct FakeBrowser {
    pub selectors: ReviewSelectors,
    pub place: Option<String>,
    pub blocks: Vec<FakeBlock>,
    pub sort_available: bool,
    pub container_present: bool,
    pub fail_navigation: bool,
    pub scroll_top: i64,
    pub scroll_height: i64,
    /// Height increments released one by one when the height is read at the bottom.
    pub growth: Vec<i64>,
    /// The list keeps growing on every scroll step.
    pub endless: bool,
    /// Cancel the token on the n-th `scroll_by` call.
    pub cancel_on_scroll: Option<(usize, CancellationToken)>,
    /// Cookies carrying an expiry are rejected.
    pub reject_expiring_cookies: bool,
    pub cookies: Vec<ImportedCookie>,
    pub log: Vec<String>,
    scroll_calls: usize,
}

impl FakeBrowser {
    pub fn with_blocks(blocks: Vec<FakeBlock>) -> Self {
        Self {
            selectors: ReviewSelectors::default(),
            place: Some("Cafe Luna".to_string()),
            blocks,
            sort_available: true,
            container_present: true,
            fail_navigation: false,
            scroll_top: 0,
            scroll_height: 2000,
            growth: Vec::new(),
            endless: false,
            cancel_on_scroll: None,
            reject_expiring_cookies: false,
            cookies: Vec::new(),
            log: Vec::new(),
            scroll_calls: 0,
        }
    }

    /// Number of log entries starting with `prefix`.
    pub fn count(&self, prefix: &str) -> usize {
        self.log.iter().filter(|l| l.starts_with(prefix)).count()
    }

    fn missing(selector: &Selector) -> BrowserError {
        BrowserError::NoSuchElement(selector.to_string())
    }

    fn block_field(&self, selector: &Selector) -> Option<Field> {
        let s = &self.selectors;
        [
            (&s.rating, Field::Rating),
            (&s.text, Field::Text),
            (&s.user, Field::User),
            (&s.date, Field::Date),
            (&s.total_reviews, Field::Total),
            (&s.more_button, Field::More),
        ]
        .into_iter()
        .find(|(sel, _)| *sel == selector)
        .map(|(_, f)| f)
    }

    fn block(&self, id: &str) -> BrowserResult<(usize, &FakeBlock)> {
        let idx = id
            .strip_prefix("block-")
            .and_then(|rest| rest.split('/').next())
            .and_then(|n| n.parse::<usize>().ok())
            .ok_or_else(|| BrowserError::StaleElement(id.to_string()))?;
        let block = self
            .blocks
            .get(idx)
            .ok_or_else(|| BrowserError::StaleElement(id.to_string()))?;
        if block.broken {
            return Err(BrowserError::StaleElement(id.to_string()));
        }
        Ok((idx, block))
    }

    fn field_value(block: &FakeBlock, field: Field) -> Option<&String> {
        match field {
            Field::Rating => block.rating_label.as_ref(),
            Field::Text => block.text.as_ref(),
            Field::User => block.user.as_ref(),
            Field::Date => block.date.as_ref(),
            Field::Total => block.total_reviews.as_ref(),
            Field::More => None,
        }
    }

    fn element_field(&self, element: &ElementRef) -> BrowserResult<(&FakeBlock, Field)> {
        let (_, block) = self.block(element.id())?;
        let field = element
            .id()
            .rsplit_once('/')
            .and_then(|(_, name)| Field::from_name(name))
            .ok_or_else(|| BrowserError::StaleElement(element.id().to_string()))?;
        Ok((block, field))
    }
}

impl AutomationHandle for FakeBrowser {
    fn navigate(&mut self, url: &str) -> BrowserResult<()> {
        self.log.push(format!("navigate:{}", url));
        if self.fail_navigation {
            return Err(BrowserError::Navigation(format!("{} unreachable", url)));
        }
        Ok(())
    }

    fn refresh(&mut self) -> BrowserResult<()> {
        self.log.push("refresh".into());
        Ok(())
    }

    fn find_element(&mut self, scope: Option<&ElementRef>, selector: &Selector) -> BrowserResult<ElementRef> {
        if let Some(block_ref) = scope {
            let field = self.block_field(selector).ok_or_else(|| Self::missing(selector))?;
            let (idx, block) = self.block(block_ref.id())?;
            let present = match field {
                Field::More => block.has_more,
                other => Self::field_value(block, other).is_some(),
            };
            if !present {
                return Err(Self::missing(selector));
            }
            return Ok(ElementRef::new(format!("block-{}/{}", idx, field.name())));
        }

        let s = &self.selectors;
        let id = if *selector == s.place && self.place.is_some() {
            PLACE_ID
        } else if *selector == s.reviews_tab {
            REVIEWS_TAB_ID
        } else if *selector == s.sort_button && self.sort_available {
            SORT_ID
        } else if *selector == s.container && self.container_present {
            CONTAINER_ID
        } else {
            return Err(Self::missing(selector));
        };
        Ok(ElementRef::new(id))
    }

    fn find_elements(
        &mut self,
        _scope: Option<&ElementRef>,
        selector: &Selector,
    ) -> BrowserResult<Vec<ElementRef>> {
        let s = &self.selectors;
        if *selector == s.review_block {
            return Ok((0..self.blocks.len())
                .map(|i| ElementRef::new(format!("block-{}", i)))
                .collect());
        }
        if *selector == s.lowest_rating_option && self.sort_available {
            return Ok(vec![ElementRef::new(LOWEST_OPTION_ID)]);
        }
        if *selector == s.default_sort_option && self.sort_available {
            return Ok(vec![ElementRef::new(DEFAULT_OPTION_ID)]);
        }
        Ok(Vec::new())
    }

    fn text(&mut self, element: &ElementRef) -> BrowserResult<String> {
        if element.id() == PLACE_ID {
            return self
                .place
                .clone()
                .ok_or_else(|| BrowserError::StaleElement(PLACE_ID.into()));
        }
        let (block, field) = self.element_field(element)?;
        Self::field_value(block, field)
            .cloned()
            .ok_or_else(|| BrowserError::StaleElement(element.id().to_string()))
    }

    fn attribute(&mut self, element: &ElementRef, name: &str) -> BrowserResult<Option<String>> {
        let (block, field) = self.element_field(element)?;
        if field == Field::Rating && name == self.selectors.rating_attribute {
            return Ok(block.rating_label.clone());
        }
        Ok(None)
    }

    fn click(&mut self, element: &ElementRef) -> BrowserResult<()> {
        self.log.push(format!("click:{}", element.id()));
        Ok(())
    }

    fn script_click(&mut self, element: &ElementRef) -> BrowserResult<()> {
        self.log.push(format!("script_click:{}", element.id()));
        Ok(())
    }

    fn scroll_by(&mut self, _container: &ElementRef, delta: i64) -> BrowserResult<()> {
        self.scroll_calls += 1;
        if let Some((n, token)) = &self.cancel_on_scroll {
            if self.scroll_calls >= *n {
                token.cancel();
            }
        }
        if self.endless {
            self.scroll_height = self.scroll_top + delta + 1000;
        }
        self.scroll_top = (self.scroll_top + delta).clamp(0, self.scroll_height);
        Ok(())
    }

    fn set_scroll_top(&mut self, container: &ElementRef, top: i64) -> BrowserResult<()> {
        self.log.push(format!("set_scroll_top:{}:{}", container.id(), top));
        self.scroll_top = top.clamp(0, self.scroll_height);
        Ok(())
    }

    fn scroll_top(&mut self, _container: &ElementRef) -> BrowserResult<i64> {
        Ok(self.scroll_top)
    }

    fn scroll_height(&mut self, _container: &ElementRef) -> BrowserResult<i64> {
        if self.scroll_top >= self.scroll_height && !self.growth.is_empty() {
            self.scroll_height += self.growth.remove(0);
        }
        Ok(self.scroll_height)
    }

    fn add_cookie(&mut self, cookie: &ImportedCookie) -> BrowserResult<()> {
        if self.reject_expiring_cookies && cookie.expiration_date.is_some() {
            return Err(BrowserError::Script(format!("invalid expiry on {}", cookie.name)));
        }
        self.log.push(format!("add_cookie:{}", cookie.name));
        self.cookies.push(cookie.clone());
        Ok(())
    }

    fn delete_all_cookies(&mut self) -> BrowserResult<()> {
        self.log.push("delete_all_cookies".into());
        self.cookies.clear();
        Ok(())
    }

    fn quit(&mut self) -> BrowserResult<()> {
        self.log.push("quit".into());
        Ok(())
    }
}
