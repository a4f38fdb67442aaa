//! Locator delegates and their resolution.
//!
//! A delegate is either a raw XPath (`//...` or `(//...`) that passes through
//! untouched, or a `component.widgetType.key` triple looked up in the
//! component's locator table.
//!
//! # Resolution order
//!
//! ```text
//! delegate ──► raw XPath? ──yes──► Locator (identity)
//!                 │ no
//!                 ▼
//!          split on '.' (exactly 3 parts, else MalformedDelegate)
//!                 │
//!                 ▼
//!     declared PageDefinition ──hit──► Locator
//!                 │ miss
//!                 ▼
//!     PropertySource (cached per component) ──► Locator
//!                                  │
//!                 PropertyStoreUnavailable / PropertyKeyMissing
//! ```

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use crate::properties::PropertyStore;
use crate::result::{ActionError, ActionResult};
use crate::widget::WidgetType;

/// Key whose resolved value is masked in logs
pub const PASSWORD_KEY: &str = "password";

/// File extension of component locator files
pub const PROPERTIES_EXTENSION: &str = "properties";

fn raw_xpath_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\(*//").expect("static raw-xpath pattern"))
}

/// How a concrete locator string is interpreted by the driver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LocatorKind {
    /// XPath expression
    XPath,
    /// CSS selector
    Css,
}

/// Concrete locator handed to the driver
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Locator {
    kind: LocatorKind,
    value: String,
}

impl Locator {
    /// Classify a locator string (`/` or `(` prefix means XPath)
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        let value = value.into();
        let kind = if value.starts_with('/') || value.starts_with('(') {
            LocatorKind::XPath
        } else {
            LocatorKind::Css
        };
        Self { kind, value }
    }

    /// XPath locator
    #[must_use]
    pub fn xpath(value: impl Into<String>) -> Self {
        Self {
            kind: LocatorKind::XPath,
            value: value.into(),
        }
    }

    /// CSS locator
    #[must_use]
    pub fn css(value: impl Into<String>) -> Self {
        Self {
            kind: LocatorKind::Css,
            value: value.into(),
        }
    }

    /// Locator kind
    #[must_use]
    pub const fn kind(&self) -> LocatorKind {
        self.kind
    }

    /// Locator text
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.value
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

/// Parsed form of a delegate string
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocatorDelegate {
    /// Raw XPath, used as-is
    Raw(String),
    /// `component.widgetType.key`
    Structured {
        /// Component (page) name
        component: String,
        /// Widget tag as written
        widget: String,
        /// Key in the component's locator table
        key: String,
    },
}

impl LocatorDelegate {
    /// Parse a delegate string
    pub fn parse(delegate: &str) -> ActionResult<Self> {
        if raw_xpath_pattern().is_match(delegate) {
            return Ok(Self::Raw(delegate.to_string()));
        }

        let parts: Vec<&str> = delegate.split('.').collect();
        match parts.as_slice() {
            [component, widget, key]
                if !component.is_empty() && !widget.is_empty() && !key.is_empty() =>
            {
                Ok(Self::Structured {
                    component: (*component).to_string(),
                    widget: (*widget).to_string(),
                    key: (*key).to_string(),
                })
            }
            _ => Err(ActionError::MalformedDelegate {
                delegate: delegate.to_string(),
            }),
        }
    }

    /// True for raw XPath delegates
    #[must_use]
    pub const fn is_raw(&self) -> bool {
        matches!(self, Self::Raw(_))
    }

    /// Widget tag of a structured delegate, if it names a known widget
    #[must_use]
    pub fn widget_type(&self) -> Option<WidgetType> {
        match self {
            Self::Raw(_) => None,
            Self::Structured { widget, .. } => widget.parse().ok(),
        }
    }
}

/// Outcome of resolving a delegate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLocator {
    /// Delegate as given by the caller
    pub delegate: String,
    /// Concrete locator
    pub locator: Locator,
    /// Widget tag carried by the delegate
    pub widget: Option<WidgetType>,
}

/// Loads one property store per component
pub trait PropertySource: fmt::Debug {
    /// Open the store for `component`
    ///
    /// # Errors
    ///
    /// Returns [`ActionError::PropertyStoreUnavailable`] when the store cannot be
    /// located or read.
    fn open(&self, component: &str) -> ActionResult<PropertyStore>;
}

/// Reads `<root>/<component>.properties`
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    /// Create a source rooted at `root`
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Path of a component's file
    #[must_use]
    pub fn path_for(&self, component: &str) -> PathBuf {
        self.root
            .join(component)
            .with_extension(PROPERTIES_EXTENSION)
    }

    /// Root directory
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl PropertySource for DirectorySource {
    fn open(&self, component: &str) -> ActionResult<PropertyStore> {
        PropertyStore::from_file(component, &self.path_for(component))
    }
}

/// Locators of one component, declared in code
///
/// # Example
///
/// ```
/// use probar_pom::{PageDefinition, WidgetType};
///
/// let login = PageDefinition::new("Login")
///     .with_locator(WidgetType::EditField, "User", "//input[@name='user']")
///     .with_locator(WidgetType::Button, "Submit", "//button[@type='submit']");
/// assert_eq!(login.len(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct PageDefinition {
    component: String,
    locators: HashMap<(Option<WidgetType>, String), String>,
}

impl PageDefinition {
    /// Create an empty definition for `component`
    #[must_use]
    pub fn new(component: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            locators: HashMap::new(),
        }
    }

    /// Declare a locator for a widget key
    #[must_use]
    pub fn with_locator(
        mut self,
        widget: WidgetType,
        key: impl Into<String>,
        locator: impl Into<String>,
    ) -> Self {
        let _ = self
            .locators
            .insert((Some(widget), key.into()), locator.into());
        self
    }

    /// Declare every key of a property store (no widget tag)
    #[must_use]
    pub fn from_store(store: &PropertyStore, keys: &[&str]) -> Self {
        let mut page = Self::new(store.name());
        for key in keys {
            if let Some(value) = store.get(key) {
                let _ = page
                    .locators
                    .insert((None, (*key).to_string()), value.to_string());
            }
        }
        page
    }

    /// Component name
    #[must_use]
    pub fn component(&self) -> &str {
        &self.component
    }

    /// Exact `(widget, key)` match first, then the untagged entry, then the
    /// only entry with this key. A key declared under several widget types
    /// never matches a different widget type.
    #[must_use]
    pub fn lookup(&self, widget: Option<WidgetType>, key: &str) -> Option<&str> {
        self.locators
            .get(&(widget, key.to_string()))
            .or_else(|| self.locators.get(&(None, key.to_string())))
            .or_else(|| {
                let mut matching = self
                    .locators
                    .iter()
                    .filter(|((_, k), _)| k == key)
                    .map(|(_, v)| v);
                match (matching.next(), matching.next()) {
                    (Some(only), None) => Some(only),
                    _ => None,
                }
            })
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    /// Number of declared locators
    #[must_use]
    pub fn len(&self) -> usize {
        self.locators.len()
    }

    /// True if nothing is declared
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.locators.is_empty()
    }
}

/// Resolves delegates against declared pages and lazily loaded property stores
#[derive(Debug, Default)]
pub struct LocatorRegistry {
    pages: HashMap<String, PageDefinition>,
    source: Option<Box<dyn PropertySource>>,
    stores: HashMap<String, PropertyStore>,
}

impl LocatorRegistry {
    /// Registry with no pages and no property source
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry backed by `<dir>/<component>.properties` files
    #[must_use]
    pub fn from_dir(dir: impl Into<PathBuf>) -> Self {
        Self::new().with_source(DirectorySource::new(dir))
    }

    /// Set the property source
    #[must_use]
    pub fn with_source(mut self, source: impl PropertySource + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Declare a page
    pub fn register(&mut self, page: PageDefinition) {
        let _ = self.pages.insert(page.component().to_string(), page);
    }

    /// Declare a page (builder form)
    #[must_use]
    pub fn with_page(mut self, page: PageDefinition) -> Self {
        self.register(page);
        self
    }

    /// Number of property stores loaded so far
    #[must_use]
    pub fn cached_stores(&self) -> usize {
        self.stores.len()
    }

    /// Resolve a delegate to a concrete locator
    ///
    /// # Errors
    ///
    /// [`ActionError::MalformedDelegate`], [`ActionError::PropertyStoreUnavailable`]
    /// or [`ActionError::PropertyKeyMissing`].
    pub fn resolve(&mut self, delegate: &str) -> ActionResult<ResolvedLocator> {
        let parsed = LocatorDelegate::parse(delegate)?;
        let widget = parsed.widget_type();

        let (component, key) = match parsed {
            LocatorDelegate::Raw(raw) => {
                return Ok(ResolvedLocator {
                    delegate: delegate.to_string(),
                    locator: Locator::xpath(raw),
                    widget: None,
                });
            }
            LocatorDelegate::Structured { component, key, .. } => (component, key),
        };

        let value = self.lookup(&component, widget, &key)?;
        tracing::debug!(
            %component,
            %key,
            locator = %logged_value(&key, &value),
            "resolved locator delegate"
        );

        Ok(ResolvedLocator {
            delegate: delegate.to_string(),
            locator: Locator::new(value),
            widget,
        })
    }

    fn lookup(
        &mut self,
        component: &str,
        widget: Option<WidgetType>,
        key: &str,
    ) -> ActionResult<String> {
        let key_missing = || ActionError::PropertyKeyMissing {
            component: component.to_string(),
            key: key.to_string(),
        };

        let declared = match self.pages.get(component) {
            Some(page) => {
                if let Some(value) = page.lookup(widget, key) {
                    return Ok(value.to_string());
                }
                true
            }
            None => false,
        };

        if !self.stores.contains_key(component) {
            let opened = match self.source.as_ref() {
                Some(source) => source.open(component),
                None => Err(ActionError::PropertyStoreUnavailable {
                    component: component.to_string(),
                    message: "no property source configured".to_string(),
                }),
            };
            match opened {
                Ok(store) => {
                    tracing::debug!(%component, keys = store.len(), "loaded property store");
                    let _ = self.stores.insert(component.to_string(), store);
                }
                // A declared page without a backing file just lacks the key
                Err(err) if declared => {
                    tracing::debug!(%component, error = %err, "declared page has no property store");
                    return Err(key_missing());
                }
                Err(err) => return Err(err),
            }
        }

        self.stores
            .get(component)
            .and_then(|store| store.get(key))
            .map(str::to_string)
            .ok_or_else(key_missing)
    }
}

/// Resolved value as written to the debug log; masked for the password key
fn logged_value(key: &str, value: &str) -> String {
    if key == PASSWORD_KEY {
        "*".repeat(value.chars().count())
    } else {
        value.to_string()
    }
}
