//! Widget tags and click gestures.
//!
//! A [`WidgetType`] travels alongside each `input`/`click` call and decides how
//! the resolved element is driven. A [`ClickGesture`] picks the pointer
//! composition used by `click`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::result::ActionError;

/// Semantic role of an element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WidgetType {
    /// Free text input
    EditField,
    /// Numeric input
    NumericField,
    /// Range slider driven by keystrokes
    Slider,
    /// File chooser input (value is a path)
    FileField,
    /// `<select>` element
    ListBox,
    /// Checkbox (`ON`/`OFF`)
    CheckBox,
    /// Single radio button (`ON`/`OFF`)
    RadioButton,
    /// Group of radio buttons matched by one locator (1-based index)
    RadioGroup,
    /// Button
    Button,
    /// Hyperlink
    Link,
    /// Read-only text
    Text,
}

impl WidgetType {
    /// All widget types, in declaration order
    pub const ALL: [Self; 11] = [
        Self::EditField,
        Self::NumericField,
        Self::Slider,
        Self::FileField,
        Self::ListBox,
        Self::CheckBox,
        Self::RadioButton,
        Self::RadioGroup,
        Self::Button,
        Self::Link,
        Self::Text,
    ];

    /// Tag as written in locator delegates
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::EditField => "EditField",
            Self::NumericField => "NumericField",
            Self::Slider => "Slider",
            Self::FileField => "FileField",
            Self::ListBox => "ListBox",
            Self::CheckBox => "CheckBox",
            Self::RadioButton => "RadioButton",
            Self::RadioGroup => "RadioGroup",
            Self::Button => "Button",
            Self::Link => "Link",
            Self::Text => "Text",
        }
    }

    /// Widgets filled by focus, clear and keystrokes
    #[must_use]
    pub const fn is_text_entry(&self) -> bool {
        matches!(
            self,
            Self::EditField | Self::NumericField | Self::Slider | Self::FileField
        )
    }

    /// Widgets driven by an `ON`/`OFF` value
    #[must_use]
    pub const fn is_toggle(&self) -> bool {
        matches!(self, Self::CheckBox | Self::RadioButton)
    }

    /// Widgets `input` can drive
    #[must_use]
    pub const fn accepts_input(&self) -> bool {
        self.is_text_entry() || self.is_toggle() || matches!(self, Self::ListBox | Self::RadioGroup)
    }
}

impl fmt::Display for WidgetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WidgetType {
    type Err = ActionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|w| w.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ActionError::UnknownWidgetType {
                widget: s.to_string(),
            })
    }
}

/// Requested state for checkbox and radio button input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleState {
    /// Selected
    On,
    /// Not selected
    Off,
}

impl ToggleState {
    /// Parse `ON`/`OFF`, case-insensitive
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        if value.eq_ignore_ascii_case("on") {
            Some(Self::On)
        } else if value.eq_ignore_ascii_case("off") {
            Some(Self::Off)
        } else {
            None
        }
    }

    /// Whether this state means "selected"
    #[must_use]
    pub const fn is_on(self) -> bool {
        matches!(self, Self::On)
    }
}

/// Keyboard modifier held during a modifier click
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Modifier {
    /// Alt / Option
    Alt,
    /// Control
    Control,
    /// Shift
    Shift,
}

impl fmt::Display for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Alt => "Alt",
            Self::Control => "Control",
            Self::Shift => "Shift",
        };
        f.write_str(name)
    }
}

/// Pointer gesture used by `click`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ClickGesture {
    /// Move to the element, then click
    #[default]
    Click,
    /// Context-menu click
    RightClick,
    /// Click with Alt held
    AltClick,
    /// Click with Control held
    CtrlClick,
    /// Click with Shift held
    ShiftClick,
    /// Double click
    DoubleClick,
    /// Press, hold, release
    LongPress,
    /// Move only, no click
    Hover,
}

impl ClickGesture {
    /// Modifier key held for modifier clicks
    #[must_use]
    pub const fn modifier(&self) -> Option<Modifier> {
        match self {
            Self::AltClick => Some(Modifier::Alt),
            Self::CtrlClick => Some(Modifier::Control),
            Self::ShiftClick => Some(Modifier::Shift),
            _ => None,
        }
    }

    /// Verb used in report messages
    #[must_use]
    pub const fn verb(&self) -> &'static str {
        match self {
            Self::Click => "Clicked",
            Self::RightClick => "Right-clicked",
            Self::AltClick => "Alt-clicked",
            Self::CtrlClick => "Ctrl-clicked",
            Self::ShiftClick => "Shift-clicked",
            Self::DoubleClick => "Double-clicked",
            Self::LongPress => "Long-pressed",
            Self::Hover => "Hovered over",
        }
    }
}
