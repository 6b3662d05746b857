/*!
 * Keyboard shortcuts for sentence navigation
 */

use super::controller::NavigationCommand;

/// Element holding keyboard focus when a key was pressed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FocusTarget {
    /// Page body or the video itself
    #[default]
    Page,
    /// A text input field
    Input,
    /// A multi-line text area
    TextArea,
}

/// A key press as reported by the host
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct KeyEvent {
    /// Physical key code, e.g. `KeyA`
    pub code: String,
    /// Focused element
    pub focus: FocusTarget,
    /// Whether Ctrl, Alt or Meta was held
    pub modified: bool,
}

impl KeyEvent {
    /// Unmodified key press on the page
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            ..Default::default()
        }
    }

    /// Key press from a typed letter, e.g. `'a'` becomes `KeyA`
    pub fn from_char(c: char) -> Self {
        Self::new(format!("Key{}", c.to_ascii_uppercase()))
    }

    /// Same key with a different focus target
    pub fn with_focus(mut self, focus: FocusTarget) -> Self {
        self.focus = focus;
        self
    }
}

/// Navigation command bound to `event`, if any
///
/// Keys typed into text fields and modified shortcuts are left alone.
pub fn command_for_key(event: &KeyEvent) -> Option<NavigationCommand> {
    if event.modified || matches!(event.focus, FocusTarget::Input | FocusTarget::TextArea) {
        return None;
    }
    match event.code.as_str() {
        "KeyA" => Some(NavigationCommand::Previous),
        "KeyS" => Some(NavigationCommand::Current),
        "KeyD" => Some(NavigationCommand::Next),
        _ => None,
    }
}
