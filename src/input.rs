// =============================================================================
// duskgreet — Input Translation
//
// Maps window-system key events onto the few edits the credential entry
// understands. Keystrokes arriving on any surface are routed here; the
// orchestrator applies the resulting action to the entry.
// =============================================================================

use winit::event::{ElementState, KeyEvent};
use winit::keyboard::{Key, NamedKey};

/// What a key press means to the greeter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryAction {
    /// Append printable characters to the secret.
    Insert(String),
    /// Delete the last character.
    Backspace,
    /// Discard the whole secret.
    Clear,
    /// Hand the secret to the session manager.
    Submit,
    /// Not an edit (releases, modifiers, navigation keys).
    None,
}

/// Translate one key event into an entry action.
pub fn translate_key(event: &KeyEvent) -> EntryAction {
    if event.state != ElementState::Pressed {
        return EntryAction::None;
    }
    action_for(&event.logical_key, event.text.as_ref().map(|t| t.as_str()))
}

fn action_for(key: &Key, text: Option<&str>) -> EntryAction {
    match key {
        Key::Named(NamedKey::Enter) => EntryAction::Submit,
        Key::Named(NamedKey::Backspace) => EntryAction::Backspace,
        Key::Named(NamedKey::Escape) => EntryAction::Clear,
        Key::Named(NamedKey::Space) => EntryAction::Insert(" ".to_string()),
        _ => {
            let Some(text) = text else {
                return EntryAction::None;
            };
            let printable: String = text.chars().filter(|c| !c.is_control()).collect();
            if printable.is_empty() {
                EntryAction::None
            } else {
                EntryAction::Insert(printable)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use winit::keyboard::SmolStr;

    #[test]
    fn named_keys_map_to_edits() {
        assert_eq!(action_for(&Key::Named(NamedKey::Enter), None), EntryAction::Submit);
        assert_eq!(
            action_for(&Key::Named(NamedKey::Backspace), None),
            EntryAction::Backspace
        );
        assert_eq!(action_for(&Key::Named(NamedKey::Escape), None), EntryAction::Clear);
        assert_eq!(
            action_for(&Key::Named(NamedKey::Space), None),
            EntryAction::Insert(" ".to_string())
        );
    }

    #[test]
    fn characters_insert_their_text() {
        assert_eq!(
            action_for(&Key::Character(SmolStr::new("a")), Some("a")),
            EntryAction::Insert("a".to_string())
        );
    }

    #[test]
    fn control_sequences_are_ignored() {
        assert_eq!(
            action_for(&Key::Character(SmolStr::new("\u{3}")), Some("\u{3}")),
            EntryAction::None
        );
        assert_eq!(action_for(&Key::Named(NamedKey::Tab), None), EntryAction::None);
    }
}
