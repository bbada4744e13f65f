//! Keyboard shortcuts of the editor window

use eframe::egui::{self, Key, Modifiers};
use tracing::debug;

use crate::model::ViewName;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellCommand {
    Navigate(ViewName),
    Save,
    Load,
    Export,
    /// Empty every view after confirmation; button only
    NewSheet,
    /// Switch between the tab bar and the classic sidebar
    TogglePresentation,
}

/// Ctrl (Cmd on macOS) bindings, then bare keys
const BINDINGS: &[(Modifiers, Key, ShellCommand)] = &[
    (Modifiers::COMMAND, Key::Num1, ShellCommand::Navigate(ViewName::Vista1)),
    (Modifiers::COMMAND, Key::Num2, ShellCommand::Navigate(ViewName::Vista2)),
    (Modifiers::COMMAND, Key::Num3, ShellCommand::Navigate(ViewName::Vista3)),
    (Modifiers::COMMAND, Key::Num4, ShellCommand::Navigate(ViewName::Vista4)),
    (Modifiers::COMMAND, Key::S, ShellCommand::Save),
    (Modifiers::COMMAND, Key::O, ShellCommand::Load),
    (Modifiers::COMMAND, Key::P, ShellCommand::Export),
    (Modifiers::NONE, Key::Escape, ShellCommand::TogglePresentation),
];

/// Command bound to `key` pressed with exactly `modifiers`
pub fn command_for(modifiers: Modifiers, key: Key) -> Option<ShellCommand> {
    BINDINGS
        .iter()
        .find(|(m, k, _)| *k == key && modifiers.matches_exact(*m))
        .map(|(_, _, command)| *command)
}

/// Consume this frame's shortcut presses so text fields never see them
pub fn poll(ctx: &egui::Context) -> Vec<ShellCommand> {
    let commands: Vec<ShellCommand> = ctx.input_mut(|input| {
        let pressed: Vec<(Modifiers, Key)> = input
            .events
            .iter()
            .filter_map(|event| match event {
                egui::Event::Key {
                    key,
                    pressed: true,
                    modifiers,
                    ..
                } => Some((*modifiers, *key)),
                _ => None,
            })
            .collect();

        pressed
            .into_iter()
            .filter_map(|(modifiers, key)| {
                let command = command_for(modifiers, key)?;
                input.consume_key(modifiers, key);
                Some(command)
            })
            .collect()
    });
    for command in &commands {
        debug!(command = ?command, "Shortcut pressed");
    }
    commands
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digit_shortcuts_navigate() {
        assert_eq!(
            command_for(Modifiers::COMMAND, Key::Num1),
            Some(ShellCommand::Navigate(ViewName::Vista1))
        );
        assert_eq!(
            command_for(Modifiers::COMMAND, Key::Num4),
            Some(ShellCommand::Navigate(ViewName::Vista4))
        );
        assert_eq!(command_for(Modifiers::COMMAND, Key::Num5), None);
    }

    #[test]
    fn test_document_shortcuts() {
        assert_eq!(command_for(Modifiers::COMMAND, Key::S), Some(ShellCommand::Save));
        assert_eq!(command_for(Modifiers::COMMAND, Key::O), Some(ShellCommand::Load));
        assert_eq!(command_for(Modifiers::COMMAND, Key::P), Some(ShellCommand::Export));
    }

    #[test]
    fn test_modifiers_must_match() {
        assert_eq!(command_for(Modifiers::NONE, Key::S), None);
        assert_eq!(command_for(Modifiers::COMMAND | Modifiers::SHIFT, Key::S), None);
        assert_eq!(
            command_for(Modifiers::NONE, Key::Escape),
            Some(ShellCommand::TogglePresentation)
        );
        assert_eq!(command_for(Modifiers::COMMAND, Key::Escape), None);
    }
}
