//! Keyboard mapping for line commands.

use serde::{Deserialize, Serialize};
use winit::keyboard::{Key, NamedKey};

/// A command the demo can apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LineCommand {
    /// Switch which line receives commands.
    ToggleActive,
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    RotateCounterClockwise,
    RotateClockwise,
    Shrink,
    Grow,
}

/// A key and the command it triggers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyBinding {
    /// Key label; single letters match either case.
    pub key: &'static str,
    pub command: LineCommand,
    pub description: &'static str,
}

impl KeyBinding {
    pub const fn new(key: &'static str, command: LineCommand, description: &'static str) -> Self {
        Self {
            key,
            command,
            description,
        }
    }
}

/// Label used for the space bar.
pub const SPACE: &str = "Space";

/// Every key binding, in help order.
pub const BINDINGS: &[KeyBinding] = &[
    KeyBinding::new(SPACE, LineCommand::ToggleActive, "Switch active line"),
    KeyBinding::new("W", LineCommand::MoveUp, "Move up"),
    KeyBinding::new("S", LineCommand::MoveDown, "Move down"),
    KeyBinding::new("A", LineCommand::MoveLeft, "Move left"),
    KeyBinding::new("D", LineCommand::MoveRight, "Move right"),
    KeyBinding::new("Q", LineCommand::RotateCounterClockwise, "Rotate counter-clockwise"),
    KeyBinding::new("E", LineCommand::RotateClockwise, "Rotate clockwise"),
    KeyBinding::new("Z", LineCommand::Shrink, "Shrink"),
    KeyBinding::new("C", LineCommand::Grow, "Grow"),
];

fn lookup(name: &str) -> Option<LineCommand> {
    BINDINGS
        .iter()
        .find(|binding| binding.key.eq_ignore_ascii_case(name))
        .map(|binding| binding.command)
}

/// Map a logical key to its command. Unmapped keys yield `None`.
pub fn command_for_key(key: &Key) -> Option<LineCommand> {
    let command = match key {
        Key::Named(NamedKey::Space) => lookup(SPACE),
        // A literal space character only arrives without a named key.
        Key::Character(c) if c.as_str() == " " => lookup(SPACE),
        Key::Character(c) if c.chars().count() == 1 => lookup(c.as_str()),
        _ => None,
    };
    if command.is_none() {
        log::trace!("Ignoring key {:?}", key);
    }
    command
}
