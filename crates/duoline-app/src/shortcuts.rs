//! Keyboard shortcut documentation.

use duoline_core::{BINDINGS, KeyBinding};

/// Registry of all keyboard shortcuts.
pub struct ShortcutRegistry;

impl ShortcutRegistry {
    /// Get all registered shortcuts.
    pub fn all() -> &'static [KeyBinding] {
        BINDINGS
    }

    /// One line per shortcut, key column padded.
    pub fn help_text() -> String {
        let mut text = String::from("Controls:\n");
        for binding in Self::all() {
            text.push_str(&format!("  {:8} {}\n", binding.key, binding.description));
        }
        text
    }

    /// Print all shortcuts to console.
    pub fn print_all() {
        println!("\n{}", Self::help_text());
        log::debug!("{} shortcuts registered", Self::all().len());
    }
}
