//! Constants shared by the history and shortcut primitives.

/// Default number of snapshots kept on the undo stack.
pub const DEFAULT_HISTORY_CAPACITY: usize = 10;

/// Separator between the parts of a key combination string (`control+z`).
pub const KEY_COMBO_SEPARATOR: char = '+';
