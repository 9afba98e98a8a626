//! md-editor: interactive editing on top of `md-core`.
//!
//! - `session`: the design editor, owning the scene, selection, tools, and undo history
//! - `compositor`: design layers dragged and blended over a product photo
//! - `history`: bounded snapshot undo/redo with gesture batching
//! - `shortcuts`: keyboard shortcut resolution per focus and context

pub mod compositor;
pub mod history;
pub mod input;
pub mod selection;
pub mod session;
pub mod shortcuts;
pub mod tools;

pub use compositor::{MockupCompositor, MockupEvent};
pub use history::{History, HistoryEntry};
pub use input::{InputEvent, Modifiers};
pub use selection::{Selection, SelectionGesture, SelectionMode};
pub use session::{EditorEvent, EditorSession, ZOrder};
pub use shortcuts::{Focus, ShortcutAction, ShortcutContext, ShortcutMap};
pub use tools::{ToolDefaults, ToolKind, create_element, create_image, extend_element, is_complete};
