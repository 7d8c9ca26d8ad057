pub mod commands;
pub mod editor;
pub mod events;
pub mod history;
pub mod importer;
pub mod input;
pub mod stroke_builder;
pub mod tools;

pub use commands::{
    AddComponent, Command, Composite, EditorState, EraseComponents, TransformComponents,
    ViewportChange,
};
pub use editor::Editor;
pub use events::{EventChannel, HistoryEvent, SubscriptionId, ToolEvent};
pub use history::UndoRedoHistory;
pub use importer::{ImportError, ImportProgress, import_svg};
pub use input::{InputEvent, Pointer, PointerDevice};
pub use stroke_builder::{StrokeBuilder, StrokeSample};
pub use tools::{Tool, ToolContext, ToolController, ToolGroup, ToolKind};
