//! TUI widgets for the craft journal

pub mod input;
pub mod row_list;
pub mod status_bar;

pub use input::{cursor_spans, InputWidget};
pub use row_list::RowListWidget;
pub use status_bar::{HotkeyBarWidget, StatusBarWidget};
