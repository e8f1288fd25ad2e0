//! The mind-map canvas: editor state, painting and the Leptos component.

mod component;
mod render;
mod state;

pub use component::MindMapCanvas;
pub use state::{DragState, LabelEdit, MindMapState, PanState, PointerDown, ViewTransform};
