pub mod bezier;
pub mod component;
pub mod document;
pub mod error;
pub mod line;
pub mod mat;
pub mod path;
pub mod path_text;
pub mod rect;
pub mod render;
pub mod style;
pub mod vec;
pub mod viewport;

pub use component::{Component, ComponentId, ComponentKind, ImportedElement, Stroke, StrokeSegment};
pub use document::Document;
pub use error::PathParseError;
pub use line::{LineSegment, SegmentIntersection};
pub use mat::Mat33;
pub use path::{Path, PathCmd};
pub use rect::Rect;
pub use render::Renderer;
pub use style::{Color, PathStyle, StrokePen};
pub use vec::{Vec2, Vec3};
pub use viewport::Viewport;

// Re-export petgraph's index type so downstream crates don't need a direct
// dependency to talk about spatial nodes.
pub use petgraph::graph::NodeIndex;
