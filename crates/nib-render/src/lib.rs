pub mod bitmap;
pub mod noop;
pub mod svg;

pub use bitmap::BitmapRenderer;
pub use noop::NoopRenderer;
pub use svg::SvgRenderer;
