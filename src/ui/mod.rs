pub mod formatting;
pub mod updates;

pub use updates::Renderer;
