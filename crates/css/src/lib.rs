pub mod hover;
pub mod syntax;

// Re-exports so other crates can just use `css::...` nicely.
pub use hover::{HOVER_MARKER_CLASS, rewrite_hover_selectors};
pub use syntax::{Prelude, scan_preludes, split_selector_list};
