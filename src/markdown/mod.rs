//! Text preparation for package documents.
//!
//! - [`escape`]: XML escaping of raw text
//! - [`emphasis`]: inline Markdown emphasis to `<em>`/`<strong>`
//! - [`slugify`]: filesystem-safe slugs for output names
//!
//! Prose is escaped first and converted second, so the only tags in the
//! result are the ones [`convert`] emits.

mod emphasis;
mod escape;
mod slugify;

pub use emphasis::convert;
pub use escape::escape_xml;
pub use slugify::slugify;
