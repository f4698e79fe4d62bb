mod command;
mod error;
mod font;
mod pdf;
mod text;
mod transpile;
mod types;

pub use error::Error;
pub use font::{FontDescription, FontDirs, WidthTable};
pub use pdf::{DocFont, ObjRef, PageFont, PdfDocument};
pub use text::TextBuilder;
pub use transpile::{transpile, Transpiler};
pub use types::{fmt_trim, Dec};
