use crate::error::Error;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

/// Glyph advance widths in font units, one slot per character code
/// 0..=256. Codes without a charset entry stay zero.
#[derive(Debug, Clone)]
pub struct WidthTable {
    widths: Vec<u32>,
}

pub const WIDTH_TABLE_SLOTS: usize = 257;

impl WidthTable {
    pub fn new() -> WidthTable {
        WidthTable {
            widths: vec![0; WIDTH_TABLE_SLOTS],
        }
    }

    pub fn get(&self, code: usize) -> u32 {
        self.widths.get(code).copied().unwrap_or(0)
    }

    pub(crate) fn set(&mut self, code: usize, width: u32) {
        if let Some(slot) = self.widths.get_mut(code) {
            *slot = width;
        }
    }
}

impl Default for WidthTable {
    fn default() -> Self {
        WidthTable::new()
    }
}

/// One parsed device font description: the PostScript base name and the
/// per-code advance widths.
#[derive(Debug, Clone)]
pub struct FontDescription {
    pub base_name: String,
    pub widths: WidthTable,
}

/// Candidate directories holding device font descriptions, tried in
/// order. Each entry is a directory that directly contains the
/// two-letter description files.
#[derive(Debug, Clone)]
pub struct FontDirs {
    dirs: Vec<PathBuf>,
}

const SYSTEM_ROOTS: &[&str] = &[
    "/usr/share/groff/current",
    "/usr/local/share/groff/current",
    "/opt/homebrew/share/groff/current",
];

impl FontDirs {
    /// The standard search list: `GROFF_FONT_PATH` entries (each extended
    /// by `devpdf`) ahead of the fixed install roots (each extended by
    /// `font/devpdf`).
    pub fn system() -> FontDirs {
        let mut dirs = Vec::new();
        if let Ok(value) = std::env::var("GROFF_FONT_PATH") {
            for part in value.split(':') {
                let part = part.trim();
                if !part.is_empty() {
                    dirs.push(Path::new(part).join("devpdf"));
                }
            }
        }
        for root in SYSTEM_ROOTS {
            dirs.push(Path::new(root).join("font").join("devpdf"));
        }
        FontDirs { dirs }
    }

    /// Replaces the search list entirely; entries must directly contain
    /// the description files.
    pub fn with_dirs(dirs: Vec<PathBuf>) -> FontDirs {
        FontDirs { dirs }
    }

    /// Locates and parses the description for a short font name.
    pub fn load(&self, short: &str) -> Result<FontDescription, Error> {
        for dir in &self.dirs {
            let path = dir.join(short);
            if path.is_file() {
                let file = File::open(&path)?;
                return parse_description(short, BufReader::new(file));
            }
        }
        Err(Error::FontNotFound(short.to_string()))
    }
}

/// PostScript names for the standard base-font mounts, used when a
/// description header carries no `internalname`.
fn standard_base_name(short: &str) -> Option<&'static str> {
    Some(match short {
        "TR" => "Times-Roman",
        "TB" => "Times-Bold",
        "TI" => "Times-Italic",
        "TBI" => "Times-BoldItalic",
        "HR" => "Helvetica",
        "HB" => "Helvetica-Bold",
        "HI" => "Helvetica-Oblique",
        "HBI" => "Helvetica-BoldOblique",
        "CR" => "Courier",
        "CB" => "Courier-Bold",
        "CI" => "Courier-Oblique",
        "CBI" => "Courier-BoldOblique",
        "S" => "Symbol",
        "ZD" => "ZapfDingbats",
        _ => return None,
    })
}

pub(crate) fn parse_description<R: BufRead>(
    short: &str,
    reader: R,
) -> Result<FontDescription, Error> {
    let mut base_name: Option<String> = None;
    let mut widths = WidthTable::new();
    let mut in_charset = false;

    for (index, line) in reader.lines().enumerate() {
        let line_no = index + 1;
        let line = line?;
        let line = line.trim_end();
        if !in_charset {
            if line == "charset" {
                in_charset = true;
            } else if let Some(rest) = line.strip_prefix("internalname") {
                let rest = rest.trim();
                if !rest.is_empty() {
                    base_name = Some(rest.to_string());
                }
            }
            continue;
        }
        if line.is_empty() {
            continue;
        }
        if line == "kernpairs" {
            break;
        }

        // name TAB metrics TAB type TAB code TAB comment
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 2 {
            return Err(Error::parse(
                line_no,
                format!("malformed charset entry in font '{}'", short),
            ));
        }
        let metrics = fields[1].trim();
        if metrics == "\"" {
            // Continuation of the previous glyph entry.
            continue;
        }
        if fields.len() < 4 {
            return Err(Error::parse(
                line_no,
                format!("charset entry missing fields in font '{}'", short),
            ));
        }
        let width_token = metrics.split(',').next().unwrap_or("");
        let width: u32 = width_token.parse().map_err(|_| {
            Error::parse(
                line_no,
                format!("bad glyph width '{}' in font '{}'", width_token, short),
            )
        })?;
        let code_token = fields[3].trim();
        let code: usize = code_token.parse().map_err(|_| {
            Error::parse(
                line_no,
                format!("bad glyph code '{}' in font '{}'", code_token, short),
            )
        })?;
        if code < WIDTH_TABLE_SLOTS {
            widths.set(code, width);
        }
    }

    let base_name = base_name
        .or_else(|| standard_base_name(short).map(str::to_string))
        .unwrap_or_else(|| short.to_string());
    Ok(FontDescription { base_name, widths })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn parse(short: &str, text: &str) -> Result<FontDescription, Error> {
        parse_description(short, Cursor::new(text.as_bytes().to_vec()))
    }

    const TR_SAMPLE: &str = "name TR\n\
internalname Times-Roman\n\
spacewidth 250\n\
charset\n\
h\t500,662\t2\t104\th\n\
e\t444,448\t2\t101\te\n\
hy\t333,257\t2\t45\thyphen\n";

    #[test]
    fn parses_widths_from_charset_section() {
        let desc = parse("TR", TR_SAMPLE).expect("parse");
        assert_eq!(desc.base_name, "Times-Roman");
        assert_eq!(desc.widths.get(104), 500);
        assert_eq!(desc.widths.get(101), 444);
        assert_eq!(desc.widths.get(45), 333);
        assert_eq!(desc.widths.get(120), 0);
    }

    #[test]
    fn header_lines_before_charset_are_not_glyphs() {
        // `spacewidth 250` has no tabs; it must not be treated as a
        // charset entry.
        let desc = parse("TR", TR_SAMPLE).expect("parse");
        assert_eq!(desc.widths.get(250), 0);
    }

    #[test]
    fn continuation_lines_are_skipped() {
        let text = "charset\n\
a\t444,448\t2\t97\ta\n\
aa\t\"\t2\t97\talias\n";
        let desc = parse("TR", text).expect("parse");
        assert_eq!(desc.widths.get(97), 444);
    }

    #[test]
    fn kernpairs_ends_the_charset_section() {
        let text = "charset\n\
a\t444\t2\t97\ta\n\
kernpairs\n\
not a glyph line at all\n";
        let desc = parse("TR", text).expect("parse");
        assert_eq!(desc.widths.get(97), 444);
    }

    #[test]
    fn out_of_range_codes_are_ignored() {
        let text = "charset\nuni1234\t444\t2\t4660\tglyph\n";
        let desc = parse("TR", text).expect("parse");
        assert_eq!(desc.widths.get(256), 0);
    }

    #[test]
    fn malformed_width_reports_line_number() {
        let text = "charset\na\tnope\t2\t97\ta\n";
        match parse("TR", text) {
            Err(Error::Parse { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn missing_internalname_falls_back_to_standard_table() {
        let text = "charset\na\t444\t2\t97\ta\n";
        let desc = parse("HB", text).expect("parse");
        assert_eq!(desc.base_name, "Helvetica-Bold");
        let desc = parse("XX", text).expect("parse");
        assert_eq!(desc.base_name, "XX");
    }

    #[test]
    fn load_reports_font_not_found() {
        let dirs = FontDirs::with_dirs(vec![std::env::temp_dir().join(format!(
            "groutpdf_missing_{}_{}",
            std::process::id(),
            line!()
        ))]);
        match dirs.load("TR") {
            Err(Error::FontNotFound(name)) => assert_eq!(name, "TR"),
            other => panic!("expected FontNotFound, got {:?}", other),
        }
    }

    #[test]
    fn load_reads_description_from_search_dir() {
        let dir = std::env::temp_dir().join(format!(
            "groutpdf_fonts_{}_{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .expect("clock")
                .as_nanos()
        ));
        std::fs::create_dir_all(&dir).expect("mkdir");
        std::fs::write(dir.join("TR"), TR_SAMPLE).expect("write font");

        let dirs = FontDirs::with_dirs(vec![dir]);
        let desc = dirs.load("TR").expect("load");
        assert_eq!(desc.base_name, "Times-Roman");
        assert_eq!(desc.widths.get(104), 500);
    }
}
