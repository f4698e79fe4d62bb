use crate::command::{parse_line, Command, DeviceCtl};
use crate::error::Error;
use crate::font::{FontDescription, FontDirs};
use crate::pdf::{DocFont, ObjRef, PageFont, PdfDocument};
use crate::text::TextBuilder;
use crate::types::Dec;
use log::{debug, warn};
use std::collections::BTreeMap;
use std::io::{BufRead, BufWriter, Write};

const DEFAULT_FONT_SIZE: u32 = 11;

struct MountedFont {
    doc_font: DocFont,
    desc: FontDescription,
}

/// The interpreter. Owns the document under construction and every
/// piece of typesetting state: mounted fonts, the per-page resource
/// map, the unit scale, the carried page size, and the current page.
/// All of it is explicit here; nothing lives in module-level state.
pub struct Transpiler {
    dirs: FontDirs,
    doc: Option<PdfDocument>,
    unit_scale: u32,
    mounts: BTreeMap<u32, MountedFont>,
    page_fonts: BTreeMap<u32, PageFont>,
    cur_page: Option<ObjRef>,
    cur_stream: Option<ObjRef>,
    cur_font: Option<u32>,
    font_size: u32,
    page_width: Dec,
    page_height: Dec,
    line_no: usize,
}

/// Reads the intermediate stream to its end and writes the finished
/// document. Produces no bytes at all when the stream never starts a
/// document.
pub fn transpile<R: BufRead, W: Write>(input: R, output: W, dirs: FontDirs) -> Result<(), Error> {
    Transpiler::new(dirs).run(input, output)
}

impl Transpiler {
    pub fn new(dirs: FontDirs) -> Transpiler {
        Transpiler {
            dirs,
            doc: None,
            unit_scale: 1,
            mounts: BTreeMap::new(),
            page_fonts: BTreeMap::new(),
            cur_page: None,
            cur_stream: None,
            cur_font: None,
            font_size: DEFAULT_FONT_SIZE,
            page_width: Dec::new(612, 0),
            page_height: Dec::new(792, 0),
            line_no: 0,
        }
    }

    pub fn run<R: BufRead, W: Write>(mut self, mut input: R, output: W) -> Result<(), Error> {
        let mut line = Vec::new();
        loop {
            line.clear();
            if input.read_until(b'\n', &mut line)? == 0 {
                break;
            }
            self.line_no += 1;
            if line.last() == Some(&b'\n') {
                line.pop();
            }
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            // An empty line ends the stream.
            if line.is_empty() {
                break;
            }
            self.dispatch(&line)?;
        }

        if let Some(mut doc) = self.doc.take() {
            debug!(
                "writing document: {} objects, {} pages",
                doc.object_count(),
                doc.page_count()
            );
            let mut out = BufWriter::new(output);
            doc.write_to(&mut out)?;
            out.flush()?;
        }
        Ok(())
    }

    fn dispatch(&mut self, line: &[u8]) -> Result<(), Error> {
        match parse_line(line, self.line_no) {
            Ok(cmd) => self.exec(cmd),
            Err(err) => {
                // Malformed arguments: warn, skip the line, keep going.
                warn!("{}", err);
                Ok(())
            }
        }
    }

    fn exec(&mut self, cmd: Command<'_>) -> Result<(), Error> {
        match cmd {
            Command::Device(ctl) => self.device(ctl),
            Command::BeginPage => self.begin_page(),
            Command::SelectFont(pos) => self.select_font(pos),
            Command::SetSize(units) => self.set_size(units),
            Command::Text(bytes) => self.show_text(bytes),
            Command::TypesetChar(bytes) => self.show_text(bytes),
            Command::TypesetCode(code) => self.show_code(code),
            Command::SpecialGlyph(name) => self.special_glyph(name),
            Command::Draw => {
                debug!("line {}: drawing command ignored", self.line_no);
                Ok(())
            }
            Command::MoveRelH(units) => {
                let delta = self.to_user(units);
                self.text()?.advance(delta);
                Ok(())
            }
            Command::MoveRelV => {
                warn!(
                    "line {}: relative vertical motion is not supported, ignored",
                    self.line_no
                );
                Ok(())
            }
            Command::MoveAbsH(units) => {
                let e = self.to_user(units);
                self.text()?.set_h(e);
                Ok(())
            }
            Command::MoveAbsV(units) => self.move_abs_v(units),
            Command::WordGap(rest) => self.word_gap(rest),
            Command::Newline => {
                self.text()?.newline();
                Ok(())
            }
            Command::Color => {
                debug!("line {}: color command ignored", self.line_no);
                Ok(())
            }
            Command::Comment | Command::Blank => Ok(()),
            Command::Unknown(letter) => {
                warn!(
                    "line {}: unknown command '{}'",
                    self.line_no,
                    char::from(letter)
                );
                Ok(())
            }
        }
    }

    fn device(&mut self, ctl: DeviceCtl) -> Result<(), Error> {
        match ctl {
            DeviceCtl::Init => {
                if self.doc.is_some() {
                    warn!("line {}: duplicate document start ignored", self.line_no);
                } else {
                    self.doc = Some(PdfDocument::new());
                    debug!("document started");
                }
                Ok(())
            }
            DeviceCtl::Resolution(res) => {
                let scale = res / 72;
                if scale == 0 {
                    warn!(
                        "line {}: resolution {} below 72 units/inch, keeping scale {}",
                        self.line_no, res, self.unit_scale
                    );
                } else {
                    self.unit_scale = scale;
                }
                Ok(())
            }
            DeviceCtl::Typesetter(name) => {
                if name != "pdf" {
                    return Err(Error::WrongDevice(name));
                }
                debug!("typesetter confirmed");
                Ok(())
            }
            DeviceCtl::MountFont { pos, short } => self.mount_font(pos, &short),
            DeviceCtl::PaperSize { x, y } => {
                let width = self.to_user(x);
                let height = self.to_user(y);
                self.page_width = width;
                self.page_height = height;
                if let (Some(page), Some(doc)) = (self.cur_page, self.doc.as_mut()) {
                    doc.set_page_media(page, width, height);
                }
                debug!("paper size set to {} x {}", width, height);
                Ok(())
            }
            DeviceCtl::Filename | DeviceCtl::Trailer | DeviceCtl::Stop => Ok(()),
            DeviceCtl::Other(word) => {
                warn!(
                    "line {}: unknown device control '{}'",
                    self.line_no, word
                );
                Ok(())
            }
        }
    }

    fn mount_font(&mut self, pos: u32, short: &str) -> Result<(), Error> {
        let doc = self
            .doc
            .as_mut()
            .ok_or_else(|| Error::state(self.line_no, "font mounted before document start"))?;
        let desc = self.dirs.load(short)?;
        let doc_font = doc.register_font(&desc.base_name);
        debug!(
            "mounted '{}' ({}) at font position {}",
            short, desc.base_name, pos
        );
        if let Some(page) = self.cur_page {
            let slot = doc.add_page_font(page, doc_font);
            self.page_fonts.insert(pos, slot);
        }
        self.mounts.insert(pos, MountedFont { doc_font, desc });
        Ok(())
    }

    fn begin_page(&mut self) -> Result<(), Error> {
        let doc = self
            .doc
            .as_mut()
            .ok_or_else(|| Error::state(self.line_no, "page begun before document start"))?;
        let (page, stream) = doc.add_page(self.page_width, self.page_height);
        self.cur_page = Some(page);
        self.cur_stream = Some(stream);
        self.page_fonts.clear();
        self.cur_font = None;
        debug!("page {} started", doc.page_count());
        Ok(())
    }

    fn select_font(&mut self, pos: u32) -> Result<(), Error> {
        let page = self
            .cur_page
            .ok_or_else(|| Error::state(self.line_no, "font selected before first page"))?;
        let Some(mount) = self.mounts.get(&pos) else {
            return Err(Error::state(
                self.line_no,
                format!("font position {} was never mounted", pos),
            ));
        };
        let doc_font = mount.doc_font;
        let slot = match self.page_fonts.get(&pos) {
            Some(slot) => *slot,
            None => {
                let doc = self
                    .doc
                    .as_mut()
                    .ok_or_else(|| Error::state(self.line_no, "font selected before document start"))?;
                let slot = doc.add_page_font(page, doc_font);
                self.page_fonts.insert(pos, slot);
                slot
            }
        };
        self.cur_font = Some(pos);
        let size = self.font_size;
        self.text()?.select_font(slot.slot(), size);
        Ok(())
    }

    fn set_size(&mut self, units: u32) -> Result<(), Error> {
        let size = units / self.unit_scale;
        self.font_size = size;
        // Size-only changes re-select the current font.
        if let Some(pos) = self.cur_font {
            if let Some(slot) = self.page_fonts.get(&pos).copied() {
                self.text()?.select_font(slot.slot(), size);
            }
        }
        Ok(())
    }

    fn show_text(&mut self, bytes: &[u8]) -> Result<(), Error> {
        let pos = self
            .cur_font
            .ok_or_else(|| Error::state(self.line_no, "text before any font selection"))?;
        let size = self.font_size;
        let unit_scale = self.unit_scale;
        let stream = self
            .cur_stream
            .ok_or_else(|| Error::state(self.line_no, "text before first page"))?;
        let mount = self
            .mounts
            .get(&pos)
            .ok_or_else(|| Error::state(self.line_no, "selected font is not mounted"))?;
        let doc = self
            .doc
            .as_mut()
            .ok_or_else(|| Error::state(self.line_no, "text before document start"))?;
        doc.text_mut(stream)
            .append_glyphs(bytes, &mount.desc.widths, size, unit_scale);
        Ok(())
    }

    fn show_code(&mut self, code: u32) -> Result<(), Error> {
        let Ok(byte) = u8::try_from(code) else {
            warn!(
                "line {}: character code {} does not fit the byte range, ignored",
                self.line_no, code
            );
            return Ok(());
        };
        self.show_text(&[byte])
    }

    fn special_glyph(&mut self, name: &[u8]) -> Result<(), Error> {
        let mapped: Option<u8> = match name {
            b"hy" => Some(45),
            b"lq" => Some(141),
            b"rq" => Some(142),
            b"cq" => Some(169),
            b"fi" => Some(174),
            b"fl" => Some(175),
            _ => None,
        };
        match mapped {
            Some(byte) => self.text()?.append_raw(&[byte]),
            None => {
                // Conservative fallback carried over from the original
                // driver: keep the raw name bytes, leave the cursor
                // alone, let the following gap supply the movement.
                warn!(
                    "line {}: unknown special glyph '{}', raw bytes kept",
                    self.line_no,
                    String::from_utf8_lossy(name)
                );
                self.text()?.append_raw(name);
            }
        }
        Ok(())
    }

    fn move_abs_v(&mut self, units: u32) -> Result<(), Error> {
        let v = self.to_user(units);
        // The subtraction runs against the whole page height, so the
        // guard must too; a fractional height is truncated here.
        let limit = Dec::new(self.page_height.integer(), 0);
        if v <= limit {
            // The intermediate counts down from the top edge; PDF user
            // space counts up from the bottom.
            let f = v.sub_from(self.page_height.integer());
            self.text()?.set_v(f);
        } else {
            warn!(
                "line {}: vertical position {} beyond page height {}, ignored",
                self.line_no, v, self.page_height
            );
        }
        Ok(())
    }

    fn word_gap(&mut self, rest: &[u8]) -> Result<(), Error> {
        match parse_line(rest, self.line_no) {
            Ok(Command::MoveRelH(units)) => {
                let gap = self.to_user(units);
                self.text()?.gap_advance(gap);
                Ok(())
            }
            // Any other command re-dispatches as if the prefix were
            // absent: `wx font ..`, `wf1`, and friends.
            Ok(cmd) => self.exec(cmd),
            Err(err) => {
                warn!("{}", err);
                Ok(())
            }
        }
    }

    fn text(&mut self) -> Result<&mut TextBuilder, Error> {
        let stream = self
            .cur_stream
            .ok_or_else(|| Error::state(self.line_no, "typesetting before first page"))?;
        let doc = self
            .doc
            .as_mut()
            .ok_or_else(|| Error::state(self.line_no, "typesetting before document start"))?;
        Ok(doc.text_mut(stream))
    }

    fn to_user(&self, units: u32) -> Dec {
        Dec::from_ratio(units, self.unit_scale)
    }
}
