use crate::font::WidthTable;
use crate::types::Dec;

/// Per-page builder for the text object inside a content stream. Glyph
/// bytes accumulate into a word buffer; position, font, and inter-word
/// state changes become operator lines at the next flush point.
///
/// Invariant: `e` equals the buffered word's starting position plus the
/// advance widths of every glyph appended since the last position
/// command.
#[derive(Debug, Clone)]
pub struct TextBuilder {
    e: Dec,
    f: Dec,
    word_gap: Dec,
    word: Vec<u8>,
    word_start: (Dec, Dec),
    last_matrix: Option<String>,
    lines: Vec<Vec<u8>>,
}

impl TextBuilder {
    pub fn new() -> TextBuilder {
        TextBuilder {
            e: Dec::ZERO,
            f: Dec::ZERO,
            word_gap: Dec::ZERO,
            word: Vec::new(),
            word_start: (Dec::ZERO, Dec::ZERO),
            last_matrix: None,
            lines: Vec::new(),
        }
    }

    pub fn position(&self) -> (Dec, Dec) {
        (self.e, self.f)
    }

    /// `/F<slot> <size>. Tf`. Repeated identical selections are emitted
    /// on purpose; size-only changes arrive through this path.
    pub fn select_font(&mut self, slot: usize, size: u32) {
        self.flush_word();
        self.lines.push(format!("/F{} {}. Tf", slot, size).into_bytes());
    }

    /// Relative horizontal move (`h`).
    pub fn advance(&mut self, delta: Dec) {
        self.flush_word();
        self.e += delta;
    }

    /// Inter-word gap move (`wh`): the gap value becomes the inter-word
    /// width, emitting `Tw` only when it changes, then advances the
    /// cursor by the same amount.
    pub fn gap_advance(&mut self, gap: Dec) {
        self.flush_word();
        if gap != self.word_gap {
            self.word_gap = gap;
            self.lines.push(format!("{} Tw", gap).into_bytes());
        }
        self.e += gap;
    }

    /// Absolute horizontal position (`H`).
    pub fn set_h(&mut self, e: Dec) {
        self.flush_word();
        self.e = e;
    }

    /// Absolute vertical position (`V`), already converted to user space.
    pub fn set_v(&mut self, f: Dec) {
        self.flush_word();
        self.f = f;
    }

    /// Line break (`n`): a flush point, nothing more.
    pub fn newline(&mut self) {
        self.flush_word();
    }

    /// Buffers glyph bytes and advances the cursor by each glyph's
    /// advance width scaled to user space.
    pub fn append_glyphs(&mut self, bytes: &[u8], widths: &WidthTable, size: u32, unit_scale: u32) {
        if bytes.is_empty() {
            return;
        }
        self.begin_word();
        for &b in bytes {
            self.word.push(b);
            let advance = widths.get(b as usize) * size;
            self.e += Dec::from_ratio(advance, unit_scale);
        }
    }

    /// Buffers bytes without moving the cursor. Used for special glyphs,
    /// whose movement is carried by the surrounding gap commands.
    pub fn append_raw(&mut self, bytes: &[u8]) {
        if bytes.is_empty() {
            return;
        }
        self.begin_word();
        self.word.extend_from_slice(bytes);
    }

    fn begin_word(&mut self) {
        if self.word.is_empty() {
            self.word_start = (self.e, self.f);
        }
    }

    /// Emits the pending word: its starting text matrix (suppressed when
    /// identical to the last one emitted) followed by `(word) Tj`.
    fn flush_word(&mut self) {
        if self.word.is_empty() {
            return;
        }
        let matrix = format!("1 0 0 1 {} {} Tm", self.word_start.0, self.word_start.1);
        if self.last_matrix.as_deref() != Some(matrix.as_str()) {
            self.lines.push(matrix.clone().into_bytes());
            self.last_matrix = Some(matrix);
        }
        let mut line = Vec::with_capacity(self.word.len() + 8);
        line.push(b'(');
        for &b in &self.word {
            if b == b'(' || b == b')' || b == b'\\' {
                line.push(b'\\');
            }
            line.push(b);
        }
        line.extend_from_slice(b") Tj");
        self.lines.push(line);
        self.word.clear();
    }

    /// Flushes any pending word and wraps the operator lines in a
    /// `BT` .. `ET` text object.
    pub fn take_content(&mut self) -> Vec<u8> {
        self.flush_word();
        let mut out = Vec::new();
        out.extend_from_slice(b"BT\n");
        for line in &self.lines {
            out.extend_from_slice(line);
            out.push(b'\n');
        }
        out.extend_from_slice(b"ET");
        out
    }
}

impl Default for TextBuilder {
    fn default() -> Self {
        TextBuilder::new()
    }
}
