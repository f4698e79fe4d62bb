use crate::text::TextBuilder;
use crate::types::{fmt_trim, Dec};
use std::io::{self, Write};

/// Indirect-object reference: the object's number in the document's
/// dense 1-based numbering. Links between objects are stored as these
/// handles, never as pointers, so the parent/child cycle between the
/// page tree root and its pages costs nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjRef(u32);

impl ObjRef {
    pub fn number(self) -> u32 {
        self.0
    }
}

/// Handle for a font registered at document scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocFont(usize);

/// Handle for a font slot inside one page's resource dictionary,
/// rendered as `/F<slot>`. Distinct from `DocFont` so the two levels
/// cannot be mixed up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageFont(usize);

impl PageFont {
    pub fn slot(self) -> usize {
        self.0
    }
}

#[derive(Debug)]
enum Body {
    Catalog {
        pages: ObjRef,
    },
    Pages {
        kids: Vec<ObjRef>,
    },
    Page {
        parent: ObjRef,
        contents: ObjRef,
        media: (Dec, Dec),
        fonts: Vec<ObjRef>,
    },
    Font {
        base_name: String,
    },
    Stream {
        text: TextBuilder,
    },
}

const CATALOG_NUMBER: u32 = 1;
const PAGES_NUMBER: u32 = 2;

/// The in-memory object graph. Objects live in insertion order; the
/// Catalog and the page tree root exist from construction, so an empty
/// document still serializes to a well-formed file.
pub struct PdfDocument {
    objects: Vec<Body>,
    catalog: ObjRef,
    pages_root: ObjRef,
    fonts: Vec<(String, ObjRef)>,
}

impl PdfDocument {
    pub fn new() -> PdfDocument {
        let objects = vec![
            Body::Catalog {
                pages: ObjRef(PAGES_NUMBER),
            },
            Body::Pages { kids: Vec::new() },
        ];
        PdfDocument {
            objects,
            catalog: ObjRef(CATALOG_NUMBER),
            pages_root: ObjRef(PAGES_NUMBER),
            fonts: Vec::new(),
        }
    }

    fn alloc(&mut self, body: Body) -> ObjRef {
        self.objects.push(body);
        ObjRef(self.objects.len() as u32)
    }

    fn body_mut(&mut self, obj: ObjRef) -> &mut Body {
        &mut self.objects[obj.0 as usize - 1]
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    pub fn page_count(&self) -> usize {
        match &self.objects[self.pages_root.0 as usize - 1] {
            Body::Pages { kids } => kids.len(),
            _ => 0,
        }
    }

    /// Registers a base font at document scope. Registering the same
    /// base name twice yields the original handle.
    pub fn register_font(&mut self, base_name: &str) -> DocFont {
        if let Some(index) = self.fonts.iter().position(|(name, _)| name == base_name) {
            return DocFont(index);
        }
        let obj = self.alloc(Body::Font {
            base_name: base_name.to_string(),
        });
        self.fonts.push((base_name.to_string(), obj));
        DocFont(self.fonts.len() - 1)
    }

    /// Appends a page with its content stream and links it under the
    /// page tree root. Returns `(page, stream)`.
    pub fn add_page(&mut self, width: Dec, height: Dec) -> (ObjRef, ObjRef) {
        let stream = self.alloc(Body::Stream {
            text: TextBuilder::new(),
        });
        let parent = self.pages_root;
        let page = self.alloc(Body::Page {
            parent,
            contents: stream,
            media: (width, height),
            fonts: Vec::new(),
        });
        if let Body::Pages { kids } = self.body_mut(parent) {
            kids.push(page);
        }
        (page, stream)
    }

    /// Ensures the page references the document font and returns the
    /// page-local slot. Each document font occupies at most one slot per
    /// page.
    pub fn add_page_font(&mut self, page: ObjRef, font: DocFont) -> PageFont {
        let font_obj = self.fonts[font.0].1;
        match self.body_mut(page) {
            Body::Page { fonts, .. } => {
                if let Some(slot) = fonts.iter().position(|&f| f == font_obj) {
                    PageFont(slot)
                } else {
                    fonts.push(font_obj);
                    PageFont(fonts.len() - 1)
                }
            }
            _ => PageFont(0),
        }
    }

    pub fn set_page_media(&mut self, page: ObjRef, width: Dec, height: Dec) {
        if let Body::Page { media, .. } = self.body_mut(page) {
            *media = (width, height);
        }
    }

    pub fn text_mut(&mut self, stream: ObjRef) -> &mut TextBuilder {
        match self.body_mut(stream) {
            Body::Stream { text } => text,
            _ => panic!("object {} is not a content stream", stream.0),
        }
    }

    fn render_body(&mut self, index: usize) -> Vec<u8> {
        match &mut self.objects[index] {
            Body::Catalog { pages } => {
                format!("<< /Type /Catalog /Pages {} 0 R >>", pages.0).into_bytes()
            }
            Body::Pages { kids } => {
                let kids_entries = kids
                    .iter()
                    .map(|k| format!("{} 0 R", k.0))
                    .collect::<Vec<_>>()
                    .join(" ");
                format!(
                    "<< /Type /Pages /Kids [{}] /Count {} >>",
                    kids_entries,
                    kids.len()
                )
                .into_bytes()
            }
            Body::Page {
                parent,
                contents,
                media,
                fonts,
            } => {
                let font_entries = fonts
                    .iter()
                    .enumerate()
                    .map(|(slot, f)| format!("/F{} {} 0 R", slot, f.0))
                    .collect::<Vec<_>>()
                    .join(" ");
                format!(
                    "<< /Type /Page /Parent {} 0 R /Contents {} 0 R /MediaBox [0 0 {} {}] /Resources << /Font << {} >> >> >>",
                    parent.0,
                    contents.0,
                    fmt_trim(media.0),
                    fmt_trim(media.1),
                    font_entries
                )
                .into_bytes()
            }
            Body::Font { base_name } => format!(
                "<< /Type /Font /BaseFont /{} /Subtype /Type1 >>",
                base_name
            )
            .into_bytes(),
            Body::Stream { text } => {
                let data = text.take_content();
                let mut out = format!("<< /Length {} >>\nstream\n", data.len()).into_bytes();
                out.extend_from_slice(&data);
                out.extend_from_slice(b"\nendstream");
                out
            }
        }
    }

    /// Serializes the whole graph: header, bodies in insertion order,
    /// cross-reference table, trailer. Offsets are counted as written so
    /// the xref entries are exact.
    pub fn write_to<W: Write>(&mut self, writer: &mut W) -> io::Result<()> {
        let mut offset = 0usize;
        write_bytes(writer, b"%PDF-1.1\n", &mut offset)?;
        write_bytes(writer, b"%\xE2\xE3\xCF\xD3\n", &mut offset)?;

        let total = self.objects.len();
        let mut offsets = Vec::with_capacity(total);
        for index in 0..total {
            let body = self.render_body(index);
            offsets.push(offset);
            write_str(writer, &format!("{} 0 obj\n", index + 1), &mut offset)?;
            write_bytes(writer, &body, &mut offset)?;
            write_bytes(writer, b"\nendobj\n", &mut offset)?;
        }

        let xref_start = offset;
        write_str(writer, &format!("xref\n0 {}\n", total + 1), &mut offset)?;
        write_bytes(writer, b"0000000000 65535 f \n", &mut offset)?;
        for obj_offset in &offsets {
            write_str(writer, &format!("{:010} 00000 n \n", obj_offset), &mut offset)?;
        }
        write_str(
            writer,
            &format!(
                "trailer\n<< /Root {} 0 R /Size {} >>\nstartxref\n{}\n%%EOF",
                self.catalog.0,
                total + 1,
                xref_start
            ),
            &mut offset,
        )?;
        Ok(())
    }
}

impl Default for PdfDocument {
    fn default() -> Self {
        PdfDocument::new()
    }
}

fn write_bytes<W: Write>(writer: &mut W, data: &[u8], offset: &mut usize) -> io::Result<()> {
    writer.write_all(data)?;
    *offset += data.len();
    Ok(())
}

fn write_str<W: Write>(writer: &mut W, data: &str, offset: &mut usize) -> io::Result<()> {
    write_bytes(writer, data.as_bytes(), offset)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn serialize(doc: &mut PdfDocument) -> Vec<u8> {
        let mut out = Vec::new();
        doc.write_to(&mut out).expect("serialize");
        out
    }

    fn letter() -> (Dec, Dec) {
        (Dec::new(612, 0), Dec::new(792, 0))
    }

    #[test]
    fn empty_document_is_still_well_formed() {
        let mut doc = PdfDocument::new();
        let out = serialize(&mut doc);
        let text = String::from_utf8_lossy(&out);
        assert!(out.starts_with(b"%PDF-1.1\n%\xE2\xE3\xCF\xD3\n"));
        assert!(text.contains("<< /Type /Catalog /Pages 2 0 R >>"));
        assert!(text.contains("<< /Type /Pages /Kids [] /Count 0 >>"));
        assert!(text.contains("/Size 3"));
        assert!(text.ends_with("%%EOF"));
    }

    #[test]
    fn startxref_points_at_the_xref_keyword() {
        let mut doc = PdfDocument::new();
        let (w, h) = letter();
        doc.add_page(w, h);
        let out = serialize(&mut doc);
        let text = String::from_utf8_lossy(&out).to_string();
        let startxref: usize = text
            .rsplit("startxref\n")
            .next()
            .and_then(|tail| tail.lines().next())
            .and_then(|line| line.parse().ok())
            .expect("startxref value");
        assert_eq!(&out[startxref..startxref + 4], b"xref");
    }

    #[test]
    fn xref_offsets_land_on_object_headers() {
        let mut doc = PdfDocument::new();
        let font = doc.register_font("Times-Roman");
        let (w, h) = letter();
        let (page, _stream) = doc.add_page(w, h);
        doc.add_page_font(page, font);
        let out = serialize(&mut doc);
        let text = String::from_utf8_lossy(&out).to_string();

        let xref_at = text.find("\nxref\n").expect("xref") + 1;
        let entries: Vec<&str> = text[xref_at..]
            .lines()
            .skip(2)
            .take_while(|line| line.ends_with("n ") || line.ends_with("f "))
            .collect();
        assert_eq!(entries.len(), doc.object_count() + 1);
        for (number, entry) in entries.iter().enumerate().skip(1) {
            let offset: usize = entry[..10].parse().expect("offset digits");
            let header = format!("{} 0 obj\n", number);
            // Offsets index the raw bytes; the lossy string view shifts
            // past the binary header comment.
            assert!(
                out[offset..].starts_with(header.as_bytes()),
                "object {} not at its declared offset {}",
                number,
                offset
            );
        }
    }

    #[test]
    fn size_is_object_count_plus_one() {
        let mut doc = PdfDocument::new();
        let (w, h) = letter();
        doc.add_page(w, h);
        doc.add_page(w, h);
        let out = serialize(&mut doc);
        let text = String::from_utf8_lossy(&out);
        assert_eq!(doc.object_count(), 6);
        assert!(text.contains("/Size 7"));
    }

    #[test]
    fn pages_root_lists_kids_in_order_with_count() {
        let mut doc = PdfDocument::new();
        let (w, h) = letter();
        let (p1, _) = doc.add_page(w, h);
        let (p2, _) = doc.add_page(w, h);
        let out = serialize(&mut doc);
        let text = String::from_utf8_lossy(&out);
        let kids = format!(
            "<< /Type /Pages /Kids [{} 0 R {} 0 R] /Count 2 >>",
            p1.number(),
            p2.number()
        );
        assert!(text.contains(&kids));
        assert!(text.contains(&format!("/Parent {} 0 R", PAGES_NUMBER)));
    }

    #[test]
    fn register_font_deduplicates_by_base_name() {
        let mut doc = PdfDocument::new();
        let a = doc.register_font("Times-Roman");
        let b = doc.register_font("Times-Roman");
        let c = doc.register_font("Courier");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(doc.object_count(), 4);
    }

    #[test]
    fn one_resource_slot_per_document_font_per_page() {
        let mut doc = PdfDocument::new();
        let tr = doc.register_font("Times-Roman");
        let cr = doc.register_font("Courier");
        let (w, h) = letter();
        let (page, _) = doc.add_page(w, h);
        assert_eq!(doc.add_page_font(page, tr).slot(), 0);
        assert_eq!(doc.add_page_font(page, cr).slot(), 1);
        assert_eq!(doc.add_page_font(page, tr).slot(), 0);
        let out = serialize(&mut doc);
        let text = String::from_utf8_lossy(&out);
        assert!(text.contains("/Font << /F0 3 0 R /F1 4 0 R >>"));
    }

    #[test]
    fn media_box_prints_integral_dimensions_bare() {
        let mut doc = PdfDocument::new();
        let (page, _) = doc.add_page(Dec::new(612, 0), Dec::new(792, 0));
        doc.set_page_media(page, Dec::new(595, 0), Dec::new(842, 0));
        let out = serialize(&mut doc);
        let text = String::from_utf8_lossy(&out);
        assert!(text.contains("/MediaBox [0 0 595 842]"));
    }

    #[test]
    fn stream_length_matches_materialized_bytes() {
        let mut doc = PdfDocument::new();
        let (w, h) = letter();
        let (_page, stream) = doc.add_page(w, h);
        doc.text_mut(stream).append_raw(b"abc");
        let out = serialize(&mut doc);
        let text = String::from_utf8_lossy(&out).to_string();
        // BT\n(abc) Tj\nET plus the matrix line for the word start.
        let at = text.find("stream\n").expect("stream keyword");
        let end = text.find("\nendstream").expect("endstream keyword");
        let data_len = end - (at + "stream\n".len());
        assert!(text.contains(&format!("/Length {} >>", data_len)));
    }
}
