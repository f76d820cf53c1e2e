//! # Container Assembler
//!
//! Wraps the raster page in a minimal single-page PDF. The page is
//! re-encoded as a baseline JPEG and embedded as one image XObject that a
//! single content stream paints over the whole media box. The default page
//! geometry maps to exact A4; any other size converts at 0.75 pt per unit.
//!
//! ```text
//! %PDF-1.4
//! 1 0 obj  Catalog
//! 2 0 obj  Pages
//! 3 0 obj  Page
//! 4 0 obj  content stream   q W 0 0 H 0 0 cm /Im1 Do Q
//! 5 0 obj  image            /DCTDecode
//! [6 0 obj Info]            only with a document title
//! xref / trailer / startxref / %%EOF
//! ```
//!
//! Offsets come from [`PdfBuffer`], which records the length of the output
//! at the moment each object starts. Nothing is patched afterwards, and
//! there are no timestamps: the same page always yields the same bytes.

use std::io::Write as IoWrite;

use image::codecs::jpeg::JpegEncoder;
use image::RgbaImage;

use crate::config::PageGeometry;
use crate::LoandocError;

pub const MIME_TYPE: &str = "application/pdf";

/// A4 in PostScript points.
pub const PAGE_WIDTH_PT: f32 = 595.28;
pub const PAGE_HEIGHT_PT: f32 = 841.89;

/// PostScript points per layout unit (72 / 96).
const POINTS_PER_UNIT: f32 = 0.75;

const PRODUCER: &str = "loandoc";

/// Page size in PostScript points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MediaBox {
    pub width: f32,
    pub height: f32,
}

impl MediaBox {
    pub const A4: MediaBox = MediaBox {
        width: PAGE_WIDTH_PT,
        height: PAGE_HEIGHT_PT,
    };

    /// Media box for a page laid out in `page` units.
    pub fn for_page(page: &PageGeometry) -> Self {
        let default = PageGeometry::default();
        if page.width == default.width && page.height == default.height {
            return Self::A4;
        }
        let points = |units: f32| (units * POINTS_PER_UNIT * 100.0).round() / 100.0;
        Self {
            width: points(page.width),
            height: points(page.height),
        }
    }
}

/// The downloadable result of one render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedDocument {
    pub bytes: Vec<u8>,
    pub filename: String,
    pub mime: &'static str,
}

impl GeneratedDocument {
    pub fn new(bytes: Vec<u8>, name: &str) -> Self {
        Self {
            bytes,
            filename: suggested_filename(name),
            mime: MIME_TYPE,
        }
    }
}

/// File name for a document called `name`: ASCII alphanumerics kept, every
/// other run collapsed to `_`.
pub fn suggested_filename(name: &str) -> String {
    let mut stem = String::new();
    let mut pending_sep = false;
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_sep && !stem.is_empty() {
                stem.push('_');
            }
            pending_sep = false;
            stem.push(ch);
        } else {
            pending_sep = true;
        }
    }
    if stem.is_empty() {
        stem.push_str("document");
    }
    stem.push_str(".pdf");
    stem
}

/// An append-only byte buffer that knows where each object begins.
pub struct PdfBuffer {
    bytes: Vec<u8>,
    /// Offset of object `i + 1`.
    offsets: Vec<usize>,
}

impl PdfBuffer {
    pub fn new() -> Self {
        let mut buffer = Self {
            bytes: Vec::new(),
            offsets: Vec::new(),
        };
        buffer.push(b"%PDF-1.4\n");
        // High-bit comment marks the file as binary for transfer tools
        buffer.push(b"%\xe2\xe3\xcf\xd3\n");
        buffer
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn push(&mut self, chunk: &[u8]) {
        self.bytes.extend_from_slice(chunk);
    }

    /// Start the next object. Objects are numbered in emission order.
    fn begin_object(&mut self) -> usize {
        self.offsets.push(self.bytes.len());
        let id = self.offsets.len();
        self.push(format!("{} 0 obj\n", id).as_bytes());
        id
    }

    pub fn object(&mut self, body: &str) -> usize {
        let id = self.begin_object();
        self.push(body.as_bytes());
        self.push(b"\nendobj\n");
        id
    }

    /// A stream object. `/Length` is inserted from `data`.
    pub fn stream_object(&mut self, dict_entries: &str, data: &[u8]) -> usize {
        let id = self.begin_object();
        let dict = if dict_entries.is_empty() {
            format!("<< /Length {} >>", data.len())
        } else {
            format!("<< {} /Length {} >>", dict_entries, data.len())
        };
        self.push(dict.as_bytes());
        self.push(b"\nstream\n");
        self.push(data);
        self.push(b"\nendstream\nendobj\n");
        id
    }

    /// Write the cross-reference table and trailer and hand back the file.
    pub fn finish(mut self, info: Option<usize>) -> Vec<u8> {
        let xref_offset = self.bytes.len();
        let size = self.offsets.len() + 1;
        let mut tail = Vec::new();
        let _ = write!(tail, "xref\n0 {}\n", size);
        tail.extend_from_slice(b"0000000000 65535 f \n");
        for offset in &self.offsets {
            let _ = write!(tail, "{:010} 00000 n \n", offset);
        }
        let _ = write!(tail, "trailer\n<< /Size {} /Root 1 0 R", size);
        if let Some(id) = info {
            let _ = write!(tail, " /Info {} 0 R", id);
        }
        let _ = write!(tail, " >>\nstartxref\n{}\n%%EOF\n", xref_offset);
        self.push(&tail);
        self.bytes
    }
}

impl Default for PdfBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// Flatten onto white and encode as baseline JPEG.
pub fn encode_jpeg(page: &RgbaImage, quality: u8) -> Result<Vec<u8>, LoandocError> {
    let (width, height) = page.dimensions();
    if width == 0 || height == 0 {
        return Err(LoandocError::Encoding("raster page is empty".to_string()));
    }
    let mut rgb = Vec::with_capacity((width * height * 3) as usize);
    for px in page.pixels() {
        let [r, g, b, a] = px.0;
        let a = a as u16;
        for c in [r, g, b] {
            rgb.push(((c as u16 * a + 255 * (255 - a) + 127) / 255) as u8);
        }
    }
    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, quality.clamp(1, 100)).encode(
        &rgb,
        width,
        height,
        image::ColorType::Rgb8,
    )?;
    Ok(out)
}

/// Build the complete container for one raster page.
pub fn assemble(
    page: &RgbaImage,
    media: MediaBox,
    quality: u8,
    title: Option<&str>,
) -> Result<Vec<u8>, LoandocError> {
    let jpeg = encode_jpeg(page, quality)?;
    let (width, height) = page.dimensions();

    let mut pdf = PdfBuffer::new();
    pdf.object("<< /Type /Catalog /Pages 2 0 R >>");
    pdf.object("<< /Type /Pages /Kids [3 0 R] /Count 1 >>");
    pdf.object(&format!(
        "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {} {}] \
         /Resources << /XObject << /Im1 5 0 R >> >> /Contents 4 0 R >>",
        media.width, media.height
    ));
    let content = format!("q {} 0 0 {} 0 0 cm /Im1 Do Q", media.width, media.height);
    pdf.stream_object("", content.as_bytes());
    pdf.stream_object(
        &format!(
            "/Type /XObject /Subtype /Image /Width {} /Height {} \
             /ColorSpace /DeviceRGB /BitsPerComponent 8 /Filter /DCTDecode",
            width, height
        ),
        &jpeg,
    );

    let info = title.map(str::trim).filter(|t| !t.is_empty()).map(|title| {
        pdf.object(&format!(
            "<< /Title {} /Producer ({}) >>",
            pdf_text_string(title),
            PRODUCER
        ))
    });

    let bytes = pdf.finish(info);
    tracing::debug!(bytes = bytes.len(), jpeg = jpeg.len(), "assembled container");
    Ok(bytes)
}

/// A PDF text string: a literal for ASCII, UTF-16BE hex otherwise.
fn pdf_text_string(text: &str) -> String {
    if text.is_ascii() {
        let escaped = text
            .replace('\\', "\\\\")
            .replace('(', "\\(")
            .replace(')', "\\)");
        return format!("({})", escaped);
    }
    let mut hex = String::from("<FEFF");
    for unit in text.encode_utf16() {
        hex.push_str(&format!("{:04X}", unit));
    }
    hex.push('>');
    hex
}

#[cfg(test)]
mod tests {
    use super::*;

    // ─── Helpers ────────────────────────────────────────────────

    fn page(w: u32, h: u32) -> RgbaImage {
        RgbaImage::from_pixel(w, h, image::Rgba([255, 255, 255, 255]))
    }

    fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
        haystack.windows(needle.len()).position(|w| w == needle)
    }

    fn rfind(haystack: &[u8], needle: &[u8]) -> Option<usize> {
        haystack.windows(needle.len()).rposition(|w| w == needle)
    }

    /// Parse the xref entries of a finished file.
    fn xref_offsets(bytes: &[u8]) -> Vec<usize> {
        let start = rfind(bytes, b"startxref\n").unwrap() + "startxref\n".len();
        let end = start + bytes[start..].iter().position(|b| *b == b'\n').unwrap();
        let xref: usize = std::str::from_utf8(&bytes[start..end]).unwrap().parse().unwrap();
        let table = std::str::from_utf8(&bytes[xref..]).unwrap();
        table
            .lines()
            .skip(3)
            .take_while(|l| l.ends_with(" n "))
            .map(|l| l[..10].parse().unwrap())
            .collect()
    }

    // ─── Structure ──────────────────────────────────────────────

    #[test]
    fn test_header_xref_and_trailer() {
        let bytes = assemble(&page(8, 12), MediaBox::A4, 92, None).unwrap();
        assert!(bytes.starts_with(b"%PDF-1.4\n"));
        assert!(bytes.ends_with(b"%%EOF\n"));
        assert!(find(&bytes, b"xref\n0 6\n0000000000 65535 f \n").is_some());
        assert!(find(&bytes, b"trailer\n<< /Size 6 /Root 1 0 R >>\nstartxref\n").is_some());
        assert!(find(&bytes, b"/Info").is_none());
    }

    #[test]
    fn test_xref_offsets_land_on_objects() {
        let bytes =
            assemble(&page(20, 30), MediaBox::A4, 80, Some("Loan Approval Letter")).unwrap();
        let offsets = xref_offsets(&bytes);
        assert_eq!(offsets.len(), 6);
        for (i, offset) in offsets.iter().enumerate() {
            let expected = format!("{} 0 obj", i + 1);
            assert!(
                bytes[*offset..].starts_with(expected.as_bytes()),
                "object {} not at offset {}",
                i + 1,
                offset
            );
        }
        assert!(find(&bytes, b"<< /Size 7 /Root 1 0 R /Info 6 0 R >>").is_some());
    }

    #[test]
    fn test_stream_lengths_match() {
        let bytes = assemble(&page(16, 16), MediaBox::A4, 92, None).unwrap();
        let mut cursor = 0;
        let mut streams = 0;
        while let Some(pos) = find(&bytes[cursor..], b"/Length ") {
            let at = cursor + pos + "/Length ".len();
            let digits: String = bytes[at..]
                .iter()
                .take_while(|b| b.is_ascii_digit())
                .map(|b| *b as char)
                .collect();
            let length: usize = digits.parse().unwrap();
            let data_start = at + find(&bytes[at..], b"stream\n").unwrap() + "stream\n".len();
            assert_eq!(&bytes[data_start + length..data_start + length + 10], b"\nendstream");
            cursor = data_start + length;
            streams += 1;
        }
        assert_eq!(streams, 2);
    }

    #[test]
    fn test_content_stream_paints_full_page() {
        let bytes = assemble(&page(4, 4), MediaBox::A4, 92, None).unwrap();
        assert!(find(&bytes, b"q 595.28 0 0 841.89 0 0 cm /Im1 Do Q").is_some());
        assert!(find(&bytes, b"/MediaBox [0 0 595.28 841.89]").is_some());
    }

    #[test]
    fn test_media_box_follows_page_geometry() {
        assert_eq!(MediaBox::for_page(&PageGeometry::default()), MediaBox::A4);

        let letter = PageGeometry {
            width: 816.0,
            height: 1056.0,
            ..Default::default()
        };
        let media = MediaBox::for_page(&letter);
        assert_eq!(media, MediaBox { width: 612.0, height: 792.0 });

        let bytes = assemble(&page(4, 4), media, 92, None).unwrap();
        assert!(find(&bytes, b"/MediaBox [0 0 612 792]").is_some());
        assert!(find(&bytes, b"q 612 0 0 792 0 0 cm /Im1 Do Q").is_some());
        assert!(find(&bytes, b"595.28").is_none());
    }

    #[test]
    fn test_image_declares_raster_size() {
        let bytes = assemble(&page(397, 562), MediaBox::A4, 92, None).unwrap();
        assert!(find(&bytes, b"/Width 397 /Height 562").is_some());
        assert!(find(&bytes, b"/DeviceRGB /BitsPerComponent 8 /Filter /DCTDecode").is_some());
        // JPEG SOI marker right after the stream keyword
        let start = find(&bytes, b"stream\n\xff\xd8").unwrap();
        assert!(start > 0);
    }

    #[test]
    fn test_assembly_is_idempotent() {
        let raster = page(32, 48);
        let a = assemble(&raster, MediaBox::A4, 92, Some("Letter")).unwrap();
        let b = assemble(&raster, MediaBox::A4, 92, Some("Letter")).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_empty_raster_fails_without_bytes() {
        let err = assemble(&RgbaImage::new(0, 0), MediaBox::A4, 92, None).unwrap_err();
        assert!(matches!(err, LoandocError::Encoding(_)));
    }

    // ─── Metadata ───────────────────────────────────────────────

    #[test]
    fn test_title_escaping() {
        assert_eq!(pdf_text_string("A (b) \\ c"), "(A \\(b\\) \\\\ c)");
        assert_eq!(pdf_text_string("₹"), "<FEFF20B9>");
    }

    #[test]
    fn test_blank_title_is_ignored() {
        let bytes = assemble(&page(4, 4), MediaBox::A4, 92, Some("   ")).unwrap();
        assert!(find(&bytes, b"/Size 6").is_some());
    }

    #[test]
    fn test_transparent_pixels_flatten_to_white() {
        let raster = RgbaImage::new(8, 8);
        let jpeg = encode_jpeg(&raster, 100).unwrap();
        let decoded = image::load_from_memory(&jpeg).unwrap().to_rgb8();
        assert!(decoded.get_pixel(4, 4).0.iter().all(|c| *c > 245));
    }

    #[test]
    fn test_suggested_filename() {
        assert_eq!(suggested_filename("Loan Approval Letter"), "Loan_Approval_Letter.pdf");
        assert_eq!(suggested_filename("  ---  "), "document.pdf");
        assert_eq!(suggested_filename("EMI / Schedule (v2)"), "EMI_Schedule_v2.pdf");
    }

    #[test]
    fn test_generated_document_mime() {
        let doc = GeneratedDocument::new(vec![1, 2], "Sanction");
        assert_eq!(doc.mime, "application/pdf");
        assert_eq!(doc.filename, "Sanction.pdf");
    }
}
