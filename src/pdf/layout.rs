use pdf_writer::{Content, Filter, Name, Pdf, Rect, Ref, Str};

use crate::fonts::{self, FontEntry};
use crate::model::{EmbeddedImage, ImageFormat};

/// Immutable page geometry shared by every page of one report.
#[derive(Clone, Copy)]
pub(crate) struct PageLayout {
    pub(crate) page_width: f32,
    pub(crate) page_height: f32,
    pub(crate) margin: f32,
    pub(crate) content_width: f32,
}

impl PageLayout {
    /// A4 portrait with a 40pt margin on all sides.
    pub(crate) fn a4() -> Self {
        let page_width = 595.28;
        let page_height = 841.89;
        let margin = 40.0;
        Self {
            page_width,
            page_height,
            margin,
            content_width: page_width - 2.0 * margin,
        }
    }
}

/// Fixed report palette, RGB 0..=255 per channel.
pub(crate) struct Palette {
    pub(crate) text: [u8; 3],
    pub(crate) muted: [u8; 3],
    pub(crate) line: [u8; 3],
    pub(crate) card_bg: [u8; 3],
    pub(crate) header_bg: [u8; 3],
    pub(crate) header_text: [u8; 3],
    pub(crate) header_meta: [u8; 3],
    pub(crate) footer_text: [u8; 3],
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            text: [17, 24, 39],
            muted: [107, 114, 128],
            line: [229, 231, 235],
            card_bg: [248, 250, 252],
            header_bg: [31, 41, 55],
            header_text: [255, 255, 255],
            header_meta: [203, 213, 225],
            footer_text: [156, 163, 175],
        }
    }
}

/// Vertical slack kept above the bottom margin when deciding page breaks.
const BREAK_SAFETY: f32 = 30.0;

/// Mutable per-report state: the growing page list, the write cursor, the
/// two registered fonts, and the PDF object store the pages are assembled
/// into. One instance per build; nothing is shared across builds.
pub(crate) struct RenderState {
    pdf: Pdf,
    next_id: i32,
    catalog_id: Ref,
    pages_id: Ref,
    pages: Vec<Content>,
    current: usize,
    cursor_y: f32,
    pub(crate) layout: PageLayout,
    pub(crate) palette: Palette,
    font_regular: FontEntry,
    font_bold: FontEntry,
    images: Vec<(String, Ref)>,
}

impl RenderState {
    pub(crate) fn new(layout: PageLayout, palette: Palette) -> Self {
        let mut pdf = Pdf::new();
        let mut next_id = 1i32;
        let mut alloc = || {
            let r = Ref::new(next_id);
            next_id += 1;
            r
        };

        let catalog_id = alloc();
        let pages_id = alloc();
        let regular_ref = alloc();
        let bold_ref = alloc();

        let font_regular = fonts::register_builtin(&mut pdf, "F1", "Helvetica", regular_ref);
        let font_bold = fonts::register_builtin(&mut pdf, "F2", "Helvetica-Bold", bold_ref);

        let cursor_y = layout.page_height - layout.margin;
        Self {
            pdf,
            next_id,
            catalog_id,
            pages_id,
            pages: vec![Content::new()],
            current: 0,
            cursor_y,
            layout,
            palette,
            font_regular,
            font_bold,
            images: Vec::new(),
        }
    }

    fn alloc(&mut self) -> Ref {
        let r = Ref::new(self.next_id);
        self.next_id += 1;
        r
    }

    pub(crate) fn cursor_y(&self) -> f32 {
        self.cursor_y
    }

    pub(crate) fn set_cursor(&mut self, y: f32) {
        self.cursor_y = y;
    }

    /// Move the cursor down by `dy` on the current page.
    pub(crate) fn advance(&mut self, dy: f32) {
        self.cursor_y -= dy;
    }

    pub(crate) fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// The single page-break decision point. Block renderers call this with
    /// the full height of a block before drawing any part of it, which is
    /// what keeps blocks atomic: once this returns, the whole block fits on
    /// the current page.
    pub(crate) fn ensure_space(&mut self, need: f32) {
        if self.cursor_y - need < self.layout.margin + BREAK_SAFETY {
            self.pages.push(Content::new());
            self.current = self.pages.len() - 1;
            self.cursor_y = self.layout.page_height - self.layout.margin;
        }
    }

    fn font(&self, bold: bool) -> &FontEntry {
        if bold {
            &self.font_bold
        } else {
            &self.font_regular
        }
    }

    pub(crate) fn text_width(&self, text: &str, font_size: f32, bold: bool) -> f32 {
        self.font(bold).text_width(text, font_size)
    }

    pub(crate) fn truncate(
        &self,
        text: &str,
        font_size: f32,
        bold: bool,
        max_width: f32,
    ) -> String {
        self.font(bold).truncate_to_width(text, font_size, max_width)
    }

    /// Draw a single text line on the current page.
    pub(crate) fn draw_text(
        &mut self,
        text: &str,
        x: f32,
        y: f32,
        font_size: f32,
        bold: bool,
        color: [u8; 3],
    ) {
        self.draw_text_on(self.current, text, x, y, font_size, bold, color);
    }

    /// Draw a single text line on an arbitrary page. The footer pass uses
    /// this to stamp already-finished pages.
    pub(crate) fn draw_text_on(
        &mut self,
        page: usize,
        text: &str,
        x: f32,
        y: f32,
        font_size: f32,
        bold: bool,
        color: [u8; 3],
    ) {
        let font_name = self.font(bold).pdf_name;
        let bytes = fonts::to_winansi_bytes(text);
        let [r, g, b] = color;
        self.pages[page]
            .begin_text()
            .set_font(Name(font_name.as_bytes()), font_size)
            .set_fill_rgb(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0)
            .next_line(x, y)
            .show(Str(&bytes))
            .end_text();
    }

    pub(crate) fn draw_rect(&mut self, x: f32, y: f32, w: f32, h: f32, fill: [u8; 3]) {
        let [r, g, b] = fill;
        let content = &mut self.pages[self.current];
        content.save_state();
        content
            .set_fill_rgb(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0)
            .rect(x, y, w, h)
            .fill_nonzero();
        content.restore_state();
    }

    pub(crate) fn draw_rect_outline(
        &mut self,
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        stroke: [u8; 3],
        line_width: f32,
    ) {
        let [r, g, b] = stroke;
        let content = &mut self.pages[self.current];
        content.save_state();
        content
            .set_line_width(line_width)
            .set_stroke_rgb(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0)
            .rect(x, y, w, h)
            .stroke();
        content.restore_state();
    }

    /// Place a previously embedded image on the current page, scaled to the
    /// given box.
    pub(crate) fn draw_image(&mut self, name: &str, x: f32, y: f32, w: f32, h: f32) {
        let content = &mut self.pages[self.current];
        content.save_state();
        content.transform([w, 0.0, 0.0, h, x, y]);
        content.x_object(Name(name.as_bytes()));
        content.restore_state();
    }

    /// Write an image XObject into the document and return its resource
    /// name. JPEG data passes through with DctDecode; PNG is decoded to RGB
    /// with an optional alpha SMask and Flate-compressed.
    pub(crate) fn embed_image(&mut self, img: &EmbeddedImage) -> String {
        let xobj_ref = self.alloc();
        let pdf_name = format!("Im{}", self.images.len() + 1);

        match img.format {
            ImageFormat::Jpeg => {
                let mut xobj = self.pdf.image_xobject(xobj_ref, &img.data);
                xobj.filter(Filter::DctDecode);
                xobj.width(img.pixel_width as i32);
                xobj.height(img.pixel_height as i32);
                xobj.color_space().device_rgb();
                xobj.bits_per_component(8);
            }
            ImageFormat::Png => {
                let cursor = std::io::Cursor::new(&img.data);
                let reader = image::ImageReader::with_format(
                    std::io::BufReader::new(cursor),
                    image::ImageFormat::Png,
                );
                if let Ok(decoded) = reader.decode() {
                    let rgba: image::RgbaImage = decoded.to_rgba8();
                    let (w, h) = (rgba.width(), rgba.height());
                    let has_alpha = rgba.pixels().any(|p| p.0[3] < 255);

                    let rgb_data: Vec<u8> = rgba
                        .pixels()
                        .flat_map(|p| [p.0[0], p.0[1], p.0[2]])
                        .collect();
                    let compressed_rgb = miniz_oxide::deflate::compress_to_vec_zlib(&rgb_data, 6);

                    let smask_ref = if has_alpha {
                        let alpha_data: Vec<u8> = rgba.pixels().map(|p| p.0[3]).collect();
                        let compressed_alpha =
                            miniz_oxide::deflate::compress_to_vec_zlib(&alpha_data, 6);
                        let mask_ref = self.alloc();
                        let mut mask = self.pdf.image_xobject(mask_ref, &compressed_alpha);
                        mask.filter(Filter::FlateDecode);
                        mask.width(w as i32);
                        mask.height(h as i32);
                        mask.color_space().device_gray();
                        mask.bits_per_component(8);
                        Some(mask_ref)
                    } else {
                        None
                    };

                    let mut xobj = self.pdf.image_xobject(xobj_ref, &compressed_rgb);
                    xobj.filter(Filter::FlateDecode);
                    xobj.width(w as i32);
                    xobj.height(h as i32);
                    xobj.color_space().device_rgb();
                    xobj.bits_per_component(8);
                    if let Some(mask_ref) = smask_ref {
                        xobj.s_mask(mask_ref);
                    }
                }
            }
        }

        self.images.push((pdf_name.clone(), xobj_ref));
        pdf_name
    }

    /// Assemble the page tree and serialize. Content streams are written
    /// Flate-compressed; every page shares the font and image resources.
    pub(crate) fn finish(mut self) -> Vec<u8> {
        let n = self.pages.len();
        let page_ids: Vec<Ref> = (0..n).map(|_| self.alloc()).collect();
        let content_ids: Vec<Ref> = (0..n).map(|_| self.alloc()).collect();

        for (i, content) in std::mem::take(&mut self.pages).into_iter().enumerate() {
            let raw = content.finish();
            let compressed = miniz_oxide::deflate::compress_to_vec_zlib(&raw, 6);
            self.pdf
                .stream(content_ids[i], &compressed)
                .filter(Filter::FlateDecode);
        }

        self.pdf.catalog(self.catalog_id).pages(self.pages_id);
        self.pdf
            .pages(self.pages_id)
            .kids(page_ids.iter().copied())
            .count(n as i32);

        for i in 0..n {
            let mut page = self.pdf.page(page_ids[i]);
            page.media_box(Rect::new(
                0.0,
                0.0,
                self.layout.page_width,
                self.layout.page_height,
            ))
            .parent(self.pages_id)
            .contents(content_ids[i]);

            let mut resources = page.resources();
            {
                let mut font_dict = resources.fonts();
                font_dict.pair(
                    Name(self.font_regular.pdf_name.as_bytes()),
                    self.font_regular.font_ref,
                );
                font_dict.pair(
                    Name(self.font_bold.pdf_name.as_bytes()),
                    self.font_bold.font_ref,
                );
            }
            if !self.images.is_empty() {
                let mut xobjects = resources.x_objects();
                for (name, xobj_ref) in &self.images {
                    xobjects.pair(Name(name.as_bytes()), *xobj_ref);
                }
            }
        }

        self.pdf.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a4_content_width_is_derived() {
        let layout = PageLayout::a4();
        assert!((layout.content_width - (595.28 - 80.0)).abs() < 1e-4);
    }

    #[test]
    fn ensure_space_breaks_only_below_threshold() {
        let mut state = RenderState::new(PageLayout::a4(), Palette::default());
        let start = state.cursor_y();

        // Fits comfortably: no new page, cursor untouched
        state.ensure_space(100.0);
        assert_eq!(state.page_count(), 1);
        assert_eq!(state.cursor_y(), start);

        // Walk the cursor down until the next block cannot fit
        state.advance(start - 120.0);
        state.ensure_space(100.0);
        assert_eq!(state.page_count(), 2);
        assert_eq!(state.cursor_y(), 841.89 - 40.0);
    }

    #[test]
    fn cursor_resets_on_every_new_page() {
        let mut state = RenderState::new(PageLayout::a4(), Palette::default());
        for _ in 0..3 {
            state.advance(state.cursor_y() - 80.0);
            state.ensure_space(200.0);
        }
        assert_eq!(state.page_count(), 4);
        assert_eq!(state.cursor_y(), 841.89 - 40.0);
    }
}
