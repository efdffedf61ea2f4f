use pdf_writer::{Name, Pdf, Ref};

/// A registered builtin font: PDF resource name plus the width table used
/// for measurement (right alignment, single-line truncation).
pub(crate) struct FontEntry {
    pub(crate) pdf_name: &'static str,
    pub(crate) font_ref: Ref,
    widths_1000: &'static [f32; 224],
}

impl FontEntry {
    fn char_width_1000(&self, ch: char) -> f32 {
        let byte = char_to_winansi(ch);
        if byte >= 32 {
            self.widths_1000[(byte - 32) as usize]
        } else {
            0.0
        }
    }

    pub(crate) fn text_width(&self, text: &str, font_size: f32) -> f32 {
        text.chars()
            .map(|ch| self.char_width_1000(ch) * font_size / 1000.0)
            .sum()
    }

    /// Cut `text` so it fits `max_width` at `font_size`, appending an
    /// ellipsis when anything was dropped. Fields are drawn as single lines,
    /// so overflow is trimmed rather than wrapped.
    pub(crate) fn truncate_to_width(&self, text: &str, font_size: f32, max_width: f32) -> String {
        if self.text_width(text, font_size) <= max_width {
            return text.to_string();
        }
        let ellipsis_width = self.char_width_1000('…') * font_size / 1000.0;
        let mut out = String::new();
        let mut width = 0.0;
        for ch in text.chars() {
            let ch_width = self.char_width_1000(ch) * font_size / 1000.0;
            if width + ch_width + ellipsis_width > max_width {
                break;
            }
            out.push(ch);
            width += ch_width;
        }
        out.push('…');
        out
    }
}

/// Register one of the base-14 Helvetica variants. Builtin Type1 fonts need
/// no embedded program, only an encoding and a local width table.
pub(crate) fn register_builtin(
    pdf: &mut Pdf,
    pdf_name: &'static str,
    base_font: &'static str,
    font_ref: Ref,
) -> FontEntry {
    pdf.type1_font(font_ref)
        .base_font(Name(base_font.as_bytes()))
        .encoding_predefined(Name(b"WinAnsiEncoding"));
    let widths_1000 = if base_font.ends_with("Bold") {
        &HELVETICA_BOLD_WIDTHS
    } else {
        &HELVETICA_WIDTHS
    };
    FontEntry {
        pdf_name,
        font_ref,
        widths_1000,
    }
}

/// Map a single Unicode char to its WinAnsi (Windows-1252) byte, or 0 if
/// unmappable. Bytes 0x80-0x9F carry the remapped punctuation block; all
/// other codepoints below 0x100 map directly.
fn char_to_winansi(c: char) -> u8 {
    match c as u32 {
        0x0020..=0x007F => c as u8,
        0x00A0..=0x00FF => c as u8,
        0x20AC => 0x80,
        0x201A => 0x82,
        0x0192 => 0x83,
        0x201E => 0x84,
        0x2026 => 0x85,
        0x2020 => 0x86,
        0x2021 => 0x87,
        0x02C6 => 0x88,
        0x2030 => 0x89,
        0x0160 => 0x8A,
        0x2039 => 0x8B,
        0x0152 => 0x8C,
        0x017D => 0x8E,
        0x2018 => 0x91,
        0x2019 => 0x92,
        0x201C => 0x93,
        0x201D => 0x94,
        0x2022 => 0x95,
        0x2013 => 0x96,
        0x2014 => 0x97,
        0x02DC => 0x98,
        0x2122 => 0x99,
        0x0161 => 0x9A,
        0x203A => 0x9B,
        0x0153 => 0x9C,
        0x017E => 0x9E,
        0x0178 => 0x9F,
        _ => 0,
    }
}

/// Convert a UTF-8 string to WinAnsi bytes for PDF Str encoding. Unmappable
/// chars are dropped.
pub(crate) fn to_winansi_bytes(s: &str) -> Vec<u8> {
    s.chars()
        .map(char_to_winansi)
        .filter(|&b| b != 0)
        .collect()
}

/// Approximate Helvetica widths at 1000 units/em for WinAnsi chars 32..=255.
static HELVETICA_WIDTHS: [f32; 224] = build_widths(false);

/// Same table for Helvetica-Bold; wider strokes, wider average advances.
static HELVETICA_BOLD_WIDTHS: [f32; 224] = build_widths(true);

const fn build_widths(bold: bool) -> [f32; 224] {
    let mut widths = [0.0f32; 224];
    let mut byte = 32u16;
    while byte <= 255 {
        let b = byte as u8;
        widths[(byte - 32) as usize] = if bold {
            match b {
                32 => 278.0,                          // space
                33..=47 => 333.0,                     // punctuation
                48..=57 => 556.0,                     // digits
                58..=64 => 333.0,                     // more punctuation
                73 | 74 => 278.0,                     // I J (narrow uppercase)
                77 => 889.0,                          // M (wide)
                65..=90 => 722.0,                     // uppercase A-Z (average)
                91..=96 => 333.0,                     // brackets etc.
                102 | 105 | 106 | 108 | 116 => 333.0, // narrow lowercase: f i j l t
                109 | 119 => 889.0,                   // m w (wide)
                97..=122 => 611.0,                    // lowercase a-z (average)
                _ => 611.0,
            }
        } else {
            match b {
                32 => 278.0,                          // space
                33..=47 => 333.0,                     // punctuation
                48..=57 => 556.0,                     // digits
                58..=64 => 333.0,                     // more punctuation
                73 | 74 => 278.0,                     // I J (narrow uppercase)
                77 => 833.0,                          // M (wide)
                65..=90 => 667.0,                     // uppercase A-Z (average)
                91..=96 => 333.0,                     // brackets etc.
                102 | 105 | 106 | 108 | 116 => 278.0, // narrow lowercase: f i j l t
                109 | 119 => 833.0,                   // m w (wide)
                97..=122 => 556.0,                    // lowercase a-z (average)
                _ => 556.0,
            }
        };
        byte += 1;
    }
    widths
}
