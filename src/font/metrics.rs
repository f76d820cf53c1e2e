//! Built-in advance widths for Helvetica and Helvetica-Bold.
//!
//! Widths come from the Adobe AFM files, in 1/1000 em, for the printable
//! ASCII range. Characters outside the table use the digit width so that
//! currency symbols such as `₹` measure like a figure.

/// Helvetica, U+0020..=U+007E.
const HELVETICA: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // '0'..'9'
    278, 278, 584, 584, 584, 556, 1015, // ':'..'@'
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, // 'A'..'M'
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // 'N'..'Z'
    278, 278, 278, 469, 556, 333, // '['..'`'
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, // 'a'..'m'
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, // 'n'..'z'
    334, 260, 334, 584, // '{'..'~'
];

/// Helvetica-Bold, U+0020..=U+007E.
const HELVETICA_BOLD: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // '0'..'9'
    333, 333, 584, 584, 584, 611, 975, // ':'..'@'
    722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, // 'A'..'M'
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // 'N'..'Z'
    333, 278, 333, 584, 556, 333, // '['..'`'
    556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, // 'a'..'m'
    611, 611, 611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, // 'n'..'z'
    389, 280, 389, 584, // '{'..'~'
];

const DEFAULT_WIDTH: u16 = 556;

/// Advance-width table for one of the built-in faces.
#[derive(Debug, Clone, Copy)]
pub struct StandardFontMetrics {
    widths: &'static [u16; 95],
    bullet: u16,
}

impl StandardFontMetrics {
    pub const HELVETICA: StandardFontMetrics = StandardFontMetrics {
        widths: &HELVETICA,
        bullet: 350,
    };

    pub const HELVETICA_BOLD: StandardFontMetrics = StandardFontMetrics {
        widths: &HELVETICA_BOLD,
        bullet: 350,
    };

    /// Advance of `ch` in 1/1000 em.
    pub fn advance(&self, ch: char) -> u16 {
        let code = ch as u32;
        match code {
            0x20..=0x7E => self.widths[(code - 0x20) as usize],
            0xA0 => self.widths[0],
            0x2022 => self.bullet,
            0x2013 => 556,
            0x2014 => 1000,
            0x2018 | 0x2019 => 222,
            0x201C | 0x201D => 333,
            _ => DEFAULT_WIDTH,
        }
    }

    pub fn char_width(&self, ch: char, font_size: f32) -> f32 {
        self.advance(ch) as f32 * font_size / 1000.0
    }

    pub fn measure_string(&self, text: &str, font_size: f32) -> f32 {
        text.chars().map(|ch| self.char_width(ch, font_size)).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_space_width() {
        let w = StandardFontMetrics::HELVETICA.char_width(' ', 12.0);
        assert!((w - 3.336).abs() < 0.001);
    }

    #[test]
    fn test_table_alignment() {
        let m = StandardFontMetrics::HELVETICA;
        assert_eq!(m.advance('0'), 556);
        assert_eq!(m.advance('@'), 1015);
        assert_eq!(m.advance('A'), 667);
        assert_eq!(m.advance('W'), 944);
        assert_eq!(m.advance('i'), 222);
        assert_eq!(m.advance('~'), 584);
        let b = StandardFontMetrics::HELVETICA_BOLD;
        assert_eq!(b.advance('A'), 722);
        assert_eq!(b.advance('m'), 889);
        assert_eq!(b.advance('~'), 584);
    }

    #[test]
    fn test_unknown_chars_measure_like_digits() {
        let m = StandardFontMetrics::HELVETICA;
        assert_eq!(m.advance('₹'), m.advance('5'));
    }
}
