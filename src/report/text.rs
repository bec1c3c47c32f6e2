//! Text preparation for the PDF writer: markdown cleanup, WinAnsi encoding
//! and Helvetica metrics for line wrapping.

use regex::Regex;
use std::sync::LazyLock;

static HEADING_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s{0,3}#{1,6}\s+").expect("heading pattern"));
static BULLET_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\s*)[*+-]\s+").expect("bullet pattern"));
static EXTRA_BLANK_LINES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("blank line pattern"));

/// Strip the lightweight markdown generative models like to emit.
pub fn clean_generated_text(text: &str) -> String {
    let normalized = text.replace("\r\n", "\n").replace('\r', "\n");

    let lines: Vec<String> = normalized
        .lines()
        .map(|line| {
            let line = HEADING_MARKER.replace(line, "");
            let line = BULLET_MARKER.replace(&line, "$1• ");
            line.replace("**", "").replace("__", "").trim_end().to_string()
        })
        .collect();

    EXTRA_BLANK_LINES
        .replace_all(lines.join("\n").trim(), "\n\n")
        .to_string()
}

/// Encode for the base-14 fonts (WinAnsiEncoding). Unmappable characters become `?`.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars().filter_map(win_ansi_byte).collect()
}

fn win_ansi_byte(c: char) -> Option<u8> {
    let byte = match c {
        '\t' => b' ',
        ' '..='~' => c as u8,
        '\u{a0}'..='\u{ff}' => c as u32 as u8,
        '€' => 0x80,
        '‚' => 0x82,
        'ƒ' => 0x83,
        '„' => 0x84,
        '…' => 0x85,
        '†' => 0x86,
        '‡' => 0x87,
        'ˆ' => 0x88,
        '‰' => 0x89,
        'Š' => 0x8a,
        '‹' => 0x8b,
        'Œ' => 0x8c,
        'Ž' => 0x8e,
        '‘' => 0x91,
        '’' => 0x92,
        '“' => 0x93,
        '”' => 0x94,
        '•' => 0x95,
        '–' => 0x96,
        '—' => 0x97,
        '˜' => 0x98,
        '™' => 0x99,
        'š' => 0x9a,
        '›' => 0x9b,
        'œ' => 0x9c,
        'ž' => 0x9e,
        'Ÿ' => 0x9f,
        c if c.is_control() => return None,
        _ => b'?',
    };
    Some(byte)
}

// Helvetica AFM widths for ' '..='~', in 1/1000 em.
const HELVETICA_WIDTHS: [u16; 95] = [
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

// Bold glyphs run wider; a flat allowance keeps wrapped lines inside the frame.
const BOLD_ALLOWANCE: f32 = 1.08;

fn glyph_width(c: char) -> u16 {
    match c {
        ' '..='~' => HELVETICA_WIDTHS[c as usize - 32],
        '•' => 350,
        '—' | '…' => 1000,
        _ => 556,
    }
}

/// Width of `text` in points at `size`.
pub fn text_width(text: &str, size: f32, bold: bool) -> f32 {
    let units: u32 = text.chars().map(|c| glyph_width(c) as u32).sum();
    let width = units as f32 * size / 1000.0;
    if bold {
        width * BOLD_ALLOWANCE
    } else {
        width
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_generated_text_strips_markdown() {
        let raw = "## Overview\r\n**Term:** 12 months\n* Rent due monthly\n  - Late fee applies\n\n\n\nEnd";
        assert_eq!(
            clean_generated_text(raw),
            "Overview\nTerm: 12 months\n• Rent due monthly\n  • Late fee applies\n\nEnd"
        );
    }

    #[test]
    fn test_clean_keeps_hyphenated_words() {
        assert_eq!(clean_generated_text("non-compete clause"), "non-compete clause");
    }

    #[test]
    fn test_encode_win_ansi() {
        assert_eq!(encode_win_ansi("Caf\u{e9} “x”"), vec![b'C', b'a', b'f', 0xe9, b' ', 0x93, b'x', 0x94]);
        assert_eq!(encode_win_ansi("a\u{7}b"), b"ab".to_vec());
        assert_eq!(encode_win_ansi("条"), b"?".to_vec());
    }

    #[test]
    fn test_text_width_uses_helvetica_metrics() {
        assert_eq!(text_width("", 10.0, false), 0.0);
        assert!((text_width("il", 10.0, false) - 4.44).abs() < 0.001);
        assert!(text_width("W", 10.0, true) > text_width("W", 10.0, false));
    }
}
