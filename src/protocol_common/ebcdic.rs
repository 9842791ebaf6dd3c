//! EBCDIC code page 037 codec
//!
//! Host bytes are EBCDIC (CP037, US/Canada). The screen buffer keeps both the
//! raw host byte and the display character derived from it; this module is
//! the single place that converts between the two.

/// CP037 to Unicode translation table
///
/// Maps all 256 EBCDIC code points. Every entry is below U+0100, which lets
/// the reverse table be a plain 256-entry array.
const CP037_TO_UNICODE: [char; 256] = [
    // 0x00-0x0F: Control characters
    '\x00', '\x01', '\x02', '\x03', '\u{009C}', '\t', '\u{0086}', '\x7F',
    '\u{0097}', '\u{008D}', '\u{008E}', '\x0B', '\x0C', '\r', '\x0E', '\x0F',
    // 0x10-0x1F: Control characters
    '\x10', '\x11', '\x12', '\x13', '\u{009D}', '\u{0085}', '\x08', '\u{0087}',
    '\x18', '\x19', '\u{0092}', '\u{008F}', '\x1C', '\x1D', '\x1E', '\x1F',
    // 0x20-0x2F: Control characters and special
    '\u{0080}', '\u{0081}', '\u{0082}', '\u{0083}', '\u{0084}', '\n', '\x17', '\x1B',
    '\u{0088}', '\u{0089}', '\u{008A}', '\u{008B}', '\u{008C}', '\x05', '\x06', '\x07',
    // 0x30-0x3F: Control characters
    '\u{0090}', '\u{0091}', '\x16', '\u{0093}', '\u{0094}', '\u{0095}', '\u{0096}', '\x04',
    '\u{0098}', '\u{0099}', '\u{009A}', '\u{009B}', '\x14', '\x15', '\u{009E}', '\x1A',
    // 0x40-0x4F: Space and special characters
    ' ', '\u{00A0}', '\u{00E2}', '\u{00E4}', '\u{00E0}', '\u{00E1}', '\u{00E3}', '\u{00E5}',
    '\u{00E7}', '\u{00F1}', '\u{00A2}', '.', '<', '(', '+', '|',
    // 0x50-0x5F: Ampersand and special characters
    '&', '\u{00E9}', '\u{00EA}', '\u{00EB}', '\u{00E8}', '\u{00ED}', '\u{00EE}', '\u{00EF}',
    '\u{00EC}', '\u{00DF}', '!', '$', '*', ')', ';', '\u{00AC}',
    // 0x60-0x6F: Dash and special characters
    '-', '/', '\u{00C2}', '\u{00C4}', '\u{00C0}', '\u{00C1}', '\u{00C3}', '\u{00C5}',
    '\u{00C7}', '\u{00D1}', '\u{00A6}', ',', '%', '_', '>', '?',
    // 0x70-0x7F: Special characters and quotes
    '\u{00F8}', '\u{00C9}', '\u{00CA}', '\u{00CB}', '\u{00C8}', '\u{00CD}', '\u{00CE}', '\u{00CF}',
    '\u{00CC}', '`', ':', '#', '@', '\'', '=', '"',
    // 0x80-0x8F: Special character and lowercase a-i
    '\u{00D8}', 'a', 'b', 'c', 'd', 'e', 'f', 'g',
    'h', 'i', '\u{00AB}', '\u{00BB}', '\u{00F0}', '\u{00FD}', '\u{00FE}', '\u{00B1}',
    // 0x90-0x9F: Degree symbol and lowercase j-r
    '\u{00B0}', 'j', 'k', 'l', 'm', 'n', 'o', 'p',
    'q', 'r', '\u{00AA}', '\u{00BA}', '\u{00E6}', '\u{00B8}', '\u{00C6}', '\u{00A4}',
    // 0xA0-0xAF: Micro sign and lowercase s-z
    '\u{00B5}', '~', 's', 't', 'u', 'v', 'w', 'x',
    'y', 'z', '\u{00A1}', '\u{00BF}', '\u{00D0}', '\u{00DD}', '\u{00DE}', '\u{00AE}',
    // 0xB0-0xBF: Caret and special characters
    '^', '\u{00A3}', '\u{00A5}', '\u{00B7}', '\u{00A9}', '\u{00A7}', '\u{00B6}', '\u{00BC}',
    '\u{00BD}', '\u{00BE}', '[', ']', '\u{00AF}', '\u{00A8}', '\u{00B4}', '\u{00D7}',
    // 0xC0-0xCF: Left brace and uppercase A-I
    '{', 'A', 'B', 'C', 'D', 'E', 'F', 'G',
    'H', 'I', '\u{00AD}', '\u{00F4}', '\u{00F6}', '\u{00F2}', '\u{00F3}', '\u{00F5}',
    // 0xD0-0xDF: Right brace and uppercase J-R
    '}', 'J', 'K', 'L', 'M', 'N', 'O', 'P',
    'Q', 'R', '\u{00B9}', '\u{00FB}', '\u{00FC}', '\u{00F9}', '\u{00FA}', '\u{00FF}',
    // 0xE0-0xEF: Backslash and uppercase S-Z
    '\\', '\u{00F7}', 'S', 'T', 'U', 'V', 'W', 'X',
    'Y', 'Z', '\u{00B2}', '\u{00D4}', '\u{00D6}', '\u{00D2}', '\u{00D3}', '\u{00D5}',
    // 0xF0-0xFF: Digits 0-9 and special characters
    '0', '1', '2', '3', '4', '5', '6', '7',
    '8', '9', '\u{00B3}', '\u{00DB}', '\u{00DC}', '\u{00D9}', '\u{00DA}', '\u{009F}',
];

/// Default host byte for characters outside the code page (EBCDIC blank)
pub const HOST_DEFAULT: u8 = 0x40;

/// Display character used for control code points
pub const DISPLAY_DEFAULT: char = ' ';

const fn build_reverse_table() -> [u8; 256] {
    let mut table = [HOST_DEFAULT; 256];
    let mut byte = 0;
    while byte < 256 {
        let code = CP037_TO_UNICODE[byte] as u32;
        if code < 256 {
            table[code as usize] = byte as u8;
        }
        byte += 1;
    }
    table
}

const UNICODE_TO_CP037: [u8; 256] = build_reverse_table();

/// Translate a host byte to the raw code page character, control codes included
pub fn ebcdic_to_char(byte: u8) -> char {
    CP037_TO_UNICODE[byte as usize]
}

/// Translate a host byte to the character shown on screen
///
/// Control code points (including the host null 0x00) show as a blank.
///
/// ```
/// use tn3270r::protocol_common::ebcdic::to_display;
///
/// assert_eq!(to_display(0xC1), 'A');
/// assert_eq!(to_display(0x00), ' ');
/// ```
pub fn to_display(byte: u8) -> char {
    let ch = ebcdic_to_char(byte);
    if ch.is_control() {
        DISPLAY_DEFAULT
    } else {
        ch
    }
}

/// Translate a character to its host byte
///
/// Characters with no CP037 code point map to the EBCDIC blank.
///
/// ```
/// use tn3270r::protocol_common::ebcdic::to_host;
///
/// assert_eq!(to_host('A'), 0xC1);
/// assert_eq!(to_host('\u{20AC}'), 0x40);
/// ```
pub fn to_host(ch: char) -> u8 {
    let code = ch as u32;
    if code < 256 {
        UNICODE_TO_CP037[code as usize]
    } else {
        HOST_DEFAULT
    }
}

/// Convert a run of host bytes to display text
pub fn to_display_string(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| to_display(b)).collect()
}

/// Convert text to host bytes
pub fn to_host_vec(s: &str) -> Vec<u8> {
    s.chars().map(to_host).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_display_letters() {
        assert_eq!(to_display(0xC1), 'A');
        assert_eq!(to_display(0xC8), 'H');
        assert_eq!(to_display(0xE9), 'Z');
        assert_eq!(to_display(0x81), 'a');
        assert_eq!(to_display(0xA9), 'z');
    }

    #[test]
    fn test_to_display_digits() {
        assert_eq!(to_display(0xF0), '0');
        assert_eq!(to_display(0xF9), '9');
    }

    #[test]
    fn test_control_points_show_blank() {
        assert_eq!(to_display(0x00), ' ');
        assert_eq!(to_display(0x25), ' ');
        assert_eq!(ebcdic_to_char(0x25), '\n');
    }

    #[test]
    fn test_to_host() {
        assert_eq!(to_host('A'), 0xC1);
        assert_eq!(to_host(' '), 0x40);
        assert_eq!(to_host('0'), 0xF0);
        assert_eq!(to_host('\0'), 0x00);
        assert_eq!(to_host('\u{4E2D}'), HOST_DEFAULT);
    }

    #[test]
    fn test_reverse_table_is_inverse() {
        for byte in 0..=255u8 {
            assert_eq!(to_host(ebcdic_to_char(byte)), byte, "byte {:#04x}", byte);
        }
    }

    #[test]
    fn test_string_conversion() {
        let text = "HELLO WORLD";
        let host = to_host_vec(text);
        assert_eq!(&host[..5], &[0xC8, 0xC5, 0xD3, 0xD3, 0xD6]);
        assert_eq!(to_display_string(&host), text);
    }
}
