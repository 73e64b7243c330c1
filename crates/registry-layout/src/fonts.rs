//! Font resource loading and text decoding.
//!
//! Registry certificates embed Korean text through Type0 (composite) fonts
//! whose 2-byte codes are CIDs, not Unicode. The ToUnicode CMap shipped with
//! the font maps codes back to text; without it a composite font yields
//! replacement characters. Simple fonts decode byte-wise as Latin-1.

use std::collections::HashMap;

use crate::error::LayoutError;

/// Decoded per-resource font: enough to turn show-text operands into
/// characters with approximate advances.
#[derive(Debug, Clone)]
pub struct FontInfo {
    pub base_name: String,
    /// Type0 composite font with 2-byte codes.
    pub two_byte: bool,
    to_unicode: Option<HashMap<u32, String>>,
    /// Glyph widths in 1/1000 text-space units, keyed by code.
    widths: HashMap<u32, f64>,
    default_width: f64,
}

fn deref<'a>(doc: &'a lopdf::Document, obj: &'a lopdf::Object) -> &'a lopdf::Object {
    match obj {
        lopdf::Object::Reference(id) => doc.get_object(*id).unwrap_or(obj),
        other => other,
    }
}

fn obj_to_f64(obj: &lopdf::Object) -> Option<f64> {
    match obj {
        lopdf::Object::Integer(i) => Some(*i as f64),
        lopdf::Object::Real(f) => Some(*f as f64),
        _ => None,
    }
}

impl FontInfo {
    /// Build a `FontInfo` from a /Font resource entry.
    pub fn load(doc: &lopdf::Document, font_obj: &lopdf::Object) -> Result<Self, LayoutError> {
        let dict = deref(doc, font_obj)
            .as_dict()
            .map_err(|e| LayoutError::Parse(format!("font resource is not a dictionary: {e}")))?;

        let base_name = dict
            .get(b"BaseFont")
            .ok()
            .and_then(|o| deref(doc, o).as_name().ok())
            .map(|n| String::from_utf8_lossy(n).into_owned())
            .unwrap_or_default();

        let subtype = dict
            .get(b"Subtype")
            .ok()
            .and_then(|o| deref(doc, o).as_name().ok())
            .map(|n| String::from_utf8_lossy(n).into_owned())
            .unwrap_or_default();
        let two_byte = subtype == "Type0";

        let to_unicode = dict
            .get(b"ToUnicode")
            .ok()
            .and_then(|o| deref(doc, o).as_stream().ok())
            .and_then(|s| {
                let bytes = if s.dict.get(b"Filter").is_ok() {
                    s.decompressed_content().ok()?
                } else {
                    s.content.clone()
                };
                Some(parse_tounicode_cmap(&String::from_utf8_lossy(&bytes)))
            })
            .filter(|m| !m.is_empty());

        let (widths, default_width) = if two_byte {
            load_cid_widths(doc, dict)
        } else {
            load_simple_widths(doc, dict)
        };

        Ok(Self {
            base_name,
            two_byte,
            to_unicode,
            widths,
            default_width,
        })
    }

    /// Decode show-text bytes into (text, width-units) pairs, one per glyph.
    pub fn decode(&self, bytes: &[u8]) -> Vec<(String, f64)> {
        let codes: Vec<u32> = if self.two_byte {
            bytes
                .chunks(2)
                .filter(|c| c.len() == 2)
                .map(|c| u32::from(u16::from_be_bytes([c[0], c[1]])))
                .collect()
        } else {
            bytes.iter().map(|&b| u32::from(b)).collect()
        };

        codes
            .into_iter()
            .map(|code| {
                let text = match &self.to_unicode {
                    Some(map) => map.get(&code).cloned().unwrap_or_else(|| {
                        if self.two_byte {
                            "\u{FFFD}".to_string()
                        } else {
                            char::from(code as u8).to_string()
                        }
                    }),
                    None if !self.two_byte => char::from(code as u8).to_string(),
                    None => "\u{FFFD}".to_string(),
                };
                let width = self.widths.get(&code).copied().unwrap_or(self.default_width);
                (text, width)
            })
            .collect()
    }
}

/// Simple-font widths from /Widths + /FirstChar.
fn load_simple_widths(
    doc: &lopdf::Document,
    dict: &lopdf::Dictionary,
) -> (HashMap<u32, f64>, f64) {
    let mut widths = HashMap::new();
    let first_char = dict
        .get(b"FirstChar")
        .ok()
        .and_then(|o| deref(doc, o).as_i64().ok())
        .unwrap_or(0) as u32;
    if let Ok(arr) = dict.get(b"Widths").map(|o| deref(doc, o)) {
        if let Ok(arr) = arr.as_array() {
            for (i, w) in arr.iter().enumerate() {
                if let Some(w) = obj_to_f64(deref(doc, w)) {
                    widths.insert(first_char + i as u32, w);
                }
            }
        }
    }
    (widths, 500.0)
}

/// CID-font widths from the descendant font's /W array, default /DW.
///
/// /W alternates between `c [w1 w2 ...]` runs and `c1 c2 w` ranges.
fn load_cid_widths(doc: &lopdf::Document, dict: &lopdf::Dictionary) -> (HashMap<u32, f64>, f64) {
    let mut widths = HashMap::new();
    let mut default_width = 1000.0;

    let descendant = dict
        .get(b"DescendantFonts")
        .ok()
        .map(|o| deref(doc, o))
        .and_then(|o| o.as_array().ok())
        .and_then(|arr| arr.first())
        .map(|o| deref(doc, o))
        .and_then(|o| o.as_dict().ok());

    let Some(desc) = descendant else {
        return (widths, default_width);
    };

    if let Some(dw) = desc.get(b"DW").ok().and_then(|o| obj_to_f64(deref(doc, o))) {
        default_width = dw;
    }

    if let Some(w_arr) = desc
        .get(b"W")
        .ok()
        .map(|o| deref(doc, o))
        .and_then(|o| o.as_array().ok())
    {
        let mut i = 0;
        while i < w_arr.len() {
            let Some(first) = obj_to_f64(deref(doc, &w_arr[i])) else {
                break;
            };
            match w_arr.get(i + 1).map(|o| deref(doc, o)) {
                Some(lopdf::Object::Array(ws)) => {
                    for (j, w) in ws.iter().enumerate() {
                        if let Some(w) = obj_to_f64(deref(doc, w)) {
                            widths.insert(first as u32 + j as u32, w);
                        }
                    }
                    i += 2;
                }
                Some(obj) => {
                    let (Some(last), Some(w)) = (
                        obj_to_f64(obj),
                        w_arr.get(i + 2).and_then(|o| obj_to_f64(deref(doc, o))),
                    ) else {
                        break;
                    };
                    for code in first as u32..=last as u32 {
                        widths.insert(code, w);
                    }
                    i += 3;
                }
                None => break,
            }
        }
    }

    (widths, default_width)
}

// ==== ToUnicode CMap ====

fn hex_token_to_code(hex: &str) -> Option<u32> {
    u32::from_str_radix(hex, 16).ok()
}

/// A destination hex token is UTF-16BE, possibly several code units.
fn hex_token_to_string(hex: &str) -> Option<String> {
    let bytes: Vec<u8> = (0..hex.len())
        .step_by(2)
        .filter_map(|i| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok())
        .collect();
    let units: Vec<u16> = bytes
        .chunks(2)
        .filter(|c| c.len() == 2)
        .map(|c| u16::from_be_bytes([c[0], c[1]]))
        .collect();
    String::from_utf16(&units).ok()
}

#[derive(Debug, PartialEq)]
enum CmapToken {
    Hex(String),
    BracketOpen,
    BracketClose,
    Word(String),
}

fn tokenize_cmap(text: &str) -> Vec<CmapToken> {
    let mut tokens = Vec::new();
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '<' => {
                let mut hex = String::new();
                for h in chars.by_ref() {
                    if h == '>' {
                        break;
                    }
                    if h.is_ascii_hexdigit() {
                        hex.push(h);
                    }
                }
                tokens.push(CmapToken::Hex(hex));
            }
            '[' => tokens.push(CmapToken::BracketOpen),
            ']' => tokens.push(CmapToken::BracketClose),
            c if c.is_whitespace() => {}
            c => {
                let mut word = String::from(c);
                while let Some(&n) = chars.peek() {
                    if n.is_whitespace() || n == '<' || n == '[' || n == ']' {
                        break;
                    }
                    word.push(n);
                    chars.next();
                }
                tokens.push(CmapToken::Word(word));
            }
        }
    }
    tokens
}

/// Parse bfchar and bfrange sections of a ToUnicode CMap stream.
pub fn parse_tounicode_cmap(text: &str) -> HashMap<u32, String> {
    let tokens = tokenize_cmap(text);
    let mut map = HashMap::new();
    let mut i = 0;

    while i < tokens.len() {
        match &tokens[i] {
            CmapToken::Word(w) if w == "beginbfchar" => {
                i += 1;
                while i + 1 < tokens.len() {
                    if let (CmapToken::Hex(src), CmapToken::Hex(dst)) = (&tokens[i], &tokens[i + 1])
                    {
                        if let (Some(code), Some(s)) =
                            (hex_token_to_code(src), hex_token_to_string(dst))
                        {
                            map.insert(code, s);
                        }
                        i += 2;
                    } else {
                        break;
                    }
                }
            }
            CmapToken::Word(w) if w == "beginbfrange" => {
                i += 1;
                loop {
                    let (Some(CmapToken::Hex(lo)), Some(CmapToken::Hex(hi))) =
                        (tokens.get(i), tokens.get(i + 1))
                    else {
                        break;
                    };
                    let (Some(lo), Some(hi)) = (hex_token_to_code(lo), hex_token_to_code(hi))
                    else {
                        break;
                    };
                    match tokens.get(i + 2) {
                        Some(CmapToken::Hex(dst)) => {
                            // Consecutive codes map to consecutive scalars
                            if let Some(base) = hex_token_to_code(dst) {
                                for (offset, code) in (lo..=hi).enumerate() {
                                    if let Some(ch) = char::from_u32(base + offset as u32) {
                                        map.insert(code, ch.to_string());
                                    }
                                }
                            }
                            i += 3;
                        }
                        Some(CmapToken::BracketOpen) => {
                            i += 3;
                            let mut code = lo;
                            while let Some(CmapToken::Hex(dst)) = tokens.get(i) {
                                if code > hi {
                                    break;
                                }
                                if let Some(s) = hex_token_to_string(dst) {
                                    map.insert(code, s);
                                }
                                code += 1;
                                i += 1;
                            }
                            if let Some(CmapToken::BracketClose) = tokens.get(i) {
                                i += 1;
                            }
                        }
                        _ => break,
                    }
                }
            }
            _ => i += 1,
        }
    }

    map
}
