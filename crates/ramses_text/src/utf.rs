//! UTF-8 / UTF-16 decoding and conversion to code points
//!
//! Decoding never fails hard. Every call reports whether the sequence was
//! valid, the (possibly invalid) decoded value and how many code units were
//! consumed, so callers can skip, substitute or abort.

/// Outcome of decoding one code point
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeResult {
    pub success: bool,
    pub code_point: u32,
    pub consumed: usize,
}

impl DecodeResult {
    fn ok(code_point: u32, consumed: usize) -> Self {
        Self {
            success: true,
            code_point,
            consumed,
        }
    }

    fn fail(code_point: u32, consumed: usize) -> Self {
        Self {
            success: false,
            code_point,
            consumed,
        }
    }

    /// The decoded value as a `char`, only for successful decodes
    pub fn as_char(&self) -> Option<char> {
        if self.success {
            char::from_u32(self.code_point)
        } else {
            None
        }
    }
}

/// Marks bytes that cannot start a sequence
const INVALID_LEAD: u8 = 0xFF;

/// Number of continuation bytes following each possible lead byte
const TRAILING_BYTES: [u8; 256] = build_trailing_bytes();

const fn build_trailing_bytes() -> [u8; 256] {
    let mut table = [INVALID_LEAD; 256];
    let mut i = 0;
    while i < 256 {
        table[i] = match i {
            0x00..=0x7F => 0,
            0x80..=0xBF => INVALID_LEAD,
            0xC0..=0xDF => 1,
            0xE0..=0xEF => 2,
            0xF0..=0xF7 => 3,
            0xF8..=0xFB => 4,
            0xFC..=0xFD => 5,
            _ => INVALID_LEAD,
        };
        i += 1;
    }
    table
}

/// Payload bits kept from the lead byte, indexed by trailing byte count
const LEAD_MASK: [u8; 6] = [0x7F, 0x1F, 0x0F, 0x07, 0x03, 0x01];

/// Smallest code point that needs the given number of trailing bytes
const MIN_CODE_POINT: [u32; 6] = [0, 0x80, 0x800, 0x1_0000, 0x20_0000, 0x400_0000];

const SURROGATES: std::ops::RangeInclusive<u32> = 0xD800..=0xDFFF;
const HIGH_SURROGATES: std::ops::RangeInclusive<u32> = 0xD800..=0xDBFF;
const LOW_SURROGATES: std::ops::RangeInclusive<u32> = 0xDC00..=0xDFFF;
const MAX_CODE_POINT: u32 = 0x10_FFFF;

/// Decode the code point at the start of `input`
pub fn extract_unicode_point_from_utf8(input: &[u8]) -> DecodeResult {
    let Some(&lead) = input.first() else {
        return DecodeResult::fail(0, 0);
    };

    let trailing = TRAILING_BYTES[lead as usize];
    if trailing == INVALID_LEAD {
        return DecodeResult::fail(0, 1);
    }
    let trailing = trailing as usize;

    let mut code_point = (lead & LEAD_MASK[trailing]) as u32;
    for i in 1..=trailing {
        match input.get(i) {
            Some(&byte) if byte & 0xC0 == 0x80 => {
                code_point = (code_point << 6) | (byte & 0x3F) as u32;
            }
            // Leave a byte that may start the next sequence unconsumed.
            _ => return DecodeResult::fail(code_point, i),
        }
    }

    let consumed = trailing + 1;
    if code_point < MIN_CODE_POINT[trailing]
        || SURROGATES.contains(&code_point)
        || code_point > MAX_CODE_POINT
    {
        return DecodeResult::fail(code_point, consumed);
    }
    DecodeResult::ok(code_point, consumed)
}

/// Decode the code point at the start of `input`
pub fn extract_unicode_point_from_utf16(input: &[u16]) -> DecodeResult {
    let Some(&first) = input.first() else {
        return DecodeResult::fail(0, 0);
    };
    let first = first as u32;

    if LOW_SURROGATES.contains(&first) {
        return DecodeResult::fail(first, 1);
    }
    if !HIGH_SURROGATES.contains(&first) {
        return DecodeResult::ok(first, 1);
    }

    match input.get(1).map(|&unit| unit as u32) {
        Some(second) if LOW_SURROGATES.contains(&second) => {
            let code_point = 0x1_0000 + ((first - 0xD800) << 10) + (second - 0xDC00);
            DecodeResult::ok(code_point, 2)
        }
        // A non-surrogate or another high surrogate starts the next character.
        _ => DecodeResult::fail(first, 1),
    }
}

/// Decode a whole UTF-8 buffer, skipping invalid sequences
pub fn convert_utf8_to_utf32(input: &[u8]) -> Vec<char> {
    let mut out = Vec::with_capacity(input.len());
    let mut pos = 0;
    while pos < input.len() {
        let result = extract_unicode_point_from_utf8(&input[pos..]);
        if let Some(c) = result.as_char() {
            out.push(c);
        }
        pos += result.consumed.max(1);
    }
    out
}

/// Decode a whole UTF-16 buffer, skipping invalid sequences
pub fn convert_utf16_to_utf32(input: &[u16]) -> Vec<char> {
    let mut out = Vec::with_capacity(input.len());
    let mut pos = 0;
    while pos < input.len() {
        let result = extract_unicode_point_from_utf16(&input[pos..]);
        if let Some(c) = result.as_char() {
            out.push(c);
        }
        pos += result.consumed.max(1);
    }
    out
}

/// Encode one code point, empty for values outside the scalar range
pub fn convert_utf32_to_utf8(code_point: u32) -> String {
    char::from_u32(code_point)
        .map(String::from)
        .unwrap_or_default()
}

/// Encode a code point string, NUL included
pub fn convert_str_utf32_to_utf8(input: &[char]) -> String {
    input.iter().collect()
}
