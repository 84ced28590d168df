// SPDX-License-Identifier: GPL-3.0-only

//! Scan-line decoder for EAN-13, UPC-A, EAN-8, Code 128 and Code 39
//!
//! Each candidate row is binarized around its mid-range, turned into run
//! lengths, and matched against the symbol tables. Rows are tried in both
//! directions so upside-down codes decode too. EAN/UPC and Code 128 results
//! are checksum validated; Code 39 needs its start and stop characters.

use crate::constants::CodeFormat;
use tracing::{debug, trace};

/// Widths of the L-code digits (space, bar, space, bar).
/// R-codes use the same widths starting with a bar; G-codes are reversed.
const L_WIDTHS: [[u8; 4]; 10] = [
    [3, 2, 1, 1],
    [2, 2, 2, 1],
    [2, 1, 2, 2],
    [1, 4, 1, 1],
    [1, 1, 3, 2],
    [1, 2, 3, 1],
    [1, 1, 1, 4],
    [1, 3, 1, 2],
    [1, 2, 1, 3],
    [3, 1, 1, 2],
];

/// Parity of the six left-hand digits (true = G-code), indexed by the
/// implied first digit
const FIRST_DIGIT_PARITY: [[bool; 6]; 10] = [
    [false, false, false, false, false, false],
    [false, false, true, false, true, true],
    [false, false, true, true, false, true],
    [false, false, true, true, true, false],
    [false, true, false, false, true, true],
    [false, true, true, false, false, true],
    [false, true, true, true, false, false],
    [false, true, false, true, false, true],
    [false, true, false, true, true, false],
    [false, true, true, false, true, false],
];

/// Rows to scan, as fractions of the image height, center first
const SCAN_ROWS: [f32; 11] = [
    0.5, 0.45, 0.55, 0.4, 0.6, 0.35, 0.65, 0.3, 0.7, 0.25, 0.75,
];

/// Maximum normalized width error accepted for a digit
const MAX_DIGIT_ERROR: f32 = 1.5;

/// Minimum luma spread for a row to be considered
const MIN_CONTRAST: u8 = 40;

const EAN13_RUNS: usize = 3 + 24 + 5 + 24 + 3;
const EAN8_RUNS: usize = 3 + 16 + 5 + 16 + 3;

/// Code 128 symbol widths (bar, space, bar, space, bar, space), 11 modules
/// each. The stop symbol (106) is followed by a two-module termination bar.
const CODE128_PATTERNS: [[u8; 6]; 107] = [
    [2, 1, 2, 2, 2, 2], [2, 2, 2, 1, 2, 2], [2, 2, 2, 2, 2, 1], [1, 2, 1, 2, 2, 3],
    [1, 2, 1, 3, 2, 2], [1, 3, 1, 2, 2, 2], [1, 2, 2, 2, 1, 3], [1, 2, 2, 3, 1, 2],
    [1, 3, 2, 2, 1, 2], [2, 2, 1, 2, 1, 3], [2, 2, 1, 3, 1, 2], [2, 3, 1, 2, 1, 2],
    [1, 1, 2, 2, 3, 2], [1, 2, 2, 1, 3, 2], [1, 2, 2, 2, 3, 1], [1, 1, 3, 2, 2, 2],
    [1, 2, 3, 1, 2, 2], [1, 2, 3, 2, 2, 1], [2, 2, 3, 2, 1, 1], [2, 2, 1, 1, 3, 2],
    [2, 2, 1, 2, 3, 1], [2, 1, 3, 2, 1, 2], [2, 2, 3, 1, 1, 2], [3, 1, 2, 1, 3, 1],
    [3, 1, 1, 2, 2, 2], [3, 2, 1, 1, 2, 2], [3, 2, 1, 2, 2, 1], [3, 1, 2, 2, 1, 2],
    [3, 2, 2, 1, 1, 2], [3, 2, 2, 2, 1, 1], [2, 1, 2, 1, 2, 3], [2, 1, 2, 3, 2, 1],
    [2, 3, 2, 1, 2, 1], [1, 1, 1, 3, 2, 3], [1, 3, 1, 1, 2, 3], [1, 3, 1, 3, 2, 1],
    [1, 1, 2, 3, 1, 3], [1, 3, 2, 1, 1, 3], [1, 3, 2, 3, 1, 1], [2, 1, 1, 3, 1, 3],
    [2, 3, 1, 1, 1, 3], [2, 3, 1, 3, 1, 1], [1, 1, 2, 1, 3, 3], [1, 1, 2, 3, 3, 1],
    [1, 3, 2, 1, 3, 1], [1, 1, 3, 1, 2, 3], [1, 1, 3, 3, 2, 1], [1, 3, 3, 1, 2, 1],
    [3, 1, 3, 1, 2, 1], [2, 1, 1, 3, 3, 1], [2, 3, 1, 1, 3, 1], [2, 1, 3, 1, 1, 3],
    [2, 1, 3, 3, 1, 1], [2, 1, 3, 1, 3, 1], [3, 1, 1, 1, 2, 3], [3, 1, 1, 3, 2, 1],
    [3, 3, 1, 1, 2, 1], [3, 1, 2, 1, 1, 3], [3, 1, 2, 3, 1, 1], [3, 3, 2, 1, 1, 1],
    [3, 1, 4, 1, 1, 1], [2, 2, 1, 4, 1, 1], [4, 3, 1, 1, 1, 1], [1, 1, 1, 2, 2, 4],
    [1, 1, 1, 4, 2, 2], [1, 2, 1, 1, 2, 4], [1, 2, 1, 4, 2, 1], [1, 4, 1, 1, 2, 2],
    [1, 4, 1, 2, 2, 1], [1, 1, 2, 2, 1, 4], [1, 1, 2, 4, 1, 2], [1, 2, 2, 1, 1, 4],
    [1, 2, 2, 4, 1, 1], [1, 4, 2, 1, 1, 2], [1, 4, 2, 2, 1, 1], [2, 4, 1, 2, 1, 1],
    [2, 2, 1, 1, 1, 4], [4, 1, 3, 1, 1, 1], [2, 4, 1, 1, 1, 2], [1, 3, 4, 1, 1, 1],
    [1, 1, 1, 2, 4, 2], [1, 2, 1, 1, 4, 2], [1, 2, 1, 2, 4, 1], [1, 1, 4, 2, 1, 2],
    [1, 2, 4, 1, 1, 2], [1, 2, 4, 2, 1, 1], [4, 1, 1, 2, 1, 2], [4, 2, 1, 1, 1, 2],
    [4, 2, 1, 2, 1, 1], [2, 1, 2, 1, 4, 1], [2, 1, 4, 1, 2, 1], [4, 1, 2, 1, 2, 1],
    [1, 1, 1, 1, 4, 3], [1, 1, 1, 3, 4, 1], [1, 3, 1, 1, 4, 1], [1, 1, 4, 1, 1, 3],
    [1, 1, 4, 3, 1, 1], [4, 1, 1, 1, 1, 3], [4, 1, 1, 3, 1, 1], [1, 1, 3, 1, 4, 1],
    [1, 1, 4, 1, 3, 1], [3, 1, 1, 1, 4, 1], [4, 1, 1, 1, 3, 1], [2, 1, 1, 4, 1, 2],
    [2, 1, 1, 2, 1, 4], [2, 1, 1, 2, 3, 2], [2, 3, 3, 1, 1, 1],
];

const CODE128_START_A: u8 = 103;
const CODE128_START_B: u8 = 104;
const CODE128_START_C: u8 = 105;
const CODE128_STOP: u8 = 106;

/// Code 39 characters and their patterns, one bit per element
/// (bar first, 1 = wide). The last entry is the `*` start/stop character.
const CODE39_ALPHABET: &[u8; 44] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ-. $/+%*";
const CODE39_PATTERNS: [u16; 44] = [
    0x034, 0x121, 0x061, 0x160, 0x031, 0x130, 0x070, 0x025, 0x124, 0x064,
    0x109, 0x049, 0x148, 0x019, 0x118, 0x058, 0x00D, 0x10C, 0x04C, 0x01C,
    0x103, 0x043, 0x142, 0x013, 0x112, 0x052, 0x007, 0x106, 0x046, 0x016,
    0x181, 0x0C1, 0x1C0, 0x091, 0x190, 0x0D0, 0x085, 0x184, 0x0C4, 0x0A8,
    0x0A2, 0x08A, 0x02A, 0x094,
];

/// Minimum wide/narrow ratio for Code 39 elements
const CODE39_MIN_RATIO: f32 = 1.5;

/// A decoded linear barcode
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinearMatch {
    pub format: CodeFormat,
    pub text: String,
}

/// Run of equal color: (is_bar, length in pixels)
type Run = (bool, u32);

/// Reader for the linear formats
#[derive(Debug, Clone, Default)]
pub struct LinearReader {
    ean13: bool,
    upc_a: bool,
    ean8: bool,
    code128: bool,
    code39: bool,
}

impl LinearReader {
    /// Create a reader limited to `formats`. Non-linear formats are ignored.
    pub fn new(formats: &[CodeFormat]) -> Self {
        let mut reader = Self::default();
        for format in formats.iter().filter(|f| f.is_linear()) {
            match format {
                CodeFormat::Ean13 => reader.ean13 = true,
                CodeFormat::UpcA => reader.upc_a = true,
                CodeFormat::Ean8 => reader.ean8 = true,
                CodeFormat::Code128 => reader.code128 = true,
                CodeFormat::Code39 => reader.code39 = true,
                other => debug!(format = %other, "Linear format not supported, ignoring"),
            }
        }
        reader
    }

    /// Whether the scan-line reader can decode `format`
    pub fn supports(format: CodeFormat) -> bool {
        matches!(
            format,
            CodeFormat::Ean13
                | CodeFormat::UpcA
                | CodeFormat::Ean8
                | CodeFormat::Code128
                | CodeFormat::Code39
        )
    }

    /// Whether any supported format is enabled
    pub fn is_enabled(&self) -> bool {
        self.ean13 || self.upc_a || self.ean8 || self.code128 || self.code39
    }

    /// Scan a tightly packed luma image
    pub fn decode(&self, width: usize, height: usize, luma: &[u8]) -> Option<LinearMatch> {
        if !self.is_enabled() || width == 0 || height == 0 || luma.len() < width * height {
            return None;
        }

        for fraction in SCAN_ROWS {
            let y = ((height as f32 * fraction) as usize).min(height - 1);
            let row = &luma[y * width..(y + 1) * width];
            if let Some(found) = self.decode_row(row) {
                trace!(row = y, format = %found.format, "Linear barcode found");
                return Some(found);
            }
        }
        None
    }

    /// Decode a single row of luma values
    pub fn decode_row(&self, row: &[u8]) -> Option<LinearMatch> {
        let mut runs = binarize(row)?;
        if let Some(found) = self.decode_runs(&runs) {
            return Some(found);
        }
        runs.reverse();
        self.decode_runs(&runs)
    }

    fn decode_runs(&self, runs: &[Run]) -> Option<LinearMatch> {
        for start in 1..runs.len() {
            if !runs[start].0 || !has_quiet_zone(runs, start) {
                continue;
            }
            if (self.ean13 || self.upc_a) && start + EAN13_RUNS <= runs.len() {
                if let Some(found) = self.try_ean13(&runs[start..start + EAN13_RUNS]) {
                    return Some(found);
                }
            }
            if self.ean8 && start + EAN8_RUNS <= runs.len() {
                if let Some(found) = try_ean8(&runs[start..start + EAN8_RUNS]) {
                    return Some(found);
                }
            }
            if self.code128 {
                if let Some(found) = try_code128(&runs[start..]) {
                    return Some(found);
                }
            }
            if self.code39 {
                if let Some(found) = try_code39(&runs[start..]) {
                    return Some(found);
                }
            }
        }
        None
    }

    fn try_ean13(&self, runs: &[Run]) -> Option<LinearMatch> {
        let module = guard_module(&runs[0..3])?;
        if !is_guard(&runs[27..32], module) || !is_guard(&runs[56..59], module) {
            return None;
        }

        let mut digits = Vec::with_capacity(13);
        let mut parity = [false; 6];
        for k in 0..6 {
            let (digit, is_g) = match_digit(widths(&runs[3 + 4 * k..7 + 4 * k]), true)?;
            parity[k] = is_g;
            digits.push(digit);
        }
        for k in 0..6 {
            let (digit, _) = match_digit(widths(&runs[32 + 4 * k..36 + 4 * k]), false)?;
            digits.push(digit);
        }

        let first = FIRST_DIGIT_PARITY.iter().position(|p| *p == parity)? as u8;
        digits.insert(0, first);
        if !checksum_ok(&digits) {
            return None;
        }

        let text: String = digits.iter().map(|d| char::from(b'0' + d)).collect();
        if first == 0 && self.upc_a {
            Some(LinearMatch {
                format: CodeFormat::UpcA,
                text: text[1..].to_string(),
            })
        } else if self.ean13 {
            Some(LinearMatch {
                format: CodeFormat::Ean13,
                text,
            })
        } else {
            None
        }
    }
}

fn try_ean8(runs: &[Run]) -> Option<LinearMatch> {
    let module = guard_module(&runs[0..3])?;
    if !is_guard(&runs[19..24], module) || !is_guard(&runs[40..43], module) {
        return None;
    }

    let mut digits = Vec::with_capacity(8);
    for k in 0..4 {
        let (digit, _) = match_digit(widths(&runs[3 + 4 * k..7 + 4 * k]), false)?;
        digits.push(digit);
    }
    for k in 0..4 {
        let (digit, _) = match_digit(widths(&runs[24 + 4 * k..28 + 4 * k]), false)?;
        digits.push(digit);
    }

    if !checksum_ok(&digits) {
        return None;
    }
    Some(LinearMatch {
        format: CodeFormat::Ean8,
        text: digits.iter().map(|d| char::from(b'0' + d)).collect(),
    })
}

/// Symbols from a start code up to the stop code, checksum verified
fn try_code128(runs: &[Run]) -> Option<LinearMatch> {
    let start = match_code128(runs.get(0..6)?)?;
    if !(CODE128_START_A..=CODE128_START_C).contains(&start) {
        return None;
    }

    let mut values = vec![start];
    let mut pos = 6;
    loop {
        let value = match_code128(runs.get(pos..pos + 6)?)?;
        if value == CODE128_STOP {
            // Termination bar
            if !runs.get(pos + 6)?.0 {
                return None;
            }
            break;
        }
        values.push(value);
        pos += 6;
    }

    // Start, at least one data symbol, check symbol
    if values.len() < 3 {
        return None;
    }
    let (&check, body) = values.split_last()?;
    let sum: u32 = body
        .iter()
        .enumerate()
        .map(|(i, &v)| v as u32 * (i as u32).max(1))
        .sum();
    if sum % 103 != check as u32 {
        return None;
    }

    Some(LinearMatch {
        format: CodeFormat::Code128,
        text: code128_text(body)?,
    })
}

/// Closest Code 128 symbol for six run widths
fn match_code128(runs: &[Run]) -> Option<u8> {
    let total: u32 = runs.iter().map(|r| r.1).sum();
    if total == 0 {
        return None;
    }
    let scale = 11.0 / total as f32;

    let mut best: Option<(u8, f32)> = None;
    for (value, pattern) in CODE128_PATTERNS.iter().enumerate() {
        let e: f32 = runs
            .iter()
            .zip(pattern.iter())
            .map(|(r, &p)| (r.1 as f32 * scale - p as f32).abs())
            .sum();
        if best.is_none_or(|(_, b)| e < b) {
            best = Some((value as u8, e));
        }
    }
    best.filter(|&(_, e)| e <= MAX_DIGIT_ERROR)
        .map(|(value, _)| value)
}

#[derive(Clone, Copy)]
enum CodeSet {
    A,
    B,
    C,
}

/// Text of the start and data symbols. Function codes produce no text.
fn code128_text(symbols: &[u8]) -> Option<String> {
    let (&start, data) = symbols.split_first()?;
    let mut set = match start {
        CODE128_START_A => CodeSet::A,
        CODE128_START_B => CodeSet::B,
        _ => CodeSet::C,
    };

    let mut text = String::new();
    let mut shifted = false;
    for &value in data {
        let active = match (shifted, set) {
            (true, CodeSet::A) => CodeSet::B,
            (true, CodeSet::B) => CodeSet::A,
            (_, set) => set,
        };
        shifted = false;

        match (active, value) {
            (_, 103..) => return None,
            (CodeSet::C, 0..=99) => text.push_str(&format!("{:02}", value)),
            (CodeSet::C, 100) => set = CodeSet::B,
            (CodeSet::C, 101) => set = CodeSet::A,
            (CodeSet::A, 0..=63) | (CodeSet::B, 0..=95) => text.push(char::from(value + 32)),
            (CodeSet::A, 64..=95) => text.push(char::from(value - 64)),
            (CodeSet::A | CodeSet::B, 98) => shifted = true,
            (CodeSet::A | CodeSet::B, 99) => set = CodeSet::C,
            (CodeSet::A, 100) => set = CodeSet::B,
            (CodeSet::B, 101) => set = CodeSet::A,
            // FNC1-4
            _ => {}
        }
    }
    Some(text)
}

/// Characters between a `*` start and a `*` stop, each followed by a
/// narrow gap
fn try_code39(runs: &[Run]) -> Option<LinearMatch> {
    if code39_char(runs.get(0..9)?)? != b'*' {
        return None;
    }

    let mut text = String::new();
    let mut pos = 10;
    loop {
        match code39_char(runs.get(pos..pos + 9)?)? {
            b'*' => break,
            c => text.push(char::from(c)),
        }
        pos += 10;
    }

    if text.is_empty() {
        return None;
    }
    Some(LinearMatch {
        format: CodeFormat::Code39,
        text,
    })
}

/// Code 39 character for nine run widths: the three widest are wide
fn code39_char(runs: &[Run]) -> Option<u8> {
    let mut sorted: Vec<u32> = runs.iter().map(|r| r.1).collect();
    sorted.sort_unstable();
    let (narrow_max, wide_min) = (sorted[5], sorted[6]);
    if (wide_min as f32) < narrow_max as f32 * CODE39_MIN_RATIO {
        return None;
    }

    let pattern = runs
        .iter()
        .fold(0u16, |acc, r| (acc << 1) | u16::from(r.1 >= wide_min));
    CODE39_PATTERNS
        .iter()
        .position(|&p| p == pattern)
        .map(|i| CODE39_ALPHABET[i])
}

/// Threshold a row at its mid-range and collapse it into runs
fn binarize(row: &[u8]) -> Option<Vec<Run>> {
    let min = *row.iter().min()?;
    let max = *row.iter().max()?;
    if max - min < MIN_CONTRAST {
        return None;
    }
    let threshold = (min as u16 + max as u16) / 2;

    let mut runs: Vec<Run> = Vec::new();
    for &v in row {
        let is_bar = (v as u16) < threshold;
        match runs.last_mut() {
            Some((color, len)) if *color == is_bar => *len += 1,
            _ => runs.push((is_bar, 1)),
        }
    }
    Some(runs)
}

/// Module width implied by a bar-space-bar guard, if it looks like one
fn guard_module(guard: &[Run]) -> Option<f32> {
    let total: u32 = guard.iter().map(|r| r.1).sum();
    let module = total as f32 / guard.len() as f32;
    is_guard(guard, module).then_some(module)
}

fn is_guard(runs: &[Run], module: f32) -> bool {
    runs.iter()
        .all(|&(_, len)| (len as f32) >= module * 0.4 && (len as f32) <= module * 1.8)
}

/// The run before `start` must be a space at least three modules wide
fn has_quiet_zone(runs: &[Run], start: usize) -> bool {
    let Some(guard) = runs.get(start..start + 3) else {
        return false;
    };
    let module = guard.iter().map(|r| r.1).sum::<u32>() as f32 / 3.0;
    let (is_bar, len) = runs[start - 1];
    !is_bar && len as f32 >= module * 3.0
}

fn widths(runs: &[Run]) -> [u32; 4] {
    [runs[0].1, runs[1].1, runs[2].1, runs[3].1]
}

/// Best matching digit for four run widths. With `allow_g`, the reversed
/// (G-code) table is tried as well and the parity is returned.
fn match_digit(widths: [u32; 4], allow_g: bool) -> Option<(u8, bool)> {
    let total: u32 = widths.iter().sum();
    if total == 0 {
        return None;
    }
    let scale = 7.0 / total as f32;
    let normalized = widths.map(|w| w as f32 * scale);

    let error = |pattern: [u8; 4]| -> f32 {
        normalized
            .iter()
            .zip(pattern.iter())
            .map(|(n, p)| (n - *p as f32).abs())
            .sum()
    };

    let mut best: Option<(u8, bool, f32)> = None;
    for (digit, pattern) in L_WIDTHS.iter().enumerate() {
        let mut candidates = vec![(*pattern, false)];
        if allow_g {
            let mut reversed = *pattern;
            reversed.reverse();
            candidates.push((reversed, true));
        }
        for (candidate, is_g) in candidates {
            let e = error(candidate);
            if best.is_none_or(|(_, _, b)| e < b) {
                best = Some((digit as u8, is_g, e));
            }
        }
    }

    best.filter(|&(_, _, e)| e <= MAX_DIGIT_ERROR)
        .map(|(digit, is_g, _)| (digit, is_g))
}

/// Mod-10 check used by the whole EAN/UPC family
pub fn checksum_ok(digits: &[u8]) -> bool {
    let Some((&check, data)) = digits.split_last() else {
        return false;
    };
    let sum: u32 = data
        .iter()
        .rev()
        .enumerate()
        .map(|(i, &d)| d as u32 * if i % 2 == 0 { 3 } else { 1 })
        .sum();
    (10 - sum % 10) % 10 == check as u32
}

/// Module pattern (true = bar) of an EAN-13 code, quiet zones excluded
#[cfg(test)]
pub(crate) fn encode_ean13(text: &str) -> Vec<bool> {
    let digits: Vec<u8> = text.bytes().map(|b| b - b'0').collect();
    assert_eq!(digits.len(), 13);
    let parity = FIRST_DIGIT_PARITY[digits[0] as usize];

    let mut modules = vec![true, false, true];
    for (k, &d) in digits[1..7].iter().enumerate() {
        let mut pattern = L_WIDTHS[d as usize];
        if parity[k] {
            pattern.reverse();
        }
        push_runs(&mut modules, pattern, false);
    }
    modules.extend([false, true, false, true, false]);
    for &d in &digits[7..13] {
        push_runs(&mut modules, L_WIDTHS[d as usize], true);
    }
    modules.extend([true, false, true]);
    modules
}

/// Module pattern of an EAN-8 code, quiet zones excluded
#[cfg(test)]
pub(crate) fn encode_ean8(text: &str) -> Vec<bool> {
    let digits: Vec<u8> = text.bytes().map(|b| b - b'0').collect();
    assert_eq!(digits.len(), 8);

    let mut modules = vec![true, false, true];
    for &d in &digits[0..4] {
        push_runs(&mut modules, L_WIDTHS[d as usize], false);
    }
    modules.extend([false, true, false, true, false]);
    for &d in &digits[4..8] {
        push_runs(&mut modules, L_WIDTHS[d as usize], true);
    }
    modules.extend([true, false, true]);
    modules
}

/// Module pattern of a Code 128 symbol sequence (start and data values),
/// with check symbol, stop and termination bar appended
#[cfg(test)]
pub(crate) fn encode_code128(values: &[u8]) -> Vec<bool> {
    let check = values
        .iter()
        .enumerate()
        .map(|(i, &v)| v as u32 * (i as u32).max(1))
        .sum::<u32>()
        % 103;

    let mut modules = Vec::new();
    for &value in values.iter().chain([check as u8, CODE128_STOP].iter()) {
        let mut bar = true;
        for w in CODE128_PATTERNS[value as usize] {
            modules.extend(std::iter::repeat_n(bar, w as usize));
            bar = !bar;
        }
    }
    modules.extend([true, true]);
    modules
}

/// Code 128 code set B values for printable ASCII text, start code included
#[cfg(test)]
pub(crate) fn code128_set_b(text: &str) -> Vec<u8> {
    std::iter::once(CODE128_START_B)
        .chain(text.bytes().map(|b| b - 32))
        .collect()
}

/// Module pattern of a Code 39 text wrapped in `*`, wide elements three
/// modules, one-module gaps
#[cfg(test)]
pub(crate) fn encode_code39(text: &str) -> Vec<bool> {
    let mut modules = Vec::new();
    for c in std::iter::once(b'*').chain(text.bytes()).chain(std::iter::once(b'*')) {
        let index = CODE39_ALPHABET.iter().position(|&a| a == c).unwrap();
        let pattern = CODE39_PATTERNS[index];
        for element in 0..9 {
            let wide = pattern & (1 << (8 - element)) != 0;
            modules.extend(std::iter::repeat_n(element % 2 == 0, if wide { 3 } else { 1 }));
        }
        modules.push(false);
    }
    modules.pop();
    modules
}

#[cfg(test)]
fn push_runs(modules: &mut Vec<bool>, widths: [u8; 4], first_is_bar: bool) {
    let mut color = first_is_bar;
    for w in widths {
        modules.extend(std::iter::repeat_n(color, w as usize));
        color = !color;
    }
}

/// Render modules into a luma row with a quiet zone on both sides
#[cfg(test)]
pub(crate) fn render_row(modules: &[bool], module_px: usize, quiet_modules: usize) -> Vec<u8> {
    let mut row = vec![255u8; quiet_modules * module_px];
    for &bar in modules {
        row.extend(std::iter::repeat_n(if bar { 0 } else { 255 }, module_px));
    }
    row.extend(std::iter::repeat_n(255u8, quiet_modules * module_px));
    row
}
