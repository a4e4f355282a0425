// Shared numeric conversion helpers used by the compiler, the VM and the Number built-ins

use crate::unicode::{is_js_whitespace, utf8_to_utf16, utf16_to_utf8, utf16_trim};

const TWO_32: f64 = 2_i64.pow(32) as f64; // 2^32

/// JS ToInt32 semantics for Number inputs
pub(crate) fn to_int32(n: f64) -> i32 {
    if !n.is_finite() || n == 0.0 {
        return 0;
    }
    let int = n.trunc();
    let int32bit = ((int % TWO_32) + TWO_32) % TWO_32;
    if int32bit >= TWO_32 / 2.0 {
        (int32bit - TWO_32) as i32
    } else {
        int32bit as i32
    }
}

/// JS ToUint32 semantics for Number inputs
pub(crate) fn to_uint32(n: f64) -> u32 {
    if !n.is_finite() {
        return 0_u32;
    }
    let int = n.trunc();
    let u = ((int % TWO_32) + TWO_32) % TWO_32;
    u as u32
}

/// ToIntegerOrInfinity on an already converted number.
pub(crate) fn to_integer_or_infinity(n: f64) -> f64 {
    if n.is_nan() || n == 0.0 {
        0.0
    } else if n.is_infinite() {
        n
    } else {
        n.trunc()
    }
}

/// Number::toString(10): shortest digits that round-trip.
pub fn number_to_string(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n == 0.0 {
        return "0".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    let mut buf = ryu_js::Buffer::new();
    buf.format(n).to_string()
}

/// Canonical array index for a property name: `"0"`..`"4294967294"` without leading zeros.
pub fn canonical_index(s: &str) -> Option<u32> {
    if s.is_empty() || s.len() > 10 || (s.len() > 1 && s.starts_with('0')) || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let v: u64 = s.parse().ok()?;
    if v < u32::MAX as u64 { Some(v as u32) } else { None }
}

/// Integer digits in `radix`, rounded once to the nearest double. NaN for empty
/// input or a digit outside the radix.
pub(crate) fn parse_radix_digits(digits: &str, radix: u32) -> f64 {
    if digits.is_empty() {
        return f64::NAN;
    }
    let mut mantissa: u128 = 0;
    // digits past the 128-bit mantissa, and whether any of them was non-zero
    let mut dropped = 0_i32;
    let mut sticky = false;
    for c in digits.chars() {
        let Some(d) = c.to_digit(radix) else {
            return f64::NAN;
        };
        match mantissa.checked_mul(radix as u128).and_then(|m| m.checked_add(d as u128)) {
            Some(m) if dropped == 0 => mantissa = m,
            _ => {
                dropped += 1;
                sticky |= d != 0;
            }
        }
    }
    // bit 0 lies far below the 53-bit rounding point once digits were dropped
    let value = (mantissa | sticky as u128) as f64;
    if dropped == 0 { value } else { value * (radix as f64).powi(dropped) }
}

/// StringToNumber: whitespace-trimmed decimal, `0x`/`0o`/`0b` integers or `Infinity`.
/// Empty input converts to 0, anything else that does not match is NaN.
pub fn string_to_number(s: &[u16]) -> f64 {
    let trimmed = utf16_to_utf8(utf16_trim(s));
    let trimmed = trimmed.as_str();
    if trimmed.is_empty() {
        return 0.0;
    }
    for (prefix, radix) in [("0x", 16), ("0X", 16), ("0o", 8), ("0O", 8), ("0b", 2), ("0B", 2)] {
        if let Some(digits) = trimmed.strip_prefix(prefix) {
            return parse_radix_digits(digits, radix);
        }
    }
    match trimmed {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }
    if !is_str_decimal_literal(trimmed) {
        return f64::NAN;
    }
    trimmed.parse::<f64>().unwrap_or(f64::NAN)
}

/// Digits with an optional sign, fraction and exponent. Rust's float parser also
/// accepts words such as `inf` and `nan`, which scripts must not.
fn is_str_decimal_literal(s: &str) -> bool {
    let b = s.as_bytes();
    let mut i = 0;
    if matches!(b.first(), Some(b'+' | b'-')) {
        i += 1;
    }
    let int_start = i;
    while i < b.len() && b[i].is_ascii_digit() {
        i += 1;
    }
    let mut digits = i - int_start;
    if i < b.len() && b[i] == b'.' {
        i += 1;
        let frac_start = i;
        while i < b.len() && b[i].is_ascii_digit() {
            i += 1;
        }
        digits += i - frac_start;
    }
    if digits == 0 {
        return false;
    }
    if i < b.len() && (b[i] == b'e' || b[i] == b'E') {
        i += 1;
        if matches!(b.get(i), Some(b'+' | b'-')) {
            i += 1;
        }
        let exp_start = i;
        while i < b.len() && b[i].is_ascii_digit() {
            i += 1;
        }
        if i == exp_start {
            return false;
        }
    }
    i == b.len()
}

/// Global `parseFloat`: longest decimal prefix after leading whitespace.
pub fn parse_float(s: &[u16]) -> f64 {
    let start = s.iter().position(|&c| !is_js_whitespace(c)).unwrap_or(s.len());
    let text = utf16_to_utf8(&s[start..]);
    let unsigned = text.strip_prefix(['+', '-']).unwrap_or(&text);
    if unsigned.starts_with("Infinity") {
        return if text.starts_with('-') { f64::NEG_INFINITY } else { f64::INFINITY };
    }
    let b = text.as_bytes();
    let mut best = None;
    let mut end = 0;
    while end < b.len() {
        end += 1;
        if !text.is_char_boundary(end) {
            break;
        }
        if is_str_decimal_literal(&text[..end]) {
            best = Some(end);
        } else if !is_decimal_prefix(&text[..end]) {
            break;
        }
    }
    match best {
        Some(end) => text[..end].parse::<f64>().unwrap_or(f64::NAN),
        None => f64::NAN,
    }
}

/// A prefix that could still grow into a decimal literal (`1e`, `-`, `.`).
fn is_decimal_prefix(s: &str) -> bool {
    s.bytes().all(|c| c.is_ascii_digit() || matches!(c, b'+' | b'-' | b'.' | b'e' | b'E'))
}

/// Global `parseInt` with an already converted radix (0 means "detect").
pub fn parse_int(s: &[u16], radix: i32) -> f64 {
    let trimmed = utf16_to_utf8(utf16_trim(s));
    let mut text = trimmed.as_str();
    let mut sign = 1.0;
    if let Some(rest) = text.strip_prefix('-') {
        sign = -1.0;
        text = rest;
    } else if let Some(rest) = text.strip_prefix('+') {
        text = rest;
    }
    let mut radix = radix;
    let mut strip_prefix = true;
    if radix != 0 {
        if !(2..=36).contains(&radix) {
            return f64::NAN;
        }
        if radix != 16 {
            strip_prefix = false;
        }
    } else {
        radix = 10;
    }
    if strip_prefix && (text.starts_with("0x") || text.starts_with("0X")) {
        text = &text[2..];
        radix = 16;
    }
    let end = text.find(|c: char| c.to_digit(radix as u32).is_none()).unwrap_or(text.len());
    let digits = &text[..end];
    if digits.is_empty() {
        return f64::NAN;
    }
    if radix == 10 {
        // Decimal digits go through the float parser for correct rounding of long inputs.
        return sign * digits.parse::<f64>().unwrap_or(f64::NAN);
    }
    sign * parse_radix_digits(digits, radix as u32)
}

/// Number→string in non-decimal radix (2–36), with fractional part.
pub fn number_to_radix_string(n: f64, radix: u32) -> String {
    if radix == 10 || !n.is_finite() || n == 0.0 {
        return number_to_string(n);
    }
    let negative = n < 0.0;
    let abs_n = n.abs();
    let mut int_part = abs_n.trunc();
    let mut fractional_part = abs_n - int_part;
    let digit = |d: u32| std::char::from_digit(d, radix).unwrap_or('0');

    let mut int_digits = Vec::new();
    if int_part == 0.0 {
        int_digits.push('0');
    }
    while int_part >= 1.0 {
        let d = (int_part % radix as f64) as u32;
        int_digits.push(digit(d));
        int_part = (int_part / radix as f64).trunc();
    }
    int_digits.reverse();

    let mut out: String = int_digits.into_iter().collect();
    if fractional_part > 0.0 {
        out.push('.');
        // Stop once the remaining fraction is below the precision of the input.
        let mut delta = 0.5 * (f64::from_bits(abs_n.to_bits() + 1) - abs_n);
        delta = delta.max(f64::from_bits(1));
        loop {
            fractional_part *= radix as f64;
            delta *= radix as f64;
            let d = fractional_part.trunc() as u32;
            out.push(digit(d));
            fractional_part -= d as f64;
            if fractional_part <= delta || out.len() > 1100 {
                break;
            }
        }
    }
    if negative { format!("-{out}") } else { out }
}

/// Rounds a run of decimal digits to `keep` digits, half away from zero.
/// Returns true when the carry produced an extra leading digit.
fn round_digits(digits: &mut Vec<u8>, keep: usize) -> bool {
    let round_up = digits.get(keep).is_some_and(|&d| d >= b'5');
    digits.truncate(keep);
    while digits.len() < keep {
        digits.push(b'0');
    }
    if !round_up {
        return false;
    }
    for d in digits.iter_mut().rev() {
        if *d == b'9' {
            *d = b'0';
        } else {
            *d += 1;
            return false;
        }
    }
    digits.insert(0, b'1');
    true
}

/// `Number.prototype.toFixed` for finite `x` with `|x| < 1e21`.
pub fn to_fixed(x: f64, fraction_digits: usize) -> String {
    let negative = x < 0.0;
    let s = format!("{:.prec$}", x.abs(), prec = fraction_digits + 30);
    let (int_part, frac_part) = s.split_once('.').unwrap_or((s.as_str(), ""));
    let mut digits: Vec<u8> = int_part.bytes().chain(frac_part.bytes()).collect();
    let keep = int_part.len() + fraction_digits;
    let grew = round_digits(&mut digits, keep);
    let int_len = int_part.len() + usize::from(grew);
    let mut out = String::new();
    if negative {
        out.push('-');
    }
    out.push_str(&String::from_utf8_lossy(&digits[..int_len]));
    if fraction_digits > 0 {
        out.push('.');
        out.push_str(&String::from_utf8_lossy(&digits[int_len..]));
    }
    out
}

/// Significant digits of `x` (> 0) and the decimal exponent of the first one.
/// `None` asks for the shortest round-trip digits.
fn significant_digits(x: f64, precision: Option<usize>) -> (Vec<u8>, i32) {
    match precision {
        None => {
            let s = format!("{x:e}");
            let (mantissa, exp) = s.split_once('e').unwrap_or((s.as_str(), "0"));
            let digits = mantissa.bytes().filter(|b| *b != b'.').collect();
            (digits, exp.parse().unwrap_or(0))
        }
        Some(p) => {
            let s = format!("{:.prec$e}", x, prec = p + 30);
            let (mantissa, exp) = s.split_once('e').unwrap_or((s.as_str(), "0"));
            let mut digits: Vec<u8> = mantissa.bytes().filter(|b| *b != b'.').collect();
            let mut exp: i32 = exp.parse().unwrap_or(0);
            if round_digits(&mut digits, p) {
                digits.pop();
                exp += 1;
            }
            (digits, exp)
        }
    }
}

fn exponential_form(digits: &[u8], exp: i32) -> String {
    let (first, rest) = digits.split_at(1);
    let mut out = String::from_utf8_lossy(first).into_owned();
    if !rest.is_empty() {
        out.push('.');
        out.push_str(&String::from_utf8_lossy(rest));
    }
    let sign = if exp >= 0 { "+" } else { "-" };
    format!("{out}e{sign}{}", exp.abs())
}

/// `Number.prototype.toExponential` for finite `x`.
pub fn to_exponential(x: f64, fraction_digits: Option<usize>) -> String {
    let negative = x < 0.0;
    let abs = x.abs();
    let body = if abs == 0.0 {
        let f = fraction_digits.unwrap_or(0);
        let digits = vec![b'0'; f + 1];
        exponential_form(&digits, 0)
    } else {
        let (digits, exp) = significant_digits(abs, fraction_digits.map(|f| f + 1));
        exponential_form(&digits, exp)
    };
    if negative { format!("-{body}") } else { body }
}

/// `Number.prototype.toPrecision` for finite `x` and `1 <= precision <= 100`.
pub fn to_precision(x: f64, precision: usize) -> String {
    let negative = x < 0.0;
    let abs = x.abs();
    let (digits, exp) = if abs == 0.0 {
        (vec![b'0'; precision], 0)
    } else {
        significant_digits(abs, Some(precision))
    };
    let body = if exp < -6 || exp >= precision as i32 {
        exponential_form(&digits, exp)
    } else if exp >= 0 {
        let int_len = exp as usize + 1;
        let mut s = String::from_utf8_lossy(&digits[..int_len]).into_owned();
        if int_len < digits.len() {
            s.push('.');
            s.push_str(&String::from_utf8_lossy(&digits[int_len..]));
        }
        s
    } else {
        format!("0.{}{}", "0".repeat((-exp - 1) as usize), String::from_utf8_lossy(&digits))
    };
    if negative { format!("-{body}") } else { body }
}

/// Number to UTF-16 string value.
pub fn number_to_utf16(n: f64) -> Vec<u16> {
    utf8_to_utf16(&number_to_string(n))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn number_strings_round_trip() {
        for s in ["1", "16", "32", "1.5", "3.141592654", "1.2e-15", "1.234e-10"] {
            let n = string_to_number(&utf8_to_utf16(s));
            assert_eq!(number_to_string(n), s);
        }
        let n = string_to_number(&utf8_to_utf16("0.0000000001234"));
        assert_eq!(number_to_string(n), "1.234e-10");
        assert_eq!(string_to_number(&utf8_to_utf16(&number_to_string(n))), n);
    }

    #[test]
    fn special_values_format() {
        assert_eq!(number_to_string(-0.0), "0");
        assert_eq!(number_to_string(f64::NAN), "NaN");
        assert_eq!(number_to_string(f64::NEG_INFINITY), "-Infinity");
        assert_eq!(number_to_string(1e21), "1e+21");
        assert_eq!(number_to_string(123456789012345680000.0), "123456789012345680000");
        assert_eq!(number_to_string(0.000001), "0.000001");
        assert_eq!(number_to_string(1e-7), "1e-7");
    }

    #[test]
    fn string_to_number_edge_cases() {
        let n = |s: &str| string_to_number(&utf8_to_utf16(s));
        assert_eq!(n(""), 0.0);
        assert_eq!(n("  42  "), 42.0);
        assert_eq!(n("0x1F"), 31.0);
        assert_eq!(n("0b101"), 5.0);
        assert!(n("inf").is_nan());
        assert!(n("1e").is_nan());
        assert!(n("12px").is_nan());
        assert_eq!(n("-Infinity"), f64::NEG_INFINITY);
        assert_eq!(n(".5"), 0.5);
        assert_eq!(n("5."), 5.0);
    }

    #[test]
    fn int32_conversions_wrap() {
        assert_eq!(to_int32(4294967296.0 + 5.0), 5);
        assert_eq!(to_int32(2147483648.0), -2147483648);
        assert_eq!(to_uint32(-1.0), 4294967295);
        assert_eq!(to_int32(f64::NAN), 0);
    }

    #[test]
    fn parse_int_and_float() {
        let u = utf8_to_utf16;
        assert_eq!(parse_int(&u("  123abc"), 0), 123.0);
        assert_eq!(parse_int(&u("0x10"), 0), 16.0);
        assert_eq!(parse_int(&u("ff"), 16), 255.0);
        assert_eq!(parse_int(&u("-12"), 0), -12.0);
        assert!(parse_int(&u("z"), 10).is_nan());
        assert_eq!(parse_float(&u("3.14abc")), 3.14);
        assert_eq!(parse_float(&u("1e3x")), 1000.0);
        assert_eq!(parse_float(&u("-Infinityx")), f64::NEG_INFINITY);
        assert!(parse_float(&u("abc")).is_nan());
    }

    #[test]
    fn fixed_exponential_precision() {
        assert_eq!(to_fixed(1.005, 2), "1.00");
        assert_eq!(to_fixed(2.5, 0), "3");
        assert_eq!(to_fixed(-1.5, 1), "-1.5");
        assert_eq!(to_fixed(0.0, 2), "0.00");
        assert_eq!(to_exponential(123456.0, Some(2)), "1.23e+5");
        assert_eq!(to_exponential(0.00015, None), "1.5e-4");
        assert_eq!(to_precision(123.456, 4), "123.5");
        assert_eq!(to_precision(0.000123, 2), "0.00012");
        assert_eq!(to_precision(123456.0, 2), "1.2e+5");
    }

    #[test]
    fn radix_digits_round_once() {
        let u = utf8_to_utf16;
        assert_eq!(string_to_number(&u("0x200000000000011")), 144115188075855904.0);
        assert_eq!(string_to_number(&u("0x20000000000001")), 9007199254740992.0);
        assert_eq!(string_to_number(&u("0x20000000000003")), 9007199254740996.0);
        assert_eq!(string_to_number(&u("0b101")), 5.0);
        assert!(string_to_number(&u("0x")).is_nan());
        assert!(string_to_number(&u("0o9")).is_nan());
        let huge = format!("0x{}", "f".repeat(40));
        assert_eq!(string_to_number(&u(huge.as_str())), 2f64.powi(160));
        assert_eq!(parse_int(&u("200000000000011"), 16), 144115188075855904.0);
    }

    #[test]
    fn radix_strings() {
        assert_eq!(number_to_radix_string(255.0, 16), "ff");
        assert_eq!(number_to_radix_string(-8.0, 2), "-1000");
        assert_eq!(number_to_radix_string(0.5, 2), "0.1");
        assert_eq!(canonical_index("42"), Some(42));
        assert_eq!(canonical_index("042"), None);
        assert_eq!(canonical_index("4294967295"), None);
    }
}
