// UTF-16 helpers; script strings are sequences of UTF-16 code units.
pub fn utf8_to_utf16(s: &str) -> Vec<u16> {
    s.encode_utf16().collect()
}

pub fn utf16_to_utf8(v: &[u16]) -> String {
    String::from_utf16_lossy(v)
}

pub fn utf16_slice(v: &[u16], start: usize, end: usize) -> Vec<u16> {
    if start >= v.len() || start >= end {
        Vec::new()
    } else {
        let end = end.min(v.len());
        v[start..end].to_vec()
    }
}

pub fn utf16_to_uppercase(v: &[u16]) -> Vec<u16> {
    utf8_to_utf16(&utf16_to_utf8(v).to_uppercase())
}

pub fn utf16_to_lowercase(v: &[u16]) -> Vec<u16> {
    utf8_to_utf16(&utf16_to_utf8(v).to_lowercase())
}

/// First occurrence of `pattern` at or after `from`.
pub fn utf16_find_from(v: &[u16], pattern: &[u16], from: usize) -> Option<usize> {
    if from > v.len() {
        return None;
    }
    if pattern.is_empty() {
        return Some(from);
    }
    if pattern.len() > v.len() {
        return None;
    }
    (from..=v.len() - pattern.len()).find(|&i| v[i..i + pattern.len()] == *pattern)
}

pub fn utf16_find(v: &[u16], pattern: &[u16]) -> Option<usize> {
    utf16_find_from(v, pattern, 0)
}

/// Last occurrence of `pattern` starting at or before `from`.
pub fn utf16_rfind_from(v: &[u16], pattern: &[u16], from: usize) -> Option<usize> {
    if pattern.len() > v.len() {
        return None;
    }
    let last = (v.len() - pattern.len()).min(from);
    (0..=last).rev().find(|&i| v[i..i + pattern.len()] == *pattern)
}

/// WhiteSpace or LineTerminator code unit, as used by `trim` and numeric parsing.
pub fn is_js_whitespace(c: u16) -> bool {
    matches!(
        c,
        0x09 | 0x0B | 0x0C | 0x20 | 0xA0 | 0xFEFF | 0x0A | 0x0D | 0x2028 | 0x2029 | 0x1680 | 0x2000..=0x200A | 0x202F | 0x205F | 0x3000
    )
}

pub fn is_line_terminator(c: char) -> bool {
    matches!(c, '\n' | '\r' | '\u{2028}' | '\u{2029}')
}

pub fn utf16_trim_start(v: &[u16]) -> &[u16] {
    let start = v.iter().position(|&c| !is_js_whitespace(c)).unwrap_or(v.len());
    &v[start..]
}

pub fn utf16_trim_end(v: &[u16]) -> &[u16] {
    let end = v.iter().rposition(|&c| !is_js_whitespace(c)).map(|p| p + 1).unwrap_or(0);
    &v[..end]
}

pub fn utf16_trim(v: &[u16]) -> &[u16] {
    utf16_trim_end(utf16_trim_start(v))
}

/// Code point at `index`, combining a surrogate pair when one starts there.
pub fn code_point_at(v: &[u16], index: usize) -> Option<u32> {
    let first = *v.get(index)?;
    if (0xD800..=0xDBFF).contains(&first)
        && let Some(&second) = v.get(index + 1)
        && (0xDC00..=0xDFFF).contains(&second)
    {
        return Some(0x10000 + (((first as u32) - 0xD800) << 10) + ((second as u32) - 0xDC00));
    }
    Some(first as u32)
}

pub fn push_code_point(out: &mut Vec<u16>, cp: u32) {
    if cp >= 0x10000 {
        let c = cp - 0x10000;
        out.push(0xD800 + (c >> 10) as u16);
        out.push(0xDC00 + (c & 0x3FF) as u16);
    } else {
        out.push(cp as u16);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn find_and_rfind_respect_bounds() {
        let hay = utf8_to_utf16("abcabc");
        let needle = utf8_to_utf16("bc");
        assert_eq!(utf16_find_from(&hay, &needle, 0), Some(1));
        assert_eq!(utf16_find_from(&hay, &needle, 2), Some(4));
        assert_eq!(utf16_rfind_from(&hay, &needle, 3), Some(1));
        assert_eq!(utf16_find_from(&hay, &[], 6), Some(6));
    }

    #[test]
    fn surrogate_pairs_combine() {
        let s = utf8_to_utf16("a\u{1F600}");
        assert_eq!(code_point_at(&s, 1), Some(0x1F600));
        let mut out = Vec::new();
        push_code_point(&mut out, 0x1F600);
        assert_eq!(&out[..], &s[1..]);
    }
}
