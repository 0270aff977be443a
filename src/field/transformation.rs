use crate::field::modifier::Utf16Modifier;
use base64::engine::general_purpose::STANDARD_NO_PAD;
use base64::Engine;
use std::collections::BTreeSet;

const WINDASH_CHARS: [char; 5] = ['-', '/', '–', '—', '―'];

fn utf16_bytes(input: &str, utf16: Option<Utf16Modifier>) -> Vec<u8> {
    match utf16 {
        Some(Utf16Modifier::Utf16le | Utf16Modifier::Wide) => {
            input.encode_utf16().flat_map(u16::to_le_bytes).collect()
        }
        Some(Utf16Modifier::Utf16be) => input.encode_utf16().flat_map(u16::to_be_bytes).collect(),
        Some(Utf16Modifier::Utf16) => [0xFF, 0xFE]
            .into_iter()
            .chain(input.encode_utf16().flat_map(u16::to_le_bytes))
            .collect(),
        None => input.as_bytes().to_vec(),
    }
}

/// Base64 encode without padding, dropping a trailing partial character so
/// the result stays a stable substring of any longer encoding.
pub(crate) fn encode_base64(input: &str, utf16: Option<Utf16Modifier>) -> String {
    let mut encoded = STANDARD_NO_PAD.encode(utf16_bytes(input, utf16));
    if matches!(encoded.len() % 4, 2 | 3) {
        encoded.pop();
    }
    encoded
}

/// The three encodings of `input` at byte offsets 0, 1 and 2 of a base64
/// block, with the characters influenced by the unknown prefix removed.
pub(crate) fn encode_base64_offset(input: &str, utf16: Option<Utf16Modifier>) -> Vec<String> {
    let char_width = if utf16.is_some() { 2 } else { 1 };
    let mut encoded = vec![];

    for shift in 0..3 {
        let mut padded = "\0".repeat(shift * char_width);
        padded.push_str(input);
        let mut output = encode_base64(&padded, utf16);

        let skip = match shift {
            0 => 0,
            1 => char_width * (1 + char_width),
            _ => 2 * char_width * (1 + char_width) - 1,
        };
        if output.len() > skip {
            output.drain(0..skip);
            encoded.push(output);
        }
    }

    encoded
}

/// Every variant of `input` where one flag's leading dash is swapped for
/// another windows dash character. Only whole space separated tokens equal
/// to the flag are rewritten. The original comes first.
pub(crate) fn windash_variations(input: &str) -> Vec<String> {
    let tokens: Vec<&str> = input.split(' ').collect();
    let flags: BTreeSet<&str> = tokens
        .iter()
        .copied()
        .filter(|token| token.starts_with(WINDASH_CHARS))
        .collect();

    let mut result = vec![input.to_string()];
    for flag in flags {
        let mut chars = flag.chars();
        let Some(first) = chars.next() else {
            continue;
        };
        let rest = chars.as_str();
        for dash in WINDASH_CHARS.iter().filter(|d| **d != first) {
            let replacement = format!("{}{}", dash, rest);
            let variant: Vec<&str> = tokens
                .iter()
                .map(|token| if *token == flag { replacement.as_str() } else { *token })
                .collect();
            result.push(variant.join(" "));
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base64_encoding() {
        assert_eq!(encode_base64("/bin/bash", None), "L2Jpbi9iYXNo");
        assert_eq!(encode_base64("/bin/sh", None), "L2Jpbi9za");
        assert_eq!(encode_base64("", None), "");
    }

    #[test]
    fn test_base64_utf16_variants() {
        // https://github.com/SigmaHQ/sigma-specification/blob/main/appendix/sigma-modifiers-appendix.md#encoding
        assert_eq!(encode_base64("cmd", Some(Utf16Modifier::Utf16le)), "YwBtAGQA");
        assert_eq!(encode_base64("cmd", Some(Utf16Modifier::Utf16be)), "AGMAbQBk");
        assert_eq!(encode_base64("cmd", Some(Utf16Modifier::Utf16)), "//5jAG0AZA");
        assert_eq!(encode_base64("cmd", Some(Utf16Modifier::Wide)), "YwBtAGQA");
        assert_eq!(encode_base64("ping", Some(Utf16Modifier::Utf16be)), "AHAAaQBuAG");
    }

    #[test]
    fn test_base64_offset() {
        assert_eq!(
            encode_base64_offset("/bin/bash", None),
            vec!["L2Jpbi9iYXNo", "9iaW4vYmFza", "vYmluL2Jhc2"]
        );
        assert_eq!(
            encode_base64_offset("/bin/sh", None),
            vec!["L2Jpbi9za", "9iaW4vc2", "vYmluL3No"]
        );
        assert_eq!(encode_base64_offset("1", None), vec!["M", "x"]);
        assert!(encode_base64_offset("", None).is_empty());
        assert!(encode_base64_offset("", Some(Utf16Modifier::Utf16le)).is_empty());
    }

    #[test]
    fn test_base64_offset_utf16le() {
        assert_eq!(
            encode_base64_offset("Add-MpPreference ", Some(Utf16Modifier::Utf16le)),
            vec![
                "QQBkAGQALQBNAHAAUAByAGUAZgBlAHIAZQBuAGMAZQAgA",
                "EAZABkAC0ATQBwAFAAcgBlAGYAZQByAGUAbgBjAGUAIA",
                "BAGQAZAAtAE0AcABQAHIAZQBmAGUAcgBlAG4AYwBlACAA",
            ]
        );
    }

    #[test]
    fn test_windash() {
        assert_eq!(
            windash_variations(" -param-name "),
            vec![
                " -param-name ",
                " /param-name ",
                " –param-name ",
                " —param-name ",
                " ―param-name ",
            ]
        );
        assert_eq!(windash_variations(" param-name "), vec![" param-name "]);
        assert_eq!(windash_variations(" -a /b").len(), 9);
    }

    #[test]
    fn test_windash_whole_flags_only() {
        let variations = windash_variations("-a -ab");
        assert_eq!(variations.len(), 9);
        assert!(variations.contains(&"/a -ab".to_string()));
        assert!(variations.contains(&"-a /ab".to_string()));
        assert!(!variations.contains(&"/a /ab".to_string()));

        // Repeated flags are all rewritten together
        let variations = windash_variations("-x foo -x");
        assert!(variations.contains(&"/x foo /x".to_string()));
    }
}
