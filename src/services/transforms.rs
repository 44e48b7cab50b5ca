//! Text transforms offered as built-in actions.

/// Collapse every run of whitespace to one space and trim both ends.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Capitalize the first character of each word and lowercase the rest.
///
/// Words are split on runs of whitespace and rejoined with single spaces.
pub fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

pub fn uppercase(text: &str) -> String {
    text.to_uppercase()
}

pub fn lowercase(text: &str) -> String {
    text.to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLES: &[&str] = &[
        "  hello   world  ",
        "hello world",
        "ALREADY LOUD",
        "mIxEd\tcase\n\nlines",
        "",
        "   ",
        "émile zola",
    ];

    #[test]
    fn test_normalize_whitespace_scenario() {
        assert_eq!(normalize_whitespace("  hello   world  "), "hello world");
        assert_eq!(normalize_whitespace("a\t\tb\r\nc"), "a b c");
    }

    #[test]
    fn test_title_case_scenario() {
        assert_eq!(title_case("hello world"), "Hello World");
        assert_eq!(title_case("hELLO   wORLD"), "Hello World");
        assert_eq!(title_case("émile zola"), "Émile Zola");
    }

    #[test]
    fn test_case_conversions() {
        assert_eq!(uppercase("Hello World"), "HELLO WORLD");
        assert_eq!(lowercase("Hello World"), "hello world");
    }

    #[test]
    fn test_transforms_are_idempotent() {
        for sample in SAMPLES {
            let once = normalize_whitespace(sample);
            assert_eq!(normalize_whitespace(&once), once, "normalize: {:?}", sample);

            let once = title_case(sample);
            assert_eq!(title_case(&once), once, "title: {:?}", sample);

            let once = uppercase(sample);
            assert_eq!(uppercase(&once), once, "upper: {:?}", sample);

            let once = lowercase(sample);
            assert_eq!(lowercase(&once), once, "lower: {:?}", sample);
        }
    }
}
