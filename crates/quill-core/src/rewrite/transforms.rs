//! Named transforms applied to captured substrings before substitution.

use std::fmt;

/// A transform operation attached to a regex capture group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformOp {
    /// Uppercase the first character, lowercase the rest.
    Capitalize,
    Upper,
    Lower,
    /// Trim leading and trailing whitespace.
    Strip,
    /// Uppercase the first character of every word, lowercase the rest.
    Title,
}

impl TransformOp {
    pub fn apply(&self, input: &str) -> String {
        match self {
            TransformOp::Capitalize => capitalize(input),
            TransformOp::Upper => input.to_uppercase(),
            TransformOp::Lower => input.to_lowercase(),
            TransformOp::Strip => input.trim().to_string(),
            TransformOp::Title => input
                .split_inclusive(char::is_whitespace)
                .map(capitalize)
                .collect(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransformOp::Capitalize => "capitalize",
            TransformOp::Upper => "upper",
            TransformOp::Lower => "lower",
            TransformOp::Strip => "strip",
            TransformOp::Title => "title",
        }
    }
}

fn capitalize(input: &str) -> String {
    let mut chars = input.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
        None => String::new(),
    }
}

impl fmt::Display for TransformOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for TransformOp {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "capitalize" => Ok(TransformOp::Capitalize),
            "upper" => Ok(TransformOp::Upper),
            "lower" => Ok(TransformOp::Lower),
            "strip" => Ok(TransformOp::Strip),
            "title" => Ok(TransformOp::Title),
            _ => Err(format!(
                "Unknown transform: {}. Available: capitalize, upper, lower, strip, title",
                s
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capitalize_lowers_the_rest() {
        assert_eq!(TransformOp::Capitalize.apply("hELLO"), "Hello");
    }

    #[test]
    fn test_title_covers_every_word() {
        assert_eq!(TransformOp::Title.apply("hello wide WORLD"), "Hello Wide World");
    }

    #[test]
    fn test_strip_trims_whitespace() {
        assert_eq!(TransformOp::Strip.apply("  padded  "), "padded");
    }

    #[test]
    fn test_chain_applies_in_order() {
        // upper then capitalize is not the same as capitalize then upper
        let chained = TransformOp::Capitalize.apply(&TransformOp::Upper.apply("ab cd"));
        assert_eq!(chained, "Ab cd");
        let reversed = TransformOp::Upper.apply(&TransformOp::Capitalize.apply("ab cd"));
        assert_eq!(reversed, "AB CD");
    }
}
