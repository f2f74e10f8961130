//! Instruction builder
//!
//! Maps the selected [`BackgroundOption`] onto the natural-language
//! instruction sent to the remote transformer. One fixed template per
//! variant; call sites never edit the returned text.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Instruction for [`BackgroundOption::Original`]
const ORIGINAL_TEMPLATE: &str = "Enhance this photo so it looks like a professional, \
high-quality shot. Keep the original background, but polish it and apply a slight blur \
so the subject stands out. Improve lighting, sharpness and color balance, and raise the \
overall perceived quality without changing the subject itself.";

/// Instruction for [`BackgroundOption::White`]
const WHITE_TEMPLATE: &str = "Enhance this photo so it looks like a professional studio \
shot. Replace the background entirely with a plain, pure white backdrop that is evenly \
and softly lit, with no visible edges or gradients. Keep the subject unchanged, improve \
lighting, sharpness and color balance, and let it rest naturally on the white background.";

/// Background treatment chosen by the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackgroundOption {
    /// Keep and polish the existing background
    Original,
    /// Replace the background with plain, softly lit white
    #[default]
    White,
}

impl BackgroundOption {
    /// All variants, in display order
    pub const ALL: [BackgroundOption; 2] = [BackgroundOption::Original, BackgroundOption::White];

    /// Stable lowercase identifier (config files, CLI flags)
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Original => "original",
            Self::White => "white",
        }
    }

    /// Short label for display layers
    pub fn label(&self) -> &'static str {
        match self {
            Self::Original => "Original background",
            Self::White => "White background",
        }
    }
}

impl fmt::Display for BackgroundOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackgroundOption {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("original") {
            Ok(Self::Original)
        } else if s.eq_ignore_ascii_case("white") {
            Ok(Self::White)
        } else {
            Err(format!(
                "Unknown background option: '{}'. Available: original, white",
                s
            ))
        }
    }
}

/// Build the transformer instruction for `option`
pub fn build_instruction(option: BackgroundOption) -> &'static str {
    match option {
        BackgroundOption::Original => ORIGINAL_TEMPLATE,
        BackgroundOption::White => WHITE_TEMPLATE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_white() {
        assert_eq!(BackgroundOption::default(), BackgroundOption::White);
    }

    #[test]
    fn test_instruction_is_stable() {
        for option in BackgroundOption::ALL {
            assert_eq!(build_instruction(option), build_instruction(option));
        }
    }

    #[test]
    fn test_variants_yield_distinct_instructions() {
        assert_ne!(
            build_instruction(BackgroundOption::Original),
            build_instruction(BackgroundOption::White)
        );
    }

    #[test]
    fn test_original_keeps_background() {
        let text = build_instruction(BackgroundOption::Original);
        assert!(text.contains("Keep the original background"));
        assert!(text.contains("slight blur"));
    }

    #[test]
    fn test_white_replaces_background() {
        let text = build_instruction(BackgroundOption::White);
        assert!(text.contains("pure white backdrop"));
        assert!(text.contains("softly lit"));
    }

    #[test]
    fn test_from_str_roundtrips_display() {
        for option in BackgroundOption::ALL {
            assert_eq!(option.to_string().parse::<BackgroundOption>(), Ok(option));
        }
        assert_eq!("WHITE".parse(), Ok(BackgroundOption::White));
        assert!("blue".parse::<BackgroundOption>().is_err());
    }

    #[test]
    fn test_serde_uses_lowercase() {
        let json = serde_json::to_string(&BackgroundOption::Original).unwrap();
        assert_eq!(json, "\"original\"");
        let parsed: BackgroundOption = serde_json::from_str("\"white\"").unwrap();
        assert_eq!(parsed, BackgroundOption::White);
    }
}
