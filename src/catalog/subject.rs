use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// What a training photo set depicts. Drives the trigger word and `is_style`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SubjectType {
    Man,
    Woman,
    Product,
    Style,
    Object,
    Font,
    Animal,
    Food,
}

impl SubjectType {
    pub const ALL: [SubjectType; 8] = [
        SubjectType::Man,
        SubjectType::Woman,
        SubjectType::Product,
        SubjectType::Style,
        SubjectType::Object,
        SubjectType::Font,
        SubjectType::Animal,
        SubjectType::Food,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SubjectType::Man => "Man",
            SubjectType::Woman => "Woman",
            SubjectType::Product => "Product",
            SubjectType::Style => "Style",
            SubjectType::Object => "Object",
            SubjectType::Font => "Font",
            SubjectType::Animal => "Animal",
            SubjectType::Food => "Food",
        }
    }

    pub fn is_style(self) -> bool {
        self == SubjectType::Style
    }
}

impl fmt::Display for SubjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownSubjectType(pub String);

impl fmt::Display for UnknownSubjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown subject type '{}'", self.0)
    }
}

impl std::error::Error for UnknownSubjectType {}

impl FromStr for SubjectType {
    type Err = UnknownSubjectType;

    /// Accepts the English labels and the Polish form labels, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let subject = match s.trim().to_lowercase().as_str() {
            "man" | "mężczyzna" => SubjectType::Man,
            "woman" | "kobieta" => SubjectType::Woman,
            "product" | "produkt" => SubjectType::Product,
            "style" | "styl" => SubjectType::Style,
            "object" | "obiekt" => SubjectType::Object,
            "font" | "czcionka" => SubjectType::Font,
            "animal" | "zwierzę" | "zwierze" => SubjectType::Animal,
            "food" | "jedzenie" => SubjectType::Food,
            _ => return Err(UnknownSubjectType(s.to_string())),
        };
        Ok(subject)
    }
}
