//! Type line classification.

/// Supertypes recognized in the main segment of a type line.
pub const SUPERTYPES: &[&str] = &["Legendary", "Basic", "Snow", "World", "Ongoing"];

/// Card types recognized in the main segment of a type line.
pub const CARD_TYPES: &[&str] = &[
    "Creature",
    "Artifact",
    "Enchantment",
    "Instant",
    "Sorcery",
    "Planeswalker",
    "Land",
    "Battle",
    "Tribal",
    "Kindred",
];

const SUBTYPE_SEPARATOR: char = '—';
const FACE_SEPARATOR: &str = " // ";

/// Classification tokens parsed from a type line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeLine {
    pub supertypes: Vec<String>,
    pub types: Vec<String>,
    pub subtypes: Vec<String>,
}

impl TypeLine {
    pub fn supertypes_joined(&self) -> String {
        self.supertypes.join(",")
    }

    pub fn types_joined(&self) -> String {
        self.types.join(",")
    }

    pub fn subtypes_joined(&self) -> String {
        self.subtypes.join(",")
    }

    fn push_unique(list: &mut Vec<String>, token: &str) {
        if !list.iter().any(|t| t == token) {
            list.push(token.to_string());
        }
    }
}

/// Parse a type line such as `"Legendary Creature — Human Wizard"`.
///
/// The main segment (before the em dash) is matched word by word against
/// [`SUPERTYPES`] and [`CARD_TYPES`]; words in neither list are dropped.
/// Everything after the em dash is taken as subtypes. Multi-faced type lines
/// (`"A — B // C — D"`) are parsed per face and merged in order.
pub fn parse_type_line(type_line: Option<&str>) -> TypeLine {
    let mut parsed = TypeLine::default();
    let Some(type_line) = type_line else {
        return parsed;
    };

    for face in type_line.split(FACE_SEPARATOR) {
        let mut segments = face.splitn(2, SUBTYPE_SEPARATOR);
        let main = segments.next().unwrap_or_default();
        let sub = segments.next().unwrap_or_default();

        for word in main.split_whitespace() {
            if SUPERTYPES.contains(&word) {
                TypeLine::push_unique(&mut parsed.supertypes, word);
            } else if CARD_TYPES.contains(&word) {
                TypeLine::push_unique(&mut parsed.types, word);
            }
        }

        for word in sub.split_whitespace() {
            TypeLine::push_unique(&mut parsed.subtypes, word);
        }
    }

    parsed
}
