//! Entity name cleanup and validation.
//!
//! Extracted party names arrive polluted: trailing clauses, OCR punctuation,
//! boilerplate form labels, shouting case. Cleaning trims a single name down
//! to the organization it denotes; validation rejects what is left when it is
//! clearly not a party name. Validation always runs after cleaning so that
//! rejection sees the final form.

use lazy_static::lazy_static;
use regex::Regex;

/// Organization type keywords as they appear in 28E form columns.
pub(crate) const ENTITY_KEYWORDS: [&str; 16] = [
    "County",
    "City",
    "State",
    "Agency",
    "Department",
    "District",
    "Board",
    "Commission",
    "Authority",
    "Corporation",
    "College",
    "University",
    "School",
    "Township",
    "Village",
    "Municipality",
];

// Words that should end an entity name. Table order decides which stopword
// applies when several occur, not their position in the name.
const ENTITY_STOPWORDS: [&str; 19] = [
    "and",
    "whereas",
    "ss",
    "the",
    "that",
    "this",
    "said",
    "agree",
    "enter",
    "contract",
    "between",
    "wishes",
    "wish",
    "provides",
    "provide",
    "shall",
    "will",
    "herein",
    "hereinafter",
];

lazy_static! {
    // A name containing a verb is a sentence fragment, not an entity name;
    // keep only the leading entity portion.
    static ref SENTENCE_PATTERNS: Vec<Regex> = vec![
        Regex::new(r"(?i)^(.+?)\s+(?:is|are|was|were|will|shall|has|have)\s+").unwrap(),
        Regex::new(r"(?i)^(.+?)\s+(?:established|organized|incorporated|created)\s+").unwrap(),
        Regex::new(r"(?i)^(.+?)\s+(?:wishes?|wish)\s+(?:to|for)").unwrap(),
        Regex::new(r"(?i)^(.+?)\s+(?:provides?|provide)\s+(?:for|to)").unwrap(),
    ];
    static ref HEREINAFTER_ASIDE: Regex =
        Regex::new(r"(?i)\s*\(?hereinafter[^)]*\)?\s*").unwrap();
    static ref HEREINAFTER_TAIL: Regex = Regex::new(r"(?i)\s+hereinafter.*$").unwrap();
    static ref TO_AS_TAIL: Regex = Regex::new(r"(?i)\s+to as\s*$").unwrap();
    static ref STOPWORD_PATTERNS: Vec<Regex> = ENTITY_STOPWORDS
        .iter()
        .map(|word| Regex::new(&format!(r"\b{word}\b")).unwrap())
        .collect();
    static ref TRAILING_PUNCT: Regex = Regex::new(r"\s*[,;:]?\s*$").unwrap();
    static ref TRAILING_SS: Regex = Regex::new(r"(?i)\bss\s*$").unwrap();
    static ref STATE_OF_IOWA_SUFFIX: Regex = Regex::new(r"(?i)\s+State of Iowa$").unwrap();
    static ref OFFICE_SUFFIX: Regex =
        Regex::new(r"(?i)\s+(?:Office of|Department of)\s*$").unwrap();
    static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
    // Last-resort re-extraction for overlong names
    static ref ENTITY_PREFIX: Regex = Regex::new(
        r"(?i)^(?:City|County|Town|Village|Township|Agency|Department|District)\s+of\s+[\w\s]+"
    )
    .unwrap();
    // Boilerplate form labels and other junk that survives extraction
    static ref INVALID_NAME_PATTERNS: Vec<Regex> = vec![
        Regex::new(r"^county of each participant").unwrap(),
        Regex::new(r"^each participant").unwrap(),
        Regex::new(r"^participant to").unwrap(),
        Regex::new(r"^full legal name").unwrap(),
        Regex::new(r"^organization type").unwrap(),
        Regex::new(r"^party \d+").unwrap(),
        Regex::new(r"hereinafter.*to as$").unwrap(),
        Regex::new(r"^to as").unwrap(),
        Regex::new(r"^\s*(and|or|the|a|an)\s*$").unwrap(),
    ];
}

/// Clean up an entity name by removing pollution and standardizing format.
pub fn clean_entity_name(name: &str) -> String {
    if name.is_empty() {
        return String::new();
    }

    let mut name = name.trim().to_string();

    for pattern in SENTENCE_PATTERNS.iter() {
        if let Some(caps) = pattern.captures(&name) {
            name = caps[1].trim().to_string();
            break;
        }
    }

    // "(hereinafter referred to as ...)" clauses and their broken remnants
    name = HEREINAFTER_ASIDE.replace_all(&name, " ").trim().to_string();
    name = HEREINAFTER_TAIL.replace_all(&name, "").trim().to_string();
    name = TO_AS_TAIL.replace_all(&name, "").trim().to_string();

    // Truncate at the first stopword, keeping only the text before it.
    // ASCII lowercasing keeps byte offsets aligned with the original.
    let name_lower = name.to_ascii_lowercase();
    for pattern in STOPWORD_PATTERNS.iter() {
        if let Some(m) = pattern.find(&name_lower) {
            name.truncate(m.start());
            name = name.trim().to_string();
            break;
        }
    }

    name = TRAILING_PUNCT.replace_all(&name, "").into_owned();
    name = TRAILING_SS.replace_all(&name, "").trim().to_string();
    name = STATE_OF_IOWA_SUFFIX.replace_all(&name, "").into_owned();
    name = OFFICE_SUFFIX.replace_all(&name, "").into_owned();

    // Retitle uniformly-cased names (e.g. "CITY OF ELDORA"), keeping the
    // connective words lowercase.
    if is_uniform_case(&name) {
        name = name
            .split_whitespace()
            .map(|word| {
                let lower = word.to_lowercase();
                if matches!(lower.as_str(), "of" | "and" | "the") {
                    lower
                } else {
                    capitalize(word)
                }
            })
            .collect::<Vec<_>>()
            .join(" ");
    }

    name = WHITESPACE.replace_all(name.trim(), " ").trim().to_string();

    // Over 80 chars means the extraction grabbed too much; fall back to a
    // bare "<Type> of <words>" prefix if one exists.
    if name.chars().count() > 80 {
        if let Some(m) = ENTITY_PREFIX.find(&name) {
            name = m.as_str().to_string();
        }
    }

    name
}

/// Validate that an entity name is reasonable and not clearly invalid.
pub fn is_valid_entity_name(name: &str) -> bool {
    let trimmed = name.trim();
    if trimmed.chars().count() < 3 {
        return false;
    }

    let name_lower = name.to_lowercase();
    for pattern in INVALID_NAME_PATTERNS.iter() {
        if pattern.is_match(&name_lower) {
            return false;
        }
    }

    // A bare organization type keyword is not a party name
    if ENTITY_KEYWORDS
        .iter()
        .any(|keyword| keyword.eq_ignore_ascii_case(trimmed))
    {
        return false;
    }

    true
}

fn is_uniform_case(name: &str) -> bool {
    let has_cased = name.chars().any(char::is_alphabetic);
    if !has_cased {
        return false;
    }
    let any_upper = name.chars().any(char::is_uppercase);
    let any_lower = name.chars().any(char::is_lowercase);
    any_upper != any_lower
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncates_sentence_fragments() {
        assert_eq!(
            clean_entity_name("City of Ames is a municipal corporation"),
            "City of Ames"
        );
        assert_eq!(
            clean_entity_name("Story County wishes to provide services"),
            "Story County"
        );
    }

    #[test]
    fn strips_hereinafter_clauses() {
        assert_eq!(
            clean_entity_name("Story County (hereinafter referred to as the County)"),
            "Story County"
        );
        assert_eq!(
            clean_entity_name("City of Ames hereinafter referred"),
            "City of Ames"
        );
    }

    #[test]
    fn truncates_at_stopwords() {
        assert_eq!(
            clean_entity_name("Polk County and the City of Des Moines"),
            "Polk County"
        );
        assert_eq!(clean_entity_name("Polk County, ss"), "Polk County");
        assert_eq!(
            clean_entity_name("City of Nevada whereas the parties"),
            "City of Nevada"
        );
    }

    #[test]
    fn strips_redundant_suffixes() {
        assert_eq!(clean_entity_name("Polk County,"), "Polk County");
        assert_eq!(
            clean_entity_name("City of Eldora State of Iowa"),
            "City of Eldora"
        );
    }

    #[test]
    fn retitles_uniform_case_names() {
        assert_eq!(clean_entity_name("CITY OF ELDORA"), "City of Eldora");
        assert_eq!(clean_entity_name("polk county"), "Polk County");
        // Mixed case is preserved as-is
        assert_eq!(clean_entity_name("McCallsburg"), "McCallsburg");
    }

    #[test]
    fn overlong_names_fall_back_to_entity_prefix() {
        let noise = "City of Ames acting jointly per Iowa Code chapter 28E, \
                     for purposes of operating joint law enforcement dispatch \
                     operations across member jurisdictions";
        assert_eq!(
            clean_entity_name(noise),
            "City of Ames acting jointly per Iowa Code chapter 28E"
        );
    }

    #[test]
    fn rejects_boilerplate_labels() {
        assert!(!is_valid_entity_name("Full Legal Name"));
        assert!(!is_valid_entity_name("Organization Type"));
        assert!(!is_valid_entity_name("Party 1"));
        assert!(!is_valid_entity_name("and"));
    }

    #[test]
    fn rejects_bare_entity_keywords() {
        assert!(!is_valid_entity_name("City"));
        assert!(!is_valid_entity_name("county"));
        assert!(!is_valid_entity_name("CORPORATION"));
    }

    #[test]
    fn rejects_short_names() {
        assert!(!is_valid_entity_name(""));
        assert!(!is_valid_entity_name("ss"));
        assert!(!is_valid_entity_name("  a "));
    }

    #[test]
    fn accepts_real_party_names() {
        assert!(is_valid_entity_name("Polk County"));
        assert!(is_valid_entity_name("City of Ames"));
        assert!(is_valid_entity_name("Iowa Workforce Development"));
    }
}
