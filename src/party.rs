//! Party extraction from contract text.
//!
//! Three tiers, tried in order; the first that yields anything wins:
//!
//! 1. Structured "Party N" form fields (the 28E filing cover sheet)
//! 2. Narrative "entered into ... by and between A and B" clauses
//! 3. A generic "City/County of X" keyword sweep
//!
//! Candidates come back dirty; role resolution and final cleanup happen in
//! later stages.

use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

use crate::name::{ENTITY_KEYWORDS, is_valid_entity_name};

lazy_static! {
    static ref PARTY_HEADER: Regex = Regex::new(r"(?i)^Party\s+(\d+)\s*$").unwrap();
    static ref PARTY_LINE: Regex = Regex::new(r"(?i)^Party\s+\d+").unwrap();
    static ref NUMERIC_CODE: Regex = Regex::new(r"^\d+$").unwrap();
    static ref STATE_ABBREV: Regex = Regex::new(r"^[A-Z]{2,3}$").unwrap();
    static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
    // Narrative preamble phrasings, in priority order. Matches may span line
    // breaks; the terminator alternation stops the second capture at a
    // "(hereinafter" aside, a ", and the <Capitalized>" continuation, a
    // ". Whereas" recital, or end of text.
    static ref AGREEMENT_PATTERNS: Vec<Regex> = vec![
        Regex::new(
            r"(?is)This\s+agreement\s+is\s+entered\s+into\s+this\s+(?:\d{4}[,\s]+)?by\s+(?:and\s+)?between\s+(.+?)(?:,\s+and\s+|\s+and\s+)(.+?)(?:\(hereinafter|,\s+and\s+the\s+[A-Z]|\.\s+Whereas|\.\s*$)"
        )
        .unwrap(),
        Regex::new(
            r"(?is)This\s+agreement\s+is\s+made\s+(?:and\s+entered\s+into)?\s+(?:this\s+)?(?:\d{1,2}[a-z]{2}\s+day\s+of\s+)?(?:\w+\s+)?(?:\d{4}[,\s]+)?by\s+(?:and\s+)?between\s+(.+?)(?:,\s+and\s+|\s+and\s+)(.+?)(?:\(hereinafter|,\s+and\s+the\s+[A-Z]|\.\s+Whereas|\.\s*$)"
        )
        .unwrap(),
        Regex::new(
            r"(?is)This\s+agreement\s+\(?agreement\)?\s+is\s+made\s+(?:and\s+entered\s+into)?\s+(?:this\s+)?(?:\d{1,2}[a-z]{2}\s+day\s+of\s+)?(?:\w+\s+)?(?:\d{4}[,\s]+)?by\s+(?:and\s+)?between\s+(.+?)(?:,\s+and\s+|\s+and\s+)(.+?)(?:\(hereinafter|,\s+and\s+the\s+[A-Z]|\.\s+Whereas|\.\s*$)"
        )
        .unwrap(),
    ];
    static ref HEREINAFTER_ASIDE: Regex = Regex::new(r"(?i)\s*\(hereinafter[^)]*\)").unwrap();
    // OCR noise tokens framed by colons, e.g. ": Jon :" (case-sensitive so
    // "City of:" style text is left alone)
    static ref COLON_NOISE: Regex = Regex::new(r":\s*[A-Z][a-z]+\s*:").unwrap();
    static ref TRAILING_PUNCT: Regex = Regex::new(r"\s*[,;:]+\s*$").unwrap();
    static ref TRAILING_IOWA: Regex = Regex::new(r"(?i)\s*,\s*Iowa\s*$").unwrap();
    static ref ENTITY_OF: Regex =
        Regex::new(r"(?i)(?:City|County|Town|Village|Township)\s+of\s+[\w\s]+").unwrap();
}

/// Extract the two party names from contract text.
///
/// Returns `(party1, party2)` in document order; which one pays is decided
/// later by the relationship resolver. Partial pairs are possible, and
/// `(None, None)` means no tier found anything.
pub fn extract_parties(text: &str) -> (Option<String>, Option<String>) {
    if let Some(pair) = parties_from_form_fields(text) {
        debug!("parties extracted from structured form fields");
        return pair;
    }
    if let Some(pair) = parties_from_agreement_clause(text) {
        debug!("parties extracted from agreement preamble");
        return pair;
    }
    if let Some(pair) = parties_from_keyword_sweep(text) {
        debug!("parties extracted from keyword sweep");
        return pair;
    }
    (None, None)
}

/// Tier A: "Party 1" / "Party 2" declarations from the 28E cover sheet.
///
/// The party name sits on the line right after the header, except when that
/// line is just the organization type column (e.g. "City"), in which case it
/// is one line further down.
fn parties_from_form_fields(text: &str) -> Option<(Option<String>, Option<String>)> {
    let lines: Vec<&str> = text.split('\n').collect();
    let mut party1: Option<String> = None;
    let mut party2: Option<String> = None;

    for (i, line) in lines.iter().enumerate() {
        let caps = match PARTY_HEADER.captures(line.trim()) {
            Some(caps) => caps,
            None => continue,
        };
        let party_num: usize = match caps[1].parse() {
            Ok(n) => n,
            Err(_) => continue,
        };
        // Forms list up to five parties; only the first two are supported
        let slot = match party_num {
            1 => &mut party1,
            2 => &mut party2,
            _ => continue,
        };
        if slot.is_some() {
            continue; // first accepted name per index wins
        }

        for offset in [1usize, 2] {
            let Some(candidate) = lines.get(i + offset) else {
                break;
            };
            let candidate = candidate.trim();
            if candidate.is_empty()
                || candidate.chars().count() <= 2
                || PARTY_LINE.is_match(candidate)
                || ENTITY_KEYWORDS.contains(&candidate)
                || NUMERIC_CODE.is_match(candidate) // county codes
                || STATE_ABBREV.is_match(candidate)
            {
                continue;
            }
            let name = WHITESPACE.replace_all(candidate, " ").trim().to_string();
            if is_valid_entity_name(&name) {
                *slot = Some(name);
                break;
            }
        }
    }

    match (party1, party2) {
        (None, None) => None,
        pair => Some(pair),
    }
}

/// Tier B: "This agreement is entered into ... by and between A, and B".
fn parties_from_agreement_clause(text: &str) -> Option<(Option<String>, Option<String>)> {
    let caps = AGREEMENT_PATTERNS
        .iter()
        .find_map(|pattern| pattern.captures(text))?;

    let entity1 = clean_clause_span(&caps[1]);
    let entity2 = clean_clause_span(&caps[2]);

    if entity1.chars().count() > 3 && entity2.chars().count() > 3 {
        Some((Some(entity1), Some(entity2)))
    } else if entity1.chars().count() > 3 {
        Some((Some(entity1), None))
    } else {
        None
    }
}

fn clean_clause_span(raw: &str) -> String {
    let mut span = HEREINAFTER_ASIDE.replace_all(raw.trim(), "").trim().to_string();
    span = COLON_NOISE.replace_all(&span, " ").trim().to_string();
    span = TRAILING_PUNCT.replace_all(&span, "").trim().to_string();
    span = TRAILING_IOWA.replace_all(&span, "").trim().to_string();
    WHITESPACE.replace_all(&span, " ").trim().to_string()
}

/// Tier C: first two distinct "City/County/... of X" mentions.
fn parties_from_keyword_sweep(text: &str) -> Option<(Option<String>, Option<String>)> {
    let mut unique: Vec<String> = Vec::new();
    for m in ENTITY_OF.find_iter(text) {
        let candidate = m.as_str().to_string();
        if !unique.contains(&candidate) {
            unique.push(candidate);
        }
    }

    let mut entities = unique.into_iter();
    match (entities.next(), entities.next()) {
        (None, _) => None,
        pair => Some(pair),
    }
}
