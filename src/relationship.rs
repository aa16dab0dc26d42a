//! Payer/payee disambiguation.
//!
//! Given the two extracted parties and the full text, an ordered cascade of
//! rules decides which party is the principal (payer) and which is the agent
//! (payee). The first rule that fires wins; when nothing fires the original
//! extraction order stands, which is the usual 28E convention.
//!
//! Generic role phrasings ("The City shall pay the County") are checked
//! before specific name matching because party names recur in headers and
//! preambles where their position relative to "pay" is misleading.

use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

/// Window, in characters, around a payment verb within which a party mention
/// counts as part of the same clause. Empirically tuned against the corpus;
/// a tunable constant, not a semantic one.
const PAY_WINDOW: usize = 100;

const PAYMENT_VERB: &str = r"(?:shall|will|agrees?\s+to)\s+pay\s+(?:to\s+)?";

/// Coarse organizational classification inferred from a party name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityType {
    Sheriff,
    Township,
    Village,
    Town,
    District,
    City,
    County,
    Agency,
    Department,
}

// Scan order is fixed: "township" before "town", and "sheriff" first so that
// "Polk County Sheriff" classifies as sheriff rather than county.
const TYPE_KEYWORDS: [(&str, EntityType); 9] = [
    ("sheriff", EntityType::Sheriff),
    ("township", EntityType::Township),
    ("village", EntityType::Village),
    ("town", EntityType::Town),
    ("district", EntityType::District),
    ("city", EntityType::City),
    ("county", EntityType::County),
    ("agency", EntityType::Agency),
    ("department", EntityType::Department),
];

impl EntityType {
    /// Classify a party name by keyword containment; first match wins.
    pub fn detect(party: &str) -> Option<EntityType> {
        let lower = party.to_lowercase();
        TYPE_KEYWORDS
            .iter()
            .find(|(keyword, _)| lower.contains(keyword))
            .map(|(_, entity_type)| *entity_type)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Party1PaysParty2,
    Party2PaysParty1,
}

struct RuleInput<'a> {
    text_lower: &'a str,
    party1_lower: &'a str,
    party2_lower: &'a str,
}

// The cascade. First Some wins; every rule is a plain match-or-no-match and
// none may panic.
const RULES: [(&str, fn(&RuleInput) -> Option<Direction>); 5] = [
    ("generic entity types", rule_generic_types),
    ("direct named pair", rule_direct_pair),
    ("payment made to", rule_payment_made_to),
    ("responsible for payment", rule_responsible_for_payment),
    ("pay mention counts", rule_mention_counts),
];

lazy_static! {
    // (phrasing, payer type, payee type). These generic role phrasings are
    // the dominant wording in the corpus. No (?s): a phrasing must not span
    // lines, or it would stitch together unrelated clauses.
    static ref GENERIC_PAY_PATTERNS: Vec<(Regex, EntityType, EntityType)> = vec![
        (
            Regex::new(r"(?:the\s+)?city.*?(?:shall|will|agrees?\s+to)\s+pay.*?(?:to\s+)?(?:the\s+)?county")
                .unwrap(),
            EntityType::City,
            EntityType::County,
        ),
        (
            Regex::new(r"(?:the\s+)?county.*?(?:shall|will|agrees?\s+to)\s+pay.*?(?:to\s+)?(?:the\s+)?city")
                .unwrap(),
            EntityType::County,
            EntityType::City,
        ),
        (
            Regex::new(r"(?:the\s+)?city.*?(?:shall|will|agrees?\s+to)\s+pay.*?(?:to\s+)?(?:the\s+)?sheriff")
                .unwrap(),
            EntityType::City,
            EntityType::Sheriff,
        ),
        (
            Regex::new(r"(?:the\s+)?sheriff.*?(?:shall|will|agrees?\s+to)\s+pay.*?(?:to\s+)?(?:the\s+)?city")
                .unwrap(),
            EntityType::Sheriff,
            EntityType::City,
        ),
    ];
    // Loose article-based phrasing; captured spans are matched back onto the
    // parties by substring containment.
    static ref GENERIC_PAY_SCAN: Regex = Regex::new(
        r"(?:the\s+)?(\w+(?:\s+\w+)*?)\s+(?:shall|will|agrees?\s+to)\s+pay\s+(?:to\s+)?(?:the\s+)?(\w+(?:\s+\w+)*?)"
    )
    .unwrap();
    static ref PAYMENT_MADE_TO: Regex =
        Regex::new(r"payment.*?(?:shall be )?made.*?to.*?(?:the\s+)?(\w+(?:\s+\w+)*?)").unwrap();
    static ref RESPONSIBLE_FOR: Regex =
        Regex::new(r"(\w+(?:\s+\w+)*?)\s+shall be responsible for.*?payment").unwrap();
}

/// Determine which party is the payer (principal) and which the payee (agent).
///
/// If either party is absent the pair is returned unchanged; the resolver
/// never invents a party, it only reorders the two it is given.
pub fn resolve_payment<'a>(
    text: &str,
    party1: Option<&'a str>,
    party2: Option<&'a str>,
) -> (Option<&'a str>, Option<&'a str>) {
    let (Some(p1), Some(p2)) = (party1, party2) else {
        return (party1, party2);
    };

    let text_lower = text.to_lowercase();
    let party1_lower = p1.to_lowercase();
    let party2_lower = p2.to_lowercase();
    let input = RuleInput {
        text_lower: &text_lower,
        party1_lower: &party1_lower,
        party2_lower: &party2_lower,
    };

    for (label, rule) in RULES.iter() {
        if let Some(direction) = rule(&input) {
            debug!(rule = *label, "payment direction resolved");
            return match direction {
                Direction::Party1PaysParty2 => (Some(p1), Some(p2)),
                Direction::Party2PaysParty1 => (Some(p2), Some(p1)),
            };
        }
    }

    // No signal: original extraction order stands
    (Some(p1), Some(p2))
}

/// Bidirectional substring containment, the fuzzy-match device for
/// OCR-damaged text. "City of Ames" matches both "city of ames" and "city".
fn party_matches_text(party_lower: &str, text_lower: &str) -> bool {
    text_lower.contains(party_lower) || party_lower.contains(text_lower)
}

/// Rule 1: generic role phrasings mapped through the parties' entity types.
/// Only applies when both parties are typed and the types differ.
fn rule_generic_types(input: &RuleInput) -> Option<Direction> {
    let type1 = EntityType::detect(input.party1_lower)?;
    let type2 = EntityType::detect(input.party2_lower)?;
    if type1 == type2 {
        return None;
    }

    for (pattern, payer, payee) in GENERIC_PAY_PATTERNS.iter() {
        if pattern.is_match(input.text_lower) {
            if type1 == *payer && type2 == *payee {
                return Some(Direction::Party1PaysParty2);
            }
            if type2 == *payer && type1 == *payee {
                return Some(Direction::Party2PaysParty1);
            }
        }
    }
    None
}

/// Rule 2: "<X> shall pay <Y>" with both party names in the same clause.
///
/// The bounded window on each side of the payment verb keeps the match
/// inside one clause; unbounded gaps would let a party mention from the
/// cover sheet steal the payer slot. Party1-first is tested before
/// party2-first.
fn rule_direct_pair(input: &RuleInput) -> Option<Direction> {
    let forward = format!(
        "(?s){p1}.{{0,{w}}}?{verb}.{{0,{w}}}?{p2}",
        p1 = regex::escape(input.party1_lower),
        p2 = regex::escape(input.party2_lower),
        verb = PAYMENT_VERB,
        w = PAY_WINDOW,
    );
    if let Ok(pattern) = Regex::new(&forward) {
        if pattern.is_match(input.text_lower) {
            return Some(Direction::Party1PaysParty2);
        }
    }

    let reverse = format!(
        "(?s){p2}.{{0,{w}}}?{verb}.{{0,{w}}}?{p1}",
        p1 = regex::escape(input.party1_lower),
        p2 = regex::escape(input.party2_lower),
        verb = PAYMENT_VERB,
        w = PAY_WINDOW,
    );
    if let Ok(pattern) = Regex::new(&reverse) {
        if pattern.is_match(input.text_lower) {
            return Some(Direction::Party2PaysParty1);
        }
    }

    // Article-based phrasing ("The City shall pay the County") where the
    // captured spans only partially overlap the extracted names
    for caps in GENERIC_PAY_SCAN.captures_iter(input.text_lower) {
        let payer_text = caps[1].trim().to_string();
        let payee_text = caps[2].trim().to_string();

        if party_matches_text(input.party1_lower, &payer_text) {
            if party_matches_text(input.party2_lower, &payee_text) {
                return Some(Direction::Party1PaysParty2);
            }
        } else if party_matches_text(input.party2_lower, &payer_text)
            && party_matches_text(input.party1_lower, &payee_text)
        {
            return Some(Direction::Party2PaysParty1);
        }
    }

    None
}

/// Rule 3: "payment shall be made to <Y>" marks Y as the payee.
fn rule_payment_made_to(input: &RuleInput) -> Option<Direction> {
    for caps in PAYMENT_MADE_TO.captures_iter(input.text_lower) {
        let payee_text = &caps[1];
        if party_matches_text(input.party1_lower, payee_text) {
            return Some(Direction::Party2PaysParty1);
        } else if party_matches_text(input.party2_lower, payee_text) {
            return Some(Direction::Party1PaysParty2);
        }
    }
    None
}

/// Rule 4: "<X> shall be responsible for ... payment" marks X as the payer.
fn rule_responsible_for_payment(input: &RuleInput) -> Option<Direction> {
    for caps in RESPONSIBLE_FOR.captures_iter(input.text_lower) {
        let payer_text = &caps[1];
        if party_matches_text(input.party1_lower, payer_text) {
            return Some(Direction::Party1PaysParty2);
        } else if party_matches_text(input.party2_lower, payer_text) {
            return Some(Direction::Party2PaysParty1);
        }
    }
    None
}

/// Rule 5: the party mentioned more often near "pay" is likely the payer.
/// Ties fall through to the default ordering.
fn rule_mention_counts(input: &RuleInput) -> Option<Direction> {
    let count1 = pay_mentions(input.text_lower, input.party1_lower);
    let count2 = pay_mentions(input.text_lower, input.party2_lower);
    if count1 > count2 {
        Some(Direction::Party1PaysParty2)
    } else if count2 > count1 {
        Some(Direction::Party2PaysParty1)
    } else {
        None
    }
}

fn pay_mentions(text_lower: &str, party_lower: &str) -> usize {
    let pattern = format!(
        "{party}.{{0,{w}}}pay",
        party = regex::escape(party_lower),
        w = PAY_WINDOW,
    );
    Regex::new(&pattern)
        .map(|re| re.find_iter(text_lower).count())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve<'a>(
        text: &str,
        party1: &'a str,
        party2: &'a str,
    ) -> (Option<&'a str>, Option<&'a str>) {
        resolve_payment(text, Some(party1), Some(party2))
    }

    #[test]
    fn entity_type_scan_order() {
        assert_eq!(EntityType::detect("Polk County Sheriff"), Some(EntityType::Sheriff));
        assert_eq!(EntityType::detect("Grant Township"), Some(EntityType::Township));
        assert_eq!(EntityType::detect("City of Ames"), Some(EntityType::City));
        assert_eq!(EntityType::detect("Story County"), Some(EntityType::County));
        assert_eq!(EntityType::detect("Lake View"), None);
    }

    #[test]
    fn absent_party_returns_input_unchanged() {
        let text = "Some contract text";
        assert_eq!(
            resolve_payment(text, None, Some("City of Des Moines")),
            (None, Some("City of Des Moines"))
        );
        assert_eq!(
            resolve_payment(text, Some("City of Des Moines"), None),
            (Some("City of Des Moines"), None)
        );
        assert_eq!(resolve_payment(text, None, None), (None, None));
    }

    #[test]
    fn generic_city_pays_county() {
        let text = "This agreement states that The City shall pay the County for services rendered.";
        assert_eq!(
            resolve(text, "City of Des Moines", "Polk County"),
            (Some("City of Des Moines"), Some("Polk County"))
        );
    }

    #[test]
    fn generic_county_pays_city() {
        let text = "The County agrees to pay the City a monthly fee.";
        assert_eq!(
            resolve(text, "City of Des Moines", "Polk County"),
            (Some("Polk County"), Some("City of Des Moines"))
        );
    }

    #[test]
    fn generic_phrasing_beats_listed_order() {
        // County is listed first on the form, but the City pays
        let text = "The City shall pay to the County an annual sum for services.";
        assert_eq!(
            resolve(text, "Chickasaw County", "City of Lawler"),
            (Some("City of Lawler"), Some("Chickasaw County"))
        );
    }

    #[test]
    fn generic_county_pays_city_reversed_listing() {
        let text = "The County shall pay the City for facility usage.";
        assert_eq!(
            resolve(text, "Chickasaw County", "City of Lawler"),
            (Some("Chickasaw County"), Some("City of Lawler"))
        );
    }

    #[test]
    fn generic_city_pays_sheriff() {
        let text = "The City will pay the Sheriff for law enforcement services.";
        assert_eq!(
            resolve(text, "City of Des Moines", "Polk County Sheriff"),
            (Some("City of Des Moines"), Some("Polk County Sheriff"))
        );
    }

    #[test]
    fn generic_sheriff_pays_city() {
        let text = "The Sheriff agrees to pay the City for facility usage.";
        assert_eq!(
            resolve(text, "City of Des Moines", "Polk County Sheriff"),
            (Some("Polk County Sheriff"), Some("City of Des Moines"))
        );
    }

    #[test]
    fn direct_pair_forward() {
        let text = "Wall Lake shall pay Lake View for the services provided.";
        assert_eq!(
            resolve(text, "Wall Lake", "Lake View"),
            (Some("Wall Lake"), Some("Lake View"))
        );
    }

    #[test]
    fn direct_pair_reverse() {
        let text = "Lake View shall pay Wall Lake for the services provided.";
        assert_eq!(
            resolve(text, "Wall Lake", "Lake View"),
            (Some("Lake View"), Some("Wall Lake"))
        );
    }

    #[test]
    fn direct_pair_agrees_to_pay() {
        let text = "City of Ames agrees to pay Story County for services.";
        assert_eq!(
            resolve(text, "City of Ames", "Story County"),
            (Some("City of Ames"), Some("Story County"))
        );
    }

    #[test]
    fn direct_pair_clause_content_beats_listed_order() {
        let text = "b. Payment: WALL LAKE shall pay LAKE VIEW the sum of $3,935 per month.";
        assert_eq!(
            resolve(text, "Lake View", "Wall Lake"),
            (Some("Wall Lake"), Some("Lake View"))
        );
    }

    #[test]
    fn direct_pair_spans_line_breaks() {
        let text = "This agreement states that\nCity of Ames\nshall pay\nStory County\nfor services rendered.";
        assert_eq!(
            resolve(text, "City of Ames", "Story County"),
            (Some("City of Ames"), Some("Story County"))
        );
    }

    #[test]
    fn bounded_window_ignores_early_mentions() {
        // Replicates the layout of a filed amendment: both party names recur
        // in the header and recitals long before the payment clause. Only the
        // clause itself may decide the direction.
        let text = "Secretary of State\n\
            Agreement\n\
            M506822\n\
            State of Iowa\n\
            Party 1\n\
            Lake View\n\
            City\n\
            Sac\n\
            Party 2\n\
            Wall Lake\n\
            City\n\
            Sac\n\
            The City of Lake View provides police coverage to the City of Wall Lake. \
            This amendment extends the term of the agreement by two years.\n\
            WHEREAS, the City of Lake View and the City of Wall Lake desire to amend the \
            Law Enforcement Services Contract which was entered into on February 21, 2005; and\n\
            WHEREAS, the City of Lake View and the City of Wall Lake desire to amend the \
            contract by deleting Section 3b and replacing it with the following:\n\
            b. Payment: WALL LAKE shall pay LAKE VIEW the sum of $3,935 per\n";
        assert_eq!(
            resolve(text, "Lake View", "Wall Lake"),
            (Some("Wall Lake"), Some("Lake View"))
        );
    }

    #[test]
    fn bounded_window_ignores_mentions_after_clause() {
        let text = "Party 1\n\
            Lake View\n\
            a municipal corporation\n\
            Party 2\n\
            Wall Lake\n\
            a municipal corporation\n\
            WHEREAS, Lake View and Wall Lake desire to enter into this agreement...\n\
            NOW THEREFORE, the parties agree as follows:\n\
            Section 7. Payment.\n\
            b. Payment: WALL LAKE shall pay LAKE VIEW the sum of $3,935 per month.\n\
            Additional terms may require Lake View to provide services to Wall Lake.\n";
        assert_eq!(
            resolve(text, "Lake View", "Wall Lake"),
            (Some("Wall Lake"), Some("Lake View"))
        );
    }

    #[test]
    fn payment_made_to_marks_payee() {
        let text = "Payment shall be made to City of Ames on a monthly basis.";
        assert_eq!(
            resolve(text, "City of Ames", "Story County"),
            (Some("Story County"), Some("City of Ames"))
        );

        let text = "Payment shall be made to Story County on a monthly basis.";
        assert_eq!(
            resolve(text, "City of Ames", "Story County"),
            (Some("City of Ames"), Some("Story County"))
        );
    }

    #[test]
    fn responsible_for_payment_marks_payer() {
        let text = "City of Ames shall be responsible for the payment of fees.";
        assert_eq!(
            resolve(text, "City of Ames", "Story County"),
            (Some("City of Ames"), Some("Story County"))
        );

        let text = "Story County shall be responsible for the payment of fees.";
        assert_eq!(
            resolve(text, "City of Ames", "Story County"),
            (Some("Story County"), Some("City of Ames"))
        );
    }

    #[test]
    fn unmatched_responsibility_falls_back_to_default() {
        // "IWD" never matches the full party name by containment, so the
        // cascade runs out and the original order stands.
        let text = "IWD shall be responsible for the payment of the Director's salary.";
        assert_eq!(
            resolve(text, "Iowa Workforce Development", "Hawkeye Community College"),
            (
                Some("Iowa Workforce Development"),
                Some("Hawkeye Community College")
            )
        );
    }

    #[test]
    fn resolution_is_case_insensitive() {
        let text = "CITY OF AMES SHALL PAY STORY COUNTY FOR SERVICES.";
        assert_eq!(
            resolve(text, "City of Ames", "Story County"),
            (Some("City of Ames"), Some("Story County"))
        );
    }

    #[test]
    fn same_entity_type_uses_direct_names() {
        let text = "City of Ames shall pay City of Des Moines for services.";
        assert_eq!(
            resolve(text, "City of Ames", "City of Des Moines"),
            (Some("City of Ames"), Some("City of Des Moines"))
        );
    }

    #[test]
    fn untyped_parties_use_direct_names() {
        let text = "Iowa Workforce Development shall pay MATURA Action Corporation.";
        assert_eq!(
            resolve(text, "Iowa Workforce Development", "MATURA Action Corporation"),
            (
                Some("Iowa Workforce Development"),
                Some("MATURA Action Corporation")
            )
        );
    }

    #[test]
    fn optional_to_after_pay() {
        let without_to = "The City shall pay the County for services.";
        let with_to = "The City shall pay to the County for services.";
        let expected = (Some("City of Ames"), Some("Story County"));
        assert_eq!(resolve(without_to, "City of Ames", "Story County"), expected);
        assert_eq!(resolve(with_to, "City of Ames", "Story County"), expected);
    }

    #[test]
    fn no_signal_preserves_original_order() {
        let text = "This is a contract between two parties with no payment information.";
        assert_eq!(
            resolve(text, "City of Ames", "Story County"),
            (Some("City of Ames"), Some("Story County"))
        );
    }
}
