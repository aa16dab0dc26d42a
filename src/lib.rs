//! Party and payment extraction for Iowa 28E intergovernmental agreements.
//!
//! Input is noisy OCR text of filed agreements; output is, per contract, the
//! two contracting parties ordered as principal (payer) and agent (payee)
//! plus the annual payment amount. The pipeline is a fixed sequence of pure
//! stages:
//!
//! 1. [`preprocess`] fixes corpus-specific OCR misspellings
//! 2. [`extract_parties`] pulls the two party names (form fields, preamble,
//!    or keyword sweep)
//! 3. [`resolve_payment`] decides who pays whom
//! 4. [`extract_amount`] finds the annual dollar figure
//! 5. [`clean_entity_name`] / [`is_valid_entity_name`] scrub the final names
//!
//! All regexes are compiled once at first use. Stages never fail; absent
//! information comes back as empty strings or `0.0`.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub mod amount;
pub mod name;
pub mod party;
pub mod preprocess;
pub mod relationship;

pub use amount::extract_amount;
pub use name::{clean_entity_name, is_valid_entity_name};
pub use party::extract_parties;
pub use preprocess::preprocess;
pub use relationship::{EntityType, resolve_payment};

/// One contract as it arrives from the digitized corpus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractRecord {
    pub contract_id: String,
    pub text: String,
}

/// Extraction result for one contract. Empty strings mean the field could
/// not be extracted; `0.0` means no payment amount was found.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputRecord {
    pub contract_id: String,
    pub principal: String,
    pub agent: String,
    pub annual_amount: f64,
}

/// Run the full extraction pipeline on a single contract.
pub fn parse_contract(contract_id: &str, raw_text: &str) -> OutputRecord {
    if raw_text.trim().is_empty() {
        return OutputRecord {
            contract_id: contract_id.to_string(),
            principal: String::new(),
            agent: String::new(),
            annual_amount: 0.0,
        };
    }

    let text = preprocess(raw_text);
    let (party1, party2) = extract_parties(&text);
    let (principal, agent) = resolve_payment(&text, party1.as_deref(), party2.as_deref());
    let annual_amount = extract_amount(&text);

    let principal = finalize_name(principal);
    let agent = finalize_name(agent);
    debug!(
        contract_id,
        %principal,
        %agent,
        annual_amount,
        "contract parsed"
    );

    OutputRecord {
        contract_id: contract_id.to_string(),
        principal,
        agent,
        annual_amount,
    }
}

/// Parse a batch of contracts in parallel. Output order matches input order.
pub fn parse_batch(records: &[ContractRecord]) -> Vec<OutputRecord> {
    records
        .par_iter()
        .map(|record| parse_contract(&record.contract_id, &record.text))
        .collect()
}

/// Final scrub of a resolved party name: flatten line breaks left over from
/// the form layout, clean, and blank the name if what remains is invalid.
fn finalize_name(raw: Option<&str>) -> String {
    let Some(raw) = raw else {
        return String::new();
    };
    let flattened = raw.replace(['\n', '\r'], " ");
    let cleaned = clean_entity_name(&flattened);
    if is_valid_entity_name(&cleaned) {
        cleaned
    } else {
        String::new()
    }
}
