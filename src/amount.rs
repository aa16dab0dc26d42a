//! Payment amount extraction.
//!
//! Two families of evidence compete: explicit dollar figures, scored by the
//! vocabulary around them, and unit rates (per capita, per month, per hour)
//! multiplied out to an annual total. Rate-derived totals outrank explicit
//! figures that sit next to rate language, because the figure next to "per
//! month" is the installment, not the contract value.

use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

/// Characters of context inspected on each side of an explicit figure.
const CONTEXT_RADIUS: usize = 100;
/// Wider window for locating a population count near a per-capita rate.
const POPULATION_RADIUS: usize = 500;
/// Window for locating an hours cap near an hourly rate.
const HOURS_RADIUS: usize = 200;

lazy_static! {
    static ref AMOUNT_PATTERNS: Vec<Regex> = vec![
        Regex::new(r"(?i)\$\s*(?P<amount>[\d,]+\.?\d*)").unwrap(),
        Regex::new(r"(?i)(?P<amount>[\d,]+\.?\d*)\s+dollars?").unwrap(),
        Regex::new(r"(?i)sum of \$\s*(?P<amount>[\d,]+\.?\d*)").unwrap(),
        Regex::new(r"(?i)amount of \$\s*(?P<amount>[\d,]+\.?\d*)").unwrap(),
        Regex::new(r"(?i)total sum[:\s]+\$\s*(?P<amount>[\d,]+\.?\d*)").unwrap(),
    ];
    static ref PER_CAPITA: Regex =
        Regex::new(r"\$\s*(?P<rate>[\d,]+\.?\d*)\s+per\s+[Cc]apita").unwrap();
    static ref PER_MONTH: Regex =
        Regex::new(r"\$\s*(?P<rate>[\d,]+\.?\d*)\s+per\s+[Mm]onth").unwrap();
    static ref PER_HOUR: Regex =
        Regex::new(r"\$\s*(?P<rate>[\d,]+\.?\d*)\s+per\s+[Hh]our").unwrap();
    static ref POPULATION_PATTERNS: Vec<Regex> = vec![
        Regex::new(r"(?i)(?:census|population)[:\s]+(?P<count>[\d,]+)").unwrap(),
        Regex::new(r"(?i)(?P<count>[\d,]+)\s+(?:census|population)").unwrap(),
    ];
    static ref HOURS_PATTERN: Regex =
        Regex::new(r"(?i)(?P<count>[\d,]+)\s+hours?").unwrap();
}

/// Extract the annual payment amount from contract text.
///
/// Candidates are ranked by `(priority, value)`; when nothing qualifies the
/// result is `0.0`, which downstream treats as "no amount found".
pub fn extract_amount(text: &str) -> f64 {
    let mut candidates: Vec<(f64, i32)> = Vec::new();

    for pattern in AMOUNT_PATTERNS.iter() {
        for caps in pattern.captures_iter(text) {
            let value = clean_amount(&caps["amount"]);
            if value <= 0.0 {
                continue;
            }
            let Some(whole) = caps.get(0) else { continue };
            let context =
                context_slice(text, whole.start(), whole.end(), CONTEXT_RADIUS).to_lowercase();
            candidates.push((value, score_context(&context)));
        }
    }

    for m in PER_CAPITA.captures_iter(text) {
        let rate = clean_amount(&m["rate"]);
        if rate <= 0.0 {
            continue;
        }
        let Some(whole) = m.get(0) else { continue };
        let context = context_slice(text, whole.start(), whole.end(), POPULATION_RADIUS);
        // Implausible populations are OCR noise or unrelated figures
        if let Some(population) =
            find_count(&POPULATION_PATTERNS, context, |p| p > 50.0 && p < 100_000.0)
        {
            candidates.push((rate * population, 2));
        }
    }

    for m in PER_MONTH.captures_iter(text) {
        let rate = clean_amount(&m["rate"]);
        if rate > 0.0 {
            candidates.push((rate * 12.0, 1));
        }
    }

    for m in PER_HOUR.captures_iter(text) {
        let rate = clean_amount(&m["rate"]);
        if rate <= 0.0 {
            continue;
        }
        let Some(whole) = m.get(0) else { continue };
        let context = context_slice(text, whole.start(), whole.end(), HOURS_RADIUS);
        if let Some(hours) = find_count(std::slice::from_ref(&*HOURS_PATTERN), context, |h| {
            h > 0.0 && h < 10_000.0
        }) {
            candidates.push((rate * hours, 1));
        }
    }

    let selected = candidates
        .into_iter()
        .max_by(|a, b| a.1.cmp(&b.1).then(a.0.total_cmp(&b.0)));
    match selected {
        Some((value, priority)) => {
            debug!(value, priority, "payment amount selected");
            value
        }
        None => 0.0,
    }
}

/// Parse a captured figure, dropping thousands separators. Unparseable
/// captures come back as `0.0` and are discarded by the caller.
fn clean_amount(raw: &str) -> f64 {
    raw.replace(',', "").trim().parse::<f64>().unwrap_or(0.0)
}

fn score_context(context: &str) -> i32 {
    let mut score = 0;
    if context.contains("total") {
        score += 3;
    }
    if context.contains("annual") || context.contains("yearly") {
        score += 2;
    }
    if context.contains("sum") {
        score += 2;
    }
    if context.contains("contract") {
        score += 1;
    }
    if context.contains("per capita")
        || context.contains("per hour")
        || context.contains("per month")
    {
        score -= 2;
    }
    score
}

/// First plausible count across the patterns, in table order. A pattern that
/// matches an implausible figure does not shadow a later pattern's match.
fn find_count(patterns: &[Regex], context: &str, plausible: impl Fn(f64) -> bool) -> Option<f64> {
    patterns
        .iter()
        .filter_map(|pattern| pattern.captures(context))
        .map(|caps| clean_amount(&caps["count"]))
        .find(|count| plausible(*count))
}

/// Slice `radius` characters of context around a match, clamped to char
/// boundaries so multibyte text cannot split a code point.
fn context_slice(text: &str, start: usize, end: usize, radius: usize) -> &str {
    let mut lo = start.saturating_sub(radius);
    while lo > 0 && !text.is_char_boundary(lo) {
        lo -= 1;
    }
    let mut hi = (end + radius).min(text.len());
    while hi < text.len() && !text.is_char_boundary(hi) {
        hi += 1;
    }
    &text[lo..hi]
}
