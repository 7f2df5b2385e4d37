//! Built-in keyword list for derivative and hedging disclosures in 10-K filings
//!
//! Order is application order. Multi-word phrases precede the single words
//! they contain.

pub const DEFAULT_PATTERNS: &[&str] = &[
    r"\b\$[0-9,.]+(?:\s+\w+)*\s*(?:million|billion)\b",
    r"\b(?:billion|million)\b",
    "notional amounts outstanding",
    "notional amount",
    "hedging instrument",
    "derivative instrument",
    "derivative not designated",
    "derivatives not designated",
    "reclassified from aoci into income",
    "cash flow hedging",
    "swap contract",
    "forward contract",
    "fair value of derivative",
    "excluded from effectiveness testing",
    "net investment",
    "income on derivative",
    "interest rate swap",
    "financial instrument",
    "foreign exchange contract",
    "foreign exchange",
    "forward exchange contract",
    "forward exchange",
    "foreign currency",
    r"\bgain\b",
    r"\bloss\b",
    r"\boci\b",
    r"\baoci\b",
    "cash flow",
    "notional",
    "hedge",
    "derivative",
    "fair value",
];

/// Owned copy of the default list, for configuration defaults
pub fn default_patterns() -> Vec<String> {
    DEFAULT_PATTERNS.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::Pattern;

    #[test]
    fn test_default_patterns_all_compile() {
        for source in DEFAULT_PATTERNS {
            assert!(Pattern::new(source).is_ok(), "{}", source);
        }
    }
}
