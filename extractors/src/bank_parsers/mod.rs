//! C2 — Bank Parser Set. Each bank is a `BankParser` trait implementer owning
//! its own compiled pattern lists; there is no global mutable registry (§9
//! Design Notes) — a `ParserRegistry` is built once at service startup and
//! handed to the pipeline.

mod axis;
mod generic;
mod hdfc;
mod icici;
mod kotak;
mod sbi;

use crate::pattern_engine::{evaluate_pattern, TransactionPattern};
use chrono::{DateTime, Utc};
use shared_types::{Source, Transaction};

/// A candidate produced by one bank parser's pattern list, tagged with the
/// parser name so the orchestrator can report `parser_used`.
pub struct Candidate {
    pub transaction: Transaction,
    pub parser_name: &'static str,
}

pub trait BankParser: Send + Sync {
    fn name(&self) -> &'static str;
    fn can_handle(&self, sender: &str, content: &str) -> bool;
    fn patterns_for(&self, source: Source) -> &[TransactionPattern];
}

/// Constructed once at startup; owns every registered bank parser plus the
/// generic fallback. Never mutated after construction.
pub struct ParserRegistry {
    parsers: Vec<Box<dyn BankParser>>,
}

impl ParserRegistry {
    pub fn new() -> Self {
        Self {
            parsers: vec![
                Box::new(hdfc::HdfcParser::new()),
                Box::new(icici::IciciParser::new()),
                Box::new(sbi::SbiParser::new()),
                Box::new(axis::AxisParser::new()),
                Box::new(kotak::KotakParser::new()),
                Box::new(generic::GenericParser::new()),
            ],
        }
    }

    /// Evaluates every applicable parser's full pattern list against `content`
    /// and returns every match as a candidate (§4.2 evaluation contract).
    /// A regex error can't occur here (patterns are validated at construction
    /// time), so this never raises.
    pub fn collect_candidates(
        &self,
        sender: &str,
        content: &str,
        source: Source,
        date_hint: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Vec<Candidate> {
        let mut candidates = Vec::new();
        for parser in &self.parsers {
            if !parser.can_handle(sender, content) {
                continue;
            }
            for pattern in parser.patterns_for(source) {
                if let Some(transaction) = evaluate_pattern(pattern, content, content, date_hint, now) {
                    candidates.push(Candidate {
                        transaction,
                        parser_name: parser.name(),
                    });
                }
            }
        }
        candidates
    }
}

impl Default for ParserRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generic_parser_always_registered_as_fallback() {
        let registry = ParserRegistry::new();
        assert!(registry.parsers.iter().any(|p| p.name() == "Generic"));
    }
}
