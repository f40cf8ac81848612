//! Structural and factual checks on generated answers.
//!
//! A passing answer either is the exact canonical refusal, or cites only
//! evidence chunks and states only numbers/dates that appear in the cited
//! text. `[calc: expr = value]` claims are re-evaluated arithmetically.

use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

use regex::Regex;

use scholar_core::constants::REFUSAL_ANSWER;
use scholar_core::models::{Chunk, VerificationReport};

fn source_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\[source:\s*([A-Za-z0-9_\-:, ]+)\]").expect("source regex"))
}

fn calc_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\[calc:([^\]]+)\]").expect("calc regex"))
}

fn number_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b\d+\b").expect("number regex"))
}

fn date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d{4}-\d{2}-\d{2}").expect("date regex"))
}

/// Verifies one answer against a fixed evidence set.
pub struct Verifier {
    evidence_ids: HashSet<String>,
    text_by_id: HashMap<String, String>,
}

impl Verifier {
    /// Evidence ids are normalized (trim + lowercase) for tolerant
    /// citation matching; texts are lowercased for claim lookup.
    pub fn new(evidence: &[Chunk]) -> Self {
        let mut evidence_ids = HashSet::new();
        let mut text_by_id = HashMap::new();
        for chunk in evidence {
            let id = chunk.chunk_id.trim().to_lowercase();
            text_by_id.insert(id.clone(), chunk.text.to_lowercase());
            evidence_ids.insert(id);
        }
        Verifier {
            evidence_ids,
            text_by_id,
        }
    }

    pub fn verify(&self, output: &str) -> VerificationReport {
        let out = output.trim();
        if out.is_empty() {
            let mut report = VerificationReport::default();
            report.fail("No output from model");
            return report;
        }

        if out == REFUSAL_ANSWER {
            return VerificationReport::refusal();
        }

        let mut report = VerificationReport::passed();

        // Citations: at least one, all within evidence.
        let mut cited: Vec<String> = Vec::new();
        for captures in source_re().captures_iter(out) {
            for part in captures[1].split(',') {
                let id = part.trim();
                if !id.is_empty() && !cited.iter().any(|c| c == id) {
                    cited.push(id.to_string());
                }
            }
        }
        report.cited_chunk_ids = cited.clone();

        if cited.is_empty() {
            report.fail(
                "No source citation found in output. Every factual sentence must end with [source: CHUNK_ID].",
            );
            return report;
        }
        for id in &cited {
            if !self.evidence_ids.contains(&id.trim().to_lowercase()) {
                report.fail(format!("Cited chunk id not present in evidence: {id}"));
            }
        }
        if !report.ok {
            return report;
        }

        // Numeric/date claims must appear in at least one cited chunk.
        let mut tokens: Vec<&str> = number_re().find_iter(out).map(|m| m.as_str()).collect();
        tokens.extend(date_re().find_iter(out).map(|m| m.as_str()));
        for token in tokens {
            let token_lower = token.to_lowercase();
            let found = cited.iter().any(|id| {
                self.text_by_id
                    .get(&id.trim().to_lowercase())
                    .is_some_and(|text| text.contains(&token_lower))
            });
            if !found {
                report.fail(format!("Claim token '{token}' not found in cited chunks."));
            }
        }
        if !report.ok {
            return report;
        }

        // Calc claims: re-evaluate the left side.
        for captures in calc_re().captures_iter(out) {
            let expr = captures[1].trim().to_string();
            let Some((left, right)) = expr.split_once('=') else {
                report.fail(format!("Invalid calc format: {expr}"));
                break;
            };
            let declared: f64 = match right.trim().parse() {
                Ok(v) => v,
                Err(e) => {
                    report.fail(format!("Calc parse error: {expr} -> {e}"));
                    break;
                }
            };
            match eval_arithmetic(left) {
                Ok(value) if (value - declared).abs() <= 1e-6 => {}
                Ok(value) => {
                    report.fail(format!(
                        "Calc mismatch: {expr} evaluated to {value} but expected {declared}"
                    ));
                    break;
                }
                Err(e) => {
                    report.fail(format!("Calc parse error: {expr} -> {e}"));
                    break;
                }
            }
        }

        report
    }
}

/// Evaluate `+ - * /`, unary signs, parentheses, decimal literals.
pub fn eval_arithmetic(expr: &str) -> Result<f64, String> {
    let stripped: String = expr.chars().filter(|c| !c.is_whitespace()).collect();
    let mut parser = ExprParser {
        chars: stripped.chars().collect(),
        pos: 0,
    };
    let value = parser.parse_add_sub()?;
    if parser.pos != parser.chars.len() {
        return Err(format!(
            "unexpected input at offset {}: {}",
            parser.pos,
            parser.chars[parser.pos..].iter().collect::<String>()
        ));
    }
    Ok(value)
}

/// Small recursive-descent arithmetic parser.
struct ExprParser {
    chars: Vec<char>,
    pos: usize,
}

impl ExprParser {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn parse_add_sub(&mut self) -> Result<f64, String> {
        let mut value = self.parse_mul_div()?;
        while let Some(c) = self.peek() {
            match c {
                '+' => {
                    self.pos += 1;
                    value += self.parse_mul_div()?;
                }
                '-' => {
                    self.pos += 1;
                    value -= self.parse_mul_div()?;
                }
                _ => break,
            }
        }
        Ok(value)
    }

    fn parse_mul_div(&mut self) -> Result<f64, String> {
        let mut value = self.parse_unary()?;
        while let Some(c) = self.peek() {
            match c {
                '*' => {
                    self.pos += 1;
                    value *= self.parse_unary()?;
                }
                '/' => {
                    self.pos += 1;
                    value /= self.parse_unary()?;
                }
                _ => break,
            }
        }
        Ok(value)
    }

    fn parse_unary(&mut self) -> Result<f64, String> {
        match self.peek() {
            Some('+') => {
                self.pos += 1;
                self.parse_unary()
            }
            Some('-') => {
                self.pos += 1;
                Ok(-self.parse_unary()?)
            }
            _ => self.parse_primary(),
        }
    }

    fn parse_primary(&mut self) -> Result<f64, String> {
        if self.peek() == Some('(') {
            self.pos += 1;
            let value = self.parse_add_sub()?;
            if self.peek() != Some(')') {
                return Err("missing )".to_string());
            }
            self.pos += 1;
            return Ok(value);
        }
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_ascii_digit() || c == '.') {
            self.pos += 1;
        }
        if start == self.pos {
            return Err(format!("number expected at offset {start}"));
        }
        let literal: String = self.chars[start..self.pos].iter().collect();
        literal.parse().map_err(|e| format!("bad literal: {e}"))
    }
}
