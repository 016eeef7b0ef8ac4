//! Identifier mining for rung text.
//!
//! Rung logic is a chain of `MNEMONIC(arg,arg,...)` calls. Only the call
//! structure is looked at: mnemonics become instruction candidates and
//! arguments become tag candidates. Nothing is validated.

const MNEMONIC_PUNCTUATION: &[char] = &[',', '"', '\'', '?', ':', '[', ']'];
const OPERAND_PUNCTUATION: &[char] = &[',', '"', '\'', '?', ':'];

/// Instruction mnemonics in order of first appearance, without duplicates.
pub fn instructions(text: &str) -> Vec<String> {
    let mut found: Vec<String> = Vec::new();
    for fragment in text.split(')') {
        let head = match fragment.find('(') {
            Some(open) => &fragment[..open],
            None => fragment,
        };
        let mnemonic: String = head.chars().filter(|c| !MNEMONIC_PUNCTUATION.contains(c)).collect();
        let mnemonic = mnemonic.trim();
        if !mnemonic.is_empty() && !found.iter().any(|m| m == mnemonic) {
            found.push(mnemonic.to_string());
        }
    }
    found
}

/// Candidate tag names in order of first appearance, without duplicates.
///
/// Member access (`Pump.Run`) and index suffixes (`Table[3]`) reduce to the
/// base name; numeric literals and quoted or punctuated tokens are skipped.
pub fn operands(text: &str) -> Vec<String> {
    let mut found: Vec<String> = Vec::new();
    for fragment in text.split(')') {
        let Some(open) = fragment.find('(') else {
            continue;
        };
        for argument in fragment[open + 1..].split(',') {
            let token = argument.split('.').next().unwrap_or_default().trim();
            if token.is_empty() || token.contains(OPERAND_PUNCTUATION) || is_numeric(token) {
                continue;
            }
            let token = match token.find('[') {
                Some(bracket) => token[..bracket].trim(),
                None => token,
            };
            if !token.is_empty() && !found.iter().any(|t| t == token) {
                found.push(token.to_string());
            }
        }
    }
    found
}

/// Numeric literal: a digit after an optional sign. Names like `inf` or
/// `NaN` are tag candidates.
fn is_numeric(token: &str) -> bool {
    let unsigned = token.strip_prefix(|c| c == '+' || c == '-').unwrap_or(token);
    unsigned.starts_with(|c: char| c.is_ascii_digit())
        && (token.parse::<i64>().is_ok() || token.parse::<f64>().is_ok())
}
