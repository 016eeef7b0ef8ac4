//! Simultaneous text substitution.

/// A set of `from → to` replacements applied in a single left-to-right pass.
///
/// At each position the longest matching pattern wins and replaced text is
/// never rescanned, so swapping `A → B` and `B → A` works.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Substitution {
    pairs: Vec<(String, String)>,
}

impl Substitution {
    /// Build from pairs; empty and identity patterns are dropped.
    pub fn new<F, T>(pairs: impl IntoIterator<Item = (F, T)>) -> Self
    where
        F: Into<String>,
        T: Into<String>,
    {
        let mut pairs: Vec<(String, String)> = pairs
            .into_iter()
            .map(|(f, t)| (f.into(), t.into()))
            .filter(|(f, t)| !f.is_empty() && f != t)
            .collect();
        pairs.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
        Self { pairs }
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn apply(&self, text: &str) -> String {
        if self.pairs.is_empty() {
            return text.to_string();
        }
        let mut out = String::with_capacity(text.len());
        let mut rest = text;
        'scan: while let Some(c) = rest.chars().next() {
            for (from, to) in &self.pairs {
                if let Some(tail) = rest.strip_prefix(from.as_str()) {
                    out.push_str(to);
                    rest = tail;
                    continue 'scan;
                }
            }
            out.push(c);
            rest = &rest[c.len_utf8()..];
        }
        out
    }
}
