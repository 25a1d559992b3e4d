//! Liang-style hyphenation with TeX pattern files.
//!
//! A pattern file is a whitespace separated list of patterns such as
//! `.hy1p` or `4m1p`, optionally wrapped in `\patterns{...}`. An optional
//! `\hyphenation{...}` block lists exception words with explicit hyphens.
//! `%` starts a comment that runs to the end of the line.

use ets_node::{Disc, Node, NodeArena, NodeId};
use ets_types::LangRef;
use nom::character::complete::satisfy;
use nom::combinator::{all_consuming, opt};
use nom::multi::many1;
use nom::{IResult, Parser};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum HyphenationError {
    #[error("Failed to read pattern file '{path}': {message}")]
    Io { path: String, message: String },

    #[error("Malformed pattern '{pattern}' on line {line}")]
    Malformed { pattern: String, line: usize },

    #[error("Pattern file '{0}' contains no patterns")]
    Empty(String),
}

/// A hyphenation language loaded from a pattern file.
#[derive(Debug, Clone)]
pub struct Lang {
    pub name: String,
    pub left_hyphenmin: usize,
    pub right_hyphenmin: usize,
    patterns: HashMap<String, Vec<u8>>,
    exceptions: HashMap<String, Vec<usize>>,
    longest: usize,
}

fn is_digit(c: char) -> bool {
    c.is_ascii_digit()
}

fn digit_value(c: Option<char>) -> u8 {
    c.and_then(|c| c.to_digit(10)).map_or(0, |d| d as u8)
}

/// Splits one pattern into its letters and the inter-letter values.
fn parse_pattern(input: &str) -> IResult<&str, (String, Vec<u8>)> {
    let letter = satisfy(|c: char| !is_digit(c) && !c.is_whitespace());
    let (rest, (pairs, last)) = all_consuming((
        many1((opt(satisfy(is_digit)), letter)),
        opt(satisfy(is_digit)),
    ))
    .parse(input)?;

    let mut letters = String::with_capacity(pairs.len());
    let mut values = Vec::with_capacity(pairs.len() + 1);
    for (digit, letter) in pairs {
        values.push(digit_value(digit));
        letters.extend(letter.to_lowercase());
    }
    values.push(digit_value(last));
    Ok((rest, (letters, values)))
}

enum Section {
    Patterns,
    Exceptions,
}

impl Lang {
    pub fn load(path: impl AsRef<Path>, left_hyphenmin: usize, right_hyphenmin: usize) -> Result<Self, HyphenationError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| HyphenationError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .map(|s| s.trim_end_matches(".pat"))
            .unwrap_or("unknown");
        let lang = Self::parse(name, &text, left_hyphenmin, right_hyphenmin)?;
        if lang.patterns.is_empty() {
            return Err(HyphenationError::Empty(path.display().to_string()));
        }
        Ok(lang)
    }

    pub fn parse(name: &str, text: &str, left_hyphenmin: usize, right_hyphenmin: usize) -> Result<Self, HyphenationError> {
        let mut lang = Lang {
            name: name.to_string(),
            left_hyphenmin,
            right_hyphenmin,
            patterns: HashMap::new(),
            exceptions: HashMap::new(),
            longest: 0,
        };
        let mut section = Section::Patterns;
        for (lineno, line) in text.lines().enumerate() {
            let line = line.split('%').next().unwrap_or_default();
            for token in line.split_whitespace() {
                let token = if let Some(rest) = token.strip_prefix("\\patterns{") {
                    section = Section::Patterns;
                    rest
                } else if let Some(rest) = token.strip_prefix("\\hyphenation{") {
                    section = Section::Exceptions;
                    rest
                } else {
                    token
                };
                let token = token.trim_end_matches('}');
                if token.is_empty() {
                    continue;
                }
                match section {
                    Section::Patterns => {
                        let (_, (letters, values)) = parse_pattern(token).map_err(|_| HyphenationError::Malformed {
                            pattern: token.to_string(),
                            line: lineno + 1,
                        })?;
                        lang.longest = lang.longest.max(letters.chars().count());
                        lang.patterns.insert(letters, values);
                    }
                    Section::Exceptions => {
                        let mut word = String::new();
                        let mut points = Vec::new();
                        for c in token.chars() {
                            if c == '-' {
                                points.push(word.chars().count());
                            } else {
                                word.extend(c.to_lowercase());
                            }
                        }
                        lang.exceptions.insert(word, points);
                    }
                }
            }
        }
        log::debug!(
            "Language '{}': {} patterns, {} exceptions",
            lang.name,
            lang.patterns.len(),
            lang.exceptions.len()
        );
        Ok(lang)
    }

    pub fn pattern_count(&self) -> usize {
        self.patterns.len()
    }

    /// Character offsets in `word` before which a hyphen may go.
    pub fn hyphenation_points(&self, word: &str) -> Vec<usize> {
        let lower: String = word.chars().flat_map(char::to_lowercase).collect();
        let len = lower.chars().count();
        if len < self.left_hyphenmin + self.right_hyphenmin {
            return Vec::new();
        }
        let in_range = |p: &usize| *p >= self.left_hyphenmin && len - *p >= self.right_hyphenmin;

        if let Some(points) = self.exceptions.get(&lower) {
            return points.iter().copied().filter(in_range).collect();
        }

        let dotted: Vec<char> = std::iter::once('.').chain(lower.chars()).chain(std::iter::once('.')).collect();
        let n = dotted.len();
        let mut values = vec![0u8; n + 1];
        let mut key = String::new();
        for i in 0..n {
            key.clear();
            for j in i..n.min(i + self.longest) {
                key.push(dotted[j]);
                if let Some(pattern) = self.patterns.get(&key) {
                    for (k, &v) in pattern.iter().enumerate() {
                        values[i + k] = values[i + k].max(v);
                    }
                }
            }
        }
        // values[p + 1] sits between word characters p - 1 and p.
        (1..len).filter(|p| values[p + 1] % 2 == 1).filter(in_range).collect()
    }
}

/// Inserts a disc node at every hyphenation point of every word in the
/// list starting at `head`, descending into nested lists.
///
/// A word is a run of glyph nodes whose components are all letters. The
/// language starts as `default` and switches at each lang node whose
/// reference `resolve` knows. Returns the number of disc nodes inserted.
pub fn hyphenate_list<'a, F>(arena: &mut NodeArena, head: NodeId, default: Option<&'a Lang>, resolve: &F) -> usize
where
    F: Fn(LangRef) -> Option<&'a Lang>,
{
    let items: Vec<NodeId> = arena.iter(Some(head)).collect();
    let mut lang = default;
    let mut word: Vec<(NodeId, String)> = Vec::new();
    let mut inserted = 0;

    for id in items {
        let letters = match arena.node(id) {
            Node::Glyph(g) if !g.components.is_empty() && g.components.chars().all(char::is_alphabetic) => {
                Some(g.components.clone())
            }
            _ => None,
        };
        if let Some(text) = letters {
            word.push((id, text));
            continue;
        }
        inserted += hyphenate_word(arena, head, &word, lang);
        word.clear();

        match arena.node(id) {
            Node::Lang(l) => {
                if let Some(next) = l.lang.and_then(resolve) {
                    lang = Some(next);
                }
            }
            node => {
                if let Some(child) = node.list() {
                    inserted += hyphenate_list(arena, child, lang, resolve);
                }
            }
        }
    }
    inserted += hyphenate_word(arena, head, &word, lang);
    inserted
}

fn hyphenate_word(arena: &mut NodeArena, head: NodeId, word: &[(NodeId, String)], lang: Option<&Lang>) -> usize {
    let Some(lang) = lang else {
        return 0;
    };
    if word.len() < 2 {
        return 0;
    }
    let text: String = word.iter().map(|(_, s)| s.as_str()).collect();
    let points = lang.hyphenation_points(&text);
    if points.is_empty() {
        return 0;
    }

    let mut inserted = 0;
    let mut offset = 0;
    for (id, components) in word {
        // Ligatures cover several characters; only glyph boundaries can break.
        if offset > 0 && points.contains(&offset) {
            let disc = arena.alloc(Disc);
            arena.insert_before(Some(head), Some(*id), disc);
            inserted += 1;
        }
        offset += components.chars().count();
    }
    log::debug!("Hyphenated '{}' at {:?}", text, points);
    inserted
}

#[cfg(test)]
mod tests {
    use super::*;
    use ets_node::{Glyph, NodeKind};
    use std::io::Write;

    // A few of the patterns TeX's hyphen.tex uses for "hyphenation".
    const PATTERNS: &str = "% sample\n\\patterns{\n.hy3p he2n hena4 hen5at 1na n2at 1tio 2io o2n\n}\n\\hyphenation{ta-ble}\n";

    fn lang() -> Lang {
        Lang::parse("en", PATTERNS, 2, 3).unwrap()
    }

    #[test]
    fn test_parse_pattern() {
        let (_, (letters, values)) = parse_pattern("hen5at").unwrap();
        assert_eq!(letters, "henat");
        assert_eq!(values, vec![0, 0, 0, 5, 0, 0]);
        let (_, (letters, values)) = parse_pattern(".hy3p").unwrap();
        assert_eq!(letters, ".hyp");
        assert_eq!(values, vec![0, 0, 0, 3, 0]);
        assert!(parse_pattern("12").is_err());
    }

    #[test]
    fn test_hyphenation_points() {
        let lang = lang();
        assert_eq!(lang.pattern_count(), 9);
        // hy-phen-ation
        let points = lang.hyphenation_points("hyphenation");
        assert!(points.contains(&2));
        assert!(points.contains(&6));
        assert!(points.iter().all(|&p| p >= 2 && 11 - p >= 3));
        assert_eq!(lang.hyphenation_points("Table"), vec![2]);
        assert!(lang.hyphenation_points("on").is_empty());
    }

    #[test]
    fn test_malformed_pattern() {
        let err = Lang::parse("x", "ab\n1 2", 2, 2).unwrap_err();
        assert_eq!(
            err,
            HyphenationError::Malformed {
                pattern: "1".to_string(),
                line: 2
            }
        );
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hyph-en-us.pat.txt");
        std::fs::File::create(&path).unwrap().write_all(PATTERNS.as_bytes()).unwrap();
        let lang = Lang::load(&path, 2, 3).unwrap();
        assert_eq!(lang.name, "hyph-en-us");

        let empty = dir.path().join("empty.pat");
        std::fs::write(&empty, "% nothing\n").unwrap();
        assert!(matches!(Lang::load(&empty, 2, 3), Err(HyphenationError::Empty(_))));
        assert!(matches!(
            Lang::load(dir.path().join("missing.pat"), 2, 3),
            Err(HyphenationError::Io { .. })
        ));
    }

    #[test]
    fn test_hyphenate_list_inserts_discs() {
        let lang = lang();
        let mut arena = NodeArena::new();
        let mut head = None;
        let mut tail = None;
        for c in "table".chars() {
            let id = arena.alloc(Glyph {
                components: c.to_string(),
                ..Default::default()
            });
            head = Some(arena.insert_after(head, tail, id));
            tail = Some(id);
        }
        let head = head.unwrap();
        let count = hyphenate_list(&mut arena, head, Some(&lang), &|_| None);
        assert_eq!(count, 1);
        let kinds: Vec<_> = arena.iter(Some(head)).map(|id| arena.kind(id)).collect();
        assert_eq!(kinds[2], NodeKind::Disc);
        assert_eq!(kinds.len(), 6);
    }

    #[test]
    fn test_no_language_no_discs() {
        let mut arena = NodeArena::new();
        let id = arena.alloc(Glyph {
            components: "word".into(),
            ..Default::default()
        });
        assert_eq!(hyphenate_list(&mut arena, id, None, &|_| None), 0);
    }
}
