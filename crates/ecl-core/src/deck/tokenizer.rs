#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawToken {
    Word(String),
    Quoted(String),
    /// Record terminator. Nothing after it on the same line is kept.
    Slash,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeckTokenLine {
    pub source_line: usize,
    /// The line starts in column 1 with a letter.
    pub starts_at_margin: bool,
    pub tokens: Vec<RawToken>,
}

impl DeckTokenLine {
    /// Keyword name when the line is shaped like a keyword line.
    pub fn keyword_candidate(&self) -> Option<String> {
        if !self.starts_at_margin {
            return None;
        }
        match self.tokens.first() {
            Some(RawToken::Word(word)) => normalize_keyword_token(word),
            _ => None,
        }
    }
}

pub fn tokenize_deck(source: &str) -> Vec<DeckTokenLine> {
    source
        .lines()
        .enumerate()
        .filter_map(|(index, line)| tokenize_line(index + 1, line))
        .collect()
}

fn tokenize_line(source_line: usize, line: &str) -> Option<DeckTokenLine> {
    let mut tokens = Vec::new();
    let mut word = String::new();
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '\'' | '"' => {
                flush_word(&mut word, &mut tokens);
                let mut quoted = String::new();
                for inner in chars.by_ref() {
                    if inner == ch {
                        break;
                    }
                    quoted.push(inner);
                }
                tokens.push(RawToken::Quoted(quoted));
            }
            '-' if chars.peek() == Some(&'-') => break,
            '/' => {
                flush_word(&mut word, &mut tokens);
                tokens.push(RawToken::Slash);
                break;
            }
            ch if ch.is_whitespace() => flush_word(&mut word, &mut tokens),
            ch => word.push(ch),
        }
    }
    flush_word(&mut word, &mut tokens);

    if tokens.is_empty() {
        return None;
    }
    Some(DeckTokenLine {
        source_line,
        starts_at_margin: line.starts_with(|ch: char| ch.is_ascii_alphabetic()),
        tokens,
    })
}

fn flush_word(word: &mut String, tokens: &mut Vec<RawToken>) {
    if !word.is_empty() {
        tokens.push(RawToken::Word(std::mem::take(word)));
    }
}

pub fn normalize_keyword_token(token: &str) -> Option<String> {
    is_valid_keyword(token).then(|| token.to_ascii_uppercase())
}

fn is_valid_keyword(keyword: &str) -> bool {
    if keyword.len() > 8 {
        return false;
    }
    let mut chars = keyword.chars();
    match chars.next() {
        Some(ch) if ch.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '_' | '+' | '-'))
}

/// Value slots after expanding `n*value` and `n*` repeat syntax. `None` marks
/// a defaulted slot.
pub fn expand_repeats(tokens: &[RawToken]) -> Result<Vec<Option<String>>, String> {
    let mut slots = Vec::new();
    for token in tokens {
        match token {
            RawToken::Quoted(value) => slots.push(Some(value.clone())),
            RawToken::Word(word) => match split_repeat(word) {
                Some((count, value)) => {
                    let count = count?;
                    for _ in 0..count {
                        slots.push(value.map(ToOwned::to_owned));
                    }
                }
                None => slots.push(Some(word.clone())),
            },
            RawToken::Slash => break,
        }
    }
    Ok(slots)
}

type RepeatSplit<'a> = (Result<usize, String>, Option<&'a str>);

fn split_repeat(word: &str) -> Option<RepeatSplit<'_>> {
    if word == "*" {
        return Some((Ok(1), None));
    }
    let (count, value) = word.split_once('*')?;
    if count.is_empty() || !count.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }
    let count = count
        .parse::<usize>()
        .map_err(|error| format!("invalid repeat count in '{word}': {error}"));
    let value = (!value.is_empty()).then_some(value);
    Some((count, value))
}
