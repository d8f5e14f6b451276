use super::{EclData, EclFileError, EclFileResult, EclKeyword, EclType};
use std::fmt::Write as _;

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Quoted(String),
    Bare(String),
}

fn tokenize(source: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut chars = source.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch.is_whitespace() {
            continue;
        }
        if ch == '\'' {
            let mut value = String::new();
            for inner in chars.by_ref() {
                if inner == '\'' {
                    break;
                }
                value.push(inner);
            }
            tokens.push(Token::Quoted(value));
            continue;
        }
        let mut value = String::from(ch);
        while let Some(next) = chars.peek() {
            if next.is_whitespace() || *next == '\'' {
                break;
            }
            value.push(*next);
            chars.next();
        }
        tokens.push(Token::Bare(value));
    }
    tokens
}

pub(super) fn read_keywords(source: &str) -> EclFileResult<Vec<EclKeyword>> {
    let mut tokens = tokenize(source).into_iter();
    let mut keywords = Vec::new();

    while let Some(first) = tokens.next() {
        let name = match first {
            Token::Quoted(name) => name.trim_end().to_string(),
            Token::Bare(value) => {
                return Err(EclFileError::InvalidValue {
                    keyword: "<header>".to_string(),
                    value,
                });
            }
        };
        let truncated = || EclFileError::Truncated {
            context: name.clone(),
        };
        let count = match tokens.next().ok_or_else(truncated)? {
            Token::Bare(value) => value.parse::<usize>().map_err(|_| EclFileError::InvalidValue {
                keyword: name.clone(),
                value,
            })?,
            Token::Quoted(value) => {
                return Err(EclFileError::InvalidValue {
                    keyword: name.clone(),
                    value,
                });
            }
        };
        let tag = match tokens.next().ok_or_else(truncated)? {
            Token::Quoted(tag) | Token::Bare(tag) => tag,
        };
        let ecl_type = EclType::from_tag(&tag)?;
        let count = if ecl_type == EclType::Mess { 0 } else { count };

        let mut values = Vec::with_capacity(count);
        for _ in 0..count {
            let Some(token) = tokens.next() else {
                return Err(EclFileError::CountMismatch {
                    keyword: name,
                    declared: count,
                    found: values.len(),
                });
            };
            values.push(token);
        }
        let data = decode(ecl_type, &name, values)?;
        keywords.push(EclKeyword { name, data });
    }

    Ok(keywords)
}

fn decode(ecl_type: EclType, keyword: &str, values: Vec<Token>) -> EclFileResult<EclData> {
    let invalid = |value: &str| EclFileError::InvalidValue {
        keyword: keyword.to_string(),
        value: value.to_string(),
    };
    let bare = |token: Token| match token {
        Token::Bare(value) => Ok(value),
        Token::Quoted(value) => Err(invalid(&value)),
    };

    let data = match ecl_type {
        EclType::Inte => EclData::Int(
            values
                .into_iter()
                .map(|token| {
                    let value = bare(token)?;
                    value.parse::<i32>().map_err(|_| invalid(&value))
                })
                .collect::<EclFileResult<_>>()?,
        ),
        EclType::Real => EclData::Real(
            values
                .into_iter()
                .map(|token| {
                    let value = bare(token)?;
                    parse_float(&value).map(|parsed| parsed as f32).ok_or_else(|| invalid(&value))
                })
                .collect::<EclFileResult<_>>()?,
        ),
        EclType::Doub => EclData::Double(
            values
                .into_iter()
                .map(|token| {
                    let value = bare(token)?;
                    parse_float(&value).ok_or_else(|| invalid(&value))
                })
                .collect::<EclFileResult<_>>()?,
        ),
        EclType::Logi => EclData::Logical(
            values
                .into_iter()
                .map(|token| {
                    let value = bare(token)?;
                    match value.as_str() {
                        "T" | "t" => Ok(true),
                        "F" | "f" => Ok(false),
                        _ => Err(invalid(&value)),
                    }
                })
                .collect::<EclFileResult<_>>()?,
        ),
        EclType::Char => EclData::Char(
            values
                .into_iter()
                .map(|token| match token {
                    Token::Quoted(value) => Ok(value.trim_end().to_string()),
                    Token::Bare(value) => Err(invalid(&value)),
                })
                .collect::<EclFileResult<_>>()?,
        ),
        EclType::Mess => EclData::Message,
    };
    Ok(data)
}

fn parse_float(value: &str) -> Option<f64> {
    value
        .parse::<f64>()
        .ok()
        .or_else(|| value.replace(['D', 'd'], "E").parse::<f64>().ok())
}

/// `1.23E4` style output rewritten to the two-digit signed exponent form.
fn scientific(value: f64, precision: usize, marker: char) -> String {
    let rendered = format!("{value:.precision$E}");
    let Some((mantissa, exponent)) = rendered.split_once('E') else {
        return rendered;
    };
    let (sign, digits) = match exponent.strip_prefix('-') {
        Some(digits) => ('-', digits),
        None => ('+', exponent),
    };
    format!("{mantissa}{marker}{sign}{digits:0>2}")
}

pub(super) fn write_keywords(keywords: &[EclKeyword]) -> EclFileResult<String> {
    let mut out = String::new();
    for keyword in keywords {
        if keyword.name.len() > 8 {
            return Err(EclFileError::NameTooLong(keyword.name.clone()));
        }
        let ecl_type = keyword.data.ecl_type();
        let _ = writeln!(
            out,
            " '{:<8}' {:>11} '{}'",
            keyword.name,
            keyword.data.len(),
            ecl_type.tag()
        );

        let (cells, per_line): (Vec<String>, usize) = match &keyword.data {
            EclData::Int(values) => (values.iter().map(|value| format!("{value:>12}")).collect(), 6),
            EclData::Real(values) => (
                values
                    .iter()
                    .map(|value| format!("{:>17}", scientific(f64::from(*value), 8, 'E')))
                    .collect(),
                4,
            ),
            EclData::Double(values) => (
                values
                    .iter()
                    .map(|value| format!("{:>23}", scientific(*value, 14, 'D')))
                    .collect(),
                3,
            ),
            EclData::Logical(values) => (
                values
                    .iter()
                    .map(|value| if *value { "  T".to_string() } else { "  F".to_string() })
                    .collect(),
                25,
            ),
            EclData::Char(values) => (
                values
                    .iter()
                    .map(|value| {
                        let clipped: String = value.chars().take(8).collect();
                        format!(" '{clipped:<8}'")
                    })
                    .collect(),
                7,
            ),
            EclData::Message => (Vec::new(), 1),
        };
        for line in cells.chunks(per_line) {
            out.push_str(&line.concat());
            out.push('\n');
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::{read_keywords, scientific, write_keywords};
    use crate::ecl_file::{EclData, EclKeyword};

    #[test]
    fn scientific_uses_signed_two_digit_exponent() {
        assert_eq!(scientific(1500.0, 3, 'E'), "1.500E+03");
        assert_eq!(scientific(0.00125, 2, 'D'), "1.25D-03");
    }

    #[test]
    fn header_line_matches_fixed_layout() {
        let text = write_keywords(&[EclKeyword::new("DIMENS", EclData::Int(vec![1, 2]))])
            .expect("keyword should encode");
        let header = text.lines().next().expect("header line");
        assert_eq!(header, " 'DIMENS  '           2 'INTE'");
    }

    #[test]
    fn char_values_with_blanks_are_kept() {
        let text = " 'WGNAMES '           2 'CHAR'\n 'OP 1    ' ':+:+:+:+'\n";
        let keywords = read_keywords(text).expect("keywords should parse");
        assert_eq!(
            keywords[0].strings(),
            Some(["OP 1".to_string(), ":+:+:+:+".to_string()].as_slice())
        );
    }

    #[test]
    fn short_data_is_rejected() {
        let text = " 'DIMENS  '           3 'INTE'\n 1 2\n";
        assert!(read_keywords(text).is_err());
    }
}
