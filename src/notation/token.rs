//! Tokenizer for the compact text notation
//!
//! Grammar per token:
//! - `<` opens a chord, `>` closes one (the closer may carry a duration
//!   denominator, dots and a tie, e.g. `>4.~`)
//! - `|` is a barline
//! - a note is a pitch letter `a`-`g` (or `r`/`s` for a rest), an optional
//!   `is`/`es` accidental, octave marks (`'` up, `,` down), an optional
//!   duration denominator, dots and a tie marker, e.g. `cis'4.~`
//!
//! `%` starts a line comment; newlines and whitespace are insignificant.
//! Characters that fit no token are skipped, so embedded non-note text
//! passes through harmlessly.

/// One lexical element of the notation text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    /// `<`: freeze the time cursor, following notes share one onset
    ChordOpen,
    /// `>` with optional duration/dot/tie suffix
    ChordClose {
        /// Explicit duration denominator on the closer, if any
        denominator: Option<u32>,
        /// Number of dots on the closer
        dots: u8,
        /// Tie marker on the closer (applies to every chord member)
        tied: bool,
    },
    /// `|`: bar boundary (validation only, no timing effect)
    Barline,
    /// A pitch or rest with its duration suffix
    Note {
        /// Pitch letter `a`-`g`, or `r`/`s` for a rest
        letter: char,
        /// Semitone shift: +1 for `is`, -1 for `es`, 0 otherwise
        accidental: i8,
        /// Net octave shift: count of `'` minus count of `,`
        octave_shift: i32,
        /// Explicit duration denominator, if any
        denominator: Option<u32>,
        /// Number of dots
        dots: u8,
        /// Tie marker
        tied: bool,
    },
}

/// Split the source into tokens, stripping `%` comments.
pub fn tokenize(source: &str) -> Vec<Token> {
    let cleaned: String = source
        .lines()
        .map(|line| line.split('%').next().unwrap_or(""))
        .collect::<Vec<_>>()
        .join(" ");
    let chars: Vec<char> = cleaned.chars().collect();

    let mut tokens = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '<' => {
                tokens.push(Token::ChordOpen);
                i += 1;
            }
            '>' => {
                i += 1;
                let denominator = scan_number(&chars, &mut i);
                let dots = scan_dots(&chars, &mut i);
                let tied = scan_tie(&chars, &mut i);
                tokens.push(Token::ChordClose {
                    denominator,
                    dots,
                    tied,
                });
            }
            '|' => {
                tokens.push(Token::Barline);
                i += 1;
            }
            letter @ ('a'..='g' | 'r' | 's') => {
                i += 1;
                let accidental = scan_accidental(&chars, &mut i);
                let octave_shift = scan_octave_marks(&chars, &mut i);
                let denominator = scan_number(&chars, &mut i);
                let dots = scan_dots(&chars, &mut i);
                let tied = scan_tie(&chars, &mut i);
                tokens.push(Token::Note {
                    letter,
                    accidental,
                    octave_shift,
                    denominator,
                    dots,
                    tied,
                });
            }
            _ => i += 1,
        }
    }
    tokens
}

fn scan_accidental(chars: &[char], i: &mut usize) -> i8 {
    if chars[*i..].starts_with(&['i', 's']) {
        *i += 2;
        1
    } else if chars[*i..].starts_with(&['e', 's']) {
        *i += 2;
        -1
    } else {
        0
    }
}

fn scan_octave_marks(chars: &[char], i: &mut usize) -> i32 {
    let mut shift = 0;
    while let Some(&c) = chars.get(*i) {
        match c {
            '\'' => shift += 1,
            ',' => shift -= 1,
            _ => break,
        }
        *i += 1;
    }
    shift
}

fn scan_number(chars: &[char], i: &mut usize) -> Option<u32> {
    let start = *i;
    while chars.get(*i).is_some_and(|c| c.is_ascii_digit()) {
        *i += 1;
    }
    if *i == start {
        None
    } else {
        chars[start..*i].iter().collect::<String>().parse().ok()
    }
}

fn scan_dots(chars: &[char], i: &mut usize) -> u8 {
    let mut dots = 0;
    while chars.get(*i) == Some(&'.') {
        dots += 1;
        *i += 1;
    }
    dots
}

fn scan_tie(chars: &[char], i: &mut usize) -> bool {
    if chars.get(*i) == Some(&'~') {
        *i += 1;
        true
    } else {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_note_token() {
        let tokens = tokenize("cis'4.~");
        assert_eq!(
            tokens,
            vec![Token::Note {
                letter: 'c',
                accidental: 1,
                octave_shift: 1,
                denominator: Some(4),
                dots: 1,
                tied: true,
            }]
        );
    }

    #[test]
    fn test_flat_and_low_octave() {
        let tokens = tokenize("bes,,2");
        assert_eq!(
            tokens,
            vec![Token::Note {
                letter: 'b',
                accidental: -1,
                octave_shift: -2,
                denominator: Some(2),
                dots: 0,
                tied: false,
            }]
        );
    }

    #[test]
    fn test_bare_e_is_not_a_flat() {
        // "es" would be E-flat only as "ees"; a lone "es" is the note e
        // followed by the skip marker s.
        let tokens = tokenize("es");
        assert_eq!(tokens.len(), 2);
        assert!(matches!(tokens[0], Token::Note { letter: 'e', accidental: 0, .. }));
        assert!(matches!(tokens[1], Token::Note { letter: 's', .. }));
        let tokens = tokenize("ees");
        assert_eq!(tokens.len(), 1);
        assert!(matches!(tokens[0], Token::Note { letter: 'e', accidental: -1, .. }));
    }

    #[test]
    fn test_chord_tokens() {
        let tokens = tokenize("<c e g>4.~");
        assert_eq!(tokens.len(), 5);
        assert_eq!(tokens[0], Token::ChordOpen);
        assert_eq!(
            tokens[4],
            Token::ChordClose {
                denominator: Some(4),
                dots: 1,
                tied: true,
            }
        );
    }

    #[test]
    fn test_comments_and_whitespace() {
        let tokens = tokenize("c4 % a comment with d8 inside\n  d4\n");
        assert_eq!(tokens.len(), 2);
        assert!(matches!(tokens[1], Token::Note { letter: 'd', .. }));
    }

    #[test]
    fn test_barline_and_rest() {
        let tokens = tokenize("r2 | g16");
        assert_eq!(tokens.len(), 3);
        assert!(matches!(tokens[0], Token::Note { letter: 'r', denominator: Some(2), .. }));
        assert_eq!(tokens[1], Token::Barline);
        assert!(matches!(tokens[2], Token::Note { denominator: Some(16), .. }));
    }

    #[test]
    fn test_unrecognized_characters_are_skipped() {
        let tokens = tokenize("{ c4 @ d4 }");
        assert_eq!(tokens.len(), 2);
    }
}
