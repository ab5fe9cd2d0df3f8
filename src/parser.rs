use crate::ast::{
    Alternative, Alternatives, Assertion, Backreference, Character, CharacterClass,
    CharacterClassRange, CharacterSet, CharacterSetKind, CharacterValue, ClassElement, Element,
    EscapeSequence, Flags, Group, Lookahead, Pattern, Quantifier, QuantifierMarker, RepeatBound,
    Span,
};
use crate::error::ParseError;

pub type ParseResult<T> = Result<T, ParseError>;

/// Flag letters the grammar recognizes; `g`, `i`, `m` bind named flags.
const FLAG_CHARACTERS: [char; 6] = ['g', 'i', 'm', 's', 'u', 'y'];

/// Characters that may appear escaped in a pattern body.
const PATTERN_SPECIALS: [char; 14] = [
    '*', '+', '{', '}', '[', ']', '(', ')', '.', '^', '$', '|', '\\', '\n',
];

/// Characters that may appear escaped inside a character class.
const CLASS_SPECIALS: [char; 2] = [']', '\\'];

/// Which characters count as "special" for escape decoding: a pattern body
/// and a character class body escape different sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EscapeContext {
    Pattern,
    CharacterClass,
}

/// The capturing-group counter, owned by one top-level parse.
///
/// `branch` takes an independent copy before a decision that might be
/// abandoned; `accept` overwrites this state with the branch's value when
/// the speculative path is kept. A branch that is never accepted is simply
/// dropped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseState {
    capturing_groups: u32,
}

impl ParseState {
    pub fn branch(&self) -> ParseState {
        *self
    }

    pub fn accept(&mut self, branch: ParseState) {
        *self = branch;
    }

    pub fn capturing_groups(&self) -> u32 {
        self.capturing_groups
    }

    fn increment(&mut self) {
        self.capturing_groups += 1;
    }
}

/// A position-and-state snapshot for speculative probes.
struct Checkpoint {
    pos: usize,
    state: ParseState,
}

/// Parser for regex literal text.
///
/// The `Parser` struct holds the literal and the current byte position.
/// It also owns the capturing-group counter used to disambiguate
/// backreferences from literal escape digits.
pub struct Parser<'a> {
    pub pattern: &'a str,
    pub pos: usize,
    state: ParseState,
}

impl<'a> Parser<'a> {
    /// Create a new parser for the given literal text.
    pub fn new(pattern: &'a str) -> Self {
        Self {
            pattern,
            pos: 0,
            state: ParseState::default(),
        }
    }

    /// Peek at the next character without advancing.
    fn peek(&self) -> Option<char> {
        self.pattern[self.pos..].chars().next()
    }

    /// Peek at the character after the next one without advancing.
    fn peek_second(&self) -> Option<char> {
        let mut chars = self.pattern[self.pos..].chars();
        chars.next();
        chars.next()
    }

    /// Advance the parser by one character and return it.
    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    /// Consume a specific character if it is next, returning its span.
    fn eat_match(&mut self, expected: char) -> Option<Span> {
        if self.peek() == Some(expected) {
            let start = self.pos;
            self.advance();
            Some(self.span_from(start))
        } else {
            None
        }
    }

    /// Consume a specific string if it is next, returning its span.
    fn eat_match_str(&mut self, expected: &str) -> Option<Span> {
        if self.pattern[self.pos..].starts_with(expected) {
            let start = self.pos;
            self.pos += expected.len();
            Some(self.span_from(start))
        } else {
            None
        }
    }

    fn span_from(&self, start: usize) -> Span {
        Span {
            start,
            end: self.pos,
        }
    }

    fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            pos: self.pos,
            state: self.state.branch(),
        }
    }

    fn rollback(&mut self, saved: Checkpoint) {
        self.pos = saved.pos;
        self.state.accept(saved.state);
    }

    /// Entry point: parse a complete literal, requiring the whole input.
    ///
    /// Example:
    /// - `/(a)\1/g` → Pattern with one alternative and the `g` flag
    pub fn parse(&mut self) -> ParseResult<Pattern> {
        let pattern = self.parse_pattern()?;
        if let Some(found) = self.peek() {
            return Err(ParseError::UnexpectedCharacter {
                found,
                at: self.pos,
            });
        }
        Ok(pattern)
    }

    /// Parse `/`, the alternation body, the balancing `/`, then the flags.
    fn parse_pattern(&mut self) -> ParseResult<Pattern> {
        let start = self.pos;
        let open_token = match self.eat_match('/') {
            Some(token) => token,
            None => {
                return Err(match self.peek() {
                    Some(found) => ParseError::UnexpectedCharacter {
                        found,
                        at: self.pos,
                    },
                    None => ParseError::UnexpectedEndOfInput { at: self.pos },
                })
            }
        };
        let alternatives = self.parse_alternatives('/')?;
        let close_token = self
            .eat_match('/')
            .ok_or(ParseError::UnterminatedDelimiter {
                delimiter: '/',
                at: open_token.start,
            })?;
        let flags = self.parse_flags()?;
        Ok(Pattern {
            span: self.span_from(start),
            open_token,
            alternatives,
            close_token,
            flags,
        })
    }

    /// Greedily match flag letters and bind the named booleans.
    ///
    /// Example:
    /// - `gim` → global, ignoreCase, multiline all true, three tokens
    /// - `gg`  → InvalidFlags
    fn parse_flags(&mut self) -> ParseResult<Flags> {
        let start = self.pos;
        let mut tokens = Vec::new();
        while let Some(c) = self.peek() {
            if !FLAG_CHARACTERS.contains(&c) {
                break;
            }
            let token_start = self.pos;
            self.advance();
            tokens.push(self.span_from(token_start));
        }
        let text = &self.pattern[start..self.pos];
        for (i, c) in text.char_indices() {
            if text[..i].contains(c) {
                return Err(ParseError::InvalidFlags {
                    flag: c,
                    at: start + i,
                });
            }
        }
        Ok(Flags {
            span: self.span_from(start),
            global: text.contains('g'),
            ignore_case: text.contains('i'),
            multiline: text.contains('m'),
            tokens,
        })
    }

    /// Parse one alternative, then more for every `|` separator.
    ///
    /// Example:
    /// - `a|b|` → three alternatives, the last one empty, two separators
    fn parse_alternatives(&mut self, close: char) -> ParseResult<Alternatives> {
        let start = self.pos;
        let mut items = vec![self.parse_alternative(close)?];
        let mut separator_tokens = Vec::new();
        while let Some(token) = self.eat_match('|') {
            separator_tokens.push(token);
            items.push(self.parse_alternative(close)?);
        }
        Ok(Alternatives {
            span: self.span_from(start),
            items,
            separator_tokens,
        })
    }

    /// Collect elements until `|`, the enclosing closing delimiter, or the
    /// end of input. Zero elements is a valid, empty alternative.
    fn parse_alternative(&mut self, close: char) -> ParseResult<Alternative> {
        let start = self.pos;
        let mut elements = Vec::new();
        while let Some(c) = self.peek() {
            if c == '|' || c == close {
                break;
            }
            elements.push(self.parse_element()?);
        }
        Ok(Alternative {
            span: self.span_from(start),
            elements,
        })
    }

    /// Classify and parse one element, then wrap it in a quantifier if a
    /// marker follows.
    ///
    /// `\` followed by digits is the one ambiguous case: it is a
    /// backreference only if that many capturing groups have already been
    /// opened, and a literal escape-digit character otherwise.
    ///
    /// Example:
    /// - `(a)\1` → the `\1` is a backreference
    /// - `\1(a)` → the `\1` is a character with cooked value U+0001
    fn parse_element(&mut self) -> ParseResult<Element> {
        let element = if let Some(index) = self.probe_escape_digits() {
            if self.state.capturing_groups() >= index {
                Element::Backreference(self.parse_backreference()?)
            } else {
                Element::Character(self.parse_character(EscapeContext::Pattern)?)
            }
        } else if self.peek() == Some('[') {
            Element::CharacterClass(self.parse_character_class()?)
        } else if self.peek() == Some('(') {
            self.parse_group_or_lookahead()?
        } else if self.at_assertion() {
            Element::Assertion(self.parse_assertion()?)
        } else if self.at_character_set() {
            Element::CharacterSet(self.parse_character_set()?)
        } else {
            Element::Character(self.parse_character(EscapeContext::Pattern)?)
        };
        self.wrap_quantifier(element)
    }

    /// Speculative probe for `\` followed by decimal digits. Consumes
    /// nothing; returns the digit value when the shape matches.
    fn probe_escape_digits(&mut self) -> Option<u32> {
        let saved = self.checkpoint();
        let mut index = None;
        if self.eat_match('\\').is_some() {
            let digits_start = self.pos;
            while matches!(self.peek(), Some('0'..='9')) {
                self.advance();
            }
            if self.pos > digits_start {
                // An overflowing index can never be satisfied by the group count.
                index = Some(
                    self.pattern[digits_start..self.pos]
                        .parse()
                        .unwrap_or(u32::MAX),
                );
            }
        }
        self.rollback(saved);
        index
    }

    fn parse_backreference(&mut self) -> ParseResult<Backreference> {
        let start = self.pos;
        self.advance(); // `\`
        let digits_start = self.pos;
        while matches!(self.peek(), Some('0'..='9')) {
            self.advance();
        }
        let index = self.pattern[digits_start..self.pos]
            .parse()
            .unwrap_or(u32::MAX);
        Ok(Backreference {
            span: self.span_from(start),
            index,
        })
    }

    fn at_assertion(&self) -> bool {
        match self.peek() {
            Some('^') | Some('$') => true,
            Some('\\') => matches!(self.peek_second(), Some('b') | Some('B')),
            _ => false,
        }
    }

    fn parse_assertion(&mut self) -> ParseResult<Assertion> {
        let start = self.pos;
        match self.peek() {
            Some('^') => {
                self.advance();
                Ok(Assertion::StartOfInput {
                    span: self.span_from(start),
                })
            }
            Some('$') => {
                self.advance();
                Ok(Assertion::EndOfInput {
                    span: self.span_from(start),
                })
            }
            _ => {
                self.advance(); // `\`
                let letter = self.advance();
                Ok(Assertion::WordBoundary {
                    span: self.span_from(start),
                    negate: letter == Some('B'),
                })
            }
        }
    }

    fn at_character_set(&self) -> bool {
        match self.peek() {
            Some('.') => true,
            Some('\\') => matches!(
                self.peek_second(),
                Some('d' | 'D' | 's' | 'S' | 'w' | 'W')
            ),
            _ => false,
        }
    }

    fn at_class_character_set(&self) -> bool {
        self.peek() == Some('\\')
            && matches!(
                self.peek_second(),
                Some('d' | 'D' | 's' | 'S' | 'w' | 'W')
            )
    }

    /// Parse `.` or one of the `\d` `\s` `\w` sets; an uppercase letter
    /// negates the set.
    fn parse_character_set(&mut self) -> ParseResult<CharacterSet> {
        let start = self.pos;
        if self.eat_match('.').is_some() {
            return Ok(CharacterSet {
                span: self.span_from(start),
                kind: CharacterSetKind::Any,
            });
        }
        self.parse_escape_character_set()
    }

    fn parse_escape_character_set(&mut self) -> ParseResult<CharacterSet> {
        let start = self.pos;
        self.advance(); // `\`
        let letter = self
            .advance()
            .ok_or(ParseError::UnknownEscape { at: start })?;
        let negate = letter.is_ascii_uppercase();
        let kind = match letter.to_ascii_lowercase() {
            'd' => CharacterSetKind::Digit { negate },
            's' => CharacterSetKind::Space { negate },
            'w' => CharacterSetKind::Word { negate },
            _ => return Err(ParseError::UnknownEscape { at: start }),
        };
        Ok(CharacterSet {
            span: self.span_from(start),
            kind,
        })
    }

    /// Parse `(...)`: capturing, `?:` non-capturing, or a `?=`/`?!`
    /// lookahead. The capturing counter increments at group-open, before
    /// the body parses, so a group can reference itself. Lookaheads share
    /// the numbering even though they bind no captured text.
    fn parse_group_or_lookahead(&mut self) -> ParseResult<Element> {
        let start = self.pos;
        let open_token = match self.eat_match('(') {
            Some(token) => token,
            None => return Err(ParseError::UnexpectedEndOfInput { at: self.pos }),
        };
        if let Some(sigil_token) = self
            .eat_match_str("?=")
            .or_else(|| self.eat_match_str("?!"))
        {
            let negate = sigil_token.text(self.pattern) == "?!";
            self.state.increment();
            let alternatives = self.parse_alternatives(')')?;
            let close_token = self
                .eat_match(')')
                .ok_or(ParseError::UnterminatedDelimiter {
                    delimiter: ')',
                    at: open_token.start,
                })?;
            return Ok(Element::Lookahead(Lookahead {
                span: self.span_from(start),
                open_token,
                sigil_token,
                negate,
                alternatives,
                close_token,
            }));
        }
        let noncapturing_token = self.eat_match_str("?:");
        if noncapturing_token.is_none() {
            self.state.increment();
        }
        let alternatives = self.parse_alternatives(')')?;
        let close_token = self
            .eat_match(')')
            .ok_or(ParseError::UnterminatedDelimiter {
                delimiter: ')',
                at: open_token.start,
            })?;
        Ok(Element::Group(Group {
            span: self.span_from(start),
            open_token,
            noncapturing_token,
            alternatives,
            close_token,
        }))
    }

    /// Parse one literal or escaped character. Bare CR, LF, and TAB must
    /// appear escaped; any other single character is accepted, including
    /// supplementary ones.
    fn parse_character(&mut self, context: EscapeContext) -> ParseResult<Character> {
        let start = self.pos;
        if self.peek() == Some('\\') {
            let escape = self.parse_escape_sequence(context)?;
            return Ok(Character {
                span: self.span_from(start),
                value: CharacterValue::Escape(escape),
            });
        }
        match self.advance() {
            Some(found @ ('\r' | '\n' | '\t')) => {
                Err(ParseError::UnexpectedCharacter { found, at: start })
            }
            Some(c) => Ok(Character {
                span: self.span_from(start),
                value: CharacterValue::Literal(c),
            }),
            None => Err(ParseError::UnexpectedEndOfInput { at: start }),
        }
    }

    /// Decode one `\`-prefixed sequence, trying in order: the simple
    /// escapable characters, the context's special characters, then a coded
    /// escape introduced by `u`, `x`, `c`, or a leading octal digit.
    ///
    /// Example:
    /// - `\n`   → cooked newline
    /// - `\x41` → cooked `A`
    /// - `\q`   → UnknownEscape
    fn parse_escape_sequence(&mut self, context: EscapeContext) -> ParseResult<EscapeSequence> {
        let start = self.pos;
        self.advance(); // `\`
        let next = match self.peek() {
            Some(c) => c,
            None => return Err(ParseError::UnknownEscape { at: start }),
        };
        if let Some(cooked) = simple_escape(next) {
            self.advance();
            return Ok(EscapeSequence { cooked });
        }
        let specials: &[char] = match context {
            EscapeContext::Pattern => &PATTERN_SPECIALS,
            EscapeContext::CharacterClass => &CLASS_SPECIALS,
        };
        if specials.contains(&next) {
            self.advance();
            return Ok(EscapeSequence { cooked: next });
        }
        if matches!(next, 'u' | 'x' | 'c' | '0'..='9') {
            return self.parse_escape_code(start);
        }
        Err(ParseError::UnknownEscape { at: start })
    }

    /// Decode the digit run of a coded escape: `u` takes exactly four
    /// digits, `x` and `c` exactly two (all read base 16), and a leading
    /// octal digit takes `[0-3][0-7][0-7]` when available, else one or two
    /// octal digits (read base 8).
    fn parse_escape_code(&mut self, escape_start: usize) -> ParseResult<EscapeSequence> {
        let (digits, radix) = match self.peek() {
            Some('u') => {
                self.advance();
                (self.eat_decimal_digits(4, escape_start)?, 16)
            }
            Some('x') | Some('c') => {
                self.advance();
                (self.eat_decimal_digits(2, escape_start)?, 16)
            }
            _ => (self.eat_octal_digits(escape_start)?, 8),
        };
        let code = u32::from_str_radix(digits.text(self.pattern), radix)
            .map_err(|_| ParseError::UnknownEscape { at: escape_start })?;
        let cooked = char::from_u32(code).ok_or(ParseError::UnknownEscape { at: escape_start })?;
        Ok(EscapeSequence { cooked })
    }

    fn eat_decimal_digits(&mut self, count: usize, escape_start: usize) -> ParseResult<Span> {
        let start = self.pos;
        for _ in 0..count {
            if !matches!(self.peek(), Some('0'..='9')) {
                return Err(ParseError::UnknownEscape { at: escape_start });
            }
            self.advance();
        }
        Ok(self.span_from(start))
    }

    fn eat_octal_digits(&mut self, escape_start: usize) -> ParseResult<Span> {
        let start = self.pos;
        let first = match self.peek() {
            Some(c @ '0'..='7') => c,
            _ => return Err(ParseError::UnknownEscape { at: escape_start }),
        };
        self.advance();
        // The three-digit form wins whenever it is all there.
        if matches!(first, '0'..='3')
            && matches!(self.peek(), Some('0'..='7'))
            && matches!(self.peek_second(), Some('0'..='7'))
        {
            self.advance();
            self.advance();
        } else if matches!(self.peek(), Some('0'..='7')) {
            self.advance();
        }
        Ok(self.span_from(start))
    }

    /// Parse `[...]`, e.g. `[a-z]` or `[^\d]`.
    ///
    /// The class body is its own escaping context: `]` and `\` are special
    /// inside it, while the pattern body's specials (and `.`) are not.
    fn parse_character_class(&mut self) -> ParseResult<CharacterClass> {
        let start = self.pos;
        let open_token = match self.eat_match('[') {
            Some(token) => token,
            None => return Err(ParseError::UnexpectedEndOfInput { at: self.pos }),
        };
        let negate_token = self.eat_match('^');
        let mut elements = Vec::new();
        loop {
            match self.peek() {
                None => {
                    return Err(ParseError::UnterminatedDelimiter {
                        delimiter: ']',
                        at: open_token.start,
                    })
                }
                Some(']') => break,
                Some(_) => elements.push(self.parse_class_element()?),
            }
        }
        let close_token = self
            .eat_match(']')
            .ok_or(ParseError::UnterminatedDelimiter {
                delimiter: ']',
                at: open_token.start,
            })?;
        Ok(CharacterClass {
            span: self.span_from(start),
            open_token,
            negate_token,
            elements,
            close_token,
        })
    }

    /// Parse one class element: a `\d`/`\s`/`\w` set, else a character,
    /// possibly extended into a range by a following `-`.
    ///
    /// Example:
    /// - `a-z` → CharacterClassRange from `a` to `z`
    /// - `a-` followed by `]` → UnterminatedCharacterClassRange
    fn parse_class_element(&mut self) -> ParseResult<ClassElement> {
        if self.at_class_character_set() {
            return Ok(ClassElement::CharacterSet(self.parse_escape_character_set()?));
        }
        let min = self.parse_character(EscapeContext::CharacterClass)?;
        let dash_token = match self.eat_match('-') {
            Some(token) => token,
            None => return Ok(ClassElement::Character(min)),
        };
        if matches!(self.peek(), None | Some(']')) {
            return Err(ParseError::UnterminatedCharacterClassRange {
                at: dash_token.start,
            });
        }
        let max = self.parse_character(EscapeContext::CharacterClass)?;
        Ok(ClassElement::Range(CharacterClassRange {
            span: Span {
                start: min.span.start,
                end: self.pos,
            },
            min,
            dash_token,
            max,
        }))
    }

    /// Wrap the element in a quantifier if a marker character follows.
    /// The probe consumes nothing; only a present marker commits.
    fn wrap_quantifier(&mut self, element: Element) -> ParseResult<Element> {
        match self.peek() {
            Some('*' | '+' | '?' | '{') => {
                let quantifier = self.parse_quantifier(element)?;
                Ok(Element::Quantified(Box::new(quantifier)))
            }
            _ => Ok(element),
        }
    }

    /// Parse the quantifier marker for an already-recognized element.
    ///
    /// Example:
    /// - `a*`     → min 0, max unbounded
    /// - `a{2,5}` → min 2, max 5
    /// - `a{2}`   → min 2, max left unspecified
    fn parse_quantifier(&mut self, element: Element) -> ParseResult<Quantifier> {
        let start = element.span().start;
        if let Some(token) = self.eat_match('*') {
            return Ok(Quantifier {
                span: self.span_from(start),
                element,
                min: 0,
                max: RepeatBound::Unbounded,
                marker: QuantifierMarker::Star(token),
            });
        }
        if let Some(token) = self.eat_match('+') {
            return Ok(Quantifier {
                span: self.span_from(start),
                element,
                min: 1,
                max: RepeatBound::Unbounded,
                marker: QuantifierMarker::Plus(token),
            });
        }
        if let Some(token) = self.eat_match('?') {
            return Ok(Quantifier {
                span: self.span_from(start),
                element,
                min: 0,
                max: RepeatBound::Bounded(1),
                marker: QuantifierMarker::Question(token),
            });
        }
        let open_token = match self.eat_match('{') {
            Some(token) => token,
            None => return Err(ParseError::UnexpectedEndOfInput { at: self.pos }),
        };
        let min_token = self
            .eat_digit_run()
            .ok_or(ParseError::MalformedQuantifierBounds { at: self.pos })?;
        let min = min_token
            .text(self.pattern)
            .parse()
            .map_err(|_| ParseError::MalformedQuantifierBounds {
                at: min_token.start,
            })?;
        let comma_token = self.eat_match(',');
        let (max_token, max) = match comma_token {
            None => (None, RepeatBound::Unspecified),
            Some(_) => match self.eat_digit_run() {
                Some(token) => {
                    let value = token.text(self.pattern).parse().map_err(|_| {
                        ParseError::MalformedQuantifierBounds { at: token.start }
                    })?;
                    (Some(token), RepeatBound::Bounded(value))
                }
                None => (None, RepeatBound::Unbounded),
            },
        };
        let close_token = self
            .eat_match('}')
            .ok_or(ParseError::UnterminatedDelimiter {
                delimiter: '}',
                at: open_token.start,
            })?;
        Ok(Quantifier {
            span: self.span_from(start),
            element,
            min,
            max,
            marker: QuantifierMarker::Bounds {
                open_token,
                min_token,
                comma_token,
                max_token,
                close_token,
            },
        })
    }

    fn eat_digit_run(&mut self) -> Option<Span> {
        let start = self.pos;
        while matches!(self.peek(), Some('0'..='9')) {
            self.advance();
        }
        (self.pos > start).then(|| self.span_from(start))
    }
}

fn simple_escape(c: char) -> Option<char> {
    match c {
        '\\' => Some('\\'),
        '/' => Some('/'),
        'n' => Some('\n'),
        'r' => Some('\r'),
        't' => Some('\t'),
        '0' => Some('\0'),
        _ => None,
    }
}
