/// Byte range into the parsed literal text.
///
/// Every node keeps the span of the text it was recognized from, so a tree
/// can always be mapped back to the exact original spelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    /// The exact original text covered by this span.
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.start..self.end]
    }
}

/// A whole regex literal: `/alternatives/flags`.
#[derive(Debug, Clone, PartialEq)]
pub struct Pattern {
    pub span: Span,
    pub open_token: Span,
    pub alternatives: Alternatives,
    pub close_token: Span,
    pub flags: Flags,
}

impl Pattern {
    /// Every token span of the tree in document order.
    ///
    /// Concatenating the text of these spans reproduces the literal
    /// byte-for-byte, including delimiters, separators, and flags.
    pub fn tokens(&self) -> Vec<Span> {
        let mut out = Vec::new();
        out.push(self.open_token);
        collect_alternatives(&self.alternatives, &mut out);
        out.push(self.close_token);
        out.extend(self.flags.tokens.iter().copied());
        out
    }

    /// Rebuild the original literal text from the token spans.
    pub fn reconstruct(&self, source: &str) -> String {
        self.tokens().iter().map(|span| span.text(source)).collect()
    }
}

/// Trailing flag letters. Each matched letter is kept as a token in
/// declaration order; `g`, `i`, and `m` additionally bind named booleans.
#[derive(Debug, Clone, PartialEq)]
pub struct Flags {
    pub span: Span,
    pub tokens: Vec<Span>,
    pub global: bool,
    pub ignore_case: bool,
    pub multiline: bool,
}

/// One or more `|`-separated alternatives. The separator tokens are kept;
/// there are always exactly `items.len() - 1` of them.
#[derive(Debug, Clone, PartialEq)]
pub struct Alternatives {
    pub span: Span,
    pub items: Vec<Alternative>,
    pub separator_tokens: Vec<Span>,
}

/// A single branch: an ordered run of elements. The run may be empty.
#[derive(Debug, Clone, PartialEq)]
pub struct Alternative {
    pub span: Span,
    pub elements: Vec<Element>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    Character(Character),
    CharacterSet(CharacterSet),
    CharacterClass(CharacterClass),
    Group(Group),
    Lookahead(Lookahead),
    Assertion(Assertion),
    Backreference(Backreference),
    Quantified(Box<Quantifier>),
}

impl Element {
    pub fn span(&self) -> Span {
        match self {
            Element::Character(character) => character.span,
            Element::CharacterSet(set) => set.span,
            Element::CharacterClass(class) => class.span,
            Element::Group(group) => group.span,
            Element::Lookahead(lookahead) => lookahead.span,
            Element::Assertion(assertion) => assertion.span(),
            Element::Backreference(backreference) => backreference.span,
            Element::Quantified(quantifier) => quantifier.span,
        }
    }
}

/// `(...)` or `(?:...)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub span: Span,
    pub open_token: Span,
    /// The `?:` token when present; absent for capturing groups.
    pub noncapturing_token: Option<Span>,
    pub alternatives: Alternatives,
    pub close_token: Span,
}

impl Group {
    pub fn is_capturing(&self) -> bool {
        self.noncapturing_token.is_none()
    }
}

/// `(?=...)` or `(?!...)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Lookahead {
    pub span: Span,
    pub open_token: Span,
    pub sigil_token: Span,
    pub negate: bool,
    pub alternatives: Alternatives,
    pub close_token: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assertion {
    StartOfInput { span: Span },
    EndOfInput { span: Span },
    WordBoundary { span: Span, negate: bool },
}

impl Assertion {
    pub fn span(&self) -> Span {
        match self {
            Assertion::StartOfInput { span }
            | Assertion::EndOfInput { span }
            | Assertion::WordBoundary { span, .. } => *span,
        }
    }
}

/// `\N` referencing the Nth capturing group opened earlier in the pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backreference {
    pub span: Span,
    pub index: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharacterSet {
    pub span: Span,
    pub kind: CharacterSetKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharacterSetKind {
    Any,
    Digit { negate: bool },
    Space { negate: bool },
    Word { negate: bool },
}

/// One literal or escaped character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Character {
    pub span: Span,
    pub value: CharacterValue,
}

impl Character {
    /// The semantic character value, decoded for escapes.
    pub fn cooked(&self) -> char {
        match self.value {
            CharacterValue::Literal(c) => c,
            CharacterValue::Escape(escape) => escape.cooked,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharacterValue {
    Literal(char),
    Escape(EscapeSequence),
}

/// A `\`-introduced sequence and the single character it decodes to.
/// The raw spelling stays available through the owning `Character` span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EscapeSequence {
    pub cooked: char,
}

/// `[...]`, possibly negated, possibly containing ranges.
#[derive(Debug, Clone, PartialEq)]
pub struct CharacterClass {
    pub span: Span,
    pub open_token: Span,
    /// The leading `^` token when present.
    pub negate_token: Option<Span>,
    pub elements: Vec<ClassElement>,
    pub close_token: Span,
}

impl CharacterClass {
    pub fn is_negated(&self) -> bool {
        self.negate_token.is_some()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ClassElement {
    Character(Character),
    CharacterSet(CharacterSet),
    Range(CharacterClassRange),
}

/// `min-max` inside a character class. Both endpoints are single characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharacterClassRange {
    pub span: Span,
    pub min: Character,
    pub dash_token: Span,
    pub max: Character,
}

/// A repetition wrapper around exactly one element.
#[derive(Debug, Clone, PartialEq)]
pub struct Quantifier {
    pub span: Span,
    pub element: Element,
    pub min: u32,
    pub max: RepeatBound,
    pub marker: QuantifierMarker,
}

/// The upper repetition bound. `a{2}` leaves the maximum `Unspecified`,
/// which is distinct from both `Bounded(2)` and `Unbounded`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepeatBound {
    Bounded(u32),
    Unbounded,
    Unspecified,
}

/// The concrete quantifier spelling, with its token spans.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuantifierMarker {
    Star(Span),
    Plus(Span),
    Question(Span),
    Bounds {
        open_token: Span,
        min_token: Span,
        comma_token: Option<Span>,
        max_token: Option<Span>,
        close_token: Span,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Pattern,
    Flags,
    Alternative,
    Group,
    Lookahead,
    Backreference,
    StartOfInputAssertion,
    EndOfInputAssertion,
    WordBoundaryAssertion,
    Character,
    EscapeSequence,
    CharacterClass,
    CharacterClassRange,
    AnyCharacterSet,
    DigitCharacterSet,
    SpaceCharacterSet,
    WordCharacterSet,
    Quantifier,
}

/// Static metadata for one node kind: the attribute names it binds and
/// whether it may legitimately produce zero child tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeDescriptor {
    pub kind: NodeKind,
    pub attributes: &'static [&'static str],
    pub allow_empty: bool,
}

pub const NODE_DESCRIPTORS: &[NodeDescriptor] = &[
    NodeDescriptor { kind: NodeKind::Pattern, attributes: &[], allow_empty: false },
    NodeDescriptor {
        kind: NodeKind::Flags,
        attributes: &["global", "ignore_case", "multiline"],
        allow_empty: true,
    },
    NodeDescriptor { kind: NodeKind::Alternative, attributes: &[], allow_empty: true },
    NodeDescriptor { kind: NodeKind::Group, attributes: &[], allow_empty: false },
    NodeDescriptor { kind: NodeKind::Lookahead, attributes: &["negate"], allow_empty: false },
    NodeDescriptor { kind: NodeKind::Backreference, attributes: &[], allow_empty: false },
    NodeDescriptor { kind: NodeKind::StartOfInputAssertion, attributes: &[], allow_empty: false },
    NodeDescriptor { kind: NodeKind::EndOfInputAssertion, attributes: &[], allow_empty: true },
    NodeDescriptor {
        kind: NodeKind::WordBoundaryAssertion,
        attributes: &["negate"],
        allow_empty: false,
    },
    NodeDescriptor { kind: NodeKind::Character, attributes: &[], allow_empty: false },
    NodeDescriptor { kind: NodeKind::EscapeSequence, attributes: &["cooked"], allow_empty: false },
    NodeDescriptor { kind: NodeKind::CharacterClass, attributes: &[], allow_empty: false },
    NodeDescriptor { kind: NodeKind::CharacterClassRange, attributes: &[], allow_empty: false },
    NodeDescriptor { kind: NodeKind::AnyCharacterSet, attributes: &[], allow_empty: false },
    NodeDescriptor { kind: NodeKind::DigitCharacterSet, attributes: &["negate"], allow_empty: false },
    NodeDescriptor { kind: NodeKind::SpaceCharacterSet, attributes: &["negate"], allow_empty: false },
    NodeDescriptor { kind: NodeKind::WordCharacterSet, attributes: &["negate"], allow_empty: false },
    NodeDescriptor { kind: NodeKind::Quantifier, attributes: &["min", "max"], allow_empty: false },
];

/// Look up the descriptor for a node kind.
pub fn descriptor(kind: NodeKind) -> Option<&'static NodeDescriptor> {
    NODE_DESCRIPTORS.iter().find(|descriptor| descriptor.kind == kind)
}

fn collect_alternatives(alternatives: &Alternatives, out: &mut Vec<Span>) {
    for (i, alternative) in alternatives.items.iter().enumerate() {
        if i > 0 {
            if let Some(separator) = alternatives.separator_tokens.get(i - 1) {
                out.push(*separator);
            }
        }
        for element in &alternative.elements {
            collect_element(element, out);
        }
    }
}

fn collect_element(element: &Element, out: &mut Vec<Span>) {
    match element {
        Element::Character(character) => out.push(character.span),
        Element::CharacterSet(set) => out.push(set.span),
        Element::Backreference(backreference) => out.push(backreference.span),
        Element::Assertion(assertion) => out.push(assertion.span()),
        Element::Group(group) => {
            out.push(group.open_token);
            if let Some(token) = group.noncapturing_token {
                out.push(token);
            }
            collect_alternatives(&group.alternatives, out);
            out.push(group.close_token);
        }
        Element::Lookahead(lookahead) => {
            out.push(lookahead.open_token);
            out.push(lookahead.sigil_token);
            collect_alternatives(&lookahead.alternatives, out);
            out.push(lookahead.close_token);
        }
        Element::CharacterClass(class) => {
            out.push(class.open_token);
            if let Some(token) = class.negate_token {
                out.push(token);
            }
            for class_element in &class.elements {
                match class_element {
                    ClassElement::Character(character) => out.push(character.span),
                    ClassElement::CharacterSet(set) => out.push(set.span),
                    ClassElement::Range(range) => {
                        out.push(range.min.span);
                        out.push(range.dash_token);
                        out.push(range.max.span);
                    }
                }
            }
            out.push(class.close_token);
        }
        Element::Quantified(quantifier) => {
            collect_element(&quantifier.element, out);
            match &quantifier.marker {
                QuantifierMarker::Star(token)
                | QuantifierMarker::Plus(token)
                | QuantifierMarker::Question(token) => out.push(*token),
                QuantifierMarker::Bounds {
                    open_token,
                    min_token,
                    comma_token,
                    max_token,
                    close_token,
                } => {
                    out.push(*open_token);
                    out.push(*min_token);
                    if let Some(token) = comma_token {
                        out.push(*token);
                    }
                    if let Some(token) = max_token {
                        out.push(*token);
                    }
                    out.push(*close_token);
                }
            }
        }
    }
}
