//! Half-space rule algebra.
//!
//! A [`HeadRule`] is a boolean expression over signed surfaces. It
//! renders in the usual transport-code notation: a bare surface number
//! for the positive side, a leading `-` for the negative side,
//! whitespace for intersection and `:` for union.

use crate::{GeomError, Result, SurfaceId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Side of a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sense {
    /// The side the surface normal points into.
    Positive,
    /// The opposite side.
    Negative,
}

impl Sense {
    /// The other side.
    pub fn flip(self) -> Self {
        match self {
            Sense::Positive => Sense::Negative,
            Sense::Negative => Sense::Positive,
        }
    }
}

/// One signed side of a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HalfSpace {
    /// Bounding surface.
    pub surface: SurfaceId,
    /// Which side of it.
    pub sense: Sense,
}

impl HalfSpace {
    /// Positive side of `surface`.
    pub fn pos(surface: SurfaceId) -> Self {
        Self {
            surface,
            sense: Sense::Positive,
        }
    }

    /// Negative side of `surface`.
    pub fn neg(surface: SurfaceId) -> Self {
        Self {
            surface,
            sense: Sense::Negative,
        }
    }

    /// The opposite half-space.
    pub fn flipped(self) -> Self {
        Self {
            surface: self.surface,
            sense: self.sense.flip(),
        }
    }
}

impl fmt::Display for HalfSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.sense {
            Sense::Positive => write!(f, "{}", self.surface),
            Sense::Negative => write!(f, "-{}", self.surface),
        }
    }
}

/// Boolean combination of half-spaces.
///
/// An empty intersection is all of space; an empty union is nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum HeadRule {
    /// A single half-space.
    Half(HalfSpace),
    /// All terms must hold.
    Intersection(Vec<HeadRule>),
    /// Any term may hold.
    Union(Vec<HeadRule>),
}

impl HeadRule {
    /// The rule that accepts every point.
    pub fn all() -> Self {
        HeadRule::Intersection(Vec::new())
    }

    /// True for the rule that accepts every point.
    pub fn is_all(&self) -> bool {
        matches!(self, HeadRule::Intersection(terms) if terms.is_empty())
    }

    /// Intersection of several half-spaces.
    pub fn from_half_spaces(halves: impl IntoIterator<Item = HalfSpace>) -> Self {
        Self::intersection_of(halves.into_iter().map(HeadRule::Half).collect())
    }

    /// `self ∩ other`, flattening nested intersections.
    pub fn intersect(self, other: impl Into<HeadRule>) -> Self {
        let mut terms = self.into_intersection_terms();
        terms.extend(other.into().into_intersection_terms());
        Self::intersection_of(terms)
    }

    /// `self ∪ other`, flattening nested unions.
    pub fn union(self, other: impl Into<HeadRule>) -> Self {
        let mut terms = self.into_union_terms();
        terms.extend(other.into().into_union_terms());
        Self::union_of(terms)
    }

    /// The complement, pushed down to the half-spaces.
    pub fn complement(&self) -> Self {
        match self {
            HeadRule::Half(h) => HeadRule::Half(h.flipped()),
            HeadRule::Intersection(terms) => {
                HeadRule::Union(terms.iter().map(HeadRule::complement).collect())
            }
            HeadRule::Union(terms) => {
                HeadRule::Intersection(terms.iter().map(HeadRule::complement).collect())
            }
        }
    }

    /// Every half-space in the rule, in order of appearance.
    pub fn half_spaces(&self) -> Vec<HalfSpace> {
        let mut out = Vec::new();
        self.collect_half_spaces(&mut out);
        out
    }

    /// Set of surfaces referenced by the rule.
    pub fn surfaces(&self) -> BTreeSet<SurfaceId> {
        self.half_spaces().into_iter().map(|h| h.surface).collect()
    }

    /// True if `surface` appears anywhere in the rule.
    pub fn has_surface(&self, surface: SurfaceId) -> bool {
        self.half_spaces().iter().any(|h| h.surface == surface)
    }

    /// Evaluate the rule given the side of each surface a point is on.
    pub fn is_valid<F>(&self, side_of: &F) -> Result<bool>
    where
        F: Fn(SurfaceId) -> Result<Sense>,
    {
        match self {
            HeadRule::Half(h) => Ok(side_of(h.surface)? == h.sense),
            HeadRule::Intersection(terms) => {
                for t in terms {
                    if !t.is_valid(side_of)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            HeadRule::Union(terms) => {
                for t in terms {
                    if t.is_valid(side_of)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
        }
    }

    /// True if the rule accepts every point without looking at a surface.
    fn covers_all(&self) -> bool {
        match self {
            HeadRule::Half(_) => false,
            HeadRule::Intersection(terms) => terms.iter().all(HeadRule::covers_all),
            HeadRule::Union(terms) => terms.iter().any(HeadRule::covers_all),
        }
    }

    /// True if the rule rejects every point without looking at a surface.
    fn is_empty_set(&self) -> bool {
        match self {
            HeadRule::Half(_) => false,
            HeadRule::Intersection(terms) => terms.iter().any(HeadRule::is_empty_set),
            HeadRule::Union(terms) => terms.iter().all(HeadRule::is_empty_set),
        }
    }

    fn collect_half_spaces(&self, out: &mut Vec<HalfSpace>) {
        match self {
            HeadRule::Half(h) => out.push(*h),
            HeadRule::Intersection(terms) | HeadRule::Union(terms) => {
                for t in terms {
                    t.collect_half_spaces(out);
                }
            }
        }
    }

    fn into_intersection_terms(self) -> Vec<HeadRule> {
        match self {
            HeadRule::Intersection(terms) => terms,
            other => vec![other],
        }
    }

    fn into_union_terms(self) -> Vec<HeadRule> {
        match self {
            HeadRule::Union(terms) => terms,
            other => vec![other],
        }
    }

    fn intersection_of(mut terms: Vec<HeadRule>) -> Self {
        if terms.len() == 1 {
            terms.remove(0)
        } else {
            HeadRule::Intersection(terms)
        }
    }

    fn union_of(mut terms: Vec<HeadRule>) -> Self {
        if terms.len() == 1 {
            terms.remove(0)
        } else {
            HeadRule::Union(terms)
        }
    }
}

impl From<HalfSpace> for HeadRule {
    fn from(h: HalfSpace) -> Self {
        HeadRule::Half(h)
    }
}

impl Default for HeadRule {
    fn default() -> Self {
        Self::all()
    }
}

/// Renders `""` for a rule covering all of space and `()` for an empty
/// one. Terms that cannot change the result are left out.
impl fmt::Display for HeadRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.covers_all() {
            return Ok(());
        }
        if self.is_empty_set() {
            return f.write_str("()");
        }
        match self {
            HeadRule::Half(h) => write!(f, "{h}"),
            HeadRule::Intersection(terms) => {
                let live = terms.iter().filter(|t| !t.covers_all());
                for (k, t) in live.enumerate() {
                    if k > 0 {
                        f.write_str(" ")?;
                    }
                    match t {
                        HeadRule::Union(_) => write!(f, "({t})")?,
                        _ => write!(f, "{t}")?,
                    }
                }
                Ok(())
            }
            HeadRule::Union(terms) => {
                let live = terms.iter().filter(|t| !t.is_empty_set());
                for (k, t) in live.enumerate() {
                    if k > 0 {
                        f.write_str(" : ")?;
                    }
                    write!(f, "{t}")?;
                }
                Ok(())
            }
        }
    }
}

// =============================================================================
// Parsing
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Half(HalfSpace),
    Colon,
    Open,
    Close,
}

fn tokenize(input: &str) -> std::result::Result<Vec<Token>, String> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();
    while let Some(&c) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            ':' => {
                chars.next();
                tokens.push(Token::Colon);
            }
            '(' => {
                chars.next();
                tokens.push(Token::Open);
            }
            ')' => {
                chars.next();
                tokens.push(Token::Close);
            }
            '-' | '+' | '0'..='9' => {
                let mut text = String::new();
                text.push(c);
                chars.next();
                while let Some(&d) = chars.peek() {
                    if !d.is_ascii_digit() {
                        break;
                    }
                    text.push(d);
                    chars.next();
                }
                let (sense, digits) = match text.strip_prefix('-') {
                    Some(rest) => (Sense::Negative, rest),
                    None => (Sense::Positive, text.trim_start_matches('+')),
                };
                let id: u32 = digits
                    .parse()
                    .map_err(|_| format!("bad surface number `{text}`"))?;
                tokens.push(Token::Half(HalfSpace {
                    surface: SurfaceId(id),
                    sense,
                }));
            }
            other => return Err(format!("unexpected character `{other}`")),
        }
    }
    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn union(&mut self) -> std::result::Result<HeadRule, String> {
        let mut terms = vec![self.intersection()?];
        while self.peek() == Some(Token::Colon) {
            self.pos += 1;
            terms.push(self.intersection()?);
        }
        Ok(HeadRule::union_of(terms))
    }

    fn intersection(&mut self) -> std::result::Result<HeadRule, String> {
        let mut terms = Vec::new();
        loop {
            match self.peek() {
                Some(Token::Half(h)) => {
                    self.pos += 1;
                    terms.push(HeadRule::Half(h));
                }
                Some(Token::Open) if self.tokens.get(self.pos + 1) == Some(&Token::Close) => {
                    self.pos += 2;
                    terms.push(HeadRule::Union(Vec::new()));
                }
                Some(Token::Open) => {
                    self.pos += 1;
                    let inner = self.union()?;
                    if self.peek() != Some(Token::Close) {
                        return Err("unbalanced `(`".into());
                    }
                    self.pos += 1;
                    terms.extend(inner.into_intersection_terms());
                }
                _ => break,
            }
        }
        if terms.is_empty() {
            return Err("empty term".into());
        }
        Ok(HeadRule::intersection_of(terms))
    }
}

impl FromStr for HeadRule {
    type Err = GeomError;

    fn from_str(s: &str) -> Result<Self> {
        let fail = |reason: String| GeomError::RuleParse {
            input: s.to_string(),
            reason,
        };
        let tokens = tokenize(s).map_err(fail)?;
        if tokens.is_empty() {
            return Ok(HeadRule::all());
        }
        let mut parser = Parser { tokens, pos: 0 };
        let rule = parser.union().map_err(fail)?;
        if parser.pos != parser.tokens.len() {
            return Err(fail("trailing tokens".into()));
        }
        Ok(rule)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn h(id: i64) -> HalfSpace {
        if id < 0 {
            HalfSpace::neg(SurfaceId((-id) as u32))
        } else {
            HalfSpace::pos(SurfaceId(id as u32))
        }
    }

    #[test]
    fn test_intersect_flattens() {
        let r = HeadRule::from(h(1)).intersect(h(-2)).intersect(h(3));
        assert_eq!(r.to_string(), "1 -2 3");
        assert_eq!(r.half_spaces().len(), 3);
    }

    #[test]
    fn test_all_is_identity_for_intersect() {
        let r = HeadRule::all().intersect(h(5));
        assert_eq!(r, HeadRule::Half(h(5)));
        assert!(HeadRule::all().is_all());
    }

    #[test]
    fn test_union_display_parenthesised() {
        let u = HeadRule::from(h(1)).union(h(2));
        let r = HeadRule::from(h(-3)).intersect(u);
        assert_eq!(r.to_string(), "-3 (1 : 2)");
    }

    #[test]
    fn test_complement_de_morgan() {
        let r = HeadRule::from_half_spaces([h(1), h(-2)]);
        let c = r.complement();
        assert_eq!(c.to_string(), "-1 : 2");
        assert_eq!(c.complement(), r);
    }

    #[test]
    fn test_parse_round_trip() {
        let r: HeadRule = "10 -11 (3 : -4)".parse().unwrap();
        assert_eq!(r.to_string(), "10 -11 (3 : -4)");
        assert!(r.has_surface(SurfaceId(4)));
        assert_eq!(r.surfaces().len(), 4);
    }

    #[test]
    fn test_parse_precedence() {
        // Intersection binds tighter than union.
        let r: HeadRule = "1 2 : 3".parse().unwrap();
        match r {
            HeadRule::Union(terms) => assert_eq!(terms.len(), 2),
            other => panic!("expected union, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_errors() {
        assert!("1 (2".parse::<HeadRule>().is_err());
        assert!("1 x".parse::<HeadRule>().is_err());
        assert!("1 : ".parse::<HeadRule>().is_err());
        assert!("".parse::<HeadRule>().unwrap().is_all());
    }

    #[test]
    fn test_empty_rules_round_trip() {
        let nothing = HeadRule::all().complement();
        assert_eq!(nothing, HeadRule::Union(Vec::new()));
        assert_eq!(nothing.to_string(), "()");
        assert_eq!("()".parse::<HeadRule>().unwrap(), nothing);

        let never = |_: SurfaceId| -> Result<Sense> { Ok(Sense::Positive) };
        let blocked = HeadRule::from(h(1)).intersect(nothing.clone());
        assert_eq!(blocked.to_string(), "()");
        assert!(!blocked.is_valid(&never).unwrap());
        let reparsed: HeadRule = blocked.to_string().parse().unwrap();
        assert!(!reparsed.is_valid(&never).unwrap());

        let open = HeadRule::from(h(-1)).union(HeadRule::all());
        assert_eq!(open.to_string(), "");
        assert!(open.is_valid(&never).unwrap());

        let trimmed = HeadRule::from(h(2)).union(nothing);
        assert_eq!(trimmed.to_string(), "2");
    }

    #[test]
    fn test_is_valid() {
        let r: HeadRule = "1 -2".parse().unwrap();
        let inside = |s: SurfaceId| -> Result<Sense> {
            Ok(if s.0 == 1 { Sense::Positive } else { Sense::Negative })
        };
        let outside = |_: SurfaceId| -> Result<Sense> { Ok(Sense::Positive) };
        assert!(r.is_valid(&inside).unwrap());
        assert!(!r.is_valid(&outside).unwrap());
    }
}
