//! Triple patterns: a [`Term`] position that may also be an unbound variable.
//!
//! This is the variable-carrying counterpart of [`Term`]: a BGP compiler
//! walks `Pattern` values, not plain triples, and needs to know at each of
//! the three positions whether it is looking at a constant to filter on or
//! a variable to bind and project.

use crate::Term;
use std::fmt;

/// One position of a triple pattern: either bound to a concrete term, or an
/// unbound SPARQL variable identified by name (without the leading `?`).
#[derive(Clone, PartialEq, Eq, Hash)]
pub enum TermSlot<'a> {
    /// A variable, to be bound by matching rows.
    Variable(&'a str),
    /// A concrete term, to be matched exactly.
    Concrete(Term<'a>),
}

impl<'a> TermSlot<'a> {
    /// Build a variable slot.
    pub fn var(name: &'a str) -> Self {
        TermSlot::Variable(name)
    }

    /// Build a concrete slot.
    pub fn concrete(term: Term<'a>) -> Self {
        TermSlot::Concrete(term)
    }

    /// True if this slot is a variable.
    pub fn is_variable(&self) -> bool {
        matches!(self, TermSlot::Variable(_))
    }

    /// True if this slot is bound to a concrete term.
    pub fn is_concrete(&self) -> bool {
        matches!(self, TermSlot::Concrete(_))
    }

    /// The variable name, if this is a variable slot.
    pub fn variable_name(&self) -> Option<&'a str> {
        match self {
            TermSlot::Variable(name) => Some(name),
            TermSlot::Concrete(_) => None,
        }
    }

    /// The concrete term, if this slot is bound.
    pub fn as_term(&self) -> Option<&Term<'a>> {
        match self {
            TermSlot::Concrete(term) => Some(term),
            TermSlot::Variable(_) => None,
        }
    }
}

impl<'a> From<Term<'a>> for TermSlot<'a> {
    fn from(term: Term<'a>) -> Self {
        TermSlot::Concrete(term)
    }
}

impl<'a> fmt::Debug for TermSlot<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TermSlot::Variable(name) => write!(f, "?{}", name),
            TermSlot::Concrete(term) => write!(f, "{:?}", term),
        }
    }
}

impl<'a> fmt::Display for TermSlot<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TermSlot::Variable(name) => write!(f, "?{}", name),
            TermSlot::Concrete(term) => write!(f, "{}", term),
        }
    }
}

/// A triple pattern: subject/predicate/object, each either bound or a
/// variable. Used by the BGP compiler (basic graph pattern matching) rather
/// than by the direct triple-store path, which always deals in concrete
/// [`crate::Triple`] values.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Pattern<'a> {
    /// Subject slot (must resolve to an IRI or blank node when bound).
    pub subject: TermSlot<'a>,
    /// Predicate slot (must resolve to an IRI when bound).
    pub predicate: TermSlot<'a>,
    /// Object slot (any term type).
    pub object: TermSlot<'a>,
}

impl<'a> Pattern<'a> {
    /// Build a new pattern from its three slots.
    pub fn new(subject: TermSlot<'a>, predicate: TermSlot<'a>, object: TermSlot<'a>) -> Self {
        Pattern {
            subject,
            predicate,
            object,
        }
    }

    /// Number of variable-bound positions (0-3).
    pub fn variable_count(&self) -> usize {
        [&self.subject, &self.predicate, &self.object]
            .iter()
            .filter(|slot| slot.is_variable())
            .count()
    }

    /// Distinct variable names referenced by this pattern, in
    /// subject/predicate/object order, without duplicates.
    pub fn variables(&self) -> Vec<&'a str> {
        let mut names = Vec::with_capacity(3);
        for slot in [&self.subject, &self.predicate, &self.object] {
            if let Some(name) = slot.variable_name() {
                if !names.contains(&name) {
                    names.push(name);
                }
            }
        }
        names
    }

    /// True if every position is bound to a concrete term (a ground pattern).
    pub fn is_ground(&self) -> bool {
        self.variable_count() == 0
    }
}

impl<'a> fmt::Debug for Pattern<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pattern")
            .field("subject", &self.subject)
            .field("predicate", &self.predicate)
            .field("object", &self.object)
            .finish()
    }
}
