//! Reference tokens: string values that point at another blueprint.
//!
//! The data source uses two spellings, both case-sensitive:
//!
//! ```text
//! !bp_<guid>                 short form: the remainder is the target
//! Blueprint:<guid>:<extra>   composite form: exactly three segments
//! ```
//!
//! A composite token with the wrong segment count, an empty target or the
//! `NULL` sentinel means "no reference". So does any target that is not a
//! GUID. None of these are errors; the value is simply an ordinary string.

use crate::types::Guid;

pub const SHORT_PREFIX: &str = "!bp_";
pub const COMPOSITE_KIND: &str = "Blueprint";
pub const NULL_SENTINEL: &str = "NULL";

/// Which spelling a token used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenForm {
    Short,
    Composite,
}

/// A resolved reference token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reference {
    pub target: Guid,
    pub form: TokenForm,
}

/// Parse a string value as a reference token.
pub fn parse_token(value: &str) -> Option<Reference> {
    if let Some(rest) = value.strip_prefix(SHORT_PREFIX) {
        return Guid::parse(rest).map(|target| Reference {
            target,
            form: TokenForm::Short,
        });
    }

    let rest = value.strip_prefix(COMPOSITE_KIND)?.strip_prefix(':')?;
    let mut segments = rest.split(':');
    let target = segments.next()?;
    // kind:target:extra, nothing more and nothing less
    if segments.next().is_none() || segments.next().is_some() {
        return None;
    }
    if target.is_empty() || target == NULL_SENTINEL {
        return None;
    }
    Guid::parse(target).map(|target| Reference {
        target,
        form: TokenForm::Composite,
    })
}

/// The target a string value refers to, if it is a reference token at all.
pub fn parse_reference(value: &str) -> Option<Guid> {
    parse_token(value).map(|r| r.target)
}
