//! Overload resolution.
//!
//! Candidates are filtered by name, parameter count and per-argument
//! assignability. When more than one survives, the one with the fewest
//! `object` parameters wins; remaining ties keep declaration order.
//! Numeric arguments are never widened to fit a parameter.

use crate::{
    errors::errors::{Diagnostics, ErrorImpl},
    Span,
};

use super::types::{Signature, Type};

fn accepts(signature: &Signature, name: &str, arguments: &[Type]) -> bool {
    signature.name == name
        && signature.parameters.len() == arguments.len()
        && signature
            .parameters
            .iter()
            .zip(arguments)
            .all(|(parameter, argument)| argument.is_assignable_to(&parameter.ty))
}

fn object_parameters(signature: &Signature) -> usize {
    signature.parameters.iter().filter(|p| p.ty.is_object()).count()
}

/// Picks the best candidate without reporting anything.
pub fn select_overload<'a>(candidates: &'a [Signature], name: &str, arguments: &[Type]) -> Option<&'a Signature> {
    candidates
        .iter()
        .filter(|candidate| accepts(candidate, name, arguments))
        .fold(None, |best: Option<&Signature>, candidate| match best {
            Some(best) if object_parameters(best) <= object_parameters(candidate) => Some(best),
            _ => Some(candidate),
        })
}

/// Like [`select_overload`], but a miss is reported as
/// `NoMatchingOverload` at `span`.
///
/// # Returns
///
/// The chosen signature, or `None` when no candidate accepts the arguments.
pub fn resolve_overload<'a>(
    candidates: &'a [Signature],
    name: &str,
    arguments: &[Type],
    diagnostics: &mut Diagnostics,
    span: Span,
) -> Option<&'a Signature> {
    let selected = select_overload(candidates, name, arguments);

    if selected.is_none() {
        let arguments = arguments.iter().map(|a| a.to_string()).collect::<Vec<String>>();
        diagnostics.error(
            ErrorImpl::NoMatchingOverload {
                name: name.to_string(),
                arguments: arguments.join(", "),
            },
            span,
        );
    }

    selected
}
