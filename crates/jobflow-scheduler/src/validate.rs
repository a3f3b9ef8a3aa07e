//! Declaration and operation input checks.
//!
//! Declarations that fail validation are excluded from registration with no
//! side effect; one malformed declaration never blocks the others.
//! Operation inputs are checked independently, with a narrower rule set per
//! operation, and rejected before any engine call.

use chrono_tz::Tz;
use thiserror::Error;

use jobflow_types::{JobDeclaration, JobNames, RunEveryOptions, ScheduleWhen};

use crate::ControlPlaneError;

/// Constraint violated by a job declaration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DeclarationError {
    #[error("job name is empty")]
    EmptyName,

    #[error("recurrence expression is empty")]
    EmptyEvery,

    #[error("schedule expression is empty")]
    EmptySchedule,
}

/// Check one declaration against the registration schema.
///
/// Handler presence and option shapes are enforced by the type system;
/// this covers what types cannot.
pub fn validate_declaration(decl: &JobDeclaration) -> Result<(), DeclarationError> {
    if decl.name.is_empty() {
        return Err(DeclarationError::EmptyName);
    }
    if let Some(every) = &decl.every {
        if every.is_empty() {
            return Err(DeclarationError::EmptyEvery);
        }
    }
    if let Some(ScheduleWhen::Expr(expr)) = &decl.schedule {
        if expr.is_empty() {
            return Err(DeclarationError::EmptySchedule);
        }
    }
    Ok(())
}

pub(crate) fn require_name(name: &str) -> Result<(), ControlPlaneError> {
    if name.is_empty() {
        return Err(ControlPlaneError::Validation("job name is empty".to_string()));
    }
    Ok(())
}

pub(crate) fn require_names(names: &JobNames) -> Result<(), ControlPlaneError> {
    if names.is_empty() {
        return Err(ControlPlaneError::Validation(
            "job name list is empty".to_string(),
        ));
    }
    if names.iter().any(str::is_empty) {
        return Err(ControlPlaneError::Validation("job name is empty".to_string()));
    }
    Ok(())
}

pub(crate) fn require_expression(kind: &str, expr: &str) -> Result<(), ControlPlaneError> {
    if expr.is_empty() {
        return Err(ControlPlaneError::Validation(format!(
            "{kind} expression is empty"
        )));
    }
    Ok(())
}

/// Reject an unparseable IANA timezone before it reaches the engine.
pub(crate) fn require_timezone(options: &RunEveryOptions) -> Result<(), ControlPlaneError> {
    if let Some(tz) = &options.timezone {
        tz.parse::<Tz>().map_err(|_| {
            ControlPlaneError::Validation(format!("invalid timezone: {tz}"))
        })?;
    }
    Ok(())
}
