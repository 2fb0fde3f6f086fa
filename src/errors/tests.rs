//! Unit tests for error handling.

use crate::errors::errors::{Error, ErrorImpl, ErrorTip};
use crate::Position;
use std::rc::Rc;

#[test]
fn test_error_creation() {
    let error = Error::new(
        ErrorImpl::UnresolvedSymbol {
            name: "counter".to_string(),
        },
        Position(10, Rc::new("main.jot".to_string())),
    );

    assert_eq!(error.get_error_name(), "UnresolvedSymbol");
    assert_eq!(error.get_position().0, 10);
}

#[test]
fn test_break_outside_loop_error() {
    let error = Error::new(ErrorImpl::BreakOutsideLoop, Position::null());

    assert_eq!(error.get_error_name(), "BreakOutsideLoop");
    assert_eq!(
        error.get_tip().to_string(),
        "`break` can only appear inside a loop"
    );
}

#[test]
fn test_duplicate_declaration_mentions_both_sites() {
    let previous = Position(4, Rc::new("main.jot".to_string()));
    let error = Error::new(
        ErrorImpl::DuplicateDeclaration {
            name: "main".to_string(),
            previous,
        },
        Position(90, Rc::new("main.jot".to_string())),
    );

    let message = error.to_string();
    assert!(message.contains("main.jot:4"), "{}", message);
    assert!(message.contains("main.jot:90"), "{}", message);
}

#[test]
fn test_unsupported_cast_tip() {
    let error = Error::new(
        ErrorImpl::UnsupportedCast {
            from: "[3]int8".to_string(),
            to: "float64".to_string(),
        },
        Position::null(),
    );

    assert_eq!(error.get_error_name(), "UnsupportedCast");
    assert_eq!(
        error.get_tip().to_string(),
        "Cannot cast `[3]int8` to `float64`"
    );
}

#[test]
fn test_internal_errors_have_no_tip() {
    let error = Error::new(
        ErrorImpl::Verification {
            message: "broken".to_string(),
        },
        Position::null(),
    );

    assert!(matches!(error.get_tip(), ErrorTip::None));
    assert_eq!(
        error.get_internal_error(),
        &ErrorImpl::Verification {
            message: "broken".to_string()
        }
    );
}
