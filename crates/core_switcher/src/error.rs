//! Errors raised by the switcher engine.

use thiserror::Error;

use crate::switcher::SwitcherState;

/// Errors that can occur while driving a switcher.
///
/// All of these are programming errors on the caller's side. Host races
/// (vanished windows, missing icons, denied grabs) are tolerated by the engine
/// and never surface here.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SwitcherError {
    #[error("Switcher has been destroyed")]
    Destroyed,

    #[error("Operation `{op}` is not valid while the switcher is {state:?}")]
    InvalidState {
        op: &'static str,
        state: SwitcherState,
    },

    #[error("Cannot open a switcher without windows")]
    EmptyWindowList,

    #[error("Start index {0} is out of bounds (len: {1})")]
    StartIndexOutOfBounds(usize, usize),

    #[error("Index {0} is out of bounds (len: {1})")]
    IndexOutOfBounds(usize, usize),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = SwitcherError::InvalidState {
            op: "next",
            state: SwitcherState::Closing,
        };
        assert_eq!(err.to_string(), "Operation `next` is not valid while the switcher is Closing");
        assert_eq!(
            SwitcherError::StartIndexOutOfBounds(4, 2).to_string(),
            "Start index 4 is out of bounds (len: 2)"
        );
    }
}
