use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

use crate::{Error, Result};

/// Loading state of a tile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum TileState {
    None = 0,
    Loading = 1,
    Processing = 2,
    Ready = 3,
    Canceled = 4,
}

impl TileState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::None,
            1 => Self::Loading,
            2 => Self::Processing,
            3 => Self::Ready,
            _ => Self::Canceled,
        }
    }

    /// Whether a tile may move from `self` to `next` in one step.
    pub fn can_transition_to(self, next: TileState) -> bool {
        matches!(
            (self, next),
            (Self::None, Self::Loading)
                | (Self::Loading, Self::Processing)
                | (Self::Processing, Self::Ready)
                | (Self::None | Self::Loading | Self::Processing, Self::Canceled)
        )
    }

    /// `Ready` and `Canceled` never change again.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Ready | Self::Canceled)
    }
}

impl fmt::Display for TileState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::None => "none",
            Self::Loading => "loading",
            Self::Processing => "processing",
            Self::Ready => "ready",
            Self::Canceled => "canceled",
        };
        f.write_str(name)
    }
}

/// Tile state shared between the loader threads and the main thread.
///
/// Every transition is a compare-and-swap against the state it was validated
/// from, so a cancel from the main thread can never be overwritten by a worker
/// that read the old state.
#[derive(Debug)]
pub struct AtomicTileState(AtomicU8);

impl AtomicTileState {
    pub fn new(state: TileState) -> Self {
        Self(AtomicU8::new(state as u8))
    }

    pub fn load(&self) -> TileState {
        TileState::from_u8(self.0.load(Ordering::Acquire))
    }

    /// Move to `next` if the state machine allows it from the current state.
    ///
    /// Canceling an already canceled tile succeeds without a change.
    pub fn transition(&self, next: TileState) -> Result<TileState> {
        let mut current = self.load();
        loop {
            if current == TileState::Canceled && next == TileState::Canceled {
                return Ok(current);
            }
            if !current.can_transition_to(next) {
                return Err(Error::InvalidTransition {
                    from: current,
                    to: next,
                });
            }
            match self.0.compare_exchange(
                current as u8,
                next as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return Ok(current),
                Err(actual) => current = TileState::from_u8(actual),
            }
        }
    }
}

impl Default for AtomicTileState {
    fn default() -> Self {
        Self::new(TileState::None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [TileState; 5] = [
        TileState::None,
        TileState::Loading,
        TileState::Processing,
        TileState::Ready,
        TileState::Canceled,
    ];

    #[test]
    fn test_one_step_reachability() {
        let reachable = |from: TileState| -> Vec<TileState> {
            ALL.iter().copied().filter(|&to| from.can_transition_to(to)).collect()
        };
        assert_eq!(reachable(TileState::None), vec![TileState::Loading, TileState::Canceled]);
        assert_eq!(
            reachable(TileState::Loading),
            vec![TileState::Processing, TileState::Canceled]
        );
        assert_eq!(
            reachable(TileState::Processing),
            vec![TileState::Ready, TileState::Canceled]
        );
        assert!(reachable(TileState::Ready).is_empty());
        assert!(reachable(TileState::Canceled).is_empty());
    }

    #[test]
    fn test_atomic_transition_reports_previous() {
        let state = AtomicTileState::default();
        assert_eq!(state.transition(TileState::Loading).unwrap(), TileState::None);
        assert!(state.transition(TileState::Ready).is_err());
        assert_eq!(state.load(), TileState::Loading);
        assert_eq!(state.transition(TileState::Canceled).unwrap(), TileState::Loading);
        assert_eq!(state.transition(TileState::Canceled).unwrap(), TileState::Canceled);
        assert!(state.transition(TileState::Processing).is_err());
    }

    #[test]
    fn test_ready_is_never_canceled() {
        let state = AtomicTileState::default();
        for next in [TileState::Loading, TileState::Processing, TileState::Ready] {
            state.transition(next).unwrap();
        }
        match state.transition(TileState::Canceled) {
            Err(Error::InvalidTransition { from, to }) => {
                assert_eq!(from, TileState::Ready);
                assert_eq!(to, TileState::Canceled);
            }
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(state.load().is_terminal());
    }
}
