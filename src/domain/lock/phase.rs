//! Lifecycle of one lock acquisition.

use crate::domain::foundation::StateMachine;

/// Phase of a single `with_lock` call.
///
/// ```text
/// Idle -> Acquiring -> Held -> Releasing -> Idle
///            |-> TimedOut           (terminal, operation not run)
///            |-> Idle               (cancelled or backend error)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockPhase {
    Idle,
    Acquiring,
    Held,
    Releasing,
    TimedOut,
}

impl StateMachine for LockPhase {
    fn can_transition_to(&self, target: &Self) -> bool {
        self.valid_transitions().contains(target)
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use LockPhase::*;
        match self {
            Idle => vec![Acquiring],
            Acquiring => vec![Held, TimedOut, Idle],
            Held => vec![Releasing],
            Releasing => vec![Idle],
            TimedOut => vec![],
        }
    }
}

impl LockPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            LockPhase::Idle => "idle",
            LockPhase::Acquiring => "acquiring",
            LockPhase::Held => "held",
            LockPhase::Releasing => "releasing",
            LockPhase::TimedOut => "timed_out",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path_cycles_back_to_idle() {
        let phase = LockPhase::Idle
            .transition_to(LockPhase::Acquiring)
            .and_then(|p| p.transition_to(LockPhase::Held))
            .and_then(|p| p.transition_to(LockPhase::Releasing))
            .and_then(|p| p.transition_to(LockPhase::Idle))
            .unwrap();
        assert_eq!(phase, LockPhase::Idle);
    }

    #[test]
    fn timed_out_is_terminal() {
        assert!(LockPhase::TimedOut.is_terminal());
        assert!(LockPhase::TimedOut.transition_to(LockPhase::Acquiring).is_err());
    }

    #[test]
    fn held_cannot_skip_releasing() {
        assert!(LockPhase::Held.transition_to(LockPhase::Idle).is_err());
    }

    #[test]
    fn idle_cannot_jump_to_held() {
        assert!(LockPhase::Idle.transition_to(LockPhase::Held).is_err());
    }
}
