//! Admission state of the work queues
use crate::state::StateMachine;
use serde::Serialize;

/// Whether the work queues currently admit and hand out work
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CrawlerState {
    Ready,
    Working,
    Paused,
    Stopping,
    /// Terminal error state, no transition leaves it
    Unknown,
}

/// Commands accepted by the admission state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrawlerCommand {
    Start,
    Pause,
    Resume,
    Stop,
    Reset,
    Fault,
}

impl CrawlerState {
    /// Returns true if new work may be memorized in this state
    pub fn admits_work(&self) -> bool {
        matches!(self, Self::Working | Self::Paused)
    }
}

/// Builds the admission state machine, starting in `Ready`
pub fn crawler_state_machine() -> StateMachine<CrawlerState, CrawlerCommand> {
    use CrawlerCommand::*;
    use CrawlerState::*;

    StateMachine::new(
        [
            ((Ready, Start), Working),
            ((Working, Pause), Paused),
            ((Paused, Resume), Working),
            ((Working, Stop), Stopping),
            ((Paused, Stop), Stopping),
            ((Stopping, Reset), Ready),
            ((Ready, Fault), Unknown),
            ((Working, Fault), Unknown),
            ((Paused, Fault), Unknown),
            ((Stopping, Fault), Unknown),
        ],
        Ready,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_cycle() {
        let machine = crawler_state_machine();
        for command in [
            CrawlerCommand::Start,
            CrawlerCommand::Pause,
            CrawlerCommand::Resume,
            CrawlerCommand::Stop,
            CrawlerCommand::Reset,
        ] {
            assert!(machine.try_transit_next(command), "{:?} rejected", command);
        }
        assert_eq!(machine.current_state(), CrawlerState::Ready);
    }

    #[test]
    fn test_cannot_pause_when_ready() {
        let machine = crawler_state_machine();
        assert!(!machine.try_transit_next(CrawlerCommand::Pause));
        assert!(!machine.try_transit_next(CrawlerCommand::Reset));
        assert_eq!(machine.current_state(), CrawlerState::Ready);
    }

    #[test]
    fn test_unknown_is_terminal() {
        let machine = crawler_state_machine();
        assert!(machine.try_transit_next(CrawlerCommand::Fault));
        for command in [
            CrawlerCommand::Start,
            CrawlerCommand::Resume,
            CrawlerCommand::Stop,
            CrawlerCommand::Reset,
            CrawlerCommand::Fault,
        ] {
            assert!(!machine.try_transit_next(command));
        }
        assert_eq!(machine.current_state(), CrawlerState::Unknown);
    }

    #[test]
    fn test_admits_work() {
        assert!(CrawlerState::Working.admits_work());
        assert!(CrawlerState::Paused.admits_work());
        assert!(!CrawlerState::Ready.admits_work());
        assert!(!CrawlerState::Stopping.admits_work());
        assert!(!CrawlerState::Unknown.admits_work());
    }
}
