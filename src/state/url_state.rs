/// URL lifecycle definitions for tracking crawl progress
use std::fmt;

/// Represents where a URL is in the crawl process
///
/// The only legal path is `Discovered → Queued → InFlight → Visited`.
/// A visited URL never goes back to the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UrlState {
    /// Link was found in a page but not admitted yet
    Discovered,

    /// URL sits in the queue table waiting for a worker
    Queued,

    /// A worker took the URL and the fetch has not completed
    InFlight,

    /// Fetch completed (successfully or with a recorded error)
    Visited,
}

impl UrlState {
    /// Returns true if no further processing will happen
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Visited)
    }

    /// Returns true if the URL occupies a slot in the visited table
    pub fn is_in_visited_table(&self) -> bool {
        matches!(self, Self::InFlight | Self::Visited)
    }

    /// Checks whether moving to `next` is a legal transition
    pub fn can_transition_to(&self, next: UrlState) -> bool {
        matches!(
            (self, next),
            (Self::Discovered, Self::Queued)
                | (Self::Queued, Self::InFlight)
                | (Self::InFlight, Self::Visited)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Discovered => "discovered",
            Self::Queued => "queued",
            Self::InFlight => "in_flight",
            Self::Visited => "visited",
        }
    }
}

impl fmt::Display for UrlState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_transitions() {
        assert!(UrlState::Discovered.can_transition_to(UrlState::Queued));
        assert!(UrlState::Queued.can_transition_to(UrlState::InFlight));
        assert!(UrlState::InFlight.can_transition_to(UrlState::Visited));
    }

    #[test]
    fn test_no_requeue_after_visit() {
        assert!(!UrlState::Visited.can_transition_to(UrlState::Queued));
        assert!(!UrlState::InFlight.can_transition_to(UrlState::Queued));
        assert!(!UrlState::Queued.can_transition_to(UrlState::Visited));
    }

    #[test]
    fn test_terminal_and_table_membership() {
        assert!(UrlState::Visited.is_terminal());
        assert!(!UrlState::InFlight.is_terminal());
        assert!(UrlState::InFlight.is_in_visited_table());
        assert!(!UrlState::Queued.is_in_visited_table());
    }

    #[test]
    fn test_display() {
        assert_eq!(UrlState::InFlight.to_string(), "in_flight");
    }
}
