use std::fmt;

/// What the robot is currently doing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BehavioralState {
    #[default]
    Searching,
    Found,
    Seeking,
    Pushing,
}

impl fmt::Display for BehavioralState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BehavioralState::Searching => "Searching",
            BehavioralState::Found => "Found",
            BehavioralState::Seeking => "Seeking",
            BehavioralState::Pushing => "Pushing",
        };
        write!(f, "{}", name)
    }
}
