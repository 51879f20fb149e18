// Streaming session state machine
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    /// No subscription.
    Idle,
    /// Subscription requested, no frame yet.
    Connecting,
    /// Subscription open and frames flowing.
    Active,
    /// Teardown after a transport failure.
    Closing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionCommand {
    Start,
    FrameAccepted,
    TransportFailed,
    SubscriptionClosed,
    Pause,
    Stop,
}

/// Next state plus the side effects the owner must carry out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub next: SessionState,
    pub open_subscription: bool,
    pub close_subscription: bool,
    pub clear_buffer: bool,
    pub write_intent: Option<bool>,
}

impl Transition {
    fn stay(state: SessionState) -> Self {
        Self::to(state)
    }

    fn to(next: SessionState) -> Self {
        Self {
            next,
            open_subscription: false,
            close_subscription: false,
            clear_buffer: false,
            write_intent: None,
        }
    }
}

impl SessionState {
    pub fn has_subscription(self) -> bool {
        matches!(self, SessionState::Connecting | SessionState::Active)
    }

    pub fn apply(self, command: SessionCommand) -> Transition {
        use SessionCommand::*;
        use SessionState::*;

        match (self, command) {
            (Idle | Closing, Start) => Transition {
                open_subscription: true,
                write_intent: Some(true),
                ..Transition::to(Connecting)
            },
            (Connecting | Active, Start) => Transition::stay(self),

            (Connecting | Active, FrameAccepted) => Transition::to(Active),
            (Idle | Closing, FrameAccepted) => Transition::stay(self),

            // Fail-stop: intent is forced off whatever it was before.
            (_, TransportFailed) => Transition {
                close_subscription: self.has_subscription(),
                write_intent: Some(false),
                ..Transition::to(Closing)
            },
            (Closing, SubscriptionClosed) => Transition::to(Idle),
            (_, SubscriptionClosed) => Transition::stay(self),

            (Connecting | Active, Pause) => Transition {
                close_subscription: true,
                write_intent: Some(false),
                ..Transition::to(Idle)
            },
            (Idle | Closing, Pause) => Transition::stay(self),

            (_, Stop) => Transition {
                close_subscription: self.has_subscription(),
                clear_buffer: true,
                write_intent: self.has_subscription().then_some(false),
                ..Transition::to(Idle)
            },
        }
    }
}
