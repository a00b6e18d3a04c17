/// Why a training run ended.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StopReason {
    /// Every requested round ran.
    #[default]
    Completed,
    /// The test error reached zero.
    ZeroError,
    /// The test error went up with respect to the previous round.
    ErrorIncreased,
}

/// Validation based early stopping.
///
/// Stops as soon as the test error is zero or it goes up from one round to the next. There's
/// no smoothing nor patience, a single bad round is enough.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EarlyStopping {
    pub enabled: bool,
    /// Whether to roll the parameters back to the previous round when the error goes up.
    pub restore_previous: bool,
}

impl Default for EarlyStopping {
    fn default() -> Self {
        Self {
            enabled: true,
            restore_previous: true,
        }
    }
}

impl EarlyStopping {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            restore_previous: false,
        }
    }

    /// Decides whether to stop after `round`.
    ///
    /// # Arguments
    /// * `round` - The zero based index of the round that just ran.
    /// * `error` - The test error after this round.
    /// * `previous` - The test error after the previous round, ignored on round zero.
    pub fn check(&self, round: usize, error: f32, previous: f32) -> Option<StopReason> {
        if !self.enabled {
            return None;
        }

        if error == 0. {
            Some(StopReason::ZeroError)
        } else if round != 0 && error > previous {
            Some(StopReason::ErrorIncreased)
        } else {
            None
        }
    }
}
