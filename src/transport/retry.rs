//! Bounded retry policy shared by load and unload.

/// Recovery action schedule within a retry budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Backoff {
    /// Never.
    None,
    /// Once, right after attempt `after`.
    Once {
        /// Attempt number the action follows.
        after: u16,
    },
    /// After every `interval`-th attempt, except the last one.
    Every {
        /// Attempts between actions.
        interval: u16,
    },
}

/// Maximum attempts plus when to run the recovery action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RetryPolicy {
    /// Attempts before giving up.
    pub max_attempts: u16,
    /// Recovery action schedule.
    pub backoff: Backoff,
}

/// One attempt handed out by [`RetryPolicy::attempts`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attempt {
    /// 1-based attempt number.
    pub number: u16,
    /// Whether the recovery action should follow this attempt.
    pub backoff_due: bool,
}

impl RetryPolicy {
    /// Probing policy while loading: one recovery halfway through.
    pub const fn load(max_attempts: u16) -> Self {
        Self {
            max_attempts,
            backoff: Backoff::Once {
                after: max_attempts / 2,
            },
        }
    }

    /// Withdrawal policy while unloading: periodic recovery.
    pub const fn unload(max_attempts: u16) -> Self {
        Self {
            max_attempts,
            backoff: Backoff::Every { interval: 50 },
        }
    }

    /// Whether the recovery action follows attempt `number`.
    pub fn backoff_due(&self, number: u16) -> bool {
        match self.backoff {
            Backoff::None => false,
            Backoff::Once { after } => after > 0 && number == after,
            Backoff::Every { interval } => {
                interval > 0 && number % interval == 0 && number < self.max_attempts
            }
        }
    }

    /// Iterate over the attempts of this budget.
    pub fn attempts(&self) -> Attempts {
        Attempts {
            policy: *self,
            next: 1,
        }
    }
}

/// Iterator over the attempts of a [`RetryPolicy`].
#[derive(Debug, Clone)]
pub struct Attempts {
    policy: RetryPolicy,
    next: u16,
}

impl Iterator for Attempts {
    type Item = Attempt;

    fn next(&mut self) -> Option<Attempt> {
        if self.next > self.policy.max_attempts {
            return None;
        }
        let number = self.next;
        self.next += 1;
        Some(Attempt {
            number,
            backoff_due: self.policy.backoff_due(number),
        })
    }
}
