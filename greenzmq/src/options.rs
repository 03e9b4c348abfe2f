//! Adapter configuration options
//!
//! These do not touch libzmq socket options (set those on the raw socket);
//! they only tune how the adapter propagates wakeups between directions.

/// How a completed operation notifies the opposite direction.
///
/// Any send, receive or readiness query makes libzmq process pending
/// events, which can silently change the readiness of the *other* direction
/// without the descriptor signalling again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WakePolicy {
    /// Unconditionally wake the opposite gate.
    ///
    /// Possibly spurious, but wakes coalesce when operations run in a tight
    /// loop, so the cost per call stays negligible.
    Always,

    /// Query ZMQ_EVENTS and wake only the gates that are actually ready.
    ///
    /// No spurious wakeups, at the price of forcing an event-processing pass.
    ExplicitCheck,
}

/// Adapter configuration options.
///
/// # Examples
///
/// ```
/// use greenzmq::options::{AdapterOptions, WakePolicy};
///
/// let opts = AdapterOptions::new()
///     .with_locked_wake(WakePolicy::ExplicitCheck)
///     .with_check_before_park(true);
/// assert_eq!(opts.fast_wake, WakePolicy::ExplicitCheck);
/// ```
#[derive(Debug, Clone)]
pub struct AdapterOptions {
    /// Policy after blocking calls on locked directions
    ///
    /// - Default: `Always`
    pub locked_wake: WakePolicy,

    /// Policy after no-block calls and after calls on lock-free directions
    ///
    /// - Default: `ExplicitCheck`
    pub fast_wake: WakePolicy,

    /// Query readiness before parking after a would-block
    ///
    /// The failed attempt may itself have consumed the descriptor's edge.
    /// When the query reports the caller's direction as ready the task yields
    /// once and retries instead of waiting on a signal that already fired.
    /// Either way every would-block costs exactly one suspension.
    /// - Default: `true`
    pub check_before_park: bool,
}

impl Default for AdapterOptions {
    fn default() -> Self {
        Self {
            locked_wake: WakePolicy::Always,
            fast_wake: WakePolicy::ExplicitCheck,
            check_before_park: true,
        }
    }
}

impl AdapterOptions {
    /// Create new adapter options with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the policy used on locked directions.
    pub fn with_locked_wake(mut self, policy: WakePolicy) -> Self {
        self.locked_wake = policy;
        self
    }

    /// Set the policy used on the fast path.
    pub fn with_fast_wake(mut self, policy: WakePolicy) -> Self {
        self.fast_wake = policy;
        self
    }

    /// Enable or disable the readiness check before parking.
    pub fn with_check_before_park(mut self, enabled: bool) -> Self {
        self.check_before_park = enabled;
        self
    }

    /// Use one policy on every path.
    pub fn with_uniform_wake(self, policy: WakePolicy) -> Self {
        self.with_locked_wake(policy).with_fast_wake(policy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_split_policy_by_path() {
        let opts = AdapterOptions::default();
        assert_eq!(opts.locked_wake, WakePolicy::Always);
        assert_eq!(opts.fast_wake, WakePolicy::ExplicitCheck);
        assert!(opts.check_before_park);
    }

    #[test]
    fn test_uniform_wake() {
        let opts = AdapterOptions::new().with_uniform_wake(WakePolicy::Always);
        assert_eq!(opts.locked_wake, WakePolicy::Always);
        assert_eq!(opts.fast_wake, WakePolicy::Always);
    }
}
