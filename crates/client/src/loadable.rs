//! Tri-state remote reads and latest-wins request tracking.

use tracing::debug;

/// State of a value fetched from the network.
///
/// `Failed` carries the displayable error message; the typed error stays with
/// whoever issued the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Loadable<T> {
    Loading,
    Ready(T),
    Failed(String),
}

impl<T> Loadable<T> {
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    /// The loaded value, if ready.
    #[must_use]
    pub const fn ready(&self) -> Option<&T> {
        match self {
            Self::Ready(value) => Some(value),
            Self::Loading | Self::Failed(_) => None,
        }
    }

    /// The failure message, if failed.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Failed(message) => Some(message),
            Self::Loading | Self::Ready(_) => None,
        }
    }

    /// Settle from a request outcome.
    pub fn from_result<E: std::fmt::Display>(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => Self::Ready(value),
            Err(e) => Self::Failed(e.to_string()),
        }
    }
}

impl<T> Default for Loadable<T> {
    fn default() -> Self {
        Self::Loading
    }
}

/// Identifies one issued request; only the newest token may settle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestToken(u64);

/// A [`Loadable`] fed by overlapping requests where only the most recently
/// issued one may settle the state.
///
/// ```
/// use phoneplace_client::loadable::{LatestWins, Loadable};
///
/// let mut products = LatestWins::<Vec<&str>>::new();
/// let first = products.begin();
/// let second = products.begin();
///
/// assert!(products.settle(second, Ok::<_, String>(vec!["b"])));
/// // The older response arrives late and is dropped.
/// assert!(!products.settle(first, Ok::<_, String>(vec!["a"])));
/// assert_eq!(products.state().ready(), Some(&vec!["b"]));
/// ```
#[derive(Debug, Clone)]
pub struct LatestWins<T> {
    state: Loadable<T>,
    issued: u64,
}

impl<T> Default for LatestWins<T> {
    fn default() -> Self {
        Self {
            state: Loadable::Loading,
            issued: 0,
        }
    }
}

impl<T> LatestWins<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn state(&self) -> &Loadable<T> {
        &self.state
    }

    /// Issue a new token and enter `Loading`. Every earlier token goes stale.
    pub fn begin(&mut self) -> RequestToken {
        self.issued += 1;
        self.state = Loadable::Loading;
        RequestToken(self.issued)
    }

    /// Whether `token` is the most recently issued one.
    #[must_use]
    pub const fn is_current(&self, token: RequestToken) -> bool {
        token.0 == self.issued
    }

    /// Apply a result if `token` is still current. Returns whether it was
    /// applied; stale results are dropped, successes and failures alike.
    pub fn settle<E: std::fmt::Display>(
        &mut self,
        token: RequestToken,
        result: Result<T, E>,
    ) -> bool {
        if !self.is_current(token) {
            debug!(
                token = token.0,
                latest = self.issued,
                ok = result.is_ok(),
                "Dropping stale response"
            );
            return false;
        }
        self.state = Loadable::from_result(result);
        true
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_loading() {
        let latest = LatestWins::<u32>::new();
        assert!(latest.state().is_loading());
    }

    #[test]
    fn test_stale_failure_does_not_clobber_success() {
        let mut latest = LatestWins::<u32>::new();
        let old = latest.begin();
        let new = latest.begin();

        assert!(latest.settle(new, Ok::<_, String>(7)));
        assert!(!latest.settle(old, Err::<u32, _>("timeout".to_string())));
        assert_eq!(latest.state(), &Loadable::Ready(7));
    }

    #[test]
    fn test_begin_resets_to_loading() {
        let mut latest = LatestWins::<u32>::new();
        let token = latest.begin();
        latest.settle(token, Ok::<_, String>(1));
        latest.begin();
        assert!(latest.state().is_loading());
        assert!(!latest.is_current(token));
    }

    #[test]
    fn test_failure_keeps_message() {
        let mut latest = LatestWins::<u32>::new();
        let token = latest.begin();
        assert!(latest.settle(token, Err::<u32, _>("Server error (503): down")));
        assert_eq!(latest.state().error(), Some("Server error (503): down"));
        assert!(latest.state().ready().is_none());
    }
}
