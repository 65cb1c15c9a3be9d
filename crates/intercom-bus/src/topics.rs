//! Topic layout under the configured base path.

const UNLOCK: &str = "unlock";
const AVAILABLE: &str = "available";
const CALL: &str = "call";

/// Topics used by the controller.
///
/// # Examples
///
/// ```
/// use intercom_bus::Topics;
///
/// let topics = Topics::new("home/frontdoor/");
/// assert_eq!(topics.unlock(), "home/frontdoor/unlock");
/// assert_eq!(topics.available(), "home/frontdoor/available");
/// assert_eq!(topics.call(), "home/frontdoor/call");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topics {
    unlock: String,
    available: String,
    call: String,
}

impl Topics {
    pub fn new(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            unlock: format!("{}/{}", base, UNLOCK),
            available: format!("{}/{}", base, AVAILABLE),
            call: format!("{}/{}", base, CALL),
        }
    }

    /// Subscribed: any message triggers an unlock.
    pub fn unlock(&self) -> &str {
        &self.unlock
    }

    /// Published `online` on each liveness reply.
    pub fn available(&self) -> &str {
        &self.available
    }

    /// Published `ON` on each button press.
    pub fn call(&self) -> &str {
        &self.call
    }

    pub fn is_unlock(&self, topic: &str) -> bool {
        topic == self.unlock
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("intercom/frontdoor")]
    #[case("intercom/frontdoor/")]
    #[case("intercom/frontdoor//")]
    fn test_trailing_slashes_ignored(#[case] base: &str) {
        let topics = Topics::new(base);
        assert_eq!(topics.unlock(), "intercom/frontdoor/unlock");
        assert!(topics.is_unlock("intercom/frontdoor/unlock"));
        assert!(!topics.is_unlock("intercom/frontdoor/call"));
    }
}
