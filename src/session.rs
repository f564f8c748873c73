/// Login state of a client
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Session {
    #[default]
    LoggedOut,
    /// The server rejected the last session id; the next request logs in again
    Expired,
    LoggedIn {
        sid: String,
    },
}

impl Session {
    /// Session id, only available while logged in
    #[must_use]
    pub fn sid(&self) -> Option<&str> {
        match self {
            Self::LoggedIn { sid } => Some(sid),
            Self::LoggedOut | Self::Expired => None,
        }
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        matches!(self, Self::LoggedIn { .. })
    }

    /// Stores the session id of a successful login
    pub fn establish(&mut self, sid: String) {
        *self = Self::LoggedIn { sid };
    }

    /// Drops the session id so that the next request logs in again
    pub fn expire(&mut self) {
        if self.is_active() {
            *self = Self::Expired;
        }
    }

    /// Expires the session only if `sid` is the current session id
    pub fn expire_if(&mut self, sid: &str) -> bool {
        if self.sid() == Some(sid) {
            *self = Self::Expired;
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state() {
        let session = Session::default();
        assert_eq!(Session::LoggedOut, session);
        assert!(!session.is_active());
        assert_eq!(None, session.sid());
    }

    #[test]
    fn test_establish_and_expire() {
        let mut session = Session::default();
        session.establish("456".into());
        assert!(session.is_active());
        assert_eq!(Some("456"), session.sid());

        session.expire();
        assert_eq!(Session::Expired, session);
        assert_eq!(None, session.sid());

        session.establish("789".into());
        assert_eq!(Some("789"), session.sid());
    }

    #[test]
    fn test_expire_if_keeps_newer_session() {
        let mut session = Session::default();
        assert!(!session.expire_if("456"));

        session.establish("789".into());
        assert!(!session.expire_if("456"));
        assert_eq!(Some("789"), session.sid());

        assert!(session.expire_if("789"));
        assert_eq!(Session::Expired, session);
    }

    #[test]
    fn test_expire_logged_out_session_is_noop() {
        let mut session = Session::default();
        session.expire();
        assert_eq!(Session::LoggedOut, session);
    }
}
