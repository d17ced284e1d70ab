//! In-flight request flags and the guard that scopes them.

use super::Store;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestFlag {
    CheckingAuth,
    SigningUp,
    LoggingIn,
    UpdatingProfile,
}

/// One boolean per auth operation, true while that operation is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestFlags {
    pub is_checking_auth: bool,
    pub is_signing_up: bool,
    pub is_logging_in: bool,
    pub is_updating_profile: bool,
}

impl Default for RequestFlags {
    /// The initial session probe counts as in flight from process start.
    fn default() -> Self {
        Self {
            is_checking_auth: true,
            is_signing_up: false,
            is_logging_in: false,
            is_updating_profile: false,
        }
    }
}

impl RequestFlags {
    pub fn get(&self, flag: RequestFlag) -> bool {
        match flag {
            RequestFlag::CheckingAuth => self.is_checking_auth,
            RequestFlag::SigningUp => self.is_signing_up,
            RequestFlag::LoggingIn => self.is_logging_in,
            RequestFlag::UpdatingProfile => self.is_updating_profile,
        }
    }

    pub fn set(&mut self, flag: RequestFlag, value: bool) {
        let slot = match flag {
            RequestFlag::CheckingAuth => &mut self.is_checking_auth,
            RequestFlag::SigningUp => &mut self.is_signing_up,
            RequestFlag::LoggingIn => &mut self.is_logging_in,
            RequestFlag::UpdatingProfile => &mut self.is_updating_profile,
        };
        *slot = value;
    }
}

/// Raises a flag on creation and lowers it on drop, whichever way the
/// owning scope exits (return, `?`, panic, or the future being dropped).
#[must_use = "the flag is lowered as soon as the guard is dropped"]
pub struct FlagGuard {
    store: Store,
    flag: RequestFlag,
}

impl FlagGuard {
    pub fn raise(store: &Store, flag: RequestFlag) -> Self {
        store.set_flag(flag, true);
        Self {
            store: store.clone(),
            flag,
        }
    }
}

impl Drop for FlagGuard {
    fn drop(&mut self) {
        self.store.set_flag(self.flag, false);
    }
}
