//! The active-profile indicator.
//!
//! The AWS CLI picks its default profile from `AWS_PROFILE`. awsprof keeps
//! that value in an explicit handle instead of mutating the process
//! environment: the CLI adapter exports it to each child process, and
//! commands persist it to the state file when they change it.

use std::cell::RefCell;
use std::rc::Rc;

/// Environment variable the AWS CLI reads its default profile from
pub const PROFILE_ENV_VAR: &str = "AWS_PROFILE";

/// Shared handle over the current profile name.
///
/// Clones observe the same value. awsprof is single-threaded, so the handle
/// is `Rc`-based.
#[derive(Debug, Clone, Default)]
pub struct ActiveProfile {
    current: Rc<RefCell<Option<String>>>,
}

impl ActiveProfile {
    pub fn new(initial: Option<String>) -> Self {
        Self {
            current: Rc::new(RefCell::new(initial.filter(|p| !p.is_empty()))),
        }
    }

    /// Seed from `AWS_PROFILE`, treating an empty value as unset
    pub fn from_env() -> Self {
        Self::new(std::env::var(PROFILE_ENV_VAR).ok())
    }

    pub fn get(&self) -> Option<String> {
        self.current.borrow().clone()
    }

    pub fn set(&self, profile: impl Into<String>) {
        *self.current.borrow_mut() = Some(profile.into());
    }

    /// Clear the indicator until the returned guard is dropped.
    ///
    /// The previous value is put back on drop, so it is restored on early
    /// returns and unwinding as well as on success.
    pub fn suspend(&self) -> Suspended {
        let saved = self.current.borrow_mut().take();
        tracing::debug!(?saved, "Suspending active profile");
        Suspended {
            handle: self.clone(),
            saved,
        }
    }
}

/// Guard returned by [`ActiveProfile::suspend`]
#[must_use = "the active profile is restored as soon as the guard is dropped"]
pub struct Suspended {
    handle: ActiveProfile,
    saved: Option<String>,
}

impl Drop for Suspended {
    fn drop(&mut self) {
        tracing::debug!(restored = ?self.saved, "Restoring active profile");
        *self.handle.current.borrow_mut() = self.saved.take();
    }
}
