//! Test doubles shared across test modules
//!
//! `MemoryStore` stands in for the AWS CLI and `ScriptedPrompter` for the
//! terminal, so the managers can be exercised without either.

use anyhow::{Result, bail};
use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet, VecDeque};

use crate::active::ActiveProfile;
use crate::error::ProfileError;
use crate::prompt::Prompter;
use crate::store::{ProfileStore, SessionCredentials, TokenExchange, TokenRequest};

/// In-memory profile store with a scriptable token exchange
pub struct MemoryStore {
    profiles: RefCell<BTreeMap<String, BTreeMap<String, String>>>,
    writes: RefCell<Vec<(String, String, String)>>,
    exchanges: RefCell<Vec<(TokenRequest, Option<String>)>>,
    exchange_result: RefCell<Result<SessionCredentials, String>>,
    read_error: RefCell<Option<String>>,
    active: ActiveProfile,
}

impl MemoryStore {
    /// `active` is the indicator a real CLI child process would inherit
    pub fn new(active: &ActiveProfile) -> Self {
        Self {
            profiles: RefCell::default(),
            writes: RefCell::default(),
            exchanges: RefCell::default(),
            exchange_result: RefCell::new(Ok(session_credentials("ASIA1"))),
            read_error: RefCell::default(),
            active: active.clone(),
        }
    }

    /// Seed a profile without recording it as a write
    pub fn with_profile(self, name: &str, values: &[(&str, &str)]) -> Self {
        self.profiles.borrow_mut().insert(
            name.to_string(),
            values
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        );
        self
    }

    pub fn fail_exchange(&self, response: &str) {
        *self.exchange_result.borrow_mut() = Err(response.to_string());
    }

    /// Make every `get_config_value` fail with `message`
    pub fn fail_reads(&self, message: &str) {
        *self.read_error.borrow_mut() = Some(message.to_string());
    }

    pub fn value(&self, profile: &str, key: &str) -> Option<String> {
        self.profiles
            .borrow()
            .get(profile)
            .and_then(|p| p.get(key).cloned())
    }

    pub fn profile(&self, profile: &str) -> BTreeMap<String, String> {
        self.profiles
            .borrow()
            .get(profile)
            .cloned()
            .unwrap_or_default()
    }

    /// Every `set_config_value` call as (profile, key, value)
    pub fn writes(&self) -> Vec<(String, String, String)> {
        self.writes.borrow().clone()
    }

    /// Every token exchange with the indicator seen while it ran
    pub fn exchanges(&self) -> Vec<(TokenRequest, Option<String>)> {
        self.exchanges.borrow().clone()
    }
}

impl ProfileStore for MemoryStore {
    fn list_profiles(&self) -> Result<BTreeSet<String>> {
        Ok(self.profiles.borrow().keys().cloned().collect())
    }

    fn get_config_value(&self, profile: &str, key: &str) -> Result<Option<String>> {
        if let Some(message) = self.read_error.borrow().as_deref() {
            bail!("{}", message);
        }
        Ok(self.value(profile, key))
    }

    fn set_config_value(&self, profile: &str, key: &str, value: &str) -> Result<()> {
        self.writes
            .borrow_mut()
            .push((profile.to_string(), key.to_string(), value.to_string()));
        self.profiles
            .borrow_mut()
            .entry(profile.to_string())
            .or_default()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

impl TokenExchange for MemoryStore {
    fn get_session_token(&self, request: &TokenRequest) -> Result<SessionCredentials> {
        self.exchanges
            .borrow_mut()
            .push((request.clone(), self.active.get()));
        match &*self.exchange_result.borrow() {
            Ok(creds) => Ok(creds.clone()),
            Err(response) => Err(ProfileError::TokenExchangeFailure {
                profile: request.profile.clone(),
                response: response.clone(),
            }
            .into()),
        }
    }
}

pub fn session_credentials(access_key_id: &str) -> SessionCredentials {
    SessionCredentials {
        access_key_id: access_key_id.to_string(),
        secret_access_key: format!("{access_key_id}-secret"),
        session_token: format!("{access_key_id}-token"),
        expiration: None,
    }
}

/// Prompter answering from a queue; fails when a prompt is not expected
#[derive(Default)]
pub struct ScriptedPrompter {
    answers: RefCell<VecDeque<String>>,
    asked: RefCell<Vec<String>>,
}

impl ScriptedPrompter {
    pub fn new(answers: &[&str]) -> Self {
        Self {
            answers: RefCell::new(answers.iter().map(|a| a.to_string()).collect()),
            asked: RefCell::default(),
        }
    }

    /// Prompt messages in the order they were shown
    pub fn asked(&self) -> Vec<String> {
        self.asked.borrow().clone()
    }

    fn next(&self, message: &str) -> Result<String> {
        self.asked.borrow_mut().push(message.to_string());
        match self.answers.borrow_mut().pop_front() {
            Some(answer) => Ok(answer),
            None => bail!("Unexpected prompt: {}", message),
        }
    }
}

impl Prompter for ScriptedPrompter {
    fn secret(&self, message: &str) -> Result<String> {
        self.next(message)
    }

    fn text(&self, message: &str) -> Result<String> {
        self.next(message)
    }

    /// The answer names the option: exact label or label ending in ` <answer>`
    fn select(&self, message: &str, options: Vec<String>) -> Result<usize> {
        let answer = self.next(message)?;
        let suffix = format!(" {answer}");
        match options
            .iter()
            .position(|o| *o == answer || o.ends_with(&suffix))
        {
            Some(index) => Ok(index),
            None => bail!("'{}' is not among {:?}", answer, options),
        }
    }
}
