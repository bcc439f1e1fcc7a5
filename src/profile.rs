//! Profile naming conventions.
//!
//! Every profile awsprof manages is named `<account>:<suffix>`:
//! - `<account>:iam` holds long-lived access keys
//! - `<account>:mfa` holds session keys obtained with an MFA code
//! - `<account>:<role>` assumes a role from one of the two above
//!
//! Anything else (e.g. `default`) is left alone and parsed as `Other`.

use std::fmt;

use crate::error::ProfileError;

pub const IAM_SUFFIX: &str = "iam";
pub const MFA_SUFFIX: &str = "mfa";

/// Maximum length of an account or role name
const MAX_SEGMENT_LEN: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ProfileName {
    Iam { account: String },
    Mfa { account: String },
    Role { account: String, role: String },
    Other(String),
}

impl ProfileName {
    pub fn parse(name: &str) -> Self {
        match name.split_once(':') {
            Some((account, suffix))
                if !account.is_empty() && !suffix.is_empty() && !suffix.contains(':') =>
            {
                let account = account.to_string();
                match suffix {
                    IAM_SUFFIX => Self::Iam { account },
                    MFA_SUFFIX => Self::Mfa { account },
                    role => Self::Role {
                        account,
                        role: role.to_string(),
                    },
                }
            }
            _ => Self::Other(name.to_string()),
        }
    }

    pub fn iam(account: &str) -> Self {
        Self::Iam {
            account: account.to_string(),
        }
    }

    pub fn mfa(account: &str) -> Self {
        Self::Mfa {
            account: account.to_string(),
        }
    }

    pub fn role(account: &str, role: &str) -> Self {
        Self::Role {
            account: account.to_string(),
            role: role.to_string(),
        }
    }

    pub fn account(&self) -> Option<&str> {
        match self {
            Self::Iam { account } | Self::Mfa { account } | Self::Role { account, .. } => {
                Some(account)
            }
            Self::Other(_) => None,
        }
    }

    /// The IAM profile whose keys back this MFA profile
    pub fn paired_iam(&self) -> Option<Self> {
        match self {
            Self::Mfa { account } => Some(Self::iam(account)),
            _ => None,
        }
    }

    pub fn is_iam(&self) -> bool {
        matches!(self, Self::Iam { .. })
    }

    pub fn is_mfa(&self) -> bool {
        matches!(self, Self::Mfa { .. })
    }

    /// Short label for tables
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Iam { .. } => "iam",
            Self::Mfa { .. } => "mfa",
            Self::Role { .. } => "role",
            Self::Other(_) => "-",
        }
    }
}

impl fmt::Display for ProfileName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Iam { account } => write!(f, "{account}:{IAM_SUFFIX}"),
            Self::Mfa { account } => write!(f, "{account}:{MFA_SUFFIX}"),
            Self::Role { account, role } => write!(f, "{account}:{role}"),
            Self::Other(name) => f.write_str(name),
        }
    }
}

/// Validate an account or role name before it becomes part of a profile name
pub fn validate_segment(what: &'static str, name: &str) -> Result<(), ProfileError> {
    let invalid = |reason| ProfileError::InvalidName {
        what,
        name: name.to_string(),
        reason,
    };

    if name.is_empty() {
        return Err(invalid("cannot be empty"));
    }
    if name.chars().count() > MAX_SEGMENT_LEN {
        return Err(invalid("cannot be longer than 64 characters"));
    }
    if name.contains(':') {
        return Err(invalid("':' separates account and role"));
    }
    if name.chars().any(char::is_whitespace) {
        return Err(invalid("whitespace is not allowed"));
    }
    Ok(())
}
