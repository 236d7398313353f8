use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug, PartialEq)]
pub enum ProfileError {
    #[error("Linked account limit reached: max {0} account(s) on this plan")]
    LinkedAccountLimit(usize),
    #[error("Account already linked: {0}")]
    AlreadyLinked(String),
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum AccountProvider {
    Gmail,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LinkedAccount {
    pub id: String,
    pub provider: AccountProvider,
    pub email: String,
    pub last_scan: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display)]
pub enum Plan {
    Free,
    Premium,
}

impl Plan {
    /// `None` means unlimited.
    pub fn scan_limit(&self, free_scan_limit: u32) -> Option<u32> {
        match self {
            Plan::Free => Some(free_scan_limit),
            Plan::Premium => None,
        }
    }

    pub fn linked_account_limit(&self) -> usize {
        match self {
            Plan::Free => 1,
            Plan::Premium => 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
    pub avatar_url: Option<String>,
    pub linked_accounts: Vec<LinkedAccount>,
    pub is_premium: bool,
    /// Only meaningful while `is_premium` is false.
    #[serde(default)]
    pub free_scans_used: u32,
}

impl UserProfile {
    pub fn new(id: String, email: String) -> Self {
        Self {
            id,
            email,
            name: None,
            avatar_url: None,
            linked_accounts: Vec::new(),
            is_premium: false,
            free_scans_used: 0,
        }
    }

    pub fn plan(&self) -> Plan {
        if self.is_premium {
            Plan::Premium
        } else {
            Plan::Free
        }
    }

    pub fn link_account(
        &mut self,
        provider: AccountProvider,
        email: &str,
    ) -> Result<LinkedAccount, ProfileError> {
        let email = email.trim();
        if self
            .linked_accounts
            .iter()
            .any(|a| a.provider == provider && a.email.eq_ignore_ascii_case(email))
        {
            return Err(ProfileError::AlreadyLinked(email.to_string()));
        }

        let limit = self.plan().linked_account_limit();
        if self.linked_accounts.len() >= limit {
            return Err(ProfileError::LinkedAccountLimit(limit));
        }

        let account = LinkedAccount {
            id: Uuid::new_v4().to_string(),
            provider,
            email: email.to_string(),
            last_scan: None,
        };
        self.linked_accounts.push(account.clone());
        Ok(account)
    }

    /// Returns whether anything was removed.
    pub fn unlink_account(&mut self, id: &str) -> bool {
        let before = self.linked_accounts.len();
        self.linked_accounts.retain(|a| a.id != id);
        self.linked_accounts.len() != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> UserProfile {
        UserProfile::new("user123".to_string(), "user@example.com".to_string())
    }

    #[test]
    fn free_plan_allows_one_linked_account() {
        let mut user = profile();
        user.link_account(AccountProvider::Gmail, "a@gmail.com").unwrap();

        let err = user
            .link_account(AccountProvider::Gmail, "b@gmail.com")
            .unwrap_err();
        assert_eq!(err, ProfileError::LinkedAccountLimit(1));
    }

    #[test]
    fn premium_plan_allows_five_and_rejects_duplicates() {
        let mut user = profile();
        user.is_premium = true;

        for i in 0..5 {
            user.link_account(AccountProvider::Gmail, &format!("u{}@gmail.com", i))
                .unwrap();
        }
        assert!(matches!(
            user.link_account(AccountProvider::Gmail, "U0@gmail.com"),
            Err(ProfileError::AlreadyLinked(_))
        ));
        assert!(matches!(
            user.link_account(AccountProvider::Gmail, "u5@gmail.com"),
            Err(ProfileError::LinkedAccountLimit(5))
        ));
    }

    #[test]
    fn unlink_is_idempotent() {
        let mut user = profile();
        let linked = user
            .link_account(AccountProvider::Gmail, " a@gmail.com ")
            .unwrap();
        assert_eq!(linked.email, "a@gmail.com");
        assert_eq!(user.linked_accounts, vec![linked.clone()]);

        let id = linked.id;
        assert!(user.unlink_account(&id));
        assert!(!user.unlink_account(&id));
        assert!(user.linked_accounts.is_empty());
    }

    #[test]
    fn plan_limits() {
        assert_eq!(Plan::Free.scan_limit(1), Some(1));
        assert_eq!(Plan::Premium.scan_limit(1), None);
    }
}
