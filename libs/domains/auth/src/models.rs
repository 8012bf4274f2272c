use chrono::{DateTime, Duration, Utc};
use contracts::users::{UpdateProfileRequest, UserDto};
use rand::Rng;
use rand::distributions::Alphanumeric;
use serde::{Deserialize, Serialize};

/// Consecutive failures that trigger a lockout.
pub const MAX_FAILED_LOGIN_ATTEMPTS: i32 = 5;

pub const LOCKOUT_DURATION_MINUTES: i64 = 15;

pub const PASSWORD_RESET_TOKEN_HOURS: i64 = 24;

/// Role given to users the identity provider sends without any.
pub const DEFAULT_ROLE: &str = "User";

const TOKEN_LENGTH: usize = 64;

/// Local user record.
///
/// `id` is the identity provider subject for provider-created users. `password_hash`
/// is empty unless the account was registered locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: Option<String>,
    pub is_active: bool,
    pub is_email_verified: bool,
    pub is_phone_verified: bool,
    pub is_two_factor_enabled: bool,
    #[serde(skip_serializing)]
    pub two_factor_secret: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
    pub last_password_change_at: Option<DateTime<Utc>>,
    pub failed_login_attempts: i32,
    pub lockout_end: Option<DateTime<Utc>>,
    pub email_verification_token: Option<String>,
    pub email_verification_sent_at: Option<DateTime<Utc>>,
    pub password_reset_token: Option<String>,
    pub password_reset_sent_at: Option<DateTime<Utc>>,
    pub password_reset_token_expires_at: Option<DateTime<Utc>>,
    pub roles: Vec<String>,
    pub permissions: Vec<String>,
    pub require_password_change: bool,
    pub profile_picture_url: Option<String>,
    pub time_zone: String,
    pub language: String,
    pub created_by: Option<String>,
    pub updated_by: Option<String>,
}

fn random_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LENGTH)
        .map(char::from)
        .collect()
}

impl User {
    pub fn new(id: impl Into<String>, email: impl Into<String>, username: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            email: email.into(),
            username: username.into(),
            password_hash: String::new(),
            first_name: String::new(),
            last_name: String::new(),
            phone_number: None,
            is_active: true,
            is_email_verified: false,
            is_phone_verified: false,
            is_two_factor_enabled: false,
            two_factor_secret: None,
            created_at: now,
            updated_at: now,
            last_login_at: None,
            last_password_change_at: None,
            failed_login_attempts: 0,
            lockout_end: None,
            email_verification_token: None,
            email_verification_sent_at: None,
            password_reset_token: None,
            password_reset_sent_at: None,
            password_reset_token_expires_at: None,
            roles: vec![DEFAULT_ROLE.to_string()],
            permissions: Vec::new(),
            require_password_change: false,
            profile_picture_url: None,
            time_zone: "UTC".to_string(),
            language: "en".to_string(),
            created_by: None,
            updated_by: None,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    pub fn is_locked_out(&self) -> bool {
        self.is_locked_out_at(Utc::now())
    }

    pub fn is_locked_out_at(&self, now: DateTime<Utc>) -> bool {
        self.lockout_end.is_some_and(|end| end > now)
    }

    /// Counts a failed login; the fifth in a row locks the account.
    pub fn record_failed_login(&mut self) {
        self.failed_login_attempts += 1;
        if self.failed_login_attempts >= MAX_FAILED_LOGIN_ATTEMPTS {
            self.lockout_end = Some(Utc::now() + Duration::minutes(LOCKOUT_DURATION_MINUTES));
        }
        self.touch();
    }

    pub fn reset_failed_login_attempts(&mut self) {
        self.failed_login_attempts = 0;
        self.lockout_end = None;
        self.touch();
    }

    pub fn record_login(&mut self) {
        self.last_login_at = Some(Utc::now());
        self.reset_failed_login_attempts();
    }

    pub fn set_password_hash(&mut self, hash: String) {
        self.password_hash = hash;
        self.last_password_change_at = Some(Utc::now());
        self.require_password_change = false;
        self.touch();
    }

    pub fn generate_email_verification_token(&mut self) -> String {
        let token = random_token();
        self.email_verification_token = Some(token.clone());
        self.email_verification_sent_at = Some(Utc::now());
        self.touch();
        token
    }

    pub fn generate_password_reset_token(&mut self) -> String {
        let token = random_token();
        let now = Utc::now();
        self.password_reset_token = Some(token.clone());
        self.password_reset_sent_at = Some(now);
        self.password_reset_token_expires_at = Some(now + Duration::hours(PASSWORD_RESET_TOKEN_HOURS));
        self.touch();
        token
    }

    pub fn is_password_reset_token_valid(&self, token: &str) -> bool {
        self.is_password_reset_token_valid_at(token, Utc::now())
    }

    /// Valid strictly before the expiry instant.
    pub fn is_password_reset_token_valid_at(&self, token: &str, now: DateTime<Utc>) -> bool {
        match (&self.password_reset_token, self.password_reset_token_expires_at) {
            (Some(stored), Some(expires_at)) => stored == token && now < expires_at,
            _ => false,
        }
    }

    pub fn clear_password_reset_token(&mut self) {
        self.password_reset_token = None;
        self.password_reset_sent_at = None;
        self.password_reset_token_expires_at = None;
        self.touch();
    }

    pub fn verify_email(&mut self) {
        self.is_email_verified = true;
        self.email_verification_token = None;
        self.touch();
    }

    pub fn enable_two_factor(&mut self, secret: String) {
        self.is_two_factor_enabled = true;
        self.two_factor_secret = Some(secret);
        self.touch();
    }

    pub fn disable_two_factor(&mut self) {
        self.is_two_factor_enabled = false;
        self.two_factor_secret = None;
        self.touch();
    }

    /// Applies the provided fields; `None` leaves a field unchanged.
    pub fn apply_profile_update(&mut self, update: UpdateProfileRequest, updated_by: &str) {
        if let Some(first_name) = update.first_name {
            self.first_name = first_name;
        }
        if let Some(last_name) = update.last_name {
            self.last_name = last_name;
        }
        if let Some(phone_number) = update.phone_number {
            self.phone_number = Some(phone_number).filter(|p| !p.is_empty());
        }
        if let Some(url) = update.profile_picture_url {
            self.profile_picture_url = Some(url).filter(|u| !u.is_empty());
        }
        if let Some(time_zone) = update.time_zone.filter(|t| !t.is_empty()) {
            self.time_zone = time_zone;
        }
        if let Some(language) = update.language.filter(|l| !l.is_empty()) {
            self.language = language;
        }
        self.updated_by = Some(updated_by.to_string());
        self.touch();
    }
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        Self {
            full_name: user.full_name(),
            is_locked_out: user.is_locked_out(),
            id: user.id,
            email: user.email,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            phone_number: user.phone_number,
            email_confirmed: user.is_email_verified,
            phone_number_confirmed: user.is_phone_verified,
            two_factor_enabled: user.is_two_factor_enabled,
            created_at: user.created_at,
            last_login_at: user.last_login_at,
            is_active: user.is_active,
            failed_login_attempts: user.failed_login_attempts,
            lockout_end: user.lockout_end,
            roles: user.roles,
            profile_picture_url: user.profile_picture_url,
            time_zone: user.time_zone,
            language: user.language,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User::new("kc-1", "ada@example.com", "ada")
    }

    #[test]
    fn test_new_user_defaults() {
        let user = user();
        assert!(user.is_active);
        assert!(!user.is_email_verified);
        assert_eq!(user.roles, vec!["User"]);
        assert_eq!(user.time_zone, "UTC");
        assert_eq!(user.language, "en");
        assert!(user.password_hash.is_empty());
    }

    #[test]
    fn test_full_name_is_trimmed() {
        let mut user = user();
        assert_eq!(user.full_name(), "");
        user.first_name = "Ada".into();
        assert_eq!(user.full_name(), "Ada");
        user.last_name = "Lovelace".into();
        assert_eq!(user.full_name(), "Ada Lovelace");
    }

    #[test]
    fn test_fifth_failure_locks_for_fifteen_minutes() {
        let mut user = user();
        for _ in 0..MAX_FAILED_LOGIN_ATTEMPTS - 1 {
            user.record_failed_login();
        }
        assert!(!user.is_locked_out());

        let before = Utc::now();
        user.record_failed_login();
        assert!(user.is_locked_out());

        let end = user.lockout_end.unwrap();
        assert!(end >= before + Duration::minutes(15));
        assert!(end <= Utc::now() + Duration::minutes(15));
        assert!(!user.is_locked_out_at(end));
    }

    #[test]
    fn test_record_login_clears_lockout() {
        let mut user = user();
        for _ in 0..MAX_FAILED_LOGIN_ATTEMPTS {
            user.record_failed_login();
        }
        user.record_login();

        assert_eq!(user.failed_login_attempts, 0);
        assert!(user.lockout_end.is_none());
        assert!(user.last_login_at.is_some());
    }

    #[test]
    fn test_reset_token_valid_strictly_before_expiry() {
        let mut user = user();
        let token = user.generate_password_reset_token();
        let expires_at = user.password_reset_token_expires_at.unwrap();
        let sent_at = user.password_reset_sent_at.unwrap();
        assert_eq!(expires_at - sent_at, Duration::hours(24));

        assert!(user.is_password_reset_token_valid(&token));
        assert!(user.is_password_reset_token_valid_at(&token, expires_at - Duration::milliseconds(1)));
        assert!(!user.is_password_reset_token_valid_at(&token, expires_at));
        assert!(!user.is_password_reset_token_valid_at(&token, expires_at + Duration::seconds(1)));
        assert!(!user.is_password_reset_token_valid("wrong"));

        user.clear_password_reset_token();
        assert!(!user.is_password_reset_token_valid(&token));
    }

    #[test]
    fn test_verification_token_is_url_safe() {
        let mut user = user();
        let token = user.generate_email_verification_token();
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));

        user.verify_email();
        assert!(user.is_email_verified);
        assert!(user.email_verification_token.is_none());
    }

    #[test]
    fn test_set_password_hash_clears_change_flag() {
        let mut user = user();
        user.require_password_change = true;
        user.set_password_hash("$argon2id$...".into());
        assert!(!user.require_password_change);
        assert!(user.last_password_change_at.is_some());
    }

    #[test]
    fn test_two_factor_toggle() {
        let mut user = user();
        user.enable_two_factor("JBSWY3DP".into());
        assert!(user.is_two_factor_enabled);
        user.disable_two_factor();
        assert!(!user.is_two_factor_enabled);
        assert!(user.two_factor_secret.is_none());
    }

    #[test]
    fn test_profile_update_keeps_absent_fields() {
        let mut user = user();
        user.first_name = "Ada".into();
        user.apply_profile_update(
            UpdateProfileRequest {
                last_name: Some("Lovelace".into()),
                language: Some("de".into()),
                ..Default::default()
            },
            "kc-1",
        );

        assert_eq!(user.first_name, "Ada");
        assert_eq!(user.last_name, "Lovelace");
        assert_eq!(user.language, "de");
        assert_eq!(user.updated_by.as_deref(), Some("kc-1"));
    }

    #[test]
    fn test_dto_reports_lockout() {
        let mut user = user();
        user.lockout_end = Some(Utc::now() + Duration::minutes(5));
        let dto: UserDto = user.into();
        assert!(dto.is_locked_out);
        assert_eq!(dto.id, "kc-1");
    }
}
