use sea_orm::ActiveValue::Set;
use sea_orm::entity::prelude::*;

use crate::models::User;

/// Sea-ORM entity for the `users` table
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    #[sea_orm(unique)]
    pub email: String,
    #[sea_orm(unique)]
    pub username: String,
    #[sea_orm(column_type = "Text")]
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: Option<String>,
    pub is_active: bool,
    pub is_email_verified: bool,
    pub is_phone_verified: bool,
    pub is_two_factor_enabled: bool,
    #[sea_orm(column_type = "Text", nullable)]
    pub two_factor_secret: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
    pub last_login_at: Option<DateTimeWithTimeZone>,
    pub last_password_change_at: Option<DateTimeWithTimeZone>,
    pub failed_login_attempts: i32,
    pub lockout_end: Option<DateTimeWithTimeZone>,
    pub email_verification_token: Option<String>,
    pub email_verification_sent_at: Option<DateTimeWithTimeZone>,
    pub password_reset_token: Option<String>,
    pub password_reset_sent_at: Option<DateTimeWithTimeZone>,
    pub password_reset_token_expires_at: Option<DateTimeWithTimeZone>,
    /// Comma-joined
    #[sea_orm(column_type = "Text")]
    pub roles: String,
    /// Comma-joined
    #[sea_orm(column_type = "Text")]
    pub permissions: String,
    pub require_password_change: bool,
    pub profile_picture_url: Option<String>,
    pub time_zone: String,
    pub language: String,
    pub created_by: Option<String>,
    pub updated_by: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

fn join_list(items: &[String]) -> String {
    items.join(",")
}

fn split_list(joined: &str) -> Vec<String> {
    joined
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

impl From<Model> for User {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            email: model.email,
            username: model.username,
            password_hash: model.password_hash,
            first_name: model.first_name,
            last_name: model.last_name,
            phone_number: model.phone_number,
            is_active: model.is_active,
            is_email_verified: model.is_email_verified,
            is_phone_verified: model.is_phone_verified,
            is_two_factor_enabled: model.is_two_factor_enabled,
            two_factor_secret: model.two_factor_secret,
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
            last_login_at: model.last_login_at.map(Into::into),
            last_password_change_at: model.last_password_change_at.map(Into::into),
            failed_login_attempts: model.failed_login_attempts,
            lockout_end: model.lockout_end.map(Into::into),
            email_verification_token: model.email_verification_token,
            email_verification_sent_at: model.email_verification_sent_at.map(Into::into),
            password_reset_token: model.password_reset_token,
            password_reset_sent_at: model.password_reset_sent_at.map(Into::into),
            password_reset_token_expires_at: model.password_reset_token_expires_at.map(Into::into),
            roles: split_list(&model.roles),
            permissions: split_list(&model.permissions),
            require_password_change: model.require_password_change,
            profile_picture_url: model.profile_picture_url,
            time_zone: model.time_zone,
            language: model.language,
            created_by: model.created_by,
            updated_by: model.updated_by,
        }
    }
}

impl From<&User> for ActiveModel {
    fn from(user: &User) -> Self {
        ActiveModel {
            id: Set(user.id.clone()),
            email: Set(user.email.clone()),
            username: Set(user.username.clone()),
            password_hash: Set(user.password_hash.clone()),
            first_name: Set(user.first_name.clone()),
            last_name: Set(user.last_name.clone()),
            phone_number: Set(user.phone_number.clone()),
            is_active: Set(user.is_active),
            is_email_verified: Set(user.is_email_verified),
            is_phone_verified: Set(user.is_phone_verified),
            is_two_factor_enabled: Set(user.is_two_factor_enabled),
            two_factor_secret: Set(user.two_factor_secret.clone()),
            created_at: Set(user.created_at.into()),
            updated_at: Set(user.updated_at.into()),
            last_login_at: Set(user.last_login_at.map(Into::into)),
            last_password_change_at: Set(user.last_password_change_at.map(Into::into)),
            failed_login_attempts: Set(user.failed_login_attempts),
            lockout_end: Set(user.lockout_end.map(Into::into)),
            email_verification_token: Set(user.email_verification_token.clone()),
            email_verification_sent_at: Set(user.email_verification_sent_at.map(Into::into)),
            password_reset_token: Set(user.password_reset_token.clone()),
            password_reset_sent_at: Set(user.password_reset_sent_at.map(Into::into)),
            password_reset_token_expires_at: Set(user
                .password_reset_token_expires_at
                .map(Into::into)),
            roles: Set(join_list(&user.roles)),
            permissions: Set(join_list(&user.permissions)),
            require_password_change: Set(user.require_password_change),
            profile_picture_url: Set(user.profile_picture_url.clone()),
            time_zone: Set(user.time_zone.clone()),
            language: Set(user.language.clone()),
            created_by: Set(user.created_by.clone()),
            updated_by: Set(user.updated_by.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roles_round_trip_through_text_column() {
        let mut user = User::new("kc-9", "grace@example.com", "grace");
        user.roles = vec!["User".into(), "Admin".into()];
        user.permissions = vec![];

        let active: ActiveModel = (&user).into();
        assert_eq!(active.roles.clone().unwrap(), "User,Admin");
        assert_eq!(active.permissions.clone().unwrap(), "");

        assert_eq!(split_list("User, Admin,"), vec!["User", "Admin"]);
        assert!(split_list("").is_empty());
    }
}
