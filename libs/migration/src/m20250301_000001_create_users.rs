use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    // Identity provider subject for provider-created users
                    .col(string_len(Users::Id, 64).primary_key())
                    .col(string_len_uniq(Users::Email, 256))
                    .col(string_len_uniq(Users::Username, 100))
                    .col(text(Users::PasswordHash).default(""))
                    .col(string_len(Users::FirstName, 100))
                    .col(string_len(Users::LastName, 100))
                    .col(string_len_null(Users::PhoneNumber, 20))
                    .col(boolean(Users::IsActive).default(true))
                    .col(boolean(Users::IsEmailVerified).default(false))
                    .col(boolean(Users::IsPhoneVerified).default(false))
                    .col(boolean(Users::IsTwoFactorEnabled).default(false))
                    .col(text_null(Users::TwoFactorSecret))
                    .col(
                        timestamp_with_time_zone(Users::CreatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        timestamp_with_time_zone(Users::UpdatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .col(timestamp_with_time_zone_null(Users::LastLoginAt))
                    .col(timestamp_with_time_zone_null(Users::LastPasswordChangeAt))
                    .col(integer(Users::FailedLoginAttempts).default(0))
                    .col(timestamp_with_time_zone_null(Users::LockoutEnd))
                    .col(string_len_null(Users::EmailVerificationToken, 128))
                    .col(timestamp_with_time_zone_null(Users::EmailVerificationSentAt))
                    .col(string_len_null(Users::PasswordResetToken, 128))
                    .col(timestamp_with_time_zone_null(Users::PasswordResetSentAt))
                    .col(timestamp_with_time_zone_null(Users::PasswordResetTokenExpiresAt))
                    .col(text(Users::Roles).default(""))
                    .col(text(Users::Permissions).default(""))
                    .col(boolean(Users::RequirePasswordChange).default(false))
                    .col(string_len_null(Users::ProfilePictureUrl, 500))
                    .col(string_len(Users::TimeZone, 64).default("UTC"))
                    .col(string_len(Users::Language, 16).default("en"))
                    .col(string_len_null(Users::CreatedBy, 64))
                    .col(string_len_null(Users::UpdatedBy, 64))
                    .to_owned(),
            )
            .await?;

        for (name, column) in [
            ("idx_users_lockout_end", Users::LockoutEnd),
            ("idx_users_email_verification_token", Users::EmailVerificationToken),
            ("idx_users_password_reset_token", Users::PasswordResetToken),
        ] {
            manager
                .create_index(
                    Index::create()
                        .name(name)
                        .table(Users::Table)
                        .col(column)
                        .to_owned(),
                )
                .await?;
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Users::Table).if_exists().to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    Email,
    Username,
    PasswordHash,
    FirstName,
    LastName,
    PhoneNumber,
    IsActive,
    IsEmailVerified,
    IsPhoneVerified,
    IsTwoFactorEnabled,
    TwoFactorSecret,
    CreatedAt,
    UpdatedAt,
    LastLoginAt,
    LastPasswordChangeAt,
    FailedLoginAttempts,
    LockoutEnd,
    EmailVerificationToken,
    EmailVerificationSentAt,
    PasswordResetToken,
    PasswordResetSentAt,
    PasswordResetTokenExpiresAt,
    Roles,
    Permissions,
    RequirePasswordChange,
    ProfilePictureUrl,
    TimeZone,
    Language,
    CreatedBy,
    UpdatedBy,
}
