//! crates/lucid_lists_core/src/services/user_settings.rs

use std::sync::Arc;

use tracing::info;

use crate::domain::{InternalId, NewUserSettings, Session, UserSettings};
use crate::dto::SettingsView;
use crate::patch::{Changes, SettingsField, SettingsPatch};
use crate::ports::{DatabaseService, PortError, PortResult};

#[derive(Clone)]
pub struct UserSettingsService {
    db: Arc<dyn DatabaseService>,
}

impl UserSettingsService {
    pub fn new(db: Arc<dyn DatabaseService>) -> Self {
        Self { db }
    }

    /// Returns the user's settings, initialising the defaults on first access.
    pub async fn get_settings(&self, actor: &Session) -> PortResult<SettingsView> {
        Ok(self.ensure(actor).await?.into())
    }

    pub async fn update_settings(
        &self,
        actor: &Session,
        patch: SettingsPatch,
    ) -> PortResult<SettingsView> {
        let changes = patch.into_changes()?;
        self.ensure(actor).await?;
        self.db.update_settings(actor.user_id, &changes).await?;
        info!(user_uid = %actor.user_uid, fields = changes.fields.len(), "settings updated");
        self.current(actor).await.map(Into::into)
    }

    /// Drops the stored row and starts over from the defaults.
    pub async fn reset_settings(&self, actor: &Session) -> PortResult<SettingsView> {
        self.db.delete_settings(actor.user_id).await?;
        let settings = match self
            .db
            .create_settings(NewUserSettings::defaults_for(actor.user_id))
            .await
        {
            Ok(settings) => settings,
            // A concurrent request re-created the row between delete and insert.
            Err(PortError::Conflict(_)) => {
                self.db
                    .update_settings(actor.user_id, &default_changes(actor.user_id))
                    .await?;
                self.current(actor).await?
            }
            Err(e) => return Err(e),
        };
        info!(user_uid = %actor.user_uid, "settings reset to defaults");
        Ok(settings.into())
    }

    async fn ensure(&self, actor: &Session) -> PortResult<UserSettings> {
        if let Some(settings) = self.db.get_settings(actor.user_id).await? {
            return Ok(settings);
        }
        match self
            .db
            .create_settings(NewUserSettings::defaults_for(actor.user_id))
            .await
        {
            Ok(settings) => Ok(settings),
            // A concurrent first access created the row.
            Err(PortError::Conflict(_)) => self.current(actor).await,
            Err(e) => Err(e),
        }
    }

    async fn current(&self, actor: &Session) -> PortResult<UserSettings> {
        self.db
            .get_settings(actor.user_id)
            .await?
            .ok_or_else(|| PortError::NotFound(format!("settings for user {}", actor.user_uid)))
    }
}

/// Every column set back to its default value.
fn default_changes(user_id: InternalId) -> Changes<SettingsField> {
    let defaults = NewUserSettings::defaults_for(user_id);
    Changes::new(None)
        .with(SettingsField::Theme(defaults.theme))
        .with(SettingsField::Language(defaults.language))
        .with(SettingsField::Timezone(defaults.timezone))
        .with(SettingsField::NotificationsEnabled(defaults.notifications_enabled))
        .with(SettingsField::EmailNotifications(defaults.email_notifications))
        .with(SettingsField::SoundEnabled(defaults.sound_enabled))
        .with(SettingsField::CompactMode(defaults.compact_mode))
        .with(SettingsField::AutoSave(defaults.auto_save))
        .with(SettingsField::AutoSaveInterval(defaults.auto_save_interval))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Language, Theme};
    use crate::testing::Fixture;

    #[tokio::test]
    async fn test_first_read_initialises_defaults() {
        let fx = Fixture::new();
        let user = fx.user("u@b.io").await;
        let settings = fx.services.settings.get_settings(&user).await.unwrap();
        assert_eq!(settings.theme, Theme::ProjectnestDefault);
        assert_eq!(settings.language, Language::En);
        assert_eq!(settings.timezone, "UTC");
        assert!(settings.notifications_enabled);
        assert!(settings.email_notifications && settings.sound_enabled);
        assert!(!settings.compact_mode);
        assert!(settings.auto_save);
        assert_eq!(settings.auto_save_interval, 30);
    }

    #[tokio::test]
    async fn test_partial_update_touches_only_given_fields() {
        let fx = Fixture::new();
        let user = fx.user("u@b.io").await;
        let updated = fx
            .services
            .settings
            .update_settings(
                &user,
                SettingsPatch {
                    language: Some("ja".into()),
                    sound_enabled: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.language, Language::Ja);
        assert!(!updated.sound_enabled);
        assert_eq!(updated.theme, Theme::ProjectnestDefault);
        assert_eq!(updated.auto_save_interval, 30);
    }

    #[tokio::test]
    async fn test_invalid_values_are_rejected() {
        let fx = Fixture::new();
        let user = fx.user("u@b.io").await;
        for patch in [
            SettingsPatch { theme: Some("neon".into()), ..Default::default() },
            SettingsPatch { language: Some("xx".into()), ..Default::default() },
            SettingsPatch { timezone: Some(String::new()), ..Default::default() },
            SettingsPatch { auto_save_interval: Some(601), ..Default::default() },
        ] {
            let err = fx.services.settings.update_settings(&user, patch).await.unwrap_err();
            assert!(matches!(err, PortError::BadRequest(_)));
        }
        let empty = fx.services.settings.update_settings(&user, SettingsPatch::default()).await;
        assert!(matches!(empty, Err(PortError::NoFieldsToUpdate)));
    }

    #[tokio::test]
    async fn test_reset_restores_defaults() {
        let fx = Fixture::new();
        let user = fx.user("u@b.io").await;
        fx.services
            .settings
            .update_settings(
                &user,
                SettingsPatch { compact_mode: Some(true), ..Default::default() },
            )
            .await
            .unwrap();
        let reset = fx.services.settings.reset_settings(&user).await.unwrap();
        assert!(!reset.compact_mode);
    }

    #[tokio::test]
    async fn test_reset_overwrites_a_row_recreated_mid_reset() {
        let fx = Fixture::new();
        let user = fx.user("u@b.io").await;
        fx.services.settings.get_settings(&user).await.unwrap();
        let mut recreated = NewUserSettings::defaults_for(user.user_id);
        recreated.compact_mode = true;
        recreated.language = Language::De;
        fx.store.race_next_settings_create(recreated);

        let reset = fx.services.settings.reset_settings(&user).await.unwrap();

        assert!(!reset.compact_mode);
        assert_eq!(reset.language, Language::En);
        let row = fx.store.settings_row(user.user_id).unwrap();
        assert!(!row.compact_mode);
    }
}
