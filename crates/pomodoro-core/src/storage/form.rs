//! Input boundary of the settings screen.

use std::sync::Arc;

use super::settings::{SettingKey, SettingsStore};
use crate::error::{Result, ValidationError};

/// Parse user input as a positive whole number.
///
/// Surrounding whitespace is ignored. Anything else (empty text, signs,
/// decimals, zero, values beyond `u32`) is rejected.
pub fn parse_setting_input(input: &str) -> Result<u32, ValidationError> {
    let trimmed = input.trim();
    let not_a_number = || ValidationError::NotANumber {
        input: trimmed.to_string(),
    };
    let value: i64 = trimmed.parse().map_err(|_| not_a_number())?;
    if value <= 0 {
        return Err(ValidationError::NotPositive { value });
    }
    u32::try_from(value).map_err(|_| not_a_number())
}

/// Editable copy of the four tunables that writes through to the store.
///
/// Every input that parses to a positive integer is persisted immediately;
/// anything else is ignored and the previous valid value stays.
pub struct SettingsForm<S> {
    store: Arc<S>,
    values: [u32; 4],
}

impl<S: SettingsStore> SettingsForm<S> {
    pub fn new(store: Arc<S>) -> Self {
        let values = SettingKey::ALL.map(|key| store.get(key));
        Self { store, values }
    }

    pub fn value(&self, key: SettingKey) -> u32 {
        self.values[key.index()]
    }

    /// Handle one edit of the text field for `key`.
    ///
    /// Returns the value now held for `key`.
    ///
    /// # Errors
    /// Returns the validation error for rejected input, or the store's
    /// error when persisting fails. The held value is unchanged in both
    /// cases.
    pub async fn input(&mut self, key: SettingKey, text: &str) -> Result<u32> {
        let value = parse_setting_input(text)?;
        self.store.set(key, value).await?;
        self.values[key.index()] = value;
        tracing::debug!(key = key.name(), value, "setting updated from input");
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemorySettingsStore;

    #[test]
    fn parse_accepts_positive_integers() {
        assert_eq!(parse_setting_input("25"), Ok(25));
        assert_eq!(parse_setting_input("  7 \n"), Ok(7));
    }

    #[test]
    fn parse_rejects_everything_else() {
        assert_eq!(
            parse_setting_input("0"),
            Err(ValidationError::NotPositive { value: 0 })
        );
        assert_eq!(
            parse_setting_input("-3"),
            Err(ValidationError::NotPositive { value: -3 })
        );
        assert!(matches!(
            parse_setting_input(""),
            Err(ValidationError::NotANumber { .. })
        ));
        assert!(matches!(
            parse_setting_input("2.5"),
            Err(ValidationError::NotANumber { .. })
        ));
        assert!(matches!(
            parse_setting_input("99999999999"),
            Err(ValidationError::NotANumber { .. })
        ));
    }

    #[tokio::test]
    async fn form_writes_valid_input_through() {
        let store = Arc::new(MemorySettingsStore::default());
        let mut form = SettingsForm::new(Arc::clone(&store));
        assert_eq!(form.value(SettingKey::WorkTimeMinutes), 25);

        form.input(SettingKey::WorkTimeMinutes, "3").await.unwrap();
        assert_eq!(form.value(SettingKey::WorkTimeMinutes), 3);
        assert_eq!(store.get(SettingKey::WorkTimeMinutes), 3);
    }

    #[tokio::test]
    async fn form_keeps_prior_value_on_bad_keystrokes() {
        let store = Arc::new(MemorySettingsStore::default());
        let mut form = SettingsForm::new(Arc::clone(&store));

        // Typing "12" after clearing the field: "", "1", "12"
        assert!(form.input(SettingKey::LongBreakTimeMinutes, "").await.is_err());
        assert_eq!(form.value(SettingKey::LongBreakTimeMinutes), 15);
        form.input(SettingKey::LongBreakTimeMinutes, "1").await.unwrap();
        form.input(SettingKey::LongBreakTimeMinutes, "12").await.unwrap();
        assert!(form.input(SettingKey::LongBreakTimeMinutes, "12x").await.is_err());

        assert_eq!(form.value(SettingKey::LongBreakTimeMinutes), 12);
        assert_eq!(store.get(SettingKey::LongBreakTimeMinutes), 12);
    }
}
