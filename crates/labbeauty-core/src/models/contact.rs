use serde::Deserialize;

/// Visitor request relayed to the salon's messaging bot.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ContactForm {
    pub name: String,
    pub phone: String,
    pub message: String,
}

impl ContactForm {
    /// Text sent to the bot.
    pub fn to_message(&self) -> String {
        format!(
            "Ім'я: {}\nТелефон: {}\nПовідомлення: {}",
            self.name, self.phone, self.message
        )
    }
}
