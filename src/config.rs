//! Mirror configuration, built from environment variables.

use secrecy::SecretString;

use crate::error::ConfigError;

/// Default prefixes stripped from mail subjects before they become topics.
const DEFAULT_SUBJECT_PREFIXES: &str = "Re:,Fwd:,Fw:,AW:,WG:";

/// Default template for mirrored messages.
const DEFAULT_MESSAGE_TEMPLATE: &str = "**{sender}** wrote:\n{body}";

/// IMAP connection settings.
#[derive(Debug, Clone)]
pub struct ImapConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: SecretString,
    pub mailbox: String,
}

/// Zulip API settings.
#[derive(Debug, Clone)]
pub struct ZulipConfig {
    /// Base URL of the Zulip server, e.g. `https://chat.example.com`.
    pub base_url: String,
    /// Bot email address used for basic auth.
    pub email: String,
    pub api_key: SecretString,
    /// Stream that mirrored mail is posted to.
    pub stream: String,
}

/// Full mirror configuration.
#[derive(Debug, Clone)]
pub struct MirrorConfig {
    pub imap: ImapConfig,
    pub zulip: ZulipConfig,
    /// Prefixes removed from subjects, in configured order.
    pub subject_prefixes: Vec<String>,
    /// Keywords identifying footer sections to discard.
    pub footer_keywords: Vec<String>,
    /// Message template with `{sender}` and `{body}` placeholders.
    pub message_template: String,
    /// Delete mails from the mailbox after mirroring.
    pub delete_after_read: bool,
}

impl MirrorConfig {
    /// Build config from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let imap = ImapConfig {
            host: require("MIRROR_IMAP_HOST")?,
            port: std::env::var("MIRROR_IMAP_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(993),
            username: require("MIRROR_IMAP_USERNAME")?,
            password: SecretString::from(require("MIRROR_IMAP_PASSWORD")?),
            mailbox: std::env::var("MIRROR_IMAP_MAILBOX").unwrap_or_else(|_| "INBOX".into()),
        };

        let zulip = ZulipConfig {
            base_url: require("MIRROR_ZULIP_URL")?
                .trim_end_matches('/')
                .to_string(),
            email: require("MIRROR_ZULIP_EMAIL")?,
            api_key: SecretString::from(require("MIRROR_ZULIP_API_KEY")?),
            stream: require("MIRROR_ZULIP_STREAM")?,
        };

        let subject_prefixes = csv_list(
            &std::env::var("MIRROR_SUBJECT_PREFIXES")
                .unwrap_or_else(|_| DEFAULT_SUBJECT_PREFIXES.into()),
        );

        let footer_keywords = csv_list(&std::env::var("MIRROR_FOOTER_KEYWORDS").unwrap_or_default());

        let message_template = std::env::var("MIRROR_MESSAGE_TEMPLATE")
            .unwrap_or_else(|_| DEFAULT_MESSAGE_TEMPLATE.into());

        let delete_after_read = std::env::var("MIRROR_DELETE_AFTER_READ")
            .map(|v| matches!(v.trim(), "1" | "true" | "yes"))
            .unwrap_or(false);

        let config = Self {
            imap,
            zulip,
            subject_prefixes,
            footer_keywords,
            message_template,
            delete_after_read,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate cross-field constraints.
    ///
    /// An empty subject prefix would make prefix stripping loop forever,
    /// so it is rejected here rather than checked per message.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.subject_prefixes.iter().any(|p| p.is_empty()) {
            return Err(ConfigError::InvalidValue {
                key: "MIRROR_SUBJECT_PREFIXES".into(),
                message: "prefixes must be non-empty".into(),
            });
        }
        for placeholder in ["{sender}", "{body}"] {
            if !self.message_template.contains(placeholder) {
                return Err(ConfigError::InvalidValue {
                    key: "MIRROR_MESSAGE_TEMPLATE".into(),
                    message: format!("template must contain {placeholder}"),
                });
            }
        }
        Ok(())
    }
}

fn require(name: &str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::MissingEnvVar(name.into()))
}

fn csv_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> MirrorConfig {
        MirrorConfig {
            imap: ImapConfig {
                host: "imap.test.com".into(),
                port: 993,
                username: "user".into(),
                password: SecretString::from("pass"),
                mailbox: "INBOX".into(),
            },
            zulip: ZulipConfig {
                base_url: "https://chat.test.com".into(),
                email: "bot@test.com".into(),
                api_key: SecretString::from("key"),
                stream: "mail".into(),
            },
            subject_prefixes: vec!["Re:".into(), "Fwd:".into()],
            footer_keywords: vec![],
            message_template: DEFAULT_MESSAGE_TEMPLATE.into(),
            delete_after_read: false,
        }
    }

    #[test]
    fn valid_config_passes() {
        assert!(test_config().validate().is_ok());
    }

    #[test]
    fn empty_prefix_rejected() {
        let mut config = test_config();
        config.subject_prefixes.push(String::new());
        assert!(config.validate().is_err());
    }

    #[test]
    fn template_without_body_placeholder_rejected() {
        let mut config = test_config();
        config.message_template = "{sender} said something".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn csv_list_trims_and_drops_empty() {
        assert_eq!(csv_list("Re:, Fwd: ,,Fw:"), vec!["Re:", "Fwd:", "Fw:"]);
        assert!(csv_list("").is_empty());
    }
}
