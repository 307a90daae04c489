//! Role-tagged conversation entries.
//!
//! These are the units the router assembles into an exchange list for the
//! chat backend and stores as direct-chat history.

use {
    lingua_media::Attachment,
    serde::{Deserialize, Serialize},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// Exchange content: plain text or a normalized image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExchangeContent {
    Text(String),
    Image(Attachment),
}

/// One entry of a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exchange {
    pub role: Role,
    pub content: ExchangeContent,
}

impl Exchange {
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: ExchangeContent::Text(text.into()),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: ExchangeContent::Text(text.into()),
        }
    }

    /// A user entry carrying an image instead of text.
    pub fn user_image(attachment: Attachment) -> Self {
        Self {
            role: Role::User,
            content: ExchangeContent::Image(attachment),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: ExchangeContent::Text(text.into()),
        }
    }

    /// Text content, `None` for image entries.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match &self.content {
            ExchangeContent::Text(text) => Some(text),
            ExchangeContent::Image(_) => None,
        }
    }

    #[must_use]
    pub fn is_image(&self) -> bool {
        matches!(self.content, ExchangeContent::Image(_))
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, lingua_media::DetailLevel};

    #[test]
    fn text_exchange_serializes_as_plain_string() {
        let json = serde_json::to_value(Exchange::user("hello")).unwrap();
        assert_eq!(json["role"], "user");
        assert_eq!(json["content"], "hello");
    }

    #[test]
    fn image_exchange_roundtrips() {
        let original = Exchange::user_image(Attachment {
            data: "iVBORw0KGgo=".into(),
            detail: DetailLevel::Low,
        });
        let json = serde_json::to_value(&original).unwrap();
        assert_eq!(json["content"]["detail"], "low");

        let parsed: Exchange = serde_json::from_value(json).unwrap();
        assert!(parsed.is_image());
        assert_eq!(parsed, original);
    }

    #[test]
    fn text_accessor_skips_images() {
        assert_eq!(Exchange::assistant("hi").text(), Some("hi"));
        let image = Exchange::user_image(Attachment {
            data: String::new(),
            detail: DetailLevel::High,
        });
        assert_eq!(image.text(), None);
        assert_eq!(image.role.as_str(), "user");
    }
}
