use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestMessageContentPartImageArgs,
    ChatCompletionRequestMessageContentPartTextArgs, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestSystemMessageContent, ChatCompletionRequestUserMessageArgs, ImageDetail,
    ImageUrlArgs,
};
use serde::{Deserialize, Serialize};

/// One image-plus-prompts completion call.
#[derive(Debug, Clone)]
pub struct VisionRequest {
    pub system_prompt: String,
    pub user_prompt: String,
    /// `data:image/<ext>;base64,...`
    pub image_data_uri: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

#[derive(Debug, Clone)]
pub struct VisionResponse {
    pub model: String,
    pub content: String,
    pub finish_reason: Option<String>,
    pub usage: Option<Usage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

impl VisionRequest {
    /// System message, then a user message carrying the prompt text and the
    /// image at high detail.
    pub fn to_openai_messages(&self) -> Result<Vec<ChatCompletionRequestMessage>, crate::Error> {
        let system = ChatCompletionRequestSystemMessageArgs::default()
            .content(ChatCompletionRequestSystemMessageContent::Text(
                self.system_prompt.clone(),
            ))
            .build()?;

        let text_part = ChatCompletionRequestMessageContentPartTextArgs::default()
            .text(self.user_prompt.clone())
            .build()?;

        let image_part = ChatCompletionRequestMessageContentPartImageArgs::default()
            .image_url(
                ImageUrlArgs::default()
                    .url(self.image_data_uri.clone())
                    .detail(ImageDetail::High)
                    .build()?,
            )
            .build()?;

        let user = ChatCompletionRequestUserMessageArgs::default()
            .content(vec![text_part.into(), image_part.into()])
            .build()?;

        Ok(vec![system.into(), user.into()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_openai::types::{
        ChatCompletionRequestUserMessageContent, ChatCompletionRequestUserMessageContentPart,
    };
    use pretty_assertions::assert_eq;

    fn request() -> VisionRequest {
        VisionRequest {
            system_prompt: "You are a cardiologist".to_string(),
            user_prompt: "Analyze this ECG".to_string(),
            image_data_uri: "data:image/png;base64,AAAA".to_string(),
            max_tokens: 2000,
            temperature: 0.1,
        }
    }

    #[test]
    fn test_messages_are_system_then_user() {
        let messages = request().to_openai_messages().unwrap();
        assert_eq!(messages.len(), 2);
        assert!(matches!(messages[0], ChatCompletionRequestMessage::System(_)));
        assert!(matches!(messages[1], ChatCompletionRequestMessage::User(_)));
    }

    #[test]
    fn test_user_message_carries_text_and_image() {
        let messages = request().to_openai_messages().unwrap();
        let ChatCompletionRequestMessage::User(user) = &messages[1] else {
            panic!("expected user message");
        };
        let ChatCompletionRequestUserMessageContent::Array(parts) = &user.content else {
            panic!("expected multi-part content");
        };
        assert_eq!(parts.len(), 2);
        match (&parts[0], &parts[1]) {
            (
                ChatCompletionRequestUserMessageContentPart::Text(text),
                ChatCompletionRequestUserMessageContentPart::ImageUrl(image),
            ) => {
                assert_eq!(text.text, "Analyze this ECG");
                assert_eq!(image.image_url.url, "data:image/png;base64,AAAA");
            }
            other => panic!("unexpected parts: {:?}", other),
        }
    }

    #[test]
    fn test_usage_serialization() {
        let usage = Usage {
            prompt_tokens: 50,
            completion_tokens: 25,
            total_tokens: 75,
        };

        let serialized = serde_json::to_string(&usage).unwrap();
        let deserialized: Usage = serde_json::from_str(&serialized).unwrap();
        assert_eq!(deserialized.total_tokens, 75);
    }
}
