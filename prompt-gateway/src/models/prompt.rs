//! Prompt assembly.
//!
//! Every route reduces its request to a [`Prompt`]: an ordered list of
//! [`ModelPart`]s whose first element is always the persona instruction.
//! Providers render that list in their own wire format.

use super::persona::PersonaInstruction;
use base64::{engine::general_purpose::STANDARD, Engine as _};

/// Separator between the persona and the user turn on the text route.
pub const USER_TURN_SEPARATOR: &str = "\n\n";

/// Prefix of the user turn on the text route.
pub const USER_TURN_PREFIX: &str = "User: ";

/// Media type assumed for a multipart file that declares none (RFC 7578).
pub const DEFAULT_MEDIA_TYPE: &str = "text/plain";

/// One segment of a prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelPart {
    Text(String),
    /// Base64-encoded bytes tagged with their media type.
    InlineData { data: String, mime_type: String },
}

/// Ordered parts sent to the model in a single call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    parts: Vec<ModelPart>,
}

impl Prompt {
    /// Text-only prompt: persona and user turn joined into one text part.
    ///
    /// A missing user text renders as an empty user turn.
    pub fn flattened(persona: &PersonaInstruction, user_text: Option<&str>) -> Self {
        let text = format!(
            "{}{}{}{}",
            persona.as_str(),
            USER_TURN_SEPARATOR,
            USER_TURN_PREFIX,
            user_text.unwrap_or_default()
        );

        Self {
            parts: vec![ModelPart::Text(text)],
        }
    }

    /// Persona, then the user text (if any), then the attachment.
    pub fn multimodal(
        persona: &PersonaInstruction,
        user_text: Option<String>,
        attachment: &Attachment,
    ) -> Self {
        let mut parts = Vec::with_capacity(3);
        parts.push(ModelPart::Text(persona.as_str().to_string()));
        if let Some(text) = user_text {
            parts.push(ModelPart::Text(text));
        }
        parts.push(attachment.to_inline_part());

        Self { parts }
    }

    pub fn parts(&self) -> &[ModelPart] {
        &self.parts
    }

    /// Total characters across text parts.
    pub fn text_len(&self) -> usize {
        self.parts
            .iter()
            .map(|part| match part {
                ModelPart::Text(text) => text.len(),
                ModelPart::InlineData { .. } => 0,
            })
            .sum()
    }

    pub fn inline_count(&self) -> usize {
        self.parts
            .iter()
            .filter(|part| matches!(part, ModelPart::InlineData { .. }))
            .count()
    }
}

/// A single uploaded file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub bytes: Vec<u8>,
    pub media_type: String,
}

impl Attachment {
    pub fn new(bytes: Vec<u8>, media_type: impl Into<String>) -> Self {
        Self {
            bytes,
            media_type: media_type.into(),
        }
    }

    pub fn to_inline_part(&self) -> ModelPart {
        ModelPart::InlineData {
            data: STANDARD.encode(&self.bytes),
            mime_type: self.media_type.clone(),
        }
    }
}

/// The kind of file a media route expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modality {
    Image,
    Document,
    Audio,
}

impl Modality {
    /// Multipart field that carries the file.
    pub fn field_name(self) -> &'static str {
        match self {
            Modality::Image => "image",
            Modality::Document => "document",
            Modality::Audio => "audio",
        }
    }

    /// Instruction used when the caller sends no `prompt`.
    pub fn default_instruction(self) -> Option<&'static str> {
        match self {
            Modality::Image => None,
            Modality::Document => Some("Tolong buat ringkasan dari dokumen berikut"),
            Modality::Audio => Some("Tolong buatkan transkrip dari audio berikut"),
        }
    }

    pub fn missing_attachment_message(self) -> String {
        let field = self.field_name();
        format!(
            "File {} tidak ditemukan. Pastikan key di Postman adalah '{}'",
            field, field
        )
    }
}

/// Error raised when a media route receives no file.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct MissingAttachment {
    pub modality: Modality,
    pub message: String,
}

/// One incoming call, before assembly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromptRequest {
    pub user_text: Option<String>,
    pub attachment: Option<Attachment>,
}

impl PromptRequest {
    /// Assemble the prompt for a media route.
    ///
    /// Fails without touching the model when the file is absent.
    pub fn into_prompt(
        self,
        persona: &PersonaInstruction,
        modality: Modality,
    ) -> Result<Prompt, MissingAttachment> {
        let attachment = self.attachment.ok_or_else(|| MissingAttachment {
            modality,
            message: modality.missing_attachment_message(),
        })?;

        let user_text = self
            .user_text
            .or_else(|| modality.default_instruction().map(str::to_string));

        Ok(Prompt::multimodal(persona, user_text, &attachment))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn persona() -> PersonaInstruction {
        PersonaInstruction::new("PERSONA")
    }

    fn png() -> Attachment {
        Attachment::new(vec![0x89, b'P', b'N', b'G'], "image/png")
    }

    #[test]
    fn flattened_prompt_concatenates_persona_and_user_turn() {
        let prompt = Prompt::flattened(&persona(), Some("Apa itu PPLG?"));
        assert_eq!(
            prompt.parts(),
            &[ModelPart::Text("PERSONA\n\nUser: Apa itu PPLG?".to_string())]
        );
    }

    #[test]
    fn flattened_prompt_without_user_text_has_empty_turn() {
        let prompt = Prompt::flattened(&persona(), None);
        assert_eq!(prompt.parts(), &[ModelPart::Text("PERSONA\n\nUser: ".to_string())]);
    }

    #[test]
    fn multimodal_prompt_orders_persona_text_then_data() {
        let prompt = Prompt::multimodal(&persona(), Some("Jelaskan gambar".to_string()), &png());

        assert_eq!(
            prompt.parts(),
            &[
                ModelPart::Text("PERSONA".to_string()),
                ModelPart::Text("Jelaskan gambar".to_string()),
                ModelPart::InlineData {
                    data: "iVBORw==".to_string(),
                    mime_type: "image/png".to_string(),
                },
            ]
        );
        assert_eq!(prompt.inline_count(), 1);
        assert_eq!(prompt.text_len(), "PERSONA".len() + "Jelaskan gambar".len());
    }

    #[test]
    fn missing_attachment_names_the_field() {
        let err = PromptRequest::default()
            .into_prompt(&persona(), Modality::Image)
            .unwrap_err();

        assert_eq!(err.modality, Modality::Image);
        assert_eq!(
            err.to_string(),
            "File image tidak ditemukan. Pastikan key di Postman adalah 'image'"
        );
    }

    #[test]
    fn document_without_prompt_asks_for_summary() {
        let request = PromptRequest {
            user_text: None,
            attachment: Some(Attachment::new(b"%PDF".to_vec(), "application/pdf")),
        };
        let prompt = request.into_prompt(&persona(), Modality::Document).unwrap();

        assert_eq!(
            prompt.parts()[1],
            ModelPart::Text("Tolong buat ringkasan dari dokumen berikut".to_string())
        );
    }

    #[test]
    fn audio_without_prompt_asks_for_transcript() {
        let request = PromptRequest {
            user_text: None,
            attachment: Some(Attachment::new(vec![1, 2, 3], "audio/mpeg")),
        };
        let prompt = request.into_prompt(&persona(), Modality::Audio).unwrap();

        assert_eq!(
            prompt.parts()[1],
            ModelPart::Text("Tolong buatkan transkrip dari audio berikut".to_string())
        );
    }

    #[test]
    fn empty_prompt_is_kept_rather_than_defaulted() {
        let request = PromptRequest {
            user_text: Some(String::new()),
            attachment: Some(Attachment::new(vec![1], "audio/wav")),
        };
        let prompt = request.into_prompt(&persona(), Modality::Audio).unwrap();

        assert_eq!(prompt.parts()[1], ModelPart::Text(String::new()));
    }

    #[test]
    fn image_without_prompt_sends_persona_and_data_only() {
        let request = PromptRequest {
            user_text: None,
            attachment: Some(png()),
        };
        let prompt = request.into_prompt(&persona(), Modality::Image).unwrap();

        assert_eq!(prompt.parts().len(), 2);
        assert_eq!(prompt.parts()[0], ModelPart::Text("PERSONA".to_string()));
        assert!(matches!(prompt.parts()[1], ModelPart::InlineData { .. }));
    }
}
