use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Built-in persona: "Skye AI", the virtual assistant of SMK Skye Digipreneur.
pub const SKYE_PERSONA: &str = include_str!("skye_persona.txt");

/// System-level instruction placed first in every prompt.
///
/// Loaded once at startup and shared read-only across requests.
#[derive(Clone, PartialEq, Eq)]
pub struct PersonaInstruction(Arc<str>);

impl PersonaInstruction {
    pub fn new(text: impl Into<Arc<str>>) -> Self {
        Self(text.into())
    }

    pub fn builtin() -> Self {
        Self::new(SKYE_PERSONA)
    }

    /// Read a persona override from disk.
    pub async fn from_file(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let text = tokio::fs::read_to_string(path).await?;
        Ok(Self::new(text))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for PersonaInstruction {
    fn default() -> Self {
        Self::builtin()
    }
}

impl fmt::Debug for PersonaInstruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PersonaInstruction")
            .field("len", &self.0.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_persona_is_wrapped_in_newlines() {
        let persona = PersonaInstruction::builtin();
        assert!(persona.as_str().starts_with("\nAnda adalah \"Skye AI\""));
        assert!(persona.as_str().ends_with("bukan sekadar memberikan jawaban jadi.\n"));
    }

    #[tokio::test]
    async fn persona_override_is_read_verbatim() {
        let path = std::env::temp_dir().join(format!("persona-{}.txt", uuid::Uuid::new_v4()));
        tokio::fs::write(&path, "Kamu adalah asisten uji.").await.unwrap();

        let persona = PersonaInstruction::from_file(&path).await.unwrap();
        assert_eq!(persona.as_str(), "Kamu adalah asisten uji.");

        let _ = tokio::fs::remove_file(&path).await;
    }

    #[tokio::test]
    async fn missing_persona_file_is_an_error() {
        let result = PersonaInstruction::from_file("/nonexistent/persona.txt").await;
        assert!(result.is_err());
    }
}
