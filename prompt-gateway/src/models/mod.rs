pub mod persona;
pub mod prompt;

pub use persona::PersonaInstruction;
pub use prompt::{Attachment, MissingAttachment, Modality, ModelPart, Prompt, PromptRequest};
