use crate::chat::{ChatClient, ChatMessage, ChatRequest};
use crate::error::Result;
use crate::language::{detect_language, ChatTranslator, DetectedLanguage, Translator};
use crate::prompt::{system_instruction, user_prompt};
use fairfight_protocol::Theme;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub struct JudgeConfig {
    /// Chat model id sent with every request
    pub model: String,

    /// Sampling temperature; low-mid keeps phrasing mostly stable
    pub temperature: f32,

    /// Translate the English instruction into the participants' language
    pub translate_instructions: bool,
}

impl Default for JudgeConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o".to_string(),
            temperature: 0.7,
            translate_instructions: true,
        }
    }
}

impl JudgeConfig {
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.model.trim().is_empty() {
            return Err("model must be non-empty".to_string());
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(format!(
                "temperature ({}) must be within 0.0..=2.0",
                self.temperature
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JudgeRequest {
    pub theme: Theme,
    pub name_a: String,
    pub statement_a: String,
    pub name_b: String,
    pub statement_b: String,
}

/// What the engine hands back. `failed` marks a fail-soft diagnostic in
/// `text` instead of a model verdict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Judgement {
    pub text: String,
    pub language: String,
    pub failed: bool,
}

/// JudgeBot: one chat-completion call per judgment, never an `Err`.
pub struct Judge {
    client: Arc<dyn ChatClient>,
    translator: Option<Arc<dyn Translator>>,
    config: JudgeConfig,
}

impl Judge {
    pub fn new(client: Arc<dyn ChatClient>, config: JudgeConfig) -> Self {
        let translator: Option<Arc<dyn Translator>> = if config.translate_instructions {
            Some(Arc::new(ChatTranslator::new(
                Arc::clone(&client),
                config.model.clone(),
            )))
        } else {
            None
        };
        Self {
            client,
            translator,
            config,
        }
    }

    pub fn config(&self) -> &JudgeConfig {
        &self.config
    }

    pub async fn judge(&self, request: &JudgeRequest) -> Judgement {
        let combined = format!("{} {}", request.statement_a, request.statement_b);
        let language = detect_language(&combined).unwrap_or_default();

        match self.try_judge(request, language).await {
            Ok(text) => Judgement {
                text,
                language: language.code().to_string(),
                failed: false,
            },
            Err(err) => {
                log::warn!(
                    "Verdict for {} vs {} failed: {err}",
                    request.name_a,
                    request.name_b
                );
                Judgement {
                    text: format!("Error: JudgeBot could not deliver a verdict: {err}"),
                    language: language.code().to_string(),
                    failed: true,
                }
            }
        }
    }

    async fn try_judge(
        &self,
        request: &JudgeRequest,
        language: DetectedLanguage,
    ) -> Result<String> {
        let instruction = self
            .instruction_for(
                system_instruction(request.theme, &request.name_a, &request.name_b),
                language,
            )
            .await;
        let chat = ChatRequest {
            model: self.config.model.clone(),
            messages: vec![
                ChatMessage::system(instruction),
                ChatMessage::user(user_prompt(
                    &request.name_a,
                    &request.statement_a,
                    &request.name_b,
                    &request.statement_b,
                )),
            ],
            temperature: self.config.temperature,
        };
        self.client.complete(&chat).await
    }

    async fn instruction_for(&self, instruction: String, language: DetectedLanguage) -> String {
        if language.is_english() {
            return instruction;
        }
        let Some(translator) = &self.translator else {
            return instruction;
        };
        match translator.translate(&instruction, language).await {
            Ok(translated) => translated,
            Err(err) => {
                log::warn!(
                    "Instruction translation to {} failed, using English: {err}",
                    language.code()
                );
                instruction
            }
        }
    }
}
