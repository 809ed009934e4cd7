use crate::chat::{ChatClient, ChatMessage, ChatRequest};
use crate::error::{JudgeError, Result};
use async_trait::async_trait;
use std::sync::Arc;
use whatlang::Lang;

/// Below this whatlang confidence a detection is ignored unless whatlang
/// itself flags it as reliable.
const MIN_CONFIDENCE: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectedLanguage(Lang);

impl DetectedLanguage {
    pub const ENGLISH: DetectedLanguage = DetectedLanguage(Lang::Eng);

    /// ISO 639-3 code, e.g. `eng`, `fra`.
    pub fn code(&self) -> &'static str {
        self.0.code()
    }

    pub fn english_name(&self) -> &'static str {
        self.0.eng_name()
    }

    pub fn is_english(&self) -> bool {
        self.0 == Lang::Eng
    }
}

impl Default for DetectedLanguage {
    fn default() -> Self {
        Self::ENGLISH
    }
}

/// Dominant language of `text`, or `None` when detection is not confident.
pub fn detect_language(text: &str) -> Option<DetectedLanguage> {
    let info = whatlang::detect(text.trim())?;
    if info.is_reliable() || info.confidence() >= MIN_CONFIDENCE {
        Some(DetectedLanguage(info.lang()))
    } else {
        log::debug!(
            "Ignoring low-confidence language guess {} ({:.2})",
            info.lang().code(),
            info.confidence()
        );
        None
    }
}

/// BCP-47 tag a speech engine understands for an ISO 639-3 code.
pub fn speech_tag(code: &str) -> Option<&'static str> {
    let tag = match code {
        "afr" => "af",
        "aka" => "ak",
        "amh" => "am",
        "ara" => "ar",
        "aze" => "az",
        "bel" => "be",
        "ben" => "bn",
        "bul" => "bg",
        "cat" => "ca",
        "ces" => "cs",
        "cmn" => "zh",
        "dan" => "da",
        "deu" => "de",
        "ell" => "el",
        "eng" => "en",
        "est" => "et",
        "fin" => "fi",
        "fra" => "fr",
        "guj" => "gu",
        "heb" => "he",
        "hin" => "hi",
        "hrv" => "hr",
        "hun" => "hu",
        "hye" => "hy",
        "ind" => "id",
        "ita" => "it",
        "jav" => "jv",
        "jpn" => "ja",
        "kan" => "kn",
        "kat" => "ka",
        "khm" => "km",
        "kor" => "ko",
        "lat" => "la",
        "lav" => "lv",
        "lit" => "lt",
        "mal" => "ml",
        "mar" => "mr",
        "mkd" => "mk",
        "mya" => "my",
        "nep" => "ne",
        "nld" => "nl",
        "nob" => "nb",
        "ori" => "or",
        "pan" => "pa",
        "pes" => "fa",
        "pol" => "pl",
        "por" => "pt",
        "ron" => "ro",
        "rus" => "ru",
        "sin" => "si",
        "slk" => "sk",
        "slv" => "sl",
        "sna" => "sn",
        "spa" => "es",
        "srp" => "sr",
        "swe" => "sv",
        "tam" => "ta",
        "tel" => "te",
        "tgl" => "tl",
        "tha" => "th",
        "tuk" => "tk",
        "tur" => "tr",
        "ukr" => "uk",
        "urd" => "ur",
        "uzb" => "uz",
        "vie" => "vi",
        "yid" => "yi",
        "zul" => "zu",
        _ => return None,
    };
    Some(tag)
}

#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, text: &str, target: DetectedLanguage) -> Result<String>;
}

/// Translates through the same chat model that writes the verdict.
pub struct ChatTranslator {
    client: Arc<dyn ChatClient>,
    model: String,
}

impl ChatTranslator {
    pub fn new(client: Arc<dyn ChatClient>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }
}

#[async_trait]
impl Translator for ChatTranslator {
    async fn translate(&self, text: &str, target: DetectedLanguage) -> Result<String> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage::system(format!(
                    "Translate the user's message from English into {}. Reply with the translation only.",
                    target.english_name()
                )),
                ChatMessage::user(text),
            ],
            temperature: 0.0,
        };
        let translated = self.client.complete(&request).await?;
        let translated = translated.trim();
        if translated.is_empty() {
            return Err(JudgeError::EmptyCompletion);
        }
        Ok(translated.to_string())
    }
}
