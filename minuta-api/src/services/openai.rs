//! OpenAI chat-completions client
//!
//! The system prompt is an external contract: the response parser depends
//! on its exact key names, so the text is preserved verbatim.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Temperature kept low for more deterministic extraction
const TEMPERATURE: f64 = 0.3;

/// Fixed extraction instructions sent with every analysis request
const SYSTEM_PROMPT: &str = r#"Eres un analista de software experto especializado en extraer información de reuniones de desarrollo.

Tu tarea es analizar transcripciones de reuniones de Microsoft Teams y extraer:

1. **Resumen Ejecutivo**: Un resumen conciso de los puntos principales discutidos
2. **Fases del Proyecto**: Las etapas generales identificadas (ej: Análisis, Diseño, Desarrollo, Testing, Despliegue)
3. **Requerimientos**: Funcionales, no funcionales y técnicos mencionados
4. **Decisiones Técnicas**: Tecnologías, arquitecturas, patrones discutidos
5. **Acciones Pendientes**: Tareas o temas que requieren seguimiento

**IMPORTANTE**:
- Extrae SOLO información que esté EXPLÍCITAMENTE mencionada en la transcripción
- No inventes ni asumas información que no esté en el texto
- Clasifica los requerimientos por prioridad basándote en el tono y contexto de la conversación
- Identifica qué fase corresponde a cada requerimiento

Devuelve la respuesta en formato JSON con esta estructura exacta:

```json
{
  "summary": "Resumen ejecutivo breve",
  "phases": [
    {
      "name": "Nombre de la fase",
      "description": "Descripción detallada",
      "order": 1,
      "estimated_duration": "2 semanas"
    }
  ],
  "requirements": [
    {
      "title": "Título del requerimiento",
      "description": "Descripción detallada",
      "type": "functional|non_functional|technical|business",
      "priority": "low|medium|high|critical",
      "phase": "Nombre de la fase asociada"
    }
  ],
  "technical_decisions": [
    {
      "topic": "Tema decidido",
      "decision": "Decisión tomada",
      "rationale": "Justificación"
    }
  ],
  "action_items": [
    {
      "task": "Descripción de la tarea",
      "assigned_to": "Persona asignada (si se menciona)",
      "deadline": "Fecha límite (si se menciona)"
    }
  ]
}
```"#;

/// Analyzer call errors
#[derive(Debug, Error)]
pub enum AnalyzerError {
    #[error("OpenAI API key not configured")]
    MissingApiKey,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Model call timed out")]
    Timeout,

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Response contained no completion")]
    EmptyCompletion,
}

/// Seam between the pipeline and the text-generation service
///
/// Returns the raw structured text the model produced; normalization is the
/// response parser's job.
#[async_trait]
pub trait TranscriptAnalyzer: Send + Sync {
    /// Send one transcript (plus optional project context) for analysis
    async fn analyze(
        &self,
        transcription_text: &str,
        project_context: Option<&str>,
    ) -> Result<String, AnalyzerError>;

    /// Model identifier recorded on the transcript after a successful run
    fn model_id(&self) -> &str;
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

/// OpenAI chat-completions implementation of `TranscriptAnalyzer`
pub struct OpenAiClient {
    http_client: reqwest::Client,
    api_key: Option<String>,
    model: String,
}

impl OpenAiClient {
    /// Build a client; a missing API key surfaces at call time, matching the
    /// lazy failure behavior of the processing endpoint
    pub fn new(
        api_key: Option<String>,
        model: String,
        timeout_secs: u64,
    ) -> Result<Self, AnalyzerError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| AnalyzerError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            api_key,
            model,
        })
    }

    fn build_user_prompt(transcription_text: &str, project_context: Option<&str>) -> String {
        let divider = "=".repeat(80);
        let mut prompt = format!(
            "Analiza la siguiente transcripción de reunión:\n\n{}\n{}\n{}\n\n",
            divider, transcription_text, divider
        );

        if let Some(context) = project_context {
            prompt.push_str(&format!("**Contexto del proyecto:**\n{}\n\n", context));
        }

        prompt.push_str(
            "Extrae y estructura toda la información relevante siguiendo el formato JSON especificado.",
        );

        prompt
    }
}

#[async_trait]
impl TranscriptAnalyzer for OpenAiClient {
    async fn analyze(
        &self,
        transcription_text: &str,
        project_context: Option<&str>,
    ) -> Result<String, AnalyzerError> {
        let api_key = self.api_key.as_ref().ok_or(AnalyzerError::MissingApiKey)?;

        let body = serde_json::json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": Self::build_user_prompt(transcription_text, project_context) }
            ],
            "temperature": TEMPERATURE,
            "response_format": { "type": "json_object" }
        });

        tracing::debug!(model = %self.model, "Sending transcript to OpenAI");

        let response = self
            .http_client
            .post(format!("{}/chat/completions", OPENAI_BASE_URL))
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AnalyzerError::Timeout
                } else {
                    AnalyzerError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(AnalyzerError::Api(status.as_u16(), error_text));
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| AnalyzerError::Network(e.to_string()))?;

        chat.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(AnalyzerError::EmptyCompletion)
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_prompt_includes_context_when_present() {
        let prompt = OpenAiClient::build_user_prompt("hola equipo", Some("CRM interno"));
        assert!(prompt.contains("hola equipo"));
        assert!(prompt.contains("**Contexto del proyecto:**\nCRM interno"));
    }

    #[test]
    fn user_prompt_omits_context_block_when_absent() {
        let prompt = OpenAiClient::build_user_prompt("hola equipo", None);
        assert!(!prompt.contains("Contexto del proyecto"));
    }

    #[tokio::test]
    async fn missing_api_key_fails_at_call_time() {
        let client = OpenAiClient::new(None, "gpt-4-turbo-preview".to_string(), 5).unwrap();
        let err = client.analyze("texto", None).await.unwrap_err();
        assert!(matches!(err, AnalyzerError::MissingApiKey));
    }
}
