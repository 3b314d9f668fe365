use std::time::Duration;

/// Instruction sent with every room photo. `{room}` is replaced by the room label.
pub const DEFAULT_PROMPT_TEMPLATE: &str = r#"Analiza esta imagen de un {room} en una propiedad inmobiliaria.

Determina si necesita reforma basándote únicamente en lo que ves en la imagen.
Ignora cualquier texto o descripción previa.

Responde SOLO con un JSON con este formato exacto:
{
  "necesita_reforma": "si/no/?",
  "justificación": "breve explicación de por qué necesita o no reforma",
  "elementos_a_reformar": "lista de elementos que necesitan reforma",
  "estimación_coste": "rango aproximado en euros"
}"#;

const DEFAULT_OPENAI_API_BASE: &str = "https://api.openai.com/v1";
const DEFAULT_LISTING_API_HOST: &str = "idealista7.p.rapidapi.com";

/// Everything the pipeline needs, passed in by the caller. The engine never reads the
/// environment itself.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Without a key the pipeline goes straight to the area-based estimate.
    pub openai_api_key: Option<String>,
    pub openai_api_base: String,
    pub vision_model: String,
    pub max_tokens: u32,
    pub rapidapi_key: String,
    pub listing_api_base: String,
    pub listing_api_host: String,
    pub listing_location: String,
    pub listing_language: String,
    /// Minimum spacing between two vision requests.
    pub throttle_delay: Duration,
    pub image_width: u32,
    pub image_height: u32,
    pub jpeg_quality: u8,
    pub prompt_template: String,
    pub http_timeout: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            openai_api_base: DEFAULT_OPENAI_API_BASE.to_string(),
            vision_model: "gpt-4o".to_string(),
            max_tokens: 500,
            rapidapi_key: String::new(),
            listing_api_base: format!("https://{DEFAULT_LISTING_API_HOST}"),
            listing_api_host: DEFAULT_LISTING_API_HOST.to_string(),
            listing_location: "es".to_string(),
            listing_language: "es".to_string(),
            throttle_delay: Duration::from_secs(2),
            image_width: 800,
            image_height: 600,
            jpeg_quality: 70,
            prompt_template: DEFAULT_PROMPT_TEMPLATE.to_string(),
            http_timeout: Duration::from_secs(60),
        }
    }
}

impl PipelineConfig {
    pub fn has_vision_credentials(&self) -> bool {
        self.openai_api_key
            .as_deref()
            .map(|key| !key.trim().is_empty())
            .unwrap_or(false)
    }
}

/// Trims trailing slashes and appends `/v1` to a bare host, so both
/// `https://api.openai.com` and `https://api.openai.com/v1/` resolve the same.
pub fn normalize_api_base(raw: &str) -> String {
    let mut base = raw.trim().trim_end_matches('/').to_string();
    if base.is_empty() {
        return DEFAULT_OPENAI_API_BASE.to_string();
    }
    if let Ok(parsed) = reqwest::Url::parse(&base) {
        if parsed.path().trim().is_empty() || parsed.path() == "/" {
            base = format!("{base}/v1");
        }
    }
    base.trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::{normalize_api_base, PipelineConfig};

    #[test]
    fn api_base_normalization() {
        assert_eq!(
            normalize_api_base("https://api.openai.com"),
            "https://api.openai.com/v1"
        );
        assert_eq!(
            normalize_api_base("https://proxy.local/openai/v1/"),
            "https://proxy.local/openai/v1"
        );
        assert_eq!(normalize_api_base("  "), "https://api.openai.com/v1");
    }

    #[test]
    fn defaults_match_the_image_contract() {
        let config = PipelineConfig::default();
        assert_eq!((config.image_width, config.image_height), (800, 600));
        assert_eq!(config.jpeg_quality, 70);
        assert_eq!(config.max_tokens, 500);
        assert!(config.prompt_template.contains("{room}"));
        assert!(!config.has_vision_credentials());
    }
}
