use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    // --- Completion Provider Args ---
    /// API key for the OpenAI chat completions API. Requests fail with 500 when unset.
    #[arg(long, env = "OPENAI_API_KEY")]
    pub openai_api_key: Option<String>,

    /// Model used for chat completion (e.g., gpt-4, gpt-4o-mini)
    #[arg(long, env = "OPENAI_MODEL", default_value = "gpt-4")]
    pub openai_model: String,

    /// Base URL of the OpenAI-compatible API (e.g., https://api.openai.com/v1)
    #[arg(long, env = "OPENAI_BASE_URL")] // No default, let the client handle it
    pub openai_base_url: Option<String>,

    /// Maximum number of characters of the original email body forwarded to the model. 0 disables the limit.
    #[arg(long, env = "MAX_CONTEXT_CHARS", default_value = "8000")]
    pub max_context_chars: usize,

    // --- Server Args ---
    /// Interface the server binds to.
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port the server listens on.
    #[arg(long, env = "PORT", default_value = "3000")]
    pub port: u16,

    /// Directory holding the panel document and its static assets.
    #[arg(long, env = "PUBLIC_DIR", default_value = "public")]
    pub public_dir: String,

    // --- TLS Args ---
    /// Serve over HTTPS when the certificate and key files exist. Falls back to HTTP otherwise.
    /// Accepts true/false, yes/no, on/off or 1/0.
    #[arg(
        long,
        env = "USE_HTTPS",
        default_value_t = true,
        action = clap::ArgAction::Set,
        value_parser = clap::builder::BoolishValueParser::new()
    )]
    pub use_https: bool,

    /// Path to the TLS certificate file (PEM format).
    #[arg(long, env = "TLS_CERT_PATH", default_value = "cert.pem")]
    pub tls_cert_path: String,

    /// Path to the TLS private key file (PEM format).
    #[arg(long, env = "TLS_KEY_PATH", default_value = "key.pem")]
    pub tls_key_path: String,
}

impl Args {
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// The configured API key, ignoring blank values.
    pub fn api_key(&self) -> Option<String> {
        self.openai_api_key.clone().filter(|k| !k.trim().is_empty())
    }
}
