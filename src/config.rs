//! Configuração do SGC carregada a partir de `sgc.toml`.
//!
//! A struct [`SgcConfig`] contém todos os parâmetros configuráveis.
//! Valores não presentes no arquivo usam defaults sensíveis.
//! A variável de ambiente `SGC_API_TOKEN` tem precedência sobre o arquivo.

use anyhow::Result;
use std::path::Path;

use serde::Deserialize;

/// Configuração de nível superior carregada de `sgc.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct SgcConfig {
    /// URL base do backend REST do SGC.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Token de acesso à API.
    #[serde(default)]
    pub api_token: String,

    /// Perfil assumido quando não especificado via CLI.
    #[serde(default = "default_perfil")]
    pub perfil_padrao: String,

    /// Unidade do usuário quando não especificada via CLI.
    #[serde(default)]
    pub unidade_padrao: Option<u64>,
}

// URL padrão do backend: instância local de desenvolvimento.
fn default_base_url() -> String {
    "http://localhost:8080/api".to_string()
}

// Perfil padrão: somente leitura.
fn default_perfil() -> String {
    "SERVIDOR".to_string()
}

impl Default for SgcConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_token: String::new(),
            perfil_padrao: default_perfil(),
            unidade_padrao: None,
        }
    }
}

impl SgcConfig {
    /// Carrega a configuração de `sgc.toml` no diretório atual.
    /// Usa valores padrão se o arquivo não existir.
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new("sgc.toml"))
    }

    /// Carrega a configuração do caminho informado.
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            toml::from_str::<SgcConfig>(&contents)?
        } else {
            Self::default()
        };

        // Variável de ambiente tem precedência sobre o arquivo para o token.
        if let Ok(token) = std::env::var("SGC_API_TOKEN")
            && !token.is_empty()
        {
            config.api_token = token;
        }

        Ok(config)
    }
}
