use thiserror::Error;

use crate::api::ApiError;

/// Erro de nível superior da aplicação de linha de comando.
///
/// As camadas internas (transição, permissão, orquestração) têm seus
/// próprios tipos de erro; este agrega as falhas de borda (configuração,
/// arquivos de snapshot, backend).
#[derive(Debug, Error)]
pub enum SgcError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("SGC API error: {0}")]
    Api(#[from] ApiError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}
