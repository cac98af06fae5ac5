use std::time::Duration;

use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;

use crate::impacto::Mudanca;
use crate::mapa::{Atividade, Competencia};
use crate::orquestrador::{
    ErroColaborador, HierarquiaOrg, MapaRepo, MudancaStore, SubprocessoRepo,
};
use crate::processo::Subprocesso;
use crate::workflow::{RelacaoHierarquica, SituacaoSubprocesso};

use super::error::ApiError;
use super::types::{DescendentesResponse, GravarSituacaoRequest, RelacaoResponse};

/// Cliente HTTP do backend REST do SGC.
///
/// Implementa os colaboradores externos do orquestrador
/// ([`SubprocessoRepo`], [`MudancaStore`], [`HierarquiaOrg`] e
/// [`MapaRepo`]) sobre a API. A URL base é injetável para os testes.
#[derive(Clone)]
pub struct SgcApiClient {
    client: Client,
    base_url: String,
    token: String,
}

impl SgcApiClient {
    pub fn new(base_url: String, token: String) -> Self {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(30))
            .build()
            .expect("failed to build HTTP client");
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    fn url(&self, caminho: &str) -> String {
        format!("{}/{caminho}", self.base_url)
    }

    async fn get_json<T: DeserializeOwned>(&self, caminho: &str) -> Result<T, ApiError> {
        let response = self
            .client
            .get(self.url(caminho))
            .bearer_auth(&self.token)
            .send()
            .await?;
        let response = checar_status(response).await?;
        Ok(response.json::<T>().await?)
    }
}

/// Converte respostas não-2xx em [`ApiError::Http`] com o corpo como
/// mensagem.
async fn checar_status(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response
        .text()
        .await
        .unwrap_or_else(|_| "unknown error".to_string());
    Err(ApiError::Http {
        status: status.as_u16(),
        message,
    })
}

impl SubprocessoRepo for SgcApiClient {
    async fn ler(&self, subprocesso: u64) -> Result<Subprocesso, ErroColaborador> {
        self.get_json(&format!("subprocessos/{subprocesso}"))
            .await
            .map_err(ErroColaborador::from)
    }

    async fn gravar_se_inalterada(
        &self,
        subprocesso: u64,
        esperada: SituacaoSubprocesso,
        nova: SituacaoSubprocesso,
    ) -> Result<bool, ErroColaborador> {
        let corpo = GravarSituacaoRequest { esperada, nova };
        let response = self
            .client
            .put(self.url(&format!("subprocessos/{subprocesso}/situacao")))
            .bearer_auth(&self.token)
            .json(&corpo)
            .send()
            .await
            .map_err(|e| ErroColaborador::from(ApiError::from(e)))?;

        // 409 é a falha esperada do compare-and-swap, não um erro.
        if response.status() == StatusCode::CONFLICT {
            return Ok(false);
        }
        checar_status(response).await.map_err(ErroColaborador::from)?;
        Ok(true)
    }
}

impl MudancaStore for SgcApiClient {
    async fn anexar(&self, subprocesso: u64, mudanca: Mudanca) -> Result<(), ErroColaborador> {
        let response = self
            .client
            .post(self.url(&format!("subprocessos/{subprocesso}/mudancas")))
            .bearer_auth(&self.token)
            .json(&mudanca)
            .send()
            .await
            .map_err(|e| ErroColaborador::from(ApiError::from(e)))?;
        checar_status(response).await.map_err(ErroColaborador::from)?;
        Ok(())
    }

    async fn listar(&self, subprocesso: u64) -> Result<Vec<Mudanca>, ErroColaborador> {
        self.get_json(&format!("subprocessos/{subprocesso}/mudancas"))
            .await
            .map_err(ErroColaborador::from)
    }

    async fn limpar(&self, subprocesso: u64) -> Result<(), ErroColaborador> {
        let response = self
            .client
            .delete(self.url(&format!("subprocessos/{subprocesso}/mudancas")))
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| ErroColaborador::from(ApiError::from(e)))?;
        checar_status(response).await.map_err(ErroColaborador::from)?;
        Ok(())
    }
}

impl HierarquiaOrg for SgcApiClient {
    async fn relacao(
        &self,
        unidade_a: u64,
        unidade_b: u64,
    ) -> Result<RelacaoHierarquica, ErroColaborador> {
        let resp: RelacaoResponse = self
            .get_json(&format!("unidades/{unidade_a}/relacao/{unidade_b}"))
            .await
            .map_err(ErroColaborador::from)?;
        Ok(resp.relacao)
    }

    async fn descendentes(&self, unidade: u64) -> Result<Vec<u64>, ErroColaborador> {
        let resp: DescendentesResponse = self
            .get_json(&format!("unidades/{unidade}/descendentes"))
            .await
            .map_err(ErroColaborador::from)?;
        Ok(resp.unidades)
    }
}

impl MapaRepo for SgcApiClient {
    async fn atividades(&self, subprocesso: u64) -> Result<Vec<Atividade>, ErroColaborador> {
        self.get_json(&format!("subprocessos/{subprocesso}/atividades"))
            .await
            .map_err(ErroColaborador::from)
    }

    async fn competencias(&self, subprocesso: u64) -> Result<Vec<Competencia>, ErroColaborador> {
        self.get_json(&format!("subprocessos/{subprocesso}/competencias"))
            .await
            .map_err(ErroColaborador::from)
    }
}
