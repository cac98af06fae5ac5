use std::fmt;

use serde::{Deserialize, Serialize};

use crate::processo::UnidadeParticipante;

use super::permissao::Perfil;
use super::situacao::SituacaoSubprocesso;

/// The two bulk operations offered over a process's unit set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AcaoBloco {
    Aceitar,
    Homologar,
}

impl fmt::Display for AcaoBloco {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AcaoBloco::Aceitar => write!(f, "ACEITAR"),
            AcaoBloco::Homologar => write!(f, "HOMOLOGAR"),
        }
    }
}

/// Situations a unit must be in to enter a bulk batch: pending cadastro
/// submissions and maps awaiting the upstream decision.
fn aguardando_decisao(situacao: SituacaoSubprocesso) -> bool {
    use SituacaoSubprocesso::*;
    matches!(
        situacao,
        CadastroDisponibilizado
            | RevisaoCadastroDisponibilizado
            | MapaValidado
            | MapaComSugestoes
            | RevisaoMapaValidado
            | RevisaoMapaComSugestoes
    )
}

/// Selects the units of a process eligible for the requested bulk action.
///
/// GESTOR aceita over the strict descendants of their own unit; ADMIN
/// homologa system-wide. Any other (perfil, ação) pairing selects nothing.
/// An empty result is ordinary data: callers hide the bulk affordance.
pub fn subprocessos_elegiveis<'a>(
    raizes: &'a [UnidadeParticipante],
    perfil: Perfil,
    acao: AcaoBloco,
    unidade_usuario: u64,
) -> Vec<&'a UnidadeParticipante> {
    let candidatas: Vec<&UnidadeParticipante> = match (perfil, acao) {
        (Perfil::Gestor, AcaoBloco::Aceitar) => raizes
            .iter()
            .find_map(|r| r.encontrar(unidade_usuario))
            .map(|u| u.descendentes())
            .unwrap_or_default(),
        (Perfil::Admin, AcaoBloco::Homologar) => {
            raizes.iter().flat_map(|r| r.todas()).collect()
        }
        _ => Vec::new(),
    };

    candidatas
        .into_iter()
        .filter(|u| aguardando_decisao(u.situacao_subprocesso))
        .collect()
}

/// One unit that could not be processed inside a bulk batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FalhaBloco {
    pub unidade: u64,
    pub motivo: String,
}

/// Partial-success summary of a bulk execution. A failure on one unit
/// never aborts the rest of the batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultadoBloco {
    pub sucesso: Vec<u64>,
    pub falha: Vec<FalhaBloco>,
}

impl ResultadoBloco {
    pub fn registrar_sucesso(&mut self, unidade: u64) {
        self.sucesso.push(unidade);
    }

    pub fn registrar_falha(&mut self, unidade: u64, motivo: impl Into<String>) {
        self.falha.push(FalhaBloco {
            unidade,
            motivo: motivo.into(),
        });
    }

    pub fn total(&self) -> usize {
        self.sucesso.len() + self.falha.len()
    }
}
