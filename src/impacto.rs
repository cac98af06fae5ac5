//! Change recording and map-impact analysis for revision flows.
//!
//! Every cadastro mutation made during a revisão is captured as an
//! immutable [`Mudanca`]. [`calcular_impacto`] re-derives the
//! [`ImpactoMapa`] report from the full change log and the current
//! competency set on demand, so the report can never go stale relative to
//! newly recorded changes.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

use crate::mapa::Competencia;

/// The six kinds of cadastro mutation tracked during a revisão.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TipoMudanca {
    AtividadeAdicionada,
    AtividadeRemovida,
    AtividadeAlterada,
    ConhecimentoAdicionado,
    ConhecimentoRemovido,
    ConhecimentoAlterado,
}

impl TipoMudanca {
    /// Whether a change of this kind can impact an existing competency.
    /// A newly added activity is not yet linked to any competency, so
    /// insertions never do.
    pub fn afeta_competencia(self) -> bool {
        !matches!(self, TipoMudanca::AtividadeAdicionada)
    }
}

/// An immutable change record, created the instant a cadastro mutation
/// happens during a revisão. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mudanca {
    pub id: u64,
    pub tipo: TipoMudanca,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_atividade: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_conhecimento: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub descricao_atividade: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub descricao_conhecimento: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valor_antigo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valor_novo: Option<String>,
    /// Filled by callers that persist a computed report alongside the
    /// record; the analyzer always recomputes and never trusts it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub competencias_impactadas_ids: Option<Vec<u64>>,
}

/// Payload of a change being recorded, before it receives its id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetalhesMudanca {
    pub id_atividade: Option<u64>,
    pub id_conhecimento: Option<u64>,
    pub descricao_atividade: Option<String>,
    pub descricao_conhecimento: Option<String>,
    pub valor_antigo: Option<String>,
    pub valor_novo: Option<String>,
}

/// The change log of one subprocess's open revision session.
///
/// Ids are a monotonically increasing sequence scoped to the session;
/// clearing the log ends the session and starts a fresh one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistroMudancas {
    pub sessao: Uuid,
    proximo_id: u64,
    mudancas: Vec<Mudanca>,
}

impl RegistroMudancas {
    pub fn nova() -> Self {
        Self {
            sessao: Uuid::new_v4(),
            proximo_id: 1,
            mudancas: Vec::new(),
        }
    }

    /// Appends an immutable record and returns it.
    pub fn registrar(&mut self, tipo: TipoMudanca, detalhes: DetalhesMudanca) -> &Mudanca {
        let mudanca = Mudanca {
            id: self.proximo_id,
            tipo,
            id_atividade: detalhes.id_atividade,
            id_conhecimento: detalhes.id_conhecimento,
            descricao_atividade: detalhes.descricao_atividade,
            descricao_conhecimento: detalhes.descricao_conhecimento,
            valor_antigo: detalhes.valor_antigo,
            valor_novo: detalhes.valor_novo,
            competencias_impactadas_ids: None,
        };
        self.proximo_id += 1;
        self.mudancas.push(mudanca);
        self.mudancas.last().expect("registro recém inserido")
    }

    pub fn mudancas(&self) -> &[Mudanca] {
        &self.mudancas
    }

    pub fn len(&self) -> usize {
        self.mudancas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mudancas.is_empty()
    }

    /// Discards the log and starts a new session.
    pub fn limpar(&mut self) {
        self.sessao = Uuid::new_v4();
        self.proximo_id = 1;
        self.mudancas.clear();
    }
}

impl Default for RegistroMudancas {
    fn default() -> Self {
        Self::nova()
    }
}

/// Impact-type label attached to an impacted competency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TipoImpacto {
    AtividadeRemovida,
    AtividadeAlterada,
}

/// Knowledge-level detail nested under an activity entry of the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MudancaConhecimento {
    pub tipo: TipoMudanca,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_conhecimento: Option<u64>,
    pub descricao: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valor_antigo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valor_novo: Option<String>,
}

/// One activity entry in an insertion/removal/alteration bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AtividadeImpactada {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_atividade: Option<u64>,
    pub descricao: String,
    /// Ids of the changes that produced this entry.
    pub mudancas: Vec<u64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conhecimentos: Vec<MudancaConhecimento>,
}

/// An activity named inside an impacted competency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AtividadeAfetada {
    pub id_atividade: u64,
    pub descricao: String,
}

/// A competency whose associated activities were touched by the revision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompetenciaImpactada {
    pub codigo: u64,
    pub descricao: String,
    pub tipos: Vec<TipoImpacto>,
    pub atividades_afetadas: Vec<AtividadeAfetada>,
    /// Ids of the matched changes.
    pub mudancas: Vec<u64>,
}

/// Simple counts of each bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TotaisImpacto {
    pub inseridas: usize,
    pub removidas: usize,
    pub alteradas: usize,
    pub competencias_impactadas: usize,
}

/// The impact report. Derived, never stored: always recomputed from the
/// change log plus the current competency set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpactoMapa {
    pub atividades_inseridas: Vec<AtividadeImpactada>,
    pub atividades_removidas: Vec<AtividadeImpactada>,
    pub atividades_alteradas: Vec<AtividadeImpactada>,
    pub competencias_impactadas: Vec<CompetenciaImpactada>,
    pub totais: TotaisImpacto,
    pub tem_impactos: bool,
}

fn descricao_da_atividade(mudanca: &Mudanca) -> String {
    mudanca.descricao_atividade.clone().unwrap_or_default()
}

/// Finds the alteration entry for an activity, creating it on first sight.
/// First-seen order is preserved so the report reads like the log.
fn entrada_alterada<'a>(
    alteradas: &'a mut Vec<AtividadeImpactada>,
    mudanca: &Mudanca,
) -> &'a mut AtividadeImpactada {
    let pos = alteradas
        .iter()
        .position(|e| e.id_atividade == mudanca.id_atividade);
    let pos = match pos {
        Some(p) => p,
        None => {
            alteradas.push(AtividadeImpactada {
                id_atividade: mudanca.id_atividade,
                descricao: descricao_da_atividade(mudanca),
                mudancas: Vec::new(),
                conhecimentos: Vec::new(),
            });
            alteradas.len() - 1
        }
    };
    &mut alteradas[pos]
}

/// Computes the impact report from the raw change log and the current
/// competency-to-activity associations.
///
/// Opposite-sign changes are not coalesced: an activity inserted and later
/// removed in the same session shows up as two raw entries. Pure and
/// idempotent; calling it twice over the same inputs yields the same
/// report.
pub fn calcular_impacto(mudancas: &[Mudanca], competencias: &[Competencia]) -> ImpactoMapa {
    let mut inseridas = Vec::new();
    let mut removidas = Vec::new();
    let mut alteradas: Vec<AtividadeImpactada> = Vec::new();

    for mudanca in mudancas {
        match mudanca.tipo {
            TipoMudanca::AtividadeAdicionada => inseridas.push(AtividadeImpactada {
                id_atividade: mudanca.id_atividade,
                descricao: descricao_da_atividade(mudanca),
                mudancas: vec![mudanca.id],
                conhecimentos: Vec::new(),
            }),
            TipoMudanca::AtividadeRemovida => removidas.push(AtividadeImpactada {
                id_atividade: mudanca.id_atividade,
                descricao: descricao_da_atividade(mudanca),
                mudancas: vec![mudanca.id],
                conhecimentos: Vec::new(),
            }),
            TipoMudanca::AtividadeAlterada => {
                let entrada = entrada_alterada(&mut alteradas, mudanca);
                entrada.mudancas.push(mudanca.id);
            }
            TipoMudanca::ConhecimentoAdicionado
            | TipoMudanca::ConhecimentoRemovido
            | TipoMudanca::ConhecimentoAlterado => {
                let entrada = entrada_alterada(&mut alteradas, mudanca);
                entrada.mudancas.push(mudanca.id);
                entrada.conhecimentos.push(MudancaConhecimento {
                    tipo: mudanca.tipo,
                    id_conhecimento: mudanca.id_conhecimento,
                    descricao: mudanca.descricao_conhecimento.clone().unwrap_or_default(),
                    valor_antigo: mudanca.valor_antigo.clone(),
                    valor_novo: mudanca.valor_novo.clone(),
                });
            }
        }
    }

    let mut competencias_impactadas = Vec::new();
    for competencia in competencias {
        let mut tipos = BTreeSet::new();
        let mut afetadas: Vec<AtividadeAfetada> = Vec::new();
        let mut ids = Vec::new();

        for mudanca in mudancas {
            if !mudanca.tipo.afeta_competencia() {
                continue;
            }
            let Some(id_atividade) = mudanca.id_atividade else {
                continue;
            };
            if !competencia.atividades.contains(&id_atividade) {
                continue;
            }

            tipos.insert(match mudanca.tipo {
                TipoMudanca::AtividadeRemovida => TipoImpacto::AtividadeRemovida,
                _ => TipoImpacto::AtividadeAlterada,
            });
            if !afetadas.iter().any(|a| a.id_atividade == id_atividade) {
                afetadas.push(AtividadeAfetada {
                    id_atividade,
                    descricao: descricao_da_atividade(mudanca),
                });
            }
            ids.push(mudanca.id);
        }

        if !ids.is_empty() {
            competencias_impactadas.push(CompetenciaImpactada {
                codigo: competencia.codigo,
                descricao: competencia.descricao.clone(),
                tipos: tipos.into_iter().collect(),
                atividades_afetadas: afetadas,
                mudancas: ids,
            });
        }
    }

    let totais = TotaisImpacto {
        inseridas: inseridas.len(),
        removidas: removidas.len(),
        alteradas: alteradas.len(),
        competencias_impactadas: competencias_impactadas.len(),
    };
    let tem_impactos =
        !inseridas.is_empty() || !removidas.is_empty() || !alteradas.is_empty();

    ImpactoMapa {
        atividades_inseridas: inseridas,
        atividades_removidas: removidas,
        atividades_alteradas: alteradas,
        competencias_impactadas,
        totais,
        tem_impactos,
    }
}
