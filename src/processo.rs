use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::workflow::{SituacaoSubprocesso, TipoProcesso};

/// Lifecycle of a process as a whole, independent of its units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SituacaoProcesso {
    Criado,
    EmAndamento,
    Finalizado,
}

impl fmt::Display for SituacaoProcesso {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SituacaoProcesso::Criado => write!(f, "CRIADO"),
            SituacaoProcesso::EmAndamento => write!(f, "EM_ANDAMENTO"),
            SituacaoProcesso::Finalizado => write!(f, "FINALIZADO"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ErroProcesso {
    /// The lifecycle only moves CRIADO → EM_ANDAMENTO → FINALIZADO.
    #[error("processo em {atual} não pode receber a operação {operacao}")]
    SituacaoInvalida {
        atual: SituacaoProcesso,
        operacao: &'static str,
    },

    /// Finalization refused while some unit is not homologated.
    #[error("processo possui subprocessos não homologados nas unidades {unidades:?}")]
    SubprocessosPendentes { unidades: Vec<u64> },
}

/// One organizational unit participating in a process, with its own
/// subprocess situation. `filhos` mirrors the org hierarchy restricted to
/// the participating units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnidadeParticipante {
    pub cod_unidade: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cod_unidade_superior: Option<u64>,
    pub sigla: String,
    pub situacao_subprocesso: SituacaoSubprocesso,
    pub data_limite: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mapa_codigo: Option<u64>,
    #[serde(default)]
    pub filhos: Vec<UnidadeParticipante>,
}

impl UnidadeParticipante {
    pub fn nova(cod_unidade: u64, sigla: impl Into<String>, data_limite: NaiveDate) -> Self {
        Self {
            cod_unidade,
            cod_unidade_superior: None,
            sigla: sigla.into(),
            situacao_subprocesso: SituacaoSubprocesso::NaoIniciado,
            data_limite,
            mapa_codigo: None,
            filhos: Vec::new(),
        }
    }

    /// This unit and every unit below it, depth first.
    pub fn todas(&self) -> Vec<&UnidadeParticipante> {
        let mut acc = vec![self];
        for filho in &self.filhos {
            acc.extend(filho.todas());
        }
        acc
    }

    /// Every unit strictly below this one.
    pub fn descendentes(&self) -> Vec<&UnidadeParticipante> {
        self.filhos.iter().flat_map(|f| f.todas()).collect()
    }

    /// Finds a unit by code in this subtree.
    pub fn encontrar(&self, cod: u64) -> Option<&UnidadeParticipante> {
        if self.cod_unidade == cod {
            return Some(self);
        }
        self.filhos.iter().find_map(|f| f.encontrar(cod))
    }
}

/// A competency-mapping campaign over a set of organizational units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Processo {
    pub codigo: u64,
    pub tipo: TipoProcesso,
    pub situacao: SituacaoProcesso,
    pub data_criacao: DateTime<Utc>,
    pub data_limite: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_finalizacao: Option<DateTime<Utc>>,
    /// Roots of the participating-unit forest.
    pub unidades: Vec<UnidadeParticipante>,
}

impl Processo {
    pub fn novo(
        codigo: u64,
        tipo: TipoProcesso,
        data_limite: NaiveDate,
        unidades: Vec<UnidadeParticipante>,
    ) -> Self {
        Self {
            codigo,
            tipo,
            situacao: SituacaoProcesso::Criado,
            data_criacao: Utc::now(),
            data_limite,
            data_finalizacao: None,
            unidades,
        }
    }

    /// Moves CRIADO → EM_ANDAMENTO.
    pub fn iniciar(&mut self) -> Result<(), ErroProcesso> {
        if self.situacao != SituacaoProcesso::Criado {
            return Err(ErroProcesso::SituacaoInvalida {
                atual: self.situacao,
                operacao: "iniciar",
            });
        }
        self.situacao = SituacaoProcesso::EmAndamento;
        Ok(())
    }

    /// Moves EM_ANDAMENTO → FINALIZADO, refused while any unit's
    /// subprocess is not in the terminal homologated situation. The record
    /// becomes a read-only archive after this.
    pub fn finalizar(&mut self) -> Result<(), ErroProcesso> {
        if self.situacao != SituacaoProcesso::EmAndamento {
            return Err(ErroProcesso::SituacaoInvalida {
                atual: self.situacao,
                operacao: "finalizar",
            });
        }
        let pendentes: Vec<u64> = self
            .todas_unidades()
            .iter()
            .filter(|u| !u.situacao_subprocesso.is_terminal())
            .map(|u| u.cod_unidade)
            .collect();
        if !pendentes.is_empty() {
            return Err(ErroProcesso::SubprocessosPendentes { unidades: pendentes });
        }
        self.situacao = SituacaoProcesso::Finalizado;
        self.data_finalizacao = Some(Utc::now());
        Ok(())
    }

    /// Every participating unit across all roots, depth first.
    pub fn todas_unidades(&self) -> Vec<&UnidadeParticipante> {
        self.unidades.iter().flat_map(|u| u.todas()).collect()
    }

    /// Finds a participating unit by code.
    pub fn unidade(&self, cod: u64) -> Option<&UnidadeParticipante> {
        self.unidades.iter().find_map(|u| u.encontrar(cod))
    }
}

/// Snapshot of one unit's subprocess as read from the repository, the
/// freshly-read value every transition is conditioned on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subprocesso {
    pub cod_unidade: u64,
    pub tipo: TipoProcesso,
    pub situacao: SituacaoSubprocesso,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(ano: i32, mes: u32, dia: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(ano, mes, dia).unwrap()
    }

    fn arvore_exemplo() -> UnidadeParticipante {
        let limite = data(2026, 12, 31);
        let mut raiz = UnidadeParticipante::nova(1, "SEDOC", limite);
        let mut coord = UnidadeParticipante::nova(22, "COORD_22", limite);
        coord.cod_unidade_superior = Some(1);
        let mut secao = UnidadeParticipante::nova(221, "SECAO_221", limite);
        secao.cod_unidade_superior = Some(22);
        coord.filhos.push(secao);
        raiz.filhos.push(coord);
        raiz
    }

    #[test]
    fn novo_processo_comeca_criado() {
        let p = Processo::novo(1, TipoProcesso::Mapeamento, data(2026, 12, 31), vec![]);
        assert_eq!(p.situacao, SituacaoProcesso::Criado);
        assert!(p.data_finalizacao.is_none());
    }

    #[test]
    fn ciclo_de_vida_avanca_somente_para_frente() {
        let mut p = Processo::novo(1, TipoProcesso::Mapeamento, data(2026, 12, 31), vec![]);
        p.iniciar().unwrap();
        assert_eq!(p.situacao, SituacaoProcesso::EmAndamento);

        // Não se inicia duas vezes.
        assert_eq!(
            p.iniciar(),
            Err(ErroProcesso::SituacaoInvalida {
                atual: SituacaoProcesso::EmAndamento,
                operacao: "iniciar",
            })
        );

        p.finalizar().unwrap();
        assert_eq!(p.situacao, SituacaoProcesso::Finalizado);
        assert!(p.data_finalizacao.is_some());
        assert!(p.finalizar().is_err());
    }

    #[test]
    fn finalizar_exige_todos_homologados() {
        let mut raiz = arvore_exemplo();
        raiz.situacao_subprocesso = SituacaoSubprocesso::MapaHomologado;
        raiz.filhos[0].situacao_subprocesso = SituacaoSubprocesso::MapaHomologado;
        raiz.filhos[0].filhos[0].situacao_subprocesso = SituacaoSubprocesso::MapaDisponibilizado;

        let mut p = Processo::novo(1, TipoProcesso::Mapeamento, data(2026, 12, 31), vec![raiz]);
        p.iniciar().unwrap();

        assert_eq!(
            p.finalizar(),
            Err(ErroProcesso::SubprocessosPendentes {
                unidades: vec![221]
            })
        );

        // Homologando a pendente, a finalização passa.
        p.unidades[0].filhos[0].filhos[0].situacao_subprocesso =
            SituacaoSubprocesso::MapaHomologado;
        p.finalizar().unwrap();
    }

    #[test]
    fn travessia_da_arvore() {
        let raiz = arvore_exemplo();
        let codigos: Vec<u64> = raiz.todas().iter().map(|u| u.cod_unidade).collect();
        assert_eq!(codigos, vec![1, 22, 221]);

        let desc: Vec<u64> = raiz.descendentes().iter().map(|u| u.cod_unidade).collect();
        assert_eq!(desc, vec![22, 221]);

        assert_eq!(raiz.encontrar(221).unwrap().sigla, "SECAO_221");
        assert!(raiz.encontrar(999).is_none());
    }

    #[test]
    fn serializacao_roundtrip_do_processo() {
        let p = Processo::novo(
            7,
            TipoProcesso::Revisao,
            data(2027, 6, 30),
            vec![arvore_exemplo()],
        );
        let json = serde_json::to_string(&p).unwrap();
        let de: Processo = serde_json::from_str(&json).unwrap();
        assert_eq!(de, p);
        assert!(json.contains("\"codUnidade\""));
        assert!(json.contains("\"situacaoSubprocesso\""));
    }
}
