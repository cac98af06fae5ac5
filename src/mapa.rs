//! Entidades do cadastro e do mapa de competências.
//!
//! [`Atividade`] e [`Conhecimento`] formam o inventário levantado pela
//! unidade; [`Competencia`] referencia atividades por código. A checagem
//! [`validar_disponibilizacao`] é aplicada no momento da disponibilização
//! do mapa, nunca continuamente.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Um conhecimento pertencente a exatamente uma atividade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conhecimento {
    pub codigo: u64,
    pub descricao: String,
}

/// Uma atividade do cadastro de uma unidade, com seus conhecimentos.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Atividade {
    pub codigo: u64,
    pub descricao: String,
    #[serde(default)]
    pub conhecimentos: Vec<Conhecimento>,
}

/// Uma competência do mapa, ligada às atividades por código.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Competencia {
    pub codigo: u64,
    pub descricao: String,
    /// Códigos das atividades associadas.
    #[serde(default)]
    pub atividades: Vec<u64>,
}

/// Entidades que impedem a disponibilização de um mapa.
///
/// Um mapa só pode ser disponibilizado quando toda competência referencia
/// ao menos uma atividade e toda atividade é referenciada por ao menos uma
/// competência. As listas apontam os infratores para a interface sinalizar.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapaIncompleto {
    pub competencias_sem_atividade: Vec<u64>,
    pub atividades_sem_competencia: Vec<u64>,
}

impl MapaIncompleto {
    pub fn vazio(&self) -> bool {
        self.competencias_sem_atividade.is_empty() && self.atividades_sem_competencia.is_empty()
    }
}

/// Verifica a completude do mapa no momento da disponibilização.
pub fn validar_disponibilizacao(
    atividades: &[Atividade],
    competencias: &[Competencia],
) -> Result<(), MapaIncompleto> {
    let referenciadas: BTreeSet<u64> = competencias
        .iter()
        .flat_map(|c| c.atividades.iter().copied())
        .collect();

    let incompleto = MapaIncompleto {
        competencias_sem_atividade: competencias
            .iter()
            .filter(|c| c.atividades.is_empty())
            .map(|c| c.codigo)
            .collect(),
        atividades_sem_competencia: atividades
            .iter()
            .filter(|a| !referenciadas.contains(&a.codigo))
            .map(|a| a.codigo)
            .collect(),
    };

    if incompleto.vazio() {
        Ok(())
    } else {
        Err(incompleto)
    }
}
