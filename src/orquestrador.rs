use serde::Serialize;
use thiserror::Error;

use crate::impacto::{DetalhesMudanca, ImpactoMapa, Mudanca, TipoMudanca, calcular_impacto};
use crate::mapa::{Atividade, Competencia, MapaIncompleto, validar_disponibilizacao};
use crate::processo::{Subprocesso, UnidadeParticipante};
use crate::workflow::{
    AcaoBloco, AcaoWorkflow, ErroTransicao, Perfil, RelacaoHierarquica, ResultadoBloco,
    SituacaoSubprocesso, TipoProcesso, resolver_permissoes, subprocessos_elegiveis, transicionar,
};

/// Failure reported by an external collaborator (repository, change store,
/// hierarchy lookup).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("colaborador externo falhou: {0}")]
pub struct ErroColaborador(pub String);

/// Reads and conditionally writes subprocess situations. The write is a
/// compare-and-swap on the situation read just before, delegated to
/// whatever stores subprocess state.
pub trait SubprocessoRepo {
    async fn ler(&self, subprocesso: u64) -> Result<Subprocesso, ErroColaborador>;

    /// Returns false when the stored situation no longer equals `esperada`.
    async fn gravar_se_inalterada(
        &self,
        subprocesso: u64,
        esperada: SituacaoSubprocesso,
        nova: SituacaoSubprocesso,
    ) -> Result<bool, ErroColaborador>;
}

/// Append-only store of the change log of each subprocess's revision
/// session.
pub trait MudancaStore {
    async fn anexar(&self, subprocesso: u64, mudanca: Mudanca) -> Result<(), ErroColaborador>;
    async fn listar(&self, subprocesso: u64) -> Result<Vec<Mudanca>, ErroColaborador>;
    async fn limpar(&self, subprocesso: u64) -> Result<(), ErroColaborador>;
}

/// Answers questions about the organizational tree. The orchestrator never
/// walks the hierarchy itself.
pub trait HierarquiaOrg {
    async fn relacao(
        &self,
        unidade_a: u64,
        unidade_b: u64,
    ) -> Result<RelacaoHierarquica, ErroColaborador>;
    async fn descendentes(&self, unidade: u64) -> Result<Vec<u64>, ErroColaborador>;
}

/// Supplies the current cadastro and mapa content of a subprocess.
pub trait MapaRepo {
    async fn atividades(&self, subprocesso: u64) -> Result<Vec<Atividade>, ErroColaborador>;
    async fn competencias(&self, subprocesso: u64) -> Result<Vec<Competencia>, ErroColaborador>;
}

/// Everything that can stop a requested workflow action. Errors are
/// values; nothing is retried internally.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ErroOrquestrador {
    #[error("perfil {perfil} não pode executar {acao} nesta situação")]
    PermissionDenied { perfil: Perfil, acao: &'static str },

    #[error("ação não permitida neste momento: {0}")]
    InvalidTransition(#[from] ErroTransicao),

    #[error("justificativa (motivo) é obrigatória para esta ação")]
    MissingJustification,

    #[error("há impactos no mapa que ainda não foram reconhecidos")]
    ImpactNotAcknowledged,

    #[error("a situação do subprocesso mudou desde a leitura; recarregue e tente de novo")]
    StaleState,

    #[error(
        "mapa incompleto: competências sem atividade {:?}, atividades sem competência {:?}",
        .0.competencias_sem_atividade,
        .0.atividades_sem_competencia
    )]
    IncompleteMapa(MapaIncompleto),

    #[error(transparent)]
    Colaborador(#[from] ErroColaborador),
}

impl ErroOrquestrador {
    /// Stable name used as the per-unit motivo in bulk summaries.
    pub fn nome(&self) -> &'static str {
        match self {
            ErroOrquestrador::PermissionDenied { .. } => "PermissionDenied",
            ErroOrquestrador::InvalidTransition(_) => "InvalidTransition",
            ErroOrquestrador::MissingJustification => "MissingJustification",
            ErroOrquestrador::ImpactNotAcknowledged => "ImpactNotAcknowledged",
            ErroOrquestrador::StaleState => "StaleState",
            ErroOrquestrador::IncompleteMapa(_) => "IncompleteMapa",
            ErroOrquestrador::Colaborador(_) => "Colaborador",
        }
    }
}

/// Caller-supplied data accompanying an action request.
#[derive(Debug, Clone, Default)]
pub struct PayloadAcao {
    /// Written justification, required for devoluções and reaberturas.
    pub motivo: Option<String>,
    /// Set when the caller has seen the impact report and confirmed it.
    pub impacto_reconhecido: bool,
}

/// Outcome of a successful action.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultadoAcao {
    pub nova_situacao: SituacaoSubprocesso,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub impacto: Option<ImpactoMapa>,
}

/// Composes permission resolution, the transition table and the impact
/// analyzer over the external collaborators. Holds no ambient state: every
/// decision starts from a fresh read of the subprocess.
pub struct Orquestrador<R, M, H, P> {
    repo: R,
    mudancas: M,
    hierarquia: H,
    mapas: P,
}

impl<R, M, H, P> Orquestrador<R, M, H, P>
where
    R: SubprocessoRepo,
    M: MudancaStore,
    H: HierarquiaOrg,
    P: MapaRepo,
{
    pub fn new(repo: R, mudancas: M, hierarquia: H, mapas: P) -> Self {
        Self {
            repo,
            mudancas,
            hierarquia,
            mapas,
        }
    }

    /// Runs one workflow action end to end: authorize, validate, compute
    /// the next situation, gate revision homologation on acknowledged
    /// impact, then persist behind the compare-and-swap. On conflict the
    /// caller re-fetches and retries; nothing is retried here.
    pub async fn executar_acao(
        &self,
        subprocesso: u64,
        perfil: Perfil,
        unidade_usuario: u64,
        acao: AcaoWorkflow,
        payload: &PayloadAcao,
    ) -> Result<ResultadoAcao, ErroOrquestrador> {
        let sub = self.repo.ler(subprocesso).await?;
        let relacao = self
            .hierarquia
            .relacao(unidade_usuario, sub.cod_unidade)
            .await?;

        let permissoes = resolver_permissoes(perfil, sub.situacao, relacao, sub.tipo);
        if !permissoes.permite(acao) {
            return Err(ErroOrquestrador::PermissionDenied {
                perfil,
                acao: acao.nome(),
            });
        }

        if acao.exige_motivo() && payload.motivo.as_deref().is_none_or(|m| m.trim().is_empty()) {
            return Err(ErroOrquestrador::MissingJustification);
        }

        if acao == AcaoWorkflow::DisponibilizarMapa {
            let atividades = self.mapas.atividades(subprocesso).await?;
            let competencias = self.mapas.competencias(subprocesso).await?;
            validar_disponibilizacao(&atividades, &competencias)
                .map_err(ErroOrquestrador::IncompleteMapa)?;
        }

        let nova = transicionar(sub.situacao, acao, sub.tipo)?;

        let mut impacto = None;
        if acao == AcaoWorkflow::HomologarCadastro && sub.tipo == TipoProcesso::Revisao {
            let relatorio = self.impacto_atual(subprocesso).await?;
            if relatorio.tem_impactos && !payload.impacto_reconhecido {
                return Err(ErroOrquestrador::ImpactNotAcknowledged);
            }
            impacto = Some(relatorio);
        }

        let gravou = self
            .repo
            .gravar_se_inalterada(subprocesso, sub.situacao, nova)
            .await?;
        if !gravou {
            return Err(ErroOrquestrador::StaleState);
        }

        if nova.is_terminal() {
            self.mudancas.limpar(subprocesso).await?;
        }

        Ok(ResultadoAcao {
            nova_situacao: nova,
            impacto,
        })
    }

    /// Records one cadastro mutation. The first mutation of a subprocess
    /// still at NAO_INICIADO moves it into the in-progress cadastro
    /// situation of its track. Only revision subprocesses keep a change
    /// log; for mapeamento the mutation is persisted by the caller and
    /// nothing is recorded here.
    pub async fn registrar_mudanca_cadastro(
        &self,
        subprocesso: u64,
        perfil: Perfil,
        unidade_usuario: u64,
        tipo: TipoMudanca,
        detalhes: DetalhesMudanca,
    ) -> Result<Option<Mudanca>, ErroOrquestrador> {
        let sub = self.repo.ler(subprocesso).await?;
        let relacao = self
            .hierarquia
            .relacao(unidade_usuario, sub.cod_unidade)
            .await?;

        let permissoes = resolver_permissoes(perfil, sub.situacao, relacao, sub.tipo);
        if !permissoes.pode_editar_cadastro {
            return Err(ErroOrquestrador::PermissionDenied {
                perfil,
                acao: "EDITAR_CADASTRO",
            });
        }

        if sub.situacao == SituacaoSubprocesso::NaoIniciado {
            let em_andamento = SituacaoSubprocesso::cadastro_em_andamento_da_trilha(sub.tipo)
                .ok_or(ErroOrquestrador::InvalidTransition(
                    ErroTransicao::InvalidForTipo {
                        tipo: sub.tipo,
                        acao: "EDITAR_CADASTRO",
                    },
                ))?;
            let gravou = self
                .repo
                .gravar_se_inalterada(subprocesso, sub.situacao, em_andamento)
                .await?;
            if !gravou {
                return Err(ErroOrquestrador::StaleState);
            }
        }

        if sub.tipo != TipoProcesso::Revisao {
            return Ok(None);
        }

        let existentes = self.mudancas.listar(subprocesso).await?;
        let proximo_id = existentes.last().map_or(1, |m| m.id + 1);
        let mudanca = Mudanca {
            id: proximo_id,
            tipo,
            id_atividade: detalhes.id_atividade,
            id_conhecimento: detalhes.id_conhecimento,
            descricao_atividade: detalhes.descricao_atividade,
            descricao_conhecimento: detalhes.descricao_conhecimento,
            valor_antigo: detalhes.valor_antigo,
            valor_novo: detalhes.valor_novo,
            competencias_impactadas_ids: None,
        };
        self.mudancas.anexar(subprocesso, mudanca.clone()).await?;
        Ok(Some(mudanca))
    }

    /// Computes the impact report on demand for an authorized viewer.
    pub async fn visualizar_impacto(
        &self,
        subprocesso: u64,
        perfil: Perfil,
        unidade_usuario: u64,
    ) -> Result<ImpactoMapa, ErroOrquestrador> {
        let sub = self.repo.ler(subprocesso).await?;
        let relacao = self
            .hierarquia
            .relacao(unidade_usuario, sub.cod_unidade)
            .await?;
        let permissoes = resolver_permissoes(perfil, sub.situacao, relacao, sub.tipo);
        if !permissoes.pode_visualizar_impacto {
            return Err(ErroOrquestrador::PermissionDenied {
                perfil,
                acao: "VISUALIZAR_IMPACTO",
            });
        }
        self.impacto_atual(subprocesso).await
    }

    async fn impacto_atual(&self, subprocesso: u64) -> Result<ImpactoMapa, ErroOrquestrador> {
        let mudancas = self.mudancas.listar(subprocesso).await?;
        let competencias = self.mapas.competencias(subprocesso).await?;
        Ok(calcular_impacto(&mudancas, &competencias))
    }

    /// Applies the bulk action to every eligible unit, one independent
    /// transition per unit. A failure on one unit is recorded in the
    /// summary and never blocks the rest of the batch.
    pub async fn executar_em_bloco(
        &self,
        raizes: &[UnidadeParticipante],
        perfil: Perfil,
        acao: AcaoBloco,
        unidade_usuario: u64,
        payload: &PayloadAcao,
    ) -> ResultadoBloco {
        let mut resultado = ResultadoBloco::default();
        for unidade in subprocessos_elegiveis(raizes, perfil, acao, unidade_usuario) {
            let concreta = acao_concreta(acao, unidade.situacao_subprocesso);
            match self
                .executar_acao(unidade.cod_unidade, perfil, unidade_usuario, concreta, payload)
                .await
            {
                Ok(_) => resultado.registrar_sucesso(unidade.cod_unidade),
                Err(erro) => resultado.registrar_falha(unidade.cod_unidade, erro.nome()),
            }
        }
        resultado
    }
}

/// Picks the concrete workflow action a bulk request means for a unit,
/// based on which stage the unit is waiting at.
fn acao_concreta(acao: AcaoBloco, situacao: SituacaoSubprocesso) -> AcaoWorkflow {
    let no_cadastro = matches!(
        situacao,
        SituacaoSubprocesso::CadastroDisponibilizado
            | SituacaoSubprocesso::RevisaoCadastroDisponibilizado
    );
    match (acao, no_cadastro) {
        (AcaoBloco::Aceitar, true) => AcaoWorkflow::AceitarCadastro,
        (AcaoBloco::Aceitar, false) => AcaoWorkflow::AceitarMapa,
        (AcaoBloco::Homologar, true) => AcaoWorkflow::HomologarCadastro,
        (AcaoBloco::Homologar, false) => AcaoWorkflow::HomologarMapa,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;

    use chrono::NaiveDate;

    struct RepoMem {
        subs: Mutex<HashMap<u64, Subprocesso>>,
        cas_falha: HashSet<u64>,
    }

    impl RepoMem {
        fn novo(subs: Vec<Subprocesso>) -> Self {
            Self {
                subs: Mutex::new(subs.into_iter().map(|s| (s.cod_unidade, s)).collect()),
                cas_falha: HashSet::new(),
            }
        }

        fn com_cas_falhando(mut self, unidade: u64) -> Self {
            self.cas_falha.insert(unidade);
            self
        }

        fn situacao(&self, unidade: u64) -> SituacaoSubprocesso {
            self.subs.lock().unwrap()[&unidade].situacao
        }
    }

    impl SubprocessoRepo for &RepoMem {
        async fn ler(&self, subprocesso: u64) -> Result<Subprocesso, ErroColaborador> {
            self.subs
                .lock()
                .unwrap()
                .get(&subprocesso)
                .copied()
                .ok_or_else(|| ErroColaborador(format!("subprocesso {subprocesso} não existe")))
        }

        async fn gravar_se_inalterada(
            &self,
            subprocesso: u64,
            esperada: SituacaoSubprocesso,
            nova: SituacaoSubprocesso,
        ) -> Result<bool, ErroColaborador> {
            if self.cas_falha.contains(&subprocesso) {
                return Ok(false);
            }
            let mut subs = self.subs.lock().unwrap();
            let sub = subs
                .get_mut(&subprocesso)
                .ok_or_else(|| ErroColaborador(format!("subprocesso {subprocesso} não existe")))?;
            if sub.situacao != esperada {
                return Ok(false);
            }
            sub.situacao = nova;
            Ok(true)
        }
    }

    #[derive(Default)]
    struct StoreMem {
        logs: Mutex<HashMap<u64, Vec<Mudanca>>>,
    }

    impl StoreMem {
        fn tamanho(&self, subprocesso: u64) -> usize {
            self.logs
                .lock()
                .unwrap()
                .get(&subprocesso)
                .map_or(0, Vec::len)
        }
    }

    impl MudancaStore for &StoreMem {
        async fn anexar(&self, subprocesso: u64, mudanca: Mudanca) -> Result<(), ErroColaborador> {
            self.logs
                .lock()
                .unwrap()
                .entry(subprocesso)
                .or_default()
                .push(mudanca);
            Ok(())
        }

        async fn listar(&self, subprocesso: u64) -> Result<Vec<Mudanca>, ErroColaborador> {
            Ok(self
                .logs
                .lock()
                .unwrap()
                .get(&subprocesso)
                .cloned()
                .unwrap_or_default())
        }

        async fn limpar(&self, subprocesso: u64) -> Result<(), ErroColaborador> {
            self.logs.lock().unwrap().remove(&subprocesso);
            Ok(())
        }
    }

    /// Hierarquia fixa dos testes: 1 é ancestral de todas; cada unidade é
    /// SameUnit de si mesma; o resto é Unrelated.
    struct HierarquiaMem;

    impl HierarquiaOrg for &HierarquiaMem {
        async fn relacao(
            &self,
            unidade_a: u64,
            unidade_b: u64,
        ) -> Result<RelacaoHierarquica, ErroColaborador> {
            Ok(if unidade_a == unidade_b {
                RelacaoHierarquica::SameUnit
            } else if unidade_a == 1 {
                RelacaoHierarquica::Ancestor
            } else {
                RelacaoHierarquica::Unrelated
            })
        }

        async fn descendentes(&self, unidade: u64) -> Result<Vec<u64>, ErroColaborador> {
            Ok(if unidade == 1 { vec![22, 33, 44] } else { vec![] })
        }
    }

    #[derive(Default)]
    struct MapaMem {
        atividades: Vec<Atividade>,
        competencias: Vec<Competencia>,
    }

    impl MapaRepo for &MapaMem {
        async fn atividades(&self, _subprocesso: u64) -> Result<Vec<Atividade>, ErroColaborador> {
            Ok(self.atividades.clone())
        }

        async fn competencias(&self, _subprocesso: u64) -> Result<Vec<Competencia>, ErroColaborador> {
            Ok(self.competencias.clone())
        }
    }

    fn sub(cod_unidade: u64, tipo: TipoProcesso, situacao: SituacaoSubprocesso) -> Subprocesso {
        Subprocesso {
            cod_unidade,
            tipo,
            situacao,
        }
    }

    fn orq<'a>(
        repo: &'a RepoMem,
        store: &'a StoreMem,
        hier: &'a HierarquiaMem,
        mapas: &'a MapaMem,
    ) -> Orquestrador<&'a RepoMem, &'a StoreMem, &'a HierarquiaMem, &'a MapaMem> {
        Orquestrador::new(repo, store, hier, mapas)
    }

    #[tokio::test]
    async fn admin_homologa_cadastro_disponibilizado() {
        let repo = RepoMem::novo(vec![sub(
            22,
            TipoProcesso::Mapeamento,
            SituacaoSubprocesso::CadastroDisponibilizado,
        )]);
        let (store, hier, mapas) = (StoreMem::default(), HierarquiaMem, MapaMem::default());
        let o = orq(&repo, &store, &hier, &mapas);

        let r = o
            .executar_acao(22, Perfil::Admin, 1, AcaoWorkflow::HomologarCadastro, &PayloadAcao::default())
            .await
            .unwrap();
        assert_eq!(r.nova_situacao, SituacaoSubprocesso::CadastroHomologado);
        assert_eq!(repo.situacao(22), SituacaoSubprocesso::CadastroHomologado);

        // Sem CriarMapa no meio, repetir a homologação não é transição válida.
        let erro = o
            .executar_acao(22, Perfil::Admin, 1, AcaoWorkflow::HomologarCadastro, &PayloadAcao::default())
            .await
            .unwrap_err();
        assert!(matches!(erro, ErroOrquestrador::InvalidTransition(_)));
    }

    #[tokio::test]
    async fn chefe_nao_homologa_o_proprio_mapa() {
        let repo = RepoMem::novo(vec![sub(
            22,
            TipoProcesso::Mapeamento,
            SituacaoSubprocesso::MapaValidado,
        )]);
        let (store, hier, mapas) = (StoreMem::default(), HierarquiaMem, MapaMem::default());
        let o = orq(&repo, &store, &hier, &mapas);

        let erro = o
            .executar_acao(22, Perfil::Chefe, 22, AcaoWorkflow::HomologarMapa, &PayloadAcao::default())
            .await
            .unwrap_err();
        assert!(matches!(erro, ErroOrquestrador::PermissionDenied { .. }));
        assert_eq!(erro.nome(), "PermissionDenied");
    }

    #[tokio::test]
    async fn devolucao_exige_motivo() {
        let repo = RepoMem::novo(vec![sub(
            22,
            TipoProcesso::Mapeamento,
            SituacaoSubprocesso::CadastroDisponibilizado,
        )]);
        let (store, hier, mapas) = (StoreMem::default(), HierarquiaMem, MapaMem::default());
        let o = orq(&repo, &store, &hier, &mapas);

        let erro = o
            .executar_acao(22, Perfil::Gestor, 1, AcaoWorkflow::DevolverCadastro, &PayloadAcao::default())
            .await
            .unwrap_err();
        assert_eq!(erro, ErroOrquestrador::MissingJustification);

        // Motivo em branco também não serve.
        let payload = PayloadAcao {
            motivo: Some("   ".into()),
            ..Default::default()
        };
        let erro = o
            .executar_acao(22, Perfil::Gestor, 1, AcaoWorkflow::DevolverCadastro, &payload)
            .await
            .unwrap_err();
        assert_eq!(erro, ErroOrquestrador::MissingJustification);

        let payload = PayloadAcao {
            motivo: Some("Faltam conhecimentos na atividade de protocolo".into()),
            ..Default::default()
        };
        let r = o
            .executar_acao(22, Perfil::Gestor, 1, AcaoWorkflow::DevolverCadastro, &payload)
            .await
            .unwrap();
        assert_eq!(r.nova_situacao, SituacaoSubprocesso::CadastroEmAndamento);
    }

    #[tokio::test]
    async fn homologacao_de_revisao_exige_impacto_reconhecido() {
        let repo = RepoMem::novo(vec![sub(
            22,
            TipoProcesso::Revisao,
            SituacaoSubprocesso::RevisaoCadastroDisponibilizado,
        )]);
        let store = StoreMem::default();
        let hier = HierarquiaMem;
        let mapas = MapaMem {
            atividades: vec![],
            competencias: vec![Competencia {
                codigo: 10,
                descricao: "Gestão documental".into(),
                atividades: vec![2],
            }],
        };
        (&store)
            .anexar(
                22,
                Mudanca {
                    id: 1,
                    tipo: TipoMudanca::AtividadeRemovida,
                    id_atividade: Some(2),
                    id_conhecimento: None,
                    descricao_atividade: Some("Emitir parecer".into()),
                    descricao_conhecimento: None,
                    valor_antigo: None,
                    valor_novo: None,
                    competencias_impactadas_ids: None,
                },
            )
            .await
            .unwrap();
        let o = orq(&repo, &store, &hier, &mapas);

        let erro = o
            .executar_acao(22, Perfil::Admin, 1, AcaoWorkflow::HomologarCadastro, &PayloadAcao::default())
            .await
            .unwrap_err();
        assert_eq!(erro, ErroOrquestrador::ImpactNotAcknowledged);

        let payload = PayloadAcao {
            impacto_reconhecido: true,
            ..Default::default()
        };
        let r = o
            .executar_acao(22, Perfil::Admin, 1, AcaoWorkflow::HomologarCadastro, &payload)
            .await
            .unwrap();
        assert_eq!(r.nova_situacao, SituacaoSubprocesso::RevisaoCadastroHomologado);
        let impacto = r.impacto.expect("homologação de revisão devolve o relatório");
        assert!(impacto.tem_impactos);
        assert_eq!(impacto.competencias_impactadas[0].codigo, 10);
    }

    #[tokio::test]
    async fn conflito_de_gravacao_vira_stale_state() {
        let repo = RepoMem::novo(vec![sub(
            22,
            TipoProcesso::Mapeamento,
            SituacaoSubprocesso::CadastroDisponibilizado,
        )])
        .com_cas_falhando(22);
        let (store, hier, mapas) = (StoreMem::default(), HierarquiaMem, MapaMem::default());
        let o = orq(&repo, &store, &hier, &mapas);

        let erro = o
            .executar_acao(22, Perfil::Admin, 1, AcaoWorkflow::HomologarCadastro, &PayloadAcao::default())
            .await
            .unwrap_err();
        assert_eq!(erro, ErroOrquestrador::StaleState);
    }

    #[tokio::test]
    async fn situacao_terminal_limpa_o_log_de_mudancas() {
        let repo = RepoMem::novo(vec![sub(
            22,
            TipoProcesso::Revisao,
            SituacaoSubprocesso::RevisaoMapaValidado,
        )]);
        let store = StoreMem::default();
        (&store)
            .anexar(
                22,
                Mudanca {
                    id: 1,
                    tipo: TipoMudanca::AtividadeAdicionada,
                    id_atividade: Some(9),
                    id_conhecimento: None,
                    descricao_atividade: Some("Triagem".into()),
                    descricao_conhecimento: None,
                    valor_antigo: None,
                    valor_novo: None,
                    competencias_impactadas_ids: None,
                },
            )
            .await
            .unwrap();
        let (hier, mapas) = (HierarquiaMem, MapaMem::default());
        let o = orq(&repo, &store, &hier, &mapas);

        let r = o
            .executar_acao(22, Perfil::Admin, 1, AcaoWorkflow::HomologarMapa, &PayloadAcao::default())
            .await
            .unwrap();
        assert_eq!(r.nova_situacao, SituacaoSubprocesso::RevisaoMapaHomologado);
        assert_eq!(store.tamanho(22), 0);
    }

    #[tokio::test]
    async fn disponibilizar_mapa_incompleto_falha_apontando_infratores() {
        let repo = RepoMem::novo(vec![sub(
            22,
            TipoProcesso::Mapeamento,
            SituacaoSubprocesso::MapaCriado,
        )]);
        let store = StoreMem::default();
        let hier = HierarquiaMem;
        let mapas = MapaMem {
            atividades: vec![
                Atividade {
                    codigo: 1,
                    descricao: "Autuar".into(),
                    conhecimentos: vec![],
                },
                Atividade {
                    codigo: 2,
                    descricao: "Arquivar".into(),
                    conhecimentos: vec![],
                },
            ],
            competencias: vec![
                Competencia {
                    codigo: 10,
                    descricao: "Gestão documental".into(),
                    atividades: vec![1],
                },
                Competencia {
                    codigo: 11,
                    descricao: "Vazia".into(),
                    atividades: vec![],
                },
            ],
        };
        let o = orq(&repo, &store, &hier, &mapas);

        let erro = o
            .executar_acao(22, Perfil::Admin, 1, AcaoWorkflow::DisponibilizarMapa, &PayloadAcao::default())
            .await
            .unwrap_err();
        match erro {
            ErroOrquestrador::IncompleteMapa(incompleto) => {
                assert_eq!(incompleto.competencias_sem_atividade, vec![11]);
                assert_eq!(incompleto.atividades_sem_competencia, vec![2]);
            }
            outro => panic!("esperava IncompleteMapa, veio {outro:?}"),
        }
        // A situação não se move quando a checagem barra a ação.
        assert_eq!(repo.situacao(22), SituacaoSubprocesso::MapaCriado);
    }

    #[tokio::test]
    async fn primeira_mudanca_inicia_o_cadastro_e_registra() {
        let repo = RepoMem::novo(vec![sub(
            22,
            TipoProcesso::Revisao,
            SituacaoSubprocesso::NaoIniciado,
        )]);
        let (store, hier, mapas) = (StoreMem::default(), HierarquiaMem, MapaMem::default());
        let o = orq(&repo, &store, &hier, &mapas);

        let registrada = o
            .registrar_mudanca_cadastro(
                22,
                Perfil::Chefe,
                22,
                TipoMudanca::AtividadeAdicionada,
                DetalhesMudanca {
                    id_atividade: Some(5),
                    descricao_atividade: Some("Conferir malote".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .expect("revisão registra mudança");
        assert_eq!(registrada.id, 1);
        assert_eq!(
            repo.situacao(22),
            SituacaoSubprocesso::RevisaoCadastroEmAndamento
        );

        // A segunda mudança segue a sequência e não mexe mais na situação.
        let registrada = o
            .registrar_mudanca_cadastro(
                22,
                Perfil::Chefe,
                22,
                TipoMudanca::ConhecimentoAdicionado,
                DetalhesMudanca {
                    id_atividade: Some(5),
                    id_conhecimento: Some(51),
                    descricao_conhecimento: Some("Rotina de malotes".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(registrada.id, 2);
        assert_eq!(store.tamanho(22), 2);
    }

    #[tokio::test]
    async fn mudanca_em_mapeamento_nao_gera_registro() {
        let repo = RepoMem::novo(vec![sub(
            22,
            TipoProcesso::Mapeamento,
            SituacaoSubprocesso::CadastroEmAndamento,
        )]);
        let (store, hier, mapas) = (StoreMem::default(), HierarquiaMem, MapaMem::default());
        let o = orq(&repo, &store, &hier, &mapas);

        let registrada = o
            .registrar_mudanca_cadastro(
                22,
                Perfil::Chefe,
                22,
                TipoMudanca::AtividadeAdicionada,
                DetalhesMudanca::default(),
            )
            .await
            .unwrap();
        assert!(registrada.is_none());
        assert_eq!(store.tamanho(22), 0);
    }

    #[tokio::test]
    async fn servidor_nao_edita_cadastro() {
        let repo = RepoMem::novo(vec![sub(
            22,
            TipoProcesso::Revisao,
            SituacaoSubprocesso::RevisaoCadastroEmAndamento,
        )]);
        let (store, hier, mapas) = (StoreMem::default(), HierarquiaMem, MapaMem::default());
        let o = orq(&repo, &store, &hier, &mapas);

        let erro = o
            .registrar_mudanca_cadastro(
                22,
                Perfil::Servidor,
                22,
                TipoMudanca::AtividadeAdicionada,
                DetalhesMudanca::default(),
            )
            .await
            .unwrap_err();
        assert!(matches!(erro, ErroOrquestrador::PermissionDenied { .. }));
    }

    #[tokio::test]
    async fn visualizar_impacto_respeita_permissao() {
        let repo = RepoMem::novo(vec![sub(
            22,
            TipoProcesso::Revisao,
            SituacaoSubprocesso::RevisaoCadastroEmAndamento,
        )]);
        let (store, hier, mapas) = (StoreMem::default(), HierarquiaMem, MapaMem::default());
        let o = orq(&repo, &store, &hier, &mapas);

        let impacto = o.visualizar_impacto(22, Perfil::Chefe, 22).await.unwrap();
        assert!(!impacto.tem_impactos);

        // Unidade sem relação com a dona do subprocesso não enxerga nada.
        let erro = o.visualizar_impacto(22, Perfil::Chefe, 33).await.unwrap_err();
        assert!(matches!(erro, ErroOrquestrador::PermissionDenied { .. }));
    }

    #[tokio::test]
    async fn bloco_isola_falha_por_unidade() {
        let repo = RepoMem::novo(vec![
            sub(22, TipoProcesso::Mapeamento, SituacaoSubprocesso::CadastroDisponibilizado),
            sub(33, TipoProcesso::Mapeamento, SituacaoSubprocesso::CadastroDisponibilizado),
            sub(44, TipoProcesso::Mapeamento, SituacaoSubprocesso::CadastroDisponibilizado),
        ])
        .com_cas_falhando(33);
        let (store, hier, mapas) = (StoreMem::default(), HierarquiaMem, MapaMem::default());
        let o = orq(&repo, &store, &hier, &mapas);

        let limite = NaiveDate::from_ymd_opt(2026, 12, 31).unwrap();
        let mut raiz = UnidadeParticipante::nova(1, "SEDOC", limite);
        raiz.situacao_subprocesso = SituacaoSubprocesso::MapaHomologado;
        for (cod, sigla) in [(22, "COORD_22"), (33, "COORD_33"), (44, "COORD_44")] {
            let mut u = UnidadeParticipante::nova(cod, sigla, limite);
            u.situacao_subprocesso = SituacaoSubprocesso::CadastroDisponibilizado;
            raiz.filhos.push(u);
        }

        let resultado = o
            .executar_em_bloco(
                std::slice::from_ref(&raiz),
                Perfil::Admin,
                AcaoBloco::Homologar,
                1,
                &PayloadAcao::default(),
            )
            .await;

        assert_eq!(resultado.sucesso, vec![22, 44]);
        assert_eq!(resultado.falha.len(), 1);
        assert_eq!(resultado.falha[0].unidade, 33);
        assert_eq!(resultado.falha[0].motivo, "StaleState");
        assert_eq!(repo.situacao(22), SituacaoSubprocesso::CadastroHomologado);
        assert_eq!(repo.situacao(33), SituacaoSubprocesso::CadastroDisponibilizado);
    }

    #[tokio::test]
    async fn bloco_escolhe_a_acao_conforme_o_estagio() {
        let repo = RepoMem::novo(vec![
            sub(22, TipoProcesso::Mapeamento, SituacaoSubprocesso::CadastroDisponibilizado),
            sub(33, TipoProcesso::Mapeamento, SituacaoSubprocesso::MapaValidado),
        ]);
        let (store, hier, mapas) = (StoreMem::default(), HierarquiaMem, MapaMem::default());
        let o = orq(&repo, &store, &hier, &mapas);

        let limite = NaiveDate::from_ymd_opt(2026, 12, 31).unwrap();
        let mut raiz = UnidadeParticipante::nova(1, "SEDOC", limite);
        raiz.situacao_subprocesso = SituacaoSubprocesso::MapaHomologado;
        let mut u22 = UnidadeParticipante::nova(22, "COORD_22", limite);
        u22.situacao_subprocesso = SituacaoSubprocesso::CadastroDisponibilizado;
        let mut u33 = UnidadeParticipante::nova(33, "COORD_33", limite);
        u33.situacao_subprocesso = SituacaoSubprocesso::MapaValidado;
        raiz.filhos.push(u22);
        raiz.filhos.push(u33);

        let resultado = o
            .executar_em_bloco(
                std::slice::from_ref(&raiz),
                Perfil::Admin,
                AcaoBloco::Homologar,
                1,
                &PayloadAcao::default(),
            )
            .await;

        assert_eq!(resultado.sucesso, vec![22, 33]);
        assert_eq!(repo.situacao(22), SituacaoSubprocesso::CadastroHomologado);
        assert_eq!(repo.situacao(33), SituacaoSubprocesso::MapaHomologado);
    }
}
