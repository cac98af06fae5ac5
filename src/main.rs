use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use clap::Parser;
use serde::Deserialize;

use sgc::api::SgcApiClient;
use sgc::cli::{Cli, Command};
use sgc::impacto::{DetalhesMudanca, Mudanca, TipoMudanca, calcular_impacto};
use sgc::mapa::{Atividade, Competencia};
use sgc::orquestrador::{
    ErroColaborador, HierarquiaOrg, MapaRepo, MudancaStore, Orquestrador, PayloadAcao,
    SubprocessoRepo,
};
use sgc::processo::{Processo, Subprocesso, UnidadeParticipante};
use sgc::ui::{BlocoProgress, imprimir_impacto, imprimir_processo};
use sgc::workflow::{
    AcaoBloco, AcaoWorkflow, Perfil, RelacaoHierarquica, SituacaoSubprocesso, TipoProcesso,
    resolver_permissoes, subprocessos_elegiveis,
};
use sgc::{SgcConfig, SgcError};

/// Snapshot de revisão aceito pelo subcomando `impacto`.
#[derive(Debug, Deserialize)]
struct SnapshotImpacto {
    #[serde(default)]
    mudancas: Vec<Mudanca>,
    #[serde(default)]
    competencias: Vec<Competencia>,
}

fn carregar_processo(caminho: &str) -> Result<Processo, SgcError> {
    let conteudo = std::fs::read_to_string(Path::new(caminho))?;
    Ok(serde_json::from_str(&conteudo)?)
}

fn carregar_snapshot_impacto(caminho: &str) -> Result<SnapshotImpacto, SgcError> {
    let conteudo = std::fs::read_to_string(Path::new(caminho))?;
    Ok(serde_json::from_str(&conteudo)?)
}

fn perfil_da_config(nome: &str) -> Perfil {
    match nome.to_uppercase().as_str() {
        "ADMIN" => Perfil::Admin,
        "GESTOR" => Perfil::Gestor,
        "CHEFE" => Perfil::Chefe,
        _ => Perfil::Servidor,
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = SgcConfig::load()?;

    let perfil = cli
        .perfil
        .map(Perfil::from)
        .unwrap_or_else(|| perfil_da_config(&config.perfil_padrao));
    let unidade_usuario = cli.unidade.or(config.unidade_padrao).unwrap_or(1);

    match cli.command {
        Command::Situacao { arquivo } => {
            let processo = carregar_processo(&arquivo)?;
            imprimir_processo(&processo);
            if cli.verbose {
                println!();
                for unidade in processo.todas_unidades() {
                    let relacao = if unidade.cod_unidade == unidade_usuario {
                        RelacaoHierarquica::SameUnit
                    } else if unidade
                        .cod_unidade_superior
                        .is_some_and(|sup| sup == unidade_usuario)
                    {
                        RelacaoHierarquica::Ancestor
                    } else {
                        RelacaoHierarquica::Unrelated
                    };
                    let permissoes = resolver_permissoes(
                        perfil,
                        unidade.situacao_subprocesso,
                        relacao,
                        processo.tipo,
                    );
                    println!(
                        "{}: {}",
                        unidade.sigla,
                        serde_json::to_string(&permissoes)?
                    );
                }
            }
        }

        Command::Impacto { arquivo } => {
            let snapshot = carregar_snapshot_impacto(&arquivo)?;
            let impacto = calcular_impacto(&snapshot.mudancas, &snapshot.competencias);
            imprimir_impacto(&impacto);
        }

        Command::Bloco { arquivo, acao } => {
            let processo = carregar_processo(&arquivo)?;
            let acao = AcaoBloco::from(acao);
            let elegiveis =
                subprocessos_elegiveis(&processo.unidades, perfil, acao, unidade_usuario);
            if elegiveis.is_empty() {
                println!("Nenhuma unidade elegível para {acao} com o perfil {perfil}.");
            } else {
                println!("Unidades elegíveis para {acao}:");
                for unidade in elegiveis {
                    println!(
                        "  {} ({}) — {}",
                        unidade.sigla, unidade.cod_unidade, unidade.situacao_subprocesso
                    );
                }
            }
        }

        Command::Consultar { subprocesso } => {
            let cliente = SgcApiClient::new(config.base_url.clone(), config.api_token.clone());
            let sub = cliente.ler(subprocesso).await?;
            let relacao = cliente.relacao(unidade_usuario, sub.cod_unidade).await?;
            let permissoes = resolver_permissoes(perfil, sub.situacao, relacao, sub.tipo);
            println!("Subprocesso da unidade {}: {}", sub.cod_unidade, sub.situacao);
            println!("{}", serde_json::to_string_pretty(&permissoes)?);
        }

        Command::Demo => demo().await?,
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Demonstração embutida: colaboradores em memória + um ciclo de revisão.
// ---------------------------------------------------------------------------

struct DemoRepo {
    subs: Mutex<HashMap<u64, Subprocesso>>,
}

impl SubprocessoRepo for &DemoRepo {
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
struct DemoStore {
    logs: Mutex<HashMap<u64, Vec<Mudanca>>>,
}

impl MudancaStore for &DemoStore {
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

/// SEDOC(1) é ancestral de todas as unidades; COORD(22) é ancestral das
/// seções 221, 222 e 223.
struct DemoHierarquia;

impl HierarquiaOrg for &DemoHierarquia {
    async fn relacao(
        &self,
        unidade_a: u64,
        unidade_b: u64,
    ) -> Result<RelacaoHierarquica, ErroColaborador> {
        Ok(if unidade_a == unidade_b {
            RelacaoHierarquica::SameUnit
        } else if unidade_a == 1 || (unidade_a == 22 && unidade_b > 220) {
            RelacaoHierarquica::Ancestor
        } else {
            RelacaoHierarquica::Unrelated
        })
    }

    async fn descendentes(&self, unidade: u64) -> Result<Vec<u64>, ErroColaborador> {
        Ok(match unidade {
            1 => vec![22, 221, 222, 223],
            22 => vec![221, 222, 223],
            _ => vec![],
        })
    }
}

struct DemoMapas {
    competencias: Vec<Competencia>,
}

impl MapaRepo for &DemoMapas {
    async fn atividades(&self, _subprocesso: u64) -> Result<Vec<Atividade>, ErroColaborador> {
        Ok(vec![])
    }

    async fn competencias(&self, _subprocesso: u64) -> Result<Vec<Competencia>, ErroColaborador> {
        Ok(self.competencias.clone())
    }
}

async fn demo() -> anyhow::Result<()> {
    println!("Demonstração: ciclo de revisão da SECAO_221 e homologação em bloco.\n");

    let repo = DemoRepo {
        subs: Mutex::new(
            [221u64, 222, 223]
                .into_iter()
                .map(|cod| {
                    (
                        cod,
                        Subprocesso {
                            cod_unidade: cod,
                            tipo: TipoProcesso::Revisao,
                            situacao: if cod == 221 {
                                SituacaoSubprocesso::NaoIniciado
                            } else {
                                SituacaoSubprocesso::RevisaoCadastroDisponibilizado
                            },
                        },
                    )
                })
                .collect(),
        ),
    };
    let store = DemoStore::default();
    let hierarquia = DemoHierarquia;
    let mapas = DemoMapas {
        competencias: vec![Competencia {
            codigo: 10,
            descricao: "Gestão documental".into(),
            atividades: vec![2],
        }],
    };
    let orquestrador = Orquestrador::new(&repo, &store, &hierarquia, &mapas);

    // O chefe da 221 mexe no cadastro: a primeira mudança abre a revisão.
    orquestrador
        .registrar_mudanca_cadastro(
            221,
            Perfil::Chefe,
            221,
            TipoMudanca::AtividadeRemovida,
            DetalhesMudanca {
                id_atividade: Some(2),
                descricao_atividade: Some("Emitir parecer".into()),
                ..Default::default()
            },
        )
        .await?;
    println!("1. CHEFE removeu uma atividade — revisão do cadastro em andamento.");

    orquestrador
        .executar_acao(
            221,
            Perfil::Chefe,
            221,
            AcaoWorkflow::DisponibilizarCadastro,
            &PayloadAcao::default(),
        )
        .await?;
    println!("2. CHEFE disponibilizou o cadastro para análise.");

    let impacto = orquestrador
        .visualizar_impacto(221, Perfil::Admin, 1)
        .await?;
    println!("3. ADMIN consultou o impacto da revisão:");
    imprimir_impacto(&impacto);

    let resultado = orquestrador
        .executar_acao(
            221,
            Perfil::Admin,
            1,
            AcaoWorkflow::HomologarCadastro,
            &PayloadAcao {
                impacto_reconhecido: true,
                ..Default::default()
            },
        )
        .await?;
    println!(
        "\n4. ADMIN homologou o cadastro reconhecendo o impacto — {}.",
        resultado.nova_situacao
    );

    // Homologação em bloco das demais seções pendentes.
    let limite = chrono::NaiveDate::from_ymd_opt(2026, 12, 31).unwrap();
    let mut raiz = UnidadeParticipante::nova(22, "COORD_22", limite);
    raiz.situacao_subprocesso = SituacaoSubprocesso::RevisaoCadastroHomologado;
    for (cod, sigla) in [(221, "SECAO_221"), (222, "SECAO_222"), (223, "SECAO_223")] {
        let mut u = UnidadeParticipante::nova(cod, sigla, limite);
        u.cod_unidade_superior = Some(22);
        u.situacao_subprocesso = (&repo).ler(cod).await?.situacao;
        raiz.filhos.push(u);
    }

    let raizes = vec![raiz];
    let elegiveis = subprocessos_elegiveis(&raizes, Perfil::Admin, AcaoBloco::Homologar, 1);
    println!("\n5. ADMIN homologa em bloco as {} seções pendentes:", elegiveis.len());

    let progresso = BlocoProgress::start(elegiveis.len() as u64, "HOMOLOGAR");
    let resultado = orquestrador
        .executar_em_bloco(
            &raizes,
            Perfil::Admin,
            AcaoBloco::Homologar,
            1,
            &PayloadAcao {
                impacto_reconhecido: true,
                ..Default::default()
            },
        )
        .await;
    for cod in &resultado.sucesso {
        let sigla = raizes[0]
            .encontrar(*cod)
            .map(|u| u.sigla.clone())
            .unwrap_or_else(|| cod.to_string());
        progresso.unidade_ok(&sigla);
    }
    for falha in &resultado.falha {
        let sigla = raizes[0]
            .encontrar(falha.unidade)
            .map(|u| u.sigla.clone())
            .unwrap_or_else(|| falha.unidade.to_string());
        progresso.unidade_falha(&sigla, &falha.motivo);
    }
    progresso.finish(&resultado);

    Ok(())
}
