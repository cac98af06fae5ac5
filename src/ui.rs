//! Interface de terminal do SGC — barra de progresso e saída colorida.
//!
//! Usa as crates `indicatif` para a barra de progresso das ações em bloco
//! e `console` para estilização com cores. O [`BlocoProgress`] acompanha
//! visualmente o processamento unidade a unidade.

use console::Style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::impacto::ImpactoMapa;
use crate::processo::{Processo, UnidadeParticipante};
use crate::workflow::ResultadoBloco;

/// Indicador visual de progresso para uma ação em bloco no terminal.
///
/// Avança a barra a cada unidade processada e imprime mensagens coloridas
/// para sucesso (verde) e falha (vermelho).
pub struct BlocoProgress {
    // Barra de progresso do indicatif.
    pb: ProgressBar,
    // Estilo verde para unidades processadas.
    green: Style,
    // Estilo vermelho para unidades com falha.
    red: Style,
    // Estilo amarelo para o resumo parcial.
    yellow: Style,
}

impl BlocoProgress {
    /// Inicia a barra com o total de unidades elegíveis.
    pub fn start(total: u64, acao: &str) -> Self {
        let pb = ProgressBar::new(total);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{bar:30.cyan} {pos}/{len} {msg}")
                .expect("invalid template"),
        );
        pb.set_message(format!("{acao} em bloco"));

        Self {
            pb,
            green: Style::new().green().bold(),
            red: Style::new().red().bold(),
            yellow: Style::new().yellow(),
        }
    }

    /// Registra uma unidade processada com sucesso.
    pub fn unidade_ok(&self, sigla: &str) {
        self.pb
            .println(format!("  {} {sigla}", self.green.apply_to("✓")));
        self.pb.inc(1);
    }

    /// Registra uma unidade que falhou, com o motivo.
    pub fn unidade_falha(&self, sigla: &str, motivo: &str) {
        self.pb
            .println(format!("  {} {sigla}: {motivo}", self.red.apply_to("✗")));
        self.pb.inc(1);
    }

    /// Finaliza a barra e imprime o resumo de sucesso parcial.
    pub fn finish(&self, resultado: &ResultadoBloco) {
        self.pb.finish_and_clear();
        if resultado.falha.is_empty() {
            println!(
                "  {} {} unidade(s) processada(s)",
                self.green.apply_to("✓"),
                resultado.sucesso.len()
            );
        } else {
            println!(
                "  {} {} processada(s), {} com falha",
                self.yellow.apply_to("!"),
                resultado.sucesso.len(),
                resultado.falha.len()
            );
        }
    }
}

/// Imprime a árvore de unidades participantes com a situação de cada uma.
pub fn imprimir_processo(processo: &Processo) {
    let titulo = Style::new().bold();
    println!(
        "{} processo {} ({}) — {}",
        titulo.apply_to("───"),
        processo.codigo,
        processo.tipo,
        processo.situacao
    );
    for unidade in &processo.unidades {
        imprimir_unidade(unidade, 0);
    }
}

fn imprimir_unidade(unidade: &UnidadeParticipante, nivel: usize) {
    let estilo = if unidade.situacao_subprocesso.is_terminal() {
        Style::new().green()
    } else {
        Style::new().yellow()
    };
    println!(
        "{:indent$}{} — {}",
        "",
        unidade.sigla,
        estilo.apply_to(unidade.situacao_subprocesso),
        indent = nivel * 2
    );
    for filho in &unidade.filhos {
        imprimir_unidade(filho, nivel + 1);
    }
}

/// Imprime o relatório de impacto formatado em JSON com estilo colorido.
pub fn imprimir_impacto(impacto: &ImpactoMapa) {
    let estilo = if impacto.tem_impactos {
        Style::new().yellow().bold()
    } else {
        Style::new().green().bold()
    };
    println!();
    println!("{}", estilo.apply_to("─── Impacto no Mapa ───"));
    println!(
        "{}",
        serde_json::to_string_pretty(impacto).unwrap_or_default()
    );
}
