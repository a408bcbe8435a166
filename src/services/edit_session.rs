//! Sessão de edição de células com auto-save debounced
//!
//! Mantém a cópia local otimista das células editáveis da tabela projetada e
//! agrupa edições em lotes para o serviço de sincronização. Máquina de estado
//! por célula:
//!
//! ```text
//! Clean -> Dirty (edição) -> Saving (lote coletado) -> Clean (sucesso)
//!                                                   |-> Dirty (falha, retry)
//! ```
//!
//! O tempo é injetado: toda operação recebe um `DateTime<Utc>` explícito, de
//! modo que os testes simulam o relógio sem timers reais. O loop de parede
//! fica em `sheet_sync`, único ponto que alimenta a sessão com `Utc::now()`.
//!
//! Enquanto um lote está em voo nenhum outro é coletado; edições feitas nesse
//! intervalo marcam a célula como Dirty de novo e entram no lote seguinte.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sheets::CellChange;

use crate::services::projector::ProjectedTable;
use crate::utils::logging::log_edicao_ignorada;

/// Estado de persistência de uma célula
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellState {
    Clean,
    Dirty,
    Saving,
}

/// Tipo de valor da célula (orienta a formatação no editor)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    Texto,
    Numero,
    Data,
    Email,
    Telefone,
    Moeda,
}

/// Valor projetado + metadados de edição
#[derive(Debug, Clone)]
pub struct EditableCell {
    pub value: String,
    pub kind: ValueKind,
    pub editable: bool,
    state: CellState,
}

impl EditableCell {
    pub fn state(&self) -> CellState {
        self.state
    }
}

/// Inferência do tipo de valor a partir do nome da coluna
fn inferir_tipo(coluna: &str) -> ValueKind {
    if coluna.contains("DATA") || coluna.contains("VIGENCIA") {
        ValueKind::Data
    } else if coluna.contains("EMAIL") {
        ValueKind::Email
    } else if coluna.contains("TELEFONE") || coluna.contains("CELULAR") {
        ValueKind::Telefone
    } else if coluna.contains("VALOR") {
        ValueKind::Moeda
    } else if coluna.contains("TOTAL") || coluna.contains("QUANTIDADE") {
        ValueKind::Numero
    } else {
        ValueKind::Texto
    }
}

/// Sessão de edição: mapa (linha, coluna) -> célula + janela de debounce
pub struct EditSession {
    cells: HashMap<(String, String), EditableCell>,
    debounce: Duration,
    last_edit: Option<DateTime<Utc>>,
    flush_in_flight: bool,
}

impl EditSession {
    /// Cria uma sessão vazia com a janela de debounce dada (o legado usa 2000ms)
    pub fn new(debounce_ms: u64) -> Self {
        Self {
            cells: HashMap::new(),
            debounce: Duration::milliseconds(debounce_ms as i64),
            last_edit: None,
            flush_in_flight: false,
        }
    }

    /// Carrega (ou recarrega) as células a partir de uma tabela projetada
    ///
    /// A linha é identificada pela coluna ID. Células com edição pendente
    /// (Dirty/Saving) NÃO são sobrescritas: um poll com resposta velha não
    /// pode apagar uma edição local ainda não persistida.
    ///
    /// Células Clean de linhas/colunas que saíram da tabela são removidas;
    /// edições pendentes de linhas removidas ficam até serem sincronizadas.
    pub fn load_table(&mut self, tabela: &ProjectedTable, colunas_editaveis: &[String]) {
        let ids: HashSet<&String> = tabela
            .rows
            .iter()
            .filter_map(|linha| linha.get("ID"))
            .filter(|id| !id.is_empty())
            .collect();
        let colunas: HashSet<&String> = tabela.columns.iter().collect();
        self.cells.retain(|(id, coluna), celula| {
            celula.state != CellState::Clean || (ids.contains(id) && colunas.contains(coluna))
        });

        for linha in &tabela.rows {
            let id = match linha.get("ID") {
                Some(id) if !id.is_empty() => id.clone(),
                _ => continue,
            };
            for coluna in &tabela.columns {
                let chave = (id.clone(), coluna.clone());
                if let Some(existente) = self.cells.get(&chave) {
                    if existente.state != CellState::Clean {
                        continue;
                    }
                }
                let valor = linha.get(coluna).cloned().unwrap_or_default();
                self.cells.insert(
                    chave,
                    EditableCell {
                        value: valor,
                        kind: inferir_tipo(coluna),
                        editable: colunas_editaveis.iter().any(|c| c == coluna),
                        state: CellState::Clean,
                    },
                );
            }
        }
    }

    /// Carrega uma célula avulsa (usado em testes e em cargas parciais)
    pub fn load_cell(
        &mut self,
        row: impl Into<String>,
        column: impl Into<String>,
        value: impl Into<String>,
        editable: bool,
    ) {
        let column = column.into();
        let kind = inferir_tipo(&column);
        self.cells.insert(
            (row.into(), column),
            EditableCell {
                value: value.into(),
                kind,
                editable,
                state: CellState::Clean,
            },
        );
    }

    /// Aplica uma edição local
    ///
    /// No-op silencioso quando a célula não existe ou não é editável. Caso
    /// contrário grava o valor, marca Dirty e reinicia a janela de debounce.
    /// Editar durante um flush em voo remarca a célula como Dirty; o valor
    /// novo entra no próximo lote.
    pub fn edit(&mut self, row: &str, column: &str, value: &str, now: DateTime<Utc>) {
        let chave = (row.to_string(), column.to_string());
        match self.cells.get_mut(&chave) {
            Some(celula) if celula.editable => {
                celula.value = value.to_string();
                celula.state = CellState::Dirty;
                self.last_edit = Some(now);
            }
            _ => log_edicao_ignorada(row, column),
        }
    }

    /// Coleta o lote de células Dirty quando a janela de debounce fechou
    ///
    /// Retorna `None` enquanto houver lote em voo (guarda contra submissão
    /// dupla), enquanto a janela não fechou ou quando não há nada pendente.
    /// As células coletadas passam para Saving.
    pub fn take_batch(&mut self, now: DateTime<Utc>) -> Option<Vec<CellChange>> {
        if self.flush_in_flight {
            return None;
        }
        let last_edit = self.last_edit?;
        if now - last_edit < self.debounce {
            return None;
        }

        let mut chaves: Vec<(String, String)> = self
            .cells
            .iter()
            .filter(|(_, c)| c.state == CellState::Dirty)
            .map(|(k, _)| k.clone())
            .collect();
        if chaves.is_empty() {
            return None;
        }
        chaves.sort();

        let mut lote = Vec::with_capacity(chaves.len());
        for chave in chaves {
            if let Some(celula) = self.cells.get_mut(&chave) {
                celula.state = CellState::Saving;
                lote.push(CellChange::new(
                    chave.0.clone(),
                    chave.1.clone(),
                    celula.value.clone(),
                ));
            }
        }

        self.flush_in_flight = true;
        Some(lote)
    }

    /// Confirma o lote em voo: células ainda em Saving voltam para Clean.
    /// Células reeditadas durante o voo continuam Dirty.
    pub fn confirm_flush(&mut self) {
        for celula in self.cells.values_mut() {
            if celula.state == CellState::Saving {
                celula.state = CellState::Clean;
            }
        }
        self.flush_in_flight = false;
    }

    /// Lote em voo falhou: células em Saving voltam para Dirty e serão
    /// reenviadas na próxima janela (sem backoff)
    pub fn fail_flush(&mut self) {
        for celula in self.cells.values_mut() {
            if celula.state == CellState::Saving {
                celula.state = CellState::Dirty;
            }
        }
        self.flush_in_flight = false;
    }

    pub fn cell(&self, row: &str, column: &str) -> Option<&EditableCell> {
        self.cells.get(&(row.to_string(), column.to_string()))
    }

    pub fn dirty_count(&self) -> usize {
        self.cells
            .values()
            .filter(|c| c.state == CellState::Dirty)
            .count()
    }

    pub fn saving_count(&self) -> usize {
        self.cells
            .values()
            .filter(|c| c.state == CellState::Saving)
            .count()
    }

    pub fn is_flush_in_flight(&self) -> bool {
        self.flush_in_flight
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    fn ms(base: DateTime<Utc>, delta: i64) -> DateTime<Utc> {
        base + Duration::milliseconds(delta)
    }

    fn sessao_com_celula(editable: bool) -> EditSession {
        let mut sessao = EditSession::new(2000);
        sessao.load_cell("P1", "EMPRESA", "Acme", editable);
        sessao
    }

    #[test]
    fn test_edicao_em_celula_nao_editavel_e_noop() {
        let mut sessao = sessao_com_celula(false);

        sessao.edit("P1", "EMPRESA", "Intruso", t0());

        let celula = sessao.cell("P1", "EMPRESA").unwrap();
        assert_eq!(celula.value, "Acme");
        assert_eq!(celula.state(), CellState::Clean);
        assert_eq!(sessao.dirty_count(), 0);
    }

    #[test]
    fn test_edicao_em_celula_inexistente_e_noop() {
        let mut sessao = sessao_com_celula(true);
        sessao.edit("P9", "EMPRESA", "x", t0());
        assert_eq!(sessao.dirty_count(), 0);
    }

    #[test]
    fn test_debounce_agrupa_com_ultima_escrita_vencendo() {
        let mut sessao = sessao_com_celula(true);

        sessao.edit("P1", "EMPRESA", "v1", t0());
        sessao.edit("P1", "EMPRESA", "v2", ms(t0(), 100));
        sessao.edit("P1", "EMPRESA", "v3", ms(t0(), 200));

        // Janela ainda aberta (2000ms desde a última edição)
        assert!(sessao.take_batch(ms(t0(), 1000)).is_none());

        let lote = sessao.take_batch(ms(t0(), 2300)).unwrap();
        assert_eq!(lote.len(), 1);
        assert_eq!(lote[0].value, "v3");

        // Nada mais para coletar depois de confirmado
        sessao.confirm_flush();
        assert!(sessao.take_batch(ms(t0(), 5000)).is_none());
        assert_eq!(sessao.cell("P1", "EMPRESA").unwrap().state(), CellState::Clean);
    }

    #[test]
    fn test_lote_em_voo_bloqueia_novo_lote() {
        let mut sessao = sessao_com_celula(true);
        sessao.load_cell("P1", "STATUS", "pendente", true);

        sessao.edit("P1", "EMPRESA", "v1", t0());
        let _lote = sessao.take_batch(ms(t0(), 2500)).unwrap();
        assert!(sessao.is_flush_in_flight());

        // Nova edição durante o voo não gera segundo lote
        sessao.edit("P1", "STATUS", "aprovado", ms(t0(), 2600));
        assert!(sessao.take_batch(ms(t0(), 9000)).is_none());

        sessao.confirm_flush();
        let proximo = sessao.take_batch(ms(t0(), 9000)).unwrap();
        assert_eq!(proximo.len(), 1);
        assert_eq!(proximo[0].column, "STATUS");
        assert_eq!(proximo[0].value, "aprovado");
    }

    #[test]
    fn test_falha_deixa_dirty_para_retry() {
        let mut sessao = sessao_com_celula(true);

        sessao.edit("P1", "EMPRESA", "v1", t0());
        let _lote = sessao.take_batch(ms(t0(), 2500)).unwrap();

        sessao.fail_flush();
        assert_eq!(sessao.cell("P1", "EMPRESA").unwrap().state(), CellState::Dirty);

        // Próxima janela reenvia o mesmo valor
        let retry = sessao.take_batch(ms(t0(), 3000)).unwrap();
        assert_eq!(retry[0].value, "v1");
    }

    #[test]
    fn test_reedicao_durante_voo_sobrevive_ao_confirm() {
        let mut sessao = sessao_com_celula(true);

        sessao.edit("P1", "EMPRESA", "v1", t0());
        let _lote = sessao.take_batch(ms(t0(), 2500)).unwrap();

        // Reedição da MESMA célula enquanto o lote está em voo
        sessao.edit("P1", "EMPRESA", "v2", ms(t0(), 2600));
        sessao.confirm_flush();

        // O confirm não pode apagar a edição mais nova
        assert_eq!(sessao.cell("P1", "EMPRESA").unwrap().state(), CellState::Dirty);
        let proximo = sessao.take_batch(ms(t0(), 6000)).unwrap();
        assert_eq!(proximo[0].value, "v2");
    }

    #[test]
    fn test_reload_preserva_edicoes_pendentes() {
        use crate::services::projector::project;
        use serde_json::json;

        let registros = vec![serde_json::from_value(json!({
            "id": "P1",
            "contractData": {"nomeEmpresa": "Acme"}
        }))
        .unwrap()];
        let tabela = project(&registros);

        let mut sessao = EditSession::new(2000);
        let editaveis = vec!["EMPRESA".to_string()];
        sessao.load_table(&tabela, &editaveis);

        sessao.edit("P1", "EMPRESA", "Acme Matriz", t0());

        // Poll trouxe um snapshot velho; a edição pendente não pode sumir
        sessao.load_table(&tabela, &editaveis);
        let celula = sessao.cell("P1", "EMPRESA").unwrap();
        assert_eq!(celula.value, "Acme Matriz");
        assert_eq!(celula.state(), CellState::Dirty);
    }

    #[test]
    fn test_reload_remove_linhas_que_sairam_do_snapshot() {
        use crate::services::projector::project;
        use serde_json::json;

        let registros: Vec<crate::models::ProposalRecord> = serde_json::from_value(json!([
            {"id": "P1", "contractData": {"nomeEmpresa": "Acme"}},
            {"id": "P2", "contractData": {"nomeEmpresa": "Beta"}}
        ]))
        .unwrap();
        let tabela = project(&registros);

        let mut sessao = EditSession::new(2000);
        let editaveis = vec!["EMPRESA".to_string()];
        sessao.load_table(&tabela, &editaveis);
        sessao.edit("P2", "EMPRESA", "Beta Matriz", t0());

        // P2 saiu do snapshot seguinte
        let so_p1 = project(&registros[..1]);
        sessao.load_table(&so_p1, &editaveis);

        assert!(sessao.cell("P1", "EMPRESA").is_some());
        // Células limpas da linha removida somem...
        assert!(sessao.cell("P2", "STATUS").is_none());
        // ...mas a edição ainda não persistida fica
        assert_eq!(sessao.cell("P2", "EMPRESA").unwrap().value, "Beta Matriz");
        assert_eq!(sessao.cell("P2", "EMPRESA").unwrap().state(), CellState::Dirty);
    }

    #[test]
    fn test_tipos_inferidos_por_coluna() {
        let mut sessao = EditSession::new(2000);
        sessao.load_cell("P1", "TITULAR1_EMAIL", "", true);
        sessao.load_cell("P1", "TITULAR1_TELEFONE", "", true);
        sessao.load_cell("P1", "DATA_CRIACAO", "", false);
        sessao.load_cell("P1", "VALOR", "", true);
        sessao.load_cell("P1", "TOTAL_ANEXOS", "", false);
        sessao.load_cell("P1", "EMPRESA", "", true);

        assert_eq!(sessao.cell("P1", "TITULAR1_EMAIL").unwrap().kind, ValueKind::Email);
        assert_eq!(sessao.cell("P1", "TITULAR1_TELEFONE").unwrap().kind, ValueKind::Telefone);
        assert_eq!(sessao.cell("P1", "DATA_CRIACAO").unwrap().kind, ValueKind::Data);
        assert_eq!(sessao.cell("P1", "VALOR").unwrap().kind, ValueKind::Moeda);
        assert_eq!(sessao.cell("P1", "TOTAL_ANEXOS").unwrap().kind, ValueKind::Numero);
        assert_eq!(sessao.cell("P1", "EMPRESA").unwrap().kind, ValueKind::Texto);
    }
}
