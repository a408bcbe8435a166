//! Export CSV da tabela projetada
//!
//! Células vazias saem como o marcador literal `[vazio]`, distinguindo
//! "sabidamente vazio" de ambiguidade de parsing na planilha. Valores são
//! sempre envolvidos em aspas duplas, com aspas embutidas dobradas
//! (RFC 4180); vírgulas e quebras de linha ficam seguras dentro das aspas.

use crate::services::projector::ProjectedTable;

/// Marcador para célula sabidamente vazia
pub const MARCADOR_VAZIO: &str = "[vazio]";

/// Gera o CSV completo: cabeçalho com os nomes de coluna + uma linha por proposta
pub fn export_csv(tabela: &ProjectedTable) -> String {
    let mut saida = String::new();

    saida.push_str(&tabela.columns.join(","));
    saida.push_str("\r\n");

    for linha in &tabela.rows {
        let campos: Vec<String> = tabela
            .columns
            .iter()
            .map(|coluna| {
                let valor = linha.get(coluna).map(String::as_str).unwrap_or("");
                if valor.is_empty() {
                    citar(MARCADOR_VAZIO)
                } else {
                    citar(valor)
                }
            })
            .collect();
        saida.push_str(&campos.join(","));
        saida.push_str("\r\n");
    }

    saida
}

fn citar(valor: &str) -> String {
    format!("\"{}\"", valor.replace('"', "\"\""))
}
