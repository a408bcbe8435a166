//! Projetor dinâmico de linhas da planilha de propostas
//!
//! Achata uma coleção heterogênea de propostas (número variável de titulares,
//! dependentes e campos aninhados arbitrários) em uma tabela larga uniforme:
//! uma linha por proposta, colunas descobertas dinamicamente. O resultado
//! alimenta a visualização tabular, o export CSV e a sessão de edição.
//!
//! Invariantes:
//! - toda linha carrega exatamente o mesmo conjunto de colunas; dado ausente
//!   é string vazia, nunca chave ausente;
//! - o conjunto e a ordem das colunas são determinísticos para uma mesma
//!   entrada (mesmos registros, mesma ordem);
//! - a ordem é: colunas fixas, grupos TITULARi_*, grupos DEPENDENTEi_*,
//!   colunas dinâmicas na ordem em que foram encontradas.

use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::models::proposal::{valor_como_texto, Person, ProposalRecord};
use crate::utils::colunas::normalizar_segmento;

/// Teto padrão de titulares/dependentes enumerados (limita o tamanho da saída)
pub const CAP_PESSOAS: usize = 99;

/// Limite de recursão da caminhada por objetos aninhados. Valores vindos de
/// JSON não formam ciclos, o limite protege contra aninhamento patológico.
const PROFUNDIDADE_MAX: usize = 16;

/// Uma linha projetada: coluna -> valor (sempre o conjunto completo de colunas)
pub type ProjectedRow = HashMap<String, String>;

/// Saída da projeção: lista ordenada de colunas + linhas com chaves idênticas
#[derive(Debug, Clone, Serialize)]
pub struct ProjectedTable {
    pub columns: Vec<String>,
    pub rows: Vec<ProjectedRow>,
}

/// Colunas fixas do cabeçalho, na ordem de emissão
const COLUNAS_FIXAS: [&str; 13] = [
    "ID",
    "EMPRESA",
    "CNPJ",
    "PLANO",
    "VALOR",
    "INICIO_VIGENCIA",
    "VENDEDOR",
    "STATUS",
    "DATA_CRIACAO",
    "CLIENTE_COMPLETOU",
    "TOTAL_TITULARES",
    "TOTAL_DEPENDENTES",
    "TOTAL_ANEXOS",
];

/// Chaves de `contractData` já cobertas pelas colunas fixas; o restante do
/// objeto entra na descoberta dinâmica com prefixo CONTRACT
static CHAVES_CONTRATO_FIXAS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    ["nomeEmpresa", "cnpj", "planoContratado", "valor", "inicioVigencia"]
        .into_iter()
        .collect()
});

/// Campos por titular, na ordem de emissão dentro de cada grupo TITULARi_*
const SUFIXOS_TITULAR: [&str; 16] = [
    "NOME_COMPLETO",
    "CPF",
    "RG",
    "DATA_NASCIMENTO",
    "SEXO",
    "ESTADO_CIVIL",
    "NOME_MAE",
    "EMAIL",
    "TELEFONE",
    "CEP",
    "ENDERECO",
    "CIDADE",
    "ESTADO",
    "BANCO",
    "AGENCIA",
    "CONTA",
];

/// Dependentes carregam os mesmos campos mais PARENTESCO
const SUFIXOS_DEPENDENTE: [&str; 17] = [
    "NOME_COMPLETO",
    "PARENTESCO",
    "CPF",
    "RG",
    "DATA_NASCIMENTO",
    "SEXO",
    "ESTADO_CIVIL",
    "NOME_MAE",
    "EMAIL",
    "TELEFONE",
    "CEP",
    "ENDERECO",
    "CIDADE",
    "ESTADO",
    "BANCO",
    "AGENCIA",
    "CONTA",
];

fn valor_pessoa<'a>(pessoa: &'a Person, sufixo: &str) -> &'a str {
    match sufixo {
        "NOME_COMPLETO" => &pessoa.nome_completo,
        "PARENTESCO" => &pessoa.parentesco,
        "CPF" => &pessoa.cpf,
        "RG" => &pessoa.rg,
        "DATA_NASCIMENTO" => &pessoa.data_nascimento,
        "SEXO" => &pessoa.sexo,
        "ESTADO_CIVIL" => &pessoa.estado_civil,
        "NOME_MAE" => &pessoa.nome_mae,
        "EMAIL" => &pessoa.email,
        "TELEFONE" => &pessoa.telefone,
        "CEP" => &pessoa.cep,
        "ENDERECO" => &pessoa.endereco_completo,
        "CIDADE" => &pessoa.cidade,
        "ESTADO" => &pessoa.estado,
        "BANCO" => &pessoa.banco,
        "AGENCIA" => &pessoa.agencia,
        "CONTA" => &pessoa.conta,
        _ => "",
    }
}

/// Projeta as propostas com o teto padrão de 99 pessoas por coleção
pub fn project(records: &[ProposalRecord]) -> ProjectedTable {
    project_with_cap(records, CAP_PESSOAS)
}

/// Projeta as propostas limitando a enumeração de titulares/dependentes
pub fn project_with_cap(records: &[ProposalRecord], cap: usize) -> ProjectedTable {
    // 1. Cardinalidades: máximos observados, piso de 1 titular, teto `cap`.
    //    Os MESMOS grupos numerados valem para todas as linhas.
    let max_titulares = records
        .iter()
        .map(|r| r.titulares.len())
        .max()
        .unwrap_or(0)
        .max(1)
        .min(cap.max(1));
    let max_dependentes = records
        .iter()
        .map(|r| r.dependentes.len())
        .max()
        .unwrap_or(0)
        .min(cap);

    // 2-3. Colunas estáticas: fixas + grupos por pessoa
    let mut columns: Vec<String> = COLUNAS_FIXAS.iter().map(|c| c.to_string()).collect();
    for i in 1..=max_titulares {
        for sufixo in SUFIXOS_TITULAR {
            columns.push(format!("TITULAR{}_{}", i, sufixo));
        }
    }
    for i in 1..=max_dependentes {
        for sufixo in SUFIXOS_DEPENDENTE {
            columns.push(format!("DEPENDENTE{}_{}", i, sufixo));
        }
    }
    let colunas_estaticas: HashSet<&str> = columns.iter().map(String::as_str).collect();

    // 4-5. Descoberta dinâmica: varre os registros na ordem de entrada e
    //      registra cada coluna nova na ordem do primeiro encontro. Nomes que
    //      colidem com colunas estáticas são descartados (a coluna fixa é
    //      dona do nome).
    let mut ordem_dinamica: Vec<String> = Vec::new();
    let mut conhecidas: HashSet<String> = HashSet::new();
    let mut dinamicas_por_registro: Vec<HashMap<String, String>> =
        Vec::with_capacity(records.len());

    for registro in records {
        let pares = celulas_dinamicas(registro);
        let mut mapa = HashMap::with_capacity(pares.len());
        for (coluna, valor) in pares {
            if colunas_estaticas.contains(coluna.as_str()) {
                continue;
            }
            if conhecidas.insert(coluna.clone()) {
                ordem_dinamica.push(coluna.clone());
            }
            // Primeira ocorrência vence dentro de um mesmo registro
            mapa.entry(coluna).or_insert(valor);
        }
        dinamicas_por_registro.push(mapa);
    }
    columns.extend(ordem_dinamica);

    // 6. Linhas: toda coluna presente em toda linha, vazia quando não se aplica
    let mut rows = Vec::with_capacity(records.len());
    for (registro, dinamicas) in records.iter().zip(dinamicas_por_registro) {
        let mut row: ProjectedRow = columns
            .iter()
            .map(|c| (c.clone(), String::new()))
            .collect();

        preencher_fixas(&mut row, registro);

        for i in 1..=max_titulares {
            if let Some(pessoa) = registro.titulares.get(i - 1) {
                for sufixo in SUFIXOS_TITULAR {
                    row.insert(
                        format!("TITULAR{}_{}", i, sufixo),
                        valor_pessoa(pessoa, sufixo).to_string(),
                    );
                }
            }
        }
        for i in 1..=max_dependentes {
            if let Some(pessoa) = registro.dependentes.get(i - 1) {
                for sufixo in SUFIXOS_DEPENDENTE {
                    row.insert(
                        format!("DEPENDENTE{}_{}", i, sufixo),
                        valor_pessoa(pessoa, sufixo).to_string(),
                    );
                }
            }
        }

        for (coluna, valor) in dinamicas {
            row.insert(coluna, valor);
        }

        rows.push(row);
    }

    ProjectedTable { columns, rows }
}

fn sim_nao(flag: bool) -> &'static str {
    if flag {
        "SIM"
    } else {
        "NÃO"
    }
}

fn preencher_fixas(row: &mut ProjectedRow, registro: &ProposalRecord) {
    row.insert("ID".to_string(), registro.id.clone());
    row.insert("EMPRESA".to_string(), registro.contrato("nomeEmpresa"));
    row.insert("CNPJ".to_string(), registro.contrato("cnpj"));
    row.insert("PLANO".to_string(), registro.contrato("planoContratado"));
    row.insert("VALOR".to_string(), registro.contrato("valor"));
    row.insert(
        "INICIO_VIGENCIA".to_string(),
        registro.contrato("inicioVigencia"),
    );
    row.insert("VENDEDOR".to_string(), registro.vendedor.clone());
    row.insert("STATUS".to_string(), registro.status.clone());
    row.insert(
        "DATA_CRIACAO".to_string(),
        registro.data_criacao.clone().unwrap_or_default(),
    );
    row.insert(
        "CLIENTE_COMPLETOU".to_string(),
        sim_nao(registro.cliente_completou).to_string(),
    );
    row.insert(
        "TOTAL_TITULARES".to_string(),
        registro.titulares.len().to_string(),
    );
    row.insert(
        "TOTAL_DEPENDENTES".to_string(),
        registro.dependentes.len().to_string(),
    );
    row.insert("TOTAL_ANEXOS".to_string(), registro.anexos.len().to_string());
}

/// Células dinâmicas de um registro: caminhada recursiva sobre os campos
/// aninhados que não viraram coluna fixa ou de pessoa
fn celulas_dinamicas(registro: &ProposalRecord) -> Vec<(String, String)> {
    let mut saida = Vec::new();

    percorrer_mapa(
        &registro.contract_data,
        Some("CONTRACT"),
        &CHAVES_CONTRATO_FIXAS,
        &mut saida,
    );
    percorrer_mapa(&registro.internal_data, Some("INTERNO"), &HashSet::new(), &mut saida);
    percorrer_mapa(&registro.extra, None, &HashSet::new(), &mut saida);

    saida
}

fn percorrer_mapa(
    mapa: &Map<String, Value>,
    prefixo: Option<&str>,
    ignorar: &HashSet<&'static str>,
    saida: &mut Vec<(String, String)>,
) {
    let mut caminho: Vec<String> = prefixo.map(|p| vec![p.to_string()]).unwrap_or_default();
    for (chave, valor) in mapa {
        if ignorar.contains(chave.as_str()) {
            continue;
        }
        empilhar_segmento(&mut caminho, chave);
        percorrer(&mut caminho, valor, saida, 0);
        desempilhar_segmento(&mut caminho, chave);
    }
}

fn empilhar_segmento(caminho: &mut Vec<String>, chave: &str) {
    let segmento = normalizar_segmento(chave);
    if !segmento.is_empty() {
        caminho.push(segmento);
    }
}

fn desempilhar_segmento(caminho: &mut Vec<String>, chave: &str) {
    if !normalizar_segmento(chave).is_empty() {
        caminho.pop();
    }
}

fn percorrer(
    caminho: &mut Vec<String>,
    valor: &Value,
    saida: &mut Vec<(String, String)>,
    profundidade: usize,
) {
    if profundidade > PROFUNDIDADE_MAX {
        return;
    }

    match valor {
        // Objetos sempre descem: chave que normaliza para vazio não contribui
        // segmento, mas os filhos herdam o caminho acumulado até aqui
        Value::Object(mapa) => {
            for (chave, filho) in mapa {
                empilhar_segmento(caminho, chave);
                percorrer(caminho, filho, saida, profundidade + 1);
                desempilhar_segmento(caminho, chave);
            }
        }
        // Folhas sem nenhum segmento de caminho não têm nome de coluna
        Value::Array(itens) => {
            if caminho.is_empty() {
                return;
            }
            let base = caminho.join("_");
            saida.push((format!("{}_QUANTIDADE", base), itens.len().to_string()));
            if !itens.is_empty() {
                let lista = itens
                    .iter()
                    .map(stringificar_item)
                    .collect::<Vec<_>>()
                    .join("; ");
                saida.push((format!("{}_LISTA", base), lista));
            }
        }
        escalar => {
            if caminho.is_empty() {
                return;
            }
            saida.push((caminho.join("_"), valor_como_texto(escalar)));
        }
    }
}

fn stringificar_item(item: &Value) -> String {
    match item {
        Value::Object(_) | Value::Array(_) => item.to_string(),
        escalar => valor_como_texto(escalar),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn proposta(v: serde_json::Value) -> ProposalRecord {
        serde_json::from_value(v).unwrap()
    }

    fn titular(nome: &str) -> serde_json::Value {
        json!({"nomeCompleto": nome})
    }

    #[test]
    fn test_toda_linha_tem_o_mesmo_conjunto_de_colunas() {
        let registros = vec![
            proposta(json!({
                "id": "P1",
                "titulares": [titular("Ana"), titular("Bia")],
                "contractData": {"nomeEmpresa": "Acme", "corretagem": "5%"}
            })),
            proposta(json!({
                "id": "P2",
                "internalData": {"nota": "revisar"}
            })),
        ];

        let tabela = project(&registros);
        let esperado: HashSet<&String> = tabela.columns.iter().collect();

        for linha in &tabela.rows {
            let chaves: HashSet<&String> = linha.keys().collect();
            assert_eq!(chaves, esperado);
        }
    }

    #[test]
    fn test_projecao_deterministica() {
        let registros = vec![
            proposta(json!({
                "id": "P1",
                "contractData": {"nomeEmpresa": "Acme", "zeta": "1", "alfa": "2"},
                "internalData": {"obs": "x"}
            })),
            proposta(json!({
                "id": "P2",
                "contractData": {"beta": {"gama": "3"}}
            })),
        ];

        let a = project(&registros);
        let b = project(&registros);

        assert_eq!(a.columns, b.columns);
        assert_eq!(a.rows, b.rows);
    }

    #[test]
    fn test_cardinalidade_maxima_de_titulares() {
        let registros = vec![
            proposta(json!({"id": "P1", "titulares": [titular("A")]})),
            proposta(json!({
                "id": "P2",
                "titulares": [titular("B1"), titular("B2"), titular("B3")]
            })),
            proposta(json!({"id": "P3", "titulares": [titular("C1"), titular("C2")]})),
        ];

        let tabela = project(&registros);

        assert!(tabela.columns.contains(&"TITULAR3_NOME_COMPLETO".to_string()));
        assert!(!tabela.columns.contains(&"TITULAR4_NOME_COMPLETO".to_string()));

        // A proposta com 1 titular tem o grupo TITULAR3 vazio
        assert_eq!(tabela.rows[0]["TITULAR3_NOME_COMPLETO"], "");
        assert_eq!(tabela.rows[1]["TITULAR3_NOME_COMPLETO"], "B3");
    }

    #[test]
    fn test_piso_minimo_de_um_titular() {
        let registros = vec![proposta(json!({"id": "P1", "titulares": []}))];

        let tabela = project(&registros);

        assert!(tabela.columns.contains(&"TITULAR1_NOME_COMPLETO".to_string()));
        assert_eq!(tabela.rows[0]["TITULAR1_NOME_COMPLETO"], "");
        // Dependentes não têm piso
        assert!(!tabela
            .columns
            .iter()
            .any(|c| c.starts_with("DEPENDENTE1_")));
    }

    #[test]
    fn test_descoberta_de_campo_dinamico_aninhado() {
        let registros = vec![proposta(json!({
            "id": "P1",
            "contractData": {"novoSeguro": {"valor": "100"}}
        }))];

        let tabela = project(&registros);

        assert!(tabela.columns.contains(&"CONTRACT_NOVOSEGURO_VALOR".to_string()));
        assert_eq!(tabela.rows[0]["CONTRACT_NOVOSEGURO_VALOR"], "100");
    }

    #[test]
    fn test_cenario_exemplo() {
        let registros = vec![proposta(json!({
            "id": "P1",
            "titulares": [{"nomeCompleto": "Ana"}],
            "dependentes": [],
            "contractData": {"nomeEmpresa": "Acme"}
        }))];

        let tabela = project(&registros);

        assert_eq!(tabela.rows[0]["EMPRESA"], "Acme");
        assert_eq!(tabela.rows[0]["TITULAR1_NOME_COMPLETO"], "Ana");
        assert!(!tabela.columns.iter().any(|c| c.starts_with("DEPENDENTE")));
        assert!(tabela.columns.contains(&"TITULAR1_CPF".to_string()));
        assert!(!tabela.columns.contains(&"TITULAR2_NOME_COMPLETO".to_string()));
    }

    #[test]
    fn test_array_aninhado_vira_quantidade_e_lista() {
        let registros = vec![proposta(json!({
            "id": "P1",
            "internalData": {
                "pendencias": ["RG ilegível", "falta comprovante"],
                "tags": []
            }
        }))];

        let tabela = project(&registros);
        let linha = &tabela.rows[0];

        assert_eq!(linha["INTERNO_PENDENCIAS_QUANTIDADE"], "2");
        assert_eq!(
            linha["INTERNO_PENDENCIAS_LISTA"],
            "RG ilegível; falta comprovante"
        );
        assert_eq!(linha["INTERNO_TAGS_QUANTIDADE"], "0");
        assert!(!tabela.columns.contains(&"INTERNO_TAGS_LISTA".to_string()));
    }

    #[test]
    fn test_flags_booleanas_viram_sim_nao() {
        let registros = vec![
            proposta(json!({"id": "P1", "clienteCompletou": true})),
            proposta(json!({"id": "P2", "contractData": {"odontoConjugado": false}})),
        ];

        let tabela = project(&registros);

        assert_eq!(tabela.rows[0]["CLIENTE_COMPLETOU"], "SIM");
        assert_eq!(tabela.rows[1]["CLIENTE_COMPLETOU"], "NÃO");
        assert_eq!(tabela.rows[1]["CONTRACT_ODONTOCONJUGADO"], "NÃO");
    }

    #[test]
    fn test_contagem_de_colunas() {
        let registros = vec![proposta(json!({
            "id": "P1",
            "titulares": [titular("A"), titular("B")],
            "dependentes": [{"nomeCompleto": "C", "parentesco": "filho"}],
            "contractData": {"taxa": "1"}
        }))];

        let tabela = project(&registros);

        // 13 fixas + 16 x 2 titulares + 17 x 1 dependente + 1 dinâmica
        assert_eq!(tabela.columns.len(), 13 + 32 + 17 + 1);
        assert_eq!(tabela.rows[0]["DEPENDENTE1_PARENTESCO"], "filho");
    }

    #[test]
    fn test_cap_limita_enumeracao() {
        let registros = vec![proposta(json!({
            "id": "P1",
            "titulares": [titular("A"), titular("B"), titular("C")]
        }))];

        let tabela = project_with_cap(&registros, 2);

        assert!(tabela.columns.contains(&"TITULAR2_NOME_COMPLETO".to_string()));
        assert!(!tabela.columns.contains(&"TITULAR3_NOME_COMPLETO".to_string()));
    }

    #[test]
    fn test_colunas_dinamicas_na_ordem_do_primeiro_encontro() {
        let registros = vec![
            proposta(json!({"id": "P1", "contractData": {"zeta": "1"}})),
            proposta(json!({"id": "P2", "contractData": {"alfa": "2", "zeta": "3"}})),
        ];

        let tabela = project(&registros);
        let zeta = tabela
            .columns
            .iter()
            .position(|c| c == "CONTRACT_ZETA")
            .unwrap();
        let alfa = tabela
            .columns
            .iter()
            .position(|c| c == "CONTRACT_ALFA")
            .unwrap();

        // zeta apareceu primeiro (no registro P1)
        assert!(zeta < alfa);
        assert_eq!(tabela.rows[0]["CONTRACT_ALFA"], "");
        assert_eq!(tabela.rows[1]["CONTRACT_ZETA"], "3");
    }

    #[test]
    fn test_colisao_com_coluna_fixa_nao_sobrescreve() {
        // Campo raiz desconhecido cujo nome normalizado colide com a fixa EMPRESA
        let registros = vec![proposta(json!({
            "id": "P1",
            "empresa": "intruso",
            "contractData": {"nomeEmpresa": "Acme"}
        }))];

        let tabela = project(&registros);

        assert_eq!(tabela.rows[0]["EMPRESA"], "Acme");
        assert_eq!(
            tabela.columns.iter().filter(|c| *c == "EMPRESA").count(),
            1
        );
    }

    #[test]
    fn test_chave_sem_segmento_nao_apaga_os_filhos() {
        // "!!!" normaliza para vazio; os filhos herdam o caminho do pai
        let registros = vec![proposta(json!({
            "id": "P1",
            "!!!": {"nota": "x"},
            "internalData": {"###": {"origem": "import"}}
        }))];

        let tabela = project(&registros);

        assert!(tabela.columns.contains(&"NOTA".to_string()));
        assert_eq!(tabela.rows[0]["NOTA"], "x");
        // Dentro de internalData o caminho herdado é o prefixo INTERNO
        assert_eq!(tabela.rows[0]["INTERNO_ORIGEM"], "import");
    }

    #[test]
    fn test_entrada_vazia() {
        let tabela = project(&[]);

        // Piso de 1 titular vale mesmo sem registros
        assert!(tabela.columns.contains(&"TITULAR1_NOME_COMPLETO".to_string()));
        assert!(tabela.rows.is_empty());
    }
}
