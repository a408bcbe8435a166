//! Registros de proposta recebidos do backend Abmix
//!
//! O backend é dono do store; este middleware só lê um snapshot. Os structs
//! aceitam qualquer formato razoável de proposta: campos ausentes viram
//! default, campos com o tipo errado são coeridos (escalares viram texto,
//! estruturas malformadas viram default) e campos desconhecidos são
//! capturados em mapas (`contract_data`, `internal_data`, `extra`) para a
//! descoberta dinâmica de colunas. Um registro ruim nunca derruba o snapshot
//! inteiro.

use serde::de::Deserializer;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Uma proposta de plano de saúde: cabeçalho fixo + coleções variáveis
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ProposalRecord {
    #[serde(deserialize_with = "texto_tolerante")]
    pub id: String,
    #[serde(deserialize_with = "texto_tolerante")]
    pub vendedor: String,
    #[serde(deserialize_with = "texto_tolerante")]
    pub status: String,
    /// Cliente já completou o formulário de dados pessoais
    #[serde(deserialize_with = "flag_tolerante")]
    pub cliente_completou: bool,
    #[serde(deserialize_with = "texto_opcional_tolerante")]
    pub data_criacao: Option<String>,
    #[serde(deserialize_with = "pessoas_tolerantes")]
    pub titulares: Vec<Person>,
    #[serde(deserialize_with = "pessoas_tolerantes")]
    pub dependentes: Vec<Person>,
    /// Dados do contrato (chaves não conhecidas estaticamente)
    #[serde(deserialize_with = "mapa_tolerante")]
    pub contract_data: Map<String, Value>,
    /// Anotações internas do time (idem)
    #[serde(deserialize_with = "mapa_tolerante")]
    pub internal_data: Map<String, Value>,
    /// Anexos; a projeção só usa a contagem
    #[serde(deserialize_with = "lista_tolerante")]
    pub anexos: Vec<Value>,
    /// Campos de nível raiz que o backend passou a enviar depois
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ProposalRecord {
    /// Valor string de uma chave de `contractData`, vazio quando ausente
    pub fn contrato(&self, chave: &str) -> String {
        self.contract_data
            .get(chave)
            .map(valor_como_texto)
            .unwrap_or_default()
    }
}

/// Pessoa segurada (titular ou dependente); `parentesco` só faz sentido
/// para dependentes
#[derive(Debug, Serialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    pub nome_completo: String,
    pub cpf: String,
    pub rg: String,
    pub data_nascimento: String,
    pub sexo: String,
    pub estado_civil: String,
    pub nome_mae: String,
    pub email: String,
    pub telefone: String,
    pub cep: String,
    pub endereco_completo: String,
    pub cidade: String,
    pub estado: String,
    pub banco: String,
    pub agencia: String,
    pub conta: String,
    pub parentesco: String,
}

// Deserialização escrita à mão: todo campo é coerido para texto (número de
// CPF enviado como inteiro, por exemplo, não invalida a pessoa inteira)
impl<'de> Deserialize<'de> for Person {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let mapa = match Value::deserialize(deserializer)? {
            Value::Object(m) => m,
            _ => Map::new(),
        };
        let campo = |chave: &str| mapa.get(chave).map(escalar_como_texto).unwrap_or_default();

        Ok(Person {
            nome_completo: campo("nomeCompleto"),
            cpf: campo("cpf"),
            rg: campo("rg"),
            data_nascimento: campo("dataNascimento"),
            sexo: campo("sexo"),
            estado_civil: campo("estadoCivil"),
            nome_mae: campo("nomeMae"),
            email: campo("email"),
            telefone: campo("telefone"),
            cep: campo("cep"),
            endereco_completo: campo("enderecoCompleto"),
            cidade: campo("cidade"),
            estado: campo("estado"),
            banco: campo("banco"),
            agencia: campo("agencia"),
            conta: campo("conta"),
            parentesco: campo("parentesco"),
        })
    }
}

/// Renderização trivial de um escalar JSON como texto de célula
pub fn valor_como_texto(v: &Value) -> String {
    match v {
        Value::Null => String::new(),
        Value::Bool(true) => "SIM".to_string(),
        Value::Bool(false) => "NÃO".to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        // Objetos/arrays não chegam aqui pela projeção; fallback compacto
        outro => outro.to_string(),
    }
}

/// Escalar vira texto; estrutura no lugar de escalar vira vazio
fn escalar_como_texto(v: &Value) -> String {
    match v {
        Value::Object(_) | Value::Array(_) => String::new(),
        escalar => valor_como_texto(escalar),
    }
}

fn texto_tolerante<'de, D>(d: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(escalar_como_texto(&Value::deserialize(d)?))
}

fn texto_opcional_tolerante<'de, D>(d: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(d)? {
        Value::Null => None,
        v => Some(escalar_como_texto(&v)),
    })
}

// Só booleano literal conta como verdadeiro; qualquer outra coisa é falso
fn flag_tolerante<'de, D>(d: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(matches!(Value::deserialize(d)?, Value::Bool(true)))
}

fn pessoas_tolerantes<'de, D>(d: D) -> Result<Vec<Person>, D::Error>
where
    D: Deserializer<'de>,
{
    let itens = match Value::deserialize(d)? {
        Value::Array(itens) => itens,
        _ => return Ok(Vec::new()),
    };
    Ok(itens
        .into_iter()
        .filter(|item| item.is_object())
        .map(|item| serde_json::from_value(item).unwrap_or_default())
        .collect())
}

fn mapa_tolerante<'de, D>(d: D) -> Result<Map<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(d)? {
        Value::Object(m) => m,
        _ => Map::new(),
    })
}

fn lista_tolerante<'de, D>(d: D) -> Result<Vec<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(d)? {
        Value::Array(v) => v,
        _ => Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_proposta_tolera_campos_ausentes() {
        let registro: ProposalRecord = serde_json::from_value(json!({
            "id": "PROP-1"
        }))
        .unwrap();

        assert_eq!(registro.id, "PROP-1");
        assert!(registro.titulares.is_empty());
        assert!(registro.contract_data.is_empty());
        assert!(!registro.cliente_completou);
    }

    #[test]
    fn test_campos_desconhecidos_vao_para_extra() {
        let registro: ProposalRecord = serde_json::from_value(json!({
            "id": "PROP-2",
            "observacoes": "urgente",
            "contractData": {"nomeEmpresa": "Acme"}
        }))
        .unwrap();

        assert_eq!(registro.extra.get("observacoes").unwrap(), "urgente");
        assert_eq!(registro.contrato("nomeEmpresa"), "Acme");
        assert_eq!(registro.contrato("cnpj"), "");
    }

    #[test]
    fn test_campo_com_tipo_errado_vira_texto() {
        // Backend enviando CPF e id como número não pode invalidar o registro
        let registro: ProposalRecord = serde_json::from_value(json!({
            "id": 123,
            "titulares": [{"nomeCompleto": "Ana", "cpf": 12345678900i64}],
            "clienteCompletou": "sim"
        }))
        .unwrap();

        assert_eq!(registro.id, "123");
        assert_eq!(registro.titulares[0].nome_completo, "Ana");
        assert_eq!(registro.titulares[0].cpf, "12345678900");
        // Flag malformada cai no default, não em erro
        assert!(!registro.cliente_completou);
    }

    #[test]
    fn test_estrutura_com_tipo_errado_vira_default() {
        let registro: ProposalRecord = serde_json::from_value(json!({
            "id": "P1",
            "titulares": "corrompido",
            "dependentes": [{"nomeCompleto": "Bia"}, "corrompido"],
            "contractData": ["lista"],
            "anexos": {"a": 1}
        }))
        .unwrap();

        assert!(registro.titulares.is_empty());
        // Itens não-objeto são descartados, os válidos ficam
        assert_eq!(registro.dependentes.len(), 1);
        assert_eq!(registro.dependentes[0].nome_completo, "Bia");
        assert!(registro.contract_data.is_empty());
        assert!(registro.anexos.is_empty());
    }

    #[test]
    fn test_valor_como_texto() {
        assert_eq!(valor_como_texto(&json!(null)), "");
        assert_eq!(valor_como_texto(&json!(true)), "SIM");
        assert_eq!(valor_como_texto(&json!(false)), "NÃO");
        assert_eq!(valor_como_texto(&json!(100)), "100");
        assert_eq!(valor_como_texto(&json!("Ana")), "Ana");
    }
}
