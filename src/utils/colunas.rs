//! Normalização de nomes de coluna da planilha
//!
//! Chaves arbitrárias vindas do backend viram segmentos de coluna estáveis:
//! sem acentos, sem pontuação, maiúsculos. A decomposição NFKD garante que
//! "endereçoCompleto" e "enderecoCompleto" produzem o mesmo segmento.

use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

/// Converte uma chave JSON em um segmento de nome de coluna
///
/// # Exemplos
/// ```
/// use abmix_planilha_middleware::utils::colunas::normalizar_segmento;
///
/// assert_eq!(normalizar_segmento("novoSeguro"), "NOVOSEGURO");
/// assert_eq!(normalizar_segmento("número-guia"), "NUMEROGUIA");
/// assert_eq!(normalizar_segmento("valor total"), "VALORTOTAL");
/// ```
pub fn normalizar_segmento(chave: &str) -> String {
    chave
        .nfkd() // decomposição NFKD para separar marcas diacríticas
        .filter(|c| !is_combining_mark(*c))
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_uppercase()
}
