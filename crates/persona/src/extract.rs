//! Persona extraction: the prompt that asks the model for a JSON update, and
//! the parser that pulls that update back out of free-form model output.

use folio_core::error::PersonaError;
use serde_json::{Map, Value};

const EXTRACTION_INSTRUCTIONS: &str = r#"Você é um assistente que ajuda a construir um perfil de persona detalhado.
Analise o texto fornecido pelo usuário para extrair ou inferir atributos da persona.
Estruture sua resposta ESTRITAMENTE como um único objeto JSON.
Para informações comuns, use nomes de campo como 'nomeCompleto' (string), 'descricaoCurta' (string), 'tomDeVoz' (string), 'interesses' (este DEVE ser um array de strings).
Para fatos diversos ou menos comuns, adicione-os como pares chave-valor dentro de um objeto chamado 'detalhesAdicionais'.
Se você identificar uma categoria de informação nova e MUITO relevante que acredite merecer seu próprio campo de primeiro nível (além dos mencionados acima),
você PODE sugerir um novo nome de campo para ela (use camelCase, ex: 'areaDeAtuacao', 'filosofiaPessoal', 'cidadeNatal').
Sua resposta deve ser APENAS o objeto JSON completo com todos os atributos da persona que você conseguiu identificar ou inferir.
Não inclua nenhuma explicação, introdução, ou texto adicional fora do objeto JSON.
O JSON deve começar com { e terminar com }.

Exemplo de entrada do usuário: "Meu nome é Carlos, sou de SP e adoro programar em Python nas horas vagas. Minha comida favorita é lasanha."
Exemplo de sua resposta JSON:
{
  "nomeCompleto": "Carlos",
  "cidadeNatal": "SP",
  "detalhesAdicionais": {
    "comidaFavorita": "lasanha"
  },
  "interesses": ["programar em Python"]
}

Texto do usuário para análise:
"#;

/// Build the extraction prompt around already-validated user text.
pub fn build_extraction_prompt(text: &str) -> String {
    // Quotes would let the text close the delimiter it is wrapped in.
    let quoted = text.replace('"', "'");
    format!("{EXTRACTION_INSTRUCTIONS}\"{quoted}\"\n")
}

/// Parse a persona update out of model output.
///
/// `cleaned` is the model text with reasoning spans removed; the span from
/// its first `{` to its last `}` must decode to a JSON object. `raw` is the
/// unmodified model text, kept on the error for debugging.
pub fn parse_suggestion(cleaned: &str, raw: &str) -> Result<Map<String, Value>, PersonaError> {
    let invalid = |reason: String| PersonaError::InvalidSuggestion {
        reason,
        raw: raw.to_string(),
    };

    let (Some(start), Some(end)) = (cleaned.find('{'), cleaned.rfind('}')) else {
        return Err(invalid("no JSON object found in model output".into()));
    };
    if end < start {
        return Err(invalid("no JSON object found in model output".into()));
    }

    match serde_json::from_str::<Value>(&cleaned[start..=end]) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(invalid("model output is not a JSON object".into())),
        Err(e) => Err(invalid(format!("model output is not valid JSON: {e}"))),
    }
}
