// src/models/cedentes.rs

use serde_json::{Value, json};

use crate::common::coerce;
use crate::models::compras::Cia;

// O documento de cedentes é herdado de várias gerações de tela e não tem um
// formato único; as entradas circulam como JSON cru e só os campos de saldo
// têm contrato fixo.

/// Campo de saldo de um cedente para a CIA da venda.
pub fn saldo_field(cia: Cia) -> &'static str {
    match cia {
        Cia::Latam => "latam",
        Cia::Smiles => "smiles",
    }
}

/// Projeta de um snapshot de cedente apenas os campos que interessam ao
/// controle de saldos.
pub fn pick_cedente_fields(c: &Value) -> Value {
    let nome = c
        .get("nome")
        .filter(|v| !v.is_null())
        .or_else(|| c.get("nome_completo").filter(|v| !v.is_null()))
        .cloned()
        .unwrap_or(Value::Null);
    let nome_completo = c
        .get("nome_completo")
        .filter(|v| !v.is_null())
        .or_else(|| c.get("nome").filter(|v| !v.is_null()))
        .cloned()
        .unwrap_or(Value::Null);

    json!({
        "identificador": c.get("identificador").cloned().unwrap_or(Value::Null),
        "nome": nome,
        "nome_completo": nome_completo,
        "latam": coerce::num(c.get("latam")),
        "smiles": coerce::num(c.get("smiles")),
        "livelo": coerce::num(c.get("livelo")),
        "esfera": coerce::num(c.get("esfera")),
    })
}

/// Identificador em caixa alta, para casar cedentes sem depender de como a
/// planilha digitou o código.
pub fn identificador_up(c: &Value) -> String {
    match c.get("identificador") {
        Some(Value::String(s)) => s.to_uppercase(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}
