// src/common/coerce.rs

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

// Dados legados chegam com número, string ("1.234,56"), null ou lixo no mesmo
// campo. Nenhuma leitura numérica pode falhar: tudo que não for número finito
// vira 0.

/// Converte um valor JSON qualquer em número. Não-finito, ausente ou
/// não-numérico vira `0.0`.
pub fn num(v: Option<&Value>) -> f64 {
    match v {
        Some(Value::Number(n)) => n.as_f64().filter(|f| f.is_finite()).unwrap_or(0.0),
        Some(Value::String(s)) => {
            let s = s.trim();
            if s.is_empty() {
                0.0
            } else {
                s.parse::<f64>().ok().filter(|f| f.is_finite()).unwrap_or(0.0)
            }
        }
        Some(Value::Bool(b)) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        _ => 0.0,
    }
}

/// Valores monetários: aceita "1.234,56" (formato brasileiro) ou número puro,
/// sempre arredondado para 2 casas.
pub fn money(v: Option<&Value>) -> f64 {
    let bruto = match v {
        Some(Value::String(s)) => {
            let s: String = s.chars().filter(|c| !c.is_whitespace()).collect();
            let normalizado = if s.contains(',') {
                // "1.234,56" -> "1234.56"
                s.replace('.', "").replace(',', ".")
            } else {
                s
            };
            normalizado
                .parse::<f64>()
                .ok()
                .filter(|f| f.is_finite())
                .unwrap_or(0.0)
        }
        outro => num(outro),
    };
    (bruto * 100.0).round() / 100.0
}

/// Texto não-vazio, ou `None`.
pub fn texto(v: Option<&Value>) -> Option<&str> {
    match v {
        Some(Value::String(s)) if !s.is_empty() => Some(s),
        _ => None,
    }
}

/// Equivalente ao teste de "truthiness" dos registros legados: null, ausência,
/// string vazia, zero e false contam como falso.
pub fn truthy(v: Option<&Value>) -> bool {
    match v {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Some(Value::String(s)) => !s.is_empty(),
        Some(_) => true,
    }
}

// ---
// Desserializadores tolerantes (serde `deserialize_with`)
// ---

pub fn de_num<'de, D>(d: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Value::deserialize(d)?;
    Ok(num(Some(&v)))
}

pub fn de_money<'de, D>(d: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Value::deserialize(d)?;
    Ok(money(Some(&v)))
}

/// `None` para null/ausente, senão coerção numérica.
pub fn de_num_opt<'de, D>(d: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Value::deserialize(d)?;
    if v.is_null() {
        Ok(None)
    } else {
        Ok(Some(num(Some(&v))))
    }
}

/// Mantém o valor apenas quando já é um número JSON (sem coerção).
pub fn de_f64_estrito_opt<'de, D>(d: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Value::deserialize(d)?;
    match v {
        Value::Number(n) => Ok(n.as_f64().filter(|f| f.is_finite())),
        _ => Ok(None),
    }
}

/// Epoch em milissegundos, tolerante a lixo.
pub fn de_epoch_ms<'de, D>(d: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Value::deserialize(d)?;
    Ok(num(Some(&v)) as i64)
}

/// Desserializa `Option<T>` descartando valores que não casam com `T` em vez
/// de falhar (registros antigos carregam formatos inconsistentes).
pub fn de_opt_lenient<'de, D, T>(d: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let v = Value::deserialize(d)?;
    if v.is_null() {
        return Ok(None);
    }
    Ok(serde_json::from_value(v).ok())
}

/// Desserializa um array mantendo só os elementos que casam com `T`;
/// qualquer coisa que não seja array vira lista vazia.
pub fn de_vec_lenient<'de, D, T>(d: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let v = Value::deserialize(d)?;
    match v {
        Value::Array(itens) => Ok(itens
            .into_iter()
            .filter_map(|i| serde_json::from_value(i).ok())
            .collect()),
        _ => Ok(Vec::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn num_coerces_lixo_para_zero() {
        assert_eq!(num(Some(&json!("abc"))), 0.0);
        assert_eq!(num(Some(&json!(null))), 0.0);
        assert_eq!(num(None), 0.0);
        assert_eq!(num(Some(&json!({}))), 0.0);
        assert_eq!(num(Some(&json!([]))), 0.0);
    }

    #[test]
    fn num_aceita_string_numerica() {
        assert_eq!(num(Some(&json!("1500"))), 1500.0);
        assert_eq!(num(Some(&json!(" 12.5 "))), 12.5);
        assert_eq!(num(Some(&json!(true))), 1.0);
    }

    #[test]
    fn money_formato_brasileiro() {
        assert_eq!(money(Some(&json!("1.234,56"))), 1234.56);
        assert_eq!(money(Some(&json!("1234.56"))), 1234.56);
        assert_eq!(money(Some(&json!(10.999))), 11.0);
    }

    #[test]
    fn truthy_segue_regras_js() {
        assert!(!truthy(Some(&json!(""))));
        assert!(!truthy(Some(&json!(0))));
        assert!(!truthy(Some(&json!(null))));
        assert!(truthy(Some(&json!("livelo"))));
        assert!(truthy(Some(&json!({"a": 1}))));
    }
}
