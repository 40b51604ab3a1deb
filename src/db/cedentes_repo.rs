// src/db/cedentes_repo.rs

use std::path::Path;

use serde_json::Value;

use super::JsonStore;
use crate::common::error::AppError;

/// Documento de cedentes.
///
/// O arquivo acumulou três formatos ao longo do tempo: array puro,
/// `{ listaCedentes: [...] }` e `{ data: { listaCedentes: [...] } }`.
/// A leitura aceita os três e a gravação preserva o formato encontrado.
#[derive(Clone)]
pub struct CedentesRepo {
    store: JsonStore,
}

impl CedentesRepo {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            store: JsonStore::new(data_dir, "cedentes.json"),
        }
    }

    /// Documento cru, como está no disco (`None` quando nunca salvo).
    pub async fn read_raw(&self) -> Result<Option<Value>, AppError> {
        self.store.read().await
    }

    pub async fn write_raw(&self, doc: &Value) -> Result<(), AppError> {
        self.store.write(doc).await
    }

    pub fn extract_lista(doc: &Value) -> Vec<Value> {
        if let Value::Array(itens) = doc {
            return itens.clone();
        }
        if let Some(Value::Array(itens)) = doc.get("listaCedentes") {
            return itens.clone();
        }
        if let Some(Value::Array(itens)) = doc.get("data").and_then(|d| d.get("listaCedentes")) {
            return itens.clone();
        }
        Vec::new()
    }

    /// Reconstrói o documento no mesmo formato do original, trocando a lista.
    pub fn rebuild(original: Option<&Value>, lista: Vec<Value>) -> Value {
        match original {
            Some(Value::Object(obj)) if obj.get("listaCedentes").is_some_and(Value::is_array) => {
                let mut novo = obj.clone();
                novo.insert("listaCedentes".to_string(), Value::Array(lista));
                Value::Object(novo)
            }
            Some(Value::Object(obj))
                if obj
                    .get("data")
                    .and_then(|d| d.get("listaCedentes"))
                    .is_some_and(Value::is_array) =>
            {
                let mut novo = obj.clone();
                if let Some(Value::Object(data)) = novo.get_mut("data") {
                    data.insert("listaCedentes".to_string(), Value::Array(lista));
                }
                Value::Object(novo)
            }
            _ => Value::Array(lista),
        }
    }

    /// Ler-alterar-gravar da lista preservando o envelope do documento.
    pub async fn mutate_lista<F>(&self, f: F) -> Result<(), AppError>
    where
        F: FnOnce(&mut Vec<Value>),
    {
        self.store
            .mutate(|doc: &mut Value| {
                let original = if doc.is_null() { None } else { Some(doc.clone()) };
                let mut lista = original
                    .as_ref()
                    .map(Self::extract_lista)
                    .unwrap_or_default();
                f(&mut lista);
                *doc = Self::rebuild(original.as_ref(), lista);
                Ok(())
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn extrai_lista_dos_tres_formatos() {
        let a = json!([{"identificador": "X"}]);
        let b = json!({"listaCedentes": [{"identificador": "Y"}]});
        let c = json!({"data": {"listaCedentes": [{"identificador": "Z"}]}});
        assert_eq!(CedentesRepo::extract_lista(&a).len(), 1);
        assert_eq!(CedentesRepo::extract_lista(&b).len(), 1);
        assert_eq!(CedentesRepo::extract_lista(&c).len(), 1);
        assert!(CedentesRepo::extract_lista(&json!({"outra": 1})).is_empty());
    }

    #[test]
    fn rebuild_preserva_o_envelope() {
        let original = json!({"savedAt": "ontem", "listaCedentes": []});
        let novo = CedentesRepo::rebuild(Some(&original), vec![json!({"identificador": "A"})]);
        assert_eq!(novo["savedAt"], json!("ontem"));
        assert_eq!(novo["listaCedentes"].as_array().unwrap().len(), 1);

        let plano = CedentesRepo::rebuild(None, vec![json!({"identificador": "B"})]);
        assert!(plano.is_array());
    }

    #[tokio::test]
    async fn mutate_lista_altera_dentro_do_envelope() {
        let dir = tempdir().unwrap();
        let repo = CedentesRepo::new(dir.path());
        repo.write_raw(&json!({"data": {"listaCedentes": [{"identificador": "AB", "latam": 10}]}}))
            .await
            .unwrap();

        repo.mutate_lista(|lista| {
            lista[0]["latam"] = json!(4);
        })
        .await
        .unwrap();

        let doc = repo.read_raw().await.unwrap().unwrap();
        assert_eq!(doc["data"]["listaCedentes"][0]["latam"], json!(4));
    }
}
