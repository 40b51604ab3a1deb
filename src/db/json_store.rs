// src/db/json_store.rs

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Serialize, de::DeserializeOwned};
use tokio::{fs, sync::Mutex};

use crate::common::error::AppError;

/// Persistência em arquivo JSON único por coleção.
///
/// O ciclo ler-alterar-gravar de cada coleção roda inteiro sob a trava da
/// própria coleção (escritor único); leituras também tomam a trava para nunca
/// verem um arquivo pela metade.
#[derive(Clone)]
pub struct JsonStore {
    path: PathBuf,
    lock: Arc<Mutex<()>>,
}

impl JsonStore {
    pub fn new(data_dir: &Path, file_name: &str) -> Self {
        Self {
            path: data_dir.join(file_name),
            lock: Arc::new(Mutex::new(())),
        }
    }

    /// Lê o documento. Arquivo ausente vira `None`; arquivo corrompido também,
    /// com aviso no log, para uma coleção quebrada não derrubar a API inteira.
    pub async fn read<T: DeserializeOwned>(&self) -> Result<Option<T>, AppError> {
        let _guard = self.lock.lock().await;
        self.read_unlocked().await
    }

    pub async fn write<T: Serialize>(&self, value: &T) -> Result<(), AppError> {
        let _guard = self.lock.lock().await;
        self.write_unlocked(value).await
    }

    /// Ler-alterar-gravar atômico do ponto de vista da coleção. Se o fechamento
    /// falhar (ex.: registro não encontrado) nada é gravado.
    pub async fn mutate<T, R, F>(&self, f: F) -> Result<R, AppError>
    where
        T: DeserializeOwned + Serialize + Default,
        F: FnOnce(&mut T) -> Result<R, AppError>,
    {
        let _guard = self.lock.lock().await;
        let mut doc: T = self.read_unlocked().await?.unwrap_or_default();
        let out = f(&mut doc)?;
        self.write_unlocked(&doc).await?;
        Ok(out)
    }

    async fn read_unlocked<T: DeserializeOwned>(&self) -> Result<Option<T>, AppError> {
        match fs::read(&self.path).await {
            Ok(bytes) => match serde_json::from_slice(&bytes) {
                Ok(v) => Ok(Some(v)),
                Err(e) => {
                    tracing::warn!(
                        "Arquivo {} ilegível, tratando como vazio: {}",
                        self.path.display(),
                        e
                    );
                    Ok(None)
                }
            },
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    async fn write_unlocked<T: Serialize>(&self, value: &T) -> Result<(), AppError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_vec_pretty(value)?;
        fs::write(&self.path, json).await?;
        Ok(())
    }
}
