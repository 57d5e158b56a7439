//! The artifact store: a single global base directory holding one
//! subdirectory per job, each artifact instance a separate file named by a
//! fresh UUID, with a SQLite metadata index alongside it. Grounded on the
//! local filesystem backend the original implementation used
//! (`storage/local.py`), generalized from the append-only event-store
//! pattern (pool-held, `Result`-returning, tracing on soft failures).

use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::Utc;
use dhscanner_model::{ArtifactKind, JobId, Language};
use sqlx::SqlitePool;
use tracing::warn;
use uuid::Uuid;

use crate::schema;

#[derive(Debug, Clone)]
pub struct FileRecord {
    pub id: Uuid,
    pub original_filename: String,
    pub language: Language,
    pub go_module_name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NativeAstRecord {
    pub id: Uuid,
    pub file_id: Uuid,
    pub language: Language,
    pub go_module_name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct DhscannerAstRecord {
    pub id: Uuid,
    pub file_id: Uuid,
}

#[derive(Debug, Clone)]
pub struct CallableRecord {
    pub id: Uuid,
    pub file_id: Uuid,
    pub index: i64,
    pub go_module_name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct FactsRecord {
    pub id: Uuid,
    pub callable_id: Uuid,
    pub index: i64,
}

/// Filesystem bytes plus a SQLite metadata index, one row per artifact
/// instance. Loads that find no row return `Ok(None)` — a job simply
/// hasn't produced that artifact yet, not a system failure. Only I/O and
/// database errors are `Err`.
#[derive(Clone)]
pub struct ArtifactStore {
    pool: SqlitePool,
    root: PathBuf,
}

impl ArtifactStore {
    pub async fn connect(db_path: &str, artifact_root: &str) -> Result<Self> {
        let root = PathBuf::from(artifact_root);
        tokio::fs::create_dir_all(&root).await?;

        let url = format!("sqlite://{db_path}?mode=rwc");
        let pool = SqlitePool::connect(&url).await?;
        schema::bootstrap(&pool).await?;

        Ok(ArtifactStore { pool, root })
    }

    fn job_dir(&self, job_id: &JobId) -> PathBuf {
        self.root.join(job_id.as_str())
    }

    async fn ensure_job_dir(&self, job_id: &JobId) -> Result<PathBuf> {
        let dir = self.job_dir(job_id);
        tokio::fs::create_dir_all(&dir).await?;
        Ok(dir)
    }

    async fn write_bytes(&self, job_id: &JobId, id: Uuid, kind: &ArtifactKind, bytes: &[u8]) -> Result<PathBuf> {
        let dir = self.ensure_job_dir(job_id).await?;
        let path = dir.join(format!("{id}{}", kind.file_suffix()));
        tokio::fs::write(&path, bytes).await?;
        Ok(path)
    }

    async fn read_bytes(path: &Path) -> Result<Option<Vec<u8>>> {
        match tokio::fs::read(path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn save_source_file(
        &self,
        job_id: &JobId,
        original_filename: &str,
        language: Language,
        go_module_name: Option<&str>,
        bytes: &[u8],
    ) -> Result<Uuid> {
        let id = Uuid::new_v4();
        self.write_bytes(job_id, id, &ArtifactKind::SourceFile, bytes).await?;
        sqlx::query(
            "INSERT INTO files (id, job_id, original_filename, language, go_module_name, created_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(id.to_string())
        .bind(job_id.as_str())
        .bind(original_filename)
        .bind(language.as_str())
        .bind(go_module_name)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(id)
    }

    pub async fn save_native_ast(
        &self,
        job_id: &JobId,
        file_id: Uuid,
        language: Language,
        go_module_name: Option<&str>,
        bytes: &[u8],
    ) -> Result<Uuid> {
        let id = Uuid::new_v4();
        self.write_bytes(job_id, id, &ArtifactKind::NativeAst, bytes).await?;
        sqlx::query(
            "INSERT INTO native_asts (id, job_id, file_id, language, go_module_name, created_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(id.to_string())
        .bind(job_id.as_str())
        .bind(file_id.to_string())
        .bind(language.as_str())
        .bind(go_module_name)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(id)
    }

    pub async fn save_dhscanner_ast(&self, job_id: &JobId, file_id: Uuid, bytes: &[u8]) -> Result<Uuid> {
        let id = Uuid::new_v4();
        self.write_bytes(job_id, id, &ArtifactKind::DhscannerAst, bytes).await?;
        sqlx::query("INSERT INTO dhscanner_asts (id, job_id, file_id, created_at) VALUES (?, ?, ?, ?)")
            .bind(id.to_string())
            .bind(job_id.as_str())
            .bind(file_id.to_string())
            .bind(Utc::now().to_rfc3339())
            .execute(&self.pool)
            .await?;
        Ok(id)
    }

    pub async fn save_callable(
        &self,
        job_id: &JobId,
        file_id: Uuid,
        index: usize,
        go_module_name: Option<&str>,
        bytes: &[u8],
    ) -> Result<Uuid> {
        let id = Uuid::new_v4();
        self.write_bytes(job_id, id, &ArtifactKind::Callable(index), bytes).await?;
        sqlx::query(
            "INSERT INTO callables (id, job_id, file_id, idx, go_module_name, created_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(id.to_string())
        .bind(job_id.as_str())
        .bind(file_id.to_string())
        .bind(index as i64)
        .bind(go_module_name)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(id)
    }

    pub async fn save_facts(&self, job_id: &JobId, callable_id: Uuid, index: usize, bytes: &[u8]) -> Result<Uuid> {
        let id = Uuid::new_v4();
        self.write_bytes(job_id, id, &ArtifactKind::Facts(index), bytes).await?;
        sqlx::query(
            "INSERT INTO knowledge_base_facts (id, job_id, callable_id, idx, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(id.to_string())
        .bind(job_id.as_str())
        .bind(callable_id.to_string())
        .bind(index as i64)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(id)
    }

    pub async fn save_results(&self, job_id: &JobId, bytes: &[u8]) -> Result<Uuid> {
        let id = Uuid::new_v4();
        self.write_bytes(job_id, id, &ArtifactKind::Results, bytes).await?;
        sqlx::query("INSERT INTO results (id, job_id, created_at) VALUES (?, ?, ?)")
            .bind(id.to_string())
            .bind(job_id.as_str())
            .bind(Utc::now().to_rfc3339())
            .execute(&self.pool)
            .await?;
        Ok(id)
    }

    pub async fn save_output(&self, job_id: &JobId, bytes: &[u8]) -> Result<Uuid> {
        let id = Uuid::new_v4();
        self.write_bytes(job_id, id, &ArtifactKind::Output, bytes).await?;
        sqlx::query("INSERT INTO outputs (id, job_id, created_at) VALUES (?, ?, ?)")
            .bind(id.to_string())
            .bind(job_id.as_str())
            .bind(Utc::now().to_rfc3339())
            .execute(&self.pool)
            .await?;
        Ok(id)
    }

    /// Load the raw bytes of an artifact instance. `Ok(None)` if the file is
    /// simply absent (not yet produced); only I/O failures other than
    /// not-found are propagated as errors.
    pub async fn load(&self, job_id: &JobId, kind: &ArtifactKind, id: Uuid) -> Result<Option<Vec<u8>>> {
        let path = self.job_dir(job_id).join(format!("{id}{}", kind.file_suffix()));
        let result = Self::read_bytes(&path).await;
        if matches!(result, Ok(None)) {
            warn!(job_id = %job_id, %id, "artifact load found no file on disk");
        }
        result
    }

    pub async fn list_source_files(&self, job_id: &JobId) -> Result<Vec<FileRecord>> {
        let rows: Vec<(String, String, String, Option<String>)> = sqlx::query_as(
            "SELECT id, original_filename, language, go_module_name FROM files WHERE job_id = ? ORDER BY created_at ASC",
        )
        .bind(job_id.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(id, original_filename, language, go_module_name)| {
                Some(FileRecord {
                    id: Uuid::parse_str(&id).ok()?,
                    original_filename,
                    language: Language::from_raw_str(&language)?,
                    go_module_name,
                })
            })
            .collect())
    }

    pub async fn list_native_asts(&self, job_id: &JobId) -> Result<Vec<NativeAstRecord>> {
        let rows: Vec<(String, String, String, Option<String>)> = sqlx::query_as(
            "SELECT id, file_id, language, go_module_name FROM native_asts WHERE job_id = ? ORDER BY created_at ASC",
        )
        .bind(job_id.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(id, file_id, language, go_module_name)| {
                Some(NativeAstRecord {
                    id: Uuid::parse_str(&id).ok()?,
                    file_id: Uuid::parse_str(&file_id).ok()?,
                    language: Language::from_raw_str(&language)?,
                    go_module_name,
                })
            })
            .collect())
    }

    pub async fn list_dhscanner_asts(&self, job_id: &JobId) -> Result<Vec<DhscannerAstRecord>> {
        let rows: Vec<(String, String)> = sqlx::query_as(
            "SELECT id, file_id FROM dhscanner_asts WHERE job_id = ? ORDER BY created_at ASC",
        )
        .bind(job_id.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(id, file_id)| {
                Some(DhscannerAstRecord {
                    id: Uuid::parse_str(&id).ok()?,
                    file_id: Uuid::parse_str(&file_id).ok()?,
                })
            })
            .collect())
    }

    pub async fn list_callables(&self, job_id: &JobId) -> Result<Vec<CallableRecord>> {
        let rows: Vec<(String, String, i64, Option<String>)> = sqlx::query_as(
            "SELECT id, file_id, idx, go_module_name FROM callables WHERE job_id = ? ORDER BY idx ASC",
        )
        .bind(job_id.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(id, file_id, index, go_module_name)| {
                Some(CallableRecord {
                    id: Uuid::parse_str(&id).ok()?,
                    file_id: Uuid::parse_str(&file_id).ok()?,
                    index,
                    go_module_name,
                })
            })
            .collect())
    }

    pub async fn list_facts(&self, job_id: &JobId) -> Result<Vec<FactsRecord>> {
        let rows: Vec<(String, String, i64)> = sqlx::query_as(
            "SELECT id, callable_id, idx FROM knowledge_base_facts WHERE job_id = ? ORDER BY idx ASC",
        )
        .bind(job_id.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(id, callable_id, index)| {
                Some(FactsRecord {
                    id: Uuid::parse_str(&id).ok()?,
                    callable_id: Uuid::parse_str(&callable_id).ok()?,
                    index,
                })
            })
            .collect())
    }

    pub async fn get_file(&self, id: Uuid) -> Result<Option<FileRecord>> {
        let row: Option<(String, String, Option<String>)> = sqlx::query_as(
            "SELECT original_filename, language, go_module_name FROM files WHERE id = ?",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.and_then(|(original_filename, language, go_module_name)| {
            Some(FileRecord {
                id,
                original_filename,
                language: Language::from_raw_str(&language)?,
                go_module_name,
            })
        }))
    }

    /// The most recently written query-engine results blob for a job, if any.
    pub async fn latest_results_id(&self, job_id: &JobId) -> Result<Option<Uuid>> {
        let row: Option<(String,)> = sqlx::query_as(
            "SELECT id FROM results WHERE job_id = ? ORDER BY created_at DESC LIMIT 1",
        )
        .bind(job_id.as_str())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.and_then(|(id,)| Uuid::parse_str(&id).ok()))
    }

    /// Remove a source file's bytes and metadata row once native-parse has
    /// consumed it, matching the original's best-effort per-unit cleanup:
    /// the input artifact is deleted whether or not parsing succeeded.
    pub async fn delete_source_file(&self, job_id: &JobId, id: Uuid) -> Result<()> {
        let path = self.job_dir(job_id).join(format!("{id}{}", ArtifactKind::SourceFile.file_suffix()));
        let _ = tokio::fs::remove_file(&path).await;
        sqlx::query("DELETE FROM files WHERE id = ?").bind(id.to_string()).execute(&self.pool).await?;
        Ok(())
    }

    /// Remove a native AST's bytes and metadata row once dhscanner-parse has
    /// consumed it.
    pub async fn delete_native_ast(&self, job_id: &JobId, id: Uuid) -> Result<()> {
        let path = self.job_dir(job_id).join(format!("{id}{}", ArtifactKind::NativeAst.file_suffix()));
        let _ = tokio::fs::remove_file(&path).await;
        sqlx::query("DELETE FROM native_asts WHERE id = ?").bind(id.to_string()).execute(&self.pool).await?;
        Ok(())
    }

    /// Remove a dhscanner AST's bytes and metadata row once codegen has
    /// consumed it.
    pub async fn delete_dhscanner_ast(&self, job_id: &JobId, id: Uuid) -> Result<()> {
        let path = self.job_dir(job_id).join(format!("{id}{}", ArtifactKind::DhscannerAst.file_suffix()));
        let _ = tokio::fs::remove_file(&path).await;
        sqlx::query("DELETE FROM dhscanner_asts WHERE id = ?").bind(id.to_string()).execute(&self.pool).await?;
        Ok(())
    }

    /// Remove a results blob's bytes and metadata row once the results
    /// stage has consumed it into SARIF output.
    pub async fn delete_results(&self, job_id: &JobId, id: Uuid) -> Result<()> {
        let path = self.job_dir(job_id).join(format!("{id}{}", ArtifactKind::Results.file_suffix()));
        let _ = tokio::fs::remove_file(&path).await;
        sqlx::query("DELETE FROM results WHERE id = ?").bind(id.to_string()).execute(&self.pool).await?;
        Ok(())
    }

    /// Remove a callable's file and metadata row once kbgen has consumed it,
    /// matching the original's `delete_callables` cleanup.
    pub async fn delete_callable(&self, job_id: &JobId, id: Uuid) -> Result<()> {
        let idx: Option<(i64,)> = sqlx::query_as("SELECT idx FROM callables WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        if let Some((idx,)) = idx {
            let path = self.job_dir(job_id).join(format!("{id}{}", ArtifactKind::Callable(idx as usize).file_suffix()));
            let _ = tokio::fs::remove_file(&path).await;
        }
        sqlx::query("DELETE FROM callables WHERE id = ?").bind(id.to_string()).execute(&self.pool).await?;
        Ok(())
    }

    /// Remove a facts blob's file and metadata row once queryengine has
    /// consumed it, matching the original's `delete_knowledge_base_facts`.
    pub async fn delete_facts(&self, job_id: &JobId, id: Uuid) -> Result<()> {
        let idx: Option<(i64,)> = sqlx::query_as("SELECT idx FROM knowledge_base_facts WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        if let Some((idx,)) = idx {
            let path = self.job_dir(job_id).join(format!("{id}{}", ArtifactKind::Facts(idx as usize).file_suffix()));
            let _ = tokio::fs::remove_file(&path).await;
        }
        sqlx::query("DELETE FROM knowledge_base_facts WHERE id = ?").bind(id.to_string()).execute(&self.pool).await?;
        Ok(())
    }

    /// The most recently written SARIF output for a job, if any.
    pub async fn latest_output_id(&self, job_id: &JobId) -> Result<Option<Uuid>> {
        let row: Option<(String,)> = sqlx::query_as(
            "SELECT id FROM outputs WHERE job_id = ? ORDER BY created_at DESC LIMIT 1",
        )
        .bind(job_id.as_str())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.and_then(|(id,)| Uuid::parse_str(&id).ok()))
    }

    /// Delete a job's artifacts: both the on-disk subdirectory and every
    /// metadata row. Best-effort on the filesystem side — a missing
    /// directory is not an error.
    pub async fn delete_job(&self, job_id: &JobId) -> Result<()> {
        let dir = self.job_dir(job_id);
        match tokio::fs::remove_dir_all(&dir).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        for table in [
            "files",
            "native_asts",
            "dhscanner_asts",
            "callables",
            "knowledge_base_facts",
            "results",
            "outputs",
        ] {
            sqlx::query(&format!("DELETE FROM {table} WHERE job_id = ?"))
                .bind(job_id.as_str())
                .execute(&self.pool)
                .await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_store() -> (ArtifactStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("test.sqlite");
        let artifact_root = dir.path().join("artifacts");
        let store = ArtifactStore::connect(
            db_path.to_str().unwrap(),
            artifact_root.to_str().unwrap(),
        )
        .await
        .unwrap();
        (store, dir)
    }

    #[tokio::test]
    async fn save_and_load_source_file_round_trips() {
        let (store, _dir) = test_store().await;
        let job_id = JobId::new();
        let id = store
            .save_source_file(&job_id, "main.py", Language::Py, None, b"print(1)")
            .await
            .unwrap();

        let loaded = store.load(&job_id, &ArtifactKind::SourceFile, id).await.unwrap();
        assert_eq!(loaded, Some(b"print(1)".to_vec()));
    }

    #[tokio::test]
    async fn load_of_absent_artifact_is_none_not_error() {
        let (store, _dir) = test_store().await;
        let job_id = JobId::new();
        let loaded = store
            .load(&job_id, &ArtifactKind::SourceFile, Uuid::new_v4())
            .await
            .unwrap();
        assert_eq!(loaded, None);
    }

    #[tokio::test]
    async fn list_source_files_reflects_inserted_rows() {
        let (store, _dir) = test_store().await;
        let job_id = JobId::new();
        store.save_source_file(&job_id, "a.rb", Language::Rb, None, b"puts 1").await.unwrap();
        store.save_source_file(&job_id, "b.go", Language::Go, None, b"package main").await.unwrap();

        let files = store.list_source_files(&job_id).await.unwrap();
        assert_eq!(files.len(), 2);
    }

    #[tokio::test]
    async fn delete_job_removes_files_and_metadata() {
        let (store, _dir) = test_store().await;
        let job_id = JobId::new();
        let id = store.save_source_file(&job_id, "a.rb", Language::Rb, None, b"puts 1").await.unwrap();

        store.delete_job(&job_id).await.unwrap();

        let files = store.list_source_files(&job_id).await.unwrap();
        assert!(files.is_empty());
        let loaded = store.load(&job_id, &ArtifactKind::SourceFile, id).await.unwrap();
        assert_eq!(loaded, None);
    }
}
