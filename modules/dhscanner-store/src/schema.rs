//! Idempotent schema bootstrap for the SQLite metadata index. Mirrors the
//! artifact kinds named in the persisted-layout section of the interface
//! spec: one table per kind, keyed by a fresh UUID per artifact instance.

use sqlx::SqlitePool;

const STATEMENTS: &[&str] = &[
    r#"CREATE TABLE IF NOT EXISTS files (
        id TEXT PRIMARY KEY,
        job_id TEXT NOT NULL,
        original_filename TEXT NOT NULL,
        language TEXT NOT NULL,
        go_module_name TEXT,
        created_at TEXT NOT NULL
    )"#,
    r#"CREATE TABLE IF NOT EXISTS native_asts (
        id TEXT PRIMARY KEY,
        job_id TEXT NOT NULL,
        file_id TEXT NOT NULL,
        language TEXT NOT NULL,
        go_module_name TEXT,
        created_at TEXT NOT NULL
    )"#,
    r#"CREATE TABLE IF NOT EXISTS dhscanner_asts (
        id TEXT PRIMARY KEY,
        job_id TEXT NOT NULL,
        file_id TEXT NOT NULL,
        created_at TEXT NOT NULL
    )"#,
    r#"CREATE TABLE IF NOT EXISTS callables (
        id TEXT PRIMARY KEY,
        job_id TEXT NOT NULL,
        file_id TEXT NOT NULL,
        idx INTEGER NOT NULL,
        go_module_name TEXT,
        created_at TEXT NOT NULL
    )"#,
    r#"CREATE TABLE IF NOT EXISTS knowledge_base_facts (
        id TEXT PRIMARY KEY,
        job_id TEXT NOT NULL,
        callable_id TEXT NOT NULL,
        idx INTEGER NOT NULL,
        created_at TEXT NOT NULL
    )"#,
    r#"CREATE TABLE IF NOT EXISTS results (
        id TEXT PRIMARY KEY,
        job_id TEXT NOT NULL,
        created_at TEXT NOT NULL
    )"#,
    r#"CREATE TABLE IF NOT EXISTS outputs (
        id TEXT PRIMARY KEY,
        job_id TEXT NOT NULL,
        created_at TEXT NOT NULL
    )"#,
    "CREATE INDEX IF NOT EXISTS idx_files_job_id ON files (job_id)",
    "CREATE INDEX IF NOT EXISTS idx_native_asts_job_id ON native_asts (job_id)",
    "CREATE INDEX IF NOT EXISTS idx_dhscanner_asts_job_id ON dhscanner_asts (job_id)",
    "CREATE INDEX IF NOT EXISTS idx_callables_job_id ON callables (job_id)",
    "CREATE INDEX IF NOT EXISTS idx_knowledge_base_facts_job_id ON knowledge_base_facts (job_id)",
    "CREATE INDEX IF NOT EXISTS idx_results_job_id ON results (job_id)",
    "CREATE INDEX IF NOT EXISTS idx_outputs_job_id ON outputs (job_id)",
];

pub async fn bootstrap(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    for statement in STATEMENTS {
        sqlx::query(statement).execute(pool).await?;
    }
    Ok(())
}
