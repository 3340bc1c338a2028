// ==========================================
// 手术室排程系统 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为，避免“部分模块外键开启/部分不开启”
// - 统一 busy_timeout，减少并发写入时的偶发 busy 错误
// - 统一建表入口 (ensure_schema)，测试与演示库共用同一份 schema
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
///
/// 说明：
/// - 版本号用于**提示/告警**（不做自动迁移），避免静默在旧库上运行导致隐性错误。
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> =
        conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

/// 建表（幂等）
///
/// 表清单:
/// - 主数据: patient / surgeon / operating_room / surgery_type
/// - 事实层: surgery (手术记录，被让位时只清字段不删行)
/// - 排班快照: schedule_assignment (房间+时间段占用，手术唯一)
/// - 配置: config_kv
pub fn ensure_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS patient (
            patient_id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            medical_record_no TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS surgeon (
            surgeon_id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            specialty TEXT,
            active INTEGER NOT NULL DEFAULT 1
        );

        CREATE TABLE IF NOT EXISTS operating_room (
            room_id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            room_type TEXT NOT NULL DEFAULT 'GENERAL',
            is_backup INTEGER NOT NULL DEFAULT 0,
            active INTEGER NOT NULL DEFAULT 1
        );

        CREATE TABLE IF NOT EXISTS surgery_type (
            type_id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            default_duration_min INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS surgery (
            surgery_id TEXT PRIMARY KEY,
            patient_id TEXT NOT NULL REFERENCES patient(patient_id),
            surgery_type_id TEXT NOT NULL REFERENCES surgery_type(type_id),
            surgeon_id TEXT REFERENCES surgeon(surgeon_id),
            room_id TEXT REFERENCES operating_room(room_id),
            scheduled_start TEXT,
            scheduled_end TEXT,
            duration_min INTEGER NOT NULL,
            urgency TEXT NOT NULL DEFAULT 'MEDIUM',
            status TEXT NOT NULL DEFAULT 'AWAITING_RESCHEDULE',
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS schedule_assignment (
            assignment_id TEXT PRIMARY KEY,
            surgery_id TEXT NOT NULL UNIQUE REFERENCES surgery(surgery_id),
            room_id TEXT NOT NULL REFERENCES operating_room(room_id),
            start_at TEXT NOT NULL,
            end_at TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_assignment_room_start
          ON schedule_assignment(room_id, start_at);

        CREATE INDEX IF NOT EXISTS idx_assignment_day
          ON schedule_assignment(start_at);

        CREATE INDEX IF NOT EXISTS idx_surgery_status
          ON surgery(status);

        CREATE TABLE IF NOT EXISTS config_kv (
            key TEXT NOT NULL,
            scope TEXT NOT NULL DEFAULT 'global',
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (key, scope)
        );

        INSERT OR IGNORE INTO schema_version (version) VALUES (1);
        "#,
    )?;
    Ok(())
}
