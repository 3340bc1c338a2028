// ==========================================
// 手术室排程系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::keys;
use crate::db::{configure_sqlite_connection, open_sqlite_connection};
use chrono::NaiveTime;
use rusqlite::{params, Connection, OptionalExtension};
use std::error::Error;
use std::sync::{Arc, Mutex};
use tracing::warn;

// ==========================================
// SchedulingPolicy - 排程策略快照
// ==========================================
// 一次插台决策开始时读取，决策过程中不再回读配置
#[derive(Debug, Clone)]
pub struct SchedulingPolicy {
    pub day_end: NaiveTime,          // 正常工作日结束时间
    pub overtime_buffer_min: i64,    // 延时准备缓冲（分钟）
    pub overtime_cutoff: NaiveTime,  // 延时硬截止
    pub bump_window_min: i64,        // 让位候选时间窗（分钟）
    pub strict_sla_override: bool,   // 等待时限覆盖严格模式
    pub notify_queue_capacity: usize, // 通知队列容量
}

impl Default for SchedulingPolicy {
    fn default() -> Self {
        Self {
            day_end: NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
            overtime_buffer_min: 30,
            overtime_cutoff: NaiveTime::from_hms_opt(23, 0, 0).unwrap(),
            bump_window_min: 120,
            strict_sla_override: false,
            notify_queue_capacity: 64,
        }
    }
}

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope='global'）
    pub fn get_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        let value: Option<String> = conn
            .query_row(
                "SELECT value FROM config_kv WHERE key = ?1 AND scope = 'global'",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    /// 写入配置值（scope='global'，UPSERT）
    pub fn set_config_value(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            "INSERT INTO config_kv (key, scope, value, updated_at)
             VALUES (?1, 'global', ?2, datetime('now'))
             ON CONFLICT(key, scope) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        Ok(())
    }

    /// 读取 i64 配置，缺失或非法时用默认值
    fn get_i64_or(&self, key: &str, default: i64) -> Result<i64, Box<dyn Error>> {
        let raw = self.get_config_value(key)?;
        Ok(parse_i64(raw, key, default))
    }

    /// 读取 bool 配置，缺失或非法时用默认值
    fn get_bool_or(&self, key: &str, default: bool) -> Result<bool, Box<dyn Error>> {
        let raw = self.get_config_value(key)?;
        Ok(parse_bool(raw, default))
    }

    /// 读取 HH:MM 时间配置，缺失或非法时用默认值
    fn get_time_or(&self, key: &str, default: NaiveTime) -> Result<NaiveTime, Box<dyn Error>> {
        let raw = self.get_config_value(key)?;
        Ok(parse_time(raw, key, default))
    }

    /// 加载排程策略快照
    pub fn load_policy(&self) -> Result<SchedulingPolicy, Box<dyn Error>> {
        let defaults = SchedulingPolicy::default();
        Ok(SchedulingPolicy {
            day_end: self.get_time_or(keys::SCHEDULE_DAY_END_TIME, defaults.day_end)?,
            overtime_buffer_min: self.get_i64_or(
                keys::SCHEDULE_OVERTIME_BUFFER_MINUTES,
                defaults.overtime_buffer_min,
            )?,
            overtime_cutoff: self
                .get_time_or(keys::SCHEDULE_OVERTIME_CUTOFF_TIME, defaults.overtime_cutoff)?,
            bump_window_min: self
                .get_i64_or(keys::SCHEDULE_BUMP_WINDOW_MINUTES, defaults.bump_window_min)?,
            strict_sla_override: self
                .get_bool_or(keys::SLA_STRICT_OVERRIDE_CHECK, defaults.strict_sla_override)?,
            notify_queue_capacity: self
                .get_i64_or(keys::NOTIFY_QUEUE_CAPACITY, defaults.notify_queue_capacity as i64)?
                .max(1) as usize,
        })
    }
}

fn parse_bool(raw: Option<String>, default: bool) -> bool {
    match raw.as_deref().map(|s| s.trim().to_lowercase()) {
        Some(v) if matches!(v.as_str(), "1" | "true" | "yes" | "y" | "on") => true,
        Some(v) if matches!(v.as_str(), "0" | "false" | "no" | "n" | "off") => false,
        _ => default,
    }
}

fn parse_i64(raw: Option<String>, key: &str, default: i64) -> i64 {
    match raw.as_deref().map(|s| s.trim().parse::<i64>()) {
        Some(Ok(v)) => v,
        Some(Err(_)) => {
            warn!(key, "配置值非法，使用默认值 {}", default);
            default
        }
        None => default,
    }
}

fn parse_time(raw: Option<String>, key: &str, default: NaiveTime) -> NaiveTime {
    match raw.as_deref() {
        Some(s) => match NaiveTime::parse_from_str(s.trim(), "%H:%M") {
            Ok(t) => t,
            Err(_) => {
                warn!(key, value = s, "时间配置非法，使用默认值 {}", default);
                default
            }
        },
        None => default,
    }
}
