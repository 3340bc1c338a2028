// ==========================================
// 手术室排程系统 - 演示主入口
// ==========================================
// 用途: 组装依赖，跑一次急诊插台并输出结果
// 说明: HTTP/鉴权等外部接入层是外部协作方，不在本仓库内
// ==========================================

use std::sync::{Arc, Mutex};

use chrono::{Local, NaiveDateTime};
use surgery_aps::api::EmergencyApi;
use surgery_aps::config::ConfigManager;
use surgery_aps::db;
use surgery_aps::domain::request::{EmergencyFlags, EmergencyRequest};
use surgery_aps::domain::types::PriorityTier;
use surgery_aps::notify::{LogSender, NotificationDispatcher};
use surgery_aps::repository::{
    OperatingRoomRepository, PatientRepository, ScheduleRepository, SurgeonRepository,
    SurgeryRepository,
};

/// 默认数据库路径: <数据目录>/surgery-aps/surgery_aps.db
fn default_db_path() -> String {
    let base = dirs::data_dir().unwrap_or_else(|| std::path::PathBuf::from("."));
    let dir = base.join("surgery-aps");
    if let Err(e) = std::fs::create_dir_all(&dir) {
        tracing::warn!(error = %e, "数据目录创建失败，回退到当前目录");
        return "surgery_aps.db".to_string();
    }
    dir.join("surgery_aps.db").to_string_lossy().to_string()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 初始化日志系统
    surgery_aps::logging::init();

    tracing::info!("==================================================");
    tracing::info!("{} - 急诊插台决策引擎", surgery_aps::APP_NAME);
    tracing::info!("系统版本: {}", surgery_aps::VERSION);
    tracing::info!("==================================================");

    // 数据库路径: 第一个命令行参数，缺省用系统数据目录
    let db_path = std::env::args()
        .nth(1)
        .unwrap_or_else(default_db_path);
    tracing::info!("使用数据库: {}", db_path);

    let conn = db::open_sqlite_connection(&db_path)?;
    db::ensure_schema(&conn)?;
    if let Some(version) = db::read_schema_version(&conn)? {
        if version != db::CURRENT_SCHEMA_VERSION {
            tracing::warn!(
                found = version,
                expected = db::CURRENT_SCHEMA_VERSION,
                "schema 版本与当前代码不一致"
            );
        }
    }
    let conn = Arc::new(Mutex::new(conn));

    // ===== 组合根: 仓储 / 配置 / 通知 =====
    let patient_repo = Arc::new(PatientRepository::new(conn.clone()));
    let surgeon_repo = Arc::new(SurgeonRepository::new(conn.clone()));
    let room_repo = Arc::new(OperatingRoomRepository::new(conn.clone()));
    let surgery_repo = Arc::new(SurgeryRepository::new(conn.clone()));
    let schedule_repo = Arc::new(ScheduleRepository::new(conn.clone()));
    let config_manager = Arc::new(
        ConfigManager::from_connection(conn.clone())
            .map_err(|e| anyhow::anyhow!("配置管理器初始化失败: {}", e))?,
    );

    let policy = config_manager
        .load_policy()
        .map_err(|e| anyhow::anyhow!("加载排程策略失败: {}", e))?;
    let dispatcher = Arc::new(NotificationDispatcher::start(
        policy.notify_queue_capacity,
        Box::new(LogSender),
    ));

    let api = EmergencyApi::new(
        patient_repo.clone(),
        surgeon_repo,
        room_repo,
        surgery_repo,
        schedule_repo,
        config_manager,
        Some(dispatcher.clone()),
        None,
    );

    // 无种子数据时提示先跑种子工具
    if !patient_repo
        .exists("P001")
        .map_err(|e| anyhow::anyhow!("{}", e))?
    {
        tracing::warn!("数据库无演示数据，请先运行 reset_and_seed_demo_db");
        dispatcher.shutdown().await;
        return Ok(());
    }

    // ===== 演示: 一次 Urgent 级急诊插台 =====
    let arrival: NaiveDateTime = Local::now().naive_local();
    let request = EmergencyRequest {
        patient_id: "P001".to_string(),
        surgery_type_id: "T001".to_string(),
        duration_min: 45,
        arrival_at: arrival,
        tier: PriorityTier::Urgent,
        required_surgeon_id: None,
        preferred_start: None,
        room_type_filter: None,
        flags: EmergencyFlags::default(),
        max_wait_override_min: None,
    };

    match api.handle_emergency(&request) {
        Ok(outcome) => {
            tracing::info!(
                success = outcome.success,
                tactic = ?outcome.tactic,
                wait_minutes = ?outcome.wait_minutes,
                disruption = outcome.disruption_score,
                elapsed_ms = outcome.elapsed_ms,
                "插台完成"
            );
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
        Err(e) => {
            tracing::error!(error = %e, "插台失败");
        }
    }

    // 优雅关停: 等通知队列排空
    let delivered = dispatcher.shutdown().await;
    tracing::info!(delivered, "通知队列已排空，退出");
    Ok(())
}
