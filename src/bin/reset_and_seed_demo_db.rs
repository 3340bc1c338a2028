// ==========================================
// 手术室排程系统 - 演示库重置与种子工具
// ==========================================
// 用途: 重建 schema 并灌入一天的演示排班
// ==========================================

use chrono::{Duration, Local, Utc};
use rusqlite::Connection;
use std::error::Error;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use surgery_aps::db::{ensure_schema, open_sqlite_connection};
use surgery_aps::domain::schedule::ScheduleAssignment;
use surgery_aps::domain::surgery::{OperatingRoom, Patient, Surgeon, Surgery, SurgeryType};
use surgery_aps::domain::types::{SurgeryStatus, UrgencyLevel};
use surgery_aps::repository::{
    OperatingRoomRepository, PatientRepository, ScheduleRepository, SurgeonRepository,
    SurgeryRepository,
};

fn main() -> Result<(), Box<dyn Error>> {
    surgery_aps::logging::init();

    let db_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "surgery_aps.db".to_string());

    backup_and_reset_db(&db_path)?;

    let conn = open_sqlite_connection(&db_path)?;
    ensure_schema(&conn)?;

    seed_demo_day(conn)?;

    eprintln!("演示库已就绪: {}", db_path);
    Ok(())
}

fn backup_and_reset_db(db_path: &str) -> Result<(), Box<dyn Error>> {
    let path = Path::new(db_path);
    if !path.exists() {
        return Ok(());
    }

    let ts = Local::now().format("%Y%m%d_%H%M%S").to_string();
    let backup_path = format!("{}.bak.{}", db_path, ts);
    fs::copy(path, &backup_path)?;
    fs::remove_file(path)?;

    eprintln!("已备份 {} -> {}", db_path, backup_path);
    Ok(())
}

/// 灌入一天的演示排班
///
/// 场景: 3 间手术室、3 名医生，上午有两台非急诊手术占用 R1/R2，
///       R3 全天空闲，便于演示空闲房间/让位/延时三种策略
fn seed_demo_day(conn: Connection) -> Result<(), Box<dyn Error>> {
    let conn = Arc::new(Mutex::new(conn));
    let patient_repo = PatientRepository::new(conn.clone());
    let surgeon_repo = SurgeonRepository::new(conn.clone());
    let room_repo = OperatingRoomRepository::new(conn.clone());
    let surgery_repo = SurgeryRepository::new(conn.clone());
    let schedule_repo = ScheduleRepository::new(conn.clone());

    let now = Utc::now();

    // ===== 患者 =====
    for (id, name) in [("P001", "演示患者一"), ("P002", "演示患者二"), ("P003", "演示患者三")] {
        patient_repo.insert(&Patient {
            patient_id: id.to_string(),
            name: name.to_string(),
            medical_record_no: Some(format!("MR_{}", id)),
            created_at: now,
        })?;
    }

    // ===== 医生 =====
    for (id, name, specialty) in [
        ("D001", "演示医生一", "GENERAL"),
        ("D002", "演示医生二", "GENERAL"),
        ("D003", "演示医生三", "CARDIAC"),
    ] {
        surgeon_repo.insert(&Surgeon {
            surgeon_id: id.to_string(),
            name: name.to_string(),
            specialty: Some(specialty.to_string()),
            active: true,
        })?;
    }

    // ===== 手术室 =====
    for (id, name, room_type, is_backup) in [
        ("R001", "一号手术室", "GENERAL", false),
        ("R002", "二号手术室", "GENERAL", false),
        ("R003", "三号手术室", "GENERAL", true),
    ] {
        room_repo.insert(&OperatingRoom {
            room_id: id.to_string(),
            name: name.to_string(),
            room_type: room_type.to_string(),
            is_backup,
            active: true,
        })?;
    }

    // ===== 手术类型 =====
    for (id, name, duration) in [
        ("T001", "阑尾切除", 60),
        ("T002", "胆囊切除", 90),
        ("T003", "冠脉搭桥", 240),
    ] {
        surgery_repo.insert_type(&SurgeryType {
            type_id: id.to_string(),
            name: name.to_string(),
            default_duration_min: duration,
        })?;
    }

    // ===== 当日已排手术 =====
    let today = Local::now().date_naive();
    let nine = today.and_hms_opt(9, 0, 0).ok_or("invalid seed time")?;

    let seeds = [
        // (患者, 类型, 医生, 房间, 开始偏移min, 时长min, 紧急度)
        ("P002", "T001", "D001", "R001", 0, 120, UrgencyLevel::Medium),
        ("P003", "T002", "D002", "R002", 30, 90, UrgencyLevel::Low),
    ];

    for (patient_id, type_id, surgeon_id, room_id, offset_min, duration_min, urgency) in seeds {
        let start = nine + Duration::minutes(offset_min);
        let end = start + Duration::minutes(duration_min);
        let surgery_id = Uuid::new_v4().to_string();

        surgery_repo.insert(&Surgery {
            surgery_id: surgery_id.clone(),
            patient_id: patient_id.to_string(),
            surgery_type_id: type_id.to_string(),
            surgeon_id: Some(surgeon_id.to_string()),
            room_id: Some(room_id.to_string()),
            scheduled_start: Some(start),
            scheduled_end: Some(end),
            duration_min,
            urgency,
            status: SurgeryStatus::Scheduled,
            created_at: now,
            updated_at: now,
        })?;
        schedule_repo.insert_assignment(&ScheduleAssignment {
            assignment_id: Uuid::new_v4().to_string(),
            surgery_id,
            room_id: room_id.to_string(),
            surgeon_id: surgeon_id.to_string(),
            start_at: start,
            end_at: end,
            urgency,
        })?;
    }

    let count = schedule_repo.count_for_day(today)?;
    eprintln!("当日排班占用: {} 条", count);
    Ok(())
}
