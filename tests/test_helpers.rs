// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 提供测试所需的数据库初始化、测试数据生成等功能
// ==========================================

#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime, Utc};
use rusqlite::{params, Connection};
use std::error::Error;
use std::sync::{Arc, Mutex};
use tempfile::NamedTempFile;
use uuid::Uuid;

use surgery_aps::api::EmergencyApi;
use surgery_aps::config::ConfigManager;
use surgery_aps::db::{configure_sqlite_connection, ensure_schema};
use surgery_aps::domain::request::{EmergencyFlags, EmergencyRequest};
use surgery_aps::domain::surgery::{OperatingRoom, Patient, Surgeon, SurgeryType};
use surgery_aps::domain::types::{PriorityTier, SurgeryStatus, UrgencyLevel};
use surgery_aps::repository::{
    OperatingRoomRepository, PatientRepository, ScheduleRepository, SurgeonRepository,
    SurgeryRepository,
};

/// 创建临时测试数据库并初始化 schema
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - Arc<Mutex<Connection>>: 共享连接
pub fn create_test_db() -> Result<(NamedTempFile, Arc<Mutex<Connection>>), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file
        .path()
        .to_str()
        .ok_or("temp path not utf-8")?
        .to_string();

    let conn = Connection::open(&db_path)?;
    configure_sqlite_connection(&conn)?;
    ensure_schema(&conn)?;

    Ok((temp_file, Arc::new(Mutex::new(conn))))
}

/// 组装 EmergencyApi（无通知分发器、无事件发布器）
pub fn build_api(conn: Arc<Mutex<Connection>>) -> EmergencyApi {
    EmergencyApi::new(
        Arc::new(PatientRepository::new(conn.clone())),
        Arc::new(SurgeonRepository::new(conn.clone())),
        Arc::new(OperatingRoomRepository::new(conn.clone())),
        Arc::new(SurgeryRepository::new(conn.clone())),
        Arc::new(ScheduleRepository::new(conn.clone())),
        Arc::new(ConfigManager::from_connection(conn).unwrap()),
        None,
        None,
    )
}

/// 测试日期（固定，保证可复现）
pub fn test_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 8, 4).unwrap()
}

/// 测试日期内的时间点
pub fn at(h: u32, m: u32) -> NaiveDateTime {
    test_date().and_hms_opt(h, m, 0).unwrap()
}

// ==========================================
// 主数据种子
// ==========================================

pub fn seed_patient(conn: &Arc<Mutex<Connection>>, patient_id: &str) {
    PatientRepository::new(conn.clone())
        .insert(&Patient {
            patient_id: patient_id.to_string(),
            name: format!("患者_{}", patient_id),
            medical_record_no: Some(format!("MR_{}", patient_id)),
            created_at: Utc::now(),
        })
        .unwrap();
}

pub fn seed_surgeon(conn: &Arc<Mutex<Connection>>, surgeon_id: &str) {
    SurgeonRepository::new(conn.clone())
        .insert(&Surgeon {
            surgeon_id: surgeon_id.to_string(),
            name: format!("医生_{}", surgeon_id),
            specialty: Some("GENERAL".to_string()),
            active: true,
        })
        .unwrap();
}

pub fn seed_room(conn: &Arc<Mutex<Connection>>, room_id: &str) {
    seed_room_typed(conn, room_id, "GENERAL");
}

pub fn seed_room_typed(conn: &Arc<Mutex<Connection>>, room_id: &str, room_type: &str) {
    OperatingRoomRepository::new(conn.clone())
        .insert(&OperatingRoom {
            room_id: room_id.to_string(),
            name: format!("手术室_{}", room_id),
            room_type: room_type.to_string(),
            is_backup: false,
            active: true,
        })
        .unwrap();
}

pub fn seed_surgery_type(conn: &Arc<Mutex<Connection>>, type_id: &str, duration_min: i64) {
    SurgeryRepository::new(conn.clone())
        .insert_type(&SurgeryType {
            type_id: type_id.to_string(),
            name: format!("手术类型_{}", type_id),
            default_duration_min: duration_min,
        })
        .unwrap();
}

/// 灌入一台已排手术（surgery 行 + schedule_assignment 行）
///
/// # 返回
/// (surgery_id, assignment_id)
pub fn seed_scheduled_surgery(
    conn: &Arc<Mutex<Connection>>,
    patient_id: &str,
    type_id: &str,
    surgeon_id: &str,
    room_id: &str,
    start: NaiveDateTime,
    end: NaiveDateTime,
    urgency: UrgencyLevel,
) -> (String, String) {
    let surgery_id = Uuid::new_v4().to_string();
    let assignment_id = Uuid::new_v4().to_string();
    let now = Utc::now();
    let duration_min = (end - start).num_minutes();

    let c = conn.lock().unwrap();
    c.execute(
        "INSERT INTO surgery (
            surgery_id, patient_id, surgery_type_id, surgeon_id, room_id,
            scheduled_start, scheduled_end, duration_min, urgency, status,
            created_at, updated_at
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        params![
            surgery_id,
            patient_id,
            type_id,
            surgeon_id,
            room_id,
            start,
            end,
            duration_min,
            urgency.to_db_str(),
            SurgeryStatus::Scheduled.to_db_str(),
            now,
            now,
        ],
    )
    .unwrap();
    c.execute(
        "INSERT INTO schedule_assignment (assignment_id, surgery_id, room_id, start_at, end_at, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![assignment_id, surgery_id, room_id, start, end, now],
    )
    .unwrap();

    (surgery_id, assignment_id)
}

// ==========================================
// 请求构建器
// ==========================================

pub struct RequestBuilder {
    request: EmergencyRequest,
}

impl RequestBuilder {
    pub fn new(tier: PriorityTier) -> Self {
        Self {
            request: EmergencyRequest {
                patient_id: "P001".to_string(),
                surgery_type_id: "T001".to_string(),
                duration_min: 45,
                arrival_at: at(10, 0),
                tier,
                required_surgeon_id: None,
                preferred_start: None,
                room_type_filter: None,
                flags: EmergencyFlags::default(),
                max_wait_override_min: None,
            },
        }
    }

    pub fn patient(mut self, patient_id: &str) -> Self {
        self.request.patient_id = patient_id.to_string();
        self
    }

    pub fn surgery_type(mut self, type_id: &str) -> Self {
        self.request.surgery_type_id = type_id.to_string();
        self
    }

    pub fn duration(mut self, duration_min: i64) -> Self {
        self.request.duration_min = duration_min;
        self
    }

    pub fn arrival(mut self, arrival_at: NaiveDateTime) -> Self {
        self.request.arrival_at = arrival_at;
        self
    }

    pub fn required_surgeon(mut self, surgeon_id: &str) -> Self {
        self.request.required_surgeon_id = Some(surgeon_id.to_string());
        self
    }

    pub fn preferred_start(mut self, start: NaiveDateTime) -> Self {
        self.request.preferred_start = Some(start);
        self
    }

    pub fn room_type(mut self, room_type: &str) -> Self {
        self.request.room_type_filter = Some(room_type.to_string());
        self
    }

    pub fn allow_bumping(mut self, allow: bool) -> Self {
        self.request.flags.allow_bumping = allow;
        self
    }

    pub fn allow_overtime(mut self, allow: bool) -> Self {
        self.request.flags.allow_overtime = allow;
        self
    }

    pub fn allow_backup_rooms(mut self, allow: bool) -> Self {
        self.request.flags.allow_backup_rooms = allow;
        self
    }

    pub fn max_wait_override(mut self, minutes: i64) -> Self {
        self.request.max_wait_override_min = Some(minutes);
        self
    }

    pub fn build(self) -> EmergencyRequest {
        self.request
    }
}

// ==========================================
// 排班不变量断言
// ==========================================

/// 断言当日排班满足房间/医生独占不变量（半开区间）
pub fn assert_schedule_invariants(conn: &Arc<Mutex<Connection>>, date: NaiveDate) {
    let snapshot = ScheduleRepository::new(conn.clone())
        .find_day_snapshot(date)
        .unwrap();

    for (i, a) in snapshot.assignments.iter().enumerate() {
        for b in snapshot.assignments.iter().skip(i + 1) {
            let overlap = a.start_at < b.end_at && b.start_at < a.end_at;
            if a.room_id == b.room_id {
                assert!(
                    !overlap,
                    "房间独占被破坏: room={} [{} {}) vs [{} {})",
                    a.room_id, a.start_at, a.end_at, b.start_at, b.end_at
                );
            }
            if a.surgeon_id == b.surgeon_id {
                assert!(
                    !overlap,
                    "医生独占被破坏: surgeon={} [{} {}) vs [{} {})",
                    a.surgeon_id, a.start_at, a.end_at, b.start_at, b.end_at
                );
            }
        }
    }
}

/// 查询手术状态
pub fn surgery_status(conn: &Arc<Mutex<Connection>>, surgery_id: &str) -> String {
    let c = conn.lock().unwrap();
    c.query_row(
        "SELECT status FROM surgery WHERE surgery_id = ?1",
        params![surgery_id],
        |row| row.get(0),
    )
    .unwrap()
}

/// 统计 surgery 表行数
pub fn surgery_count(conn: &Arc<Mutex<Connection>>) -> i64 {
    let c = conn.lock().unwrap();
    c.query_row("SELECT COUNT(*) FROM surgery", [], |row| row.get(0))
        .unwrap()
}

/// 统计 schedule_assignment 表行数
pub fn assignment_count(conn: &Arc<Mutex<Connection>>) -> i64 {
    let c = conn.lock().unwrap();
    c.query_row("SELECT COUNT(*) FROM schedule_assignment", [], |row| {
        row.get(0)
    })
    .unwrap()
}
