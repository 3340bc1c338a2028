// ==========================================
// 手术室排程系统 - 患者仓储
// ==========================================
// 用途: 插台请求校验（患者必须存在）
// ==========================================

use crate::domain::surgery::Patient;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};

pub struct PatientRepository {
    conn: Arc<Mutex<Connection>>,
}

impl PatientRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 按ID查询患者
    pub fn find_by_id(&self, patient_id: &str) -> RepositoryResult<Option<Patient>> {
        let conn = self.get_conn()?;
        let patient = conn
            .query_row(
                "SELECT patient_id, name, medical_record_no, created_at
                 FROM patient WHERE patient_id = ?1",
                params![patient_id],
                |row| {
                    Ok(Patient {
                        patient_id: row.get(0)?,
                        name: row.get(1)?,
                        medical_record_no: row.get(2)?,
                        created_at: row.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(patient)
    }

    /// 判断患者是否存在
    pub fn exists(&self, patient_id: &str) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let found: Option<i64> = conn
            .query_row(
                "SELECT 1 FROM patient WHERE patient_id = ?1",
                params![patient_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    /// 新增患者
    pub fn insert(&self, patient: &Patient) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO patient (patient_id, name, medical_record_no, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                patient.patient_id,
                patient.name,
                patient.medical_record_no,
                patient.created_at,
            ],
        )?;
        Ok(())
    }
}
