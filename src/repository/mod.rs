// ==========================================
// 手术室排程系统 - 数据仓储层
// ==========================================
// 职责: 数据访问，所有多写操作必须走事务
// ==========================================

pub mod error;
pub mod patient_repo;
pub mod room_repo;
pub mod schedule_repo;
pub mod staff_repo;
pub mod surgery_repo;

pub use error::{RepositoryError, RepositoryResult};
pub use patient_repo::PatientRepository;
pub use room_repo::OperatingRoomRepository;
pub use schedule_repo::ScheduleRepository;
pub use staff_repo::SurgeonRepository;
pub use surgery_repo::SurgeryRepository;
