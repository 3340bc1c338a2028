// ==========================================
// 手术室排程系统 - 插台指标引擎
// ==========================================
// 职责: 由插台结果派生等待时间与扰动评分
// 扰动评分: 仅对出现的因子取均值，最终截断到 [0,1]
// ==========================================

use chrono::NaiveDateTime;

// ==========================================
// MetricsCalculator - 插台指标引擎
// ==========================================
pub struct MetricsCalculator {
    // 无状态引擎,不需要注入依赖
}

impl Default for MetricsCalculator {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsCalculator {
    pub fn new() -> Self {
        Self {}
    }

    /// 等待时间（分钟）= max(0, 落位开始 - 到达)
    ///
    /// 仅对成功结果有意义
    pub fn wait_minutes(&self, arrival_at: NaiveDateTime, start_at: NaiveDateTime) -> i64 {
        (start_at - arrival_at).num_minutes().max(0)
    }

    /// 扰动评分 [0,1]
    ///
    /// 因子:
    /// - 让位数 × 0.3（上限 1.0），让位数为 0 时因子不出现
    /// - 延时固定 0.4，未延时因子不出现
    /// - 冲突数 × 0.2（上限 0.6），冲突数为 0 时因子不出现
    ///
    /// 无任何因子时评分为 0.0
    pub fn disruption_score(
        &self,
        bumped_count: usize,
        overtime_required: bool,
        conflict_count: usize,
    ) -> f64 {
        let mut factors: Vec<f64> = Vec::new();

        if bumped_count > 0 {
            factors.push((bumped_count as f64 * 0.3).min(1.0));
        }
        if overtime_required {
            factors.push(0.4);
        }
        if conflict_count > 0 {
            factors.push((conflict_count as f64 * 0.2).min(0.6));
        }

        if factors.is_empty() {
            return 0.0;
        }

        let score = factors.iter().sum::<f64>() / factors.len() as f64;
        score.clamp(0.0, 1.0)
    }
}
