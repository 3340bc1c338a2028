// ==========================================
// 国际化 (i18n) 模块
// ==========================================
// 使用 rust-i18n 库
// 支持中文（默认）和英文
// ==========================================
// 注意: rust_i18n::i18n! 宏已在 lib.rs 中初始化
// ==========================================

/// 获取当前语言
pub fn current_locale() -> String {
    rust_i18n::locale().to_string()
}

/// 设置语言
///
/// # 参数
/// - locale: 语言代码（"zh-CN" 或 "en"）
pub fn set_locale(locale: &str) {
    rust_i18n::set_locale(locale);
}

/// 翻译消息（无参数）
///
/// # 示例
/// ```no_run
/// use surgery_aps::i18n::t;
/// let msg = t("notify.assigned.subject");
/// ```
pub fn t(key: &str) -> String {
    rust_i18n::t!(key).to_string()
}

/// 翻译消息（带参数）
///
/// 模板中的占位符格式为 %{name}
///
/// # 示例
/// ```no_run
/// use surgery_aps::i18n::t_with_args;
/// let msg = t_with_args("notify.failed.body", &[("surgery_id", "S001"), ("reason", "...")]);
/// ```
pub fn t_with_args(key: &str, args: &[(&str, &str)]) -> String {
    let mut msg = t(key);
    for (name, value) in args {
        msg = msg.replace(&format!("%{{{}}}", name), value);
    }
    msg
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_t_with_args_replaces_placeholders() {
        set_locale("zh-CN");
        let msg = t_with_args("notify.assigned.body", &[
            ("surgery_id", "S001"),
            ("room_id", "R02"),
            ("start_at", "10:30"),
        ]);
        assert!(msg.contains("S001"));
        assert!(msg.contains("R02"));
        assert!(!msg.contains("%{"));
    }
}
