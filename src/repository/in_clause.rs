// ==========================================
// 课程指标缓存引擎 - IN 子句工具
// ==========================================
// 说明: 大课程的 ID 列表可能超过 SQLite 变量上限, 查询按块执行后合并
// ==========================================

/// 单条语句绑定的 ID 数上限
///
/// SQLite 旧版本默认变量上限为 999, 留出余量给窗口日期等附加参数
pub(crate) const IN_CLAUSE_CHUNK_SIZE: usize = 900;

/// 生成 IN 子句占位符: "?1, ?2, ..."
pub(crate) fn placeholders(n: usize) -> String {
    (1..=n)
        .map(|i| format!("?{}", i))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholders_are_numbered() {
        assert_eq!(placeholders(3), "?1, ?2, ?3");
        assert_eq!(placeholders(1), "?1");
    }
}
