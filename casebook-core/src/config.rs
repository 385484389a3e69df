/// Shared configuration types used by the parser and the command-line front end.
use serde::{Deserialize, Serialize};

/// Headings whose text contains any of these phrases are skipped instead of
/// becoming categories. Matching is by substring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParserConfig {
    #[serde(default = "default_category_blocklist")]
    pub category_blocklist: Vec<String>,
    #[serde(default = "default_subcategory_blocklist")]
    pub subcategory_blocklist: Vec<String>,
}

fn default_category_blocklist() -> Vec<String> {
    ["测试概述", "概述", "附录"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_subcategory_blocklist() -> Vec<String> {
    ["测试范围", "测试环境", "优先级说明", "前置条件", "测试数据准备"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            category_blocklist: default_category_blocklist(),
            subcategory_blocklist: default_subcategory_blocklist(),
        }
    }
}

impl ParserConfig {
    pub fn is_blocked_category(&self, name: &str) -> bool {
        self.category_blocklist.iter().any(|p| name.contains(p.as_str()))
    }

    pub fn is_blocked_subcategory(&self, name: &str) -> bool {
        self.subcategory_blocklist.iter().any(|p| name.contains(p.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_lists_fall_back_to_defaults() {
        let config: ParserConfig =
            serde_json::from_str(r#"{"categoryBlocklist": ["Overview"]}"#).unwrap();
        assert!(config.is_blocked_category("Project Overview"));
        assert!(!config.is_blocked_category("测试概述"));
        assert!(config.is_blocked_subcategory("1.2 测试环境"));
    }
}
