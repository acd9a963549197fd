//! 变量字段管理
//!
//! 每个 Workspace 持有一组有序的 name/value 绑定：name 形如 `X<n>`（最长 4 字符），
//! value 为原始输入文本，提交请求时强制为非负整数并截断到执行服务的 32 位上限。

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

/// 执行服务的 32 位整数上限，超出的输入值会被截断
pub const MAX_VALUE: i64 = 2_147_483_647;

/// 变量名最大总长度（含前缀 X）
pub const MAX_NAME_LEN: usize = 4;

fn name_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^X\d+$").expect("valid name pattern"))
}

/// 单个变量绑定：name 唯一（Workspace 内），value 保留原始输入文本
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VariableBinding {
    pub name: String,
    pub value: String,
}

/// 重命名提交的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenameOutcome {
    /// 新名字通过校验并写入
    Renamed,
    /// 新旧名字相同，绑定不变（仍会触发重新渲染）
    Unchanged,
    /// 校验失败（模式不符 / 与其他绑定重名 / 原名不存在），恢复旧名
    Rejected,
}

/// 变量存储：绑定按显示顺序排列（数字后缀升序，排序在渲染时进行）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariableStore {
    bindings: Vec<VariableBinding>,
}

impl VariableStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 由既有绑定构造（载入 Workspace 记录时使用）
    pub fn from_bindings(bindings: Vec<VariableBinding>) -> Self {
        Self { bindings }
    }

    pub fn bindings(&self) -> &[VariableBinding] {
        &self.bindings
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn get(&self, name: &str) -> Option<&VariableBinding> {
        self.bindings.iter().find(|b| b.name == name)
    }

    /// 追加编号最小的未用名字 `X<n>`（n ≥ 0），值为空；返回新名字供界面聚焦
    pub fn add(&mut self) -> String {
        let mut index = 0usize;
        while self.bindings.iter().any(|b| b.name == format!("X{}", index)) {
            index += 1;
        }
        let name = format!("X{}", index);
        self.bindings.push(VariableBinding {
            name: name.clone(),
            value: String::new(),
        });
        name
    }

    /// 删除指定名字的绑定；不存在时静默忽略
    pub fn remove(&mut self, name: &str) {
        self.bindings.retain(|b| b.name != name);
    }

    /// 提交重命名：先走输入过滤，再校验完整模式与唯一性；失败恢复旧名
    pub fn rename(&mut self, old: &str, candidate: &str) -> RenameOutcome {
        let filtered = filter_name_input(candidate);

        let Some(index) = self.bindings.iter().position(|b| b.name == old) else {
            return RenameOutcome::Rejected;
        };
        if !name_pattern().is_match(&filtered) {
            return RenameOutcome::Rejected;
        }
        let duplicate = self
            .bindings
            .iter()
            .enumerate()
            .any(|(i, b)| i != index && b.name == filtered);
        if duplicate {
            return RenameOutcome::Rejected;
        }
        if filtered == old {
            return RenameOutcome::Unchanged;
        }

        self.bindings[index].name = filtered;
        RenameOutcome::Renamed
    }

    /// 规范化并写入值；返回写入后的文本，名字不存在时返回 None
    pub fn set_value(&mut self, name: &str, raw: &str) -> Option<String> {
        let normalized = filter_value_input(raw);
        let binding = self.bindings.iter_mut().find(|b| b.name == name)?;
        binding.value = normalized.clone();
        Some(normalized)
    }

    /// 生成请求用快照：name → 整数值，无法解析的值按 0 处理
    pub fn snapshot_for_request(&self) -> BTreeMap<String, i64> {
        self.bindings
            .iter()
            .map(|b| (b.name.clone(), parse_value(&b.value)))
            .collect()
    }

    /// 按数字后缀升序重排（渲染顺序）
    pub fn sort_for_display(&mut self) {
        self.bindings.sort_by_key(|b| {
            b.name
                .get(1..)
                .and_then(|suffix| suffix.parse::<u64>().ok())
                .unwrap_or(u64::MAX)
        });
    }
}

/// 名字输入的即时过滤：强制 X 前缀，后续只留数字，去掉前导零（字面 0 除外），截到 4 字符
pub fn filter_name_input(raw: &str) -> String {
    let digits: String = if let Some(rest) = raw.strip_prefix('X') {
        rest.chars().filter(|c| c.is_ascii_digit()).collect()
    } else {
        raw.chars().filter(|c| c.is_ascii_digit()).collect()
    };

    let numeric = if digits.chars().any(|c| c != '0') {
        digits.trim_start_matches('0').to_string()
    } else if digits.len() > 1 {
        "0".to_string()
    } else {
        digits
    };

    let mut name = format!("X{}", numeric);
    name.truncate(MAX_NAME_LEN);
    name
}

/// 值输入的即时过滤：只留数字与第一个小数点，去掉前导零（"0." 开头除外），
/// 超过 MAX_VALUE 则截断，空输入按 "0" 处理
pub fn filter_value_input(raw: &str) -> String {
    let mut value = String::new();
    let mut seen_dot = false;
    for c in raw.chars() {
        match c {
            '0'..='9' => value.push(c),
            '.' if !seen_dot => {
                seen_dot = true;
                value.push(c);
            }
            _ => {}
        }
    }

    if value.len() > 1 && value.starts_with('0') && !value[1..].starts_with('.') {
        let stripped = value.trim_start_matches('0');
        value = if stripped.is_empty() {
            "0".to_string()
        } else {
            stripped.to_string()
        };
    }

    if value.parse::<f64>().map(|n| n > MAX_VALUE as f64).unwrap_or(false) {
        value = MAX_VALUE.to_string();
    }

    if value.is_empty() {
        "0".to_string()
    } else {
        value
    }
}

fn parse_value(value: &str) -> i64 {
    value
        .parse::<i64>()
        .ok()
        .or_else(|| value.parse::<f64>().ok().map(|f| f as i64))
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with(names: &[&str]) -> VariableStore {
        VariableStore::from_bindings(
            names
                .iter()
                .map(|n| VariableBinding {
                    name: n.to_string(),
                    value: String::new(),
                })
                .collect(),
        )
    }

    #[test]
    fn add_picks_lowest_unused_index() {
        let mut store = store_with(&["X0", "X2"]);
        assert_eq!(store.add(), "X1");
        assert_eq!(store.add(), "X3");
    }

    #[test]
    fn add_starts_at_zero() {
        let mut store = VariableStore::new();
        assert_eq!(store.add(), "X0");
    }

    #[test]
    fn names_stay_valid_and_unique_under_mutation() {
        let mut store = VariableStore::new();
        for _ in 0..12 {
            store.add();
        }
        store.remove("X3");
        store.remove("X7");
        store.add();
        store.rename("X11", "X99");

        let names: Vec<&str> = store.bindings().iter().map(|b| b.name.as_str()).collect();
        for name in &names {
            assert!(name_pattern().is_match(name), "bad name {}", name);
            assert!(name.len() <= MAX_NAME_LEN);
        }
        let mut deduped = names.clone();
        deduped.sort();
        deduped.dedup();
        assert_eq!(deduped.len(), names.len());
    }

    #[test]
    fn rename_to_same_name_is_unchanged() {
        let mut store = store_with(&["X0", "X1"]);
        assert_eq!(store.rename("X0", "X0"), RenameOutcome::Unchanged);
        assert_eq!(store.bindings()[0].name, "X0");
    }

    #[test]
    fn rename_to_duplicate_sibling_is_rejected() {
        // 重名绑定只能来自损坏的记录，但提交路径仍需拒绝并保留原名
        let mut store = store_with(&["X0", "X0"]);
        assert_eq!(store.rename("X0", "X0"), RenameOutcome::Rejected);
        assert_eq!(store.bindings()[0].name, "X0");
        assert_eq!(store.bindings()[1].name, "X0");
    }

    #[test]
    fn rename_rejects_taken_and_invalid_names() {
        let mut store = store_with(&["X0", "X1"]);
        assert_eq!(store.rename("X0", "X1"), RenameOutcome::Rejected);
        assert_eq!(store.rename("X0", "X"), RenameOutcome::Rejected);
        assert_eq!(store.rename("X9", "X5"), RenameOutcome::Rejected);
        assert_eq!(store.bindings()[0].name, "X0");
    }

    #[test]
    fn rename_applies_input_filter_before_commit() {
        let mut store = store_with(&["X0"]);
        // 非 X 开头：丢弃非数字字符后补上前缀
        assert_eq!(store.rename("X0", "7b"), RenameOutcome::Renamed);
        assert_eq!(store.bindings()[0].name, "X7");
        // 前导零被剥掉
        assert_eq!(store.rename("X7", "X007"), RenameOutcome::Unchanged);
        // 超长截断到 4 字符
        assert_eq!(store.rename("X7", "X123456"), RenameOutcome::Renamed);
        assert_eq!(store.bindings()[0].name, "X123");
    }

    #[test]
    fn filter_name_keeps_literal_zero() {
        assert_eq!(filter_name_input("X0"), "X0");
        assert_eq!(filter_name_input("X00"), "X0");
        assert_eq!(filter_name_input("X"), "X");
        assert_eq!(filter_name_input("X012"), "X12");
    }

    #[test]
    fn value_filter_normalizes_input() {
        assert_eq!(filter_value_input("abc"), "0");
        assert_eq!(filter_value_input(""), "0");
        assert_eq!(filter_value_input("0042"), "42");
        assert_eq!(filter_value_input("0.5"), "0.5");
        assert_eq!(filter_value_input("1.2.3"), "1.23");
        assert_eq!(filter_value_input("9999999999"), MAX_VALUE.to_string());
    }

    #[test]
    fn snapshot_defaults_unparsable_to_zero() {
        let mut store = VariableStore::new();
        store.add();
        store.add();
        store.set_value("X0", "15");
        let snapshot = store.snapshot_for_request();
        assert_eq!(snapshot.get("X0"), Some(&15));
        assert_eq!(snapshot.get("X1"), Some(&0));
    }

    #[test]
    fn display_sort_orders_by_numeric_suffix() {
        let mut store = store_with(&["X10", "X2", "X0"]);
        store.sort_for_display();
        let names: Vec<&str> = store.bindings().iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["X0", "X2", "X10"]);
    }
}
