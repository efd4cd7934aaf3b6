// ==========================================
// 表格记录导入器 - 表头解析
// ==========================================
// 表头语法: 段.段.段，每段为 `Name` 或 `Name[i]`
// 示例: Count / Stats.Hp / Tags[0] / Items[1].Weight
// ==========================================

/// 表头路径段
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderSegment {
    pub name: String,
    pub index: Option<usize>,
}

/// 列序号（0 起）→ 列字母（A、B、...、Z、AA、AB、...）
pub fn column_name(index: usize) -> String {
    let mut letters = Vec::new();
    let mut n = index + 1;
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push((b'A' + rem as u8) as char);
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}

/// 解析表头文本为路径段
pub fn parse_header(text: &str) -> Result<Vec<HeaderSegment>, String> {
    text.trim().split('.').map(parse_segment).collect()
}

fn parse_segment(raw: &str) -> Result<HeaderSegment, String> {
    let raw = raw.trim();

    let (name, index) = match raw.strip_suffix(']') {
        Some(body) => {
            let Some((name, index_text)) = body.split_once('[') else {
                return Err(format!("unmatched ']' in '{}'", raw));
            };
            let index = index_text
                .trim()
                .parse::<usize>()
                .map_err(|_| format!("'{}' is not a valid element index", index_text))?;
            (name.trim(), Some(index))
        }
        None if raw.contains('[') => return Err(format!("unmatched '[' in '{}'", raw)),
        None => (raw, None),
    };

    if name.is_empty() {
        return Err("empty path segment".to_string());
    }

    Ok(HeaderSegment {
        name: name.to_string(),
        index,
    })
}
