//! # 路径工具函数
//!
//! 存储根目录下的项目子目录名是编码后的文件系统路径：
//! 路径分隔符和 Windows 盘符被替换为短横线，以适应目录命名限制。
//! 本模块负责把编码目录名解码还原为可读路径，供清单操作展示。

/// 将编码的项目目录名解码为原始文件系统路径
///
/// # 解码规则
///
/// 两阶段替换，区分双短横线（`--`）和单短横线（`-`）：
///
/// 1. 先把 `--` 换成临时占位符 `\x00`，避免被单短横线的替换误拆；
/// 2. 再把剩余的单 `-` 换成路径分隔符；
/// 3. 占位符还原为路径分隔符；
/// 4. 如果结果以「单个字母 + 分隔符」开头，按 Windows 盘符格式补回冒号。
///
/// # 参数
/// - `encoded_name` - 编码后的项目目录名（如 "G--ClaudeProjects-Test"）
///
/// # 返回值
/// 解码后的原始文件系统路径（如 "G:\ClaudeProjects\Test"）
pub fn decode_project_dir(encoded_name: &str) -> String {
    let separator = std::path::MAIN_SEPARATOR.to_string();

    // 阶段 1: 双短横线先换成占位符
    let result = encoded_name.replace("--", "\x00");

    // 阶段 2: 剩余的单短横线换成路径分隔符
    let result = result.replace('-', &separator);

    // 阶段 3: 占位符还原为路径分隔符
    let result = result.replace('\x00', &separator);

    // 阶段 4: 还原 Windows 盘符格式（"X\..." → "X:\..."）
    let chars: Vec<char> = result.chars().collect();
    if chars.len() >= 2
        && chars[0].is_ascii_alphabetic()
        && chars[1] == std::path::MAIN_SEPARATOR
    {
        format!("{}:{}", chars[0], &result[chars[0].len_utf8()..])
    } else {
        result
    }
}
