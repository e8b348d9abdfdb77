use anyhow::{bail, Result};

/// 解析 "4G" / "512M" / "100k" / "1024" 形式的字节数（1024 进制）
pub fn parse_size(s: &str) -> Result<usize> {
    let s = s.trim();
    if s.is_empty() {
        bail!("empty size string");
    }
    let (num, unit) = match s.find(|c: char| !c.is_ascii_digit() && c != '.') {
        Some(p) => (&s[..p], &s[p..]),
        None => (s, ""),
    };
    let value: f64 = num
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid size '{}'", s))?;
    let scale: f64 = match unit.trim().to_ascii_uppercase().as_str() {
        "" | "B" => 1.0,
        "K" | "KB" => 1024.0,
        "M" | "MB" => 1024.0 * 1024.0,
        "G" | "GB" => 1024.0 * 1024.0 * 1024.0,
        "T" | "TB" => 1024.0 * 1024.0 * 1024.0 * 1024.0,
        other => bail!("unknown size unit '{}' in '{}'", other, s),
    };
    Ok((value * scale) as usize)
}

/// 以人类可读形式格式化字节数
pub fn format_size(bytes: usize) -> String {
    const UNITS: [&str; 5] = ["B", "K", "M", "G", "T"];
    let mut v = bytes as f64;
    let mut u = 0;
    while v >= 1024.0 && u + 1 < UNITS.len() {
        v /= 1024.0;
        u += 1;
    }
    if u == 0 {
        format!("{}B", bytes)
    } else {
        format!("{:.1}{}", v, UNITS[u])
    }
}
