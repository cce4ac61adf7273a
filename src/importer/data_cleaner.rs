// ==========================================
// 独立音乐人收入看板 - 数据清洗器实现
// ==========================================
// 职责: 金额 / 日期 / 空值 标准化
// 说明: 解析失败返回 None，由调用方决定跳过该行
// ==========================================

use chrono::{Duration, NaiveDate, NaiveDateTime};

pub struct DataCleaner;

impl DataCleaner {
    /// 空白 → None
    pub fn normalize_null(&self, value: Option<&str>) -> Option<String> {
        value.and_then(|v| {
            let trimmed = v.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        })
    }

    /// 解析金额
    ///
    /// 支持:
    /// - 货币符号 / 币种代码 / 空格: "$1,234.50", "EUR 12"
    /// - 会计负数: "(12.30)"
    /// - 小数逗号: "3,20", "1.234,56", "0,125"
    ///
    /// decimal_comma = true（分号分隔的 CSV）时，唯一的逗号一律视为小数点
    pub fn parse_amount(&self, raw: &str, decimal_comma: bool) -> Option<f64> {
        let mut s: String = raw
            .trim()
            .chars()
            .filter(|c| !c.is_whitespace() && !matches!(c, '$' | '€' | '£' | '¥' | '￥'))
            .collect();
        s = s.trim_start_matches(|c: char| c.is_ascii_alphabetic()).to_string();
        s = s.trim_end_matches(|c: char| c.is_ascii_alphabetic()).to_string();
        if s.is_empty() {
            return None;
        }

        let mut negative = false;
        if s.starts_with('(') && s.ends_with(')') && s.len() > 2 {
            negative = true;
            s = s[1..s.len() - 1].to_string();
        }
        // 符号只允许出现一次: "--5" / "(-5)" / "+-5" 无法解析
        if let Some(rest) = s.strip_prefix('-') {
            if negative {
                return None;
            }
            negative = true;
            s = rest.to_string();
        } else if let Some(rest) = s.strip_prefix('+') {
            if negative {
                return None;
            }
            s = rest.to_string();
        }
        if s.starts_with(&['-', '+', '('][..]) {
            return None;
        }

        let normalized = match (s.rfind(','), s.rfind('.')) {
            // 两种分隔符都出现: 靠后的是小数点
            (Some(c), Some(d)) if c > d => s.replace('.', "").replace(',', "."),
            (Some(_), Some(_)) => s.replace(',', ""),
            // 只有一个逗号: 整数部分非 0 且后面恰为 3 位 → 千分位，否则小数点
            (Some(c), None) if s.matches(',').count() == 1 => {
                let integer_part = &s[..c];
                let decimals = s.len() - c - 1;
                if decimal_comma
                    || decimals != 3
                    || integer_part.is_empty()
                    || integer_part.chars().all(|ch| ch == '0')
                {
                    s.replace(',', ".")
                } else {
                    s.replace(',', "")
                }
            }
            (Some(_), None) => s.replace(',', ""),
            _ => s,
        };

        if !normalized
            .chars()
            .all(|c| c.is_ascii_digit() || c == '.' || c == 'e' || c == 'E' || c == '-')
        {
            return None;
        }

        let value = normalized.parse::<f64>().ok()?;
        if !value.is_finite() {
            return None;
        }
        Some(if negative { -value } else { value })
    }

    /// 解析日期
    ///
    /// 支持 ISO / 斜杠 / 紧凑 / 欧式点分 / 年月 / 带时间 / Excel 序列号
    pub fn parse_date(&self, raw: &str) -> Option<NaiveDate> {
        let value = raw.trim();
        if value.is_empty() {
            return None;
        }

        // %m/%d/%Y 优先，日 > 12 时才落到 %d/%m/%Y
        const DATE_FORMATS: [&str; 7] = [
            "%Y-%m-%d", "%Y/%m/%d", "%Y%m%d", "%m/%d/%Y", "%d/%m/%Y", "%d.%m.%Y", "%d-%m-%Y",
        ];
        for fmt in DATE_FORMATS {
            if let Ok(d) = NaiveDate::parse_from_str(value, fmt) {
                return Some(d);
            }
        }

        const DATETIME_FORMATS: [&str; 3] =
            ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%m/%d/%Y %H:%M"];
        for fmt in DATETIME_FORMATS {
            if let Ok(dt) = NaiveDateTime::parse_from_str(value, fmt) {
                return Some(dt.date());
            }
        }

        // 报表周期: 2024-03 / 2024/03 → 当月 1 日
        for sep in ['-', '/'] {
            if let Some((y, m)) = value.split_once(sep) {
                if y.len() == 4 && (1..=2).contains(&m.len()) {
                    if let (Ok(y), Ok(m)) = (y.parse::<i32>(), m.parse::<u32>()) {
                        if let Some(d) = NaiveDate::from_ymd_opt(y, m, 1) {
                            return Some(d);
                        }
                    }
                }
            }
        }

        // Excel 序列号（1954 ~ 2118 区间）
        if let Ok(serial) = value.parse::<f64>() {
            if (20_000.0..80_000.0).contains(&serial) {
                let base = NaiveDate::from_ymd_opt(1899, 12, 30)?;
                return base.checked_add_signed(Duration::days(serial.trunc() as i64));
            }
        }

        None
    }
}
