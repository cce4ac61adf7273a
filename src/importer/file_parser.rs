// ==========================================
// 独立音乐人收入看板 - 表格读取器实现
// ==========================================
// 职责: 格式识别 + 按 sheet 抽取表头与数据行
// 支持: Excel (.xlsx/.xls) / CSV (.csv)
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use crate::importer::importer_trait::SpreadsheetReader;
use calamine::{open_workbook, Data, DataType, Reader, Xls, Xlsx};
use csv::ReaderBuilder;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

// ==========================================
// 解析结果
// ==========================================

/// 表格格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpreadsheetFormat {
    Csv,
    Xls,
    Xlsx,
}

impl SpreadsheetFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "csv" => Some(SpreadsheetFormat::Csv),
            "xls" => Some(SpreadsheetFormat::Xls),
            "xlsx" => Some(SpreadsheetFormat::Xlsx),
            _ => None,
        }
    }
}

/// 单个 sheet：表头 + 原始数据行（未按表头对齐）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedSheet {
    pub title: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    /// 分号分隔的 CSV: 金额按小数逗号解析
    #[serde(default)]
    pub decimal_comma: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedWorkbook {
    pub format: SpreadsheetFormat,
    pub sheets: Vec<ParsedSheet>,
}

impl ParsedWorkbook {
    /// 第一个 sheet 的表头（模板匹配输入）
    pub fn first_headers(&self) -> Option<&[String]> {
        self.sheets.first().map(|s| s.headers.as_slice())
    }
}

// ==========================================
// 通用工具
// ==========================================

/// 去除首尾空白与 UTF-8 BOM
pub fn trim_cell(text: &str) -> String {
    text.trim().trim_start_matches('\u{feff}').trim().to_string()
}

/// 根据表头行猜测分隔符（出现次数最多者）
pub fn detect_delimiter(header_line: &str) -> u8 {
    [b',', b';', b'\t', b'|']
        .iter()
        .copied()
        .max_by_key(|&d| header_line.matches(d as char).count())
        .filter(|&d| header_line.contains(d as char))
        .unwrap_or(b',')
}

/// 识别文件格式：先看文件头魔数，再看扩展名
///
/// - `PK\x03\x04` → xlsx（zip 容器）
/// - `D0 CF 11 E0` → xls（OLE2 复合文档）
/// - 其余按扩展名，仅接受 .csv
pub fn detect_format(path: &Path) -> ImportResult<SpreadsheetFormat> {
    if !path.exists() {
        return Err(ImportError::FileNotFound(path.display().to_string()));
    }

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();
    let by_ext = SpreadsheetFormat::from_extension(&ext)
        .ok_or_else(|| ImportError::UnsupportedFormat(ext.clone()))?;

    let mut magic = [0u8; 4];
    let mut file = File::open(path)?;
    let read = file.read(&mut magic)?;

    let detected = if read == 4 && magic == [0x50, 0x4B, 0x03, 0x04] {
        SpreadsheetFormat::Xlsx
    } else if read == 4 && magic == [0xD0, 0xCF, 0x11, 0xE0] {
        SpreadsheetFormat::Xls
    } else if by_ext == SpreadsheetFormat::Csv {
        SpreadsheetFormat::Csv
    } else {
        return Err(ImportError::UnsupportedFormat(format!(
            "{}（文件内容不是 Excel 工作簿）",
            ext
        )));
    };

    if detected != by_ext {
        tracing::warn!(
            path = %path.display(),
            extension = %ext,
            detected = ?detected,
            "文件扩展名与内容不一致，按内容解析"
        );
    }

    Ok(detected)
}

/// 行是否全空
fn is_blank_row(row: &[String]) -> bool {
    row.iter().all(|v| v.is_empty())
}

/// 将原始行列表切分为 表头 + 数据行
///
/// 第一个非空行视为表头，表头尾部的空列被丢弃，数据中的空行被跳过
fn split_header_and_rows(title: String, raw_rows: Vec<Vec<String>>) -> Option<ParsedSheet> {
    let mut iter = raw_rows.into_iter().skip_while(|r| is_blank_row(r));
    let mut headers = iter.next()?;
    while headers.last().map(|h| h.is_empty()).unwrap_or(false) {
        headers.pop();
    }

    let rows = iter.filter(|r| !is_blank_row(r)).collect();
    Some(ParsedSheet {
        title,
        headers,
        rows,
        decimal_comma: false,
    })
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("Sheet1")
        .to_string()
}

// ==========================================
// CSV Reader 实现
// ==========================================
pub struct CsvReader;

impl SpreadsheetReader for CsvReader {
    fn read_sheets(&self, path: &Path) -> ImportResult<Vec<ParsedSheet>> {
        if !path.exists() {
            return Err(ImportError::FileNotFound(path.display().to_string()));
        }

        let bytes = std::fs::read(path)?;
        let text = String::from_utf8_lossy(&bytes);
        let header_line = text.lines().find(|l| !l.trim().is_empty()).unwrap_or("");
        let delimiter = detect_delimiter(header_line);

        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true) // 允许行长度不一致
            .delimiter(delimiter)
            .from_reader(text.as_bytes());

        let mut raw_rows = Vec::new();
        for result in reader.records() {
            let record = result?;
            raw_rows.push(record.iter().map(trim_cell).collect::<Vec<_>>());
        }

        Ok(split_header_and_rows(file_stem(path), raw_rows)
            .map(|sheet| ParsedSheet {
                decimal_comma: delimiter == b';',
                ..sheet
            })
            .into_iter()
            .collect())
    }
}

// ==========================================
// Excel Reader 实现
// ==========================================
pub struct ExcelReader {
    format: SpreadsheetFormat,
}

impl ExcelReader {
    pub fn xlsx() -> Self {
        Self {
            format: SpreadsheetFormat::Xlsx,
        }
    }

    pub fn xls() -> Self {
        Self {
            format: SpreadsheetFormat::Xls,
        }
    }
}

/// 单元格转字符串（日期统一为 YYYY-MM-DD）
fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::DateTime(_) | Data::DateTimeIso(_) => cell
            .as_date()
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| trim_cell(&cell.to_string())),
        _ => trim_cell(&cell.to_string()),
    }
}

fn read_workbook_sheets<RS, R>(workbook: &mut R) -> ImportResult<Vec<ParsedSheet>>
where
    RS: Read + Seek,
    R: Reader<RS>,
{
    let mut sheets = Vec::new();
    for sheet_name in workbook.sheet_names() {
        let range = workbook
            .worksheet_range(&sheet_name)
            .map_err(|e| ImportError::ExcelParseError(format!("{}: {:?}", sheet_name, e)))?;

        let raw_rows = range
            .rows()
            .map(|row| row.iter().map(cell_to_string).collect::<Vec<_>>())
            .collect::<Vec<_>>();

        match split_header_and_rows(sheet_name.clone(), raw_rows) {
            Some(sheet) => sheets.push(sheet),
            None => tracing::debug!(sheet = %sheet_name, "跳过空工作表"),
        }
    }
    Ok(sheets)
}

impl SpreadsheetReader for ExcelReader {
    fn read_sheets(&self, path: &Path) -> ImportResult<Vec<ParsedSheet>> {
        if !path.exists() {
            return Err(ImportError::FileNotFound(path.display().to_string()));
        }

        match self.format {
            SpreadsheetFormat::Xlsx => {
                let mut workbook: Xlsx<BufReader<File>> = open_workbook(path)
                    .map_err(|e: calamine::XlsxError| ImportError::ExcelParseError(e.to_string()))?;
                read_workbook_sheets(&mut workbook)
            }
            SpreadsheetFormat::Xls => {
                let mut workbook: Xls<BufReader<File>> = open_workbook(path)
                    .map_err(|e: calamine::XlsError| ImportError::ExcelParseError(e.to_string()))?;
                read_workbook_sheets(&mut workbook)
            }
            SpreadsheetFormat::Csv => CsvReader.read_sheets(path),
        }
    }
}

// ==========================================
// 通用读取器（根据文件内容/扩展名自动选择）
// ==========================================
pub struct UniversalReader;

impl UniversalReader {
    pub fn read<P: AsRef<Path>>(&self, path: P) -> ImportResult<ParsedWorkbook> {
        let path = path.as_ref();
        let format = detect_format(path)?;
        let sheets = match format {
            SpreadsheetFormat::Csv => CsvReader.read_sheets(path)?,
            SpreadsheetFormat::Xlsx => ExcelReader::xlsx().read_sheets(path)?,
            SpreadsheetFormat::Xls => ExcelReader::xls().read_sheets(path)?,
        };

        if sheets.is_empty() {
            return Err(ImportError::NoSheets);
        }

        tracing::debug!(
            path = %path.display(),
            format = ?format,
            sheets = sheets.len(),
            "表格读取完成"
        );
        Ok(ParsedWorkbook { format, sheets })
    }
}

impl SpreadsheetReader for UniversalReader {
    fn read_sheets(&self, path: &Path) -> ImportResult<Vec<ParsedSheet>> {
        self.read(path).map(|wb| wb.sheets)
    }
}
