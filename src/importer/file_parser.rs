// ==========================================
// 代发货库存管理后端 - CSV 文件解析器
// ==========================================
// 输入: 上传内容（字节）
// 输出: 表头 + 逐行结果（行号从 2 开始，表头为第 1 行）
// 约束:
// - 表头必须可按 UTF-8 解码，否则整批失败
// - 单行无法解码 → 该行失败，继续后续行
// - 仅空行（无任何字段）跳过且不占行号；只含分隔符的行照常编号
// ==========================================

use crate::importer::error::{ImportError, ImportResult, RowFailure};
use csv::{ByteRecord, ReaderBuilder, StringRecord};
use std::collections::HashMap;
use tracing::debug;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// 一行解析结果：小写表头 → 去空白后的值
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRow {
    pub row_number: usize,
    pub fields: HashMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCsv {
    pub headers: Vec<String>,
    pub rows: Vec<Result<ParsedRow, RowFailure>>,
}

impl ParsedCsv {
    pub fn total_rows(&self) -> usize {
        self.rows.len()
    }
}

// ==========================================
// CsvParser
// ==========================================
pub struct CsvParser;

impl CsvParser {
    /// 解析上传内容
    ///
    /// # 返回
    /// - Ok(ParsedCsv): 表头可读（行级失败包含在 rows 中）
    /// - Err(MissingHeader / InvalidEncoding / CsvParseError): 批次级失败
    pub fn parse_bytes(&self, content: &[u8]) -> ImportResult<ParsedCsv> {
        let content = content.strip_prefix(UTF8_BOM).unwrap_or(content);

        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true) // 允许行长度不一致
            .from_reader(content);

        let header_record = reader.byte_headers()?.clone();
        if header_record.is_empty() || header_record.iter().all(|h| h.is_empty()) {
            return Err(ImportError::MissingHeader);
        }

        let headers: Vec<String> = StringRecord::from_byte_record(header_record)
            .map_err(|e| ImportError::InvalidEncoding(format!("表头无法解码: {}", e.utf8_error())))?
            .iter()
            .map(|h| h.trim().to_lowercase())
            .collect();
        debug!(headers = ?headers, "CSV 表头");

        let mut rows = Vec::new();
        let mut row_number = 1;
        let mut record = ByteRecord::new();
        loop {
            match reader.read_byte_record(&mut record) {
                Ok(false) => break,
                Ok(true) => {
                    row_number += 1;
                    rows.push(decode_record(&headers, &record, row_number));
                }
                Err(e) => {
                    row_number += 1;
                    rows.push(Err(RowFailure::new(
                        row_number,
                        ImportError::CsvParseError(e.to_string()),
                    )));
                    // 读取位置无法继续推进时终止，避免死循环
                    if e.is_io_error() {
                        break;
                    }
                }
            }
        }

        Ok(ParsedCsv { headers, rows })
    }
}

fn decode_record(
    headers: &[String],
    record: &ByteRecord,
    row_number: usize,
) -> Result<ParsedRow, RowFailure> {
    let decoded = StringRecord::from_byte_record(record.clone()).map_err(|e| {
        RowFailure::new(
            row_number,
            ImportError::InvalidEncoding(format!("字段无法解码: {}", e.utf8_error())),
        )
    })?;

    let mut fields = HashMap::new();
    for (header, value) in headers.iter().zip(decoded.iter()) {
        // 重名列以第一列为准
        fields
            .entry(header.clone())
            .or_insert_with(|| value.trim().to_string());
    }

    Ok(ParsedRow { row_number, fields })
}
