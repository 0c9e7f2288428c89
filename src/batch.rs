//! 데이터 포인트 배치 입출력
//!
//! JSON 또는 YAML 배치 파일을 읽고, 변환된 배치를 지정된 형식으로 출력합니다.
//!
//! # Example
//!
//! ```ignore
//! use metric_translator::batch::{parse_batch, BatchFormat};
//!
//! let batch = parse_batch(r#"[{"metric": "cpu", "value": {"intValue": 1}}]"#, BatchFormat::Json)?;
//! ```

use std::io::Read;
use std::path::Path;

use crate::cli::OutputFormat;
use crate::error::BatchError;
use crate::translation::{DataPoint, TextFormatter};

/// 배치 작업 결과 타입
pub type BatchResult<T> = Result<T, BatchError>;

/// 배치 입력 형식
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchFormat {
    /// JSON 배열
    Json,
    /// YAML 시퀀스
    Yaml,
}

impl BatchFormat {
    /// 파일 확장자로 형식 판별 (`.yaml`/`.yml` 외에는 JSON)
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
                BatchFormat::Yaml
            }
            _ => BatchFormat::Json,
        }
    }
}

/// 문자열에서 배치 파싱
pub fn parse_batch(input: &str, format: BatchFormat) -> BatchResult<Vec<DataPoint>> {
    let batch = match format {
        BatchFormat::Json => serde_json::from_str(input)?,
        BatchFormat::Yaml => serde_yaml::from_str(input)?,
    };
    Ok(batch)
}

/// 파일 또는 표준 입력에서 배치 읽기
///
/// `path`가 없거나 `-`이면 표준 입력을 JSON으로 읽습니다.
pub fn read_batch(path: Option<&Path>) -> BatchResult<Vec<DataPoint>> {
    match path {
        Some(p) if p != Path::new("-") => {
            let contents = std::fs::read_to_string(p)?;
            parse_batch(&contents, BatchFormat::from_path(p))
        }
        _ => {
            let mut contents = String::new();
            std::io::stdin().read_to_string(&mut contents)?;
            parse_batch(&contents, BatchFormat::Json)
        }
    }
}

/// 배치를 출력 형식으로 직렬화
pub fn render_batch(batch: &[DataPoint], format: OutputFormat) -> BatchResult<String> {
    let rendered = match format {
        OutputFormat::Text => TextFormatter::new().with_timestamps(true).format(batch),
        OutputFormat::Json => {
            let mut json = serde_json::to_string_pretty(batch)?;
            json.push('\n');
            json
        }
        OutputFormat::Yaml => serde_yaml::to_string(batch)?,
    };
    Ok(rendered)
}
