//! 레벨별 구조화 로깅
//!
//! 로그 레벨마다 별도의 JSON 라인 파일을 쓰는 로거입니다.
//!
//! # 주요 기능
//! - **레벨별 파일 분리**: debug / info / warn / error 스트림을 각각의 파일로 기록
//! - **크기 기반 로테이션**: 임계값 초과 시 타임스탬프가 붙은 백업으로 교체
//! - **보관 정책**: 백업 개수 / 보관 일수 제한, 선택적 gzip 압축
//! - **구조화된 로그**: 한 줄에 하나의 JSON 객체
//!
//! # 사용 예시
//! ```no_run
//! use levellog::{Field, LevelConfig, LevelLogger};
//!
//! fn main() -> levellog::Result<()> {
//!     let logger = LevelLogger::new(&LevelConfig::in_directory("./logs"))?;
//!
//!     logger.info("서버 시작", &[Field::int("port", 50051)]);
//!     logger.error("연결 실패", &[Field::string("reason", "timeout")]);
//!
//!     logger.flush()?;
//!     logger.close()?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod convert;
pub mod encoder;
pub mod error;
pub mod field;
pub mod level;
pub mod level_logger;
pub mod logger;
pub mod rotation;
pub mod termination;
pub mod writer;

pub use config::{LevelConfig, LoggerConfig};
pub use encoder::{EncoderField, JsonEncoder, Record};
pub use error::{AggregateError, LogError, Result};
pub use field::{Field, FieldValue};
pub use level::Severity;
pub use level_logger::LevelLogger;
pub use logger::Logger;
pub use rotation::{RotatingFile, RotationPolicy};
pub use termination::{ProcessTermination, RecordingTermination, TerminationHandler};
pub use writer::{LogSink, MemorySink};

use std::path::Path;

/// 레벨 로거 초기화 함수
///
/// 설정 파일을 로드하고 (없으면 내장 기본 설정) 환경변수 덮어쓰기를 적용한 뒤
/// 검증을 거쳐 [`LevelLogger`] 를 생성합니다.
///
/// # Arguments
/// * `config_path` - YAML 설정 파일 경로 (`None` 이면 기본 설정: `logs/<level>.log`)
pub fn init_level_logging<P: AsRef<Path>>(config_path: Option<P>) -> Result<LevelLogger> {
    let mut config = match config_path {
        Some(path) => LevelConfig::load(path)?,
        None => LevelConfig::default(),
    };
    config.apply_env_overrides();
    config.validate()?;
    LevelLogger::new(&config)
}
