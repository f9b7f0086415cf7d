//! 로거 설정 관리
//!
//! 레벨별 출력 파일, 로테이션 임계값, 보관 정책을 정의하고 YAML 에서 로드합니다.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{LogError, Result};
use crate::level::Severity;
use crate::rotation::RotationPolicy;

/// 단일 레벨 로거 설정
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    /// 최소 로그 레벨 (기본값: info)
    pub level: Severity,

    /// 로그 파일 전체 경로
    pub file_path: Option<PathBuf>,

    /// 로그 디렉토리 (`file_path` 가 없을 때 `filename` 과 함께 사용)
    pub directory: Option<PathBuf>,

    /// 로그 파일 이름
    pub filename: Option<String>,

    /// 로테이션 기준 크기 (MB 단위, 0 이면 100MB)
    #[serde(rename = "max_size")]
    pub max_size_mb: u64,

    /// 보관할 최대 백업 파일 수 (0 이면 무제한)
    pub max_backups: usize,

    /// 백업 파일 보관 일수 (0 이면 무제한)
    #[serde(rename = "max_age")]
    pub max_age_days: u64,

    /// 순환된 파일 gzip 압축 여부
    pub compress: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            level: Severity::Info,
            file_path: None,
            directory: None,
            filename: None,
            max_size_mb: 10,
            max_backups: 3,
            max_age_days: 7,
            compress: false,
        }
    }
}

impl LoggerConfig {
    /// 지정된 파일 경로로 설정 생성
    pub fn with_file<P: Into<PathBuf>>(level: Severity, file_path: P) -> Self {
        Self {
            level,
            file_path: Some(file_path.into()),
            ..Default::default()
        }
    }

    /// 디렉토리 + 파일 이름으로 설정 생성
    pub fn with_directory<P: Into<PathBuf>, S: Into<String>>(
        level: Severity,
        directory: P,
        filename: S,
    ) -> Self {
        Self {
            level,
            directory: Some(directory.into()),
            filename: Some(filename.into()),
            ..Default::default()
        }
    }

    /// 실제 로그 파일 경로
    pub fn destination(&self) -> Result<PathBuf> {
        if let Some(path) = &self.file_path {
            if path.as_os_str().is_empty() {
                return Err(LogError::Config("file_path 가 비어 있음".into()));
            }
            return Ok(path.clone());
        }

        match (&self.directory, &self.filename) {
            (Some(dir), Some(name)) if !name.is_empty() => Ok(dir.join(name)),
            (_, Some(_)) => Err(LogError::Config("filename 이 비어 있음".into())),
            _ => Err(LogError::Config(
                "file_path 또는 directory + filename 이 필요함".into(),
            )),
        }
    }

    pub fn rotation_policy(&self) -> RotationPolicy {
        RotationPolicy {
            max_size_mb: self.max_size_mb,
            max_backups: self.max_backups,
            max_age_days: self.max_age_days,
            compress: self.compress,
        }
    }

    /// 설정 유효성 검증
    pub fn validate(&self) -> Result<()> {
        if !self.level.is_configurable() {
            return Err(LogError::Config(format!(
                "최소 레벨로 사용할 수 없는 레벨: {}",
                self.level
            )));
        }
        self.destination().map(|_| ())
    }
}

/// 레벨별 로거 설정
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelConfig {
    pub debug: LoggerConfig,
    pub info: LoggerConfig,
    pub warn: LoggerConfig,
    pub error: LoggerConfig,
}

/// 외부 설정이 없을 때 사용하는 내장 기본 설정
impl Default for LevelConfig {
    fn default() -> Self {
        Self::in_directory("logs")
    }
}

impl LevelConfig {
    /// 한 디렉토리 아래 `<level>.log` 파일을 쓰는 설정
    pub fn in_directory<P: AsRef<Path>>(dir: P) -> Self {
        let dir = dir.as_ref();
        let stream = |level: Severity| {
            LoggerConfig::with_file(level, dir.join(format!("{}.log", level.config_name())))
        };
        Self {
            debug: stream(Severity::Debug),
            info: stream(Severity::Info),
            warn: stream(Severity::Warn),
            error: stream(Severity::Error),
        }
    }

    /// YAML 문자열에서 설정 파싱
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: LevelConfig = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// YAML 파일에서 설정 로드
    ///
    /// 파일을 읽을 수 없으면 내장 기본 설정을 사용합니다.
    /// 파일 내용이 잘못된 경우에는 에러를 반환합니다.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(contents) => Self::from_yaml_str(&contents),
            Err(e) => {
                debug!(
                    path = %path.display(),
                    error = %e,
                    "설정 파일을 읽을 수 없어 기본 설정 사용"
                );
                Ok(Self::default())
            }
        }
    }

    /// 환경변수로 설정 덮어쓰기
    ///
    /// - `LOG_DIR`: 모든 로그 파일을 해당 디렉토리로 이동 (파일 이름 유지)
    /// - `LOG_COMPRESS`: 모든 스트림의 압축 여부
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_with(|key| std::env::var(key).ok());
    }

    pub(crate) fn apply_overrides_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let dir = lookup("LOG_DIR").map(PathBuf::from);
        let compress = lookup("LOG_COMPRESS").map(|val| val.to_lowercase() == "true");

        for level in Severity::STREAMS {
            let Some(cfg) = self.get_mut(level) else {
                continue;
            };
            if let Some(dir) = &dir {
                if let Ok(current) = cfg.destination() {
                    if let Some(name) = current.file_name() {
                        cfg.file_path = Some(dir.join(name));
                    }
                }
            }
            if let Some(compress) = compress {
                cfg.compress = compress;
            }
        }
    }

    /// 스트림 설정 조회
    pub fn get(&self, level: Severity) -> Option<&LoggerConfig> {
        match level {
            Severity::Debug => Some(&self.debug),
            Severity::Info => Some(&self.info),
            Severity::Warn => Some(&self.warn),
            Severity::Error => Some(&self.error),
            Severity::Panic | Severity::Fatal => None,
        }
    }

    fn get_mut(&mut self, level: Severity) -> Option<&mut LoggerConfig> {
        match level {
            Severity::Debug => Some(&mut self.debug),
            Severity::Info => Some(&mut self.info),
            Severity::Warn => Some(&mut self.warn),
            Severity::Error => Some(&mut self.error),
            Severity::Panic | Severity::Fatal => None,
        }
    }

    /// 모든 스트림 설정 검증
    pub fn validate(&self) -> Result<()> {
        for level in Severity::STREAMS {
            if let Some(cfg) = self.get(level) {
                cfg.validate().map_err(|e| LogError::SubLogger {
                    level,
                    source: Box::new(e),
                })?;
            }
        }
        Ok(())
    }
}
