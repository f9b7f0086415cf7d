//! 레벨 로거 통합 테스트
//!
//! 실제 파일 시스템 위에서 레벨 라우팅, JSON 형식, 로테이션, 종료 동작을 검증합니다.

use anyhow::Result;
use levellog::{
    init_level_logging, Field, LevelConfig, LevelLogger, LogError, Logger, LoggerConfig,
    MemorySink, RecordingTermination, Severity,
};
use serde_json::Value;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

fn read_lines(path: &Path) -> Result<Vec<String>> {
    let contents = fs::read_to_string(path)?;
    Ok(contents.lines().map(str::to_string).collect())
}

fn parse(line: &str) -> Result<serde_json::Map<String, Value>> {
    match serde_json::from_str(line)? {
        Value::Object(map) => Ok(map),
        other => anyhow::bail!("JSON 객체가 아님: {other}"),
    }
}

fn backups_of(dir: &Path, name: &str) -> Result<Vec<String>> {
    let prefix = format!("{name}-");
    let mut names = Vec::new();
    for entry in fs::read_dir(dir)? {
        let file_name = entry?.file_name().to_string_lossy().into_owned();
        if file_name.starts_with(&prefix) {
            names.push(file_name);
        }
    }
    Ok(names)
}

/// 레벨별 파일 분리 테스트
#[test]
fn test_records_go_to_level_files() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let logger = LevelLogger::new(&LevelConfig::in_directory(temp_dir.path()))?;

    logger.debug("debug message", &[]);
    logger.info("info message", &[Field::string("key", "value")]);
    logger.warn("warn message", &[]);
    logger.error("error message", &[]);
    logger.flush()?;
    logger.close()?;

    for (level, expected) in [
        ("debug", "DEBUG"),
        ("info", "INFO"),
        ("warn", "WARN"),
        ("error", "ERROR"),
    ] {
        let lines = read_lines(&temp_dir.path().join(format!("{level}.log")))?;
        assert_eq!(lines.len(), 1, "{level}.log 에는 한 줄만 있어야 함");

        let entry = parse(&lines[0])?;
        assert_eq!(entry["level"], expected);
        assert_eq!(entry["message"], format!("{level} message"));
        assert_eq!(entry["logger"], level);
        assert!(entry.contains_key("timestamp"));
    }

    let info = parse(&read_lines(&temp_dir.path().join("info.log"))?[0])?;
    assert_eq!(info["key"], "value");

    Ok(())
}

/// 최소 레벨 필터링 테스트
#[test]
fn test_threshold_filters_records() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("test.log");
    let logger = Logger::new(&LoggerConfig::with_file(Severity::Warn, &path))?;

    logger.debug("dropped", &[]);
    logger.info("dropped", &[]);
    logger.warn("kept", &[]);
    logger.error("kept", &[]);
    logger.close()?;

    let lines = read_lines(&path)?;
    assert_eq!(lines.len(), 2);
    assert!(lines.iter().all(|line| line.contains("kept")));

    Ok(())
}

/// 기록 순서 유지 테스트
#[test]
fn test_lines_keep_write_order() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("order.log");
    let logger = Logger::new(&LoggerConfig::with_file(Severity::Debug, &path))?;

    for i in 0..100 {
        logger.info(format!("message {i}"), &[Field::int("seq", i)]);
    }
    logger.close()?;

    let lines = read_lines(&path)?;
    assert_eq!(lines.len(), 100);
    for (i, line) in lines.iter().enumerate() {
        let entry = parse(line)?;
        assert_eq!(entry["seq"], i as i64);
    }

    Ok(())
}

/// 다중 스레드 기록 테스트
#[test]
fn test_concurrent_writes_produce_whole_lines() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let logger = Arc::new(LevelLogger::new(&LevelConfig::in_directory(temp_dir.path()))?);

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let logger = Arc::clone(&logger);
            std::thread::spawn(move || {
                for i in 0..50 {
                    logger.info("concurrent", &[Field::int("thread", t), Field::int("i", i)]);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("Test assertion failed");
    }
    logger.close()?;

    let lines = read_lines(&temp_dir.path().join("info.log"))?;
    assert_eq!(lines.len(), 400);
    for line in &lines {
        parse(line)?;
    }

    Ok(())
}

/// 크기 기반 로테이션 및 백업 개수 제한 테스트
#[test]
fn test_rotation_keeps_max_backups() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("error.log");
    let config = LoggerConfig {
        max_size_mb: 1,
        max_backups: 2,
        max_age_days: 0,
        ..LoggerConfig::with_file(Severity::Error, &path)
    };
    let logger = Logger::new(&config)?;

    let payload = "x".repeat(100 * 1024);
    for i in 0..30 {
        logger.error(&payload, &[Field::int("seq", i)]);
    }
    // close 는 보관 정책 처리 완료를 기다림
    logger.close()?;

    assert!(path.exists());
    assert!(fs::metadata(&path)?.len() <= 1024 * 1024 + 200 * 1024);

    let backups = backups_of(temp_dir.path(), "error.log")?;
    assert!(!backups.is_empty(), "로테이션이 일어나야 함");
    assert!(backups.len() <= 2, "백업이 너무 많음: {backups:?}");

    Ok(())
}

/// 압축 설정 시 백업이 gzip 으로 남는지 테스트
#[test]
fn test_rotation_compresses_backups() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("warn.log");
    let config = LoggerConfig {
        max_size_mb: 1,
        max_backups: 0,
        max_age_days: 0,
        compress: true,
        ..LoggerConfig::with_file(Severity::Warn, &path)
    };
    let logger = Logger::new(&config)?;

    let payload = "y".repeat(200 * 1024);
    for _ in 0..8 {
        logger.warn(&payload, &[]);
    }
    logger.close()?;

    let backups = backups_of(temp_dir.path(), "warn.log")?;
    assert!(!backups.is_empty());
    assert!(backups.iter().all(|name| name.ends_with(".gz")), "{backups:?}");

    Ok(())
}

/// fatal 기록 후 종료 코드 1 요청 테스트
#[test]
fn test_fatal_records_and_exits() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let termination = Arc::new(RecordingTermination::new());
    let logger = LevelLogger::with_termination(
        &LevelConfig::in_directory(temp_dir.path()),
        termination.clone(),
    )?;

    logger.fatal("fatal error occurred", &[]);
    assert_eq!(termination.exit_codes(), vec![1]);

    // fatal 은 close 전에 이미 플러시되어 있어야 함
    let lines = read_lines(&temp_dir.path().join("error.log"))?;
    let entry = parse(&lines[0])?;
    assert_eq!(entry["level"], "FATAL");
    assert_eq!(entry["message"], "fatal error occurred");
    assert!(entry.contains_key("stacktrace"));

    logger.close()?;
    Ok(())
}

/// panic 기록 후 언와인딩 테스트
#[test]
fn test_panic_records_and_unwinds() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let logger = LevelLogger::new(&LevelConfig::in_directory(temp_dir.path()))?;

    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        logger.panic("panic situation", &[Field::string("stage", "boot")]);
    }));
    assert!(result.is_err());

    let lines = read_lines(&temp_dir.path().join("error.log"))?;
    let entry = parse(&lines[0])?;
    assert_eq!(entry["level"], "PANIC");
    assert_eq!(entry["stage"], "boot");

    logger.close()?;
    Ok(())
}

/// 일부 스트림 실패 시 집계 에러 테스트
#[test]
fn test_flush_reports_failing_streams() -> Result<()> {
    let sinks: Vec<MemorySink> = (0..4).map(|_| MemorySink::new()).collect();
    sinks[0].fail_on_flush();

    let make = |level: Severity, sink: &MemorySink| {
        Logger::with_sink(level, Box::new(sink.clone())).named(level.config_name())
    };
    let logger = LevelLogger::from_loggers(
        make(Severity::Debug, &sinks[0]),
        make(Severity::Info, &sinks[1]),
        make(Severity::Warn, &sinks[2]),
        make(Severity::Error, &sinks[3]),
    );

    match logger.flush() {
        Err(LogError::Aggregate(agg)) => {
            assert_eq!(agg.failed_levels(), vec![Severity::Debug]);
            assert!(agg.to_string().contains("flush"));
        }
        other => panic!("집계 에러가 아님: {other:?}"),
    }

    Ok(())
}

/// 두 번째 close 실패 테스트
#[test]
fn test_second_close_fails() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let logger = LevelLogger::new(&LevelConfig::in_directory(temp_dir.path()))?;

    logger.info("before close", &[]);
    logger.flush()?;
    logger.close()?;

    assert!(matches!(logger.close(), Err(LogError::Aggregate(_))));
    Ok(())
}

/// 디렉토리 생성 실패 시 어느 레벨인지 보고하는지 테스트
#[test]
fn test_construction_failure_names_level() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let blocker = temp_dir.path().join("blocker");
    fs::write(&blocker, b"not a directory")?;

    let mut config = LevelConfig::in_directory(temp_dir.path().join("ok"));
    config.warn = LoggerConfig::with_file(Severity::Warn, blocker.join("warn.log"));

    match LevelLogger::new(&config) {
        Err(LogError::SubLogger { level, source }) => {
            assert_eq!(level, Severity::Warn);
            assert!(matches!(*source, LogError::CreateDir { .. }));
        }
        other => panic!("하위 로거 에러가 아님: {other:?}"),
    }

    Ok(())
}

/// YAML 설정 파일 로드 테스트
#[test]
fn test_init_from_yaml_file() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let log_dir = temp_dir.path().join("logs");
    let yaml = format!(
        r#"
debug:
  level: debug
  file_path: {dir}/debug.log
info:
  level: info
  directory: {dir}
  filename: app-info.log
warn:
  level: warn
  file_path: {dir}/warn.log
error:
  level: error
  file_path: {dir}/error.log
  max_size: 1
  max_backups: 2
  compress: true
"#,
        dir = log_dir.display()
    );
    let config_path = temp_dir.path().join("logger.yaml");
    fs::write(&config_path, yaml)?;

    let logger = init_level_logging(Some(&config_path))?;
    logger.info("from yaml", &[]);
    logger.close()?;

    let lines = read_lines(&log_dir.join("app-info.log"))?;
    assert_eq!(parse(&lines[0])?["message"], "from yaml");

    Ok(())
}

/// 잘못된 YAML 은 에러, 없는 파일은 기본 설정 사용
#[test]
fn test_config_load_fallback_and_errors() -> Result<()> {
    let temp_dir = TempDir::new()?;

    let missing = LevelConfig::load(temp_dir.path().join("missing.yaml"))?;
    assert_eq!(missing, LevelConfig::default());

    let broken = temp_dir.path().join("broken.yaml");
    fs::write(&broken, "debug: [unclosed")?;
    assert!(matches!(LevelConfig::load(&broken), Err(LogError::Yaml(_))));

    Ok(())
}
