use anyhow::Result;
use dotenv::dotenv;
use std::env;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use levellog::{init_level_logging, Field};

fn main() -> Result<()> {
    // LOG_DIR / LOG_COMPRESS 를 .env 에서 읽을 수 있도록
    dotenv().ok();

    // 내부 진단 로그 (RUST_LOG 로 조절)
    let filter = EnvFilter::from_default_env().add_directive(
        "info"
            .parse()
            .map_err(|e| anyhow::anyhow!("로깅 설정 파싱 실패: {e}"))?,
    );
    fmt().with_env_filter(filter).init();

    let config_path = env::args().nth(1);
    info!(config = ?config_path, "▶ 레벨 로거 초기화");

    let logger = init_level_logging(config_path.as_deref())
        .map_err(|e| anyhow::anyhow!("레벨 로거 초기화 실패: {e}"))?;

    logger.debug("디버그 메시지", &[Field::string("component", "demo")]);
    logger.info("서버 시작", &[Field::int("port", 50051), Field::bool("tls", false)]);
    logger.warn("응답 지연", &[Field::float64("latency_ms", 812.5)]);

    let err = std::io::Error::new(std::io::ErrorKind::TimedOut, "upstream timeout");
    logger.error("요청 실패", &[Field::error(&err), Field::any("retry", &[1, 2, 4])]);

    logger.flush()?;
    logger.close()?;

    info!("✅ 레벨 로거 종료");
    Ok(())
}
