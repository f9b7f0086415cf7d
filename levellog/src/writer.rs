//! 로그 싱크
//!
//! 인코딩된 로그 라인이 기록되는 대상을 추상화합니다.
//! 파일 기반 구현은 [`crate::rotation::RotatingFile`] 입니다.

use parking_lot::Mutex;
use std::io;
use std::sync::Arc;

use crate::error::{LogError, Result};

/// 로그 라인 기록 대상
///
/// 구현체는 여러 스레드에서 동시에 호출되어도 한 줄이 섞이지 않도록 보장해야 합니다.
pub trait LogSink: Send + Sync {
    /// 줄바꿈을 포함한 한 줄 기록
    fn write_line(&self, line: &[u8]) -> Result<()>;

    /// 버퍼링된 데이터를 파일 디스크립터로 내보냄
    fn flush(&self) -> Result<()>;

    /// 플러시 후 자원 해제. 두 번째 호출은 에러를 반환할 수 있음
    fn close(&self) -> Result<()>;

    /// 에러 메시지에 쓰이는 싱크 설명
    fn describe(&self) -> String;
}

#[derive(Default)]
struct MemoryState {
    lines: Vec<String>,
    closed: bool,
    fail_flush: bool,
}

/// 메모리 내 로그 싱크 (테스트용)
///
/// 복제본은 같은 버퍼를 공유하므로 로거에 넘긴 뒤에도 기록된 내용을 확인할 수 있습니다.
#[derive(Clone, Default)]
pub struct MemorySink {
    state: Arc<Mutex<MemoryState>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// 이후의 flush / close 가 I/O 에러로 실패하도록 설정
    pub fn fail_on_flush(&self) {
        self.state.lock().fail_flush = true;
    }

    /// 기록된 모든 줄 (줄바꿈 제외)
    pub fn lines(&self) -> Vec<String> {
        self.state.lock().lines.clone()
    }

    pub fn len(&self) -> usize {
        self.state.lock().lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().lines.is_empty()
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    pub fn clear(&self) {
        self.state.lock().lines.clear();
    }

    fn closed_error(&self) -> LogError {
        LogError::SinkClosed {
            sink: self.describe(),
        }
    }
}

impl LogSink for MemorySink {
    fn write_line(&self, line: &[u8]) -> Result<()> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(self.closed_error());
        }
        let text = String::from_utf8_lossy(line);
        state.lines.push(text.trim_end_matches(['\r', '\n']).to_string());
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        let state = self.state.lock();
        if state.closed {
            return Err(self.closed_error());
        }
        if state.fail_flush {
            return Err(io::Error::new(io::ErrorKind::WriteZero, "메모리 싱크 쓰기 불가").into());
        }
        Ok(())
    }

    fn close(&self) -> Result<()> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(self.closed_error());
        }
        state.closed = true;
        if state.fail_flush {
            return Err(io::Error::new(io::ErrorKind::WriteZero, "메모리 싱크 쓰기 불가").into());
        }
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
