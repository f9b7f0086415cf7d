//! 프로세스 종료 / 패닉 처리 전략
//!
//! `fatal` / `panic` 레벨 기록 후의 동작을 로거별로 주입할 수 있게 합니다.
//! 테스트에서는 실제로 프로세스를 종료하지 않는 구현을 넘겨 검증합니다.

use parking_lot::Mutex;

/// 종료 동작 전략
pub trait TerminationHandler: Send + Sync {
    /// fatal 기록 후 호출. 기본 구현은 프로세스를 종료하며 반환하지 않음
    fn exit(&self, code: i32);

    /// panic 기록 후 호출. 기본 구현은 현재 스레드를 패닉시킴
    fn panic(&self, message: &str);
}

/// 실제 프로세스 종료 / 패닉을 수행하는 기본 전략
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessTermination;

impl TerminationHandler for ProcessTermination {
    fn exit(&self, code: i32) {
        std::process::exit(code);
    }

    fn panic(&self, message: &str) {
        panic!("{message}");
    }
}

/// 종료 요청을 기록만 하는 전략
#[derive(Debug, Default)]
pub struct RecordingTermination {
    exit_codes: Mutex<Vec<i32>>,
    panics: Mutex<Vec<String>>,
}

impl RecordingTermination {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn exit_codes(&self) -> Vec<i32> {
        self.exit_codes.lock().clone()
    }

    pub fn panics(&self) -> Vec<String> {
        self.panics.lock().clone()
    }
}

impl TerminationHandler for RecordingTermination {
    fn exit(&self, code: i32) {
        self.exit_codes.lock().push(code);
    }

    fn panic(&self, message: &str) {
        self.panics.lock().push(message.to_string());
    }
}
