//! 로그 파일 순환 및 보관 관리
//!
//! 크기 기반 로테이션, 백업 개수 / 보관 기간 정책, 순환된 파일의 gzip 압축을 구현합니다.
//!
//! 파일 배치:
//! - `<path>`: 현재 기록 중인 파일
//! - `<path>-<UTC 타임스탬프>`: 순환된 백업
//! - `<path>-<UTC 타임스탬프>.gz`: 압축된 백업

use chrono::{DateTime, NaiveDateTime, Utc};
use crossbeam::channel::{self, Sender, TrySendError};
use flate2::write::GzEncoder;
use flate2::Compression;
use parking_lot::Mutex;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::thread::JoinHandle;
use tracing::{debug, warn};

use crate::error::{LogError, Result};
use crate::writer::LogSink;

const MEGABYTE: u64 = 1024 * 1024;

/// `max_size_mb` 가 0 일 때 사용하는 기본 크기
pub const DEFAULT_MAX_SIZE_MB: u64 = 100;

const BACKUP_TIME_FORMAT: &str = "%Y-%m-%dT%H-%M-%S%.3f";
const COMPRESS_SUFFIX: &str = ".gz";

/// 로테이션 정책
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RotationPolicy {
    /// 로테이션 기준 크기 (MB, 0 이면 기본값 100MB)
    pub max_size_mb: u64,
    /// 보관할 최대 백업 수 (0 이면 무제한)
    pub max_backups: usize,
    /// 백업 보관 일수 (0 이면 무제한)
    pub max_age_days: u64,
    /// 순환된 파일 압축 여부
    pub compress: bool,
}

impl Default for RotationPolicy {
    fn default() -> Self {
        Self {
            max_size_mb: DEFAULT_MAX_SIZE_MB,
            max_backups: 0,
            max_age_days: 0,
            compress: false,
        }
    }
}

impl RotationPolicy {
    pub fn max_bytes(&self) -> u64 {
        let mb = if self.max_size_mb == 0 {
            DEFAULT_MAX_SIZE_MB
        } else {
            self.max_size_mb
        };
        mb.saturating_mul(MEGABYTE)
    }
}

/// 현재 파일 상태
struct ActiveFile {
    file: Option<BufWriter<File>>,
    size: u64,
    closed: bool,
}

/// 백그라운드 보관 정책 / 압축 작업자
struct Mill {
    sender: Sender<()>,
    handle: JoinHandle<()>,
}

/// 크기 기반으로 순환되는 로그 파일
///
/// 한 파일에 대한 동시 쓰기는 내부 뮤텍스로 직렬화되며 한 줄은 항상 통째로 기록됩니다.
pub struct RotatingFile {
    path: PathBuf,
    policy: RotationPolicy,
    max_bytes: u64,
    active: Mutex<ActiveFile>,
    mill: Mutex<Option<Mill>>,
}

impl RotatingFile {
    /// 새 로테이션 파일 생성
    ///
    /// 파일은 첫 쓰기 시점에 열립니다. 상위 디렉토리는 호출자가 미리 만들어야 합니다.
    pub fn new<P: Into<PathBuf>>(path: P, policy: RotationPolicy) -> Self {
        Self {
            path: path.into(),
            max_bytes: policy.max_bytes(),
            policy,
            active: Mutex::new(ActiveFile {
                file: None,
                size: 0,
                closed: false,
            }),
            mill: Mutex::new(None),
        }
    }

    /// 바이트 단위 크기 제한 지정
    pub fn with_max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = max_bytes.max(1);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn policy(&self) -> &RotationPolicy {
        &self.policy
    }

    /// 현재 파일에 기록된 바이트 수
    pub fn current_size(&self) -> u64 {
        self.active.lock().size
    }

    fn closed_error(&self) -> LogError {
        LogError::SinkClosed {
            sink: self.path.display().to_string(),
        }
    }

    fn write_bytes(&self, line: &[u8]) -> Result<()> {
        let mut active = self.active.lock();
        if active.closed {
            return Err(self.closed_error());
        }

        if active.file.is_none() {
            self.open_existing_or_new(&mut active)?;
        }

        let len = line.len() as u64;
        // 한 줄이 제한보다 크더라도 버리지 않고 새 파일에 기록
        if active.size > 0 && active.size.saturating_add(len) > self.max_bytes {
            self.rotate(&mut active)?;
        }

        let file = match active.file.as_mut() {
            Some(file) => file,
            None => return Err(self.closed_error()),
        };
        file.write_all(line)?;
        active.size += len;
        Ok(())
    }

    fn open_existing_or_new(&self, active: &mut ActiveFile) -> Result<()> {
        let file = open_append(&self.path)?;
        let size = file
            .metadata()
            .map_err(|source| LogError::OpenFile {
                path: self.path.clone(),
                source,
            })?
            .len();

        active.file = Some(BufWriter::new(file));
        active.size = size;
        Ok(())
    }

    /// 현재 파일을 타임스탬프 이름으로 옮기고 새 파일을 연다
    fn rotate(&self, active: &mut ActiveFile) -> Result<()> {
        if let Some(file) = active.file.as_mut() {
            file.flush().map_err(|source| LogError::Rotate {
                path: self.path.clone(),
                source,
            })?;
        }
        active.file = None;

        let backup = backup_path(&self.path, Utc::now());
        match fs::rename(&self.path, &backup) {
            Ok(()) => {}
            // 외부에서 삭제된 경우 새 파일만 연다
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(source) => {
                // 순환에 실패해도 현재 파일에는 계속 기록할 수 있어야 함
                self.open_existing_or_new(active)?;
                return Err(LogError::Rotate {
                    path: self.path.clone(),
                    source,
                });
            }
        }

        active.file = Some(BufWriter::new(open_new(&self.path)?));
        active.size = 0;

        debug!(
            path = %self.path.display(),
            backup = %backup.display(),
            "로그 파일 순환 완료"
        );

        self.request_mill();
        Ok(())
    }

    /// 보관 정책 / 압축 작업 요청 (이미 대기 중인 요청이 있으면 무시)
    fn request_mill(&self) {
        if self.policy.max_backups == 0 && self.policy.max_age_days == 0 && !self.policy.compress {
            return;
        }

        let mut mill = self.mill.lock();
        if mill.is_none() {
            *mill = self.start_mill();
        }

        match mill.as_ref().map(|m| m.sender.try_send(())) {
            Some(Ok(())) | Some(Err(TrySendError::Full(_))) => {}
            Some(Err(TrySendError::Disconnected(_))) | None => {
                // 작업자를 사용할 수 없으면 현재 스레드에서 실행
                *mill = None;
                run_mill(&self.path, &self.policy);
            }
        }
    }

    fn start_mill(&self) -> Option<Mill> {
        let (sender, receiver) = channel::bounded::<()>(1);
        let path = self.path.clone();
        let policy = self.policy;

        let spawned = std::thread::Builder::new()
            .name("levellog-mill".into())
            .spawn(move || {
                while receiver.recv().is_ok() {
                    run_mill(&path, &policy);
                }
            });

        match spawned {
            Ok(handle) => Some(Mill { sender, handle }),
            Err(e) => {
                warn!(error = %e, "보관 정책 작업자 스레드 생성 실패");
                None
            }
        }
    }

    /// 대기 중인 보관 / 압축 작업이 끝날 때까지 기다린다
    fn stop_mill(&self) {
        let mill = self.mill.lock().take();
        if let Some(Mill { sender, handle }) = mill {
            drop(sender);
            if handle.join().is_err() {
                warn!(path = %self.path.display(), "보관 정책 작업자 스레드 비정상 종료");
            }
        }
    }
}

impl LogSink for RotatingFile {
    fn write_line(&self, line: &[u8]) -> Result<()> {
        self.write_bytes(line)
    }

    fn flush(&self) -> Result<()> {
        let mut active = self.active.lock();
        if active.closed {
            return Err(self.closed_error());
        }
        if let Some(file) = active.file.as_mut() {
            file.flush()?;
        }
        Ok(())
    }

    fn close(&self) -> Result<()> {
        let result = {
            let mut active = self.active.lock();
            if active.closed {
                return Err(self.closed_error());
            }
            active.closed = true;
            // 플러시에 실패해도 파일 핸들은 해제
            match active.file.take() {
                Some(mut file) => file.flush().map_err(LogError::from),
                None => Ok(()),
            }
        };

        self.stop_mill();
        result
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

impl Drop for RotatingFile {
    fn drop(&mut self) {
        let active = self.active.get_mut();
        if let Some(file) = active.file.as_mut() {
            let _ = file.flush();
        }
        // 작업자는 남은 요청을 처리한 뒤 스스로 종료
        if let Some(mill) = self.mill.get_mut().take() {
            drop(mill.sender);
        }
    }
}

fn open_append(path: &Path) -> Result<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| LogError::OpenFile {
            path: path.to_path_buf(),
            source,
        })
}

fn open_new(path: &Path) -> Result<File> {
    OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)
        .map_err(|source| LogError::OpenFile {
            path: path.to_path_buf(),
            source,
        })
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// 백업 파일 경로 생성 (`<path>-<timestamp>`, 충돌 시 `-N` 추가)
fn backup_path(path: &Path, now: DateTime<Utc>) -> PathBuf {
    let dir = parent_dir(path);
    let base = format!("{}-{}", file_name_of(path), now.format(BACKUP_TIME_FORMAT));

    let mut candidate = dir.join(&base);
    let mut seq = 0u32;
    while candidate.exists() || with_gz_suffix(&candidate).exists() {
        seq += 1;
        candidate = dir.join(format!("{base}-{seq}"));
    }
    candidate
}

fn with_gz_suffix(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(COMPRESS_SUFFIX);
    PathBuf::from(name)
}

/// 디렉토리에서 발견된 백업 파일
#[derive(Debug, Clone)]
struct Backup {
    path: PathBuf,
    timestamp: NaiveDateTime,
    seq: u32,
    compressed: bool,
}

impl Backup {
    fn sort_key(&self) -> (NaiveDateTime, u32) {
        (self.timestamp, self.seq)
    }
}

/// `<file_name>-<timestamp>[-N][.gz]` 형식의 파일 이름 해석
fn parse_backup_name(prefix: &str, name: &str) -> Option<(NaiveDateTime, u32, bool)> {
    let rest = name.strip_prefix(prefix)?.strip_prefix('-')?;
    let (rest, compressed) = match rest.strip_suffix(COMPRESS_SUFFIX) {
        Some(stripped) => (stripped, true),
        None => (rest, false),
    };

    // 타임스탬프는 항상 23자 ("2006-01-02T15-04-05.000")
    if rest.len() < 23 || !rest.is_char_boundary(23) {
        return None;
    }
    let (stamp, counter) = rest.split_at(23);
    let timestamp = NaiveDateTime::parse_from_str(stamp, BACKUP_TIME_FORMAT).ok()?;
    let seq = match counter.strip_prefix('-') {
        Some(digits) => digits.parse().ok()?,
        None if counter.is_empty() => 0,
        None => return None,
    };
    Some((timestamp, seq, compressed))
}

fn list_backups(path: &Path) -> io::Result<Vec<Backup>> {
    let prefix = file_name_of(path);
    let mut backups = Vec::new();

    for entry in fs::read_dir(parent_dir(path))? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if let Some((timestamp, seq, compressed)) = parse_backup_name(&prefix, &name) {
            backups.push(Backup {
                path: entry.path(),
                timestamp,
                seq,
                compressed,
            });
        }
    }

    // 최신 순
    backups.sort_by(|a, b| b.sort_key().cmp(&a.sort_key()));
    Ok(backups)
}

/// 보관 정책 적용 후 남은 백업 중 압축 대상 반환
fn enforce_retention(path: &Path, policy: &RotationPolicy) -> io::Result<Vec<PathBuf>> {
    let backups = list_backups(path)?;

    // 같은 백업의 원본과 .gz 는 하나로 취급
    let mut groups: Vec<Vec<Backup>> = Vec::new();
    for backup in backups {
        match groups.last_mut() {
            Some(group) if group[0].sort_key() == backup.sort_key() => group.push(backup),
            _ => groups.push(vec![backup]),
        }
    }

    let cutoff = (policy.max_age_days > 0).then(|| {
        let days = i64::try_from(policy.max_age_days).unwrap_or(i64::MAX / 86_400);
        Utc::now().naive_utc() - chrono::Duration::days(days.min(365_000))
    });

    let mut to_compress = Vec::new();
    for (index, group) in groups.iter().enumerate() {
        let over_count = policy.max_backups > 0 && index >= policy.max_backups;
        let too_old = cutoff.is_some_and(|cutoff| group[0].timestamp < cutoff);

        if over_count || too_old {
            for backup in group {
                match fs::remove_file(&backup.path) {
                    Ok(()) => debug!(path = %backup.path.display(), "오래된 백업 삭제됨"),
                    Err(e) => warn!(
                        path = %backup.path.display(),
                        error = %e,
                        "백업 삭제 실패"
                    ),
                }
            }
            continue;
        }

        if policy.compress {
            if let Some(plain) = group.iter().find(|b| !b.compressed) {
                to_compress.push(plain.path.clone());
            }
        }
    }

    Ok(to_compress)
}

/// 보관 정책을 적용하고 남은 백업을 압축
fn run_mill(path: &Path, policy: &RotationPolicy) {
    let to_compress = match enforce_retention(path, policy) {
        Ok(files) => files,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "백업 보관 정책 적용 실패");
            return;
        }
    };

    for plain in to_compress {
        let target = with_gz_suffix(&plain);
        if let Err(e) = compress_file(&plain, &target) {
            warn!(
                path = %plain.display(),
                error = %e,
                "백업 파일 압축 실패"
            );
        }
    }
}

/// 파일을 gzip 으로 압축하고 원본을 삭제
fn compress_file(src: &Path, dst: &Path) -> io::Result<()> {
    let result = (|| -> io::Result<()> {
        let mut input = File::open(src)?;
        let output = File::create(dst)?;
        let mut encoder = GzEncoder::new(BufWriter::new(output), Compression::default());
        io::copy(&mut input, &mut encoder)?;
        encoder.finish()?.flush()?;
        Ok(())
    })();

    match result {
        Ok(()) => {
            fs::remove_file(src)?;
            debug!(path = %dst.display(), "백업 파일 압축 완료");
            Ok(())
        }
        Err(e) => {
            let _ = fs::remove_file(dst);
            Err(e)
        }
    }
}
