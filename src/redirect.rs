//! `2> file` のスコープ管理。
//!
//! 論理チェーン 1 文の評価中だけシェル自身の stderr をターゲットファイルに差し替え、
//! [`StderrGuard`] の Drop で元の出力先に戻す。成功・短絡・失敗・終了要求の
//! どの経路で評価を抜けても復元される。

use std::fs::File;
use std::io;
use std::os::unix::io::{AsRawFd, FromRawFd, OwnedFd};

use crate::error::{Result, ShellError};

/// リダイレクト先ファイルを作成（既存なら切り詰め）して開く。
pub fn open_target(target: &str) -> Result<File> {
    File::create(target).map_err(|source| ShellError::Redirect {
        target: target.to_string(),
        source,
    })
}

/// stderr を一時的に差し替える RAII ガード。
pub struct StderrGuard {
    /// 差し替え前の stderr の複製（close-on-exec）。
    saved: OwnedFd,
}

impl StderrGuard {
    /// fd 2 を `file` に向ける。元の fd 2 は複製して保持する。
    pub fn redirect_to(file: &File) -> io::Result<Self> {
        let raw = unsafe { libc::fcntl(libc::STDERR_FILENO, libc::F_DUPFD_CLOEXEC, 0) };
        if raw < 0 {
            return Err(io::Error::last_os_error());
        }
        let saved = unsafe { OwnedFd::from_raw_fd(raw) };

        if unsafe { libc::dup2(file.as_raw_fd(), libc::STDERR_FILENO) } < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(Self { saved })
    }
}

impl Drop for StderrGuard {
    fn drop(&mut self) {
        if unsafe { libc::dup2(self.saved.as_raw_fd(), libc::STDERR_FILENO) } < 0 {
            log::warn!("failed to restore stderr: {}", io::Error::last_os_error());
        }
    }
}

/// fd 2 が指すファイルの (dev, ino)。テストで復元を確認するために使う。
#[cfg(test)]
pub(crate) fn stderr_identity() -> (u64, u64) {
    let mut st: libc::stat = unsafe { std::mem::zeroed() };
    unsafe { libc::fstat(libc::STDERR_FILENO, &mut st) };
    (st.st_dev as u64, st.st_ino as u64)
}

/// stderr を差し替えるテストを直列化するロック。
#[cfg(test)]
pub(crate) static STDERR_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());
