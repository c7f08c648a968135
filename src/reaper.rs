//! バックグラウンドジョブの非同期回収。
//!
//! 専用スレッドが `SIGCHLD` を待ち受け（`signal_hook::iterator::Signals`）、
//! 監視中の PID を `waitpid(pid, WNOHANG)` で回収して、終了した PID をチャネルで送る。
//! ジョブテーブルには一切触れない。制御スレッドが [`Reaper::drain`] で受け取り、
//! 自分でテーブルから削除する。
//!
//! 監視対象は登録済みのバックグラウンド PID だけなので、フォアグラウンドの
//! `waitpid(pid)` と競合しない。登録より前に子が終了していた場合に備え、
//! [`Reaper::watch`] は登録直後に一度だけ同じ回収処理を走らせる。

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};

use libc::pid_t;
use signal_hook::consts::signal::SIGCHLD;
use signal_hook::iterator::{Handle, Signals};

use crate::error::{Result, ShellError};

/// SIGCHLD 監視スレッドとその通知チャネル。
pub struct Reaper {
    /// 監視中のバックグラウンド PID。監視スレッドと制御スレッドで共有する唯一の状態。
    watched: Arc<Mutex<Vec<pid_t>>>,
    done_tx: Sender<pid_t>,
    done_rx: Receiver<pid_t>,
    handle: Handle,
    thread: Option<JoinHandle<()>>,
}

impl Reaper {
    /// SIGCHLD ハンドラを登録し、監視スレッドを起動する。
    pub fn start() -> Result<Self> {
        let mut signals = Signals::new([SIGCHLD]).map_err(ShellError::Reaper)?;
        let handle = signals.handle();
        let watched: Arc<Mutex<Vec<pid_t>>> = Arc::new(Mutex::new(Vec::new()));
        let (done_tx, done_rx) = mpsc::channel();

        let thread = {
            let watched = Arc::clone(&watched);
            let tx = done_tx.clone();
            thread::Builder::new()
                .name("mish-reaper".to_string())
                .spawn(move || {
                    for _ in signals.forever() {
                        log::trace!("SIGCHLD received");
                        sweep(&watched, &tx);
                    }
                    log::trace!("reaper thread stopped");
                })
                .map_err(ShellError::Reaper)?
        };

        Ok(Self {
            watched,
            done_tx,
            done_rx,
            handle,
            thread: Some(thread),
        })
    }

    /// バックグラウンド PID を監視対象に加える。
    pub fn watch(&self, pid: pid_t) {
        self.watched
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(pid);
        // 登録前に届いた SIGCHLD の取りこぼしを拾う
        sweep(&self.watched, &self.done_tx);
    }

    /// 監視中の PID を呼び出し側のスレッドで回収する。
    ///
    /// 監視スレッドがまだ SIGCHLD を処理していなくても、終了済みの子をここで拾える。
    pub fn poll(&self) {
        sweep(&self.watched, &self.done_tx);
    }

    /// 終了済みとして通知された PID をすべて受け取る。ブロックしない。
    pub fn drain(&self) -> Vec<pid_t> {
        self.done_rx.try_iter().collect()
    }

    #[cfg(test)]
    fn watched_len(&self) -> usize {
        self.watched
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl Drop for Reaper {
    fn drop(&mut self) {
        self.handle.close();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

/// 監視中の PID を非ブロッキングで回収し、終了したものを通知する。
///
/// ロックを保持したまま `waitpid` するため、同じ PID が二重に通知されることはない。
fn sweep(watched: &Mutex<Vec<pid_t>>, tx: &Sender<pid_t>) {
    let mut pids = watched.lock().unwrap_or_else(PoisonError::into_inner);
    pids.retain(|&pid| {
        let mut raw_status: i32 = 0;
        let ret = unsafe { libc::waitpid(pid, &mut raw_status, libc::WNOHANG) };
        let finished = if ret == pid {
            true
        } else if ret < 0 {
            // ECHILD 等: もう待てない PID は終了扱いで監視から外す
            let err = std::io::Error::last_os_error();
            err.raw_os_error() != Some(libc::EINTR)
        } else {
            false
        };
        if finished {
            log::info!("background process {} finished", pid);
            // 受信側が破棄済み（シェル終了中）なら送れなくてよい
            let _ = tx.send(pid);
        }
        !finished
    });
}
