//! `posix_spawnp()` の安全な Rust ラッパー。
//!
//! 外部コマンドを fork+exec ではなく `posix_spawnp` で起動する。PATH 検索付き。
//!
//! ## 構成
//!
//! | 型 | 役割 |
//! |-----|------|
//! | [`SpawnAttr`] | `posix_spawnattr_t` の RAII ラッパー（プロセスグループ、シグナル設定） |
//! | [`FileActions`] | `posix_spawn_file_actions_t` の RAII ラッパー（stderr の差し替え） |
//! | [`CStringVec`] | argv 用の NULL 終端ポインタ配列 |
//! | [`spawn`] | 上記を組み合わせて `posix_spawnp` を呼ぶ公開関数 |

use std::ffi::CString;

use crate::error::{Result, ShellError};

// ── SpawnAttr ─────────────────────────────────────────────────────

/// `posix_spawnattr_t` の RAII ラッパー。Drop で自動 destroy。
struct SpawnAttr {
    inner: libc::posix_spawnattr_t,
}

impl SpawnAttr {
    fn new() -> Self {
        unsafe {
            let mut attr: libc::posix_spawnattr_t = std::mem::zeroed();
            libc::posix_spawnattr_init(&mut attr);
            Self { inner: attr }
        }
    }

    fn add_flags(&mut self, flag: libc::c_int) {
        unsafe {
            let mut flags: libc::c_short = 0;
            libc::posix_spawnattr_getflags(&self.inner, &mut flags);
            flags |= flag as libc::c_short;
            libc::posix_spawnattr_setflags(&mut self.inner, flags);
        }
    }

    /// 子プロセスを自身がリーダーの新しいプロセスグループに入れる。
    ///
    /// バックグラウンドジョブに使い、端末の Ctrl+C が届かないようにする。
    fn set_own_pgroup(&mut self) {
        self.add_flags(libc::POSIX_SPAWN_SETPGROUP);
        unsafe {
            libc::posix_spawnattr_setpgroup(&mut self.inner, 0);
        }
    }

    /// シェルが無視している SIGINT を子で `SIG_DFL` に戻す。
    fn set_sigdefault(&mut self) {
        self.add_flags(libc::POSIX_SPAWN_SETSIGDEF);
        unsafe {
            let mut sigset: libc::sigset_t = std::mem::zeroed();
            libc::sigemptyset(&mut sigset);
            libc::sigaddset(&mut sigset, libc::SIGINT);
            libc::posix_spawnattr_setsigdefault(&mut self.inner, &sigset);
        }
    }

    fn as_ptr(&self) -> *const libc::posix_spawnattr_t {
        &self.inner
    }
}

impl Drop for SpawnAttr {
    fn drop(&mut self) {
        unsafe {
            libc::posix_spawnattr_destroy(&mut self.inner);
        }
    }
}

// ── FileActions ───────────────────────────────────────────────────

/// `posix_spawn_file_actions_t` の RAII ラッパー。Drop で自動 destroy。
struct FileActions {
    inner: libc::posix_spawn_file_actions_t,
}

impl FileActions {
    fn new() -> Self {
        unsafe {
            let mut actions: libc::posix_spawn_file_actions_t = std::mem::zeroed();
            libc::posix_spawn_file_actions_init(&mut actions);
            Self { inner: actions }
        }
    }

    /// `dup2(fd, newfd)` アクションを追加する。
    fn add_dup2(&mut self, fd: i32, newfd: i32) {
        unsafe {
            libc::posix_spawn_file_actions_adddup2(&mut self.inner, fd, newfd);
        }
    }

    /// `close(fd)` アクションを追加する。
    fn add_close(&mut self, fd: i32) {
        unsafe {
            libc::posix_spawn_file_actions_addclose(&mut self.inner, fd);
        }
    }

    fn as_ptr(&self) -> *const libc::posix_spawn_file_actions_t {
        &self.inner
    }
}

impl Drop for FileActions {
    fn drop(&mut self) {
        unsafe {
            libc::posix_spawn_file_actions_destroy(&mut self.inner);
        }
    }
}

// ── CStringVec ────────────────────────────────────────────────────

/// argv 用の CString ベクタ。NULL 終端のポインタ配列を構築する。
struct CStringVec {
    _strings: Vec<CString>,
    ptrs: Vec<*mut libc::c_char>,
}

impl CStringVec {
    /// 引数リストから構築する。NUL を含む引数は空文字列になる。
    fn from_args(args: &[&str]) -> Self {
        let strings: Vec<CString> = args
            .iter()
            .map(|s| CString::new(*s).unwrap_or_default())
            .collect();
        let mut ptrs: Vec<*mut libc::c_char> = strings
            .iter()
            .map(|s| s.as_ptr() as *mut libc::c_char)
            .collect();
        ptrs.push(std::ptr::null_mut()); // NULL 終端
        Self {
            _strings: strings,
            ptrs,
        }
    }

    fn as_ptr(&self) -> *const *mut libc::c_char {
        self.ptrs.as_ptr()
    }
}

// ── spawn 関数 ────────────────────────────────────────────────────

/// `posix_spawnp` で子プロセスを起動する。成功時は子 PID を返す。
///
/// - `args`: コマンドと引数（`args[0]` がコマンド名、PATH 検索付き）。空であってはならない
/// - `stderr_fd`: 子の stderr に接続する fd（`None` なら継承）。呼び出し側が親で close する
/// - `background`: `true` なら子を独立したプロセスグループに入れる
///
/// stdin/stdout は常に継承する。
pub fn spawn(args: &[&str], stderr_fd: Option<i32>, background: bool) -> Result<libc::pid_t> {
    let argv = CStringVec::from_args(args);

    let mut attr = SpawnAttr::new();
    attr.set_sigdefault();
    if background {
        attr.set_own_pgroup();
    }

    let mut actions = FileActions::new();
    if let Some(fd) = stderr_fd {
        actions.add_dup2(fd, libc::STDERR_FILENO);
        if fd != libc::STDERR_FILENO {
            actions.add_close(fd);
        }
    }

    // environ を継承
    extern "C" {
        static environ: *const *mut libc::c_char;
    }

    let mut pid: libc::pid_t = 0;

    let ret = unsafe {
        libc::posix_spawnp(
            &mut pid,
            argv.as_ptr().read() as *const libc::c_char,
            actions.as_ptr(),
            attr.as_ptr(),
            argv.as_ptr(),
            environ as *const *mut libc::c_char,
        )
    };

    if ret != 0 {
        return Err(ShellError::Spawn {
            command: args[0].to_string(),
            errno: ret,
        });
    }

    Ok(pid)
}
